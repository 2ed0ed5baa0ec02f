//! Client library for the szamlazz.hu Számla Agent API.
//!
//! The agent speaks a multipart-upload protocol: each operation posts one
//! XML document as a file part and reads the result back from response
//! headers, a response document, or a raw PDF body, depending on the
//! action. This crate covers issuing and reversing invoices, fetching
//! invoice data, registering credit entries, and querying taxpayers, plus
//! the entity types ([`Invoice`], [`Buyer`], [`Item`], [`Receipt`], ...)
//! that render themselves into the agent's XML dialect.
//!
//! ```no_run
//! use szamlazz_rs::{
//!     Buyer, Client, ClientOptions, Credentials, Invoice, Item, Vat,
//! };
//! use rust_decimal::Decimal;
//!
//! # async fn run() -> szamlazz_rs::Result<()> {
//! let client = Client::new(ClientOptions::new(Credentials::AuthToken(
//!     "agent-key".to_string(),
//! )))?;
//!
//! let buyer = Buyer::new("Some Buyer", "1234", "City", "Some street 1");
//! let mut item = Item::new("Eggs", Vat::percent(27));
//! item.quantity = Decimal::from(6);
//! item.unit = Some("piece".to_string());
//! item.net_unit_price = Some(Decimal::from(30));
//!
//! let issued = client.issue_invoice(&Invoice::new(buyer, vec![item])).await?;
//! println!("issued {}", issued.invoice_id);
//! # Ok(())
//! # }
//! ```

#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]

#[macro_use]
extern crate tracing;

pub mod client;
pub mod constants;
pub mod entities;
pub mod error;
pub mod xml;

pub use client::{
    Client, ClientOptions, CreditEntryRequest, Credentials, GetInvoiceDataRequest, IssuedInvoice,
    PaymentSummary, ResponseVersion, ReverseInvoiceRequest, Taxpayer, TaxpayerAddress,
};
pub use constants::{Currency, Language, PaymentMethod, TaxSubject};
pub use entities::{
    Buyer, CreditEntry, Invoice, Item, ItemPrices, PostalAddress, Receipt, ReceiptItem,
    ReceiptPayment, Seller, SellerBank, SellerEmail, Vat, VatExemption,
};
pub use error::{Error, Result};
