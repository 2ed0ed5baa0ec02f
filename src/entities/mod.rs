pub mod buyer;
pub mod credit_entry;
pub mod invoice;
pub mod item;
pub mod receipt;
pub mod seller;

pub use buyer::{Buyer, PostalAddress};
pub use credit_entry::CreditEntry;
pub use invoice::Invoice;
pub use item::{Item, ItemPrices, Vat, VatExemption};
pub use receipt::{Receipt, ReceiptItem, ReceiptPayment};
pub use seller::{Seller, SellerBank, SellerEmail};
