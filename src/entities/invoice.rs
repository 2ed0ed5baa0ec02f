//! The invoice aggregate: header, optional seller override, buyer, items.

use rust_decimal::Decimal;
use time::{Date, OffsetDateTime};

use crate::constants::{Currency, Language, PaymentMethod};
use crate::error::{Error, Result};
use crate::xml::{self, Value, field, opt};

use super::buyer::Buyer;
use super::item::Item;
use super::seller::Seller;

fn today() -> Date {
    OffsetDateTime::now_utc().date()
}

#[derive(Debug, Clone)]
pub struct Invoice {
    pub issue_date: Date,
    pub fulfillment_date: Date,
    pub due_date: Date,
    pub payment_method: PaymentMethod,
    pub currency: Currency,
    pub language: Language,
    pub exchange_rate: Decimal,
    pub exchange_bank: String,
    pub seller: Option<Seller>,
    pub buyer: Buyer,
    pub items: Vec<Item>,
    pub order_number: Option<String>,
    pub comment: Option<String>,
    pub logo_image: Option<String>,
    pub invoice_id_prefix: Option<String>,
    /// Tri-state flags: `None` omits the element entirely.
    pub proforma: Option<bool>,
    pub paid: Option<bool>,
    pub no_nav_report: Option<bool>,
    pub prepayment_invoice: bool,
    /// Number of the invoice this one adjusts. Setting it also emits the
    /// adjustment flag; an empty string is rejected at render time.
    pub adjustment_invoice_number: Option<String>,
}

impl Invoice {
    /// An invoice dated today with the service defaults (bank transfer,
    /// Forint, Hungarian).
    #[must_use]
    pub fn new(buyer: Buyer, items: Vec<Item>) -> Self {
        let now = today();
        Self {
            issue_date: now,
            fulfillment_date: now,
            due_date: now,
            payment_method: PaymentMethod::default(),
            currency: Currency::default(),
            language: Language::default(),
            exchange_rate: Decimal::ZERO,
            exchange_bank: String::new(),
            seller: None,
            buyer,
            items,
            order_number: None,
            comment: None,
            logo_image: None,
            invoice_id_prefix: None,
            proforma: None,
            paid: None,
            no_nav_report: None,
            prepayment_invoice: false,
            adjustment_invoice_number: None,
        }
    }

    fn validate_adjustment(&self) -> Result<bool> {
        match &self.adjustment_invoice_number {
            None => Ok(false),
            Some(number) if number.is_empty() => Err(Error::validation(
                "adjustment invoice number should be minimum 1 character",
            )),
            Some(_) => Ok(true),
        }
    }

    pub fn generate_xml(&self, indent_level: usize) -> Result<String> {
        if self.items.is_empty() {
            return Err(Error::validation(
                "valid items array missing from invoice options",
            ));
        }
        let adjustment = self.validate_adjustment()?;

        let header = vec![
            field("keltDatum", self.issue_date),
            field("teljesitesDatum", self.fulfillment_date),
            field("fizetesiHataridoDatum", self.due_date),
            field("fizmod", self.payment_method.wire_value()),
            field("penznem", self.currency.wire_value()),
            field("szamlaNyelve", self.language.wire_value()),
            opt("megjegyzes", self.comment.as_deref()),
            field("arfolyamBank", self.exchange_bank.as_str()),
            field("arfolyam", self.exchange_rate),
            opt("rendelesSzam", self.order_number.as_deref()),
            field("elolegszamla", self.prepayment_invoice),
            opt("helyesbitoszamla", adjustment.then_some(true)),
            opt(
                "helyesbitettSzamlaszam",
                self.adjustment_invoice_number.as_deref(),
            ),
            opt("dijbekero", self.proforma),
            opt("logoExtra", self.logo_image.as_deref()),
            opt("szamlaszamElotag", self.invoice_id_prefix.as_deref()),
            opt("fizetve", self.paid),
            opt("eusAfa", self.no_nav_report),
        ];

        let mut out = xml::render_element("fejlec", &Value::Elements(header), indent_level);

        if let Some(seller) = &self.seller {
            out.push_str(&seller.generate_xml(indent_level));
        }

        out.push_str(&self.buyer.generate_xml(indent_level)?);

        out.push_str(&xml::pad(indent_level));
        out.push_str("<tetelek>\n");
        for item in &self.items {
            out.push_str(&item.generate_xml(indent_level, self.currency)?);
        }
        out.push_str(&xml::pad(indent_level));
        out.push_str("</tetelek>\n");

        Ok(out)
    }
}
