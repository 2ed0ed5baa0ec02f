//! Credit (payment) entries registered against an already issued invoice.

use rust_decimal::Decimal;
use time::{Date, OffsetDateTime};

use crate::constants::PaymentMethod;
use crate::error::{Error, Result};
use crate::xml::{self, Value, field};

#[derive(Debug, Clone)]
pub struct CreditEntry {
    pub date: Date,
    pub payment_method: PaymentMethod,
    pub amount: Decimal,
    pub description: String,
}

impl CreditEntry {
    /// A credit entry dated today, paid by bank transfer.
    #[must_use]
    pub fn new(amount: Decimal) -> Self {
        Self {
            date: OffsetDateTime::now_utc().date(),
            payment_method: PaymentMethod::default(),
            amount,
            description: String::new(),
        }
    }

    pub fn generate_xml(&self, indent_level: usize) -> Result<String> {
        if self.amount.is_zero() {
            return Err(Error::validation(
                "valid amount value missing from credit entry options",
            ));
        }

        let fields = vec![
            field("datum", self.date),
            field("jogcim", self.payment_method.wire_value()),
            field("osszeg", self.amount),
            field("leiras", self.description.as_str()),
        ];

        Ok(xml::render_element(
            "kifizetes",
            &Value::Elements(fields),
            indent_level,
        ))
    }
}
