//! The optional seller override block.
//!
//! When no seller is attached to an invoice the block is omitted entirely
//! and the service falls back to the seller profile configured account-side.

use crate::xml::{self, Value, opt};

#[derive(Debug, Clone, Default)]
pub struct SellerBank {
    pub name: Option<String>,
    pub account_number: Option<String>,
}

/// Template for the notification e-mail the service sends with the invoice.
#[derive(Debug, Clone, Default)]
pub struct SellerEmail {
    pub reply_to_address: Option<String>,
    pub subject: Option<String>,
    pub message: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct Seller {
    pub bank: Option<SellerBank>,
    pub email: Option<SellerEmail>,
    pub issuer_name: Option<String>,
}

impl Seller {
    #[must_use]
    pub fn generate_xml(&self, indent_level: usize) -> String {
        let bank = self.bank.as_ref();
        let email = self.email.as_ref();

        let fields = vec![
            opt("bank", bank.and_then(|b| b.name.as_deref())),
            opt(
                "bankszamlaszam",
                bank.and_then(|b| b.account_number.as_deref()),
            ),
            opt(
                "emailReplyto",
                email.and_then(|e| e.reply_to_address.as_deref()),
            ),
            opt("emailTargy", email.and_then(|e| e.subject.as_deref())),
            opt("emailSzoveg", email.and_then(|e| e.message.as_deref())),
            opt("alairoNeve", self.issuer_name.as_deref()),
        ];

        xml::render_element("elado", &Value::Elements(fields), indent_level)
    }
}
