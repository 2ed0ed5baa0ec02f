//! The invoice buyer block.

use crate::constants::TaxSubject;
use crate::error::{Error, Result};
use crate::xml::{self, Value, field, opt};

/// A postal address override, used when the invoice should be mailed
/// somewhere other than the buyer's billing address.
#[derive(Debug, Clone, Default)]
pub struct PostalAddress {
    pub name: Option<String>,
    pub country: Option<String>,
    pub zip: Option<String>,
    pub city: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct Buyer {
    pub name: String,
    pub zip: String,
    pub city: String,
    pub address: String,
    pub country: Option<String>,
    pub email: Option<String>,
    pub send_email: Option<bool>,
    pub tax_subject: TaxSubject,
    pub tax_number: Option<String>,
    pub tax_number_group: Option<String>,
    pub tax_number_eu: Option<String>,
    pub post_address: Option<PostalAddress>,
    pub identifier: Option<String>,
    pub issuer_name: Option<String>,
    pub phone: Option<String>,
    pub comment: Option<String>,
}

impl Buyer {
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        zip: impl Into<String>,
        city: impl Into<String>,
        address: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            zip: zip.into(),
            city: city.into(),
            address: address.into(),
            ..Self::default()
        }
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::validation(
                "valid name field missing from buyer options",
            ));
        }
        if self.zip.trim().is_empty() {
            return Err(Error::validation(
                "valid zip field missing from buyer options",
            ));
        }
        if self.city.trim().is_empty() {
            return Err(Error::validation(
                "valid city field missing from buyer options",
            ));
        }
        if self.address.trim().is_empty() {
            return Err(Error::validation(
                "valid address field missing from buyer options",
            ));
        }
        Ok(())
    }

    pub fn generate_xml(&self, indent_level: usize) -> Result<String> {
        self.validate()?;

        let post = self.post_address.as_ref();

        let fields = vec![
            field("nev", self.name.as_str()),
            opt("orszag", self.country.as_deref()),
            field("irsz", self.zip.as_str()),
            field("telepules", self.city.as_str()),
            field("cim", self.address.as_str()),
            opt("email", self.email.as_deref()),
            opt("sendEmail", self.send_email),
            field("adoalany", self.tax_subject.wire_value()),
            opt("adoszam", self.tax_number.as_deref()),
            opt("csoportazonosito", self.tax_number_group.as_deref()),
            opt("adoszamEU", self.tax_number_eu.as_deref()),
            opt("postazasiNev", post.and_then(|p| p.name.as_deref())),
            opt("postazasiOrszag", post.and_then(|p| p.country.as_deref())),
            opt("postazasiIrsz", post.and_then(|p| p.zip.as_deref())),
            opt("postazasiTelepules", post.and_then(|p| p.city.as_deref())),
            opt("postazasiCim", post.and_then(|p| p.address.as_deref())),
            opt("azonosito", self.identifier.as_deref()),
            opt("alairoNeve", self.issuer_name.as_deref()),
            opt("telefonszam", self.phone.as_deref()),
            opt("megjegyzes", self.comment.as_deref()),
        ];

        Ok(xml::render_element(
            "vevo",
            &Value::Elements(fields),
            indent_level,
        ))
    }
}
