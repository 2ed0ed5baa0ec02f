//! Point-of-sale receipts: items, the receipt aggregate, and payment rows.

use rust_decimal::Decimal;

use crate::constants::{Currency, PaymentMethod};
use crate::error::{Error, Result};
use crate::xml::{self, Value, field, opt};

use super::item::{self, Vat};

/// One sold item on a receipt. Same pricing model as an invoice [`Item`],
/// but the totals use the receipt dialect's shorter tag names.
///
/// [`Item`]: super::item::Item
#[derive(Debug, Clone)]
pub struct ReceiptItem {
    pub label: String,
    pub quantity: Decimal,
    pub unit: Option<String>,
    pub vat: Vat,
    pub net_unit_price: Option<Decimal>,
    pub gross_unit_price: Option<Decimal>,
}

impl ReceiptItem {
    #[must_use]
    pub fn new(label: impl Into<String>, vat: Vat) -> Self {
        Self {
            label: label.into(),
            quantity: Decimal::ONE,
            unit: None,
            vat,
            net_unit_price: None,
            gross_unit_price: None,
        }
    }

    fn validate(&self) -> Result<()> {
        if self.label.trim().is_empty() {
            return Err(Error::validation(
                "valid label value missing from receipt item options",
            ));
        }
        if self.quantity.is_zero() {
            return Err(Error::validation(
                "valid quantity value missing from receipt item options",
            ));
        }
        Ok(())
    }

    pub fn generate_xml(&self, indent_level: usize, currency: Currency) -> Result<String> {
        self.validate()?;
        let prices = item::compute_prices(
            self.quantity,
            &self.vat,
            self.net_unit_price,
            self.gross_unit_price,
            currency.round_price_exp(),
        )?;

        let net_unit_price = prices
            .as_ref()
            .map(|p| p.net_unit_price)
            .or(self.net_unit_price);

        let fields = vec![
            field("megnevezes", self.label.as_str()),
            field("mennyiseg", self.quantity),
            opt("mennyisegiEgyseg", self.unit.as_deref()),
            opt("nettoEgysegar", net_unit_price),
            (
                "afakulcs",
                Some(match &self.vat {
                    Vat::Percent(rate) => Value::Number(*rate),
                    Vat::Exempt(code) => code.wire_value().into(),
                    Vat::Unhandled(raw) => raw.as_str().into(),
                }),
            ),
            opt("netto", prices.as_ref().map(|p| p.net_value)),
            opt("afa", prices.as_ref().map(|p| p.vat_value)),
            opt("brutto", prices.as_ref().map(|p| p.gross_value)),
        ];

        Ok(xml::render_element(
            "tetel",
            &Value::Elements(fields),
            indent_level,
        ))
    }
}

/// A payment row on a receipt. The payment method here is free-form text,
/// unlike the enumerated invoice payment method.
#[derive(Debug, Clone, Default)]
pub struct ReceiptPayment {
    pub payment_method: String,
    pub amount: Decimal,
    pub description: Option<String>,
}

impl ReceiptPayment {
    pub fn generate_xml(&self, indent_level: usize) -> Result<String> {
        if self.payment_method.trim().is_empty() {
            return Err(Error::validation(
                "valid payment method value missing from payment options",
            ));
        }
        if self.amount.is_zero() {
            return Err(Error::validation(
                "valid amount value missing from payment options",
            ));
        }

        let fields = vec![
            field("fizetoeszkoz", self.payment_method.as_str()),
            field("osszeg", self.amount),
            opt("leiras", self.description.as_deref()),
        ];

        Ok(xml::render_element(
            "kifizetes",
            &Value::Elements(fields),
            indent_level,
        ))
    }
}

#[derive(Debug, Clone)]
pub struct Receipt {
    pub request_id: Option<String>,
    pub prefix: Option<String>,
    pub payment_method: PaymentMethod,
    pub currency: Currency,
    pub exchange_bank: String,
    pub exchange_rate: Decimal,
    pub comment: Option<String>,
    pub pdf_template: Option<String>,
    pub general_ledger_id: Option<String>,
    pub items: Vec<ReceiptItem>,
    pub payments: Option<Vec<ReceiptPayment>>,
}

impl Receipt {
    #[must_use]
    pub fn new(items: Vec<ReceiptItem>) -> Self {
        Self {
            request_id: None,
            prefix: None,
            payment_method: PaymentMethod::default(),
            currency: Currency::default(),
            exchange_bank: String::new(),
            exchange_rate: Decimal::ZERO,
            comment: None,
            pdf_template: None,
            general_ledger_id: None,
            items,
            payments: None,
        }
    }

    pub fn generate_xml(&self, indent_level: usize) -> Result<String> {
        if self.items.is_empty() {
            return Err(Error::validation(
                "valid items array missing from receipt options",
            ));
        }

        let header = vec![
            opt("hivasAzonosito", self.request_id.as_deref()),
            opt("elotag", self.prefix.as_deref()),
            field("fizmod", self.payment_method.wire_value()),
            field("penznem", self.currency.wire_value()),
            field("devizabank", self.exchange_bank.as_str()),
            field("devizaarf", self.exchange_rate),
            opt("megjegyzes", self.comment.as_deref()),
            opt("pdfSablon", self.pdf_template.as_deref()),
            opt("fokonyvVevo", self.general_ledger_id.as_deref()),
        ];

        let mut out = xml::render_element("fejlec", &Value::Elements(header), indent_level);

        out.push_str(&xml::pad(indent_level));
        out.push_str("<tetelek>\n");
        for receipt_item in &self.items {
            out.push_str(&receipt_item.generate_xml(indent_level, self.currency)?);
        }
        out.push_str(&xml::pad(indent_level));
        out.push_str("</tetelek>\n");

        if let Some(payments) = &self.payments {
            out.push_str(&xml::pad(indent_level));
            out.push_str("<kifizetesek>\n");
            for payment in payments {
                out.push_str(&payment.generate_xml(indent_level)?);
            }
            out.push_str(&xml::pad(indent_level));
            out.push_str("</kifizetesek>\n");
        }

        Ok(out)
    }
}
