//! Invoice line items and the price calculator shared with receipt items.

use rust_decimal::{Decimal, RoundingStrategy};

use crate::constants::Currency;
use crate::error::{Error, Result};
use crate::xml::{self, Value, field, opt};

/// Standard commercial rounding: half away from zero at `exp` decimals.
pub(crate) fn round(value: Decimal, exp: u32) -> Decimal {
    value.round_dp_with_strategy(exp, RoundingStrategy::MidpointAwayFromZero)
}

/// The closed set of VAT exemption codes the service recognizes. Any of
/// these forces a zero VAT value regardless of the price magnitude.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VatExemption {
    Tam,
    Aam,
    Eu,
    Euk,
    Maa,
    Akk,
    Tehk,
    Ho,
    Kbaet,
}

impl VatExemption {
    pub const ALL: [Self; 9] = [
        Self::Tam,
        Self::Aam,
        Self::Eu,
        Self::Euk,
        Self::Maa,
        Self::Akk,
        Self::Tehk,
        Self::Ho,
        Self::Kbaet,
    ];

    #[must_use]
    pub fn wire_value(self) -> &'static str {
        match self {
            Self::Tam => "TAM",
            Self::Aam => "AAM",
            Self::Eu => "EU",
            Self::Euk => "EUK",
            Self::Maa => "MAA",
            Self::Akk => "ÁKK",
            Self::Tehk => "TEHK",
            Self::Ho => "HO",
            Self::Kbaet => "KBAET",
        }
    }
}

/// A line item's VAT declaration.
///
/// `Unhandled` carries a vat string outside both the numeric and the
/// exemption domain. The service accepts such categories, but this crate
/// cannot derive totals for them: the item renders without computed values.
#[derive(Debug, Clone, PartialEq)]
pub enum Vat {
    /// A numeric percentage, e.g. 27 for the standard Hungarian rate.
    Percent(Decimal),
    /// One of the fixed exemption codes; VAT value is always zero.
    Exempt(VatExemption),
    /// A vat category this crate does not model; totals stay uncomputed.
    Unhandled(String),
}

impl Vat {
    #[must_use]
    pub fn percent(rate: impl Into<Decimal>) -> Self {
        Self::Percent(rate.into())
    }

    fn to_value(&self) -> Value {
        match self {
            Self::Percent(rate) => Value::Number(*rate),
            Self::Exempt(code) => code.wire_value().into(),
            Self::Unhandled(raw) => raw.as_str().into(),
        }
    }
}

/// Amounts derived from a line item's quantity, vat, and one unit price.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ItemPrices {
    pub net_unit_price: Decimal,
    pub net_value: Decimal,
    pub vat_value: Decimal,
    pub gross_value: Decimal,
}

/// Derives the full price breakdown from a partial price input.
///
/// Exactly one of `net_unit_price`/`gross_unit_price` is expected; when both
/// are present the net price wins. Returns `Ok(None)` for an unhandled vat
/// string — the caller renders the item without totals in that case.
pub(crate) fn compute_prices(
    quantity: Decimal,
    vat: &Vat,
    net_unit_price: Option<Decimal>,
    gross_unit_price: Option<Decimal>,
    round_exp: u32,
) -> Result<Option<ItemPrices>> {
    let hundred = Decimal::from(100);

    let rate = match vat {
        // Rates at or below -100% would make the gross formula divide by a
        // non-positive denominator.
        Vat::Percent(rate) if *rate <= -hundred => {
            return Err(Error::validation(
                "vat percentage must be greater than -100",
            ));
        }
        Vat::Percent(rate) => *rate,
        Vat::Exempt(_) => Decimal::ZERO,
        Vat::Unhandled(_) => return Ok(None),
    };

    match (net_unit_price, gross_unit_price) {
        (Some(net), _) => {
            let net_value = round(net * quantity, round_exp);
            let vat_value = round(net_value * rate / hundred, round_exp);
            Ok(Some(ItemPrices {
                net_unit_price: net,
                net_value,
                vat_value,
                gross_value: net_value + vat_value,
            }))
        }
        (None, Some(gross)) => {
            let gross_value = round(gross * quantity, round_exp);
            let vat_value = round(gross_value / (rate + hundred) * rate, round_exp);
            let net_value = gross_value - vat_value;
            Ok(Some(ItemPrices {
                net_unit_price: round(net_value / quantity, 2),
                net_value,
                vat_value,
                gross_value,
            }))
        }
        (None, None) => Err(Error::validation(
            "net or gross unit price is required for item price calculation",
        )),
    }
}

/// One sold item on an invoice.
#[derive(Debug, Clone)]
pub struct Item {
    pub label: String,
    pub quantity: Decimal,
    pub unit: Option<String>,
    pub vat: Vat,
    pub net_unit_price: Option<Decimal>,
    pub gross_unit_price: Option<Decimal>,
    pub comment: Option<String>,
}

impl Item {
    /// A quantity-1 item; prices are set afterwards on the public fields.
    #[must_use]
    pub fn new(label: impl Into<String>, vat: Vat) -> Self {
        Self {
            label: label.into(),
            quantity: Decimal::ONE,
            unit: None,
            vat,
            net_unit_price: None,
            gross_unit_price: None,
            comment: None,
        }
    }

    fn validate(&self) -> Result<()> {
        if self.label.trim().is_empty() {
            return Err(Error::validation(
                "valid label value missing from item options",
            ));
        }
        if self.quantity.is_zero() {
            return Err(Error::validation(
                "valid quantity value missing from item options",
            ));
        }
        if let Vat::Unhandled(raw) = &self.vat
            && raw.is_empty()
        {
            return Err(Error::validation(
                "valid vat percentage value missing from item options",
            ));
        }
        Ok(())
    }

    /// Derives the price breakdown using the invoice currency's rounding
    /// exponent. Pure: repeated calls with the same inputs give the same
    /// result.
    pub fn compute_prices(&self, currency: Currency) -> Result<Option<ItemPrices>> {
        self.validate()?;
        compute_prices(
            self.quantity,
            &self.vat,
            self.net_unit_price,
            self.gross_unit_price,
            currency.round_price_exp(),
        )
    }

    pub fn generate_xml(&self, indent_level: usize, currency: Currency) -> Result<String> {
        let prices = self.compute_prices(currency)?;

        let net_unit_price = prices
            .as_ref()
            .map(|p| p.net_unit_price)
            .or(self.net_unit_price);

        let fields = vec![
            field("megnevezes", self.label.as_str()),
            field("mennyiseg", self.quantity),
            opt("mennyisegiEgyseg", self.unit.as_deref()),
            opt("nettoEgysegar", net_unit_price),
            ("afakulcs", Some(self.vat.to_value())),
            opt("nettoErtek", prices.as_ref().map(|p| p.net_value)),
            opt("afaErtek", prices.as_ref().map(|p| p.vat_value)),
            opt("bruttoErtek", prices.as_ref().map(|p| p.gross_value)),
            opt("megjegyzes", self.comment.as_deref()),
        ];

        Ok(xml::render_element(
            "tetel",
            &Value::Elements(fields),
            indent_level,
        ))
    }
}
