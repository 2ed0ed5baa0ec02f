//! Sealed value-object enumerations used by the document entities.
//!
//! Each variant carries the exact wire value the service expects. Because
//! these are plain Rust enums, "is this a legitimate instance" is a
//! tag-membership check the type system performs for free.

use std::fmt;

/// Invoice currency, with the decimal places the service rounds monetary
/// values to in that currency.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Currency {
    /// Hungarian Forint, written as `Ft`.
    #[default]
    Ft,
    /// Hungarian Forint, written as `HUF`.
    Huf,
    Eur,
    Chf,
    Usd,
    Aud,
    Aed,
    Bgn,
    Cad,
    Cny,
    Czk,
    Dkk,
    Eek,
    Gbp,
    Hrk,
    Isk,
    Jpy,
    Ltl,
    Lvl,
    Nok,
    Nzd,
    Pln,
    Ron,
    Rub,
    Sek,
    Skk,
    Uah,
}

impl Currency {
    #[must_use]
    pub fn wire_value(self) -> &'static str {
        match self {
            Self::Ft => "Ft",
            Self::Huf => "HUF",
            Self::Eur => "EUR",
            Self::Chf => "CHF",
            Self::Usd => "USD",
            Self::Aud => "AUD",
            Self::Aed => "AED",
            Self::Bgn => "BGN",
            Self::Cad => "CAD",
            Self::Cny => "CNY",
            Self::Czk => "CZK",
            Self::Dkk => "DKK",
            Self::Eek => "EEK",
            Self::Gbp => "GBP",
            Self::Hrk => "HRK",
            Self::Isk => "ISK",
            Self::Jpy => "JPY",
            Self::Ltl => "LTL",
            Self::Lvl => "LVL",
            Self::Nok => "NOK",
            Self::Nzd => "NZD",
            Self::Pln => "PLN",
            Self::Ron => "RON",
            Self::Rub => "RUB",
            Self::Sek => "SEK",
            Self::Skk => "SKK",
            Self::Uah => "UAH",
        }
    }

    /// Decimal places for monetary rounding: 0 for zero-decimal currencies.
    #[must_use]
    pub fn round_price_exp(self) -> u32 {
        match self {
            Self::Ft | Self::Huf | Self::Jpy => 0,
            _ => 2,
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_value())
    }
}

/// Language of the generated document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Language {
    #[default]
    Hungarian,
    English,
    German,
    Italian,
    Romanian,
    Slovak,
    Croatian,
    French,
    Spanish,
    Czech,
    Polish,
}

impl Language {
    #[must_use]
    pub fn wire_value(self) -> &'static str {
        match self {
            Self::Hungarian => "hu",
            Self::English => "en",
            Self::German => "de",
            Self::Italian => "it",
            Self::Romanian => "ro",
            Self::Slovak => "sk",
            Self::Croatian => "hr",
            Self::French => "fr",
            Self::Spanish => "es",
            Self::Czech => "cz",
            Self::Polish => "pl",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_value())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PaymentMethod {
    Cash,
    #[default]
    BankTransfer,
    CreditCard,
    PayPal,
}

impl PaymentMethod {
    #[must_use]
    pub fn wire_value(self) -> &'static str {
        match self {
            Self::Cash => "készpénz",
            Self::BankTransfer => "átutalás",
            Self::CreditCard => "bankkártya",
            Self::PayPal => "PayPal",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_value())
    }
}

/// The buyer's tax status, sent as a numeric code.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TaxSubject {
    NonEuCompany,
    EuCompany,
    HasTaxNumber,
    #[default]
    Unknown,
    NoTaxNumber,
}

impl TaxSubject {
    #[must_use]
    pub fn wire_value(self) -> i64 {
        match self {
            Self::NonEuCompany => 7,
            Self::EuCompany => 6,
            Self::HasTaxNumber => 1,
            Self::Unknown => 0,
            Self::NoTaxNumber => -1,
        }
    }
}
