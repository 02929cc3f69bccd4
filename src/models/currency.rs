//! Display currency preference.

use serde::{Deserialize, Serialize};

/// ISO 4217 currency code used for display formatting only.
///
/// Stored magnitudes are currency-agnostic; switching the currency changes
/// how amounts are rendered, never their values.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Currency(String);

impl Currency {
    /// Code used when no preference has been stored.
    pub const DEFAULT_CODE: &'static str = "USD";

    /// Creates a currency from a code, upper-casing it.
    #[inline]
    #[must_use]
    pub fn new(code: &str) -> Self {
        Self(code.trim().to_ascii_uppercase())
    }

    /// The currency code, e.g. `"EUR"`.
    #[inline]
    #[must_use]
    pub fn code(&self) -> &str {
        &self.0
    }

    /// Conventional symbol for well-known codes.
    #[inline]
    #[must_use]
    pub fn symbol(&self) -> Option<&'static str> {
        match self.0.as_str() {
            "USD" => Some("$"),
            "EUR" => Some("\u{20ac}"),
            "GBP" => Some("\u{a3}"),
            "JPY" => Some("\u{a5}"),
            "INR" => Some("\u{20b9}"),
            "KRW" => Some("\u{20a9}"),
            "CAD" => Some("CA$"),
            "AUD" => Some("A$"),
            "CNY" => Some("CN\u{a5}"),
            "MXN" => Some("MX$"),
            "BRL" => Some("R$"),
            _ => None,
        }
    }

    /// Number of minor-unit digits shown when formatting.
    #[inline]
    #[must_use]
    pub fn fraction_digits(&self) -> usize {
        match self.0.as_str() {
            "JPY" | "KRW" | "VND" | "CLP" | "ISK" => 0,
            _ => 2,
        }
    }
}

impl Default for Currency {
    #[inline]
    fn default() -> Self {
        Self(Self::DEFAULT_CODE.to_owned())
    }
}

impl core::fmt::Display for Currency {
    #[inline]
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_usd() {
        assert_eq!(Currency::default().code(), "USD");
        assert_eq!(Currency::default().symbol(), Some("$"));
    }

    #[test]
    fn new_normalizes_case() {
        assert_eq!(Currency::new(" eur ").code(), "EUR");
    }

    #[test]
    fn unknown_code_has_no_symbol() {
        let chf = Currency::new("CHF");
        assert_eq!(chf.symbol(), None);
        assert_eq!(chf.fraction_digits(), 2);
        assert_eq!(Currency::new("JPY").fraction_digits(), 0);
    }

    #[test]
    fn serde_transparent() {
        let json = serde_json::to_string(&Currency::new("GBP")).unwrap();
        assert_eq!(json, r#""GBP""#);
    }
}
