// file: src/models/indicator.rs
// description: indicator kinds and validated indicator values
// reference: stix ioc standards

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CoinType {
    Bitcoin,
}

impl CoinType {
    pub const ALL: [CoinType; 1] = [CoinType::Bitcoin];

    pub fn from_ticker(ticker: &str) -> Option<Self> {
        match ticker.to_ascii_lowercase().as_str() {
            "btc" | "bitcoin" => Some(CoinType::Bitcoin),
            _ => None,
        }
    }

    pub fn ticker(&self) -> &'static str {
        match self {
            CoinType::Bitcoin => "btc",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum IndicatorKind {
    Email,
    Ipv4,
    CryptoAddress(CoinType),
}

impl IndicatorKind {
    /// Name written to the `type` column of the report.
    pub fn as_str(&self) -> &'static str {
        match self {
            IndicatorKind::Email => "email",
            IndicatorKind::Ipv4 => "ipv4",
            IndicatorKind::CryptoAddress(coin) => coin.ticker(),
        }
    }
}

impl fmt::Display for IndicatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A validated indicator. Ordering is by kind, then value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Indicator {
    pub kind: IndicatorKind,
    pub value: String,
}

impl Indicator {
    pub fn new(kind: IndicatorKind, value: impl Into<String>) -> Self {
        Self {
            kind,
            value: value.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_names() {
        assert_eq!(IndicatorKind::Email.as_str(), "email");
        assert_eq!(IndicatorKind::Ipv4.as_str(), "ipv4");
        assert_eq!(
            IndicatorKind::CryptoAddress(CoinType::Bitcoin).to_string(),
            "btc"
        );
    }

    #[test]
    fn test_ticker_lookup() {
        assert_eq!(CoinType::from_ticker("BTC"), Some(CoinType::Bitcoin));
        assert_eq!(CoinType::from_ticker("eth"), None);
    }

    #[test]
    fn test_ordering_groups_by_kind() {
        let mut indicators = vec![
            Indicator::new(IndicatorKind::Ipv4, "8.8.8.8"),
            Indicator::new(IndicatorKind::Email, "z@example.org"),
            Indicator::new(IndicatorKind::Email, "a@example.org"),
        ];
        indicators.sort();

        assert_eq!(indicators[0].value, "a@example.org");
        assert_eq!(indicators[2].kind, IndicatorKind::Ipv4);
    }
}
