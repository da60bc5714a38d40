//! Payment method accepted at checkout.

use serde::{Deserialize, Serialize};

/// How an order is paid for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Cash,
    Credit,
}

impl PaymentMethod {
    /// Parses a payment method, ignoring case and surrounding whitespace.
    ///
    /// Returns `None` for anything other than `cash` or `credit`.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cash" => Some(Self::Cash),
            "credit" => Some(Self::Credit),
            _ => None,
        }
    }

    /// Returns the canonical lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cash => "cash",
            Self::Credit => "credit",
        }
    }
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_accepts_known_methods() {
        assert_eq!(PaymentMethod::parse("cash"), Some(PaymentMethod::Cash));
        assert_eq!(PaymentMethod::parse("credit"), Some(PaymentMethod::Credit));
    }

    #[test]
    fn parse_ignores_case_and_whitespace() {
        assert_eq!(PaymentMethod::parse(" Cash "), Some(PaymentMethod::Cash));
        assert_eq!(PaymentMethod::parse("CREDIT"), Some(PaymentMethod::Credit));
    }

    #[test]
    fn parse_rejects_unknown_methods() {
        assert_eq!(PaymentMethod::parse("bitcoin"), None);
        assert_eq!(PaymentMethod::parse(""), None);
    }

    #[test]
    fn serializes_lowercase() {
        let json = serde_json::to_string(&PaymentMethod::Credit).unwrap();
        assert_eq!(json, "\"credit\"");
        let back: PaymentMethod = serde_json::from_str("\"cash\"").unwrap();
        assert_eq!(back, PaymentMethod::Cash);
    }
}
