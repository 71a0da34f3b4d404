//! Payment type discriminator.

use serde::{Deserialize, Serialize};

/// How an order is paid for.
///
/// This is the sole discriminator for checkout branching: `Cash` and `Bank`
/// orders are processed directly, `Gateway` orders go through a hosted
/// payment page. Matching is exhaustive everywhere so adding a payment type
/// is a compile-time-checked change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentType {
    /// Pay on delivery.
    Cash,
    /// Bank transfer with a proof-of-payment receipt.
    Bank,
    /// Hosted gateway redirect.
    Gateway,
}

impl std::fmt::Display for PaymentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cash => write!(f, "cash"),
            Self::Bank => write!(f, "bank"),
            Self::Gateway => write!(f, "gateway"),
        }
    }
}

impl std::str::FromStr for PaymentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cash" => Ok(Self::Cash),
            "bank" => Ok(Self::Bank),
            "gateway" => Ok(Self::Gateway),
            _ => Err(format!("invalid payment type: {s}")),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_from_str_round_trip() {
        for variant in [PaymentType::Cash, PaymentType::Bank, PaymentType::Gateway] {
            let parsed: PaymentType = variant.to_string().parse().unwrap();
            assert_eq!(parsed, variant);
        }
    }

    #[test]
    fn test_from_str_rejects_unknown() {
        assert!("wire-transfer".parse::<PaymentType>().is_err());
    }

    #[test]
    fn test_serde_snake_case() {
        let json = serde_json::to_string(&PaymentType::Gateway).unwrap();
        assert_eq!(json, "\"gateway\"");
        let parsed: PaymentType = serde_json::from_str("\"bank\"").unwrap();
        assert_eq!(parsed, PaymentType::Bank);
    }
}
