use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

const MONTHS_PER_YEAR: u32 = 12;

/// How often an income figure is earned.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IncomePeriod {
    #[default]
    Monthly,
    Annual,
}

impl IncomePeriod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Monthly => "monthly",
            Self::Annual => "annual",
        }
    }

    /// Accepts the English codes and the Spanish ones used by SUNAT forms.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "monthly" | "mensual" => Some(Self::Monthly),
            "annual" | "anual" => Some(Self::Annual),
            _ => None,
        }
    }

    /// Annual equivalent of `amount`, or `None` if it does not fit in a
    /// [`Decimal`].
    pub fn annualize(
        &self,
        amount: Decimal,
    ) -> Option<Decimal> {
        match self {
            Self::Monthly => amount.checked_mul(Decimal::from(MONTHS_PER_YEAR)),
            Self::Annual => Some(amount),
        }
    }
}

impl std::fmt::Display for IncomePeriod {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
