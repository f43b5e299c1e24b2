use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One progressive bracket, bounded in multiples of the tax unit (UIT).
///
/// `upper_uit` is `None` for the open-ended top bracket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxBracket {
    pub lower_uit: Decimal,
    pub upper_uit: Option<Decimal>,
    pub rate: Decimal,
}

impl TaxBracket {
    pub fn new(
        lower_uit: Decimal,
        upper_uit: Option<Decimal>,
        rate: Decimal,
    ) -> Self {
        Self {
            lower_uit,
            upper_uit,
            rate,
        }
    }

    pub fn is_open(&self) -> bool {
        self.upper_uit.is_none()
    }
}
