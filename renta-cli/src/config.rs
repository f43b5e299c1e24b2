//! Rate-table configuration.
//!
//! A table file is plain TOML mirroring [`RateTable`]. Amounts are best
//! written as strings so they reach [`rust_decimal::Decimal`] unchanged:
//!
//! ```toml
//! tax_year = 2025
//! monetary_unit = "5350"
//! fixed_deduction_units = "7"
//! professional_fee_deduction_rate = "0.20"
//! expense_cap_units = "3"
//!
//! [[brackets]]
//! lower_uit = "0"
//! upper_uit = "5"
//! rate = "0.08"
//!
//! # ...
//!
//! [[brackets]]
//! lower_uit = "45"
//! rate = "0.30"
//! ```
//!
//! Leave `upper_uit` out of the last bracket to make it open-ended.
use std::path::{Path, PathBuf};

use renta_core::{RateTable, RateTableError};
use tracing::info;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read rate table '{path}': {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("malformed rate table '{path}': {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("invalid rate table '{path}': {source}")]
    Invalid {
        path: PathBuf,
        source: RateTableError,
    },
}

/// Parses a TOML rate table. Validation is left to the caller.
pub fn parse_rate_table(input: &str) -> Result<RateTable, toml::de::Error> {
    toml::from_str(input)
}

/// Loads the table at `path`, or the built-in 2024 table when `path` is
/// `None`.
///
/// # Errors
///
/// * [`ConfigError::Read`] if the file cannot be read.
/// * [`ConfigError::Parse`] if it is not a well-formed table.
/// * [`ConfigError::Invalid`] if the brackets or constants are inconsistent.
pub fn load_rate_table(path: Option<&Path>) -> Result<RateTable, ConfigError> {
    let Some(path) = path else {
        return Ok(RateTable::peru_2024());
    };

    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let table = parse_rate_table(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    table.validate().map_err(|source| ConfigError::Invalid {
        path: path.to_path_buf(),
        source,
    })?;

    info!(
        path = %path.display(),
        tax_year = table.tax_year,
        monetary_unit = %table.monetary_unit,
        "rate table loaded"
    );
    Ok(table)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use renta_core::TaxBracket;
    use rust_decimal_macros::dec;

    use super::*;

    const TABLE_2025: &str = r#"
tax_year = 2025
monetary_unit = "5350"
fixed_deduction_units = "7"
professional_fee_deduction_rate = "0.20"
expense_cap_units = "3"

[[brackets]]
lower_uit = "0"
upper_uit = "5"
rate = "0.08"

[[brackets]]
lower_uit = "5"
upper_uit = "20"
rate = "0.14"

[[brackets]]
lower_uit = "20"
upper_uit = "35"
rate = "0.17"

[[brackets]]
lower_uit = "35"
upper_uit = "45"
rate = "0.20"

[[brackets]]
lower_uit = "45"
rate = "0.30"
"#;

    #[test]
    fn no_path_uses_built_in_table() {
        assert_eq!(load_rate_table(None).unwrap(), RateTable::peru_2024());
    }

    #[test]
    fn parses_a_full_table() {
        let table = parse_rate_table(TABLE_2025).expect("table should parse");

        assert_eq!(table.tax_year, 2025);
        assert_eq!(table.monetary_unit, dec!(5350));
        assert_eq!(table.fixed_deduction(), dec!(37450));
        assert_eq!(table.brackets.len(), 5);
        assert_eq!(
            table.brackets[4],
            TaxBracket::new(dec!(45), None, dec!(0.30))
        );
        assert_eq!(table.validate(), Ok(()));
    }

    #[test]
    fn missing_field_is_a_parse_error() {
        let input = TABLE_2025.replace("expense_cap_units = \"3\"\n", "");

        assert!(parse_rate_table(&input).is_err());
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let result = load_rate_table(Some(Path::new("/nonexistent/renta/rates.toml")));

        assert!(matches!(result, Err(ConfigError::Read { .. })));
    }
}
