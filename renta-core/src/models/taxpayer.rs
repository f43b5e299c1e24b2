//! SUNAT access credentials collected before a calculation is requested.
//!
//! These never reach the calculator; they are shaped and checked here so
//! every front end applies the same rules.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

static DIGITS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[0-9]+$").unwrap());

const DNI_LENGTH: usize = 8;
const RUC_LENGTH: usize = 11;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CredentialError {
    #[error("{document_type} must have exactly {expected} digits, got {found}")]
    InvalidLength {
        document_type: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("{0} may only contain digits")]
    NonNumeric(&'static str),

    #[error("SOL username is required for RUC")]
    MissingUsername,

    #[error("SOL key is required")]
    MissingSolKey,
}

/// Credentials, tagged by document type. DNI holders log in with the
/// document alone; RUC holders also need a SOL username.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "documentType")]
pub enum TaxpayerCredentials {
    #[serde(rename = "DNI")]
    Dni {
        document: String,
        #[serde(rename = "solKey")]
        sol_key: String,
    },
    #[serde(rename = "RUC")]
    Ruc {
        document: String,
        username: String,
        #[serde(rename = "solKey")]
        sol_key: String,
    },
}

impl TaxpayerCredentials {
    pub fn document_type(&self) -> &'static str {
        match self {
            Self::Dni { .. } => "DNI",
            Self::Ruc { .. } => "RUC",
        }
    }

    pub fn document(&self) -> &str {
        match self {
            Self::Dni { document, .. } | Self::Ruc { document, .. } => document,
        }
    }

    /// Document number with all but the last three digits hidden.
    pub fn masked_document(&self) -> String {
        let document = self.document();
        let hidden = document.chars().count().saturating_sub(3);
        document
            .chars()
            .enumerate()
            .map(|(i, c)| if i < hidden { '*' } else { c })
            .collect()
    }

    /// # Errors
    ///
    /// Returns the first [`CredentialError`] found.
    pub fn validate(&self) -> Result<(), CredentialError> {
        let (expected, sol_key) = match self {
            Self::Dni { sol_key, .. } => (DNI_LENGTH, sol_key),
            Self::Ruc {
                username, sol_key, ..
            } => {
                if username.trim().is_empty() {
                    return Err(CredentialError::MissingUsername);
                }
                (RUC_LENGTH, sol_key)
            }
        };

        let document = self.document();
        if document.chars().count() != expected {
            return Err(CredentialError::InvalidLength {
                document_type: self.document_type(),
                expected,
                found: document.chars().count(),
            });
        }
        if !DIGITS.is_match(document) {
            return Err(CredentialError::NonNumeric(self.document_type()));
        }
        if sol_key.is_empty() {
            return Err(CredentialError::MissingSolKey);
        }
        Ok(())
    }
}

// Keeps the SOL key out of logs.
impl std::fmt::Debug for TaxpayerCredentials {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("TaxpayerCredentials")
            .field("document_type", &self.document_type())
            .field("document", &self.masked_document())
            .finish_non_exhaustive()
    }
}
