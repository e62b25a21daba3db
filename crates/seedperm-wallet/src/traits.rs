//! Validator and deriver traits consumed by the search engine

use thiserror::Error;

/// Why a phrase could not be turned into an address
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeriveError {
    #[error("Invalid mnemonic: {0}")]
    InvalidMnemonic(String),
    #[error("Key derivation failed: {0}")]
    Derivation(String),
    #[error("Invalid derived key: {0}")]
    InvalidKey(String),
    #[error("Address encoding failed: {0}")]
    Encoding(String),
    #[error("{coin} has no {kind} addresses")]
    UnsupportedAddressKind { coin: &'static str, kind: String },
    #[error("Target address does not match {0}")]
    TargetMismatch(String),
}

/// Checksum / word-list validation of a candidate phrase.
///
/// Malformed input must yield `false`; implementations never panic on it.
pub trait PhraseValidator: Send + Sync {
    fn is_valid(&self, phrase: &str) -> bool;
}

/// Deterministic phrase → address derivation.
pub trait AddressDeriver: Send + Sync {
    fn derive_address(&self, phrase: &str) -> Result<String, DeriveError>;
}

impl<F> PhraseValidator for F
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn is_valid(&self, phrase: &str) -> bool {
        self(phrase)
    }
}

impl<F> AddressDeriver for F
where
    F: Fn(&str) -> Result<String, DeriveError> + Send + Sync,
{
    fn derive_address(&self, phrase: &str) -> Result<String, DeriveError> {
        self(phrase)
    }
}
