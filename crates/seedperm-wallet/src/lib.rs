//! seedperm wallet adapters
//!
//! The phrase validator / address deriver seam used by the search engine,
//! and a BIP39 + BIP44/BIP84 implementation of it for UTXO coins.

pub mod traits;
pub mod coin;
pub mod bip44;

// Re-exports
pub use traits::{AddressDeriver, DeriveError, PhraseValidator};
pub use coin::{AddressKind, Coin, all_coins, get_coin, parse_address_kind};
pub use bip44::{Bip44Wallet, MNEMONIC_LENGTHS, is_mnemonic_length};
