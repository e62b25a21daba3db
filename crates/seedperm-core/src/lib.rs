//! Seedperm Core Engine
//!
//! Multi-threaded search over the orderings of a set of mnemonic words for
//! the one whose first derived address equals a known target.

mod error;
mod partition;
mod permute;
mod progress;
mod search;
mod stats;
mod worker;

pub use error::SearchError;
pub use partition::{static_chunks, work_source, DynamicBatches, Partition, SearchUnit, StaticChunks, WorkSource};
pub use permute::{count_orderings, next_permutation, Candidate, Enumeration, Orderings, Permutations, SeedSet};
pub use progress::ProgressReporter;
pub use search::{SearchConfig, SearchOutcome, SearchReport, SeedSearch};
pub use stats::{SearchPhase, SearchStats};
pub use worker::Match;

// Re-exports for convenience
pub use seedperm_wallet::{
    all_coins, get_coin, parse_address_kind, AddressDeriver, AddressKind, Bip44Wallet, Coin, DeriveError,
    PhraseValidator,
};
