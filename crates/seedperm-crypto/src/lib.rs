//! seedperm crypto primitives
//!
//! Hashing, secp256k1 public key serialisation and address encodings used to
//! turn a derived private key into a comparable address string.

pub mod secp256k1;
pub mod hash;
pub mod encoding;

pub use self::secp256k1::Secp256k1Keypair;
