//! BIP39 phrase validation and BIP44/BIP84 first-address derivation

use bip39::{Language, Mnemonic};
use bitcoin::bip32::{ChildNumber, DerivationPath, Xpriv};
use bitcoin::secp256k1::{All, Secp256k1};
use bitcoin::Network;
use seedperm_crypto::{
    Secp256k1Keypair,
    hash::hash160,
    encoding::{base58check_decode, base58check_encode, segwit_decode, segwit_v0_encode},
};

use crate::coin::{AddressKind, Coin};
use crate::traits::{AddressDeriver, DeriveError, PhraseValidator};

/// Word counts BIP39 defines a checksum for
pub const MNEMONIC_LENGTHS: [usize; 5] = [12, 15, 18, 21, 24];

/// Wallet that checks phrases against the English BIP39 list and derives the
/// first external address `m/purpose'/coin'/0'/0/0`.
#[derive(Debug)]
pub struct Bip44Wallet {
    coin: Coin,
    kind: AddressKind,
    passphrase: String,
    path: DerivationPath,
    secp: Secp256k1<All>,
}

impl Bip44Wallet {
    /// Create a wallet for `coin`/`kind`.
    ///
    /// `passphrase` is the optional BIP39 passphrase and must already be NFKD
    /// normalised (any ASCII string is).
    pub fn new(coin: Coin, kind: AddressKind, passphrase: impl Into<String>) -> Result<Self, DeriveError> {
        if !coin.supports(kind) {
            return Err(DeriveError::UnsupportedAddressKind {
                coin: coin.ticker(),
                kind: kind.to_string(),
            });
        }

        let path = first_address_path(kind.purpose(), coin.coin_type())?;

        Ok(Self {
            coin,
            kind,
            passphrase: passphrase.into(),
            path,
            secp: Secp256k1::new(),
        })
    }

    pub fn coin(&self) -> Coin {
        self.coin
    }

    pub fn address_kind(&self) -> AddressKind {
        self.kind
    }

    /// Derivation path in `m/44'/0'/0'/0/0` notation
    pub fn derivation_path(&self) -> String {
        format!("m/{}'/{}'/0'/0/0", self.kind.purpose(), self.coin.coin_type())
    }

    /// Words that are not in the English BIP39 list; any such word makes every
    /// ordering invalid.
    pub fn unknown_words<S: AsRef<str>>(&self, words: &[S]) -> Vec<String> {
        words
            .iter()
            .map(AsRef::as_ref)
            .filter(|w| Language::English.find_word(w).is_none())
            .map(str::to_string)
            .collect()
    }

    /// Check that `target` decodes as an address of this wallet's coin and kind
    pub fn check_target(&self, target: &str) -> Result<(), DeriveError> {
        let expected = format!("{} {}", self.coin.ticker(), self.kind);

        match self.kind {
            AddressKind::P2pkh => {
                let (version, payload) = base58check_decode(target)
                    .map_err(|e| DeriveError::TargetMismatch(format!("{expected}: {e}")))?;
                if version != self.coin.p2pkh_version() || payload.len() != 20 {
                    return Err(DeriveError::TargetMismatch(expected));
                }
            }
            AddressKind::P2wpkh => {
                let (hrp, version, program) = segwit_decode(target)
                    .map_err(|e| DeriveError::TargetMismatch(format!("{expected}: {e}")))?;
                if Some(hrp.as_str()) != self.coin.bech32_hrp() || version != 0 || program.len() != 20 {
                    return Err(DeriveError::TargetMismatch(expected));
                }
            }
        }

        Ok(())
    }

    fn encode(&self, keypair: &Secp256k1Keypair) -> Result<String, DeriveError> {
        let h160 = hash160(&keypair.public_key_compressed());

        match self.kind {
            AddressKind::P2pkh => Ok(base58check_encode(self.coin.p2pkh_version(), &h160)),
            AddressKind::P2wpkh => {
                let hrp = self.coin.bech32_hrp().ok_or_else(|| DeriveError::UnsupportedAddressKind {
                    coin: self.coin.ticker(),
                    kind: self.kind.to_string(),
                })?;
                segwit_v0_encode(hrp, &h160).map_err(|e| DeriveError::Encoding(e.to_string()))
            }
        }
    }
}

/// Whether `count` words can form a BIP39 mnemonic at all
pub fn is_mnemonic_length(count: usize) -> bool {
    MNEMONIC_LENGTHS.contains(&count)
}

fn first_address_path(purpose: u32, coin_type: u32) -> Result<DerivationPath, DeriveError> {
    let hardened = |i| ChildNumber::from_hardened_idx(i).map_err(|e| DeriveError::Derivation(e.to_string()));
    let normal = |i| ChildNumber::from_normal_idx(i).map_err(|e| DeriveError::Derivation(e.to_string()));

    Ok(DerivationPath::from(vec![
        hardened(purpose)?,
        hardened(coin_type)?,
        hardened(0)?,
        normal(0)?,
        normal(0)?,
    ]))
}

impl PhraseValidator for Bip44Wallet {
    fn is_valid(&self, phrase: &str) -> bool {
        Mnemonic::parse_in_normalized(Language::English, phrase).is_ok()
    }
}

/// Derivation trusts the checksum to the validator, which the search always
/// runs first; only the word list and word count are checked here.
impl AddressDeriver for Bip44Wallet {
    fn derive_address(&self, phrase: &str) -> Result<String, DeriveError> {
        let mnemonic = Mnemonic::parse_in_normalized_without_checksum_check(Language::English, phrase)
            .map_err(|e| DeriveError::InvalidMnemonic(e.to_string()))?;
        let seed = mnemonic.to_seed_normalized(&self.passphrase);

        let master = Xpriv::new_master(Network::Bitcoin, &seed)
            .map_err(|e| DeriveError::Derivation(e.to_string()))?;
        let child = master
            .derive_priv(&self.secp, &self.path)
            .map_err(|e| DeriveError::Derivation(e.to_string()))?;

        let keypair = Secp256k1Keypair::from_bytes(&child.private_key.secret_bytes())
            .map_err(|e| DeriveError::InvalidKey(e.to_string()))?;

        self.encode(&keypair)
    }
}
