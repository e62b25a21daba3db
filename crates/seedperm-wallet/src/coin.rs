//! Coin parameters and address kinds

use serde::{Deserialize, Serialize};
use std::fmt;

// P2PKH version bytes
const BTC_P2PKH_VERSION: u8 = 0x00; // 1 prefix
const TBTC_P2PKH_VERSION: u8 = 0x6F; // m/n prefix
const LTC_P2PKH_VERSION: u8 = 0x30; // L prefix
const DOGE_P2PKH_VERSION: u8 = 0x1E; // D prefix

/// Coins with a registered SLIP-44 coin type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Coin {
    Bitcoin,
    BitcoinTestnet,
    Litecoin,
    Dogecoin,
}

/// Public-key-hash address flavour, which also fixes the BIP43 purpose
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AddressKind {
    /// Legacy P2PKH, BIP44 (m/44'/...)
    #[default]
    P2pkh,
    /// Native SegWit P2WPKH, BIP84 (m/84'/...)
    P2wpkh,
}

impl Coin {
    /// Ticker symbol (e.g. "BTC")
    pub fn ticker(&self) -> &'static str {
        match self {
            Coin::Bitcoin => "BTC",
            Coin::BitcoinTestnet => "TBTC",
            Coin::Litecoin => "LTC",
            Coin::Dogecoin => "DOGE",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Coin::Bitcoin => "Bitcoin",
            Coin::BitcoinTestnet => "Bitcoin Testnet",
            Coin::Litecoin => "Litecoin",
            Coin::Dogecoin => "Dogecoin",
        }
    }

    /// SLIP-44 coin type, the hardened second path level
    pub fn coin_type(&self) -> u32 {
        match self {
            Coin::Bitcoin => 0,
            Coin::BitcoinTestnet => 1,
            Coin::Litecoin => 2,
            Coin::Dogecoin => 3,
        }
    }

    pub fn p2pkh_version(&self) -> u8 {
        match self {
            Coin::Bitcoin => BTC_P2PKH_VERSION,
            Coin::BitcoinTestnet => TBTC_P2PKH_VERSION,
            Coin::Litecoin => LTC_P2PKH_VERSION,
            Coin::Dogecoin => DOGE_P2PKH_VERSION,
        }
    }

    /// Bech32 human-readable part, `None` for coins without SegWit
    pub fn bech32_hrp(&self) -> Option<&'static str> {
        match self {
            Coin::Bitcoin => Some("bc"),
            Coin::BitcoinTestnet => Some("tb"),
            Coin::Litecoin => Some("ltc"),
            Coin::Dogecoin => None,
        }
    }

    pub fn address_kinds(&self) -> Vec<AddressKind> {
        if self.bech32_hrp().is_some() {
            vec![AddressKind::P2pkh, AddressKind::P2wpkh]
        } else {
            vec![AddressKind::P2pkh]
        }
    }

    pub fn supports(&self, kind: AddressKind) -> bool {
        self.address_kinds().contains(&kind)
    }
}

impl AddressKind {
    /// BIP43 purpose field
    pub fn purpose(&self) -> u32 {
        match self {
            AddressKind::P2pkh => 44,
            AddressKind::P2wpkh => 84,
        }
    }
}

impl fmt::Display for Coin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name(), self.ticker())
    }
}

impl fmt::Display for AddressKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AddressKind::P2pkh => write!(f, "P2PKH (Legacy)"),
            AddressKind::P2wpkh => write!(f, "P2WPKH (SegWit)"),
        }
    }
}

/// All supported coins
pub fn all_coins() -> Vec<Coin> {
    vec![
        Coin::Bitcoin,
        Coin::BitcoinTestnet,
        Coin::Litecoin,
        Coin::Dogecoin,
    ]
}

/// Get a coin by ticker or name
pub fn get_coin(ticker: &str) -> Option<Coin> {
    match ticker.to_uppercase().as_str() {
        "BTC" | "BITCOIN" => Some(Coin::Bitcoin),
        "TBTC" | "TESTNET" | "BITCOINTESTNET" => Some(Coin::BitcoinTestnet),
        "LTC" | "LITECOIN" => Some(Coin::Litecoin),
        "DOGE" | "DOGECOIN" => Some(Coin::Dogecoin),
        _ => None,
    }
}

/// Parse an address kind name
pub fn parse_address_kind(s: &str) -> Option<AddressKind> {
    match s.to_lowercase().as_str() {
        "p2pkh" | "legacy" | "bip44" => Some(AddressKind::P2pkh),
        "p2wpkh" | "segwit" | "bech32" | "bip84" => Some(AddressKind::P2wpkh),
        _ => None,
    }
}
