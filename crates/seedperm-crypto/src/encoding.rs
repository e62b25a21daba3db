//! Address encoding utilities: Base58Check and SegWit v0 bech32

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EncodingError {
    #[error("Invalid checksum")]
    InvalidChecksum,
    #[error("Invalid character in input")]
    InvalidCharacter,
    #[error("Invalid length")]
    InvalidLength,
    #[error("Bech32 encoding failed: {0}")]
    Bech32Error(String),
}

/// Base58Check encode (Bitcoin-style with 4-byte checksum)
pub fn base58check_encode(version: u8, payload: &[u8]) -> String {
    use crate::hash::double_sha256;

    let mut data = Vec::with_capacity(1 + payload.len() + 4);
    data.push(version);
    data.extend_from_slice(payload);

    let checksum = double_sha256(&data);
    data.extend_from_slice(&checksum[..4]);

    bs58::encode(data).into_string()
}

/// Base58Check decode, returns (version, payload)
pub fn base58check_decode(input: &str) -> Result<(u8, Vec<u8>), EncodingError> {
    use crate::hash::double_sha256;

    let data = bs58::decode(input)
        .into_vec()
        .map_err(|_| EncodingError::InvalidCharacter)?;

    if data.len() < 5 {
        return Err(EncodingError::InvalidLength);
    }

    let (payload_with_version, checksum) = data.split_at(data.len() - 4);
    let computed_checksum = &double_sha256(payload_with_version)[..4];

    if checksum != computed_checksum {
        return Err(EncodingError::InvalidChecksum);
    }

    let version = payload_with_version[0];
    let payload = payload_with_version[1..].to_vec();

    Ok((version, payload))
}

/// Bech32 encode a SegWit v0 witness program (P2WPKH when the program is a HASH160)
pub fn segwit_v0_encode(hrp: &str, program: &[u8]) -> Result<String, EncodingError> {
    use bech32::Hrp;

    let hrp = Hrp::parse(hrp).map_err(|e| EncodingError::Bech32Error(e.to_string()))?;

    bech32::segwit::encode_v0(hrp, program)
        .map_err(|e| EncodingError::Bech32Error(e.to_string()))
}

/// Decode a SegWit address, returns (hrp, witness version, program)
pub fn segwit_decode(address: &str) -> Result<(String, u8, Vec<u8>), EncodingError> {
    let (hrp, version, program) = bech32::segwit::decode(address)
        .map_err(|e| EncodingError::Bech32Error(e.to_string()))?;

    Ok((hrp.to_lowercase(), version.to_u8(), program))
}
