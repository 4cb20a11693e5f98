// file: src/extractor/crypto.rs
// description: cryptocurrency address candidate scanning and checksum validation
// reference: bitcoin base58check and bip-173/bip-350 address formats

use crate::extractor::patterns::BTC_ADDRESS;
use crate::models::CoinType;
use regex::Regex;
use sha2::{Digest, Sha256};

/// Scan pattern and checksum rules for one coin.
///
/// New coins plug in by implementing this trait and registering with
/// [`crate::extractor::IndicatorExtractor::with_coin`]; the email and IPv4
/// scans are unaffected.
pub trait CoinValidator: Send + Sync {
    fn coin(&self) -> CoinType;

    fn candidate_pattern(&self) -> &Regex;

    fn is_valid(&self, candidate: &str) -> bool;
}

pub fn validator_for(coin: CoinType) -> Box<dyn CoinValidator> {
    match coin {
        CoinType::Bitcoin => Box::new(BitcoinValidator),
    }
}

/// Base58Check (P2PKH, P2SH) and Bech32/Bech32m (segwit) mainnet addresses.
#[derive(Debug, Default, Clone, Copy)]
pub struct BitcoinValidator;

const P2PKH_VERSION: u8 = 0x00;
const P2SH_VERSION: u8 = 0x05;

impl CoinValidator for BitcoinValidator {
    fn coin(&self) -> CoinType {
        CoinType::Bitcoin
    }

    fn candidate_pattern(&self) -> &Regex {
        &BTC_ADDRESS
    }

    fn is_valid(&self, candidate: &str) -> bool {
        if candidate
            .get(..3)
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case("bc1"))
        {
            is_valid_segwit_address(candidate, "bc")
        } else {
            is_valid_base58check_address(candidate, &[P2PKH_VERSION, P2SH_VERSION])
        }
    }
}

const BASE58_ALPHABET: &[u8; 58] = b"123456789ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz";

fn base58_decode(input: &str) -> Option<Vec<u8>> {
    // little-endian accumulator, reversed at the end
    let mut bytes: Vec<u8> = Vec::with_capacity(input.len());

    for c in input.bytes() {
        let mut carry = BASE58_ALPHABET.iter().position(|&a| a == c)? as u32;
        for byte in bytes.iter_mut() {
            carry += (*byte as u32) * 58;
            *byte = (carry & 0xff) as u8;
            carry >>= 8;
        }
        while carry > 0 {
            bytes.push((carry & 0xff) as u8);
            carry >>= 8;
        }
    }

    let leading_zeros = input.bytes().take_while(|&c| c == b'1').count();
    bytes.extend(std::iter::repeat_n(0u8, leading_zeros));
    bytes.reverse();
    Some(bytes)
}

fn is_valid_base58check_address(address: &str, versions: &[u8]) -> bool {
    let Some(decoded) = base58_decode(address) else {
        return false;
    };

    // version byte + 20 byte hash + 4 byte checksum
    if decoded.len() != 25 || !versions.contains(&decoded[0]) {
        return false;
    }

    let (payload, checksum) = decoded.split_at(21);
    let digest = Sha256::digest(Sha256::digest(payload));
    digest[..4] == *checksum
}

const BECH32_CHARSET: &[u8; 32] = b"qpzry9x8gf2tvdw0s3jn54khce6mua7l";
const BECH32_CONST: u32 = 1;
const BECH32M_CONST: u32 = 0x2bc8_30a3;

fn bech32_polymod(values: impl Iterator<Item = u8>) -> u32 {
    const GENERATOR: [u32; 5] = [
        0x3b6a_57b2,
        0x2650_8e6d,
        0x1ea1_19fa,
        0x3d42_33dd,
        0x2a14_62b3,
    ];

    let mut chk: u32 = 1;
    for value in values {
        let top = chk >> 25;
        chk = ((chk & 0x01ff_ffff) << 5) ^ value as u32;
        for (i, generator) in GENERATOR.iter().enumerate() {
            if (top >> i) & 1 == 1 {
                chk ^= generator;
            }
        }
    }
    chk
}

fn hrp_expand(hrp: &str) -> impl Iterator<Item = u8> + '_ {
    hrp.bytes()
        .map(|b| b >> 5)
        .chain(std::iter::once(0))
        .chain(hrp.bytes().map(|b| b & 0x1f))
}

fn convert_5_to_8_bits(data: &[u8]) -> Option<Vec<u8>> {
    let mut acc: u32 = 0;
    let mut bits: u32 = 0;
    let mut out = Vec::with_capacity(data.len() * 5 / 8);

    for &value in data {
        acc = ((acc << 5) | value as u32) & 0xfff;
        bits += 5;
        while bits >= 8 {
            bits -= 8;
            out.push(((acc >> bits) & 0xff) as u8);
        }
    }

    if bits >= 5 || ((acc << (8 - bits)) & 0xff) != 0 {
        return None;
    }
    Some(out)
}

fn is_valid_segwit_address(address: &str, expected_hrp: &str) -> bool {
    let has_lower = address.bytes().any(|b| b.is_ascii_lowercase());
    let has_upper = address.bytes().any(|b| b.is_ascii_uppercase());
    if (has_lower && has_upper) || address.len() > 90 {
        return false;
    }

    let address = address.to_ascii_lowercase();
    let Some(separator) = address.rfind('1') else {
        return false;
    };
    let (hrp, data) = (&address[..separator], &address[separator + 1..]);
    if hrp != expected_hrp || data.len() < 7 {
        return false;
    }

    let values: Option<Vec<u8>> = data
        .bytes()
        .map(|c| BECH32_CHARSET.iter().position(|&a| a == c).map(|p| p as u8))
        .collect();
    let Some(values) = values else {
        return false;
    };

    let checksum = bech32_polymod(hrp_expand(hrp).chain(values.iter().copied()));

    let witness_version = values[0];
    if witness_version > 16 {
        return false;
    }

    let Some(program) = convert_5_to_8_bits(&values[1..values.len() - 6]) else {
        return false;
    };
    if !(2..=40).contains(&program.len()) {
        return false;
    }

    if witness_version == 0 {
        checksum == BECH32_CONST && (program.len() == 20 || program.len() == 32)
    } else {
        checksum == BECH32M_CONST
    }
}
