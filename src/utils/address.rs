//! Wallet address normalization.
//!
//! Accepts 40-digit hex strings (with or without the `0x` prefix, any
//! casing) and ICAP / ISO 13616 addresses (`XE` prefix, base-36 payload),
//! and produces the EIP-55 checksummed form. Everything else is rejected.

use alloy::primitives::{Address, U256};
use std::str::FromStr;

use crate::error::AddressError;

/// Normalize a user-supplied address into EIP-55 checksummed form.
///
/// Returns `None` for anything that is not a valid address. The empty
/// string and a bare `0x` are rejected, not treated as the zero address.
pub fn normalize(input: &str) -> Option<String> {
    let cleaned = input.trim();
    if cleaned.is_empty() || cleaned == "0x" || !cleaned.is_ascii() {
        return None;
    }

    if cleaned.len() >= 2 && cleaned[..2].eq_ignore_ascii_case("xe") {
        return icap_to_checksummed(cleaned);
    }

    let lower = cleaned.to_ascii_lowercase();
    let digits = lower.strip_prefix("0x").unwrap_or(&lower);
    if digits.len() != 40 || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }

    let address = Address::from_str(digits).ok()?;
    Some(address.to_checksum(None))
}

/// Like [`normalize`], but for callers that need the failure as an error.
pub fn normalize_or_throw(input: &str) -> Result<String, AddressError> {
    normalize(input).ok_or_else(|| AddressError(input.trim().to_string()))
}

/// Decode an ICAP address: verify the ISO 13616 mod-97 check digits, then
/// interpret the payload as a base-36 integer and take its low 160 bits.
fn icap_to_checksummed(input: &str) -> Option<String> {
    let upper = input.to_ascii_uppercase();
    if upper.len() < 5 || upper.len() > 35 {
        return None;
    }
    if !upper.bytes().all(|b| b.is_ascii_alphanumeric()) {
        return None;
    }

    // ISO 13616: move the country code and check digits to the end, then
    // the whole string taken as digits (A=10 .. Z=35) must be ≡ 1 mod 97.
    let rearranged = format!("{}{}", &upper[4..], &upper[..4]);
    if iso13616_mod97(&rearranged)? != 1 {
        return None;
    }

    let mut value = U256::ZERO;
    for b in upper[4..].bytes() {
        let digit = (b as char).to_digit(36)?;
        value = value.checked_mul(U256::from(36u64))?;
        value = value.checked_add(U256::from(digit as u64))?;
    }
    if value.bit_len() > 160 {
        return None;
    }

    let bytes = value.to_be_bytes::<32>();
    let address = Address::from_slice(&bytes[12..]);
    Some(address.to_checksum(None))
}

fn iso13616_mod97(input: &str) -> Option<u32> {
    let mut acc: u32 = 0;
    for b in input.bytes() {
        let digit = (b as char).to_digit(36)?;
        if digit >= 10 {
            acc = (acc * 100 + digit) % 97;
        } else {
            acc = (acc * 10 + digit) % 97;
        }
    }
    Some(acc)
}
