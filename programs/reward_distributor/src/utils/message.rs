use anchor_lang::prelude::*;

use crate::constants::{ROTATION_MESSAGE_PREFIX, VOUCHER_MESSAGE_LEN};

/// Bytes the oracle signs when issuing a claim voucher
///
/// Layout (no delimiters, no length prefixes):
/// - bytes 0..32: device public key
/// - bytes 32..40: lifetime rewards, u64 little-endian
/// - bytes 40..48: issuance timestamp, u64 little-endian
pub fn voucher_message(
    device_pubkey: &Pubkey,
    lifetime_rewards: u64,
    timestamp: u64,
) -> [u8; VOUCHER_MESSAGE_LEN] {
    let mut message = [0u8; VOUCHER_MESSAGE_LEN];
    message[..32].copy_from_slice(device_pubkey.as_ref());
    message[32..40].copy_from_slice(&lifetime_rewards.to_le_bytes());
    message[40..].copy_from_slice(&timestamp.to_le_bytes());
    message
}

/// Bytes a device signs to hand its reward account over to `new_authority`
pub fn rotation_message(new_authority: &Pubkey) -> Vec<u8> {
    format!("{}{}", ROTATION_MESSAGE_PREFIX, new_authority).into_bytes()
}
