use anchor_lang::prelude::*;

/**
 * Program Constants
 *
 * PDA seeds, the oracle identity trusted to sign claim vouchers, and the
 * byte layout of the messages verified by the companion ed25519 instruction.
 */

#[constant]
/// ===== PDA SEED CONSTANTS =====

/// Seed for reward account PDA derivation
/// - Used in: ["reward", device_pubkey]
/// - One reward account per device identity
/// - A second initialization for the same device fails because the address is taken
pub const REWARD_SEED: &str = "reward";

/// Seed for the escrow authority PDA
/// - Used in: ["treasury"]
/// - Owns the pooled token account that claims are paid from
pub const TREASURY_SEED: &str = "treasury";

/// ===== ORACLE =====

/// Public key of the off-chain ledger service that signs claim vouchers
/// - A claim is only honored when the companion ed25519 instruction was signed by this key
pub const ORACLE_PUBKEY: Pubkey =
    anchor_lang::solana_program::pubkey!("oraXrapkbpe6pCVJ2sm3MRZAdyemtWXyGg4W6mGarjL");

/// ===== MESSAGE LAYOUT =====

/// Prefix of the text a device signs to hand its reward account to a new authority
/// - Full message: "I want to claim: " + base58(new_authority)
pub const ROTATION_MESSAGE_PREFIX: &str = "I want to claim: ";

/// Length of a claim voucher message
/// - device_pubkey (32) + lifetime_rewards (8, LE) + timestamp (8, LE)
pub const VOUCHER_MESSAGE_LEN: usize = 32 + 8 + 8;
