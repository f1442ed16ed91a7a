use anchor_lang::prelude::*;

#[error_code]
pub enum RewardDistributorError {
    // Verification errors
    #[msg("Invalid signature: companion ed25519 instruction missing or does not match")]
    InvalidSignature,
    #[msg("Malformed ed25519 verification instruction")]
    InvalidInstruction,

    // Access control errors
    #[msg("Signer is not the withdraw authority of this reward account")]
    Unauthorized,
    #[msg("Device identity cannot be the default public key")]
    InvalidDeviceIdentity,

    // Amount validation errors
    #[msg("Lifetime rewards do not exceed the amount already claimed")]
    InvalidRewardAmount,
    #[msg("No rewards to claim")]
    NoRewardsToClaim,
    #[msg("Reward overflow")]
    RewardOverflow,
    #[msg("Insufficient escrow balance for this claim")]
    InsufficientEscrowBalance,
}
