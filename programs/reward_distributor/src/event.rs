use anchor_lang::prelude::*;

/// Event emitted when a reward account is created for a device
#[event]
pub struct RewardAccountInitialized {
    /// The reward account public key
    pub reward_account: Pubkey,
    /// Device identity the account is bound to
    pub device_pubkey: Pubkey,
    /// Initial withdraw authority (the payer)
    pub withdraw_authority: Pubkey,
}

/// Event emitted when the withdraw authority is rotated
#[event]
pub struct AuthorityChanged {
    /// The reward account public key
    pub reward_account: Pubkey,
    /// Authority before the rotation
    pub previous_authority: Pubkey,
    /// Authority after the rotation
    pub new_authority: Pubkey,
    /// True when the rotation was authorized by the device key
    /// instead of the current authority
    pub by_device_signature: bool,
}

/// Event emitted when a voucher is redeemed
#[event]
pub struct RewardsClaimed {
    /// The reward account public key
    pub reward_account: Pubkey,
    /// Device identity the rewards were earned by
    pub device_pubkey: Pubkey,
    /// Authority that received the tokens
    pub authority: Pubkey,
    /// Tokens transferred out of escrow in this transaction
    pub amount: u64,
    /// Cumulative total stated by the voucher
    pub lifetime_rewards: u64,
    /// Total claimed after this transaction
    pub total_claimed: u64,
    /// Issuance time stated by the voucher
    pub timestamp: u64,
}
