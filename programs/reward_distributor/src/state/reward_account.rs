use anchor_lang::prelude::*;

use crate::error::RewardDistributorError;
use crate::utils::{rotation_message, voucher_message, Ed25519Verification};

/**
 * Per-device reward account
 *
 * Binds a device identity to the authority allowed to redeem its rewards and
 * records how much of the device's lifetime rewards has been paid out.
 *
 * Derivation: ["reward", device_pubkey]
 *
 * Lifecycle:
 * 1. Created by initialize_reward_account, the payer becomes withdraw authority
 * 2. withdraw_authority rotated by the current authority or by a device signature
 * 3. total_claimed raised by each successful claim
 * 4. Never closed
 *
 * Design Notes:
 * - Vouchers state cumulative lifetime rewards, so a replayed voucher pays
 *   nothing once total_claimed has caught up with it
 * - The transition methods below carry every authorization rule; instruction
 *   handlers only supply the signer and the parsed companion instruction
 */
#[account]
#[derive(Default, Debug)]
pub struct RewardAccount {
    /// Bump seed for PDA derivation
    pub bump: u8,

    /// Device identity
    /// - Immutable after creation
    /// - Signs telemetry off-chain and authority hand-offs on-chain
    pub device_pubkey: Pubkey,

    /// Key currently entitled to claim and to reassign itself
    pub withdraw_authority: Pubkey,

    /// Token units paid out so far (cumulative)
    /// - Only ever increases
    pub total_claimed: u64,
}

impl RewardAccount {
    /// Calculate the space required for this account
    /// - Includes 8-byte discriminator + struct size
    pub const LEN: usize = 8 + std::mem::size_of::<RewardAccount>();

    /// Bind a fresh account to `device_pubkey` with `payer` as authority
    pub fn initialize(&mut self, device_pubkey: Pubkey, payer: Pubkey, bump: u8) -> Result<()> {
        require_keys_neq!(
            device_pubkey,
            Pubkey::default(),
            RewardDistributorError::InvalidDeviceIdentity
        );

        self.bump = bump;
        self.device_pubkey = device_pubkey;
        self.withdraw_authority = payer;
        self.total_claimed = 0;
        Ok(())
    }

    /// Rotation signed by the current withdraw authority
    pub fn change_authority(&mut self, signer: &Pubkey, new_authority: Pubkey) -> Result<Pubkey> {
        self.require_authority(signer)?;
        Ok(std::mem::replace(&mut self.withdraw_authority, new_authority))
    }

    /// Rotation authorized by the device key
    ///
    /// `verification` must be the device's signature over the rotation message
    /// naming `new_authority`. The current authority does not take part.
    pub fn change_authority_with_device_sig(
        &mut self,
        new_authority: Pubkey,
        verification: &Ed25519Verification,
    ) -> Result<Pubkey> {
        verification.expect(&self.device_pubkey, &rotation_message(&new_authority))?;
        Ok(std::mem::replace(&mut self.withdraw_authority, new_authority))
    }

    /// Redeem an oracle voucher and return the amount owed to the authority
    ///
    /// The voucher message is rebuilt from this account's device key and the
    /// declared `lifetime_rewards` and `timestamp`, then compared byte for byte
    /// with what the oracle actually signed.
    pub fn claim(
        &mut self,
        signer: &Pubkey,
        lifetime_rewards: u64,
        timestamp: u64,
        verification: &Ed25519Verification,
        oracle: &Pubkey,
    ) -> Result<u64> {
        self.require_authority(signer)?;

        let message = voucher_message(&self.device_pubkey, lifetime_rewards, timestamp);
        verification.expect(oracle, &message)?;

        require!(lifetime_rewards > 0, RewardDistributorError::NoRewardsToClaim);

        let amount = lifetime_rewards
            .checked_sub(self.total_claimed)
            .filter(|delta| *delta > 0)
            .ok_or(RewardDistributorError::InvalidRewardAmount)?;

        self.total_claimed = self
            .total_claimed
            .checked_add(amount)
            .ok_or(RewardDistributorError::RewardOverflow)?;

        Ok(amount)
    }

    fn require_authority(&self, signer: &Pubkey) -> Result<()> {
        require_keys_eq!(
            *signer,
            self.withdraw_authority,
            RewardDistributorError::Unauthorized
        );
        Ok(())
    }
}
