use anchor_lang::prelude::*;

declare_id!("DGorXzr4L3QetxW6AbD715pt7e5ihU3RXo8Re5D7zNmu");

pub mod constants;
pub mod error;
pub mod event;
pub mod instructions;
pub mod state;
pub mod utils;

#[cfg(test)]
pub mod test;

use instructions::*;

/**
 * Reward Distributor Program
 *
 * Pays out rewards earned by physical devices. An off-chain ledger service
 * (the oracle) accrues rewards from signed device telemetry and issues signed
 * vouchers stating a device's cumulative lifetime rewards. This program checks
 * the voucher and releases the difference from a pooled escrow.
 *
 * Key Features:
 * - One reward account per device, bound to the device's public key
 * - Rotatable withdraw authority (by the current authority, or by the device key)
 * - Cumulative vouchers: replaying a redeemed voucher pays nothing
 * - Signature checks delegated to the native ed25519 program, with the verified
 *   message rebuilt from this program's own arguments
 * - Support for both SPL Token and Token 2022
 *
 * Architecture:
 * - Reward Account PDA: ["reward", device_pubkey]
 * - Treasury PDA: ["treasury"], owns the escrow token account
 *
 * Workflow:
 * 1. A payer initializes the device's reward account and becomes its authority
 * 2. The device submits signed telemetry to the ledger service, which accrues rewards
 * 3. The ledger service signs a voucher (device, lifetime_rewards, timestamp)
 * 4. The authority submits [ed25519 verify, claim_rewards] in one transaction
 */
#[program]
pub mod reward_distributor {
    use super::*;

    /**
     * Creates the reward account for a device
     *
     * @param ctx - Account context containing the reward account and payer
     * @param device_pubkey - Public key identifying the device
     *
     * Access Control: Anyone (the payer becomes withdraw authority)
     */
    pub fn initialize_reward_account(
        ctx: Context<InitializeRewardAccount>,
        device_pubkey: Pubkey,
    ) -> Result<()> {
        handle_initialize_reward_account(ctx, device_pubkey)
    }

    /**
     * Rotates the withdraw authority
     *
     * @param ctx - Account context containing the reward account and current authority
     * @param new_authority - Key that will be allowed to claim
     *
     * Access Control: Current withdraw authority only
     */
    pub fn change_authority(ctx: Context<ChangeAuthority>, new_authority: Pubkey) -> Result<()> {
        handle_change_authority(ctx, new_authority)
    }

    /**
     * Rotates the withdraw authority on the device's say-so
     *
     * Requires a preceding ed25519 instruction in which the device key signs
     * "I want to claim: <new_authority>". The new authority co-signs.
     *
     * @param ctx - Account context containing the reward account, new authority and instructions sysvar
     *
     * Access Control: Device key + new authority
     */
    pub fn change_authority_with_device_sig(ctx: Context<ChangeAuthorityWithDeviceSig>) -> Result<()> {
        handle_change_authority_with_device_sig(ctx)
    }

    /**
     * Redeems an oracle-signed claim voucher
     *
     * Requires a preceding ed25519 instruction in which the oracle signs the
     * voucher message. Transfers lifetime_rewards - total_claimed from escrow.
     *
     * @param ctx - Account context containing reward, token and escrow accounts
     * @param lifetime_rewards - Cumulative rewards stated by the voucher
     * @param timestamp - Voucher issuance time (signed, not enforced)
     *
     * Access Control: Current withdraw authority with a valid voucher
     */
    pub fn claim_rewards(
        ctx: Context<ClaimRewards>,
        lifetime_rewards: u64,
        timestamp: u64,
    ) -> Result<()> {
        handle_claim_rewards(ctx, lifetime_rewards, timestamp)
    }
}
