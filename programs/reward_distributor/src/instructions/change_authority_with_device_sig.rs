use anchor_lang::prelude::*;
use anchor_lang::solana_program::sysvar::instructions::ID as INSTRUCTIONS_SYSVAR_ID;
use crate::constants::*;
use crate::event::*;
use crate::state::*;
use crate::utils::load_ed25519_verification;

/**
 * Account context for a device-authorized authority hand-off
 *
 * The transaction carries, directly before this instruction, an ed25519
 * instruction in which the device key signs
 * "I want to claim: <new_authority base58>". The new authority co-signs.
 * The current authority is not consulted, which lets a device owner recover
 * control of the account.
 *
 * Access Control: Device key (via companion instruction) + new authority
 */
#[event_cpi]
#[derive(Accounts)]
pub struct ChangeAuthorityWithDeviceSig<'info> {
    /// The reward account to update
    #[account(
        mut,
        seeds = [REWARD_SEED.as_bytes(), reward_account.device_pubkey.as_ref()],
        bump = reward_account.bump
    )]
    pub reward_account: Account<'info, RewardAccount>,

    /// The authority being installed, must sign
    pub new_authority: Signer<'info>,

    /// CHECK: Instructions sysvar, address is checked
    #[account(address = INSTRUCTIONS_SYSVAR_ID)]
    pub instructions: UncheckedAccount<'info>,
}

/**
 * Installs the co-signing new authority after checking the device signature
 *
 * @param ctx - The account context
 */
pub fn handle_change_authority_with_device_sig(ctx: Context<ChangeAuthorityWithDeviceSig>) -> Result<()> {
    let verification = load_ed25519_verification(&ctx.accounts.instructions.to_account_info())?;
    let new_authority = ctx.accounts.new_authority.key();
    let reward_account = &mut ctx.accounts.reward_account;

    let previous_authority =
        reward_account.change_authority_with_device_sig(new_authority, &verification)?;

    msg!(
        "Device {} handed its reward account to {}",
        reward_account.device_pubkey,
        new_authority
    );

    emit_cpi!(AuthorityChanged {
        reward_account: reward_account.key(),
        previous_authority,
        new_authority,
        by_device_signature: true,
    });

    Ok(())
}
