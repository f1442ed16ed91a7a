use anchor_lang::prelude::*;
use crate::constants::*;
use crate::event::*;
use crate::state::*;

/**
 * Account context for rotating the withdraw authority
 *
 * Access Control: Current withdraw authority only
 */
#[event_cpi]
#[derive(Accounts)]
pub struct ChangeAuthority<'info> {
    /// The reward account to update
    #[account(
        mut,
        seeds = [REWARD_SEED.as_bytes(), reward_account.device_pubkey.as_ref()],
        bump = reward_account.bump
    )]
    pub reward_account: Account<'info, RewardAccount>,

    /// Must match reward_account.withdraw_authority
    pub current_authority: Signer<'info>,
}

/**
 * Hands the reward account to `new_authority`
 *
 * @param ctx - The account context
 * @param new_authority - Key that will be allowed to claim from now on
 */
pub fn handle_change_authority(ctx: Context<ChangeAuthority>, new_authority: Pubkey) -> Result<()> {
    let signer = ctx.accounts.current_authority.key();
    let reward_account = &mut ctx.accounts.reward_account;

    let previous_authority = reward_account.change_authority(&signer, new_authority)?;

    emit_cpi!(AuthorityChanged {
        reward_account: reward_account.key(),
        previous_authority,
        new_authority,
        by_device_signature: false,
    });

    Ok(())
}
