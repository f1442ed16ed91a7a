use anchor_lang::prelude::*;
use crate::constants::*;
use crate::event::*;
use crate::state::*;

/**
 * Account context for creating a device's reward account
 *
 * The payer funds the account and becomes its first withdraw authority.
 * The payer need not be the device or any later authority.
 *
 * Access Control: Anyone, once per device identity
 */
#[event_cpi]
#[derive(Accounts)]
#[instruction(device_pubkey: Pubkey)]
pub struct InitializeRewardAccount<'info> {
    /// The reward account to create
    /// - Derived from: ["reward", device_pubkey]
    /// - `init` fails if the device already has an account
    #[account(
        init,
        payer = payer,
        space = RewardAccount::LEN,
        seeds = [REWARD_SEED.as_bytes(), device_pubkey.as_ref()],
        bump
    )]
    pub reward_account: Account<'info, RewardAccount>,

    /// Funds the account and becomes the withdraw authority
    #[account(mut)]
    pub payer: Signer<'info>,

    /// System program for account creation
    pub system_program: Program<'info, System>,
}

/**
 * Creates the reward account for `device_pubkey`
 *
 * @param ctx - The account context
 * @param device_pubkey - Public key permanently identifying the device
 */
pub fn handle_initialize_reward_account(
    ctx: Context<InitializeRewardAccount>,
    device_pubkey: Pubkey,
) -> Result<()> {
    let payer = ctx.accounts.payer.key();
    let reward_account = &mut ctx.accounts.reward_account;

    reward_account.initialize(device_pubkey, payer, ctx.bumps.reward_account)?;

    msg!("Reward account initialized for device {}", device_pubkey);

    emit_cpi!(RewardAccountInitialized {
        reward_account: reward_account.key(),
        device_pubkey,
        withdraw_authority: payer,
    });

    Ok(())
}
