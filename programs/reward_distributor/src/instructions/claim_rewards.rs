use anchor_lang::prelude::*;
use anchor_lang::solana_program::sysvar::instructions::ID as INSTRUCTIONS_SYSVAR_ID;
use anchor_spl::associated_token::AssociatedToken;
use anchor_spl::token_interface::{Mint, TokenAccount, TokenInterface};
use crate::constants::*;
use crate::error::*;
use crate::event::*;
use crate::state::*;
use crate::utils::{load_ed25519_verification, transfer_token};

/**
 * Account context for redeeming a claim voucher
 *
 * The transaction carries, directly before this instruction, an ed25519
 * instruction in which the oracle signs the 48-byte voucher message
 * (device_pubkey || lifetime_rewards LE || timestamp LE).
 *
 * Access Control: Current withdraw authority with a valid oracle voucher
 */
#[event_cpi]
#[derive(Accounts)]
pub struct ClaimRewards<'info> {
    /// The reward account being paid out
    /// - total_claimed is raised to the voucher's lifetime_rewards
    #[account(
        mut,
        seeds = [REWARD_SEED.as_bytes(), reward_account.device_pubkey.as_ref()],
        bump = reward_account.bump
    )]
    pub reward_account: Account<'info, RewardAccount>,

    /// Withdraw authority of the reward account
    /// - Pays for its token account if it does not exist yet
    #[account(mut)]
    pub authority: Signer<'info>,

    /// The reward token mint
    pub mint: InterfaceAccount<'info, Mint>,

    /// Authority's token account receiving the payout
    #[account(
        init_if_needed,
        payer = authority,
        associated_token::mint = mint,
        associated_token::authority = authority,
        associated_token::token_program = token_program,
    )]
    pub authority_token_account: InterfaceAccount<'info, TokenAccount>,

    /// Pooled escrow holding the rewards
    /// - Owned by the treasury PDA
    #[account(
        mut,
        token::mint = mint,
        token::authority = treasury_authority,
        token::token_program = token_program,
    )]
    pub treasury_token_account: InterfaceAccount<'info, TokenAccount>,

    /// CHECK: PDA that owns the escrow, derived from ["treasury"]
    #[account(
        seeds = [TREASURY_SEED.as_bytes()],
        bump
    )]
    pub treasury_authority: UncheckedAccount<'info>,

    /// Token program (supports both SPL Token and Token 2022)
    pub token_program: Interface<'info, TokenInterface>,

    pub associated_token_program: Program<'info, AssociatedToken>,

    pub system_program: Program<'info, System>,

    /// CHECK: Instructions sysvar, address is checked
    #[account(address = INSTRUCTIONS_SYSVAR_ID)]
    pub instructions: UncheckedAccount<'info>,
}

/**
 * Redeems an oracle voucher
 *
 * @param ctx - The account context
 * @param lifetime_rewards - Cumulative reward total stated by the voucher
 * @param timestamp - Voucher issuance time, part of the signed message
 *
 * Validation Process:
 * 1. Load the companion ed25519 instruction
 * 2. Signer must be the withdraw authority
 * 3. Oracle must have signed exactly (device, lifetime_rewards, timestamp)
 * 4. Pay lifetime_rewards - total_claimed out of escrow
 */
pub fn handle_claim_rewards(
    ctx: Context<ClaimRewards>,
    lifetime_rewards: u64,
    timestamp: u64,
) -> Result<()> {
    // ===== VALIDATION PHASE =====

    let verification = load_ed25519_verification(&ctx.accounts.instructions.to_account_info())?;
    let authority = ctx.accounts.authority.key();

    // ===== EFFECTS PHASE (State Updates) =====

    let reward_account = &mut ctx.accounts.reward_account;
    let amount = reward_account.claim(
        &authority,
        lifetime_rewards,
        timestamp,
        &verification,
        &ORACLE_PUBKEY,
    )?;

    require!(
        ctx.accounts.treasury_token_account.amount >= amount,
        RewardDistributorError::InsufficientEscrowBalance
    );

    let reward_account_key = reward_account.key();
    let device_pubkey = reward_account.device_pubkey;
    let total_claimed = reward_account.total_claimed;

    // ===== INTERACTIONS PHASE (Token Transfer) =====

    let seeds = &[TREASURY_SEED.as_bytes(), &[ctx.bumps.treasury_authority]];
    let signer = &[&seeds[..]];

    transfer_token(
        ctx.accounts.treasury_authority.to_account_info(),
        ctx.accounts.treasury_token_account.to_account_info(),
        ctx.accounts.authority_token_account.to_account_info(),
        ctx.accounts.mint.to_account_info(),
        ctx.accounts.token_program.to_account_info(),
        amount,
        ctx.accounts.mint.decimals,
        Some(signer),
    )?;

    msg!(
        "Claimed {} for device {} (total claimed {})",
        amount,
        device_pubkey,
        total_claimed
    );

    emit_cpi!(RewardsClaimed {
        reward_account: reward_account_key,
        device_pubkey,
        authority,
        amount,
        lifetime_rewards,
        total_claimed,
        timestamp,
    });

    Ok(())
}
