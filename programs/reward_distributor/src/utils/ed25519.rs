use anchor_lang::prelude::*;
use anchor_lang::solana_program::ed25519_program::ID as ED25519_PROGRAM_ID;
use anchor_lang::solana_program::sysvar::instructions::{
    load_current_index_checked, load_instruction_at_checked,
};

use crate::error::RewardDistributorError;

/**
 * Companion ed25519 instruction layout
 *
 * The native ed25519 program verifies signatures described by this header:
 *
 * | offset | size | field                          |
 * |--------|------|--------------------------------|
 * | 0      | 1    | number of signatures           |
 * | 1      | 1    | padding                        |
 * | 2      | 2    | signature offset               |
 * | 4      | 2    | signature instruction index    |
 * | 6      | 2    | public key offset              |
 * | 8      | 2    | public key instruction index   |
 * | 10     | 2    | message data offset            |
 * | 12     | 2    | message data size              |
 * | 14     | 2    | message instruction index      |
 *
 * followed by the public key, signature and message bytes. An instruction
 * index of `u16::MAX` means "the data of this same instruction".
 */
pub const SIGNATURE_OFFSETS_START: usize = 2;
pub const ED25519_DATA_START: usize = 16;
pub const PUBKEY_LEN: usize = 32;
pub const SIGNATURE_LEN: usize = 64;
pub const CURRENT_INSTRUCTION: u16 = u16::MAX;

/// Signer, signature and message the native ed25519 program has checked
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ed25519Verification {
    pub signer: Pubkey,
    pub signature: [u8; SIGNATURE_LEN],
    pub message: Vec<u8>,
}

impl Ed25519Verification {
    /// Decode the fields of a single-signature ed25519 instruction
    ///
    /// Every offset is bounds-checked, and the signature, key and message must
    /// all live in the instruction's own data. A header pointing into another
    /// instruction would let a caller present bytes that were never verified.
    pub fn parse(data: &[u8]) -> Result<Self> {
        require!(
            data.len() >= ED25519_DATA_START,
            RewardDistributorError::InvalidInstruction
        );
        require!(data[0] == 1, RewardDistributorError::InvalidInstruction);
        require!(data[1] == 0, RewardDistributorError::InvalidInstruction);

        let signature_offset = read_u16(data, SIGNATURE_OFFSETS_START)? as usize;
        let signature_instruction_index = read_u16(data, SIGNATURE_OFFSETS_START + 2)?;
        let public_key_offset = read_u16(data, SIGNATURE_OFFSETS_START + 4)? as usize;
        let public_key_instruction_index = read_u16(data, SIGNATURE_OFFSETS_START + 6)?;
        let message_data_offset = read_u16(data, SIGNATURE_OFFSETS_START + 8)? as usize;
        let message_data_size = read_u16(data, SIGNATURE_OFFSETS_START + 10)? as usize;
        let message_instruction_index = read_u16(data, SIGNATURE_OFFSETS_START + 12)?;

        require!(
            signature_instruction_index == CURRENT_INSTRUCTION
                && public_key_instruction_index == CURRENT_INSTRUCTION
                && message_instruction_index == CURRENT_INSTRUCTION,
            RewardDistributorError::InvalidInstruction
        );

        let signer = slice_at(data, public_key_offset, PUBKEY_LEN)?;
        let signature = slice_at(data, signature_offset, SIGNATURE_LEN)?;
        let message = slice_at(data, message_data_offset, message_data_size)?;

        let signer = Pubkey::try_from(signer)
            .map_err(|_| error!(RewardDistributorError::InvalidInstruction))?;
        let signature: [u8; SIGNATURE_LEN] = signature
            .try_into()
            .map_err(|_| error!(RewardDistributorError::InvalidInstruction))?;

        Ok(Self {
            signer,
            signature,
            message: message.to_vec(),
        })
    }

    /// Bind the verified signature to the parameters the caller declared
    ///
    /// Both the signer and the exact message bytes have to match, otherwise
    /// the verified signature says nothing about this operation.
    pub fn expect(&self, signer: &Pubkey, message: &[u8]) -> Result<()> {
        if self.signer != *signer {
            msg!("ed25519 signer mismatch: expected {}, got {}", signer, self.signer);
            return err!(RewardDistributorError::InvalidSignature);
        }
        if self.message != message {
            msg!("ed25519 message mismatch");
            return err!(RewardDistributorError::InvalidSignature);
        }
        Ok(())
    }
}

/// Load the ed25519 instruction placed directly before the current one
///
/// A missing instruction, or one addressed to any program other than the
/// native ed25519 program, means nothing was verified.
pub fn load_ed25519_verification(instructions_sysvar: &AccountInfo) -> Result<Ed25519Verification> {
    let current_index = load_current_index_checked(instructions_sysvar)? as usize;
    if current_index == 0 {
        msg!("no instruction precedes the current one");
        return err!(RewardDistributorError::InvalidSignature);
    }

    let ix = load_instruction_at_checked(current_index - 1, instructions_sysvar)?;
    if ix.program_id != ED25519_PROGRAM_ID {
        msg!("preceding instruction targets {}, not the ed25519 program", ix.program_id);
        return err!(RewardDistributorError::InvalidSignature);
    }

    Ed25519Verification::parse(&ix.data)
}

/// Instruction data for the native ed25519 program verifying one signature
///
/// Clients put this instruction immediately before `claim_rewards` or
/// `change_authority_with_device_sig` in the same transaction.
pub fn new_ed25519_instruction_data(
    signer: &Pubkey,
    signature: &[u8; SIGNATURE_LEN],
    message: &[u8],
) -> Vec<u8> {
    let public_key_offset = ED25519_DATA_START;
    let signature_offset = public_key_offset + PUBKEY_LEN;
    let message_data_offset = signature_offset + SIGNATURE_LEN;

    let mut data = Vec::with_capacity(message_data_offset + message.len());
    data.push(1);
    data.push(0);
    data.extend_from_slice(&(signature_offset as u16).to_le_bytes());
    data.extend_from_slice(&CURRENT_INSTRUCTION.to_le_bytes());
    data.extend_from_slice(&(public_key_offset as u16).to_le_bytes());
    data.extend_from_slice(&CURRENT_INSTRUCTION.to_le_bytes());
    data.extend_from_slice(&(message_data_offset as u16).to_le_bytes());
    data.extend_from_slice(&(message.len() as u16).to_le_bytes());
    data.extend_from_slice(&CURRENT_INSTRUCTION.to_le_bytes());
    data.extend_from_slice(signer.as_ref());
    data.extend_from_slice(signature);
    data.extend_from_slice(message);
    data
}

fn read_u16(data: &[u8], at: usize) -> Result<u16> {
    let bytes = slice_at(data, at, 2)?;
    Ok(u16::from_le_bytes([bytes[0], bytes[1]]))
}

fn slice_at(data: &[u8], offset: usize, len: usize) -> Result<&[u8]> {
    offset
        .checked_add(len)
        .and_then(|end| data.get(offset..end))
        .ok_or_else(|| error!(RewardDistributorError::InvalidInstruction))
}
