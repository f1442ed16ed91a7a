use anchor_lang::prelude::Pubkey;
use ed25519_dalek::{Signature, Verifier, VerifyingKey};
use reward_distributor::constants::VOUCHER_MESSAGE_LEN;
use reward_distributor::utils::{new_ed25519_instruction_data, voucher_message};

use crate::{LedgerError, Result};

/// Oracle statement of a device's cumulative rewards
///
/// Not persisted. The holder redeems it with `claim_rewards`, which pays out
/// `lifetime_rewards` minus what the reward account has already received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimVoucher {
    pub device_identity: Pubkey,
    pub lifetime_rewards: u64,
    /// Milliseconds since the Unix epoch at issuance
    pub timestamp: u64,
    pub signature: [u8; 64],
    pub signer: Pubkey,
}

impl ClaimVoucher {
    pub fn message(&self) -> [u8; VOUCHER_MESSAGE_LEN] {
        voucher_message(&self.device_identity, self.lifetime_rewards, self.timestamp)
    }

    /// Check the signature against `signer` over the rebuilt message
    pub fn verify(&self) -> Result<()> {
        verify_signature(&self.signer, &self.message(), &self.signature)
    }

    /// Data for the ed25519 instruction that must precede `claim_rewards`
    pub fn ed25519_instruction_data(&self) -> Vec<u8> {
        new_ed25519_instruction_data(&self.signer, &self.signature, &self.message())
    }
}

/// Verify an ed25519 signature by `signer` over `message`
pub fn verify_signature(signer: &Pubkey, message: &[u8], signature: &[u8; 64]) -> Result<()> {
    let verifying_key =
        VerifyingKey::from_bytes(&signer.to_bytes()).map_err(|_| LedgerError::InvalidSignature)?;
    let signature = Signature::from_bytes(signature);

    verifying_key
        .verify(message, &signature)
        .map_err(|_| LedgerError::InvalidSignature)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::OracleSigner;
    use ed25519_dalek::SigningKey;
    use rand::rngs::OsRng;
    use reward_distributor::utils::Ed25519Verification;

    fn voucher() -> ClaimVoucher {
        let oracle = OracleSigner::new(SigningKey::generate(&mut OsRng));
        oracle.sign_voucher(&Pubkey::new_unique(), 2, 1_700_000_000_123)
    }

    #[test]
    fn test_tampered_fields_fail_verification() {
        let voucher = voucher();
        assert!(voucher.verify().is_ok());

        let mut tampered = voucher.clone();
        tampered.lifetime_rewards += 1;
        assert!(matches!(tampered.verify(), Err(LedgerError::InvalidSignature)));

        let mut tampered = voucher.clone();
        tampered.timestamp -= 1;
        assert!(matches!(tampered.verify(), Err(LedgerError::InvalidSignature)));

        let mut tampered = voucher.clone();
        tampered.device_identity = Pubkey::new_unique();
        assert!(matches!(tampered.verify(), Err(LedgerError::InvalidSignature)));
    }

    #[test]
    fn test_every_message_byte_is_covered() {
        let voucher = voucher();
        let message = voucher.message();

        for i in 32..VOUCHER_MESSAGE_LEN {
            let mut tampered = message;
            tampered[i] ^= 0x80;
            assert!(
                verify_signature(&voucher.signer, &tampered, &voucher.signature).is_err(),
                "flipping byte {} went unnoticed",
                i
            );
        }
    }

    #[test]
    fn test_instruction_data_round_trips_through_program_parser() {
        let voucher = voucher();
        let verification = Ed25519Verification::parse(&voucher.ed25519_instruction_data()).unwrap();

        assert_eq!(verification.signer, voucher.signer);
        assert_eq!(verification.signature, voucher.signature);
        assert_eq!(verification.message, voucher.message().to_vec());
    }
}
