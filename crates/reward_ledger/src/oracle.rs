//! Oracle signing key
//!
//! The oracle is the ledger service's identity towards the on-ledger program:
//! its public key is compiled into the program, and every claim voucher must
//! carry its signature.

use anchor_lang::prelude::Pubkey;
use ed25519_dalek::{Signer, SigningKey};
use tracing::debug;

use crate::config::ORACLE_SECRET_KEY_ENV;
use crate::voucher::ClaimVoucher;
use crate::{LedgerError, Result};

/// Keypair used to sign claim vouchers
pub struct OracleSigner {
    signing_key: SigningKey,
}

impl OracleSigner {
    pub fn new(signing_key: SigningKey) -> Self {
        Self { signing_key }
    }

    /// Parse a 64-byte keypair (secret || public)
    ///
    /// Accepts the two usual encodings: a JSON byte array such as a keypair
    /// file produces, or a base58 string.
    pub fn from_secret_str(secret: &str) -> Result<Self> {
        let secret = secret.trim();
        let bytes: Vec<u8> = if secret.starts_with('[') && secret.ends_with(']') {
            serde_json::from_str(secret)
                .map_err(|e| LedgerError::InvalidSecretKey(format!("bad JSON byte array: {}", e)))?
        } else {
            bs58::decode(secret)
                .into_vec()
                .map_err(|e| LedgerError::InvalidSecretKey(format!("bad base58: {}", e)))?
        };

        let keypair: [u8; 64] = bytes.as_slice().try_into().map_err(|_| {
            LedgerError::InvalidSecretKey(format!("expected 64 bytes, got {}", bytes.len()))
        })?;
        let signing_key = SigningKey::from_keypair_bytes(&keypair).map_err(|_| {
            LedgerError::InvalidSecretKey("public half does not match secret half".to_string())
        })?;

        Ok(Self::new(signing_key))
    }

    /// Load the oracle keypair from `ORACLE_SECRET_KEY`
    pub fn from_env() -> Result<Self> {
        let secret = std::env::var(ORACLE_SECRET_KEY_ENV).map_err(|_| {
            LedgerError::InvalidSecretKey(format!("{} is not set", ORACLE_SECRET_KEY_ENV))
        })?;
        Self::from_secret_str(&secret)
    }

    pub fn pubkey(&self) -> Pubkey {
        Pubkey::new_from_array(self.signing_key.verifying_key().to_bytes())
    }

    /// Sign the voucher message for `device`
    pub fn sign_voucher(&self, device: &Pubkey, lifetime_rewards: u64, timestamp: u64) -> ClaimVoucher {
        let message = reward_distributor::utils::voucher_message(device, lifetime_rewards, timestamp);
        let signature = self.signing_key.sign(&message).to_bytes();
        debug!(
            "Signed voucher for {}: lifetime_rewards={} timestamp={}",
            device, lifetime_rewards, timestamp
        );

        ClaimVoucher {
            device_identity: *device,
            lifetime_rewards,
            timestamp,
            signature,
            signer: self.pubkey(),
        }
    }
}

impl std::fmt::Debug for OracleSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OracleSigner")
            .field("pubkey", &self.pubkey())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::OsRng;

    #[test]
    fn test_secret_formats_agree() {
        let signing_key = SigningKey::generate(&mut OsRng);
        let keypair = signing_key.to_keypair_bytes();

        let from_json = OracleSigner::from_secret_str(&serde_json::to_string(&keypair.to_vec()).unwrap())
            .unwrap();
        let from_base58 = OracleSigner::from_secret_str(&bs58::encode(keypair).into_string()).unwrap();

        let expected = Pubkey::new_from_array(signing_key.verifying_key().to_bytes());
        assert_eq!(from_json.pubkey(), expected);
        assert_eq!(from_base58.pubkey(), expected);
    }

    #[test]
    fn test_rejects_bad_secrets() {
        assert!(OracleSigner::from_secret_str("[1,2,3]").is_err());
        assert!(OracleSigner::from_secret_str("0OIl").is_err());

        // public half of another key
        let a = SigningKey::generate(&mut OsRng).to_keypair_bytes();
        let b = SigningKey::generate(&mut OsRng).to_keypair_bytes();
        let mut mixed = [0u8; 64];
        mixed[..32].copy_from_slice(&a[..32]);
        mixed[32..].copy_from_slice(&b[32..]);
        assert!(matches!(
            OracleSigner::from_secret_str(&bs58::encode(mixed).into_string()),
            Err(LedgerError::InvalidSecretKey(_))
        ));
    }

    #[test]
    fn test_signed_voucher_verifies() {
        let oracle = OracleSigner::new(SigningKey::generate(&mut OsRng));
        let device = Pubkey::new_unique();
        let voucher = oracle.sign_voucher(&device, 12, 1_700_000_000_000);

        assert_eq!(voucher.signer, oracle.pubkey());
        assert_eq!(voucher.device_identity, device);
        assert!(voucher.verify().is_ok());
    }
}
