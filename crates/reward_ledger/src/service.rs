//! Request and response types for the ledger's service surface
//!
//! Transport-agnostic: whatever carries these (HTTP, a queue, the CLI)
//! hands the decoded request to [`submit_ping`] or [`request_voucher`].

use std::str::FromStr;

use anchor_lang::prelude::Pubkey;
use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;

use crate::ledger::RewardLedger;
use crate::store::LedgerStore;
use crate::voucher::ClaimVoucher;
use crate::{LedgerError, Result};

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PingRequest {
    pub device_public_key: String,
    /// Telemetry exactly as the device signed it
    pub data: Box<RawValue>,
    /// Base58 ed25519 signature over `data`
    pub signature: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PingResponse {
    pub success: bool,
    pub message: String,
    pub unclaimed_rewards: u64,
}

/// Body returned for any request the ledger refused
///
/// `retryable` is set when the request itself was fine and the same call
/// may succeed later.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub error: String,
    pub retryable: bool,
}

impl From<&LedgerError> for ErrorResponse {
    fn from(err: &LedgerError) -> Self {
        Self {
            error: err.to_string(),
            retryable: err.is_retryable(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoucherRequest {
    pub device_public_key: String,
}

/// Everything a claimant needs to build `claim_rewards`
///
/// Amounts are decimal strings so they survive JSON consumers without
/// 64-bit integers.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoucherResponse {
    pub signature: String,
    pub oracle_public_key: String,
    pub lifetime_rewards: String,
    pub timestamp: String,
}

impl From<&ClaimVoucher> for VoucherResponse {
    fn from(voucher: &ClaimVoucher) -> Self {
        Self {
            signature: bs58::encode(voucher.signature).into_string(),
            oracle_public_key: voucher.signer.to_string(),
            lifetime_rewards: voucher.lifetime_rewards.to_string(),
            timestamp: voucher.timestamp.to_string(),
        }
    }
}

impl VoucherResponse {
    /// Decode back into a voucher for `device`
    pub fn into_voucher(self, device: &Pubkey) -> Result<ClaimVoucher> {
        Ok(ClaimVoucher {
            device_identity: *device,
            lifetime_rewards: parse_amount("lifetimeRewards", &self.lifetime_rewards)?,
            timestamp: parse_amount("timestamp", &self.timestamp)?,
            signature: parse_signature(&self.signature)?,
            signer: parse_pubkey(&self.oracle_public_key)?,
        })
    }
}

/// Handle a telemetry submission
pub fn submit_ping<S: LedgerStore>(ledger: &RewardLedger<S>, request: &PingRequest) -> Result<PingResponse> {
    let device = parse_pubkey(&request.device_public_key)?;
    let signature = parse_signature(&request.signature)?;
    let unclaimed_rewards = ledger.record_ping(&device, request.data.get(), &signature)?;

    Ok(PingResponse {
        success: true,
        message: "Data received and reward accrued".to_string(),
        unclaimed_rewards,
    })
}

/// Handle a voucher request
pub fn request_voucher<S: LedgerStore>(
    ledger: &RewardLedger<S>,
    request: &VoucherRequest,
) -> Result<VoucherResponse> {
    let device = parse_pubkey(&request.device_public_key)?;
    let voucher = ledger.issue_voucher(&device)?;
    Ok(VoucherResponse::from(&voucher))
}

pub fn parse_pubkey(value: &str) -> Result<Pubkey> {
    Pubkey::from_str(value.trim()).map_err(|e| LedgerError::InvalidPublicKey(format!("{}: {}", value, e)))
}

pub fn parse_signature(value: &str) -> Result<[u8; 64]> {
    let bytes = bs58::decode(value.trim())
        .into_vec()
        .map_err(|_| LedgerError::InvalidSignature)?;
    bytes.try_into().map_err(|_| LedgerError::InvalidSignature)
}

fn parse_amount(field: &str, value: &str) -> Result<u64> {
    value
        .parse()
        .map_err(|e| LedgerError::InvalidPayload(format!("{}: {}", field, e)))
}

#[cfg(test)]
mod tests {
    use ed25519_dalek::{Signer, SigningKey};
    use rand::rngs::OsRng;

    use super::*;
    use crate::config::LedgerConfig;
    use crate::oracle::OracleSigner;
    use crate::store::MemoryStore;

    fn ledger() -> RewardLedger<MemoryStore> {
        let oracle = OracleSigner::new(SigningKey::generate(&mut OsRng));
        RewardLedger::open(MemoryStore::new(), oracle, LedgerConfig::default()).unwrap()
    }

    fn ping_body(device: &SigningKey, data: &str) -> String {
        let signature = device.sign(data.as_bytes()).to_bytes();
        format!(
            r#"{{"devicePublicKey":"{}","data":{},"signature":"{}"}}"#,
            Pubkey::new_from_array(device.verifying_key().to_bytes()),
            data,
            bs58::encode(signature).into_string()
        )
    }

    #[test]
    fn test_ping_then_voucher() {
        let ledger = ledger();
        let device = SigningKey::generate(&mut OsRng);
        let data = r#"{"temperature": 19.0, "humidity": 55}"#;

        for expected in 1..=2 {
            let request: PingRequest = serde_json::from_str(&ping_body(&device, data)).unwrap();
            let response = submit_ping(&ledger, &request).unwrap();
            assert!(response.success);
            assert_eq!(response.unclaimed_rewards, expected);
        }

        let device_pubkey = Pubkey::new_from_array(device.verifying_key().to_bytes());
        let request = VoucherRequest {
            device_public_key: device_pubkey.to_string(),
        };
        let response = request_voucher(&ledger, &request).unwrap();
        assert_eq!(response.lifetime_rewards, "2");
        assert_eq!(response.oracle_public_key, ledger.oracle_pubkey().to_string());

        let json = serde_json::to_value(&response).unwrap();
        assert!(json["oraclePublicKey"].is_string());
        assert!(json["lifetimeRewards"].is_string());

        let voucher = response.into_voucher(&device_pubkey).unwrap();
        assert!(voucher.verify().is_ok());

        assert!(matches!(
            request_voucher(&ledger, &request),
            Err(LedgerError::NoRewardsToClaim)
        ));
    }

    #[test]
    fn test_ping_signature_covers_raw_bytes() {
        let ledger = ledger();
        let device = SigningKey::generate(&mut OsRng);
        let body = ping_body(&device, r#"{"temperature":19,"humidity":55}"#);
        // same values, different whitespace than what was signed
        let body = body.replace(r#""humidity":55"#, r#""humidity": 55"#);

        let request: PingRequest = serde_json::from_str(&body).unwrap();
        assert!(matches!(
            submit_ping(&ledger, &request),
            Err(LedgerError::InvalidSignature)
        ));
    }

    #[test]
    fn test_malformed_identifiers() {
        let ledger = ledger();

        let request = VoucherRequest {
            device_public_key: "not-a-key".to_string(),
        };
        assert!(matches!(
            request_voucher(&ledger, &request),
            Err(LedgerError::InvalidPublicKey(_))
        ));

        assert!(matches!(parse_signature("3J98t1Wp"), Err(LedgerError::InvalidSignature)));
        assert!(matches!(parse_signature("0OIl"), Err(LedgerError::InvalidSignature)));
    }

    #[test]
    fn test_error_response() {
        let response = ErrorResponse::from(&LedgerError::InvalidSignature);
        assert_eq!(response.error, "Invalid signature");
        assert!(!response.retryable);

        let busy = std::io::Error::new(std::io::ErrorKind::WouldBlock, "locked");
        let response = ErrorResponse::from(&LedgerError::from(busy));
        assert!(response.retryable);

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["retryable"], true);
        assert!(json["error"].is_string());
    }
}
