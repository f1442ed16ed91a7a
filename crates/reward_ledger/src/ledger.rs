//! Reward accrual and voucher issuance
//!
//! Every mutation is one store transaction: the device's counters are read,
//! changed and committed together, and the caller only sees a result once
//! the commit succeeded.

use anchor_lang::prelude::Pubkey;
use chrono::Utc;
use tracing::{debug, info, warn};

use crate::config::LedgerConfig;
use crate::oracle::OracleSigner;
use crate::store::{DeviceUpdate, LedgerEntry, LedgerStore};
use crate::telemetry::{Telemetry, TelemetrySample};
use crate::voucher::{verify_signature, ClaimVoucher};
use crate::{LedgerError, Result};

pub struct RewardLedger<S: LedgerStore> {
    store: S,
    oracle: OracleSigner,
    config: LedgerConfig,
}

impl<S: LedgerStore> RewardLedger<S> {
    pub fn open(store: S, oracle: OracleSigner, config: LedgerConfig) -> Result<Self> {
        info!(
            "Reward ledger opened: {} devices, oracle {}",
            store.device_count()?,
            oracle.pubkey()
        );

        Ok(Self {
            store,
            oracle,
            config,
        })
    }

    pub fn oracle_pubkey(&self) -> Pubkey {
        self.oracle.pubkey()
    }

    pub fn entry(&self, device: &Pubkey) -> Result<Option<LedgerEntry>> {
        self.store.entry(device)
    }

    pub fn unclaimed_rewards(&self, device: &Pubkey) -> Result<u64> {
        Ok(self
            .store
            .entry(device)?
            .map_or(0, |entry| entry.unclaimed_rewards))
    }

    /// Accept one signed telemetry reading and credit the device
    ///
    /// `payload` is the exact text the device signed. Returns the device's
    /// unclaimed balance after the credit.
    pub fn record_ping(&self, device: &Pubkey, payload: &str, signature: &[u8; 64]) -> Result<u64> {
        if let Err(e) = verify_signature(device, payload.as_bytes(), signature) {
            warn!("Rejected ping from {}: bad signature", device);
            return Err(e);
        }
        let telemetry = Telemetry::parse(payload, &self.config.bounds).map_err(|e| {
            warn!("Rejected ping from {}: {}", device, e);
            e
        })?;

        let reward = self.config.reward_per_ping;
        let unclaimed = self.commit(device, |pending| {
            let now = Utc::now();
            pending.record.unclaimed_rewards = pending
                .record
                .unclaimed_rewards
                .checked_add(reward)
                .ok_or(LedgerError::RewardOverflow)?;
            pending.record.last_ping_at = Some(now);
            pending.append(TelemetrySample::new(telemetry, now));
            Ok(pending.record.unclaimed_rewards)
        })?;

        debug!("Ping from {} accepted, unclaimed {}", device, unclaimed);
        Ok(unclaimed)
    }

    /// Sign a voucher for everything the device has accrued and zero its balance
    ///
    /// The voucher names a cumulative total: the previous voucher's total (or
    /// the synced on-ledger claim total) plus the unclaimed balance. It is
    /// only returned once the reset is committed.
    pub fn issue_voucher(&self, device: &Pubkey) -> Result<ClaimVoucher> {
        let voucher = self.commit(device, |pending| {
            let record = &mut pending.record;
            if record.unclaimed_rewards == 0 {
                return Err(LedgerError::NoRewardsToClaim);
            }
            let lifetime_rewards = record
                .vouched_total
                .checked_add(record.unclaimed_rewards)
                .ok_or(LedgerError::RewardOverflow)?;
            let timestamp = u64::try_from(Utc::now().timestamp_millis()).unwrap_or_default();

            let voucher = self.oracle.sign_voucher(device, lifetime_rewards, timestamp);
            record.unclaimed_rewards = 0;
            record.vouched_total = lifetime_rewards;
            Ok(voucher)
        })?;

        info!(
            "Issued voucher for {}: lifetime_rewards={} timestamp={}",
            device, voucher.lifetime_rewards, voucher.timestamp
        );
        Ok(voucher)
    }

    /// Record the on-ledger `total_claimed` observed for `device`
    ///
    /// Only ever raises the floor new vouchers are built on. Returns the
    /// resulting floor.
    pub fn sync_claimed_total(&self, device: &Pubkey, total_claimed: u64) -> Result<u64> {
        self.commit(device, |pending| {
            let record = &mut pending.record;
            if total_claimed > record.vouched_total {
                debug!(
                    "Raising vouched total for {} from {} to {}",
                    device, record.vouched_total, total_claimed
                );
                record.vouched_total = total_claimed;
            }
            Ok(record.vouched_total)
        })
    }

    fn commit<T>(
        &self,
        device: &Pubkey,
        update: impl FnOnce(&mut DeviceUpdate) -> Result<T>,
    ) -> Result<T> {
        self.store.transact(device, update).map_err(|e| {
            if e.is_retryable() {
                warn!("Failed to commit ledger update for {}: {}", device, e);
            }
            e
        })
    }
}
