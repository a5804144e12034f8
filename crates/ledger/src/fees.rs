//! Fee view.
//!
//! Base fee, reference fee units, and the account reserves are read from
//! the on-ledger fee-settings entry, falling back to configuration for
//! absent fields. The read is lazy and happens at most once per ledger:
//! concurrent callers race to install the same schedule and every later
//! call serves the cached copy.

use tracing::trace;

use weft_common::Config;

use crate::indexes;
use crate::ledger::Ledger;
use crate::services::LoadFeeTrack;

/// The fee and reserve schedule in force for one ledger.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct FeeSchedule {
    /// Cost of the reference transaction, in drops.
    pub base_fee: u64,
    /// Cost of the reference transaction, in fee units.
    pub reference_fee_units: u32,
    /// Minimum account balance, in drops.
    pub reserve_base: u32,
    /// Additional reserve per owned item, in drops.
    pub reserve_increment: u32,
}

impl Ledger {
    /// The fee schedule for this ledger, loading it on first use.
    pub fn fee_schedule(&self, config: &Config) -> FeeSchedule {
        *self.fee_cell().get_or_init(|| {
            let mut schedule = FeeSchedule {
                base_fee: config.fee_default,
                reference_fee_units: config.transaction_fee_base,
                reserve_base: config.fee_account_reserve,
                reserve_increment: config.fee_owner_reserve,
            };

            match self.entry(&indexes::fee_index()) {
                Ok(Some(entry)) => {
                    if let Some(settings) = entry.as_fee_settings() {
                        if let Some(base_fee) = settings.base_fee {
                            schedule.base_fee = base_fee;
                        }
                        if let Some(units) = settings.reference_fee_units {
                            schedule.reference_fee_units = units;
                        }
                        if let Some(reserve_base) = settings.reserve_base {
                            schedule.reserve_base = reserve_base;
                        }
                        if let Some(increment) = settings.reserve_increment {
                            schedule.reserve_increment = increment;
                        }
                    }
                }
                Ok(None) => {}
                Err(err) => {
                    trace!(seq = self.sequence(), %err, "fee entry unavailable, using defaults");
                }
            }
            schedule
        })
    }

    /// Cost of the reference transaction, in drops.
    pub fn base_fee(&self, config: &Config) -> u64 {
        self.fee_schedule(config).base_fee
    }

    /// Cost of the reference transaction, in fee units.
    pub fn reference_fee_units(&self, config: &Config) -> u32 {
        self.fee_schedule(config).reference_fee_units
    }

    /// Required reserve for an account owning `owner_count` items.
    pub fn reserve(&self, config: &Config, owner_count: u32) -> u64 {
        let schedule = self.fee_schedule(config);
        u64::from(owner_count) * u64::from(schedule.reserve_increment)
            + u64::from(schedule.reserve_base)
    }

    /// Reserve increment per owned item, in drops.
    pub fn reserve_increment(&self, config: &Config) -> u64 {
        u64::from(self.fee_schedule(config).reserve_increment)
    }

    /// Convert a fee in fee units to drops at the reference load.
    pub fn scale_fee_base(&self, config: &Config, track: &dyn LoadFeeTrack, fee: u64) -> u64 {
        let schedule = self.fee_schedule(config);
        track.scale_fee_base(fee, schedule.base_fee, schedule.reference_fee_units)
    }

    /// Convert a fee in fee units to drops at the current load.
    pub fn scale_fee_load(
        &self,
        config: &Config,
        track: &dyn LoadFeeTrack,
        fee: u64,
        admin: bool,
    ) -> u64 {
        let schedule = self.fee_schedule(config);
        track.scale_fee_load(fee, schedule.base_fee, schedule.reference_fee_units, admin)
    }
}
