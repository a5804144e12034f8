//! Protocol timing rules for ledger close.
//!
//! Agreed close times are rounded to a resolution chosen from a fixed
//! schedule. The resolution adapts per ledger: when the previous close time
//! was not consensus-agreed the granularity coarsens to make agreement
//! easier, and after a run of agreed closes it is tightened again.

/// Close-time resolutions a ledger may use, in seconds, finest first.
pub const CLOSE_TIME_RESOLUTIONS: [u8; 6] = [10, 20, 30, 60, 90, 120];

/// Resolution used by the genesis ledger.
pub const DEFAULT_CLOSE_TIME_RESOLUTION: u8 = 30;

/// Tighten the resolution one step every this many ledgers of agreement.
pub const INCREASE_RESOLUTION_EVERY: u32 = 8;

/// Coarsen the resolution one step every this many ledgers of disagreement.
pub const DECREASE_RESOLUTION_EVERY: u32 = 1;

/// Round a close time to a multiple of the resolution.
///
/// Zero is a sentinel for "no close time" and is never rounded.
pub fn round_close_time(close_time: u32, resolution: u8) -> u32 {
    if close_time == 0 || resolution == 0 {
        return close_time;
    }
    let res = u64::from(resolution);
    let t = u64::from(close_time) + res / 2;
    (t - t % res) as u32
}

/// Choose the close-time resolution for the ledger at `ledger_seq`, given
/// the previous ledger's resolution and whether its close time was
/// consensus-agreed.
pub fn next_close_time_resolution(previous: u8, previous_agree: bool, ledger_seq: u32) -> u8 {
    debug_assert!(ledger_seq != 0);

    let pos = match CLOSE_TIME_RESOLUTIONS.iter().position(|&r| r == previous) {
        Some(pos) => pos,
        // Unknown resolution, leave it alone.
        None => return previous,
    };

    // Disagreement coarsens the granularity to make consensus easier.
    if !previous_agree && ledger_seq % DECREASE_RESOLUTION_EVERY == 0 {
        if let Some(&coarser) = CLOSE_TIME_RESOLUTIONS.get(pos + 1) {
            return coarser;
        }
    }

    // Sustained agreement tightens it again.
    if previous_agree && ledger_seq % INCREASE_RESOLUTION_EVERY == 0 && pos > 0 {
        return CLOSE_TIME_RESOLUTIONS[pos - 1];
    }

    previous
}
