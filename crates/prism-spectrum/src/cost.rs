//! Deterministic message cost computation.
//!
//! Pure function of payload size and band. No error path: every input maps
//! to a positive cost.

use crate::{Band, Credits};

/// Minimum charge for any message, zero-length payloads included.
pub const COST_FLOOR: Credits = Credits::from_micro(10_000); // 0.01 credits

/// Hz of band frequency per micro-credit per byte.
///
/// Every band constant is an exact multiple of this divisor, so per-byte
/// pricing divides exactly: radio traffic costs 3 micro-credits per byte,
/// x-ray traffic 100_000.
pub const COST_SCALE_HZ: u128 = 10_000_000_000_000; // 1e13

/// Compute the settlement cost for a message of `content_size_bytes` sent on
/// `band`.
///
/// ```text
/// cost = FLOOR + frequency(band) × size / SCALE
/// ```
///
/// Deterministic, side-effect free and strictly increasing in size: each
/// byte adds at least 3 micro-credits in the cheapest band.
///
/// # Examples
///
/// ```
/// use prism_spectrum::{compute_cost, Band, COST_FLOOR};
///
/// // Zero-length messages still pay the floor.
/// assert_eq!(compute_cost(0, Band::Radio), COST_FLOOR);
///
/// // A 1 KiB visible-band message costs ~3 credits.
/// assert_eq!(compute_cost(1024, Band::Visible).as_micro(), 3_082_000);
/// ```
pub fn compute_cost(content_size_bytes: u64, band: Band) -> Credits {
    // u128 intermediates: 1e18 Hz × u64::MAX bytes stays well inside range.
    let metered = band.frequency_hz() as u128 * content_size_bytes as u128 / COST_SCALE_HZ;
    Credits::from_micro(COST_FLOOR.as_micro() + metered)
}
