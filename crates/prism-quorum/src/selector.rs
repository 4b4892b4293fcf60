//! Deterministic band-diverse quorum selection.

use prism_spectrum::Band;
use tracing::trace;

use crate::error::SelectionError;
use crate::registry::{Validator, ValidatorRegistry};

/// Select an admission quorum spanning `required_diversity` distinct bands.
///
/// Selection is deterministic and uses no randomness:
///
/// 1. Bands with at least one validator are taken in canonical order.
/// 2. The order is rotated by `rotation % available_bands` so the band that
///    leads selection cycles across admissions instead of always being the
///    lowest-frequency one.
/// 3. The first `required_diversity` bands of the rotated order each
///    contribute their first-registered validator.
///
/// The caller feeds its admitted-message count as `rotation`; over any run
/// of admissions that is a multiple of the available band count, every band
/// leads equally often.
///
/// # Errors
///
/// [`SelectionError::InsufficientDiversity`] when fewer bands have validators
/// than `required_diversity`, naming the empty bands. Callers must run this
/// check before any payment-affecting step.
pub fn select_quorum(
    registry: &ValidatorRegistry,
    required_diversity: usize,
    rotation: u64,
) -> Result<Vec<Validator>, SelectionError> {
    let available = registry.bands_present();
    if available.len() < required_diversity {
        return Err(SelectionError::InsufficientDiversity {
            required: required_diversity,
            available: available.len(),
            missing: registry.bands_missing(),
        });
    }

    let offset = (rotation % available.len() as u64) as usize;
    let quorum: Vec<Validator> = available
        .iter()
        .cycle()
        .skip(offset)
        .take(required_diversity)
        .map(|band| {
            // bands_present only lists non-empty bands.
            registry
                .first_in_band(*band)
                .cloned()
                .expect("non-empty band has a first validator")
        })
        .collect();

    trace!(
        required_diversity,
        rotation,
        offset,
        lead = %available[offset],
        "selected quorum"
    );

    Ok(quorum)
}

/// Distinct bands represented in a candidate quorum.
///
/// Engines re-verify the diversity postcondition with this instead of
/// trusting the selector.
pub fn distinct_bands(quorum: &[Validator]) -> Vec<Band> {
    let mut bands: Vec<Band> = quorum.iter().map(|v| v.band).collect();
    bands.sort();
    bands.dedup();
    bands
}
