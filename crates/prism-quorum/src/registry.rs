//! The validator registry.

use std::collections::{BTreeMap, HashMap};

use prism_spectrum::{Band, Credits};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::RegistryError;

/// A registered validator.
///
/// The band is assigned at registration and never changes. Stake is
/// informational for now - rewards split equally across a quorum.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Validator {
    /// Unique identifier (an account id in the ledger).
    pub id: String,

    /// Spectral band this validator serves.
    pub band: Band,

    /// Staked credits.
    pub stake: Credits,
}

/// The set of known validators, grouped by band in registration order.
///
/// Validators are never removed here; slashing and retirement belong to the
/// validator-economics layer, not admission.
#[derive(Debug, Default, Clone)]
pub struct ValidatorRegistry {
    validators: HashMap<String, Validator>,
    /// Per-band ids, in registration order. First entry is the band's
    /// selection candidate.
    bands: BTreeMap<Band, Vec<String>>,
}

impl ValidatorRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a validator.
    ///
    /// Fails with [`RegistryError::DuplicateValidator`] if the id is already
    /// present.
    pub fn register(&mut self, id: String, band: Band, stake: Credits) -> Result<(), RegistryError> {
        if self.validators.contains_key(&id) {
            return Err(RegistryError::DuplicateValidator(id));
        }

        debug!(validator = %id, %band, %stake, "registered validator");
        self.bands.entry(band).or_default().push(id.clone());
        self.validators.insert(
            id.clone(),
            Validator { id, band, stake },
        );
        Ok(())
    }

    /// Look up a validator by id.
    pub fn get(&self, id: &str) -> Option<&Validator> {
        self.validators.get(id)
    }

    /// All validators grouped by band, registration order within each band.
    pub fn by_band(&self) -> BTreeMap<Band, Vec<&Validator>> {
        self.bands
            .iter()
            .map(|(band, ids)| {
                let members = ids
                    .iter()
                    .filter_map(|id| self.validators.get(id))
                    .collect();
                (*band, members)
            })
            .collect()
    }

    /// Bands that have at least one validator, in canonical order.
    pub fn bands_present(&self) -> Vec<Band> {
        self.bands.keys().copied().collect()
    }

    /// Bands with no registered validator, in canonical order.
    pub fn bands_missing(&self) -> Vec<Band> {
        Band::ALL
            .into_iter()
            .filter(|band| !self.bands.contains_key(band))
            .collect()
    }

    /// Number of bands with at least one validator.
    pub fn distinct_band_count(&self) -> usize {
        self.bands.len()
    }

    /// First-registered validator for a band, if any.
    pub fn first_in_band(&self, band: Band) -> Option<&Validator> {
        self.bands
            .get(&band)
            .and_then(|ids| ids.first())
            .and_then(|id| self.validators.get(id))
    }

    /// Total validator count.
    pub fn len(&self) -> usize {
        self.validators.len()
    }

    /// Check if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.validators.is_empty()
    }

    /// Iterate all validators in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = &Validator> {
        self.validators.values()
    }
}
