//! Validator registry and band-diverse quorum selection.
//!
//! Admission of a message requires sign-off from a quorum of validators that
//! spans a configured minimum number of distinct spectral bands. This crate
//! holds the two pieces that make that possible:
//!
//! - [`ValidatorRegistry`] - the set of known validators, each tagged with an
//!   immutable band at registration time.
//! - [`select_quorum`] - deterministic selection of one validator per band,
//!   with a rotation offset so that no band is permanently favored as the
//!   first pick.
//!
//! # Determinism
//!
//! Selection uses no randomness. Given the same registry contents and the
//! same rotation counter, the same quorum comes back - which is what makes
//! admission reproducible in tests and audits.

mod error;
mod registry;
mod selector;

pub use error::{RegistryError, SelectionError};
pub use registry::{Validator, ValidatorRegistry};
pub use selector::{distinct_bands, select_quorum};

#[cfg(test)]
mod tests {
    use super::*;
    use prism_spectrum::{Band, Credits};

    #[test]
    fn full_registry_selects_any_diversity() {
        let mut registry = ValidatorRegistry::new();
        for band in Band::ALL {
            registry
                .register(format!("v-{band}"), band, Credits::from_whole(10))
                .unwrap();
        }

        for k in 1..=Band::COUNT {
            let quorum = select_quorum(&registry, k, 0).unwrap();
            assert_eq!(quorum.len(), k);
        }
    }
}
