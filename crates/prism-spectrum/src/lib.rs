//! Spectral bands, credit arithmetic and the Prism fee model.
//!
//! Every message and every validator in Prism is tagged with a **band** - one
//! of six fixed spectral classifications. The band drives two things:
//!
//! - the settlement cost of a message (higher-frequency bands cost more), and
//! - the diversity requirement on admission quorums (a quorum must span a
//!   configured minimum number of distinct bands).
//!
//! # Fee Model
//!
//! Fees are a pure function of payload size and band:
//!
//! ```text
//! cost = FLOOR + frequency(band) × size / SCALE
//! ```
//!
//! All arithmetic is integer micro-credits - no floats anywhere in the
//! settlement path. The frequency constants are a configuration table chosen
//! so that each additional byte costs at least one micro-credit in every
//! band, which makes cost strictly increasing in payload size.

mod band;
mod cost;
mod credits;

pub use band::{Band, UnknownBand};
pub use cost::{compute_cost, COST_FLOOR, COST_SCALE_HZ};
pub use credits::{Credits, MICRO_PER_CREDIT};
