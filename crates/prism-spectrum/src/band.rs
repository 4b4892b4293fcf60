//! The closed set of spectral bands.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A spectral band - the fixed classification tag carried by every message
/// and every validator.
///
/// Bands are a closed set: adding one is a source change, not a registry
/// entry. Enum order is ascending frequency, which is also the canonical
/// ordering used by quorum selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Band {
    /// Radio band - cheapest, bulk traffic.
    Radio,
    /// Microwave band.
    Microwave,
    /// Infrared band.
    Infrared,
    /// Visible band - the default for ordinary messaging.
    Visible,
    /// Ultraviolet band.
    Ultraviolet,
    /// X-ray band - most expensive, priority traffic.
    XRay,
}

/// Error returned when parsing a band name that is not in the configured set.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown band: {0:?}")]
pub struct UnknownBand(pub String);

impl Band {
    /// All bands in canonical (ascending frequency) order.
    pub const ALL: [Band; 6] = [
        Band::Radio,
        Band::Microwave,
        Band::Infrared,
        Band::Visible,
        Band::Ultraviolet,
        Band::XRay,
    ];

    /// Number of configured bands.
    pub const COUNT: usize = Self::ALL.len();

    /// The band's frequency constant in Hz.
    ///
    /// These are configured fee-model constants, each an exact multiple of
    /// [`COST_SCALE_HZ`](crate::COST_SCALE_HZ) so that per-byte pricing is
    /// exact integer arithmetic.
    pub const fn frequency_hz(self) -> u64 {
        match self {
            Band::Radio => 30_000_000_000_000,            // 3.0e13
            Band::Microwave => 300_000_000_000_000,       // 3.0e14
            Band::Infrared => 1_000_000_000_000_000,      // 1.0e15
            Band::Visible => 30_000_000_000_000_000,      // 3.0e16
            Band::Ultraviolet => 300_000_000_000_000_000, // 3.0e17
            Band::XRay => 1_000_000_000_000_000_000,      // 1.0e18
        }
    }

    /// Canonical lowercase name, matching the wire encoding.
    pub const fn name(self) -> &'static str {
        match self {
            Band::Radio => "radio",
            Band::Microwave => "microwave",
            Band::Infrared => "infrared",
            Band::Visible => "visible",
            Band::Ultraviolet => "ultraviolet",
            Band::XRay => "xray",
        }
    }

    /// Position in canonical order.
    pub fn index(self) -> usize {
        Self::ALL.iter().position(|b| *b == self).unwrap_or(0)
    }

    /// Parse a band from its canonical name.
    pub fn parse(name: &str) -> Result<Self, UnknownBand> {
        match name {
            "radio" => Ok(Band::Radio),
            "microwave" => Ok(Band::Microwave),
            "infrared" => Ok(Band::Infrared),
            "visible" => Ok(Band::Visible),
            "ultraviolet" => Ok(Band::Ultraviolet),
            "xray" => Ok(Band::XRay),
            other => Err(UnknownBand(other.to_string())),
        }
    }
}

impl std::fmt::Display for Band {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for Band {
    type Err = UnknownBand;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
