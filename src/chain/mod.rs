//! Per-instrument processing chain: EQ, drive, and dynamics in fixed order.

/// Flat parameter snapshot for the strip.
pub mod params;
/// The strip itself.
pub mod strip;

pub use params::{ChannelStripParams, HpfSlope};
pub use strip::ChannelStrip;
