#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// High-pass steepness: number of cascaded 2-pole stages.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HpfSlope {
    Off,
    Db12, // one biquad stage
    Db24, // two cascaded stages
}

impl HpfSlope {
    pub(crate) fn stages(self) -> usize {
        match self {
            HpfSlope::Off => 0,
            HpfSlope::Db12 => 1,
            HpfSlope::Db24 => 2,
        }
    }
}

/// Complete channel-strip configuration.
///
/// A plain `Copy` snapshot: the control side builds a new value and hands it
/// over whole, the strip re-derives everything from it in `update_params`.
/// Nothing in here is read while partially written - a snapshot is either
/// the old one or the new one.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChannelStripParams {
    pub hpf_slope: HpfSlope,
    /// High-pass corner, clamped by the strip to 20..500 Hz.
    pub hpf_freq: f32,

    pub low_freq: f32,
    pub low_gain_db: f32,
    pub mid_freq: f32,
    pub mid_gain_db: f32,
    pub mid_q: f32,
    pub high_freq: f32,
    pub high_gain_db: f32,

    /// Drive amount 0..1 (mapped to 1x..11x inside the drive stage).
    pub drive: f32,
    pub drive_tone: f32,

    /// Transient "punch" amount 0..1.
    pub punch: f32,

    pub ott_low: f32,
    pub ott_mid: f32,
    pub ott_high: f32,
    pub ott_mix: f32,
}

impl Default for ChannelStripParams {
    fn default() -> Self {
        Self {
            hpf_slope: HpfSlope::Off,
            hpf_freq: 80.0,

            low_freq: 120.0,
            low_gain_db: 0.0,
            mid_freq: 1_000.0,
            mid_gain_db: 0.0,
            mid_q: 0.707,
            high_freq: 8_000.0,
            high_gain_db: 0.0,

            drive: 0.0,
            drive_tone: 0.5,

            punch: 0.0,

            ott_low: 0.0,
            ott_mid: 0.0,
            ott_high: 0.0,
            ott_mix: 1.0,
        }
    }
}
