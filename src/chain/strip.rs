use crate::chain::params::ChannelStripParams;
use crate::dsp::biquad::BiquadFilter;
use crate::dynamics::{MultibandOtt, TransientShaper};
use crate::fx::drive::Drive;

/// Per-instrument processing chain, fixed order:
///
/// ```text
/// in → HPF (0/1/2 stages) → low shelf → mid peak → high shelf
///    → drive → transient shaper → multiband OTT → out
/// ```
///
/// The EQ stages always run, even at zero gain, so the per-block CPU cost
/// does not jump when a gain knob crosses zero; at 0dB the derived
/// coefficients reduce to exact identity so this costs nothing audible.
/// Drive, punch and OTT each bypass below 0.001.
///
/// `update_params` swaps the whole snapshot and re-derives every
/// coefficient, but never resets filter state - resetting mid-note would
/// click on every parameter touch.
pub struct ChannelStrip {
    params: ChannelStripParams,
    sample_rate: f32,

    hpf: [[BiquadFilter; 2]; 2], // [channel][stage]
    low_shelf: [BiquadFilter; 2],
    mid_peak: [BiquadFilter; 2],
    high_shelf: [BiquadFilter; 2],

    drive: Drive,
    transient: TransientShaper,
    ott: MultibandOtt,
}

const HPF_MIN_FREQ: f32 = 20.0;
const HPF_MAX_FREQ: f32 = 500.0;
const HPF_Q: f32 = 0.707;

impl ChannelStrip {
    pub fn new(sample_rate: f32) -> Self {
        let mut strip = Self {
            params: ChannelStripParams::default(),
            sample_rate,
            hpf: [
                [BiquadFilter::new(), BiquadFilter::new()],
                [BiquadFilter::new(), BiquadFilter::new()],
            ],
            low_shelf: [BiquadFilter::new(), BiquadFilter::new()],
            mid_peak: [BiquadFilter::new(), BiquadFilter::new()],
            high_shelf: [BiquadFilter::new(), BiquadFilter::new()],
            drive: Drive::new(),
            transient: TransientShaper::new(sample_rate),
            ott: MultibandOtt::new(sample_rate),
        };
        strip.set_sample_rate(sample_rate);
        strip
    }

    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate.max(1.0);
        for channel in &mut self.hpf {
            for filter in channel.iter_mut() {
                filter.set_sample_rate(self.sample_rate);
            }
        }
        for filter in self
            .low_shelf
            .iter_mut()
            .chain(self.mid_peak.iter_mut())
            .chain(self.high_shelf.iter_mut())
        {
            filter.set_sample_rate(self.sample_rate);
        }
        self.transient.set_sample_rate(self.sample_rate);
        self.ott.set_sample_rate(self.sample_rate);
        self.update_params(self.params);
    }

    /// Replace the whole parameter snapshot and re-derive every stage.
    /// Filter state is deliberately left alone.
    pub fn update_params(&mut self, params: ChannelStripParams) {
        self.params = params;

        let hpf_freq = params.hpf_freq.clamp(HPF_MIN_FREQ, HPF_MAX_FREQ);
        for channel in &mut self.hpf {
            for filter in channel.iter_mut() {
                filter.set_highpass(hpf_freq, HPF_Q);
            }
        }

        for filter in &mut self.low_shelf {
            filter.set_low_shelf(params.low_freq, params.low_gain_db);
        }
        for filter in &mut self.mid_peak {
            filter.set_peak(params.mid_freq, params.mid_gain_db, params.mid_q.max(0.1));
        }
        for filter in &mut self.high_shelf {
            filter.set_high_shelf(params.high_freq, params.high_gain_db);
        }

        self.drive.set_amount(params.drive);
        self.drive.set_tone(params.drive_tone);
        self.transient.set_amount(params.punch);
        self.ott
            .set_depths(params.ott_low, params.ott_mid, params.ott_high);
        self.ott.set_mix(params.ott_mix);
    }

    pub fn params(&self) -> &ChannelStripParams {
        &self.params
    }

    pub fn process(&mut self, left: &mut [f32], right: &mut [f32]) {
        debug_assert_eq!(left.len(), right.len());

        let hpf_stages = self.params.hpf_slope.stages();

        for (channel, buffer) in [&mut *left, &mut *right].into_iter().enumerate() {
            for sample in buffer.iter_mut() {
                let mut x = *sample;
                for stage in 0..hpf_stages {
                    x = self.hpf[channel][stage].process(x);
                }
                x = self.low_shelf[channel].process(x);
                x = self.mid_peak[channel].process(x);
                x = self.high_shelf[channel].process(x);
                *sample = x;
            }
        }

        if self.params.drive >= 0.001 {
            self.drive.process(left, right);
        }
        self.transient.process(left, right);
        self.ott.process(left, right);
    }

    pub fn reset(&mut self) {
        for channel in &mut self.hpf {
            for filter in channel.iter_mut() {
                filter.reset();
            }
        }
        for filter in self
            .low_shelf
            .iter_mut()
            .chain(self.mid_peak.iter_mut())
            .chain(self.high_shelf.iter_mut())
        {
            filter.reset();
        }
        self.drive.reset();
        self.transient.reset();
        self.ott.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::params::HpfSlope;

    fn test_tone(len: usize) -> Vec<f32> {
        (0..len).map(|i| (i as f32 * 0.13).sin() * 0.5).collect()
    }

    #[test]
    fn neutral_params_are_bit_exact_passthrough() {
        let mut strip = ChannelStrip::new(48_000.0);
        strip.update_params(ChannelStripParams::default());

        let mut left = test_tone(1_024);
        let expected = left.clone();
        let mut right = left.clone();
        strip.process(&mut left, &mut right);

        assert_eq!(left, expected, "every stage must bypass at neutral settings");
        assert_eq!(right, expected);
    }

    #[test]
    fn hpf_slope_controls_rolloff() {
        let dc = vec![1.0f32; 16_384];

        let run = |slope: HpfSlope| -> f32 {
            let mut strip = ChannelStrip::new(48_000.0);
            let params = ChannelStripParams {
                hpf_slope: slope,
                hpf_freq: 200.0,
                ..Default::default()
            };
            strip.update_params(params);
            let mut left = dc.clone();
            let mut right = dc.clone();
            strip.process(&mut left, &mut right);
            left[16_383].abs()
        };

        let off = run(HpfSlope::Off);
        let db12 = run(HpfSlope::Db12);
        let db24 = run(HpfSlope::Db24);

        assert!((off - 1.0).abs() < 1e-6, "slope Off must not filter");
        assert!(db12 < 1e-3, "12dB slope should remove DC");
        assert!(db24 <= db12 + 1e-9, "24dB slope is at least as steep");
    }

    #[test]
    fn eq_gain_shapes_the_spectrum() {
        let mut strip = ChannelStrip::new(48_000.0);
        let params = ChannelStripParams {
            mid_freq: 1_000.0,
            mid_gain_db: 12.0,
            mid_q: 1.0,
            ..Default::default()
        };
        strip.update_params(params);

        let mut left: Vec<f32> = (0..8_192)
            .map(|i| (std::f32::consts::TAU * 1_000.0 * i as f32 / 48_000.0).sin() * 0.1)
            .collect();
        let mut right = left.clone();
        strip.process(&mut left, &mut right);

        let peak = left[4_096..].iter().fold(0.0f32, |m, s| m.max(s.abs()));
        assert!(
            peak > 0.3,
            "+12dB peak at the tone frequency should roughly 4x it, got {}",
            peak
        );
    }

    #[test]
    fn update_params_does_not_reset_filter_state() {
        let mut strip = ChannelStrip::new(48_000.0);
        let params = ChannelStripParams {
            hpf_slope: HpfSlope::Db12,
            hpf_freq: 100.0,
            ..Default::default()
        };
        strip.update_params(params);

        // Prime the filters with signal
        let mut left = vec![0.5f32; 512];
        let mut right = vec![0.5f32; 512];
        strip.process(&mut left, &mut right);

        // Re-apply params mid-stream; the next block must continue smoothly
        // rather than restarting from zeroed state (which would step).
        strip.update_params(params);
        let mut next_l = vec![0.5f32; 64];
        let mut next_r = vec![0.5f32; 64];
        strip.process(&mut next_l, &mut next_r);

        let step = (next_l[0] - left[511]).abs();
        assert!(
            step < 0.05,
            "parameter update should not discontinue the output, step {}",
            step
        );
    }

    #[test]
    fn drive_engages_above_the_bypass_floor() {
        let mut strip = ChannelStrip::new(48_000.0);
        let params = ChannelStripParams {
            drive: 0.8,
            drive_tone: 1.0,
            ..Default::default()
        };
        strip.update_params(params);

        let mut left = vec![1.0f32; 64];
        let mut right = vec![1.0f32; 64];
        strip.process(&mut left, &mut right);
        assert!(left[0] < 1.0, "hot input through drive should be squashed");
    }
}
