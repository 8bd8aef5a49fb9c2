use crate::dsp::biquad::BiquadFilter;

/*
Multiband "Over The Top" Compressor
===================================

Three bands, each compressed upward (quiet material pulled up) and downward
(loud material pushed down) at the same time - the aggressive "OTT" sound.

Band split
----------

Two independent 4th-order splits, each a cascade of two Butterworth
biquads (Linkwitz-Riley style):

    low  = LP(100Hz)  ∘ LP(100Hz)  applied to the input
    high = HP(3kHz)   ∘ HP(3kHz)   applied to the input
    mid  = input - low - high

The mid band is never filtered directly; it is the residual, so
low + mid + high reconstructs the input exactly when no gain is applied.

Gain computation, per band and channel
--------------------------------------

Two envelope followers per band (envUp, envDown) share fixed ~15ms attack /
~150ms release constants, re-derived from the sample rate. Against the
band's fixed thresholds:

    upward:   envUp below threshold (and above the 1e-5 noise floor)
              gain *= 1 + (threshold / envUp - 1) * depth     cap 10x
    downward: envDown above threshold
              gain *= 1 - (1 - threshold / envDown) * depth   floor 0.1x

The noise floor keeps silence from being amplified into a hiss pedestal and
the cap/floor bound the stage at roughly ±20dB.

The stage is a strict no-op when all three depths sit below 0.001: no
filters run, no followers update.
*/

const LOW_CROSSOVER_HZ: f32 = 100.0;
const HIGH_CROSSOVER_HZ: f32 = 3_000.0;
const CROSSOVER_Q: f32 = 0.707;

const ATTACK_TIME: f32 = 0.015;
const RELEASE_TIME: f32 = 0.150;

/// Fixed per-band thresholds, tuned per band: [low, mid, high].
const UP_THRESHOLDS: [f32; 3] = [0.08, 0.10, 0.12];
const DOWN_THRESHOLDS: [f32; 3] = [0.30, 0.35, 0.40];

const NOISE_FLOOR: f32 = 1e-5;
const MAX_UP_GAIN: f32 = 10.0;
const MIN_DOWN_GAIN: f32 = 0.1;

/// Smoothed level pair for one band of one channel.
#[derive(Clone, Copy, Default)]
struct BandState {
    env_up: f32,
    env_down: f32,
}

impl BandState {
    #[inline]
    fn track(&mut self, level: f32, attack_coef: f32, release_coef: f32) {
        let coef_up = if level > self.env_up { attack_coef } else { release_coef };
        self.env_up = level + coef_up * (self.env_up - level);

        let coef_down = if level > self.env_down { attack_coef } else { release_coef };
        self.env_down = level + coef_down * (self.env_down - level);
    }
}

/// One channel's crossover filters and band followers.
struct OttChannel {
    low_cascade: [BiquadFilter; 2],
    high_cascade: [BiquadFilter; 2],
    bands: [BandState; 3],
}

impl OttChannel {
    fn new(sample_rate: f32) -> Self {
        let mut channel = Self {
            low_cascade: [BiquadFilter::new(), BiquadFilter::new()],
            high_cascade: [BiquadFilter::new(), BiquadFilter::new()],
            bands: [BandState::default(); 3],
        };
        channel.configure(sample_rate);
        channel
    }

    fn configure(&mut self, sample_rate: f32) {
        for filter in &mut self.low_cascade {
            filter.set_sample_rate(sample_rate);
            filter.set_lowpass(LOW_CROSSOVER_HZ, CROSSOVER_Q);
        }
        for filter in &mut self.high_cascade {
            filter.set_sample_rate(sample_rate);
            filter.set_highpass(HIGH_CROSSOVER_HZ, CROSSOVER_Q);
        }
    }

    /// Split one sample into (low, mid, high). Mid is the residual, so the
    /// three bands always sum back to the input.
    #[inline]
    fn split(&mut self, input: f32) -> (f32, f32, f32) {
        let low = self
            .low_cascade
            .iter_mut()
            .fold(input, |x, filter| filter.process(x));
        let high = self
            .high_cascade
            .iter_mut()
            .fold(input, |x, filter| filter.process(x));
        let mid = input - low - high;
        (low, mid, high)
    }

    fn reset(&mut self) {
        for filter in self.low_cascade.iter_mut().chain(self.high_cascade.iter_mut()) {
            filter.reset();
        }
        self.bands = [BandState::default(); 3];
    }
}

pub struct MultibandOtt {
    channels: [OttChannel; 2],
    depths: [f32; 3],
    mix: f32,
    attack_coef: f32,
    release_coef: f32,
    sample_rate: f32,
}

impl MultibandOtt {
    pub fn new(sample_rate: f32) -> Self {
        let mut ott = Self {
            channels: [OttChannel::new(sample_rate), OttChannel::new(sample_rate)],
            depths: [0.0; 3],
            mix: 1.0,
            attack_coef: 0.0,
            release_coef: 0.0,
            sample_rate,
        };
        ott.set_sample_rate(sample_rate);
        ott
    }

    /// Re-derive crossover coefficients and follower time constants.
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate.max(1.0);
        self.attack_coef = (-1.0 / (ATTACK_TIME * self.sample_rate)).exp();
        self.release_coef = (-1.0 / (RELEASE_TIME * self.sample_rate)).exp();
        for channel in &mut self.channels {
            channel.configure(self.sample_rate);
        }
    }

    /// Per-band compression depths: [low, mid, high], each 0..1.
    pub fn set_depths(&mut self, low: f32, mid: f32, high: f32) {
        self.depths = [
            low.clamp(0.0, 1.0),
            mid.clamp(0.0, 1.0),
            high.clamp(0.0, 1.0),
        ];
    }

    pub fn set_mix(&mut self, mix: f32) {
        self.mix = mix.clamp(0.0, 1.0);
    }

    fn bypassed(&self) -> bool {
        self.depths.iter().all(|depth| *depth < 0.001)
    }

    #[inline]
    fn band_gain(state: &BandState, depth: f32, band: usize) -> f32 {
        let mut gain = 1.0;

        let up_threshold = UP_THRESHOLDS[band];
        if state.env_up < up_threshold && state.env_up > NOISE_FLOOR {
            gain *= (1.0 + (up_threshold / state.env_up - 1.0) * depth).min(MAX_UP_GAIN);
        }

        let down_threshold = DOWN_THRESHOLDS[band];
        if state.env_down > down_threshold {
            gain *= (1.0 - (1.0 - down_threshold / state.env_down) * depth).max(MIN_DOWN_GAIN);
        }

        gain
    }

    pub fn process(&mut self, left: &mut [f32], right: &mut [f32]) {
        debug_assert_eq!(left.len(), right.len());
        if self.bypassed() {
            return;
        }

        let attack_coef = self.attack_coef;
        let release_coef = self.release_coef;
        let depths = self.depths;
        let mix = self.mix;

        for (channel, buffer) in [left, right].into_iter().enumerate() {
            let state = &mut self.channels[channel];
            for sample in buffer.iter_mut() {
                let dry = *sample;
                let (low, mid, high) = state.split(dry);

                let mut wet = 0.0;
                for (band, level) in [low, mid, high].into_iter().enumerate() {
                    state.bands[band].track(level.abs(), attack_coef, release_coef);
                    wet += level * Self::band_gain(&state.bands[band], depths[band], band);
                }

                *sample = dry + (wet - dry) * mix;
            }
        }
    }

    pub fn reset(&mut self) {
        for channel in &mut self.channels {
            channel.reset();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bands_reconstruct_the_input_exactly() {
        let mut channel = OttChannel::new(48_000.0);

        for i in 0..4_096 {
            let input = (i as f32 * 0.013).sin() * 0.8 + (i as f32 * 0.31).sin() * 0.2;
            let (low, mid, high) = channel.split(input);
            let sum = low + mid + high;
            assert!(
                (sum - input).abs() < 1e-5,
                "band sum drifted at {}: {} vs {}",
                i,
                sum,
                input
            );
        }
    }

    #[test]
    fn zero_depths_is_exact_passthrough() {
        let mut ott = MultibandOtt::new(48_000.0);
        ott.set_depths(0.0, 0.0, 0.0);
        ott.set_mix(1.0);

        let mut left: Vec<f32> = (0..1_024).map(|i| (i as f32 * 0.17).sin()).collect();
        let expected = left.clone();
        let mut right = left.clone();
        ott.process(&mut left, &mut right);

        assert_eq!(left, expected, "all-zero depths must be a no-op");
    }

    #[test]
    fn quiet_signal_is_pulled_up() {
        let mut ott = MultibandOtt::new(48_000.0);
        ott.set_depths(0.0, 1.0, 0.0);
        ott.set_mix(1.0);

        // Quiet mid-band tone, well under the mid up-threshold
        let mut left: Vec<f32> = (0..24_000)
            .map(|i| (std::f32::consts::TAU * 500.0 * i as f32 / 48_000.0).sin() * 0.01)
            .collect();
        let mut right = left.clone();
        let dry_rms = rms(&left);
        ott.process(&mut left, &mut right);
        let wet_rms = rms(&left[12_000..]);

        assert!(
            wet_rms > dry_rms * 2.0,
            "upward stage should lift quiet material: {} vs {}",
            wet_rms,
            dry_rms
        );
    }

    #[test]
    fn loud_signal_is_pushed_down() {
        let mut ott = MultibandOtt::new(48_000.0);
        ott.set_depths(0.0, 1.0, 0.0);
        ott.set_mix(1.0);

        let mut left: Vec<f32> = (0..24_000)
            .map(|i| (std::f32::consts::TAU * 500.0 * i as f32 / 48_000.0).sin() * 0.9)
            .collect();
        let mut right = left.clone();
        let dry_rms = rms(&left);
        ott.process(&mut left, &mut right);
        let wet_rms = rms(&left[12_000..]);

        assert!(
            wet_rms < dry_rms * 0.9,
            "downward stage should tame loud material: {} vs {}",
            wet_rms,
            dry_rms
        );
    }

    #[test]
    fn gain_stays_within_the_documented_bounds() {
        let mut ott = MultibandOtt::new(48_000.0);
        ott.set_depths(1.0, 1.0, 1.0);
        ott.set_mix(1.0);

        let mut left: Vec<f32> = (0..8_192)
            .map(|i| if i % 97 == 0 { 0.9 } else { 0.0001 })
            .collect();
        let mut right = left.clone();
        ott.process(&mut left, &mut right);

        for s in left.iter().chain(right.iter()) {
            assert!(s.is_finite());
            assert!(s.abs() < 12.0, "per-band gain bounds violated: {}", s);
        }
    }

    fn rms(buffer: &[f32]) -> f32 {
        (buffer.iter().map(|s| s * s).sum::<f32>() / buffer.len() as f32).sqrt()
    }
}
