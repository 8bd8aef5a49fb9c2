use crate::dsp::biquad::BiquadFilter;

/// Bipolar DJ-style sweep filter.
///
/// One knob, center-detented: negative positions sweep a 2-pole low-pass
/// down from open toward 200Hz, positive positions sweep a 2-pole high-pass
/// up from closed toward 8kHz, and the center is a true bypass (the filter
/// is not run at all). Cutoff moves exponentially with the knob so the sweep
/// feels even across the range.
pub struct DjFilter {
    filters: [BiquadFilter; 2],
    position: f32,
    bypassed: bool,
}

const LOWPASS_OPEN_HZ: f32 = 18_000.0;
const LOWPASS_CLOSED_HZ: f32 = 200.0;
const HIGHPASS_CLOSED_HZ: f32 = 20.0;
const HIGHPASS_OPEN_HZ: f32 = 8_000.0;
const SWEEP_Q: f32 = 0.707;

/// Dead zone around the detent treated as bypass.
const BYPASS_EPSILON: f32 = 0.01;

impl DjFilter {
    pub fn new(sample_rate: f32) -> Self {
        let mut filters = [BiquadFilter::new(), BiquadFilter::new()];
        for filter in &mut filters {
            filter.set_sample_rate(sample_rate);
        }
        Self {
            filters,
            position: 0.0,
            bypassed: true,
        }
    }

    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        for filter in &mut self.filters {
            filter.set_sample_rate(sample_rate);
        }
    }

    /// Knob position in -1..+1. Re-derives both channels' coefficients.
    pub fn set_position(&mut self, position: f32) {
        self.position = position.clamp(-1.0, 1.0);

        let was_bypassed = self.bypassed;
        self.bypassed = self.position.abs() < BYPASS_EPSILON;
        if self.bypassed {
            if !was_bypassed {
                // Stale state must not ring when the filter re-engages
                for filter in &mut self.filters {
                    filter.reset();
                }
            }
            return;
        }

        if self.position < 0.0 {
            let sweep = -self.position;
            let cutoff = LOWPASS_OPEN_HZ * (LOWPASS_CLOSED_HZ / LOWPASS_OPEN_HZ).powf(sweep);
            for filter in &mut self.filters {
                filter.set_lowpass(cutoff, SWEEP_Q);
            }
        } else {
            let sweep = self.position;
            let cutoff = HIGHPASS_CLOSED_HZ * (HIGHPASS_OPEN_HZ / HIGHPASS_CLOSED_HZ).powf(sweep);
            for filter in &mut self.filters {
                filter.set_highpass(cutoff, SWEEP_Q);
            }
        }
    }

    pub fn position(&self) -> f32 {
        self.position
    }

    pub fn process(&mut self, left: &mut [f32], right: &mut [f32]) {
        debug_assert_eq!(left.len(), right.len());
        if self.bypassed {
            return;
        }

        let [filter_l, filter_r] = &mut self.filters;
        for (l, r) in left.iter_mut().zip(right.iter_mut()) {
            *l = filter_l.process(*l);
            *r = filter_r.process(*r);
        }
    }

    pub fn reset(&mut self) {
        for filter in &mut self.filters {
            filter.reset();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tone(freq: f32, sample_rate: f32, len: usize) -> Vec<f32> {
        (0..len)
            .map(|i| (std::f32::consts::TAU * freq * i as f32 / sample_rate).sin())
            .collect()
    }

    fn peak(buf: &[f32]) -> f32 {
        buf.iter().skip(buf.len() / 2).fold(0.0f32, |m, s| m.max(s.abs()))
    }

    #[test]
    fn center_position_is_exact_bypass() {
        let mut filter = DjFilter::new(48_000.0);
        filter.set_position(0.0);

        let mut left = tone(1_000.0, 48_000.0, 512);
        let expected = left.clone();
        let mut right = left.clone();
        filter.process(&mut left, &mut right);

        assert_eq!(left, expected, "center detent must not touch samples");
    }

    #[test]
    fn negative_sweep_attenuates_highs() {
        let mut filter = DjFilter::new(48_000.0);
        filter.set_position(-0.9);

        let mut high = tone(8_000.0, 48_000.0, 4_096);
        let mut right = high.clone();
        filter.process(&mut high, &mut right);
        assert!(peak(&high) < 0.1, "lowpass sweep should kill 8kHz, got {}", peak(&high));

        let mut low = tone(100.0, 48_000.0, 4_096);
        let mut right = low.clone();
        filter.reset();
        filter.process(&mut low, &mut right);
        assert!(peak(&low) > 0.7, "lowpass sweep should keep 100Hz");
    }

    #[test]
    fn positive_sweep_attenuates_lows() {
        let mut filter = DjFilter::new(48_000.0);
        filter.set_position(0.9);

        let mut low = tone(100.0, 48_000.0, 4_096);
        let mut right = low.clone();
        filter.process(&mut low, &mut right);
        assert!(peak(&low) < 0.1, "highpass sweep should kill 100Hz, got {}", peak(&low));

        let mut high = tone(10_000.0, 48_000.0, 4_096);
        let mut right = high.clone();
        filter.reset();
        filter.process(&mut high, &mut right);
        assert!(peak(&high) > 0.7, "highpass sweep should keep 10kHz");
    }

    #[test]
    fn reengaging_from_bypass_starts_clean() {
        let mut filter = DjFilter::new(48_000.0);
        filter.set_position(-1.0);

        let mut left = vec![1.0f32; 256];
        let mut right = vec![1.0f32; 256];
        filter.process(&mut left, &mut right);

        filter.set_position(0.0); // bypass clears state
        filter.set_position(0.5);
        let mut silent_l = vec![0.0f32; 64];
        let mut silent_r = vec![0.0f32; 64];
        filter.process(&mut silent_l, &mut silent_r);
        assert!(silent_l.iter().all(|s| s.abs() < 1e-6), "stale state rang through");
    }
}
