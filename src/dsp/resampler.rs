/*
Linear-Interpolation Resampler
==============================

Converts the tone engine's fixed internal rate to the host rate. The voice
layer hands the engine's output over as i16 frames (its fixed-point
intermediate form); the resampler interpolates those and produces f32.

Position bookkeeping
--------------------

The read phase is measured against a virtual source stream in which
position 0.0 is the sample carried over from the previous block and
position k+1.0 is input[k] of the current block:

    carry  input[0]  input[1]  ...  input[n-1]
    0.0    1.0       2.0            n

Each output sample advances the phase by `ratio` (source frames per output
frame). After a block the phase is re-based by subtracting the consumed
frame count, so it stays small and non-negative across arbitrarily long
streams, and the last input sample becomes the next block's carry. That one
carried sample is what keeps interpolation continuous across block
boundaries.
*/

const I16_SCALE: f32 = 1.0 / 32_768.0;

pub struct Resampler {
    ratio: f32, // source frames consumed per output frame
    phase: f32, // fractional read position, 0.0 == carried sample
    carry: i16,
}

impl Resampler {
    pub fn new(source_rate: f32, target_rate: f32) -> Self {
        Self {
            ratio: source_rate.max(1.0) / target_rate.max(1.0),
            phase: 1.0,
            carry: 0,
        }
    }

    /// Source frames needed to produce `output_len` frames from the current
    /// phase. Callers add their own headroom on top.
    pub fn needed_input(&self, output_len: usize) -> usize {
        (self.phase + output_len as f32 * self.ratio).ceil() as usize
    }

    /// Consume `input` entirely and write up to `output.len()` interpolated
    /// frames. Returns the number of frames produced, which is less than
    /// `output.len()` when the input runs out first.
    pub fn process(&mut self, input: &[i16], output: &mut [f32]) -> usize {
        let mut produced = 0;

        for out in output.iter_mut() {
            let whole = self.phase as usize;
            if whole >= input.len() {
                break;
            }

            let below = if whole == 0 {
                self.carry
            } else {
                input[whole - 1]
            };
            let above = input[whole];
            let frac = self.phase - whole as f32;

            let a = below as f32 * I16_SCALE;
            let b = above as f32 * I16_SCALE;
            *out = a + (b - a) * frac;

            self.phase += self.ratio;
            produced += 1;
        }

        // Re-base the phase against the start of the next block and keep the
        // final sample for continuity.
        if let Some(&last) = input.last() {
            self.phase = (self.phase - input.len() as f32).max(0.0);
            self.carry = last;
        }

        produced
    }

    pub fn reset(&mut self) {
        self.phase = 1.0;
        self.carry = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constant_input_yields_constant_output() {
        let mut resampler = Resampler::new(48_000.0, 44_100.0);
        let input = vec![16_384i16; 480]; // 0.5 in fixed point
        let mut output = vec![0.0f32; 512];

        let produced = resampler.process(&input, &mut output);
        assert!(produced > 400, "expected a near-full block, got {}", produced);
        for (i, s) in output[..produced].iter().enumerate() {
            assert!(
                (s - 0.5).abs() < 1e-4,
                "interpolating a constant drifted at {}: {}",
                i,
                s
            );
        }
    }

    #[test]
    fn unity_ratio_passes_samples_through() {
        let mut resampler = Resampler::new(48_000.0, 48_000.0);
        let input: Vec<i16> = (0..64).map(|i| (i * 100) as i16).collect();
        let mut output = vec![0.0f32; 64];

        let produced = resampler.process(&input, &mut output);
        assert_eq!(produced, 64);
        for (i, s) in output.iter().enumerate() {
            let expected = (i * 100) as f32 * I16_SCALE;
            assert!((s - expected).abs() < 1e-6, "sample {} mismatched", i);
        }
    }

    #[test]
    fn phase_stays_non_negative_across_blocks() {
        let mut resampler = Resampler::new(48_000.0, 44_100.0);
        let input = vec![0i16; 48];
        let mut output = vec![0.0f32; 64];

        for _ in 0..100 {
            resampler.process(&input, &mut output);
            assert!(resampler.phase >= 0.0);
            assert!(resampler.phase < 2.0 + resampler.ratio);
        }
    }

    #[test]
    fn needed_input_covers_requested_output() {
        let mut resampler = Resampler::new(48_000.0, 44_100.0);
        let needed = resampler.needed_input(128);
        let input = vec![1000i16; needed];
        let mut output = vec![0.0f32; 128];

        let produced = resampler.process(&input, &mut output);
        assert_eq!(produced, 128, "needed_input under-reported");
    }

    #[test]
    fn carry_keeps_interpolation_continuous_across_blocks() {
        let mut resampler = Resampler::new(48_000.0, 44_100.0);
        let ramp: Vec<i16> = (0..96).map(|i| (i * 200) as i16).collect();
        let mut split_out = vec![0.0f32; 128];

        // Same ramp fed as two blocks must match a single-block pass.
        let n1 = resampler.process(&ramp[..48], &mut split_out);
        let n2 = resampler.process(&ramp[48..], &mut split_out[n1..]);

        let mut whole = Resampler::new(48_000.0, 44_100.0);
        let mut whole_out = vec![0.0f32; 128];
        let n = whole.process(&ramp, &mut whole_out);

        assert_eq!(n, n1 + n2);
        for i in 0..n {
            assert!(
                (split_out[i] - whole_out[i]).abs() < 1e-6,
                "block boundary discontinuity at {}",
                i
            );
        }
    }
}
