use crate::dsp::delay::DelayLine;
use std::f32::consts::TAU;

/*
Chorus
======

One modulated delay line per channel. An LFO wobbles the read position
around a 7ms base delay, detuning the wet copy against the dry signal; the
right channel's LFO runs a quarter cycle ahead so the two channels drift
apart and the image widens.

    rate   0..1 -> 0.1..5.1 Hz LFO speed
    depth  0..1 -> up to ±3ms of modulation around the base delay
    mix    dry/wet crossfade

The LFO phase is a plain 0..1 accumulator wrapped at 1.0; the sine is taken
per sample. Fractional delays go through the delay line's linear
interpolation, which is what keeps the pitch modulation smooth.
*/

const BASE_DELAY_MS: f32 = 7.0;
const DEPTH_RANGE_MS: f32 = 3.0;

/// Phase offset between the two channel LFOs: 90 degrees.
const CHANNEL_PHASE_OFFSET: f32 = 0.25;

pub struct Chorus {
    left: DelayLine,
    right: DelayLine,
    sample_rate: f32,
    phase: f32, // 0..1, wraps
    rate: f32,  // normalized 0..1
    depth: f32,
    mix: f32,
}

impl Chorus {
    pub fn new(sample_rate: f32) -> Self {
        // Base + full depth + margin, per channel
        let capacity = ((BASE_DELAY_MS + DEPTH_RANGE_MS + 5.0) * sample_rate / 1_000.0) as usize;
        Self {
            left: DelayLine::with_capacity(capacity),
            right: DelayLine::with_capacity(capacity),
            sample_rate,
            phase: 0.0,
            rate: 0.3,
            depth: 0.5,
            mix: 0.5,
        }
    }

    pub fn set_rate(&mut self, rate: f32) {
        self.rate = rate.clamp(0.0, 1.0);
    }

    pub fn set_depth(&mut self, depth: f32) {
        self.depth = depth.clamp(0.0, 1.0);
    }

    pub fn set_mix(&mut self, mix: f32) {
        self.mix = mix.clamp(0.0, 1.0);
    }

    pub fn process(&mut self, left: &mut [f32], right: &mut [f32]) {
        debug_assert_eq!(left.len(), right.len());

        let hz = 0.1 + self.rate * 5.0;
        let phase_inc = hz / self.sample_rate;
        let samples_per_ms = self.sample_rate / 1_000.0;

        for (l, r) in left.iter_mut().zip(right.iter_mut()) {
            let lfo_l = (TAU * self.phase).sin();
            let lfo_r = (TAU * (self.phase + CHANNEL_PHASE_OFFSET)).sin();

            let delay_l = (BASE_DELAY_MS + lfo_l * DEPTH_RANGE_MS * self.depth) * samples_per_ms;
            let delay_r = (BASE_DELAY_MS + lfo_r * DEPTH_RANGE_MS * self.depth) * samples_per_ms;

            let wet_l = self.left.read_interpolated(delay_l);
            let wet_r = self.right.read_interpolated(delay_r);

            self.left.write(*l);
            self.right.write(*r);

            *l += (wet_l - *l) * self.mix;
            *r += (wet_r - *r) * self.mix;

            self.phase += phase_inc;
            if self.phase >= 1.0 {
                self.phase -= 1.0;
            }
        }
    }

    pub fn reset(&mut self) {
        self.left.reset();
        self.right.reset();
        self.phase = 0.0;
    }
}
