/// Envelope-based brickwall limiter.
///
/// The envelope tracks the linked stereo peak with an effectively instant
/// attack and a tunable release; whenever it exceeds the threshold the block
/// gain becomes `threshold / envelope`, pinning the output at the ceiling
/// while the envelope decays back down. The most recent gain is kept around
/// so a meter can display reduction without re-deriving it.
pub struct Limiter {
    threshold: f32,
    release_coef: f32,
    release: f32,
    sample_rate: f32,
    envelope: f32,
    gain: f32,
}

impl Limiter {
    pub fn new(sample_rate: f32) -> Self {
        let mut limiter = Self {
            threshold: 1.0,
            release_coef: 0.0,
            release: 0.1,
            sample_rate,
            envelope: 0.0,
            gain: 1.0,
        };
        limiter.set_release(0.1);
        limiter
    }

    pub fn set_threshold(&mut self, threshold: f32) {
        self.threshold = threshold.clamp(1e-3, 1.0);
    }

    pub fn set_release(&mut self, release: f32) {
        self.release = release.max(crate::MIN_TIME);
        self.release_coef = (-1.0 / (self.release * self.sample_rate)).exp();
    }

    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate.max(1.0);
        self.set_release(self.release);
    }

    /// Gain currently applied, 1.0 = no reduction. For metering.
    pub fn gain_reduction(&self) -> f32 {
        self.gain
    }

    pub fn process(&mut self, left: &mut [f32], right: &mut [f32]) {
        debug_assert_eq!(left.len(), right.len());

        for (l, r) in left.iter_mut().zip(right.iter_mut()) {
            let peak = l.abs().max(r.abs());

            // Instant attack, exponential release
            self.envelope = if peak > self.envelope {
                peak
            } else {
                peak + self.release_coef * (self.envelope - peak)
            };

            self.gain = if self.envelope > self.threshold {
                self.threshold / self.envelope
            } else {
                1.0
            };

            *l *= self.gain;
            *r *= self.gain;
        }
    }

    pub fn reset(&mut self) {
        self.envelope = 0.0;
        self.gain = 1.0;
    }
}
