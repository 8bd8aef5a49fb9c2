//! Reverb - room simulation via delay networks.
//!
//! Classic Schroeder topology:
//!
//! ```text
//! In ──┬──→ [Comb 1] ──┐
//!      ├──→ [Comb 2] ──┤
//!      ├──→ [Comb 3] ──┼──→ (avg) ──→ [AP 1] → [AP 2] → [AP 3] → [AP 4] ──→ Out
//!      └──→ [Comb 4] ──┘
//! ```
//!
//! Four parallel feedback combs build the echo density, each with a one-pole
//! low-pass in its feedback path so the tail darkens as it decays. Their
//! average feeds four series allpass stages that smear the echoes into a
//! diffuse tail without coloring the spectrum.
//!
//! Comb delays are mutually prime at the reference rate and scaled by
//! `sample_rate / 44100` so the room keeps its size across host rates. The
//! right channel reads slightly longer lines for stereo decorrelation.

/// Comb/allpass base delays at the 44.1kHz reference rate.
const COMB_BASE_DELAYS: [usize; 4] = [1_116, 1_277, 1_422, 1_617];
const ALLPASS_BASE_DELAYS: [usize; 4] = [556, 441, 341, 225];
const ALLPASS_FEEDBACK: f32 = 0.5;

/// Extra samples on the right-channel lines.
const STEREO_SPREAD: usize = 23;

/// Comb capacity: longest base delay + spread at 192kHz. Allpass delays do
/// not scale with sample rate, so their capacity is just base + spread.
const MAX_COMB_DELAY: usize = 7_168;
const MAX_ALLPASS_DELAY: usize = 640;

/// Feedback comb filter with one-pole damping in the feedback path.
struct CombFilter {
    buffer: Vec<f32>,
    delay_samples: usize,
    write_pos: usize,
    feedback: f32,
    damp: f32,
    filter_state: f32,
}

impl CombFilter {
    fn new(delay_samples: usize) -> Self {
        Self {
            buffer: vec![0.0; MAX_COMB_DELAY],
            delay_samples: delay_samples.clamp(1, MAX_COMB_DELAY),
            write_pos: 0,
            feedback: 0.5,
            damp: 0.0,
            filter_state: 0.0,
        }
    }

    fn set_delay(&mut self, delay_samples: usize) {
        self.delay_samples = delay_samples.clamp(1, MAX_COMB_DELAY);
        self.write_pos %= self.delay_samples;
    }

    #[inline]
    fn process(&mut self, input: f32) -> f32 {
        let output = self.buffer[self.write_pos];

        // One-pole low-pass on the fed-back signal absorbs highs like air
        self.filter_state = output * (1.0 - self.damp) + self.filter_state * self.damp;
        self.buffer[self.write_pos] = input + self.filter_state * self.feedback;

        self.write_pos = (self.write_pos + 1) % self.delay_samples;
        output
    }

    fn reset(&mut self) {
        self.buffer.fill(0.0);
        self.filter_state = 0.0;
        self.write_pos = 0;
    }
}

/// Allpass diffusion stage: flat magnitude, scrambled phase.
struct AllpassFilter {
    buffer: Vec<f32>,
    delay_samples: usize,
    write_pos: usize,
}

impl AllpassFilter {
    fn new(delay_samples: usize) -> Self {
        Self {
            buffer: vec![0.0; MAX_ALLPASS_DELAY],
            delay_samples: delay_samples.clamp(1, MAX_ALLPASS_DELAY),
            write_pos: 0,
        }
    }

    fn set_delay(&mut self, delay_samples: usize) {
        self.delay_samples = delay_samples.clamp(1, MAX_ALLPASS_DELAY);
        self.write_pos %= self.delay_samples;
    }

    #[inline]
    fn process(&mut self, input: f32) -> f32 {
        let delayed = self.buffer[self.write_pos];
        let output = -ALLPASS_FEEDBACK * input + delayed;
        self.buffer[self.write_pos] = input + ALLPASS_FEEDBACK * output;

        self.write_pos = (self.write_pos + 1) % self.delay_samples;
        output
    }

    fn reset(&mut self) {
        self.buffer.fill(0.0);
        self.write_pos = 0;
    }
}

/// One channel's comb bank and diffusion chain.
struct ReverbChannel {
    combs: [CombFilter; 4],
    allpasses: [AllpassFilter; 4],
}

impl ReverbChannel {
    fn new(sample_rate: f32, spread: usize) -> Self {
        // Combs scale with the host rate so the room keeps its dimensions;
        // the short diffusion delays stay fixed sample counts.
        let scale = sample_rate / 44_100.0;
        let combs = COMB_BASE_DELAYS
            .map(|base| CombFilter::new((base as f32 * scale) as usize + spread));
        let allpasses = ALLPASS_BASE_DELAYS.map(|base| AllpassFilter::new(base + spread));
        Self { combs, allpasses }
    }

    fn configure(&mut self, sample_rate: f32, spread: usize) {
        let scale = sample_rate / 44_100.0;
        for (comb, base) in self.combs.iter_mut().zip(COMB_BASE_DELAYS) {
            comb.set_delay((base as f32 * scale) as usize + spread);
        }
        for (allpass, base) in self.allpasses.iter_mut().zip(ALLPASS_BASE_DELAYS) {
            allpass.set_delay(base + spread);
        }
    }

    #[inline]
    fn process(&mut self, input: f32) -> f32 {
        let mut wet = 0.0;
        for comb in &mut self.combs {
            wet += comb.process(input);
        }
        wet *= 0.25; // average of 4 comb lines

        for allpass in &mut self.allpasses {
            wet = allpass.process(wet);
        }
        wet
    }

    fn reset(&mut self) {
        for comb in &mut self.combs {
            comb.reset();
        }
        for allpass in &mut self.allpasses {
            allpass.reset();
        }
    }
}

pub struct Reverb {
    left: ReverbChannel,
    right: ReverbChannel,
    mix: f32,
}

impl Reverb {
    pub fn new(sample_rate: f32) -> Self {
        Self {
            left: ReverbChannel::new(sample_rate, 0),
            right: ReverbChannel::new(sample_rate, STEREO_SPREAD),
            mix: 0.5,
        }
    }

    /// Re-derive delay lengths for a new host rate. Realtime-safe.
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.left.configure(sample_rate, 0);
        self.right.configure(sample_rate, STEREO_SPREAD);
    }

    /// Room size scales comb feedback: 0.7 (tight) to 0.98 (hall).
    pub fn set_size(&mut self, size: f32) {
        let feedback = 0.7 + size.clamp(0.0, 1.0) * 0.28;
        for comb in self.left.combs.iter_mut().chain(self.right.combs.iter_mut()) {
            comb.feedback = feedback;
        }
    }

    /// High-frequency absorption in the comb feedback path.
    pub fn set_damping(&mut self, damping: f32) {
        let damp = damping.clamp(0.0, 1.0) * 0.4;
        for comb in self.left.combs.iter_mut().chain(self.right.combs.iter_mut()) {
            comb.damp = damp;
        }
    }

    pub fn set_mix(&mut self, mix: f32) {
        self.mix = mix.clamp(0.0, 1.0);
    }

    pub fn process(&mut self, left: &mut [f32], right: &mut [f32]) {
        debug_assert_eq!(left.len(), right.len());

        for (l, r) in left.iter_mut().zip(right.iter_mut()) {
            let wet_l = self.left.process(*l);
            let wet_r = self.right.process(*r);
            *l += (wet_l - *l) * self.mix;
            *r += (wet_r - *r) * self.mix;
        }
    }

    pub fn reset(&mut self) {
        self.left.reset();
        self.right.reset();
    }
}
