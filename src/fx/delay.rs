use crate::dsp::delay::DelayLine;

/*
Tempo-Synchronized Feedback Delay
=================================

One feedback tap per channel. The time control does not address seconds
directly; it selects a musical subdivision with an exponential curve:

    beat_fraction = 0.0625 * 2^(4 * time)      time in [0, 1]

so time 0 is a 1/16 note, time 1 a whole note, and the knob feels even
across the range. The subdivision is converted to samples against the
current tempo and re-derived whenever either the time control or the tempo
changes:

    delay_samples = round((60 / bpm) * beat_fraction * sample_rate)

always clamped to [1, buffer_len - 1]. The buffer holds two seconds at the
construction-time sample rate, so very slow tempos saturate at the buffer
edge instead of wrapping.
*/

pub struct TempoDelay {
    left: DelayLine,
    right: DelayLine,
    sample_rate: f32,
    time: f32,
    tempo: f32,
    feedback: f32,
    mix: f32,
    delay_samples: usize,
}

impl TempoDelay {
    pub fn new(sample_rate: f32) -> Self {
        let capacity = (sample_rate * 2.0) as usize;
        log::debug!("tempo delay line sized for {} samples", capacity);

        let mut delay = Self {
            left: DelayLine::with_capacity(capacity),
            right: DelayLine::with_capacity(capacity),
            sample_rate,
            time: 0.5,
            tempo: 120.0,
            feedback: 0.4,
            mix: 0.5,
            delay_samples: 1,
        };
        delay.update_delay_length();
        delay
    }

    /// Musical time control, 0 = 1/16 note, 1 = whole note.
    pub fn set_time(&mut self, time: f32) {
        self.time = time.clamp(0.0, 1.0);
        self.update_delay_length();
    }

    pub fn set_tempo(&mut self, bpm: f32) {
        self.tempo = bpm.clamp(20.0, 999.0);
        self.update_delay_length();
    }

    pub fn set_feedback(&mut self, feedback: f32) {
        self.feedback = feedback.clamp(0.0, 0.95);
    }

    pub fn set_mix(&mut self, mix: f32) {
        self.mix = mix.clamp(0.0, 1.0);
    }

    /// Current tap length in samples, after tempo mapping and clamping.
    pub fn delay_samples(&self) -> usize {
        self.delay_samples
    }

    fn update_delay_length(&mut self) {
        // beat_fraction is in whole-note units: 1/16 note up to 1/1, and a
        // whole note spans four beats of the bpm clock.
        let beat_fraction = 0.0625 * (4.0 * self.time).exp2();
        let seconds = (240.0 / self.tempo) * beat_fraction;
        let samples = (seconds * self.sample_rate).round() as usize;
        self.delay_samples = samples.clamp(1, self.left.len() - 1);
    }

    pub fn process(&mut self, left: &mut [f32], right: &mut [f32]) {
        debug_assert_eq!(left.len(), right.len());

        for (l, r) in left.iter_mut().zip(right.iter_mut()) {
            let tap_l = self.left.read(self.delay_samples);
            let tap_r = self.right.read(self.delay_samples);

            self.left.write(*l + tap_l * self.feedback);
            self.right.write(*r + tap_r * self.feedback);

            *l += (tap_l - *l) * self.mix;
            *r += (tap_r - *r) * self.mix;
        }
    }

    pub fn reset(&mut self) {
        self.left.reset();
        self.right.reset();
    }
}
