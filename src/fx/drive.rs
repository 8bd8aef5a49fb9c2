/*
Drive
=====

Soft-clip saturation with a tone control:

    shaped = x * drive / (1 + |x * drive|)

The transfer curve's small-signal gain is `drive`, so the output is scaled
back by 1/drive afterwards: quiet material passes at unity while peaks get
progressively squashed, which keeps perceived level steady as the amount
knob comes up.

The tone stage is a one-pole low-pass whose coefficient tracks the tone
knob (0.3..1.0) and whose output is blended against the raw shaped signal
by the same knob, so tone 0 is dark and filtered, tone 1 is bright and
untouched. Tone state is kept per channel; a shared scalar would leak one
channel's history into the other on stereo material.
*/

pub struct Drive {
    drive: f32, // 1..11
    tone: f32,  // 0..1
    tone_state: [f32; 2],
}

impl Drive {
    pub fn new() -> Self {
        Self {
            drive: 1.0,
            tone: 1.0,
            tone_state: [0.0; 2],
        }
    }

    /// Normalized amount 0..1 mapped onto a 1x..11x drive factor.
    pub fn set_amount(&mut self, amount: f32) {
        self.drive = 1.0 + amount.clamp(0.0, 1.0) * 10.0;
    }

    pub fn set_tone(&mut self, tone: f32) {
        self.tone = tone.clamp(0.0, 1.0);
    }

    #[inline]
    fn shape(&mut self, sample: f32, channel: usize) -> f32 {
        let x = sample * self.drive;
        let shaped = x / (1.0 + x.abs());

        // One-pole low-pass, coefficient 0.3..1.0 from the tone knob
        let coef = 0.3 + 0.7 * self.tone;
        let state = &mut self.tone_state[channel];
        *state += coef * (shaped - *state);
        let toned = *state + (shaped - *state) * self.tone;

        toned / self.drive
    }

    pub fn process(&mut self, left: &mut [f32], right: &mut [f32]) {
        debug_assert_eq!(left.len(), right.len());

        for (l, r) in left.iter_mut().zip(right.iter_mut()) {
            *l = self.shape(*l, 0);
            *r = self.shape(*r, 1);
        }
    }

    pub fn reset(&mut self) {
        self.tone_state = [0.0; 2];
    }
}

impl Default for Drive {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_signals_pass_near_unity() {
        let mut drive = Drive::new();
        drive.set_amount(1.0); // 11x
        drive.set_tone(1.0);

        let mut left = vec![0.001f32; 64];
        let mut right = vec![0.001f32; 64];
        drive.process(&mut left, &mut right);

        // Small-signal gain of clip is `drive`; the 1/drive renorm cancels it
        assert!(
            (left[63] - 0.001).abs() < 1e-4,
            "renormalized small-signal gain should be ~1, got {}",
            left[63]
        );
    }

    #[test]
    fn peaks_are_compressed() {
        let mut drive = Drive::new();
        drive.set_amount(1.0);
        drive.set_tone(1.0);

        let mut left = vec![1.0f32; 16];
        let mut right = vec![1.0f32; 16];
        drive.process(&mut left, &mut right);

        // 1.0 * 11 / 12 / 11 = 1/12
        assert!(left[0] < 0.5, "full-scale input should be squashed");
        assert!(left[0] > 0.0);
    }

    #[test]
    fn output_is_bounded_for_hot_input() {
        let mut drive = Drive::new();
        drive.set_amount(0.8);
        drive.set_tone(0.2);

        let mut left: Vec<f32> = (0..512).map(|i| ((i as f32 * 0.2).sin()) * 4.0).collect();
        let mut right = left.clone();
        drive.process(&mut left, &mut right);

        for s in left.iter().chain(right.iter()) {
            assert!(s.abs() <= 1.0, "soft clip must bound output, got {}", s);
        }
    }

    #[test]
    fn tone_state_is_independent_per_channel() {
        let mut drive = Drive::new();
        drive.set_amount(0.5);
        drive.set_tone(0.0); // fully filtered, state-dominated

        // Hot left channel, silent right: right must stay silent.
        let mut left = vec![0.9f32; 128];
        let mut right = vec![0.0f32; 128];
        drive.process(&mut left, &mut right);

        for s in &right {
            assert_eq!(*s, 0.0, "left channel state leaked into right");
        }
    }

    #[test]
    fn dark_tone_smooths_transitions() {
        let mut bright = Drive::new();
        bright.set_amount(0.5);
        bright.set_tone(1.0);

        let mut dark = Drive::new();
        dark.set_amount(0.5);
        dark.set_tone(0.0);

        // Alternating-sign square wave has maximal sample-to-sample movement
        let square: Vec<f32> = (0..256).map(|i| if i % 2 == 0 { 0.8 } else { -0.8 }).collect();

        let mut bl = square.clone();
        let mut br = square.clone();
        bright.process(&mut bl, &mut br);

        let mut dl = square.clone();
        let mut dr = square;
        dark.process(&mut dl, &mut dr);

        let movement = |buf: &[f32]| -> f32 {
            buf.windows(2).map(|w| (w[1] - w[0]).abs()).sum()
        };
        assert!(
            movement(&dl) < movement(&bl) * 0.8,
            "tone 0 should visibly low-pass the output"
        );
    }
}
