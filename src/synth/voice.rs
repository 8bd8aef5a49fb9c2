use crate::dsp::envelope::Envelope;
use crate::dsp::resampler::Resampler;
use crate::synth::engine::{
    ToneEngine, ToneModulation, TonePatch, ToneParams, INTERNAL_SAMPLE_RATE, TONE_BLOCK_SIZE,
};
use crate::MAX_BLOCK_SIZE;

/// Sentinel note for a voice with no assignment.
pub const NO_NOTE: i32 = -1;

/// Primary-channel weight toward the left output; the auxiliary channel
/// gets the mirror image.
const CROSS_FEED: f32 = 0.7;

/// Host-rate frames one internal-rate chunk can yield, worst case (engine
/// at 48kHz, host up to 192kHz), rounded up generously.
const SPILL_CAPACITY: usize = 128;

/// One polyphonic voice: tone engine, amplitude envelope, and the pair of
/// resamplers that carry the engine's internal rate to the host rate.
///
/// Lifecycle: Idle (note == -1) → triggered by `trigger()` (note and
/// velocity assigned, envelope restarted, both resamplers re-phased,
/// trigger pulse armed) → sounding until the envelope runs out → Idle
/// again. `note_off` exists for symmetry with the allocator surface but is
/// deliberately a no-op: this is an attack/decay voice whose life is fully
/// determined at trigger time.
///
/// Rendering walks fixed-size internal-rate chunks: the engine fills a
/// 24-frame block, the envelope and velocity scale it, both channels are
/// quantized to the i16 intermediate form and resampled to the host rate,
/// and the result is mixed into the caller's stereo buffers with a fixed
/// 0.7/0.3 cross-feed (primary leans left, auxiliary mirrors it right) for
/// width. The final chunk usually resamples past the requested count; the
/// surplus frames are held in a small spill buffer and emitted first on the
/// next call, so no internal-rate frame is ever dropped at a block
/// boundary. If an iteration yields no output at all the loop gives up and
/// leaves the tail of the block short rather than spinning.
pub struct Voice<T: ToneEngine> {
    engine: T,
    patch: TonePatch,
    envelope: Envelope,
    resampler_out: Resampler,
    resampler_aux: Resampler,

    note: i32,
    velocity: f32,
    age: u64,
    active: bool,
    pending_trigger: bool,

    tone_block: [f32; TONE_BLOCK_SIZE],
    aux_block: [f32; TONE_BLOCK_SIZE],
    fixed_out: [i16; TONE_BLOCK_SIZE],
    fixed_aux: [i16; TONE_BLOCK_SIZE],
    resampled_out: Vec<f32>,
    resampled_aux: Vec<f32>,
    spill_len: usize,
}

#[inline]
fn to_fixed(sample: f32) -> i16 {
    (sample * 32_767.0).clamp(-32_768.0, 32_767.0) as i16
}

impl<T: ToneEngine> Voice<T> {
    pub fn new(engine: T, host_rate: f32) -> Self {
        Self {
            engine,
            patch: TonePatch::default(),
            envelope: Envelope::new(INTERNAL_SAMPLE_RATE),
            resampler_out: Resampler::new(INTERNAL_SAMPLE_RATE, host_rate),
            resampler_aux: Resampler::new(INTERNAL_SAMPLE_RATE, host_rate),
            note: NO_NOTE,
            velocity: 0.0,
            age: 0,
            active: false,
            pending_trigger: false,
            tone_block: [0.0; TONE_BLOCK_SIZE],
            aux_block: [0.0; TONE_BLOCK_SIZE],
            fixed_out: [0; TONE_BLOCK_SIZE],
            fixed_aux: [0; TONE_BLOCK_SIZE],
            resampled_out: vec![0.0; MAX_BLOCK_SIZE + SPILL_CAPACITY],
            resampled_aux: vec![0.0; MAX_BLOCK_SIZE + SPILL_CAPACITY],
            spill_len: 0,
        }
    }

    /// Start (or restart) this voice on a note.
    pub fn trigger(&mut self, note: u8, velocity: u8, attack: f32, decay: f32, age: u64) {
        self.note = note as i32;
        self.velocity = velocity as f32 / 127.0;
        self.age = age;
        self.active = true;
        self.pending_trigger = true;

        self.patch.note = note as f32;
        self.envelope.trigger(attack, decay);
        // Re-phase both converters so the restarted note interpolates from
        // a clean origin instead of the stolen note's tail.
        self.resampler_out.reset();
        self.resampler_aux.reset();
        self.spill_len = 0;
    }

    /// No-op: the voice decays on its own. Kept so the allocator surface
    /// can forward note-offs without special-casing the voice model.
    pub fn note_off(&mut self) {}

    /// Adopt the latest shared synthesis parameters. The mapped note stays
    /// per-voice.
    pub fn set_tone_params(&mut self, params: &ToneParams) {
        self.patch.params = *params;
    }

    /// Render and accumulate into the caller's stereo buffers. Returns the
    /// number of frames produced (short only if the safety break fired).
    pub fn render(&mut self, left: &mut [f32], right: &mut [f32]) -> usize {
        debug_assert_eq!(left.len(), right.len());
        if !self.active {
            return 0;
        }

        let frames = left.len().min(MAX_BLOCK_SIZE);

        // Frames resampled past the previous block's end come first; they
        // are already sitting at the head of the scratch buffers.
        let mut produced = self.spill_len;

        while produced < frames {
            let modulation = ToneModulation {
                trigger: self.pending_trigger,
                level: 1.0,
            };
            self.pending_trigger = false;

            self.engine.render(
                &self.patch,
                &modulation,
                &mut self.tone_block,
                &mut self.aux_block,
            );

            // Envelope and velocity at the internal rate, then the i16
            // intermediate both resamplers consume.
            for i in 0..TONE_BLOCK_SIZE {
                let gain = self.envelope.next_sample() * self.velocity;
                self.fixed_out[i] = to_fixed(self.tone_block[i] * gain);
                self.fixed_aux[i] = to_fixed(self.aux_block[i] * gain);
            }

            // The scratch tail always has room for a whole chunk's yield,
            // so the resamplers consume every internal frame.
            let got_out = self
                .resampler_out
                .process(&self.fixed_out, &mut self.resampled_out[produced..]);
            let got_aux = self
                .resampler_aux
                .process(&self.fixed_aux, &mut self.resampled_aux[produced..]);
            debug_assert_eq!(got_out, got_aux);

            if got_out == 0 && got_aux == 0 {
                // Pathological ratio or zero-length request: truncate the
                // block instead of spinning.
                break;
            }
            produced += got_out;
        }

        let emit = produced.min(frames);
        for i in 0..emit {
            let primary = self.resampled_out[i];
            let auxiliary = self.resampled_aux[i];
            left[i] += primary * CROSS_FEED + auxiliary * (1.0 - CROSS_FEED);
            right[i] += primary * (1.0 - CROSS_FEED) + auxiliary * CROSS_FEED;
        }

        // Shift the surplus down to the head for the next block.
        self.spill_len = produced - emit;
        for i in 0..self.spill_len {
            self.resampled_out[i] = self.resampled_out[emit + i];
            self.resampled_aux[i] = self.resampled_aux[emit + i];
        }

        if !self.envelope.is_active() {
            self.free();
        }

        emit
    }

    pub fn free(&mut self) {
        self.active = false;
        self.note = NO_NOTE;
        self.velocity = 0.0;
        self.pending_trigger = false;
        self.spill_len = 0;
        self.envelope.reset();
        self.engine.reset();
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn note(&self) -> i32 {
        self.note
    }

    pub fn age(&self) -> u64 {
        self.age
    }

    pub fn envelope_level(&self) -> f32 {
        self.envelope.level()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synth::engine::BasicToneEngine;

    fn test_voice() -> Voice<BasicToneEngine> {
        Voice::new(BasicToneEngine::new(), 44_100.0)
    }

    #[test]
    fn idle_voice_renders_nothing() {
        let mut voice = test_voice();
        let mut left = vec![0.0f32; 128];
        let mut right = vec![0.0f32; 128];
        assert_eq!(voice.render(&mut left, &mut right), 0);
        assert!(left.iter().all(|s| *s == 0.0));
    }

    #[test]
    fn triggered_voice_fills_the_request() {
        let mut voice = test_voice();
        voice.trigger(60, 100, 0.001, 0.5, 1);

        let mut left = vec![0.0f32; 512];
        let mut right = vec![0.0f32; 512];
        let produced = voice.render(&mut left, &mut right);

        assert_eq!(produced, 512);
        let energy: f32 = left.iter().map(|s| s.abs()).sum();
        assert!(energy > 0.0, "triggered voice should make sound");
    }

    #[test]
    fn block_boundaries_preserve_the_sample_stream() {
        // Rendering 2x256 must equal rendering 1x512: the spill buffer keeps
        // the surplus of the last chunk instead of dropping source frames.
        let mut split = test_voice();
        split.trigger(60, 100, 0.001, 0.5, 1);
        let mut split_l = vec![0.0f32; 512];
        let mut split_r = vec![0.0f32; 512];
        split.render(&mut split_l[..256], &mut split_r[..256]);
        split.render(&mut split_l[256..], &mut split_r[256..]);

        let mut whole = test_voice();
        whole.trigger(60, 100, 0.001, 0.5, 1);
        let mut whole_l = vec![0.0f32; 512];
        let mut whole_r = vec![0.0f32; 512];
        whole.render(&mut whole_l, &mut whole_r);

        assert_eq!(split_l, whole_l, "block split changed the rendered stream");
        assert_eq!(split_r, whole_r);
    }

    #[test]
    fn voice_goes_idle_when_the_envelope_runs_out() {
        let mut voice = test_voice();
        voice.trigger(64, 100, 0.001, 0.01, 1);
        assert!(voice.is_active());
        assert_eq!(voice.note(), 64);

        // ~11ms of envelope at a 44.1k host rate: a few blocks
        let mut left = vec![0.0f32; 512];
        let mut right = vec![0.0f32; 512];
        for _ in 0..4 {
            voice.render(&mut left, &mut right);
        }

        assert!(!voice.is_active(), "voice should expire with its envelope");
        assert_eq!(voice.note(), NO_NOTE);
    }

    #[test]
    fn note_off_does_not_stop_the_voice() {
        let mut voice = test_voice();
        voice.trigger(60, 100, 0.001, 1.0, 1);
        voice.note_off();
        assert!(voice.is_active(), "AD voice ignores note-off");
    }

    #[test]
    fn output_is_additive() {
        let mut voice = test_voice();
        voice.trigger(60, 127, 0.001, 0.5, 1);

        let mut left = vec![1.0f32; 256];
        let mut right = vec![1.0f32; 256];
        voice.render(&mut left, &mut right);

        let moved: usize = left.iter().filter(|s| (**s - 1.0).abs() > 1e-6).count();
        assert!(moved > 0, "voice output should mix on top of the buffer");
    }

    #[test]
    fn retrigger_rephases_the_resamplers() {
        let mut voice = test_voice();
        voice.trigger(60, 100, 0.001, 0.5, 1);
        let mut left = vec![0.0f32; 300];
        let mut right = vec![0.0f32; 300];
        voice.render(&mut left, &mut right);

        voice.trigger(60, 100, 0.001, 0.5, 2);
        let mut left2 = vec![0.0f32; 300];
        let mut right2 = vec![0.0f32; 300];
        voice.render(&mut left2, &mut right2);

        // A clean retrigger reproduces the first block exactly: same phase
        // origin, same envelope restart, same engine sync.
        assert_eq!(left, left2);
        assert_eq!(right, right2);
    }
}
