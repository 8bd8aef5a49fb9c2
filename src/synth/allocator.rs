use crate::synth::engine::{ToneEngine, ToneParams};
use crate::synth::voice::Voice;

/// Fixed voice-pool capacity. Exposed polyphony can be set lower but the
/// pool itself is sized once, at construction.
pub const MAX_VOICES: usize = 8;

/// Owns the voice pool outright and arbitrates every note event.
///
/// Allocation policy, in order:
///   1. a voice already sounding this note is retriggered in place, so a
///      note can never be doubled across two voices;
///   2. otherwise the first free voice takes it;
///   3. otherwise the voice with the smallest age stamp is stolen (ties
///      fall to the lowest index).
///
/// Every assignment stamps the voice from a monotonically increasing
/// counter, which is what makes "smallest age" mean "least recently
/// triggered". A note-on therefore always succeeds; the cost of a full
/// pool is the oldest note getting cut, never a refused event.
pub struct VoiceAllocator<T: ToneEngine> {
    voices: Vec<Voice<T>>,
    polyphony: usize,
    age_counter: u64,
    params: ToneParams,
}

impl<T: ToneEngine> VoiceAllocator<T> {
    pub fn new(host_rate: f32, mut make_engine: impl FnMut() -> T) -> Self {
        log::debug!("voice pool: {} voices at {} Hz host rate", MAX_VOICES, host_rate);
        Self {
            voices: (0..MAX_VOICES)
                .map(|_| Voice::new(make_engine(), host_rate))
                .collect(),
            polyphony: MAX_VOICES,
            age_counter: 0,
            params: ToneParams::default(),
        }
    }

    /// Limit how many pool slots participate. Clamped to [1, MAX_VOICES].
    pub fn set_polyphony(&mut self, polyphony: usize) {
        self.polyphony = polyphony.clamp(1, MAX_VOICES);
    }

    pub fn polyphony(&self) -> usize {
        self.polyphony
    }

    /// Replace the shared synthesis parameters; they reach every voice at
    /// the top of the next `process` call.
    pub fn set_params(&mut self, params: ToneParams) {
        self.params = params;
    }

    pub fn note_on(&mut self, note: u8, velocity: u8, attack: f32, decay: f32) {
        self.age_counter += 1;
        let age = self.age_counter;
        let pool = &mut self.voices[..self.polyphony];

        // Same note already sounding: retrigger that voice in place
        if let Some(voice) = pool
            .iter_mut()
            .find(|voice| voice.is_active() && voice.note() == note as i32)
        {
            voice.trigger(note, velocity, attack, decay, age);
            return;
        }

        // First free slot
        if let Some(voice) = pool.iter_mut().find(|voice| !voice.is_active()) {
            voice.trigger(note, velocity, attack, decay, age);
            return;
        }

        // Steal the least recently triggered voice; min_by_key keeps the
        // first minimum, so index order breaks ties
        if let Some(voice) = pool.iter_mut().min_by_key(|voice| voice.age()) {
            voice.trigger(note, velocity, attack, decay, age);
        }
    }

    /// Forwarded to the matching voice. A no-op under the AD voice model,
    /// kept so callers can stay note-on/note-off symmetric.
    pub fn note_off(&mut self, note: u8) {
        if let Some(voice) = self.voices[..self.polyphony]
            .iter_mut()
            .find(|voice| voice.is_active() && voice.note() == note as i32)
        {
            voice.note_off();
        }
    }

    /// Hard stop: silence and free every voice.
    pub fn all_notes_off(&mut self) {
        for voice in &mut self.voices {
            voice.free();
        }
    }

    /// Render one block. The output buffers are cleared first; voices mix
    /// additively on top. Shared parameters are broadcast to every voice -
    /// including the ones mid-envelope - before any of them renders.
    pub fn process(&mut self, left: &mut [f32], right: &mut [f32]) {
        debug_assert_eq!(left.len(), right.len());
        left.fill(0.0);
        right.fill(0.0);

        for voice in self.voices[..self.polyphony].iter_mut() {
            if voice.is_active() {
                voice.set_tone_params(&self.params);
                voice.render(left, right);
            }
        }
    }

    pub fn voices(&self) -> &[Voice<T>] {
        &self.voices
    }

    pub fn active_voices(&self) -> usize {
        self.voices[..self.polyphony]
            .iter()
            .filter(|voice| voice.is_active())
            .count()
    }
}
