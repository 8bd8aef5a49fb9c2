use crate::chain::ChannelStrip;
use crate::fx::EffectsProcessor;
use crate::synth::allocator::VoiceAllocator;
use crate::synth::engine::ToneEngine;
use crate::synth::message::{ControlMessage, MessageReceiver};

/// A complete playable instrument: voice pool into channel strip into the
/// send/insert bus.
///
/// The intended wiring is one `Instrument` owned by the audio callback and
/// one message producer owned by the control thread. `render_block` drains
/// the receiver first, applying every pending snapshot wholesale, then
/// renders - so the audio thread only ever sees complete parameter sets and
/// never takes a lock.
pub struct Instrument<T: ToneEngine> {
    allocator: VoiceAllocator<T>,
    strip: ChannelStrip,
    fx: EffectsProcessor,

    /// Envelope segment lengths applied to subsequent note-ons, seconds.
    attack: f32,
    decay: f32,
}

impl<T: ToneEngine> Instrument<T> {
    pub fn new(sample_rate: f32, make_engine: impl FnMut() -> T) -> Self {
        log::debug!("instrument initialized at {} Hz", sample_rate);
        Self {
            allocator: VoiceAllocator::new(sample_rate, make_engine),
            strip: ChannelStrip::new(sample_rate),
            fx: EffectsProcessor::new(sample_rate),
            attack: 0.002,
            decay: 0.3,
        }
    }

    pub fn handle_message(&mut self, message: ControlMessage) {
        match message {
            ControlMessage::NoteOn { note, velocity } => {
                self.allocator.note_on(note, velocity, self.attack, self.decay);
            }
            ControlMessage::NoteOff { note } => self.allocator.note_off(note),
            ControlMessage::AllNotesOff => self.allocator.all_notes_off(),
            ControlMessage::EnvelopeTimes { attack, decay } => {
                self.attack = attack.max(crate::MIN_TIME);
                self.decay = decay.max(crate::MIN_TIME);
            }
            ControlMessage::Tone(params) => self.allocator.set_params(params),
            ControlMessage::Strip(params) => self.strip.update_params(params),
            ControlMessage::ReverbSend(level) => self.fx.set_reverb_send(level),
            ControlMessage::DelaySend(level) => self.fx.set_delay_send(level),
            ControlMessage::ChorusSend(level) => self.fx.set_chorus_send(level),
            ControlMessage::Tempo(bpm) => self.fx.set_tempo(bpm),
            ControlMessage::DuckTrigger => self.fx.trigger_duck(),
        }
    }

    /// Apply every queued control message.
    pub fn drain<R: MessageReceiver>(&mut self, rx: &mut R) {
        while let Some(message) = rx.pop() {
            self.handle_message(message);
        }
    }

    /// Render one block through the whole chain. Output buffers are
    /// overwritten (the voice pool clears them first).
    pub fn process(&mut self, left: &mut [f32], right: &mut [f32]) {
        self.allocator.process(left, right);
        self.strip.process(left, right);
        self.fx.process(left, right);
    }

    /// Drain the control queue, then render. This is the audio-callback
    /// entry point.
    pub fn render_block<R: MessageReceiver>(
        &mut self,
        rx: &mut R,
        left: &mut [f32],
        right: &mut [f32],
    ) {
        self.drain(rx);
        self.process(left, right);
    }

    pub fn allocator(&mut self) -> &mut VoiceAllocator<T> {
        &mut self.allocator
    }

    pub fn strip(&mut self) -> &mut ChannelStrip {
        &mut self.strip
    }

    pub fn fx(&mut self) -> &mut EffectsProcessor {
        &mut self.fx
    }
}
