use crate::chain::params::ChannelStripParams;
use crate::synth::engine::ToneParams;

#[cfg(feature = "rtrb")]
use rtrb::Consumer;

/// Control-surface events, carried from the control/UI thread into the
/// audio thread as self-contained `Copy` snapshots.
///
/// The audio side drains its receiver at the top of each block, so a
/// parameter write is either fully visible or not yet visible - there is no
/// torn intermediate state for the render path to observe.
#[derive(Debug, Clone, Copy)]
pub enum ControlMessage {
    NoteOn { note: u8, velocity: u8 },
    NoteOff { note: u8 },
    AllNotesOff,
    /// Amplitude envelope segment lengths, seconds, for subsequent notes.
    EnvelopeTimes { attack: f32, decay: f32 },
    Tone(ToneParams),
    Strip(ChannelStripParams),
    ReverbSend(f32),
    DelaySend(f32),
    ChorusSend(f32),
    Tempo(f32),
    DuckTrigger,
}

pub trait MessageReceiver {
    fn pop(&mut self) -> Option<ControlMessage>;
}

#[cfg(feature = "rtrb")]
impl MessageReceiver for Consumer<ControlMessage> {
    fn pop(&mut self) -> Option<ControlMessage> {
        Consumer::pop(self).ok()
    }
}

/// Plain-queue receiver for tests and offline rendering.
impl MessageReceiver for std::collections::VecDeque<ControlMessage> {
    fn pop(&mut self) -> Option<ControlMessage> {
        self.pop_front()
    }
}
