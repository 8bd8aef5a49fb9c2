use std::f32::consts::TAU;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/*
Tone-Engine Boundary
====================

The tone generator is a collaborator, not part of this crate's core: a
voice only needs something that eats a patch + modulation descriptor and
fills a fixed-size stereo frame block at a fixed internal rate. Everything
behind `ToneEngine` is swappable, including the built-in stand-in at the
bottom of this file.

Engines run at their own internal rate (48kHz, 24-frame blocks); the voice
resamples to the host rate. The public engine selector is a contiguous
0..15 range; internally the registry is larger and the public range maps
onto it at a fixed offset. The raw registry indices never cross this
boundary - patches carry the public index only.
*/

/// Fixed internal rate every engine renders at.
pub const INTERNAL_SAMPLE_RATE: f32 = 48_000.0;

/// Frames produced per engine render call.
pub const TONE_BLOCK_SIZE: usize = 24;

/// Number of publicly selectable engines.
pub const ENGINE_COUNT: usize = 16;

/// Public indices map into the registry at this offset; the slots below it
/// are reserved for registry entries this surface does not expose.
const REGISTRY_OFFSET: usize = 8;

#[inline]
pub(crate) fn registry_index(engine: usize) -> usize {
    REGISTRY_OFFSET + engine.min(ENGINE_COUNT - 1)
}

/// MIDI note number to frequency. A4 = 440Hz = note 69.
#[inline]
pub fn midi_note_to_freq(note: f32) -> f32 {
    440.0 * 2.0_f32.powf((note - 69.0) / 12.0)
}

/// Shared synthesis parameters, broadcast to every voice each block.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToneParams {
    /// Engine selector, public 0..15 range.
    pub engine: usize,
    pub harmonics: f32,
    pub timbre: f32,
    pub morph: f32,
    pub decay: f32,
    pub color: f32,
}

impl Default for ToneParams {
    fn default() -> Self {
        Self {
            engine: 0,
            harmonics: 0.5,
            timbre: 0.5,
            morph: 0.5,
            decay: 0.5,
            color: 0.5,
        }
    }
}

/// Full patch descriptor handed to an engine: shared params plus the
/// voice's mapped note.
#[derive(Debug, Clone, Copy)]
pub struct TonePatch {
    pub note: f32,
    pub params: ToneParams,
}

impl Default for TonePatch {
    fn default() -> Self {
        Self {
            note: 60.0,
            params: ToneParams::default(),
        }
    }
}

/// Per-render modulation inputs. The trigger fires exactly once per
/// note-on; level is held at unity by the voice layer.
#[derive(Debug, Clone, Copy)]
pub struct ToneModulation {
    pub trigger: bool,
    pub level: f32,
}

/// Narrow capability interface for tone generators.
pub trait ToneEngine: Send {
    /// Fill `out` and `aux` (equal length, `TONE_BLOCK_SIZE` frames) at the
    /// internal sample rate.
    fn render(
        &mut self,
        patch: &TonePatch,
        modulation: &ToneModulation,
        out: &mut [f32],
        aux: &mut [f32],
    );

    /// Drop all internal state (phases, noise filters).
    fn reset(&mut self);
}

/// Built-in stand-in engine bank.
///
/// Four algorithm families spread across the registry range: harmonic
/// stacks, two-operator FM, pulse, and filtered noise. This exists so the
/// crate is playable and testable without an external synthesis core; any
/// serious tone algorithm replaces it behind `ToneEngine`.
pub struct BasicToneEngine {
    phase: f32,
    mod_phase: f32,
    noise_state: u32,
    noise_lp: f32,
}

impl BasicToneEngine {
    pub fn new() -> Self {
        Self {
            phase: 0.0,
            mod_phase: 0.0,
            noise_state: 0x1234_5678,
            noise_lp: 0.0,
        }
    }

    #[inline]
    fn next_noise(&mut self) -> f32 {
        // LCG, top bits only
        self.noise_state = self
            .noise_state
            .wrapping_mul(1_664_525)
            .wrapping_add(1_013_904_223);
        ((self.noise_state >> 8) as f32 / 8_388_608.0) - 1.0
    }
}

impl ToneEngine for BasicToneEngine {
    fn render(
        &mut self,
        patch: &TonePatch,
        modulation: &ToneModulation,
        out: &mut [f32],
        aux: &mut [f32],
    ) {
        debug_assert_eq!(out.len(), aux.len());

        if modulation.trigger {
            self.phase = 0.0;
            self.mod_phase = 0.0;
            self.noise_lp = 0.0;
        }

        let params = &patch.params;
        let freq = midi_note_to_freq(patch.note);
        let phase_inc = freq / INTERNAL_SAMPLE_RATE;
        let family = registry_index(params.engine) / 4;

        for (o, a) in out.iter_mut().zip(aux.iter_mut()) {
            let (primary, auxiliary) = match family {
                // Harmonic stack: fundamental plus timbre-weighted partials
                2 => {
                    let fundamental = (TAU * self.phase).sin();
                    let second = (TAU * self.phase * 2.0).sin();
                    let third = (TAU * self.phase * 3.0).sin();
                    let bright = fundamental
                        + second * params.harmonics * 0.5
                        + third * params.timbre * 0.33;
                    let detuned = (TAU * self.phase * (1.0 + params.morph * 0.01)).sin();
                    (bright * 0.55, detuned)
                }
                // Two-operator FM: timbre = index, harmonics = ratio
                3 => {
                    let ratio = 1.0 + (params.harmonics * 4.0).floor();
                    let modulator = (TAU * self.mod_phase * ratio).sin();
                    let index = params.timbre * 4.0;
                    let carrier = (TAU * self.phase + modulator * index).sin();
                    (carrier, modulator)
                }
                // Pulse: timbre = width, aux = ramp
                4 => {
                    let width = 0.1 + params.timbre * 0.8;
                    let pulse = if self.phase < width { 1.0 } else { -1.0 };
                    let ramp = 2.0 * self.phase - 1.0;
                    (pulse * 0.8, ramp * 0.8)
                }
                // Filtered noise: timbre = color
                _ => {
                    let noise = self.next_noise();
                    let coef = 0.02 + params.timbre * 0.6;
                    self.noise_lp += coef * (noise - self.noise_lp);
                    (self.noise_lp * 2.0, noise)
                }
            };

            *o = primary * modulation.level;
            *a = auxiliary * modulation.level;

            self.phase += phase_inc;
            if self.phase >= 1.0 {
                self.phase -= 1.0;
            }
            self.mod_phase += phase_inc;
            if self.mod_phase >= 1.0 {
                self.mod_phase -= 1.0;
            }
        }
    }

    fn reset(&mut self) {
        self.phase = 0.0;
        self.mod_phase = 0.0;
        self.noise_lp = 0.0;
    }
}

impl Default for BasicToneEngine {
    fn default() -> Self {
        Self::new()
    }
}
