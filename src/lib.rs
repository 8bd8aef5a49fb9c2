pub mod chain; // Per-instrument channel strip
pub mod dsp;
pub mod dynamics; // Composite dynamics processors
pub mod fx; // Send effects and mix-bus inserts
pub mod synth; // Voice management and polyphony

pub const MAX_BLOCK_SIZE: usize = 2048;
pub(crate) const MIN_TIME: f32 = 1.0 / 48_000.0;
