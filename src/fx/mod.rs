//! Self-contained stereo effect processors and the send bus that hosts them.
//!
//! Every effect processes caller-owned left/right buffers in place and owns
//! all of its delay memory, pre-sized at construction. Nothing here
//! allocates, locks, or blocks once constructed.

/// Modulated-delay chorus with 90°-offset stereo LFOs.
pub mod chorus;
/// Tempo-synchronized feedback delay.
pub mod delay;
/// Bipolar low-pass/high-pass sweep filter.
pub mod djfilter;
/// Soft-clip drive with one-pole tone shaping.
pub mod drive;
/// Envelope brickwall limiter.
pub mod limiter;
/// Schroeder comb/allpass reverb.
pub mod reverb;
/// Parallel send bus plus mix-bus inserts.
pub mod sends;
/// Envelope-follower ducking.
pub mod sidechain;

pub use sends::EffectsProcessor;
