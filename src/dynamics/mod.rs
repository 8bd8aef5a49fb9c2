//! Composite dynamics processors built on the envelope-follower primitive.

/// Three-band upward/downward "over the top" compressor.
pub mod ott;
/// Attack-emphasis shaper driven by a fast/slow follower pair.
pub mod transient;

pub use ott::MultibandOtt;
pub use transient::TransientShaper;
