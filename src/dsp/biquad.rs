use std::f32::consts::TAU;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/*
| shape      | use in the chain            | parameters        |
| ---------- | --------------------------- | ----------------- |
| high-pass  | rumble removal, DJ sweep up | freq, Q           |
| low-pass   | crossovers, DJ sweep down   | freq, Q           |
| low shelf  | EQ low band                 | freq, gain (dB)   |
| high shelf | EQ high band                | freq, gain (dB)   |
| peak       | EQ mid band                 | freq, gain (dB), Q|

Coefficients follow the RBJ Audio-EQ-Cookbook. All five are divided by a0
at derivation time so the per-sample recursion never divides.
*/

/// Shelf slope term for the shelving shapes. Hard-coded; the strip never
/// exposes shelf slope as a user parameter.
const SHELF_SLOPE: f32 = 0.707;

/// Filter response selector. Closed set; the chain dispatches with an
/// exhaustive match rather than trait objects.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BiquadShape {
    Highpass { freq: f32, q: f32 },
    Lowpass { freq: f32, q: f32 },
    LowShelf { freq: f32, gain_db: f32 },
    HighShelf { freq: f32, gain_db: f32 },
    Peak { freq: f32, gain_db: f32, q: f32 },
}

/// Single second-order IIR section, Direct-Form-II-Transposed.
///
/// Two state registers, five normalized coefficients. `reset` clears the
/// registers without touching the coefficients, so a filter can be silenced
/// without re-deriving its response.
pub struct BiquadFilter {
    // Normalized coefficients (a0 == 1 after derivation)
    b0: f32,
    b1: f32,
    b2: f32,
    a1: f32,
    a2: f32,

    // DF2T state registers
    z1: f32,
    z2: f32,

    sample_rate: f32,
    shape: Option<BiquadShape>,
}

impl BiquadFilter {
    /// A passthrough section at 48kHz. Call `set_sample_rate` and one of the
    /// shape setters before use.
    pub fn new() -> Self {
        Self {
            b0: 1.0,
            b1: 0.0,
            b2: 0.0,
            a1: 0.0,
            a2: 0.0,
            z1: 0.0,
            z2: 0.0,
            sample_rate: 48_000.0,
            shape: None,
        }
    }

    /// Store the sample rate and re-derive the current shape against it.
    pub fn set_sample_rate(&mut self, rate: f32) {
        self.sample_rate = rate.max(1.0);
        if let Some(shape) = self.shape {
            self.configure(shape);
        }
    }

    pub fn set_highpass(&mut self, freq: f32, q: f32) {
        self.configure(BiquadShape::Highpass { freq, q });
    }

    pub fn set_lowpass(&mut self, freq: f32, q: f32) {
        self.configure(BiquadShape::Lowpass { freq, q });
    }

    pub fn set_low_shelf(&mut self, freq: f32, gain_db: f32) {
        self.configure(BiquadShape::LowShelf { freq, gain_db });
    }

    pub fn set_high_shelf(&mut self, freq: f32, gain_db: f32) {
        self.configure(BiquadShape::HighShelf { freq, gain_db });
    }

    pub fn set_peak(&mut self, freq: f32, gain_db: f32, q: f32) {
        self.configure(BiquadShape::Peak { freq, gain_db, q });
    }

    /// Re-derive the whole coefficient set for `shape`. Coefficients are
    /// replaced atomically as a set; state registers are left alone so
    /// parameter changes mid-stream do not click.
    pub fn configure(&mut self, shape: BiquadShape) {
        self.shape = Some(shape);

        let (b0, b1, b2, a0, a1, a2) = match shape {
            BiquadShape::Lowpass { freq, q } => {
                let (cw, sw) = self.omega(freq);
                let alpha = sw / (2.0 * q.max(0.01));
                (
                    (1.0 - cw) * 0.5,
                    1.0 - cw,
                    (1.0 - cw) * 0.5,
                    1.0 + alpha,
                    -2.0 * cw,
                    1.0 - alpha,
                )
            }
            BiquadShape::Highpass { freq, q } => {
                let (cw, sw) = self.omega(freq);
                let alpha = sw / (2.0 * q.max(0.01));
                (
                    (1.0 + cw) * 0.5,
                    -(1.0 + cw),
                    (1.0 + cw) * 0.5,
                    1.0 + alpha,
                    -2.0 * cw,
                    1.0 - alpha,
                )
            }
            BiquadShape::Peak { freq, gain_db, q } => {
                let (cw, sw) = self.omega(freq);
                let a = 10.0_f32.powf(gain_db / 40.0);
                let alpha = sw / (2.0 * q.max(0.01));
                (
                    1.0 + alpha * a,
                    -2.0 * cw,
                    1.0 - alpha * a,
                    1.0 + alpha / a,
                    -2.0 * cw,
                    1.0 - alpha / a,
                )
            }
            BiquadShape::LowShelf { freq, gain_db } => {
                let (cw, sw) = self.omega(freq);
                let a = 10.0_f32.powf(gain_db / 40.0);
                let alpha = Self::shelf_alpha(sw, a);
                let sq = 2.0 * a.sqrt() * alpha;
                (
                    a * ((a + 1.0) - (a - 1.0) * cw + sq),
                    2.0 * a * ((a - 1.0) - (a + 1.0) * cw),
                    a * ((a + 1.0) - (a - 1.0) * cw - sq),
                    (a + 1.0) + (a - 1.0) * cw + sq,
                    -2.0 * ((a - 1.0) + (a + 1.0) * cw),
                    (a + 1.0) + (a - 1.0) * cw - sq,
                )
            }
            BiquadShape::HighShelf { freq, gain_db } => {
                let (cw, sw) = self.omega(freq);
                let a = 10.0_f32.powf(gain_db / 40.0);
                let alpha = Self::shelf_alpha(sw, a);
                let sq = 2.0 * a.sqrt() * alpha;
                (
                    a * ((a + 1.0) + (a - 1.0) * cw + sq),
                    -2.0 * a * ((a - 1.0) + (a + 1.0) * cw),
                    a * ((a + 1.0) + (a - 1.0) * cw - sq),
                    (a + 1.0) - (a - 1.0) * cw + sq,
                    2.0 * ((a - 1.0) - (a + 1.0) * cw),
                    (a + 1.0) - (a - 1.0) * cw - sq,
                )
            }
        };

        // True division, not multiplication by a reciprocal: at unity gain
        // the numerator and denominator are the same expression, and x/x is
        // exactly 1.0, which keeps a flat EQ stage bit-transparent.
        self.b0 = b0 / a0;
        self.b1 = b1 / a0;
        self.b2 = b2 / a0;
        self.a1 = a1 / a0;
        self.a2 = a2 / a0;
    }

    /// cos/sin of the normalized angular frequency. Frequency is clamped
    /// below Nyquist here so no caller can derive unstable coefficients.
    #[inline]
    fn omega(&self, freq: f32) -> (f32, f32) {
        let freq = freq.clamp(1.0, self.sample_rate * 0.495);
        let w0 = TAU * freq / self.sample_rate;
        (w0.cos(), w0.sin())
    }

    #[inline]
    fn shelf_alpha(sw: f32, a: f32) -> f32 {
        sw * 0.5 * ((a + 1.0 / a) * (1.0 / SHELF_SLOPE - 1.0) + 2.0).sqrt()
    }

    /// One sample through the DF2T recursion.
    #[inline]
    pub fn process(&mut self, sample: f32) -> f32 {
        let y = self.b0 * sample + self.z1;
        self.z1 = self.b1 * sample - self.a1 * y + self.z2;
        self.z2 = self.b2 * sample - self.a2 * y;
        y
    }

    /// Zero the state registers. Coefficients are untouched.
    pub fn reset(&mut self) {
        self.z1 = 0.0;
        self.z2 = 0.0;
    }
}

impl Default for BiquadFilter {
    fn default() -> Self {
        Self::new()
    }
}
