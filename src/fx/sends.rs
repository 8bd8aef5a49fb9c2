use crate::fx::chorus::Chorus;
use crate::fx::delay::TempoDelay;
use crate::fx::djfilter::DjFilter;
use crate::fx::limiter::Limiter;
use crate::fx::reverb::Reverb;
use crate::fx::sidechain::Sidechain;
use crate::MAX_BLOCK_SIZE;

/// Send/return bus plus the master inserts.
///
/// Reverb, delay and chorus hang off the bus as parallel sends: each one
/// receives `dry * send_level` in a scratch buffer and its wet output is
/// added back onto the running mix. A send at or below 0.001 is skipped
/// entirely - the effect's state doesn't advance and no buffer is copied -
/// which is the cheap path for the common "effect turned off" case and
/// keeps denormals out of idle delay lines.
///
/// After the sends, the summed bus runs through the inserts in fixed order:
/// sidechain duck, DJ filter, limiter.
pub struct EffectsProcessor {
    reverb: Reverb,
    delay: TempoDelay,
    chorus: Chorus,
    sidechain: Sidechain,
    djfilter: DjFilter,
    limiter: Limiter,

    reverb_send: f32,
    delay_send: f32,
    chorus_send: f32,

    scratch_left: Vec<f32>,
    scratch_right: Vec<f32>,
}

const SEND_BYPASS: f32 = 0.001;

impl EffectsProcessor {
    pub fn new(sample_rate: f32) -> Self {
        log::debug!("effects bus initialized at {} Hz", sample_rate);
        Self {
            reverb: Reverb::new(sample_rate),
            delay: TempoDelay::new(sample_rate),
            chorus: Chorus::new(sample_rate),
            sidechain: Sidechain::new(sample_rate),
            djfilter: DjFilter::new(sample_rate),
            limiter: Limiter::new(sample_rate),
            reverb_send: 0.0,
            delay_send: 0.0,
            chorus_send: 0.0,
            scratch_left: vec![0.0; MAX_BLOCK_SIZE],
            scratch_right: vec![0.0; MAX_BLOCK_SIZE],
        }
    }

    pub fn set_reverb_send(&mut self, level: f32) {
        self.reverb_send = level.clamp(0.0, 1.0);
    }

    pub fn set_delay_send(&mut self, level: f32) {
        self.delay_send = level.clamp(0.0, 1.0);
    }

    pub fn set_chorus_send(&mut self, level: f32) {
        self.chorus_send = level.clamp(0.0, 1.0);
    }

    pub fn set_tempo(&mut self, bpm: f32) {
        self.delay.set_tempo(bpm);
    }

    /// Pump the sidechain duck (e.g. from a sequencer kick step).
    pub fn trigger_duck(&mut self) {
        self.sidechain.trigger();
    }

    pub fn reverb(&mut self) -> &mut Reverb {
        &mut self.reverb
    }

    pub fn delay(&mut self) -> &mut TempoDelay {
        &mut self.delay
    }

    pub fn chorus(&mut self) -> &mut Chorus {
        &mut self.chorus
    }

    pub fn sidechain(&mut self) -> &mut Sidechain {
        &mut self.sidechain
    }

    pub fn djfilter(&mut self) -> &mut DjFilter {
        &mut self.djfilter
    }

    pub fn limiter(&mut self) -> &mut Limiter {
        &mut self.limiter
    }

    pub fn process(&mut self, left: &mut [f32], right: &mut [f32]) {
        debug_assert_eq!(left.len(), right.len());
        debug_assert!(left.len() <= MAX_BLOCK_SIZE);
        let frames = left.len().min(MAX_BLOCK_SIZE);

        // Parallel sends: dry * send through the effect, wet added back.
        // Each send reuses the same pre-sized scratch pair.
        if self.reverb_send > SEND_BYPASS {
            Self::run_send(
                &mut self.scratch_left,
                &mut self.scratch_right,
                &left[..frames],
                &right[..frames],
                self.reverb_send,
                |l, r| self.reverb.process(l, r),
            );
            accumulate(left, &self.scratch_left[..frames]);
            accumulate(right, &self.scratch_right[..frames]);
        }

        if self.delay_send > SEND_BYPASS {
            Self::run_send(
                &mut self.scratch_left,
                &mut self.scratch_right,
                &left[..frames],
                &right[..frames],
                self.delay_send,
                |l, r| self.delay.process(l, r),
            );
            accumulate(left, &self.scratch_left[..frames]);
            accumulate(right, &self.scratch_right[..frames]);
        }

        if self.chorus_send > SEND_BYPASS {
            Self::run_send(
                &mut self.scratch_left,
                &mut self.scratch_right,
                &left[..frames],
                &right[..frames],
                self.chorus_send,
                |l, r| self.chorus.process(l, r),
            );
            accumulate(left, &self.scratch_left[..frames]);
            accumulate(right, &self.scratch_right[..frames]);
        }

        // Mix-bus inserts, fixed order
        self.sidechain.process(left, right);
        self.djfilter.process(left, right);
        self.limiter.process(left, right);
    }

    fn run_send(
        scratch_left: &mut [f32],
        scratch_right: &mut [f32],
        left: &[f32],
        right: &[f32],
        send: f32,
        effect: impl FnOnce(&mut [f32], &mut [f32]),
    ) {
        let frames = left.len();
        for (dst, src) in scratch_left[..frames].iter_mut().zip(left.iter()) {
            *dst = src * send;
        }
        for (dst, src) in scratch_right[..frames].iter_mut().zip(right.iter()) {
            *dst = src * send;
        }
        effect(&mut scratch_left[..frames], &mut scratch_right[..frames]);
    }

    pub fn reset(&mut self) {
        self.reverb.reset();
        self.delay.reset();
        self.chorus.reset();
        self.sidechain.reset();
        self.djfilter.reset();
        self.limiter.reset();
    }
}

#[inline]
fn accumulate(out: &mut [f32], wet: &[f32]) {
    for (o, w) in out.iter_mut().zip(wet.iter()) {
        *o += w;
    }
}
