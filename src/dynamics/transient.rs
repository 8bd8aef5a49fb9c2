use crate::dsp::follower::EnvFollower;

/// Transient shaper: emphasizes note attacks without touching sustains.
///
/// Two followers per channel track |input| at very different speeds. The
/// fast one (1ms/10ms) jumps on an onset; the slow one (20ms/200ms) is still
/// catching up, so their difference is a transient estimate that collapses
/// to zero on steady-state material. Gain applied is
/// `1 + transient * (boost - 1)` with `boost = 1 + amount * 3`, so amount 0
/// is exactly unity and amount 1 pushes onsets up to 4x.
///
/// Below an amount of 0.001 the stage is skipped outright - no follower
/// updates, no multiplies - both to save the cycles and to keep denormals
/// out of the follower state on silent material.
pub struct TransientShaper {
    fast: [EnvFollower; 2],
    slow: [EnvFollower; 2],
    amount: f32,
}

const FAST_ATTACK: f32 = 0.001;
const FAST_RELEASE: f32 = 0.010;
const SLOW_ATTACK: f32 = 0.020;
const SLOW_RELEASE: f32 = 0.200;

impl TransientShaper {
    pub fn new(sample_rate: f32) -> Self {
        Self {
            fast: [
                EnvFollower::new(FAST_ATTACK, FAST_RELEASE, sample_rate),
                EnvFollower::new(FAST_ATTACK, FAST_RELEASE, sample_rate),
            ],
            slow: [
                EnvFollower::new(SLOW_ATTACK, SLOW_RELEASE, sample_rate),
                EnvFollower::new(SLOW_ATTACK, SLOW_RELEASE, sample_rate),
            ],
            amount: 0.0,
        }
    }

    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        for follower in &mut self.fast {
            follower.set_times(FAST_ATTACK, FAST_RELEASE, sample_rate);
        }
        for follower in &mut self.slow {
            follower.set_times(SLOW_ATTACK, SLOW_RELEASE, sample_rate);
        }
    }

    /// Punch amount, 0..1.
    pub fn set_amount(&mut self, amount: f32) {
        self.amount = amount.clamp(0.0, 1.0);
    }

    pub fn process(&mut self, left: &mut [f32], right: &mut [f32]) {
        debug_assert_eq!(left.len(), right.len());
        if self.amount < 0.001 {
            return;
        }

        let boost = 1.0 + self.amount * 3.0;
        for (channel, buffer) in [left, right].into_iter().enumerate() {
            for sample in buffer.iter_mut() {
                let fast = self.fast[channel].next(*sample);
                let slow = self.slow[channel].next(*sample);
                let transient = (fast - slow).max(0.0);
                *sample *= 1.0 + transient * (boost - 1.0);
            }
        }
    }

    pub fn reset(&mut self) {
        for follower in self.fast.iter_mut().chain(self.slow.iter_mut()) {
            follower.reset();
        }
    }
}
