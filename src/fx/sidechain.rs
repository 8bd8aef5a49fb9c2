use crate::dsp::follower::EnvFollower;

/// Sidechain ducking: a follower-driven multiplicative gain dip.
///
/// Two ways to feed the envelope. `trigger()` slams it to 1.0 for the
/// hard-synced pump (a sequencer calls it on every kick step), after which
/// the release constant lets it fall; `process_with_source` tracks an
/// external key signal continuously instead. Either way the gain applied to
/// the bus is `1 - duck * env`.
pub struct Sidechain {
    follower: EnvFollower,
    duck: f32,
    attack: f32,
    release: f32,
    sample_rate: f32,
}

impl Sidechain {
    pub fn new(sample_rate: f32) -> Self {
        Self {
            follower: EnvFollower::new(0.005, 0.15, sample_rate),
            duck: 0.0,
            attack: 0.005,
            release: 0.15,
            sample_rate,
        }
    }

    pub fn set_attack(&mut self, attack: f32) {
        self.attack = attack.max(crate::MIN_TIME);
        self.follower.set_times(self.attack, self.release, self.sample_rate);
    }

    pub fn set_release(&mut self, release: f32) {
        self.release = release.max(crate::MIN_TIME);
        self.follower.set_times(self.attack, self.release, self.sample_rate);
    }

    /// Duck depth: 0 = no effect, 1 = full mute at peak envelope.
    pub fn set_amount(&mut self, amount: f32) {
        self.duck = amount.clamp(0.0, 1.0);
    }

    /// Hard-sync: force the ducking envelope to full scale.
    pub fn trigger(&mut self) {
        self.follower.force(1.0);
    }

    /// Duck against the internally decaying envelope (trigger-driven use).
    pub fn process(&mut self, left: &mut [f32], right: &mut [f32]) {
        debug_assert_eq!(left.len(), right.len());
        if self.duck < 0.001 {
            return;
        }

        for (l, r) in left.iter_mut().zip(right.iter_mut()) {
            let env = self.follower.next(0.0);
            let gain = 1.0 - self.duck * env;
            *l *= gain;
            *r *= gain;
        }
    }

    /// Duck against a key signal's level (continuous source following).
    pub fn process_with_source(&mut self, left: &mut [f32], right: &mut [f32], source: &[f32]) {
        debug_assert_eq!(left.len(), right.len());
        debug_assert_eq!(left.len(), source.len());
        if self.duck < 0.001 {
            return;
        }

        for ((l, r), key) in left.iter_mut().zip(right.iter_mut()).zip(source.iter()) {
            let env = self.follower.next(*key);
            let gain = 1.0 - self.duck * env;
            *l *= gain;
            *r *= gain;
        }
    }

    pub fn reset(&mut self) {
        self.follower.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trigger_ducks_then_recovers() {
        let mut sidechain = Sidechain::new(1_000.0);
        sidechain.set_amount(1.0);
        sidechain.set_release(0.05);

        sidechain.trigger();
        let mut left = vec![1.0f32; 400];
        let mut right = vec![1.0f32; 400];
        sidechain.process(&mut left, &mut right);

        assert!(left[0] < 0.1, "gain should dip hard right after trigger");
        assert!(
            left[399] > 0.9,
            "gain should recover after several release constants, got {}",
            left[399]
        );
        // Monotonic-ish recovery
        assert!(left[100] > left[10]);
    }

    #[test]
    fn zero_amount_is_a_no_op() {
        let mut sidechain = Sidechain::new(48_000.0);
        sidechain.set_amount(0.0);
        sidechain.trigger();

        let mut left = vec![0.5f32; 64];
        let mut right = vec![0.5f32; 64];
        sidechain.process(&mut left, &mut right);
        assert!(left.iter().all(|s| *s == 0.5));
    }

    #[test]
    fn source_following_tracks_the_key() {
        let mut sidechain = Sidechain::new(1_000.0);
        sidechain.set_amount(1.0);
        sidechain.set_attack(0.001);

        let mut left = vec![1.0f32; 100];
        let mut right = vec![1.0f32; 100];
        let source = vec![1.0f32; 100]; // loud key the whole time
        sidechain.process_with_source(&mut left, &mut right, &source);

        assert!(
            left[99] < 0.1,
            "sustained key should hold the bus ducked, got {}",
            left[99]
        );
    }
}
