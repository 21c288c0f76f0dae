// Wrappers for Env composition.
//
// - TimeLimit
// - ClipReward
// - RecordEpisodeStatistics

use crate::core::{Env, Info, InfoValue, Result, Step};

/// A wrapper that enforces a maximum number of steps per episode, marking truncation when exceeded.
pub struct TimeLimit<E: Env> {
    inner: E,
    max_steps: u32,
    steps: u32,
}

impl<E: Env> TimeLimit<E> {
    pub fn new(inner: E, max_steps: u32) -> Self {
        Self { inner, max_steps, steps: 0 }
    }

    pub fn inner(&self) -> &E { &self.inner }
    pub fn inner_mut(&mut self) -> &mut E { &mut self.inner }
    pub fn into_inner(self) -> E { self.inner }
}

impl<E: Env> Env for TimeLimit<E> {
    type Obs<'a>
        = E::Obs<'a>
    where
        Self: 'a;
    type Act = E::Act;

    fn reset(&mut self, seed: Option<u64>) -> Result<(Self::Obs<'_>, Info)> {
        self.steps = 0;
        self.inner.reset(seed)
    }

    fn step(&mut self, action: Self::Act) -> Result<Step<Self::Obs<'_>>> {
        let mut s = self.inner.step(action)?;
        self.steps += 1;
        if !s.terminated && !s.truncated && self.steps >= self.max_steps {
            s.truncated = true;
        }
        Ok(s)
    }

    fn render(&self) -> Option<crate::core::RenderFrame> { self.inner.render() }
    fn close(&mut self) { self.inner.close() }
}

/// ClipReward clamps rewards into [min, max]; `[-1, 1]` gives DQN reward clipping.
pub struct ClipReward<E: Env> {
    inner: E,
    min: f32,
    max: f32,
}

impl<E: Env> ClipReward<E> {
    pub fn new(inner: E, min: f32, max: f32) -> Self { Self { inner, min, max } }

    /// Clips to `[-1, 1]`.
    pub fn unit(inner: E) -> Self { Self::new(inner, -1.0, 1.0) }
}

impl<E: Env> Env for ClipReward<E> {
    type Obs<'a>
        = E::Obs<'a>
    where
        Self: 'a;
    type Act = E::Act;

    fn reset(&mut self, seed: Option<u64>) -> Result<(Self::Obs<'_>, Info)> { self.inner.reset(seed) }

    fn step(&mut self, action: Self::Act) -> Result<Step<Self::Obs<'_>>> {
        let mut s = self.inner.step(action)?;
        s.reward = s.reward.clamp(self.min, self.max);
        Ok(s)
    }

    fn render(&self) -> Option<crate::core::RenderFrame> { self.inner.render() }
    fn close(&mut self) { self.inner.close() }
}

/// RecordEpisodeStatistics tracks cumulative return and episode length.
/// On episode end (terminated or truncated), it injects keys into the returned Step's Info:
/// - "episode_return": f64
/// - "episode_length": i64
pub struct RecordEpisodeStatistics<E: Env> {
    inner: E,
    ep_return: f64,
    ep_length: i64,
}

impl<E: Env> RecordEpisodeStatistics<E> {
    pub fn new(inner: E) -> Self { Self { inner, ep_return: 0.0, ep_length: 0 } }

    pub fn inner(&self) -> &E { &self.inner }
}

impl<E: Env> Env for RecordEpisodeStatistics<E> {
    type Obs<'a>
        = E::Obs<'a>
    where
        Self: 'a;
    type Act = E::Act;

    fn reset(&mut self, seed: Option<u64>) -> Result<(Self::Obs<'_>, Info)> {
        self.ep_return = 0.0;
        self.ep_length = 0;
        self.inner.reset(seed)
    }

    fn step(&mut self, action: Self::Act) -> Result<Step<Self::Obs<'_>>> {
        let mut s = self.inner.step(action)?;
        self.ep_return += s.reward as f64;
        self.ep_length += 1;
        if s.terminated || s.truncated {
            s.info.insert("episode_return", InfoValue::from(self.ep_return));
            s.info.insert("episode_length", InfoValue::from(self.ep_length));
            // reset counters for next episode
            self.ep_return = 0.0;
            self.ep_length = 0;
        }
        Ok(s)
    }

    fn render(&self) -> Option<crate::core::RenderFrame> { self.inner.render() }
    fn close(&mut self) { self.inner.close() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DmAtariConfig;
    use crate::emulator::ScriptedEmulator;
    use crate::env::DmAtariEnv;

    fn env(emu: ScriptedEmulator) -> DmAtariEnv<ScriptedEmulator> {
        DmAtariEnv::new(emu, DmAtariConfig::default().rescale(8, 8).noop_max(0)).unwrap()
    }

    #[test]
    fn time_limit_truncates() {
        let mut e = TimeLimit::new(env(ScriptedEmulator::new(8, 8)), 2);
        e.reset(None).unwrap();
        assert!(!e.step(0).unwrap().truncated);
        let s = e.step(0).unwrap();
        assert!(s.truncated && !s.terminated);
        assert_eq!(s.observation.shape(), &[4, 8, 8, 1]);
    }

    #[test]
    fn clip_reward_bounds_summed_reward() {
        let mut e = ClipReward::unit(env(ScriptedEmulator::new(8, 8).with_rewards(vec![5])));
        e.reset(None).unwrap();
        assert_eq!(e.step(0).unwrap().reward, 1.0);
    }

    #[test]
    fn episode_statistics_on_game_over() {
        let emu = ScriptedEmulator::new(8, 8).with_rewards(vec![1]).with_game_over_at(6);
        let mut e = RecordEpisodeStatistics::new(env(emu));
        e.reset(None).unwrap();
        let s = e.step(0).unwrap();
        assert!(s.info.get("episode_return").is_none());
        let s = e.step(0).unwrap();
        assert!(s.terminated);
        assert_eq!(s.info.get("episode_return"), Some(&InfoValue::F64(6.0)));
        assert_eq!(s.info.get("episode_length"), Some(&InfoValue::I64(2)));
    }
}
