//! Atari environment with DQN-style observation preprocessing.
//!
//! Each agent step repeats the chosen action `action_repeat` times on the
//! emulator, summing rewards and pushing every raw frame into the pooling
//! buffer. The repeat loop stops early on game over, or on a lost life when
//! `life_episode` is set. After the loop the pool is reduced and transformed
//! into the newest history slot, exactly once per step.
use rand::Rng;

use crate::config::DmAtariConfig;
use crate::core::{Env, GymError, Info, InfoValue, RenderFrame, Result, Step};
use crate::emulator::{Emulator, NativeAction, NOOP_ACTION_INDEX};
use crate::frame::{HistoryBuffer, Observation, PoolingBuffer, TransformStage};
use crate::spaces::{Discrete, ImageSpace};
use crate::utils::render2d::{Canvas, Color};
use crate::utils::rng::{rng_from_seed, RngStream};

const DEFAULT_SEED: u64 = 1_234_567;

pub struct DmAtariEnv<E: Emulator> {
    emulator: E,
    config: DmAtariConfig,
    action_set: Vec<NativeAction>,
    pool: PoolingBuffer,
    transform: TransformStage,
    history: HistoryBuffer,
    rng: RngStream,
}

impl<E: Emulator> DmAtariEnv<E> {
    /// Wires the buffers and the preprocessing chain for `emulator`.
    ///
    /// All buffers are allocated here and reused for the lifetime of the
    /// environment. Every configuration error surfaces here rather than on a
    /// later step.
    pub fn new(emulator: E, config: DmAtariConfig) -> Result<Self> {
        config.validate()?;

        let action_set = emulator.minimal_action_set();
        if action_set.is_empty() {
            return Err(GymError::InvalidConfig("emulator reports an empty action set".into()));
        }

        let (native_w, native_h) = emulator.screen_dims();
        let pool = PoolingBuffer::new(config.pool_len, native_h, native_w)?;
        let (out_h, out_w) = config.output_dims((native_w, native_h));
        let rescale = if config.use_rescale() { Some((out_h, out_w)) } else { None };
        let transform = TransformStage::new((native_h, native_w), config.use_greyscale, rescale);
        let history = HistoryBuffer::new(config.hist_len, out_h, out_w, config.channels())?;

        if transform.output_shape() != history.frame_shape() {
            return Err(GymError::InvalidConfig(format!(
                "processed frame shape {:?} does not match history slot shape {:?}",
                transform.output_shape(),
                history.frame_shape()
            )));
        }

        log::debug!(
            "wired {:?} pipeline for `{}`: raw {}x{}, observation {:?}",
            transform.kind(),
            config.game,
            native_w,
            native_h,
            history.shape()
        );

        Ok(Self {
            emulator,
            config,
            action_set,
            pool,
            transform,
            history,
            rng: rng_from_seed(DEFAULT_SEED),
        })
    }

    /// Replaces the no-op RNG stream.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = rng_from_seed(seed);
        self
    }

    pub fn config(&self) -> &DmAtariConfig { &self.config }

    pub fn emulator(&self) -> &E { &self.emulator }

    pub fn emulator_mut(&mut self) -> &mut E { &mut self.emulator }

    pub fn into_emulator(self) -> E { self.emulator }

    /// Number of agent actions.
    pub fn num_actions(&self) -> usize { self.action_set.len() }

    pub fn action_space(&self) -> Discrete { Discrete::new(self.action_set.len() as u32) }

    pub fn observation_space(&self) -> ImageSpace { ImageSpace::new(self.history.shape()) }

    /// Current observation without stepping.
    pub fn observation(&self) -> Observation<'_> { self.history.observation() }

    pub fn pool(&self) -> &PoolingBuffer { &self.pool }

    /// Always fails: a faithful snapshot must also capture the frame buffers.
    pub fn clone_state(&self) -> Result<Vec<u8>> { Err(snapshot_unsupported("clone_state")) }

    /// Always fails, see [`clone_state`](Self::clone_state).
    pub fn restore_state(&mut self, _state: &[u8]) -> Result<()> {
        Err(snapshot_unsupported("restore_state"))
    }

    /// Always fails, see [`clone_state`](Self::clone_state).
    pub fn clone_full_state(&self) -> Result<Vec<u8>> { Err(snapshot_unsupported("clone_full_state")) }

    /// Always fails, see [`clone_state`](Self::clone_state).
    pub fn restore_full_state(&mut self, _state: &[u8]) -> Result<()> {
        Err(snapshot_unsupported("restore_full_state"))
    }

    fn is_over(&self, prev_lives: u32) -> bool {
        if self.emulator.game_over() {
            return true;
        }
        self.config.life_episode && self.emulator.lives() < prev_lives
    }

    fn push_raw_frame(&mut self) -> Result<()> {
        let emulator = &self.emulator;
        self.pool.push_with(|slot| emulator.screen_rgb(slot))
    }

    fn push_history(&mut self) {
        let slot = self.history.advance();
        self.transform.apply(&self.pool, slot);
    }

    /// Runs `action` up to `repeat` times and pushes one processed frame.
    /// Returns the summed reward and whether the episode is over.
    fn repeat_action(&mut self, action: usize, repeat: usize) -> Result<(f32, bool)> {
        let native = *self.action_set.get(action).ok_or_else(|| {
            GymError::InvalidAction(format!(
                "action {} out of range for {} actions",
                action,
                self.action_set.len()
            ))
        })?;
        let prev_lives = self.emulator.lives();

        let mut reward = 0.0;
        for _ in 0..repeat {
            reward += self.emulator.act(native) as f32;
            self.push_raw_frame()?;
            if self.is_over(prev_lives) {
                break;
            }
        }
        self.push_history();

        Ok((reward, self.is_over(prev_lives)))
    }

    fn info(&self) -> Info {
        let mut info = Info::new();
        info.insert("lives", InfoValue::from(self.emulator.lives()));
        info.insert("game_over", InfoValue::from(self.emulator.game_over()));
        info
    }

    /// Pixels of the newest frame, or of the whole history side by side,
    /// upscaled by `render_scale`.
    pub fn render_pixels(&self) -> RenderFrame {
        let [hist_len, h, w, c] = self.history.shape();
        let n = if self.config.render_hist { hist_len } else { 1 };
        let s = self.config.render_scale;
        let mut canvas = Canvas::new((n * w * s) as u32, (h * s) as u32);
        for i in 0..n {
            let frame = self.history.frame(i);
            for y in 0..h {
                for x in 0..w {
                    let color = if c == 1 {
                        let v = frame[[y, x, 0]];
                        Color(v, v, v, 255)
                    } else {
                        Color(frame[[y, x, 0]], frame[[y, x, 1]], frame[[y, x, 2]], 255)
                    };
                    let (px, py) = (((i * w + x) * s) as i32, (y * s) as i32);
                    canvas.fill_rect(px, py, s as i32, s as i32, color);
                }
            }
        }
        canvas.into_render_frame()
    }
}

fn snapshot_unsupported(op: &str) -> GymError {
    GymError::NotImplemented(format!(
        "{}: state snapshots must include the pooling and history buffers",
        op
    ))
}

impl<E: Emulator> Env for DmAtariEnv<E> {
    type Obs<'a>
        = Observation<'a>
    where
        Self: 'a;
    type Act = usize;

    /// Restarts the game and idles a random number of no-ops in
    /// `[0, noop_max)`. A warm-up that ends the episode is discarded and the
    /// whole reset starts over.
    fn reset(&mut self, seed: Option<u64>) -> Result<(Self::Obs<'_>, Info)> {
        if let Some(s) = seed {
            self.rng = rng_from_seed(s);
        }

        let mut attempts = 0u32;
        loop {
            attempts += 1;
            self.emulator.reset_game();
            self.pool.fill(0);
            self.push_raw_frame()?;

            let noops = if self.config.noop_max == 0 { 0 } else { self.rng.gen_range(0..self.config.noop_max) };
            let (_, done) = self.repeat_action(NOOP_ACTION_INDEX, noops)?;
            if !done {
                break;
            }
            log::warn!("episode terminated during initial no-ops, retrying (attempt {})", attempts);
            if let Some(limit) = self.config.reset_retry_limit {
                if attempts >= limit {
                    return Err(GymError::ResetRetriesExhausted(attempts));
                }
            }
        }

        self.history.fill(0);
        self.push_history();

        Ok((self.history.observation(), self.info()))
    }

    fn step(&mut self, action: Self::Act) -> Result<Step<Self::Obs<'_>>> {
        let (reward, terminated) = self.repeat_action(action, self.config.action_repeat)?;
        let info = self.info();
        Ok(Step::new(self.history.observation(), reward, terminated, false, info))
    }

    fn render(&self) -> Option<RenderFrame> { Some(self.render_pixels()) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emulator::ScriptedEmulator;
    use crate::spaces::Space;

    fn small_env(config: DmAtariConfig) -> DmAtariEnv<ScriptedEmulator> {
        DmAtariEnv::new(ScriptedEmulator::new(8, 6), config).unwrap()
    }

    #[test]
    fn empty_action_set_is_a_config_error() {
        let emu = ScriptedEmulator::new(8, 6).with_actions(vec![]);
        assert!(matches!(DmAtariEnv::new(emu, DmAtariConfig::default()), Err(GymError::InvalidConfig(_))));
    }

    #[test]
    fn out_of_range_action_is_rejected() {
        let mut env = small_env(DmAtariConfig::default().noop_max(0));
        env.reset(None).unwrap();
        assert!(matches!(env.step(4), Err(GymError::InvalidAction(_))));
    }

    #[test]
    fn step_reports_lives_in_info() {
        let mut env = small_env(DmAtariConfig::default().noop_max(0));
        env.reset(None).unwrap();
        let s = env.step(1).unwrap();
        assert_eq!(s.info.get("lives"), Some(&InfoValue::I64(3)));
        assert_eq!(s.info.get("game_over"), Some(&InfoValue::Bool(false)));
        assert!(!s.truncated);
    }

    #[test]
    fn spaces_describe_actions_and_observation() {
        let env = small_env(DmAtariConfig::default().rescale(4, 5).use_greyscale(false).hist_len(3));
        assert_eq!(env.action_space().n(), 4);
        assert_eq!(env.observation_space().shape(), [3, 4, 5, 3]);
        assert!(env.observation_space().contains(&env.observation().to_owned()));
        assert_eq!(env.num_actions(), 4);
    }

    #[test]
    fn native_resolution_raw_pipeline_copies_the_screen() {
        let config = DmAtariConfig::default().no_rescale().use_greyscale(false).pool_len(1).noop_max(0);
        let mut env = small_env(config);
        env.reset(None).unwrap();
        let s = env.step(0).unwrap();
        let emu = ScriptedEmulator::new(8, 6);
        assert_eq!(s.observation.shape(), &[4, 6, 8, 3]);
        // four acts into the episode
        assert_eq!(s.observation[[0, 2, 5, 1]], emu.pixel(4, 2, 5, 1));
    }

    #[test]
    fn render_upscales_newest_frame_or_history() {
        let mut env = small_env(DmAtariConfig::default().rescale(2, 3).render_scale(2));
        env.reset(None).unwrap();
        match env.render() {
            Some(RenderFrame::Pixels { width, height, data }) => {
                assert_eq!((width, height), (6, 4));
                assert_eq!(data.len(), 6 * 4 * 4);
                // greyscale is replicated across RGB
                assert_eq!(data[0], data[1]);
                assert_eq!(data[1], data[2]);
            }
            other => panic!("expected pixels, got {:?}", other),
        }

        let env = small_env(DmAtariConfig::default().rescale(2, 3).render_scale(1).render_hist(true));
        match env.render() {
            Some(RenderFrame::Pixels { width, height, .. }) => assert_eq!((width, height), (12, 2)),
            other => panic!("expected pixels, got {:?}", other),
        }
    }

    #[test]
    fn snapshots_are_not_implemented() {
        let mut env = small_env(DmAtariConfig::default());
        assert!(matches!(env.clone_state(), Err(GymError::NotImplemented(_))));
        assert!(matches!(env.clone_full_state(), Err(GymError::NotImplemented(_))));
        assert!(matches!(env.restore_state(&[]), Err(GymError::NotImplemented(_))));
        assert!(matches!(env.restore_full_state(&[]), Err(GymError::NotImplemented(_))));
    }
}
