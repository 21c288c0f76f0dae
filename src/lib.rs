//! Atari environments preprocessed the way the DeepMind DQN papers describe.
//!
//! [`DmAtariEnv`] wraps any [`Emulator`] and turns its raw RGB screens into
//! stacked, pooled, greyscale 84x84 observations:
//!
//! - every agent action is repeated `action_repeat` times (frame skip),
//! - the last `pool_len` raw frames are max-pooled to remove sprite flicker,
//! - the pooled frame is converted to luma and bilinearly rescaled,
//! - the last `hist_len` processed frames form the observation.
//!
//! Episodes start with a random number of no-ops and, in the standard
//! setting, end when a life is lost.
//!
//! ```
//! use gym_dm_atari::{DmAtariConfig, DmAtariEnv, Env, ScriptedEmulator};
//!
//! # fn main() -> gym_dm_atari::Result<()> {
//! let emulator = ScriptedEmulator::default().with_rewards(vec![1, 0]);
//! let mut env = DmAtariEnv::new(emulator, DmAtariConfig::default())?;
//!
//! let (obs, _info) = env.reset(Some(42))?;
//! assert_eq!(obs.shape(), &[4, 84, 84, 1]);
//!
//! let step = env.step(1)?;
//! assert_eq!(step.reward, 2.0);
//! # Ok(())
//! # }
//! ```
pub mod config;
pub mod core;
pub mod emulator;
pub mod env;
pub mod frame;
pub mod registry;
pub mod spaces;
pub mod utils;
pub mod vector;
pub mod wrappers;

pub use crate::config::DmAtariConfig;
pub use crate::core::{Env, GymError, Info, InfoValue, RenderFrame, Result, Step};
pub use crate::emulator::{Emulator, NativeAction, ScriptedEmulator};
pub use crate::env::DmAtariEnv;
pub use crate::frame::Observation;
pub use crate::registry::{EnvSpec, KwArgs, make, register_game_variants};
pub use crate::spaces::{Discrete, ImageSpace, Space};
pub use crate::wrappers::{ClipReward, RecordEpisodeStatistics, TimeLimit};
pub use crate::utils::{encode_frame_png, encode_png, save_frame_png, save_png};
pub use crate::vector::SyncVectorEnv;

#[cfg(test)]
mod tests {
    use super::*;

    /// A tiny dummy environment to validate the trait compiles and basic methods work.
    struct CounterEnv {
        state: i32,
    }

    impl Env for CounterEnv {
        type Obs<'a> = &'a i32;
        type Act = i32;

        fn reset(&mut self, _seed: Option<u64>) -> Result<(Self::Obs<'_>, Info)> {
            self.state = 0;
            Ok((&self.state, Info::new()))
        }

        fn step(&mut self, action: Self::Act) -> Result<Step<Self::Obs<'_>>> {
            self.state += action;
            let terminated = self.state >= 3;
            Ok(Step::new(&self.state, 1.0, terminated, false, Info::new()))
        }

        fn render(&self) -> Option<RenderFrame> {
            Some(RenderFrame::Text(format!("state={}", self.state)))
        }
    }

    #[test]
    fn dummy_env_runs() {
        let mut env = CounterEnv { state: 0 };
        env.reset(None).unwrap();
        let s1 = env.step(1).unwrap();
        assert_eq!(*s1.observation, 1);
        assert!(!s1.terminated);
        let s2 = env.step(2).unwrap();
        assert_eq!(*s2.observation, 3);
        assert!(s2.done());
        assert!(matches!(env.render(), Some(RenderFrame::Text(_))));
        env.close();
    }

    #[test]
    fn wrappers_compose_over_borrowed_observations() {
        let mut env = RecordEpisodeStatistics::new(TimeLimit::new(CounterEnv { state: 0 }, 10));
        env.reset(None).unwrap();
        env.step(1).unwrap();
        let s = env.step(5).unwrap();
        assert_eq!(*s.observation, 6);
        assert_eq!(s.info.get("episode_length"), Some(&InfoValue::I64(2)));
    }

    #[cfg(not(feature = "image"))]
    #[test]
    fn encode_png_without_feature_not_supported() {
        let frame = RenderFrame::Pixels { width: 2, height: 2, data: vec![255, 0, 0, 255,  0, 255, 0, 255,  0, 0, 255, 255,  255, 255, 255, 255] };
        let err = encode_png(&frame).unwrap_err();
        match err {
            GymError::NotSupported(_) => {}
            other => panic!("Expected NotSupported, got {:?}", other),
        }
    }

    #[cfg(feature = "image")]
    #[test]
    fn encode_png_of_rendered_observation() {
        let mut env = DmAtariEnv::new(ScriptedEmulator::new(16, 16), DmAtariConfig::default().rescale(8, 8)).unwrap();
        env.reset(Some(1)).unwrap();
        let frame = env.render().expect("pixels");
        let bytes = encode_png(&frame).expect("PNG encoding should succeed");
        assert_eq!(&bytes[..8], &[137, 80, 78, 71, 13, 10, 26, 10]);
    }
}
