//! Configuration of [`DmAtariEnv`](crate::DmAtariEnv).
//!
//! The defaults reproduce the DQN Atari protocol: greyscale 84x84 frames, a
//! history of 4, action repeat of 4 with max-pooling over the last 2 raw
//! frames, up to 30 random no-ops on reset and life loss ending an episode.
use std::str::FromStr;

use crate::core::{GymError, Result};
use crate::registry::KwArgs;

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DmAtariConfig {
    /// Name of the game, e.g. `"pong"`. Used by emulator loaders only.
    pub game: String,
    /// One-channel luma frames instead of RGB.
    pub use_greyscale: bool,
    /// Depth of the frame history forming the observation.
    pub hist_len: usize,
    /// Emulator frames per agent step.
    pub action_repeat: usize,
    /// Number of most recent raw frames max-pooled into one.
    pub pool_len: usize,
    /// Exclusive upper bound of the random number of no-ops on reset.
    pub noop_max: usize,
    /// Output height; `<= 0` keeps the native height.
    pub rescale_height: i32,
    /// Output width; `<= 0` keeps the native width.
    pub rescale_width: i32,
    /// Whether losing a life terminates the episode.
    pub life_episode: bool,
    /// Upscaling factor used by `render`.
    pub render_scale: usize,
    /// Render the whole history side by side instead of the newest frame.
    pub render_hist: bool,
    /// Maximum number of reset attempts; `None` retries until a warm-up survives.
    pub reset_retry_limit: Option<u32>,
}

impl Default for DmAtariConfig {
    fn default() -> Self {
        Self {
            game: String::new(),
            use_greyscale: true,
            hist_len: 4,
            action_repeat: 4,
            pool_len: 2,
            noop_max: 30,
            rescale_height: 84,
            rescale_width: 84,
            life_episode: true,
            render_scale: 3,
            render_hist: false,
            reset_retry_limit: None,
        }
    }
}

impl DmAtariConfig {
    /// Sets the name of the game.
    pub fn game(mut self, game: impl Into<String>) -> Self {
        self.game = game.into();
        self
    }

    pub fn use_greyscale(mut self, v: bool) -> Self {
        self.use_greyscale = v;
        self
    }

    pub fn hist_len(mut self, v: usize) -> Self {
        self.hist_len = v;
        self
    }

    pub fn action_repeat(mut self, v: usize) -> Self {
        self.action_repeat = v;
        self
    }

    pub fn pool_len(mut self, v: usize) -> Self {
        self.pool_len = v;
        self
    }

    pub fn noop_max(mut self, v: usize) -> Self {
        self.noop_max = v;
        self
    }

    /// Sets the output size. Non-positive values keep the native size on that axis.
    pub fn rescale(mut self, height: i32, width: i32) -> Self {
        self.rescale_height = height;
        self.rescale_width = width;
        self
    }

    /// Keeps frames at the emulator's native resolution.
    pub fn no_rescale(self) -> Self { self.rescale(0, 0) }

    pub fn life_episode(mut self, v: bool) -> Self {
        self.life_episode = v;
        self
    }

    /// Evaluation setting: episodes last the full game regardless of lives.
    pub fn eval(self) -> Self { self.life_episode(false) }

    pub fn render_scale(mut self, v: usize) -> Self {
        self.render_scale = v;
        self
    }

    pub fn render_hist(mut self, v: bool) -> Self {
        self.render_hist = v;
        self
    }

    pub fn reset_retry_limit(mut self, v: Option<u32>) -> Self {
        self.reset_retry_limit = v;
        self
    }

    /// Whether either output dimension differs from the native one.
    pub fn use_rescale(&self) -> bool { self.rescale_height > 0 || self.rescale_width > 0 }

    /// Output `(height, width)` given the native `(width, height)` of the emulator.
    pub fn output_dims(&self, native: (usize, usize)) -> (usize, usize) {
        let (native_w, native_h) = native;
        let h = if self.rescale_height > 0 { self.rescale_height as usize } else { native_h };
        let w = if self.rescale_width > 0 { self.rescale_width as usize } else { native_w };
        (h, w)
    }

    /// Channels of a processed frame.
    pub fn channels(&self) -> usize { if self.use_greyscale { 1 } else { 3 } }

    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("hist_len", self.hist_len),
            ("action_repeat", self.action_repeat),
            ("pool_len", self.pool_len),
            ("render_scale", self.render_scale),
        ];
        for (name, v) in positive {
            if v == 0 {
                return Err(GymError::InvalidConfig(format!("{} must be > 0", name)));
            }
        }
        if self.reset_retry_limit == Some(0) {
            return Err(GymError::InvalidConfig("reset_retry_limit must be > 0 when set".into()));
        }
        Ok(())
    }

    /// Applies stringly-typed registry kwargs on top of `self`.
    pub fn with_kwargs(mut self, kwargs: &KwArgs) -> Result<Self> {
        for (key, value) in kwargs {
            match key.as_str() {
                "game" => self.game = value.clone(),
                "use_greyscale" => self.use_greyscale = parse(key, value)?,
                "hist_len" => self.hist_len = parse(key, value)?,
                "action_repeat" => self.action_repeat = parse(key, value)?,
                "pool_len" => self.pool_len = parse(key, value)?,
                "noop_max" => self.noop_max = parse(key, value)?,
                "rescale_height" => self.rescale_height = parse(key, value)?,
                "rescale_width" => self.rescale_width = parse(key, value)?,
                "life_episode" => self.life_episode = parse(key, value)?,
                "render_scale" => self.render_scale = parse(key, value)?,
                "render_hist" => self.render_hist = parse(key, value)?,
                "reset_retry_limit" => self.reset_retry_limit = parse_limit(key, value)?,
                other => return Err(GymError::InvalidConfig(format!("unknown option `{}`", other))),
            }
        }
        Ok(self)
    }

    /// Builds a configuration from defaults and registry kwargs.
    pub fn from_kwargs(kwargs: &KwArgs) -> Result<Self> { Self::default().with_kwargs(kwargs) }
}

fn parse<T: FromStr>(key: &str, value: &str) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| GymError::InvalidConfig(format!("option `{}` = `{}`: {}", key, value, e)))
}

/// `"none"` (any case) lifts the limit; anything else must parse as a count.
fn parse_limit(key: &str, value: &str) -> Result<Option<u32>> {
    if value.trim().eq_ignore_ascii_case("none") {
        return Ok(None);
    }
    parse(key, value).map(Some)
}
