use super::{Emulator, NativeAction};

/// A deterministic in-memory emulator driven by a script.
///
/// Rewards, life losses and the game-over point are keyed by the number of
/// `act` calls since the last `reset_game`. Every call is recorded so tests can
/// assert how the environment drove the emulator.
///
/// The screen is a gradient that moves with every frame. With flicker enabled,
/// the left half of the screen is blanked on odd frames, like sprites that
/// only render every other hardware frame.
#[derive(Clone, Debug)]
pub struct ScriptedEmulator {
    width: usize,
    height: usize,
    actions: Vec<NativeAction>,
    rewards: Vec<i32>,
    start_lives: u32,
    life_loss_at: Vec<u64>,
    game_over_at: Option<u64>,
    dead_resets: u32,
    flicker: bool,

    episode_acts: u64,
    lives: u32,
    over: bool,
    reset_calls: u32,
    act_log: Vec<NativeAction>,
}

impl Default for ScriptedEmulator {
    /// Native Atari 2600 resolution.
    fn default() -> Self { Self::new(160, 210) }
}

impl ScriptedEmulator {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            // NOOP, FIRE, RIGHT, LEFT
            actions: vec![0, 1, 3, 4],
            rewards: Vec::new(),
            start_lives: 3,
            life_loss_at: Vec::new(),
            game_over_at: None,
            dead_resets: 0,
            flicker: false,
            episode_acts: 0,
            lives: 3,
            over: false,
            reset_calls: 0,
            act_log: Vec::new(),
        }
    }

    /// Sets the native action table.
    pub fn with_actions(mut self, actions: Vec<NativeAction>) -> Self {
        self.actions = actions;
        self
    }

    /// Rewards returned by successive `act` calls, cycled within an episode.
    pub fn with_rewards(mut self, rewards: Vec<i32>) -> Self {
        self.rewards = rewards;
        self
    }

    pub fn with_lives(mut self, lives: u32) -> Self {
        self.start_lives = lives;
        self.lives = lives;
        self
    }

    /// A life is lost right after the given (1-based) act of each episode.
    pub fn with_life_loss_at(mut self, acts: Vec<u64>) -> Self {
        self.life_loss_at = acts;
        self
    }

    /// The game is over right after the given (1-based) act of each episode.
    pub fn with_game_over_at(mut self, act: u64) -> Self {
        self.game_over_at = Some(act);
        self
    }

    /// The first `n` calls to `reset_game` start an episode that is already over.
    pub fn with_dead_resets(mut self, n: u32) -> Self {
        self.dead_resets = n;
        self
    }

    pub fn with_flicker(mut self, flicker: bool) -> Self {
        self.flicker = flicker;
        self
    }

    /// Number of `reset_game` calls so far.
    pub fn reset_calls(&self) -> u32 { self.reset_calls }

    /// Number of `act` calls over the emulator's lifetime.
    pub fn act_calls(&self) -> usize { self.act_log.len() }

    /// Native actions received by `act`, in order.
    pub fn act_log(&self) -> &[NativeAction] { &self.act_log }

    /// Number of `act` calls since the last `reset_game`.
    pub fn episode_acts(&self) -> u64 { self.episode_acts }

    /// Value of the pixel at `(y, x)`, channel `c`, after `frame` acts into an episode.
    pub fn pixel(&self, frame: u64, y: usize, x: usize, c: usize) -> u8 {
        if self.flicker && frame % 2 == 1 && x < self.width / 2 {
            return 0;
        }
        ((frame as usize * 7 + x + 3 * y + 80 * c) % 256) as u8
    }
}

impl Emulator for ScriptedEmulator {
    fn reset_game(&mut self) {
        self.reset_calls += 1;
        self.episode_acts = 0;
        self.lives = self.start_lives;
        self.over = self.reset_calls <= self.dead_resets;
    }

    fn act(&mut self, action: NativeAction) -> i32 {
        self.act_log.push(action);
        if self.over {
            return 0;
        }
        self.episode_acts += 1;
        let reward = if self.rewards.is_empty() {
            0
        } else {
            self.rewards[((self.episode_acts - 1) as usize) % self.rewards.len()]
        };
        if self.life_loss_at.contains(&self.episode_acts) {
            self.lives = self.lives.saturating_sub(1);
            if self.lives == 0 {
                self.over = true;
            }
        }
        if self.game_over_at == Some(self.episode_acts) {
            self.over = true;
        }
        reward
    }

    fn screen_rgb(&self, buf: &mut [u8]) {
        for (i, px) in buf.chunks_exact_mut(3).enumerate() {
            let (y, x) = (i / self.width, i % self.width);
            for (c, v) in px.iter_mut().enumerate() {
                *v = self.pixel(self.episode_acts, y, x, c);
            }
        }
    }

    fn lives(&self) -> u32 { self.lives }

    fn game_over(&self) -> bool { self.over }

    fn screen_dims(&self) -> (usize, usize) { (self.width, self.height) }

    fn minimal_action_set(&self) -> Vec<NativeAction> { self.actions.clone() }
}
