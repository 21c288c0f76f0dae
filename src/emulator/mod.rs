//! Interface to the underlying Atari emulator.
//!
//! The preprocessing environment never talks to a concrete emulator; it drives
//! anything implementing [`Emulator`]. An ALE binding implements it by
//! forwarding to `act`, `getScreenRGB`, `lives`, `game_over`, `reset_game`,
//! `getScreenDims` and `getMinimalActionSet`.

pub mod scripted;

pub use scripted::ScriptedEmulator;

/// Action code understood by the emulator (an ALE action enum value).
pub type NativeAction = i32;

/// Designated no-op, the first entry of every minimal action set.
pub const NOOP_ACTION_INDEX: usize = 0;

/// The emulator operations the preprocessing pipeline consumes.
pub trait Emulator {
    /// Restart the game from its initial state.
    fn reset_game(&mut self);

    /// Advance one emulator frame with `action` and return the reward it produced.
    fn act(&mut self, action: NativeAction) -> i32;

    /// Copy the current screen into `buf` as row-major `height x width x 3` RGB bytes.
    fn screen_rgb(&self, buf: &mut [u8]);

    /// Remaining lives.
    fn lives(&self) -> u32;

    fn game_over(&self) -> bool;

    /// Native screen size as `(width, height)`.
    fn screen_dims(&self) -> (usize, usize);

    /// Table mapping agent action indices to native action codes.
    fn minimal_action_set(&self) -> Vec<NativeAction>;
}

impl<E: Emulator + ?Sized> Emulator for Box<E> {
    fn reset_game(&mut self) { (**self).reset_game() }
    fn act(&mut self, action: NativeAction) -> i32 { (**self).act(action) }
    fn screen_rgb(&self, buf: &mut [u8]) { (**self).screen_rgb(buf) }
    fn lives(&self) -> u32 { (**self).lives() }
    fn game_over(&self) -> bool { (**self).game_over() }
    fn screen_dims(&self) -> (usize, usize) { (**self).screen_dims() }
    fn minimal_action_set(&self) -> Vec<NativeAction> { (**self).minimal_action_set() }
}
