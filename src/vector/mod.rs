// A synchronous vector environment running N copies of an Env in a loop.
// Each copy owns its emulator and frame buffers; nothing is shared.

use crate::core::{Env, GymError, Info, RenderFrame, Result, Step};
use crate::utils::rng::split_n;

/// Runs N copies of an environment in the current thread.
///
/// - Construct with `SyncVectorEnv::new(n, || DmAtariEnv::new(emu(), config.clone()))`
/// - Step with a batch of actions: `step_all(actions)`
/// - Reset all envs (optionally with a root seed): `reset_all(Some(0))`
pub struct SyncVectorEnv<E: Env> {
    envs: Vec<E>,
}

impl<E: Env> SyncVectorEnv<E> {
    /// Create N copies using the provided factory closure.
    pub fn new<F>(n: usize, mut factory: F) -> Result<Self>
    where
        F: FnMut() -> Result<E>,
    {
        let mut envs = Vec::with_capacity(n);
        for _ in 0..n {
            envs.push(factory()?);
        }
        Ok(Self { envs })
    }

    /// Number of contained environments.
    pub fn len(&self) -> usize { self.envs.len() }
    /// Whether there are no environments.
    pub fn is_empty(&self) -> bool { self.envs.is_empty() }

    /// Reset all environments. A root seed is split into one sub-seed per env.
    pub fn reset_all(&mut self, seed: Option<u64>) -> Result<Vec<(E::Obs<'_>, Info)>> {
        let seeds = seed.map(|s| split_n(s, self.envs.len()));
        self.envs
            .iter_mut()
            .enumerate()
            .map(|(i, e)| e.reset(seeds.as_ref().map(|s| s[i])))
            .collect()
    }

    /// Step all environments with a batch of actions.
    /// The length of `actions` must equal `self.len()`.
    pub fn step_all(&mut self, actions: Vec<E::Act>) -> Result<Vec<Step<E::Obs<'_>>>> {
        if actions.len() != self.envs.len() {
            return Err(GymError::InvalidAction(format!(
                "got {} actions for {} environments",
                actions.len(),
                self.envs.len()
            )));
        }
        self.envs
            .iter_mut()
            .zip(actions)
            .map(|(e, a)| e.step(a))
            .collect()
    }

    /// Render all environments; returns a vector of optional frames (one per env).
    pub fn render_all(&self) -> Vec<Option<RenderFrame>> {
        self.envs.iter().map(|e| e.render()).collect()
    }

    /// Close all environments.
    pub fn close_all(&mut self) {
        for e in &mut self.envs { e.close(); }
    }

    /// Get immutable access to underlying envs (advanced usage).
    pub fn envs(&self) -> &[E] { &self.envs }
    /// Get mutable access to underlying envs (advanced usage).
    pub fn envs_mut(&mut self) -> &mut [E] { &mut self.envs }
}
