//! Registration of environment ids.
//!
//! Every base game yields two variants: `DM-<Name>-v0`, where losing a life
//! ends the episode, and `DMEval-<Name>-v0`, which plays full games.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, OnceLock, RwLock};

use crate::config::DmAtariConfig;
use crate::core::{GymError, Result};
use crate::emulator::Emulator;
use crate::env::DmAtariEnv;

/// Key-value kwargs for make(). Values are parsed by [`DmAtariConfig::with_kwargs`].
pub type KwArgs = HashMap<String, String>;

/// Emulator behind a registered environment.
pub type BoxedEmulator = Box<dyn Emulator + Send>;

/// Environment type produced by the registry.
pub type RegisteredEnv = DmAtariEnv<BoxedEmulator>;

/// Loads the emulator for a game name.
pub type EmulatorLoader = Arc<dyn Fn(&str) -> Result<BoxedEmulator> + Send + Sync>;

/// Factory closure type for constructing environments with kwargs.
pub type FactoryFn = Box<dyn Fn(&KwArgs) -> Result<RegisteredEnv> + Send + Sync>;

/// Suffix of the upstream base ids the variants are derived from.
const BASE_SUFFIX: &str = "Deterministic-v0";

/// Environment specification metadata.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EnvSpec {
    /// Unique identifier like "DM-Pong-v0".
    pub id: String,
    /// Suggested max episode steps for TimeLimit wrapper.
    pub max_episode_steps: Option<u32>,
    /// Target reward threshold for a "solved" score, if defined.
    pub reward_threshold: Option<f32>,
    /// Whether environment has inherent nondeterminism beyond RNG seed.
    pub nondeterministic: bool,
    /// Version string or semver-like number (free-form for now).
    pub version: Option<String>,
    /// Kwargs applied before the caller's kwargs in `make`.
    pub kwargs: KwArgs,
}

impl EnvSpec {
    pub fn new<S: Into<String>>(id: S) -> Self {
        Self {
            id: id.into(),
            max_episode_steps: None,
            reward_threshold: None,
            nondeterministic: false,
            version: None,
            kwargs: KwArgs::new(),
        }
    }

    pub fn with_kwarg(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.kwargs.insert(key.into(), value.into());
        self
    }
}

#[derive(Default)]
struct RegistryInner {
    specs: HashMap<String, EnvSpec>,
    factories: HashMap<String, FactoryFn>,
}

/// A table of environment specs and their factories.
///
/// The free functions of this module operate on a process-wide instance.
#[derive(Default)]
pub struct Registry {
    inner: RwLock<RegistryInner>,
}

impl Registry {
    pub fn new() -> Self { Self::default() }

    pub fn register(&self, spec: EnvSpec, factory: FactoryFn) -> Result<()> {
        let mut g = self.inner.write().map_err(|_| GymError::Other("registry poisoned".into()))?;
        if g.specs.contains_key(&spec.id) {
            return Err(GymError::Other(format!("Env id already registered: {}", spec.id)));
        }
        g.factories.insert(spec.id.clone(), factory);
        g.specs.insert(spec.id.clone(), spec);
        Ok(())
    }

    pub fn get_spec(&self, id: &str) -> Option<EnvSpec> {
        let g = self.inner.read().ok()?;
        g.specs.get(id).cloned()
    }

    /// Registered ids in lexicographic order.
    pub fn ids(&self) -> Vec<String> {
        let Ok(g) = self.inner.read() else { return Vec::new() };
        let mut ids: Vec<String> = g.specs.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Builds the environment registered as `id`, with `kwargs` overriding the spec's.
    pub fn make(&self, id: &str, kwargs: KwArgs) -> Result<RegisteredEnv> {
        let guard = self.inner.read().map_err(|_| GymError::Other("registry poisoned".into()))?;
        let (Some(spec), Some(factory)) = (guard.specs.get(id), guard.factories.get(id)) else {
            return Err(GymError::Other(format!("Unknown environment id: {}", id)));
        };
        let mut merged = spec.kwargs.clone();
        merged.extend(kwargs);
        factory(&merged)
    }

    /// Registers the standard and evaluation variants of one game.
    /// Returns their ids.
    pub fn register_game_variants(
        &self,
        base_id: &str,
        game: &str,
        loader: EmulatorLoader,
    ) -> Result<(String, String)> {
        let (standard, eval) = variant_ids(base_id);
        let variants = [
            EnvSpec::new(standard.clone()).with_kwarg("game", game),
            EnvSpec::new(eval.clone()).with_kwarg("game", game).with_kwarg("life_episode", "false"),
        ];
        for spec in variants {
            self.register(spec, factory_of(loader.clone()))?;
        }
        log::info!("registered {} and {} for game `{}`", standard, eval, game);
        Ok((standard, eval))
    }

    /// Registers the variants of every `(base_id, game)` pair of a catalog.
    pub fn register_catalog(&self, catalog: &BTreeMap<String, String>, loader: EmulatorLoader) -> Result<Vec<String>> {
        let mut ids = Vec::with_capacity(catalog.len() * 2);
        for (base_id, game) in catalog {
            let (standard, eval) = self.register_game_variants(base_id, game, loader.clone())?;
            ids.push(standard);
            ids.push(eval);
        }
        Ok(ids)
    }
}

/// Variant ids for a base id such as `"PongDeterministic-v0"` (or a bare `"Pong"`).
pub fn variant_ids(base_id: &str) -> (String, String) {
    let name = base_id.strip_suffix(BASE_SUFFIX).unwrap_or(base_id);
    (format!("DM-{}-v0", name), format!("DMEval-{}-v0", name))
}

/// Factory building a [`DmAtariEnv`] from kwargs, loading the emulator for the configured game.
pub fn factory_of(loader: EmulatorLoader) -> FactoryFn {
    Box::new(move |kwargs: &KwArgs| {
        let config = DmAtariConfig::from_kwargs(kwargs)?;
        let emulator = loader(&config.game)?;
        DmAtariEnv::new(emulator, config)
    })
}

static REGISTRY: OnceLock<Registry> = OnceLock::new();

fn registry() -> &'static Registry {
    REGISTRY.get_or_init(Registry::new)
}

/// Register an environment spec and its factory globally.
pub fn register(spec: EnvSpec, factory: FactoryFn) -> Result<()> { registry().register(spec, factory) }

/// Fetch a registered EnvSpec by id.
pub fn get_spec(id: &str) -> Option<EnvSpec> { registry().get_spec(id) }

/// Ids registered globally.
pub fn ids() -> Vec<String> { registry().ids() }

/// Construct an environment by id with kwargs.
pub fn make<S: AsRef<str>>(id: S, kwargs: KwArgs) -> Result<RegisteredEnv> { registry().make(id.as_ref(), kwargs) }

/// Register both variants of a game globally.
pub fn register_game_variants(base_id: &str, game: &str, loader: EmulatorLoader) -> Result<(String, String)> {
    registry().register_game_variants(base_id, game, loader)
}
