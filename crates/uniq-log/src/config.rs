use core::str::FromStr;

use rustc_hash::FxHashMap;

use compact_str::CompactString;

use crate::Level;

/// Level filter in `RUST_LOG` syntax: `level` sets the base level and
/// `target=level` overrides it for a module path and everything below it.
#[derive(Clone, Debug)]
pub struct LogConfig {
    target_levels: FxHashMap<CompactString, Level>,
    base_level: Level,
}

impl Default for LogConfig {

    fn default() -> Self {
        Self {
            target_levels: FxHashMap::default(),
            base_level: Level::Error,
        }
    }
}

impl LogConfig {

    pub const ENV_VAR: &'static str = "RUST_LOG";

    pub fn from_env() -> Self {
        match std::env::var(Self::ENV_VAR) {
            Ok(env) => Self::parse(&env),
            Err(_) => Self::default(),
        }
    }

    /// Unrecognized levels are skipped. When a target is given more than once
    /// the most restrictive level wins.
    pub fn parse(spec: &str) -> Self {
        let mut config = Self::default();
        for arg in spec.split(',') {
            let arg = arg.trim();
            if arg.is_empty() {
                continue
            }
            let (module, level) = match arg.find('=') {
                Some(j) => (Some(arg[0..j].trim()), arg[j+1..].trim()),
                None => (None, arg),
            };
            let Ok(level) = Level::from_str(level) else {
                continue
            };
            match module {
                Some(module) => {
                    let entry = config.target_levels
                        .entry(CompactString::new(module))
                        .or_insert(level);
                    *entry = (*entry).min(level);
                },
                None => config.base_level = level,
            }
        }
        config
    }

    #[inline(always)]
    pub fn with_base_level(mut self, level: Level) -> Self {
        self.base_level = level;
        self
    }

    #[inline(always)]
    pub fn with_target_level(mut self, target: &str, level: Level) -> Self {
        self.target_levels.insert(CompactString::new(target), level);
        self
    }

    #[inline(always)]
    pub fn base_level(&self) -> Level {
        self.base_level
    }

    /// Level of the closest configured ancestor of `target`.
    pub fn target_level(&self, target: &str) -> Level {
        let mut substr = target;
        if let Some(&level) = self.target_levels.get(substr) {
            return level
        }
        while let Some(i) = substr.rfind("::") {
            substr = &substr[0..i];
            if let Some(&level) = self.target_levels.get(substr) {
                return level
            }
        }
        self.base_level
    }

    /// The most verbose level any target can reach.
    pub fn max_level(&self) -> Level {
        self.target_levels
            .values()
            .copied()
            .fold(self.base_level, Level::max)
    }
}
