use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use qf_core::{ErrorInfo, Pole, QfError, Symbol};
use qf_register::RegisterMap;
use serde::{Deserialize, Serialize};

fn config_error(code: &str, message: &str) -> ErrorInfo {
    ErrorInfo::new(code, message)
}

/// One labelled axis of an instance register.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AxisConfig {
    /// Axis index; defaults to the entry's position in the list.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<usize>,
    /// Symbol on the north pole.
    pub north: Symbol,
    /// Symbol on the south pole.
    pub south: Symbol,
}

/// YAML- or JSON-configurable description of one simulated instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstanceConfig {
    /// Preset whose factions are active; takes precedence over `factions`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preset: Option<String>,
    /// Active faction names when no preset is given. Empty means all.
    #[serde(default)]
    pub factions: Vec<String>,
    /// Axis assignments.
    #[serde(default)]
    pub axes: Vec<AxisConfig>,
    /// Pole every axis is prepared in.
    #[serde(default = "default_initial_pole")]
    pub initial_pole: Pole,
    /// Largest Euler substep taken by a tick.
    #[serde(default = "default_max_dt")]
    pub max_dt: f64,
    /// Dephasing applied to every axis before icon contributions.
    #[serde(default)]
    pub base_dephasing: f64,
    /// Populations of symbols outside the register, for gates and
    /// alignment.
    #[serde(default)]
    pub observables: BTreeMap<Symbol, f64>,
    /// Master seed of the measurement RNG.
    #[serde(default)]
    pub seed: u64,
    /// Substream of `seed` this instance draws from, so instances sharing a
    /// master seed stay independent.
    #[serde(default)]
    pub substream: u64,
}

fn default_initial_pole() -> Pole {
    Pole::South
}

fn default_max_dt() -> f64 {
    0.05
}

impl Default for InstanceConfig {
    fn default() -> Self {
        Self {
            preset: None,
            factions: Vec::new(),
            axes: Vec::new(),
            initial_pole: default_initial_pole(),
            max_dt: default_max_dt(),
            base_dephasing: 0.0,
            observables: BTreeMap::new(),
            seed: 0,
            substream: 0,
        }
    }
}

impl InstanceConfig {
    /// Parses a YAML document.
    pub fn from_yaml_str(contents: &str) -> Result<Self, QfError> {
        let config: Self = serde_yaml::from_str(contents).map_err(|err| {
            QfError::Config(config_error("yaml-deserialize", "invalid instance config").with_context("error", err))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Parses a JSON document.
    pub fn from_json_str(contents: &str) -> Result<Self, QfError> {
        let config: Self = serde_json::from_str(contents).map_err(|err| {
            QfError::Config(config_error("json-deserialize", "invalid instance config").with_context("error", err))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Loads a config file; `.json` files are JSON, anything else YAML.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, QfError> {
        let path = path.as_ref();
        let contents = read_config(path)?;
        if is_json(path) {
            Self::from_json_str(&contents)
        } else {
            Self::from_yaml_str(&contents)
        }
    }

    /// Checks numeric bounds and that the axes form a valid register.
    pub fn validate(&self) -> Result<(), QfError> {
        if !(self.max_dt > 0.0 && self.max_dt.is_finite()) {
            return Err(QfError::Config(
                config_error("invalid-max-dt", "max_dt must be positive and finite")
                    .with_context("max_dt", self.max_dt),
            ));
        }
        if !(self.base_dephasing >= 0.0) {
            return Err(QfError::Config(
                config_error("invalid-dephasing", "base_dephasing must be non-negative")
                    .with_context("base_dephasing", self.base_dephasing),
            ));
        }
        if let Some((symbol, population)) = self
            .observables
            .iter()
            .find(|(_, population)| !(0.0..=1.0).contains(*population))
        {
            return Err(QfError::Config(
                config_error("invalid-observable", "observable populations must lie in [0, 1]")
                    .with_context("symbol", symbol)
                    .with_context("population", population),
            ));
        }
        self.register_map().map(|_| ())
    }

    /// Register map described by `axes`.
    pub fn register_map(&self) -> Result<RegisterMap, QfError> {
        if self.axes.is_empty() {
            return Err(QfError::Config(
                config_error("axes-empty", "instance needs at least one axis")
                    .with_hint("add an `axes` list of north/south pairs"),
            ));
        }
        let mut map = RegisterMap::new();
        for (position, axis) in self.axes.iter().enumerate() {
            let index = axis.index.unwrap_or(position);
            map.register_axis(index, axis.north.clone(), axis.south.clone())?;
        }
        Ok(map)
    }
}

/// A scripted run of one instance, as driven by the command line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    /// Faction library, relative to the run file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub factions: Option<PathBuf>,
    /// Instance description.
    pub instance: InstanceConfig,
    /// Ticks to execute.
    #[serde(default = "default_ticks")]
    pub ticks: usize,
    /// Time advanced per tick.
    #[serde(default = "default_dt")]
    pub dt: f64,
    /// Axis pairs entangled before the first tick.
    #[serde(default)]
    pub entangle: Vec<(usize, usize)>,
    /// Axes measured after the last tick.
    #[serde(default)]
    pub measure: Vec<usize>,
}

fn default_ticks() -> usize {
    10
}

fn default_dt() -> f64 {
    0.1
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            factions: None,
            instance: InstanceConfig::default(),
            ticks: default_ticks(),
            dt: default_dt(),
            entangle: Vec::new(),
            measure: Vec::new(),
        }
    }
}

impl RunConfig {
    /// Parses a YAML document.
    pub fn from_yaml_str(contents: &str) -> Result<Self, QfError> {
        let config: Self = serde_yaml::from_str(contents).map_err(|err| {
            QfError::Config(config_error("yaml-deserialize", "invalid run config").with_context("error", err))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Loads a run file; `.json` files are JSON, anything else YAML.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, QfError> {
        let path = path.as_ref();
        let contents = read_config(path)?;
        if is_json(path) {
            let config: Self = serde_json::from_str(&contents).map_err(|err| {
                QfError::Config(config_error("json-deserialize", "invalid run config").with_context("error", err))
            })?;
            config.validate()?;
            Ok(config)
        } else {
            Self::from_yaml_str(&contents)
        }
    }

    /// Checks the schedule and the embedded instance.
    pub fn validate(&self) -> Result<(), QfError> {
        if !(self.dt > 0.0 && self.dt.is_finite()) {
            return Err(QfError::Config(
                config_error("invalid-timestep", "dt must be positive and finite").with_context("dt", self.dt),
            ));
        }
        self.instance.validate()
    }
}

fn read_config(path: &Path) -> Result<String, QfError> {
    fs::read_to_string(path).map_err(|err| {
        QfError::Config(
            config_error("io-read", "failed to read config file")
                .with_context("path", path.display())
                .with_context("error", err),
        )
    })
}

fn is_json(path: &Path) -> bool {
    path.extension().and_then(|ext| ext.to_str()) == Some("json")
}
