//! Adjustable parameters for a running scenario
//!
//! `ParameterStore` is the single source of truth for "what-if" edits:
//! - base values come from `Scenario::parameters`,
//! - overrides may only be written for the scenario's adjustable names,
//! - `snapshot()` hands readers an immutable `ParameterSet` (copy-on-read)
//!
//! Writes are last-write-wins per key. All access is expected on one thread;
//! anything crossing a thread boundary goes through a snapshot.

use std::collections::{BTreeMap, BTreeSet};

use log::{debug, warn};

use crate::error::{ComputationError, SimError};
use crate::simulation::scenario::Scenario;

/// Effective parameter values at one instant
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParameterSet {
    values: BTreeMap<String, f64>,
}

impl ParameterSet {
    pub fn get(&self, name: &str) -> Option<f64> {
        self.values.get(name).copied()
    }

    /// Value a formula depends on: present and finite
    pub fn require(&self, name: &str) -> Result<f64, ComputationError> {
        match self.values.get(name) {
            None => Err(ComputationError::MissingParameter(name.to_owned())),
            Some(&value) if !value.is_finite() => Err(ComputationError::NonFinite {
                name: name.to_owned(),
                value,
            }),
            Some(&value) => Ok(value),
        }
    }

    /// Optional value with a fallback; still rejects NaN/inf
    pub fn require_or(&self, name: &str, fallback: f64) -> Result<f64, ComputationError> {
        if self.values.contains_key(name) {
            self.require(name)
        } else {
            Ok(fallback)
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.values.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

impl<S: Into<String>> FromIterator<(S, f64)> for ParameterSet {
    fn from_iter<I: IntoIterator<Item = (S, f64)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ParameterStore {
    defaults: BTreeMap<String, f64>, // scenario base values
    adjustable: BTreeSet<String>, // names the UI may write
    overrides: BTreeMap<String, f64>, // user edits
}

impl ParameterStore {
    pub fn new(scenario: &Scenario) -> Self {
        Self {
            defaults: scenario.parameters.clone(),
            adjustable: scenario.adjustable_parameters.clone(),
            overrides: BTreeMap::new(),
        }
    }

    /// Overwrite an adjustable parameter. Unknown names leave the store untouched.
    pub fn set(&mut self, name: &str, value: f64) -> Result<(), SimError> {
        if !self.adjustable.contains(name) {
            warn!("rejected write to non-adjustable parameter {name}");
            return Err(SimError::UnknownParameter(name.to_owned()));
        }
        debug!("parameter {name} = {value}");
        self.overrides.insert(name.to_owned(), value);
        Ok(())
    }

    /// Current value: the override if any, else the scenario's base value
    pub fn get(&self, name: &str) -> Option<f64> {
        self.overrides
            .get(name)
            .or_else(|| self.defaults.get(name))
            .copied()
    }

    pub fn is_overridden(&self, name: &str) -> bool {
        self.overrides.contains_key(name)
    }

    pub fn reset_to_defaults(&mut self) {
        self.overrides.clear();
    }

    /// Names the UI is allowed to edit, sorted
    pub fn adjustable(&self) -> impl Iterator<Item = &str> {
        self.adjustable.iter().map(String::as_str)
    }

    pub fn snapshot(&self) -> ParameterSet {
        let mut values = self.defaults.clone();
        values.extend(self.overrides.iter().map(|(k, v)| (k.clone(), *v)));
        ParameterSet { values }
    }
}
