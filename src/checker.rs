//! Property checking through an external temporal-logic engine.
//!
//! The crate does not evaluate CTL itself. A [`CtlEngine`] computes the set
//! of states satisfying a formula over a [`Kripke`] structure; the
//! [`ModelChecker`] turns those sets into verdicts. A property holds iff
//! every initial state satisfies it.

use crate::encoder::{Kripke, StateId, StructureEncoder};
use crate::error::{CheckError, Error};
use crate::model::Model;
use crate::properties::{PropertyKind, PropertySuite};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::{Debug, Display};
use std::hash::Hash;
use tracing::{debug, info, warn};

/// A temporal-logic evaluation engine.
pub trait CtlEngine<S> {
    /// The formula representation the engine accepts.
    type Formula;

    /// Error reported when a formula cannot be evaluated.
    type Error: Display;

    /// The ids of all states of `kripke` satisfying `formula`.
    fn check(
        &self,
        kripke: &Kripke<S>,
        formula: &Self::Formula,
    ) -> Result<BTreeSet<StateId>, Self::Error>;
}

/// Verdict for one property.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyResult {
    pub name: String,
    pub kind: PropertyKind,
    pub holds: bool,
    /// Initial states that do not satisfy the formula.
    pub failing_initial: Vec<StateId>,
}

/// Verdicts for a whole suite, in suite order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[must_use = "check report should be inspected"]
pub struct CheckReport {
    pub results: Vec<PropertyResult>,
}

impl CheckReport {
    pub fn all_hold(&self) -> bool {
        self.results.iter().all(|r| r.holds)
    }

    pub fn failures(&self) -> impl Iterator<Item = &PropertyResult> {
        self.results.iter().filter(|r| !r.holds)
    }

    pub fn get(&self, name: &str) -> Option<&PropertyResult> {
        self.results.iter().find(|r| r.name == name)
    }

    /// Property name to verdict.
    pub fn verdicts(&self) -> BTreeMap<&str, bool> {
        self.results
            .iter()
            .map(|r| (r.name.as_str(), r.holds))
            .collect()
    }
}

/// Checks property suites against one encoded structure.
pub struct ModelChecker<S, E> {
    kripke: Kripke<S>,
    engine: E,
}

impl<S, E: CtlEngine<S>> ModelChecker<S, E> {
    pub fn new(kripke: Kripke<S>, engine: E) -> Self {
        Self { kripke, engine }
    }

    /// Encode `model` and wrap it.
    pub fn from_model(model: &Model<S>, engine: E) -> Result<Self, Error>
    where
        S: Clone + Eq + Hash + Debug,
    {
        let kripke = StructureEncoder::new().encode(model)?;
        Ok(Self::new(kripke, engine))
    }

    pub fn kripke(&self) -> &Kripke<S> {
        &self.kripke
    }

    /// Check a single formula; `name` is used in errors and the result.
    pub fn check_property(
        &self,
        kind: PropertyKind,
        name: &str,
        formula: &E::Formula,
    ) -> Result<PropertyResult, Error> {
        let sat = self
            .engine
            .check(&self.kripke, formula)
            .map_err(|e| CheckError::Engine {
                property: name.to_string(),
                reason: e.to_string(),
            })?;

        if let Some(&id) = sat.iter().find(|&&id| id >= self.kripke.len()) {
            return Err(CheckError::UnknownState {
                property: name.to_string(),
                id,
            }
            .into());
        }

        let failing_initial: Vec<StateId> = self
            .kripke
            .initial()
            .iter()
            .copied()
            .filter(|id| !sat.contains(id))
            .collect();
        let holds = failing_initial.is_empty();

        debug!(
            property = name,
            %kind,
            holds,
            satisfying = sat.len(),
            "Checked property"
        );

        Ok(PropertyResult {
            name: name.to_string(),
            kind,
            holds,
            failing_initial,
        })
    }

    /// Validate `suite` and check every property in it.
    pub fn check(&self, suite: &PropertySuite<E::Formula>) -> Result<CheckReport, Error> {
        suite.validate()?;

        if self.kripke.initial().is_empty() {
            warn!("Structure has no initial states; every property holds vacuously");
        }

        let results = suite
            .iter()
            .map(|(kind, property)| self.check_property(kind, &property.name, &property.formula))
            .collect::<Result<Vec<_>, _>>()?;
        let report = CheckReport { results };

        info!(
            properties = report.results.len(),
            failed = report.failures().count(),
            "Property check finished"
        );
        Ok(report)
    }
}
