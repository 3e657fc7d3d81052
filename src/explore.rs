//! State-graph construction by worklist exploration.
//!
//! Two modes:
//!
//! 1. **Single**: breadth-first closure of one adapter's transition relation
//!    from its initial states.
//! 2. **Joint**: the synchronized product of two adapters. A joint state is a
//!    pair `(s1, s2)` kept only while an [`Equivalence`] holds between its
//!    components; both sides must move together, and the joint edge carries
//!    the union of both sides' labels.
//!
//! The worklist is FIFO, so [`Model::states`] enumerates states in
//! discovery order. With the `parallel` feature each breadth-first frontier
//! is expanded on the rayon pool and merged back in frontier order, which
//! yields exactly the same model as the sequential build.

use crate::adapter::{Adapter, LabelSet};
use crate::builder::impl_builder;
use crate::error::{AdapterError, ConnectResult, Error, ExploreError};
use crate::model::Model;
use similar::{ChangeTag, TextDiff};
use std::collections::{HashMap, HashSet};
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{debug, info, warn};

/// Configuration for state-graph construction.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct ExploreConfig {
    /// Abort with [`ExploreError::StateLimit`] once more than this many
    /// states have been discovered (default: unbounded).
    pub max_states: Option<usize>,

    /// Log a warning when a joint model comes out degenerate, i.e. without
    /// initial states or without any transition (default: true).
    pub warn_on_degenerate: bool,
}

impl Default for ExploreConfig {
    fn default() -> Self {
        Self {
            max_states: None,
            warn_on_degenerate: true,
        }
    }
}

impl_builder!(ExploreConfig, ExploreConfigBuilder {
    defaulted { warn_on_degenerate: bool }
    limits { max_states }
});

/// Decides whether two single-implementation states pair into a joint state.
///
/// Any `Fn(&A, &B) -> bool` closure is an equivalence.
pub trait Equivalence<A, B> {
    fn equivalent(&self, left: &A, right: &B) -> bool;
}

impl<A, B, F> Equivalence<A, B> for F
where
    F: Fn(&A, &B) -> bool,
{
    fn equivalent(&self, left: &A, right: &B) -> bool {
        self(left, right)
    }
}

/// Structural equality of the two states.
///
/// Only meaningful when both adapters snapshot into the same comparable
/// representation; for anything else pass an explicit relation to
/// [`StateGraphBuilder::build_joint_with`].
#[derive(Debug, Clone, Copy, Default)]
pub struct StructuralEq;

impl<A: PartialEq<B>, B> Equivalence<A, B> for StructuralEq {
    fn equivalent(&self, left: &A, right: &B) -> bool {
        left == right
    }
}

/// Builds [`Model`]s from adapters.
#[derive(Debug, Clone, Default)]
pub struct StateGraphBuilder {
    config: ExploreConfig,
}

impl StateGraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: ExploreConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ExploreConfig {
        &self.config
    }

    /// Explore the states reachable from `adapter`'s initial states.
    pub fn build<A: Adapter>(&self, adapter: &A) -> ConnectResult<Model<A::State>> {
        info!(mode = "single", "Building state graph");
        let initial = adapter.initial_states()?;
        let model = explore(initial, self.config.max_states, |frontier| {
            expand_seq(frontier, |s| adapter.successors(s))
        })?;
        log_finished("single", &model);
        Ok(model)
    }

    /// Explore the synchronized product of two adapters under structural
    /// equality of their states.
    pub fn build_joint<A, B>(
        &self,
        left: &A,
        right: &B,
    ) -> ConnectResult<Model<(A::State, B::State)>>
    where
        A: Adapter,
        B: Adapter,
        A::State: PartialEq<B::State>,
    {
        self.build_joint_with(left, right, StructuralEq)
    }

    /// Explore the synchronized product of two adapters under `equivalence`.
    pub fn build_joint_with<A, B, E>(
        &self,
        left: &A,
        right: &B,
        equivalence: E,
    ) -> ConnectResult<Model<(A::State, B::State)>>
    where
        A: Adapter,
        B: Adapter,
        E: Equivalence<A::State, B::State>,
    {
        info!(mode = "joint", "Building state graph");
        let seed = joint_seed(left, right, &equivalence)?;
        let pruned = AtomicUsize::new(0);
        let model = explore(seed.pairs, self.config.max_states, |frontier| {
            expand_seq(frontier, |s| joint_step(left, right, &equivalence, &pruned, s))
        })?;
        self.report_joint(&model, &seed.first_rejected, pruned.into_inner());
        Ok(model)
    }

    /// Like [`build`](Self::build), expanding each frontier in parallel.
    #[cfg(feature = "parallel")]
    pub fn build_par<A>(&self, adapter: &A) -> ConnectResult<Model<A::State>>
    where
        A: Adapter + Sync,
        A::State: Send + Sync,
    {
        info!(mode = "single", parallel = true, "Building state graph");
        let initial = adapter.initial_states()?;
        let model = explore(initial, self.config.max_states, |frontier| {
            expand_par(frontier, |s| adapter.successors(s))
        })?;
        log_finished("single", &model);
        Ok(model)
    }

    /// Like [`build_joint_with`](Self::build_joint_with), expanding each
    /// frontier in parallel.
    #[cfg(feature = "parallel")]
    pub fn build_joint_par_with<A, B, E>(
        &self,
        left: &A,
        right: &B,
        equivalence: E,
    ) -> ConnectResult<Model<(A::State, B::State)>>
    where
        A: Adapter + Sync,
        B: Adapter + Sync,
        A::State: Send + Sync,
        B::State: Send + Sync,
        E: Equivalence<A::State, B::State> + Sync,
    {
        info!(mode = "joint", parallel = true, "Building state graph");
        let seed = joint_seed(left, right, &equivalence)?;
        let pruned = AtomicUsize::new(0);
        let model = explore(seed.pairs, self.config.max_states, |frontier| {
            expand_par(frontier, |s| joint_step(left, right, &equivalence, &pruned, s))
        })?;
        self.report_joint(&model, &seed.first_rejected, pruned.into_inner());
        Ok(model)
    }

    fn report_joint<S1: Debug, S2: Debug>(
        &self,
        model: &Model<(S1, S2)>,
        first_rejected: &Option<(S1, S2)>,
        pruned: usize,
    ) where
        (S1, S2): Clone + Eq + Hash,
    {
        log_finished("joint", model);
        debug!(pruned, "Pruned non-equivalent successor pairs");

        if !self.config.warn_on_degenerate {
            return;
        }

        if model.initial().is_empty() {
            match first_rejected {
                Some((s1, s2)) => warn!(
                    "Joint model is empty: no pair of initial states is equivalent\n\
                     --- left\n+++ right\n{}",
                    unified_diff(&format!("{s1:#?}"), &format!("{s2:#?}"))
                ),
                None => warn!("Joint model is empty: an adapter has no initial states"),
            }
        } else if model.transition_count() == 0 {
            warn!(
                pruned,
                "Joint model has no transitions: every successor pair was pruned"
            );
        }
    }
}

/// Discovered states and edges of one exploration run.
struct Exploration<S> {
    states: Vec<S>,
    seen: HashSet<S>,
    transitions: HashMap<S, Vec<(S, LabelSet)>>,
    limit: Option<usize>,
}

impl<S: Clone + Eq + Hash> Exploration<S> {
    fn new(limit: Option<usize>) -> Self {
        Self {
            states: Vec::new(),
            seen: HashSet::new(),
            transitions: HashMap::new(),
            limit,
        }
    }

    /// Record `state`; returns whether it was new.
    fn discover(&mut self, state: &S) -> Result<bool, ExploreError> {
        if self.seen.contains(state) {
            return Ok(false);
        }
        if let Some(limit) = self.limit {
            if self.states.len() >= limit {
                return Err(ExploreError::StateLimit { limit });
            }
        }
        self.seen.insert(state.clone());
        self.states.push(state.clone());
        Ok(true)
    }
}

/// Breadth-first exploration from `initial`.
///
/// `expand` maps a frontier to the successor lists of its states, in the
/// same order.
fn explore<S, F>(initial: Vec<S>, limit: Option<usize>, mut expand: F) -> ConnectResult<Model<S>>
where
    S: Clone + Eq + Hash + Debug,
    F: FnMut(&[S]) -> ConnectResult<Vec<Vec<(S, LabelSet)>>>,
{
    let mut run = Exploration::new(limit);
    let mut frontier = Vec::new();
    for state in &initial {
        if run.discover(state)? {
            frontier.push(state.clone());
        }
    }

    let mut depth = 0usize;
    while !frontier.is_empty() {
        let expanded = expand(&frontier)?;
        let mut next = Vec::new();

        for (state, edges) in frontier.into_iter().zip(expanded) {
            debug!(depth, ?state, successors = edges.len(), "Expanded state");
            for (dest, _) in &edges {
                if run.discover(dest)? {
                    next.push(dest.clone());
                }
            }
            run.transitions.insert(state, edges);
        }

        frontier = next;
        depth += 1;
    }

    Ok(Model::from_parts(run.states, initial, run.transitions))
}

fn expand_seq<S, F>(frontier: &[S], step: F) -> ConnectResult<Vec<Vec<(S, LabelSet)>>>
where
    F: Fn(&S) -> Result<Vec<(S, LabelSet)>, AdapterError>,
{
    frontier
        .iter()
        .map(|s| step(s).map_err(Error::from))
        .collect()
}

#[cfg(feature = "parallel")]
fn expand_par<S, F>(frontier: &[S], step: F) -> ConnectResult<Vec<Vec<(S, LabelSet)>>>
where
    S: Send + Sync,
    F: Fn(&S) -> Result<Vec<(S, LabelSet)>, AdapterError> + Sync,
{
    use rayon::prelude::*;

    frontier
        .par_iter()
        .map(|s| step(s).map_err(Error::from))
        .collect()
}

struct JointSeed<S1, S2> {
    pairs: Vec<(S1, S2)>,
    first_rejected: Option<(S1, S2)>,
}

fn joint_seed<A, B, E>(
    left: &A,
    right: &B,
    equivalence: &E,
) -> Result<JointSeed<A::State, B::State>, AdapterError>
where
    A: Adapter,
    B: Adapter,
    E: Equivalence<A::State, B::State>,
{
    let left_init = left.initial_states()?;
    let right_init = right.initial_states()?;

    let mut pairs = Vec::new();
    let mut first_rejected = None;
    for s1 in &left_init {
        for s2 in &right_init {
            if equivalence.equivalent(s1, s2) {
                pairs.push((s1.clone(), s2.clone()));
            } else if first_rejected.is_none() {
                first_rejected = Some((s1.clone(), s2.clone()));
            }
        }
    }

    debug!(
        left = left_init.len(),
        right = right_init.len(),
        paired = pairs.len(),
        "Paired initial states"
    );
    Ok(JointSeed {
        pairs,
        first_rejected,
    })
}

/// Synchronized successors of a joint state.
///
/// Both sides must move; pairs of next states failing the equivalence are
/// counted in `pruned` and dropped.
fn joint_step<A, B, E>(
    left: &A,
    right: &B,
    equivalence: &E,
    pruned: &AtomicUsize,
    state: &(A::State, B::State),
) -> Result<Vec<((A::State, B::State), LabelSet)>, AdapterError>
where
    A: Adapter,
    B: Adapter,
    E: Equivalence<A::State, B::State>,
{
    let (s1, s2) = state;
    let left_next = left.successors(s1)?;
    let right_next = right.successors(s2)?;

    let mut edges = Vec::new();
    let mut rejected = 0;
    for (n1, labels1) in &left_next {
        for (n2, labels2) in &right_next {
            if equivalence.equivalent(n1, n2) {
                let labels = labels1.union(labels2).cloned().collect();
                edges.push(((n1.clone(), n2.clone()), labels));
            } else {
                rejected += 1;
            }
        }
    }

    pruned.fetch_add(rejected, Ordering::Relaxed);
    Ok(edges)
}

fn log_finished<S: Clone + Eq + Hash>(mode: &'static str, model: &Model<S>) {
    info!(
        mode,
        states = model.state_count(),
        initial = model.initial().len(),
        transitions = model.transition_count(),
        "State graph built"
    );
}

/// Produce a unified diff between two debug-formatted strings.
fn unified_diff(left: &str, right: &str) -> String {
    let diff = TextDiff::from_lines(left, right);
    let mut output = String::new();

    for change in diff.iter_all_changes() {
        let sign = match change.tag() {
            ChangeTag::Delete => "-",
            ChangeTag::Insert => "+",
            ChangeTag::Equal => " ",
        };
        output.push_str(sign);
        output.push_str(change.value());
        if !change.value().ends_with('\n') {
            output.push('\n');
        }
    }

    output
}
