//! Encoding of explored models into Kripke structures.
//!
//! A temporal-logic engine expects a node list, a total edge relation and a
//! labeling of states by atomic propositions. Labels in a [`Model`] sit on
//! edges; here they move onto the state the edge *arrives* at, so a state
//! satisfies the proposition `inc` iff some observed `inc` transition led
//! into it.

use crate::adapter::LabelSet;
use crate::error::{EncodingError, Error};
use crate::model::Model;
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt::Debug;
use std::hash::Hash;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::debug;

/// Index of a state in [`Kripke::states`] (its discovery position).
pub type StateId = usize;

/// Node/edge/labeling form of a model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Kripke<S> {
    states: Vec<S>,
    initial: BTreeSet<StateId>,
    edges: BTreeSet<(StateId, StateId)>,
    /// `edges` keyed by destination, as `(to, from)`.
    #[serde(skip)]
    reverse: BTreeSet<(StateId, StateId)>,
    labels: Vec<LabelSet>,
    synthetic: BTreeSet<StateId>,
}

impl<S> Kripke<S> {
    pub fn states(&self) -> &[S] {
        &self.states
    }

    pub fn state(&self, id: StateId) -> Option<&S> {
        self.states.get(id)
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn initial(&self) -> &BTreeSet<StateId> {
        &self.initial
    }

    /// The edge relation, including synthetic self-loops.
    pub fn edges(&self) -> &BTreeSet<(StateId, StateId)> {
        &self.edges
    }

    /// Self-loops added by totalization. They carry no labels and do not
    /// correspond to any observed action.
    pub fn synthetic(&self) -> &BTreeSet<StateId> {
        &self.synthetic
    }

    /// Labels of edges arriving at `id`; empty for unknown ids.
    pub fn labels(&self, id: StateId) -> &LabelSet {
        static EMPTY: LabelSet = LabelSet::new();
        self.labels.get(id).unwrap_or(&EMPTY)
    }

    /// Whether the atomic proposition `label` holds in `id`.
    pub fn holds(&self, id: StateId, label: &str) -> bool {
        self.labels(id).contains(label)
    }

    pub fn successors(&self, id: StateId) -> impl Iterator<Item = StateId> + '_ {
        self.edges
            .range((id, 0)..=(id, StateId::MAX))
            .map(|&(_, to)| to)
    }

    pub fn predecessors(&self, id: StateId) -> impl Iterator<Item = StateId> + '_ {
        self.reverse
            .range((id, 0)..=(id, StateId::MAX))
            .map(|&(_, from)| from)
    }

    /// Whether every state has at least one outgoing edge.
    pub fn is_total(&self) -> bool {
        (0..self.states.len()).all(|id| self.successors(id).next().is_some())
    }

    /// Give every state without outgoing edges a self-loop.
    ///
    /// Returns the number of loops added; a second call adds none.
    pub fn totalize(&mut self) -> usize {
        let dead: Vec<StateId> = (0..self.states.len())
            .filter(|&id| self.successors(id).next().is_none())
            .collect();

        for &id in &dead {
            debug!(state = id, "Adding synthetic self-loop");
            self.edges.insert((id, id));
            self.reverse.insert((id, id));
            self.synthetic.insert(id);
        }

        dead.len()
    }

    /// Ids of all states satisfying `pred`.
    pub fn select(&self, mut pred: impl FnMut(StateId, &S) -> bool) -> BTreeSet<StateId> {
        self.states
            .iter()
            .enumerate()
            .filter(|(id, s)| pred(*id, *s))
            .map(|(id, _)| id)
            .collect()
    }
}

impl<S: PartialEq> Kripke<S> {
    /// Id of `state`, by linear search.
    pub fn id_of(&self, state: &S) -> Option<StateId> {
        self.states.iter().position(|s| s == state)
    }
}

impl<S: Serialize> Kripke<S> {
    /// The structure as JSON, for engines running outside the process.
    pub fn to_json(&self) -> Result<serde_json::Value, Error> {
        Ok(serde_json::to_value(self)?)
    }

    /// Write the structure as pretty-printed JSON to `path`.
    pub fn write_json(&self, path: &Path) -> Result<(), Error> {
        let file = std::fs::File::create(path)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, self)?;
        writer.flush()?;
        Ok(())
    }
}

/// Converts a [`Model`] into a total [`Kripke`] structure.
#[derive(Debug, Clone, Copy, Default)]
pub struct StructureEncoder;

impl StructureEncoder {
    pub fn new() -> Self {
        Self
    }

    /// Flatten `model` and totalize its edge relation.
    ///
    /// Fails if the model is not closed: an initial state, transition source
    /// or destination that is not among its states.
    pub fn encode<S>(&self, model: &Model<S>) -> Result<Kripke<S>, EncodingError>
    where
        S: Clone + Eq + Hash + Debug,
    {
        model.check_closure()?;

        let states = model.states().to_vec();
        let mut labels = vec![LabelSet::new(); states.len()];
        let mut edges = BTreeSet::new();
        let mut reverse = BTreeSet::new();

        let initial = model
            .initial()
            .iter()
            .map(|s| {
                model
                    .position(s)
                    .ok_or_else(|| EncodingError::UnknownInitial(format!("{s:?}")))
            })
            .collect::<Result<BTreeSet<_>, _>>()?;

        for (from, to, edge_labels) in model.edges() {
            let unknown = || EncodingError::UnknownDestination {
                from: format!("{from:?}"),
                to: format!("{to:?}"),
            };
            let from_id = model.position(from).ok_or_else(unknown)?;
            let to_id = model.position(to).ok_or_else(unknown)?;

            edges.insert((from_id, to_id));
            reverse.insert((to_id, from_id));
            labels[to_id].extend(edge_labels.iter().cloned());
        }

        let mut kripke = Kripke {
            states,
            initial,
            edges,
            reverse,
            labels,
            synthetic: BTreeSet::new(),
        };
        let added = kripke.totalize();

        debug!(
            states = kripke.len(),
            edges = kripke.edges.len(),
            synthetic = added,
            "Encoded Kripke structure"
        );
        Ok(kripke)
    }
}
