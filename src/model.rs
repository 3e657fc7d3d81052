//! Explicit-state transition model produced by exploration.

use crate::adapter::LabelSet;
use crate::error::EncodingError;
use std::collections::{HashMap, HashSet};
use std::fmt::Debug;
use std::hash::Hash;

/// A finite labeled transition structure.
///
/// States are kept in discovery order. Each state maps to the ordered list
/// of `(next, labels)` edges observed from it; a state without an entry, or
/// with an empty list, has no outgoing edges.
#[derive(Debug, Clone)]
pub struct Model<S> {
    states: Vec<S>,
    index: HashMap<S, usize>,
    initial: Vec<S>,
    transitions: HashMap<S, Vec<(S, LabelSet)>>,
}

impl<S: Clone + Eq + Hash> Model<S> {
    /// Assemble a model from raw collections.
    ///
    /// No closure check is performed; repeated states keep their first
    /// position. Use [`check_closure`](Self::check_closure) to validate.
    pub fn from_parts(
        states: impl IntoIterator<Item = S>,
        initial: impl IntoIterator<Item = S>,
        transitions: HashMap<S, Vec<(S, LabelSet)>>,
    ) -> Self {
        let mut ordered = Vec::new();
        let mut index = HashMap::new();
        for state in states {
            if !index.contains_key(&state) {
                index.insert(state.clone(), ordered.len());
                ordered.push(state);
            }
        }

        let mut seen = HashSet::new();
        let initial_unique: Vec<S> = initial
            .into_iter()
            .filter(|state| seen.insert(state.clone()))
            .collect();

        Self {
            states: ordered,
            index,
            initial: initial_unique,
            transitions,
        }
    }

    /// All states, in discovery order.
    pub fn states(&self) -> &[S] {
        &self.states
    }

    pub fn initial(&self) -> &[S] {
        &self.initial
    }

    pub fn contains(&self, state: &S) -> bool {
        self.index.contains_key(state)
    }

    /// Discovery index of `state`.
    pub fn position(&self, state: &S) -> Option<usize> {
        self.index.get(state).copied()
    }

    /// Edges leaving `state`, in observation order.
    pub fn transitions(&self, state: &S) -> &[(S, LabelSet)] {
        self.transitions.get(state).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Whether `state` has an explicit (possibly empty) transitions entry.
    pub fn has_entry(&self, state: &S) -> bool {
        self.transitions.contains_key(state)
    }

    /// Every edge as `(from, to, labels)`, sources in discovery order.
    pub fn edges(&self) -> impl Iterator<Item = (&S, &S, &LabelSet)> {
        self.states.iter().flat_map(move |from| {
            self.transitions(from)
                .iter()
                .map(move |(to, labels)| (from, to, labels))
        })
    }

    pub fn state_count(&self) -> usize {
        self.states.len()
    }

    pub fn transition_count(&self) -> usize {
        self.transitions.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// States with no outgoing edges.
    pub fn terminal_states(&self) -> impl Iterator<Item = &S> {
        self.states.iter().filter(move |s| self.transitions(s).is_empty())
    }
}

impl<S: Clone + Eq + Hash + Debug> Model<S> {
    /// Verify that every initial state, transition source and destination is
    /// a member of the state set.
    pub fn check_closure(&self) -> Result<(), EncodingError> {
        if let Some(s) = self.initial.iter().find(|s| !self.contains(s)) {
            return Err(EncodingError::UnknownInitial(format!("{s:?}")));
        }

        for (from, edges) in &self.transitions {
            if !self.contains(from) {
                return Err(EncodingError::UnknownSource(format!("{from:?}")));
            }
            if let Some((to, _)) = edges.iter().find(|(to, _)| !self.contains(to)) {
                return Err(EncodingError::UnknownDestination {
                    from: format!("{from:?}"),
                    to: format!("{to:?}"),
                });
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(names: &[&str]) -> LabelSet {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn from_parts_dedups_and_keeps_order() {
        let model = Model::from_parts([3, 1, 3, 2], [1, 1], HashMap::new());
        assert_eq!(model.states(), &[3, 1, 2]);
        assert_eq!(model.initial(), &[1]);
        assert_eq!(model.position(&2), Some(2));
    }

    #[test]
    fn large_initial_seed_dedups_in_order() {
        // Every value appears three times, interleaved.
        let seed = (0..3).flat_map(|_| (0..2000u32).rev());
        let model = Model::from_parts(0..2000u32, seed, HashMap::new());
        assert_eq!(model.initial().len(), 2000);
        assert_eq!(model.initial()[0], 1999);
        assert_eq!(model.initial()[1999], 0);
    }

    #[test]
    fn missing_entry_means_no_edges() {
        let mut transitions = HashMap::new();
        transitions.insert(0, vec![(1, labels(&["a"]))]);
        let model = Model::from_parts([0, 1], [0], transitions);

        assert!(model.has_entry(&0));
        assert!(!model.has_entry(&1));
        assert!(model.transitions(&1).is_empty());
        assert_eq!(model.terminal_states().collect::<Vec<_>>(), vec![&1]);
        assert_eq!(model.transition_count(), 1);
    }

    #[test]
    fn closure_violation_detected() {
        let mut transitions = HashMap::new();
        transitions.insert(0, vec![(7, labels(&["jump"]))]);
        let model = Model::from_parts([0], [0], transitions);

        let err = model.check_closure().unwrap_err();
        assert!(matches!(err, EncodingError::UnknownDestination { ref to, .. } if to == "7"));
    }

    #[test]
    fn unknown_initial_detected() {
        let model = Model::from_parts([0], [5], HashMap::new());
        assert!(matches!(model.check_closure(), Err(EncodingError::UnknownInitial(_))));
    }
}
