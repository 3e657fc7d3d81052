//! Core abstractions for turning a Rust implementation into an explorable
//! transition relation.
//!
//! An [`Adapter`] answers two questions: which states the system starts in,
//! and which labeled transitions leave a given state. [`ImplAdapter`] is the
//! canonical adapter: it wraps a constructible implementation type together
//! with snapshot/restore functions and a catalog of [`ActionSpec`]s, and
//! observes transitions by replaying actions on freshly rehydrated instances.
//!
//! # Example
//!
//! ```
//! use ctl_connect::{args, ActionSpec, Adapter, ImplAdapter, StateSnapshot};
//!
//! #[derive(Default)]
//! struct Counter {
//!     value: u32,
//! }
//!
//! let adapter = ImplAdapter::<Counter, u32>::builder()
//!     .factory(Counter::default)
//!     .snapshot(|c: &Counter| Ok(c.value))
//!     .restore(|c: &mut Counter, v: &u32| {
//!         c.value = *v;
//!         Ok(())
//!     })
//!     .action(
//!         ActionSpec::new("increment", |c: &mut Counter, _| {
//!             c.value += 1;
//!             Ok(())
//!         })
//!         .label("inc")
//!         .guard(|c: &Counter, _| c.value < 2),
//!     )
//!     .build()
//!     .unwrap();
//!
//! let init = adapter.initial_states().unwrap();
//! assert_eq!(init, vec![StateSnapshot::new(0)]);
//!
//! let next = adapter.successors(&init[0]).unwrap();
//! assert_eq!(next.len(), 1);
//! assert_eq!(next[0].0, StateSnapshot::new(1));
//! assert!(next[0].1.contains("inc"));
//! ```

use crate::error::{ActionError, AdapterError, BuilderError};
use crate::scope::Scope;
use crate::snapshot::StateSnapshot;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use std::fmt::{self, Debug};
use std::hash::Hash;
use tracing::trace;

/// Labels attached to a transition.
pub type LabelSet = BTreeSet<String>;

/// An explorable transition relation.
///
/// Implementations must be deterministic: for a fixed state, repeated calls
/// to [`successors`](Adapter::successors) yield the same multiset of
/// `(next, labels)` pairs. Exploration only terminates when the reachable
/// state set is finite.
pub trait Adapter {
    /// The state type. Equal states are the same node of the graph.
    type State: Clone + Eq + Hash + Debug;

    /// The states the system starts in.
    fn initial_states(&self) -> Result<Vec<Self::State>, AdapterError>;

    /// All labeled transitions leaving `state`.
    fn successors(&self, state: &Self::State)
        -> Result<Vec<(Self::State, LabelSet)>, AdapterError>;
}

impl<A: Adapter + ?Sized> Adapter for &A {
    type State = A::State;

    fn initial_states(&self) -> Result<Vec<Self::State>, AdapterError> {
        (**self).initial_states()
    }

    fn successors(
        &self,
        state: &Self::State,
    ) -> Result<Vec<(Self::State, LabelSet)>, AdapterError> {
        (**self).successors(state)
    }
}

/// Snapshot and restore implemented by the type under test itself.
///
/// Use [`ImplAdapter::rehydrating`] to build an adapter from it.
pub trait Rehydrate: Sized {
    /// The comparable representation of an instance's observable state.
    type Snapshot;

    /// Capture the observable state.
    fn snapshot(&self) -> Result<Self::Snapshot, AdapterError>;

    /// Overwrite the observable state. After `restore(s)` the instance must
    /// snapshot back to exactly `s`.
    fn restore(&mut self, snapshot: &Self::Snapshot) -> Result<(), AdapterError>;
}

/// Ordered parameter tuple passed to an action.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Args(Vec<serde_json::Value>);

impl Args {
    pub fn new(values: Vec<serde_json::Value>) -> Self {
        Self(values)
    }

    /// The empty tuple.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn values(&self) -> &[serde_json::Value] {
        &self.0
    }

    /// Read argument `index` as a `T`.
    pub fn get<T: DeserializeOwned>(&self, index: usize) -> Result<T, ActionError> {
        let value = self.0.get(index).ok_or_else(|| ActionError::Arity {
            expected: index.saturating_add(1),
            found: self.0.len(),
        })?;
        T::deserialize(value).map_err(|e| ActionError::InvalidArgument {
            index,
            reason: e.to_string(),
        })
    }

    /// Fail unless the tuple has exactly `expected` elements.
    pub fn expect_arity(&self, expected: usize) -> Result<(), ActionError> {
        if self.0.len() != expected {
            return Err(ActionError::Arity {
                expected,
                found: self.0.len(),
            });
        }
        Ok(())
    }
}

impl From<Vec<serde_json::Value>> for Args {
    fn from(values: Vec<serde_json::Value>) -> Self {
        Self(values)
    }
}

impl FromIterator<serde_json::Value> for Args {
    fn from_iter<It: IntoIterator<Item = serde_json::Value>>(iter: It) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Build an [`Args`] tuple from values convertible into JSON.
///
/// ```
/// let args = ctl_connect::args![5, "alice", true];
/// assert_eq!(args.len(), 3);
/// assert_eq!(args.get::<String>(1).unwrap(), "alice");
/// ```
#[macro_export]
macro_rules! args {
    () => {
        $crate::Args::empty()
    };
    ($($value:expr),+ $(,)?) => {
        $crate::Args::new(vec![
            $( ::core::convert::Into::<$crate::__private::serde_json::Value>::into($value) ),+
        ])
    };
}

type ParamSource = Box<dyn Fn() -> Vec<Args> + Send + Sync>;
type Guard<I> = Box<dyn Fn(&I, &Args) -> bool + Send + Sync>;
type Invoke<I> = Box<dyn Fn(&mut I, &Args) -> Result<(), ActionError> + Send + Sync>;

/// One invokable operation of the implementation under test.
///
/// Defaults: the label is the action name, the parameter source yields a
/// single empty tuple, and the guard always holds.
pub struct ActionSpec<I> {
    name: String,
    label: String,
    params: ParamSource,
    guard: Option<Guard<I>>,
    invoke: Invoke<I>,
}

impl<I: 'static> ActionSpec<I> {
    pub fn new(
        name: impl Into<String>,
        invoke: impl Fn(&mut I, &Args) -> Result<(), ActionError> + Send + Sync + 'static,
    ) -> Self {
        let name = name.into();
        Self {
            label: name.clone(),
            name,
            params: Box::new(|| vec![Args::empty()]),
            guard: None,
            invoke: Box::new(invoke),
        }
    }

    /// Label emitted on transitions produced by this action.
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Use a fixed, finite list of parameter tuples.
    pub fn params(mut self, params: impl IntoIterator<Item = Args>) -> Self {
        let params: Vec<Args> = params.into_iter().collect();
        self.params = Box::new(move || params.clone());
        self
    }

    /// Generate parameter tuples on every expansion. The generator must
    /// yield finitely many tuples.
    pub fn param_source(mut self, source: impl Fn() -> Vec<Args> + Send + Sync + 'static) -> Self {
        self.params = Box::new(source);
        self
    }

    /// Only attempt the action when `guard` holds on the probe instance.
    pub fn guard(mut self, guard: impl Fn(&I, &Args) -> bool + Send + Sync + 'static) -> Self {
        self.guard = Some(Box::new(guard));
        self
    }
}

impl<I> ActionSpec<I> {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn label_name(&self) -> &str {
        &self.label
    }

    fn allows(&self, probe: &I, args: &Args) -> bool {
        self.guard.as_ref().map_or(true, |guard| guard(probe, args))
    }
}

impl<I> Debug for ActionSpec<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionSpec")
            .field("name", &self.name)
            .field("label", &self.label)
            .field("guarded", &self.guard.is_some())
            .finish_non_exhaustive()
    }
}

/// Outcome of trying one `(action, args)` pair from a state.
#[derive(Debug, Clone, PartialEq)]
pub enum Attempt<S> {
    /// The guard excluded these arguments; the action was never invoked.
    GuardBlocked,
    /// The implementation rejected the call. No transition.
    Rejected(ActionError),
    /// The call succeeded and the instance ended up in this state.
    Transition(S),
}

impl<S> Attempt<S> {
    pub fn is_transition(&self) -> bool {
        matches!(self, Attempt::Transition(_))
    }
}

/// An [`Attempt`] together with what was attempted.
#[derive(Debug, Clone, PartialEq)]
pub struct AttemptRecord<S> {
    pub action: String,
    pub label: String,
    pub args: Args,
    pub outcome: Attempt<S>,
}

type Factory<I> = Box<dyn Fn() -> Result<I, AdapterError> + Send + Sync>;
type SnapshotFn<I, T> = Box<dyn Fn(&I) -> Result<T, AdapterError> + Send + Sync>;
type RestoreFn<I, T> = Box<dyn Fn(&mut I, &T) -> Result<(), AdapterError> + Send + Sync>;

/// Adapter over an implementation type `I` whose observable state
/// snapshots into `T`.
///
/// Every observation starts from a fresh instance restored to the source
/// state: guards run on a dedicated probe instance, and each invocation
/// gets its own instance, which is discarded afterwards. A rejected call
/// therefore never leaks partial mutations into other attempts.
pub struct ImplAdapter<I, T> {
    factory: Factory<I>,
    snapshot: SnapshotFn<I, T>,
    restore: RestoreFn<I, T>,
    actions: Vec<ActionSpec<I>>,
}

impl<I: 'static, T: 'static> ImplAdapter<I, T> {
    pub fn builder() -> ImplAdapterBuilder<I, T> {
        ImplAdapterBuilder::default()
    }
}

impl<I, T> ImplAdapter<I, T>
where
    I: Rehydrate<Snapshot = T> + 'static,
    T: 'static,
{
    /// Builder with snapshot and restore taken from [`Rehydrate`].
    pub fn rehydrating(factory: impl Fn() -> I + Send + Sync + 'static) -> ImplAdapterBuilder<I, T> {
        ImplAdapterBuilder::default()
            .factory(factory)
            .snapshot(|inst: &I| inst.snapshot())
            .restore(|inst: &mut I, snap: &T| inst.restore(snap))
    }
}

impl<I, T> ImplAdapter<I, T> {
    pub fn actions(&self) -> &[ActionSpec<I>] {
        &self.actions
    }

    pub fn action(&self, name: &str) -> Option<&ActionSpec<I>> {
        self.actions.iter().find(|a| a.name == name)
    }

    fn rehydrate(&self, state: &StateSnapshot<T>) -> Result<I, AdapterError> {
        let mut inst = (self.factory)()?;
        (self.restore)(&mut inst, state.data())?;
        Ok(inst)
    }

    /// Invoke `action` with `args` on a fresh instance restored to `state`.
    ///
    /// The guard is not consulted here; see [`attempts`](Self::attempts).
    pub fn invoke(
        &self,
        state: &StateSnapshot<T>,
        action: &ActionSpec<I>,
        args: &Args,
    ) -> Result<Attempt<StateSnapshot<T>>, AdapterError> {
        let mut inst = self.rehydrate(state)?;
        match (action.invoke)(&mut inst, args) {
            Ok(()) => Ok(Attempt::Transition(StateSnapshot::new((self.snapshot)(&inst)?))),
            Err(e) => Ok(Attempt::Rejected(e)),
        }
    }

    /// Every `(action, args)` pair tried from `state`, with its outcome.
    pub fn attempts(
        &self,
        state: &StateSnapshot<T>,
    ) -> Result<Vec<AttemptRecord<StateSnapshot<T>>>, AdapterError>
    where
        T: Debug,
    {
        let mut records = Vec::new();
        if self.actions.is_empty() {
            return Ok(records);
        }

        let probe = self.rehydrate(state)?;

        for action in &self.actions {
            for args in (action.params)() {
                let outcome = if action.allows(&probe, &args) {
                    self.invoke(state, action, &args)?
                } else {
                    Attempt::GuardBlocked
                };

                if let Attempt::Rejected(ref reason) = outcome {
                    trace!(
                        action = %action.name,
                        ?args,
                        ?state,
                        %reason,
                        "Action rejected"
                    );
                }

                records.push(AttemptRecord {
                    action: action.name.clone(),
                    label: action.label.clone(),
                    args,
                    outcome,
                });
            }
        }

        Ok(records)
    }
}

impl<I, T> Adapter for ImplAdapter<I, T>
where
    T: Clone + Eq + Hash + Debug,
{
    type State = StateSnapshot<T>;

    fn initial_states(&self) -> Result<Vec<Self::State>, AdapterError> {
        let inst = (self.factory)()?;
        Ok(vec![StateSnapshot::new((self.snapshot)(&inst)?)])
    }

    fn successors(
        &self,
        state: &Self::State,
    ) -> Result<Vec<(Self::State, LabelSet)>, AdapterError> {
        Ok(self
            .attempts(state)?
            .into_iter()
            .filter_map(|record| match record.outcome {
                Attempt::Transition(next) => Some((next, LabelSet::from([record.label]))),
                Attempt::GuardBlocked | Attempt::Rejected(_) => None,
            })
            .collect())
    }
}

impl<I, T> Debug for ImplAdapter<I, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImplAdapter")
            .field("actions", &self.actions)
            .finish_non_exhaustive()
    }
}

/// Builder for [`ImplAdapter`]. Validates the action catalog on `build()`.
pub struct ImplAdapterBuilder<I, T> {
    factory: Option<Factory<I>>,
    snapshot: Option<SnapshotFn<I, T>>,
    restore: Option<RestoreFn<I, T>>,
    actions: Vec<ActionSpec<I>>,
    scope: Option<Scope>,
}

impl<I, T> Default for ImplAdapterBuilder<I, T> {
    fn default() -> Self {
        Self {
            factory: None,
            snapshot: None,
            restore: None,
            actions: Vec::new(),
            scope: None,
        }
    }
}

impl<I: 'static, T: 'static> ImplAdapterBuilder<I, T> {
    /// Infallible constructor for fresh instances.
    pub fn factory(mut self, factory: impl Fn() -> I + Send + Sync + 'static) -> Self {
        self.factory = Some(Box::new(move || Ok(factory())));
        self
    }

    /// Fallible constructor for fresh instances.
    pub fn try_factory(
        mut self,
        factory: impl Fn() -> Result<I, AdapterError> + Send + Sync + 'static,
    ) -> Self {
        self.factory = Some(Box::new(factory));
        self
    }

    pub fn snapshot(
        mut self,
        snapshot: impl Fn(&I) -> Result<T, AdapterError> + Send + Sync + 'static,
    ) -> Self {
        self.snapshot = Some(Box::new(snapshot));
        self
    }

    pub fn restore(
        mut self,
        restore: impl Fn(&mut I, &T) -> Result<(), AdapterError> + Send + Sync + 'static,
    ) -> Self {
        self.restore = Some(Box::new(restore));
        self
    }

    pub fn action(mut self, action: ActionSpec<I>) -> Self {
        self.actions.push(action);
        self
    }

    pub fn actions(mut self, actions: impl IntoIterator<Item = ActionSpec<I>>) -> Self {
        self.actions.extend(actions);
        self
    }

    /// Require every action to name a function of `scope`.
    pub fn scope(mut self, scope: Scope) -> Self {
        self.scope = Some(scope);
        self
    }

    pub fn build(self) -> Result<ImplAdapter<I, T>, BuilderError> {
        let factory = self.factory.ok_or(BuilderError::MissingRequiredField {
            builder: "ImplAdapterBuilder",
            field: "factory",
        })?;
        let snapshot = self.snapshot.ok_or(BuilderError::MissingRequiredField {
            builder: "ImplAdapterBuilder",
            field: "snapshot",
        })?;
        let restore = self.restore.ok_or(BuilderError::MissingRequiredField {
            builder: "ImplAdapterBuilder",
            field: "restore",
        })?;

        let mut seen = HashSet::new();
        for action in &self.actions {
            if action.name.is_empty() {
                return Err(BuilderError::EmptyActionName);
            }
            if !seen.insert(action.name.as_str()) {
                return Err(BuilderError::DuplicateAction(action.name.clone()));
            }
            if let Some(ref scope) = self.scope {
                if scope.function(&action.name).is_none() {
                    return Err(BuilderError::UnknownAction(action.name.clone()));
                }
            }
        }

        Ok(ImplAdapter {
            factory,
            snapshot,
            restore,
            actions: self.actions,
        })
    }
}
