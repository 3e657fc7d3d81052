//! Typed errors for ctl-connect.
//!
//! One enum per stage (adapter, exploration, encoding, checking), all
//! folded into [`Error`]. Action rejections live in [`ActionError`] and
//! never escape exploration.

use thiserror::Error;

/// Top-level error type for ctl-connect operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// The adapter contract broke (construction, restore or snapshot).
    #[error("Adapter error: {0}")]
    Adapter(#[from] AdapterError),

    /// Error during state-space exploration.
    #[error("Exploration error: {0}")]
    Explore(#[from] ExploreError),

    /// Error while encoding a model into a Kripke structure.
    #[error("Encoding error: {0}")]
    Encoding(#[from] EncodingError),

    /// Error reported by the temporal-logic engine.
    #[error("Check error: {0}")]
    Check(#[from] CheckError),

    /// Invalid property suite.
    #[error("Property error: {0}")]
    Property(#[from] PropertyError),

    /// Invalid builder input.
    #[error("Builder error: {0}")]
    Builder(#[from] BuilderError),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Failure of the adapter contract itself.
///
/// These abort the whole build: once an instance cannot be constructed or
/// faithfully restored, no further observation can be trusted.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AdapterError {
    /// The factory failed to produce a fresh instance.
    #[error("Failed to construct instance: {0}")]
    Construction(String),

    /// Restoring an instance to a snapshot failed.
    #[error("Failed to restore snapshot {state}: {reason}")]
    Restore { state: String, reason: String },

    /// Taking a snapshot of an instance failed.
    #[error("Failed to snapshot instance: {0}")]
    Snapshot(String),
}

/// Failure raised by an action closure.
///
/// Never propagated out of `successors`: the attempt is recorded as
/// rejected and contributes no transition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum ActionError {
    /// The implementation refused the call in its current state.
    #[error("Rejected: {0}")]
    Rejected(String),

    /// An argument could not be read as the expected type.
    #[error("Invalid argument {index}: {reason}")]
    InvalidArgument { index: usize, reason: String },

    /// The parameter tuple has the wrong length.
    #[error("Expected {expected} arguments, got {found}")]
    Arity { expected: usize, found: usize },
}

/// Error during state-space exploration.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ExploreError {
    /// More states were discovered than the configured bound allows.
    #[error("State limit of {limit} exceeded")]
    StateLimit { limit: usize },
}

/// A model handed to the encoder violates reachability closure.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum EncodingError {
    /// A transition points at a state that is not in the state set.
    #[error("Transition {from} -> {to} targets a state outside the model")]
    UnknownDestination { from: String, to: String },

    /// A transition source is not in the state set.
    #[error("Transition source {0} is not a state of the model")]
    UnknownSource(String),

    /// An initial state is not in the state set.
    #[error("Initial state {0} is not a state of the model")]
    UnknownInitial(String),
}

/// Error reported while checking properties.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CheckError {
    /// The engine failed to evaluate a formula.
    #[error("Engine failed on property '{property}': {reason}")]
    Engine { property: String, reason: String },

    /// The engine returned a state id outside the structure.
    #[error("Engine returned unknown state {id} for property '{property}'")]
    UnknownState { property: String, id: usize },
}

/// Error in a property suite.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PropertyError {
    /// A property has an empty name.
    #[error("Empty property name in '{category}'")]
    EmptyName { category: &'static str },

    /// Two properties share a name.
    #[error("Duplicate property name: {0}")]
    DuplicateName(String),
}

/// Error from a configuration or adapter builder.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum BuilderError {
    /// A required builder field was not set.
    #[error("{builder}: missing required field '{field}'")]
    MissingRequiredField {
        builder: &'static str,
        field: &'static str,
    },

    /// A limit was set to zero.
    #[error("{builder}: '{field}' must be at least 1")]
    ZeroLimit {
        builder: &'static str,
        field: &'static str,
    },

    /// An action was declared with an empty name.
    #[error("Action names must not be empty")]
    EmptyActionName,

    /// Two actions share a name.
    #[error("Duplicate action: {0}")]
    DuplicateAction(String),

    /// The action is not among the scope's invokable functions.
    #[error("Action '{0}' is not a function of the scope")]
    UnknownAction(String),
}

/// Result type alias using ctl-connect's Error.
pub type ConnectResult<T> = std::result::Result<T, Error>;
