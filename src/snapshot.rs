//! Immutable state snapshots.

use serde::{Deserialize, Serialize};
use std::fmt;

/// An observed state of an implementation instance.
///
/// Wraps whatever representation the snapshot function produces. Equality
/// and hashing are structural over the wrapped data, so two instances that
/// snapshot to equal data are the same node of the state graph.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StateSnapshot<T> {
    data: T,
}

impl<T> StateSnapshot<T> {
    pub fn new(data: T) -> Self {
        Self { data }
    }

    pub fn data(&self) -> &T {
        &self.data
    }

    pub fn into_inner(self) -> T {
        self.data
    }
}

impl<T> From<T> for StateSnapshot<T> {
    fn from(data: T) -> Self {
        Self::new(data)
    }
}

impl<T: fmt::Debug> fmt::Debug for StateSnapshot<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("State").field(&self.data).finish()
    }
}

