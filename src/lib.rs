//! ctl-connect: explicit-state model construction for CTL-based
//! model testing of Rust implementations.
//!
//! Turns a stateful implementation into a finite labeled transition system
//! by replaying its operations on rehydrated instances, then hands the
//! result to a temporal-logic engine:
//!
//! 1. **Adapt**: an [`ImplAdapter`] wraps the type under test with
//!    snapshot/restore functions and a catalog of [`ActionSpec`]s.
//! 2. **Explore**: a [`StateGraphBuilder`] computes the reachable [`Model`],
//!    either of one adapter or of the synchronized product of two adapters
//!    under an [`Equivalence`] (to check that two implementations agree).
//! 3. **Encode**: the [`StructureEncoder`] flattens the model into a total
//!    [`Kripke`] structure whose states are labeled by the actions that led
//!    into them.
//! 4. **Check**: a [`ModelChecker`] evaluates a [`PropertySuite`] through a
//!    user-supplied [`CtlEngine`].
//!
//! # Quick Start
//!
//! ```
//! use ctl_connect::*;
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
//!     .build()?;
//!
//! let model = StateGraphBuilder::new().build(&adapter)?;
//! assert_eq!(model.state_count(), 3);
//!
//! let kripke = StructureEncoder::new().encode(&model)?;
//! assert!(kripke.is_total());
//! # Ok::<(), ctl_connect::Error>(())
//! ```

pub mod adapter;
mod builder;
pub mod checker;
pub mod encoder;
pub mod error;
pub mod explore;
pub mod model;
pub mod properties;
pub mod scope;
pub mod snapshot;

// Re-export core types for convenience
pub use adapter::{
    ActionSpec, Adapter, Args, Attempt, AttemptRecord, ImplAdapter, ImplAdapterBuilder, LabelSet,
    Rehydrate,
};
pub use checker::{CheckReport, CtlEngine, ModelChecker, PropertyResult};
pub use encoder::{Kripke, StateId, StructureEncoder};
pub use error::{
    ActionError, AdapterError, BuilderError, CheckError, ConnectResult, EncodingError, Error,
    ExploreError, PropertyError,
};
pub use explore::{Equivalence, ExploreConfig, ExploreConfigBuilder, StateGraphBuilder, StructuralEq};
pub use model::Model;
pub use properties::{Property, PropertyKind, PropertySuite};
pub use scope::{FunctionSig, Param, Scope, StateVariable};
pub use snapshot::StateSnapshot;

#[doc(hidden)]
pub mod __private {
    pub use serde_json;
}
