//! Interface metadata produced by a contract introspector.
//!
//! The crate never parses source code. A `Scope` is handed in by whatever
//! tool inspected the implementation, and is used to check that an
//! adapter's action catalog only names functions that actually exist.

use crate::error::Error;
use serde::{Deserialize, Serialize};

/// Invokable functions and state variables of an implementation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scope {
    #[serde(default)]
    pub functions: Vec<FunctionSig>,

    #[serde(default)]
    pub state_variables: Vec<StateVariable>,
}

/// A public or external function.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionSig {
    pub name: String,

    #[serde(default)]
    pub params: Vec<Param>,
}

/// A function parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Param {
    #[serde(rename = "type")]
    pub ty: String,
    pub name: String,
}

/// A state variable. The type may be unknown to the introspector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateVariable {
    pub name: String,

    #[serde(rename = "type", default)]
    pub ty: Option<String>,
}

impl Scope {
    /// Parse a scope from the introspector's JSON output.
    pub fn from_json(json: &str) -> Result<Self, Error> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn function(&self, name: &str) -> Option<&FunctionSig> {
        self.functions.iter().find(|f| f.name == name)
    }

    pub fn state_variable(&self, name: &str) -> Option<&StateVariable> {
        self.state_variables.iter().find(|v| v.name == name)
    }

    pub fn function_names(&self) -> impl Iterator<Item = &str> {
        self.functions.iter().map(|f| f.name.as_str())
    }
}
