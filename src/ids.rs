//! Typed ID wrappers for the two halves of an object address.
//!
//! An object is addressed by the scope (channel) that owns it plus its own
//! id within that scope. The newtypes keep the two from being swapped in
//! call sites that take both.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Identifier of the scope (channel) an object belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScopeId(i64);

impl ScopeId {
    pub fn get(&self) -> i64 {
        self.0
    }
}

impl From<i64> for ScopeId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl FromStr for ScopeId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse().map(Self)
    }
}

impl std::fmt::Display for ScopeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of one object within its scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectId(i64);

impl ObjectId {
    pub fn get(&self) -> i64 {
        self.0
    }
}

impl From<i64> for ObjectId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl FromStr for ObjectId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse().map(Self)
    }
}

impl std::fmt::Display for ObjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
