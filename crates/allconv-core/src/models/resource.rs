use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use uuid::Uuid;

/// Opaque handle to bytes held by a resource registry.
///
/// Preview and download references are both `ResourceRef`s. A reference stays resolvable
/// until it is released; releasing it twice is harmless.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceRef(Uuid);

impl ResourceRef {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for ResourceRef {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for ResourceRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "resource:{}", self.0)
    }
}
