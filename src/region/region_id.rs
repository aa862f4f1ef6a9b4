use std::{borrow::Borrow, fmt, sync::Arc};

use serde::{Serialize, Serializer};

/// Stable key for a region (ISO3-like country code).
/// Cheap to clone so it can be carried by every result record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RegionId(Arc<str>);

impl RegionId {
    pub fn new(id: &str) -> Self { Self(Arc::from(id.trim())) }

    #[inline] pub fn as_str(&self) -> &str { &self.0 }
}

impl From<&str> for RegionId {
    fn from(id: &str) -> Self { Self::new(id) }
}

impl From<String> for RegionId {
    fn from(id: String) -> Self { Self::new(&id) }
}

impl Borrow<str> for RegionId {
    fn borrow(&self) -> &str { &self.0 }
}

impl fmt::Display for RegionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}

impl Serialize for RegionId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}
