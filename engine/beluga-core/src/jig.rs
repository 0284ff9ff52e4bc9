//! Jig identity and type data.

use std::fmt;

/// Index of a jig in the problem's jig registry. 0-based, stable for the
/// lifetime of the problem, never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JigId(pub usize);

impl fmt::Display for JigId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "jig{}", self.0)
    }
}

/// Index into the problem's jig-type table. The table is deduplicated by
/// name at load time, so id equality is name equality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeId(pub usize);

/// A kind of jig. The size a jig occupies on a rack depends on whether it
/// currently carries a part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JigType {
    pub name: String,
    pub size_empty: u32,
    pub size_loaded: u32,
}

impl JigType {
    pub fn new(name: impl Into<String>, size_empty: u32, size_loaded: u32) -> Self {
        Self {
            name: name.into(),
            size_empty,
            size_loaded,
        }
    }
}

/// A single jig instance: its type plus an empty/loaded flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Jig {
    pub jig_type: TypeId,
    pub empty: bool,
}

impl Jig {
    pub fn new(jig_type: TypeId, empty: bool) -> Self {
        Self { jig_type, empty }
    }
}
