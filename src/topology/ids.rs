//! Positional identifiers for mesh entities.
//!
//! Every entity in a [`CanonicalMesh`](crate::mesh::CanonicalMesh) is
//! identified by its position in the owning table. The newtypes below keep
//! node, face and cell indices from being mixed up at compile time while
//! remaining plain `usize` values at runtime.

use std::fmt;

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
        )]
        #[repr(transparent)]
        #[serde(transparent)]
        pub struct $name(usize);

        impl $name {
            /// Wraps a raw table index.
            #[inline]
            pub const fn new(index: usize) -> Self {
                Self(index)
            }

            /// Returns the raw table index.
            #[inline]
            pub const fn index(self) -> usize {
                self.0
            }
        }

        impl From<usize> for $name {
            #[inline]
            fn from(index: usize) -> Self {
                Self(index)
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.debug_tuple(stringify!($name)).field(&self.0).finish()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

entity_id!(
    /// Index into the node table.
    NodeId
);
entity_id!(
    /// Index into the face table.
    FaceId
);
entity_id!(
    /// Index into the cell table.
    CellId
);

/// The three entity tables of a mesh.
#[derive(
    Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub enum EntityKind {
    Node,
    Face,
    Cell,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EntityKind::Node => "node",
            EntityKind::Face => "face",
            EntityKind::Cell => "cell",
        };
        f.write_str(name)
    }
}

/// A typed reference to one entity, used in diagnostics.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Entity {
    Node(NodeId),
    Face(FaceId),
    Cell(CellId),
}

impl Entity {
    pub fn kind(self) -> EntityKind {
        match self {
            Entity::Node(_) => EntityKind::Node,
            Entity::Face(_) => EntityKind::Face,
            Entity::Cell(_) => EntityKind::Cell,
        }
    }

    pub fn index(self) -> usize {
        match self {
            Entity::Node(id) => id.index(),
            Entity::Face(id) => id.index(),
            Entity::Cell(id) => id.index(),
        }
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind(), self.index())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_and_display() {
        let n = NodeId::new(7);
        assert_eq!(format!("{n:?}"), "NodeId(7)");
        assert_eq!(format!("{n}"), "7");
        assert_eq!(Entity::Cell(CellId::new(3)).to_string(), "cell 3");
    }

    #[test]
    fn serde_is_transparent() {
        let json = serde_json::to_string(&FaceId::new(12)).expect("serialize");
        assert_eq!(json, "12");
        let back: FaceId = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, FaceId::new(12));
    }
}
