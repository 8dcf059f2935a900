//! Entity trait: a persisted document with a stable identity.

/// Minimal interface shared by every stored document.
pub trait Entity {
    /// Strongly-typed document identifier.
    type Id: Copy + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the document identifier.
    fn id(&self) -> &Self::Id;
}
