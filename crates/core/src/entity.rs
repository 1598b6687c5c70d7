//! Entity trait: identity + continuity.

/// Entity marker + minimal interface.
///
/// Inventory records are entities: two records with identical quantities are
/// still distinct entries in the log.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Copy + Eq + Ord + core::hash::Hash + core::fmt::Debug;

    /// Returns the entity identifier.
    fn id(&self) -> Self::Id;
}
