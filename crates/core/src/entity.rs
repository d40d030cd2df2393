//! Entity trait: identity + continuity across state changes.

use crate::error::{DomainError, DomainResult};

/// Entity marker + minimal interface.
///
/// Identity is assigned by the store on first persist. Until then an entity
/// exists only in memory and `id()` is `None`.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Copy + Eq + core::hash::Hash + core::fmt::Debug + core::fmt::Display;

    /// Returns the entity identifier, if one has been assigned.
    fn id(&self) -> Option<Self::Id>;

    /// Slot holding the identifier. Implementors expose their field here so
    /// `assign_id` can enforce write-once semantics in one place.
    fn id_slot(&mut self) -> &mut Option<Self::Id>;

    /// Assign the durable identifier. Identity is immutable once assigned.
    fn assign_id(&mut self, id: Self::Id) -> DomainResult<()> {
        let slot = self.id_slot();
        match *slot {
            Some(existing) if existing == id => Ok(()),
            Some(existing) => Err(DomainError::conflict(format!(
                "identifier already assigned ({existing}), refusing {id}"
            ))),
            None => {
                *slot = Some(id);
                Ok(())
            }
        }
    }
}
