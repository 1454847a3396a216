//! Typed IDs
//!
//! UUID wrappers tagged with a marker type so a `WebhookId` can never be
//! passed where a `ProjectId` is expected.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use uuid::Uuid;

/// UUID tagged with an entity marker
///
/// ```
/// use kernel::id::{Id, markers};
/// type ProjectId = Id<markers::Project>;
/// let id = ProjectId::new();
/// assert_eq!(ProjectId::from_uuid(id.into_uuid()), id);
/// ```
pub struct Id<T> {
    value: Uuid,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Id<T> {
    /// Random ID (UUID v4)
    pub fn new() -> Self {
        Self::from_uuid(Uuid::new_v4())
    }

    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self {
            value: uuid,
            _marker: PhantomData,
        }
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.value
    }

    pub fn into_uuid(self) -> Uuid {
        self.value
    }
}

// Manual impls: markers are bare unit structs and must not need derives.
impl<T> Clone for Id<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Id<T> {}

impl<T> PartialEq for Id<T> {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl<T> Eq for Id<T> {}

impl<T> Hash for Id<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.value.hash(state);
    }
}

impl<T> Default for Id<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Id({})", self.value)
    }
}

impl<T> fmt::Display for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}

impl<T> From<Uuid> for Id<T> {
    fn from(uuid: Uuid) -> Self {
        Self::from_uuid(uuid)
    }
}

impl<T> From<Id<T>> for Uuid {
    fn from(id: Id<T>) -> Self {
        id.value
    }
}

/// Entity markers
pub mod markers {
    pub struct Project;
    pub struct Webhook;
    pub struct WebhookDelivery;
    /// Event identifier embedded in webhook envelopes (receiver dedupe key)
    pub struct WebhookEvent;
}

pub type ProjectId = Id<markers::Project>;
pub type WebhookId = Id<markers::Webhook>;
pub type WebhookDeliveryId = Id<markers::WebhookDelivery>;
pub type WebhookEventId = Id<markers::WebhookEvent>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_id_roundtrips_uuid() {
        let uuid = Uuid::new_v4();
        let id: WebhookId = Id::from_uuid(uuid);
        assert_eq!(id.as_uuid(), &uuid);
        assert_eq!(Uuid::from(id), uuid);
    }

    #[test]
    fn test_id_is_copy_and_hashable() {
        let id = ProjectId::new();
        let copy = id;
        let mut set = HashSet::new();
        set.insert(id);
        assert!(set.contains(&copy));
    }

    #[test]
    fn test_display_is_bare_uuid() {
        let uuid = Uuid::nil();
        let id: WebhookDeliveryId = uuid.into();
        assert_eq!(id.to_string(), "00000000-0000-0000-0000-000000000000");
    }
}
