//! Typed property bags.
//!
//! Messages, exchanges, and handler contexts all carry a string-keyed bag of
//! ad hoc properties next to their typed core fields. The bag stores
//! type-erased values and exposes typed accessors, so callers never cast by
//! hand and never accumulate unbounded stringly-typed state.

use std::any::Any;
use std::collections::HashMap;

/// Well-known property keys shared across the runtime.
///
/// Interceptors and handlers introspect these keys to learn which direction
/// a message is travelling and which side of the call they are running on.
pub mod keys {
    /// `bool`, `true` while the message travels from caller to transport.
    pub const MESSAGE_OUTBOUND: &str = "message.outbound";

    /// `bool`, `true` on the requestor (client) side of the exchange.
    pub const REQUESTOR_ROLE: &str = "message.requestor_role";

    /// `bool`, set when handler mediation reversed direction mid-call.
    pub const DIRECTION_REVERSED: &str = "message.direction_reversed";

    /// Operation metadata resolved for this exchange
    /// (an `Arc<BindingOperationInfo>`).
    pub const OPERATION_INFO: &str = "exchange.operation";
}

/// A string-keyed bag of type-erased properties.
///
/// Values are stored as `Box<dyn Any + Send + Sync>` and retrieved through
/// typed accessors. Lookups are keyed by name only; storing a value of a
/// different type under an existing key replaces the old value.
///
/// # Example
///
/// ```
/// use hermes_core::PropertyBag;
///
/// let mut bag = PropertyBag::new();
/// bag.set("retries", 3u32);
/// assert_eq!(bag.get::<u32>("retries"), Some(&3));
/// assert!(bag.get::<String>("retries").is_none());
/// ```
#[derive(Default)]
pub struct PropertyBag {
    entries: HashMap<String, Box<dyn Any + Send + Sync>>,
}

impl PropertyBag {
    /// Creates an empty property bag.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a value under the given key, replacing any previous value.
    pub fn set<T: Send + Sync + 'static>(&mut self, key: impl Into<String>, value: T) {
        self.entries.insert(key.into(), Box::new(value));
    }

    /// Returns a reference to the value stored under `key`, if it exists
    /// and has the requested type.
    #[must_use]
    pub fn get<T: 'static>(&self, key: &str) -> Option<&T> {
        self.entries.get(key).and_then(|v| v.downcast_ref())
    }

    /// Returns a mutable reference to the value stored under `key`.
    pub fn get_mut<T: 'static>(&mut self, key: &str) -> Option<&mut T> {
        self.entries.get_mut(key).and_then(|v| v.downcast_mut())
    }

    /// Removes and returns the value stored under `key`.
    ///
    /// Returns `None` if the key is absent or holds a different type; a
    /// mistyped removal leaves the entry in place.
    pub fn remove<T: 'static>(&mut self, key: &str) -> Option<T> {
        if self.entries.get(key)?.downcast_ref::<T>().is_none() {
            return None;
        }
        self.entries
            .remove(key)
            .and_then(|v| v.downcast().ok())
            .map(|b| *b)
    }

    /// Returns `true` if a value is stored under `key` (of any type).
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Reads a boolean property, treating an absent or mistyped entry
    /// as `false`.
    ///
    /// Direction checks (`keys::MESSAGE_OUTBOUND` and friends) go through
    /// this accessor.
    #[must_use]
    pub fn flag(&self, key: &str) -> bool {
        self.get::<bool>(key).copied().unwrap_or(false)
    }

    /// Returns the number of stored properties.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the bag holds no properties.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over the stored keys in arbitrary order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

impl std::fmt::Debug for PropertyBag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Values are type-erased, so only the keys are shown.
        f.debug_set().entries(self.entries.keys()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_get_typed() {
        let mut bag = PropertyBag::new();
        bag.set("count", 7u64);
        bag.set("label", "hello".to_string());

        assert_eq!(bag.get::<u64>("count"), Some(&7));
        assert_eq!(bag.get::<String>("label").map(String::as_str), Some("hello"));
        assert!(bag.get::<u64>("label").is_none(), "wrong type must miss");
        assert!(bag.get::<u64>("missing").is_none());
    }

    #[test]
    fn test_set_replaces_previous_value() {
        let mut bag = PropertyBag::new();
        bag.set("key", 1u32);
        bag.set("key", 2u32);
        assert_eq!(bag.get::<u32>("key"), Some(&2));
        assert_eq!(bag.len(), 1);
    }

    #[test]
    fn test_remove() {
        let mut bag = PropertyBag::new();
        bag.set("key", 42i32);

        // Mistyped removal leaves the entry in place.
        assert!(bag.remove::<String>("key").is_none());
        assert!(bag.contains("key"));

        assert_eq!(bag.remove::<i32>("key"), Some(42));
        assert!(!bag.contains("key"));
    }

    #[test]
    fn test_get_mut() {
        let mut bag = PropertyBag::new();
        bag.set("count", 1u32);
        *bag.get_mut::<u32>("count").unwrap() += 1;
        assert_eq!(bag.get::<u32>("count"), Some(&2));
    }

    #[test]
    fn test_flag_defaults_to_false() {
        let mut bag = PropertyBag::new();
        assert!(!bag.flag(keys::MESSAGE_OUTBOUND));

        bag.set(keys::MESSAGE_OUTBOUND, true);
        assert!(bag.flag(keys::MESSAGE_OUTBOUND));

        bag.set(keys::MESSAGE_OUTBOUND, "not a bool");
        assert!(!bag.flag(keys::MESSAGE_OUTBOUND), "mistyped flag reads false");
    }

    #[test]
    fn test_debug_shows_keys_only() {
        let mut bag = PropertyBag::new();
        bag.set("visible", 1u8);
        let rendered = format!("{bag:?}");
        assert!(rendered.contains("visible"));
    }
}
