//! Core identifier newtypes with smart constructors.
//!
//! Row keys validate non-empty strings at construction time.
//! Raw constructors are never exported - use smart constructors only.

use std::fmt;
use std::sync::Arc;

/// Error returned when a row key is empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("row key must not be empty")]
pub struct InvalidRowKey;

/// Stable identity of a row within one pool.
///
/// Keys are shared (`Arc<str>`) so cloning one into the bounds index or the
/// pinned set never allocates.
///
/// # Contract
/// Callers must map logically distinct items to distinct keys. Two items that
/// share a key share one row; the engine does not detect this, because the
/// collision is always a bug in the key scheme and masking it would hide it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RowKey(Arc<str>);

impl RowKey {
    /// Smart constructor: validates non-empty key.
    ///
    /// ```
    /// # use vrows::model::RowKey;
    /// assert!(RowKey::new("storage/iron").is_ok());
    /// assert!(RowKey::new("").is_err());
    /// ```
    pub fn new(raw: impl AsRef<str>) -> Result<Self, InvalidRowKey> {
        let raw = raw.as_ref();
        if raw.is_empty() {
            return Err(InvalidRowKey);
        }
        Ok(Self(Arc::from(raw)))
    }

    /// Key from a non-empty string literal.
    pub(crate) fn literal(raw: &'static str) -> Self {
        debug_assert!(!raw.is_empty(), "row key literal must not be empty");
        Self(Arc::from(raw))
    }

    /// Key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RowKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::borrow::Borrow<str> for RowKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Identity of one constructed row instance.
///
/// Assigned from a per-pool counter when the row is constructed and never
/// reused, so two acquisitions returning the same `RowId` returned the same row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RowId(u64);

impl RowId {
    pub(crate) fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Raw serial number.
    pub fn get(&self) -> u64 {
        self.0
    }
}

/// Pool refresh generation. Incremented once per refresh pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Generation(u64);

impl Generation {
    /// Create a generation from a raw value.
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Raw value.
    pub fn get(&self) -> u64 {
        self.0
    }

    /// The following generation.
    pub fn next(&self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

/// Host frame counter passed to per-tick hooks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct FrameTick(u64);

impl FrameTick {
    /// Create a tick from a raw frame number.
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Raw frame number.
    pub fn get(&self) -> u64 {
        self.0
    }

    /// Frames elapsed since `earlier`, saturating at zero.
    pub fn since(&self, earlier: FrameTick) -> u64 {
        self.0.saturating_sub(earlier.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_key_rejects_empty() {
        assert_eq!(RowKey::new(""), Err(InvalidRowKey));
    }

    #[test]
    fn row_key_clone_shares_storage() {
        let a = RowKey::new("descriptor/0").unwrap();
        let b = a.clone();
        assert!(Arc::ptr_eq(&a.0, &b.0));
        assert_eq!(a, b);
    }

    #[test]
    fn row_key_displays_raw_string() {
        let key = RowKey::new("status/heat").unwrap();
        assert_eq!(key.to_string(), "status/heat");
        assert_eq!(key.as_str(), "status/heat");
    }

    #[test]
    fn row_key_borrows_as_str_for_lookups() {
        let mut set = std::collections::HashSet::new();
        set.insert(RowKey::new("a").unwrap());
        assert!(set.contains("a"));
    }

    #[test]
    fn generation_next_increments() {
        assert_eq!(Generation::default().next(), Generation::new(1));
    }

    #[test]
    fn frame_tick_since_saturates() {
        assert_eq!(FrameTick::new(10).since(FrameTick::new(4)), 6);
        assert_eq!(FrameTick::new(4).since(FrameTick::new(10)), 0);
    }
}
