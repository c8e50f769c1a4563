//! Merge-patch field helpers.
//!
//! A patch field is `Option<Option<T>>`: `None` when the key was absent,
//! `Some(None)` for an explicit `null`, `Some(Some(v))` for a value.

use serde::{Deserialize, Deserializer};

pub fn double_option<'de, T, D>(de: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(de).map(Some)
}

/// Overwrite `target` only when the patch carried the key.
pub fn apply<T>(target: &mut Option<T>, patch: Option<Option<T>>) {
    if let Some(value) = patch {
        *target = value;
    }
}
