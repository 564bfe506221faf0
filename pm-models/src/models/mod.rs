//! Entity model definitions.

use serde::{Deserialize, Deserializer};

pub mod landlord;
pub mod property;
pub mod tenant;
pub mod contractor;
pub mod issue;

/// Deserialize a field that distinguishes "absent" from an explicit `null`.
///
/// Use with `#[serde(default, deserialize_with = "double_option")]`: a missing
/// key stays `None`, `null` becomes `Some(None)`, and a value becomes
/// `Some(Some(v))`.
pub fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
