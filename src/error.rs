use thiserror::Error;

/// Returned by [`HashMap::find`] when the requested key is not in the map.
///
/// This is the only failure the map reports. Every other operation is defined
/// for absent keys: [`HashMap::remove`] returns `None` and
/// [`HashMap::contains_key`] returns `false`.
///
/// [`HashMap::find`]: crate::HashMap::find
/// [`HashMap::remove`]: crate::HashMap::remove
/// [`HashMap::contains_key`]: crate::HashMap::contains_key
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[error("key not found")]
pub struct KeyNotFound;
