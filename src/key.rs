//! Cache Key Module
//!
//! Deterministic construction of cache keys from function identity and
//! call arguments.

use std::collections::BTreeMap;

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::error::{CacheError, Result};

// == Key Args ==
/// Captured call arguments in a deterministic textual form.
///
/// Positional arguments keep their call order (position is semantically
/// significant); named arguments are sorted by name so that declaration
/// order does not affect the resulting key.
///
/// Every argument is serialized at insertion time. A value the serializer
/// cannot represent fails fast with an [`CacheError::Encode`] naming the
/// offending type, rather than silently producing a colliding key.
#[derive(Debug, Clone, Default)]
pub struct KeyArgs {
    /// Positional argument representations, in call order
    args: Vec<String>,
    /// Named argument representations, sorted by name
    kwargs: BTreeMap<String, String>,
}

impl KeyArgs {
    // == Constructor ==
    /// Creates an empty argument capture.
    pub fn new() -> Self {
        Self::default()
    }

    // == Positional Argument ==
    /// Appends a positional argument.
    pub fn arg<T>(mut self, value: &T) -> Result<Self>
    where
        T: Serialize + ?Sized,
    {
        self.args.push(repr(value)?);
        Ok(self)
    }

    // == Named Argument ==
    /// Adds a named argument. Re-adding the same name overwrites it.
    pub fn kwarg<T>(mut self, name: &str, value: &T) -> Result<Self>
    where
        T: Serialize + ?Sized,
    {
        self.kwargs.insert(name.to_string(), repr(value)?);
        Ok(self)
    }

    /// Textual form of the positional arguments.
    pub fn positional_repr(&self) -> String {
        format!("[{}]", self.args.join(","))
    }

    /// Textual form of the named arguments, sorted by name.
    pub fn named_repr(&self) -> String {
        let pairs: Vec<String> = self
            .kwargs
            .iter()
            .map(|(name, value)| format!("{name}={value}"))
            .collect();
        format!("{{{}}}", pairs.join(","))
    }
}

/// Canonical representation of a single argument value.
fn repr<T>(value: &T) -> Result<String>
where
    T: Serialize + ?Sized,
{
    serde_json::to_string(value).map_err(|err| CacheError::Encode {
        type_name: std::any::type_name::<T>(),
        reason: err.to_string(),
    })
}

// == Key Builder Trait ==
/// Maps (namespace, qualified function name, arguments) to a cache key.
///
/// The `namespace` argument arrives already qualified with the coordinator's
/// global prefix. Implementations must be deterministic: equal inputs must
/// always produce equal keys.
pub trait KeyBuilder: Send + Sync {
    /// Builds the cache key for one invocation.
    fn build(&self, namespace: &str, function: &str, args: &KeyArgs) -> String;
}

// == Default Key Builder ==
/// Default key builder: SHA-256 digest of the function identity and the
/// argument representations, formatted as `"{namespace}:{hex_digest}"`.
#[derive(Debug, Clone, Default)]
pub struct DefaultKeyBuilder;

impl KeyBuilder for DefaultKeyBuilder {
    fn build(&self, namespace: &str, function: &str, args: &KeyArgs) -> String {
        let mut hasher = Sha256::new();
        hasher.update(function.as_bytes());
        hasher.update(b":");
        hasher.update(args.positional_repr().as_bytes());
        hasher.update(b":");
        hasher.update(args.named_repr().as_bytes());
        let digest = hex::encode(hasher.finalize());

        format!("{namespace}:{digest}")
    }
}
