//! Pluggable payload serialization.
//!
//! A [`CosmosSerializer`] converts between wire bytes and a JSON document
//! tree. Typed encode and decode go through that tree, which keeps the trait
//! object-safe so a custom serializer can be injected as
//! `Arc<dyn CosmosSerializer>` at construction.
//!
//! The client holds two serializers, selected by [`SerializerRole`]:
//!
//! - **properties**: the built-in [`JsonSerializer`], used for every
//!   administrative resource (databases, containers, users, permissions,
//!   throughput, scripts, account metadata)
//! - **user**: caller-supplied, used only for item payloads and stored
//!   procedure execution results
//!
//! A custom user serializer therefore never sees internal metadata.
//!
//! # Example
//!
//! ```rust
//! use cosmos_client::serializer::{decode, encode, JsonSerializer};
//! use cosmos_client::clients::ResourceKind;
//!
//! let serializer = JsonSerializer;
//! let bytes = encode(&serializer, ResourceKind::Item, &vec![1, 2, 3]).unwrap();
//! let back: Vec<i32> = decode(&serializer, ResourceKind::Item, &bytes).unwrap();
//! assert_eq!(back, vec![1, 2, 3]);
//! ```

use std::fmt;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::clients::{CosmosError, ResourceKind, SerializationError};

/// Which of the two configured serializers decodes a payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SerializerRole {
    /// Built-in serializer for administrative metadata.
    Properties,
    /// Caller-configurable serializer for item payloads.
    User,
}

/// Encodes and decodes payloads.
///
/// Implementations must hold no per-call mutable state; the client invokes
/// them concurrently from many operations.
pub trait CosmosSerializer: Send + Sync + fmt::Debug {
    /// Encodes a JSON document tree to bytes.
    ///
    /// # Errors
    ///
    /// Returns a message describing why the value could not be encoded.
    fn to_bytes(&self, value: &serde_json::Value) -> Result<Vec<u8>, String>;

    /// Decodes bytes into a JSON document tree.
    ///
    /// # Errors
    ///
    /// Returns a message describing why the bytes are malformed.
    fn from_bytes(&self, bytes: &[u8]) -> Result<serde_json::Value, String>;
}

/// The default serializer: plain `serde_json`.
#[derive(Clone, Copy, Debug, Default)]
pub struct JsonSerializer;

impl CosmosSerializer for JsonSerializer {
    fn to_bytes(&self, value: &serde_json::Value) -> Result<Vec<u8>, String> {
        serde_json::to_vec(value).map_err(|e| e.to_string())
    }

    fn from_bytes(&self, bytes: &[u8]) -> Result<serde_json::Value, String> {
        serde_json::from_slice(bytes).map_err(|e| e.to_string())
    }
}

/// Encodes `value` with `serializer`.
///
/// # Errors
///
/// Returns [`CosmosError::Serialization`] tagged with `kind` on failure.
pub fn encode<T: Serialize + ?Sized>(
    serializer: &dyn CosmosSerializer,
    kind: ResourceKind,
    value: &T,
) -> Result<Vec<u8>, CosmosError> {
    let tree = serde_json::to_value(value).map_err(|e| serialization_error(kind, &e))?;
    serializer
        .to_bytes(&tree)
        .map_err(|message| SerializationError { kind, message }.into())
}

/// Decodes `bytes` into `T` with `serializer`.
///
/// # Errors
///
/// Returns [`CosmosError::Serialization`] tagged with `kind` if the bytes
/// are malformed or do not match `T`.
pub fn decode<T: DeserializeOwned>(
    serializer: &dyn CosmosSerializer,
    kind: ResourceKind,
    bytes: &[u8],
) -> Result<T, CosmosError> {
    let tree = serializer
        .from_bytes(bytes)
        .map_err(|message| SerializationError { kind, message })?;
    decode_value(kind, tree)
}

/// Converts an already-decoded document tree into `T`.
///
/// # Errors
///
/// Returns [`CosmosError::Serialization`] on a type mismatch.
pub fn decode_value<T: DeserializeOwned>(
    kind: ResourceKind,
    value: serde_json::Value,
) -> Result<T, CosmosError> {
    serde_json::from_value(value).map_err(|e| serialization_error(kind, &e))
}

fn serialization_error(kind: ResourceKind, error: &serde_json::Error) -> CosmosError {
    CosmosError::serialization(kind, error.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Order {
        id: String,
        total: u32,
    }

    #[test]
    fn test_decode_malformed_bytes_is_serialization_error() {
        let result: Result<Order, _> = decode(&JsonSerializer, ResourceKind::Item, b"{not json");
        assert!(matches!(
            result,
            Err(CosmosError::Serialization(SerializationError {
                kind: ResourceKind::Item,
                ..
            }))
        ));
    }

    #[test]
    fn test_decode_type_mismatch_is_serialization_error() {
        let result: Result<Order, _> =
            decode(&JsonSerializer, ResourceKind::Item, br#"{"id":"o1","total":"many"}"#);
        assert!(matches!(result, Err(CosmosError::Serialization(_))));
    }

    #[test]
    fn test_decode_typed_value() {
        let order: Order =
            decode(&JsonSerializer, ResourceKind::Item, br#"{"id":"o1","total":3}"#).unwrap();
        assert_eq!(
            order,
            Order {
                id: "o1".to_string(),
                total: 3
            }
        );
    }

    #[test]
    fn test_serializer_is_usable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<JsonSerializer>();
        assert_send_sync::<std::sync::Arc<dyn CosmosSerializer>>();
    }
}
