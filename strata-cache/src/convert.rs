//! Serialization contract between cached values and disk bytes.
//!
//! The disk tier stores opaque blobs; a [`Converter`] is the only component
//! that understands the value type. Converters must round-trip: decoding the
//! bytes produced by an encode yields an equivalent value. They run
//! synchronously on the calling thread and are shared across threads.

use crate::core::error::{CacheError, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::io::Write;
use std::marker::PhantomData;

/// Converts values to and from their on-disk byte representation.
pub trait Converter<V>: Send + Sync {
    /// Decode a value from raw disk bytes.
    ///
    /// Foreign or truncated bytes must produce an error, never a panic.
    fn from_bytes(&self, bytes: &[u8]) -> Result<V>;

    /// Encode a value into the given sink.
    fn to_writer(&self, value: &V, sink: &mut dyn Write) -> Result<()>;
}

/// Identity converter for raw byte values
#[derive(Debug, Default, Clone, Copy)]
pub struct BytesConverter;

impl Converter<Vec<u8>> for BytesConverter {
    fn from_bytes(&self, bytes: &[u8]) -> Result<Vec<u8>> {
        Ok(bytes.to_vec())
    }

    fn to_writer(&self, value: &Vec<u8>, sink: &mut dyn Write) -> Result<()> {
        sink.write_all(value)?;
        Ok(())
    }
}

/// UTF-8 string converter
#[derive(Debug, Default, Clone, Copy)]
pub struct StringConverter;

impl Converter<String> for StringConverter {
    fn from_bytes(&self, bytes: &[u8]) -> Result<String> {
        String::from_utf8(bytes.to_vec()).map_err(|e| CacheError::Decode(e.to_string()))
    }

    fn to_writer(&self, value: &String, sink: &mut dyn Write) -> Result<()> {
        sink.write_all(value.as_bytes())?;
        Ok(())
    }
}

/// JSON converter for any serde-compatible value type.
///
/// Human-readable on disk, which makes cache directories inspectable at the
/// cost of larger entries than [`BincodeConverter`].
pub struct JsonConverter<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T> JsonConverter<T> {
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<T> Default for JsonConverter<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Converter<T> for JsonConverter<T>
where
    T: Serialize + DeserializeOwned,
{
    fn from_bytes(&self, bytes: &[u8]) -> Result<T> {
        serde_json::from_slice(bytes).map_err(|e| CacheError::Decode(e.to_string()))
    }

    fn to_writer(&self, value: &T, sink: &mut dyn Write) -> Result<()> {
        let bytes = serde_json::to_vec(value).map_err(|e| CacheError::Encode(e.to_string()))?;
        sink.write_all(&bytes)?;
        Ok(())
    }
}

/// Compact binary converter for any serde-compatible value type.
pub struct BincodeConverter<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T> BincodeConverter<T> {
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<T> Default for BincodeConverter<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Converter<T> for BincodeConverter<T>
where
    T: Serialize + DeserializeOwned,
{
    fn from_bytes(&self, bytes: &[u8]) -> Result<T> {
        let (value, _) = bincode::serde::decode_from_slice(bytes, bincode::config::standard())
            .map_err(|e| CacheError::Decode(e.to_string()))?;
        Ok(value)
    }

    fn to_writer(&self, value: &T, sink: &mut dyn Write) -> Result<()> {
        let bytes = bincode::serde::encode_to_vec(value, bincode::config::standard())
            .map_err(|e| CacheError::Encode(e.to_string()))?;
        sink.write_all(&bytes)?;
        Ok(())
    }
}
