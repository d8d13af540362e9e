//! Snapshot Codec Module
//!
//! Encodes the entry map to a self-describing CBOR byte stream and decodes
//! it back. The envelope is a CBOR map of `key -> { object, expiration }`.

use std::collections::HashMap;
use std::io::{self, Read};
use std::panic::{self, AssertUnwindSafe};

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::cache::Entry;
use crate::error::{CacheError, Result};

// == Encode ==
/// Encodes `items` into an in-memory buffer.
///
/// Both a serializer error and a panic raised inside a value's `Serialize`
/// impl are reported as [`CacheError::SnapshotEncoding`].
pub fn encode<V: Serialize>(items: &HashMap<String, Entry<V>>) -> Result<Vec<u8>> {
    let encoded = panic::catch_unwind(AssertUnwindSafe(|| {
        let mut buffer = Vec::new();
        ciborium::into_writer(items, &mut buffer).map(|()| buffer)
    }));

    match encoded {
        Ok(Ok(bytes)) => Ok(bytes),
        Ok(Err(err)) => Err(CacheError::SnapshotEncoding(err.to_string())),
        Err(payload) => Err(CacheError::SnapshotEncoding(panic_message(payload.as_ref()))),
    }
}

// == Decode ==
/// Decodes a full entry map from `reader`.
///
/// A stream that ends early counts as malformed data, other read failures
/// are reported as I/O errors.
pub fn decode<V: DeserializeOwned, R: Read>(reader: R) -> Result<HashMap<String, Entry<V>>> {
    ciborium::from_reader(reader).map_err(|err| match err {
        ciborium::de::Error::Io(io_err) if io_err.kind() != io::ErrorKind::UnexpectedEof => {
            CacheError::Io(io_err)
        }
        other => CacheError::CborDecode(other.to_string()),
    })
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        format!("value serialization panicked: {msg}")
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        format!("value serialization panicked: {msg}")
    } else {
        "value serialization panicked".to_string()
    }
}
