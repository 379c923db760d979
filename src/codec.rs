//! Message codec: pluggable serialize/deserialize function slots.
//!
//! The codec converts application-level outbound messages into wire
//! payloads and wire payloads back into application-level inbound
//! messages. Both directions are pure, synchronous, and independently
//! replaceable (capability injection, not inheritance).
//!
//! # Default Codec
//!
//! [`Codec::json`] wires both slots to `serde_json`: outbound values are
//! serialized to a text frame, inbound text or binary frames are parsed
//! back. Malformed input fails cleanly with [`Error::Json`] /
//! [`Error::Decode`]; the failure is reported by the session, never
//! propagated into the transport layer.
//!
//! [`Error::Json`]: crate::Error::Json
//! [`Error::Decode`]: crate::Error::Decode

// ============================================================================
// Imports
// ============================================================================

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::Result;

// ============================================================================
// WirePayload
// ============================================================================

/// A payload as it travels over the transport.
///
/// Mirrors the text/binary frame split of the WebSocket transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WirePayload {
    /// UTF-8 text frame.
    Text(String),
    /// Binary frame.
    Binary(Vec<u8>),
}

impl WirePayload {
    /// Returns the payload length in bytes.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Text(text) => text.len(),
            Self::Binary(bytes) => bytes.len(),
        }
    }

    /// Returns `true` if the payload is empty.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl From<String> for WirePayload {
    #[inline]
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<&str> for WirePayload {
    #[inline]
    fn from(text: &str) -> Self {
        Self::Text(text.to_owned())
    }
}

impl From<Vec<u8>> for WirePayload {
    #[inline]
    fn from(bytes: Vec<u8>) -> Self {
        Self::Binary(bytes)
    }
}

// ============================================================================
// Function Slots
// ============================================================================

/// Encode slot: outbound message to wire payload.
pub type EncodeFn<Out> = Box<dyn Fn(&Out) -> Result<WirePayload> + Send>;

/// Decode slot: wire payload to inbound message.
pub type DecodeFn<In> = Box<dyn Fn(&WirePayload) -> Result<In> + Send>;

// ============================================================================
// Codec
// ============================================================================

/// Pair of independently replaceable encode/decode functions.
///
/// `In` is the inbound (decoded) message type, `Out` the outbound type.
/// The two sides do not have to agree on a format; each slot can be
/// swapped on its own.
pub struct Codec<In, Out> {
    encode: EncodeFn<Out>,
    decode: DecodeFn<In>,
}

impl<In, Out> Codec<In, Out> {
    /// Creates a codec from custom encode/decode functions.
    pub fn new(
        encode: impl Fn(&Out) -> Result<WirePayload> + Send + 'static,
        decode: impl Fn(&WirePayload) -> Result<In> + Send + 'static,
    ) -> Self {
        Self {
            encode: Box::new(encode),
            decode: Box::new(decode),
        }
    }

    /// Replaces only the encode slot.
    #[must_use]
    pub fn with_encode(
        mut self,
        encode: impl Fn(&Out) -> Result<WirePayload> + Send + 'static,
    ) -> Self {
        self.encode = Box::new(encode);
        self
    }

    /// Replaces only the decode slot.
    #[must_use]
    pub fn with_decode(
        mut self,
        decode: impl Fn(&WirePayload) -> Result<In> + Send + 'static,
    ) -> Self {
        self.decode = Box::new(decode);
        self
    }

    /// Encodes an outbound message into a wire payload.
    ///
    /// # Errors
    ///
    /// Returns the error produced by the encode slot.
    #[inline]
    pub fn encode(&self, message: &Out) -> Result<WirePayload> {
        (self.encode)(message)
    }

    /// Decodes a wire payload into an inbound message.
    ///
    /// # Errors
    ///
    /// Returns the error produced by the decode slot.
    #[inline]
    pub fn decode(&self, payload: &WirePayload) -> Result<In> {
        (self.decode)(payload)
    }
}

impl<In, Out> Codec<In, Out>
where
    In: DeserializeOwned,
    Out: Serialize,
{
    /// Creates the default JSON codec.
    ///
    /// Outbound messages serialize to text frames; inbound text and
    /// binary frames are parsed as JSON.
    #[must_use]
    pub fn json() -> Self {
        Self {
            encode: Box::new(|message| {
                let text = serde_json::to_string(message)?;
                Ok(WirePayload::Text(text))
            }),
            decode: Box::new(|payload| match payload {
                WirePayload::Text(text) => Ok(serde_json::from_str(text)?),
                WirePayload::Binary(bytes) => Ok(serde_json::from_slice(bytes)?),
            }),
        }
    }
}

impl<In, Out> Default for Codec<In, Out>
where
    In: DeserializeOwned,
    Out: Serialize,
{
    fn default() -> Self {
        Self::json()
    }
}

impl<In, Out> std::fmt::Debug for Codec<In, Out> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Codec").finish_non_exhaustive()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use proptest::prelude::*;
    use serde::Deserialize;
    use serde_json::{Value, json};

    use crate::error::Error;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Nested {
        name: String,
        tags: Vec<String>,
        inner: Option<Box<Nested>>,
    }

    #[test]
    fn test_json_round_trip_primitives() {
        let codec: Codec<Value, Value> = Codec::json();

        for value in [json!(1), json!(-3.5), json!("hi"), json!(true), json!(null)] {
            let wire = codec.encode(&value).expect("encode");
            let back = codec.decode(&wire).expect("decode");
            assert_eq!(back, value);
        }
    }

    #[test]
    fn test_json_round_trip_arrays_and_objects() {
        let codec: Codec<Value, Value> = Codec::json();

        let value = json!({
            "a": [1, 2, 3],
            "b": { "nested": { "deep": [true, null, "x"] } },
        });
        let wire = codec.encode(&value).expect("encode");
        assert!(matches!(wire, WirePayload::Text(_)));
        assert_eq!(codec.decode(&wire).expect("decode"), value);
    }

    #[test]
    fn test_json_round_trip_struct() {
        let codec: Codec<Nested, Nested> = Codec::json();

        let value = Nested {
            name: "root".into(),
            tags: vec!["a".into(), "b".into()],
            inner: Some(Box::new(Nested {
                name: "child".into(),
                tags: vec![],
                inner: None,
            })),
        };
        let wire = codec.encode(&value).expect("encode");
        assert_eq!(codec.decode(&wire).expect("decode"), value);
    }

    #[test]
    fn test_json_decode_binary_frame() {
        let codec: Codec<Value, Value> = Codec::json();

        let payload = WirePayload::Binary(b"{\"n\":7}".to_vec());
        assert_eq!(codec.decode(&payload).expect("decode"), json!({ "n": 7 }));
    }

    #[test]
    fn test_json_decode_malformed_fails_cleanly() {
        let codec: Codec<Value, Value> = Codec::json();

        let result = codec.decode(&WirePayload::Text("{not json".into()));
        assert!(matches!(result, Err(Error::Json(_))));
    }

    #[test]
    fn test_custom_slots_are_independent() {
        let codec: Codec<usize, String> = Codec::new(
            |message: &String| Ok(WirePayload::Text(message.to_uppercase())),
            |payload| match payload {
                WirePayload::Text(text) => Ok(text.len()),
                WirePayload::Binary(_) => Err(Error::decode("binary not supported")),
            },
        );

        let wire = codec.encode(&"abc".to_string()).expect("encode");
        assert_eq!(wire, WirePayload::Text("ABC".into()));
        assert_eq!(codec.decode(&wire).expect("decode"), 3);

        let swapped = codec.with_decode(|_| Ok(0usize));
        assert_eq!(
            swapped
                .decode(&WirePayload::Binary(vec![1, 2]))
                .expect("decode"),
            0
        );
    }

    proptest! {
        #[test]
        fn prop_json_round_trip(
            numbers in proptest::collection::vec(any::<i64>(), 0..16),
            text in ".{0,64}",
            flag in any::<bool>(),
        ) {
            let codec: Codec<Value, Value> = Codec::json();
            let value = json!({ "numbers": numbers, "text": text, "flag": flag });

            let wire = codec.encode(&value).expect("encode");
            prop_assert_eq!(codec.decode(&wire).expect("decode"), value);
        }
    }
}
