//! Codec entry point binding a type registry to per-message encoders and
//! decoders.

use crate::{
    decoder::{Decoder, Limits},
    encoder::Encoder,
    registry::Registry,
    schema::Named,
};
use bytes::Bytes;
use std::fmt::Debug;

/// Content type advertised for messages in this encoding.
pub const CONTENT_TYPE: &str = "application/x-tagwire";

/// Identifier for this encoding in transport headers that negotiate
/// serialization by number.
pub const CODEC_ID: u8 = 13;

/// Shared configuration for a serialization endpoint.
///
/// Holds the registry of decodable wire names and the limits applied to
/// inbound messages. Construct one per transport, register every structure
/// the remote side may send, then mint an [`Encoder`] per outbound message
/// and a [`Decoder`] per inbound message.
///
/// ```rust
/// use tagwire_codec::ObjectCodec;
///
/// #[derive(Debug, Clone, PartialEq)]
/// struct Ping {
///     seq: i64,
/// }
/// tagwire_codec::impl_schema!(Ping, "demo.Ping", { seq });
///
/// let mut codec = ObjectCodec::new();
/// codec.register::<Ping>();
///
/// let mut encoder = codec.encoder();
/// encoder.write_struct(&Ping { seq: 7 });
/// let message = encoder.flush();
///
/// let mut decoder = codec.decoder(message);
/// let value = decoder.read_object().unwrap();
/// assert_eq!(value.downcast_struct::<Ping>(), Some(&Ping { seq: 7 }));
/// ```
pub struct ObjectCodec {
    registry: Registry,
    limits: Limits,
}

impl ObjectCodec {
    /// Creates a codec with builtin scalar names registered and default
    /// limits.
    pub fn new() -> Self {
        Self::with_limits(Limits::default())
    }

    /// Creates a codec with explicit inbound limits.
    pub fn with_limits(limits: Limits) -> Self {
        Self {
            registry: Registry::new(),
            limits,
        }
    }

    /// Registers a structure type for self-describing decode.
    ///
    /// Panics if the wire name is already registered.
    pub fn register<T>(&mut self)
    where
        T: Named + Clone + PartialEq + Debug + Send + Sync + 'static,
    {
        self.registry.register::<T>();
    }

    /// Starts an outbound message.
    pub fn encoder(&self) -> Encoder {
        Encoder::new()
    }

    /// Wraps an inbound message for decoding.
    pub fn decoder(&self, input: Bytes) -> Decoder<'_> {
        Decoder::with_limits(input, &self.registry, self.limits)
    }

    /// The registry backing self-describing decode.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }
}

impl Default for ObjectCodec {
    fn default() -> Self {
        Self::new()
    }
}
