//! Serialize objects as self-describing tagged frames.
//!
//! # Overview
//!
//! A binary object serialization library for RPC transports, designed to:
//! - Serialize primitives, collections, and user-defined structures into
//!   tagged binary frames
//! - Deserialize untrusted binary input back into runtime values, resolving
//!   structure types by wire name through a registry
//!
//! Every frame starts with a one-byte tag identifying its kind. Scalars carry
//! fixed-width big-endian bodies or length-prefixed blocks; composites
//! (structures, sequences, sets, maps) carry a self-inclusive total length, a
//! wire name, and a payload, so a reader can skip or reject frames it does
//! not understand without losing sync.
//!
//! # Typed and Dynamic Channels
//!
//! The typed channel ([`Encoder::write_struct`], [`Decoder::read_struct`] and
//! friends) works against compile-time [`Schema`] implementations and never
//! consults the registry. The dynamic channel ([`Encoder::write_object`],
//! [`Decoder::read_object`]) round-trips [`Value`] trees and resolves each
//! composite's wire name at decode time. Both channels produce identical
//! bytes for identical data.
//!
//! # Example
//!
//! ```
//! use tagwire_codec::{ObjectCodec, Value};
//!
//! // Define a structure and bind it to a wire name.
//! #[derive(Debug, Clone, PartialEq)]
//! struct Order {
//!     id: i64,
//!     note: Option<String>,
//! }
//! tagwire_codec::impl_schema!(Order, "shop.Order", { id, note });
//!
//! // Each endpoint registers the structures it may receive.
//! let mut codec = ObjectCodec::new();
//! codec.register::<Order>();
//!
//! // Encode a message of several frames.
//! let mut encoder = codec.encoder();
//! encoder.write_string("create");
//! encoder.write_struct(&Order {
//!     id: 42,
//!     note: Some("rush".to_string()),
//! });
//! let message = encoder.flush();
//!
//! // Decode it back.
//! let mut decoder = codec.decoder(message);
//! assert_eq!(decoder.read_string().unwrap(), "create");
//! let value = decoder.read_object().unwrap();
//! let order = value.downcast_struct::<Order>().unwrap();
//! assert_eq!(order.id, 42);
//! decoder.finish().unwrap();
//! ```
//!
//! # Untrusted Input
//!
//! Decoding applies [`Limits`] to every length and count field before
//! allocating, rejects unknown tags and wire names, and requires each
//! composite payload to be consumed exactly. An entirely empty message
//! decodes to [`Value::Absent`], which transports use as a heartbeat.

pub mod buffer;
pub mod codec;
pub mod decoder;
pub mod encoder;
pub mod error;
pub mod fault;
pub mod registry;
pub mod schema;
pub mod tag;
pub mod value;

pub use buffer::{ReadBuffer, WriteBuffer};
pub use codec::{ObjectCodec, CODEC_ID, CONTENT_TYPE};
pub use decoder::{Decoder, Limits};
pub use encoder::Encoder;
pub use error::Error;
pub use fault::Fault;
pub use registry::Registry;
pub use schema::{Named, Schema};
pub use tag::Tag;
pub use value::{DynSchema, Value};
