//! Error types for codec operations.

use crate::tag::Tag;
use thiserror::Error;

/// Error type for encode and decode operations.
///
/// Every variant is fatal for the message being processed. Nothing at this
/// layer retries; the transport above decides what to do with the failure.
#[derive(Error, Debug)]
pub enum Error {
    #[error("unexpected end of buffer")]
    EndOfBuffer,
    #[error("extra data found: {0} bytes")]
    ExtraData(usize),
    #[error("unknown tag: {0}")]
    UnknownTag(u8),
    #[error("unexpected tag: expected {expected:?}, found {found:?}")]
    UnexpectedTag { expected: Tag, found: Tag },
    #[error("unsupported: {0}")]
    Unsupported(&'static str),
    #[error("unknown wire name: {0}")]
    UnknownType(String),
    #[error("length exceeded: {0} > {1}")]
    LengthExceeded(usize, usize), // found, max
    #[error("composite length invariant violated: total {0}, name {1}")]
    InvalidComposite(u32, u32),
    #[error("mixed collection: expected {expected}, found {found}")]
    MixedCollection { expected: String, found: String },
    #[error("invalid bool")]
    InvalidBool,
    #[error("invalid utf-8 in {0}")]
    InvalidUtf8(&'static str),
    #[error("invalid numeric text: {0}")]
    InvalidNumber(String),
}
