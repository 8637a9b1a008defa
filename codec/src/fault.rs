//! Flattened error values.

use std::{any, error::Error as StdError, fmt};

/// An error value reduced to its transportable form: type identity and
/// message, nothing else.
///
/// Cause chains and backtraces never cross the wire. The class name is
/// informational text reported by the encoding side; nothing is ever resolved
/// from it on decode.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Fault {
    /// Type name reported by the encoding side.
    pub class_name: String,
    /// Display form of the error, empty when the peer sent none.
    pub message: String,
}

impl Fault {
    /// Creates a fault from explicit parts.
    pub fn new(class_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
            message: message.into(),
        }
    }

    /// Flattens any error into its transportable form.
    ///
    /// Deterministic and total: the source chain is dropped, never followed,
    /// so cyclic causes cannot recurse into the encoder.
    pub fn flatten<E: StdError + ?Sized>(err: &E) -> Self {
        Self {
            class_name: any::type_name::<E>().to_string(),
            message: err.to_string(),
        }
    }
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.message.is_empty() {
            write!(f, "{}", self.class_name)
        } else {
            write!(f, "{}: {}", self.class_name, self.message)
        }
    }
}

impl StdError for Fault {}
