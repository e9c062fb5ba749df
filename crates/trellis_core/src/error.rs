//! Error types for field value parsing.

use thiserror::Error;

/// Errors produced by the attribute grammar parsers.
///
/// The runtime treats these as recoverable: a failed declaration attribute
/// falls back to the field default, a failed runtime update leaves the field
/// untouched. Both paths log a warning instead of propagating.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum FieldError {
    /// A token could not be read as a number.
    #[error("invalid numeric literal {0:?}")]
    InvalidNumber(String),

    /// A boolean attribute was neither `true` nor `false`.
    #[error("invalid boolean literal {0:?}")]
    InvalidBool(String),

    /// The value ended before all components of the field were read.
    #[error("expected {expected} component(s), found {found}")]
    MissingComponents { expected: usize, found: usize },

    /// An image header declared more pixels than the parser accepts.
    #[error("image of {width}x{height} pixels exceeds the supported size")]
    ImageTooLarge { width: u32, height: u32 },
}
