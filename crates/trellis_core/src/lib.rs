//! # Trellis Core
//!
//! Value-level foundation for the Trellis scene-graph runtime.
//!
//! This crate provides:
//! - **Typed field values** (`FieldValue`) covering the declarative field
//!   types: booleans, numbers, strings, colors, vectors, rotations,
//!   matrices, images, and their multi-valued forms
//! - **The attribute grammar** - tolerant text parsers for every field kind,
//!   as written in declarative scene markup
//! - **The host element contract** (`SceneElement`) - the minimal read-only
//!   view of a declarative element tree that the tree builder consumes, so
//!   the runtime never depends on any particular markup or DOM library
//!
//! ## Quick Start
//!
//! ```rust
//! use trellis_core::field::{FieldKind, FieldValue};
//!
//! let v = FieldKind::Vec3.parse("1 2 3").unwrap();
//! assert_eq!(v, FieldValue::Vec3(glam::Vec3::new(1.0, 2.0, 3.0)));
//! ```

// Typed field values and the attribute grammar
pub mod field;

// Host element contract for the tree builder
pub mod element;

// Error types
pub mod error;

// Re-export core types at crate root
pub use element::{DeclElement, ElementKey, SceneElement};
pub use error::FieldError;
pub use field::{FieldKind, FieldValue, ImageValue};
