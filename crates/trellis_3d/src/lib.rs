//! # Trellis 3D
//!
//! A declarative 3D scene-graph runtime for the Trellis framework.
//!
//! This crate provides:
//! - **Node type registry** with case-insensitive element-name lookup
//! - **Tree builder** that materializes declarative elements (DEF/USE,
//!   routes, container fields) into graph nodes
//! - **Field system** with typed values, routes, and change hooks
//! - **Bindable stacks** for viewpoints, navigation, backgrounds, and fog
//! - **Geometry pipeline**: procedural primitives, indexed-set flattening,
//!   and a shared mesh cache
//! - **Traversal**: volumes, world transforms, ray picking, drawable
//!   collection
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use trellis_3d::prelude::*;
//! use trellis_core::element::DeclElement;
//!
//! let mut graph = SceneGraph::new();
//! let scene = DeclElement::new("Scene").with_child(
//!     DeclElement::new("Shape").with_child(DeclElement::new("Box")),
//! );
//! let root = graph.build_tree(graph.root_space(), &scene).unwrap();
//! let drawables = graph.collect_drawables(root);
//! ```

// Bindable stacks
pub mod bindable;

// The scene-graph context: nodes, spaces, routes, traversal
pub mod graph;

// Math utilities
pub mod math;

// Mesh assembly and the geometry cache
pub mod mesh;

// Name spaces (DEF registration, URL resolution)
pub mod namespace;

// The node base record and construction helpers
pub mod node;

// Concrete node kinds
pub mod nodes;

// The node type registry
pub mod registry;

// Prelude for common imports
pub mod prelude;

// Re-export core types at crate root
pub use bindable::{BindableKind, BindableStack, SwitchTarget};
pub use graph::{Drawable, PickResult, Route, SceneGraph};
pub use math::{BoundingBox, Ray};
pub use mesh::{GeometryCache, Mesh, MeshPart, Primitive};
pub use namespace::{Namespace, SpaceId};
pub use node::{NodeClass, NodeId, SceneNode};
pub use nodes::{NodeKind, RenderHandle};
pub use registry::{NodeDescriptor, NodeTypeId, NodeTypeRegistry};
