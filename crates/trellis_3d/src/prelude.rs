//! Prelude module for common imports
//!
//! ```rust,ignore
//! use trellis_3d::prelude::*;
//! ```

// Graph
pub use crate::graph::{Drawable, PickResult, Route, SceneGraph};

// Nodes
pub use crate::node::{NodeClass, NodeId, SceneNode};
pub use crate::nodes::{NodeKind, RenderHandle};

// Registry
pub use crate::registry::{NodeDescriptor, NodeTypeId, NodeTypeRegistry};

// Name spaces
pub use crate::namespace::{Namespace, SpaceId};

// Bindables
pub use crate::bindable::{BindableKind, BindableStack, SwitchTarget};

// Mesh and math
pub use crate::math::{BoundingBox, Ray};
pub use crate::mesh::{GeometryCache, Mesh, MeshPart, Primitive};

// Field values
pub use trellis_core::field::{FieldKind, FieldValue};
