//! Host element contract for the tree builder.
//!
//! The runtime never walks a DOM. Hosts adapt whatever markup store they use
//! (an XML tree, a browser DOM, a hand-built structure) to [`SceneElement`]
//! and hand the root to the tree builder. [`DeclElement`] is a ready-made
//! owned implementation for tests and hosts without their own tree.

use std::sync::atomic::{AtomicU64, Ordering};

/// Stable identity of a host element.
///
/// Used to bind elements to their runtime nodes so a subtree is never set up
/// twice, and to link nodes back to their declaration. Hosts must keep keys
/// unique within one document.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementKey(pub u64);

/// Read-only view of one declarative element.
pub trait SceneElement {
    /// Tag name as written in the source (case is preserved).
    fn tag(&self) -> &str;

    /// Attribute value by exact name, if present.
    fn attribute(&self, name: &str) -> Option<&str>;

    /// Stable key for element/node binding.
    fn key(&self) -> ElementKey;

    /// Visit the child elements in document order.
    fn for_each_child(&self, f: &mut dyn FnMut(&dyn SceneElement));
}

static NEXT_KEY: AtomicU64 = AtomicU64::new(1);

/// Owned element tree with builder-style construction.
///
/// ```rust
/// use trellis_core::element::DeclElement;
///
/// let shape = DeclElement::new("Shape")
///     .with_attr("DEF", "ball")
///     .with_child(DeclElement::new("Sphere").with_attr("radius", "2"));
/// ```
#[derive(Clone, Debug)]
pub struct DeclElement {
    tag: String,
    key: ElementKey,
    attributes: Vec<(String, String)>,
    children: Vec<DeclElement>,
}

impl DeclElement {
    /// Create an element with a fresh process-unique key.
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            key: ElementKey(NEXT_KEY.fetch_add(1, Ordering::Relaxed)),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Add an attribute.
    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((name.into(), value.into()));
        self
    }

    /// Append a child element.
    pub fn with_child(mut self, child: DeclElement) -> Self {
        self.children.push(child);
        self
    }

    /// Append several child elements.
    pub fn with_children(mut self, children: impl IntoIterator<Item = DeclElement>) -> Self {
        self.children.extend(children);
        self
    }

    /// The child elements, in document order.
    pub fn children(&self) -> &[DeclElement] {
        &self.children
    }
}

impl SceneElement for DeclElement {
    fn tag(&self) -> &str {
        &self.tag
    }

    fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    fn key(&self) -> ElementKey {
        self.key
    }

    fn for_each_child(&self, f: &mut dyn FnMut(&dyn SceneElement)) {
        for child in &self.children {
            f(child);
        }
    }
}
