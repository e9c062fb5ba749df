//! Name spaces: DEF registration and URL resolution.
//!
//! Every built subtree lives in a name space. DEF names resolve within one
//! space only; inlined documents get child spaces so their names cannot
//! collide with the parent document.

use rustc_hash::FxHashMap;

use crate::node::NodeId;

slotmap::new_key_type! {
    /// Arena key for name spaces.
    pub struct SpaceId;
}

/// One document's name space.
pub struct Namespace {
    pub name: String,
    base_url: String,
    defs: FxHashMap<String, NodeId>,
    pub parent: Option<SpaceId>,
    pub children: Vec<SpaceId>,
}

impl Namespace {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            base_url: String::new(),
            defs: FxHashMap::default(),
            parent: None,
            children: Vec::new(),
        }
    }

    /// Set the base URL from a document URL: everything up to and including
    /// the last `/` is kept.
    pub fn set_base_url(&mut self, url: &str) {
        self.base_url = match url.rfind('/') {
            Some(pos) => url[..=pos].to_string(),
            None => String::new(),
        };
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Resolve a (possibly relative) URL against the base URL.
    pub fn resolve_url(&self, url: &str) -> String {
        if url.is_empty() {
            return String::new();
        }
        if url.contains("://") || url.starts_with('/') || url.starts_with("data:") {
            return url.to_string();
        }
        format!("{}{}", self.base_url, url)
    }

    /// Register a DEF name. Later registrations win, matching declaration
    /// order semantics where the last DEF of a name is the visible one.
    pub fn define(&mut self, name: impl Into<String>, node: NodeId) {
        self.defs.insert(name.into(), node);
    }

    /// Look up a DEF name.
    pub fn def(&self, name: &str) -> Option<NodeId> {
        self.defs.get(name).copied()
    }

    /// Remove a DEF name, returning the node it mapped to.
    pub fn undefine(&mut self, name: &str) -> Option<NodeId> {
        self.defs.remove(name)
    }

    /// Number of registered DEF names.
    pub fn def_count(&self) -> usize {
        self.defs.len()
    }
}
