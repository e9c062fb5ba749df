//! Routes: field-to-field event wiring.
//!
//! A route registers a forwarding watcher on the source field and an apply
//! watcher on the destination field. Messages are delivered through a FIFO
//! work queue. Each queued message carries the `(node, field)` keys its
//! forwarding chain has already visited; a forward that would revisit one is
//! a cycle and is cut with a warning. Separate chains reaching the same
//! destination field (diamond or fan-in wiring) each deliver.

use tracing::warn;
use trellis_core::field::FieldValue;

use super::SceneGraph;
use crate::node::NodeId;

/// A field-to-field connection, kept for introspection.
#[derive(Clone, Debug)]
pub struct Route {
    pub from: NodeId,
    pub from_field: String,
    pub to: NodeId,
    pub to_field: String,
}

/// A watcher on one field of one node.
#[derive(Clone, Debug)]
pub(crate) enum Watcher {
    /// Re-post incoming values to another node's field.
    Forward { to: NodeId, to_field: String },
    /// Invoke the field-changed hook after the value is stored.
    Apply,
}

/// One queued field delivery.
pub(crate) struct QueuedMessage {
    node: NodeId,
    field: String,
    value: FieldValue,
    /// Keys already visited along this message's forwarding chain.
    path: Vec<(NodeId, String)>,
}

impl SceneGraph {
    /// Wire a route. Field names accept the `set_` / `_changed` event
    /// aliases. Returns false (and wires nothing) when either field cannot
    /// be resolved.
    pub fn setup_route(
        &mut self,
        from: NodeId,
        from_field: &str,
        to: NodeId,
        to_field: &str,
    ) -> bool {
        let Some(from_field) = self.resolve_field_alias(from, from_field) else {
            warn!(field = from_field, "route source field not found, discarding route");
            return false;
        };
        let Some(to_field) = self.resolve_field_alias(to, to_field) else {
            warn!(field = to_field, "route destination field not found, discarding route");
            return false;
        };

        self.watchers.entry(from).or_default().push((
            from_field.clone(),
            Watcher::Forward { to, to_field: to_field.clone() },
        ));
        self.watchers
            .entry(to)
            .or_default()
            .push((to_field.clone(), Watcher::Apply));
        self.routes.push(Route { from, from_field, to, to_field });
        true
    }

    /// Routes wired so far, in creation order.
    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    /// Set a field value and synchronously run the delivery wave: watchers
    /// fire in registration order, forwarded messages queue up behind the
    /// current one.
    pub fn post_message(&mut self, id: NodeId, field: &str, value: FieldValue) {
        self.msg_queue.push_back(QueuedMessage {
            node: id,
            field: field.to_string(),
            value,
            path: Vec::new(),
        });
        if self.draining {
            return;
        }
        self.draining = true;
        while let Some(msg) = self.msg_queue.pop_front() {
            self.deliver(msg);
        }
        self.draining = false;
    }

    fn deliver(&mut self, msg: QueuedMessage) {
        let Some(node) = self.nodes.get_mut(msg.node) else {
            return;
        };
        node.store_field(&msg.field, msg.value.clone());

        let watchers: Vec<Watcher> = self
            .watchers
            .get(&msg.node)
            .map(|list| {
                list.iter()
                    .filter(|(name, _)| name == &msg.field)
                    .map(|(_, w)| w.clone())
                    .collect()
            })
            .unwrap_or_default();

        for watcher in watchers {
            match watcher {
                Watcher::Forward { to, to_field } => {
                    let key = (to, to_field);
                    let here = (msg.node, msg.field.clone());
                    if key == here || msg.path.contains(&key) {
                        warn!(field = %key.1, "route cycle detected, dropping event");
                        continue;
                    }
                    let mut path = msg.path.clone();
                    path.push(here);
                    self.msg_queue.push_back(QueuedMessage {
                        node: key.0,
                        field: key.1,
                        value: msg.value.clone(),
                        path,
                    });
                }
                Watcher::Apply => {
                    self.field_changed(msg.node, &msg.field);
                }
            }
        }
    }

    /// Resolve `set_x` / `x_changed` event names to the underlying field.
    fn resolve_field_alias(&self, id: NodeId, name: &str) -> Option<String> {
        let node = self.node(id)?;
        if node.has_field(name) {
            return Some(name.to_string());
        }
        if let Some(stripped) = name.strip_prefix("set_") {
            if node.has_field(stripped) {
                return Some(stripped.to_string());
            }
        }
        if let Some(stripped) = name.strip_suffix("_changed") {
            if node.has_field(stripped) {
                return Some(stripped.to_string());
            }
        }
        None
    }
}
