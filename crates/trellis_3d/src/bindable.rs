//! Bindable stacks.
//!
//! Each bindable category (viewpoint, navigation info, background, fog) has
//! one stack per graph. The *bag* holds every bindable of that category in
//! registration order; the *stack* holds the binding history with the active
//! node on top. Activation and deactivation are announced by posting
//! `isActive` messages to the nodes involved.

use serde::{Deserialize, Serialize};
use tracing::warn;
use trellis_core::field::FieldValue;

use crate::graph::SceneGraph;
use crate::node::NodeId;
use crate::nodes::NodeKind;

/// The four bindable categories.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BindableKind {
    Viewpoint,
    NavigationInfo,
    Background,
    Fog,
}

impl BindableKind {
    pub const ALL: [BindableKind; 4] = [
        BindableKind::Viewpoint,
        BindableKind::NavigationInfo,
        BindableKind::Background,
        BindableKind::Fog,
    ];

    /// Node type synthesized when a scene declares no bindable of this kind.
    pub fn default_type_name(self) -> &'static str {
        match self {
            BindableKind::Viewpoint => "Viewpoint",
            BindableKind::NavigationInfo => "NavigationInfo",
            BindableKind::Background => "Background",
            BindableKind::Fog => "Fog",
        }
    }

    /// The category a node kind binds under, if any.
    pub fn of(kind: &NodeKind) -> Option<Self> {
        match kind {
            NodeKind::Viewpoint => Some(BindableKind::Viewpoint),
            NodeKind::NavigationInfo => Some(BindableKind::NavigationInfo),
            NodeKind::Background => Some(BindableKind::Background),
            NodeKind::Fog => Some(BindableKind::Fog),
            _ => None,
        }
    }
}

/// Where `switch_bindable` moves the binding.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SwitchTarget {
    First,
    Last,
    Next,
    Prev,
}

/// One category's bag and stack.
#[derive(Default)]
pub struct BindableStack {
    bag: Vec<NodeId>,
    stack: Vec<NodeId>,
}

impl BindableStack {
    /// The currently bound node, if any.
    pub fn top(&self) -> Option<NodeId> {
        self.stack.last().copied()
    }

    /// All registered bindables, in registration order.
    pub fn bag(&self) -> &[NodeId] {
        &self.bag
    }

    fn register(&mut self, id: NodeId) {
        if !self.bag.contains(&id) {
            self.bag.push(id);
        }
    }

    fn unregister(&mut self, id: NodeId) {
        self.bag.retain(|&n| n != id);
        self.stack.retain(|&n| n != id);
    }
}

/// All four stacks of one graph.
#[derive(Default)]
pub struct BindableBag {
    viewpoint: BindableStack,
    navigation_info: BindableStack,
    background: BindableStack,
    fog: BindableStack,
}

impl BindableBag {
    pub fn stack(&self, kind: BindableKind) -> &BindableStack {
        match kind {
            BindableKind::Viewpoint => &self.viewpoint,
            BindableKind::NavigationInfo => &self.navigation_info,
            BindableKind::Background => &self.background,
            BindableKind::Fog => &self.fog,
        }
    }

    fn stack_mut(&mut self, kind: BindableKind) -> &mut BindableStack {
        match kind {
            BindableKind::Viewpoint => &mut self.viewpoint,
            BindableKind::NavigationInfo => &mut self.navigation_info,
            BindableKind::Background => &mut self.background,
            BindableKind::Fog => &mut self.fog,
        }
    }

    pub(crate) fn register(&mut self, kind: BindableKind, id: NodeId) {
        self.stack_mut(kind).register(id);
    }

    pub(crate) fn unregister(&mut self, kind: BindableKind, id: NodeId) {
        self.stack_mut(kind).unregister(id);
    }
}

impl SceneGraph {
    /// The stack of a bindable category.
    pub fn bindables(&self, kind: BindableKind) -> &BindableStack {
        self.bindable_bag.stack(kind)
    }

    /// The active bindable, synthesizing and binding a default node when the
    /// scene declared none. Returns `None` only if the default type is not
    /// registered.
    pub fn active_bindable(&mut self, kind: BindableKind) -> Option<NodeId> {
        if let Some(top) = self.bindable_bag.stack(kind).top() {
            return Some(top);
        }
        if self.bindable_bag.stack(kind).bag.is_empty() {
            let node = self.create_default_node(kind.default_type_name())?;
            if let Some(root) = self.scene_root() {
                self.add_child(root, node, None);
            }
            // create_default_node registered it in the bag
        }
        let first = self.bindable_bag.stack(kind).bag.first().copied()?;
        self.bind_push(kind, first);
        self.bindable_bag.stack(kind).top()
    }

    /// Bind a node: deactivates the current top, then activates `id`.
    /// Binding the already-active node is a no-op.
    pub fn bind_push(&mut self, kind: BindableKind, id: NodeId) {
        let stack = self.bindable_bag.stack_mut(kind);
        if stack.top() == Some(id) {
            return;
        }
        let old_top = stack.top();
        stack.stack.push(id);
        if let Some(old) = old_top {
            self.set_bind_active(old, false);
        }
        self.set_bind_active(id, true);
    }

    /// Unbind a node. Only the top of the stack can be popped; the node
    /// below, if any, becomes active again.
    pub fn bind_pop(&mut self, kind: BindableKind, id: NodeId) {
        let stack = self.bindable_bag.stack_mut(kind);
        if stack.top() != Some(id) {
            return;
        }
        stack.stack.pop();
        let new_top = stack.top();
        self.set_bind_active(id, false);
        if let Some(top) = new_top {
            self.set_bind_active(top, true);
        }
    }

    /// Swap the top of the stack for `id` without growing the history.
    pub fn bind_replace_top(&mut self, kind: BindableKind, id: NodeId) {
        let stack = self.bindable_bag.stack_mut(kind);
        if stack.top() == Some(id) {
            return;
        }
        let old_top = stack.stack.pop();
        stack.stack.push(id);
        if let Some(old) = old_top {
            self.set_bind_active(old, false);
        }
        self.set_bind_active(id, true);
    }

    /// Move the binding within the bag. With one or no candidates this is a
    /// no-op; `Next`/`Prev` wrap around and only consider bindables with a
    /// non-empty `description`.
    pub fn switch_bindable(&mut self, kind: BindableKind, target: SwitchTarget) {
        let bag = self.bindable_bag.stack(kind).bag.clone();
        let n = bag.len();
        if n <= 1 {
            return;
        }
        match target {
            SwitchTarget::First => self.bind_replace_top(kind, bag[0]),
            SwitchTarget::Last => self.bind_replace_top(kind, bag[n - 1]),
            SwitchTarget::Next | SwitchTarget::Prev => {
                let current = self
                    .bindable_bag
                    .stack(kind)
                    .top()
                    .and_then(|top| bag.iter().position(|&b| b == top))
                    .unwrap_or(0);
                let step = if target == SwitchTarget::Next { 1 } else { n - 1 };
                let mut i = (current + step) % n;
                while i != current {
                    let named = self
                        .node(bag[i])
                        .map(|node| !node.str_field("description").is_empty())
                        .unwrap_or(false);
                    if named {
                        self.bind_replace_top(kind, bag[i]);
                        return;
                    }
                    i = (i + step) % n;
                }
                warn!(?kind, "no other described bindable to switch to");
            }
        }
    }

    /// React to a `set_bind` field change on a bindable node.
    pub(crate) fn bind_apply(&mut self, id: NodeId, bind: bool) {
        let Some(kind) = self.node(id).and_then(|n| BindableKind::of(&n.kind)) else {
            return;
        };
        if bind {
            self.bind_push(kind, id);
        } else {
            self.bind_pop(kind, id);
        }
    }

    /// Announce (de)activation to the node itself.
    fn set_bind_active(&mut self, id: NodeId, active: bool) {
        self.post_message(id, "isActive", FieldValue::Bool(active));
    }
}
