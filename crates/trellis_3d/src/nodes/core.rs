//! Core nodes: scene root, plain grouping, switch, world info, metadata.

use crate::mesh::GeometryCache;
use crate::node::{NodeClass, NodeInit};
use crate::registry::NodeDescriptor;

use super::{NodeKind, CHILD, GROUPING, METADATA};

pub const SCENE: NodeDescriptor = NodeDescriptor {
    name: "Scene",
    component: "Core",
    classes: GROUPING,
    build: build_scene,
};

fn build_scene(init: &mut NodeInit, _cache: &mut GeometryCache) -> NodeKind {
    init.bool_field("render", true);
    init.string_field("pickMode", "idBuf");
    init.bool_field("doPickPass", true);
    init.many("children", NodeClass::Child);
    NodeKind::SceneRoot
}

pub const GROUP: NodeDescriptor = NodeDescriptor {
    name: "Group",
    component: "Grouping",
    classes: GROUPING,
    build: build_group,
};

fn build_group(init: &mut NodeInit, _cache: &mut GeometryCache) -> NodeKind {
    init.bool_field("render", true);
    init.many("children", NodeClass::Child);
    NodeKind::Group
}

pub const SWITCH: NodeDescriptor = NodeDescriptor {
    name: "Switch",
    component: "Grouping",
    classes: GROUPING,
    build: build_switch,
};

fn build_switch(init: &mut NodeInit, _cache: &mut GeometryCache) -> NodeKind {
    init.bool_field("render", true);
    init.int_field("whichChoice", -1);
    init.many("children", NodeClass::Child);
    NodeKind::Switch
}

pub const FIELD_NODE: NodeDescriptor = NodeDescriptor {
    name: "Field",
    component: "Core",
    classes: CHILD,
    build: build_field,
};

fn build_field(init: &mut NodeInit, _cache: &mut GeometryCache) -> NodeKind {
    init.string_field("name", "");
    init.string_field("type", "");
    init.string_field("value", "");
    NodeKind::Field
}

pub const WORLD_INFO: NodeDescriptor = NodeDescriptor {
    name: "WorldInfo",
    component: "Core",
    classes: CHILD,
    build: build_world_info,
};

fn build_world_info(init: &mut NodeInit, _cache: &mut GeometryCache) -> NodeKind {
    init.strings_field("info", &[]);
    init.string_field("title", "");
    NodeKind::WorldInfo
}

fn metadata_common(init: &mut NodeInit) {
    init.string_field("name", "");
    init.string_field("reference", "");
}

pub const METADATA_DOUBLE: NodeDescriptor = NodeDescriptor {
    name: "MetadataDouble",
    component: "Core",
    classes: METADATA,
    build: |init, _| {
        metadata_common(init);
        init.floats_field("value", &[]);
        NodeKind::MetadataDouble
    },
};

pub const METADATA_FLOAT: NodeDescriptor = NodeDescriptor {
    name: "MetadataFloat",
    component: "Core",
    classes: METADATA,
    build: |init, _| {
        metadata_common(init);
        init.floats_field("value", &[]);
        NodeKind::MetadataFloat
    },
};

pub const METADATA_INTEGER: NodeDescriptor = NodeDescriptor {
    name: "MetadataInteger",
    component: "Core",
    classes: METADATA,
    build: |init, _| {
        metadata_common(init);
        init.ints_field("value", &[]);
        NodeKind::MetadataInteger
    },
};

pub const METADATA_STRING: NodeDescriptor = NodeDescriptor {
    name: "MetadataString",
    component: "Core",
    classes: METADATA,
    build: |init, _| {
        metadata_common(init);
        init.strings_field("value", &[]);
        NodeKind::MetadataString
    },
};

pub const METADATA_SET: NodeDescriptor = NodeDescriptor {
    name: "MetadataSet",
    component: "Core",
    classes: METADATA,
    build: |init, _| {
        metadata_common(init);
        init.many("value", NodeClass::Metadata);
        NodeKind::MetadataSet
    },
};
