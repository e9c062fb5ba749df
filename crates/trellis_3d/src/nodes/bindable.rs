//! Bindable node kinds: viewpoint, navigation info, background, fog.
//!
//! Stack behavior lives in [`crate::bindable`]; these are the node types
//! with their common `set_bind` / `description` / `isActive` fields.

use glam::{Quat, Vec3};

use crate::mesh::GeometryCache;
use crate::node::NodeInit;
use crate::registry::NodeDescriptor;

use super::{NodeKind, BINDABLE};

fn bindable_common(init: &mut NodeInit) {
    init.bool_field("set_bind", false);
    init.string_field("description", "");
    init.bool_field("isActive", false);
}

pub const VIEWPOINT: NodeDescriptor = NodeDescriptor {
    name: "Viewpoint",
    component: "Navigation",
    classes: BINDABLE,
    build: build_viewpoint,
};

fn build_viewpoint(init: &mut NodeInit, _cache: &mut GeometryCache) -> NodeKind {
    bindable_common(init);
    init.float_field("fieldOfView", 0.785398);
    init.vec3_field("position", Vec3::new(0.0, 0.0, 10.0));
    init.rotation_field("orientation", Quat::IDENTITY);
    init.vec3_field("centerOfRotation", Vec3::ZERO);
    init.float_field("zNear", 0.1);
    init.float_field("zFar", 10000.0);
    NodeKind::Viewpoint
}

pub const NAVIGATION_INFO: NodeDescriptor = NodeDescriptor {
    name: "NavigationInfo",
    component: "Navigation",
    classes: BINDABLE,
    build: build_navigation_info,
};

fn build_navigation_info(init: &mut NodeInit, _cache: &mut GeometryCache) -> NodeKind {
    bindable_common(init);
    init.strings_field("type", &["EXAMINE", "ANY"]);
    init.floats_field("avatarSize", &[0.25, 1.6, 0.75]);
    init.bool_field("headlight", true);
    init.float_field("speed", 1.0);
    init.float_field("visibilityLimit", 0.0);
    NodeKind::NavigationInfo
}

pub const BACKGROUND: NodeDescriptor = NodeDescriptor {
    name: "Background",
    component: "EnvironmentalEffects",
    classes: BINDABLE,
    build: build_background,
};

fn build_background(init: &mut NodeInit, _cache: &mut GeometryCache) -> NodeKind {
    bindable_common(init);
    init.colors_field("skyColor", &[Vec3::ZERO]);
    init.floats_field("skyAngle", &[]);
    init.colors_field("groundColor", &[]);
    init.floats_field("groundAngle", &[]);
    init.float_field("transparency", 0.0);
    NodeKind::Background
}

pub const FOG: NodeDescriptor = NodeDescriptor {
    name: "Fog",
    component: "EnvironmentalEffects",
    classes: BINDABLE,
    build: build_fog,
};

fn build_fog(init: &mut NodeInit, _cache: &mut GeometryCache) -> NodeKind {
    bindable_common(init);
    init.color_field("color", Vec3::ONE);
    init.string_field("fogType", "LINEAR");
    init.float_field("visibilityRange", 0.0);
    NodeKind::Fog
}
