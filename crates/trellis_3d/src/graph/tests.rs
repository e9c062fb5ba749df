use std::sync::Arc;

use glam::{Mat4, Vec3};
use trellis_core::element::DeclElement;
use trellis_core::SceneElement;
use trellis_core::field::FieldValue;

use crate::bindable::{BindableKind, SwitchTarget};
use crate::math::Ray;
use crate::mesh::{calc_tex_coords, TexGenMode};
use crate::nodes::{NodeKind, RenderHandle};

use super::SceneGraph;

fn build(element: &DeclElement) -> (SceneGraph, crate::node::NodeId) {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    let mut graph = SceneGraph::new();
    let space = graph.root_space();
    let root = graph.build_tree(space, element).unwrap();
    (graph, root)
}

fn shape_with_box() -> DeclElement {
    DeclElement::new("Shape").with_child(DeclElement::new("Box"))
}

// Tree building

#[test]
fn test_build_is_case_insensitive() {
    let el = DeclElement::new("scene").with_child(
        DeclElement::new("SHAPE").with_child(DeclElement::new("box")),
    );
    let (graph, root) = build(&el);
    assert!(matches!(graph.node(root).unwrap().kind, NodeKind::SceneRoot));
    assert!(graph.find(root, "Shape").is_some());
    assert!(graph.find(root, "Box").is_some());
}

#[test]
fn test_unrecognized_elements_are_skipped() {
    let el = DeclElement::new("Scene")
        .with_child(DeclElement::new("NoSuchNode").with_child(shape_with_box()))
        .with_child(shape_with_box());
    let (graph, root) = build(&el);
    // The subtree under the unknown element is gone entirely.
    assert_eq!(graph.find_all(root, "Shape").len(), 1);
}

#[test]
fn test_def_use_shares_one_node() {
    let el = DeclElement::new("Scene")
        .with_child(
            DeclElement::new("Transform")
                .with_attr("translation", "2 0 0")
                .with_child(shape_with_box().with_attr("DEF", "ball")),
        )
        .with_child(
            DeclElement::new("Transform")
                .with_attr("translation", "-2 0 0")
                .with_child(DeclElement::new("Shape").with_attr("USE", "ball")),
        );
    let (graph, root) = build(&el);
    // One node, reachable on both paths.
    let shapes = graph.find_all(root, "Shape");
    assert_eq!(shapes.len(), 2);
    assert_eq!(shapes[0], shapes[1]);
    let shape = graph.find(root, "Shape").unwrap();
    assert_eq!(graph.node(shape).unwrap().parents().len(), 2);
    assert_eq!(graph.node(shape).unwrap().def_name.as_deref(), Some("ball"));
}

#[test]
fn test_dangling_use_builds_nothing() {
    let el = DeclElement::new("Scene")
        .with_child(DeclElement::new("Shape").with_attr("USE", "nowhere"));
    let (graph, root) = build(&el);
    assert!(graph.find(root, "Shape").is_none());
}

#[test]
fn test_container_field_picks_the_slot() {
    // A MetadataSet holds other metadata under "value"; the attribute names
    // the slot explicitly.
    let el = DeclElement::new("MetadataSet").with_child(
        DeclElement::new("MetadataString")
            .with_attr("containerField", "value")
            .with_attr("name", "author"),
    );
    let (graph, root) = build(&el);
    let node = graph.node(root).unwrap();
    assert!(node.child_in_slot("value").is_some());
    assert!(node.child_in_slot("metadata").is_none());
}

#[test]
fn test_wrong_container_field_is_rejected() {
    let el = DeclElement::new("Shape").with_child(
        DeclElement::new("Box").with_attr("containerField", "appearance"),
    );
    let (graph, root) = build(&el);
    assert!(graph.node(root).unwrap().child_in_slot("geometry").is_none());
}

#[test]
fn test_single_slot_displaces_previous_child() {
    let el = shape_with_box();
    let (mut graph, shape) = build(&el);
    let first = graph.node(shape).unwrap().child_in_slot("geometry").unwrap();
    let space = graph.root_space();
    let sphere = graph
        .create_node("Sphere", space, None)
        .unwrap();
    assert!(graph.add_child(shape, sphere, Some("geometry")));
    assert_eq!(graph.node(shape).unwrap().child_in_slot("geometry"), Some(sphere));
    assert!(graph.node(first).unwrap().parents().is_empty());
}

#[test]
fn test_shape_gets_default_appearance_and_material() {
    let (graph, shape) = build(&shape_with_box());
    let app = graph.node(shape).unwrap().child_in_slot("appearance").unwrap();
    assert!(graph.node(app).unwrap().auto_gen);
    let mat = graph.node(app).unwrap().child_in_slot("material").unwrap();
    assert!(matches!(graph.node(mat).unwrap().kind, NodeKind::Material));
}

#[test]
fn test_declared_appearance_is_kept() {
    let el = DeclElement::new("Shape")
        .with_child(DeclElement::new("Appearance").with_child(
            DeclElement::new("Material").with_attr("diffuseColor", "1 0 0"),
        ))
        .with_child(DeclElement::new("Box"));
    let (graph, shape) = build(&el);
    let app = graph.node(shape).unwrap().child_in_slot("appearance").unwrap();
    assert!(!graph.node(app).unwrap().auto_gen);
    let mat = graph.node(app).unwrap().child_in_slot("material").unwrap();
    assert_eq!(
        graph.node(mat).unwrap().vec3_field("diffuseColor"),
        Vec3::new(1.0, 0.0, 0.0)
    );
}

#[test]
fn test_element_binds_only_once() {
    let el = shape_with_box();
    let mut graph = SceneGraph::new();
    let space = graph.root_space();
    let first = graph.build_tree(space, &el);
    assert!(first.is_some());
    // Rebinding hands back the existing node instead of building again.
    assert_eq!(graph.build_tree(space, &el), first);
    assert_eq!(graph.node_count(), 4); // shape, box, default appearance, material
    assert_eq!(graph.node_for_element(el.key()), first);
}

#[test]
fn test_field_declarations_build_as_nodes() {
    let el = DeclElement::new("Scene").with_child(
        DeclElement::new("Field")
            .with_attr("name", "speed")
            .with_attr("type", "SFFloat")
            .with_attr("value", "1.5"),
    );
    let (graph, root) = build(&el);
    let field = graph.find(root, "Field").unwrap();
    let node = graph.node(field).unwrap();
    assert!(matches!(node.kind, NodeKind::Field));
    assert_eq!(node.str_field("name"), "speed");
    assert_eq!(node.str_field("value"), "1.5");
}

#[test]
fn test_scene_root_is_captured_once() {
    let el = DeclElement::new("Scene").with_child(DeclElement::new("Scene"));
    let (graph, root) = build(&el);
    assert_eq!(graph.scene_root(), Some(root));
}

// Routes

#[test]
fn test_route_propagates_between_fields() {
    let el = DeclElement::new("Scene")
        .with_child(DeclElement::new("Transform").with_attr("DEF", "a"))
        .with_child(DeclElement::new("Transform").with_attr("DEF", "b"))
        .with_child(
            DeclElement::new("ROUTE")
                .with_attr("fromNode", "a")
                .with_attr("fromField", "translation")
                .with_attr("toNode", "b")
                .with_attr("toField", "translation"),
        );
    let (mut graph, root) = build(&el);
    assert_eq!(graph.routes().len(), 1);

    let a = graph.space(graph.root_space()).unwrap().def("a").unwrap();
    let b = graph.space(graph.root_space()).unwrap().def("b").unwrap();
    graph.post_message(a, "translation", FieldValue::Vec3(Vec3::new(3.0, 0.0, 0.0)));

    assert_eq!(
        graph.node(b).unwrap().vec3_field("translation"),
        Vec3::new(3.0, 0.0, 0.0)
    );
    // The destination's change hook ran: the cached matrix moved too.
    let m = graph.node(b).unwrap().kind.local_matrix();
    assert_eq!(m.transform_point3(Vec3::ZERO), Vec3::new(3.0, 0.0, 0.0));
    let _ = root;
}

#[test]
fn test_route_accepts_event_aliases() {
    let el = DeclElement::new("Scene")
        .with_child(DeclElement::new("Transform").with_attr("DEF", "a"))
        .with_child(DeclElement::new("Transform").with_attr("DEF", "b"));
    let (mut graph, _) = build(&el);
    let a = graph.space(graph.root_space()).unwrap().def("a").unwrap();
    let b = graph.space(graph.root_space()).unwrap().def("b").unwrap();
    assert!(graph.setup_route(a, "translation_changed", b, "set_translation"));
    assert_eq!(graph.routes()[0].from_field, "translation");
    assert_eq!(graph.routes()[0].to_field, "translation");
}

#[test]
fn test_route_with_missing_endpoint_is_discarded() {
    let el = DeclElement::new("Scene")
        .with_child(DeclElement::new("Transform").with_attr("DEF", "a"))
        .with_child(
            DeclElement::new("ROUTE")
                .with_attr("fromNode", "a")
                .with_attr("fromField", "translation")
                .with_attr("toNode", "ghost")
                .with_attr("toField", "translation"),
        );
    let (graph, _) = build(&el);
    assert!(graph.routes().is_empty());
}

#[test]
fn test_route_cycle_terminates() {
    let el = DeclElement::new("Scene")
        .with_child(DeclElement::new("Transform").with_attr("DEF", "a"))
        .with_child(DeclElement::new("Transform").with_attr("DEF", "b"));
    let (mut graph, _) = build(&el);
    let a = graph.space(graph.root_space()).unwrap().def("a").unwrap();
    let b = graph.space(graph.root_space()).unwrap().def("b").unwrap();
    graph.setup_route(a, "translation", b, "translation");
    graph.setup_route(b, "translation", a, "translation");

    graph.post_message(a, "translation", FieldValue::Vec3(Vec3::ONE));
    assert_eq!(graph.node(b).unwrap().vec3_field("translation"), Vec3::ONE);
}

#[test]
fn test_fan_in_routes_deliver_every_event() {
    let el = DeclElement::new("Scene")
        .with_child(DeclElement::new("Viewpoint").with_attr("DEF", "v1"))
        .with_child(DeclElement::new("Viewpoint").with_attr("DEF", "v2"))
        .with_child(DeclElement::new("Group").with_attr("DEF", "g"))
        .with_child(DeclElement::new("Group").with_attr("DEF", "trigger"));
    let (mut graph, _) = build(&el);
    let def = |graph: &SceneGraph, name| {
        graph.space(graph.root_space()).unwrap().def(name).unwrap()
    };
    let (v1, v2) = (def(&graph, "v1"), def(&graph, "v2"));
    let (g, trigger) = (def(&graph, "g"), def(&graph, "trigger"));
    assert!(graph.setup_route(trigger, "render", v2, "set_bind"));
    assert!(graph.setup_route(v1, "isActive", g, "render"));
    assert!(graph.setup_route(v2, "isActive", g, "render"));

    graph.bind_push(BindableKind::Viewpoint, v1);
    assert!(graph.node(g).unwrap().bool_field("render"));

    // One wave: trigger binds v2, which posts isActive false to v1 and true
    // to v2. Both land on the group; the activation arrives last.
    graph.post_message(trigger, "render", FieldValue::Bool(true));
    assert_eq!(graph.bindables(BindableKind::Viewpoint).top(), Some(v2));
    assert!(!graph.node(v1).unwrap().bool_field("isActive"));
    assert!(graph.node(g).unwrap().bool_field("render"));
}

#[test]
fn test_update_field_does_not_route() {
    let el = DeclElement::new("Scene")
        .with_child(DeclElement::new("Transform").with_attr("DEF", "a"))
        .with_child(DeclElement::new("Transform").with_attr("DEF", "b"));
    let (mut graph, _) = build(&el);
    let a = graph.space(graph.root_space()).unwrap().def("a").unwrap();
    let b = graph.space(graph.root_space()).unwrap().def("b").unwrap();
    graph.setup_route(a, "translation", b, "translation");

    assert!(graph.update_field(a, "translation", "7 0 0"));
    assert_eq!(
        graph.node(a).unwrap().vec3_field("translation"),
        Vec3::new(7.0, 0.0, 0.0)
    );
    assert_eq!(graph.node(b).unwrap().vec3_field("translation"), Vec3::ZERO);
}

#[test]
fn test_update_field_matches_name_case_insensitively() {
    let (mut graph, _) = build(&DeclElement::new("Scene"));
    let space = graph.root_space();
    let t = graph.create_node("Transform", space, None).unwrap();
    assert!(graph.update_field(t, "TRANSLATION", "1 2 3"));
    assert_eq!(
        graph.node(t).unwrap().vec3_field("translation"),
        Vec3::new(1.0, 2.0, 3.0)
    );
    assert!(!graph.update_field(t, "noSuchField", "1"));
}

#[test]
fn test_update_field_coerces_bools_and_strings() {
    let (mut graph, shape) = build(&shape_with_box());
    assert!(graph.update_field(shape, "render", "maybe"));
    assert!(!graph.node(shape).unwrap().bool_field("render"));
    assert!(graph.update_field(shape, "render", "TRUE"));
    assert!(graph.node(shape).unwrap().bool_field("render"));
}

// Bindables

#[test]
fn test_default_viewpoint_is_synthesized() {
    let (mut graph, root) = build(&DeclElement::new("Scene"));
    let vp = graph.active_bindable(BindableKind::Viewpoint).unwrap();
    let node = graph.node(vp).unwrap();
    assert!(node.auto_gen);
    assert!(node.bool_field("isActive"));
    assert_eq!(node.vec3_field("position"), Vec3::new(0.0, 0.0, 10.0));
    assert!(graph.node(root).unwrap().children().any(|c| c == vp));
    // Asking again reuses the synthesized node.
    assert_eq!(graph.active_bindable(BindableKind::Viewpoint), Some(vp));
    assert_eq!(graph.find_all(root, "Viewpoint").len(), 1);
}

#[test]
fn test_bind_stack_push_and_pop() {
    let el = DeclElement::new("Scene")
        .with_child(DeclElement::new("Viewpoint").with_attr("DEF", "v1"))
        .with_child(DeclElement::new("Viewpoint").with_attr("DEF", "v2"));
    let (mut graph, _) = build(&el);
    let v1 = graph.space(graph.root_space()).unwrap().def("v1").unwrap();
    let v2 = graph.space(graph.root_space()).unwrap().def("v2").unwrap();

    graph.bind_push(BindableKind::Viewpoint, v1);
    graph.bind_push(BindableKind::Viewpoint, v2);
    assert!(!graph.node(v1).unwrap().bool_field("isActive"));
    assert!(graph.node(v2).unwrap().bool_field("isActive"));

    // Popping a non-top node is ignored.
    graph.bind_pop(BindableKind::Viewpoint, v1);
    assert_eq!(graph.bindables(BindableKind::Viewpoint).top(), Some(v2));

    graph.bind_pop(BindableKind::Viewpoint, v2);
    assert_eq!(graph.bindables(BindableKind::Viewpoint).top(), Some(v1));
    assert!(graph.node(v1).unwrap().bool_field("isActive"));
}

#[test]
fn test_set_bind_field_drives_the_stack() {
    let el = DeclElement::new("Scene")
        .with_child(DeclElement::new("Viewpoint").with_attr("DEF", "v1"))
        .with_child(DeclElement::new("Viewpoint").with_attr("DEF", "v2"));
    let (mut graph, _) = build(&el);
    let v2 = graph.space(graph.root_space()).unwrap().def("v2").unwrap();

    graph.update_field(v2, "set_bind", "true");
    assert_eq!(graph.bindables(BindableKind::Viewpoint).top(), Some(v2));
    graph.update_field(v2, "set_bind", "false");
    assert_eq!(graph.bindables(BindableKind::Viewpoint).top(), None);
}

#[test]
fn test_switch_bindable_skips_unnamed_entries() {
    let el = DeclElement::new("Scene")
        .with_child(DeclElement::new("Viewpoint").with_attr("DEF", "v1"))
        .with_child(DeclElement::new("Viewpoint").with_attr("DEF", "v2"))
        .with_child(
            DeclElement::new("Viewpoint")
                .with_attr("DEF", "v3")
                .with_attr("description", "overview"),
        );
    let (mut graph, _) = build(&el);
    let v1 = graph.space(graph.root_space()).unwrap().def("v1").unwrap();
    let v3 = graph.space(graph.root_space()).unwrap().def("v3").unwrap();

    graph.bind_push(BindableKind::Viewpoint, v1);
    graph.switch_bindable(BindableKind::Viewpoint, SwitchTarget::Next);
    // v2 has no description, so the binding lands on v3.
    assert_eq!(graph.bindables(BindableKind::Viewpoint).top(), Some(v3));

    graph.switch_bindable(BindableKind::Viewpoint, SwitchTarget::First);
    assert_eq!(graph.bindables(BindableKind::Viewpoint).top(), Some(v1));
}

// Geometry

#[test]
fn test_equal_primitives_share_one_mesh() {
    let el = DeclElement::new("Scene")
        .with_child(shape_with_box())
        .with_child(shape_with_box())
        .with_child(DeclElement::new("Shape").with_child(
            DeclElement::new("Box").with_attr("size", "4 4 4"),
        ));
    let (graph, root) = build(&el);
    let boxes = graph.find_all(root, "Box");
    assert_eq!(boxes.len(), 3);
    let mesh = |id| {
        graph
            .node(id)
            .unwrap()
            .kind
            .geom()
            .unwrap()
            .mesh
            .clone()
    };
    assert!(Arc::ptr_eq(&mesh(boxes[0]), &mesh(boxes[1])));
    assert!(!Arc::ptr_eq(&mesh(boxes[0]), &mesh(boxes[2])));
}

#[test]
fn test_primitive_field_change_rebuilds_and_dirties() {
    let (mut graph, shape) = build(&shape_with_box());
    let geom = graph.node(shape).unwrap().child_in_slot("geometry").unwrap();
    graph.mark_shape_clean(shape);

    graph.update_field(geom, "size", "6 2 2");
    let state = graph.node(shape).unwrap().kind.shape().unwrap();
    assert!(state.geometry_dirty);
    let bounds = *graph.node(geom).unwrap().kind.geom().unwrap().mesh.bounds();
    assert_eq!(bounds.max, Vec3::new(3.0, 1.0, 1.0));
}

#[test]
fn test_indexed_face_set_builds_from_properties() {
    let el = DeclElement::new("Shape").with_child(
        DeclElement::new("IndexedFaceSet")
            .with_attr("coordIndex", "0 1 2 3 -1")
            .with_child(
                DeclElement::new("Coordinate").with_attr("point", "0 0 0 1 0 0 1 1 0 0 1 0"),
            ),
    );
    let (graph, shape) = build(&el);
    let ifs = graph.node(shape).unwrap().child_in_slot("geometry").unwrap();
    let mesh = &graph.node(ifs).unwrap().kind.geom().unwrap().mesh;
    assert_eq!(mesh.face_count(), 2);
    assert!(!mesh.is_empty());
}

#[test]
fn test_tex_coord_generator_selects_spherical_mapping() {
    let el = DeclElement::new("Shape").with_child(
        DeclElement::new("IndexedFaceSet")
            .with_attr("coordIndex", "0 1 2 -1")
            .with_child(
                DeclElement::new("Coordinate").with_attr("point", "1 0 0 0 1 0 0 0 1"),
            )
            .with_child(
                DeclElement::new("TextureCoordinateGenerator")
                    .with_attr("mode", "SPHERE-LOCAL"),
            ),
    );
    let (graph, shape) = build(&el);
    let ifs = graph.node(shape).unwrap().child_in_slot("geometry").unwrap();
    let mesh = &graph.node(ifs).unwrap().kind.geom().unwrap().mesh;
    let part = &mesh.parts[0];
    assert_eq!(
        part.tex_coords,
        calc_tex_coords(&part.positions, TexGenMode::Sphere)
    );
    assert_ne!(
        part.tex_coords,
        calc_tex_coords(&part.positions, TexGenMode::Plane)
    );
}

#[test]
fn test_coordinate_change_rebuilds_owner_geometry() {
    let el = DeclElement::new("Shape").with_child(
        DeclElement::new("IndexedFaceSet")
            .with_attr("coordIndex", "0 1 2 -1")
            .with_child(DeclElement::new("Coordinate").with_attr("point", "0 0 0 1 0 0 0 1 0")),
    );
    let (mut graph, shape) = build(&el);
    let ifs = graph.node(shape).unwrap().child_in_slot("geometry").unwrap();
    let coord = graph.node(ifs).unwrap().child_in_slot("coord").unwrap();
    graph.mark_shape_clean(shape);

    graph.update_field(coord, "point", "0 0 0 2 0 0 0 2 0");
    assert!(graph.node(shape).unwrap().kind.shape().unwrap().geometry_dirty);
    let bounds = *graph.node(ifs).unwrap().kind.geom().unwrap().mesh.bounds();
    assert_eq!(bounds.max, Vec3::new(2.0, 2.0, 0.0));
}

#[test]
fn test_material_change_dirties_owner_shapes() {
    let el = DeclElement::new("Shape")
        .with_child(DeclElement::new("Appearance").with_child(
            DeclElement::new("Material").with_attr("DEF", "mat"),
        ))
        .with_child(DeclElement::new("Box"));
    let (mut graph, shape) = build(&el);
    let mat = graph.space(graph.root_space()).unwrap().def("mat").unwrap();
    graph.mark_shape_clean(shape);

    graph.update_field(mat, "diffuseColor", "1 1 0");
    let state = graph.node(shape).unwrap().kind.shape().unwrap();
    assert!(state.material_dirty);
    assert!(!state.geometry_dirty);
}

// Traversal

#[test]
fn test_volume_through_transforms() {
    let el = DeclElement::new("Scene")
        .with_child(
            DeclElement::new("Transform")
                .with_attr("translation", "5 0 0")
                .with_child(shape_with_box()),
        )
        .with_child(shape_with_box());
    let (graph, root) = build(&el);
    let bb = graph.volume(root);
    assert_eq!(bb.min, Vec3::new(-1.0, -1.0, -1.0));
    assert_eq!(bb.max, Vec3::new(6.0, 1.0, 1.0));
}

#[test]
fn test_volume_without_geometry_is_empty() {
    let el = DeclElement::new("Scene").with_child(
        DeclElement::new("Group").with_child(DeclElement::new("WorldInfo")),
    );
    let (graph, root) = build(&el);
    assert!(graph.volume(root).is_empty());
}

#[test]
fn test_switch_gates_traversal() {
    let el = DeclElement::new("Scene").with_child(
        DeclElement::new("Switch")
            .with_attr("whichChoice", "1")
            .with_attr("DEF", "sw")
            .with_child(
                DeclElement::new("Transform")
                    .with_attr("translation", "100 0 0")
                    .with_child(shape_with_box()),
            )
            .with_child(shape_with_box()),
    );
    let (mut graph, root) = build(&el);

    // Searches see every choice; volume and drawables only the active one.
    assert_eq!(graph.find_all(root, "Shape").len(), 2);
    assert_eq!(graph.volume(root).max, Vec3::ONE);
    assert_eq!(graph.collect_drawables(root).len(), 1);

    let sw = graph.space(graph.root_space()).unwrap().def("sw").unwrap();
    graph.update_field(sw, "whichChoice", "-1");
    assert!(graph.find(root, "Shape").is_some());
    assert!(graph.collect_drawables(root).is_empty());
}

#[test]
fn test_current_transform_single_path() {
    let el = DeclElement::new("Scene").with_child(
        DeclElement::new("Transform")
            .with_attr("translation", "1 0 0")
            .with_child(
                DeclElement::new("Transform")
                    .with_attr("translation", "0 2 0")
                    .with_child(shape_with_box().with_attr("DEF", "s")),
            ),
    );
    let (graph, _) = build(&el);
    let shape = graph.space(graph.root_space()).unwrap().def("s").unwrap();
    let m = graph.current_transform(shape).unwrap();
    assert_eq!(m.transform_point3(Vec3::ZERO), Vec3::new(1.0, 2.0, 0.0));
}

#[test]
fn test_current_transform_ambiguous_on_shared_node() {
    let el = DeclElement::new("Scene")
        .with_child(
            DeclElement::new("Transform")
                .with_attr("DEF", "t1")
                .with_attr("translation", "1 0 0")
                .with_child(shape_with_box().with_attr("DEF", "s")),
        )
        .with_child(
            DeclElement::new("Transform")
                .with_attr("translation", "-1 0 0")
                .with_child(DeclElement::new("Shape").with_attr("USE", "s")),
        );
    let (graph, root) = build(&el);
    let shape = graph.space(graph.root_space()).unwrap().def("s").unwrap();
    assert!(graph.current_transform(shape).is_none());

    // An explicit path disambiguates.
    let t1 = graph.space(graph.root_space()).unwrap().def("t1").unwrap();
    let m = graph.transform_along_path(&[root, t1, shape]).unwrap();
    assert_eq!(m.transform_point3(Vec3::ZERO), Vec3::new(1.0, 0.0, 0.0));

    // A non-path is rejected.
    assert!(graph.transform_along_path(&[t1, root]).is_none());
}

#[test]
fn test_intersect_nearest_through_transform() {
    let el = DeclElement::new("Scene")
        .with_child(
            DeclElement::new("Transform")
                .with_attr("translation", "0 0 -5")
                .with_child(shape_with_box().with_attr("DEF", "far")),
        )
        .with_child(shape_with_box().with_attr("DEF", "near"));
    let (graph, root) = build(&el);
    let near = graph.space(graph.root_space()).unwrap().def("near").unwrap();

    let hit = graph
        .intersect(root, Ray::new(Vec3::new(0.0, 0.0, 10.0), -Vec3::Z))
        .unwrap();
    assert_eq!(hit.node, near);
    assert!((hit.distance - 9.0).abs() < 1.0e-4);
    assert!((hit.point - Vec3::new(0.0, 0.0, 1.0)).length() < 1.0e-4);
}

#[test]
fn test_intersect_scaled_transform_keeps_parameter() {
    let el = DeclElement::new("Scene").with_child(
        DeclElement::new("Transform")
            .with_attr("scale", "0.5 0.5 0.5")
            .with_child(shape_with_box()),
    );
    let (graph, root) = build(&el);
    // Scaled box spans [-0.5, 0.5]; hit at world z = 0.5, t = 9.5.
    let hit = graph
        .intersect(root, Ray::new(Vec3::new(0.0, 0.0, 10.0), -Vec3::Z))
        .unwrap();
    assert!((hit.distance - 9.5).abs() < 1.0e-4);
    assert!((hit.point.z - 0.5).abs() < 1.0e-4);
}

#[test]
fn test_unpickable_shape_is_not_hit() {
    let el = DeclElement::new("Scene").with_child(
        DeclElement::new("Shape")
            .with_attr("isPickable", "false")
            .with_child(DeclElement::new("Box")),
    );
    let (graph, root) = build(&el);
    assert!(graph
        .intersect(root, Ray::new(Vec3::new(0.0, 0.0, 10.0), -Vec3::Z))
        .is_none());
}

#[test]
fn test_collect_drawables_accumulates_transforms() {
    let el = DeclElement::new("Scene").with_child(
        DeclElement::new("Transform")
            .with_attr("translation", "1 0 0")
            .with_child(
                DeclElement::new("Transform")
                    .with_attr("translation", "0 3 0")
                    .with_child(shape_with_box()),
            ),
    );
    let (mut graph, root) = build(&el);
    let drawables = graph.collect_drawables(root);
    assert_eq!(drawables.len(), 1);
    assert_eq!(
        drawables[0].transform.transform_point3(Vec3::ZERO),
        Vec3::new(1.0, 3.0, 0.0)
    );
    assert_ne!(drawables[0].transform, Mat4::IDENTITY);
}

#[test]
fn test_drawables_serialize() {
    let (mut graph, root) = build(
        &DeclElement::new("Scene").with_child(shape_with_box()),
    );
    let drawables = graph.collect_drawables(root);
    let json = serde_json::to_string(&drawables).unwrap();
    let back: Vec<super::Drawable> = serde_json::from_str(&json).unwrap();
    assert_eq!(back.len(), 1);
    assert_eq!(back[0].shape, drawables[0].shape);
}

#[test]
fn test_render_flag_hides_shapes() {
    let el = DeclElement::new("Scene").with_child(
        DeclElement::new("Shape")
            .with_attr("render", "false")
            .with_child(DeclElement::new("Box")),
    );
    let (mut graph, root) = build(&el);
    assert!(graph.collect_drawables(root).is_empty());
}

#[test]
fn test_pick_ids_assigned_and_resolvable() {
    let el = DeclElement::new("Scene")
        .with_child(shape_with_box())
        .with_child(shape_with_box());
    let (mut graph, root) = build(&el);
    let drawables = graph.collect_drawables(root);
    assert_eq!(drawables.len(), 2);
    for d in &drawables {
        let pick_id = graph.node(d.shape).unwrap().kind.shape().unwrap().pick_id.unwrap();
        assert_eq!(graph.pick_target(pick_id), Some(d.shape));
    }
    // Collecting again assigns nothing new.
    let before: Vec<_> = drawables
        .iter()
        .map(|d| graph.node(d.shape).unwrap().kind.shape().unwrap().pick_id)
        .collect();
    let _ = graph.collect_drawables(root);
    let after: Vec<_> = drawables
        .iter()
        .map(|d| graph.node(d.shape).unwrap().kind.shape().unwrap().pick_id)
        .collect();
    assert_eq!(before, after);
}

// Teardown

#[test]
fn test_orphaned_shape_retires_renderer_resources() {
    let (mut graph, root) = build(
        &DeclElement::new("Scene").with_child(shape_with_box()),
    );
    let shape = graph.find(root, "Shape").unwrap();
    let drawables = graph.collect_drawables(root);
    assert_eq!(drawables.len(), 1);
    assert!(graph.attach_render_handle(shape, RenderHandle(7)));
    let pick_id = graph.node(shape).unwrap().kind.shape().unwrap().pick_id.unwrap();

    assert!(graph.remove_child(root, shape));
    assert_eq!(graph.drain_retired(), vec![RenderHandle(7)]);
    assert_eq!(graph.pick_target(pick_id), None);
    assert!(graph.drain_retired().is_empty());
}

#[test]
fn test_remove_node_unregisters_bindable() {
    let el = DeclElement::new("Scene")
        .with_child(DeclElement::new("Viewpoint").with_attr("DEF", "v"));
    let (mut graph, _) = build(&el);
    let v = graph.space(graph.root_space()).unwrap().def("v").unwrap();
    graph.bind_push(BindableKind::Viewpoint, v);

    graph.remove_node(v);
    assert!(graph.bindables(BindableKind::Viewpoint).top().is_none());
    assert!(graph.bindables(BindableKind::Viewpoint).bag().is_empty());
    assert!(graph.node(v).is_none());
}
