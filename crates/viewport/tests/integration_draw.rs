//! Integration tests for synchronous drawing.
//!
//! Tests end-to-end: entity or JSON input -> SceneSync -> scene graph nodes and render snapshot.

use glam::Vec3;
use serde_json::json;
use vcad_viewport_lib::fixtures::*;
use vcad_viewport_lib::grouping::ColorStrategy;
use vcad_viewport_lib::harness::TestHarness;
use vcad_viewport_lib::scene::{
    BezierCurve, BezierSurface, DrawOptions, DrawingType, Entity, Line, NodeContent, Polyline, TextTag,
};
use vcad_viewport_lib::validation::MeshValidator;

fn harness() -> TestHarness {
    TestHarness::new().unwrap()
}

#[test]
fn test_three_points_single_batch() {
    let h = harness();
    let name = h.draw(&Entity::Points(three_points()), None, None).unwrap();
    assert_eq!(h.point_batches(&name), vec![3]);
    assert_eq!(h.batch_colors(&name), vec![[1.0, 0.0, 0.0]]);
}

#[test]
fn test_three_points_three_colours() {
    let h = harness();
    let opts = DrawOptions::default().with_colours(["#ff0000", "#00ff00", "#0000ff"]);
    let name = h.draw_json(&three_points_json(), Some(&opts), None).unwrap();
    assert_eq!(h.point_batches(&name), vec![1, 1, 1]);
    assert_eq!(
        h.batch_colors(&name),
        vec![[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]]
    );
}

#[test]
fn test_strategies_change_batching() {
    let h = harness();
    let colours = colours(&["#ff0000", "#00ff00"]);
    let points = points_on_x(5);

    let first = DrawOptions::default()
        .with_colours(colours.clone())
        .with_strategy(ColorStrategy::FirstColorForAll);
    let name = h.draw(&Entity::Points(points.clone()), Some(&first), None).unwrap();
    assert_eq!(h.point_batches(&name), vec![5]);

    let remainder = DrawOptions::default().with_colours(colours.clone());
    let name = h.draw(&Entity::Points(points.clone()), Some(&remainder), None).unwrap();
    assert_eq!(h.point_batches(&name), vec![1, 4]);

    let repeat = DrawOptions::default()
        .with_colours(colours)
        .with_strategy(ColorStrategy::RepeatColors);
    let name = h.draw(&Entity::Points(points), Some(&repeat), None).unwrap();
    assert_eq!(h.point_batches(&name), vec![3, 2]);
}

#[test]
fn test_updatable_points_move_in_place() {
    let h = harness();
    let opts = DrawOptions::updatable();
    let name = h.draw(&Entity::Points(three_points()), Some(&opts), None).unwrap();
    let version = h.sync.borrow().scene().version();

    let moved: Vec<Vec3> = three_points().into_iter().map(|p| p * 2.0).collect();
    let again = h.draw(&Entity::Points(moved), None, Some(&name)).unwrap();

    assert_eq!(again, name);
    assert!(h.sync.borrow().scene().version() > version);
    match h.content(&name) {
        Some(NodeContent::Points(batches)) => assert_eq!(batches[0].positions[0], Vec3::new(2.0, -4.0, 6.0)),
        other => panic!("expected points, got {other:?}"),
    }
}

#[test]
fn test_four_points_over_three_replaces_node() {
    let h = harness();
    let opts = DrawOptions::updatable();
    let name = h.draw(&Entity::Points(three_points()), Some(&opts), None).unwrap();
    let replaced = h.draw(&Entity::Points(points_on_x(4)), Some(&opts), Some(&name)).unwrap();

    assert_ne!(replaced, name);
    assert!(!h.exists(&name));
    assert!(h.exists(&replaced));
    assert_eq!(h.point_batches(&replaced), vec![4]);
    assert_eq!(h.node_count(), 1);
}

#[test]
fn test_json_classification_picks_drawing_type() {
    let h = harness();
    let cases = [
        (json!([1, 2, 3]), DrawingType::Point),
        (json!([[0, 0, 0], [1, 1, 1]]), DrawingType::Points),
        (json!({ "start": [0, 0, 0], "end": [1, 0, 0] }), DrawingType::Line),
        (json!({ "points": [[0, 0, 0], [1, 0, 0], [1, 1, 0]], "isClosed": true }), DrawingType::Polyline),
        (json!({ "text": "hello", "position": [0, 1, 0] }), DrawingType::Tag),
        (mesh_json(&unit_cube_mesh()), DrawingType::KernelMesh),
    ];
    for (value, expected) in cases {
        let name = h.draw_json(&value, None, None).unwrap_or_else(|| panic!("nothing drawn for {value}"));
        let tagged = h.sync.borrow().scene().tag(&name).map(|t| t.drawing_type);
        assert_eq!(tagged, Some(expected), "input {value}");
    }
}

#[test]
fn test_unclassifiable_input_draws_nothing() {
    let h = harness();
    assert!(h.draw_json(&json!({ "foo": 1 }), None, None).is_none());
    assert!(h.draw_json(&json!("text"), None, None).is_none());
    assert_eq!(h.node_count(), 0);
}

#[test]
fn test_type_mismatch_keeps_previous() {
    let h = harness();
    let name = h.draw(&Entity::Points(three_points()), None, None).unwrap();
    let line = Entity::Line(Line { start: Vec3::ZERO, end: Vec3::X });
    assert!(h.draw(&line, None, Some(&name)).is_none());
    assert!(h.exists(&name));
}

#[test]
fn test_missing_previous_draws_fresh() {
    let h = harness();
    let name = h.draw(&Entity::Points(three_points()), None, Some("points-gone")).unwrap();
    assert_ne!(name, "points-gone");
    assert!(h.exists(&name));
}

#[test]
fn test_polyline_own_colour_wins() {
    let h = harness();
    let red = Polyline {
        points: vec![Vec3::ZERO, Vec3::X, Vec3::Y],
        closed: true,
        color: None,
    };
    let green = Polyline {
        points: vec![Vec3::Z, Vec3::ONE],
        closed: false,
        color: Some("#00ff00".to_string()),
    };
    let name = h.draw(&Entity::Polylines(vec![red, green]), None, None).unwrap();
    assert_eq!(h.line_batches(&name), vec![1, 1]);
    assert_eq!(h.batch_colors(&name), vec![[1.0, 0.0, 0.0], [0.0, 1.0, 0.0]]);

    // The closed triangle comes back to its start: 3 segments
    let snapshot = h.snapshot();
    assert_eq!(snapshot.lines[0].vertices.len(), 3 * 2 * 3);
}

#[test]
fn test_cube_mesh_structure() {
    let h = harness();
    let opts = DrawOptions {
        draw_vertices: true,
        ..DrawOptions::default()
    };
    let name = h.draw(&Entity::DecomposedMesh(unit_cube_mesh()), Some(&opts), None).unwrap();

    // back faces, faces, edges, vertices
    assert_eq!(h.sync.borrow().scene().children(&name).len(), 4);

    let meshes = h.meshes(&name);
    assert_eq!(meshes.len(), 2);
    let front = &meshes[1];
    let v = MeshValidator::new(front);
    assert!(v.validate_all().is_empty(), "{:?}", v.validate_all());
    assert_eq!(v.triangle_count(), 12);
    assert!(v.normals_agree_with_winding());
    assert!(v.assert_dimensions_approx([1.0, 1.0, 1.0], 1e-5));

    // Back faces: same positions, reversed winding, flipped normals
    let back = &meshes[0];
    assert_eq!(back.positions, front.positions);
    assert_eq!(back.normal(0), -front.normal(0));
    assert_ne!(&back.indices[..3], &front.indices[..3]);
    assert!(MeshValidator::new(back).normals_agree_with_winding());
}

#[test]
fn test_cube_without_normals_gets_computed_ones() {
    let h = harness();
    let opts = DrawOptions {
        draw_two_sided: false,
        ..DrawOptions::default()
    };
    let name = h.draw(&Entity::DecomposedMesh(cube_mesh_without_normals()), Some(&opts), None).unwrap();
    let meshes = h.meshes(&name);
    assert_eq!(meshes.len(), 1);
    assert!(MeshValidator::new(&meshes[0]).are_normals_normalized(1e-4));
}

#[test]
fn test_mesh_redraw_keeps_name() {
    let h = harness();
    let name = h.draw(&Entity::DecomposedMesh(unit_cube_mesh()), None, None).unwrap();
    let bigger = box_mesh(Vec3::ZERO, Vec3::splat(3.0));
    let again = h.draw(&Entity::DecomposedMesh(bigger), None, Some(&name)).unwrap();
    assert_eq!(again, name);

    let bounds = h.sync.borrow().scene().world_bounds(&name).unwrap();
    assert!((bounds.size() - Vec3::splat(3.0)).length() < 1e-5);
}

#[test]
fn test_surface_draws_faces_and_boundary() {
    let h = harness();
    let opts = DrawOptions {
        tessellation_segments: 8,
        draw_two_sided: false,
        ..DrawOptions::default()
    };
    let name = h.draw(&Entity::Surface(bezier_patch()), Some(&opts), None).unwrap();
    let meshes = h.meshes(&name);
    assert_eq!(meshes.len(), 1);
    assert_eq!(meshes[0].triangle_count(), 8 * 8 * 2);

    let edges: Vec<String> = h.sync.borrow().scene().children(&name).to_vec();
    let boundary = edges.iter().find_map(|c| match h.content(c) {
        Some(NodeContent::Lines(batches)) => Some(batches[0].polylines.len()),
        _ => None,
    });
    assert_eq!(boundary, Some(4));
}

#[test]
fn test_tags_update_in_place() {
    let h = harness();
    let name = h
        .draw(&Entity::Tags(vec![TextTag::new("a", Vec3::ZERO), TextTag::new("b", Vec3::X)]), None, None)
        .unwrap();
    let again = h.draw(&Entity::Tag(TextTag::new("c", Vec3::Y)), None, Some(&name));
    // Singular and plural tags are different drawing types
    assert!(again.is_none());

    let again = h.draw(&Entity::Tags(vec![TextTag::new("c", Vec3::Y)]), None, Some(&name)).unwrap();
    assert_eq!(again, name);
    let snapshot = h.snapshot();
    assert_eq!(snapshot.labels.len(), 1);
    assert_eq!(snapshot.labels[0].text, "c");
}

#[test]
fn test_hidden_node_not_rendered() {
    let h = harness();
    let opts = DrawOptions {
        hidden: true,
        ..DrawOptions::default()
    };
    let name = h.draw(&Entity::Points(three_points()), Some(&opts), None).unwrap();
    assert!(h.exists(&name));
    assert!(h.snapshot().instances.is_empty());
}

#[test]
fn test_materials_shared_across_draws() {
    let h = harness();
    h.draw(&Entity::Points(three_points()), None, None);
    h.draw(&Entity::Points(points_on_x(10)), None, None);
    h.draw(
        &Entity::Lines(vec![Line { start: Vec3::ZERO, end: Vec3::X }]),
        None,
        None,
    );
    // All three use the default red at full opacity
    assert_eq!(h.material_count(), 1);

    let snapshot = h.snapshot();
    let ids: Vec<u64> = snapshot
        .instances
        .iter()
        .map(|i| i.material_id)
        .chain(snapshot.lines.iter().map(|l| l.material_id))
        .collect();
    assert!(ids.windows(2).all(|w| w[0] == w[1]));
}

#[test]
fn test_transparent_meshes_sorted_last() {
    let h = harness();
    let glass = DrawOptions {
        face_opacity: 0.4,
        draw_two_sided: false,
        draw_edges: false,
        ..DrawOptions::default()
    };
    let solid = DrawOptions {
        draw_two_sided: false,
        draw_edges: false,
        ..DrawOptions::default()
    };
    h.draw(&Entity::DecomposedMesh(unit_cube_mesh()), Some(&glass), None);
    h.draw(&Entity::DecomposedMesh(box_mesh(Vec3::X * 3.0, Vec3::ONE)), Some(&solid), None);

    let snapshot = h.snapshot();
    assert_eq!(snapshot.meshes.len(), 2);
    assert_eq!(snapshot.meshes[0].color[3], 1.0);
    assert!(snapshot.meshes[1].color[3] < 1.0);
}

#[test]
fn test_remove_is_idempotent() {
    let h = harness();
    let name = h.draw(&Entity::DecomposedMesh(unit_cube_mesh()), None, None).unwrap();
    assert!(h.remove(&name));
    assert!(!h.remove(&name));
    assert_eq!(h.node_count(), 0);
}

fn arc(lift: f32) -> BezierCurve {
    BezierCurve::new(vec![Vec3::ZERO, Vec3::new(1.0, lift, 0.0), Vec3::X * 2.0])
}

fn raised_patch(lift: f32) -> BezierSurface {
    BezierSurface::new(
        (0..3)
            .map(|j| (0..3).map(|i| Vec3::new(i as f32, lift, j as f32)).collect())
            .collect(),
    )
}

#[test]
fn test_every_kind_redraws_under_same_name() {
    let segment = |y: f32| Line { start: Vec3::new(0.0, y, 0.0), end: Vec3::new(1.0, y, 0.0) };
    let path = |y: f32| Polyline::open(vec![Vec3::ZERO, Vec3::new(1.0, y, 0.0), Vec3::X * 2.0]);
    let cases = [
        (Entity::Point(Vec3::ZERO), Entity::Point(Vec3::ONE)),
        (Entity::Points(three_points()), Entity::Points(points_on_x(3))),
        (Entity::Line(segment(0.0)), Entity::Line(segment(2.0))),
        (
            Entity::Lines(vec![segment(0.0), segment(1.0)]),
            Entity::Lines(vec![segment(3.0), segment(4.0)]),
        ),
        (Entity::Polyline(path(0.5)), Entity::Polyline(path(-0.5))),
        (
            Entity::Polylines(vec![path(0.5), path(1.0)]),
            Entity::Polylines(vec![path(-0.5), path(-1.0)]),
        ),
        (Entity::Curve(arc(1.0)), Entity::Curve(arc(-1.0))),
        (Entity::Curves(vec![arc(1.0), arc(2.0)]), Entity::Curves(vec![arc(-1.0), arc(-2.0)])),
        (Entity::Surface(raised_patch(0.0)), Entity::Surface(raised_patch(1.0))),
        (
            Entity::Surfaces(vec![raised_patch(0.0), raised_patch(2.0)]),
            Entity::Surfaces(vec![raised_patch(1.0), raised_patch(3.0)]),
        ),
        (
            Entity::DecomposedMeshes(vec![unit_cube_mesh()]),
            Entity::DecomposedMeshes(vec![box_mesh(Vec3::Y, Vec3::ONE)]),
        ),
        (
            Entity::Tag(TextTag::new("a", Vec3::ZERO)),
            Entity::Tag(TextTag::new("b", Vec3::X)),
        ),
    ];

    let opts = DrawOptions::updatable();
    for (first, second) in cases {
        let h = harness();
        let name = h.draw(&first, Some(&opts), None).unwrap();
        let expected = first.drawing_type();
        assert_eq!(h.sync.borrow().scene().tag(&name).map(|t| t.drawing_type), Some(expected));

        let again = h.draw(&second, None, Some(&name));
        assert_eq!(again.as_deref(), Some(name.as_str()), "{expected:?}");
        assert_eq!(h.sync.borrow().scene().roots().len(), 1, "{expected:?}");
        assert_eq!(h.sync.borrow().scene().tag(&name).map(|t| t.drawing_type), Some(expected));
    }
}

#[test]
fn test_redrawn_lines_take_new_geometry() {
    let h = harness();
    let opts = DrawOptions::updatable();
    let name = h.draw(&Entity::Curve(arc(1.0)), Some(&opts), None).unwrap();
    let before = h.sync.borrow().scene().world_bounds(&name).unwrap();

    h.draw(&Entity::Curve(arc(-1.0)), None, Some(&name)).unwrap();
    let after = h.sync.borrow().scene().world_bounds(&name).unwrap();
    assert!(before.min.y >= -1e-5);
    assert!(after.max.y <= 1e-5);
    assert!(after.min.y < -0.1);
}
