//! Drawable entities and their recognition from untyped JSON.
//!
//! Classification tests the candidate shapes in a fixed order and takes the
//! first match, so an input that could satisfy two detectors always lands on
//! the same one.

use glam::Vec3;
use serde_json::Value;
use shared::{is_handle, DecomposedMesh, HandleRef};

use super::parametric::{BezierCurve, BezierSurface};
use super::DrawingType;
use crate::mesh::decode_decomposed;

#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    pub start: Vec3,
    pub end: Vec3,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Polyline {
    pub points: Vec<Vec3>,
    pub closed: bool,
    /// Overrides the colour strategy for this polyline
    pub color: Option<String>,
}

impl Polyline {
    pub fn open(points: Vec<Vec3>) -> Self {
        Self {
            points,
            closed: false,
            color: None,
        }
    }

    /// Vertices to draw; a closed polyline repeats its first point
    pub fn vertices(&self) -> Vec<Vec3> {
        let mut out = self.points.clone();
        if self.closed && self.points.len() > 2 {
            out.push(self.points[0]);
        }
        out
    }
}

/// Text label anchored at a world position
#[derive(Debug, Clone, PartialEq)]
pub struct TextTag {
    pub text: String,
    pub position: Vec3,
    pub colour: Option<String>,
    pub size: Option<f32>,
}

impl TextTag {
    /// Tag drawn with the default colour and size
    pub fn new(text: impl Into<String>, position: Vec3) -> Self {
        Self {
            text: text.into(),
            position,
            colour: None,
            size: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Entity {
    Point(Vec3),
    Points(Vec<Vec3>),
    Line(Line),
    Lines(Vec<Line>),
    Polyline(Polyline),
    Polylines(Vec<Polyline>),
    Curve(BezierCurve),
    Curves(Vec<BezierCurve>),
    Surface(BezierSurface),
    Surfaces(Vec<BezierSurface>),
    DecomposedMesh(DecomposedMesh),
    DecomposedMeshes(Vec<DecomposedMesh>),
    /// Solid living in the kernel; needs an async tessellation round trip
    KernelShape(HandleRef),
    KernelShapes(Vec<HandleRef>),
    Tag(TextTag),
    Tags(Vec<TextTag>),
}

impl Entity {
    /// Recognize a JSON value, or `None` when no detector matches.
    pub fn classify(value: &Value) -> Option<Entity> {
        if let Some(handle) = is_handle(value) {
            return Some(Entity::KernelShape(handle));
        }
        if let Some(handles) = list(value, is_handle) {
            return Some(Entity::KernelShapes(handles));
        }
        if let Some(p) = vec3(value) {
            return Some(Entity::Point(p));
        }
        if let Some(ps) = points(value) {
            return Some(Entity::Points(ps));
        }
        if let Some(l) = line(value) {
            return Some(Entity::Line(l));
        }
        if let Some(ls) = list(value, line) {
            return Some(Entity::Lines(ls));
        }
        if let Some(p) = polyline(value) {
            return Some(Entity::Polyline(p));
        }
        if let Some(ps) = list(value, polyline) {
            return Some(Entity::Polylines(ps));
        }
        if let Some(c) = curve(value) {
            return Some(Entity::Curve(c));
        }
        if let Some(cs) = list(value, curve) {
            return Some(Entity::Curves(cs));
        }
        if let Some(s) = surface(value) {
            return Some(Entity::Surface(s));
        }
        if let Some(ss) = list(value, surface) {
            return Some(Entity::Surfaces(ss));
        }
        if let Some(m) = decomposed(value) {
            return Some(Entity::DecomposedMesh(m));
        }
        if let Some(ms) = list(value, decomposed) {
            return Some(Entity::DecomposedMeshes(ms));
        }
        if let Some(t) = tag(value) {
            return Some(Entity::Tag(t));
        }
        if let Some(ts) = list(value, tag) {
            return Some(Entity::Tags(ts));
        }
        None
    }

    /// Parse `value` as the given drawing type without trying the others.
    pub fn parse_as(value: &Value, drawing_type: DrawingType) -> Option<Entity> {
        match drawing_type {
            DrawingType::Point => vec3(value).map(Entity::Point),
            DrawingType::Points => points(value).map(Entity::Points),
            DrawingType::Line => line(value).map(Entity::Line),
            DrawingType::Lines => list(value, line).map(Entity::Lines),
            DrawingType::Polyline => polyline(value).map(Entity::Polyline),
            DrawingType::Polylines => list(value, polyline).map(Entity::Polylines),
            DrawingType::Curve => curve(value).map(Entity::Curve),
            DrawingType::Curves => list(value, curve).map(Entity::Curves),
            DrawingType::Surface => surface(value).map(Entity::Surface),
            DrawingType::Surfaces => list(value, surface).map(Entity::Surfaces),
            DrawingType::KernelMesh => is_handle(value)
                .map(Entity::KernelShape)
                .or_else(|| decomposed(value).map(Entity::DecomposedMesh)),
            DrawingType::KernelMeshes => list(value, is_handle)
                .map(Entity::KernelShapes)
                .or_else(|| list(value, decomposed).map(Entity::DecomposedMeshes)),
            DrawingType::Tag => tag(value).map(Entity::Tag),
            DrawingType::Tags => list(value, tag).map(Entity::Tags),
        }
    }

    pub fn drawing_type(&self) -> DrawingType {
        match self {
            Entity::Point(_) => DrawingType::Point,
            Entity::Points(_) => DrawingType::Points,
            Entity::Line(_) => DrawingType::Line,
            Entity::Lines(_) => DrawingType::Lines,
            Entity::Polyline(_) => DrawingType::Polyline,
            Entity::Polylines(_) => DrawingType::Polylines,
            Entity::Curve(_) => DrawingType::Curve,
            Entity::Curves(_) => DrawingType::Curves,
            Entity::Surface(_) => DrawingType::Surface,
            Entity::Surfaces(_) => DrawingType::Surfaces,
            Entity::DecomposedMesh(_) | Entity::KernelShape(_) => DrawingType::KernelMesh,
            Entity::DecomposedMeshes(_) | Entity::KernelShapes(_) => DrawingType::KernelMeshes,
            Entity::Tag(_) => DrawingType::Tag,
            Entity::Tags(_) => DrawingType::Tags,
        }
    }

    /// Whether drawing requires a kernel round trip
    pub fn is_kernel_backed(&self) -> bool {
        matches!(self, Entity::KernelShape(_) | Entity::KernelShapes(_))
    }
}

fn vec3(value: &Value) -> Option<Vec3> {
    let arr = value.as_array()?;
    if arr.len() != 3 {
        return None;
    }
    let x = arr[0].as_f64()? as f32;
    let y = arr[1].as_f64()? as f32;
    let z = arr[2].as_f64()? as f32;
    Some(Vec3::new(x, y, z))
}

fn points(value: &Value) -> Option<Vec<Vec3>> {
    list(value, vec3)
}

/// Non-empty array whose every element satisfies `item`
fn list<T>(value: &Value, item: impl Fn(&Value) -> Option<T>) -> Option<Vec<T>> {
    let arr = value.as_array()?;
    if arr.is_empty() {
        return None;
    }
    arr.iter().map(item).collect()
}

fn line(value: &Value) -> Option<Line> {
    let obj = value.as_object()?;
    Some(Line {
        start: vec3(obj.get("start")?)?,
        end: vec3(obj.get("end")?)?,
    })
}

fn polyline(value: &Value) -> Option<Polyline> {
    let obj = value.as_object()?;
    let pts = points(obj.get("points")?)?;
    if pts.len() < 2 {
        return None;
    }
    Some(Polyline {
        points: pts,
        closed: obj.get("isClosed").and_then(Value::as_bool).unwrap_or(false),
        color: obj.get("color").and_then(Value::as_str).map(str::to_string),
    })
}

fn curve(value: &Value) -> Option<BezierCurve> {
    let pts = points(value.as_object()?.get("controlPoints")?)?;
    if pts.len() < 2 {
        return None;
    }
    Some(BezierCurve::new(pts))
}

fn surface(value: &Value) -> Option<BezierSurface> {
    let rows = list(value.as_object()?.get("controlPoints")?, points)?;
    let width = rows.first()?.len();
    if rows.len() < 2 || width < 2 || rows.iter().any(|r| r.len() != width) {
        return None;
    }
    Some(BezierSurface::new(rows))
}

fn decomposed(value: &Value) -> Option<DecomposedMesh> {
    let obj = value.as_object()?;
    if !obj.contains_key("faceList") {
        return None;
    }
    Some(decode_decomposed(value))
}

fn tag(value: &Value) -> Option<TextTag> {
    let obj = value.as_object()?;
    Some(TextTag {
        text: obj.get("text")?.as_str()?.to_string(),
        position: vec3(obj.get("position")?)?,
        colour: obj.get("colour").and_then(Value::as_str).map(str::to_string),
        size: obj.get("size").and_then(Value::as_f64).map(|s| s as f32),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn kind(value: Value) -> Option<DrawingType> {
        Entity::classify(&value).map(|e| e.drawing_type())
    }

    #[test]
    fn test_classify_points_and_point() {
        assert_eq!(kind(json!([1, -2, 3])), Some(DrawingType::Point));
        assert_eq!(kind(json!([[1, -2, 3], [2, 3, 4]])), Some(DrawingType::Points));
    }

    #[test]
    fn test_classify_lines() {
        assert_eq!(kind(json!({"start": [0, 0, 0], "end": [1, 0, 0]})), Some(DrawingType::Line));
        assert_eq!(
            kind(json!([{"start": [0, 0, 0], "end": [1, 0, 0]}, {"start": [0, 1, 0], "end": [1, 1, 0]}])),
            Some(DrawingType::Lines)
        );
    }

    #[test]
    fn test_classify_polyline_closed() {
        let e = Entity::classify(&json!({"points": [[0, 0, 0], [1, 0, 0], [1, 1, 0]], "isClosed": true})).unwrap();
        let Entity::Polyline(p) = e else { panic!("expected polyline") };
        assert_eq!(p.vertices().len(), 4);
    }

    #[test]
    fn test_classify_curve_before_surface() {
        assert_eq!(kind(json!({"controlPoints": [[0, 0, 0], [1, 1, 0], [2, 0, 0]]})), Some(DrawingType::Curve));
        assert_eq!(
            kind(json!({"controlPoints": [[[0, 0, 0], [1, 0, 0]], [[0, 0, 1], [1, 0, 1]]]})),
            Some(DrawingType::Surface)
        );
    }

    #[test]
    fn test_ragged_surface_rejected() {
        assert_eq!(kind(json!({"controlPoints": [[[0, 0, 0], [1, 0, 0]], [[0, 0, 1]]]})), None);
    }

    #[test]
    fn test_classify_handles_first() {
        assert_eq!(kind(json!({"hash": 4, "type": "kernel-shape"})), Some(DrawingType::KernelMesh));
        let e = Entity::classify(&json!([{"hash": 4, "type": "kernel-shape"}, {"hash": 5, "type": "kernel-shape"}])).unwrap();
        assert!(e.is_kernel_backed());
        assert_eq!(e.drawing_type(), DrawingType::KernelMeshes);
    }

    #[test]
    fn test_classify_decomposed_and_tags() {
        assert_eq!(kind(json!({"faceList": [], "edgeList": []})), Some(DrawingType::KernelMesh));
        assert_eq!(kind(json!({"text": "A", "position": [0, 1, 0]})), Some(DrawingType::Tag));
        assert_eq!(kind(json!([{"text": "A", "position": [0, 1, 0]}])), Some(DrawingType::Tags));
    }

    #[test]
    fn test_unrecognized_yields_none() {
        assert_eq!(kind(json!("hello")), None);
        assert_eq!(kind(json!([])), None);
        assert_eq!(kind(json!([1, 2])), None);
        assert_eq!(kind(json!({"unknown": true})), None);
    }

    #[test]
    fn test_parse_as_skips_classification() {
        // A one-element list of triples stays "points" instead of a single point.
        let e = Entity::parse_as(&json!([[0, 0, 0]]), DrawingType::Points).unwrap();
        assert_eq!(e.drawing_type(), DrawingType::Points);
        assert!(Entity::parse_as(&json!([0, 0, 0]), DrawingType::Lines).is_none());
    }
}
