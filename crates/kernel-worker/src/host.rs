//! Method dispatch inside the kernel context

use std::rc::Rc;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use shared::handles::SHAPE_HANDLE_TYPE;
use shared::{
    dehydrate, is_handle, methods, rehydrate, BooleanOp, DecomposedMesh, Hydrated, KernelError,
    Primitive, Transform,
};
use vcad::Part;

use crate::decompose::decompose;
use crate::primitives::{build_shape, DEFAULT_SEGMENTS};
use crate::registry::HandleRegistry;

type Input = Hydrated<Rc<Part>>;

#[derive(Deserialize)]
struct CreatePrimitiveParams {
    primitive: Primitive,
    #[serde(default)]
    transform: Transform,
    #[serde(default)]
    segments: Option<u32>,
}

/// Owns every live shape and answers `invoke(method, payload)` calls
pub struct KernelHost {
    shapes: HandleRegistry<Part>,
    segments: u32,
    next_id: u64,
}

impl Default for KernelHost {
    fn default() -> Self {
        Self::new()
    }
}

impl KernelHost {
    pub fn new() -> Self {
        Self::with_segments(DEFAULT_SEGMENTS)
    }

    /// Host whose curved primitives default to `segments` subdivisions
    pub fn with_segments(segments: u32) -> Self {
        Self {
            shapes: HandleRegistry::new(SHAPE_HANDLE_TYPE),
            segments,
            next_id: 0,
        }
    }

    /// Number of shapes still held for callers
    pub fn live_handles(&self) -> usize {
        self.shapes.len()
    }

    pub fn dispatch(&mut self, method: &str, payload: Value) -> Result<Value, KernelError> {
        tracing::debug!("kernel dispatch: {method}");

        match method {
            methods::RELEASE_HANDLE => return Ok(self.release_handle(&payload)),
            methods::RELEASE_HANDLES => return Ok(self.release_handles(&payload)),
            methods::RELEASE_ALL => {
                let released = self.shapes.release_all();
                return Ok(json!({ "released": released }));
            }
            _ => {}
        }

        let shapes = &self.shapes;
        let input: Input = rehydrate(&payload, |h| shapes.resolve(h)).map_err(|h| {
            tracing::warn!("{method}: payload references unknown handle {}", h.hash);
            KernelError::UnknownHandle(h.hash)
        })?;

        let output: Hydrated<Part> = match method {
            methods::CREATE_PRIMITIVE => Hydrated::Live(self.create_primitive(method, &input)?),
            methods::BOOLEAN => Hydrated::Live(boolean(method, &input)?),
            methods::SHAPE_TO_MESH => {
                let part = live_field(method, &input, "shape")?;
                to_hydrated(method, &decompose_part(&part))?
            }
            methods::SHAPES_TO_MESHES => {
                let parts = input
                    .get("shapes")
                    .and_then(Hydrated::as_array)
                    .ok_or_else(|| invalid(method, "missing `shapes` list"))?;
                let meshes = parts
                    .iter()
                    .map(|p| {
                        p.as_live()
                            .map(|part| decompose_part(part))
                            .ok_or_else(|| invalid(method, "`shapes` must only contain handles"))
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                to_hydrated(method, &meshes)?
            }
            methods::INSPECT => {
                let part = live_field(method, &input, "shape")?;
                let bbox = part.bounding_box();
                Hydrated::from(json!({
                    "volume": part.volume(),
                    "surfaceArea": part.surface_area(),
                    "boundingBox": { "min": bbox.0, "max": bbox.1 },
                }))
            }
            other => return Err(KernelError::UnknownMethod(other.to_string())),
        };

        Ok(dehydrate(output, |part| self.shapes.insert(part)))
    }

    fn create_primitive(&mut self, method: &str, input: &Input) -> Result<Part, KernelError> {
        let params: CreatePrimitiveParams = plain_params(method, input)?;
        self.next_id += 1;
        let id = format!("shape{}", self.next_id);
        Ok(build_shape(
            &id,
            &params.primitive,
            &params.transform,
            params.segments.unwrap_or(self.segments),
        ))
    }

    fn release_handle(&mut self, payload: &Value) -> Value {
        let released = payload
            .get("handle")
            .and_then(is_handle)
            .is_some_and(|h| self.shapes.release(h.hash));
        json!({ "released": released })
    }

    fn release_handles(&mut self, payload: &Value) -> Value {
        let hashes: Vec<u64> = payload
            .get("handles")
            .and_then(Value::as_array)
            .map(|list| list.iter().filter_map(is_handle).map(|h| h.hash).collect())
            .unwrap_or_default();
        let released = self.shapes.release_many(hashes);
        json!({ "released": released })
    }
}

fn boolean(method: &str, input: &Input) -> Result<Part, KernelError> {
    let op: BooleanOp = input
        .get("op")
        .and_then(Hydrated::to_plain)
        .ok_or_else(|| invalid(method, "missing `op`"))
        .and_then(|v| serde_json::from_value(v).map_err(|e| invalid(method, &e.to_string())))?;
    let left = live_field(method, input, "left")?;
    let right = live_field(method, input, "right")?;

    Ok(match op {
        BooleanOp::Union => left.union(&right),
        BooleanOp::Difference => left.difference(&right),
        BooleanOp::Intersection => left.intersection(&right),
    })
}

fn decompose_part(part: &Part) -> DecomposedMesh {
    let mesh = part.to_mesh();
    let positions: Vec<f32> = mesh.vertices().iter().map(|&v| v as f32).collect();
    let indices: Vec<u32> = mesh.indices().iter().map(|&i| i as u32).collect();

    if positions.is_empty() || indices.is_empty() {
        tracing::warn!("decompose: kernel produced an empty mesh");
    }

    decompose(&positions, &indices)
}

fn live_field(method: &str, input: &Input, key: &str) -> Result<Rc<Part>, KernelError> {
    input
        .get(key)
        .and_then(Hydrated::as_live)
        .cloned()
        .ok_or_else(|| invalid(method, &format!("`{key}` must be a shape handle")))
}

fn plain_params<T: DeserializeOwned>(method: &str, input: &Input) -> Result<T, KernelError> {
    let plain = input
        .to_plain()
        .ok_or_else(|| invalid(method, "unexpected handle in payload"))?;
    serde_json::from_value(plain).map_err(|e| invalid(method, &e.to_string()))
}

fn to_hydrated<T: serde::Serialize>(method: &str, value: &T) -> Result<Hydrated<Part>, KernelError> {
    serde_json::to_value(value)
        .map(Hydrated::from)
        .map_err(|e| KernelError::Operation {
            method: method.to_string(),
            reason: e.to_string(),
        })
}

fn invalid(method: &str, reason: &str) -> KernelError {
    KernelError::InvalidPayload {
        method: method.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::HandleRef;

    fn cube(host: &mut KernelHost, size: f64) -> HandleRef {
        let out = host
            .dispatch(
                methods::CREATE_PRIMITIVE,
                json!({ "primitive": { "type": "cube", "width": size, "height": size, "depth": size } }),
            )
            .unwrap();
        is_handle(&out).unwrap()
    }

    #[test]
    fn test_create_primitive_returns_handle() {
        let mut host = KernelHost::new();
        let h = cube(&mut host, 1.0);
        assert_eq!(h.kind, SHAPE_HANDLE_TYPE);
        assert_eq!(host.live_handles(), 1);
    }

    #[test]
    fn test_shape_to_mesh_for_cube() {
        let mut host = KernelHost::new();
        let h = cube(&mut host, 2.0);
        let out = host
            .dispatch(methods::SHAPE_TO_MESH, json!({ "shape": h.to_value() }))
            .unwrap();
        let mesh: DecomposedMesh = serde_json::from_value(out).unwrap();
        assert_eq!(mesh.face_list.len(), 6);
        assert!(mesh.face_list.iter().all(|f| f.is_well_formed()));
        assert!(!mesh.edge_list.is_empty());
    }

    #[test]
    fn test_shapes_to_meshes_keeps_order() {
        let mut host = KernelHost::new();
        let a = cube(&mut host, 1.0);
        let b = cube(&mut host, 3.0);
        let out = host
            .dispatch(
                methods::SHAPES_TO_MESHES,
                json!({ "shapes": [a.to_value(), b.to_value()] }),
            )
            .unwrap();
        let meshes: Vec<DecomposedMesh> = serde_json::from_value(out).unwrap();
        assert_eq!(meshes.len(), 2);
    }

    #[test]
    fn test_boolean_registers_new_shape() {
        let mut host = KernelHost::new();
        let a = cube(&mut host, 2.0);
        let b = cube(&mut host, 1.0);
        let out = host
            .dispatch(
                methods::BOOLEAN,
                json!({ "op": "difference", "left": a.to_value(), "right": b.to_value() }),
            )
            .unwrap();
        assert!(is_handle(&out).is_some());
        assert_eq!(host.live_handles(), 3);
    }

    #[test]
    fn test_unknown_handle_is_error() {
        let mut host = KernelHost::new();
        let err = host
            .dispatch(methods::SHAPE_TO_MESH, json!({ "shape": HandleRef::shape(42).to_value() }))
            .unwrap_err();
        assert_eq!(err, KernelError::UnknownHandle(42));
    }

    #[test]
    fn test_unknown_method() {
        let mut host = KernelHost::new();
        let err = host.dispatch("fillet", Value::Null).unwrap_err();
        assert_eq!(err, KernelError::UnknownMethod("fillet".to_string()));
    }

    #[test]
    fn test_release_lifecycle() {
        let mut host = KernelHost::new();
        let a = cube(&mut host, 1.0);
        let b = cube(&mut host, 1.0);
        cube(&mut host, 1.0);

        let out = host
            .dispatch(methods::RELEASE_HANDLE, json!({ "handle": a.to_value() }))
            .unwrap();
        assert_eq!(out["released"], true);

        let out = host
            .dispatch(methods::RELEASE_HANDLES, json!({ "handles": [a.to_value(), b.to_value()] }))
            .unwrap();
        assert_eq!(out["released"], 1);

        let out = host.dispatch(methods::RELEASE_ALL, Value::Null).unwrap();
        assert_eq!(out["released"], 1);
        assert_eq!(host.live_handles(), 0);
    }

    #[test]
    fn test_inspect_reports_volume() {
        let mut host = KernelHost::new();
        let h = cube(&mut host, 2.0);
        let out = host
            .dispatch(methods::INSPECT, json!({ "shape": h.to_value() }))
            .unwrap();
        let volume = out["volume"].as_f64().unwrap();
        approx::assert_relative_eq!(volume, 8.0, epsilon = 1e-6);
    }
}
