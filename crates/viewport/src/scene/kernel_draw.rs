//! Drawing entities that live in the kernel.
//!
//! The synchronizer is borrowed only around the awaited kernel call, never
//! across it, so other draws can proceed while a tessellation is in flight.
//! When several async draws target the same node, the last one issued wins:
//! a result that returns after a newer draw was issued is discarded.

use std::cell::RefCell;

use serde_json::{json, Value};
use shared::{methods, HandleRef, Kernel};

use super::entity::Entity;
use super::options::DrawOptions;
use super::sync::SceneSync;
use super::NodeName;
use crate::error::DrawError;
use crate::mesh::{decode_decomposed, decode_decomposed_list};

/// Draw any entity; kernel-backed ones are tessellated through `kernel` first.
pub async fn draw_async<K: Kernel>(
    sync: &RefCell<SceneSync>,
    kernel: &K,
    entity: &Entity,
    options: Option<&DrawOptions>,
    previous: Option<&str>,
) -> Result<Option<NodeName>, DrawError> {
    let (method, payload, plural) = match entity {
        Entity::KernelShape(handle) => (methods::SHAPE_TO_MESH, json!({ "shape": handle.to_value() }), false),
        Entity::KernelShapes(handles) => {
            let shapes: Vec<Value> = handles.iter().map(HandleRef::to_value).collect();
            (methods::SHAPES_TO_MESHES, json!({ "shapes": shapes }), true)
        }
        _ => return Ok(sync.borrow_mut().draw(entity, options, previous)),
    };

    let (options, previous, stamp) = {
        let mut s = sync.borrow_mut();
        let previous = s.tagged(previous);
        if let Some(prev) = previous {
            let tagged = s.scene().tag(prev).map(|t| t.drawing_type);
            if tagged != Some(entity.drawing_type()) {
                tracing::warn!("cannot update a {tagged:?} node with {:?}", entity.drawing_type());
                return Ok(None);
            }
        }
        let options = s.resolve_options(options, previous);
        let stamp = previous.map(|p| s.issue_stamp(p));
        (options, previous, stamp)
    };

    let response = kernel
        .invoke(method, payload)
        .await
        .map_err(|source| DrawError::Kernel {
            method: method.to_string(),
            source,
        })?;
    let meshes = if plural {
        decode_decomposed_list(&response)
    } else {
        vec![decode_decomposed(&response)]
    };

    let mut s = sync.borrow_mut();
    if let (Some(prev), Some(stamp)) = (previous, stamp) {
        if !s.is_latest(prev, stamp) {
            tracing::debug!("discarding superseded kernel result for {prev}");
            return Ok(s.scene().contains(prev).then(|| prev.to_string()));
        }
    }
    let previous = previous.filter(|p| s.scene().contains(p));
    let name = s.place_meshes(&meshes, plural, &options, previous);
    Ok(Some(s.finish(name, entity.drawing_type(), options)))
}

/// Untyped counterpart of [`draw_async`]
pub async fn draw_value_async<K: Kernel>(
    sync: &RefCell<SceneSync>,
    kernel: &K,
    value: &Value,
    options: Option<&DrawOptions>,
    previous: Option<&str>,
) -> Result<Option<NodeName>, DrawError> {
    let entity = {
        let s = sync.borrow();
        match s.tagged(previous).and_then(|p| s.scene().tag(p)) {
            Some(tag) => Entity::parse_as(value, tag.drawing_type),
            None => Entity::classify(value),
        }
    };
    match entity {
        Some(entity) => draw_async(sync, kernel, &entity, options, previous).await,
        None => {
            tracing::debug!("nothing drawable in input");
            Ok(None)
        }
    }
}
