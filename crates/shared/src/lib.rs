//! Wire types shared between the viewport and the kernel worker.
//!
//! Everything here crosses the `invoke(method, payload)` boundary as JSON.

pub mod handles;
pub mod kernel;
pub mod mesh;

use serde::{Deserialize, Serialize};

pub use handles::{collect_handles, dehydrate, is_handle, rehydrate, HandleRef, Hydrated};
pub use kernel::{methods, Kernel, KernelError};
pub use mesh::{DecomposedMesh, Edge, Face, Point3};

/// Тип примитива
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Primitive {
    Cube {
        width: f64,
        height: f64,
        depth: f64,
    },
    Cylinder {
        radius: f64,
        height: f64,
    },
    Sphere {
        radius: f64,
    },
    Cone {
        radius: f64,
        height: f64,
    },
}

/// Тип CSG-операции
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BooleanOp {
    Union,
    Difference,
    Intersection,
}

/// Трансформация объекта: смещение, поворот (градусы) и масштаб
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub position: [f64; 3],
    pub rotation: [f64; 3],
    pub scale: [f64; 3],
}

impl Transform {
    pub fn new() -> Self {
        Self {
            position: [0.0, 0.0, 0.0],
            rotation: [0.0, 0.0, 0.0],
            scale: [1.0, 1.0, 1.0],
        }
    }

    /// Transform that only moves the object
    pub fn translation(x: f64, y: f64, z: f64) -> Self {
        Self {
            position: [x, y, z],
            ..Self::new()
        }
    }

    /// True when applying the transform would not change anything
    pub fn is_identity(&self) -> bool {
        self.position == [0.0; 3] && self.rotation == [0.0; 3] && self.scale == [1.0; 3]
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::new()
    }
}
