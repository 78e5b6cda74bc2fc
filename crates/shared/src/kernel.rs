//! The single call shape used to reach the geometry kernel.

use std::future::Future;

use serde_json::{json, Value};
use thiserror::Error;

use crate::handles::HandleRef;

/// Method names understood by the kernel worker
pub mod methods {
    pub const CREATE_PRIMITIVE: &str = "createPrimitive";
    pub const BOOLEAN: &str = "boolean";
    pub const SHAPE_TO_MESH: &str = "shapeToMesh";
    pub const SHAPES_TO_MESHES: &str = "shapesToMeshes";
    pub const INSPECT: &str = "inspect";
    pub const RELEASE_HANDLE: &str = "releaseHandle";
    pub const RELEASE_HANDLES: &str = "releaseHandles";
    pub const RELEASE_ALL: &str = "releaseAll";
}

/// Failure reported by the kernel or by the transport in front of it
#[derive(Error, Debug, Clone, PartialEq)]
pub enum KernelError {
    #[error("kernel worker is not running")]
    Disconnected,

    #[error("unknown kernel method `{0}`")]
    UnknownMethod(String),

    #[error("invalid payload for `{method}`: {reason}")]
    InvalidPayload { method: String, reason: String },

    #[error("unknown kernel handle {0}")]
    UnknownHandle(u64),

    #[error("`{method}` failed: {reason}")]
    Operation { method: String, reason: String },
}

/// Asynchronous entry point into the kernel's isolated execution context.
///
/// Handles in `payload` are resolved on the kernel side; live objects in the
/// result come back as handles. Releasing handles is always the caller's job.
pub trait Kernel {
    fn invoke(
        &self,
        method: &str,
        payload: Value,
    ) -> impl Future<Output = Result<Value, KernelError>>;

    fn release_handle(&self, handle: &HandleRef) -> impl Future<Output = Result<(), KernelError>> {
        let call = self.invoke(methods::RELEASE_HANDLE, json!({ "handle": handle.to_value() }));
        async move { call.await.map(|_| ()) }
    }

    fn release_handles(
        &self,
        handles: &[HandleRef],
    ) -> impl Future<Output = Result<(), KernelError>> {
        let list: Vec<Value> = handles.iter().map(HandleRef::to_value).collect();
        let call = self.invoke(methods::RELEASE_HANDLES, json!({ "handles": list }));
        async move { call.await.map(|_| ()) }
    }

    fn release_all(&self) -> impl Future<Output = Result<(), KernelError>> {
        let call = self.invoke(methods::RELEASE_ALL, Value::Null);
        async move { call.await.map(|_| ()) }
    }
}
