//! Geometry kernel running in its own execution context.
//!
//! `spawn_worker` starts a dedicated thread that owns every live kernel object.
//! The returned `WorkerKernel` implements `shared::Kernel`: each `invoke` is a
//! message to that thread and resolves when the reply arrives, so the caller's
//! thread is never blocked on geometry work.

mod decompose;
mod host;
mod primitives;
mod registry;

use std::future::Future;
use std::thread::JoinHandle;

use serde_json::Value;
use shared::{Kernel, KernelError};
use tokio::sync::{mpsc, oneshot};

pub use decompose::decompose;
pub use host::KernelHost;
pub use registry::HandleRegistry;

struct Request {
    method: String,
    payload: Value,
    reply: oneshot::Sender<Result<Value, KernelError>>,
}

/// Client side of the worker; cheap to clone
#[derive(Clone)]
pub struct WorkerKernel {
    tx: mpsc::UnboundedSender<Request>,
}

impl Kernel for WorkerKernel {
    fn invoke(
        &self,
        method: &str,
        payload: Value,
    ) -> impl Future<Output = Result<Value, KernelError>> {
        let (reply, rx) = oneshot::channel();
        let sent = self.tx.send(Request {
            method: method.to_string(),
            payload,
            reply,
        });
        async move {
            sent.map_err(|_| KernelError::Disconnected)?;
            rx.await.map_err(|_| KernelError::Disconnected)?
        }
    }
}

/// A running worker thread plus its client
pub struct KernelWorker {
    kernel: WorkerKernel,
    thread: JoinHandle<()>,
}

impl KernelWorker {
    pub fn kernel(&self) -> WorkerKernel {
        self.kernel.clone()
    }

    /// Stop accepting calls and wait for the thread to finish.
    /// Outstanding clones of the client keep the worker alive until dropped.
    pub fn shutdown(self) {
        drop(self.kernel);
        if self.thread.join().is_err() {
            tracing::error!("kernel worker thread panicked");
        }
    }
}

/// Start the kernel on its own thread
pub fn spawn_worker() -> std::io::Result<KernelWorker> {
    spawn_worker_with(KernelHost::new)
}

/// Start the kernel with a custom host constructor (runs on the worker thread)
pub fn spawn_worker_with<F>(make_host: F) -> std::io::Result<KernelWorker>
where
    F: FnOnce() -> KernelHost + Send + 'static,
{
    let (tx, mut rx) = mpsc::unbounded_channel::<Request>();

    let thread = std::thread::Builder::new()
        .name("kernel-worker".to_string())
        .spawn(move || {
            tracing::info!("kernel worker started");
            let mut host = make_host();
            while let Some(req) = rx.blocking_recv() {
                let result = host.dispatch(&req.method, req.payload);
                if let Err(e) = &result {
                    tracing::debug!("kernel call `{}` failed: {e}", req.method);
                }
                // Caller may have given up on the reply
                let _ = req.reply.send(result);
            }
            tracing::info!(
                "kernel worker stopped ({} handles still live)",
                host.live_handles()
            );
        })?;

    Ok(KernelWorker {
        kernel: WorkerKernel { tx },
        thread,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use shared::{is_handle, methods, DecomposedMesh};

    #[tokio::test]
    async fn test_worker_round_trip() {
        let worker = spawn_worker().unwrap();
        let kernel = worker.kernel();

        let handle = kernel
            .invoke(
                methods::CREATE_PRIMITIVE,
                json!({ "primitive": { "type": "sphere", "radius": 1.0 } }),
            )
            .await
            .unwrap();
        assert!(is_handle(&handle).is_some());

        let mesh = kernel
            .invoke(methods::SHAPE_TO_MESH, json!({ "shape": handle }))
            .await
            .unwrap();
        let mesh: DecomposedMesh = serde_json::from_value(mesh).unwrap();
        assert!(mesh.triangle_count() > 0);

        kernel.release_all().await.unwrap();
        drop(kernel);
        worker.shutdown();
    }

    #[tokio::test]
    async fn test_concurrent_calls_resolve_independently() {
        let worker = spawn_worker().unwrap();
        let kernel = worker.kernel();

        let cube = json!({ "primitive": { "type": "cube", "width": 1.0, "height": 1.0, "depth": 1.0 } });
        let (a, b) = tokio::join!(
            kernel.invoke(methods::CREATE_PRIMITIVE, cube.clone()),
            kernel.invoke(methods::CREATE_PRIMITIVE, cube),
        );
        let (a, b) = (is_handle(&a.unwrap()).unwrap(), is_handle(&b.unwrap()).unwrap());
        assert_ne!(a.hash, b.hash);

        drop(kernel);
        worker.shutdown();
    }

    #[tokio::test]
    async fn test_error_crosses_boundary() {
        let worker = spawn_worker().unwrap();
        let kernel = worker.kernel();
        let err = kernel.invoke("loft", Value::Null).await.unwrap_err();
        assert_eq!(err, KernelError::UnknownMethod("loft".to_string()));
        drop(kernel);
        worker.shutdown();
    }
}
