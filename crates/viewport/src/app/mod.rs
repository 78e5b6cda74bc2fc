//! Main application module

mod egui_input;
mod gl_renderer;

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::sync::{Arc, Mutex};

use eframe::egui;
use glam::Vec3;
use serde_json::json;
use shared::{is_handle, methods, Kernel, Primitive, Transform};
use tokio::runtime::Runtime;
use tokio::task::LocalSet;

use kernel_worker::{spawn_worker, KernelWorker, WorkerKernel};
use vcad_viewport_lib::camera::CameraPose;
use vcad_viewport_lib::render::{PendingDisposals, RenderSnapshot};
use vcad_viewport_lib::scene::{
    draw_async, BezierCurve, BezierSurface, DrawOptions, Entity, NodeName, Polyline, TextTag,
};
use vcad_viewport_lib::{RenderSurface, Viewport, ViewportConfig};

use gl_renderer::{GlRenderer, RenderParams};

/// Seconds between updates of the animated point cloud
const WAVE_PERIOD: f32 = 0.1;

/// Main application
pub struct ViewportApp {
    viewport: Viewport,
    runtime: Runtime,
    local: LocalSet,
    worker: Option<KernelWorker>,
    kernel: Option<WorkerKernel>,
    /// Async draws still waiting on the kernel
    pending: Rc<Cell<usize>>,
    /// Node of the first kernel shape, framed once it lands
    focus_target: Rc<RefCell<Option<NodeName>>>,
    gl_renderer: Option<Arc<Mutex<GlRenderer>>>,
    snapshot: Option<Arc<RenderSnapshot>>,
    /// Freed materials not yet seen by a paint callback
    disposals: PendingDisposals,
    wave: Option<NodeName>,
    wave_clock: f32,
    elapsed: f32,
}

impl ViewportApp {
    pub fn new(cc: &eframe::CreationContext<'_>, config: ViewportConfig) -> Result<Self, String> {
        let [width, height] = config.canvas;
        let viewport = Viewport::new(config, Some(RenderSurface::new(width, height))).map_err(|e| e.to_string())?;

        let runtime = tokio::runtime::Builder::new_current_thread()
            .build()
            .map_err(|e| format!("async runtime: {e}"))?;

        let worker = match spawn_worker() {
            Ok(worker) => Some(worker),
            Err(e) => {
                tracing::error!("kernel worker unavailable, kernel shapes disabled: {e}");
                None
            }
        };
        let kernel = worker.as_ref().map(KernelWorker::kernel);

        // Initialize GL renderer if glow context is available
        let gl_renderer = cc.gl.as_ref().and_then(|gl| match GlRenderer::new(gl) {
            Ok(renderer) => Some(Arc::new(Mutex::new(renderer))),
            Err(e) => {
                tracing::error!("GL renderer init failed: {e}");
                None
            }
        });

        let mut app = Self {
            viewport,
            runtime,
            local: LocalSet::new(),
            worker,
            kernel,
            pending: Rc::new(Cell::new(0)),
            focus_target: Rc::new(RefCell::new(None)),
            gl_renderer,
            snapshot: None,
            disposals: PendingDisposals::new(),
            wave: None,
            wave_clock: 0.0,
            elapsed: 0.0,
        };
        app.populate_demo();
        Ok(app)
    }

    /// Local entities drawn directly, kernel shapes queued on the worker
    fn populate_demo(&mut self) {
        let sync = self.viewport.sync();
        let mut s = sync.borrow_mut();

        let points = vec![Vec3::new(1.0, -2.0, 3.0), Vec3::new(2.0, 3.0, 4.0), Vec3::new(-3.0, 2.0, -1.0)];
        let options = DrawOptions::default().with_colours(["#ff0000", "#00ff00", "#0000ff"]);
        s.draw(&Entity::Points(points), Some(&options), None);

        let ring: Vec<Vec3> = (0..24)
            .map(|i| {
                let a = i as f32 / 24.0 * std::f32::consts::TAU;
                Vec3::new(a.cos() * 4.0, 0.05, a.sin() * 4.0)
            })
            .collect();
        let ring = Polyline {
            points: ring,
            closed: true,
            color: Some("#ffcc00".to_string()),
        };
        s.draw(&Entity::Polyline(ring), None, None);

        let curve = BezierCurve::new(vec![
            Vec3::new(-4.0, 0.0, -4.0),
            Vec3::new(-2.0, 4.0, -4.0),
            Vec3::new(2.0, -2.0, -4.0),
            Vec3::new(4.0, 1.0, -4.0),
        ]);
        let curve_options = DrawOptions {
            colours: vec!["#66ccff".to_string()],
            edge_width: 3.0,
            ..DrawOptions::default()
        };
        s.draw(&Entity::Curve(curve), Some(&curve_options), None);

        let patch = BezierSurface::new(
            (0..4)
                .map(|j| {
                    (0..4)
                        .map(|i| {
                            let lift = if (1..3).contains(&i) && (1..3).contains(&j) { 1.5 } else { 0.0 };
                            Vec3::new(i as f32 * 1.5 - 6.5, lift, j as f32 * 1.5 + 1.0)
                        })
                        .collect()
                })
                .collect(),
        );
        let surface_options = DrawOptions {
            face_colour: "#88aa55".to_string(),
            ..DrawOptions::default()
        };
        s.draw(&Entity::Surface(patch), Some(&surface_options), None);

        s.draw(
            &Entity::Tags(vec![
                TextTag::new("origin", Vec3::ZERO),
                TextTag::new("cube", Vec3::new(0.0, 1.5, 0.0)),
            ]),
            None,
            None,
        );
        drop(s);

        self.spawn_kernel_shape(Primitive::Cube { width: 2.0, height: 2.0, depth: 2.0 }, Transform::new(), "#3399ff", true);
        self.spawn_kernel_shape(
            Primitive::Sphere { radius: 1.0 },
            Transform::translation(4.0, 1.0, 2.0),
            "#cc66ff",
            false,
        );
    }

    /// Create a primitive in the kernel and draw its tessellation
    fn spawn_kernel_shape(&self, primitive: Primitive, transform: Transform, colour: &str, focus: bool) {
        let Some(kernel) = self.kernel.clone() else {
            return;
        };
        let sync = self.viewport.sync();
        let pending = Rc::clone(&self.pending);
        let focus_target = Rc::clone(&self.focus_target);
        let options = DrawOptions {
            face_colour: colour.to_string(),
            draw_vertices: true,
            ..DrawOptions::default()
        };

        pending.set(pending.get() + 1);
        self.local.spawn_local(async move {
            let created = kernel
                .invoke(methods::CREATE_PRIMITIVE, json!({ "primitive": primitive, "transform": transform }))
                .await;
            let handle = match created.as_ref().map(is_handle) {
                Ok(Some(handle)) => handle,
                Ok(None) => {
                    tracing::error!("kernel returned no shape handle");
                    pending.set(pending.get() - 1);
                    return;
                }
                Err(e) => {
                    tracing::error!("createPrimitive failed: {e}");
                    pending.set(pending.get() - 1);
                    return;
                }
            };

            match draw_async(&sync, &kernel, &Entity::KernelShape(handle.clone()), Some(&options), None).await {
                Ok(Some(name)) if focus => *focus_target.borrow_mut() = Some(name),
                Ok(_) => {}
                Err(e) => tracing::error!("kernel draw failed: {e}"),
            }
            // The viewport owns the tessellation now; the kernel object can go.
            if let Err(e) = kernel.release_handle(&handle).await {
                tracing::warn!("release failed: {e}");
            }
            pending.set(pending.get() - 1);
        });
    }

    /// Redraw the updatable wave in place
    fn animate_wave(&mut self, dt: f32) {
        self.elapsed += dt;
        self.wave_clock += dt;
        if self.wave.is_some() && self.wave_clock < WAVE_PERIOD {
            return;
        }
        self.wave_clock = 0.0;

        let t = self.elapsed;
        let points: Vec<Vec3> = (0..40)
            .map(|i| {
                let x = i as f32 * 0.25 - 5.0;
                Vec3::new(x, 3.0 + (x + t * 2.0).sin() * 0.5, 5.0)
            })
            .collect();
        let options = DrawOptions {
            size: 0.08,
            ..DrawOptions::updatable()
        }
        .with_colours(["#ffffff", "#ff8800"]);

        let sync = self.viewport.sync();
        let mut s = sync.borrow_mut();
        self.wave = s.draw(&Entity::Points(points), Some(&options), self.wave.as_deref());
    }

    /// Let queued kernel draws make progress without blocking the frame
    fn pump_tasks(&self) {
        self.runtime.block_on(self.local.run_until(tokio::task::yield_now()));
    }

    fn handle_input(&mut self, ctx: &egui::Context, rect: egui::Rect) {
        let keyboard_free = !ctx.wants_keyboard_input();
        let events = ctx.input(|i| i.events.clone());
        for event in &events {
            if let egui::Event::PointerButton { pos, pressed: true, .. } | egui::Event::Touch { pos, phase: egui::TouchPhase::Start, .. } = event {
                if !rect.contains(*pos) {
                    continue;
                }
            }
            if matches!(event, egui::Event::MouseWheel { .. })
                && !ctx.pointer_hover_pos().is_some_and(|p| rect.contains(p))
            {
                continue;
            }
            if matches!(event, egui::Event::Key { .. }) && !keyboard_free {
                continue;
            }
            if let Some(input) = egui_input::translate(event, rect.min) {
                self.viewport.handle_event(&input);
            }
        }
    }

    fn render_gl(&mut self, ui: &mut egui::Ui, rect: egui::Rect, pose: CameraPose) {
        let sync = self.viewport.sync();
        let version = sync.borrow().scene().version();
        if self.snapshot.as_ref().map(|s| s.version) != Some(version) {
            self.snapshot = Some(Arc::new(self.viewport.snapshot()));
        }
        self.disposals.extend(sync.borrow_mut().materials_mut().take_disposed());

        let (Some(gl_renderer), Some(snapshot)) = (&self.gl_renderer, &self.snapshot) else {
            return;
        };
        let renderer_clone = Arc::clone(gl_renderer);
        let disposals = self.disposals.clone();
        let snapshot = Arc::clone(snapshot);
        let bg_color = self.viewport.background_color();

        let callback = egui::PaintCallback {
            rect,
            callback: Arc::new(eframe::egui_glow::CallbackFn::new(move |info, painter| {
                let gl = painter.gl();
                let clip = info.clip_rect_in_pixels();
                let params = RenderParams {
                    viewport: [
                        clip.left_px as f32,
                        clip.from_bottom_px as f32,
                        clip.width_px as f32,
                        clip.height_px as f32,
                    ],
                    bg_color,
                };
                if let Ok(mut r) = renderer_clone.lock() {
                    r.release_materials(&disposals.drain());
                    r.sync_snapshot(gl, &snapshot);
                    r.paint(gl, &pose, &params, painter.intermediate_fbo());
                }
            })),
        };
        ui.painter().add(callback);
    }

    /// Text tags are drawn by egui on top of the GL scene
    fn draw_labels(&self, ui: &egui::Ui, rect: egui::Rect, pose: &CameraPose) {
        let Some(snapshot) = &self.snapshot else {
            return;
        };
        let painter = ui.painter_at(rect);
        let pixels_per_unit = rect.height() / (2.0 * (pose.fov / 2.0).tan());
        for label in &snapshot.labels {
            let Some(ndc) = pose.project(label.position) else {
                continue;
            };
            let depth = (label.position - pose.position).length().max(1e-3);
            let font_size = (label.size * pixels_per_unit / depth).clamp(6.0, 64.0);
            let pos = egui::pos2(
                rect.left() + (ndc.x + 1.0) * 0.5 * rect.width(),
                rect.top() + (1.0 - ndc.y) * 0.5 * rect.height(),
            );
            let [r, g, b] = label.color.map(|c| (c.clamp(0.0, 1.0) * 255.0) as u8);
            painter.text(
                pos,
                egui::Align2::CENTER_CENTER,
                &label.text,
                egui::FontId::proportional(font_size),
                egui::Color32::from_rgb(r, g, b),
            );
        }
    }

    fn draw_camera_info(&self, ui: &egui::Ui, rect: egui::Rect) {
        let controller = self.viewport.controller();
        let pivot = controller.pivot_point();
        let text = format!(
            "yaw {:.1}°  pitch {:.1}°  distance {:.2}  pivot ({:.2}, {:.2}, {:.2})",
            controller.yaw(),
            controller.pitch(),
            controller.distance(),
            pivot.x,
            pivot.y,
            pivot.z,
        );
        ui.painter_at(rect).text(
            egui::pos2(rect.left() + 8.0, rect.bottom() - 8.0),
            egui::Align2::LEFT_BOTTOM,
            text,
            egui::FontId::monospace(11.0),
            egui::Color32::from_rgb(150, 150, 160),
        );
    }
}

impl eframe::App for ViewportApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.pump_tasks();
        if let Some(name) = self.focus_target.borrow_mut().take() {
            self.viewport.focus_on(&name, 1.2);
        }

        let dt = ctx.input(|i| i.stable_dt).min(0.1);
        self.animate_wave(dt);

        egui::CentralPanel::default()
            .frame(egui::Frame::NONE)
            .show(ctx, |ui| {
                let rect = ui.available_rect_before_wrap();
                self.viewport.resize(rect.width() as u32, rect.height() as u32);
                self.handle_input(ctx, rect);
                let pose = self.viewport.frame(dt);

                self.render_gl(ui, rect, pose);
                self.draw_labels(ui, rect, &pose);
                self.draw_camera_info(ui, rect);
            });

        // Camera easing, the wave and kernel replies all need further frames
        ctx.request_repaint();
    }

    fn on_exit(&mut self, gl: Option<&eframe::glow::Context>) {
        self.viewport.dispose();
        if let (Some(gl), Some(renderer)) = (gl, &self.gl_renderer) {
            if let Ok(mut r) = renderer.lock() {
                r.destroy(gl);
            }
        }
        if self.pending.get() > 0 {
            tracing::debug!("dropping {} unfinished kernel draws", self.pending.get());
        }
        self.kernel = None;
        // Dropping the local set cancels any draw still holding a client.
        self.local = LocalSet::new();
        if let Some(worker) = self.worker.take() {
            worker.shutdown();
        }
    }
}

/// Config from an explicit path, or the per-user file
pub fn load_config(path: Option<&str>) -> ViewportConfig {
    match path {
        Some(path) => match ViewportConfig::load_from(std::path::Path::new(path)) {
            Ok(config) => {
                tracing::info!("Loaded viewport config from {path}");
                config
            }
            Err(e) => {
                tracing::error!("Failed to load config {path}: {e}, using defaults");
                ViewportConfig::default()
            }
        },
        None => ViewportConfig::load(),
    }
}
