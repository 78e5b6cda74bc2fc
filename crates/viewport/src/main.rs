mod app;

use app::ViewportApp;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "vcad_viewport=info,vcad_viewport_lib=info,kernel_worker=info".into()),
        )
        .init();

    // Parse --config <path> argument
    let config = app::load_config(parse_config_arg().as_deref());
    let [width, height] = config.canvas;

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("vCAD Viewport")
            .with_inner_size([width as f32, height as f32])
            .with_min_inner_size([320.0, 240.0]),
        depth_buffer: 24,
        ..Default::default()
    };

    if let Err(e) = eframe::run_native(
        "vcad-viewport",
        native_options,
        Box::new(move |cc| {
            let app = ViewportApp::new(cc, config)?;
            Ok(Box::new(app) as Box<dyn eframe::App>)
        }),
    ) {
        tracing::error!("Failed to start application: {e}");
    }
}

fn parse_config_arg() -> Option<String> {
    let args: Vec<String> = std::env::args().collect();
    args.iter()
        .position(|a| a == "--config")
        .and_then(|i| args.get(i + 1))
        .cloned()
}
