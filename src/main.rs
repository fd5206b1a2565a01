use eframe::egui;
use std::path::PathBuf;
use tiles_roi::app::TilesApp;
use tiles_roi::config::AppConfig;

fn main() {
    let config_path = AppConfig::default_path();
    let config = config_path
        .as_deref()
        .map(AppConfig::load_or_default)
        .unwrap_or_default();

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.log_level.as_filter()),
    )
    .init();

    let folder = std::env::args().nth(1).map(PathBuf::from);
    if let Some(dir) = &folder {
        if !dir.is_dir() {
            eprintln!("Usage: tiles-roi [IMAGE_FOLDER]");
            eprintln!("Not a directory: {}", dir.display());
            std::process::exit(1);
        }
    }

    let title = "Tiles ROI Segmenter";
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 800.0])
            .with_title(title),
        ..Default::default()
    };

    if let Err(e) = eframe::run_native(
        title,
        options,
        Box::new(move |_cc| Ok(Box::new(TilesApp::new(config, config_path, folder)))),
    ) {
        log::error!("Application error: {e}");
        eprintln!("Application error: {e}");
        std::process::exit(1);
    }
}
