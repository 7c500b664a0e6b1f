mod app;
mod windows;

fn main() -> Result<(), eframe::Error> {
    env_logger::init();
    eframe::run_native(
        "globe tiles",
        Default::default(),
        Box::new(|cc| Ok(Box::new(app::TilesApp::new(cc.egui_ctx.clone())))),
    )
}
