use demo_core::DemoApp;
use eframe::{run_native, NativeOptions};

const APP_NAME: &str = "Black Box Explorer";

fn main() -> eframe::Result {
    env_logger::init();

    run_native(
        APP_NAME,
        NativeOptions::default(),
        Box::new(|cc| Ok(Box::new(DemoApp::new(cc)?))),
    )
}
