#[cfg(not(target_arch = "wasm32"))]
fn main() -> Result<(), eframe::Error> {
    // Set up logging; RUST_LOG=debug shows popover and tile activity
    env_logger::init();

    // Run the map application
    geoinfo_map::run_app()
}

#[cfg(target_arch = "wasm32")]
fn main() {
    eframe::WebLogger::init(log::LevelFilter::Debug).ok();

    wasm_bindgen_futures::spawn_local(geoinfo_map::start_web("map"));
}
