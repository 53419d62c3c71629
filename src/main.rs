mod api;
mod app;
mod application;
mod domain;
mod ui;
mod utils;

use iced::{window, Size};
use tracing_subscriber::EnvFilter;

fn init_logging() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new("info,insta_downloader=debug,wgpu_core=warn,wgpu_hal=warn,naga=warn")
    });

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .init();
}

fn main() -> iced::Result {
    init_logging();
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "Instagram Downloader starting");

    iced::application(app::DownloadApp::default, app::update, app::view)
        .title("Instagram Downloader")
        .subscription(app::subscription)
        .window(window::Settings {
            size: Size::new(620.0, 760.0),
            ..Default::default()
        })
        .run()
}
