#[cfg(not(target_arch = "wasm32"))]
#[tokio::main]
async fn main() {
    use homesim_view::settings::Settings;
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let settings = Settings::new().expect("Failed to load settings.");

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            let app_name = env!("CARGO_PKG_NAME").replace('-', "_");
            let level = settings.logger.level.as_str();

            format!("{app_name}={level}").into()
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Err(e) = homesim_view::run(&settings).await {
        tracing::error!("Room view stopped: {}", e);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {}
