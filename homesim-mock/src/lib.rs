use std::error::Error;
use std::io;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::sync::RwLock;

use crate::app::create_app;
use crate::settings::Settings;
use crate::simulate::{Home, SharedHome};

pub mod app;
pub mod errors;
pub mod handles;
pub mod settings;
pub mod simulate;

/// Serve the device API for `home` on an already bound listener.
pub async fn serve(listener: TcpListener, home: SharedHome) -> io::Result<()> {
    axum::serve(listener, create_app(home)).await
}

pub async fn run(settings: &Arc<Settings>) -> Result<(), Box<dyn Error>> {
    let home = Arc::new(RwLock::new(Home::bundled()?));
    let simulation = simulate::spawn(Arc::clone(&home), &settings.simulation);

    let ip_addr = settings.server.host.parse::<IpAddr>()?;
    let address = SocketAddr::from((ip_addr, settings.server.port));
    let listener = TcpListener::bind(&address).await?;

    tracing::info!("listening on {:?}", address);

    let result = serve(listener, home).await;
    simulation.abort();

    Ok(result?)
}
