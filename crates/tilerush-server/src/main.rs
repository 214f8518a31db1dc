mod client;
mod health;
mod state;

use state::ServerState;
use tokio::net::TcpListener;

const DEFAULT_PORT: u16 = 42810;
const DEFAULT_HEALTH_PORT: u16 = 8810;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt().init();

    tracing::info!("Relay version: {}", env!("CARGO_PKG_VERSION"));

    let port = env_port("PORT", DEFAULT_PORT);
    let health_port = env_port("HEALTH_PORT", DEFAULT_HEALTH_PORT);

    let state = ServerState::default();

    {
        let state = state.clone();
        tokio::spawn(async move {
            if let Err(error) = health::serve(state, health_port).await {
                tracing::error!(%error, "Health endpoint failed");
            }
        });
    }

    let listener = TcpListener::bind(("0.0.0.0", port)).await.unwrap();
    tracing::info!("Listening on port {port}");

    loop {
        let (socket, _) = listener.accept().await.unwrap();

        tokio::spawn(client::handle_new_connection(state.clone(), socket));
    }
}

fn env_port(var: &str, default: u16) -> u16 {
    std::env::var(var)
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(default)
}
