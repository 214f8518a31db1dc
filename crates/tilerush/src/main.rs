use tracing::metadata::LevelFilter;

use tilerush_lib::player::validate_username;

mod game;
mod net;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(LevelFilter::INFO)
        .init();

    let mut args = std::env::args().skip(1);
    let username = args.next().unwrap_or_else(|| "runner".to_owned());
    validate_username(&username).map_err(|e| anyhow::anyhow!("invalid username: {e}"))?;
    let seed: Option<u64> = args.next().and_then(|s| s.parse().ok());

    let (network_sender, network_receiver) = tokio::sync::mpsc::channel(64);
    let (logic_sender, logic_receiver) = std::sync::mpsc::channel();
    let (error_sender, error_receiver) = std::sync::mpsc::channel();

    let net_thread = std::thread::spawn(move || net::run(network_receiver, logic_sender, error_sender));

    game::run(
        username,
        seed,
        network_sender.clone(),
        logic_receiver,
        error_receiver,
    );

    let _ = network_sender.try_send(net::NetCommand::Disconnect);
    let _ = net_thread.join();
    Ok(())
}
