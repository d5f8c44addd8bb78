mod arcade_drive;
mod config;
mod net;
mod physics;
mod spawn;
mod state;
mod vehicle;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tokio::time::{interval, Duration, Instant, MissedTickBehavior};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::SessionConfig;
use crate::physics::PhysicsWorld;
use crate::state::{FrameSnapshot, ServerMessage, SharedSessionState};

#[derive(Debug, Parser)]
#[command(name = "drive-server", about = "Arcade driving sandbox: vehicle dynamics + chase camera over websocket")]
struct Cli {
    /// TOML session config; built-in defaults when omitted
    #[arg(long, env = "DRIVE_CONFIG")]
    config: Option<PathBuf>,

    /// Overrides `server.bind_addr`
    #[arg(long)]
    bind: Option<String>,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => {
            let config = SessionConfig::load(path)
                .with_context(|| format!("loading session config from {}", path.display()))?;
            config.log_summary(&path.display().to_string());
            config
        }
        None => {
            let config = SessionConfig::default();
            config.log_summary("defaults");
            config
        }
    };
    if let Some(bind) = cli.bind {
        config.server.bind_addr = bind;
    }

    let state = Arc::new(Mutex::new(SharedSessionState::new()));
    let mut physics = PhysicsWorld::new(&config);
    physics.spawn_vehicle(&config);

    let listener = TcpListener::bind(&config.server.bind_addr)
        .await
        .with_context(|| format!("binding websocket listener on {}", config.server.bind_addr))?;
    info!(addr = %config.server.bind_addr, "websocket listening");
    tokio::spawn(net::serve(listener, Arc::clone(&state), config.camera.zoom));

    let mut ticker = interval(Duration::from_secs_f32(1.0 / config.server.tick_hz));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut last = Instant::now();

    loop {
        ticker.tick().await;
        let now = Instant::now();
        let dt = (now - last).as_secs_f32();
        last = now;

        let input = state.lock().await.input;
        let Some(frame) = physics.step(dt, &input, &config) else {
            continue;
        };

        let mut session = state.lock().await;
        session.tick += 1;

        let trail = if frame.trail_changed || session.full_sync {
            session.full_sync = false;
            Some(physics.trail_points())
        } else {
            None
        };

        let snapshot = FrameSnapshot::from_frame(session.tick, &frame, trail);
        session.broadcast(&ServerMessage::Frame(snapshot));
    }
}
