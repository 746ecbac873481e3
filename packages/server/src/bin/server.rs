//! Cowatch room hub server.
//!
//! Accepts WebSocket connections per room, keeps every viewer of a room on one
//! playback timeline and relays chat between them.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin cowatch-server
//! cargo run --bin cowatch-server -- --host 0.0.0.0 --port 3000 --fixtures ./fixtures.json
//! ```

use std::{path::PathBuf, sync::Arc};

use clap::Parser;
use cowatch_server::{
    domain::{RoomRepository, TokenVerifier},
    infrastructure::{
        auth::JwtTokenVerifier,
        hub::{Hub, HubConfig, OverflowPolicy},
        repository::{Fixtures, InMemoryRoomRepository},
    },
    ui::{AppState, Server},
    usecase::{
        BootstrapSessionUseCase, ConnectParticipantUseCase, DisconnectParticipantUseCase,
        DispatchEventUseCase, GetPresenceUseCase,
    },
};
use cowatch_shared::{
    logger::setup_logger,
    time::{Clock, SystemClock},
};

#[derive(Parser, Debug)]
#[command(name = "cowatch-server")]
#[command(about = "Real-time room hub for watch-together sessions", long_about = None)]
struct Args {
    /// Host address to bind the server to
    #[arg(short = 'H', long, env = "COWATCH_HOST", default_value = "127.0.0.1")]
    host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, env = "PORT", default_value = "8080")]
    port: u16,

    /// HS256 secret used to verify access tokens
    #[arg(
        long,
        env = "JWT_SECRET",
        default_value = "your-secret-key-change-in-production",
        hide_env_values = true
    )]
    jwt_secret: String,

    /// JSON file with users, rooms, memberships and videos to preload
    #[arg(long, env = "COWATCH_FIXTURES")]
    fixtures: Option<PathBuf>,

    /// Capacity of each connection's outbound queue
    #[arg(long, env = "COWATCH_OUTBOUND_CAPACITY", default_value_t = 256)]
    outbound_capacity: usize,

    /// Capacity of the hub's command channel
    #[arg(long, env = "COWATCH_COMMAND_CAPACITY", default_value_t = 1024)]
    command_capacity: usize,

    /// Capacity of the hub's internal dispatch queue
    #[arg(long, env = "COWATCH_DISPATCH_CAPACITY", default_value_t = 1024)]
    dispatch_capacity: usize,

    /// What to drop when the dispatch queue is full (drop-oldest | drop-newest)
    #[arg(long, env = "COWATCH_OVERFLOW_POLICY", default_value = "drop-oldest")]
    overflow_policy: OverflowPolicy,

    /// Do not announce user:left when a slow consumer is evicted
    #[arg(long, env = "COWATCH_SILENT_EVICTION")]
    silent_eviction: bool,
}

impl Args {
    fn hub_config(&self) -> HubConfig {
        HubConfig {
            outbound_capacity: self.outbound_capacity,
            command_capacity: self.command_capacity,
            dispatch_capacity: self.dispatch_capacity,
            overflow_policy: self.overflow_policy,
            silent_eviction: self.silent_eviction,
        }
    }
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "info");

    let args = Args::parse();

    // Initialize dependencies in order:
    // 1. Repository
    // 2. TokenVerifier / Clock
    // 3. Hub
    // 4. UseCases
    // 5. AppState
    // 6. Server

    // 1. Create Repository (in-memory, optionally preloaded)
    let repository: Arc<dyn RoomRepository> = match &args.fixtures {
        Some(path) => {
            let loaded = Fixtures::from_path(path).and_then(InMemoryRoomRepository::from_fixtures);
            match loaded {
                Ok(repository) => Arc::new(repository),
                Err(e) => {
                    tracing::error!("Failed to load fixtures from {}: {}", path.display(), e);
                    std::process::exit(1);
                }
            }
        }
        None => {
            tracing::warn!("No fixtures given, starting with an empty repository");
            Arc::new(InMemoryRoomRepository::new())
        }
    };

    // 2. Create TokenVerifier and Clock
    let verifier: Arc<dyn TokenVerifier> = Arc::new(JwtTokenVerifier::new(&args.jwt_secret));
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    // 3. Start the hub
    let config = args.hub_config();
    tracing::info!(
        "Hub config: outbound={}, commands={}, dispatch={}, overflow={}, silent_eviction={}",
        config.outbound_capacity,
        config.command_capacity,
        config.dispatch_capacity,
        config.overflow_policy,
        config.silent_eviction
    );
    let outbound_capacity = config.outbound_capacity;
    let (hub, hub_handle) = Hub::new(config, clock.clone());
    let hub_task = hub.spawn();

    // 4. Create UseCases
    let connect_participant_usecase = Arc::new(ConnectParticipantUseCase::new(
        repository.clone(),
        verifier,
        hub_handle.clone(),
        clock.clone(),
    ));
    let bootstrap_session_usecase = Arc::new(BootstrapSessionUseCase::new(
        repository.clone(),
        hub_handle.clone(),
        clock.clone(),
    ));
    let dispatch_event_usecase = Arc::new(DispatchEventUseCase::new(
        repository.clone(),
        hub_handle.clone(),
        clock.clone(),
    ));
    let disconnect_participant_usecase =
        Arc::new(DisconnectParticipantUseCase::new(hub_handle.clone()));
    let get_presence_usecase = Arc::new(GetPresenceUseCase::new(hub_handle.clone()));

    // 5. Create AppState
    let state = AppState {
        connect_participant_usecase,
        bootstrap_session_usecase,
        dispatch_event_usecase,
        disconnect_participant_usecase,
        get_presence_usecase,
        outbound_capacity,
    };

    // 6. Run the server
    let server = Server::new(state);
    let result = server.run(args.host, args.port).await;

    // Stop the hub: every open connection's queue closes and its pump finishes
    hub_handle.shutdown();
    if let Err(e) = hub_task.await {
        tracing::error!("Hub task failed: {}", e);
    }

    if let Err(e) = result {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
