//! Engine binary for the Harbour coordinator.
//!
//! This is the main entry point that wires together the container
//! manifest, the tick loop, the visualization link server, and operator
//! controls. It loads configuration, initializes all subsystems, and runs
//! the coordinator until a termination condition is met.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `harbour-config.yaml`
//! 2. Initialize structured logging (tracing)
//! 3. Load the container manifest into the pool
//! 4. Create the simulation clock and outbound sink
//! 5. Create operator state from simulation bounds
//! 6. Start the link server
//! 7. Run the coordinator loop
//! 8. Log the result

mod error;
mod status_callback;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use harbour_core::clock::SimulationClock;
use harbour_core::config::{HarbourConfig, LoggingConfig};
use harbour_core::emitter::EventEmitter;
use harbour_core::manifest;
use harbour_core::operator::OperatorState;
use harbour_core::pool::ContainerPool;
use harbour_core::runner;
use harbour_core::sink::{ChannelSink, ConnectionState};
use harbour_core::tick::CoordinatorState;
use harbour_link::state::AppState;
use harbour_link::ServerConfig;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::error::EngineError;
use crate::status_callback::StatusCallback;

/// Config file looked up in the working directory.
const CONFIG_PATH: &str = "harbour-config.yaml";

/// Application entry point for the engine.
///
/// # Errors
///
/// Returns an error if any initialization step or the coordinator fails.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Load configuration.
    let config = load_config()?;

    // 2. Initialize structured logging.
    init_tracing(&config.logging);
    info!("harbour-engine starting");
    info!(
        start_date = %config.clock.start_date,
        time_multiplier = config.clock.time_multiplier,
        tick_interval_ms = config.simulation.tick_interval_ms,
        format = ?config.link.format,
        "Configuration loaded"
    );

    // 3. Load the manifest.
    let load = manifest::load_manifest(Path::new(&config.manifest.path))
        .map_err(EngineError::from)?;
    if !load.rejected.is_empty() {
        warn!(rejected = load.rejected.len(), "Some manifest entries were rejected");
    }
    let mut pool = ContainerPool::new();
    let accepted = load.containers.len();
    let pooled = pool.add_all(load.containers);
    info!(
        pooled,
        duplicates = accepted.saturating_sub(pooled),
        next_arrival = ?pool.next_arrival(),
        "Container pool filled"
    );

    // 4. Clock, sink and emitter.
    let clock = SimulationClock::new(&config.clock);
    let connection = Arc::new(ConnectionState::new());
    let (sink, outbound) = ChannelSink::channel(Arc::clone(&connection));
    let mut emitter = EventEmitter::new(sink, config.link.format);
    let mut state = CoordinatorState::new(clock, pool);

    // 5. Operator state.
    let operator = Arc::new(OperatorState::new(&config.simulation));
    spawn_signal_handler(Arc::clone(&operator));

    // 6. Link server.
    let app_state = Arc::new(
        AppState::new(
            Arc::clone(&connection),
            outbound,
            status_callback::snapshot_of(&state),
        )
        .with_operator(Arc::clone(&operator)),
    );
    let server_config = ServerConfig::from(&config.link);
    let _link_handle = harbour_link::spawn_link(&server_config, Arc::clone(&app_state))
        .await
        .map_err(EngineError::from)?;

    // 7. Run the coordinator.
    let mut callback = StatusCallback::new(app_state);
    let poll = Duration::from_millis(config.simulation.connection_poll_ms);
    let result = runner::run_coordinator(&mut state, &mut emitter, &operator, poll, &mut callback)
        .await
        .map_err(EngineError::from)?;

    // 8. Log results.
    runner::log_run_end(&result);
    info!(
        end_reason = ?result.end_reason,
        total_ticks = result.total_ticks,
        still_pending = state.pool.len(),
        unsent = state.backlog.len(),
        "harbour-engine shutdown complete"
    );

    Ok(())
}

/// Load `harbour-config.yaml` from the working directory, or defaults.
///
/// Environment overrides apply either way.
fn load_config() -> Result<HarbourConfig, EngineError> {
    let path = Path::new(CONFIG_PATH);
    if path.exists() {
        Ok(HarbourConfig::from_file(path)?)
    } else {
        let mut config = HarbourConfig::default();
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }
}

/// Install the global subscriber. `RUST_LOG` wins over the configured level.
fn init_tracing(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));

    if logging.json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    }
}

/// Turn Ctrl-C into an operator stop so the loop ends at a tick boundary.
fn spawn_signal_handler(operator: Arc<OperatorState>) {
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Ctrl-C received, stopping coordinator");
                operator.request_stop();
            }
            Err(e) => warn!(error = %e, "Could not listen for Ctrl-C"),
        }
    });
}
