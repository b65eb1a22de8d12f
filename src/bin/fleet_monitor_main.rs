use fleet_intelligence::engine::FleetEngine;
use fleet_intelligence::monitoring::admin_cli::run_cli;
use fleet_intelligence::monitoring::ReportScheduler;
use fleet_intelligence::shared_data::current_timestamp;
use fleet_intelligence::simulation_engine::fleet::demo_fleet;
use fleet_intelligence::simulation_engine::simulation::run_simulation;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::time::Duration;

#[tokio::main]
async fn main() {
    env_logger::init();

    let engine = Arc::new(FleetEngine::default());
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // Simulated telemetry keeps the menu populated.
    let simulation_handle = tokio::spawn(run_simulation(
        Arc::clone(&engine),
        demo_fleet(),
        Duration::from_secs(2),
        7,
        shutdown_rx.clone(),
    ));
    let scheduler_handle = tokio::spawn(
        ReportScheduler::new(Arc::clone(&engine), current_timestamp()).run(shutdown_rx),
    );

    // The CLI exits on its own.
    run_cli(Arc::clone(&engine)).await;

    let _ = shutdown_tx.send(true);
    let _ = tokio::join!(simulation_handle, scheduler_handle);
}
