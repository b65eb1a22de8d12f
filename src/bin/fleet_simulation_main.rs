// fleet_simulation_main.rs
use fleet_intelligence::config::EngineConfig;
use fleet_intelligence::engine::FleetEngine;
use fleet_intelligence::monitoring::export::REPORTS_CSV;
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

    // Optional config path as the first argument.
    let config = match std::env::args().nth(1) {
        Some(path) => match EngineConfig::from_json_file(&path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Error loading config: {}", e);
                return;
            }
        },
        None => EngineConfig::default(),
    };

    let engine = Arc::new(FleetEngine::new(config));
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let scheduler = ReportScheduler::new(Arc::clone(&engine), current_timestamp())
        .with_csv_log(REPORTS_CSV);
    let scheduler_handle = tokio::spawn(scheduler.run(shutdown_rx.clone()));

    let simulation_handle = tokio::spawn(run_simulation(
        Arc::clone(&engine),
        demo_fleet(),
        Duration::from_secs(1),
        42,
        shutdown_rx,
    ));

    if let Err(e) = tokio::signal::ctrl_c().await {
        eprintln!("Error waiting for shutdown signal: {}", e);
    }
    let _ = shutdown_tx.send(true);

    let (reports, events) = tokio::join!(scheduler_handle, simulation_handle);
    log::info!(
        "Shutdown complete: {} reports, {} events",
        reports.unwrap_or(0),
        events.unwrap_or(0)
    );
    println!("{:#?}", engine.stats());
}
