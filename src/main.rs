/*!
 * Phase Driver - Demo Entry Point
 *
 * Starts a controller, waits for GREEN a few times, then shuts down.
 */

use miette::{miette, IntoDiagnostic};
use tracing::info;

use phase_driver::core::limits::{DEFAULT_CYCLES, ENV_CYCLES};
use phase_driver::{init_tracing, ControllerConfig, Phase, PhaseController};

fn main() -> miette::Result<()> {
    init_tracing();

    let config = ControllerConfig::from_env()?;
    let cycles = match std::env::var(ENV_CYCLES) {
        Ok(value) => value
            .trim()
            .parse::<u32>()
            .map_err(|e| miette!("{}: {}", ENV_CYCLES, e))?,
        Err(_) => DEFAULT_CYCLES,
    };

    info!(
        min_interval_s = config.min_interval.as_secs(),
        max_interval_s = config.max_interval.as_secs(),
        delivery = ?config.delivery,
        cycles,
        "Phase driver starting"
    );

    let controller = PhaseController::with_config(config)?;
    controller.start()?;

    for cycle in 1..=cycles {
        controller.wait_for_phase(Phase::Green)?;
        info!(cycle, phase = %controller.current_phase(), "Phase is GREEN");
    }

    let stats = controller.stats();
    let stats = serde_json::to_string(&stats).into_diagnostic()?;
    info!(stats = %stats, "Final stats");

    controller.stop()?;
    info!("Phase driver stopped");
    Ok(())
}
