use std::process::ExitCode;

use tick_engine::run_app;
use tracing::error;

use super::bootstrap::AppWiring;
use super::demo;

pub(crate) fn run(app: AppWiring) -> ExitCode {
    let AppWiring { config, arena } = app;
    if let Err(err) = run_app(config, move |engine| {
        demo::install(engine, arena);
    }) {
        error!(error = %err, "startup_failed");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}
