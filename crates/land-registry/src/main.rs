use land_registry::app::{self, settings::Settings};
use std::process::ExitCode;

fn main() -> ExitCode {
    let settings = Settings::from_cli();
    app::logging::setup_logging(settings.verbose);

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            tracing::error!("Failed to create Tokio runtime: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match rt.block_on(app::run(settings)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
