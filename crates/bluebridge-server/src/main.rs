#![allow(clippy::pedantic)]
#![allow(clippy::nursery)]
#![deny(clippy::unwrap_used)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::missing_const_for_fn)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cognitive_complexity)]
#![allow(clippy::manual_let_else)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::needless_raw_string_hashes)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::single_match_else)]

use bluebridge_db::migrate;

mod app;
mod bootstrap;
mod cli;
mod config;
mod domains;
mod http;
mod infra;
mod runtime;
mod settings;

fn write_openapi(out: Option<std::path::PathBuf>) -> Result<(), String> {
    let document = http::openapi::build_openapi();
    let json = serde_json::to_string_pretty(&document)
        .map_err(|err| format!("failed to render openapi document: {err}"))?;
    match out {
        Some(path) => std::fs::write(&path, json)
            .map_err(|err| format!("failed to write openapi document: {err}")),
        None => {
            println!("{json}");
            Ok(())
        }
    }
}

#[tokio::main]
async fn main() {
    let run_mode = cli::parse_args();
    if let cli::RunMode::OpenApi { out } = run_mode.clone() {
        if let Err(err) = write_openapi(out) {
            eprintln!("{err}");
            std::process::exit(1);
        }
        return;
    }

    let settings = settings::Settings::from_env();
    let sentry_guard = bootstrap::init_sentry(&settings);
    let otel_guard = bootstrap::init_tracing(sentry_guard.is_some(), &settings);
    if matches!(run_mode, cli::RunMode::Server) {
        if let Err(missing) = settings::preflight(&settings) {
            tracing::error!(
                event = "preflight_failed",
                missing = ?missing,
                "Required configuration missing"
            );
            std::process::exit(1);
        }
    }
    bootstrap::log_startup(&settings);
    bootstrap::init_metrics_registry(&settings.config.metrics);

    let db = match bootstrap::connect_db(&settings).await {
        Ok(db) => db,
        Err(err) => {
            tracing::error!(event = "db_connect_failed", error = %err);
            std::process::exit(1);
        }
    };
    match run_mode {
        cli::RunMode::Migrate => {
            if let Err(err) = migrate(&db).await {
                tracing::error!(error = %err, "migration failed");
                std::process::exit(1);
            }
            tracing::info!("migrations applied");
            return;
        }
        cli::RunMode::Seed => {
            if let Err(err) = cli::seed::run(&db).await {
                eprintln!("{err}");
                std::process::exit(1);
            }
            return;
        }
        cli::RunMode::Server | cli::RunMode::OpenApi { .. } => {}
    }

    let state = match bootstrap::build_state(&settings, db) {
        Ok(state) => state,
        Err(err) => {
            tracing::error!(event = "state_init_failed", error = %err);
            std::process::exit(1);
        }
    };
    bootstrap::start_background_tasks(&settings, &state);
    let app = bootstrap::build_app(&settings, state);
    bootstrap::serve(&settings, app).await;

    drop(otel_guard);
    drop(sentry_guard);
}
