use std::path::PathBuf;
use std::process::ExitCode;

use chrono::Utc;

use streambench::config::Config;
use streambench::dispatch::ConsoleProgress;
use streambench::dispatch::http::HttpExecutor;
use streambench::publish;
use streambench::record::RunResult;
use streambench::runner::Runner;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    // Prefer a .env next to the binary (scheduled jobs may start with any CWD),
    // then fall back to dotenvy's CWD search.
    let beside_exe = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join(".env")))
        .filter(|path| path.exists());
    match beside_exe {
        Some(path) => {
            dotenvy::from_path(&path).ok();
        }
        None => {
            dotenvy::dotenv().ok();
        }
    }

    let (config, parse_error) = Config::resolve_env();
    let result = match parse_error {
        Some(e) => {
            tracing::error!(error = %e, "invalid configuration");
            RunResult::config_error(config.request_count, Utc::now(), e.to_string())
        }
        None => match HttpExecutor::with_progress(Box::new(ConsoleProgress)) {
            Ok(executor) => Runner::new(executor).run(&config).await,
            Err(e) => {
                tracing::error!(error = %e, "failed to construct run");
                RunResult::runtime_error(config.request_count, Utc::now(), e.to_string())
            }
        },
    };

    let step_summary = std::env::var_os("GITHUB_STEP_SUMMARY").map(PathBuf::from);
    let result = publish::publish(result, &config, step_summary.as_deref());

    tracing::info!(
        status = %result.status,
        path = %config.document_path.display(),
        "run complete"
    );
    Ok(ExitCode::from(result.status.exit_code()))
}
