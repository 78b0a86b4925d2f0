//! liftlog binary entry point.
//!
//! Opens the preferred backend and runs one command:
//! - `summary` (default): log catalog and history counts and per-move volume
//! - `export <path>`: write the relational database image to a file
//! - `import <path>`: validate and load a database image
//! - `use <embedded-store|relational>`: remember the backend for the next run
//!
//! All logs go to stderr.

use std::sync::Arc;

use liftlog::cache::MoveCache;
use liftlog::color::{ColorAllocator, RandomHueSource};
use liftlog::config::Config;
use liftlog::error::AppError;
use liftlog::selector::{
    select_backend, switch_backend, BackendKind, FilePreferenceStore, OpenOptions, Storage,
};
use liftlog::series::build_series;
use liftlog::storage::{BackendContext, SessionImage};
use liftlog::traits::{RealTimeProvider, StorageTrait};

enum Command {
    Summary,
    Export(String),
    Import(String),
    Use(BackendKind),
}

fn parse_command(args: &[String]) -> Result<Command, AppError> {
    let usage = |message: &str| AppError::Usage {
        message: message.to_string(),
    };
    match args {
        [] => Ok(Command::Summary),
        [cmd] if cmd == "summary" => Ok(Command::Summary),
        [cmd, path] if cmd == "export" => Ok(Command::Export(path.clone())),
        [cmd, path] if cmd == "import" => Ok(Command::Import(path.clone())),
        [cmd, kind] if cmd == "use" => Ok(Command::Use(kind.parse()?)),
        _ => Err(usage(
            "expected one of: summary | export <path> | import <path> | use <embedded-store|relational>",
        )),
    }
}

async fn summary(storage: &Storage) -> Result<(), AppError> {
    let moves = MoveCache::load(storage).await?;
    let history = storage.get_all_history().await?;
    let labels = storage.get_all_labels().await?;

    tracing::info!(
        backend = %storage.kind(),
        moves = moves.len(),
        active = moves.active().count(),
        sets = history.len(),
        labels = labels.len(),
        "storage summary"
    );
    for series in build_series(&history, &moves) {
        tracing::info!(
            name = %series.move_name,
            color = series.color.as_deref().unwrap_or("-"),
            sets = series.points.len(),
            total_volume = series.total_volume(),
            "volume"
        );
    }
    Ok(())
}

async fn run(command: Command, config: &Config) -> Result<(), AppError> {
    let preferences = FilePreferenceStore::new(config.preference_path());
    let session = SessionImage::new();

    if let Command::Use(kind) = command {
        return switch_backend(&preferences, kind, &session);
    }

    let allocator = ColorAllocator::new(Arc::new(RandomHueSource))
        .with_max_attempts(config.color_attempts);
    let options = OpenOptions::default()
        .with_store_path(config.store_path())
        .with_session(session)
        .with_context(BackendContext::new(allocator, Arc::new(RealTimeProvider)));
    let storage = select_backend(&preferences, config.backend, options).await?;

    match command {
        Command::Summary => summary(&storage).await,
        Command::Export(path) => {
            let image = storage.export_image().await?;
            std::fs::write(&path, &image).map_err(|e| AppError::Usage {
                message: format!("cannot write {path}: {e}"),
            })?;
            tracing::info!(path = %path, bytes = image.len(), "exported database");
            Ok(())
        }
        Command::Import(path) => {
            let image = std::fs::read(&path).map_err(|e| AppError::Usage {
                message: format!("cannot read {path}: {e}"),
            })?;
            storage.import_image(&image).await?;
            summary(&storage).await
        }
        Command::Use(_) => Ok(()),
    }
}

#[tokio::main]
async fn main() {
    // Initialize logging to stderr
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("LOG_LEVEL")
                .unwrap_or_else(|_| "info".to_string())
                .parse()
                .unwrap_or_else(|_| tracing_subscriber::filter::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Configuration error: {e}");
            std::process::exit(1);
        }
    };

    tracing::info!(
        "Configuration loaded: data_dir={}, backend={}",
        config.data_dir,
        config.backend
    );

    let args: Vec<String> = std::env::args().skip(1).collect();
    let result = match parse_command(&args) {
        Ok(command) => run(command, &config).await,
        Err(e) => Err(e),
    };
    if let Err(e) = result {
        if e.is_recoverable() {
            tracing::warn!("{e}; fix the input and retry");
        } else {
            tracing::error!("{e}");
        }
        std::process::exit(e.exit_code());
    }
}
