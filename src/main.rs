use std::{path::Path, process, sync::Arc};

use promo_enrollment_service::{
    adapters::{database::memory::MemoryDatabase, stdio::StdioAdapter},
    commands::{EnrollmentLogic, PromoLifecycle},
    config::Config,
    domain::Member,
    telemetry,
};
use tokio::io::{self, BufReader};
use tracing::{error, info};

#[derive(Debug, thiserror::Error)]
enum StartupError {
    #[error("unable to read members file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("unable to parse members file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

async fn load_members(path: &Path) -> Result<Vec<Member>, StartupError> {
    let raw = tokio::fs::read(path)
        .await
        .map_err(|source| StartupError::Read {
            path: path.display().to_string(),
            source,
        })?;

    serde_json::from_slice(&raw).map_err(|source| StartupError::Parse {
        path: path.display().to_string(),
        source,
    })
}

#[tokio::main]
async fn main() {
    let config = Config::load().unwrap_or_else(|err| err.exit());

    if let Err(err) = telemetry::init(&config) {
        eprintln!("Telemetry error: {err}");
        process::exit(1);
    }

    let members = match &config.members {
        Some(path) => match load_members(path).await {
            Ok(members) => members,
            Err(err) => {
                error!(error = %err, "startup failed");
                process::exit(1);
            }
        },
        None => Vec::new(),
    };
    info!(members = members.len(), "starting");

    let database = Arc::new(MemoryDatabase::with_members(members));
    let adapter = StdioAdapter::new(
        PromoLifecycle::new(database.clone()),
        EnrollmentLogic::new(database.clone(), database.clone(), database.clone()),
    );

    if let Err(err) = adapter
        .serve(BufReader::new(io::stdin()), io::stdout())
        .await
    {
        error!(error = %err, "i/o failure");
        process::exit(1);
    }

    match database.enrollments() {
        Ok(enrollments) => info!(enrollments = enrollments.len(), "input closed, shutting down"),
        Err(err) => error!(error = %err, "input closed, store unreadable"),
    }
}
