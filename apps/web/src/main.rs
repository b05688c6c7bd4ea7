//! authsweep web view: review tester accounts before deleting them.

#![forbid(unsafe_code)]

mod error;
mod handlers;
mod router;
mod state;
mod web_config;

use authsweep_application::PruneService;
use authsweep_core::AppError;
use authsweep_infrastructure::initialize_default_directory;
use tracing::info;

use crate::state::AppState;
use crate::web_config::{WebConfig, init_tracing};

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = WebConfig::load().await?;
    let address = config.socket_address()?;
    let directory = initialize_default_directory(config.directory)?;

    let app_state = AppState {
        project_id: directory.project_id().to_owned(),
        prune_service: PruneService::new(directory),
    };
    let app = router::build_router(app_state);

    let listener = tokio::net::TcpListener::bind(address)
        .await
        .map_err(|error| AppError::Internal(format!("failed to bind listener: {error}")))?;

    info!(%address, "authsweep-web listening");

    axum::serve(listener, app)
        .await
        .map_err(|error| AppError::Internal(format!("web server error: {error}")))
}
