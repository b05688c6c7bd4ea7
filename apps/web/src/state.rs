use authsweep_application::PruneService;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub prune_service: PruneService,
    pub project_id: String,
}
