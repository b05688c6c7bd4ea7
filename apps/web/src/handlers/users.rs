use std::collections::HashSet;

use axum::Form;
use axum::extract::{Path, State};
use axum::response::Html;
use authsweep_domain::UserFilter;
use tracing::{debug, info};

use crate::error::ApiResult;
use crate::state::AppState;

mod view;


/// Checkbox value browsers submit for a ticked box.
const CHECKED: &str = "on";

pub async fn list_testers_handler(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> ApiResult<Html<String>> {
    info!(
        project_id = %state.project_id,
        username = %username,
        "listing tester accounts"
    );

    let filter = UserFilter::tester(username.as_str())?;
    let candidates = state.prune_service.list_candidates(&filter).await?;
    for candidate in &candidates {
        debug!(
            uid = candidate.uid(),
            email = candidate.email().unwrap_or_default(),
            "tester candidate"
        );
    }

    Ok(Html(view::render_tester_list(&username, &candidates)))
}

pub async fn delete_uuids_handler(
    State(state): State<AppState>,
    Form(fields): Form<Vec<(String, String)>>,
) -> ApiResult<String> {
    let uids = checked_uids(fields);

    for uid in &uids {
        info!(uid = %uid, "deleting user");
    }
    state.prune_service.delete_confirmed(&uids, "tester").await?;

    Ok(deletion_message(uids.len()))
}

/// Returns the ticked uids once each, in submission order.
fn checked_uids(fields: Vec<(String, String)>) -> Vec<String> {
    let mut seen = HashSet::new();
    fields
        .into_iter()
        .filter(|(_, value)| value == CHECKED)
        .map(|(uid, _)| uid)
        .filter(|uid| seen.insert(uid.clone()))
        .collect()
}

fn deletion_message(count: usize) -> String {
    let plural = if count == 1 { "" } else { "s" };
    format!("Deleting {count} tester account{plural}...")
}
