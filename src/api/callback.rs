use std::{collections::HashMap, sync::Arc};

use axum::{Extension, extract::Query, response::Html};
use tokio::sync::Mutex;

use crate::types::CallbackResult;

/// Handles the authorization redirect from Spotify.
///
/// Records the `code`, `state` and `error` query parameters into the shared
/// slot; only one legitimate callback is expected per attempt, so every write
/// overwrites. The response is a static confirmation page regardless of
/// content - the orchestrator, not the browser, decides how the attempt ends.
pub async fn callback(
    Query(params): Query<HashMap<String, String>>,
    Extension(shared_state): Extension<Arc<Mutex<Option<CallbackResult>>>>,
) -> Html<&'static str> {
    let mut slot = shared_state.lock().await;
    *slot = Some(CallbackResult {
        code: params.get("code").cloned(),
        state: params.get("state").cloned(),
        error: params.get("error").cloned(),
    });

    Html("<html><body><h2>Authorization received.</h2><p>You can close this window.</p></body></html>")
}
