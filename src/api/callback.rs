use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use tokio::sync::{Mutex, Notify, oneshot};

/// State shared between the listener and its single handler invocation.
#[derive(Clone)]
pub struct CaptureState {
    /// Query parameter to capture, e.g. `token` or `code`.
    pub param: &'static str,
    /// HTML returned to the browser once the parameter was captured.
    pub body: &'static str,
    pub slot: Arc<Mutex<Option<oneshot::Sender<Option<String>>>>>,
    pub shutdown: Arc<Notify>,
}

/// Handles the browser redirect.
///
/// The first request takes the sender out of the slot, hands over the
/// captured value (or `None` when the parameter is missing) and asks the
/// server to stop. Anything arriving after that is answered with `410`.
pub async fn capture(
    State(state): State<CaptureState>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let Some(sender) = state.slot.lock().await.take() else {
        return StatusCode::GONE.into_response();
    };
    state.shutdown.notify_one();

    let value = params
        .get(state.param)
        .filter(|v| !v.is_empty())
        .cloned();

    match value {
        Some(value) => {
            let _ = sender.send(Some(value));
            (StatusCode::OK, Html(state.body)).into_response()
        }
        None => {
            let _ = sender.send(None);
            StatusCode::BAD_REQUEST.into_response()
        }
    }
}
