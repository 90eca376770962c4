use axum::{
    Extension,
    extract::Query,
    response::{Html, IntoResponse, Redirect, Response},
};

use crate::{management::DEFAULT_SESSION, server::AppState, types::CallbackParams, warning};

/// Redirects the browser to the provider's consent page.
pub async fn login(Extension(state): Extension<AppState>) -> Redirect {
    let url = state.flow.begin_login(DEFAULT_SESSION);
    Redirect::temporary(url.as_str())
}

pub async fn callback(
    Query(params): Query<CallbackParams>,
    Extension(state): Extension<AppState>,
) -> Response {
    match state
        .flow
        .complete_login(
            params.code.as_deref(),
            params.state.as_deref(),
            params.error.as_deref(),
        )
        .await
    {
        Ok(_) => Html(
            "<h2>Authentication successful.</h2>\
             <p>Access token received and stored. Go to <a href=\"/tracks\">/tracks</a> to see top tracks.</p>",
        )
        .into_response(),
        Err(e) => {
            warning!("Login failed: {}", e);
            e.into_response()
        }
    }
}
