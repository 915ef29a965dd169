/// Bearer-token authentication
///
/// Protected routes are wrapped in [`jwt_auth_layer`]. It validates the access
/// token, rejects revoked ones, and stores the caller's
/// [`AuthContext`](taskpixie_shared::auth::AuthContext) in the request
/// extensions for handlers to pick up with `Extension<AuthContext>`.

use crate::{app::AppState, error::ApiError};
use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use taskpixie_shared::auth::session::parse_bearer;

pub async fn jwt_auth_layer(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let header_value = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    let token = parse_bearer(header_value)?;
    let auth = state.users.authenticate(token).await?;

    tracing::debug!(user_id = %auth.user_id, "Request authenticated");
    req.extensions_mut().insert(auth);

    Ok(next.run(req).await)
}
