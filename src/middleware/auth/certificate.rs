//! Client-certificate authentication → AuthCtx in request extensions.
//!
//! The middleware is the caller of the certificate handler: it turns each
//! outcome into a protocol-level decision.
//! - Success: insert `AuthCtx` and continue
//! - NoResult: continue anonymously, or 401 when a certificate is required
//! - Failure: 401
//! - handler error: 500

use axum::{
    Router,
    body::Body,
    extract::State,
    http::Request,
    middleware::{self, Next},
    response::Response,
};

use crate::api::v1::extractors::AuthCtx;
use crate::error::AppError;
use crate::services::auth::AuthenticateResult;
use crate::state::AppState;

/// Apply certificate authentication to every route of `router`.
///
/// ```ignore
/// let v1 = api::v1::routes();
/// let v1 = middleware::auth::certificate::apply(v1, state.clone());
/// app = app.nest("/api/v1", v1);
/// ```
pub fn apply(router: Router<AppState>, state: AppState) -> Router<AppState> {
    router.layer(middleware::from_fn_with_state(state, certificate_middleware))
}

async fn certificate_middleware(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let (parts, body) = req.into_parts();

    // The handler already logged the fault at error level.
    let outcome = state.auth.authenticate(&parts).await.map_err(|err| {
        tracing::debug!(error = %err, "responding 500 to unhandled authentication fault");
        AppError::from(err)
    })?;

    let mut req = Request::from_parts(parts, body);

    match outcome {
        AuthenticateResult::Success {
            identity,
            properties,
        } => {
            req.extensions_mut().insert(AuthCtx::new(identity, properties));
        }
        AuthenticateResult::NoResult => {
            if state.require_certificate {
                return Err(AppError::Unauthorized);
            }
        }
        AuthenticateResult::Failure { message, .. } => {
            tracing::debug!(reason = %message, "certificate authentication failed");
            return Err(AppError::Unauthorized);
        }
    }

    Ok(next.run(req).await)
}
