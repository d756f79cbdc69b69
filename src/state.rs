/*
 * Responsibility
 * - Shared context attached to the Router (AppState)
 *   - certificate handler, request policy
 * - Cheap to clone (Arc inside)
 */
use std::sync::Arc;

use crate::services::auth::CertificateAuthenticationHandler;

#[derive(Clone, Debug)]
pub struct AppState {
    pub auth: Arc<CertificateAuthenticationHandler>,
    // Anonymous requests (no certificate / plain http) get 401 when set.
    pub require_certificate: bool,
}

impl AppState {
    pub fn new(auth: Arc<CertificateAuthenticationHandler>, require_certificate: bool) -> Self {
        Self {
            auth,
            require_certificate,
        }
    }
}
