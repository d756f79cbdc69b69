/*
 * Responsibility
 * - GET /me: echo the identity built from the client certificate
 */
use axum::Json;
use serde::Serialize;

use crate::api::v1::extractors::AuthCtxExtractor;
use crate::services::auth::{AuthProperties, IdentityClaim};

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub scheme: String,
    pub name: Option<String>,
    pub claims: Vec<IdentityClaim>,
    pub properties: AuthProperties,
}

pub async fn me(AuthCtxExtractor(ctx): AuthCtxExtractor) -> Json<MeResponse> {
    let name = ctx.identity.name().map(str::to_owned);
    Json(MeResponse {
        scheme: ctx.identity.scheme,
        name,
        claims: ctx.identity.claims,
        properties: ctx.properties,
    })
}
