/*
 * Responsibility
 * - Public interface of the middleware layer (re-export)
 * - auth::certificate::apply(...), http::apply(...)
 */
pub mod auth;
pub mod http;
