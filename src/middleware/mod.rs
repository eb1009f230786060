/*
 * Responsibility
 * - Public surface of the middleware stack (re-exports)
 */
pub mod cors;
pub mod external_auth;
pub mod http;
pub mod security_headers;
