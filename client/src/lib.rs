//! RETS session client for retsq
//!
//! Owns the lifecycle of an authenticated session against a RETS server:
//! login with the single-retry workaround, per-call logged-in guards, and
//! unconditional teardown. The wire protocol itself sits behind the narrow
//! [`RetsTransport`] trait; [`HttpTransport`] is a thin HTTP adapter for it.

pub mod http;
pub mod profile;
pub mod session;
pub mod transport;

// Re-export commonly used types
pub use http::HttpTransport;
pub use profile::SessionProfile;
pub use session::Session;
pub use transport::RetsTransport;
