//! Request handler module
//!
//! Routes incoming requests to the webhook endpoint or the health probes.

pub mod router;

// Re-export main entry point
pub use router::handle_request;
