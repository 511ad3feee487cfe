//! Liked-post webhook
//!
//! Validates the JSON payload an automation service posts for each liked
//! post and answers with a JSON acknowledgement or error. Nothing is stored.

mod date;
mod error;
mod handler;
mod types;
mod validate;

pub use error::WebhookError;
pub use handler::{respond, respond_error, ResponseBuilder};
pub use types::WebhookRequest;
