//! API request handlers.

/// JSON question answering.
pub mod ask;
/// HTML form page.
pub mod form;
/// Health check.
pub mod health;
