//! External delivery channels.
//!
//! Webhook delivery carries queued job callbacks and queue gateway requests;
//! email delivery carries uploader notifications.

pub mod email;
pub mod webhook;
