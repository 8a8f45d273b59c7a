//! Outbound side effects of the upload pipeline.
//!
//! - [`Notifier`] -- tells an uploader what happened to their file, over SMTP
//!   ([`EmailNotifier`]) or only to the log ([`LogNotifier`]).
//! - [`JobQueue`] -- schedules the delayed verification callback, either via an
//!   external queue gateway ([`HttpJobQueue`]) or in-process
//!   ([`LocalDelayQueue`]).
//! - [`delivery`] -- the HTTP and SMTP transports both of the above sit on.

pub mod delivery;
pub mod notifier;
pub mod queue;

pub use delivery::email::{EmailConfig, EmailNotifier};
pub use delivery::webhook::WebhookDelivery;
pub use notifier::{LogNotifier, Notifier, NotifyError};
pub use queue::{DelayedJob, HttpJobQueue, JobQueue, LocalDelayQueue, QueueConfig, QueueError};
