//! Request extractors.
//!
//! - [`auth::AuthUser`] -- the authenticated end user, from a Bearer JWT.
//! - [`auth::ServiceCaller`] -- a machine caller holding a service token.
//! - [`request::RequestContext`] -- request id plus the authenticated user,
//!   passed explicitly down the call chain.

pub mod auth;
pub mod request;
