//! Authentication primitives.
//!
//! - [`jwt`] -- HS256 token validation and service-token minting.

pub mod jwt;
