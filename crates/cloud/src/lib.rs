//! Object storage integration for syllabus files.
//!
//! - [`Presigner`] -- the storage signer seam used by the upload pipeline.
//! - [`S3Presigner`] -- presigned PUT/GET URLs against S3 or an S3-compatible
//!   endpoint (MinIO, LocalStack).

pub mod presigner;

pub use presigner::{CloudError, Presigner, S3Config, S3Presigner};
