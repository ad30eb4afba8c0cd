//! # sitebackup-targets
//!
//! Destinations for finished archives. A [`Target`] receives closed
//! archives, lists what it stores and deletes what a thinning decision
//! discards.
//!
//! The S3 target talks to the service through the [`ObjectStore`] trait,
//! implemented by [`AwsObjectStore`] on top of `aws-sdk-s3`.

pub mod error;
pub mod progress;
pub mod s3;
pub mod traits;

pub use error::{StorageError, StorageErrorKind};
pub use progress::UploadProgress;
pub use s3::{AwsObjectStore, ObjectStore, S3Endpoint, S3Target};
pub use traits::{DecideFn, Target, ThinningResult, TransferResult};
