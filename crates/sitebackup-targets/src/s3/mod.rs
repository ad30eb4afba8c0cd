//! S3-compatible object storage target

mod store;
mod target;

pub use store::{AwsObjectStore, ObjectStore, S3Endpoint};
pub use target::S3Target;
