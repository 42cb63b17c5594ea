//! Object storage access
//!
//! The pipeline only ever reads one object per invocation, in full.

pub mod memory;
pub mod s3;

use bytes::Bytes;

pub trait ObjectStore {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Fetches the whole object. A single attempt, no retry.
    fn get(
        &self,
        bucket: &str,
        key: &str,
    ) -> impl Future<Output = Result<Bytes, Self::Error>> + Send;
}
