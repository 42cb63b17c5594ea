use aws_config::BehaviorVersion;
use aws_sdk_s3::{
    error::{DisplayErrorContext, SdkError},
    operation::get_object::GetObjectError,
    primitives::ByteStreamError,
};
use bytes::Bytes;
use tracing::{debug, error};

use super::ObjectStore;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("GetObject s3://{bucket}/{key} failed: {}", DisplayErrorContext(.source))]
    GetObject {
        bucket: String,
        key: String,
        source: SdkError<GetObjectError>,
    },
    #[error("failed to aggregate body: {0}")]
    AggregateBody(ByteStreamError),
}

#[derive(Clone, Debug)]
pub struct S3Store {
    client: aws_sdk_s3::Client,
}

impl S3Store {
    pub fn new(client: aws_sdk_s3::Client) -> Self {
        Self { client }
    }

    /// Client configured from the ambient AWS environment (region, credentials
    /// of the execution role).
    pub async fn from_env() -> Self {
        let config = aws_config::defaults(BehaviorVersion::latest()).load().await;
        Self::new(aws_sdk_s3::Client::new(&config))
    }
}

impl ObjectStore for S3Store {
    type Error = Error;

    #[tracing::instrument(skip(self))]
    async fn get(&self, bucket: &str, key: &str) -> Result<Bytes, Self::Error> {
        let response = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|source| Error::GetObject {
                bucket: bucket.to_owned(),
                key: key.to_owned(),
                source,
            })
            .inspect_err(|error| error!(%error, "Failed to get object"))?;
        let body = response
            .body
            .collect()
            .await
            .map_err(Error::AggregateBody)?
            .into_bytes();
        debug!(size = body.len(), "Fetched object");
        Ok(body)
    }
}
