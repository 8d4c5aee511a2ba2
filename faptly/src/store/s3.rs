// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! S3-compatible object store. */

use {
    super::{ObjectStore, WalkVisit},
    crate::error::{FaptlyError, Result},
    async_trait::async_trait,
    rusoto_core::{ByteStream, HttpClient, Region, RusotoError},
    rusoto_credential::StaticProvider,
    rusoto_s3::{
        DeleteObjectRequest, GetObjectError, GetObjectRequest, HeadObjectError,
        HeadObjectRequest, ListObjectsV2Request, PutObjectRequest, S3Client, S3,
    },
    tokio::io::AsyncReadExt,
};

/// An [ObjectStore] bound to one bucket of an S3-compatible endpoint with
/// static credentials.
///
/// The engine does not retry; transient failures are the HTTP client's
/// concern and everything else surfaces as a transport error.
pub struct S3Store {
    client: S3Client,
    bucket: String,
}

impl S3Store {
    /// Create a store bound to a bucket.
    ///
    /// `endpoint` may be a bare host; the scheme defaults to `https://`.
    pub fn new(endpoint: &str, bucket: &str, access_key: &str, secret_key: &str) -> Result<Self> {
        let endpoint = if endpoint.contains("://") {
            endpoint.to_string()
        } else {
            format!("https://{}", endpoint)
        };

        let region = Region::Custom {
            name: "custom".to_string(),
            endpoint,
        };

        let dispatcher = HttpClient::new()
            .map_err(|e| FaptlyError::Transport(bucket.to_string(), format!("{:?}", e)))?;
        let credentials =
            StaticProvider::new_minimal(access_key.to_string(), secret_key.to_string());

        Ok(Self {
            client: S3Client::new_with(dispatcher, credentials, region),
            bucket: bucket.to_string(),
        })
    }

    fn transport(path: &str, e: impl std::fmt::Debug) -> FaptlyError {
        FaptlyError::Transport(path.to_string(), format!("{:?}", e))
    }
}

#[async_trait]
impl ObjectStore for S3Store {
    async fn exists(&self, path: &str) -> Result<bool> {
        let req = HeadObjectRequest {
            bucket: self.bucket.clone(),
            key: path.to_string(),
            ..Default::default()
        };

        match self.client.head_object(req).await {
            Ok(_) => Ok(true),
            Err(RusotoError::Service(HeadObjectError::NoSuchKey(_))) => Ok(false),
            // HEAD failures carry no body, so a missing key surfaces as a
            // bare 404 rather than a decoded NoSuchKey.
            Err(RusotoError::Unknown(resp)) if resp.status.as_u16() == 404 => Ok(false),
            Err(e) => Err(Self::transport(path, e)),
        }
    }

    async fn get(&self, path: &str) -> Result<Vec<u8>> {
        let req = GetObjectRequest {
            bucket: self.bucket.clone(),
            key: path.to_string(),
            ..Default::default()
        };

        match self.client.get_object(req).await {
            Ok(output) => {
                let body = output
                    .body
                    .ok_or_else(|| Self::transport(path, "response has no body"))?;

                let mut data = match output.content_length {
                    Some(len) => Vec::with_capacity(len as usize),
                    None => vec![],
                };

                body.into_async_read()
                    .read_to_end(&mut data)
                    .await
                    .map_err(|e| Self::transport(path, e))?;

                Ok(data)
            }
            Err(RusotoError::Service(GetObjectError::NoSuchKey(_))) => {
                Err(Self::transport(path, "no such key"))
            }
            Err(e) => Err(Self::transport(path, e)),
        }
    }

    async fn put(&self, path: &str, data: &[u8]) -> Result<()> {
        let req = PutObjectRequest {
            bucket: self.bucket.clone(),
            key: path.to_string(),
            content_length: Some(data.len() as i64),
            body: Some(ByteStream::from(data.to_vec())),
            ..Default::default()
        };

        self.client
            .put_object(req)
            .await
            .map_err(|e| Self::transport(path, e))?;

        Ok(())
    }

    async fn delete(&self, path: &str) -> Result<()> {
        let req = DeleteObjectRequest {
            bucket: self.bucket.clone(),
            key: path.to_string(),
            ..Default::default()
        };

        self.client
            .delete_object(req)
            .await
            .map_err(|e| Self::transport(path, e))?;

        Ok(())
    }

    async fn delete_prefix(&self, prefix: &str) -> Result<()> {
        let mut keys = vec![];

        self.walk(prefix, &mut |path| {
            keys.push(path.to_string());
            Ok(())
        })
        .await?;

        for key in keys {
            self.delete(&key).await?;
        }

        Ok(())
    }

    async fn walk(&self, prefix: &str, visit: WalkVisit<'_>) -> Result<()> {
        let mut continuation_token = None;

        loop {
            let req = ListObjectsV2Request {
                bucket: self.bucket.clone(),
                prefix: Some(prefix.to_string()),
                continuation_token: continuation_token.take(),
                ..Default::default()
            };

            let output = self
                .client
                .list_objects_v2(req)
                .await
                .map_err(|e| Self::transport(prefix, e))?;

            for object in output.contents.unwrap_or_default() {
                if let Some(key) = object.key {
                    visit(&key)?;
                }
            }

            if output.is_truncated == Some(true) && output.next_continuation_token.is_some() {
                continuation_token = output.next_continuation_token;
            } else {
                return Ok(());
            }
        }
    }
}
