use aws_config::BehaviorVersion;
use aws_sdk_s3::{error::DisplayErrorContext, primitives::ByteStream, Client};
use std::fs;
use std::path::{Path, PathBuf};
use tokio::runtime::{Builder, Runtime};

use crate::error::{Error, Result};

/// Destination for the finished CSV. Credentials and endpoints are the
/// store's own business.
pub trait ObjectStore {
    /// Uploads the file at `path` as `bucket/key`, blocking until done.
    fn upload_file(&self, path: &Path, bucket: &str, key: &str) -> Result<()>;
}

/// S3 upload through the AWS SDK, driven on a private current-thread runtime
/// so the rest of the pipeline stays blocking.
pub struct S3ObjectStore {
    runtime: Runtime,
    client: Client,
}

impl S3ObjectStore {
    /// Resolves region and credentials from the default provider chain.
    pub fn from_env() -> Result<Self> {
        let runtime = Builder::new_current_thread().enable_all().build()?;
        let client = runtime.block_on(make_s3_client());
        Ok(Self { runtime, client })
    }
}

impl ObjectStore for S3ObjectStore {
    fn upload_file(&self, path: &Path, bucket: &str, key: &str) -> Result<()> {
        self.runtime
            .block_on(upload_s3_file(&self.client, key, bucket, path))
    }
}

pub async fn make_s3_client() -> Client {
    let config = aws_config::load_defaults(BehaviorVersion::latest()).await;
    Client::new(&config)
}

/// Streams the file from disk as the request body.
pub async fn upload_s3_file(client: &Client, key: &str, bucket: &str, path: &Path) -> Result<()> {
    let body = ByteStream::from_path(path)
        .await
        .map_err(|e| Error::Upload(format!("{}: {e}", path.display())))?;

    client
        .put_object()
        .bucket(bucket)
        .key(key)
        .body(body)
        .send()
        .await
        .map_err(|e| Error::Upload(DisplayErrorContext(&e).to_string()))?;

    Ok(())
}

/// Copies uploads to `<root>/<bucket>/<key>` on the local filesystem.
#[derive(Debug, Clone)]
pub struct DirectoryStore {
    root: PathBuf,
}

impl DirectoryStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn object_path(&self, bucket: &str, key: &str) -> PathBuf {
        self.root.join(bucket).join(key)
    }
}

impl ObjectStore for DirectoryStore {
    fn upload_file(&self, path: &Path, bucket: &str, key: &str) -> Result<()> {
        let target = self.object_path(bucket, key);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(path, &target).map_err(|e| Error::Upload(format!("{}: {e}", target.display())))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directory_store_copies_under_bucket_and_key() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("steeleye.csv");
        fs::write(&source, "a,b\n1,2\n").unwrap();

        let store = DirectoryStore::new(dir.path().join("store"));
        store.upload_file(&source, "mybucket", "exports/steeleye.csv").unwrap();

        let uploaded = store.object_path("mybucket", "exports/steeleye.csv");
        assert_eq!(fs::read_to_string(uploaded).unwrap(), "a,b\n1,2\n");
    }

    fn offline_client() -> Client {
        let config = aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(aws_sdk_s3::config::Region::new("eu-west-1"))
            .build();
        Client::from_conf(config)
    }

    #[test]
    fn test_s3_upload_fails_before_sending_when_file_missing() {
        let dir = tempfile::tempdir().unwrap();
        let runtime = Builder::new_current_thread().enable_all().build().unwrap();
        let missing = dir.path().join("steeleye.csv");

        let err = runtime
            .block_on(upload_s3_file(&offline_client(), "steeleye.csv", "mybucket", &missing))
            .unwrap_err();
        match err {
            Error::Upload(message) => assert!(message.contains("steeleye.csv")),
            other => panic!("expected upload error, got {other:?}"),
        }
    }

    #[test]
    fn test_directory_store_missing_source_is_upload_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = DirectoryStore::new(dir.path());

        let err = store
            .upload_file(&dir.path().join("missing.csv"), "mybucket", "steeleye.csv")
            .unwrap_err();
        assert!(matches!(err, Error::Upload(_)));
    }
}
