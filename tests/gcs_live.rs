//! Live checks against a real project / 真实项目集成测试
//!
//! Needs `GOOGLE_APPLICATION_CREDENTIALS` (and optionally `GOOGLE_CLOUD_PROJECT`
//! or `STORAGE_EMULATOR_HOST`). Run with `cargo test -- --ignored`.

use gcs_storage_client::StorageClient;

fn unique_bucket() -> String {
    format!("gcs-client-it-{}", uuid::Uuid::new_v4().simple())
}

#[tokio::test]
#[ignore]
async fn test_full_lifecycle() -> anyhow::Result<()> {
    let client = StorageClient::from_env()?;
    let bucket = unique_bucket();

    assert!(client.create_bucket(&bucket).await);
    assert!(client.list_buckets().await.contains(&bucket));
    assert!(client.bucket_exists(&bucket).await);

    let dir = tempfile::tempdir()?;
    let source = dir.path().join("hello.txt");
    std::fs::write(&source, b"hello from the integration test\n")?;

    assert!(client.upload_file(&bucket, &source, "docs/hello.txt").await);
    assert_eq!(client.list_files(&bucket, "docs/").await, vec!["docs/hello.txt"]);

    let out = dir.path().join("downloaded.txt");
    assert!(client.download_file(&bucket, "docs/hello.txt", &out).await);
    assert_eq!(std::fs::read(&out)?, std::fs::read(&source)?);

    let metadata = client
        .get_file_metadata(&bucket, "docs/hello.txt")
        .await
        .ok_or_else(|| anyhow::anyhow!("metadata missing"))?;
    assert_eq!(metadata.size, std::fs::metadata(&source)?.len());
    assert_eq!(metadata.content_type.as_deref(), Some("text/plain"));

    assert!(!client.delete_bucket(&bucket).await);
    assert!(client.delete_file(&bucket, "docs/hello.txt").await);
    assert!(client.delete_bucket(&bucket).await);
    assert!(!client.bucket_exists(&bucket).await);
    Ok(())
}

#[tokio::test]
#[ignore]
async fn test_missing_bucket_is_contained() -> anyhow::Result<()> {
    let client = StorageClient::from_env()?;
    let bucket = unique_bucket();

    assert!(!client.bucket_exists(&bucket).await);
    assert!(client.list_files(&bucket, "").await.is_empty());
    assert!(client.get_file_metadata(&bucket, "nothing").await.is_none());
    assert!(!client.delete_bucket(&bucket).await);
    Ok(())
}
