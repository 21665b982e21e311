//! S3 bucket backend.

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::config::Region;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::types::Object;
use chrono::{DateTime, Utc};

use super::{Backend, BackendKind, ObjectStream, RawEntry};
use crate::config::StorageConfig;
use crate::{FiledropError, Result};

/// Serves the objects of one bucket.
///
/// Creating an S3 client is relatively expensive, so one client is built at
/// startup and shared by every request.
#[derive(Debug, Clone)]
pub struct S3Backend {
    client: aws_sdk_s3::Client,
    bucket: String,
}

impl S3Backend {
    /// Build a client from the default AWS credential chain and the
    /// configured region and optional endpoint.
    pub async fn connect(config: &StorageConfig) -> Result<Self> {
        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()));
        if !config.endpoint_url.is_empty() {
            loader = loader.endpoint_url(&config.endpoint_url);
        }
        let sdk_config = loader.load().await;

        // S3-compatible stores rarely support virtual-hosted buckets.
        let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
            .force_path_style(!config.endpoint_url.is_empty())
            .build();

        tracing::info!(
            bucket = %config.bucket,
            region = %config.region,
            "S3 client initialized"
        );

        Ok(Self::from_client(
            aws_sdk_s3::Client::from_conf(s3_config),
            &config.bucket,
        ))
    }

    /// Wrap an existing client.
    pub fn from_client(client: aws_sdk_s3::Client, bucket: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
        }
    }

    /// Bucket served by this backend.
    pub fn bucket(&self) -> &str {
        &self.bucket
    }
}

fn to_chrono(dt: &aws_sdk_s3::primitives::DateTime) -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp(dt.secs(), dt.subsec_nanos()).unwrap_or_default()
}

/// Convert a listed object, skipping keyless objects and directory markers.
fn raw_entry(object: &Object) -> Option<RawEntry> {
    let key = object.key.as_deref()?;
    if key.ends_with('/') {
        return None;
    }

    Some(RawEntry::new(
        key,
        object.size.unwrap_or(0).max(0) as u64,
        object
            .last_modified
            .as_ref()
            .map(to_chrono)
            .unwrap_or_default(),
    ))
}

#[async_trait]
impl Backend for S3Backend {
    fn kind(&self) -> BackendKind {
        BackendKind::S3
    }

    async fn list(&self) -> Result<Vec<RawEntry>> {
        let mut results = Vec::new();
        let mut continuation_token: Option<String> = None;
        let mut start_after: Option<String> = None;

        loop {
            let response = self
                .client
                .list_objects_v2()
                .bucket(&self.bucket)
                .set_continuation_token(continuation_token.take())
                .set_start_after(start_after.take())
                .send()
                .await
                .map_err(|e| {
                    FiledropError::Backend(format!(
                        "error listing S3 objects in {}: {}",
                        self.bucket,
                        DisplayErrorContext(&e)
                    ))
                })?;

            if let Some(contents) = &response.contents {
                results.extend(contents.iter().filter_map(raw_entry));
            }

            if response.is_truncated != Some(true) {
                break;
            }

            // Some S3-compatible stores truncate without a token. Resume
            // after the last key instead of starting over.
            match response.next_continuation_token {
                Some(token) => continuation_token = Some(token),
                None => {
                    let last_key = response
                        .contents
                        .as_deref()
                        .and_then(|contents| contents.last())
                        .and_then(|object| object.key.clone());
                    match last_key {
                        Some(key) => start_after = Some(key),
                        None => {
                            return Err(FiledropError::Backend(format!(
                                "listing of {} was truncated without a continuation point",
                                self.bucket
                            )));
                        }
                    }
                }
            }
        }

        tracing::debug!(
            "Listed {} objects in bucket: s3://{}",
            results.len(),
            self.bucket
        );

        Ok(results)
    }

    async fn open(&self, name: &str) -> Result<ObjectStream> {
        let output = match self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(name)
            .send()
            .await
        {
            Ok(output) => output,
            Err(e) => {
                let missing = e
                    .as_service_error()
                    .map(|se| se.is_no_such_key())
                    .unwrap_or(false)
                    || e.raw_response()
                        .map(|r| r.status().as_u16() == 404)
                        .unwrap_or(false);
                return Err(if missing {
                    FiledropError::NotFound(format!("File: {name}"))
                } else {
                    FiledropError::Backend(format!(
                        "failed to fetch s3://{}/{}: {}",
                        self.bucket,
                        name,
                        DisplayErrorContext(&e)
                    ))
                });
            }
        };

        let mut stream = ObjectStream::new(Box::pin(output.body.into_async_read()));
        stream.content_type = output.content_type;
        stream.content_length = output
            .content_length
            .and_then(|len| u64::try_from(len).ok());

        Ok(stream)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_sdk_s3::config::retry::RetryConfig;
    use aws_sdk_s3::config::Credentials;
    use aws_sdk_s3::primitives::{DateTime as SmithyDateTime, SdkBody};
    use aws_smithy_http_client::test_util::{ReplayEvent, StaticReplayClient};
    use axum::http;
    use chrono::TimeZone;
    use tokio::io::AsyncReadExt;

    const NO_SUCH_KEY: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<Error><Code>NoSuchKey</Code><Message>The specified key does not exist.</Message><Key>missing.txt</Key><RequestId>4442587FB7D0A2F9</RequestId></Error>"#;

    const INTERNAL_ERROR: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<Error><Code>InternalError</Code><Message>We encountered an internal error. Please try again.</Message><RequestId>4442587FB7D0A2FA</RequestId></Error>"#;

    const ACCESS_DENIED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<Error><Code>AccessDenied</Code><Message>Access Denied</Message><RequestId>4442587FB7D0A2FB</RequestId></Error>"#;

    /// Backend over a client that answers with `events` in order.
    fn replay_backend(events: Vec<ReplayEvent>) -> (S3Backend, StaticReplayClient) {
        let http_client = StaticReplayClient::new(events);
        let config = aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new("us-east-1"))
            .credentials_provider(Credentials::new("AKIDTEST", "secret", None, None, "test"))
            .retry_config(RetryConfig::disabled())
            .http_client(http_client.clone())
            .build();
        let backend = S3Backend::from_client(aws_sdk_s3::Client::from_conf(config), "files");
        (backend, http_client)
    }

    fn reply(status: u16, headers: &[(&str, &str)], body: &str) -> ReplayEvent {
        let mut response = http::Response::builder().status(status);
        for (name, value) in headers {
            response = response.header(*name, *value);
        }
        ReplayEvent::new(
            http::Request::builder()
                .uri("https://files.s3.us-east-1.amazonaws.com/")
                .body(SdkBody::empty())
                .unwrap(),
            response.body(SdkBody::from(body.to_string())).unwrap(),
        )
    }

    fn list_page(keys: &[&str], next_token: Option<&str>, truncated: bool) -> ReplayEvent {
        let contents: String = keys
            .iter()
            .map(|key| {
                format!(
                    "<Contents><Key>{key}</Key><LastModified>2006-01-02T15:04:05.000Z</LastModified>\
                     <ETag>&quot;abc&quot;</ETag><Size>10</Size><StorageClass>STANDARD</StorageClass></Contents>"
                )
            })
            .collect();
        let token = next_token
            .map(|t| format!("<NextContinuationToken>{t}</NextContinuationToken>"))
            .unwrap_or_default();
        let body = format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<ListBucketResult xmlns="http://s3.amazonaws.com/doc/2006-03-01/"><Name>files</Name><Prefix></Prefix><KeyCount>{}</KeyCount><MaxKeys>1000</MaxKeys><IsTruncated>{truncated}</IsTruncated>{token}{contents}</ListBucketResult>"#,
            keys.len()
        );
        reply(200, &[("content-type", "application/xml")], &body)
    }

    fn request_uris(http_client: &StaticReplayClient) -> Vec<String> {
        http_client
            .actual_requests()
            .map(|r| r.uri().to_string())
            .collect()
    }

    #[tokio::test]
    async fn test_list_follows_continuation_tokens() {
        let (backend, http_client) = replay_backend(vec![
            list_page(&["b.txt", "a.txt"], Some("page-2"), true),
            list_page(&["photos/", "c.txt"], None, false),
        ]);

        let names: Vec<String> = backend
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.name)
            .collect();

        assert_eq!(names, vec!["b.txt", "a.txt", "c.txt"]);
        let uris = request_uris(&http_client);
        assert_eq!(uris.len(), 2);
        assert!(!uris[0].contains("continuation-token"));
        assert!(uris[1].contains("continuation-token=page-2"));
    }

    #[tokio::test]
    async fn test_list_truncated_without_token_resumes_after_last_key() {
        let (backend, http_client) = replay_backend(vec![
            list_page(&["a.txt", "b.txt"], None, true),
            list_page(&["c.txt"], None, false),
        ]);

        let names: Vec<String> = backend
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.name)
            .collect();

        assert_eq!(names, vec!["a.txt", "b.txt", "c.txt"]);
        let uris = request_uris(&http_client);
        assert_eq!(uris.len(), 2);
        assert!(uris[1].contains("start-after=b.txt"));
        assert!(!uris[1].contains("continuation-token"));
    }

    #[tokio::test]
    async fn test_list_truncated_empty_page_is_an_error() {
        let (backend, http_client) = replay_backend(vec![list_page(&[], None, true)]);

        let result = backend.list().await;

        assert!(matches!(result, Err(FiledropError::Backend(_))));
        assert_eq!(request_uris(&http_client).len(), 1);
    }

    #[tokio::test]
    async fn test_list_service_error() {
        let (backend, _) = replay_backend(vec![reply(403, &[], ACCESS_DENIED)]);

        let result = backend.list().await;

        match result {
            Err(FiledropError::Backend(message)) => assert!(message.contains("files")),
            other => panic!("expected backend error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_open_streams_object() {
        let (backend, _) = replay_backend(vec![reply(
            200,
            &[("content-type", "text/plain"), ("content-length", "11")],
            "hello world",
        )]);

        let mut stream = backend.open("docs/hello.txt").await.unwrap();
        assert_eq!(stream.content_type.as_deref(), Some("text/plain"));
        assert_eq!(stream.content_length, Some(11));

        let mut content = String::new();
        stream.reader.read_to_string(&mut content).await.unwrap();
        assert_eq!(content, "hello world");
    }

    #[tokio::test]
    async fn test_open_no_such_key_is_not_found() {
        let (backend, _) = replay_backend(vec![reply(404, &[], NO_SUCH_KEY)]);

        let result = backend.open("missing.txt").await;

        assert!(matches!(result, Err(FiledropError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_open_bare_404_is_not_found() {
        let (backend, _) = replay_backend(vec![reply(404, &[], "")]);

        let result = backend.open("missing.txt").await;

        assert!(matches!(result, Err(FiledropError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_open_server_error_is_backend_error() {
        let (backend, _) = replay_backend(vec![reply(500, &[], INTERNAL_ERROR)]);

        let result = backend.open("report.txt").await;

        match result {
            Err(FiledropError::Backend(message)) => {
                assert!(message.contains("s3://files/report.txt"));
            }
            other => panic!("expected backend error, got {other:?}"),
        }
    }

    #[test]
    fn test_raw_entry_from_object() {
        let object = Object::builder()
            .key("report.txt")
            .size(2048)
            .last_modified(SmithyDateTime::from_secs(1_136_214_245))
            .build();

        let entry = raw_entry(&object).unwrap();
        assert_eq!(entry.name, "report.txt");
        assert_eq!(entry.size, 2048);
        assert_eq!(
            entry.modified,
            Utc.with_ymd_and_hms(2006, 1, 2, 15, 4, 5).unwrap()
        );
    }

    #[test]
    fn test_raw_entry_skips_directory_marker() {
        let object = Object::builder().key("photos/").size(0).build();
        assert!(raw_entry(&object).is_none());
    }

    #[test]
    fn test_raw_entry_skips_keyless_object() {
        let object = Object::builder().size(10).build();
        assert!(raw_entry(&object).is_none());
    }

    #[test]
    fn test_raw_entry_defaults_missing_metadata() {
        let object = Object::builder().key("nested/data.bin").build();

        let entry = raw_entry(&object).unwrap();
        assert_eq!(entry.name, "nested/data.bin");
        assert_eq!(entry.size, 0);
        assert_eq!(entry.modified.timestamp(), 0);
    }

    #[test]
    fn test_to_chrono_keeps_subseconds() {
        let dt = SmithyDateTime::from_secs_and_nanos(1_700_000_000, 250_000_000);
        let converted = to_chrono(&dt);
        assert_eq!(converted.timestamp(), 1_700_000_000);
        assert_eq!(converted.timestamp_subsec_millis(), 250);
    }
}
