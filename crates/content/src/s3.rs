//! S3-compatible content store.
//!
//! Talks to S3 (or MinIO, R2, ...) over plain HTTPS with `reqwest`:
//! - `ListObjectsV2` for prefix listings, one page per call
//! - `GetObject` for object bytes
//!
//! Requests are signed with AWS Signature V4. The HTTP client and the
//! credentials are created once and shared by every request.

use async_trait::async_trait;
use regex_lite::Regex;
use std::sync::LazyLock;
use std::time::Duration;
use tracing::{debug, trace};
use wellnest_core::content::{ContentStore, ObjectPage};
use wellnest_core::error::ContentError;

use crate::sigv4::{self, Credentials};

static KEY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<Key>([^<]*)</Key>").expect("valid regex"));
static TRUNCATED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<IsTruncated>\s*true\s*</IsTruncated>").expect("valid regex"));
static TOKEN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<NextContinuationToken>([^<]*)</NextContinuationToken>").expect("valid regex")
});
static CODE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<Code>([^<]*)</Code>").expect("valid regex"));
static MESSAGE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<Message>([^<]*)</Message>").expect("valid regex"));

/// Settings for [`S3ContentStore`].
#[derive(Debug, Clone)]
pub struct S3Settings {
    pub bucket: String,
    pub region: String,
    /// Custom endpoint (path-style addressing). `None` = AWS virtual-host.
    pub endpoint: Option<String>,
    pub credentials: Credentials,
    pub timeout: Duration,
}

/// An S3-compatible content store.
pub struct S3ContentStore {
    client: reqwest::Client,
    /// Scheme + authority, e.g. `https://bucket.s3.us-east-1.amazonaws.com`.
    origin: String,
    /// `host[:port]` as signed.
    host: String,
    /// Path prefix before the object key: `""` (virtual-host) or `/bucket`.
    bucket_path: String,
    region: String,
    credentials: Credentials,
    timeout: Duration,
}

impl S3ContentStore {
    pub fn new(settings: S3Settings) -> Result<Self, ContentError> {
        let (base, bucket_path) = match &settings.endpoint {
            Some(endpoint) => (
                endpoint.trim_end_matches('/').to_string(),
                format!("/{}", settings.bucket),
            ),
            None => (
                format!(
                    "https://{}.s3.{}.amazonaws.com",
                    settings.bucket, settings.region
                ),
                String::new(),
            ),
        };

        let url = reqwest::Url::parse(&base)
            .map_err(|e| ContentError::NotConfigured(format!("Invalid S3 endpoint '{base}': {e}")))?;
        let host = match (url.host_str(), url.port()) {
            (Some(h), Some(p)) => format!("{h}:{p}"),
            (Some(h), None) => h.to_string(),
            (None, _) => {
                return Err(ContentError::NotConfigured(format!(
                    "S3 endpoint has no host: {base}"
                )));
            }
        };
        let origin = format!("{}://{host}", url.scheme());

        let client = reqwest::Client::builder()
            .timeout(settings.timeout)
            .build()
            .map_err(|e| ContentError::NotConfigured(format!("HTTP client: {e}")))?;

        Ok(Self {
            client,
            origin,
            host,
            bucket_path,
            region: settings.region,
            credentials: settings.credentials,
            timeout: settings.timeout,
        })
    }

    /// Issue a signed GET and return the response if it succeeded.
    async fn signed_get(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<reqwest::Response, ContentError> {
        let canonical_uri = sigv4::encode_path(path);
        let query_string = sigv4::canonical_query(query);
        let signed = sigv4::sign_get(
            &self.credentials,
            &self.region,
            &self.host,
            &canonical_uri,
            query,
            chrono::Utc::now(),
        );

        let url = if query_string.is_empty() {
            format!("{}{canonical_uri}", self.origin)
        } else {
            format!("{}{canonical_uri}?{query_string}", self.origin)
        };
        trace!(url = %url, "S3 request");

        let response = self
            .client
            .get(&url)
            .header("authorization", signed.authorization)
            .header("x-amz-date", signed.amz_date)
            .header("x-amz-content-sha256", signed.content_sha256)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ContentError::Timeout {
                        operation: format!("GET {path}"),
                        timeout_secs: self.timeout.as_secs(),
                    }
                } else {
                    ContentError::Unavailable(format!("S3 request failed: {e}"))
                }
            })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let (code, message) = parse_error(&body);
        if status == reqwest::StatusCode::NOT_FOUND && code.as_deref() == Some("NoSuchKey") {
            return Err(ContentError::NotFound(path.to_string()));
        }
        Err(ContentError::RequestFailed {
            status_code: status.as_u16(),
            message: match (code, message) {
                (Some(c), Some(m)) => format!("{c}: {m}"),
                (Some(c), None) => c,
                (None, Some(m)) => m,
                (None, None) => status.to_string(),
            },
        })
    }
}

#[async_trait]
impl ContentStore for S3ContentStore {
    fn name(&self) -> &str {
        "s3"
    }

    async fn list(
        &self,
        prefix: &str,
        continuation: Option<&str>,
    ) -> Result<ObjectPage, ContentError> {
        let mut query = vec![("list-type", "2"), ("prefix", prefix)];
        if let Some(token) = continuation {
            query.push(("continuation-token", token));
        }

        let path = format!("{}/", self.bucket_path);
        let body = self
            .signed_get(&path, &query)
            .await?
            .text()
            .await
            .map_err(|e| ContentError::InvalidResponse(format!("ListObjectsV2 body: {e}")))?;

        let page = parse_list_response(&body)?;
        debug!(prefix, keys = page.keys.len(), more = page.next_token.is_some(), "S3 listing page");
        Ok(page)
    }

    async fn fetch(&self, key: &str) -> Result<Vec<u8>, ContentError> {
        let path = format!("{}/{key}", self.bucket_path);
        let bytes = self
            .signed_get(&path, &[])
            .await?
            .bytes()
            .await
            .map_err(|e| ContentError::Unavailable(format!("GetObject body for {key}: {e}")))?;
        Ok(bytes.to_vec())
    }
}

/// Parse a `ListObjectsV2` XML body.
fn parse_list_response(body: &str) -> Result<ObjectPage, ContentError> {
    if !body.contains("<ListBucketResult") {
        return Err(ContentError::InvalidResponse(
            "ListObjectsV2 response has no ListBucketResult".into(),
        ));
    }

    let keys = KEY_RE
        .captures_iter(body)
        .map(|c| xml_unescape(&c[1]))
        .collect();

    let next_token = if TRUNCATED_RE.is_match(body) {
        let token = TOKEN_RE.captures(body).map(|c| xml_unescape(&c[1]));
        if token.is_none() {
            return Err(ContentError::InvalidResponse(
                "Truncated listing without NextContinuationToken".into(),
            ));
        }
        token
    } else {
        None
    };

    Ok(ObjectPage { keys, next_token })
}

/// Extract `<Code>` and `<Message>` from an S3 error body.
fn parse_error(body: &str) -> (Option<String>, Option<String>) {
    (
        CODE_RE.captures(body).map(|c| xml_unescape(&c[1])),
        MESSAGE_RE.captures(body).map(|c| xml_unescape(&c[1])),
    )
}

/// Decode the XML entities S3 emits in text nodes.
fn xml_unescape(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find('&') {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];
        let Some(end) = tail.find(';') else {
            out.push_str(tail);
            return out;
        };
        let entity = &tail[1..end];
        let decoded = match entity {
            "amp" => Some('&'),
            "lt" => Some('<'),
            "gt" => Some('>'),
            "quot" => Some('"'),
            "apos" => Some('\''),
            _ => entity
                .strip_prefix("#x")
                .and_then(|h| u32::from_str_radix(h, 16).ok())
                .or_else(|| entity.strip_prefix('#').and_then(|d| d.parse().ok()))
                .and_then(char::from_u32),
        };
        match decoded {
            Some(c) => out.push(c),
            None => out.push_str(&tail[..=end]),
        }
        rest = &tail[end + 1..];
    }
    out.push_str(rest);
    out
}
