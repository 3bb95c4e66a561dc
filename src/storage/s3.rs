// src/storage/s3.rs
use async_trait::async_trait;
use chrono::Utc;
use regex::Regex;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;
use url::Url;

use super::signing::{canonical_query, signed_headers};
use super::{Credentials, ObjectLister, StorageError};

/// Minimal S3 client: signed, path-style ListObjectsV2.
pub struct S3Client {
    client: Client,
    endpoint: Url,
    region: String,
    credentials: Credentials,
    parser: ListingParser,
}

#[derive(Debug, Default, PartialEq)]
struct ListPage {
    keys: Vec<String>,
    next_token: Option<String>,
}

struct ListingParser {
    key: Regex,
    truncated: Regex,
    next_token: Regex,
    error_code: Regex,
    reference: Regex,
}

impl ListingParser {
    fn new() -> Result<Self, StorageError> {
        Ok(Self {
            key: Regex::new(r"<Key>([^<]*)</Key>")?,
            truncated: Regex::new(r"<IsTruncated>\s*true\s*</IsTruncated>")?,
            next_token: Regex::new(r"<NextContinuationToken>([^<]*)</NextContinuationToken>")?,
            error_code: Regex::new(r"<Code>([^<]*)</Code>")?,
            reference: Regex::new(r"&(lt|gt|quot|apos|amp|#x[0-9a-fA-F]+|#[0-9]+);")?,
        })
    }

    fn page(&self, body: &str) -> ListPage {
        let keys = self
            .key
            .captures_iter(body)
            .map(|caps| self.unescape(&caps[1]))
            .collect();
        let next_token = if self.truncated.is_match(body) {
            self.next_token
                .captures(body)
                .map(|caps| self.unescape(&caps[1]))
        } else {
            None
        };
        ListPage { keys, next_token }
    }

    /// Single pass over entity and character references, so decoded text is
    /// never decoded again. Unrepresentable references are left as written.
    fn unescape(&self, raw: &str) -> String {
        self.reference
            .replace_all(raw, |caps: &regex::Captures| {
                let decoded = match &caps[1] {
                    "lt" => Some('<'),
                    "gt" => Some('>'),
                    "quot" => Some('"'),
                    "apos" => Some('\''),
                    "amp" => Some('&'),
                    numeric => {
                        let digits = &numeric[1..];
                        let code = match digits.strip_prefix('x') {
                            Some(hex) => u32::from_str_radix(hex, 16).ok(),
                            None => digits.parse::<u32>().ok(),
                        };
                        code.and_then(char::from_u32)
                    }
                };
                decoded.map_or_else(|| caps[0].to_string(), String::from)
            })
            .into_owned()
    }

    fn error_code(&self, body: &str) -> String {
        self.error_code
            .captures(body)
            .map(|caps| caps[1].to_string())
            .unwrap_or_else(|| "unknown".to_string())
    }
}

impl S3Client {
    pub fn new(
        endpoint: Url,
        region: impl Into<String>,
        credentials: Credentials,
        timeout: Duration,
    ) -> Result<Self, StorageError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            endpoint,
            region: region.into(),
            credentials,
            parser: ListingParser::new()?,
        })
    }

    async fn list_page(
        &self,
        bucket: &str,
        prefix: &str,
        delimiter: Option<&str>,
        token: Option<&str>,
    ) -> Result<ListPage, StorageError> {
        let mut params = vec![("list-type", "2"), ("prefix", prefix)];
        if let Some(delimiter) = delimiter {
            params.push(("delimiter", delimiter));
        }
        if let Some(token) = token {
            params.push(("continuation-token", token));
        }
        let query = canonical_query(&params);
        let bucket_path = bucket
            .split('/')
            .map(|segment| urlencoding::encode(segment).into_owned())
            .collect::<Vec<_>>()
            .join("/");
        let path = format!(
            "{}/{}",
            self.endpoint.path().trim_end_matches('/'),
            bucket_path
        );

        let mut url = self.endpoint.clone();
        url.set_path(&path);
        url.set_query(Some(&query));

        let host = match (url.host_str(), url.port()) {
            (Some(host), Some(port)) => format!("{host}:{port}"),
            (Some(host), None) => host.to_string(),
            (None, _) => String::new(),
        };
        let headers = signed_headers(
            "GET",
            &host,
            &path,
            &query,
            &self.credentials,
            &self.region,
            Utc::now(),
        )?;

        let mut request = self.client.get(url);
        for (name, value) in headers {
            request = request.header(name, value);
        }

        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(StorageError::Status {
                status: status.as_u16(),
                code: self.parser.error_code(&body),
            });
        }

        Ok(self.parser.page(&body))
    }
}

#[async_trait]
impl ObjectLister for S3Client {
    async fn list_keys(
        &self,
        bucket: &str,
        prefix: &str,
        delimiter: Option<&str>,
    ) -> Result<Vec<String>, StorageError> {
        let mut keys = Vec::new();
        let mut token: Option<String> = None;

        loop {
            let page = self
                .list_page(bucket, prefix, delimiter, token.as_deref())
                .await?;
            debug!(bucket, prefix, count = page.keys.len(), "listed object page");
            keys.extend(page.keys);

            match page.next_token {
                Some(next) => token = Some(next),
                None => break,
            }
        }

        Ok(keys)
    }
}
