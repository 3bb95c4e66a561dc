// src/health/probes/http.rs
// Shared GET plumbing for the HTTP-backed probes.
use reqwest::{Client, StatusCode};
use std::time::Duration;
use tokio::time::timeout;
use url::Url;

use crate::config::HttpTargetConfig;
use crate::health::ProbeError;

pub(crate) struct HttpTarget {
    client: Client,
    url: Url,
    query: Vec<(String, String)>,
    timeout: Duration,
    label: Option<String>,
    timeout_note: Option<String>,
}

impl HttpTarget {
    pub(crate) fn new(config: &HttpTargetConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(config.timeout()).build()?;

        Ok(Self {
            client,
            url: config.url.clone(),
            query: config
                .query
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
            timeout: config.timeout(),
            label: config.label.clone(),
            timeout_note: config.timeout_note.clone(),
        })
    }

    pub(crate) fn url(&self) -> &Url {
        &self.url
    }

    /// One GET including the body read, bounded by the configured timeout.
    pub(crate) async fn fetch(&self) -> Result<(StatusCode, Vec<u8>), ProbeError> {
        let request = async {
            let response = self
                .client
                .get(self.url.clone())
                .query(&self.query)
                .send()
                .await?;
            let status = response.status();
            let body = response.bytes().await?;
            Ok::<_, reqwest::Error>((status, body.to_vec()))
        };

        match timeout(self.timeout, request).await {
            Ok(Ok(fetched)) => Ok(fetched),
            Ok(Err(err)) => Err(ProbeError::from_reqwest(err, self.timeout_note.as_deref())),
            Err(_) => Err(ProbeError::Timeout {
                note: self.timeout_note.clone(),
            }),
        }
    }

    /// `"<label> HTTP Response Code <code>"`, label omitted when unset.
    pub(crate) fn response_code(&self, status: StatusCode) -> String {
        match &self.label {
            Some(label) => format!("{label} HTTP Response Code {}", status.as_u16()),
            None => format!("HTTP Response Code {}", status.as_u16()),
        }
    }
}

/// Failure detail for any status other than 200; never labelled.
pub(crate) fn unexpected_status(status: StatusCode) -> String {
    format!("HTTP Response Code {}", status.as_u16())
}

#[cfg(test)]
pub(crate) mod testing {
    use std::collections::BTreeMap;
    use std::net::SocketAddr;
    use tokio::net::TcpListener;
    use url::Url;

    use crate::config::HttpTargetConfig;

    pub(crate) fn target(url: &str, label: Option<&str>, note: Option<&str>) -> HttpTargetConfig {
        HttpTargetConfig {
            url: Url::parse(url).unwrap(),
            query: BTreeMap::new(),
            timeout_secs: 1,
            label: label.map(str::to_string),
            timeout_note: note.map(str::to_string),
        }
    }

    /// An address nothing listens on.
    pub(crate) async fn closed_addr() -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        addr
    }

    /// An address that accepts connections and never answers.
    pub(crate) async fn silent_addr() -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((stream, _)) = listener.accept().await {
                held.push(stream);
            }
        });
        addr
    }
}
