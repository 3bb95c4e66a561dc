// src/health/probes/http_status.rs
use async_trait::async_trait;
use reqwest::StatusCode;

use super::http::{unexpected_status, HttpTarget};
use crate::config::HttpTargetConfig;
use crate::health::{Probe, ProbeError, Vital};

/// Reachability: the page answers 200.
pub struct HttpStatusProbe {
    name: String,
    target: HttpTarget,
}

impl HttpStatusProbe {
    pub fn new(config: &HttpTargetConfig) -> Result<Self, reqwest::Error> {
        let target = HttpTarget::new(config)?;
        Ok(Self {
            name: format!("GET {}", target.url()),
            target,
        })
    }
}

#[async_trait]
impl Probe for HttpStatusProbe {
    fn name(&self) -> &str {
        &self.name
    }

    async fn check(&self) -> Result<Vital, ProbeError> {
        let (status, _) = self.target.fetch().await?;

        if status == StatusCode::OK {
            Ok(Vital::success(self.target.response_code(status)))
        } else {
            Ok(Vital::failure(unexpected_status(status)))
        }
    }
}
