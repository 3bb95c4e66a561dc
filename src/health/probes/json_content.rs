// src/health/probes/json_content.rs
use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::Value;

use super::http::{unexpected_status, HttpTarget};
use crate::config::{JsonFieldConfig, JsonRecordsConfig};
use crate::health::{Probe, ProbeError, Vital};

/// The API answers 200 with a top-level `field`, whose value is echoed.
pub struct JsonFieldProbe {
    name: String,
    target: HttpTarget,
    field: String,
}

impl JsonFieldProbe {
    pub fn new(config: &JsonFieldConfig) -> Result<Self, reqwest::Error> {
        let target = HttpTarget::new(&config.target)?;
        Ok(Self {
            name: format!("GET {} [{}]", target.url(), config.field),
            target,
            field: config.field.clone(),
        })
    }
}

#[async_trait]
impl Probe for JsonFieldProbe {
    fn name(&self) -> &str {
        &self.name
    }

    async fn check(&self) -> Result<Vital, ProbeError> {
        let (status, body) = self.target.fetch().await?;
        if status != StatusCode::OK {
            return Ok(Vital::failure(unexpected_status(status)));
        }

        let body: Value = serde_json::from_slice(&body)?;
        match body.get(&self.field) {
            Some(value) => Ok(Vital::success(format!(
                "{}, {} {}",
                self.target.response_code(status),
                self.field,
                render(value)
            ))),
            None => Ok(Vital::failure(format!("{} not in response", self.field))),
        }
    }
}

/// The API answers 200 with a `collection` whose first record carries
/// every one of `fields`.
pub struct JsonRecordsProbe {
    name: String,
    target: HttpTarget,
    collection: String,
    fields: Vec<String>,
}

impl JsonRecordsProbe {
    pub fn new(config: &JsonRecordsConfig) -> Result<Self, reqwest::Error> {
        let target = HttpTarget::new(&config.target)?;
        Ok(Self {
            name: format!("GET {} [{}]", target.url(), config.collection),
            target,
            collection: config.collection.clone(),
            fields: config.fields.clone(),
        })
    }

    fn missing_fields(&self) -> Vital {
        Vital::failure(format!(
            "one of [{}] fields not in {} response",
            self.fields.join(", "),
            self.collection
        ))
    }
}

#[async_trait]
impl Probe for JsonRecordsProbe {
    fn name(&self) -> &str {
        &self.name
    }

    async fn check(&self) -> Result<Vital, ProbeError> {
        let (status, body) = self.target.fetch().await?;
        if status != StatusCode::OK {
            return Ok(Vital::failure(unexpected_status(status)));
        }

        let body: Value = serde_json::from_slice(&body)?;
        let Some(records) = body.get(&self.collection).and_then(Value::as_array) else {
            return Ok(self.missing_fields());
        };
        // Only the first record is inspected.
        let first = records.first().ok_or_else(|| ProbeError::EmptyCollection {
            collection: self.collection.clone(),
        })?;

        if self.fields.iter().all(|field| first.get(field).is_some()) {
            Ok(Vital::success(format!(
                "{}, important fields found",
                self.target.response_code(status)
            )))
        } else {
            Ok(self.missing_fields())
        }
    }
}

/// Scalars spelled the way the monitor has always seen them: bare strings,
/// `None`, `True`, `False`.
fn render(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "None".to_string(),
        Value::Bool(true) => "True".to_string(),
        Value::Bool(false) => "False".to_string(),
        other => other.to_string(),
    }
}
