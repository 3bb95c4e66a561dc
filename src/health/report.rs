// src/health/report.rs
use serde::Serialize;
use std::fmt;

const SUCCESS: &str = "Success: ";
const FAILURE: &str = "Failure: ";

/// One probe outcome as the monitor reads it: a sentence starting with
/// exactly `"Success: "` or `"Failure: "`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Vital(String);

impl Vital {
    pub fn success(detail: impl AsRef<str>) -> Self {
        Self(format!("{SUCCESS}{}", detail.as_ref()))
    }

    pub fn failure(detail: impl AsRef<str>) -> Self {
        Self(format!("{FAILURE}{}", detail.as_ref()))
    }

    pub fn is_success(&self) -> bool {
        self.0.starts_with(SUCCESS)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Vital {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusGroup {
    pub name: String,
    pub vitals: Vec<Vital>,
}

impl StatusGroup {
    pub fn is_healthy(&self) -> bool {
        self.vitals.iter().all(Vital::is_success)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub products: Vec<StatusGroup>,
}

impl HealthReport {
    pub fn unhealthy_groups(&self) -> usize {
        self.products.iter().filter(|g| !g.is_healthy()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefixes_are_exclusive() {
        let ok = Vital::success("HTTP Response Code 200");
        let bad = Vital::failure("Connection Error");

        assert_eq!(ok.as_str(), "Success: HTTP Response Code 200");
        assert!(ok.is_success());
        assert_eq!(bad.as_str(), "Failure: Connection Error");
        assert!(!bad.is_success());
    }

    #[test]
    fn serializes_to_the_monitor_shape() {
        let report = HealthReport {
            products: vec![StatusGroup {
                name: "Chapter Map".to_string(),
                vitals: vec![Vital::success("map HTTP Response Code 200")],
            }],
        };
        assert_eq!(
            serde_json::to_string(&report).unwrap(),
            r#"{"products":[{"name":"Chapter Map","vitals":["Success: map HTTP Response Code 200"]}]}"#
        );
    }

    #[test]
    fn group_health_requires_every_vital() {
        let group = StatusGroup {
            name: "Chapter Map".to_string(),
            vitals: vec![
                Vital::success("last updated 0:10:00 ago."),
                Vital::failure("HTTP Response Code 503"),
            ],
        };
        assert!(!group.is_healthy());

        let report = HealthReport {
            products: vec![group],
        };
        assert_eq!(report.unhealthy_groups(), 1);
    }
}
