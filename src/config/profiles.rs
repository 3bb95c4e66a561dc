// src/config/profiles.rs
// Built-in deployment variants. The monitor's match rules are keyed to the
// wording configured here, so labels and notes must not drift.
use std::collections::BTreeMap;
use url::Url;

use super::models::*;

const HOUR: u64 = 60 * 60;
const DAY: u64 = 24 * HOUR;

pub fn builtin_profiles() -> BTreeMap<String, ProfileConfig> {
    let mut profiles = BTreeMap::new();
    profiles.insert("dxetech".to_string(), dxetech_profile());
    profiles.insert("services".to_string(), services_profile());
    profiles
}

fn url(raw: &str) -> Url {
    Url::parse(raw).expect("built-in profile URL is valid")
}

/// Chapter map data + page, and the Airtable backups. Served on `/health`.
pub fn dxetech_profile() -> ProfileConfig {
    ProfileConfig {
        route: "/health".to_string(),
        groups: vec![
            GroupConfig {
                name: "Chapter Map".to_string(),
                checks: vec![
                    CheckConfig::FileFreshness(FileFreshnessConfig {
                        path: "/var/www/maps/chapter_data.json".into(),
                        display_name: Some("chapter_data.json".to_string()),
                        // Updated hourly.
                        window_secs: 4 * HOUR,
                    }),
                    CheckConfig::HttpStatus(HttpTargetConfig {
                        url: url("http://dxetech.org/maps/chapter_map.html"),
                        query: BTreeMap::new(),
                        timeout_secs: 1,
                        label: None,
                        timeout_note: None,
                    }),
                ],
            },
            GroupConfig {
                name: "Airtable Backup".to_string(),
                checks: vec![CheckConfig::BackupFreshness(BackupFreshnessConfig {
                    bucket: "dxe-backup".to_string(),
                    prefix: "airtable".to_string(),
                    key_pattern: "base_backup_%Y-%m-%d_%H:%M:%S.zip".to_string(),
                    // Backed up every 12 hours.
                    window_secs: 2 * DAY,
                    endpoint: default_storage_endpoint(),
                    region: "us-east-1".to_string(),
                    timeout_secs: 10,
                    access_key_env: "AIRTABLE_BACKUP_AWS_ACCESS_KEY_ID".to_string(),
                    secret_key_env: "AIRTABLE_BACKUP_AWS_SECRET_ACCESS_KEY".to_string(),
                })],
            },
        ],
    }
}

/// Map page, Facebook event API and Liberation Pledge API. Served on `/`.
pub fn services_profile() -> ProfileConfig {
    ProfileConfig {
        route: "/".to_string(),
        groups: vec![
            GroupConfig {
                name: "Chapter Map".to_string(),
                checks: vec![CheckConfig::HttpStatus(HttpTargetConfig {
                    url: url("http://chapters-map.dxetech.org/"),
                    query: BTreeMap::new(),
                    timeout_secs: 1,
                    label: Some("map".to_string()),
                    timeout_note: None,
                })],
            },
            GroupConfig {
                name: "Facebook Event Data".to_string(),
                checks: vec![CheckConfig::JsonField(JsonFieldConfig {
                    target: HttpTargetConfig {
                        url: url("http://facebook-api.dxetech.org/attending_event"),
                        query: BTreeMap::from([(
                            "event_id".to_string(),
                            "1697430973810357".to_string(),
                        )]),
                        timeout_secs: 1,
                        label: Some("fb event".to_string()),
                        timeout_note: Some("after 1 second".to_string()),
                    },
                    field: "count".to_string(),
                })],
            },
            GroupConfig {
                name: "Latest Pledgers".to_string(),
                checks: vec![CheckConfig::JsonRecords(JsonRecordsConfig {
                    target: HttpTargetConfig {
                        url: url("http://liberationpledge-api.dxetech.org/pledgers"),
                        query: BTreeMap::from([("limit".to_string(), "10".to_string())]),
                        timeout_secs: 10,
                        label: Some("pledge".to_string()),
                        // Monitor rules match this text; it predates the 10s timeout.
                        timeout_note: Some("after 4 seconds".to_string()),
                    },
                    collection: "pledgers".to_string(),
                    fields: ["Name", "Country", "City", "days_ago"]
                        .into_iter()
                        .map(String::from)
                        .collect(),
                })],
            },
        ],
    }
}
