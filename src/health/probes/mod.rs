//
// src/health/probes/mod.rs
//
mod backup_freshness;
mod file_freshness;
mod http;
mod http_status;
mod json_content;

pub use backup_freshness::BackupFreshnessProbe;
pub use file_freshness::FileFreshnessProbe;
pub use http_status::HttpStatusProbe;
pub use json_content::{JsonFieldProbe, JsonRecordsProbe};
