// tests/health_endpoint_tests.rs
use mockito::{Matcher, Server, ServerGuard};
use chrono::{Duration, Local};
use serde_json::Value;
use std::fs::File;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration as StdDuration, SystemTime};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use url::Url;

use vitals_aggregator::config::{
    dxetech_profile, services_profile, CheckConfig, Config, ProfileConfig,
};
use vitals_aggregator::health::Aggregator;
use vitals_aggregator::server::{RequestHandler, ServerBuilder};

/// Point every check of the services profile at the mock server, keeping
/// paths, queries and wording as shipped.
fn services_against(server: &ServerGuard) -> ProfileConfig {
    let base = Url::parse(&server.url()).unwrap();
    let mut profile = services_profile();
    for group in &mut profile.groups {
        for check in &mut group.checks {
            let url = match check {
                CheckConfig::HttpStatus(c) => &mut c.url,
                CheckConfig::JsonField(c) => &mut c.target.url,
                CheckConfig::JsonRecords(c) => &mut c.target.url,
                other => panic!("unexpected check {other:?}"),
            };
            let path = url.path().to_string();
            *url = base.join(&path).unwrap();
        }
    }
    profile
}

/// The dxetech profile with its data file at `data`, its page on the mock
/// server and its backup listing on the same server, signed with credentials
/// read from `env_prefix`-named variables.
fn dxetech_against(server: &ServerGuard, data: &Path, env_prefix: &str) -> ProfileConfig {
    let base = Url::parse(&server.url()).unwrap();
    let mut profile = dxetech_profile();
    for group in &mut profile.groups {
        for check in &mut group.checks {
            match check {
                CheckConfig::FileFreshness(c) => c.path = data.to_path_buf(),
                CheckConfig::HttpStatus(c) => {
                    let path = c.url.path().to_string();
                    c.url = base.join(&path).unwrap();
                }
                CheckConfig::BackupFreshness(c) => {
                    c.endpoint = base.clone();
                    c.access_key_env = format!("{env_prefix}_ACCESS_KEY_ID");
                    c.secret_key_env = format!("{env_prefix}_SECRET_ACCESS_KEY");
                    std::env::set_var(&c.access_key_env, "AKIDEXAMPLE");
                    std::env::set_var(&c.secret_key_env, "secret");
                }
                other => panic!("unexpected check {other:?}"),
            }
        }
    }
    profile
}

fn backup_listing(keys: &[String]) -> String {
    let contents: String = keys
        .iter()
        .map(|key| format!("<Contents><Key>{key}</Key></Contents>"))
        .collect();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<ListBucketResult><Name>dxe-backup</Name><Prefix>airtable/</Prefix><IsTruncated>false</IsTruncated>{contents}</ListBucketResult>"#
    )
}

async fn mock_healthy_services(server: &mut ServerGuard) {
    server
        .mock("GET", "/")
        .with_status(200)
        .with_body("<html>map</html>")
        .create_async()
        .await;
    server
        .mock("GET", "/attending_event")
        .match_query(Matcher::UrlEncoded(
            "event_id".into(),
            "1697430973810357".into(),
        ))
        .with_status(200)
        .with_body(r#"{"count": 17}"#)
        .create_async()
        .await;
    server
        .mock("GET", "/pledgers")
        .match_query(Matcher::UrlEncoded("limit".into(), "10".into()))
        .with_status(200)
        .with_body(r#"{"pledgers": [{"Name": "Ada", "Country": "US", "City": "Oakland", "days_ago": 1}]}"#)
        .create_async()
        .await;
}

/// Serve `profile` on an ephemeral port and GET its route once.
async fn fetch_report(profile: ProfileConfig) -> (reqwest::StatusCode, Option<String>, Value) {
    let mut config = Config {
        profile: "under-test".to_string(),
        ..Config::default()
    };
    let route = profile.route.clone();
    config.profiles.insert("under-test".to_string(), profile);
    config.validate().unwrap();

    let aggregator = Aggregator::from_config(&config).unwrap();
    let handler = RequestHandler::new(Arc::new(aggregator), route.as_str());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (stop, stopped) = oneshot::channel::<()>();
    let server = tokio::spawn(async move {
        ServerBuilder::new(addr)
            .with_handler(handler)
            .serve_listener(listener, async {
                let _ = stopped.await;
            })
            .await
    });

    let response = reqwest::get(format!("http://{addr}{route}")).await.unwrap();
    let status = response.status();
    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let body: Value = response.json().await.unwrap();

    let _ = stop.send(());
    server.await.unwrap().unwrap();
    (status, content_type, body)
}

fn vitals(body: &Value) -> Vec<(String, Vec<String>)> {
    body["products"]
        .as_array()
        .unwrap()
        .iter()
        .map(|group| {
            let name = group["name"].as_str().unwrap().to_string();
            let vitals = group["vitals"]
                .as_array()
                .unwrap()
                .iter()
                .map(|v| v.as_str().unwrap().to_string())
                .collect();
            (name, vitals)
        })
        .collect()
}

#[tokio::test]
async fn all_dependencies_healthy() {
    let mut server = Server::new_async().await;
    mock_healthy_services(&mut server).await;

    let (status, content_type, body) = fetch_report(services_against(&server)).await;

    assert_eq!(status, reqwest::StatusCode::OK);
    assert_eq!(content_type.as_deref(), Some("application/json"));
    assert_eq!(
        vitals(&body),
        vec![
            (
                "Chapter Map".to_string(),
                vec!["Success: map HTTP Response Code 200".to_string()]
            ),
            (
                "Facebook Event Data".to_string(),
                vec!["Success: fb event HTTP Response Code 200, count 17".to_string()]
            ),
            (
                "Latest Pledgers".to_string(),
                vec!["Success: pledge HTTP Response Code 200, important fields found".to_string()]
            ),
        ]
    );
}

#[tokio::test]
async fn unreachable_dependency_only_fails_its_group() {
    let mut server = Server::new_async().await;
    mock_healthy_services(&mut server).await;

    let closed = {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap()
    };
    let mut profile = services_against(&server);
    if let CheckConfig::HttpStatus(check) = &mut profile.groups[0].checks[0] {
        check.url = Url::parse(&format!("http://{closed}/")).unwrap();
    }

    let (status, _, body) = fetch_report(profile).await;
    let groups = vitals(&body);

    assert_eq!(status, reqwest::StatusCode::OK);
    assert_eq!(groups.len(), 3);
    assert_eq!(groups[0].1, vec!["Failure: Connection Error".to_string()]);
    assert!(groups[1].1[0].starts_with("Success: "));
    assert!(groups[2].1[0].starts_with("Success: "));
}

#[tokio::test]
async fn failing_dependencies_never_change_the_shape() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/")
        .with_status(503)
        .create_async()
        .await;
    server
        .mock("GET", "/attending_event")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body("{}")
        .create_async()
        .await;
    server
        .mock("GET", "/pledgers")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(r#"{"pledgers": []}"#)
        .create_async()
        .await;

    let (status, _, body) = fetch_report(services_against(&server)).await;
    let groups = vitals(&body);

    assert_eq!(status, reqwest::StatusCode::OK);
    assert_eq!(
        groups,
        vec![
            (
                "Chapter Map".to_string(),
                vec!["Failure: HTTP Response Code 503".to_string()]
            ),
            (
                "Facebook Event Data".to_string(),
                vec!["Failure: count not in response".to_string()]
            ),
            (
                "Latest Pledgers".to_string(),
                vec!["Failure: Unknown Error".to_string()]
            ),
        ]
    );
    for (_, vitals) in &groups {
        for vital in vitals {
            assert!(vital.starts_with("Success: ") ^ vital.starts_with("Failure: "));
        }
    }
}

#[tokio::test]
async fn dxetech_report_on_health_route() {
    let dir = tempfile::tempdir().unwrap();
    let data = dir.path().join("chapter_data.json");
    File::create(&data)
        .unwrap()
        .set_modified(SystemTime::now() - StdDuration::from_secs(30 * 60))
        .unwrap();

    let mut server = Server::new_async().await;
    let page = server
        .mock("GET", "/maps/chapter_map.html")
        .with_status(200)
        .with_body("<html>map</html>")
        .create_async()
        .await;
    let recent = (Local::now().naive_local() - Duration::hours(1))
        .format("airtable/base_backup_%Y-%m-%d_%H:%M:%S.zip")
        .to_string();
    let listing = server
        .mock("GET", "/dxe-backup")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("prefix".into(), "airtable/".into()),
            Matcher::UrlEncoded("delimiter".into(), "/".into()),
        ]))
        .match_header("authorization", Matcher::Regex("^AWS4-HMAC-SHA256 ".into()))
        .with_status(200)
        .with_body(backup_listing(&["airtable/".to_string(), recent]))
        .create_async()
        .await;

    let profile = dxetech_against(&server, &data, "VITALS_IT_HEALTHY");
    assert_eq!(profile.route, "/health");
    let (status, content_type, body) = fetch_report(profile).await;
    let groups = vitals(&body);

    page.assert_async().await;
    listing.assert_async().await;
    assert_eq!(status, reqwest::StatusCode::OK);
    assert_eq!(content_type.as_deref(), Some("application/json"));

    let names: Vec<&str> = groups.iter().map(|(name, _)| name.as_str()).collect();
    assert_eq!(names, vec!["Chapter Map", "Airtable Backup"]);

    let chapter_map = &groups[0].1;
    assert_eq!(chapter_map.len(), 2);
    assert!(
        chapter_map[0].starts_with("Success: last updated 0:30:0")
            && chapter_map[0].ends_with(" ago."),
        "{}",
        chapter_map[0]
    );
    assert_eq!(chapter_map[1], "Success: HTTP Response Code 200");

    let backup = &groups[1].1;
    assert_eq!(backup.len(), 1);
    assert!(
        backup[0].starts_with("Success: last backed up 1:00:0") && backup[0].ends_with(" ago"),
        "{}",
        backup[0]
    );
}

#[tokio::test]
async fn dxetech_failures_keep_groups_and_wording() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("chapter_data.json");

    let mut server = Server::new_async().await;
    server
        .mock("GET", "/maps/chapter_map.html")
        .with_status(404)
        .create_async()
        .await;
    server
        .mock("GET", "/dxe-backup")
        .match_query(Matcher::Any)
        .with_status(403)
        .with_body("<Error><Code>InvalidAccessKeyId</Code></Error>")
        .create_async()
        .await;

    let (status, _, body) =
        fetch_report(dxetech_against(&server, &missing, "VITALS_IT_DENIED")).await;

    assert_eq!(status, reqwest::StatusCode::OK);
    assert_eq!(
        vitals(&body),
        vec![
            (
                "Chapter Map".to_string(),
                vec![
                    "Failure: unable to read chapter_data.json".to_string(),
                    "Failure: HTTP Response Code 404".to_string(),
                ]
            ),
            (
                "Airtable Backup".to_string(),
                vec!["Failure: Unknown Error".to_string()]
            ),
        ]
    );
}
