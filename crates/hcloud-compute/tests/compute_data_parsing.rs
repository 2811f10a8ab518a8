//! Integration tests for parsing compute payloads and analyzing deprecations.

use chrono::{TimeZone, Utc};
use hcloud_compute::deprecation::{analyze_image_at, analyze_server_type_at};
use hcloud_compute::image::{Image, ImageType};
use hcloud_compute::server_type::ServerType;
use hcloud_core::types::Meta;
use serde::Deserialize;
use std::fs;
use std::path::PathBuf;

/// Get the path to the test fixtures directory.
fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
}

fn load_fixture(name: &str) -> String {
    let fixture_path = fixtures_dir().join(name);
    fs::read_to_string(&fixture_path).unwrap_or_else(|e| {
        panic!(
            "Failed to read fixture at {}: {}",
            fixture_path.display(),
            e
        )
    })
}

#[derive(Deserialize)]
struct ServerTypeList {
    server_types: Vec<ServerType>,
    meta: Meta,
}

#[derive(Deserialize)]
struct ImageList {
    images: Vec<Image>,
}

fn server_types() -> Vec<ServerType> {
    let list: ServerTypeList = serde_json::from_str(&load_fixture("server_types.json"))
        .unwrap_or_else(|e| panic!("Failed to deserialize server types: {e}"));
    assert_eq!(list.meta.pagination.and_then(|p| p.total_entries), Some(3));
    list.server_types
}

#[test]
fn test_deserialize_server_types() {
    let types = server_types();
    assert_eq!(types.len(), 3);

    let cx11 = &types[0];
    assert_eq!(cx11.prices[0].location, "fsn1");
    assert_eq!(cx11.prices[0].price_monthly.net, "3.2900000000");
    assert!(cx11.deprecation.is_some());

    let cax11 = &types[2];
    assert_eq!(cax11.architecture, "arm");
}

#[test]
fn test_server_type_warnings() {
    let now = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
    let types = server_types();

    let cx11 = analyze_server_type_at(&types[0], None, now);
    assert!(cx11.unavailable);
    assert_eq!(
        cx11.message,
        "Server Type \"cx11\" is unavailable in all locations and can no longer be ordered"
    );

    // hel1 still offers cx22, so only targeted lookups warn.
    assert!(analyze_server_type_at(&types[1], None, now).is_empty());
    let fsn1 = analyze_server_type_at(&types[1], Some("fsn1"), now);
    assert!(fsn1.unavailable);
    let nbg1 = analyze_server_type_at(&types[1], Some("nbg1"), now);
    assert_eq!(
        nbg1.message,
        "Server Type \"cx22\" is deprecated in nbg1 and will no longer be available for order as of 2099-01-01"
    );

    assert!(analyze_server_type_at(&types[2], Some("fsn1"), now).is_empty());
}

#[test]
fn test_image_warnings() {
    let list: ImageList = serde_json::from_str(&load_fixture("images.json")).unwrap();
    let now = Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap();

    let centos = &list.images[0];
    assert_eq!(
        analyze_image_at(centos, now).message,
        "Image \"centos-7\" is deprecated and will no longer be available for order as of 2024-04-01"
    );

    let snapshot = &list.images[1];
    assert_eq!(snapshot.kind, ImageType::Snapshot);
    assert_eq!(snapshot.display_name(), "before upgrade");
    assert!(snapshot.protection.delete);
    assert!(analyze_image_at(snapshot, now).is_empty());
}
