//! Status classification across a directory of components.

mod support;

use pretty_assertions::assert_eq;
use serde_json::json;
use tempfile::TempDir;

use gims_core::api::HttpMethod;
use gims_core::error::GimsError;
use gims_core::sync::{StatusCommand, SyncStatus};

use support::{FakeGateway, script_dir, write_file};

fn populated(base: &std::path::Path) {
    script_dir(
        &base.join("a_synced"),
        "gims_id: 1\nname: Synced\ngims_updated_at: '2025-03-01T00:00:00Z'\n",
        "pass\n",
    );
    script_dir(
        &base.join("b_stale"),
        "gims_id: 2\nname: Stale\ngims_updated_at: '2025-01-01T00:00:00Z'\n",
        "pass\n",
    );
    script_dir(&base.join("c_new"), "name: New\n", "pass\n");
    script_dir(&base.join("d_gone"), "gims_id: 4\nname: Gone\n", "pass\n");
    script_dir(
        &base.join("e_broken"),
        "gims_id: 5\nname: Broken\ngims_updated_at: '2025-01-01T00:00:00Z'\n",
        "pass\n",
    );
    // not a component: no meta.yaml
    write_file(&base.join("notes/readme.txt"), "scratch\n");
}

fn gateway() -> FakeGateway {
    let gateway = FakeGateway::new();
    gateway
        .on_get(
            "/scripts/script/1/",
            json!({"id": 1, "name": "Synced", "updated_at": "2025-03-01T00:00:00Z"}),
        )
        .on_get(
            "/scripts/script/2/",
            json!({"id": 2, "name": "Stale", "updated_at": "2025-02-01T00:00:00Z"}),
        )
        .fail(
            HttpMethod::Get,
            "/scripts/script/5/",
            GimsError::api(500, "API error", "boom"),
        );
    gateway
}

#[test]
fn classifies_every_component() {
    let temp = TempDir::new().unwrap();
    populated(temp.path());
    let gateway = gateway();

    let report = StatusCommand::new(&gateway).execute(temp.path()).unwrap();

    let statuses: Vec<(Option<&str>, SyncStatus)> = report
        .components
        .iter()
        .map(|c| (c.name.as_deref(), c.status))
        .collect();
    assert_eq!(
        statuses,
        vec![
            (Some("Synced"), SyncStatus::InSync),
            (Some("Stale"), SyncStatus::GimsNewer),
            (Some("New"), SyncStatus::LocalOnly),
            (Some("Gone"), SyncStatus::GimsDeleted),
            (Some("Broken"), SyncStatus::Error),
        ]
    );

    let summary = serde_json::to_value(&report.summary).unwrap();
    assert_eq!(
        summary,
        json!({
            "total": 5,
            "in_sync": 1,
            "local_newer": 0,
            "gims_newer": 1,
            "local_only": 1,
            "gims_deleted": 1,
            "unknown": 0,
            "error": 1,
        })
    );
    assert!(gateway.mutating_calls().is_empty());
}

#[test]
fn remote_timestamp_is_reported() {
    let temp = TempDir::new().unwrap();
    populated(temp.path());
    let gateway = gateway();

    let report = StatusCommand::new(&gateway).execute(temp.path()).unwrap();
    let stale = serde_json::to_value(&report.components[1]).unwrap();
    assert_eq!(stale["status"], "gims_newer");
    assert_eq!(stale["gims_updated_at"], "2025-02-01T00:00:00Z");
    assert_eq!(stale["local_updated_at"], "2025-01-01T00:00:00Z");
    assert_eq!(stale["component_type"], "script");
}

#[test]
fn missing_directory_is_rejected() {
    let temp = TempDir::new().unwrap();
    let gateway = FakeGateway::new();
    let err = StatusCommand::new(&gateway)
        .execute(&temp.path().join("absent"))
        .unwrap_err();
    assert!(err.to_string().starts_with("Directory not found:"));
}
