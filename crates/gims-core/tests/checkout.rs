//! Checkout integration tests against the in-memory gateway.

mod support;

use chrono::{TimeZone, Utc};
use pretty_assertions::assert_eq;
use serde_json::json;
use tempfile::TempDir;

use gims_core::model::ComponentKind;
use gims_core::sync::checkout::{FolderCheckoutOutcome, FolderItem};
use gims_core::sync::projection::{ComponentMeta, ParamsFile, PropertiesFile};
use gims_core::sync::{
    CheckoutCommand, CheckoutFolderCommand, CheckoutFolderOptions, CheckoutOptions,
    CheckoutOutcome, FixedClock, FolderSelector, Selector,
};

use support::{FakeGateway, read_file, write_file};

fn clock() -> FixedClock {
    FixedClock(Utc.with_ymd_and_hms(2025, 3, 1, 8, 0, 0).unwrap())
}

fn script_gateway() -> FakeGateway {
    let gateway = FakeGateway::new();
    gateway
        .on_get(
            "/scripts/script/42/",
            json!({
                "id": 42,
                "name": "ICMP Monitor",
                "folder_id": 3,
                "code": "import os\n\nprint(os.name)\n",
                "updated_at": "2025-02-01T10:00:00Z",
            }),
        )
        .on_get(
            "/scripts/script/",
            json!([{"id": 42, "name": "ICMP Monitor"}, {"id": 43, "name": "Backup"}]),
        )
        .on_get(
            "/scripts/folder/",
            json!([
                {"id": 1, "name": "Monitoring", "parent_folder_id": null},
                {"id": 3, "name": "Network", "parent_folder_id": 1},
            ]),
        );
    gateway
}

fn datasource_gateway() -> FakeGateway {
    let gateway = FakeGateway::new();
    gateway
        .on_get(
            "/datasource_types/ds_type/7/",
            json!({
                "id": 7,
                "name": "SNMP Poller",
                "description": "Polls devices",
                "version": "2.1",
                "updated_at": "2025-02-01T10:00:00Z",
            }),
        )
        .on_get(
            "/datasource_types/properties/?mds_type_id=7",
            json!([{
                "id": 70,
                "name": "Community",
                "label": "community",
                "value_type_id": 1,
                "value_type_name": "String",
                "default_value": "public",
                "section_name_id": 2,
                "section_name": "Connection",
                "mds_type_id": 7,
            }]),
        )
        .on_get(
            "/datasource_types/method/?mds_type_id=7",
            json!([{"id": 71, "name": "Poll", "label": "poll", "code": "pass\n"}]),
        )
        .on_get(
            "/datasource_types/method_params/?method_id=71",
            json!([
                {"id": 710, "label": "oid", "input_type": true, "value_type_id": 1},
                {"id": 711, "label": "value", "input_type": false},
            ]),
        );
    gateway
}

#[test]
fn script_checkout_writes_meta_and_code() {
    let temp = TempDir::new().unwrap();
    let out = temp.path().join("icmp");
    let gateway = script_gateway();

    let clock = clock();
    let outcome = CheckoutCommand::new(&gateway)
        .with_clock(&clock)
        .execute(
            &CheckoutOptions::new(ComponentKind::Script, Selector::Id(42)).with_output_dir(&out),
        )
        .unwrap();

    let CheckoutOutcome::CheckedOut {
        files,
        counts,
        gims_updated_at,
        ..
    } = &outcome
    else {
        panic!("unexpected outcome: {outcome:?}");
    };
    assert_eq!(files, &vec!["meta.yaml".to_string(), "code.py".to_string()]);
    assert_eq!(counts.code_lines, Some(2));
    assert_eq!(gims_updated_at.as_deref(), Some("2025-02-01T10:00:00Z"));

    assert_eq!(read_file(&out.join("code.py")), "import os\n\nprint(os.name)\n");
    let meta: ComponentMeta = serde_yaml::from_str(&read_file(&out.join("meta.yaml"))).unwrap();
    assert_eq!(meta.gims_id, Some(42));
    assert_eq!(meta.gims_folder.as_deref(), Some("/Monitoring/Network"));
    assert_eq!(meta.gims_folder_id, Some(3));
    assert_eq!(meta.code_file.as_deref(), Some("code.py"));
    assert_eq!(meta.exported_from.as_deref(), Some(support::SYSTEM_URL));

    let json = serde_json::to_value(&outcome).unwrap();
    assert_eq!(json["status"], "checked_out");
    assert_eq!(json["code_lines"], 2);
    assert!(json.get("methods_count").is_none());
}

#[test]
fn repeated_checkout_is_idempotent() {
    let temp = TempDir::new().unwrap();
    let out = temp.path().join("icmp");
    let gateway = script_gateway();
    let clock = clock();
    let command = CheckoutCommand::new(&gateway).with_clock(&clock);
    let options = CheckoutOptions::new(ComponentKind::Script, Selector::Id(42)).with_output_dir(&out);

    command.execute(&options).unwrap();
    let first_meta = read_file(&out.join("meta.yaml"));
    let first_code = read_file(&out.join("code.py"));

    let second = command.execute(&options).unwrap();
    assert!(!second.is_conflict());
    assert_eq!(read_file(&out.join("meta.yaml")), first_meta);
    assert_eq!(read_file(&out.join("code.py")), first_code);
}

#[test]
fn changed_remote_timestamp_is_a_conflict() {
    let temp = TempDir::new().unwrap();
    let out = temp.path().join("icmp");
    write_file(
        &out.join("meta.yaml"),
        "gims_id: 42\nname: ICMP Monitor\ngims_updated_at: '2025-01-01T00:00:00Z'\n",
    );
    write_file(&out.join("code.py"), "print('local edit')\n");
    let gateway = script_gateway();

    let options = CheckoutOptions::new(ComponentKind::Script, Selector::Id(42)).with_output_dir(&out);
    let outcome = CheckoutCommand::new(&gateway).execute(&options).unwrap();

    assert!(outcome.is_conflict());
    let json = serde_json::to_value(&outcome).unwrap();
    assert_eq!(json["status"], "conflict");
    assert_eq!(json["local_updated_at"], "2025-01-01T00:00:00Z");
    assert_eq!(json["gims_updated_at"], "2025-02-01T10:00:00Z");
    assert_eq!(read_file(&out.join("code.py")), "print('local edit')\n");

    let forced = CheckoutCommand::new(&gateway)
        .execute(&options.with_force(true))
        .unwrap();
    assert!(!forced.is_conflict());
    assert_eq!(read_file(&out.join("code.py")), "import os\n\nprint(os.name)\n");
}

#[test]
fn dry_run_writes_nothing() {
    let temp = TempDir::new().unwrap();
    let out = temp.path().join("icmp");
    let gateway = script_gateway();

    let outcome = CheckoutCommand::new(&gateway)
        .execute(
            &CheckoutOptions::new(ComponentKind::Script, Selector::Name("ICMP Monitor".into()))
                .with_output_dir(&out)
                .with_dry_run(true),
        )
        .unwrap();

    assert!(matches!(outcome, CheckoutOutcome::DryRun { gims_id: 42, .. }));
    assert!(!out.exists());
    assert!(gateway.mutating_calls().is_empty());
}

#[test]
fn unknown_name_is_not_found() {
    let gateway = script_gateway();
    let err = CheckoutCommand::new(&gateway)
        .execute(&CheckoutOptions::new(
            ComponentKind::Script,
            Selector::Name("Nope".into()),
        ))
        .unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(err.to_string(), "Script 'Nope' not found");
}

#[test]
fn datasource_checkout_writes_methods_and_parameters() {
    let temp = TempDir::new().unwrap();
    let out = temp.path().join("snmp");
    let gateway = datasource_gateway();

    let outcome = CheckoutCommand::new(&gateway)
        .execute(
            &CheckoutOptions::new(ComponentKind::DatasourceType, Selector::Id(7))
                .with_output_dir(&out),
        )
        .unwrap();

    let json = serde_json::to_value(&outcome).unwrap();
    assert_eq!(json["methods_count"], 1);
    assert_eq!(json["properties_count"], 1);
    assert_eq!(
        json["files"],
        json!([
            "meta.yaml",
            "properties.yaml",
            "methods/poll/meta.yaml",
            "methods/poll/code.py",
            "methods/poll/params.yaml",
        ])
    );

    let meta: ComponentMeta = serde_yaml::from_str(&read_file(&out.join("meta.yaml"))).unwrap();
    assert_eq!(meta.version.as_deref(), Some("2.1"));
    assert_eq!(meta.code_file, None);

    let props: PropertiesFile =
        serde_yaml::from_str(&read_file(&out.join("properties.yaml"))).unwrap();
    assert_eq!(props.properties[0].label, "community");
    assert_eq!(props.properties[0].section, "Connection");
    assert_eq!(props.properties[0].default_value, json!("public"));

    let params: ParamsFile =
        serde_yaml::from_str(&read_file(&out.join("methods/poll/params.yaml"))).unwrap();
    assert_eq!(params.parameters.len(), 2);
    assert!(params.parameters[0].input_type);
    assert!(!params.parameters[1].input_type);
}

#[test]
fn checkout_removes_methods_deleted_remotely() {
    let temp = TempDir::new().unwrap();
    let out = temp.path().join("snmp");
    write_file(&out.join("methods/legacy/meta.yaml"), "name: Legacy\nlabel: legacy\n");
    write_file(&out.join("methods/legacy/code.py"), "pass\n");
    let gateway = datasource_gateway();

    CheckoutCommand::new(&gateway)
        .execute(
            &CheckoutOptions::new(ComponentKind::DatasourceType, Selector::Id(7))
                .with_output_dir(&out)
                .with_force(true),
        )
        .unwrap();

    assert!(out.join("methods/poll/code.py").is_file());
    assert!(!out.join("methods/legacy").exists());
}

#[test]
fn folder_checkout_captures_item_failures() {
    let temp = TempDir::new().unwrap();
    let gateway = script_gateway();
    gateway.on_get(
        "/scripts/script/?folder_id=3",
        json!([
            {"id": 42, "name": "ICMP Monitor", "folder_id": 3},
            {"id": 44, "name": "Broken One", "folder_id": 3},
        ]),
    );

    let outcome = CheckoutFolderCommand::new(&gateway)
        .execute(
            &CheckoutFolderOptions::new(ComponentKind::Script)
                .with_folder(Some(FolderSelector::Name("Network".into())))
                .with_output_base_dir(temp.path()),
        )
        .unwrap();

    let FolderCheckoutOutcome::CheckedOut {
        folder_id,
        components,
        ..
    } = outcome
    else {
        panic!("expected a checkout");
    };
    assert_eq!(folder_id, Some(3));
    assert_eq!(components.len(), 2);
    assert!(matches!(components[0], FolderItem::Done(CheckoutOutcome::CheckedOut { .. })));
    let FolderItem::Failed(failure) = &components[1] else {
        panic!("second item should fail");
    };
    assert_eq!(failure.gims_id, 44);
    assert!(failure.error.contains("404"), "{}", failure.error);
    assert!(temp.path().join("icmp_monitor/code.py").is_file());
}

#[test]
fn folder_dry_run_lists_components() {
    let gateway = script_gateway();
    gateway.on_get(
        "/scripts/script/?folder_id=3",
        json!([{"id": 42, "name": "ICMP Monitor", "folder_id": 3}]),
    );

    let outcome = CheckoutFolderCommand::new(&gateway)
        .execute(
            &CheckoutFolderOptions::new(ComponentKind::Script)
                .with_folder(Some(FolderSelector::Id(3)))
                .with_dry_run(true),
        )
        .unwrap();

    let json = serde_json::to_value(&outcome).unwrap();
    assert_eq!(json["status"], "dry_run");
    assert_eq!(json["components_count"], 1);
    assert_eq!(json["components"][0], json!({"gims_id": 42, "name": "ICMP Monitor"}));
    assert_eq!(json["component_type"], "script");
}

#[test]
fn unknown_folder_name_is_not_found() {
    let gateway = script_gateway();
    let err = CheckoutFolderCommand::new(&gateway)
        .execute(
            &CheckoutFolderOptions::new(ComponentKind::Script)
                .with_folder(Some(FolderSelector::Name("Missing".into()))),
        )
        .unwrap_err();
    assert_eq!(err.to_string(), "Folder 'Missing' not found");
}
