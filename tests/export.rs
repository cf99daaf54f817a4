use std::collections::HashMap;
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use odk_tools::ToolError;
use odk_tools::config::{CentralConfig, Workspace};
use odk_tools::io::archive;
use odk_tools::io::central::{persist_download, submissions_url};
use odk_tools::io::excel_read;
use odk_tools::io::export::{self, auxiliary_label};
use odk_tools::io::media;
use odk_tools::sync;
use tempfile::tempdir;
use zip::CompressionMethod;
use zip::write::FileOptions;

const SUBMISSIONS_CSV: &str = "\
SubmissionDate,name,photo,meta-instanceID,instanceID,KEY
2024-01-01,Ana,ana.jpg,uuid:one,uuid:one,uuid:one
2024-01-02,Ben,,uuid:two,uuid:two,uuid:two
";

const CHILDREN_CSV: &str = "\
child,PARENT_KEY,KEY
c1,uuid:one,uuid:one/children[1]
c2,uuid:one,uuid:one/children[2]
c3,uuid:two,uuid:two/children[1]
";

fn write_archive(path: &Path, entries: &[(&str, &[u8])]) {
    let file = File::create(path).expect("archive created");
    let mut zip = zip::ZipWriter::new(file);
    let options = FileOptions::default().compression_method(CompressionMethod::Stored);
    for (name, content) in entries {
        zip.start_file(*name, options).expect("entry started");
        zip.write_all(content).expect("entry written");
    }
    zip.finish().expect("archive finished");
}

#[test]
fn auxiliary_labels_drop_form_prefix_and_extension() {
    assert_eq!(auxiliary_label("household", "household-members.csv"), "members");
    assert_eq!(auxiliary_label("household", "visits.csv"), "visits");
    assert_eq!(auxiliary_label("household", "householdmembers.csv"), "householdmembers");
}

#[test]
fn form_export_loads_primary_and_sorted_repeat_tables() {
    let temp_dir = tempdir().expect("temporary directory");
    let dir = temp_dir.path();
    fs::write(dir.join("survey.csv"), SUBMISSIONS_CSV).expect("primary written");
    fs::write(dir.join("survey-visits.csv"), "PARENT_KEY,day\nuuid:one,mon\n")
        .expect("visits written");
    fs::write(dir.join("survey-children.csv"), CHILDREN_CSV).expect("children written");
    fs::write(dir.join("notes.txt"), "not an export").expect("notes written");

    let form_export = export::load_form_export(dir, "survey").expect("export loaded");

    assert_eq!(form_export.form_name, "survey");
    assert_eq!(form_export.primary.rows.len(), 2);
    assert_eq!(form_export.primary.column_index("instanceID").expect("column"), 4);
    assert_eq!(form_export.primary.rows[1][2], "");

    let labels: Vec<&str> = form_export
        .auxiliary
        .iter()
        .map(|aux| aux.label.as_str())
        .collect();
    assert_eq!(labels, vec!["children", "visits"]);
    assert_eq!(form_export.auxiliary[0].table.rows.len(), 3);
}

#[test]
fn missing_primary_export_is_reported() {
    let temp_dir = tempdir().expect("temporary directory");
    let error = export::load_form_export(temp_dir.path(), "survey").expect_err("missing export");
    assert!(matches!(error, ToolError::MissingInput(path) if path.ends_with("survey.csv")));
}

#[test]
fn exports_are_listed_with_range_names() {
    let temp_dir = tempdir().expect("temporary directory");
    let dir = temp_dir.path();
    fs::write(dir.join("survey.csv"), SUBMISSIONS_CSV).expect("primary written");
    fs::write(dir.join("survey-children.csv"), CHILDREN_CSV).expect("children written");
    fs::create_dir(dir.join("media")).expect("media directory");

    let exports = export::list_exports(dir).expect("exports listed");
    let listed: Vec<(&str, &str)> = exports
        .iter()
        .map(|file| (file.file_name.as_str(), file.range_name.as_str()))
        .collect();
    assert_eq!(
        listed,
        vec![
            ("survey-children.csv", "survey-children"),
            ("survey.csv", "survey"),
        ]
    );
}

#[test]
fn missing_media_directory_means_no_attachments() {
    let temp_dir = tempdir().expect("temporary directory");
    let index = media::scan_media(&temp_dir.path().join("media")).expect("scan");
    assert!(index.file_names.is_empty());
}

#[test]
fn extracted_archive_splits_into_bundles() {
    let temp_dir = tempdir().expect("temporary directory");
    let workspace = Workspace::new(temp_dir.path());
    sync::prepare_workspace(&workspace).expect("workspace prepared");

    let archive_path = workspace.archive_path("survey");
    write_archive(
        &archive_path,
        &[
            ("survey.csv", SUBMISSIONS_CSV.as_bytes()),
            ("survey-children.csv", CHILDREN_CSV.as_bytes()),
            ("media/ana.jpg", b"jpeg bytes"),
        ],
    );

    let entries = archive::extract_archive(&archive_path, &workspace.form_dir("survey"))
        .expect("archive extracted");
    assert_eq!(entries, 3);

    let report = sync::split_form(&workspace, "survey").expect("split");
    assert_eq!(report.bundles.len(), 2);
    assert_eq!(report.copied_count(), 1);

    let bundles = workspace.form_dir("survey").join("individual");
    assert_eq!(
        fs::read(bundles.join("one/ana.jpg")).expect("photo copied"),
        b"jpeg bytes"
    );
    let children = excel_read::read_sheet(&bundles.join("two/survey.xlsx"), "children")
        .expect("children sheet");
    assert_eq!(children.rows.len(), 1);
    assert_eq!(children.rows[0][0], "c3");

    let report_path = temp_dir.path().join("report.json");
    sync::write_report(&report, &report_path).expect("report written");
    let json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&report_path).expect("report read"))
            .expect("report parsed");
    assert_eq!(json["media_columns"], serde_json::json!(["photo"]));
    assert_eq!(json["bundles"][0]["key"], "one");
    assert_eq!(json["bundles"][0]["media"][0]["outcome"]["status"], "copied");

    let listed = sync::list_form_exports(&workspace, "survey").expect("listed");
    assert_eq!(listed.len(), 2);
}

#[test]
fn config_strips_trailing_slash_and_builds_url() {
    let values: HashMap<String, String> = [
        ("URL", "https://central.example.org/"),
        ("PROJECT_ID", "7"),
        ("USERNAME", "ops@example.org"),
        ("PASSWORD", "secret"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();

    let config = CentralConfig::from_values(&values).expect("config");
    assert_eq!(config.base_url, "https://central.example.org");
    assert_eq!(
        submissions_url(&config, "household"),
        "https://central.example.org/v1/projects/7/forms/household/submissions.csv.zip?groupPaths=false"
    );
    assert!(!format!("{config:?}").contains("secret"));
}

#[test]
fn config_loads_from_env_file_and_reports_missing_keys() {
    let temp_dir = tempdir().expect("temporary directory");
    let env_path = temp_dir.path().join(".env");
    fs::write(
        &env_path,
        "URL=https://central.example.org\nPROJECT_ID=3\nUSERNAME=ops\nPASSWORD=pw\n",
    )
    .expect("env written");
    let config = CentralConfig::from_env_file(&env_path).expect("config loaded");
    assert_eq!(config.project_id, "3");
    assert_eq!(config.username, "ops");

    fs::write(&env_path, "URL=https://central.example.org\n").expect("env rewritten");
    let error = CentralConfig::from_env_file(&env_path).expect_err("incomplete config");
    assert!(matches!(error, ToolError::MissingConfig(key) if key == "PROJECT_ID"));
}

#[test]
fn interrupted_download_leaves_destination_untouched() {
    let temp_dir = tempdir().expect("temporary directory");
    let destination = temp_dir.path().join("survey.zip");
    fs::write(&destination, b"previous archive").expect("previous archive written");

    let error = persist_download(&destination, |file| {
        file.write_all(b"partial")?;
        Err(ToolError::Io(std::io::Error::other("connection reset")))
    })
    .expect_err("transfer failed");
    assert!(matches!(error, ToolError::Io(_)));

    assert_eq!(
        fs::read(&destination).expect("destination read"),
        b"previous archive"
    );
    let leftovers = fs::read_dir(temp_dir.path()).expect("directory listed").count();
    assert_eq!(leftovers, 1);

    let bytes = persist_download(&destination, |file| {
        file.write_all(b"fresh archive")?;
        Ok(13)
    })
    .expect("transfer succeeded");
    assert_eq!(bytes, 13);
    assert_eq!(fs::read(&destination).expect("destination read"), b"fresh archive");
}
