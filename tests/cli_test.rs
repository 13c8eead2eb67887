//! CLI integration tests for the json-directives binary.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn cmd() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("json-directives"))
}

// Helper to create a temp model file
fn write_temp_file(dir: &TempDir, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path
}

const PERSON_MODEL: &str = r#"{
    "types": [
        {
            "name": "Person",
            "annotations": [{ "kind": "buddy", "type": "PersonMetadata" }],
            "interfaces": ["IAudited"],
            "members": [
                { "name": "Name", "type": "string" },
                { "name": "Born", "type": "datetime" },
                { "name": "Modified", "type": "datetime" },
                { "name": "BornSpecified", "type": "bool" }
            ]
        },
        {
            "name": "PersonMetadata",
            "annotations": [{ "kind": "container", "member_serialization": "opt_in" }],
            "members": [
                {
                    "name": "Name",
                    "type": "string",
                    "annotations": [{ "kind": "property", "name": "full_name", "required": true }]
                },
                {
                    "name": "Born",
                    "type": "datetime",
                    "annotations": [
                        { "kind": "property" },
                        { "kind": "converter", "converter": "unix_datetime" }
                    ]
                }
            ]
        },
        {
            "name": "IAudited",
            "kind": "interface",
            "members": [{
                "name": "Modified",
                "type": "datetime",
                "annotations": [
                    { "kind": "property", "name": "modified_at" },
                    { "kind": "converter", "converter": "iso_datetime" }
                ]
            }]
        }
    ]
}"#;

mod resolve_command {
    use super::*;

    #[test]
    fn basic_resolve() {
        let dir = TempDir::new().unwrap();
        let model = write_temp_file(&dir, "model.json", PERSON_MODEL);

        cmd()
            .args(["resolve", model.to_str().unwrap(), "--type", "Person"])
            .assert()
            .success()
            .stdout(predicate::str::contains(r#""buddy_type":"PersonMetadata""#))
            .stdout(predicate::str::contains(r#""member_serialization":"opt_in""#))
            .stdout(predicate::str::contains(r#""serialized_name":"full_name""#))
            .stdout(predicate::str::contains(r#""serialized_name":"modified_at""#));
    }

    #[test]
    fn resolve_single_member() {
        let dir = TempDir::new().unwrap();
        let model = write_temp_file(&dir, "model.json", PERSON_MODEL);

        cmd()
            .args([
                "resolve",
                model.to_str().unwrap(),
                "-t",
                "Person",
                "--member",
                "Born",
            ])
            .assert()
            .success()
            .stdout(predicate::str::contains(r#""converter":"unix_datetime""#))
            .stdout(predicate::str::contains(r#""specified":"BornSpecified""#))
            .stdout(predicate::str::contains("full_name").not());
    }

    #[test]
    fn resolve_with_pretty() {
        let dir = TempDir::new().unwrap();
        let model = write_temp_file(&dir, "model.json", PERSON_MODEL);

        cmd()
            .args([
                "resolve",
                model.to_str().unwrap(),
                "--type",
                "IAudited",
                "--pretty",
            ])
            .assert()
            .success()
            .stdout(predicate::str::contains("\n  \"kind\": \"interface\""));
    }

    #[test]
    fn resolve_without_buddy_extension() {
        let dir = TempDir::new().unwrap();
        let model = write_temp_file(&dir, "model.json", PERSON_MODEL);

        cmd()
            .args([
                "resolve",
                model.to_str().unwrap(),
                "--type",
                "Person",
                "--no-buddy-extension",
            ])
            .assert()
            .success()
            .stdout(predicate::str::contains(r#""buddy_type":null"#))
            .stdout(predicate::str::contains(r#""member_serialization":"opt_out""#))
            .stdout(predicate::str::contains(r#""converter":"iso_datetime""#));
    }

    #[test]
    fn resolve_contract_opt_in_toggle() {
        let dir = TempDir::new().unwrap();
        let model = write_temp_file(
            &dir,
            "model.json",
            r#"{"types":[{"name":"Order","annotations":[{"kind":"data_contract"}]}]}"#,
        );

        cmd()
            .args(["resolve", model.to_str().unwrap(), "--type", "Order"])
            .assert()
            .success()
            .stdout(predicate::str::contains(r#""member_serialization":"opt_in""#));

        cmd()
            .args([
                "resolve",
                model.to_str().unwrap(),
                "--type",
                "Order",
                "--no-contract-opt-in",
            ])
            .assert()
            .success()
            .stdout(predicate::str::contains(r#""member_serialization":"opt_out""#));
    }

    #[test]
    fn resolve_type_level_converter() {
        let dir = TempDir::new().unwrap();
        let model = write_temp_file(
            &dir,
            "model.json",
            r#"{"types":[{"name":"Version","annotations":[{"kind":"converter","converter":"version"}]}]}"#,
        );

        cmd()
            .args(["resolve", model.to_str().unwrap(), "--type", "Version"])
            .assert()
            .success()
            .stdout(predicate::str::contains(r#""converter":"version""#));
    }
}

mod error_handling {
    use super::*;

    #[test]
    fn file_not_found() {
        cmd()
            .args(["resolve", "/nonexistent/model.json", "--type", "A"])
            .assert()
            .failure()
            .code(3)
            .stderr(predicate::str::contains("not found"));
    }

    #[test]
    fn invalid_model_document() {
        let dir = TempDir::new().unwrap();
        let model = write_temp_file(
            &dir,
            "model.json",
            r#"{"types":[{"name":"A","kind":"struct"}]}"#,
        );

        cmd()
            .args(["resolve", model.to_str().unwrap(), "--type", "A"])
            .assert()
            .failure()
            .code(2);
    }

    #[test]
    fn unknown_type() {
        let dir = TempDir::new().unwrap();
        let model = write_temp_file(&dir, "model.json", PERSON_MODEL);

        cmd()
            .args(["resolve", model.to_str().unwrap(), "--type", "Nobody"])
            .assert()
            .failure()
            .code(2)
            .stderr(predicate::str::contains("Nobody"));
    }

    #[test]
    fn unknown_member() {
        let dir = TempDir::new().unwrap();
        let model = write_temp_file(&dir, "model.json", PERSON_MODEL);

        cmd()
            .args([
                "resolve",
                model.to_str().unwrap(),
                "--type",
                "Person",
                "--member",
                "Age",
            ])
            .assert()
            .failure()
            .code(2)
            .stderr(predicate::str::contains("Age"));
    }

    #[test]
    fn rejected_converter() {
        let dir = TempDir::new().unwrap();
        let model = write_temp_file(
            &dir,
            "model.json",
            r#"{"types":[{"name":"A","members":[{"name":"Count","type":"int",
                "annotations":[{"kind":"converter","converter":"iso_datetime"}]}]}]}"#,
        );

        cmd()
            .args(["resolve", model.to_str().unwrap(), "--type", "A"])
            .assert()
            .failure()
            .code(2)
            .stderr(predicate::str::contains("iso_datetime"));
    }
}

mod lint_command {
    use super::*;

    #[test]
    fn lint_valid_model() {
        let dir = TempDir::new().unwrap();
        let model = write_temp_file(&dir, "model.json", PERSON_MODEL);

        cmd()
            .args(["lint", model.to_str().unwrap()])
            .assert()
            .success()
            .stdout(predicate::str::contains("1 files checked, all passed"));
    }

    #[test]
    fn lint_reports_errors() {
        let dir = TempDir::new().unwrap();
        let model = write_temp_file(
            &dir,
            "model.json",
            r#"{"types":[{"name":"A","annotations":[{"kind":"buddy","type":"Missing"}]}]}"#,
        );

        cmd()
            .args(["lint", model.to_str().unwrap()])
            .assert()
            .failure()
            .code(1)
            .stdout(predicate::str::contains("E002"));
    }

    #[test]
    fn lint_json_output() {
        let dir = TempDir::new().unwrap();
        write_temp_file(&dir, "good.json", r#"{"types":[{"name":"A"}]}"#);
        write_temp_file(&dir, "bad.json", "{ not json }");

        let output = cmd()
            .args(["lint", dir.path().to_str().unwrap(), "--format", "json"])
            .assert()
            .failure()
            .code(1)
            .get_output()
            .stdout
            .clone();

        let result: serde_json::Value = serde_json::from_slice(&output).unwrap();
        assert_eq!(result["files_checked"], 2);
        assert_eq!(result["passed"], 1);
        assert_eq!(result["failed"], 1);
    }

    #[test]
    fn lint_strict_fails_on_warnings() {
        let dir = TempDir::new().unwrap();
        let model = write_temp_file(
            &dir,
            "model.json",
            r#"{"types":[{"name":"A","interfaces":["B"]},{"name":"B"}]}"#,
        );

        cmd()
            .args(["lint", model.to_str().unwrap()])
            .assert()
            .success();

        cmd()
            .args(["lint", model.to_str().unwrap(), "--strict"])
            .assert()
            .failure()
            .code(1)
            .stdout(predicate::str::contains("W001"));
    }

    #[test]
    fn lint_missing_path() {
        cmd()
            .args(["lint", "/nonexistent/models"])
            .assert()
            .failure()
            .code(2);
    }
}

mod capabilities_command {
    use super::*;

    #[test]
    fn capabilities_available_by_default() {
        cmd()
            .env_remove("JSON_DIRECTIVES_DENY_DYNAMIC_CODE")
            .args(["capabilities", "--json"])
            .assert()
            .success()
            .stdout(predicate::str::contains(
                r#"{"dynamic_code_generation":true,"accessor_factory":"compiled"}"#,
            ));
    }

    #[test]
    fn capabilities_denied_by_environment() {
        cmd()
            .env("JSON_DIRECTIVES_DENY_DYNAMIC_CODE", "1")
            .args(["capabilities"])
            .assert()
            .success()
            .stdout(predicate::str::contains("dynamic code generation: unavailable"))
            .stdout(predicate::str::contains("accessor factory: reflective"));
    }
}

mod help_and_version {
    use super::*;

    #[test]
    fn help_flag() {
        cmd()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("resolve"))
            .stdout(predicate::str::contains("lint"))
            .stdout(predicate::str::contains("capabilities"));
    }

    #[test]
    fn version_flag() {
        cmd()
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("json-directives"));
    }

    #[test]
    fn missing_type_flag() {
        cmd()
            .args(["resolve", "model.json"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("--type"));
    }
}
