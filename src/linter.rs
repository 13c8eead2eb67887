//! Model linting - static analysis of type model files.
//!
//! Checks model files for:
//! - JSON syntax and document structure errors
//! - Buddy and interface references to unknown types
//! - Converter directives that cannot be honoured at their site
//! - Buddy declarations that will never be consulted

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;

use crate::error::ModelError;
use crate::loader::{load_document, model_from_value};
use crate::model::{TypeDescriptor, TypeKind, TypeModel};
use crate::resolver::DirectiveResolver;
use crate::types::{AnnotationKind, BuddyAnnotation, ConverterAnnotation};

/// Severity level for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

/// A single diagnostic message from linting.
#[derive(Debug, Clone, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub code: String,
    pub file: PathBuf,
    /// JSON path to the issue (e.g., "/types/0/members/1/annotations/0")
    pub path: String,
    pub message: String,
}

/// Result of linting a single file.
#[derive(Debug, Clone, Serialize)]
pub struct FileResult {
    pub file: PathBuf,
    pub status: FileStatus,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<Diagnostic>,
}

/// Status of a linted file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    Ok,
    Error,
    Warning,
}

/// Result of linting a directory or set of files.
#[derive(Debug, Clone, Serialize)]
pub struct LintResult {
    pub path: PathBuf,
    pub files_checked: usize,
    pub passed: usize,
    pub failed: usize,
    pub errors: usize,
    pub warnings: usize,
    pub results: Vec<FileResult>,
}

impl LintResult {
    /// Returns true if all files passed (no errors).
    pub fn is_ok(&self) -> bool {
        self.errors == 0
    }
}

/// Lint a file or directory.
///
/// If path is a directory, recursively finds all .json files.
/// If `strict` is true, warnings are treated as errors.
/// Returns aggregated results for all files.
pub fn lint(path: &Path, strict: bool) -> LintResult {
    let files = collect_model_files(path);
    let mut results = Vec::new();
    let mut total_errors = 0;
    let mut total_warnings = 0;

    for file in &files {
        let file_result = lint_file(file, path);
        total_errors += count(&file_result, Severity::Error);
        total_warnings += count(&file_result, Severity::Warning);
        results.push(file_result);
    }

    let failed = results
        .iter()
        .filter(|r| {
            if strict {
                r.status != FileStatus::Ok
            } else {
                r.status == FileStatus::Error
            }
        })
        .count();

    LintResult {
        path: path.to_path_buf(),
        files_checked: files.len(),
        passed: files.len() - failed,
        failed,
        errors: total_errors,
        warnings: total_warnings,
        results,
    }
}

fn count(result: &FileResult, severity: Severity) -> usize {
    result
        .diagnostics
        .iter()
        .filter(|d| d.severity == severity)
        .count()
}

/// Lint a single model file.
pub fn lint_file(file: &Path, base_path: &Path) -> FileResult {
    let mut diagnostics = Vec::new();
    let relative = file.strip_prefix(base_path).unwrap_or(file).to_path_buf();

    let model = match load_document(file).and_then(|doc| model_from_value(&doc)) {
        Ok(model) => model,
        Err(ModelError::InvalidModel { errors }) => {
            for error in errors {
                diagnostics.push(Diagnostic {
                    severity: Severity::Error,
                    code: "E001".to_string(),
                    file: file.to_path_buf(),
                    path: error.path,
                    message: error.message,
                });
            }
            return FileResult {
                file: relative,
                status: FileStatus::Error,
                diagnostics,
            };
        }
        Err(e) => {
            diagnostics.push(Diagnostic {
                severity: Severity::Error,
                code: "E001".to_string(),
                file: file.to_path_buf(),
                path: "/".to_string(),
                message: e.to_string(),
            });
            return FileResult {
                file: relative,
                status: FileStatus::Error,
                diagnostics,
            };
        }
    };

    let model = Arc::new(model);
    let checker = Checker {
        file,
        resolver: DirectiveResolver::new(Arc::clone(&model)),
        diagnostics: &mut diagnostics,
    };
    checker.check(&model);

    let has_errors = diagnostics.iter().any(|d| d.severity == Severity::Error);
    let has_warnings = diagnostics.iter().any(|d| d.severity == Severity::Warning);

    let status = if has_errors {
        FileStatus::Error
    } else if has_warnings {
        FileStatus::Warning
    } else {
        FileStatus::Ok
    };

    FileResult {
        file: relative,
        status,
        diagnostics,
    }
}

struct Checker<'a> {
    file: &'a Path,
    resolver: DirectiveResolver,
    diagnostics: &'a mut Vec<Diagnostic>,
}

impl Checker<'_> {
    fn check(mut self, model: &TypeModel) {
        for (i, ty) in model.types().enumerate() {
            let path = format!("/types/{}", i);
            self.check_buddy(model, ty, &path);
            self.check_interfaces(model, ty, &path);
            self.check_members(ty, &path);
        }
    }

    fn push(&mut self, severity: Severity, code: &str, path: String, message: String) {
        self.diagnostics.push(Diagnostic {
            severity,
            code: code.to_string(),
            file: self.file.to_path_buf(),
            path,
            message,
        });
    }

    fn check_buddy(&mut self, model: &TypeModel, ty: &TypeDescriptor, path: &str) {
        let Some((index, buddy_name)) = ty
            .annotations
            .iter()
            .enumerate()
            .find_map(|(i, a)| BuddyAnnotation::from_annotation(a).map(|b| (i, b.buddy_type)))
        else {
            return;
        };
        let annotation_path = format!("{}/annotations/{}", path, index);

        let Some(buddy) = model.get(&buddy_name) else {
            self.push(
                Severity::Error,
                "E002",
                annotation_path,
                format!("buddy type \"{}\" of \"{}\" is not defined", buddy_name, ty.name),
            );
            return;
        };

        if buddy.annotations.find::<BuddyAnnotation>().is_some() {
            self.push(
                Severity::Warning,
                "W002",
                annotation_path.clone(),
                format!(
                    "buddy type \"{}\" declares its own buddy, which is never followed",
                    buddy.name
                ),
            );
        }

        for member in &buddy.members {
            if ty.find_member(&member.name).is_none() {
                self.push(
                    Severity::Warning,
                    "W003",
                    annotation_path.clone(),
                    format!(
                        "buddy member \"{}.{}\" has no counterpart on \"{}\"",
                        buddy.name, member.name, ty.name
                    ),
                );
            }
        }
    }

    fn check_interfaces(&mut self, model: &TypeModel, ty: &TypeDescriptor, path: &str) {
        for (i, name) in ty.interfaces.iter().enumerate() {
            let interface_path = format!("{}/interfaces/{}", path, i);
            match model.get(name) {
                None => self.push(
                    Severity::Error,
                    "E003",
                    interface_path,
                    format!("interface \"{}\" of \"{}\" is not defined", name, ty.name),
                ),
                Some(interface) if interface.kind != TypeKind::Interface => self.push(
                    Severity::Warning,
                    "W001",
                    interface_path,
                    format!("\"{}\" is listed as an interface but is a class", name),
                ),
                Some(_) => {}
            }
        }
    }

    fn check_members(&mut self, ty: &TypeDescriptor, path: &str) {
        let mut seen = HashSet::new();
        for (i, member) in ty.members.iter().enumerate() {
            let member_path = format!("{}/members/{}", path, i);
            if !seen.insert(member.name.as_str()) {
                self.push(
                    Severity::Error,
                    "E005",
                    member_path.clone(),
                    format!("duplicate member \"{}\" on \"{}\"", member.name, ty.name),
                );
            }

            if let Err(e) = self.resolver.get_member_converter(member) {
                self.push(
                    Severity::Error,
                    "E004",
                    member_path,
                    format!("{}.{}: {}", ty.name, member.name, e),
                );
            }
        }

        if ty.annotations.find::<ConverterAnnotation>().is_some() {
            if let Err(e) = self.resolver.get_converter(ty, &ty.name) {
                self.push(
                    Severity::Error,
                    "E004",
                    path.to_string(),
                    format!("{}: {}", ty.name, e),
                );
            }
        }
    }
}

/// Collect all .json files in a path (file or directory).
fn collect_model_files(path: &Path) -> Vec<PathBuf> {
    if path.is_file() {
        if path.extension().map(|e| e == "json").unwrap_or(false) {
            return vec![path.to_path_buf()];
        }
        return vec![];
    }

    let mut files = Vec::new();
    collect_files_recursive(path, &mut files);
    files.sort();
    files
}

fn collect_files_recursive(dir: &Path, files: &mut Vec<PathBuf>) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };

    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_files_recursive(&path, files);
        } else if path.extension().map(|e| e == "json").unwrap_or(false) {
            files.push(path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::{tempdir, NamedTempFile};

    fn lint_str(content: &str) -> FileResult {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", content).unwrap();
        lint_file(file.path(), file.path().parent().unwrap())
    }

    #[test]
    fn lint_valid_model() {
        let result = lint_str(
            r#"{
            "types": [
                {
                    "name": "Person",
                    "annotations": [{ "kind": "buddy", "type": "PersonMeta" }],
                    "interfaces": ["INamed"],
                    "members": [{ "name": "Born", "type": "datetime" }]
                },
                {
                    "name": "PersonMeta",
                    "members": [{
                        "name": "Born",
                        "type": "datetime",
                        "annotations": [{ "kind": "converter", "converter": "iso_datetime" }]
                    }]
                },
                { "name": "INamed", "kind": "interface" }
            ]
        }"#,
        );
        assert_eq!(result.status, FileStatus::Ok);
        assert!(result.diagnostics.is_empty());
    }

    #[test]
    fn lint_syntax_error() {
        let result = lint_str("{ not json }");
        assert_eq!(result.status, FileStatus::Error);
        assert!(result.diagnostics.iter().any(|d| d.code == "E001"));
    }

    #[test]
    fn lint_structure_error_has_path() {
        let result = lint_str(r#"{ "types": [{ "name": "A", "kind": "record" }] }"#);
        assert_eq!(result.status, FileStatus::Error);
        assert!(result
            .diagnostics
            .iter()
            .any(|d| d.code == "E001" && d.path == "/types/0/kind"));
    }

    #[test]
    fn lint_unknown_buddy() {
        let result = lint_str(
            r#"{ "types": [{ "name": "A", "annotations": [{ "kind": "buddy", "type": "Nope" }] }] }"#,
        );
        assert_eq!(result.status, FileStatus::Error);
        let diag = result.diagnostics.iter().find(|d| d.code == "E002").unwrap();
        assert_eq!(diag.path, "/types/0/annotations/0");
    }

    #[test]
    fn lint_unknown_interface_and_class_interface() {
        let result = lint_str(
            r#"{ "types": [
                { "name": "A", "interfaces": ["Missing", "B"] },
                { "name": "B" }
            ] }"#,
        );
        assert!(result
            .diagnostics
            .iter()
            .any(|d| d.code == "E003" && d.path == "/types/0/interfaces/0"));
        assert!(result
            .diagnostics
            .iter()
            .any(|d| d.code == "W001" && d.path == "/types/0/interfaces/1"));
    }

    #[test]
    fn lint_rejected_converter() {
        let result = lint_str(
            r#"{ "types": [{
                "name": "A",
                "members": [{
                    "name": "Label",
                    "type": "string",
                    "annotations": [{ "kind": "converter", "converter": "version" }]
                }]
            }] }"#,
        );
        assert_eq!(result.status, FileStatus::Error);
        assert!(result
            .diagnostics
            .iter()
            .any(|d| d.code == "E004" && d.path == "/types/0/members/0"));
    }

    #[test]
    fn lint_unknown_converter() {
        let result = lint_str(
            r#"{ "types": [{
                "name": "A",
                "annotations": [{ "kind": "converter", "converter": "mystery" }]
            }] }"#,
        );
        assert!(result
            .diagnostics
            .iter()
            .any(|d| d.code == "E004" && d.message.contains("mystery")));
    }

    #[test]
    fn lint_duplicate_member() {
        let result = lint_str(
            r#"{ "types": [{
                "name": "A",
                "members": [
                    { "name": "X", "type": "string" },
                    { "name": "X", "type": "int" }
                ]
            }] }"#,
        );
        assert!(result
            .diagnostics
            .iter()
            .any(|d| d.code == "E005" && d.path == "/types/0/members/1"));
    }

    #[test]
    fn lint_duplicate_member_with_rejected_converter() {
        let result = lint_str(
            r#"{ "types": [{
                "name": "A",
                "members": [
                    { "name": "X", "type": "string" },
                    {
                        "name": "X",
                        "type": "string",
                        "annotations": [{ "kind": "converter", "converter": "version" }]
                    }
                ]
            }] }"#,
        );
        assert!(result
            .diagnostics
            .iter()
            .any(|d| d.code == "E005" && d.path == "/types/0/members/1"));
        assert!(result
            .diagnostics
            .iter()
            .any(|d| d.code == "E004" && d.path == "/types/0/members/1"));
    }

    #[test]
    fn lint_type_converter_matches_type_name() {
        let result = lint_str(
            r#"{ "types": [{
                "name": "Version",
                "annotations": [{ "kind": "converter", "converter": "version" }]
            }] }"#,
        );
        assert_eq!(result.status, FileStatus::Ok);
    }

    #[test]
    fn lint_buddy_warnings() {
        let result = lint_str(
            r#"{ "types": [
                {
                    "name": "A",
                    "annotations": [{ "kind": "buddy", "type": "AMeta" }],
                    "members": [{ "name": "X", "type": "string" }]
                },
                {
                    "name": "AMeta",
                    "annotations": [{ "kind": "buddy", "type": "A" }],
                    "members": [{ "name": "Y", "type": "string" }]
                }
            ] }"#,
        );
        assert_eq!(result.status, FileStatus::Warning);
        assert!(result.diagnostics.iter().any(|d| d.code == "W002"));
        assert!(result
            .diagnostics
            .iter()
            .any(|d| d.code == "W003" && d.message.contains("AMeta.Y")));
    }

    #[test]
    fn lint_directory() {
        let dir = tempdir().unwrap();

        std::fs::write(dir.path().join("valid.json"), r#"{"types": [{"name": "A"}]}"#).unwrap();
        std::fs::write(dir.path().join("invalid.json"), "{ not json }").unwrap();

        let result = lint(dir.path(), false);
        assert_eq!(result.files_checked, 2);
        assert_eq!(result.passed, 1);
        assert_eq!(result.failed, 1);
        assert!(!result.is_ok());
    }

    #[test]
    fn lint_strict_mode() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("model.json");
        // Warning only: class listed as an interface
        std::fs::write(
            &file_path,
            r#"{"types": [{"name": "A", "interfaces": ["B"]}, {"name": "B"}]}"#,
        )
        .unwrap();

        let result = lint(&file_path, false);
        assert_eq!(result.files_checked, 1);
        assert_eq!(result.passed, 1);
        assert_eq!(result.failed, 0);

        let result = lint(&file_path, true);
        assert_eq!(result.passed, 0);
        assert_eq!(result.failed, 1);
    }
}
