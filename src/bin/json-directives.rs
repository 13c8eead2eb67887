//! JSON Directives CLI
//!
//! Command-line interface for resolving and linting serialization directives.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use json_directives::{
    get_accessor_factory, lint, load_model, supports_dynamic_code_generation, AccessorStrategy,
    ConfigurationError, ContainerAnnotation, DirectiveResolver, FileStatus, MemberDescriptor,
    MemberPredicates, MemberSerializationMode, ModelError, ResolverOptions, Severity,
    TypeDescriptor, TypeKind,
};
use serde::Serialize;

#[derive(Parser)]
#[command(name = "json-directives")]
#[command(about = "Resolve and lint JSON serialization directives")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve the directives in effect for a type
    Resolve {
        /// Model file
        model: PathBuf,

        /// Type to resolve
        #[arg(long = "type", short = 't')]
        type_name: String,

        /// Only report this member
        #[arg(long, short)]
        member: Option<String>,

        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,

        /// Resolve as if the buddy-type extension were not installed
        #[arg(long)]
        no_buddy_extension: bool,

        /// Disable the opt-in default for contract-marked types
        #[arg(long)]
        no_contract_opt_in: bool,
    },

    /// Lint model files for errors (syntax, unknown types, bad converters)
    Lint {
        /// File or directory to lint
        path: PathBuf,

        /// Output format: text (default) or json
        #[arg(long, default_value = "text")]
        format: String,

        /// Treat warnings as errors
        #[arg(long)]
        strict: bool,

        /// Suppress progress output, only show errors
        #[arg(long, short)]
        quiet: bool,
    },

    /// Report whether compiled accessors are available in this environment
    Capabilities {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Resolve {
            model,
            type_name,
            member,
            pretty,
            no_buddy_extension,
            no_contract_opt_in,
        } => {
            let options = ResolverOptions::new()
                .buddy_extension(!no_buddy_extension)
                .contract_opt_in(!no_contract_opt_in);
            run_resolve(&model, &type_name, member.as_deref(), pretty, options)
        }

        Commands::Lint {
            path,
            format,
            strict,
            quiet,
        } => run_lint(&path, &format, strict, quiet),

        Commands::Capabilities { json } => run_capabilities(json),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(code) => ExitCode::from(code),
    }
}

#[derive(Serialize)]
struct TypeReport {
    #[serde(rename = "type")]
    type_name: String,
    kind: TypeKind,
    buddy_type: Option<String>,
    member_serialization: MemberSerializationMode,
    container: Option<ContainerAnnotation>,
    converter: Option<String>,
    members: Vec<MemberReport>,
}

#[derive(Serialize)]
struct MemberReport {
    name: String,
    serialized_name: String,
    #[serde(rename = "type")]
    value_type: String,
    included: bool,
    required: bool,
    converter: Option<String>,
    #[serde(flatten)]
    predicates: MemberPredicates,
}

fn run_resolve(
    model_path: &Path,
    type_name: &str,
    member: Option<&str>,
    pretty: bool,
    options: ResolverOptions,
) -> Result<(), u8> {
    let model = load_model(model_path).map_err(|e| {
        eprintln!("Error: {}", e);
        e.exit_code() as u8
    })?;

    let resolver = DirectiveResolver::with_options(Arc::new(model), options);
    let ty = resolver.model().require(type_name).map_err(|e| {
        eprintln!("Error: {}", e);
        e.exit_code() as u8
    })?;

    let report = build_report(&resolver, ty, member).map_err(|e| {
        eprintln!("Error: {}", e);
        e.exit_code() as u8
    })?;

    let json_output = if pretty {
        serde_json::to_string_pretty(&report)
    } else {
        serde_json::to_string(&report)
    }
    .map_err(|e| {
        eprintln!("Error serializing output: {}", e);
        2u8
    })?;

    println!("{}", json_output);
    Ok(())
}

/// Errors surfaced while building a report, carrying their exit code.
enum ReportError {
    Model(ModelError),
    Configuration(ConfigurationError),
}

impl std::fmt::Display for ReportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReportError::Model(e) => e.fmt(f),
            ReportError::Configuration(e) => e.fmt(f),
        }
    }
}

impl ReportError {
    fn exit_code(&self) -> i32 {
        match self {
            ReportError::Model(e) => e.exit_code(),
            ReportError::Configuration(e) => e.exit_code(),
        }
    }
}

fn build_report(
    resolver: &DirectiveResolver,
    ty: &TypeDescriptor,
    member: Option<&str>,
) -> Result<TypeReport, ReportError> {
    let members: Vec<&MemberDescriptor> = match member {
        Some(name) => {
            let found = ty.find_member(name).ok_or_else(|| {
                ReportError::Model(ModelError::UnknownMember {
                    type_name: ty.name.clone(),
                    member: name.to_string(),
                })
            })?;
            vec![found]
        }
        None => ty.members.iter().collect(),
    };

    let converter = resolver
        .get_converter(ty, &ty.name)
        .map_err(ReportError::Configuration)?
        .map(|c| c.name().to_string());

    let mut member_reports = Vec::with_capacity(members.len());
    for m in members {
        let member_converter = resolver
            .get_member_converter(m)
            .map_err(ReportError::Configuration)?
            .map(|c| c.name().to_string());

        member_reports.push(MemberReport {
            name: m.name.clone(),
            serialized_name: resolver.serialized_name(m),
            value_type: m.value_type.clone(),
            included: resolver.is_member_included(m),
            required: resolver.is_member_required(m),
            converter: member_converter,
            predicates: resolver.member_predicates(m),
        });
    }

    Ok(TypeReport {
        type_name: ty.name.clone(),
        kind: ty.kind,
        buddy_type: resolver.get_buddy_type(ty).map(|b| b.name.clone()),
        member_serialization: resolver.get_object_member_serialization_mode(ty),
        container: resolver.get_container_annotation(ty),
        converter,
        members: member_reports,
    })
}

#[derive(Serialize)]
struct CapabilityReport {
    dynamic_code_generation: bool,
    accessor_factory: AccessorStrategy,
}

fn run_capabilities(json_output: bool) -> Result<(), u8> {
    let report = CapabilityReport {
        dynamic_code_generation: supports_dynamic_code_generation(),
        accessor_factory: get_accessor_factory().strategy(),
    };

    if json_output {
        let output = serde_json::to_string(&report).map_err(|e| {
            eprintln!("Error serializing output: {}", e);
            2u8
        })?;
        println!("{}", output);
    } else {
        println!(
            "dynamic code generation: {}",
            if report.dynamic_code_generation {
                "available"
            } else {
                "unavailable"
            }
        );
        let strategy = match report.accessor_factory {
            AccessorStrategy::Compiled => "compiled",
            AccessorStrategy::Reflective => "reflective",
        };
        println!("accessor factory: {}", strategy);
    }
    Ok(())
}

fn run_lint(path: &Path, format: &str, strict: bool, quiet: bool) -> Result<(), u8> {
    if !path.exists() {
        eprintln!("Error: path not found: {}", path.display());
        return Err(2);
    }

    let result = lint(path, strict);

    if format == "json" {
        let output = serde_json::to_string_pretty(&result).map_err(|e| {
            eprintln!("Error serializing output: {}", e);
            2u8
        })?;
        println!("{}", output);
    } else {
        if !quiet {
            println!("Linting {} ...\n", path.display());
        }

        for file_result in &result.results {
            let status_icon = match file_result.status {
                FileStatus::Ok => "\x1b[32m✓\x1b[0m",
                FileStatus::Warning => "\x1b[33m⚠\x1b[0m",
                FileStatus::Error => "\x1b[31m✗\x1b[0m",
            };

            if !quiet || file_result.status != FileStatus::Ok {
                println!("  {} {}", status_icon, file_result.file.display());
            }

            for diag in &file_result.diagnostics {
                let (color, label) = match diag.severity {
                    Severity::Error => ("\x1b[31m", "error"),
                    Severity::Warning => ("\x1b[33m", "warning"),
                };
                if !quiet || diag.severity == Severity::Error {
                    println!(
                        "    {}{}[{}]\x1b[0m: {} - {}",
                        color, label, diag.code, diag.path, diag.message
                    );
                }
            }
        }

        println!();
        if result.is_ok() && (!strict || result.warnings == 0) {
            println!(
                "\x1b[32m✓ {} files checked, all passed\x1b[0m",
                result.files_checked
            );
        } else {
            println!(
                "\x1b[31m✗ {} files checked: {} passed, {} failed ({} errors, {} warnings)\x1b[0m",
                result.files_checked, result.passed, result.failed, result.errors, result.warnings
            );
        }
    }

    if result.is_ok() && (!strict || result.warnings == 0) {
        Ok(())
    } else {
        Err(1)
    }
}
