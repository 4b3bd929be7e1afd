//! tatari-pre-commit - pre-commit hooks for Tatari repositories
//!
//! One subcommand per hook id in `.pre-commit-hooks.yaml`.

use anyhow::Result;
use clap::error::ErrorKind;
use clap::{ArgAction, Args, CommandFactory, FromArgMatches, Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use tatari_hooks::constraints::{self, ConstraintOptions, Policy};
use tatari_hooks::disallowed::{self, Identifier};
use tatari_hooks::generated_columns::{self, Cutoff};
use tatari_hooks::gitleaks::{self, GitleaksOptions};
use tatari_hooks::hardcoded_buckets::{self, BucketOptions};
use tatari_hooks::python::DisallowList;
use tatari_hooks::{
    boto3_dags, branch_name, dockerfile_poetry, forbidden_imports, image_tag_branch,
    spark_buckets, HookReport,
};
use tatari_hooks_cli::output::{format_count, Status};
use tatari_hooks_core::config::{Config, ConfigSchema};
use tatari_hooks_core::error::{exit_codes, Error};
use tatari_hooks_telemetry::Timer;

#[derive(Parser)]
#[command(name = "tatari-pre-commit")]
#[command(about = "Pre-commit hooks for Tatari repositories")]
#[command(version)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to .tatari-hooks.toml (default: nearest one above the current directory)
    #[arg(long, global = true, env = "TATARI_HOOKS_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Files handed over by pre-commit
#[derive(Args, Debug)]
struct Files {
    #[arg(value_name = "FILE")]
    files: Vec<PathBuf>,
}

#[derive(Args, Debug)]
struct ConstraintArgs {
    /// Dependencies exempt from the check
    #[arg(long, num_args = 1.., value_delimiter = ',')]
    ignore: Vec<String>,

    /// Manifest to check (default: nearest pyproject.toml above the current directory)
    #[arg(long)]
    pyproject: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum IdentifierArg {
    Function,
    Attribute,
}

impl From<IdentifierArg> for Identifier {
    fn from(arg: IdentifierArg) -> Self {
        match arg {
            IdentifierArg::Function => Identifier::Function,
            IdentifierArg::Attribute => Identifier::Attribute,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Flag imports of forbidden classes or modules
    ForbiddenImports {
        #[arg(long, alias = "forbidden_classes", num_args = 1.., value_delimiter = ',')]
        forbidden_classes: Vec<String>,
        #[command(flatten)]
        files: Files,
    },

    /// Flag calls to disallowed functions and suggest replacements
    DisallowedFunctionCalls {
        #[arg(long, num_args = 1.., value_delimiter = ',', required = true)]
        disallowed_function_calls: Vec<String>,
        #[arg(long, num_args = 1.., value_delimiter = ',', required = true)]
        replacement_function_calls: Vec<String>,
        #[command(flatten)]
        files: Files,
    },

    /// Flag disallowed attribute accesses and suggest replacements
    DisallowedAttributes {
        #[arg(long, num_args = 1.., value_delimiter = ',', required = true)]
        disallowed_attributes: Vec<String>,
        #[arg(long, num_args = 1.., value_delimiter = ',', required = true)]
        replacement_attributes: Vec<String>,
        #[command(flatten)]
        files: Files,
    },

    /// Flag disallowed functions or attributes
    DisallowedIdentifiers {
        #[arg(long, value_enum)]
        identifier: IdentifierArg,
        #[arg(long, num_args = 1.., value_delimiter = ',', required = true)]
        disallowed: Vec<String>,
        #[arg(long, num_args = 1.., value_delimiter = ',', required = true)]
        replacements: Vec<String>,
        #[command(flatten)]
        files: Files,
    },

    /// Flag image_tag/branch arguments to Databricks operators
    ImageTagBranchConstraint {
        #[command(flatten)]
        files: Files,
    },

    /// Flag direct boto3 imports in Airflow DAG files
    NoBoto3InAirflowDags {
        #[command(flatten)]
        files: Files,
    },

    /// Flag hardcoded S3 bucket names
    NoHardcodedBuckets {
        /// Print violations but exit 0
        #[arg(long)]
        warn_only: bool,
        /// Print a suggested fix under each violation
        #[arg(long)]
        suggest: bool,
        /// Also flag hardcoded AWS region strings
        #[arg(long, conflicts_with = "no_regions")]
        check_regions: bool,
        /// Never flag region strings, even if enabled in config
        #[arg(long)]
        no_regions: bool,
        #[command(flatten)]
        files: Files,
    },

    /// Flag non-Spark bucket helpers in Spark projects
    NoNonSparkBucketsInSparkProjects {
        #[command(flatten)]
        files: Files,
    },

    /// Require a pinned poetry version in Dockerfiles
    DockerfilePoetry {
        #[command(flatten)]
        files: Files,
    },

    /// Reject generated columns in new SQL migrations
    DoNotSupportGeneratedColumns {
        /// Migrations dated on or after this YYYYMMDD prefix are checked
        #[arg(long, default_value = generated_columns::DEFAULT_CUTOFF)]
        cutoff_date: String,
        #[command(flatten)]
        files: Files,
    },

    /// Validate the current branch name
    ValidateBranchName {
        /// Branch to validate (default: resolved from git)
        #[arg(long, env = "GITHUB_REF_NAME")]
        branch: Option<String>,
        /// Allowed branch types; enables the {type}/{TICKET-ID}-{slug} rule
        #[arg(long, num_args = 1.., value_delimiter = ',')]
        types: Option<Vec<String>>,
        #[arg(long)]
        max_length: Option<usize>,
    },

    /// Poetry applications: python must use ~
    PoetryAppConstraints(ConstraintArgs),

    /// Poetry packages: python ^/>=, dependencies >= without <=
    PoetryPkgConstraints(ConstraintArgs),

    /// Poetry packages: python and dependencies ^/>=
    PoetryPkgDepConstraints(ConstraintArgs),

    /// uv applications: requires-python and dependencies use ~=
    AppConstraints(ConstraintArgs),

    /// uv packages: requires-python >=/~=, dependencies >= without <=
    PkgConstraints(ConstraintArgs),

    /// Scan staged changes with a pinned, verified gitleaks
    Gitleaks {
        /// Cache root for the downloaded binary
        #[arg(long, env = "TATARI_HOOKS_CACHE_DIR")]
        cache_dir: Option<PathBuf>,
        /// gitleaks release to use instead of the configured one
        #[arg(long)]
        gitleaks_version: Option<String>,
        /// sha256 of the release archive for this platform
        #[arg(long)]
        checksum: Option<String>,
        /// Extra arguments passed to gitleaks
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },
}

fn main() -> Result<()> {
    let matches = Cli::command()
        .try_get_matches()
        .unwrap_or_else(|err| exit_on_usage_error(err));
    let hook = matches
        .subcommand_name()
        .unwrap_or("tatari-pre-commit")
        .to_string();
    let cli = Cli::from_arg_matches(&matches).unwrap_or_else(|err| exit_on_usage_error(err));

    tatari_hooks_telemetry::init(cli.verbose)?;

    let report = load_and_run(cli.command, cli.config.as_deref(), &hook);
    report.print();
    summarize(&hook, &report, cli.verbose);
    std::process::exit(report.exit_code());
}

/// A config that fails to load is reported like any other tooling error
fn load_and_run(command: Commands, config_path: Option<&Path>, hook: &str) -> HookReport {
    match Config::load(config_path) {
        Ok(config) => {
            let timer = Timer::start(hook);
            let report = run(command, &config.schema);
            timer.stop();
            report
        }
        Err(err) => failed(err),
    }
}

/// Exit code for a rejected command line; `None` for help and version output
fn usage_exit_code(kind: ErrorKind) -> Option<i32> {
    match kind {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => None,
        _ => Some(exit_codes::FAILURE),
    }
}

fn exit_on_usage_error(err: clap::Error) -> ! {
    match usage_exit_code(err.kind()) {
        None => err.exit(),
        Some(code) => {
            let _ = err.print();
            std::process::exit(code)
        }
    }
}

fn summarize(hook: &str, report: &HookReport, verbose: u8) {
    let found = format_count(report.violations.len(), "violation", "violations");
    if !report.errors.is_empty() {
        Status::error(&format!(
            "{}: {}",
            hook,
            format_count(report.errors.len(), "error", "errors")
        ));
    } else if !report.violations.is_empty() && report.warn_only {
        Status::warning(&format!("{}: {} (warn only)", hook, found));
    } else if !report.violations.is_empty() {
        Status::error(&format!("{}: {}", hook, found));
    } else if verbose > 0 {
        Status::success(&format!("{}: passed", hook));
    }
}

fn failed(err: Error) -> HookReport {
    let mut report = HookReport::new();
    report.push_error(err);
    report
}

fn disallow_hook(files: &Files, identifier: Identifier, targets: &[String], replacements: &[String]) -> HookReport {
    match DisallowList::from_pairs(targets, replacements) {
        Ok(list) => disallowed::run(&files.files, identifier, &list),
        Err(err) => failed(err),
    }
}

fn constraint(policy: Policy, args: ConstraintArgs) -> HookReport {
    constraints::run(&ConstraintOptions {
        policy,
        ignore: args.ignore,
        pyproject: args.pyproject,
    })
}

fn run(command: Commands, schema: &ConfigSchema) -> HookReport {
    match command {
        Commands::ForbiddenImports {
            forbidden_classes,
            files,
        } => forbidden_imports::run(&files.files, &forbidden_classes),
        Commands::DisallowedFunctionCalls {
            disallowed_function_calls,
            replacement_function_calls,
            files,
        } => disallow_hook(
            &files,
            Identifier::Function,
            &disallowed_function_calls,
            &replacement_function_calls,
        ),
        Commands::DisallowedAttributes {
            disallowed_attributes,
            replacement_attributes,
            files,
        } => disallow_hook(
            &files,
            Identifier::Attribute,
            &disallowed_attributes,
            &replacement_attributes,
        ),
        Commands::DisallowedIdentifiers {
            identifier,
            disallowed: targets,
            replacements,
            files,
        } => disallow_hook(&files, identifier.into(), &targets, &replacements),
        Commands::ImageTagBranchConstraint { files } => image_tag_branch::run(&files.files),
        Commands::NoBoto3InAirflowDags { files } => boto3_dags::run(&files.files),
        Commands::NoHardcodedBuckets {
            warn_only,
            suggest,
            check_regions,
            no_regions,
            files,
        } => {
            let base = BucketOptions::from_config(&schema.buckets);
            let options = BucketOptions {
                check_regions: (base.check_regions || check_regions) && !no_regions,
                suggest: base.suggest || suggest,
                warn_only,
            };
            hardcoded_buckets::run(&files.files, &options)
        }
        Commands::NoNonSparkBucketsInSparkProjects { files } => spark_buckets::run(&files.files),
        Commands::DockerfilePoetry { files } => dockerfile_poetry::run(&files.files),
        Commands::DoNotSupportGeneratedColumns { cutoff_date, files } => match Cutoff::new(&cutoff_date) {
            Ok(cutoff) => generated_columns::run(&files.files, &cutoff),
            Err(err) => failed(err),
        },
        Commands::ValidateBranchName {
            branch,
            types,
            max_length,
        } => match branch_name::rules_with_overrides(&schema.branch_name, types.as_deref(), max_length) {
            Ok(rules) => branch_name::run(branch.as_deref(), &rules),
            Err(err) => failed(err),
        },
        Commands::PoetryAppConstraints(args) => constraint(Policy::PoetryApp, args),
        Commands::PoetryPkgConstraints(args) => constraint(Policy::PoetryPkg, args),
        Commands::PoetryPkgDepConstraints(args) => constraint(Policy::PoetryPkgDep, args),
        Commands::AppConstraints(args) => constraint(Policy::UvApp, args),
        Commands::PkgConstraints(args) => constraint(Policy::UvPkg, args),
        Commands::Gitleaks {
            cache_dir,
            gitleaks_version,
            checksum,
            args,
        } => gitleaks::run(
            &schema.gitleaks,
            &GitleaksOptions {
                cache_dir,
                version: gitleaks_version,
                checksum,
                extra_args: args,
            },
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tatari_hooks_core::error::ErrorCode;

    const HOOKS_YAML: &str = include_str!("../../../.pre-commit-hooks.yaml");

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).unwrap()
    }

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_every_registered_hook_has_a_subcommand() {
        let entries: Vec<&str> = HOOKS_YAML
            .lines()
            .filter_map(|line| line.trim().strip_prefix("entry: tatari-pre-commit "))
            .collect();
        assert_eq!(entries.len(), 17);

        let command = Cli::command();
        for id in entries {
            let id = id.split_whitespace().next().unwrap();
            assert!(command.find_subcommand(id).is_some(), "no subcommand for {}", id);
        }
    }

    #[test]
    fn test_disallow_lists_accept_commas_and_spaces() {
        let cli = parse(&[
            "tatari-pre-commit",
            "disallowed-function-calls",
            "--disallowed-function-calls",
            "os.system,subprocess.call",
            "--replacement-function-calls",
            "run",
            "run",
            "--",
            "a.py",
        ]);
        match cli.command {
            Commands::DisallowedFunctionCalls {
                disallowed_function_calls,
                replacement_function_calls,
                files,
            } => {
                assert_eq!(disallowed_function_calls, vec!["os.system", "subprocess.call"]);
                assert_eq!(replacement_function_calls, vec!["run", "run"]);
                assert_eq!(files.files, vec![PathBuf::from("a.py")]);
            }
            _ => panic!("wrong subcommand"),
        }
    }

    #[test]
    fn test_forbidden_classes_underscore_alias() {
        let cli = parse(&[
            "tatari-pre-commit",
            "forbidden-imports",
            "--forbidden_classes",
            "pandas.DataFrame",
            "--",
            "a.py",
            "b.py",
        ]);
        match cli.command {
            Commands::ForbiddenImports {
                forbidden_classes,
                files,
            } => {
                assert_eq!(forbidden_classes, vec!["pandas.DataFrame"]);
                assert_eq!(files.files.len(), 2);
            }
            _ => panic!("wrong subcommand"),
        }
    }

    #[test]
    fn test_usage_errors_exit_with_failure() {
        let missing_identifier = Cli::try_parse_from([
            "tatari-pre-commit",
            "disallowed-identifiers",
            "--disallowed",
            "a",
            "--replacements",
            "b",
            "--",
            "x.py",
        ])
        .err()
        .unwrap();
        assert_eq!(missing_identifier.kind(), ErrorKind::MissingRequiredArgument);
        assert_eq!(usage_exit_code(missing_identifier.kind()), Some(exit_codes::FAILURE));

        let unknown_flag = Cli::try_parse_from(["tatari-pre-commit", "forbidden-imports", "--bogus"])
            .err()
            .unwrap();
        assert_eq!(usage_exit_code(unknown_flag.kind()), Some(exit_codes::FAILURE));
    }

    #[test]
    fn test_malformed_config_is_error_report() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".tatari-hooks.toml");
        std::fs::write(&path, "[buckets\nsuggest = ").unwrap();

        let cli = parse(&["tatari-pre-commit", "dockerfile-poetry"]);
        let report = load_and_run(cli.command, Some(path.as_path()), "dockerfile-poetry");
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].code, ErrorCode::ConfigError);
        assert_eq!(report.exit_code(), exit_codes::FAILURE);
    }

    #[test]
    fn test_help_and_version_are_not_failures() {
        for flag in ["--help", "--version"] {
            let err = Cli::try_parse_from(["tatari-pre-commit", flag]).err().unwrap();
            assert_eq!(usage_exit_code(err.kind()), None, "{}", flag);
        }
    }

    #[test]
    fn test_region_flags_conflict() {
        assert!(Cli::try_parse_from([
            "tatari-pre-commit",
            "no-hardcoded-buckets",
            "--check-regions",
            "--no-regions",
        ])
        .is_err());
    }

    #[test]
    fn test_mismatched_replacements_is_error_report() {
        let cli = parse(&[
            "tatari-pre-commit",
            "disallowed-identifiers",
            "--identifier",
            "attribute",
            "--disallowed",
            "a.b",
            "c.d",
            "--replacements",
            "e",
        ]);
        let report = run(cli.command, &ConfigSchema::default());
        assert_eq!(report.errors.len(), 1);
        assert!(report.errors[0].message.contains("Number of replacements"));
        assert_eq!(report.exit_code(), 1);
    }

    #[test]
    fn test_gitleaks_trailing_args() {
        let cli = parse(&[
            "tatari-pre-commit",
            "gitleaks",
            "--checksum",
            "abc",
            "--",
            "--log-level",
            "debug",
        ]);
        match cli.command {
            Commands::Gitleaks { args, checksum, .. } => {
                assert_eq!(checksum.as_deref(), Some("abc"));
                assert_eq!(args, vec!["--log-level", "debug"]);
            }
            _ => panic!("wrong subcommand"),
        }
    }

    #[test]
    fn test_branch_name_from_flag() {
        let cli = parse(&[
            "tatari-pre-commit",
            "validate-branch-name",
            "--branch",
            "feature/AB-123-add-thing",
            "--types",
            "feature,bugfix,hotfix",
        ]);
        let report = run(cli.command, &ConfigSchema::default());
        assert!(report.is_clean());
    }
}
