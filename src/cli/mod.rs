//! Command-line surface for CI runs: execute test cases, generate spec
//! documents, import workspaces, export prompts. Exit code 0 when every
//! executed test passes, 1 otherwise, 2 on usage or IO errors.

use std::fs;
use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use crate::import_export::{self, ImportStrategy};
use crate::session::{EnvironmentTag, Session};
use crate::spec::{self, SpecDialect, SpecOptions};
use crate::storage;
use crate::testing::{self, RunReport};

#[derive(Debug, Parser)]
#[command(name = "bistool", version, about = "API test runner and spec generator")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run a session's test cases and store their verdicts
    Run {
        /// Workspace JSON file
        workspace: PathBuf,
        /// Session name or id
        #[arg(long)]
        session: String,
        /// Override the session's environment tag for this run
        #[arg(long)]
        env: Option<String>,
        /// Only re-run tests whose last verdict was fail
        #[arg(long)]
        failed: bool,
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
        /// Also write the JSON report to a file
        #[arg(long)]
        report: Option<PathBuf>,
    },
    /// Generate the YAML document for a session
    Spec {
        workspace: PathBuf,
        #[arg(long)]
        session: String,
        /// Output shape: 0.9.7.1, 2.0 or 3.0
        #[arg(long, default_value = "3.0")]
        dialect: String,
        /// Sample response body file; defaults to the session's most recent
        /// stored test response
        #[arg(long)]
        response: Option<PathBuf>,
        /// Write to a file instead of stdout
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Merge another workspace document into this one
    Import {
        workspace: PathBuf,
        incoming: PathBuf,
        /// additive, replace or manual
        #[arg(long, default_value = "additive")]
        strategy: String,
        /// Session ids to take (manual strategy)
        #[arg(long, value_delimiter = ',')]
        sessions: Vec<String>,
        /// Variable keys to take (manual strategy)
        #[arg(long, value_delimiter = ',')]
        vars: Vec<String>,
    },
    /// Print the AI-prompt export for a session
    Prompt {
        workspace: PathBuf,
        #[arg(long)]
        session: String,
    },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

pub async fn execute(cli: Cli) -> Result<i32, String> {
    match cli.command {
        Command::Run {
            workspace,
            session,
            env,
            failed,
            format,
            report,
        } => run_command(workspace, session, env, failed, format, report).await,
        Command::Spec {
            workspace,
            session,
            dialect,
            response,
            output,
        } => spec_command(workspace, session, dialect, response, output),
        Command::Import {
            workspace,
            incoming,
            strategy,
            sessions,
            vars,
        } => import_command(workspace, incoming, strategy, sessions, vars),
        Command::Prompt { workspace, session } => prompt_command(workspace, session),
    }
}

async fn run_command(
    path: PathBuf,
    session_name: String,
    env: Option<String>,
    failed: bool,
    format: OutputFormat,
    report_path: Option<PathBuf>,
) -> Result<i32, String> {
    let mut workspace = storage::load_workspace(&path)?;
    let globals = workspace.global_variables.clone();
    let session = workspace
        .find_session_mut(&session_name)
        .ok_or_else(|| format!("No session named `{session_name}`"))?;

    if let Some(tag) = env {
        session.url_data.environment = EnvironmentTag::parse(&tag)
            .ok_or_else(|| format!("Unknown environment `{tag}`"))?;
    }

    let report = testing::run_tests(session, &globals, failed).await;
    storage::save_workspace(&path, &workspace)?;

    if let Some(report_path) = report_path {
        let raw = serde_json::to_string_pretty(&report)
            .map_err(|e| format!("Failed to serialize report: {e}"))?;
        fs::write(&report_path, raw)
            .map_err(|e| format!("Failed to write report file `{}`: {e}", report_path.display()))?;
    }

    match format {
        OutputFormat::Text => print!("{}", report_text(&report)),
        OutputFormat::Json => {
            let raw = serde_json::to_string_pretty(&report)
                .map_err(|e| format!("Failed to serialize report: {e}"))?;
            println!("{raw}");
        }
    }

    Ok(if report.failed > 0 { 1 } else { 0 })
}

fn spec_command(
    path: PathBuf,
    session_name: String,
    dialect: String,
    response: Option<PathBuf>,
    output: Option<PathBuf>,
) -> Result<i32, String> {
    let dialect = SpecDialect::parse(&dialect)
        .ok_or_else(|| format!("Unknown dialect `{dialect}` (expected 0.9.7.1, 2.0 or 3.0)"))?;

    let mut workspace = storage::load_workspace(&path)?;
    let session = workspace
        .find_session_mut(&session_name)
        .ok_or_else(|| format!("No session named `{session_name}`"))?;

    let body = match response {
        Some(file) => fs::read_to_string(&file)
            .map_err(|e| format!("Failed to read response file `{}`: {e}", file.display()))?,
        None => latest_response(session)
            .ok_or_else(|| {
                "No stored test response to infer from; run tests first or pass --response"
                    .to_string()
            })?
            .to_string(),
    };

    let yaml = spec::generate(&body, session, &SpecOptions { dialect });
    session.generated_yaml = yaml.clone();
    storage::save_workspace(&path, &workspace)?;

    match output {
        Some(file) => fs::write(&file, &yaml)
            .map_err(|e| format!("Failed to write spec file `{}`: {e}", file.display()))?,
        None => print!("{yaml}"),
    }
    Ok(0)
}

fn import_command(
    path: PathBuf,
    incoming_path: PathBuf,
    strategy: String,
    sessions: Vec<String>,
    vars: Vec<String>,
) -> Result<i32, String> {
    let strategy = parse_strategy(&strategy, sessions, vars)?;

    let mut workspace = storage::load_workspace(&path)?;
    let raw = fs::read_to_string(&incoming_path)
        .map_err(|e| format!("Failed to read import file `{}`: {e}", incoming_path.display()))?;
    let incoming = serde_json::from_str(&raw)
        .map_err(|e| format!("Failed to parse import file `{}`: {e}", incoming_path.display()))?;

    import_export::merge_workspace(&mut workspace, incoming, &strategy);
    storage::save_workspace(&path, &workspace)?;

    println!(
        "Imported: {} sessions, {} variables",
        workspace.saved_sessions.len(),
        workspace.global_variables.len()
    );
    Ok(0)
}

fn prompt_command(path: PathBuf, session_name: String) -> Result<i32, String> {
    let workspace = storage::load_workspace(&path)?;
    let session = workspace
        .find_session(&session_name)
        .ok_or_else(|| format!("No session named `{session_name}`"))?;
    print!("{}", import_export::ai_prompt(session));
    Ok(0)
}

fn parse_strategy(
    name: &str,
    sessions: Vec<String>,
    vars: Vec<String>,
) -> Result<ImportStrategy, String> {
    match name {
        "additive" => Ok(ImportStrategy::Additive),
        "replace" => Ok(ImportStrategy::Replace),
        "manual" => {
            if sessions.is_empty() && vars.is_empty() {
                return Err(
                    "Manual strategy needs --sessions and/or --vars selections".to_string()
                );
            }
            Ok(ImportStrategy::Manual {
                session_ids: sessions,
                variable_keys: vars,
            })
        }
        other => Err(format!(
            "Unknown strategy `{other}` (expected additive, replace or manual)"
        )),
    }
}

/// Most recent stored response: the last test in the list that has one.
fn latest_response(session: &Session) -> Option<&str> {
    session
        .tests
        .iter()
        .rev()
        .find_map(|test| {
            test.server_response
                .as_deref()
                .filter(|body| !body.is_empty())
        })
}

fn report_text(report: &RunReport) -> String {
    let mut out = String::new();
    for outcome in &report.outcomes {
        let label = match outcome.verdict {
            crate::session::TestVerdict::Pass => "PASS",
            crate::session::TestVerdict::Fail => "FAIL",
        };
        out.push_str(&format!("[{label}] {} ({})\n", outcome.test_name, outcome.status));
    }
    out.push_str(&format!(
        "\n{} passed, {} failed ({} ms)\n",
        report.passed, report.failed, report.duration_ms
    ));
    out
}
