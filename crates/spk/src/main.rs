#![forbid(unsafe_code)]

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::Value;
use tracing_subscriber::EnvFilter;

use stackpick_core::config::{self, WorkspaceConfig};
use stackpick_core::project::{load_project, ProjectDefinition};
use stackpick_core::recipe::DeploymentType;
use stackpick_core::recommendation::{Recommendation, SettingSource};
use stackpick_engine::{RecommendationEngine, TestRegistry};

#[derive(Parser)]
#[command(
    name = "spk",
    version,
    about = "Pick deployment recipes for a project. Unix-friendly."
)]
struct Cli {
    #[command(subcommand)]
    cmd: Cmd,

    /// Recipe directory (repeatable). Searched before the workspace config paths.
    #[arg(long = "recipes", value_name = "DIR", global = true)]
    recipe_dirs: Vec<PathBuf>,

    /// Output JSON.
    #[arg(long, global = true)]
    json: bool,

    /// Log debug events to stderr.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Extra replacement token for option defaults, e.g. "{Stage}=prod" (repeatable).
    #[arg(
        long = "replace",
        value_name = "TOKEN=VALUE",
        value_parser = parse_key_value,
        global = true
    )]
    replacements: Vec<(String, String)>,

    /// Give up on a recommendation run after this many seconds.
    #[arg(long, value_name = "SECS", global = true)]
    timeout_secs: Option<u64>,
}

#[derive(Subcommand)]
enum Cmd {
    /// Rank the recipes that apply to a project.
    Recommend {
        /// Path to a project description (.json).
        project: PathBuf,
    },

    /// List loaded recipes in load order.
    Recipes,

    /// Validate recipe files: schema, test types, lint.
    Check {
        /// One or more .recipe file paths.
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Fail on warnings (not just errors).
        #[arg(long)]
        strict: bool,
    },

    /// Show the option settings of a recommended recipe.
    Settings {
        /// Path to a project description (.json).
        project: PathBuf,

        /// Recipe id to inspect.
        #[arg(long)]
        recipe: String,

        /// Settings saved by an earlier deployment (.json object).
        #[arg(long)]
        previous: Option<PathBuf>,

        /// Override a setting (repeatable). The value is parsed as JSON, else taken as a string.
        #[arg(long = "set", value_name = "ID=VALUE", value_parser = parse_key_value)]
        overrides: Vec<(String, String)>,
    },

    /// Bootstrap a workspace (.stackpick/config.json).
    Init {
        /// Overwrite an existing config.
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match &cli.cmd {
        Cmd::Recommend { project } => cmd_recommend(&cli, project).await,

        Cmd::Recipes => cmd_recipes(&cli),

        Cmd::Check { files, strict } => cmd_check(files, *strict, cli.json),

        Cmd::Settings {
            project,
            recipe,
            previous,
            overrides,
        } => cmd_settings(&cli, project, recipe, previous.as_deref(), overrides).await,

        Cmd::Init { force } => cmd_init(*force),
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn parse_key_value(s: &str) -> std::result::Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got \"{s}\""))?;
    if key.is_empty() {
        return Err(format!("empty key in \"{s}\""));
    }
    Ok((key.to_string(), value.to_string()))
}

// ── Workspace ───────────────────────────────────────────────────

/// Recipe directories and replacement tokens after merging CLI flags with
/// the workspace config. CLI directories come first; CLI tokens win.
struct Workspace {
    recipe_dirs: Vec<PathBuf>,
    replacements: HashMap<String, String>,
}

impl Workspace {
    fn resolve(cli: &Cli) -> Result<Self> {
        let cwd = std::env::current_dir().context("cannot determine current directory")?;
        let config = config::load_workspace_config(&cwd)?.unwrap_or_default();

        let mut recipe_dirs = cli.recipe_dirs.clone();
        recipe_dirs.extend(config.recipe_paths);
        if recipe_dirs.is_empty() {
            bail!(
                "no recipe directories: pass --recipes <DIR> or set recipePaths in {}",
                Path::new(config::CONFIG_DIR).join(config::CONFIG_FILE).display()
            );
        }

        let mut replacements = config.replacements;
        replacements.extend(cli.replacements.iter().cloned());

        Ok(Self {
            recipe_dirs,
            replacements,
        })
    }

    fn engine(&self) -> Result<RecommendationEngine> {
        RecommendationEngine::load(&self.recipe_dirs, TestRegistry::with_builtins())
            .context("failed to load recipes")
    }

    async fn compute(
        &self,
        engine: &RecommendationEngine,
        project: &ProjectDefinition,
        timeout_secs: Option<u64>,
    ) -> Result<Vec<Recommendation>> {
        let run = engine.compute_recommendations(project, Some(self.replacements.clone()));
        let recommendations = match timeout_secs {
            Some(secs) => tokio::time::timeout(Duration::from_secs(secs), run)
                .await
                .map_err(|_| anyhow!("recommendation timed out after {secs}s"))??,
            None => run.await?,
        };
        Ok(recommendations)
    }
}

// ── Commands ────────────────────────────────────────────────────

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RecommendationRow<'a> {
    recipe_id: &'a str,
    name: &'a str,
    priority: i32,
    target_service: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    deployment_type: Option<DeploymentType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    short_description: Option<&'a str>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RecommendReport<'a> {
    project: String,
    computed_at: DateTime<Utc>,
    recommendations: Vec<RecommendationRow<'a>>,
}

async fn cmd_recommend(cli: &Cli, project_file: &Path) -> Result<()> {
    let workspace = Workspace::resolve(cli)?;
    let engine = workspace.engine()?;
    let project = load_project(project_file)?;
    let recommendations = workspace
        .compute(&engine, &project, cli.timeout_secs)
        .await?;

    if cli.json {
        let report = RecommendReport {
            project: project.project_path.display().to_string(),
            computed_at: Utc::now(),
            recommendations: recommendations
                .iter()
                .map(|r| {
                    let recipe = r.recipe();
                    RecommendationRow {
                        recipe_id: &recipe.id,
                        name: &recipe.name,
                        priority: r.computed_priority(),
                        target_service: &recipe.target_service,
                        deployment_type: recipe.deployment_type,
                        short_description: recipe.short_description.as_deref(),
                    }
                })
                .collect(),
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    if recommendations.is_empty() {
        eprintln!("no recipes apply to {}", project.project_path.display());
        return Ok(());
    }
    println!("  {:>8}  {:<36} NAME", "PRIORITY", "RECIPE");
    for r in &recommendations {
        println!(
            "  {:>8}  {:<36} {}",
            r.computed_priority(),
            r.recipe_id(),
            r.name()
        );
    }
    Ok(())
}

fn cmd_recipes(cli: &Cli) -> Result<()> {
    let workspace = Workspace::resolve(cli)?;
    let engine = workspace.engine()?;

    if cli.json {
        let rows: Vec<Value> = engine
            .recipes()
            .map(|r| {
                serde_json::json!({
                    "id": r.id,
                    "name": r.name,
                    "priority": r.priority,
                    "targetService": r.target_service,
                    "path": r.recipe_path.as_ref().map(|p| p.display().to_string()),
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    for r in engine.recipes() {
        println!("  {:>5}  {:<36} {}", r.priority, r.id, r.name);
    }
    Ok(())
}

fn cmd_check(files: &[PathBuf], strict: bool, json_out: bool) -> Result<()> {
    let registry = TestRegistry::with_builtins();
    let known_tests = registry.names();

    let mut reports = Vec::with_capacity(files.len());
    for file in files {
        let name = file.display().to_string();
        let content =
            std::fs::read_to_string(file).with_context(|| format!("cannot read {name}"))?;
        reports.push(stackpick_core::schema::check_str(
            &content,
            &name,
            strict,
            &known_tests,
        ));
    }

    if json_out {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    } else {
        for report in &reports {
            let id = report.recipe_id.as_deref().unwrap_or("?");
            if report.pass {
                eprintln!("  ok   {} ({id})", report.file);
            } else {
                eprintln!("  FAIL {} ({id})", report.file);
            }
            for e in &report.errors {
                eprintln!(
                    "  error {}: {} {}",
                    e.code,
                    e.message,
                    e.path.as_deref().unwrap_or("")
                );
            }
            for w in &report.warnings {
                eprintln!(
                    "  warn  {}: {} {}",
                    w.code,
                    w.message,
                    w.path.as_deref().unwrap_or("")
                );
            }
        }
    }

    let failed = reports.iter().filter(|r| !r.pass).count();
    if failed > 0 {
        bail!("{failed} recipe file(s) failed check");
    }
    Ok(())
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SettingRow<'a> {
    id: &'a str,
    name: &'a str,
    value: Option<Value>,
    source: SettingSource,
}

async fn cmd_settings(
    cli: &Cli,
    project_file: &Path,
    recipe_id: &str,
    previous: Option<&Path>,
    overrides: &[(String, String)],
) -> Result<()> {
    let workspace = Workspace::resolve(cli)?;
    let engine = workspace.engine()?;
    if engine.recipe(recipe_id).is_none() {
        bail!("unknown recipe \"{recipe_id}\"");
    }

    let project = load_project(project_file)?;
    let mut recommendation = workspace
        .compute(&engine, &project, cli.timeout_secs)
        .await?
        .into_iter()
        .find(|r| r.recipe_id() == recipe_id)
        .ok_or_else(|| {
            anyhow!(
                "recipe \"{recipe_id}\" is not recommended for {}",
                project.project_path.display()
            )
        })?;

    if let Some(path) = previous {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("cannot read {}", path.display()))?;
        let saved: HashMap<String, Value> = serde_json::from_str(&content)
            .with_context(|| format!("{}: expected a JSON object of settings", path.display()))?;
        recommendation.apply_previous_settings(&saved);
    }

    for (id, raw) in overrides {
        // Store under the declared id so lookups by the recipe's casing find it.
        let key = match recommendation.recipe().option_setting(id) {
            Some(setting) => setting.id.clone(),
            None => {
                tracing::warn!(recipe = recipe_id, setting = %id, "override for undeclared option setting");
                id.clone()
            }
        };
        let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.clone()));
        recommendation.set_override_option_setting_value(key, value);
    }

    let rows: Vec<SettingRow<'_>> = recommendation
        .recipe()
        .option_settings
        .iter()
        .map(|s| SettingRow {
            id: &s.id,
            name: &s.name,
            value: recommendation.get_option_setting_value(&s.id),
            source: recommendation.option_setting_source(&s.id),
        })
        .collect();

    if cli.json {
        let out = serde_json::json!({
            "recipeId": recipe_id,
            "priority": recommendation.computed_priority(),
            "settings": rows,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    for row in &rows {
        let value = row
            .value
            .as_ref()
            .map(Value::to_string)
            .unwrap_or_else(|| "-".to_string());
        let source = match row.source {
            SettingSource::Override => "override",
            SettingSource::Default => "default",
            SettingSource::Unset => "unset",
        };
        println!("  {:<24} {:<8} {value}", row.id, source);
    }
    Ok(())
}

fn cmd_init(force: bool) -> Result<()> {
    let cwd = std::env::current_dir().context("cannot determine current directory")?;
    let path = config::config_path(&cwd);
    if path.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", path.display());
    }

    let recipes = PathBuf::from("recipes");
    std::fs::create_dir_all(cwd.join(&recipes))
        .with_context(|| format!("cannot create {}", recipes.display()))?;

    let config = WorkspaceConfig {
        recipe_paths: vec![recipes],
        replacements: HashMap::new(),
    };
    let written = config::write_workspace_config(&cwd, &config)?;
    eprintln!("created {}", written.display());
    Ok(())
}
