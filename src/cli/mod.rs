//! CLI subcommands: init, parse, validate, plan, rules, schema, completions.

use crate::audit::log::{append_audit_log, render};
use crate::core::config::{self, PlannerConfig};
use crate::core::error::IntentError;
use crate::core::ir::{parse_intents, parse_intents_lenient};
use crate::core::planner::Planner;
use crate::core::types::{ExecutionPlan, IntentIR, ResourceKind};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Parser, Debug)]
#[command(
    name = "intentc",
    version,
    about = "Intent compiler - parse intent declarations into audited execution plans"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Write a sample intent and a default planner config
    Init {
        /// Directory to initialize (default: current)
        #[arg(default_value = ".")]
        path: PathBuf,
    },

    /// Parse intent declarations and print their IR
    Parse {
        /// Intent source file
        file: PathBuf,

        /// Output format
        #[arg(long, value_enum, default_value = "json")]
        format: OutputFormat,

        /// Skip stray characters instead of failing
        #[arg(long)]
        lenient: bool,
    },

    /// Check intent declarations against the validation rules
    Validate {
        /// Intent source file
        file: PathBuf,

        /// Planner config (for the complexity threshold)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Build an execution plan for every intent in a file
    Plan {
        /// Intent source file
        file: PathBuf,

        /// Planner config YAML
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Print plans as JSON instead of a summary
        #[arg(long)]
        json: bool,

        /// Append audit entries to this JSONL file
        #[arg(long)]
        audit_log: Option<PathBuf>,

        /// Plan even when the IR fails validation
        #[arg(long)]
        allow_invalid: bool,
    },

    /// List planning rules in evaluation order
    Rules {
        /// Planner config YAML
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Print the JSON schema of an execution plan
    Schema,

    /// Generate shell completions
    Completions {
        /// Target shell
        shell: clap_complete::Shell,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Yaml,
}

/// Dispatch a CLI command.
pub fn dispatch(cmd: Commands) -> Result<(), String> {
    match cmd {
        Commands::Init { path } => cmd_init(&path),
        Commands::Parse {
            file,
            format,
            lenient,
        } => cmd_parse(&file, format, lenient),
        Commands::Validate { file, config } => cmd_validate(&file, config.as_deref()),
        Commands::Plan {
            file,
            config,
            json,
            audit_log,
            allow_invalid,
        } => cmd_plan(
            &file,
            config.as_deref(),
            json,
            audit_log.as_deref(),
            allow_invalid,
        ),
        Commands::Rules { config } => cmd_rules(config.as_deref()),
        Commands::Schema => cmd_schema(),
        Commands::Completions { shell } => {
            let mut command = Cli::command();
            clap_complete::generate(shell, &mut command, "intentc", &mut std::io::stdout());
            Ok(())
        }
    }
}

const SAMPLE_INTENT: &str = r#"# Sample intent. Run `intentc plan intent.intent` to see its plan.
intent product_catalog {
  goal: "Create a simple product catalog API"
  capabilities: ["create products", "read products", "update products"]
  constraints: ["require authentication", "respond within 200ms"]
  success_criteria: "all CRUD endpoints return 2xx for valid input"
}
"#;

fn cmd_init(path: &Path) -> Result<(), String> {
    let intent_path = path.join("intent.intent");
    let config_path = path.join("planner.yaml");
    for p in [&intent_path, &config_path] {
        if p.exists() {
            return Err(format!("{} already exists", p.display()));
        }
    }

    std::fs::create_dir_all(path)
        .map_err(|e| format!("cannot create {}: {}", path.display(), e))?;
    std::fs::write(&intent_path, SAMPLE_INTENT)
        .map_err(|e| format!("cannot write {}: {}", intent_path.display(), e))?;
    let yaml = config::to_yaml(&PlannerConfig::default())?;
    std::fs::write(&config_path, yaml)
        .map_err(|e| format!("cannot write {}: {}", config_path.display(), e))?;

    println!("Initialized intent project at {}", path.display());
    println!("  Created: {}", intent_path.display());
    println!("  Created: {}", config_path.display());
    Ok(())
}

fn read_intents(file: &Path) -> Result<Vec<IntentIR>, String> {
    read_intents_with(file, parse_intents)
}

fn read_intents_with(
    file: &Path,
    parse: fn(&str) -> Result<Vec<IntentIR>, IntentError>,
) -> Result<Vec<IntentIR>, String> {
    let source = std::fs::read_to_string(file)
        .map_err(|e| format!("failed to read {}: {}", file.display(), e))?;
    let intents = parse(&source).map_err(|e| format!("{}: {}", file.display(), e))?;
    debug!(file = %file.display(), count = intents.len(), "read intents");
    Ok(intents)
}

fn load_planner(config_path: Option<&Path>) -> Result<Planner, String> {
    let config = match config_path {
        Some(path) => config::parse_config_file(path)?,
        None => PlannerConfig::default(),
    };
    let errors = config::validate_config(&config);
    if !errors.is_empty() {
        for e in &errors {
            eprintln!("  ERROR: {}", e);
        }
        return Err(format!("{} config validation error(s)", errors.len()));
    }
    Ok(Planner::new(config))
}

fn cmd_parse(file: &Path, format: OutputFormat, lenient: bool) -> Result<(), String> {
    let intents = if lenient {
        read_intents_with(file, parse_intents_lenient)?
    } else {
        read_intents(file)?
    };
    let out = match format {
        OutputFormat::Json => serde_json::to_string_pretty(&intents)
            .map_err(|e| format!("JSON serialize error: {}", e))?,
        OutputFormat::Yaml => serde_yaml_ng::to_string(&intents)
            .map_err(|e| format!("YAML serialize error: {}", e))?,
    };
    println!("{}", out);
    Ok(())
}

fn cmd_validate(file: &Path, config_path: Option<&Path>) -> Result<(), String> {
    let planner = load_planner(config_path)?;
    let intents = read_intents(file)?;

    let mut failures = 0;
    for ir in &intents {
        let errors = planner.validate(ir);
        if errors.is_empty() {
            println!(
                "OK: {} ({} capabilities, {} constraints, complexity {})",
                ir.name,
                ir.capabilities.len(),
                ir.constraints.len(),
                ir.metadata.complexity_score
            );
        } else {
            for e in &errors {
                eprintln!("  ERROR: {}: {}", ir.name, e);
            }
            failures += errors.len();
        }
    }

    if failures == 0 {
        Ok(())
    } else {
        Err(format!("{} validation error(s)", failures))
    }
}

fn cmd_plan(
    file: &Path,
    config_path: Option<&Path>,
    json: bool,
    audit_log: Option<&Path>,
    allow_invalid: bool,
) -> Result<(), String> {
    let planner = load_planner(config_path)?;
    let intents = read_intents(file)?;

    let mut refused = Vec::new();
    for ir in &intents {
        let errors = planner.validate(ir);
        for e in &errors {
            eprintln!("  ERROR: {}: {}", ir.name, e);
        }
        if !errors.is_empty() {
            refused.push((ir.name.as_str(), errors.len()));
        }
    }
    if !refused.is_empty() && !allow_invalid {
        let total: usize = refused.iter().map(|(_, n)| n).sum();
        let names: Vec<&str> = refused.iter().map(|(name, _)| *name).collect();
        return Err(format!(
            "{} validation error(s) in '{}' (use --allow-invalid to plan anyway)",
            total,
            names.join("', '")
        ));
    }

    let plans = intents
        .iter()
        .map(|ir| planner.create_plan(ir).map(|plan| (ir, plan)))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| e.to_string())?;
    if let Some(path) = audit_log {
        for (_, plan) in &plans {
            append_audit_log(path, plan)?;
        }
    }

    if json {
        let only: Vec<&ExecutionPlan> = plans.iter().map(|(_, p)| p).collect();
        let out = serde_json::to_string_pretty(&only)
            .map_err(|e| format!("JSON serialize error: {}", e))?;
        println!("{}", out);
    } else {
        for (ir, plan) in &plans {
            print_plan(ir, plan);
        }
    }
    Ok(())
}

fn print_plan(ir: &IntentIR, plan: &ExecutionPlan) {
    println!("Plan: {} [{}] ({})", ir.name, plan.strategy, plan.id);
    println!();
    for (n, wave) in plan.execution_waves.iter().enumerate() {
        println!("  wave {}:", n);
        for id in wave {
            if let Some(step) = plan.step(id) {
                let deps = if step.dependencies.is_empty() {
                    String::new()
                } else {
                    format!(" (after {})", step.dependencies.join(", "))
                };
                println!("    {} {} [{}]{}", step.id, step.action, step.step_type, deps);
            }
        }
    }
    println!();
    println!(
        "Estimate: {:.2} cost, {}ms worst case, {}ms compute, {}MB memory",
        plan.estimated_cost,
        plan.estimated_duration_ms,
        plan.resource_amount(ResourceKind::Compute),
        plan.resource_amount(ResourceKind::Memory)
    );
    println!();
    print!("{}", render(&plan.audit_log));
    println!();
}

fn cmd_rules(config_path: Option<&Path>) -> Result<(), String> {
    let planner = load_planner(config_path)?;
    for rule in planner.registry().ranked() {
        println!("{:>4}  {:<20} -> {}", rule.priority, rule.name, rule.strategy);
        println!("        {}", rule.condition);
    }
    Ok(())
}

fn cmd_schema() -> Result<(), String> {
    let schema = schemars::schema_for!(ExecutionPlan);
    let out = serde_json::to_string_pretty(&schema)
        .map_err(|e| format!("JSON serialize error: {}", e))?;
    println!("{}", out);
    Ok(())
}
