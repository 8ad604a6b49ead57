//! Config Forge CLI
//!
//! Inspect schemas, check that they compile, and generate configs from
//! JSON or YAML input.

use std::io::Read;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use config_forge::schema::FieldSpec;
use config_forge::{
    compile_schema, DefaultPolicy, Forge, ForgeConfig, ForgeError, OutputFormat, SchemaError,
};
use indexmap::IndexMap;
use serde_json::{Number, Value};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "forge")]
#[command(about = "Generate validated configs from declarative schemas")]
struct Cli {
    /// Config file to load (optional)
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Schema directory (overrides the config file)
    #[arg(short, long, global = true)]
    schemas: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List available schemas
    List,

    /// Fuzzy search schema names
    Search {
        query: String,
        #[arg(short, long, default_value_t = 5)]
        limit: usize,
    },

    /// Show the field outline of a schema
    Describe { name: String },

    /// Check that schemas compile
    Check {
        /// Schema to check (all schemas if omitted)
        name: Option<String>,
    },

    /// Validate input and print the generated config
    Generate {
        name: String,

        /// Input file (JSON or YAML); reads JSON from stdin if omitted
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Output format: yaml, json or toml
        #[arg(short, long)]
        format: Option<OutputFormat>,

        /// Write declared defaults of fields the input does not set
        #[arg(long)]
        with_defaults: bool,

        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show or initialize configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show current configuration
    Show {
        /// Output as JSON instead of TOML
        #[arg(long)]
        json: bool,
    },

    /// Initialize a new config file
    Init {
        #[arg(short, long, default_value = "forge.toml")]
        output: String,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

fn run(cli: Cli) -> Result<i32> {
    let mut cfg = ForgeConfig::load_from(cli.config.as_deref()).context("failed to load configuration")?;
    if let Some(schemas) = cli.schemas {
        cfg.repository.path = schemas;
    }

    let forge = Forge::new(cfg.schema_repository(), cfg.forge_options());

    match cli.command {
        Commands::List => {
            for name in forge.repository().list()? {
                println!("{}", name);
            }
            Ok(0)
        }

        Commands::Search { query, limit } => {
            let matches = forge.repository().search(&query, limit)?;
            if matches.is_empty() {
                println!("No schemas match '{}'", query);
            }
            for name in matches {
                println!("{}", name);
            }
            Ok(0)
        }

        Commands::Describe { name } => {
            let raw = match forge.repository().load(&name) {
                Err(SchemaError::NotFound { .. }) => return Ok(not_found(&forge, &name)),
                other => other?,
            };
            let specs = raw.field_specs()?;

            println!("📋 {} (root key: {})", raw.name, raw.root_key());
            if let Some(description) = raw.description() {
                println!("   {}", description);
            }
            println!();
            print_fields(&specs, 1);
            Ok(0)
        }

        Commands::Check { name } => {
            let names = match name {
                Some(name) => vec![name],
                None => forge.repository().list()?,
            };

            let mut failed = 0;
            for name in &names {
                let result = forge.repository().load(name).and_then(|raw| compile_schema(&raw));
                match result {
                    Ok(compiled) => println!("  ✅ {} - {} field(s)", name, compiled.root.len()),
                    Err(e) => {
                        println!("  ❌ {} - {}", name, e);
                        failed += 1;
                    }
                }
            }

            println!();
            if failed > 0 {
                println!("❌ {} of {} schema(s) failed to compile", failed, names.len());
                Ok(1)
            } else {
                println!("✅ All {} schema(s) compile", names.len());
                Ok(0)
            }
        }

        Commands::Generate { name, input, format, with_defaults, output } => {
            let forge = if with_defaults {
                let mut options = cfg.forge_options();
                options.default_policy = DefaultPolicy::Materialize;
                Forge::new(cfg.schema_repository(), options)
            } else {
                forge
            };

            let input = read_input(input.as_ref())?;
            let format = format.unwrap_or(forge.options().output_format);

            match forge.generate_as(&name, &input, format) {
                Ok(generated) => {
                    match output {
                        Some(path) => {
                            std::fs::write(&path, &generated.text)
                                .with_context(|| format!("failed to write {}", path.display()))?;
                            eprintln!("✅ Wrote {} config to {:?}", generated.format, path);
                        }
                        None => print!("{}", generated.text),
                    }
                    Ok(0)
                }
                Err(ForgeError::NotFound { .. }) => Ok(not_found(&forge, &name)),
                Err(ForgeError::Validation(report)) => {
                    eprintln!("❌ Input does not match schema '{}'", name);
                    eprintln!("{}", report);
                    Ok(2)
                }
                Err(e) => Err(e.into()),
            }
        }

        Commands::Config { command } => match command {
            ConfigCommands::Show { json } => {
                if json {
                    println!("{}", serde_json::to_string_pretty(&cfg)?);
                } else {
                    println!("{}", toml::to_string_pretty(&cfg)?);
                }
                Ok(0)
            }
            ConfigCommands::Init { output } => {
                ForgeConfig::default().save(&output)?;
                println!("✅ Created config file: {}", output);
                Ok(0)
            }
        },
    }
}

fn not_found(forge: &Forge, name: &str) -> i32 {
    eprintln!("❌ Schema not found: {}", name);
    let suggestions = forge.repository().search(name, 3).unwrap_or_default();
    if !suggestions.is_empty() {
        eprintln!("   Did you mean: {}?", suggestions.join(", "));
    }
    1
}

fn read_input(path: Option<&PathBuf>) -> Result<Value> {
    match path {
        Some(path) => {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            let is_json = path.extension().map(|ext| ext == "json").unwrap_or(false);
            if is_json {
                serde_json::from_str(&content).with_context(|| format!("invalid JSON in {}", path.display()))
            } else {
                serde_yaml::from_str(&content).with_context(|| format!("invalid YAML in {}", path.display()))
            }
        }
        None => {
            let mut content = String::new();
            std::io::stdin().read_to_string(&mut content)?;
            serde_json::from_str(&content).context("invalid JSON on stdin")
        }
    }
}

fn print_fields(specs: &IndexMap<String, FieldSpec>, depth: usize) {
    let indent = "  ".repeat(depth);
    for (name, spec) in specs {
        let mut line = format!("{}{:<16} {}", indent, name, spec.type_label());
        if spec.required {
            line.push_str("  required");
        }
        if let Some(default) = &spec.default {
            line.push_str(&format!("  default={}", default));
        }
        if let Some(choices) = spec.choices() {
            let choices: Vec<String> = choices.iter().map(|c| c.to_string()).collect();
            line.push_str(&format!("  choices=[{}]", choices.join(", ")));
        }
        if let Some(pattern) = &spec.validation.pattern {
            line.push_str(&format!("  pattern={}", pattern));
        }
        match (&spec.validation.ge, &spec.validation.le) {
            (None, None) => {}
            (ge, le) => {
                let bound = |b: &Option<Number>| b.as_ref().map(|v| v.to_string()).unwrap_or_default();
                line.push_str(&format!("  range=[{}..{}]", bound(ge), bound(le)));
            }
        }
        if let Some(max) = spec.validation.max_length {
            line.push_str(&format!("  max_length={}", max));
        }
        println!("{}", line);

        if let Some(description) = &spec.description {
            println!("{}  # {}", indent, description);
        }
        if let Some(fields) = spec.model_fields() {
            print_fields(fields, depth + 1);
        }
        if let Some(alternatives) = &spec.union {
            for (i, alternative) in alternatives.iter().enumerate() {
                if let Some(fields) = alternative.model_fields() {
                    println!("{}  alternative {}:", indent, i + 1);
                    print_fields(fields, depth + 2);
                }
            }
        }
    }
}
