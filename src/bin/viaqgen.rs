//! viaqgen CLI - renders ViaQ normalization filters for Elasticsearch outputs
//!
//! Reads output definitions (a forwarder document, a list, or a single output)
//! and prints or writes the fluentd filters placed in front of each output.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process;
use viaqgen::{OptionsBag, OutputSpec, StructuredTypeStrategy, CHAR_ENCODING};

/// Environment variable overriding the character encoding
const CHAR_ENCODING_ENV: &str = "VIAQGEN_CHAR_ENCODING";

#[derive(Parser)]
#[command(name = "viaqgen")]
#[command(version, about = "ViaQ normalization filter generation for Elasticsearch outputs", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the rendered filters for one output
    Render {
        /// YAML file with output definitions
        #[arg(short, long)]
        output: PathBuf,

        /// Output to render (required when the file defines several)
        #[arg(short, long)]
        name: Option<String>,

        /// YAML file with generator options
        #[arg(long)]
        options: Option<PathBuf>,

        /// Character encoding for the structured-field cleanup
        #[arg(long)]
        char_encoding: Option<String>,
    },

    /// Write one config file per elasticsearch output
    Generate {
        /// YAML file with output definitions
        #[arg(short, long)]
        output: PathBuf,

        /// YAML file with generator options
        #[arg(long)]
        options: Option<PathBuf>,

        /// Character encoding for the structured-field cleanup
        #[arg(long)]
        char_encoding: Option<String>,

        /// Directory for generated files
        #[arg(short, long, default_value = "generated")]
        dir: PathBuf,
    },

    /// Validate output definitions and show the resolved structured type
    Validate {
        /// YAML file with output definitions
        #[arg(short, long)]
        output: PathBuf,
    },
}

fn main() {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Render { output, name, options, char_encoding } => {
            render(output, name, options, char_encoding)
        }
        Commands::Generate { output, options, char_encoding, dir } => {
            generate(output, options, char_encoding, dir)
        }
        Commands::Validate { output } => validate(output),
    };

    if let Err(e) = result {
        eprintln!("❌ Error: {}", e);
        process::exit(1);
    }
}

/// Determine the character encoding with precedence: CLI > ENV > options file
fn detect_char_encoding(
    cli_override: Option<String>,
    env_value: Option<String>,
    options: &OptionsBag,
) -> Option<String> {
    if let Some(encoding) = cli_override.filter(|e| !e.is_empty()) {
        tracing::debug!(%encoding, "using char encoding from CLI flag");
        return Some(encoding);
    }

    if let Some(encoding) = env_value.filter(|e| !e.is_empty()) {
        tracing::debug!(%encoding, "using char encoding from {}", CHAR_ENCODING_ENV);
        return Some(encoding);
    }

    options.char_encoding()
}

/// Load options and apply the char encoding precedence
fn resolve_options(path: Option<PathBuf>, char_encoding: Option<String>) -> Result<OptionsBag, String> {
    let mut options = match path {
        Some(path) => viaqgen::load_options(&path).map_err(|e| e.to_string())?,
        None => OptionsBag::new(),
    };

    let env_value = std::env::var(CHAR_ENCODING_ENV).ok();
    if let Some(encoding) = detect_char_encoding(char_encoding, env_value, &options) {
        options.insert(CHAR_ENCODING, encoding);
    }

    Ok(options)
}

fn render(
    output_path: PathBuf,
    name: Option<String>,
    options_path: Option<PathBuf>,
    char_encoding: Option<String>,
) -> Result<(), String> {
    let output = viaqgen::load_output(&output_path, name.as_deref()).map_err(|e| e.to_string())?;
    require_elasticsearch(&output)?;

    let options = resolve_options(options_path, char_encoding)?;
    print!("{}", viaqgen::generate(&output, &options));

    Ok(())
}

fn generate(
    output_path: PathBuf,
    options_path: Option<PathBuf>,
    char_encoding: Option<String>,
    dir: PathBuf,
) -> Result<(), String> {
    println!("🔧 Generating normalization filters from {}...", output_path.display());

    let outputs = viaqgen::load_outputs(&output_path).map_err(|e| e.to_string())?;
    println!("  ✓ Loaded {} outputs", outputs.len());

    let options = resolve_options(options_path, char_encoding)?;

    let written = viaqgen::generate::generate_all(&outputs, &options, &dir)
        .map_err(|e| format!("Failed to write configs: {}", e))?;

    println!("✨ Generated {} config files in {}", written.len(), dir.display());
    Ok(())
}

fn validate(output_path: PathBuf) -> Result<(), String> {
    println!("🔍 Validating {}...", output_path.display());

    let outputs = viaqgen::load_outputs(&output_path).map_err(|e| e.to_string())?;

    for output in &outputs {
        if output.is_elasticsearch() {
            let strategy = StructuredTypeStrategy::resolve(output.elasticsearch.as_ref());
            println!("  ✓ {} (structured type: {})", output.name, strategy);
        } else {
            println!("  ℹ {} ({} output, not handled)", output.name, output.output_type);
        }
    }

    println!("✅ {} outputs valid", outputs.len());
    Ok(())
}

fn require_elasticsearch(output: &OutputSpec) -> Result<(), String> {
    if output.is_elasticsearch() {
        Ok(())
    } else {
        Err(format!(
            "Output '{}' has type '{}'; only elasticsearch outputs are supported",
            output.name, output.output_type
        ))
    }
}
