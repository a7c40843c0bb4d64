//! Creative CLI - Transport boundary for the creative pipeline
//!
//! Commands: rules, formats, evaluate, generate, get
//! Outputs JSON to stdout, logs to stderr
//! Exit code 2 when a creative fails compliance

use clap::{ArgAction, Parser, Subcommand};
use serde_json::json;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::Level;

use creative_core::{
    canvas::CanvasSpec, CanvasFormat, CreativePipeline, EngineConfig, GenerateRequest,
    PipelineError, PlacementResult,
};

#[derive(Parser)]
#[command(name = "creative-cli")]
#[command(about = "Retail Creative Builder - compose and check marketing creatives")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Engine config JSON
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Rule catalog file or directory (overrides config)
    #[arg(short, long)]
    rules: Option<PathBuf>,

    /// Output directory for composed creatives (overrides config)
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Bold TrueType font for headlines (overrides config)
    #[arg(long)]
    font: Option<PathBuf>,

    /// Log verbosity on stderr (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// List retailer rule sets
    Rules,

    /// List canvas formats
    Formats,

    /// Score a layout without composing it
    Evaluate {
        #[arg(short, long, default_value = "feed")]
        format: CanvasFormat,

        /// Packshot width after scaling, in pixels
        #[arg(long)]
        packshot_width: u32,

        /// Packshot height after scaling, in pixels
        #[arg(long)]
        packshot_height: u32,

        #[arg(long, default_value = "")]
        headline: String,

        #[arg(long, default_value = "default")]
        retailer: String,
    },

    /// Compose a creative, check it and store the PNG
    Generate {
        /// Packshot image file
        #[arg(short, long)]
        packshot: PathBuf,

        /// Optional logo image file
        #[arg(short, long)]
        logo: Option<PathBuf>,

        #[arg(long, default_value = "")]
        headline: String,

        #[arg(long, default_value = "default")]
        retailer: String,

        #[arg(short, long, default_value = "feed")]
        format: CanvasFormat,
    },

    /// Retrieve a stored creative
    Get {
        /// Creative identifier
        #[arg(long)]
        id: String,

        /// Write the PNG here instead of printing base64
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

fn emit(value: &serde_json::Value) {
    println!(
        "{}",
        serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
    );
}

fn emit_error(e: &PipelineError) -> ExitCode {
    emit(&json!({
        "success": false,
        "status": e.status_code(),
        "error": e.to_string(),
    }));
    ExitCode::FAILURE
}

fn read_input(path: &Path, what: &str) -> Result<Vec<u8>, ExitCode> {
    fs::read(path).map_err(|e| {
        emit(&json!({
            "success": false,
            "error": format!("Failed to read {} {}: {}", what, path.display(), e),
        }));
        ExitCode::FAILURE
    })
}

fn load_config(cli: &Cli) -> Result<EngineConfig, PipelineError> {
    let mut config = match &cli.config {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };
    if let Some(rules) = &cli.rules {
        config = config.with_rules(rules);
    }
    if let Some(dir) = &cli.output_dir {
        config = config.with_output_dir(dir);
    }
    if let Some(font) = &cli.font {
        config = config.with_font(font);
    }
    Ok(config)
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        _ => Level::DEBUG,
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(level)
        .init();

    let pipeline = match load_config(&cli).and_then(|c| CreativePipeline::from_config(&c)) {
        Ok(p) => p,
        Err(e) => return emit_error(&e),
    };

    match cli.command {
        Commands::Rules => {
            let rules: Vec<_> = pipeline
                .catalog()
                .list()
                .map(|(id, rule)| json!({ "id": id, "rule": rule }))
                .collect();
            emit(&json!(rules));
            ExitCode::SUCCESS
        }

        Commands::Formats => {
            let formats: Vec<_> = CanvasFormat::ALL
                .iter()
                .map(|f| {
                    let spec = f.spec();
                    json!({ "name": f.name(), "width": spec.width, "height": spec.height })
                })
                .collect();
            emit(&json!(formats));
            ExitCode::SUCCESS
        }

        Commands::Evaluate {
            format,
            packshot_width,
            packshot_height,
            headline,
            retailer,
        } => {
            let canvas: CanvasSpec = format.spec();
            let placement = PlacementResult {
                width: packshot_width,
                height: packshot_height,
            };
            let evaluation = pipeline
                .evaluator()
                .evaluate(canvas, placement, &headline, &retailer);
            emit(&json!(evaluation));
            if evaluation.report.passed() {
                ExitCode::SUCCESS
            } else {
                ExitCode::from(2)
            }
        }

        Commands::Generate {
            packshot,
            logo,
            headline,
            retailer,
            format,
        } => {
            let packshot = match read_input(&packshot, "packshot") {
                Ok(bytes) => bytes,
                Err(code) => return code,
            };
            let mut request = GenerateRequest::new(packshot)
                .with_headline(headline)
                .with_retailer(retailer)
                .with_format(format);
            if let Some(path) = logo {
                match read_input(&path, "logo") {
                    Ok(bytes) => request = request.with_logo(bytes),
                    Err(code) => return code,
                }
            }

            match pipeline.generate(&request) {
                Ok(creative) => {
                    let passed = creative.compliance.passed();
                    emit(&json!({ "success": true, "creative": creative }));
                    if passed {
                        ExitCode::SUCCESS
                    } else {
                        ExitCode::from(2)
                    }
                }
                Err(e) => emit_error(&e),
            }
        }

        Commands::Get { id, out } => match pipeline.fetch(&id) {
            Ok(png) => match out {
                Some(path) => match fs::write(&path, &png) {
                    Ok(()) => {
                        emit(&json!({ "success": true, "id": id, "path": path, "bytes": png.len() }));
                        ExitCode::SUCCESS
                    }
                    Err(e) => {
                        emit(&json!({ "success": false, "error": e.to_string() }));
                        ExitCode::FAILURE
                    }
                },
                None => {
                    let data = base64::Engine::encode(&base64::engine::general_purpose::STANDARD, &png);
                    emit(&json!({ "success": true, "id": id, "media_type": "image/png", "data_base64": data }));
                    ExitCode::SUCCESS
                }
            },
            Err(e) => emit_error(&e),
        },
    }
}
