//! Heatmap CLI - render recipe x ingredient concentration heatmaps

// Global invariants enforced:
// - Reports go to stdout, diagnostics to stderr
// - CLI flags override config file values, which override built-in defaults
// - Identical input yields byte-for-byte identical output

use anyhow::Context;
use clap::{Parser, Subcommand};
use heatmap_core::config::{self, ResolvedConfig};
use heatmap_core::render::{output_path, render_to_file, Renderer};
use heatmap_core::report::{render_visibility, VisibilityReport};
use heatmap_core::{
    load_with_config, render_json, render_text, GroupingSummary, Heatmap, RasterRenderer,
    RecipeFallback, Selection, StandaloneRenderer, Threshold, ThresholdPolicy,
};
use heatmap_dashboard::AppState;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "heatmap")]
#[command(about = "Recipe x ingredient concentration heatmaps by recipe family and sensory note")]
#[command(version = env!("HEATMAP_VERSION"))]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

/// Flags accepted by every subcommand
#[derive(clap::Args)]
struct GlobalArgs {
    /// Concentration workbook (recipes x ingredients)
    #[arg(long, global = true)]
    data: Option<PathBuf>,

    /// Sensory note workbook (Product, Sensory Note)
    #[arg(long, global = true)]
    sensory: Option<PathBuf>,

    /// Path to config file (default: auto-discover)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// How to treat recipes missing from the group tables
    #[arg(long, global = true)]
    fallback: Option<FallbackArg>,

    /// Debug logging (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(clap::Args, Clone, Copy)]
struct ThresholdArgs {
    /// Concentration cutoff
    #[arg(long)]
    threshold: Option<f64>,

    /// Comparison against the cutoff
    #[arg(long)]
    policy: Option<PolicyArg>,
}

impl ThresholdArgs {
    fn apply(self, configured: Threshold) -> anyhow::Result<Threshold> {
        let cutoff = Threshold::check_cutoff(self.threshold.unwrap_or(configured.cutoff))?;
        Ok(Threshold {
            cutoff,
            policy: self.policy.map(Into::into).unwrap_or(configured.policy),
        })
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Render the static PNG heatmap
    Static {
        #[command(flatten)]
        threshold: ThresholdArgs,

        /// Output file (default: tobacco_heatmap_static.png)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Image width in pixels
        #[arg(long)]
        width: Option<u32>,

        /// Image height in pixels
        #[arg(long)]
        height: Option<u32>,

        /// Skip title, axis and tick labels
        #[arg(long)]
        no_labels: bool,
    },
    /// Render the self-contained interactive HTML document
    Standalone {
        #[command(flatten)]
        threshold: ThresholdArgs,

        /// Output file (default: tobacco_heatmap_standalone.html)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Document title
        #[arg(long)]
        title: Option<String>,
    },
    /// Serve the interactive dashboard
    Serve {
        #[command(flatten)]
        threshold: ThresholdArgs,

        /// Interface to bind
        #[arg(long)]
        host: Option<String>,

        /// Port to bind
        #[arg(long)]
        port: Option<u16>,
    },
    /// Print the grouping summary and visibility statistics
    Summary {
        #[command(flatten)]
        threshold: ThresholdArgs,

        /// Output format
        #[arg(long, default_value = "text")]
        format: OutputFormat,
    },
    /// Validate or inspect a configuration file
    #[command(name = "config")]
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Validate a config file without loading any data
    Validate {
        /// Path to config file (default: auto-discover from current directory)
        #[arg(long)]
        path: Option<PathBuf>,
    },
    /// Show the resolved configuration (merged defaults + config file)
    Show {
        /// Path to config file (default: auto-discover from current directory)
        #[arg(long)]
        path: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum PolicyArg {
    /// value >= cutoff
    Inclusive,
    /// value > cutoff
    Exclusive,
}

impl From<PolicyArg> for ThresholdPolicy {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::Inclusive => ThresholdPolicy::Inclusive,
            PolicyArg::Exclusive => ThresholdPolicy::Exclusive,
        }
    }
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum FallbackArg {
    /// Leave unlisted recipes out
    Drop,
    /// Append unlisted recipes under an "Ungrouped" band
    Ungrouped,
}

impl From<FallbackArg> for RecipeFallback {
    fn from(arg: FallbackArg) -> Self {
        match arg {
            FallbackArg::Drop => RecipeFallback::Drop,
            FallbackArg::Ungrouped => RecipeFallback::Ungrouped,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.global.verbose);

    match cli.command {
        Commands::Static {
            threshold,
            output,
            width,
            height,
            no_labels,
        } => {
            let config = load_config(&cli.global)?;
            let threshold = threshold.apply(config.static_threshold)?;
            let heatmap = load_with_config(&config)?;

            let mut renderer = RasterRenderer::new(
                width.unwrap_or(config.width),
                height.unwrap_or(config.height),
            );
            if no_labels {
                renderer = renderer.without_labels();
            }
            let output = output.unwrap_or(config.static_output);
            write_output(&heatmap, &renderer, threshold, &Selection::All, &output)?;
        }
        Commands::Standalone {
            threshold,
            output,
            title,
        } => {
            let config = load_config(&cli.global)?;
            let threshold = threshold.apply(config.standalone_threshold)?;
            let heatmap = load_with_config(&config)?;

            let mut renderer = StandaloneRenderer::default();
            if let Some(title) = title {
                renderer.title = title;
            }
            let output = output.unwrap_or(config.standalone_output);
            // Nothing is selected until the user clicks a recipe
            write_output(&heatmap, &renderer, threshold, &Selection::none(), &output)?;
        }
        Commands::Serve {
            threshold,
            host,
            port,
        } => {
            let config = load_config(&cli.global)?;
            let threshold = threshold.apply(config.dashboard_threshold)?;
            let host = host.unwrap_or_else(|| config.host.clone());
            let port = port.unwrap_or(config.port);
            if port == 0 {
                anyhow::bail!("port must be non-zero");
            }

            let heatmap = load_with_config(&config)?;
            print_visibility(&heatmap, &threshold);

            let runtime =
                tokio::runtime::Runtime::new().context("failed to start async runtime")?;
            runtime.block_on(heatmap_dashboard::serve(
                AppState::new(heatmap, threshold),
                &host,
                port,
            ))?;
        }
        Commands::Summary { threshold, format } => {
            let config = load_config(&cli.global)?;
            let threshold = threshold.apply(config.static_threshold)?;
            let heatmap = load_with_config(&config)?;

            let summary = GroupingSummary::new(&heatmap).with_visibility(&heatmap, &threshold);
            match format {
                OutputFormat::Text => print!("{}", render_text(&summary)),
                OutputFormat::Json => println!("{}", render_json(&summary)),
            }
        }
        Commands::Config { action } => match action {
            ConfigAction::Validate { path } => {
                let project_root = std::env::current_dir()?;
                let resolved = config::load_and_resolve(&project_root, path.as_deref());

                match resolved {
                    Ok(config) => {
                        if let Some(ref p) = config.config_path {
                            println!("Config valid: {}", p.display());
                        } else {
                            println!("No config file found. Using defaults.");
                        }
                    }
                    Err(e) => {
                        eprintln!("Config validation failed: {:#}", e);
                        std::process::exit(1);
                    }
                }
            }
            ConfigAction::Show { path } => {
                let project_root = std::env::current_dir()?;
                let resolved = config::load_and_resolve(&project_root, path.as_deref())
                    .context("failed to load configuration")?;
                print_config(&resolved);
            }
        },
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Resolve the config from the working directory, then apply global flags
fn load_config(cli: &GlobalArgs) -> anyhow::Result<ResolvedConfig> {
    let project_root = std::env::current_dir()?;
    let mut resolved = config::load_and_resolve(&project_root, cli.config.as_deref())
        .context("failed to load configuration")?;

    if let Some(ref p) = resolved.config_path {
        info!("using config: {}", p.display());
    }

    if let Some(ref data) = cli.data {
        resolved.data = data.clone();
    }
    if let Some(ref sensory) = cli.sensory {
        resolved.sensory = sensory.clone();
    }
    if let Some(fallback) = cli.fallback {
        resolved.recipe_fallback = fallback.into();
    }
    Ok(resolved)
}

/// Render to `output` (extension added if missing), then report.
/// The grouping summary goes to stderr, visibility and the output path to stdout.
fn write_output(
    heatmap: &Heatmap,
    renderer: &dyn Renderer,
    threshold: Threshold,
    selection: &Selection,
    output: &Path,
) -> anyhow::Result<PathBuf> {
    let output = output_path(renderer, output);
    eprint!("{}", render_text(&GroupingSummary::new(heatmap)));

    let view = heatmap.view(threshold, selection);
    let bytes = render_to_file(renderer, &view, &output)
        .with_context(|| format!("failed to write {}", output.display()))?;
    info!(
        "wrote {} heatmap to {} ({} bytes)",
        renderer.name(),
        output.display(),
        bytes
    );
    print_visibility(heatmap, &threshold);
    println!("Output: {}", output.display());
    Ok(output)
}

fn print_visibility(heatmap: &Heatmap, threshold: &Threshold) {
    let report = VisibilityReport::new(threshold, heatmap.stats(threshold));
    print!("{}", render_visibility(&report));
}

fn print_config(resolved: &ResolvedConfig) {
    println!("Configuration:");
    if let Some(ref p) = resolved.config_path {
        println!("  Source: {}", p.display());
    } else {
        println!("  Source: defaults (no config file found)");
    }
    println!();
    println!("Inputs:");
    println!("  data: {}", resolved.data.display());
    println!("  sensory: {}", resolved.sensory.display());
    println!("  recipe_fallback: {}", resolved.recipe_fallback.as_str());
    println!();
    println!("Static:");
    println!("  threshold: {}", resolved.static_threshold.describe());
    println!("  output: {}", resolved.static_output.display());
    println!("  size: {}x{}", resolved.width, resolved.height);
    println!();
    println!("Standalone:");
    println!("  threshold: {}", resolved.standalone_threshold.describe());
    println!("  output: {}", resolved.standalone_output.display());
    println!();
    println!("Dashboard:");
    println!("  threshold: {}", resolved.dashboard_threshold.describe());
    println!("  address: {}:{}", resolved.host, resolved.port);
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use heatmap_core::{ConcentrationMatrix, GroupTables, RecipeGroup, SensoryMap};

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_threshold_flags_override_configured_value() {
        let args = ThresholdArgs {
            threshold: Some(0.3),
            policy: Some(PolicyArg::Exclusive),
        };
        assert_eq!(
            args.apply(Threshold::INTERACTIVE_DEFAULT).unwrap(),
            Threshold::exclusive(0.3)
        );

        let none = ThresholdArgs {
            threshold: None,
            policy: None,
        };
        assert_eq!(
            none.apply(Threshold::STATIC_DEFAULT).unwrap(),
            Threshold::STATIC_DEFAULT
        );
    }

    #[test]
    fn test_negative_threshold_flag_is_rejected() {
        let args = ThresholdArgs {
            threshold: Some(-1.0),
            policy: None,
        };
        assert!(args.apply(Threshold::INTERACTIVE_DEFAULT).is_err());
    }

    fn tiny_heatmap() -> Heatmap {
        let matrix =
            ConcentrationMatrix::from_rows(&["vanillin"], &[("a", vec![Some(0.9)])]).unwrap();
        let sensory: SensoryMap = [("vanillin", "Sweet")].into_iter().collect();
        let tables = GroupTables::new(vec![RecipeGroup::new("G1", "G1", &["a"])]);
        Heatmap::build(matrix, &sensory, tables, RecipeFallback::Drop)
    }

    #[test]
    fn test_write_output_adds_renderer_extension() {
        let heatmap = tiny_heatmap();
        let dir = tempfile::tempdir().unwrap();

        let html = write_output(
            &heatmap,
            &StandaloneRenderer::default(),
            Threshold::INTERACTIVE_DEFAULT,
            &Selection::none(),
            &dir.path().join("page"),
        )
        .unwrap();
        assert_eq!(html, dir.path().join("page.html"));
        assert!(html.is_file());

        let png = write_output(
            &heatmap,
            &RasterRenderer::new(640, 400).without_labels(),
            Threshold::STATIC_DEFAULT,
            &Selection::All,
            &dir.path().join("plot.png"),
        )
        .unwrap();
        assert_eq!(png, dir.path().join("plot.png"));
        assert!(png.is_file());
    }

    #[test]
    fn test_parse_static_with_global_flags() {
        let cli = Cli::try_parse_from([
            "heatmap",
            "static",
            "--threshold",
            "0.5",
            "--data",
            "d.xlsx",
            "--fallback",
            "ungrouped",
        ])
        .unwrap();
        assert_eq!(cli.global.data, Some(PathBuf::from("d.xlsx")));
        assert!(matches!(cli.global.fallback, Some(FallbackArg::Ungrouped)));
        match cli.command {
            Commands::Static { threshold, .. } => assert_eq!(threshold.threshold, Some(0.5)),
            _ => panic!("expected static subcommand"),
        }
    }
}
