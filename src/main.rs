use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;
use trimpress::batch::{self, BatchConfig, CancelFlag};
use trimpress::imaging::RustCodec;
use trimpress::renumber::{self, RenumberMap};
use trimpress::{config, output};

fn version_string() -> &'static str {
    let on_tag = env!("ON_RELEASE_TAG");
    if on_tag == "true" {
        env!("CARGO_PKG_VERSION")
    } else {
        let hash = env!("GIT_HASH");
        if hash.is_empty() {
            "dev@unknown"
        } else {
            // Leaked once at startup
            Box::leak(format!("dev@{hash}").into_boxed_str())
        }
    }
}

#[derive(Parser)]
#[command(name = "trimpress")]
#[command(about = "Trim, resize and WebP-encode a directory of images")]
#[command(long_about = "\
Trim, resize and WebP-encode a directory of images

Every .jpg/.jpeg/.png/.tif/.tiff/.webp file at the top level of the input
directory is processed independently:

  originals/a.png  →  trim border  →  resize to height  →  optimized/a.webp

Files that fail (corrupt, unreadable, ...) are reported and skipped; the rest
of the batch still runs. Existing outputs are overwritten.

Settings come from stock defaults, then trimpress.toml (or --config), then
command-line flags. Run 'trimpress gen-config' for a documented config file.")]
#[command(version = version_string())]
struct Cli {
    /// Config file (default: ./trimpress.toml if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log more detail to stderr (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Process every eligible image in the input directory
    Run(RunArgs),
    /// Copy originals to <number>.<ext> names from a mapping file
    Renumber(RenumberArgs),
    /// Print a stock trimpress.toml with all options documented
    GenConfig,
}

/// Flags for `run`. Each one overrides the matching config key.
#[derive(Args, Clone, Default)]
struct RunArgs {
    /// Input directory [config: paths.input, default: originals]
    #[arg(long)]
    input: Option<PathBuf>,

    /// Output directory [config: paths.output, default: optimized]
    #[arg(long)]
    output: Option<PathBuf>,

    /// Trim tolerance 0-255 [config: trim.threshold, default: 100]
    #[arg(long)]
    threshold: Option<u32>,

    /// Output height in pixels [config: resize.height, default: 700]
    #[arg(long)]
    height: Option<u32>,

    /// WebP quality 0-100 [config: encode.quality, default: 80]
    #[arg(long)]
    quality: Option<u32>,

    /// WebP effort 0-6 [config: encode.effort, default: 6]
    #[arg(long)]
    effort: Option<u32>,

    /// Max parallel workers [config: processing.max_processes, default: all cores]
    #[arg(long)]
    jobs: Option<usize>,

    /// Write the batch summary as JSON to this file
    #[arg(long)]
    report: Option<PathBuf>,
}

#[derive(Args)]
struct RenumberArgs {
    /// TOML table of "old name" = number
    #[arg(long)]
    map: PathBuf,

    /// Directory holding the files named in the map
    #[arg(long)]
    source: PathBuf,

    /// Directory receiving <number>.<ext> copies
    #[arg(long, default_value = "originals")]
    target: PathBuf,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Command::Run(args) => run(cli.config.as_deref(), &args)?,
        Command::Renumber(args) => {
            let map = RenumberMap::load(&args.map)?;
            let summary = renumber::renumber(&args.source, &args.target, &map)?;
            output::print_renumber(&summary);
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

fn run(config_path: Option<&Path>, args: &RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    let file_layer = config::load_file_layer(config_path)?;
    let layers = file_layer.into_iter().chain([cli_overlay(args)]);
    let config = config::resolve_config(config::stock_defaults_value()?, layers)?;

    init_thread_pool(&config.processing);

    let batch_config = BatchConfig {
        input_dir: config.paths.input.clone(),
        output_dir: config.paths.output.clone(),
        spec: config.pipeline_spec(),
    };

    let (tx, rx) = std::sync::mpsc::channel();
    let printer = std::thread::spawn(move || {
        for event in rx {
            for line in output::format_event(&event) {
                println!("{}", line);
            }
        }
    });
    let result = batch::run(&batch_config, &RustCodec::new(), Some(tx), &CancelFlag::new());
    printer
        .join()
        .map_err(|_| "progress printer thread panicked")?;
    let summary = result?;

    output::print_summary(&summary);

    if let Some(report) = &args.report {
        let json = serde_json::to_string_pretty(&summary)?;
        std::fs::write(report, json)?;
    }
    Ok(())
}

/// Turn the `run` flags that were given into a sparse config layer.
fn cli_overlay(args: &RunArgs) -> toml::Value {
    fn section(root: &mut toml::Table, name: &str) -> toml::Table {
        match root.remove(name) {
            Some(toml::Value::Table(t)) => t,
            _ => toml::Table::new(),
        }
    }
    fn set(root: &mut toml::Table, name: &str, key: &str, value: toml::Value) {
        let mut table = section(root, name);
        table.insert(key.to_string(), value);
        root.insert(name.to_string(), toml::Value::Table(table));
    }
    let path = |p: &PathBuf| toml::Value::String(p.to_string_lossy().into_owned());
    let int = |n: u64| toml::Value::Integer(i64::try_from(n).unwrap_or(i64::MAX));

    let mut root = toml::Table::new();
    if let Some(p) = &args.input {
        set(&mut root, "paths", "input", path(p));
    }
    if let Some(p) = &args.output {
        set(&mut root, "paths", "output", path(p));
    }
    if let Some(n) = args.threshold {
        set(&mut root, "trim", "threshold", int(n.into()));
    }
    if let Some(n) = args.height {
        set(&mut root, "resize", "height", int(n.into()));
    }
    if let Some(n) = args.quality {
        set(&mut root, "encode", "quality", int(n.into()));
    }
    if let Some(n) = args.effort {
        set(&mut root, "encode", "effort", int(n.into()));
    }
    if let Some(n) = args.jobs {
        set(&mut root, "processing", "max_processes", int(n as u64));
    }
    toml::Value::Table(root)
}

/// Log to stderr. `RUST_LOG` wins over `-v` when set.
fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Initialize the rayon thread pool based on processing config.
///
/// Caps at the number of available CPU cores; the user can constrain down, not up.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolve(args: &RunArgs) -> config::Config {
        config::resolve_config(config::stock_defaults_value().unwrap(), [cli_overlay(args)])
            .unwrap()
    }

    #[test]
    fn cli_parses_run_flags() {
        let cli = Cli::try_parse_from([
            "trimpress", "run", "--input", "raw", "--height", "512", "--quality", "70",
        ])
        .unwrap();
        let Command::Run(args) = cli.command else {
            panic!("expected run");
        };
        assert_eq!(args.input, Some(PathBuf::from("raw")));
        assert_eq!(args.height, Some(512));
        assert_eq!(args.quality, Some(70));
        assert_eq!(args.threshold, None);
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["trimpress", "run", "-vv", "--config", "x.toml"]).unwrap();
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.config, Some(PathBuf::from("x.toml")));
    }

    #[test]
    fn renumber_requires_map() {
        assert!(Cli::try_parse_from(["trimpress", "renumber", "--source", "dl"]).is_err());
    }

    #[test]
    fn empty_overlay_keeps_defaults() {
        let config = resolve(&RunArgs::default());
        assert_eq!(config.paths.input, PathBuf::from("originals"));
        assert_eq!(config.resize.height, 700);
        assert_eq!(config.encode.quality, 80);
    }

    #[test]
    fn overlay_sets_given_flags() {
        let args = RunArgs {
            output: Some(PathBuf::from("web")),
            threshold: Some(12),
            effort: Some(2),
            jobs: Some(1),
            ..RunArgs::default()
        };
        let config = resolve(&args);
        assert_eq!(config.paths.output, PathBuf::from("web"));
        assert_eq!(config.paths.input, PathBuf::from("originals"));
        assert_eq!(config.trim.threshold, 12);
        assert_eq!(config.encode.effort, 2);
        assert_eq!(config.encode.quality, 80);
        assert_eq!(config.processing.max_processes, Some(1));
    }

    #[test]
    fn overlay_out_of_range_fails_validation() {
        let args = RunArgs {
            quality: Some(150),
            ..RunArgs::default()
        };
        let result = config::resolve_config(
            config::stock_defaults_value().unwrap(),
            [cli_overlay(&args)],
        );
        assert!(matches!(result, Err(config::ConfigError::Validation(_))));
    }
}
