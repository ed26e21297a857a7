mod cli;

use dubsplit::{
    config, discover,
    processor::BatchProcessor,
    summary::{PlanSummary, ReportSummary},
};
use dubsplit_av::StreamCatalog;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use std::path::{Path, PathBuf};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "dubsplit=debug,dubsplit_av=debug".to_string()
        } else {
            "dubsplit=info,dubsplit_av=info".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Demux {
            paths,
            dry_run,
            output_dir,
        } => demux(&paths, cli.config.as_deref(), dry_run, output_dir),
        Commands::Plan { file, json } => plan_file(&file, cli.config.as_deref(), json),
        Commands::Probe { file, json } => probe_file(&file, cli.config.as_deref(), json),
        Commands::Languages => languages(cli.config.as_deref()),
        Commands::CheckTools => check_tools(cli.config.as_deref()),
        Commands::Validate {
            config: config_path,
        } => {
            let path = config_path.or(cli.config);
            validate_config(path.as_deref())
        }
    }
}

fn demux(
    paths: &[PathBuf],
    config_path: Option<&Path>,
    dry_run: bool,
    output_dir: Option<PathBuf>,
) -> Result<()> {
    let mut config = config::load_config_or_default(config_path)?;
    if output_dir.is_some() {
        config.output.directory = output_dir;
    }

    if let Some(ref dir) = config.output.directory {
        if !dry_run {
            std::fs::create_dir_all(dir)?;
        }
    }

    let files = discover::discover_files(paths, &config.scan);
    if files.is_empty() {
        anyhow::bail!("No media files found in {:?}", paths);
    }

    tracing::info!("Processing {} files", files.len());

    let processor = BatchProcessor::from_config(&config).with_dry_run(dry_run);
    let report = processor.run(&files);

    print!(
        "{}",
        ReportSummary::new(&report, dry_run, processor.output_dir())
    );

    if !report.is_success() {
        anyhow::bail!("{} of {} files failed", report.failed(), report.files.len());
    }

    Ok(())
}

fn plan_file(file: &Path, config_path: Option<&Path>, json: bool) -> Result<()> {
    if !file.exists() {
        anyhow::bail!("File does not exist: {:?}", file);
    }

    let config = config::load_config_or_default(config_path)?;
    let processor = BatchProcessor::from_config(&config).with_dry_run(true);
    let report = processor.process_file(file);

    if let Some(e) = report.error {
        return Err(e.into());
    }
    let Some(plan) = report.plan else {
        anyhow::bail!("No plan produced for {:?}", file);
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&plan)?);
    } else {
        print!("{}", PlanSummary::new(&plan, processor.output_dir()));
    }

    Ok(())
}

fn probe_file(file: &Path, config_path: Option<&Path>, json: bool) -> Result<()> {
    if !file.exists() {
        anyhow::bail!("File does not exist: {:?}", file);
    }

    let config = config::load_config_or_default(config_path)?;
    let processor = BatchProcessor::from_config(&config);
    let catalog = processor.prober().probe(file)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&catalog)?);
    } else {
        println!("File: {}", file.display());
        print_catalog(&catalog);
    }

    Ok(())
}

fn print_catalog(catalog: &StreamCatalog) {
    println!("Streams: {}", catalog.len());
    for stream in catalog.streams() {
        print!("  [{}] {}", stream.index, stream.codec_type);
        if let Some(ref lang) = stream.language {
            print!(" ({})", lang);
        }
        if let Some(ref title) = stream.title {
            print!(" \"{}\"", title);
        }
        println!();
    }
}

fn languages(config_path: Option<&Path>) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;
    let resolver = config.languages.resolver();

    println!("Language suffixes:");
    for (tag, suffix) in resolver.entries() {
        let shown = if suffix.is_empty() { "(none)" } else { suffix };
        println!("  {:<8} {}", tag, shown);
    }
    println!("\nUnknown languages: {:?}", resolver.policy());

    Ok(())
}

fn check_tools(config_path: Option<&Path>) -> Result<()> {
    println!("Checking external tools...\n");

    let config = config::load_config_or_default(config_path)?;
    let tools = dubsplit_av::check_tools(
        config.tools.ffprobe_path.as_deref(),
        config.tools.ffmpeg_path.as_deref(),
    );

    let mut all_ok = true;

    for tool in &tools {
        let status = if tool.available {
            "✓"
        } else {
            all_ok = false;
            "✗"
        };

        print!("{} {}", status, tool.tool);

        if let Some(ref version) = tool.version {
            print!(" ({})", version);
        }

        if let Some(ref path) = tool.path {
            print!(" - {}", path.display());
        }

        println!();
    }

    println!();
    if all_ok {
        println!("All required tools are available!");
    } else {
        println!("Some tools are missing. Install FFmpeg to demux files.");
    }

    Ok(())
}

fn validate_config(path: Option<&Path>) -> Result<()> {
    let config = match path {
        Some(p) => {
            println!("Validating config: {:?}", p);
            let config = config::load_config(p)?;
            println!("✓ Configuration is valid");
            config
        }
        None => {
            println!("No config file specified, using defaults");
            config::Config::default()
        }
    };

    println!("  Extensions: {}", config.scan.extensions.join(", "));
    println!("  Recursive: {}", config.scan.recursive);
    match config.output.directory {
        Some(ref dir) => println!("  Output directory: {}", dir.display()),
        None => println!("  Output directory: alongside source"),
    }
    println!("  Overwrite: {}", config.output.overwrite);
    println!("  Language overrides: {}", config.languages.suffixes.len());
    println!("  Unknown languages: {:?}", config.languages.unknown);

    Ok(())
}
