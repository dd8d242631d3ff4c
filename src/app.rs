use crate::cli::Cli;
use anyhow::{Context, Result};
use std::process;
use webvariants::config::Config;
use webvariants::engine::{
    self, CancelToken, FfmpegCommands, RunConfig, pipeline, probe, report, signal, variants,
};

pub fn run(cli: Cli) {
    let result = if cli.dry_run {
        handle_dry_run(&cli)
    } else {
        handle_run(&cli)
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

fn load_config(cli: &Cli) -> Result<Config> {
    match &cli.config {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
}

/// Everything decided before the output directory exists
struct Prepared {
    config: Config,
    run: RunConfig,
    optimizer_available: bool,
}

fn prepare(cli: &Cli, config: Config) -> Result<Prepared> {
    let input = engine::resolve_input(&cli.input)?;
    let enabled = variants::resolve(&cli.variant_request(), config.variants.strict)?;

    let has_audio = probe::probe_has_audio(&config.tools.ffprobe, &input);
    let run = RunConfig::new(input, enabled, has_audio)?;

    let optimizer_available = engine::tool_available(&config.tools.optimizer);
    if enabled.is_enabled(variants::Variant::Posters) && !optimizer_available {
        tracing::warn!(
            "{} not found; posters will not be optimized",
            config.tools.optimizer
        );
    }

    Ok(Prepared {
        config,
        run,
        optimizer_available,
    })
}

fn handle_dry_run(cli: &Cli) -> Result<()> {
    let prepared = prepare(cli, load_config(cli)?)?;
    let factory = FfmpegCommands::new(prepared.config.tools.clone());

    if prepared.run.output_dir().exists() {
        tracing::warn!(
            "{} already exists; a real run would refuse to start",
            prepared.run.output_dir().display()
        );
    }
    println!("Output directory: {}", prepared.run.output_dir().display());
    for (kind, line) in pipeline::dry_run(&prepared.run, &factory, prepared.optimizer_available) {
        println!("# {}", kind);
        println!("{}", line);
    }
    Ok(())
}

fn handle_run(cli: &Cli) -> Result<()> {
    let config = load_config(cli)?;
    let version = engine::ffmpeg_version(&config.tools.ffmpeg)
        .with_context(|| format!("{} is required", config.tools.ffmpeg))?;
    tracing::debug!("{}", version);
    if let Err(e) = engine::ffprobe_version(&config.tools.ffprobe) {
        tracing::warn!("{:#}; assuming the input has no audio", e);
    }

    let prepared = prepare(cli, config)?;
    let settings = prepared.config.engine_settings();
    let factory = FfmpegCommands::new(prepared.config.tools.clone());

    let cancel = CancelToken::new();
    signal::install(&cancel);

    let result = match pipeline::run(
        &prepared.run,
        &settings,
        &factory,
        prepared.optimizer_available,
        cancel,
    ) {
        Ok(result) => result,
        Err(e) => {
            if e.output_removed() {
                eprintln!(
                    "Output directory {} was removed; nothing was kept.",
                    prepared.run.output_dir().display()
                );
            }
            return Err(anyhow::Error::new(e).context("run failed"));
        }
    };

    if cli.json {
        println!("{}", report::render_json(&result)?);
    } else {
        print!("{}", report::render(&result));
    }
    Ok(())
}
