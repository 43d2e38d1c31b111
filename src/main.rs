use ffkit::cli::{Cli, Commands, TranscodeArgs};
use ffkit::config::{self, Config};
use ffkit_av::probe::{FfprobeProber, Prober};
use ffkit_av::{tools, CodecFamily, EncoderProbe, FfmpegCommand};

use anyhow::{Context, Result};
use clap::Parser;
use std::path::Path;
use tokio_util::sync::CancellationToken;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "ffkit=debug,ffkit_av=debug".to_string()
        } else {
            "ffkit=info,ffkit_av=warn".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .with_writer(std::io::stderr)
        .init();

    if let Commands::Version = cli.command {
        println!("ffkit {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let config = config::load_config_or_default(cli.config.as_deref())?;

    match cli.command {
        Commands::Probe { file, json } => probe_file(&config, &file, json),
        Commands::Duration { file } => print_duration(&config, &file),
        Commands::Encoders { hardware } => list_encoders(&config, hardware),
        Commands::BestEncoder { codec } => best_encoder(&config, codec.into()),
        Commands::CheckTools => check_tools(&config),
        Commands::Transcode(args) => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(transcode(&config, args))
        }
        Commands::Version => Ok(()),
    }
}

fn probe_file(config: &Config, file: &Path, json: bool) -> Result<()> {
    if !file.exists() {
        anyhow::bail!("File does not exist: {:?}", file);
    }

    let prober = FfprobeProber::from_tools(&config.tools());
    let info = prober
        .probe(file)
        .with_context(|| format!("Failed to probe {:?}", file))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&info)?);
        return Ok(());
    }

    println!("File: {}", info.path.display());
    println!("Format: {}", info.format);
    let secs = info.duration.as_secs();
    println!(
        "Duration: {:02}:{:02}:{:02} ({:.3}s)",
        secs / 3600,
        (secs / 60) % 60,
        secs % 60,
        info.duration.as_secs_f64()
    );
    if info.bitrate > 0 {
        println!("Bitrate: {} kb/s", info.bitrate / 1000);
    }

    match &info.video_codec {
        Some(codec) => println!("Video: {} {}x{}", codec, info.width, info.height),
        None => println!("Video: none"),
    }
    match &info.audio_codec {
        Some(codec) => println!(
            "Audio: {} {} Hz, {}ch",
            codec, info.sample_rate, info.channels
        ),
        None => println!("Audio: none"),
    }

    Ok(())
}

fn print_duration(config: &Config, file: &Path) -> Result<()> {
    if !file.exists() {
        anyhow::bail!("File does not exist: {:?}", file);
    }

    let prober = FfprobeProber::from_tools(&config.tools());
    let duration = prober
        .duration(file)
        .with_context(|| format!("Failed to read duration of {:?}", file))?;
    println!("{:.3}", duration.as_secs_f64());
    Ok(())
}

fn list_encoders(config: &Config, hardware_only: bool) -> Result<()> {
    let probe = EncoderProbe::from_tools(&config.tools());
    let encoders = probe.list_encoders().context("Failed to list encoders")?;

    for encoder in encoders
        .iter()
        .filter(|e| !hardware_only || e.is_hardware())
    {
        println!("{:<24} {:<8} {}", encoder.name, encoder.kind, encoder.description);
    }

    Ok(())
}

fn best_encoder(config: &Config, family: CodecFamily) -> Result<()> {
    let probe = EncoderProbe::from_tools(&config.tools());
    let encoder = probe.best_encoder(family);
    println!("{} ({}, {})", encoder.name, encoder.kind, encoder.description);
    Ok(())
}

fn check_tools(config: &Config) -> Result<()> {
    println!("Checking external tools...\n");

    let report = tools::check_tools(&config.tools());
    let mut all_ok = true;

    for tool in &report {
        let status = if tool.available {
            "✓"
        } else {
            all_ok = false;
            "✗"
        };

        print!("{} {}", status, tool.name);

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
        println!("Some tools are missing. Install ffmpeg to enable all features.");
    }

    Ok(())
}

fn build_command(config: &Config, args: &TranscodeArgs) -> FfmpegCommand {
    let tools = config.tools();
    let mut cmd = FfmpegCommand::with_tools(&tools);

    for input in &args.inputs {
        cmd.input(input);
    }
    cmd.output(&args.output)
        .overwrite(config.transcode.overwrite && !args.no_overwrite);

    match args.video_codec.as_deref() {
        Some("auto") => {
            let encoder = EncoderProbe::from_tools(&tools).best_h264_encoder();
            tracing::info!("Using {} encoder {}", encoder.kind, encoder.name);
            cmd.video_codec(encoder.name);
        }
        Some(codec) => {
            cmd.video_codec(codec);
        }
        None if args.copy_video => {
            cmd.copy_video();
        }
        None => {}
    }
    if let Some(codec) = &args.audio_codec {
        cmd.audio_codec(codec);
    } else if args.copy_audio {
        cmd.copy_audio();
    }
    if args.no_video {
        cmd.no_video();
    }
    if args.no_audio {
        cmd.no_audio();
    }

    if let Some((width, height)) = args.size {
        cmd.size(width, height);
    }
    if let Some(fps) = args.fps {
        cmd.fps(fps);
    }
    if let Some(crf) = args.crf {
        cmd.crf(crf);
    }
    if let Some(preset) = &args.preset {
        cmd.preset(preset);
    }
    if let Some(pix_fmt) = &args.pix_fmt {
        cmd.pixel_format(pix_fmt);
    }
    if let Some(bitrate) = &args.video_bitrate {
        cmd.video_bitrate(bitrate);
    }
    if let Some(bitrate) = &args.audio_bitrate {
        cmd.audio_bitrate(bitrate);
    }
    if let Some(rate) = args.audio_rate {
        cmd.audio_rate(rate);
    }
    if let Some(channels) = args.channels {
        cmd.channels(channels);
    }
    if let Some(duration) = args.duration {
        cmd.duration(duration);
    }
    if let Some(start) = args.start_time {
        cmd.start_time(start);
    }
    if let Some(filter) = &args.vf {
        cmd.video_filter(filter);
    }
    if let Some(filter) = &args.af {
        cmd.audio_filter(filter);
    }
    if let Some(filter) = &args.filter_complex {
        cmd.filter_complex(filter);
    }
    for (key, value) in &args.metadata {
        cmd.metadata(key, value);
    }
    cmd.args(args.extra.iter().cloned());

    cmd
}

async fn transcode(config: &Config, args: TranscodeArgs) -> Result<()> {
    let cmd = build_command(config, &args);

    if args.dry_run {
        println!("{}", cmd);
        return Ok(());
    }

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Interrupted, stopping ffmpeg");
            on_signal.cancel();
        }
    });

    let result = match config.tools.timeout() {
        Some(timeout) => cmd.run_with_timeout(timeout, &cancel).await.map(|_| ()),
        None => cmd.run(&cancel).await,
    };
    result.with_context(|| format!("Transcode to {} failed", args.output.display()))?;

    println!("Wrote {}", args.output.display());
    Ok(())
}
