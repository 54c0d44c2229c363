use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use lottie_icons::{Icon, IconOptions};
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use tracing::{error, info, warn};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the Lottie JSON icon
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Where to write the customized icon (stdout when omitted)
    #[arg(value_name = "OUTPUT")]
    output: Option<PathBuf>,

    /// Color override, e.g. `--color primary=#ff0000`. Repeatable.
    #[arg(long = "color", value_name = "NAME=#HEX", value_parser = parse_color)]
    colors: Vec<(String, String)>,

    /// Stroke width written to every `stroke` control
    #[arg(long)]
    stroke: Option<f64>,

    /// JSON options file; command-line overrides win
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Print the icon's controls as JSON lines and exit
    #[arg(long)]
    list: bool,

    /// Print every expression-driven value at this frame as JSON lines and exit
    #[arg(long, value_name = "FRAME")]
    sample_frame: Option<f32>,

    /// Log level
    #[arg(long, value_enum, default_value_t = LogLevel::Info)]
    log_level: LogLevel,

    /// Log format
    #[arg(long, value_enum, default_value_t = LogFormat::Pretty)]
    log_format: LogFormat,
}

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => LevelFilter::ERROR,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Trace => LevelFilter::TRACE,
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug)]
enum LogFormat {
    Pretty,
    Json,
}

fn parse_color(arg: &str) -> Result<(String, String), String> {
    let (name, hex) = arg
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=#HEX, got `{arg}`"))?;
    if name.is_empty() {
        return Err("color name is empty".to_string());
    }
    Ok((name.to_string(), hex.to_string()))
}

fn init_logging(level: LogLevel, format: LogFormat) {
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::from(level).into())
        .from_env_lossy();

    let subscriber_builder = fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    match format {
        LogFormat::Json => subscriber_builder.json().init(),
        LogFormat::Pretty => subscriber_builder.pretty().init(),
    }
}

fn run(cli: Cli) -> Result<()> {
    let base = match &cli.config {
        Some(path) => IconOptions::from_file(path)?,
        None => IconOptions::default(),
    };
    let colors: BTreeMap<String, String> = cli.colors.into_iter().collect();
    let options = base.with_overrides(colors, cli.stroke);

    info!(input = %cli.input.display(), "loading icon");
    let mut icon = Icon::load(&cli.input)?;
    if icon.properties().is_empty() {
        warn!(input = %cli.input.display(), "icon exposes no customizable controls");
    }
    icon.apply_options(&options);

    if cli.list {
        for descriptor in icon.properties() {
            println!("{}", serde_json::to_string(descriptor)?);
        }
        return Ok(());
    }

    if let Some(frame) = cli.sample_frame {
        for sample in icon.sample_at(frame) {
            println!("{}", serde_json::to_string(&sample)?);
        }
        return Ok(());
    }

    let exported = serde_json::to_string(&icon.export_document())?;
    match &cli.output {
        Some(path) => {
            fs::write(path, exported)
                .with_context(|| format!("writing {}", path.display()))?;
            info!(output = %path.display(), "icon written");
        }
        None => println!("{exported}"),
    }
    Ok(())
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_level, cli.log_format);

    if let Err(e) = run(cli) {
        error!("{e:#}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn color_arguments() {
        assert_eq!(
            parse_color("primary=#ff0000").unwrap(),
            ("primary".to_string(), "#ff0000".to_string())
        );
        assert!(parse_color("primary").is_err());
        assert!(parse_color("=#fff").is_err());
    }

    #[test]
    fn cli_parses_repeated_colors() {
        let cli = Cli::try_parse_from([
            "lottie-icon",
            "in.json",
            "out.json",
            "--color",
            "primary=#ff0000",
            "--color",
            "secondary=#00ff00",
            "--stroke",
            "3",
        ])
        .unwrap();
        assert_eq!(cli.colors.len(), 2);
        assert_eq!(cli.stroke, Some(3.0));
        assert_eq!(cli.output, Some(PathBuf::from("out.json")));
        assert_eq!(cli.log_level, LogLevel::Info);
    }
}
