//! Headless map renderer.
//!
//! Runs the same load, filter, sample and payload pipeline as the dashboard
//! and writes the result to a file, for scripting and batch exports.
//!
//! ## Usage
//!
//! ```bash
//! flickmap-render --csv photos.csv --tag lyon --mode points \
//!     --format html --output lyon.html
//! ```

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use std::path::PathBuf;
use tracing::info;

use flickmap::config::Config;
use flickmap::dataset::DatasetCache;
use flickmap::export::{export_payload, ExportFormat};
use flickmap::filter::{apply_filters, DateRange, FilterConfig, NO_TAG_FILTER};
use flickmap::logging;
use flickmap::map::{MapMode, MapPayload};
use flickmap::sample::{clamp_max_points, sample_view};

/// Render options
#[derive(Debug)]
struct RenderArgs {
    csv_path: Option<String>,
    tag: Option<String>,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
    /// Disable the date filter instead of defaulting to the data span
    all_dates: bool,
    max_points: Option<usize>,
    mode: Option<MapMode>,
    format: ExportFormat,
    output: Option<PathBuf>,
    config_path: Option<PathBuf>,
}

impl Default for RenderArgs {
    fn default() -> Self {
        Self {
            csv_path: None,
            tag: None,
            from: None,
            to: None,
            all_dates: false,
            max_points: None,
            mode: None,
            format: ExportFormat::Json,
            output: None,
            config_path: None,
        }
    }
}

fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();
    if args.iter().skip(1).any(|a| a == "--help" || a == "-h") {
        print_help();
        return Ok(());
    }

    let render_args = match parse_args(&args[1..]) {
        Ok(parsed) => parsed,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            print_help();
            std::process::exit(1);
        }
    };

    logging::init_stderr()?;

    let config = match render_args.config_path {
        Some(ref path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    let summary = run(&render_args, &config)?;
    println!("{}", summary);
    Ok(())
}

fn parse_args(args: &[String]) -> Result<RenderArgs> {
    let mut parsed = RenderArgs::default();

    let mut i = 0;
    while i < args.len() {
        let flag = args[i].as_str();

        match flag {
            "--csv" => parsed.csv_path = Some(take_value(args, &mut i, flag)?.clone()),
            "--tag" | "-t" => parsed.tag = Some(take_value(args, &mut i, flag)?.clone()),
            "--from" => parsed.from = Some(parse_date(take_value(args, &mut i, flag)?)?),
            "--to" => parsed.to = Some(parse_date(take_value(args, &mut i, flag)?)?),
            "--all-dates" => parsed.all_dates = true,
            "--max-points" | "-n" => {
                let raw = take_value(args, &mut i, flag)?;
                parsed.max_points = Some(
                    raw.parse()
                        .with_context(|| format!("invalid --max-points `{}`", raw))?,
                );
            }
            "--mode" | "-m" => parsed.mode = Some(take_value(args, &mut i, flag)?.parse().map_err(anyhow::Error::msg)?),
            "--format" | "-f" => parsed.format = take_value(args, &mut i, flag)?.parse().map_err(anyhow::Error::msg)?,
            "--output" | "-o" => parsed.output = Some(PathBuf::from(take_value(args, &mut i, flag)?)),
            "--config" | "-c" => parsed.config_path = Some(PathBuf::from(take_value(args, &mut i, flag)?)),
            other => bail!("unknown argument: {}", other),
        }
        i += 1;
    }

    if parsed.output.is_none() {
        bail!("--output is required");
    }
    if parsed.all_dates && (parsed.from.is_some() || parsed.to.is_some()) {
        bail!("--all-dates cannot be combined with --from/--to");
    }
    Ok(parsed)
}

/// Step past `flag` to its value.
fn take_value<'a>(args: &'a [String], i: &mut usize, flag: &str) -> Result<&'a String> {
    *i += 1;
    args.get(*i).with_context(|| format!("{} requires a value", flag))
}

fn parse_date(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .with_context(|| format!("invalid date `{}` (expected YYYY-MM-DD)", raw))
}

/// Load, filter, sample and export. Returns the summary line.
fn run(args: &RenderArgs, config: &Config) -> Result<String> {
    let csv_path = args.csv_path.as_deref().unwrap_or(&config.csv_path);
    let Some(ref output) = args.output else {
        bail!("--output is required");
    };

    let mut cache = DatasetCache::new();
    let dataset = cache.get_or_load(csv_path)?;

    // Missing bounds default to the data span, like the dashboard
    let date_range = match dataset.taken_span() {
        Some(_) if args.all_dates => None,
        Some((start, end)) => Some(DateRange::new(args.from.unwrap_or(start), args.to.unwrap_or(end))),
        None => None,
    };

    let filter = FilterConfig::default()
        .with_tag_choice(args.tag.as_deref().unwrap_or(NO_TAG_FILTER))
        .with_date_range(date_range);
    let outcome = apply_filters(&dataset, &filter)?;

    let max_points = clamp_max_points(args.max_points.unwrap_or(config.sampling.default_max_points));
    let sampled = sample_view(&outcome.view, max_points, config.sampling.seed);
    let mode = args.mode.unwrap_or(config.map.default_mode);
    let payload = MapPayload::build(mode, &outcome.view, &sampled, &config.map);

    let written = export_payload(&payload, output, args.format)?;
    info!(
        mode = mode.label(),
        format = args.format.name(),
        rows = written,
        "Render complete"
    );

    Ok(outcome.summary())
}

fn print_help() {
    println!(
        r#"flickmap-render - Write a Flickr photo map without the dashboard

USAGE:
    flickmap-render --output PATH [OPTIONS]

OPTIONS:
    --csv PATH            CSV to load (default: config csv_path)
    --tag, -t TAG         Keep photos carrying TAG (whole tag, any case)
    --from YYYY-MM-DD     First taken day (default: earliest in data)
    --to YYYY-MM-DD       Last taken day, inclusive (default: latest in data)
    --all-dates           Do not filter on taken date
    --max-points, -n N    Sample cap for points mode (500-20000, default 5000)
    --mode, -m MODE       hex or points (default: config default_mode)
    --format, -f FORMAT   json, csv or html (default: json)
    --output, -o PATH     File to write
    --config, -c PATH     Path to config file
    --help, -h            Show this help message

ENVIRONMENT:
    FLICKMAP_CONFIG       Path to config file (overrides default location)
    FLICKMAP_LOG          Log filter (trace, debug, info, warn, error)

The summary line ("Rows after filters: N (from M)") is printed to stdout."#
    );
}
