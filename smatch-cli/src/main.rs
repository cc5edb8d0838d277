use clap::Parser;
use serde::{Deserialize, Serialize};
use smatch::{MatchOptions, Matcher};
use std::fs;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

const EXAMPLE_JSON: &str = include_str!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/config.example.json"
));

#[derive(Parser, Debug)]
#[command(author, version, about = "smatch CLI (JSON config driven)")]
struct Cli {
    /// Path to the JSON configuration file.
    #[arg(short, long, value_name = "FILE", default_value = "config.json")]
    config: PathBuf,
    /// Print an example config and exit.
    #[arg(long)]
    print_example: bool,
    /// Enable tracing output for performance profiling.
    #[arg(long)]
    trace: bool,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct Config {
    primary_path: String,
    secondary_path: String,
    output_path: Option<String>,
    nside: u64,
    maxmatch: i64,
    self_match: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            primary_path: String::new(),
            secondary_path: String::new(),
            output_path: None,
            nside: 64,
            maxmatch: 0,
            self_match: false,
        }
    }
}

#[derive(Debug, Serialize)]
struct MatchRecordJson {
    cat_ind: usize,
    input_ind: usize,
    cosdist: f64,
}

#[derive(Debug, Serialize)]
struct Output {
    nmatches: u64,
    hpix_nside: u64,
    hpix_area: f64,
    matches_head: Vec<MatchRecordJson>,
}

/// Reads whitespace-separated rows of `columns` f64 fields per line.
fn load_columns(path: &str, columns: usize) -> Result<Vec<Vec<f64>>, Box<dyn std::error::Error>> {
    let file = fs::File::open(path)?;
    let reader = BufReader::new(file);
    let mut out = vec![Vec::new(); columns];
    for line in reader.lines() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < columns {
            return Err(format!("expected {columns} fields, got {}: {line:?}", fields.len()).into());
        }
        for (col, field) in fields.iter().take(columns).enumerate() {
            out[col].push(field.parse::<f64>()?);
        }
    }
    Ok(out)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if cli.trace {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env().add_directive("smatch=info".parse()?))
            .with_target(false)
            .init();
    }

    if cli.print_example {
        println!("{EXAMPLE_JSON}");
        return Ok(());
    }

    let config_text = fs::read_to_string(&cli.config)?;
    let config: Config = serde_json::from_str(&config_text)?;
    if config.primary_path.is_empty() || config.secondary_path.is_empty() {
        return Err("primary_path and secondary_path must be set in the config".into());
    }

    let mut primary = load_columns(&config.primary_path, 3)?;
    let radius = primary.pop().unwrap();
    let dec = primary.pop().unwrap();
    let ra = primary.pop().unwrap();

    let mut secondary = load_columns(&config.secondary_path, 2)?;
    let sec_dec = secondary.pop().unwrap();
    let sec_ra = secondary.pop().unwrap();

    let mut matcher = Matcher::new(config.nside, &ra, &dec, &radius)?;
    let opts = MatchOptions::new(config.maxmatch, config.self_match);

    match config.output_path {
        Some(path) => {
            matcher.match2file(&opts, &sec_ra, &sec_dec, &path)?;
            let summary = Output {
                nmatches: matcher.nmatches(),
                hpix_nside: matcher.hpix_nside(),
                hpix_area: matcher.hpix_area(),
                matches_head: Vec::new(),
            };
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        None => {
            matcher.match_in_memory(&opts, &sec_ra, &sec_dec)?;
            let mut matches = Vec::new();
            matcher.copy_matches(&mut matches);
            let matches_head = matches
                .iter()
                .take(20)
                .map(|m| MatchRecordJson {
                    cat_ind: m.cat_ind,
                    input_ind: m.input_ind,
                    cosdist: m.cosdist,
                })
                .collect();
            let summary = Output {
                nmatches: matcher.nmatches(),
                hpix_nside: matcher.hpix_nside(),
                hpix_area: matcher.hpix_area(),
                matches_head,
            };
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
    }

    Ok(())
}
