// Progressions CLI: search for smoothly voiced chord progressions.
//
// Loads a `SearchConfig` (JSON file or defaults), applies command-line
// overrides, runs the search and prints the best progressions with their
// roman numerals and total voice movement. Logs go to stderr through
// `tracing`; set RUST_LOG=debug for cache and graph statistics.
//
// Usage:
//   cargo run -p musictool_voicing --bin progressions -- [--config search.json]
//     [--root NOTE] [--scale KIND] [--length N] [--voices N] [--range LOW:HIGH]
//     [--limit N] [--seed N] [--top N] [--no-loop] [--json] [--graph CHORD]
//
// `--graph C3_E3_G3` searches the single-voice transition graph from that
// chord instead of the diatonic voicing pool.

use musictool_theory::{SpecificChord, SpecificNote};
use musictool_voicing::{ProgressionSearch, RankedProgression, SearchConfig, SearchError};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();
    if let Err(e) = run(&args) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn run(args: &[String]) -> Result<(), SearchError> {
    let mut config = match parse_flag::<String>(args, "--config") {
        Some(path) => SearchConfig::load(&path)?,
        None => SearchConfig::default(),
    };
    apply_overrides(&mut config, args)?;

    let top: usize = parse_flag(args, "--top").unwrap_or(10);
    let json = args.iter().any(|a| a == "--json");
    let graph_start: Option<SpecificChord> = parse_required(args, "--graph")?;

    let search = ProgressionSearch::new(config)?;
    let results = match &graph_start {
        Some(start) => search.run_from_graph(start)?,
        None => search.run()?,
    };

    if json {
        let shown: Vec<&RankedProgression> = results.iter().take(top).collect();
        println!("{}", serde_json::to_string_pretty(&shown)?);
        return Ok(());
    }

    let config = search.config();
    println!("=== Progressions ===");
    println!("Scale: {}", config.scale());
    println!(
        "Range: {}..={}, {} voices, {} chords{}",
        config.range_start,
        config.range_stop,
        config.voices,
        config.length,
        if config.looped { ", looped" } else { "" }
    );
    if let Some(start) = &graph_start {
        println!("Graph start: {start}");
    }
    println!("Found: {}", results.len());
    println!();

    for (i, ranked) in results.iter().take(top).enumerate() {
        let degrees = ranked.progression.degrees(config.scale()).join(" ");
        println!("{:>3}. [{:>2}] {:<24} {}", i + 1, ranked.distance, degrees, ranked.progression);
    }
    Ok(())
}

fn apply_overrides(config: &mut SearchConfig, args: &[String]) -> Result<(), SearchError> {
    if let Some(root) = parse_required(args, "--root")? {
        config.root = root;
    }
    if let Some(kind) = parse_required(args, "--scale")? {
        config.scale = kind;
    }
    if let Some(length) = parse_flag(args, "--length") {
        config.length = length;
    }
    if let Some(voices) = parse_flag(args, "--voices") {
        config.voices = voices;
    }
    if let Some(range) = parse_flag::<String>(args, "--range") {
        let (low, high) = range
            .split_once(':')
            .ok_or_else(|| SearchError::Config(format!("--range expects LOW:HIGH, got {range}")))?;
        config.range_start = low.parse::<SpecificNote>()?;
        config.range_stop = high.parse::<SpecificNote>()?;
    }
    if let Some(limit) = parse_flag::<usize>(args, "--limit") {
        // 0 means no limit.
        config.limit = (limit > 0).then_some(limit);
    }
    if let Some(seed) = parse_flag(args, "--seed") {
        config.seed = Some(seed);
    }
    if args.iter().any(|a| a == "--no-loop") {
        config.looped = false;
    }
    Ok(())
}

fn parse_flag<T: std::str::FromStr>(args: &[String], flag: &str) -> Option<T> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .and_then(|v| v.parse().ok())
}

/// Like `parse_flag`, but a value that fails to parse is an error rather
/// than silently ignored.
fn parse_required<T>(args: &[String], flag: &str) -> Result<Option<T>, SearchError>
where
    T: std::str::FromStr,
    SearchError: From<T::Err>,
{
    match parse_flag::<String>(args, flag) {
        Some(value) => Ok(Some(value.parse()?)),
        None => Ok(None),
    }
}
