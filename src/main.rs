use std::collections::BTreeMap;
use std::error::Error;
use std::fs;
use std::io::Read;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use serde::Serialize;

use hunkscope::{parse_diff, ChangedLines, ContextBuilder, DiagLevel, FsFetcher, StderrSink};

#[derive(Parser)]
#[command(
    name = "hunkscope",
    version,
    about = "Declaration-scoped context bundles from unified diffs"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Build the full context bundle for a diff against a source tree
    Bundle(BundleArgs),

    /// Print only the changed files and their added line numbers
    Lines(LinesArgs),
}

#[derive(Args)]
struct BundleArgs {
    #[arg(long, help = "Unified diff file, or '-' for stdin")]
    diff: String,

    #[arg(long, help = "Directory the diff's paths are relative to")]
    repo: PathBuf,

    #[arg(long, default_value = ".py", help = "File suffix to analyze")]
    suffix: String,

    #[arg(short, long, default_value_t = false, help = "Debug diagnostics on stderr")]
    verbose: bool,
}

#[derive(Args)]
struct LinesArgs {
    #[arg(long, help = "Unified diff file, or '-' for stdin")]
    diff: String,

    #[arg(long, default_value = ".py", help = "File suffix to analyze")]
    suffix: String,

    #[arg(long, default_value_t = false, help = "Emit JSON instead of plain text")]
    json: bool,
}

fn main() -> Result<(), Box<dyn Error>> {
    match Cli::parse().command {
        Command::Bundle(args) => run_bundle(args),
        Command::Lines(args) => run_lines(args),
    }
}

fn run_bundle(args: BundleArgs) -> Result<(), Box<dyn Error>> {
    let diff = read_diff(&args.diff)?;
    let sink = StderrSink::new(if args.verbose {
        DiagLevel::Debug
    } else {
        DiagLevel::Warn
    });

    let changed = parse_diff(&diff, |path| path.ends_with(&args.suffix), &sink);

    let fetcher = FsFetcher::new(args.repo);
    let bundle = ContextBuilder::new(&fetcher, &sink).build(&changed);

    println!("{}", bundle);
    Ok(())
}

fn run_lines(args: LinesArgs) -> Result<(), Box<dyn Error>> {
    let diff = read_diff(&args.diff)?;
    let sink = StderrSink::new(DiagLevel::Warn);

    let changed = parse_diff(&diff, |path| path.ends_with(&args.suffix), &sink);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&LinesReport::from(&changed))?);
    } else {
        for (path, lines) in &changed {
            let rendered: Vec<String> = lines.iter().map(usize::to_string).collect();
            println!("{}: {}", path, rendered.join(", "));
        }
    }

    Ok(())
}

#[derive(Serialize)]
struct LinesReport<'a> {
    files: usize,
    changed: BTreeMap<&'a str, Vec<usize>>,
}

impl<'a> LinesReport<'a> {
    fn from(changed: &'a ChangedLines) -> Self {
        Self {
            files: changed.len(),
            changed: changed
                .iter()
                .map(|(path, lines)| (path.as_str(), lines.iter().copied().collect()))
                .collect(),
        }
    }
}

fn read_diff(source: &str) -> Result<String, Box<dyn Error>> {
    if source == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        Ok(buf)
    } else {
        Ok(fs::read_to_string(source)?)
    }
}
