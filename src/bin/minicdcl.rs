use std::error::Error;
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use cpu_time::ProcessTime;
use log::{info, LevelFilter};

use minicdcl_lib::{dimacs, CdclSolver, Config, HeuristicKind};

#[derive(Parser)]
#[command(about = "CDCL satisfiability solver for DIMACS CNF files")]
struct Args {
    /// DIMACS CNF input file
    file: PathBuf,

    /// Branching heuristic
    #[arg(short = 'H', long, value_enum, default_value = "first")]
    heuristic: HeuristicKind,

    /// Number of timed solve iterations (the solver is reset in between)
    #[arg(short, long, default_value_t = 1)]
    iterations: u32,

    /// Seed for the random heuristic
    #[arg(long)]
    seed: Option<u64>,

    /// Write the final verdict to this file
    #[arg(long)]
    result_out: Option<PathBuf>,

    /// Append per-iteration statistics to this CSV file
    #[arg(long)]
    stats_out: Option<PathBuf>,

    /// Increase log verbosity (-v: debug, -vv: trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> ExitCode {
    let args = Args::parse();

    env_logger::builder()
        .format_timestamp(None)
        .format_module_path(false)
        .filter_level(match args.verbose {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        })
        .init();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<(), Box<dyn Error>> {
    let input = fs::read_to_string(&args.file)?;
    let db = dimacs::parse(&input)?;
    info!(
        "{}: {} clauses over {} variables",
        args.file.display(),
        db.clause_count(),
        db.variable_count()
    );

    let config = Config {
        heuristic: args.heuristic,
        seed: args.seed,
        iterations: args.iterations.max(1),
        ..Config::default()
    };
    let mut solver = CdclSolver::with_config(db, &config);

    let mut stats_file = match &args.stats_out {
        Some(path) => {
            let mut file = fs::File::create(path)?;
            writeln!(
                file,
                "file,heuristic,iteration,cpu_time_us,decisions,conflicts,learnt,peak_rss_kb"
            )?;
            Some(file)
        }
        None => None,
    };

    let mut result = String::new();
    for iteration in 0..config.iterations {
        if iteration > 0 {
            solver.reset();
        }

        let start = ProcessTime::now();
        result = solver.evaluate()?;
        let elapsed = start.elapsed();

        let stats = *solver.stats();
        info!(
            "iteration {}: {} us, {} decisions, {} conflicts, {} learnt clauses",
            iteration,
            elapsed.as_micros(),
            stats.decisions,
            stats.conflicts,
            stats.learnt_clauses
        );

        if let Some(file) = &mut stats_file {
            writeln!(
                file,
                "{},{:?},{},{},{},{},{},{}",
                args.file.display(),
                args.heuristic,
                iteration,
                elapsed.as_micros(),
                stats.decisions,
                stats.conflicts,
                stats.learnt_clauses,
                peak_rss_kb().unwrap_or(0)
            )?;
        }
    }

    print!("{result}");
    if !result.ends_with('\n') {
        println!();
    }

    if let Some(path) = &args.result_out {
        fs::write(path, &result)?;
    }

    Ok(())
}

fn peak_rss_kb() -> Option<u64> {
    let process = procfs::process::Process::myself().ok()?;
    process.status().ok()?.vmhwm
}
