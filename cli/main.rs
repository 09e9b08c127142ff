#![deny(unused_variables)]
#![deny(dead_code)]
#![deny(unused_imports)]

use clap::{Parser, Subcommand};
use ndarray::Array1;
use std::error::Error;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::process;

use psis::io::{read_weights, write_weights};
use psis::{K_MIN, PsisOptions, gpinv};

#[derive(Parser)]
#[command(
    name = "psis",
    about = "Pareto-smoothed importance sampling for log importance weights",
    long_about = "Fits a Generalized Pareto Distribution to the right tail of a vector of \
                  log importance weights, smooths the tail, renormalises, and reports the \
                  fitted shape k as a reliability diagnostic."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Smooth a vector of log weights (one per line)
    #[command(about = "Smooth log weights (outputs: smoothed log weights, one per line)")]
    Smooth {
        /// Path to a text file with one log weight per line
        input: PathBuf,

        /// Relative efficiency N_eff / N of the draws (overrides --config)
        #[arg(long, value_name = "R")]
        r_eff: Option<f64>,

        /// TOML options file
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// Write smoothed weights here instead of stdout
        #[arg(long, short, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Evaluate the GPD inverse CDF
    #[command(about = "Print GPD quantiles for the given probabilities")]
    Quantile {
        /// Shape parameter
        #[arg(long, allow_negative_numbers = true)]
        k: f64,

        /// Scale parameter
        #[arg(long)]
        sigma: f64,

        /// Probabilities in [0, 1]
        #[arg(required = true)]
        probabilities: Vec<f64>,
    },

    /// Print the default options file
    DefaultConfig,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    if let Err(e) = run(cli.command) {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run(command: Commands) -> Result<(), Box<dyn Error>> {
    match command {
        Commands::Smooth {
            input,
            r_eff,
            config,
            output,
        } => {
            let mut options = match config {
                Some(path) => PsisOptions::load(&path)?,
                None => PsisOptions::default(),
            };
            if let Some(r) = r_eff {
                options.r_eff = r;
                options.validate()?;
            }

            let mut weights = read_weights(&input)?;
            log::info!(
                "Read {} log weights from {}",
                weights.len(),
                input.display()
            );
            let k = options.smooth(weights.view_mut())?;
            report_k(k);

            let writer: Box<dyn Write> = match output {
                Some(path) => Box::new(BufWriter::new(File::create(path)?)),
                None => Box::new(io::stdout().lock()),
            };
            write_weights(writer, weights.view())?;
        }
        Commands::Quantile {
            k,
            sigma,
            probabilities,
        } => {
            let p = Array1::from(probabilities);
            let quantiles = gpinv(p.view(), k, sigma);
            let mut out = io::stdout().lock();
            for (pi, qi) in p.iter().zip(quantiles.iter()) {
                writeln!(out, "{pi}\t{qi}")?;
            }
        }
        Commands::DefaultConfig => {
            print!("{}", PsisOptions::default().to_toml_string()?);
        }
    }
    Ok(())
}

fn report_k(k: f64) {
    if k.is_infinite() {
        log::warn!("Tail too short to fit; weights were shifted by their maximum only (k = inf)");
    } else if k >= K_MIN {
        log::info!("Pareto k = {k:.4}; tail smoothed");
    } else {
        log::info!("Pareto k = {k:.4}; below {K_MIN:.4}, raw tail kept");
    }
}
