use clap::{Parser, Subcommand};
use log::info;
use std::error::Error;
use std::path::PathBuf;

use trimbench::batch::{self, Manifest};
use trimbench::filter::filter_min_length;
use trimbench::report::{write_json, Mode, Report};
use trimbench::sort::sort_stream;
use trimbench::{reduce, Config, Confusion, Evaluation, Evaluator};

#[derive(Parser)]
#[command(author, version, about = "Score adapter trimmers against simulated answer files")]
struct Args {
    /// JSON configuration file; flags given on the command line win.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// Sort a record file back into simulator generation order.
    Sort { input: PathBuf, output: PathBuf },

    /// Drop reads shorter than a minimum length, rewriting the file(s) in place.
    /// With two files, a pair is dropped when either mate is short.
    Filter {
        #[arg(num_args = 1..=2, required = true)]
        files: Vec<PathBuf>,
        #[arg(short = 'm', long)]
        min_length: Option<usize>,
    },

    /// Evaluate single-end trimmer output.
    EvalSe {
        #[arg(short = 'o', long)]
        output: PathBuf,
        #[arg(short = 'a', long)]
        answer: PathBuf,
        #[command(flatten)]
        opts: EvalOpts,
    },

    /// Evaluate paired-end trimmer output.
    EvalPe {
        #[arg(short = 'o', long, num_args = 2, required = true)]
        output: Vec<PathBuf>,
        #[arg(short = 'a', long, num_args = 2, required = true)]
        answer: Vec<PathBuf>,
        #[command(flatten)]
        opts: EvalOpts,
    },

    /// Turn raw TP/TN/FP/FN counts into metrics.
    Reduce {
        tp: u64,
        tn: u64,
        fp: u64,
        #[arg(value_name = "FN")]
        fn_: u64,
    },

    /// Score every run listed in a JSON manifest.
    Batch {
        manifest: PathBuf,
        #[arg(short = 't', long)]
        threads: Option<usize>,
        /// Write the batch report as JSON.
        #[arg(long)]
        json: Option<PathBuf>,
    },
}

#[derive(clap::Args)]
struct EvalOpts {
    /// Untrimmed read length.
    #[arg(short = 'l', long)]
    read_length: Option<usize>,
    /// Reject malformed records.
    #[arg(long)]
    strict: bool,
    /// Name shown in the report.
    #[arg(short = 'n', long, default_value = "trimmer")]
    name: String,
    /// Write the report as JSON.
    #[arg(long)]
    json: Option<PathBuf>,
}

impl EvalOpts {
    fn evaluator(&self, config: &Config) -> Evaluator {
        Evaluator::new(self.read_length.unwrap_or(config.read_length))
            .strict(self.strict || config.strict)
    }

    fn emit(&self, mode: Mode, eval: Evaluation) -> Result<(), Box<dyn Error>> {
        let report = Report::new(&self.name, mode, eval);
        println!("{report}");
        if let Some(path) = &self.json {
            write_json(&report, path)?;
        }
        Ok(())
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => Config::from_path(path)?,
        None => Config::default(),
    };

    match args.command {
        Cmd::Sort { input, output } => {
            let n = sort_stream(&input, &output)?;
            println!("sorted records: {n}");
        }
        Cmd::Filter { files, min_length } => {
            let min_length = min_length.unwrap_or(config.minimum_length);
            let stats = filter_min_length(&files, min_length)?;
            println!("records in: {}", stats.records_in);
            println!("records kept: {}", stats.records_kept);
        }
        Cmd::EvalSe {
            output,
            answer,
            opts,
        } => {
            let eval = opts.evaluator(&config).single_end(&output, &answer)?;
            opts.emit(Mode::Single, eval)?;
        }
        Cmd::EvalPe {
            output,
            answer,
            opts,
        } => {
            let eval = opts
                .evaluator(&config)
                .paired_end([&output[0], &output[1]], [&answer[0], &answer[1]])?;
            opts.emit(Mode::Paired, eval)?;
        }
        Cmd::Reduce { tp, tn, fp, fn_ } => {
            let m = reduce(&Confusion::new(tp, tn, fp, fn_));
            println!("ACC: {:.6}", m.acc);
            println!("SEN: {:.6}", m.sen);
            println!("SPC: {:.6}", m.spc);
            println!("PPV: {:.6}", m.ppv);
            println!("MCC: {:.6}", m.mcc);
        }
        Cmd::Batch {
            manifest,
            threads,
            json,
        } => {
            if let Some(t) = threads {
                config.thread_count = t;
            }
            let manifest = Manifest::from_path(&manifest)?;
            let report = batch::run(&manifest, &config)?;
            for r in &report.reports {
                println!("{r}");
            }
            for name in &report.skipped {
                println!("skipped: {name}");
            }
            for f in &report.failures {
                println!("failed: {}: {}", f.name, f.error);
            }
            if let Some(path) = json {
                write_json(&report, &path)?;
                info!("batch report written to {}", path.display());
            }
            if !report.failures.is_empty() {
                return Err(format!("{} run(s) failed", report.failures.len()).into());
            }
        }
    }

    Ok(())
}
