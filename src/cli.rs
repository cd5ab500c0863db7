use crate::genotype::GenotyperParams;
use crate::utils::Result;
use clap::{ArgAction, ArgGroup, Parser, Subcommand};
use env_logger::fmt::Color;
use log::{Level, LevelFilter};
use std::{
    io::Write,
    path::{Path, PathBuf},
};

#[derive(Parser)]
#[command(name="repeatgt",
          author="repeatgt developers",
          version,
          long_about = None,
          disable_help_subcommand = true,
          help_template = "{name} {version}\n{author}\n{about-section}\n{usage-heading}\n    {usage}\n\n{all-args}{after-help}",
          )]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[clap(short = 'v')]
    #[clap(long = "verbose")]
    #[clap(action = ArgAction::Count, help = "Specify multiple times to increase verbosity level (e.g., -vv for more verbosity)")]
    pub verbosity: u8,
}

#[derive(Subcommand)]
pub enum Command {
    #[clap(about = "Short Tandem Repeat Genotyper")]
    Genotype(GenotypeArgs),
}

#[derive(Parser, Debug)]
#[command(group(ArgGroup::new("genotype")))]
#[command(arg_required_else_help(true))]
pub struct GenotypeArgs {
    #[clap(required = true)]
    #[clap(short = 'g')]
    #[clap(long = "genome")]
    #[clap(help = "Path to reference genome FASTA")]
    #[clap(value_name = "FASTA")]
    #[arg(value_parser = check_file_exists)]
    pub genome_path: PathBuf,

    #[clap(required = true)]
    #[clap(short = 'b')]
    #[clap(long = "repeats")]
    #[clap(help = "BED file with repeat coordinates and structures")]
    #[clap(value_name = "REPEATS")]
    #[arg(value_parser = check_file_exists)]
    pub repeats_path: PathBuf,

    #[clap(required = true)]
    #[clap(short = 'a')]
    #[clap(long = "alignments")]
    #[clap(help = "Table of read pairs with their locus graph alignments")]
    #[clap(value_name = "ALIGNMENTS")]
    #[arg(value_parser = check_file_exists)]
    pub alignments_path: PathBuf,

    #[clap(required = true)]
    #[clap(short = 'o')]
    #[clap(long = "output-prefix")]
    #[clap(help = "Prefix for output files")]
    #[clap(value_name = "OUTPUT_PREFIX")]
    #[arg(value_parser = check_prefix_path)]
    pub output_prefix: String,

    #[clap(long = "karyotype")]
    #[clap(short = 'k')]
    #[clap(value_name = "KARYOTYPE")]
    #[clap(help = "Sample karyotype (XX or XY or file name)")]
    #[clap(default_value = "XX")]
    pub karyotype: String,

    #[clap(short = 't')]
    #[clap(long = "threads")]
    #[clap(help = "Number of threads")]
    #[clap(value_name = "THREADS")]
    #[clap(default_value = "1")]
    #[arg(value_parser = threads_in_range)]
    pub num_threads: usize,

    #[clap(help_heading("Advanced"))]
    #[clap(long = "flank-len")]
    #[clap(value_name = "FLANK_LEN")]
    #[clap(help = "Length of the flanking sequence in locus graphs")]
    #[clap(default_value = "1000")]
    #[arg(value_parser = flank_len_in_range)]
    pub flank_len: usize,

    #[clap(help_heading("Advanced"))]
    #[clap(long = "genome-wide-depth")]
    #[clap(value_name = "DEPTH")]
    #[clap(help = "Sample depth used for loci with rare repeats")]
    #[arg(value_parser = ensure_non_negative_float)]
    pub genome_wide_depth: Option<f64>,

    #[clap(help_heading("Advanced"))]
    #[clap(long = "min-locus-coverage")]
    #[clap(value_name = "DEPTH")]
    #[clap(help = "Minimum locus depth required for genotyping")]
    #[clap(default_value = "10")]
    #[arg(value_parser = ensure_non_negative_float)]
    pub min_locus_coverage: f64,

    #[clap(help_heading("Advanced"))]
    #[clap(long = "min-breakpoint-spanning-reads")]
    #[clap(value_name = "READS")]
    #[clap(help = "Minimum number of reads spanning each repeat breakpoint for a passing call")]
    #[clap(default_value = "5")]
    pub min_breakpoint_spanning_reads: u32,
}

impl GenotypeArgs {
    pub fn genotyper_params(&self) -> GenotyperParams {
        GenotyperParams {
            min_locus_coverage: self.min_locus_coverage,
            min_breakpoint_spanning_reads: self.min_breakpoint_spanning_reads,
        }
    }
}

pub fn init_verbose(args: &Cli) {
    let filter_level: LevelFilter = match args.verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    };

    env_logger::Builder::from_default_env()
        .format(|buf, record| {
            let level = record.level();
            let mut style = buf.style();
            match record.level() {
                Level::Error => style.set_color(Color::Red),
                Level::Warn => style.set_color(Color::Yellow),
                Level::Info => style.set_color(Color::Green),
                Level::Debug => style.set_color(Color::Blue),
                Level::Trace => style.set_color(Color::Cyan),
            };

            writeln!(
                buf,
                "{} [{}] - {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
                style.value(level),
                record.args()
            )
        })
        .filter_level(filter_level)
        .init();
}

fn check_prefix_path(s: &str) -> Result<String> {
    let path = Path::new(s);
    if let Some(parent_dir) = path.parent() {
        if !parent_dir.as_os_str().is_empty() && !parent_dir.exists() {
            return Err(format!("Path does not exist: {}", parent_dir.display()));
        }
    }
    Ok(s.to_string())
}

fn threads_in_range(s: &str) -> Result<usize> {
    let thread: usize = s
        .parse()
        .map_err(|_| format!("`{}` is not a valid thread number", s))?;
    if thread >= 1 {
        Ok(thread)
    } else {
        Err("Number of threads must be at least 1".into())
    }
}

fn flank_len_in_range(s: &str) -> Result<usize> {
    let flank_len: usize = s
        .parse()
        .map_err(|_| format!("`{}` is not a valid flank length", s))?;
    if flank_len >= 1 {
        Ok(flank_len)
    } else {
        Err("Flank length must be at least 1".into())
    }
}

fn check_file_exists(s: &str) -> Result<PathBuf> {
    let path = Path::new(s);
    if !path.exists() {
        Err(format!("File does not exist: {}", path.display()))
    } else {
        Ok(path.to_path_buf())
    }
}

fn ensure_non_negative_float(s: &str) -> Result<f64> {
    let value = s
        .parse::<f64>()
        .map_err(|e| format!("Could not parse float: {}", e))?;
    if !value.is_finite() || value < 0.0 {
        Err(format!("The value must be non-negative, got: {}", value))
    } else {
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_parsers() {
        assert_eq!(threads_in_range("4"), Ok(4));
        assert!(threads_in_range("0").is_err());
        assert!(flank_len_in_range("0").is_err());
        assert_eq!(ensure_non_negative_float("12.5"), Ok(12.5));
        assert!(ensure_non_negative_float("-1").is_err());
        assert!(ensure_non_negative_float("NaN").is_err());
        assert!(check_prefix_path("/nonexistent/dir/out").is_err());
        assert!(check_prefix_path("out").is_ok());
    }

    #[test]
    fn test_parse_genotype_args() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("input.txt");
        std::fs::write(&file, "").unwrap();
        let file = file.to_str().unwrap();

        let cli = Cli::try_parse_from([
            "repeatgt", "-v", "genotype", "-g", file, "-b", file, "-a", file, "-o", "out",
            "--min-breakpoint-spanning-reads", "3",
        ])
        .unwrap();
        assert_eq!(cli.verbosity, 1);
        let Command::Genotype(args) = cli.command;
        assert_eq!(args.num_threads, 1);
        assert_eq!(args.genome_wide_depth, None);
        assert_eq!(
            args.genotyper_params(),
            GenotyperParams {
                min_locus_coverage: 10.0,
                min_breakpoint_spanning_reads: 3,
            }
        );
    }
}
