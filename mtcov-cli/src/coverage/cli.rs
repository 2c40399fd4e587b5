use clap::{Arg, ArgAction, Command};

pub const COVERAGE_CMD: &str = "coverage";

/// Creates the coverage CLI Command object
pub fn create_coverage_cli() -> Command {
    Command::new(COVERAGE_CMD)
        .about("Calculate per-strand sequencing depth at each coordinate of a circular genome")
        .arg(
            Arg::new("alignments")
                .help("Aligned paired-end reads: SAM, SAM.gz, BAM, or - for SAM on stdin")
                .required(true),
        )
        .arg(
            Arg::new("reference")
                .help("Reference index (.fai or chrom sizes). Optional for BAM, whose header is used")
                .required(false),
        )
        .arg(
            Arg::new("output")
                .long("output")
                .short('o')
                .help("Output file (default: stdout)")
                .required(false),
        )
        .arg(
            Arg::new("covered-only")
                .long("covered-only")
                .action(ArgAction::SetTrue)
                .help("Only output positions or runs with non-zero depth"),
        )
        .arg(
            Arg::new("compact")
                .long("compact")
                .action(ArgAction::SetTrue)
                .help("Output runs of constant depth instead of one row per base"),
        )
        .arg(
            Arg::new("max-insert-size")
                .long("max-insert-size")
                .value_parser(clap::value_parser!(u64).range(1..))
                .default_value("1000")
                .help("Maximum insert size allowed after circular reduction"),
        )
        .arg(
            Arg::new("threads")
                .long("threads")
                .short('p')
                .value_parser(clap::value_parser!(usize))
                .default_value("1")
                .help("Number of threads used to reconstruct strand profiles"),
        )
}
