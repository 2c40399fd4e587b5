use std::path::Path;

use anyhow::Result;
use clap::ArgMatches;

use mtcov_coverage::{CoverageOptions, coverage_main};

/// Collect the coverage options from parsed arguments.
pub fn options_from_matches(matches: &ArgMatches) -> CoverageOptions {
    CoverageOptions {
        covered_only: matches.get_flag("covered-only"),
        compact: matches.get_flag("compact"),
        max_insert_size: matches
            .get_one::<u64>("max-insert-size")
            .copied()
            .unwrap_or_default(),
    }
}

/// Matches items from CLAP args before running coverage_main
pub fn run_coverage(matches: &ArgMatches) -> Result<()> {
    let alignments = matches
        .get_one::<String>("alignments")
        .expect("alignments path is required");
    let reference = matches.get_one::<String>("reference").map(Path::new);
    let output = matches.get_one::<String>("output").map(Path::new);
    let num_threads = matches.get_one::<usize>("threads").copied().unwrap_or(1);

    let options = options_from_matches(matches);

    coverage_main(alignments, reference, output, &options, num_threads)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::*;

    use crate::coverage::cli::create_coverage_cli;

    #[rstest]
    fn test_defaults() {
        let matches = create_coverage_cli()
            .try_get_matches_from(["coverage", "reads.sam", "ref.fai"])
            .unwrap();
        assert_eq!(options_from_matches(&matches), CoverageOptions::default());
        assert_eq!(matches.get_one::<usize>("threads").copied(), Some(1));
    }

    #[rstest]
    fn test_all_options() {
        let matches = create_coverage_cli()
            .try_get_matches_from([
                "coverage",
                "reads.bam",
                "--covered-only",
                "--compact",
                "--max-insert-size",
                "500",
                "-o",
                "out.tsv",
            ])
            .unwrap();
        assert_eq!(
            options_from_matches(&matches),
            CoverageOptions {
                covered_only: true,
                compact: true,
                max_insert_size: 500,
            }
        );
        assert!(matches.get_one::<String>("reference").is_none());
        assert_eq!(
            matches.get_one::<String>("output").map(String::as_str),
            Some("out.tsv")
        );
    }

    #[rstest]
    #[case("0")]
    #[case("-5")]
    #[case("big")]
    fn test_rejects_bad_max_insert_size(#[case] value: &str) {
        let result = create_coverage_cli().try_get_matches_from([
            "coverage",
            "reads.sam",
            "ref.fai",
            "--max-insert-size",
            value,
        ]);
        assert!(result.is_err());
    }
}
