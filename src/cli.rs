//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::Parser;

/// Extract a season race calendar from a motorsport website.
///
/// Tries the site's API (when known), embedded page JSON, captured JSON
/// endpoints and finally a generative model, and prints the canonical
/// season document as JSON.
#[derive(Parser, Debug)]
#[command(name = "racecal")]
#[command(author, version, about)]
pub struct Args {
    /// Season calendar page URL
    pub url: String,

    /// Series id (e.g. f1, motogp, wec, formula_e)
    #[arg(short, long, default_value = "custom")]
    pub series: String,

    /// Season year (defaults to the current year)
    #[arg(long, value_parser = clap::value_parser!(i32).range(1900..=2100))]
    pub season: Option<i32>,

    /// Keep only events that are upcoming or have no results yet
    #[arg(long)]
    pub upcoming: bool,

    /// Write the season document to FILE instead of stdout
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Write extraction metadata JSON to FILE
    #[arg(long, value_name = "FILE")]
    pub metadata_output: Option<PathBuf>,

    /// Config file (defaults to $XDG_CONFIG_HOME/racecal/config.toml)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Skip network response capture
    #[arg(long)]
    pub no_capture: bool,

    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const URL: &str = "https://www.fiawec.com/en/calendar/80";

    #[test]
    fn test_cli_url_only_uses_defaults() {
        let args = Args::try_parse_from(["racecal", URL]).unwrap();
        assert_eq!(args.url, URL);
        assert_eq!(args.series, "custom");
        assert!(args.season.is_none());
        assert!(!args.upcoming);
        assert!(args.output.is_none());
        assert!(!args.no_capture);
        assert_eq!(args.verbose, 0);
        assert!(!args.quiet);
    }

    #[test]
    fn test_cli_missing_url_returns_error() {
        let err = Args::try_parse_from(["racecal"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn test_cli_all_flags() {
        let args = Args::try_parse_from([
            "racecal",
            URL,
            "--series",
            "wec",
            "--season",
            "2026",
            "--upcoming",
            "-o",
            "wec.json",
            "--metadata-output",
            "meta.json",
            "--config",
            "racecal.toml",
            "--no-capture",
        ])
        .unwrap();
        assert_eq!(args.series, "wec");
        assert_eq!(args.season, Some(2026));
        assert!(args.upcoming);
        assert_eq!(args.output, Some(PathBuf::from("wec.json")));
        assert_eq!(args.metadata_output, Some(PathBuf::from("meta.json")));
        assert_eq!(args.config, Some(PathBuf::from("racecal.toml")));
        assert!(args.no_capture);
    }

    #[test]
    fn test_cli_season_out_of_range() {
        let err = Args::try_parse_from(["racecal", URL, "--season", "26"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }

    #[test]
    fn test_cli_verbose_flag_increments_count() {
        let args = Args::try_parse_from(["racecal", URL, "-vv"]).unwrap();
        assert_eq!(args.verbose, 2);
    }

    #[test]
    fn test_cli_quiet_flag_sets_quiet() {
        let args = Args::try_parse_from(["racecal", URL, "--quiet"]).unwrap();
        assert!(args.quiet);
    }

    #[test]
    fn test_cli_help_flag_shows_usage() {
        let err = Args::try_parse_from(["racecal", "--help"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);
    }

    #[test]
    fn test_cli_invalid_flag_returns_error() {
        let err = Args::try_parse_from(["racecal", URL, "--invalid-flag"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::UnknownArgument);
    }
}
