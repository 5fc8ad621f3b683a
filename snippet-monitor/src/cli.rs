//! Command-line surface of the `snippet-monitor` binary.

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Serve the report and run the cron trigger (default)
    Serve,
    /// Audit once and print the table. Persisted state is not touched
    Check,
    /// Run one scheduled audit: diff, commit and notify
    RunOnce,
}

impl Cli {
    /// Subcommand to run, `serve` when none was given.
    pub fn command_or_default(&self) -> Command {
        self.command.unwrap_or(Command::Serve)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(&["snippet-monitor"], Command::Serve)]
    #[case(&["snippet-monitor", "serve"], Command::Serve)]
    #[case(&["snippet-monitor", "check"], Command::Check)]
    #[case(&["snippet-monitor", "run-once"], Command::RunOnce)]
    fn test_parse_subcommand(#[case] argv: &[&str], #[case] expected: Command) {
        let cli = Cli::try_parse_from(argv).unwrap();
        assert_eq!(cli.command_or_default(), expected);
    }

    #[test]
    fn test_unknown_subcommand_rejected() {
        assert!(Cli::try_parse_from(["snippet-monitor", "frobnicate"]).is_err());
    }

    #[test]
    fn test_cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
