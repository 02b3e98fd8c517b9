//! CLI definition using clap

use clap::{Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Output format for results
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Table => write!(f, "table"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "takeoff")]
#[command(version)]
#[command(about = "Quantity takeoff and cost summary for small site works")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Session file. Uses config value, then ./takeoff.ashproj.json, if not specified.
    #[arg(long, short = 's', global = true)]
    pub session: Option<PathBuf>,

    /// Output format (json, table). Uses config value if not specified.
    #[arg(long, short = 'f', global = true)]
    pub format: Option<OutputFormat>,

    /// Verbose output (-v debug, -vv trace)
    #[arg(long, short = 'v', global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create a session file with default inputs
    New {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// List the block catalog
    Blocks,

    /// Show stored inputs for one component, or all of them
    Show {
        /// Component (masonry, fill, concrete, earthworks, labor, equipment)
        component: Option<String>,
    },

    /// Set inputs, e.g. `masonry.wall_length=10 labor.workforce.0.workers=4`
    Set {
        /// One or more `component.field=value` assignments
        #[arg(required = true)]
        assignments: Vec<String>,

        /// Save without recomputing the edited components
        #[arg(long)]
        no_calc: bool,
    },

    /// Restore defaults for one component, or every component
    Reset {
        component: Option<String>,
    },

    /// Recompute one component and show its result
    Calc {
        component: String,
    },

    /// Recompute everything and show the project summary
    Summary,

    /// Write the detailed cost report
    Report {
        /// Output file (prints to stdout if not specified)
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },

    /// Edit the equipment fleet list
    Fleet {
        #[command(subcommand)]
        action: FleetAction,
    },

    /// Manage configuration
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,

        /// Write the default configuration file
        #[arg(long)]
        init: bool,

        /// Set default session file
        #[arg(long)]
        set_session: Option<PathBuf>,

        /// Set default output format
        #[arg(long)]
        set_output: Option<OutputFormat>,

        /// Set currency symbol used in summaries
        #[arg(long)]
        set_currency: Option<String>,

        /// Set a custom block catalog (TOML)
        #[arg(long)]
        set_catalog: Option<PathBuf>,

        /// Reset to defaults
        #[arg(long)]
        reset: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum FleetAction {
    /// List fleet rows with their indices
    List,

    /// Append a row
    Add {
        /// Plant name
        name: String,

        /// Hire rate per operating hour
        #[arg(long, default_value_t = 0.0)]
        rate: f64,

        /// Fuel burn (litres per hour)
        #[arg(long, default_value_t = 0.0)]
        fuel: f64,

        /// Units on site
        #[arg(long, default_value_t = 1)]
        count: u32,
    },

    /// Remove a row by index
    Remove {
        index: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_set_with_globals() {
        let cli = Cli::parse_from([
            "takeoff",
            "set",
            "masonry.wall_length=10",
            "labor.days=20",
            "--session",
            "job.ashproj.json",
            "-f",
            "json",
            "-vv",
        ]);
        assert_eq!(cli.format, Some(OutputFormat::Json));
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.session, Some(PathBuf::from("job.ashproj.json")));
        match cli.command {
            Commands::Set { assignments, no_calc } => {
                assert_eq!(assignments, vec!["masonry.wall_length=10", "labor.days=20"]);
                assert!(!no_calc);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_fleet_add() {
        let cli = Cli::parse_from(["takeoff", "fleet", "add", "Grader", "--rate", "75", "--fuel", "16"]);
        match cli.command {
            Commands::Fleet {
                action: FleetAction::Add { name, rate, fuel, count },
            } => {
                assert_eq!(name, "Grader");
                assert_eq!(rate, 75.0);
                assert_eq!(fuel, 16.0);
                assert_eq!(count, 1);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_set_requires_assignment() {
        assert!(Cli::try_parse_from(["takeoff", "set"]).is_err());
    }
}
