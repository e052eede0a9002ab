use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use ud_queries::presets::MAX_JOIN_WINDOW_DAYS;

/// Browse, filter and edit bot users through the admin API
#[derive(Parser)]
#[command(name = "userdesk", author, version, about, long_about = None)]
pub struct Cli {
    /// Config file (TOML, JSON or YAML); USERDESK_* variables still apply
    #[arg(short, long, global = true, env = "USERDESK_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Sign in and store the bearer token
    Login {
        #[arg(short, long)]
        username: String,

        #[arg(short, long, env = "USERDESK_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Forget the stored token
    Logout,
    /// List, show and edit users
    Users {
        #[command(subcommand)]
        command: UsersCommand,
    },
    /// Print the API parameters a location query string translates to
    Encode {
        /// Location query string, e.g. "page=2&order_by=-score&rules=..."
        #[arg(default_value = "")]
        location: String,

        /// Encode the row-count request instead of the listing request
        #[arg(long)]
        count: bool,
    },
    /// Show the field catalog and the operators each field accepts
    Fields {
        /// Only fields usable for sorting
        #[arg(long)]
        sortable: bool,
    },
    /// Print the statistics page counts
    Stats {
        /// Extra "joined within N days" windows
        #[arg(
            long = "days",
            value_parser = clap::value_parser!(i64).range(1..=MAX_JOIN_WINDOW_DAYS)
        )]
        days: Vec<i64>,
    },
}

#[derive(Subcommand)]
pub enum UsersCommand {
    /// List one page of users
    List(ListArgs),
    /// Show a single user
    Show {
        user_id: i64,

        /// Print the raw JSON record
        #[arg(long)]
        json: bool,

        /// Detail link printed by `users list --links`; shows the listing
        /// location to go back to
        #[arg(long, value_name = "LINK")]
        from: Option<String>,
    },
    /// Edit a user
    Update {
        user_id: i64,

        /// Field assignment, e.g. `--set score=10 --set is_ban=false`
        #[arg(long = "set", value_name = "FIELD=VALUE", required = true)]
        assignments: Vec<String>,
    },
}

#[derive(Args)]
pub struct ListArgs {
    /// Start from a shared location query string
    #[arg(short, long, default_value = "")]
    pub location: String,

    /// Replace the rules with these JSON rules, e.g.
    /// `{"field":"score","operator":"gt","value":10}`
    #[arg(short, long = "rule", value_name = "JSON")]
    pub rules: Vec<String>,

    /// Sort, e.g. `-join_date`
    #[arg(short, long, allow_hyphen_values = true)]
    pub sort: Option<String>,

    #[arg(long)]
    pub search: Option<String>,

    #[arg(short, long)]
    pub page: Option<u32>,

    #[arg(long)]
    pub size: Option<u32>,

    /// Print the raw JSON response
    #[arg(long)]
    pub json: bool,

    /// Print each user's detail link
    #[arg(long)]
    pub links: bool,
}
