use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};
use joblog_core::models::{parse_day, MailStatus, ResumeFormat};

#[derive(Parser)]
#[command(name = "joblog")]
#[command(about = "Track job applications offline and sync them when you are online")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Optional path to local database file
    #[arg(long, global = true, value_name = "PATH")]
    pub db_path: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Record a new application
    #[command(alias = "new")]
    Add(AddArgs),
    /// List applications, newest first
    #[command(alias = "ls")]
    List {
        /// Case-insensitive company substring
        #[arg(long)]
        company: Option<String>,
        /// Earliest application date (inclusive, YYYY-MM-DD)
        #[arg(long, value_name = "DATE", value_parser = parse_date_arg)]
        from: Option<NaiveDate>,
        /// Latest application date (inclusive, YYYY-MM-DD)
        #[arg(long, value_name = "DATE", value_parser = parse_date_arg)]
        to: Option<NaiveDate>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show one application
    Show {
        /// Application ID or unique ID prefix
        id: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Change fields of an existing application
    Edit(EditArgs),
    /// Delete an application (removed remotely on the next push)
    #[command(alias = "rm")]
    Delete {
        /// Application ID or unique ID prefix
        id: String,
    },
    /// Send local changes and deletions to the remote store
    Push,
    /// Replace local data with the remote store's copy
    Sync {
        /// Let an empty remote replace a non-empty local store
        #[arg(long)]
        force: bool,
    },
    /// Show unsynced counts and last sync times
    Status,
    /// Export applications
    Export {
        /// Export format
        #[arg(long, value_enum, default_value_t = ExportFormat::Json)]
        format: ExportFormat,
        /// Optional output path (stdout when omitted)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
    /// Generate shell completion scripts
    Completions {
        /// Target shell
        #[arg(value_enum)]
        shell: CompletionShell,
        /// Optional output path (stdout when omitted)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
}

#[derive(Args, Debug, Clone, Default)]
pub struct AddArgs {
    /// Company name
    pub company: String,
    /// Application date (YYYY-MM-DD, defaults to today)
    #[arg(long, value_name = "DATE", value_parser = parse_date_arg)]
    pub date: Option<NaiveDate>,
    /// Resume variant sent (repeatable): ats, human
    #[arg(long = "resume", value_name = "FORMAT", value_parser = parse_resume_format_arg)]
    pub resume_format: Vec<ResumeFormat>,
    /// Platform used (repeatable), e.g. LinkedIn
    #[arg(long = "platform", value_name = "NAME")]
    pub platforms: Vec<String>,
    /// Mail status: pending, sent, failed
    #[arg(long, value_name = "STATUS", value_parser = parse_mail_status_arg)]
    pub mail_status: Option<MailStatus>,
    /// The application mail was delivered
    #[arg(long)]
    pub delivered: bool,
    /// Employer response, e.g. "Interview Scheduled"
    #[arg(long)]
    pub response: Option<String>,
    /// Use this id instead of generating one
    #[arg(long, value_name = "ID")]
    pub id: Option<String>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct EditArgs {
    /// Application ID or unique ID prefix
    pub id: String,
    /// New company name
    #[arg(long)]
    pub company: Option<String>,
    /// New application date (YYYY-MM-DD)
    #[arg(long, value_name = "DATE", value_parser = parse_date_arg)]
    pub date: Option<NaiveDate>,
    /// Replace resume variants (repeatable): ats, human
    #[arg(long = "resume", value_name = "FORMAT", value_parser = parse_resume_format_arg)]
    pub resume_format: Vec<ResumeFormat>,
    /// Remove all resume variants
    #[arg(long, conflicts_with = "resume_format")]
    pub clear_resume: bool,
    /// Replace platforms (repeatable)
    #[arg(long = "platform", value_name = "NAME")]
    pub platforms: Vec<String>,
    /// Remove all platforms
    #[arg(long, conflicts_with = "platforms")]
    pub clear_platforms: bool,
    /// New mail status: pending, sent, failed
    #[arg(long, value_name = "STATUS", value_parser = parse_mail_status_arg)]
    pub mail_status: Option<MailStatus>,
    /// Whether the application mail was delivered
    #[arg(long, value_name = "BOOL")]
    pub delivered: Option<bool>,
    /// New employer response
    #[arg(long)]
    pub response: Option<String>,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum ExportFormat {
    Json,
    Markdown,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum CompletionShell {
    Bash,
    Zsh,
    Fish,
}

fn parse_date_arg(value: &str) -> Result<NaiveDate, String> {
    parse_day(value).map_err(|error| error.to_string())
}

fn parse_resume_format_arg(value: &str) -> Result<ResumeFormat, String> {
    value.parse().map_err(|error: joblog_core::Error| error.to_string())
}

fn parse_mail_status_arg(value: &str) -> Result<MailStatus, String> {
    value.parse().map_err(|error: joblog_core::Error| error.to_string())
}
