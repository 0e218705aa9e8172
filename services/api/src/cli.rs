use crate::demo::{run_demo, run_evaluate, run_likert, DemoArgs, EvaluateArgs, LikertArgs};
use crate::server;
use boundary_profile::error::AppError;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "Boundary Profile",
    about = "Score boundary-crossing self-assessments and serve them over HTTP",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Score a JSON answer map against the scenario bank
    Evaluate(EvaluateArgs),
    /// Score a JSON map of 1-5 statement ratings
    Likert(LikertArgs),
    /// Walk through both instruments with scripted respondents
    Demo(DemoArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
    #[command(flatten)]
    pub(crate) profile: ProfileArgs,
}

/// Item bank and policy overrides shared by the serving and scoring commands.
#[derive(Args, Debug, Default, Clone)]
pub(crate) struct ProfileArgs {
    /// Load the item bank from a CSV file (item_id,prompt,option_label,category)
    #[arg(long)]
    pub(crate) bank_csv: Option<PathBuf>,
    /// Override the spread at or below which a profile counts as balanced
    #[arg(long, value_parser = parse_balance_threshold)]
    pub(crate) balance_threshold: Option<f64>,
}

fn parse_balance_threshold(raw: &str) -> Result<f64, String> {
    boundary_profile::config::parse_threshold("balance_threshold", raw).map_err(|err| err.to_string())
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Evaluate(args) => run_evaluate(args),
        Command::Likert(args) => run_likert(args),
        Command::Demo(args) => run_demo(args),
    }
}
