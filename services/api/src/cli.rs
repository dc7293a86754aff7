use crate::demo::{run_birthdays, run_demo, BirthdayArgs, DemoArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use activity_approvals::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Activity Approvals",
    about = "Route church activities to their approvers and fan out notifications",
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
    /// Create, approve and notify a sample activity against seeded in-memory data
    Demo(DemoArgs),
    /// Run the birthday reminder job once against seeded in-memory data
    Birthdays(BirthdayArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Demo(args) => run_demo(args).await,
        Command::Birthdays(args) => run_birthdays(args).await,
    }
}
