use crate::demo::{
    run_bulk_create, run_credential_status, run_demo, run_progress, BulkCreateArgs,
    CredentialStatusArgs, DemoArgs, ProgressArgs,
};
use crate::server;
use clap::{Args, Parser, Subcommand};
use elec_mate::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Elec-Mate",
    about = "Run the Elec-Mate apprentice portfolio and Elec-ID service from the command line",
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
    /// Work with qualification trees exported as CSV
    Qualification {
        #[command(subcommand)]
        command: QualificationCommand,
    },
    /// Derive credential and ECS card status for an expiry date
    Credentials {
        #[command(subcommand)]
        command: CredentialsCommand,
    },
    /// Manage Elec-ID profiles for an employer roster
    ElecId {
        #[command(subcommand)]
        command: ElecIdCommand,
    },
    /// Run an end-to-end demo of evidence capture, progress and Elec-ID creation
    Demo(DemoArgs),
}

#[derive(Subcommand, Debug)]
enum QualificationCommand {
    /// Report evidenced progress against a qualification tree
    Progress(ProgressArgs),
}

#[derive(Subcommand, Debug)]
enum CredentialsCommand {
    /// Show training and ECS status for an expiry date
    Status(CredentialStatusArgs),
}

#[derive(Subcommand, Debug)]
enum ElecIdCommand {
    /// Create Elec-IDs for every employee on a roster CSV
    BulkCreate(BulkCreateArgs),
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
        Command::Qualification {
            command: QualificationCommand::Progress(args),
        } => run_progress(args),
        Command::Credentials {
            command: CredentialsCommand::Status(args),
        } => run_credential_status(args),
        Command::ElecId {
            command: ElecIdCommand::BulkCreate(args),
        } => run_bulk_create(args),
        Command::Demo(args) => run_demo(args).await,
    }
}
