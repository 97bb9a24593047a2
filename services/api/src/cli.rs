use crate::commands::{
    run_application, run_init, run_internship, run_user, ApplicationCommand, InitArgs,
    InternshipCommand, UserCommand,
};
use crate::infra::{build_api, open_store};
use crate::server;
use clap::{Args, Parser, Subcommand};
use placement::config::AppConfig;
use placement::error::AppError;
use placement::telemetry;

#[derive(Parser, Debug)]
#[command(
    name = "placement",
    about = "Track internship postings, student applications and placement decisions",
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
    /// Manage user accounts
    User {
        #[command(subcommand)]
        command: UserCommand,
    },
    /// Post and browse internships
    Internship {
        #[command(subcommand)]
        command: InternshipCommand,
    },
    /// Apply to internships and move applications through review
    Application {
        #[command(subcommand)]
        command: ApplicationCommand,
    },
    /// Recreate the database and seed the default accounts
    Init(InitArgs),
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

    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;

    if let Command::Serve(args) = command {
        return server::run(config, args).await;
    }

    let store = open_store(&config)?;
    let api = build_api(store, config.workflow.transition_policy);
    let lines = match command {
        Command::User { command } => run_user(&api, command),
        Command::Internship { command } => run_internship(&api, command),
        Command::Application { command } => run_application(&api, command),
        Command::Init(args) => run_init(&api, args)?,
        Command::Serve(_) => Vec::new(),
    };
    for line in lines {
        println!("{line}");
    }
    Ok(())
}
