use crate::report::{
    run_representatives_report, run_topics_report, RepresentativesReportArgs, TopicsReportArgs,
};
use crate::server;
use civic_pulse::error::AppError;
use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "Civic Pulse",
    about = "Serve and inspect district activity heatmaps from the command line",
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
    /// Render a heatmap report as JSON on stdout
    Heatmap {
        #[command(subcommand)]
        command: HeatmapCommand,
    },
}

#[derive(Subcommand, Debug)]
enum HeatmapCommand {
    /// Per-district scores for a representative activity metric
    Representatives(RepresentativesReportArgs),
    /// Topic-tagged sponsorship volume per district
    Topics(TopicsReportArgs),
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
        Command::Heatmap {
            command: HeatmapCommand::Representatives(args),
        } => run_representatives_report(args),
        Command::Heatmap {
            command: HeatmapCommand::Topics(args),
        } => run_topics_report(args),
    }
}
