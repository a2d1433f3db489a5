use crate::commands::{run_analyze, run_score, AnalyzeArgs, ScoreArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use copycheck::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "copycheck",
    about = "Score marketing copy against ten copywriting criteria",
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
    /// Analyze a text or article URL with the configured model
    Analyze(AnalyzeArgs),
    /// Score a saved model reply without calling the model
    Score(ScoreArgs),
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
        Command::Analyze(args) => run_analyze(args).await,
        Command::Score(args) => run_score(args),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn analyze_requires_exactly_one_source() {
        assert!(Cli::try_parse_from(["copycheck", "analyze"]).is_err());
        assert!(Cli::try_parse_from([
            "copycheck",
            "analyze",
            "--text",
            "Buy now",
            "--file",
            "copy.txt"
        ])
        .is_err());

        let cli = Cli::try_parse_from(["copycheck", "analyze", "--text", "Buy now", "--json"])
            .expect("parses");
        match cli.command {
            Some(Command::Analyze(args)) => {
                assert_eq!(args.text.as_deref(), Some("Buy now"));
                assert!(args.json);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn serve_is_the_default_command() {
        let cli = Cli::try_parse_from(["copycheck"]).expect("parses");
        assert!(cli.command.is_none());
    }
}
