use clap::{
    ArgGroup, CommandFactory, Parser, Subcommand,
    builder::{
        Styles,
        styling::{AnsiColor, Effects},
    },
};
use clap_complete::{Shell, generate};

use scrobblecli::{
    cli::{self, ScrobbleOptions, TrackSource},
    config, error,
    types::TrackRef,
    utils,
};

fn styles() -> Styles {
    Styles::styled()
        .header(AnsiColor::White.on_default() | Effects::BOLD)
        .usage(AnsiColor::White.on_default() | Effects::BOLD)
        .literal(AnsiColor::BrightBlue.on_default())
        .placeholder(AnsiColor::BrightGreen.on_default())
}

#[derive(Parser, Debug, Clone)]
#[clap(
  version = env!("CARGO_PKG_VERSION"),
  name=env!("CARGO_PKG_NAME"),
  bin_name=env!("CARGO_PKG_NAME"),
  author=env!("CARGO_PKG_AUTHORS"),
  about=env!("CARGO_PKG_DESCRIPTION"),
  styles=styles(),
  args_conflicts_with_subcommands = true, // scrobble flags and subcommands are exclusive
  subcommand_negates_reqs = true,
  group(ArgGroup::new("source").required(true).args(["playlist", "track"])),
)]
struct Cli {
    /// Spotify playlist URL, URI or id
    #[clap(long, value_parser = utils::playlist_id)]
    playlist: Option<String>,

    /// Track in format 'Artist - Song'
    #[clap(long, value_parser = utils::parse_track_ref)]
    track: Option<TrackRef>,

    /// Number of times to scrobble
    #[clap(
        long = "loop",
        default_value_t = 1,
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    loop_count: u32,

    /// Your Last.fm username
    #[clap(long, required = true)]
    user: Option<String>,

    /// Do not ask for a loop count when --loop is 1
    #[clap(long, short)]
    yes: bool,

    #[clap(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Authenticate with Last.fm again, replacing the stored session
    Auth,

    /// Remove the stored Last.fm session
    Logout,

    /// Get shell completions
    Completions(CompletionsOption),
}

#[derive(Parser, Debug, Clone)]
pub struct CompletionsOption {
    shell: Shell,
}

#[tokio::main]
async fn main() {
    config::load_env().await;

    let cli = Cli::parse();

    match cli.command {
        Some(Command::Auth) => cli::auth().await,
        Some(Command::Logout) => cli::logout().await,
        Some(Command::Completions(opt)) => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            generate(opt.shell, &mut cmd, name, &mut std::io::stdout())
        }
        None => {
            let source = match (cli.playlist, cli.track) {
                (Some(playlist), _) => TrackSource::Playlist(playlist),
                (None, Some(track)) => TrackSource::Track(track),
                (None, None) => error!("Please provide either --playlist or --track"),
            };
            let Some(user) = cli.user else {
                error!("Please provide your Last.fm username with --user");
            };

            cli::scrobble(ScrobbleOptions {
                source,
                loops: cli.loop_count,
                user,
                assume_yes: cli.yes,
            })
            .await
        }
    }
}
