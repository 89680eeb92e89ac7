use std::path::PathBuf;

use clap::{
    CommandFactory, Parser, Subcommand,
    builder::{
        Styles,
        styling::{AnsiColor, Effects},
    },
};
use clap_complete::{Shell, generate};
use tracing_subscriber::EnvFilter;

use spotreview::{cli, config, error};

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
  about=env!("CARGO_PKG_DESCRIPTION"),
  styles=styles(),
)]
struct Cli {
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Authorize with Spotify API
    Auth(AuthOptions),

    /// Show the id of the signed in user
    Me,

    /// List followed artists
    Artists(ArtistsOptions),

    /// Follow an artist
    Follow(FollowOptions),

    /// List your playlists
    Playlists,

    /// Handle a single playlist
    Playlist(PlaylistOptions),

    /// List an artist's albums, singles, compilations and appearances
    Albums(AlbumsOptions),

    /// List the tracks of one or more albums
    Tracks(TracksOptions),

    #[clap(about = "Queue an artist's unreviewed tracks in the Pending Review playlist")]
    Review(ReviewOptions),

    /// Get shell completions
    Completions(CompletionsOption),
}

#[derive(Parser, Debug, Clone)]
pub struct AuthOptions {
    /// Catch the redirect with a local server instead of pasting the code
    #[clap(long)]
    pub callback: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct ArtistsOptions {
    /// Search for artists
    #[clap(long)]
    pub search: Option<String>,
}

#[derive(Parser, Debug, Clone)]
pub struct FollowOptions {
    pub artist_id: String,
}

#[derive(Parser, Debug, Clone)]
pub struct PlaylistOptions {
    #[command(subcommand)]
    pub command: PlaylistSubcommand,
}

#[derive(Subcommand, Debug, Clone)]
pub enum PlaylistSubcommand {
    /// Create a private playlist unless the name is taken
    Create(PlaylistCreateOpts),
    /// List the tracks of a playlist
    Items(PlaylistItemsOpts),
}

#[derive(Parser, Debug, Clone)]
pub struct PlaylistCreateOpts {
    pub name: String,
    #[clap(long)]
    pub description: Option<String>,
}

#[derive(Parser, Debug, Clone)]
pub struct PlaylistItemsOpts {
    pub playlist_id: String,
}

#[derive(Parser, Debug, Clone)]
pub struct AlbumsOptions {
    pub artist_id: String,
}

#[derive(Parser, Debug, Clone)]
pub struct TracksOptions {
    #[clap(required = true)]
    pub album_ids: Vec<String>,
}

#[derive(Parser, Debug, Clone)]
pub struct ReviewOptions {
    pub artist_id: String,

    /// Ledger of reviewed tracks (defaults to SPOTREVIEW_LEDGER or the data dir)
    #[clap(long)]
    pub ledger: Option<PathBuf>,

    /// Stop at the first failed upload or follow instead of reporting it
    #[clap(long)]
    pub abort_on_failure: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct CompletionsOption {
    shell: Shell,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = config::load_env().await {
        error!("Cannot load environment. Err: {}", e);
    }

    let cli = Cli::parse();

    let result = match cli.command {
        Command::Auth(opt) => cli::auth(opt.callback).await,
        Command::Me => cli::me().await,
        Command::Artists(opt) => cli::list_artists(opt.search).await,
        Command::Follow(opt) => cli::follow(opt.artist_id).await,
        Command::Playlists => cli::list_playlists().await,
        Command::Playlist(opt) => match opt.command {
            PlaylistSubcommand::Create(c) => cli::create_playlist(c.name, c.description).await,
            PlaylistSubcommand::Items(i) => cli::playlist_items(i.playlist_id).await,
        },
        Command::Albums(opt) => cli::list_albums(opt.artist_id).await,
        Command::Tracks(opt) => cli::album_tracks(opt.album_ids).await,
        Command::Review(opt) => cli::review(opt.artist_id, opt.ledger, opt.abort_on_failure).await,
        Command::Completions(opt) => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            generate(opt.shell, &mut cmd, name, &mut std::io::stdout());
            Ok(())
        }
    };

    if let Err(e) = result {
        error!("{}", e);
    }
}
