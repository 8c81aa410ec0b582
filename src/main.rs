use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;

use playlist_migrator::logging::setup_tracing;
use playlist_migrator::migrator::migrate_playlists;
use playlist_migrator::{
    Config, MigrationOrchestrator, MigrationResult, PlaylistMigrator, PublicSpotifyClient,
    SourceCatalog, SpotifyClient, TidalClient,
};

#[derive(Parser)]
#[command(name = "playlist-migrator")]
#[command(about = "Migrate Spotify playlists to Tidal")]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct TidalArgs {
    /// Tidal client ID (or set TIDAL_CLIENT_ID env var)
    #[arg(long, env = "TIDAL_CLIENT_ID")]
    tidal_client_id: String,

    /// Tidal client secret (or set TIDAL_CLIENT_SECRET env var)
    #[arg(long, env = "TIDAL_CLIENT_SECRET")]
    tidal_client_secret: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Migrate all your Spotify playlists to Tidal
    MigrateAll {
        /// Preview migration without creating playlists
        #[arg(long)]
        dry_run: bool,

        #[command(flatten)]
        tidal: TidalArgs,
    },

    /// Migrate specific playlists to Tidal
    Migrate {
        /// Names of playlists to migrate
        #[arg(required = true)]
        playlist_names: Vec<String>,

        /// Preview migration without creating playlists
        #[arg(long)]
        dry_run: bool,

        #[command(flatten)]
        tidal: TidalArgs,
    },

    /// List all your Spotify playlists
    ListPlaylists,

    /// Import a public Spotify playlist by URL
    ImportUrl {
        /// Spotify playlist URL (e.g., https://open.spotify.com/playlist/...)
        url: String,

        /// Name for the Tidal playlist (defaults to original name)
        #[arg(long)]
        name: Option<String>,

        /// Preview migration without creating playlist
        #[arg(long)]
        dry_run: bool,

        #[command(flatten)]
        tidal: TidalArgs,
    },

    /// Show setup guide
    Setup,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let verbose = cli.verbose;

    if let Err(e) = run(cli).await {
        eprintln!("\n{} {:#}", "Migration failed:".red().bold(), e);
        if verbose {
            eprintln!("{:?}", e);
        }
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    if let Commands::Setup = cli.command {
        show_setup_guide();
        return Ok(());
    }

    let config = load_config()?;
    let log = setup_tracing(cli.verbose, &config.log_dir).context("Failed to set up logging")?;
    tracing::debug!("Logging to {}", log.log_file().display());

    match cli.command {
        Commands::MigrateAll { dry_run, tidal } => {
            print_banner(dry_run);
            let orchestrator = connect(&config, &tidal).await?;
            let results = orchestrator.migrate_all_playlists(dry_run).await?;
            print_finished(&results, dry_run);
        }
        Commands::Migrate {
            playlist_names,
            dry_run,
            tidal,
        } => {
            print_banner(dry_run);
            println!("Target playlists: {}", playlist_names.join(", "));
            let orchestrator = connect(&config, &tidal).await?;
            let results = orchestrator
                .migrate_specific_playlists(&playlist_names, dry_run)
                .await?;
            print_finished(&results, dry_run);
        }
        Commands::ListPlaylists => list_playlists(&config).await?,
        Commands::ImportUrl {
            url,
            name,
            dry_run,
            tidal,
        } => import_url(&config, &url, name, dry_run, &tidal).await?,
        Commands::Setup => {}
    }

    Ok(())
}

/// Loads the configuration and exits with a list of what is missing when the
/// Spotify credentials are incomplete.
fn load_config() -> Result<Config> {
    let config = Config::from_env().context("Failed to load configuration")?;

    if !config.validate_spotify_config() {
        println!("{}", "Missing configuration:".red());
        for item in &config.get_missing_config() {
            println!("   - {}", item);
        }
        println!(
            "\n{}",
            "Please copy .env.example to .env and fill in your credentials.".yellow()
        );
        std::process::exit(1);
    }

    Ok(config)
}

async fn connect_tidal(config: &Config, tidal: &TidalArgs) -> Result<TidalClient> {
    TidalClient::connect(
        &tidal.tidal_client_id,
        tidal.tidal_client_secret.as_deref(),
        &config.tidal_session_file,
    )
    .await
    .context("Failed to connect to Tidal")
}

async fn connect(
    config: &Config,
    tidal: &TidalArgs,
) -> Result<MigrationOrchestrator<SpotifyClient, TidalClient>> {
    let spotify_client = SpotifyClient::new(config)
        .await
        .context("Failed to connect to Spotify")?;
    let tidal_client = connect_tidal(config, tidal).await?;

    Ok(MigrationOrchestrator::new(
        spotify_client,
        tidal_client,
        config.results_dir.clone(),
    ))
}

fn print_banner(dry_run: bool) {
    println!("{}", "Spotify to Tidal Playlist Migrator".cyan().bold());
    println!("{}", "=".repeat(50));

    if dry_run {
        println!("{}", "DRY RUN MODE - No playlists will be created".yellow());
    }
}

fn print_finished(results: &[MigrationResult], dry_run: bool) {
    if results.is_empty() {
        println!("\n{}", "Nothing was migrated".yellow());
    } else if dry_run {
        println!("\n{}", "Dry run completed - no changes made".yellow());
    } else {
        println!("\n{}", "Migration completed!".green());
    }
}

async fn list_playlists(config: &Config) -> Result<()> {
    println!("{}", "Your Spotify Playlists".cyan().bold());
    println!("{}", "=".repeat(50));

    let spotify_client = SpotifyClient::new(config)
        .await
        .context("Failed to connect to Spotify")?;

    let playlists = spotify_client
        .get_user_playlists()
        .await
        .context("Failed to fetch playlists")?;

    if playlists.is_empty() {
        println!("{}", "No playlists found".yellow());
        return Ok(());
    }

    for (i, playlist) in playlists.iter().enumerate() {
        println!(
            "{:2}. {} ({} tracks)",
            i + 1,
            playlist.name.green(),
            playlist.total_tracks
        );
        if !playlist.description.is_empty() {
            println!("     {}", playlist.description.cyan());
        }
    }

    println!("\n{}", format!("Total: {} playlists", playlists.len()).cyan());

    Ok(())
}

async fn import_url(
    config: &Config,
    url: &str,
    name: Option<String>,
    dry_run: bool,
    tidal: &TidalArgs,
) -> Result<()> {
    println!("{}", "Import Public Spotify Playlist".cyan().bold());
    println!("{}", "=".repeat(50));

    if dry_run {
        println!("{}", "DRY RUN MODE - No playlist will be created".yellow());
    }

    let playlist_id = PublicSpotifyClient::parse_playlist_url(url)?;

    let spotify_client = PublicSpotifyClient::new(config)
        .await
        .context("Failed to connect to Spotify")?;
    let mut playlist = spotify_client
        .get_playlist(&playlist_id)
        .await
        .context("Failed to fetch playlist")?;

    println!(
        "Found playlist: {} ({} tracks)",
        playlist.name.green(),
        playlist.tracks.len()
    );

    if let Some(name) = name {
        playlist.name = name;
    }

    let migrator = PlaylistMigrator::new(connect_tidal(config, tidal).await?);
    let results = migrate_playlists(&migrator, &[&playlist], dry_run, &config.results_dir).await?;
    print_finished(&results, dry_run);

    Ok(())
}

fn show_setup_guide() {
    println!("{}", "Playlist Migrator Setup Guide".cyan().bold());
    println!("{}", "=".repeat(50));

    println!("\n{}", "1. Spotify API Setup".yellow());
    println!("   - Go to https://developer.spotify.com/dashboard/");
    println!("   - Create a new app");
    println!("   - Copy your Client ID and Client Secret");
    println!("   - Add 'http://127.0.0.1:8080/callback' as a redirect URI");

    println!("\n{}", "2. Tidal API Setup".yellow());
    println!("   - Go to https://developer.tidal.com/");
    println!("   - Create a new application");
    println!("   - Copy your Client ID (the secret is optional for device login)");

    println!("\n{}", "3. Configuration".yellow());
    println!("   - Create a .env file with:");
    println!("     SPOTIFY_CLIENT_ID=your_spotify_client_id");
    println!("     SPOTIFY_CLIENT_SECRET=your_spotify_client_secret");
    println!("     SPOTIFY_REDIRECT_URI=http://127.0.0.1:8080/callback");
    println!("     TIDAL_CLIENT_ID=your_tidal_client_id");
    println!("     TIDAL_CLIENT_SECRET=your_tidal_client_secret");
    println!("   - Logins are remembered in .spotify_cache and .tidal_session.json");
    println!("   - Results go to migration_results/, logs to logs/");

    println!("\n{}", "4. Usage".yellow());
    println!("   - playlist-migrator list-playlists          (to see your playlists)");
    println!("   - playlist-migrator migrate-all --dry-run   (to test migration)");
    println!("   - playlist-migrator migrate-all             (to perform migration)");
    println!("   - playlist-migrator migrate \"Playlist Name\" (to migrate specific playlist)");
    println!("   - playlist-migrator import-url <URL>        (to import a public playlist)");

    println!("\n{}", "Ready to start migrating!".green());
}
