// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use colored::Colorize;
use console::Emoji;
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::EnvFilter;

use podplay::config::{API_KEY_ENV, API_SECRET_ENV, DEFAULT_BASE_URL};
use podplay::directory::{EpisodeLookup, MAX_BATCH_SIZE, PodcastLookup, TrendingQuery};
use podplay::format::plain_text;
use podplay::player::SystemClock;
use podplay::store::{AuthProvider, Identity};
use podplay::{
    DirectoryClient, DirectoryConfig, Episode, JsonFileStore, NoopReporter, Podcast,
    ProgressEvent, ProgressReporter, ProgressStore, ReqwestClient, SharedProgressReporter,
    StaticAuth, SubscriptionStore, Track, download_track, format_time,
};

// Emoji with fallback for terminals without Unicode support
static MICROPHONE: Emoji<'_, '_> = Emoji("🎙️  ", "");
static SEARCH: Emoji<'_, '_> = Emoji("🔍 ", "[~] ");
static HEADPHONES: Emoji<'_, '_> = Emoji("🎧 ", "[i] ");
static DOWNLOAD: Emoji<'_, '_> = Emoji("📥 ", "[v] ");
static SUCCESS: Emoji<'_, '_> = Emoji("✅ ", "[+] ");
static FAILURE: Emoji<'_, '_> = Emoji("❌ ", "[!] ");
static STAR: Emoji<'_, '_> = Emoji("⭐ ", "[*] ");
static FOLDER: Emoji<'_, '_> = Emoji("📁 ", "");
static CROSS: Emoji<'_, '_> = Emoji("✗ ", "x ");

/// Discover podcasts, download episodes and keep track of what you listened to
#[derive(Parser, Debug)]
#[command(name = "podplay")]
#[command(about = "Discover podcasts, download episodes and track listening progress")]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Podcast Index API key
    #[arg(long, env = API_KEY_ENV, hide_env_values = true, global = true)]
    api_key: Option<String>,

    /// Podcast Index API secret
    #[arg(long, env = API_SECRET_ENV, hide_env_values = true, global = true)]
    api_secret: Option<String>,

    /// Directory API root
    #[arg(long, default_value = DEFAULT_BASE_URL, global = true)]
    base_url: String,

    /// User whose history and subscriptions are used
    #[arg(short, long, env = "PODPLAY_USER", global = true)]
    user: Option<String>,

    /// Where history and subscriptions are stored
    #[arg(long, env = "PODPLAY_DATA_DIR", default_value = ".podplay", global = true)]
    data_dir: PathBuf,

    /// Quiet mode - suppress progress output
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List directory categories
    Categories,

    /// Show trending podcasts
    Trending {
        /// Maximum number of podcasts
        #[arg(short, long, default_value = "10")]
        max: u32,

        /// Language code, e.g. "en"
        #[arg(long)]
        lang: Option<String>,

        /// Category id or name
        #[arg(long)]
        cat: Option<String>,

        /// Only podcasts trending since this unix timestamp
        #[arg(long)]
        since: Option<i64>,
    },

    /// Search podcasts by term
    Search {
        term: String,

        /// Maximum number of results
        #[arg(short, long, default_value = "10")]
        max: u32,
    },

    /// Show a podcast and its latest episodes
    Podcast {
        id: u64,

        /// Number of episodes to list
        #[arg(short, long, default_value = "10")]
        episodes: u32,
    },

    /// Show an episode and where you left off
    Episode { id: u64 },

    /// Save an episode's audio to disk
    Download {
        id: u64,

        /// Output directory
        #[arg(short, long, default_value = ".")]
        output_dir: PathBuf,
    },

    /// Show recently listened episodes
    History {
        /// Page size
        #[arg(short, long)]
        limit: Option<usize>,

        /// Continue from a previous page
        #[arg(long)]
        cursor: Option<i64>,
    },

    /// Subscribe to a podcast
    Subscribe { podcast_id: u64 },

    /// Unsubscribe from a podcast
    Unsubscribe { podcast_id: u64 },

    /// List subscribed podcasts
    Subscriptions,
}

/// Progress reporter using indicatif for terminal output
struct IndicatifReporter {
    bar: ProgressBar,
}

impl IndicatifReporter {
    fn new() -> Result<Self> {
        let style = ProgressStyle::default_bar()
            .template(&format!(
                "  {DOWNLOAD}[{{bar:30.cyan/blue}}] {{bytes}}/{{total_bytes}} {{wide_msg}}"
            ))
            .context("Invalid progress bar template")?
            .progress_chars("█▓░");

        let bar = ProgressBar::new(0);
        bar.set_style(style);

        Ok(Self { bar })
    }
}

impl ProgressReporter for IndicatifReporter {
    fn report(&self, event: ProgressEvent) {
        match event {
            ProgressEvent::DownloadStarting {
                title,
                content_length,
            } => {
                self.bar.set_length(content_length.unwrap_or(0));
                self.bar.set_position(0);
                self.bar.set_message(truncate_title(&title, 40));
            }

            ProgressEvent::DownloadProgress {
                bytes_downloaded,
                total_bytes,
                ..
            } => {
                if let Some(total) = total_bytes {
                    self.bar.set_length(total);
                }
                self.bar.set_position(bytes_downloaded);
            }

            ProgressEvent::Finalizing { .. } => {}

            ProgressEvent::DownloadCompleted {
                title,
                bytes_downloaded,
                ..
            } => {
                self.bar.set_position(bytes_downloaded);
                self.bar.finish_with_message(format!(
                    "{SUCCESS}{}",
                    truncate_title(&title, 40).green()
                ));
            }

            ProgressEvent::DownloadFailed { title, error } => {
                self.bar.abandon_with_message(format!(
                    "{FAILURE}{} - {}",
                    truncate_title(&title, 30).red(),
                    error.red()
                ));
            }
        }
    }
}

fn truncate_title(title: &str, max_len: usize) -> String {
    if title.chars().count() <= max_len {
        title.to_string()
    } else {
        let kept: String = title.chars().take(max_len.saturating_sub(3)).collect();
        format!("{kept}...")
    }
}

fn init_tracing(quiet: bool) {
    let default = if quiet { "podplay=warn" } else { "podplay=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn directory(args: &Args) -> Result<DirectoryClient<ReqwestClient>> {
    let config = DirectoryConfig::new(
        args.api_key.clone().unwrap_or_default(),
        args.api_secret.clone().unwrap_or_default(),
    )?
    .with_base_url(&args.base_url)?;

    Ok(DirectoryClient::new(ReqwestClient::new(), config))
}

fn require_identity(auth: &StaticAuth) -> Result<Identity> {
    match auth.identity() {
        Some(identity) => Ok(identity),
        None => bail!("Not signed in; pass --user or set PODPLAY_USER"),
    }
}

fn print_podcast_line(podcast: &Podcast) {
    println!(
        "  {} {} {}",
        format!("{:>8}", podcast.id).dimmed(),
        podcast.title.bold(),
        format!("by {}", podcast.display_author()).dimmed()
    );
}

fn print_episode_line(episode: &Episode) {
    let duration = episode
        .duration
        .map(|d| format_time(d as f64))
        .unwrap_or_else(|| "-".to_string());
    println!(
        "  {} {} {}",
        format!("{:>12}", episode.id).dimmed(),
        episode.title,
        format!("({duration})").cyan()
    );
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.quiet);

    if !args.quiet {
        println!(
            "\n{}{} {}\n",
            MICROPHONE,
            "podplay".bold().magenta(),
            "- Podcast Player".dimmed()
        );
    }

    let auth = StaticAuth::from_user(args.user.as_deref());
    let store = JsonFileStore::new(&args.data_dir, SystemClock::shared());

    match &args.command {
        Command::Categories => {
            let categories = directory(&args)?
                .categories()
                .await
                .context("Failed to fetch categories")?;
            for category in categories {
                println!("  {} {}", format!("{:>4}", category.id).dimmed(), category.name);
            }
        }

        Command::Trending {
            max,
            lang,
            cat,
            since,
        } => {
            let query = TrendingQuery {
                max: Some(*max),
                since: *since,
                lang: lang.clone(),
                cat: cat.clone(),
            };
            let podcasts = directory(&args)?
                .trending(&query)
                .await
                .context("Failed to fetch trending podcasts")?;
            println!("{}{}", STAR, "Trending".bold());
            for podcast in &podcasts {
                print_podcast_line(podcast);
            }
        }

        Command::Search { term, max } => {
            let response = directory(&args)?
                .search(term, Some(*max))
                .await
                .with_context(|| format!("Failed to search for \"{term}\""))?;
            println!(
                "{}{} results for {}",
                SEARCH,
                response.count.to_string().cyan(),
                term.bold()
            );
            for podcast in &response.feeds {
                print_podcast_line(podcast);
            }
        }

        Command::Podcast { id, episodes } => {
            let client = directory(&args)?;
            let podcast = client
                .podcast_by_id(*id)
                .await
                .with_context(|| format!("Failed to fetch podcast {id}"))?;
            let items = client
                .episodes_by_feed_id(*id, Some(*episodes))
                .await
                .with_context(|| format!("Failed to fetch episodes of podcast {id}"))?;
            let subscribed = store
                .is_subscribed(auth.identity().as_ref(), *id)
                .await
                .context("Failed to read subscriptions")?;

            println!(
                "{}{} {}",
                HEADPHONES,
                podcast.title.bold().green(),
                format!("by {}", podcast.display_author()).dimmed()
            );
            if subscribed {
                println!("  {}", "subscribed".yellow());
            }
            if !podcast.description.is_empty() {
                println!("\n  {}\n", truncate_title(&plain_text(&podcast.description), 300));
            }
            for episode in &items {
                print_episode_line(episode);
            }
        }

        Command::Episode { id } => {
            let client = directory(&args)?;
            let episode = client
                .episode_by_id(*id)
                .await
                .with_context(|| format!("Failed to fetch episode {id}"))?;
            let progress = store
                .episode_progress(auth.identity().as_ref(), *id)
                .await
                .context("Failed to read listening progress")?;

            println!("{}{}", HEADPHONES, episode.title.bold().green());
            if let Some(feed_title) = &episode.feed_title {
                println!("  {}", feed_title.dimmed());
            }
            if !episode.date_published_pretty.is_empty() {
                println!("  {}", episode.date_published_pretty);
            }
            if let Some(duration) = episode.duration {
                println!("  {}", format_time(duration as f64).cyan());
            }
            if let Some(record) = progress {
                println!(
                    "  Resume at {} ({}%)",
                    format_time(record.current_time).yellow(),
                    (record.fraction() * 100.0).round()
                );
            }
            if !episode.description.is_empty() {
                println!("\n  {}", truncate_title(&plain_text(&episode.description), 500));
            }
        }

        Command::Download { id, output_dir } => {
            let client = directory(&args)?;
            let episode = client
                .episode_by_id(*id)
                .await
                .with_context(|| format!("Failed to fetch episode {id}"))?;
            if episode.enclosure_url.is_empty() {
                bail!("Episode {id} has no audio enclosure");
            }

            tokio::fs::create_dir_all(output_dir)
                .await
                .with_context(|| format!("Failed to create {}", output_dir.display()))?;

            let reporter: SharedProgressReporter = if args.quiet {
                NoopReporter::shared()
            } else {
                Arc::new(IndicatifReporter::new()?)
            };

            let track = Track::from(&episode);
            let path = download_track(client.http(), &track, output_dir, &reporter)
                .await
                .context("Failed to download episode")?;

            if !args.quiet {
                println!("\n{FOLDER}Output: {}\n", path.display().to_string().cyan());
            }
        }

        Command::History { limit, cursor } => {
            let identity = require_identity(&auth)?;
            let page = store
                .history(Some(&identity), *limit, *cursor)
                .await
                .context("Failed to read listening history")?;

            if page.items.is_empty() {
                println!("  {}", "Nothing listened to yet".dimmed());
                return Ok(());
            }

            let ids: Vec<u64> = page.items.iter().map(|r| r.episode_id).collect();
            let lookups = lookup_episodes(&directory(&args)?, &ids).await?;

            for (record, lookup) in page.items.iter().zip(lookups) {
                match lookup {
                    EpisodeLookup::Found {
                        episode, podcast, ..
                    } => {
                        let show = podcast
                            .map(|p| p.title)
                            .or(episode.feed_title)
                            .unwrap_or_default();
                        println!(
                            "  {} {} {}/{}",
                            episode.title.bold(),
                            show.dimmed(),
                            format_time(record.current_time).yellow(),
                            format_time(record.duration)
                        );
                    }
                    EpisodeLookup::Failed { episode_id, error } => {
                        println!("  {}{} {}", CROSS, episode_id, error.dimmed());
                    }
                }
            }

            if let Some(next) = page.next_cursor {
                println!("\n  {} --cursor {}", "More:".dimmed(), next);
            }
        }

        Command::Subscribe { podcast_id } => {
            let identity = require_identity(&auth)?;
            let podcast = directory(&args)?
                .podcast_by_id(*podcast_id)
                .await
                .with_context(|| format!("Failed to fetch podcast {podcast_id}"))?;
            store
                .subscribe(Some(&identity), *podcast_id)
                .await
                .context("Failed to subscribe")?;
            println!("{}Subscribed to {}", SUCCESS, podcast.title.bold());
        }

        Command::Unsubscribe { podcast_id } => {
            let identity = require_identity(&auth)?;
            store
                .unsubscribe(Some(&identity), *podcast_id)
                .await
                .context("Failed to unsubscribe")?;
            println!("{}Unsubscribed from {}", SUCCESS, podcast_id);
        }

        Command::Subscriptions => {
            let identity = require_identity(&auth)?;
            let subscriptions = store
                .subscriptions(Some(&identity))
                .await
                .context("Failed to read subscriptions")?;

            if subscriptions.is_empty() {
                println!("  {}", "No subscriptions".dimmed());
                return Ok(());
            }

            let client = directory(&args)?;
            let ids: Vec<u64> = subscriptions.iter().map(|s| s.podcast_id).collect();
            for chunk in ids.chunks(MAX_BATCH_SIZE) {
                let lookups = client
                    .podcasts_batch(chunk)
                    .await
                    .context("Failed to fetch subscribed podcasts")?;
                for lookup in lookups {
                    match lookup {
                        PodcastLookup::Found { podcast, .. } => print_podcast_line(&podcast),
                        PodcastLookup::Failed { podcast_id, error } => {
                            println!("  {}{} {}", CROSS, podcast_id, error.dimmed());
                        }
                    }
                }
            }
        }
    }

    Ok(())
}

async fn lookup_episodes(
    client: &DirectoryClient<ReqwestClient>,
    ids: &[u64],
) -> Result<Vec<EpisodeLookup>> {
    let mut lookups = Vec::with_capacity(ids.len());
    for chunk in ids.chunks(MAX_BATCH_SIZE) {
        lookups.extend(
            client
                .episodes_batch(chunk)
                .await
                .context("Failed to fetch episodes")?,
        );
    }
    Ok(lookups)
}
