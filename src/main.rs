use std::time::{Duration, Instant};

use anyhow::Context;
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};

use radar_scraper::discovery;
use radar_scraper::fetcher::Fetcher;
use radar_scraper::models::ExtractedDocument;
use radar_scraper::parser::Extractor;
use radar_scraper::{Config, Pipeline, SearchOutcome};

#[derive(Parser)]
#[command(name = "radar_scraper", about = "Cultural recommendations from 'On my radar' columns")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Discover, fetch, extract and normalize recommendations for a keyword
    Search {
        keyword: String,
        /// Max recommendations (0 = unlimited; default from RADAR_MAX_RESULTS or 3)
        #[arg(short = 'n', long)]
        limit: Option<usize>,
        /// Print the raw JSON response
        #[arg(long)]
        json: bool,
    },
    /// List candidate article URLs from the index page
    Discover,
    /// Fetch one article and print its extracted fields
    Extract {
        url: String,
        #[arg(short, long, default_value = "")]
        keyword: String,
    },
    /// Fetch an image through the pass-through proxy and save it
    Image {
        url: String,
        #[arg(short, long)]
        output: std::path::PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();
    let mut config = Config::from_env().context("Invalid configuration")?;

    let result = match cli.command {
        Commands::Search { keyword, limit, json } => {
            if let Some(n) = limit {
                config.max_results = (n > 0).then_some(n);
            }
            let pipeline = Pipeline::from_config(config).context("Cannot build pipeline")?;

            let spinner = ProgressBar::new_spinner();
            spinner.set_style(
                ProgressStyle::default_spinner()
                    .template("{spinner:.green} [{elapsed_precise}] {msg}")?,
            );
            spinner.set_message(format!("Searching for '{}'...", keyword));
            spinner.enable_steady_tick(Duration::from_millis(120));

            let outcome = pipeline.search(&keyword).await;
            spinner.finish_and_clear();
            let outcome = outcome?;

            if json {
                println!("{}", serde_json::to_string_pretty(&outcome)?);
            } else {
                print_outcome(&keyword, &outcome);
            }
            Ok(())
        }
        Commands::Discover => {
            let candidates = discovery::discover(&Fetcher::new(), &config).await?;
            if candidates.is_empty() {
                println!("No candidate articles found on {}", config.index_url()?);
                return Ok(());
            }
            for c in &candidates {
                println!("{:>3}  {}", c.position + 1, c.url);
            }
            println!("\n{} candidates", candidates.len());
            Ok(())
        }
        Commands::Extract { url, keyword } => {
            let markup = Fetcher::new()
                .fetch(&url, config.fetch_timeout)
                .await
                .with_context(|| format!("Failed to fetch {}", url))?;
            let extractor = Extractor::new(config.origin.clone(), 0);
            let doc = ExtractedDocument {
                position: 0,
                source_link: url,
                fields: extractor.extract(&markup, keyword.trim()),
            };
            println!("{}", serde_json::to_string_pretty(&doc)?);
            Ok(())
        }
        Commands::Image { url, output } => {
            let image = Fetcher::new()
                .fetch_image(&url, config.fetch_timeout)
                .await
                .with_context(|| format!("Failed to fetch image {}", url))?;
            std::fs::write(&output, &image.bytes)
                .with_context(|| format!("Failed to write {}", output.display()))?;
            println!(
                "Saved {} bytes ({}) to {}",
                image.bytes.len(),
                image.content_type,
                output.display()
            );
            Ok(())
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", format_duration(elapsed));
    }

    result
}

fn print_outcome(keyword: &str, outcome: &SearchOutcome) {
    if outcome.results.is_empty() {
        println!("No recommendations found for '{}'.", keyword);
        return;
    }

    for (i, r) in outcome.results.iter().enumerate() {
        println!("{:>2}. {}", i + 1, r.title);
        println!("    Recommended by: {} ({})", r.attributed_author, truncate(&r.author_bio, 80));
        println!("    {}", r.snippet);
        if let Some(link) = &r.recommendation_link {
            println!("    Link:   {}", link);
        }
        println!("    Source: {}", r.source_link);
        println!("    Image:  {}", r.image);
        println!();
    }

    println!(
        "{} recommendations in {:.1}s",
        outcome.results.len(),
        outcome.elapsed_seconds
    );
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max).collect();
        format!("{}...", truncated)
    }
}

fn format_duration(d: Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}
