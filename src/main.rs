mod artgen;
mod assets;
mod config;
mod error;
mod fetch;
mod identity;
mod parser;
mod pipeline;
mod prompt;
mod record;
mod render;
mod translate;

#[cfg(test)]
mod testing;

use std::path::PathBuf;
use std::time::Instant;

use anyhow::Context;
use clap::{Parser, Subcommand};

use assets::{resolve_assets, FsAssetStore};
use config::Settings;
use fetch::HttpFetcher;
use pipeline::{RunContext, RunOutcome};
use translate::ChatTranslator;

#[derive(Parser)]
#[command(name = "ihds_daily", about = "IHDS Daily View fetcher: bilingual markdown + imagery")]
struct Cli {
    /// Output directory (default: output/daily_views, or IHDS_OUTPUT_DIR)
    #[arg(long, global = true)]
    output_dir: Option<PathBuf>,
    /// Shared gate image collection (default: <output-dir>/images)
    #[arg(long, global = true)]
    collection_dir: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch, translate and write today's English + Traditional Chinese documents
    Run {
        /// Translation API key
        #[arg(long, env = "DEEPSEEK_API_KEY", hide_env_values = true)]
        api_key: Option<String>,
    },
    /// Generate a poster for today's gate via the image service
    Art {
        /// Image service API key
        #[arg(long, env = "LEONARDO_API_KEY", hide_env_values = true)]
        leonardo_key: Option<String>,
        /// Upload the gate glyph as the generation reference
        #[arg(long)]
        use_reference: bool,
    },
    /// Print today's image prompt without writing anything
    Prompt,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();

    let mut settings = Settings::load().context("Failed to load settings")?;
    if let Some(dir) = cli.output_dir {
        settings.output_dir = dir;
    }
    if let Some(dir) = cli.collection_dir {
        settings.collection_dir = Some(dir);
    }

    let ctx = RunContext::new(&settings, chrono::Local::now().date_naive());
    let fetcher = HttpFetcher::new(&settings);
    let store = FsAssetStore::new(&ctx.collection_dir);

    let result = match cli.command {
        Commands::Run { api_key } => {
            println!("{}", "=".repeat(60));
            println!("IHDS Daily View Fetcher");
            println!("{}", "=".repeat(60));

            let translator = ChatTranslator::new(&settings, api_key);
            match pipeline::run(&ctx, &fetcher, &translator, &store).await? {
                RunOutcome::Completed { run_dir, en_path, zh_path } => {
                    println!("\nDone: {}", run_dir.display());
                    println!("   English: {}", en_path.display());
                    println!("   Chinese: {}", zh_path.display());
                }
                RunOutcome::AlreadyDone { run_dir } => {
                    println!("\nNothing to do; today's view is already in {}", run_dir.display());
                }
            }
            Ok(())
        }
        Commands::Art {
            leonardo_key,
            use_reference,
        } => {
            let client = artgen::ArtClient::new(&settings.art_api_base, leonardo_key)?;
            let page = pipeline::fetch_daily(&ctx, &fetcher).await?;

            let reference = if use_reference {
                resolve_assets(&page.record, &page.key, &fetcher, &store)
                    .await
                    .glyph
            } else {
                None
            };

            println!("\nImage generation");
            let poster = artgen::generate_daily_art(
                &client,
                &fetcher,
                &page.record,
                &page.key,
                reference.as_deref(),
                &ctx.run_dir(&page.key),
                &ctx.date_str(),
            )
            .await;
            if poster.is_none() {
                println!("No poster generated.");
            }
            Ok(())
        }
        Commands::Prompt => {
            let page = pipeline::fetch_daily(&ctx, &fetcher).await?;
            println!("\n{}", prompt::prompt_artifact(&page.record));
            Ok(())
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", format_duration(elapsed));
    }

    result
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else {
        format!("{}m {}s", secs / 60, secs % 60)
    }
}
