use anyhow::Context;
use clap::{Parser, Subcommand};
use discover_parity::browser::DiscoverPage;
use discover_parity::checks;
use discover_parity::report::render_survey_table;
use discover_parity::{ChromeDriver, Config, FilterParams, GenreApi, MovieApi, RunReport, TmdbClient};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(author, version, about = "Cross-check the Discover page against the discover API", long_about = None)]
struct Args {
    /// Path to a JSON config file (falls back to $DISCOVER_PARITY_CONFIG)
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compare UI and API results for one genre and year range
    Compare {
        #[arg(long, default_value_t = 18)]
        genre: i64,
        #[arg(long, default_value_t = 1990)]
        from: i32,
        #[arg(long, default_value_t = 2005)]
        to: i32,
        /// API pages to fetch (overrides compare.max_pages)
        #[arg(long)]
        pages: Option<u32>,
        /// Directory for the JSON report and failure screenshot
        #[arg(long)]
        report_dir: Option<PathBuf>,
    },
    /// Check that the API honours its release-date filter
    ValidateApi {
        #[arg(long, default_value_t = 2000)]
        from: i32,
        #[arg(long, default_value_t = 2005)]
        to: i32,
        #[arg(long)]
        genre: Option<i64>,
        #[arg(long, default_value_t = 3)]
        pages: u32,
        #[arg(long)]
        report_dir: Option<PathBuf>,
    },
    /// List movie genres
    Genres,
    /// Probe API endpoints until one answers
    Sanity,
    /// Per-genre counts and timings on both surfaces
    Survey {
        #[arg(long, default_value_t = 2000)]
        from: i32,
        #[arg(long, default_value_t = 2020)]
        to: i32,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut config = Config::load(args.config.as_deref())?;
    if let Command::Compare { pages: Some(p), .. } = &args.command {
        config.compare.max_pages = *p;
    }
    config.validate(true)?;

    let client = TmdbClient::new(&config.api)?;

    let success = match args.command {
        Command::Genres => {
            let genres = GenreApi::new(client).genres().await?;
            for (id, name) in genres {
                println!("{:>6}  {}", id, name);
            }
            true
        }
        Command::Sanity => {
            let endpoint = client.sanity_check().await?;
            println!("API reachable via {}", endpoint);
            true
        }
        Command::ValidateApi {
            from,
            to,
            genre,
            pages,
            report_dir,
        } => {
            let api = MovieApi::new(client);
            let filter = FilterParams::for_years(genre, from, to, pages);
            let report =
                checks::api_date_accuracy(&api, &filter, &config.compare.normalizer()).await;
            finish(&report, report_dir.as_deref()).await?
        }
        Command::Compare {
            genre,
            from,
            to,
            report_dir,
            ..
        } => {
            let api = MovieApi::new(client);
            let driver = ChromeDriver::from_settings(&config.browser)
                .await
                .context("Failed to start Chrome")?;
            let page = DiscoverPage::new(&driver, config.ui.discover_url.clone());

            let report = checks::ui_vs_api(&api, &page, &config, genre, from, to).await;
            if !report.is_success() {
                if let Some(dir) = &report_dir {
                    let shot_name = report.file_name().replace(".json", ".png");
                    let shot = dir.join(shot_name);
                    tokio::fs::create_dir_all(dir).await?;
                    if let Err(e) = driver.screenshot_to_file(&shot).await {
                        log::warn!("Failed to take screenshot: {}", e);
                    }
                }
            }
            let ok = finish(&report, report_dir.as_deref()).await?;
            driver.close().await?;
            ok
        }
        Command::Survey { from, to } => {
            let api = MovieApi::new(client);
            let driver = ChromeDriver::from_settings(&config.browser)
                .await
                .context("Failed to start Chrome")?;
            let page = DiscoverPage::new(&driver, config.ui.discover_url.clone());

            let rows = checks::genre_survey(&api, &page, &config, from, to).await;
            print!("{}", render_survey_table(&rows));
            driver.close().await?;
            rows.iter().all(|r| r.api_count > 0)
        }
    };

    if !success {
        std::process::exit(1);
    }
    Ok(())
}

async fn finish(report: &RunReport, report_dir: Option<&Path>) -> anyhow::Result<bool> {
    print!("{}", report.render_summary());
    if let Some(dir) = report_dir {
        let path = report.save(dir).await?;
        println!("Report: {}", path.display());
    }
    Ok(report.is_success())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_flag_is_optional_and_not_read_from_env() {
        std::env::set_var("DISCOVER_PARITY_CONFIG", "/definitely/not/here.json");
        let args = Args::try_parse_from(["discover-parity", "genres"]).unwrap();
        assert!(args.config.is_none());
        assert!(matches!(args.command, Command::Genres));

        let args =
            Args::try_parse_from(["discover-parity", "--config", "c.json", "compare", "--pages", "3"])
                .unwrap();
        assert_eq!(args.config, Some(PathBuf::from("c.json")));
        assert!(matches!(args.command, Command::Compare { pages: Some(3), .. }));
    }
}
