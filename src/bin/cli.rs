//! Okosfoci CLI - generate football tips from the command line

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::warn;

use okosfoci_tips::api::football_api::FootballApiClient;
use okosfoci_tips::api::FootballDataSource;
use okosfoci_tips::archive::football_txt::FootballTxtParser;
use okosfoci_tips::config::Config;
use okosfoci_tips::data::{save_tips_to_csv, save_tips_to_json};
use okosfoci_tips::generate_tips;
use okosfoci_tips::poisson::{forecast, ThreeWayOdds};
use okosfoci_tips::teams::{TeamDatabase, TeamInfo};
use okosfoci_tips::time_window::TimeWindow;
use okosfoci_tips::validation::{parse_date, TipRequest};

#[derive(Parser)]
#[command(name = "okosfoci")]
#[command(author, version, about = "Lowest-odds football tips", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate tips for a day
    Tips {
        /// Match day (YYYY-MM-DD), today (UTC) when omitted
        #[arg(short, long)]
        date: Option<String>,

        /// Time window: all, 0-8, 8-16 or 16-24
        #[arg(short, long)]
        window: Option<String>,

        /// Maximum number of tips
        #[arg(short, long)]
        limit: Option<String>,

        /// JSON output file
        #[arg(short, long, default_value = "tippek.json")]
        output: PathBuf,

        /// Also write the tips as CSV
        #[arg(long)]
        csv: Option<PathBuf>,
    },

    /// Report fixture teams missing from the team database
    ValidateTeams {
        /// Match day (YYYY-MM-DD), today (UTC) when omitted
        #[arg(short, long)]
        date: Option<String>,
    },

    /// Show the loaded configuration and remaining API quota
    Status,

    /// Predict a match with a Poisson model trained on a Football.TXT file
    Predict {
        /// Results file, as given or relative to DATA_ROOT
        #[arg(short, long)]
        file: PathBuf,

        /// Home team, spelled as in the file
        #[arg(long)]
        home: String,

        /// Away team, spelled as in the file
        #[arg(long)]
        away: String,

        /// Market odds for the home win; with draw and away odds enables Kelly stakes
        #[arg(long, requires_all = ["odds_draw", "odds_away"])]
        odds_home: Option<f64>,

        #[arg(long, requires_all = ["odds_home", "odds_away"])]
        odds_draw: Option<f64>,

        #[arg(long, requires_all = ["odds_home", "odds_draw"])]
        odds_away: Option<f64>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let config = Config::from_env().context("Invalid configuration")?;

    match cli.command {
        Commands::Tips {
            date,
            window,
            limit,
            output,
            csv,
        } => run_tips(&config, date, window, limit, output, csv).await,
        Commands::ValidateTeams { date } => validate_teams(&config, date).await,
        Commands::Status => show_status(&config).await,
        Commands::Predict {
            file,
            home,
            away,
            odds_home,
            odds_draw,
            odds_away,
        } => {
            let market = match (odds_home, odds_draw, odds_away) {
                (Some(home), Some(draw), Some(away)) => Some(ThreeWayOdds { home, draw, away }),
                _ => None,
            };
            predict(&config, &file, &home, &away, market)
        }
    }
}

async fn run_tips(
    config: &Config,
    date: Option<String>,
    window: Option<String>,
    limit: Option<String>,
    output: PathBuf,
    csv: Option<PathBuf>,
) -> Result<()> {
    // Validate before touching the network
    let request = TipRequest::parse(
        date.as_deref(),
        window.as_deref(),
        limit.as_deref(),
        &config.limits,
        config.default_limit,
        Utc::now().date_naive(),
    )?;

    let client = FootballApiClient::from_config(config)?;
    let teams = TeamDatabase::load(&config.teams_db)?;

    println!("Okosfoci tips\n");
    println!(
        "Date: {}  Window: {}  Limit: {}\n",
        request.date,
        request.time_window.label(),
        request.limit
    );

    let tips = generate_tips(&client, &config.tips, &request, Some(&teams)).await;

    if tips.is_empty() {
        println!("No fixtures found.");
    } else {
        for (i, tip) in tips.iter().enumerate() {
            println!("{}. {}", i + 1, tip.format());
        }
    }

    save_tips_to_json(&tips, &output)?;
    println!("\nSaved {} tips to {}", tips.len(), output.display());

    if let Some(csv) = csv {
        save_tips_to_csv(&tips, &csv)?;
        println!("Saved tips to {}", csv.display());
    }

    Ok(())
}

async fn validate_teams(config: &Config, date: Option<String>) -> Result<()> {
    let date = match date {
        Some(raw) => parse_date(&raw)?,
        None => Utc::now().date_naive(),
    };

    let client = FootballApiClient::from_config(config)?;
    let teams = TeamDatabase::load(&config.teams_db)?;

    println!("Team database: {} ({} teams)\n", config.teams_db.display(), teams.len());

    let mut seen = BTreeSet::new();
    for league in &config.tips.leagues {
        let fixtures = client.fetch_fixtures(league, date).await;
        println!("{}: {} fixtures", league.name, fixtures.len());
        for fixture in fixtures {
            seen.insert(fixture.home_team);
            seen.insert(fixture.away_team);
        }
    }

    let missing: Vec<TeamInfo> = seen
        .iter()
        .filter(|name| !teams.contains(name))
        .map(|name| TeamInfo::template(name))
        .collect();

    println!(
        "\n{} teams playing on {}, {} missing from the database",
        seen.len(),
        date,
        missing.len()
    );

    if !missing.is_empty() {
        for team in &missing {
            println!("  - {}", team.name);
        }
        let template = serde_json::json!({ "teams": missing });
        println!(
            "\nAdd these entries to {}:\n{}",
            config.teams_db.display(),
            serde_json::to_string_pretty(&template).context("Failed to serialize template")?
        );
    }

    Ok(())
}

async fn show_status(config: &Config) -> Result<()> {
    println!("Okosfoci status\n");
    println!("API base:        {}", config.api_base_url);
    println!("API key present: {}", config.api_key.is_some());
    println!("Leagues:         {}", config.tips.leagues.len());
    for league in &config.tips.leagues {
        println!("  - {} ({})", league.name, league.id);
    }
    println!(
        "Windows:         {}",
        TimeWindow::ALL
            .iter()
            .map(|w| w.label())
            .collect::<Vec<_>>()
            .join(", ")
    );
    println!("Policy:          {:?}", config.tips.policy);
    println!(
        "Bet types:       {}",
        config
            .tips
            .bet_types
            .iter()
            .map(|b| b.name())
            .collect::<Vec<_>>()
            .join(", ")
    );
    println!("Hour basis:      {:?}", config.tips.hour_basis);
    println!(
        "Data root:       {} (exists: {})",
        config.data_root.display(),
        config.data_root.exists()
    );

    if config.api_key.is_some() {
        let client = FootballApiClient::from_config(config)?;
        if let Err(e) = client.check_usage().await {
            eprintln!("Could not fetch API usage: {:#}", e);
        }
    }

    Ok(())
}

fn predict(config: &Config, file: &Path, home: &str, away: &str, market: Option<ThreeWayOdds>) -> Result<()> {
    let path = if file.exists() {
        file.to_path_buf()
    } else {
        config.data_root.join(file)
    };
    let content = std::fs::read_to_string(&path).with_context(|| format!("Failed to read {}", path.display()))?;

    let results = FootballTxtParser::new().parse_results(&content);
    println!("Poisson model: {} results from {}\n", results.len(), path.display());

    let outlook = forecast(&results, home, away, market.as_ref())?;
    for team in [home, away] {
        if !results.iter().any(|r| r.home_team == team || r.away_team == team) {
            warn!("{} does not appear in {}, using league averages", team, path.display());
        }
    }

    println!("{}", outlook.format());
    println!(
        "Fair odds: home {:.2}  draw {:.2}  away {:.2}",
        outlook.fair_odds.home, outlook.fair_odds.draw, outlook.fair_odds.away
    );

    if market.is_some() {
        if outlook.stakes.is_empty() {
            println!("\nNo value at the given odds.");
        } else {
            println!("\nQuarter-Kelly stakes:");
            for stake in &outlook.stakes {
                println!(
                    "  {} @ {:.2}: {:.2}% of bankroll (model {:.1}%)",
                    stake.selection.label(),
                    stake.odds,
                    stake.fraction * 100.0,
                    stake.prob * 100.0
                );
            }
        }
    }

    Ok(())
}
