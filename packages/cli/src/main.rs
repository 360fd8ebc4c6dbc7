#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CLI entry point for restaurant health inspection lookups.

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use restaurant_health_models::{DEFAULT_LIMIT, DateRange, Restaurant, RestaurantFilters};
use restaurant_health_service::HealthInspectionService;

#[derive(Parser)]
#[command(
    name = "restaurant_health",
    about = "Restaurant health inspection lookups across city open data portals"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List all configured jurisdictions
    Jurisdictions,
    /// List the locations a jurisdiction can be filtered by
    Locations {
        /// Jurisdiction code (e.g., "nyc")
        code: String,
    },
    /// Describe a jurisdiction's grading system
    Grading {
        /// Jurisdiction code (e.g., "chicago")
        code: String,
    },
    /// Describe a single raw grade value
    Grade {
        /// Jurisdiction code
        code: String,
        /// Raw grade as it appears in the dataset (e.g., "Pass w/ Conditions")
        raw: String,
    },
    /// Search restaurants in one or more jurisdictions
    Search {
        /// Jurisdiction codes to search. Repeat the flag for several.
        /// If not specified, every jurisdiction is searched.
        #[arg(long = "jurisdiction", short = 'j')]
        jurisdictions: Vec<String>,
        /// Location to match exactly (e.g., "Brooklyn"), or "All"
        #[arg(long)]
        location: Option<String>,
        /// Common letter grade (A/B/C) or native grade value. Repeatable.
        #[arg(long = "grade")]
        grades: Vec<String>,
        /// Cuisine type to keep. Repeatable.
        #[arg(long = "cuisine")]
        cuisines: Vec<String>,
        /// Name search. Wrap in quotes for an exact match, end with `*` for
        /// a prefix match.
        #[arg(long)]
        search: Option<String>,
        /// First inspection date included (YYYY-MM-DD)
        #[arg(long, requires = "to")]
        from: Option<NaiveDate>,
        /// Last inspection date included (YYYY-MM-DD)
        #[arg(long, requires = "from")]
        to: Option<NaiveDate>,
        /// Maximum number of restaurants per jurisdiction
        #[arg(long, default_value_t = DEFAULT_LIMIT)]
        limit: usize,
        /// Print results as JSON
        #[arg(long)]
        json: bool,
    },
}

fn print_restaurants(restaurants: &[Restaurant]) {
    println!(
        "{:<10} {:<36} {:<24} {:<12} {:<6} DATE",
        "WHERE", "NAME", "LOCATION", "GRADE", "SCORE"
    );
    println!("{}", "-".repeat(104));
    for r in restaurants {
        let score = r.score.map_or_else(|| "-".to_string(), |s| s.to_string());
        println!(
            "{:<10} {:<36} {:<24} {:<12} {:<6} {}",
            r.jurisdiction,
            truncate(&r.name, 36),
            truncate(&r.boro, 24),
            truncate(&r.grade, 12),
            score,
            r.inspection_date
        );
    }
}

fn truncate(value: &str, width: usize) -> String {
    if value.chars().count() <= width {
        value.to_string()
    } else {
        let mut out: String = value.chars().take(width.saturating_sub(1)).collect();
        out.push('~');
        out
    }
}

#[allow(clippy::too_many_lines)]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init();
    let cli = Cli::parse();
    let service = HealthInspectionService::new()?;

    match cli.command {
        Commands::Jurisdictions => {
            let jurisdictions = service.get_available_jurisdictions();
            println!("{:<10} {:<28} {:<6} PORTAL", "CODE", "NAME", "STATE");
            println!("{}", "-".repeat(80));
            for j in &jurisdictions {
                println!(
                    "{:<10} {:<28} {:<6} {}",
                    j.code,
                    j.name,
                    j.state,
                    j.portal_url.as_deref().unwrap_or("-")
                );
            }
        }
        Commands::Locations { code } => {
            for location in service.get_available_locations(&code).await?.iter() {
                println!("{location}");
            }
        }
        Commands::Grading { code } => {
            let info = service.get_grading_system_info(&code)?;
            println!("{}", serde_json::to_string_pretty(&info)?);
        }
        Commands::Grade { code, raw } => {
            let info = service.get_grade_info(&code, &raw);
            println!("{}", serde_json::to_string_pretty(&info)?);
        }
        Commands::Search {
            jurisdictions,
            location,
            grades,
            cuisines,
            search,
            from,
            to,
            limit,
            json,
        } => {
            let date_range = match (from, to) {
                (Some(start), Some(end)) => Some(DateRange::new(start, end)),
                _ => None,
            };
            let filters = RestaurantFilters {
                location,
                grades,
                cuisines,
                search_term: search,
                date_range,
                limit,
            };

            let aggregated = service
                .get_restaurants_across(&jurisdictions, &filters)
                .await;

            if json {
                println!("{}", serde_json::to_string_pretty(&aggregated.restaurants)?);
            } else {
                print_restaurants(&aggregated.restaurants);
                println!();
                println!("{} restaurant(s)", aggregated.restaurants.len());
            }

            for failure in &aggregated.failures {
                eprintln!("{}: {}", failure.jurisdiction, failure.error);
            }

            if aggregated.restaurants.is_empty() && !aggregated.failures.is_empty() {
                return Err(format!(
                    "all {} requested jurisdiction(s) failed",
                    aggregated.failures.len()
                )
                .into());
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_repeated_search_flags() {
        let cli = Cli::try_parse_from([
            "restaurant_health",
            "search",
            "-j",
            "nyc",
            "--jurisdiction",
            "chicago",
            "--grade",
            "A",
            "--grade",
            "B",
            "--from",
            "2024-01-01",
            "--to",
            "2024-06-30",
            "--limit",
            "25",
        ])
        .unwrap();

        let Commands::Search {
            jurisdictions,
            grades,
            from,
            limit,
            json,
            ..
        } = cli.command
        else {
            panic!("expected search");
        };
        assert_eq!(jurisdictions, vec!["nyc", "chicago"]);
        assert_eq!(grades, vec!["A", "B"]);
        assert_eq!(from, NaiveDate::from_ymd_opt(2024, 1, 1));
        assert_eq!(limit, 25);
        assert!(!json);
    }

    #[test]
    fn date_bounds_come_in_pairs() {
        assert!(
            Cli::try_parse_from(["restaurant_health", "search", "--from", "2024-01-01"]).is_err()
        );
    }

    #[test]
    fn search_defaults_to_standard_limit() {
        let cli = Cli::try_parse_from(["restaurant_health", "search"]).unwrap();
        let Commands::Search { limit, .. } = cli.command else {
            panic!("expected search");
        };
        assert_eq!(limit, DEFAULT_LIMIT);
    }

    #[test]
    fn truncates_long_values() {
        assert_eq!(truncate("Brooklyn", 24), "Brooklyn");
        assert_eq!(truncate("abcdef", 4), "abc~");
    }
}
