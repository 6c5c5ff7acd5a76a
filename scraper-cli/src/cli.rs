use std::{io::Write, path::PathBuf, sync::Arc};

use anyhow::{Context, Result, anyhow, bail};
use chrono::{Local, NaiveDate};
use clap::{Args, Parser, Subcommand};
use weather_scraper_core::{
    CITIES, City, Config, ConfigFileVariables, DailyJob, EnvVariables, LayeredVariables,
    RunReport, TaskContext, TaskState, TimestampZone, date, find_city, provider_from_config,
};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weather-scraper", version, about = "Daily historical weather for a fixed set of cities")]
pub struct Cli {
    /// Config file to use instead of the platform default.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Args)]
pub struct CityFilter {
    /// Restrict the run to these cities; repeatable. Defaults to all.
    #[arg(long = "city", value_name = "NAME")]
    pub cities: Vec<String>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fetch weather for one logical date.
    Run {
        /// Date as YYYY-MM-DD; defaults to yesterday.
        #[arg(long, value_parser = parse_date_arg)]
        date: Option<NaiveDate>,

        #[command(flatten)]
        filter: CityFilter,
    },

    /// Fetch weather for every date in an inclusive range.
    Backfill {
        #[arg(long, value_parser = parse_date_arg)]
        start: NaiveDate,

        /// Defaults to yesterday.
        #[arg(long, value_parser = parse_date_arg)]
        end: Option<NaiveDate>,

        #[command(flatten)]
        filter: CityFilter,
    },

    /// Fetch every date still owed since the last completed one.
    Catchup {
        /// Last logical date already processed; omit to start from the job's start date.
        #[arg(long, value_parser = parse_date_arg)]
        last_completed: Option<NaiveDate>,

        #[command(flatten)]
        filter: CityFilter,
    },

    /// List the configured cities.
    Cities,

    /// Store the API key and timestamp zone in the config file.
    Configure,
}

fn parse_date_arg(s: &str) -> Result<NaiveDate, String> {
    date::parse_date(s).map_err(|e| e.to_string())
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        let config_path = match self.config {
            Some(path) => path,
            None => Config::config_file_path()?,
        };

        match self.command {
            Command::Run { date, filter } => {
                let day = date.unwrap_or_else(|| date::latest_due_date(today()));
                run_job(&config_path, &filter, vec![day]).await
            }
            Command::Backfill { start, end, filter } => {
                let end = end.unwrap_or_else(|| date::latest_due_date(today()));
                let dates = DailyJob::default().dates_between(start, end)?;
                run_job(&config_path, &filter, dates).await
            }
            Command::Catchup { last_completed, filter } => {
                let dates = DailyJob::default().due_dates(last_completed, today());
                if dates.is_empty() {
                    println!("Nothing to catch up.");
                    return Ok(());
                }
                run_job(&config_path, &filter, dates).await
            }
            Command::Cities => {
                for city in CITIES {
                    println!(
                        "{:<10} lat {:>8} lon {:>8}  task {}",
                        city.name,
                        city.latitude,
                        city.longitude,
                        city.task_id()
                    );
                }
                Ok(())
            }
            Command::Configure => configure(&config_path),
        }
    }
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn select_cities(filter: &CityFilter) -> Result<Vec<City>> {
    if filter.cities.is_empty() {
        return Ok(CITIES.to_vec());
    }

    filter
        .cities
        .iter()
        .map(|name| {
            find_city(name).copied().ok_or_else(|| {
                let known: Vec<_> = CITIES.iter().map(|c| c.name).collect();
                anyhow!("Unknown city '{name}'. Known cities: {}.", known.join(", "))
            })
        })
        .collect()
}

async fn run_job(config_path: &std::path::Path, filter: &CityFilter, dates: Vec<NaiveDate>) -> Result<()> {
    let config = Config::load_from(config_path)?;
    let provider = provider_from_config(&config).context("Failed to set up the weather client")?;

    let variables = LayeredVariables::new()
        .with(EnvVariables)
        .with(ConfigFileVariables::new(config_path));

    let ctx = Arc::new(TaskContext::new(Arc::new(provider), Arc::new(variables), config.timezone));

    let job = DailyJob::default()
        .with_cities(select_cities(filter)?)
        .with_max_active_tasks(config.max_active_tasks);

    let stdout = std::io::stdout();
    let failed = job
        .run_dates(ctx, &dates, |report| {
            if let Err(e) = write_report(&mut stdout.lock(), report) {
                tracing::error!("Failed to write report for {}: {e}", date::ds(report.date));
            }
            tracing::info!(
                "Finished {} with {} failed task(s)",
                date::ds(report.date),
                report.failed().count()
            );
        })
        .await;

    if failed > 0 {
        bail!("{failed} task(s) failed");
    }

    Ok(())
}

/// One line per task, flushed so each date shows up as soon as it is done.
fn write_report(out: &mut impl Write, report: &RunReport) -> std::io::Result<()> {
    for task in &report.tasks {
        match &task.state {
            TaskState::Success(outcome) => writeln!(out, "{outcome}")?,
            TaskState::Failed(e) => {
                writeln!(out, "Task {} failed for {}: {e}", task.task_id, date::ds(report.date))?
            }
        }
    }
    out.flush()
}

fn configure(config_path: &std::path::Path) -> Result<()> {
    let mut config = Config::load_from(config_path)?;

    let api_key = inquire::Password::new("OpenWeather API key:")
        .without_confirmation()
        .with_display_mode(inquire::PasswordDisplayMode::Masked)
        .prompt()
        .context("Failed to read API key")?;

    if api_key.trim().is_empty() {
        bail!("API key must not be empty");
    }

    let zones = vec![TimestampZone::Local, TimestampZone::Utc];
    let start = zones.iter().position(|z| *z == config.timezone).unwrap_or(0);
    let zone = inquire::Select::new("Interpret dates as midnight in:", zones)
        .with_starting_cursor(start)
        .prompt()
        .context("Failed to read timezone choice")?;

    config.set_api_key(api_key.trim().to_string());
    config.timezone = zone;
    config.save_to(config_path)?;

    println!("Saved configuration to {}", config_path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn run_accepts_date_and_repeated_cities() {
        let cli = Cli::try_parse_from([
            "weather-scraper",
            "run",
            "--date",
            "2024-01-15",
            "--city",
            "Kyiv",
            "--city",
            "lviv",
        ])
        .expect("valid args");

        match cli.command {
            Command::Run { date, filter } => {
                assert_eq!(date, NaiveDate::from_ymd_opt(2024, 1, 15));
                let names: Vec<_> =
                    select_cities(&filter).expect("known").iter().map(|c| c.name).collect();
                assert_eq!(names, ["Kyiv", "Lviv"]);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn bad_date_is_rejected_at_parse_time() {
        let err = Cli::try_parse_from(["weather-scraper", "run", "--date", "15.01.2024"]).unwrap_err();
        assert!(err.to_string().contains("invalid date"));
    }

    #[test]
    fn unknown_city_lists_known_ones() {
        let filter = CityFilter { cities: vec!["Dnipro".into()] };
        let err = select_cities(&filter).unwrap_err().to_string();
        assert!(err.contains("Unknown city 'Dnipro'"));
        assert!(err.contains("Zhmerynka"));
    }

    #[test]
    fn report_writes_one_line_per_task() {
        use weather_scraper_core::{TaskOutcome, TaskRecord, WeatherObservation};

        let report = RunReport {
            date: NaiveDate::from_ymd_opt(2024, 1, 15).expect("valid"),
            tasks: vec![
                TaskRecord {
                    task_id: "fetch_weather_Kyiv".into(),
                    city: "Kyiv".into(),
                    state: TaskState::Success(TaskOutcome::Fetched {
                        city: "Kyiv".into(),
                        observation: WeatherObservation {
                            temperature: Some(5.2),
                            ..Default::default()
                        },
                    }),
                },
                TaskRecord {
                    task_id: "fetch_weather_Odesa".into(),
                    city: "Odesa".into(),
                    state: TaskState::Failed("bad weather response for Odesa".into()),
                },
            ],
        };

        let mut out = Vec::new();
        write_report(&mut out, &report).expect("write to vec");

        let text = String::from_utf8(out).expect("utf8");
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(
            lines,
            [
                "Weather for Kyiv: Temperature: 5.2, Humidity: null, Cloudiness: null, Wind Speed: null",
                "Task fetch_weather_Odesa failed for 2024-01-15: bad weather response for Odesa",
            ]
        );
    }

    #[test]
    fn empty_filter_selects_every_city() {
        let filter = CityFilter { cities: Vec::new() };
        assert_eq!(select_cities(&filter).expect("all").len(), CITIES.len());
    }
}
