//! The daily job: one fetch task per city, run for each logical date.

use std::sync::Arc;

use chrono::NaiveDate;
use tokio::{sync::Semaphore, task::JoinSet};

use crate::{
    city::{CITIES, City},
    date::{ds, latest_due_date},
    error::JobError,
    model::TaskOutcome,
    task::{TaskContext, fetch_weather_data},
};

pub const JOB_ID: &str = "weather_dag_all_cities";

#[derive(Debug, Clone)]
pub struct DailyJob {
    pub id: &'static str,
    pub description: &'static str,
    pub start_date: NaiveDate,
    pub catchup: bool,
    pub max_active_tasks: usize,
    pub cities: Vec<City>,
}

impl Default for DailyJob {
    fn default() -> Self {
        Self {
            id: JOB_ID,
            description: "Weather data extraction for all cities",
            start_date: NaiveDate::from_ymd_opt(2004, 4, 20).unwrap_or_default(),
            catchup: true,
            max_active_tasks: CITIES.len(),
            cities: CITIES.to_vec(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TaskState {
    Success(TaskOutcome),
    Failed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct TaskRecord {
    pub task_id: String,
    pub city: String,
    pub state: TaskState,
}

/// Results of every task for one logical date, in city order.
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    pub date: NaiveDate,
    pub tasks: Vec<TaskRecord>,
}

impl RunReport {
    pub fn is_success(&self) -> bool {
        self.tasks.iter().all(|t| matches!(t.state, TaskState::Success(_)))
    }

    pub fn failed(&self) -> impl Iterator<Item = &TaskRecord> {
        self.tasks.iter().filter(|t| matches!(t.state, TaskState::Failed(_)))
    }
}

impl DailyJob {
    pub fn with_cities(mut self, cities: Vec<City>) -> Self {
        self.cities = cities;
        self
    }

    pub fn with_max_active_tasks(mut self, max: usize) -> Self {
        self.max_active_tasks = max;
        self
    }

    pub fn task_ids(&self) -> Vec<String> {
        self.cities.iter().map(City::task_id).collect()
    }

    /// Logical dates still owed after `last_completed`, as of `today`.
    pub fn due_dates(&self, last_completed: Option<NaiveDate>, today: NaiveDate) -> Vec<NaiveDate> {
        let latest = latest_due_date(today);
        let after = |d: NaiveDate| last_completed.is_none_or(|done| d > done);

        if !self.catchup {
            return if latest >= self.start_date && after(latest) { vec![latest] } else { Vec::new() };
        }

        let first = match last_completed.and_then(|d| d.succ_opt()) {
            Some(next) => next.max(self.start_date),
            None => self.start_date,
        };

        first.iter_days().take_while(|d| *d <= latest).collect()
    }

    /// Inclusive date range, clamped to the job's start date.
    pub fn dates_between(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<NaiveDate>, JobError> {
        if start > end {
            return Err(JobError::InvalidRange { start, end });
        }

        let first = start.max(self.start_date);
        if first != start {
            tracing::warn!("Clamping backfill start {start} to job start date {first}");
        }

        Ok(first.iter_days().take_while(|d| *d <= end).collect())
    }

    /// Run every city task for `date`, at most `max_active_tasks` at a time.
    pub async fn run_date(&self, ctx: Arc<TaskContext>, date: NaiveDate) -> RunReport {
        let ds = ds(date);
        let permits = Arc::new(Semaphore::new(self.max_active_tasks.max(1)));
        let mut set = JoinSet::new();

        tracing::info!("Starting {} for {ds} with {} tasks", self.id, self.cities.len());

        for (idx, city) in self.cities.iter().copied().enumerate() {
            let ctx = ctx.clone();
            let permits = permits.clone();
            let ds = ds.clone();

            set.spawn(async move {
                let _permit = permits.acquire_owned().await;
                (idx, fetch_weather_data(&ctx, &city, &ds).await)
            });
        }

        let mut slots: Vec<Option<TaskState>> = vec![None; self.cities.len()];

        while let Some(joined) = set.join_next().await {
            match joined {
                Ok((idx, Ok(outcome))) => slots[idx] = Some(TaskState::Success(outcome)),
                Ok((idx, Err(e))) => {
                    tracing::error!("Task {} failed for {ds}: {e}", self.cities[idx].task_id());
                    slots[idx] = Some(TaskState::Failed(e.to_string()));
                }
                Err(e) => tracing::error!("Task for {ds} did not complete: {e}"),
            }
        }

        let tasks = self
            .cities
            .iter()
            .zip(slots)
            .map(|(city, state)| TaskRecord {
                task_id: city.task_id(),
                city: city.name.to_string(),
                state: state.unwrap_or_else(|| TaskState::Failed("task did not complete".into())),
            })
            .collect();

        RunReport { date, tasks }
    }

    /// Run `dates` one after another, handing each report to `on_report` as
    /// soon as its date is done. Returns the number of failed tasks.
    pub async fn run_dates<F>(
        &self,
        ctx: Arc<TaskContext>,
        dates: &[NaiveDate],
        mut on_report: F,
    ) -> usize
    where
        F: FnMut(&RunReport),
    {
        let mut failed = 0;
        for date in dates {
            let report = self.run_date(ctx.clone(), *date).await;
            failed += report.failed().count();
            on_report(&report);
        }
        failed
    }
}
