//! Orchestrator
//!
//! Runs the load plan against one target: suspend foreign key checks, load
//! every table in plan order, restore the checks, then count each table.

use crate::loader::load_table;
use crate::plan::LoadPlan;
use crate::report::{LoadReport, TableOutcome};
use agrovida_mysql_sink::{LoadTarget, SinkError};
use anyhow::Context;
use futures::future::BoxFuture;
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::path::PathBuf;
use tracing::{error, info};

/// Options shared by every table load in a run.
#[derive(Clone, Debug)]
pub struct LoadOptions {
    pub data_dir: PathBuf,
    pub batch_size: usize,
}

impl From<&crate::config::LoadOpts> for LoadOptions {
    fn from(opts: &crate::config::LoadOpts) -> Self {
        Self {
            data_dir: opts.data_dir.clone(),
            batch_size: opts.batch_size,
        }
    }
}

/// Run `body` with foreign key checks disabled on `target`.
///
/// Checks are re-enabled once `body` finishes, whether it returned or
/// panicked; a panic is resumed after the checks are restored.
pub async fn with_foreign_key_checks_suspended<T, C, R, F>(
    target: &mut T,
    ctx: &C,
    body: F,
) -> Result<R, SinkError>
where
    T: LoadTarget + ?Sized,
    C: Sync + ?Sized,
    F: for<'a> FnOnce(&'a mut T, &'a C) -> BoxFuture<'a, R>,
{
    target.set_foreign_key_checks(false).await?;
    info!("Foreign key checks disabled");

    let outcome = AssertUnwindSafe(body(target, ctx)).catch_unwind().await;
    let restored = target.set_foreign_key_checks(true).await;

    match outcome {
        Ok(value) => {
            restored?;
            info!("Foreign key checks re-enabled");
            Ok(value)
        }
        Err(panic) => {
            if let Err(e) = restored {
                error!("Failed to re-enable foreign key checks after panic: {e}");
            }
            std::panic::resume_unwind(panic)
        }
    }
}

pub struct Loader {
    plan: LoadPlan,
    options: LoadOptions,
}

impl Loader {
    pub fn new(plan: LoadPlan, options: LoadOptions) -> Self {
        Self { plan, options }
    }

    /// Load every table of the plan, then verify the row counts.
    ///
    /// Table failures are recorded in the report and never stop the run. Only
    /// failing to toggle foreign key checks or to count rows is an error.
    pub async fn run<T: LoadTarget + ?Sized>(&self, target: &mut T) -> anyhow::Result<LoadReport> {
        info!(
            "Loading {} tables from {}",
            self.plan.tables().len(),
            self.options.data_dir.display()
        );

        let outcomes = with_foreign_key_checks_suspended(target, self, |target, loader| {
            Box::pin(loader.load_tables(target))
        })
        .await
        .context("Failed to toggle foreign key checks")?;

        let counts = self.verify(target).await?;

        Ok(LoadReport { outcomes, counts })
    }

    async fn load_tables<T: LoadTarget + ?Sized>(&self, target: &mut T) -> Vec<TableOutcome> {
        let mut outcomes = Vec::with_capacity(self.plan.tables().len());
        for spec in self.plan.tables() {
            let result = load_table(
                target,
                &self.options.data_dir,
                spec,
                self.options.batch_size,
            )
            .await;
            let outcome = TableOutcome {
                table: spec.table.clone(),
                result,
            };
            println!("{}", outcome.progress_line());
            outcomes.push(outcome);
        }
        outcomes
    }

    async fn verify<T: LoadTarget + ?Sized>(
        &self,
        target: &mut T,
    ) -> anyhow::Result<Vec<(String, u64)>> {
        let mut counts = Vec::with_capacity(self.plan.tables().len());
        for table in self.plan.table_names() {
            let count = target
                .count_rows(table)
                .await
                .with_context(|| format!("Failed to count rows in {table}"))?;
            counts.push((table.to_string(), count));
        }
        Ok(counts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::TableSpec;
    use crate::testing::{agrovida_fixture_counts, write_agrovida_fixture, InMemoryTarget};

    fn loader(dir: &std::path::Path, batch_size: usize) -> Loader {
        Loader::new(
            LoadPlan::agrovida(),
            LoadOptions {
                data_dir: dir.to_path_buf(),
                batch_size,
            },
        )
    }

    #[tokio::test]
    async fn test_full_load_counts_match_files() {
        let dir = tempfile::tempdir().unwrap();
        write_agrovida_fixture(dir.path()).unwrap();
        let mut target = InMemoryTarget::agrovida();

        let report = loader(dir.path(), 1).run(&mut target).await.unwrap();

        assert!(report.is_complete());
        for (table, expected) in agrovida_fixture_counts() {
            assert_eq!(report.count(table), Some(expected), "count of {table}");
        }
        assert_eq!(target.commits(), 7);
        assert!(target.foreign_key_checks());
    }

    #[tokio::test]
    async fn test_statement_sequence() {
        let dir = tempfile::tempdir().unwrap();
        write_agrovida_fixture(dir.path()).unwrap();
        let mut target = InMemoryTarget::agrovida();

        loader(dir.path(), 100).run(&mut target).await.unwrap();

        let statements = target.statements();
        assert_eq!(statements.first().map(String::as_str), Some("SET FOREIGN_KEY_CHECKS = 0"));
        let enable = statements
            .iter()
            .position(|s| s == "SET FOREIGN_KEY_CHECKS = 1")
            .unwrap();
        let last_commit = statements.iter().rposition(|s| s == "COMMIT").unwrap();
        let first_count = statements
            .iter()
            .position(|s| s.starts_with("SELECT COUNT(*)"))
            .unwrap();
        assert!(last_commit < enable);
        assert!(enable < first_count);
        assert_eq!(target.statements_starting_with("SELECT COUNT(*)").len(), 7);
    }

    #[tokio::test]
    async fn test_rerun_reports_collisions_per_table() {
        let dir = tempfile::tempdir().unwrap();
        write_agrovida_fixture(dir.path()).unwrap();
        let mut target = InMemoryTarget::agrovida();
        loader(dir.path(), 1).run(&mut target).await.unwrap();

        // Only farms gains a fresh file; every other table collides on its keys.
        std::fs::write(
            dir.path().join("farms.csv"),
            "farm_id,farm_name,region\n3,Finca Nueva,Huila\n",
        )
        .unwrap();
        let report = loader(dir.path(), 1).run(&mut target).await.unwrap();

        assert_eq!(
            report.failed_tables(),
            vec![
                "technicians",
                "crop_types",
                "varieties",
                "sensors",
                "farm_crops",
                "sensor_readings"
            ]
        );
        assert_eq!(report.count("farms"), Some(3));
        assert_eq!(report.count("technicians"), Some(2));
        assert!(target.foreign_key_checks());
    }

    #[tokio::test]
    async fn test_missing_column_fails_only_that_table() {
        let dir = tempfile::tempdir().unwrap();
        write_agrovida_fixture(dir.path()).unwrap();
        std::fs::write(
            dir.path().join("sensors.csv"),
            "sensor_id,sensor_type,sensor_status\n1,humidity,active\n",
        )
        .unwrap();
        let mut target = InMemoryTarget::agrovida();

        let report = loader(dir.path(), 1).run(&mut target).await.unwrap();

        assert_eq!(report.failed_tables(), vec!["sensors"]);
        assert_eq!(report.count("sensors"), Some(0));
        assert_eq!(report.count("sensor_readings"), Some(3));
        assert_eq!(report.count("farms"), Some(2));
    }

    #[tokio::test]
    async fn test_dangling_reference_loads_while_checks_suspended() {
        let dir = tempfile::tempdir().unwrap();
        write_agrovida_fixture(dir.path()).unwrap();
        std::fs::write(
            dir.path().join("sensor_readings.csv"),
            "reading_id,sensor_id,farm_crop_id,reading_value,reading_datetime\n\
             1,1,99,65.2,2024-03-01 08:00:00\n",
        )
        .unwrap();
        let mut target = InMemoryTarget::agrovida();

        let report = loader(dir.path(), 1).run(&mut target).await.unwrap();

        assert!(report.is_complete());
        assert_eq!(report.count("sensor_readings"), Some(1));
    }

    #[tokio::test]
    async fn test_reverse_order_loads_while_checks_suspended() {
        let dir = tempfile::tempdir().unwrap();
        write_agrovida_fixture(dir.path()).unwrap();
        let mut tables: Vec<TableSpec> = LoadPlan::agrovida().tables().to_vec();
        tables.reverse();
        let loader = Loader::new(
            LoadPlan::new(tables),
            LoadOptions {
                data_dir: dir.path().to_path_buf(),
                batch_size: 1,
            },
        );
        let mut target = InMemoryTarget::agrovida();

        let report = loader.run(&mut target).await.unwrap();

        assert!(report.is_complete());
        assert_eq!(report.counts.first().map(|(t, _)| t.as_str()), Some("sensor_readings"));
    }

    #[tokio::test]
    async fn test_missing_data_dir_fails_every_table() {
        let dir = tempfile::tempdir().unwrap();
        let mut target = InMemoryTarget::agrovida();

        let report = loader(&dir.path().join("absent"), 1)
            .run(&mut target)
            .await
            .unwrap();

        assert_eq!(report.failed_tables().len(), 7);
        assert!(report.counts.iter().all(|(_, count)| *count == 0));
        assert!(target.foreign_key_checks());
    }

    #[tokio::test]
    async fn test_unknown_table_fails_verification() {
        let dir = tempfile::tempdir().unwrap();
        write_agrovida_fixture(dir.path()).unwrap();
        let mut target = InMemoryTarget::agrovida();
        let loader = Loader::new(
            LoadPlan::new(vec![TableSpec::new("farms.csv", "farmz", &["farm_id"])]),
            LoadOptions {
                data_dir: dir.path().to_path_buf(),
                batch_size: 1,
            },
        );

        let err = loader.run(&mut target).await.err().unwrap();

        assert!(format!("{err:#}").contains("Failed to count rows in farmz"));
    }

    async fn panicking_body(_target: &mut InMemoryTarget, _ctx: &()) {
        panic!("load loop failed");
    }

    #[tokio::test]
    async fn test_checks_restored_after_panic() {
        let mut target = InMemoryTarget::agrovida();

        let result = AssertUnwindSafe(with_foreign_key_checks_suspended(
            &mut target,
            &(),
            |target, ctx| Box::pin(panicking_body(target, ctx)),
        ))
        .catch_unwind()
        .await;

        assert!(result.is_err());
        assert!(target.foreign_key_checks());
        assert_eq!(
            target.statements(),
            &["SET FOREIGN_KEY_CHECKS = 0", "SET FOREIGN_KEY_CHECKS = 1"]
        );
    }

    #[tokio::test]
    async fn test_suspension_returns_body_value() {
        let mut target = InMemoryTarget::agrovida();

        let value = with_foreign_key_checks_suspended(&mut target, "farms", |target, table| {
            Box::pin(async move {
                assert!(!target.foreign_key_checks());
                table.len()
            })
        })
        .await
        .unwrap();

        assert_eq!(value, 5);
        assert!(target.foreign_key_checks());
    }
}
