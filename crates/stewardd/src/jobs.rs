//! SQL maintenance jobs from configuration.

use anyhow::Context;
use sqlx::PgPool;
use steward_scheduler::{JobRegistry, SchedulerResult};
use tracing::info;

use crate::config::SqlJobConfig;

/// Register every configured job, in file order.
pub fn build_registry(pool: &PgPool, jobs: &[SqlJobConfig]) -> SchedulerResult<JobRegistry> {
    let mut registry = JobRegistry::new();
    for job in jobs {
        let pool = pool.clone();
        let name = job.name.clone();
        let sql = job.sql.clone();
        let action = move || {
            let pool = pool.clone();
            let name = name.clone();
            let sql = sql.clone();
            async move {
                let result = sqlx::query(&sql)
                    .execute(&pool)
                    .await
                    .with_context(|| format!("job {name}: statement failed"))?;
                info!(job = %name, rows = result.rows_affected(), "sql job finished");
                Ok::<(), anyhow::Error>(())
            }
        };
        match &job.schedule {
            Some(expr) => registry.register_cron_job(&job.name, expr, action)?,
            None => registry.register_always_job(&job.name, action)?,
        };
    }
    Ok(registry)
}
