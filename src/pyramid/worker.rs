//! Row-parallel execution within a level.
//!
//! Rows of a level are independent, so each row runs as a blocking task on
//! the tokio runtime. A semaphore bounds how many rows are in flight. After
//! the first failure no further rows are started, and every started row is
//! joined before returning so no tile write outlives the call.

use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::error::BuildError;

/// Run `job(row)` for every row in `0..rows` with at most `workers` rows in
/// flight.
///
/// Returns the first error encountered.
pub(crate) async fn run_rows<F>(rows: u32, workers: usize, job: F) -> Result<(), BuildError>
where
    F: Fn(u32) -> Result<(), BuildError> + Send + Sync + 'static,
{
    let job = Arc::new(job);
    let semaphore = Arc::new(Semaphore::new(workers.max(1)));
    let mut tasks = JoinSet::new();
    let mut first_error: Option<BuildError> = None;

    for row in 0..rows {
        let permit = Arc::clone(&semaphore)
            .acquire_owned()
            .await
            .map_err(|e| BuildError::Worker(e.to_string()))?;

        while let Some(result) = tasks.try_join_next() {
            record(&mut first_error, result);
        }
        if first_error.is_some() {
            break;
        }

        let job = Arc::clone(&job);
        tasks.spawn_blocking(move || {
            let _permit = permit;
            job(row)
        });
    }

    while let Some(result) = tasks.join_next().await {
        record(&mut first_error, result);
    }

    match first_error {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

fn record(
    first_error: &mut Option<BuildError>,
    result: Result<Result<(), BuildError>, tokio::task::JoinError>,
) {
    let err = match result {
        Ok(Ok(())) => return,
        Ok(Err(err)) => err,
        Err(join_err) => BuildError::Worker(join_err.to_string()),
    };
    if first_error.is_none() {
        *first_error = Some(err);
    }
}
