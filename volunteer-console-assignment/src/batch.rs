use core::future::Future;
use core::sync::atomic::{AtomicBool, Ordering};

use futures_util::stream::FuturesUnordered;
use futures_util::StreamExt as _;
use tracing::{debug, info, warn};
use volunteer_console_api::id::{AppointmentId, StudyId};
use volunteer_console_api::{ApiError, SessionWatch};

use crate::error::WorkflowError;

/// The backend work for one appointment. Steps inside `work` run in order, jobs run concurrently.
pub struct Job<F> {
    pub study: StudyId,
    pub appointment: AppointmentId,
    pub work: F,
}

/// Why a batch stopped early.
enum Stop {
    SessionEnded,
    Failed {
        study: StudyId,
        appointment: AppointmentId,
        source: ApiError,
    },
}

/// Runs all jobs at once and stops at the first failure or when the session ends.
///
/// Jobs not yet started are skipped after that, jobs already in flight run to completion and
/// count towards `applied`. Jobs already applied stay applied. Returns how many were applied.
pub async fn run_batch<F>(
    jobs: Vec<Job<F>>,
    session: Option<SessionWatch>,
) -> Result<usize, WorkflowError>
where
    F: Future<Output = Result<(), ApiError>>,
{
    let total = jobs.len();
    let stopped = AtomicBool::new(false);
    let mut pending: FuturesUnordered<_> = jobs
        .into_iter()
        .map(|job| {
            let stopped = &stopped;
            async move {
                // checked on the first poll, a job that got past it is in flight
                let result = if stopped.load(Ordering::Relaxed) {
                    None
                } else {
                    Some(job.work.await)
                };
                (job.study, job.appointment, result)
            }
        })
        .collect();

    let ended = async move {
        match session {
            Some(mut session) => session.ended().await,
            None => core::future::pending().await,
        }
    };
    tokio::pin!(ended);

    let mut applied = 0;
    let stop = loop {
        tokio::select! {
            biased;
            () = &mut ended => break Stop::SessionEnded,
            next = pending.next() => match next {
                None => {
                    info!(applied, "batch done");
                    return Ok(applied);
                }
                Some((_, _, Some(Ok(())))) => applied += 1,
                Some((_, _, None)) => {}
                Some((_, _, Some(Err(ApiError::Unauthorized | ApiError::NotAuthenticated)))) => {
                    break Stop::SessionEnded;
                }
                Some((study, appointment, Some(Err(source)))) => {
                    break Stop::Failed {
                        study,
                        appointment,
                        source,
                    };
                }
            }
        }
    };

    stopped.store(true, Ordering::Relaxed);
    let mut skipped = 0_usize;
    while let Some((study, appointment, result)) = pending.next().await {
        match result {
            Some(Ok(())) => applied += 1,
            Some(Err(source)) => debug!(%study, %appointment, "in-flight job failed: {source}"),
            None => skipped += 1,
        }
    }

    match stop {
        Stop::SessionEnded => {
            warn!(applied, total, skipped, "session expired, batch stopped");
            Err(WorkflowError::SessionExpired { applied })
        }
        Stop::Failed {
            study,
            appointment,
            source,
        } => {
            warn!(%study, %appointment, applied, total, skipped, "batch stopped: {source}");
            Err(WorkflowError::Batch {
                applied,
                total,
                study,
                appointment,
                source,
            })
        }
    }
}
