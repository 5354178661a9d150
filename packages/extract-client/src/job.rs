//! Asynchronous extract jobs.
//!
//! [`ExtractJobClient`] submits a clause list and follows the job with a
//! polling task until the server reports a terminal state:
//!
//! ```text
//! Idle -> Submitting -> WaitingForId -> Polling -> Succeeded | Failed
//! ```
//!
//! The submission request and the poll loop run as separate tasks that share
//! the tracked [`ExtractJob`] through a `watch` channel. The poll loop may
//! therefore tick before the submission response has delivered an id; such
//! ticks just wait another interval. Both tasks stop when the job's
//! [`CancellationToken`] is cancelled, which happens on [`ExtractJobClient::cancel`],
//! on the next submission, and when the client is dropped. The job keeps
//! running server-side.

use bytes::Bytes;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::PollConfig;
use crate::error::{ExtractError, Result};
use crate::traits::api::ExtractApi;
use crate::types::{
    clause::Clause,
    job::{ExtractJob, ExtractRequest, JobPhase, RemoteState},
    slice::DataSlice,
};

type JobCell = Arc<watch::Sender<ExtractJob>>;

/// Tracks at most one extract job at a time.
pub struct ExtractJobClient<A: ?Sized> {
    api: Arc<A>,
    poll: PollConfig,
    job: JobCell,
    cancel: CancellationToken,
}

impl<A: ?Sized> Drop for ExtractJobClient<A> {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

impl<A: ExtractApi + ?Sized + 'static> ExtractJobClient<A> {
    pub fn new(api: Arc<A>, poll: PollConfig) -> Self {
        Self {
            api,
            poll,
            job: Arc::new(watch::Sender::new(ExtractJob::default())),
            cancel: CancellationToken::new(),
        }
    }

    /// Snapshot of the tracked job.
    pub fn job(&self) -> ExtractJob {
        self.job.borrow().clone()
    }

    pub fn phase(&self) -> JobPhase {
        self.job.borrow().phase
    }

    pub fn subscribe(&self) -> watch::Receiver<ExtractJob> {
        self.job.subscribe()
    }

    /// Submit an extract and start polling for it.
    ///
    /// Returns immediately; follow progress with [`subscribe`](Self::subscribe)
    /// or [`wait`](Self::wait). Must be called from within a tokio runtime.
    /// Fails with [`ExtractError::JobInProgress`] while a previous job is
    /// still being followed.
    pub fn submit(&mut self, clauses: &[Clause], slice: &DataSlice) -> Result<()> {
        if self.phase().is_in_flight() {
            return Err(ExtractError::JobInProgress);
        }

        let request = ExtractRequest {
            criteria: serde_json::to_string(clauses)?,
            data_slice: serde_json::to_string(slice)?,
        };

        self.cancel.cancel();
        let cancel = CancellationToken::new();
        self.cancel = cancel.clone();
        self.job.send_replace(ExtractJob::submitting());

        info!(clauses = clauses.len(), "Submitting extract");

        tokio::spawn(submit_extract(
            self.api.clone(),
            self.job.clone(),
            request,
            cancel.clone(),
        ));
        tokio::spawn(poll_until_done(
            self.api.clone(),
            self.job.clone(),
            self.poll.clone(),
            cancel,
        ));

        Ok(())
    }

    /// Stop following the current job and return to `Idle`.
    pub fn cancel(&mut self) {
        self.cancel.cancel();
        self.job.send_replace(ExtractJob::default());
    }

    /// Resolve once the job is terminal, or immediately when nothing is tracked.
    pub async fn wait(&self) -> ExtractJob {
        let mut rx = self.job.subscribe();
        let result = rx
            .wait_for(|j| j.phase.is_terminal() || j.phase == JobPhase::Idle)
            .await
            .map(|j| j.clone());
        // The sender lives in `self`, so the channel cannot close here.
        result.unwrap_or_else(|_| self.job())
    }

    /// Submit, wait, and turn a failed job into an error.
    pub async fn run(&mut self, clauses: &[Clause], slice: &DataSlice) -> Result<ExtractJob> {
        self.submit(clauses, slice)?;
        let job = self.wait().await;
        if job.phase == JobPhase::Succeeded {
            return Ok(job);
        }

        let Some(id) = job.id else {
            return Err(ExtractError::SubmissionFailed(
                job.error.unwrap_or_else(|| "no extract id assigned".to_string()),
            ));
        };
        let exhausted = job.remote_state != Some(RemoteState::Failure)
            && self.poll.max_polls == Some(job.polls);
        Err(if exhausted {
            ExtractError::PollLimitExceeded {
                id: id.to_string(),
                polls: job.polls,
            }
        } else {
            ExtractError::JobFailed { id: id.to_string() }
        })
    }

    /// Fetch the artifact of a succeeded job.
    ///
    /// Returns `Ok(None)` without any request while the job is not finished.
    pub async fn request_download(&self) -> Result<Option<Bytes>> {
        let job = self.job();
        let (true, Some(id)) = (job.download_ready(), job.id) else {
            debug!(phase = ?job.phase, "Extract not ready, ignoring download request");
            return Ok(None);
        };

        info!(extract_id = %id, "Downloading extract");
        self.api.download_extract(&id).await.map(Some)
    }
}

/// Apply `f` unless the job has been abandoned.
fn update(job: &JobCell, cancel: &CancellationToken, f: impl FnOnce(&mut ExtractJob)) -> bool {
    job.send_if_modified(|j| {
        if cancel.is_cancelled() {
            return false;
        }
        f(j);
        true
    })
}

async fn sleep_or_cancel(delay: Duration, cancel: &CancellationToken) -> bool {
    tokio::select! {
        _ = tokio::time::sleep(delay) => true,
        _ = cancel.cancelled() => false,
    }
}

async fn submit_extract<A: ExtractApi + ?Sized>(
    api: Arc<A>,
    job: JobCell,
    request: ExtractRequest,
    cancel: CancellationToken,
) {
    let result = tokio::select! {
        result = api.submit_extract(&request) => result,
        _ = cancel.cancelled() => return,
    };

    match result {
        Ok(submitted) => match submitted.extract_id {
            Some(id) => {
                info!(extract_id = %id, "Extract submitted, polling for completion");
                update(&job, &cancel, |j| {
                    if !j.phase.is_terminal() {
                        j.id = Some(id);
                        j.phase = JobPhase::Polling;
                    }
                });
            }
            None => {
                warn!("Submission response carried no extract id");
                update(&job, &cancel, |j| {
                    if !j.phase.is_terminal() {
                        j.phase = JobPhase::WaitingForId;
                    }
                });
            }
        },
        Err(e) => {
            error!(error = %e, "Extract submission failed");
            update(&job, &cancel, |j| {
                if !j.phase.is_terminal() {
                    j.finish(JobPhase::Failed, Some(e.to_string()));
                }
            });
        }
    }
}

async fn poll_until_done<A: ExtractApi + ?Sized>(
    api: Arc<A>,
    job: JobCell,
    poll: PollConfig,
    cancel: CancellationToken,
) {
    let mut polls = 0u32;
    let mut failures = 0u32;
    // Ticks spent without an id; bounded by the same ceiling as status polls.
    let mut idle_ticks = 0u32;

    loop {
        let (id, phase) = {
            let current = job.borrow();
            (current.id.clone(), current.phase)
        };
        if phase.is_terminal() || cancel.is_cancelled() {
            return;
        }

        let Some(id) = id else {
            if poll.max_polls.is_some_and(|max| idle_ticks >= max) {
                error!(idle_ticks, "No extract id assigned, giving up");
                update(&job, &cancel, |j| {
                    j.finish(
                        JobPhase::Failed,
                        Some(format!("no extract id assigned after {idle_ticks} checks")),
                    )
                });
                return;
            }
            idle_ticks += 1;
            debug!(idle_ticks, "Extract id not assigned yet, waiting");
            if !sleep_or_cancel(poll.interval, &cancel).await {
                return;
            }
            continue;
        };

        if poll.max_polls.is_some_and(|max| polls >= max) {
            let e = ExtractError::PollLimitExceeded {
                id: id.to_string(),
                polls,
            };
            error!(extract_id = %id, polls, "Giving up on extract");
            update(&job, &cancel, |j| j.finish(JobPhase::Failed, Some(e.to_string())));
            return;
        }

        polls += 1;
        let result = tokio::select! {
            result = api.extract_status(&id) => result,
            _ = cancel.cancelled() => return,
        };

        match result {
            Ok(status) => {
                failures = 0;
                let state = status.state;
                update(&job, &cancel, |j| {
                    j.polls = polls;
                    j.remote_state = Some(state);
                    match state {
                        RemoteState::Success => j.finish(JobPhase::Succeeded, None),
                        RemoteState::Failure => j.finish(
                            JobPhase::Failed,
                            Some(ExtractError::JobFailed { id: id.to_string() }.to_string()),
                        ),
                        RemoteState::Pending | RemoteState::Other => {}
                    }
                });

                match state {
                    RemoteState::Success => {
                        info!(extract_id = %id, polls, "Extract ready for download");
                        return;
                    }
                    RemoteState::Failure => {
                        error!(extract_id = %id, polls, "Extract failed");
                        return;
                    }
                    RemoteState::Pending | RemoteState::Other => {
                        debug!(extract_id = %id, state = ?state, "Extract still running");
                    }
                }
            }
            Err(e) => {
                failures += 1;
                update(&job, &cancel, |j| j.polls = polls);
                warn!(extract_id = %id, error = %e, failures, "Status poll failed, retrying");
            }
        }

        if !sleep_or_cancel(poll.backoff(failures), &cancel).await {
            return;
        }
    }
}
