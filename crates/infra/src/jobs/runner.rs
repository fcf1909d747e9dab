//! Runs a job once: context, optional deadline, logging, run record.

use std::time::Duration;

use tracing::{info, warn};

use super::types::{Job, JobError, JobResult, JobRunContext, JobRunRecord};

/// Outcome of `JobRunner::run_once`.
#[derive(Debug)]
pub struct JobRun {
    pub record: JobRunRecord,
    pub outcome: Result<JobResult, JobError>,
}

#[derive(Debug, Clone, Default)]
pub struct JobRunner {
    deadline: Option<Duration>,
}

impl JobRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancel the run once `deadline` elapses. Jobs observe cancellation
    /// between units of work, so in-flight work finishes first.
    pub fn with_deadline(mut self, deadline: Option<Duration>) -> Self {
        self.deadline = deadline;
        self
    }

    pub async fn run_once<J>(&self, job: &J, ctx: JobRunContext) -> JobRun
    where
        J: Job + ?Sized,
    {
        info!(job = job.name(), job_id = %ctx.job_id, "job starting");

        let timer = self.deadline.map(|deadline| {
            let flag = ctx.cancellation().clone();
            tokio::spawn(async move {
                tokio::time::sleep(deadline).await;
                flag.cancel();
            })
        });

        let outcome = job.run(&ctx).await;

        if let Some(timer) = timer {
            timer.abort();
        }

        let record = JobRunRecord::from_outcome(job.name(), &ctx, &outcome);
        match &outcome {
            Ok(result) => info!(
                job = job.name(),
                job_id = %record.job_id,
                duration_ms = record.duration_ms,
                metadata = %result.metadata,
                "{}",
                result.message
            ),
            Err(e) => warn!(
                job = job.name(),
                job_id = %record.job_id,
                duration_ms = record.duration_ms,
                error = %e,
                "job aborted"
            ),
        }

        JobRun { record, outcome }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct CountdownJob {
        steps: u32,
    }

    #[async_trait::async_trait]
    impl Job for CountdownJob {
        fn name(&self) -> &'static str {
            "countdown"
        }

        async fn run(&self, ctx: &JobRunContext) -> Result<JobResult, JobError> {
            for _ in 0..self.steps {
                ctx.ensure_active()?;
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
            Ok(JobResult::success("counted down"))
        }
    }

    #[tokio::test]
    async fn completed_job_yields_successful_record() {
        let run = JobRunner::new()
            .run_once(&CountdownJob { steps: 2 }, JobRunContext::new())
            .await;

        assert!(run.record.success);
        assert_eq!(run.record.job_name, "countdown");
        assert_eq!(run.outcome.unwrap().message, "counted down");
    }

    #[tokio::test]
    async fn deadline_cancels_between_steps() {
        let run = JobRunner::new()
            .with_deadline(Some(Duration::from_millis(20)))
            .run_once(&CountdownJob { steps: 1_000 }, JobRunContext::new())
            .await;

        assert!(!run.record.success);
        assert!(matches!(run.outcome, Err(JobError::Cancelled)));
    }

    #[tokio::test]
    async fn pre_cancelled_context_never_runs_work() {
        let ctx = JobRunContext::new();
        ctx.cancellation().cancel();

        let run = JobRunner::new()
            .run_once(&CountdownJob { steps: 1 }, ctx)
            .await;

        assert!(matches!(run.outcome, Err(JobError::Cancelled)));
    }
}
