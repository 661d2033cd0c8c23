//! `JobService` gRPC implementation.

use std::sync::Arc;

use tonic::{Request, Response, Status};
use tracing::{instrument, warn};

use drctl_proto::v1::job_service_server::JobService;
use drctl_proto::v1::{
    JobListRequest, JobListResponse, JobScheduleRequest, JobScheduleResponse, job_list_response,
};

use crate::jobs::{JobLister, JobScheduler, JobSummary, ScheduleRequest};

pub struct JobServiceImpl {
    scheduler: Arc<JobScheduler>,
    lister: Arc<JobLister>,
}

impl JobServiceImpl {
    pub const fn new(scheduler: Arc<JobScheduler>, lister: Arc<JobLister>) -> Self {
        Self { scheduler, lister }
    }
}

impl From<JobScheduleRequest> for ScheduleRequest {
    fn from(req: JobScheduleRequest) -> Self {
        Self {
            name: req.name,
            agent_host: req.agent_host,
            // Sub-second precision is not kept.
            time: req.time.map(|t| t.seconds),
            config: (!req.config.is_empty()).then_some(req.config),
        }
    }
}

fn summary_to_proto(job: JobSummary) -> job_list_response::Job {
    job_list_response::Job {
        id: job.id,
        name: String::new(),
        agent_host: job.agent_host,
        status: job.status.to_proto().into(),
    }
}

#[tonic::async_trait]
impl JobService for JobServiceImpl {
    #[instrument(skip(self, request), fields(rpc = "JobSchedule"))]
    async fn job_schedule(
        &self,
        request: Request<JobScheduleRequest>,
    ) -> Result<Response<JobScheduleResponse>, Status> {
        self.scheduler
            .schedule(request.into_inner().into())
            .await
            .map_err(|e| {
                warn!(error = %e, "Job scheduling failed");
                Status::from(e)
            })?;

        Ok(Response::new(JobScheduleResponse {}))
    }

    #[instrument(skip(self, request), fields(rpc = "JobList"))]
    async fn job_list(
        &self,
        request: Request<JobListRequest>,
    ) -> Result<Response<JobListResponse>, Status> {
        let req = request.into_inner();
        let agent_host = Some(req.agent_host.as_str()).filter(|h| !h.is_empty());

        let jobs = self.lister.list(agent_host).await.map_err(|e| {
            warn!(error = %e, agent_host = ?agent_host, "Job listing failed");
            Status::from(e)
        })?;

        Ok(Response::new(JobListResponse {
            jobs: jobs.into_iter().map(summary_to_proto).collect(),
        }))
    }
}
