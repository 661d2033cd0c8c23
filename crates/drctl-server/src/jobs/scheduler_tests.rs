#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use std::sync::Arc;

use super::test_helpers::{
    AGENT_HOST, AGENT_USER, FailingAgents, FailingPlugins, FailingProvisioner,
    FailingStore, RecordingProvisioner, add_agent, scheduler_for, seed_db,
};
use super::{JobError, JobScheduler, JobStatus, ScheduleRequest, parse_plugin_name};

fn request(name: &str, agent_host: &str) -> ScheduleRequest {
    ScheduleRequest {
        name: name.into(),
        agent_host: agent_host.into(),
        ..ScheduleRequest::default()
    }
}

// =============================================================================
// Plugin name parsing
// =============================================================================

#[test]
fn plugin_name_splits_on_first_slash() {
    assert_eq!(parse_plugin_name("default/tar").unwrap(), ("default", "tar"));
    assert_eq!(
        parse_plugin_name("default/tar/v2").unwrap(),
        ("default", "tar/v2")
    );
}

#[test]
fn malformed_plugin_names_rejected() {
    for name in ["", "tar", "/tar", "default/", "/"] {
        let err = parse_plugin_name(name).unwrap_err();
        assert!(matches!(err, JobError::InvalidName(_)), "accepted {name:?}");
    }
}

// =============================================================================
// Success path
// =============================================================================

#[tokio::test]
async fn schedule_without_time_persists_scheduled_job() {
    let db = seed_db().await;
    let provisioner = Arc::new(RecordingProvisioner::default());
    let scheduler = scheduler_for(&db, provisioner.clone());

    let scheduled = scheduler
        .schedule(request("default/tar", AGENT_HOST))
        .await
        .unwrap();

    let job = db.get_job(scheduled.id).await.unwrap();
    assert_eq!(job.agent_host, AGENT_HOST);
    assert_eq!(job.status.parse::<JobStatus>().unwrap(), JobStatus::Scheduled);
    assert!(job.time.is_none());
    assert!(job.config.is_none());
    assert_eq!(job.reconn_attempts, 0);
    assert_eq!(job.bucket_name, scheduled.bucket_name);

    let plugin = db
        .list_plugins_by_agent_host(AGENT_HOST)
        .await
        .unwrap()
        .into_iter()
        .find(|p| p.matches("default", "tar"))
        .unwrap();
    assert_eq!(job.plugin_id, plugin.id);
}

#[tokio::test]
async fn schedule_with_time_persists_it_unmodified() {
    let db = seed_db().await;
    let scheduler = scheduler_for(&db, Arc::new(RecordingProvisioner::default()));

    let scheduled = scheduler
        .schedule(ScheduleRequest {
            time: Some(1_893_456_000),
            config: Some(b"{\"compress\":true}".to_vec()),
            ..request("default/copy", AGENT_HOST)
        })
        .await
        .unwrap();

    let job = db.get_job(scheduled.id).await.unwrap();
    assert_eq!(job.time, Some(1_893_456_000));
    assert_eq!(job.config.as_deref(), Some(b"{\"compress\":true}".as_slice()));
}

#[tokio::test]
async fn schedule_provisions_bucket_for_agent_identity() {
    let db = seed_db().await;
    let provisioner = Arc::new(RecordingProvisioner::default());
    let scheduler = scheduler_for(&db, provisioner.clone());

    let scheduled = scheduler
        .schedule(request("default/tar", AGENT_HOST))
        .await
        .unwrap();

    let calls = provisioner.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0, scheduled.bucket_name);
    assert_eq!(calls[0].1, AGENT_USER);
    assert!(scheduled.bucket_name.starts_with("drctl-"));
}

#[tokio::test]
async fn every_job_gets_its_own_bucket() {
    let db = seed_db().await;
    let scheduler = scheduler_for(&db, Arc::new(RecordingProvisioner::default()));

    let a = scheduler
        .schedule(request("default/tar", AGENT_HOST))
        .await
        .unwrap();
    let b = scheduler
        .schedule(request("default/tar", AGENT_HOST))
        .await
        .unwrap();

    assert_ne!(a.id, b.id);
    assert_ne!(a.bucket_name, b.bucket_name);
}

#[tokio::test]
async fn plugin_must_belong_to_the_requested_agent() {
    let db = seed_db().await;
    add_agent(&db, "192.168.1.62").await;
    let scheduler = scheduler_for(&db, Arc::new(RecordingProvisioner::default()));

    // default/copy is only registered on the seeded agent
    let err = scheduler
        .schedule(request("default/copy", "192.168.1.62"))
        .await
        .unwrap_err();
    assert!(matches!(err, JobError::PluginNotFound));

    let scheduled = scheduler
        .schedule(request("default/tar", "192.168.1.62"))
        .await
        .unwrap();
    let job = db.get_job(scheduled.id).await.unwrap();
    assert_eq!(job.agent_host, "192.168.1.62");
}

// =============================================================================
// Failure paths
// =============================================================================

#[tokio::test]
async fn unknown_agent_is_not_found_and_persists_nothing() {
    let db = seed_db().await;
    let provisioner = Arc::new(RecordingProvisioner::default());
    let scheduler = scheduler_for(&db, provisioner.clone());

    let err = scheduler
        .schedule(request("default/tar", "10.0.0.1"))
        .await
        .unwrap_err();

    assert!(matches!(err, JobError::AgentNotFound));
    assert_eq!(tonic::Status::from(err).code(), tonic::Code::NotFound);
    assert!(provisioner.calls().is_empty());
    assert!(db.list_jobs().await.unwrap().is_empty());
}

#[tokio::test]
async fn deleted_agent_is_not_found() {
    let db = seed_db().await;
    db.soft_delete_agent(AGENT_HOST).await.unwrap();
    let scheduler = scheduler_for(&db, Arc::new(RecordingProvisioner::default()));

    let err = scheduler
        .schedule(request("default/tar", AGENT_HOST))
        .await
        .unwrap_err();
    assert!(matches!(err, JobError::AgentNotFound));
}

#[tokio::test]
async fn unknown_plugin_is_not_found_and_persists_nothing() {
    let db = seed_db().await;
    let provisioner = Arc::new(RecordingProvisioner::default());
    let scheduler = scheduler_for(&db, provisioner.clone());

    let err = scheduler
        .schedule(request("default/rsync", AGENT_HOST))
        .await
        .unwrap_err();

    assert!(matches!(err, JobError::PluginNotFound));
    assert_eq!(err.to_string(), "plugin not found");
    assert!(provisioner.calls().is_empty());
    assert!(db.list_jobs().await.unwrap().is_empty());
}

#[tokio::test]
async fn invalid_name_fails_before_any_lookup() {
    let provisioner = Arc::new(RecordingProvisioner::default());
    let store = Arc::new(FailingStore::default());
    let scheduler = JobScheduler::new(
        Arc::new(FailingAgents),
        Arc::new(FailingPlugins),
        provisioner.clone(),
        store.clone(),
        "drctl",
    );

    let err = scheduler
        .schedule(request("tar", AGENT_HOST))
        .await
        .unwrap_err();

    assert!(matches!(err, JobError::InvalidName(_)));
    assert_eq!(tonic::Status::from(err).code(), tonic::Code::InvalidArgument);
    assert!(provisioner.calls().is_empty());
    assert!(store.attempted().is_empty());
}

#[tokio::test]
async fn agent_store_failure_is_load_agent() {
    let db = seed_db().await;
    let scheduler = JobScheduler::new(
        Arc::new(FailingAgents),
        db.clone(),
        Arc::new(RecordingProvisioner::default()),
        db.clone(),
        "drctl",
    );

    let err = scheduler
        .schedule(request("default/tar", AGENT_HOST))
        .await
        .unwrap_err();

    assert!(matches!(err, JobError::LoadAgent(_)));
    assert_eq!(tonic::Status::from(err).code(), tonic::Code::Unknown);
    assert!(db.list_jobs().await.unwrap().is_empty());
}

#[tokio::test]
async fn plugin_store_failure_is_load_plugins() {
    let db = seed_db().await;
    let scheduler = JobScheduler::new(
        db.clone(),
        Arc::new(FailingPlugins),
        Arc::new(RecordingProvisioner::default()),
        db.clone(),
        "drctl",
    );

    let err = scheduler
        .schedule(request("default/tar", AGENT_HOST))
        .await
        .unwrap_err();

    assert_eq!(
        err.to_string(),
        "error loading the agent's plugins: testing error"
    );
    assert!(db.list_jobs().await.unwrap().is_empty());
}

#[tokio::test]
async fn provisioning_failure_persists_nothing() {
    let db = seed_db().await;
    let scheduler = scheduler_for(&db, Arc::new(FailingProvisioner));

    let err = scheduler
        .schedule(request("default/tar", AGENT_HOST))
        .await
        .unwrap_err();

    assert!(matches!(err, JobError::Provision(_)));
    assert_eq!(tonic::Status::from(err).code(), tonic::Code::Unknown);
    assert!(db.list_jobs().await.unwrap().is_empty());
}

#[tokio::test]
async fn insert_failure_reports_full_chain() {
    let db = seed_db().await;
    let provisioner = Arc::new(RecordingProvisioner::default());
    let store = Arc::new(FailingStore::default());
    let scheduler = JobScheduler::new(db.clone(), db.clone(), provisioner.clone(), store.clone(), "drctl");

    let err = scheduler
        .schedule(request("default/tar", AGENT_HOST))
        .await
        .unwrap_err();

    assert!(matches!(err, JobError::AddJob(_)));
    let status = tonic::Status::from(err);
    assert_eq!(status.code(), tonic::Code::Unknown);
    assert_eq!(
        status.message(),
        "error adding the job: error adding the job to the DB: testing error"
    );

    // Storage was provisioned for exactly the bucket of the rejected job
    let attempted = store.attempted();
    assert_eq!(attempted.len(), 1);
    assert_eq!(attempted[0].status, JobStatus::Scheduled);
    assert_eq!(provisioner.calls()[0].0, attempted[0].bucket_name);
    assert!(db.list_jobs().await.unwrap().is_empty());
}
