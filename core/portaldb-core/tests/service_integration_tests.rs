// DatabaseService integration tests
//
// Portal scenarios through the typed facade: job lifecycle, cached reads,
// connection checks, index bootstrap and write-failure propagation.

use portaldb_core::service::models::{
    JobPatch, JobStatus, NewCompany, NewJob, NewJobCategory, NewUser, UserPatch, UserProfile,
    UserRole,
};
use portaldb_core::service::{DatabaseService, IndexDefinition, default_indexes};
use portaldb_core::storage::{KvBackend, MemoryKv};
use portaldb_core::store::{Filter, IndexSpec};
use portaldb_core::{PortalDbError, PortalDbResult, StoreConfig};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

// ─── Helpers ────────────────────────────────────────────

/// Backend spy counting calls into a `MemoryKv`.
#[derive(Default)]
struct CountingKv {
    inner: MemoryKv,
    gets: AtomicU64,
    sets: AtomicU64,
}

impl CountingKv {
    fn gets(&self) -> u64 {
        self.gets.load(Ordering::SeqCst)
    }

    fn sets(&self) -> u64 {
        self.sets.load(Ordering::SeqCst)
    }
}

impl KvBackend for CountingKv {
    fn get(&self, key: &str) -> PortalDbResult<Option<String>> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: &str) -> PortalDbResult<()> {
        self.sets.fetch_add(1, Ordering::SeqCst);
        self.inner.set(key, value)
    }

    fn remove(&self, key: &str) -> PortalDbResult<bool> {
        self.inner.remove(key)
    }

    fn keys(&self) -> PortalDbResult<Vec<String>> {
        self.inner.keys()
    }
}

fn config() -> StoreConfig {
    StoreConfig::new("it", "portal")
}

fn service() -> DatabaseService {
    DatabaseService::new(Arc::new(MemoryKv::new()), config())
}

fn category(name: &str) -> NewJobCategory {
    NewJobCategory {
        name: name.into(),
        ..Default::default()
    }
}

// ═══════════════════════════════════════════════════════════
// Job lifecycle
// ═══════════════════════════════════════════════════════════

#[tokio::test]
async fn job_lifecycle() {
    portaldb_core::logging::init_test();
    let svc = service();
    let employer = svc
        .create_user(NewUser {
            email: "hr@everest.com".into(),
            password_hash: "x".into(),
            full_name: "Everest HR".into(),
            role: UserRole::Employer,
            ..Default::default()
        })
        .await
        .unwrap();
    let company = svc
        .create_company(NewCompany {
            name: "Everest Tech".into(),
            employer_id: Some(employer.id.clone()),
            ..Default::default()
        })
        .await
        .unwrap();
    let it = svc.create_job_category(category("Information Technology")).await.unwrap();
    assert_eq!(it.slug, "information-technology");

    let job = svc
        .create_job(NewJob {
            title: "Rust Developer".into(),
            company_id: company.id.clone(),
            category_id: Some(it.id.clone()),
            salary_min: Some(80_000.0),
            salary_max: Some(120_000.0),
            posted_by: Some(employer.id.clone()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(job.status, JobStatus::Active);
    assert_eq!(job.created_at, job.updated_at);

    let by_company = svc
        .get_jobs(&Filter::eq("company_id", company.id.as_str()), None, None)
        .await;
    assert_eq!(by_company.len(), 1);
    let active = svc.get_jobs(&Filter::eq("status", "active"), None, None).await;
    assert_eq!(active, vec![job.clone()]);

    let expired = svc
        .update_job(&job.id, JobPatch::status(JobStatus::Expired))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(expired.status, JobStatus::Expired);
    assert_eq!(expired.created_at, job.created_at);
    assert!(expired.updated_at >= job.updated_at);
    assert!(svc.get_jobs(&Filter::eq("status", "active"), None, None).await.is_empty());
    let expired_jobs = svc.get_jobs(&Filter::eq("status", "expired"), None, None).await;
    assert_eq!(expired_jobs, vec![expired.clone()]);

    assert!(svc.delete_job(&job.id).await.unwrap());
    assert!(svc.get_job_by_id(&job.id).await.is_none());
    for status in ["active", "expired"] {
        assert!(svc.get_jobs(&Filter::eq("status", status), None, None).await.is_empty());
    }
    assert!(!svc.delete_job(&job.id).await.unwrap());
}

#[tokio::test]
async fn get_jobs_pages_in_insertion_order() {
    let svc = service();
    for i in 0..5 {
        svc.create_job(NewJob {
            title: format!("Job {i}"),
            company_id: "c1".into(),
            ..Default::default()
        })
        .await
        .unwrap();
    }

    let page: Vec<String> = svc
        .get_jobs(&Filter::all(), Some(2), Some(1))
        .await
        .into_iter()
        .map(|j| j.title)
        .collect();
    assert_eq!(page, vec!["Job 1", "Job 2"]);
    assert_eq!(svc.count_jobs(&Filter::eq("company_id", "c1")).await, 5);
}

#[tokio::test]
async fn profile_update_replaces_whole_profile() {
    let svc = service();
    let user = svc
        .create_user(NewUser {
            email: "gita@x.com".into(),
            password_hash: "x".into(),
            full_name: "Gita".into(),
            profile: Some(UserProfile {
                bio: Some("Accountant".into()),
                skills: vec!["tally".into()],
                ..Default::default()
            }),
            ..Default::default()
        })
        .await
        .unwrap();

    let updated = svc
        .update_user(
            &user.id,
            UserPatch {
                profile: Some(UserProfile {
                    skills: vec!["excel".into()],
                    ..Default::default()
                }),
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .unwrap();
    let profile = updated.profile.unwrap();
    assert_eq!(profile.skills, vec!["excel".to_string()]);
    assert!(profile.bio.is_none());
}

// ═══════════════════════════════════════════════════════════
// Category cache
// ═══════════════════════════════════════════════════════════

#[tokio::test(start_paused = true)]
async fn category_listing_is_cached_until_ttl() {
    let kv = Arc::new(CountingKv::default());
    let svc = DatabaseService::new(kv.clone(), config());
    svc.create_job_category(category("Banking")).await.unwrap();

    let first = svc.get_job_categories(&Filter::all()).await;
    assert_eq!(first.len(), 1);
    let reads = svc.database().stats().reads;
    let gets = kv.gets();

    let second = svc.get_job_categories(&Filter::all()).await;
    assert_eq!(second, first);
    assert_eq!(svc.database().stats().reads, reads);
    assert_eq!(kv.gets(), gets);
    assert_eq!(svc.category_cache_stats().hits, 1);

    // creation does not invalidate the listing
    svc.create_job_category(category("Engineering")).await.unwrap();
    assert_eq!(svc.get_job_categories(&Filter::all()).await.len(), 1);

    // filtered reads bypass the cache
    let tier_one = svc.get_job_categories(&Filter::eq("tier", 1)).await;
    assert_eq!(tier_one.len(), 2);

    tokio::time::advance(Duration::from_secs(31)).await;
    assert_eq!(svc.get_job_categories(&Filter::all()).await.len(), 2);
}

// ═══════════════════════════════════════════════════════════
// Connection check
// ═══════════════════════════════════════════════════════════

#[tokio::test(start_paused = true)]
async fn connection_check_is_cached() {
    let kv = Arc::new(CountingKv::default());
    let svc = DatabaseService::new(kv.clone(), config());

    assert!(svc.check_connection().await);
    let sets = kv.sets();
    assert!(svc.check_connection().await);
    assert_eq!(kv.sets(), sets);

    tokio::time::advance(Duration::from_secs(6)).await;
    assert!(svc.check_connection().await);
    assert_eq!(kv.sets(), sets + 1);
}

#[tokio::test]
async fn connection_check_fails_when_backend_refuses_writes() {
    let svc = DatabaseService::new(Arc::new(MemoryKv::with_quota(4)), config());
    assert!(!svc.check_connection().await);
}

// ═══════════════════════════════════════════════════════════
// Index bootstrap
// ═══════════════════════════════════════════════════════════

#[tokio::test]
async fn failing_index_does_not_abort_setup() {
    let svc = service();
    let indexes = vec![
        IndexDefinition::new("users", IndexSpec::asc("email")).unique(),
        IndexDefinition::new("jobs", IndexSpec::new()),
        IndexDefinition::new("jobs", IndexSpec::asc("status")),
    ];

    let report = svc.setup_database_with(&indexes).await;
    assert_eq!(report.created, vec!["users.email_1", "jobs.status_1"]);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].0, "jobs");
    assert!(!report.timed_out);
    assert!(!report.is_clean());
}

#[tokio::test(start_paused = true)]
async fn slow_setup_times_out_with_warnings() {
    let svc = DatabaseService::new(
        Arc::new(MemoryKv::new()),
        config()
            .with_op_latency(Duration::from_secs(1))
            .with_setup_timeout(Duration::from_millis(2500)),
    );

    let report = svc.setup_database().await;
    assert!(report.timed_out);
    assert_eq!(report.created.len(), 2);
    assert!(report.created.len() < default_indexes().len());

    // settled: a second call does not retry
    assert_eq!(svc.setup_database().await, report);
}

// ═══════════════════════════════════════════════════════════
// Failures
// ═══════════════════════════════════════════════════════════

#[tokio::test]
async fn write_failure_propagates_and_leaves_no_trace() {
    let svc = DatabaseService::new(Arc::new(MemoryKv::with_quota(64)), config());
    let res = svc
        .create_user(NewUser {
            email: "big@x.com".into(),
            password_hash: "a-long-password-hash-that-does-not-fit".into(),
            full_name: "Too Big".into(),
            ..Default::default()
        })
        .await;

    assert!(matches!(res, Err(PortalDbError::Storage(_))));
    assert!(svc.get_user_by_email("big@x.com").await.is_none());
}

#[tokio::test]
async fn validation_errors_name_the_entity() {
    let svc = service();
    let err = svc
        .create_job_category(NewJobCategory {
            name: "Deep".into(),
            tier: 4,
            ..Default::default()
        })
        .await
        .unwrap_err();
    match err {
        PortalDbError::Validation { entity, .. } => assert_eq!(entity, "job_category"),
        other => panic!("unexpected error: {other}"),
    }
}
