//! DatabaseService: typed entry point used by the portal.
//!
//! Owns the backend, configuration and clock it is constructed with and
//! connects the [`Database`] on first use. Every entity operation goes
//! through a [`Repository`] bound to that database.
//!
//! Reads never fail: a miss is `None`, a failed lookup is an empty vector.
//! Writes return [`PortalDbResult`].

use crate::config::StoreConfig;
use crate::error::PortalDbResult;
use crate::service::cache::{CacheStats, TimedCache};
use crate::service::clock::{Clock, SystemClock};
use crate::service::models::{
    Application, ApplicationPatch, Company, CompanyPatch, Job, JobCategory, JobPatch,
    NewApplication, NewCompany, NewJob, NewJobCategory, NewUser, User, UserPatch,
};
use crate::service::models::user::normalize_email;
use crate::service::repository::{Entity, Repository};
use crate::storage::KvBackend;
use crate::store::{Database, Filter, IndexOptions, IndexSpec};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// One index `setup_database` should create.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexDefinition {
    pub collection: String,
    pub spec: IndexSpec,
    pub options: IndexOptions,
}

impl IndexDefinition {
    pub fn new(collection: &str, spec: IndexSpec) -> Self {
        Self {
            collection: collection.to_string(),
            spec,
            options: IndexOptions::default(),
        }
    }

    pub fn unique(mut self) -> Self {
        self.options.unique = true;
        self
    }
}

/// Outcome of an index bootstrap.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SetupReport {
    /// `collection.index_name` of every index created or already present
    pub created: Vec<String>,
    /// `(collection, error)` for every index that failed
    pub failed: Vec<(String, String)>,
    /// The batch did not finish within `setup_timeout`
    pub timed_out: bool,
}

impl SetupReport {
    /// Finished in time with no failed index.
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty() && !self.timed_out
    }
}

/// Indexes the portal expects.
pub fn default_indexes() -> Vec<IndexDefinition> {
    vec![
        IndexDefinition::new(User::COLLECTION, IndexSpec::asc("email")).unique(),
        IndexDefinition::new(User::COLLECTION, IndexSpec::asc("role")),
        IndexDefinition::new(Company::COLLECTION, IndexSpec::asc("employer_id")),
        IndexDefinition::new(Job::COLLECTION, IndexSpec::asc("company_id")),
        IndexDefinition::new(Job::COLLECTION, IndexSpec::asc("category_id")),
        IndexDefinition::new(Job::COLLECTION, IndexSpec::asc("status").then_desc("created_at")),
        IndexDefinition::new(JobCategory::COLLECTION, IndexSpec::asc("slug")).unique(),
        IndexDefinition::new(JobCategory::COLLECTION, IndexSpec::asc("parent_id")),
        IndexDefinition::new(
            Application::COLLECTION,
            IndexSpec::asc("job_id").then_asc("job_seeker_id"),
        )
        .unique(),
        IndexDefinition::new(Application::COLLECTION, IndexSpec::asc("job_seeker_id")),
    ]
}

pub struct DatabaseService {
    backend: Arc<dyn KvBackend>,
    config: StoreConfig,
    clock: Arc<dyn Clock>,
    db: Mutex<Option<Arc<Database>>>,
    category_cache: TimedCache<(), Vec<JobCategory>>,
    connection_cache: TimedCache<(), bool>,
    /// Report of the first completed `setup_database`
    setup: Mutex<Option<SetupReport>>,
    /// Serializes concurrent `setup_database` calls
    setup_running: tokio::sync::Mutex<()>,
}

impl DatabaseService {
    pub fn new(backend: Arc<dyn KvBackend>, config: StoreConfig) -> Self {
        Self::with_clock(backend, config, Arc::new(SystemClock))
    }

    pub fn with_clock(backend: Arc<dyn KvBackend>, config: StoreConfig, clock: Arc<dyn Clock>) -> Self {
        let category_cache = TimedCache::new(1, config.category_cache_ttl);
        let connection_cache = TimedCache::new(1, config.connection_cache_ttl);
        Self {
            backend,
            config,
            clock,
            db: Mutex::new(None),
            category_cache,
            connection_cache,
            setup: Mutex::new(None),
            setup_running: tokio::sync::Mutex::new(()),
        }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// The connected database, connecting on first call.
    pub fn database(&self) -> Arc<Database> {
        let mut slot = self.db.lock();
        match slot.as_ref() {
            Some(db) => Arc::clone(db),
            None => {
                let db = Database::connect(Arc::clone(&self.backend), self.config.clone());
                *slot = Some(Arc::clone(&db));
                db
            }
        }
    }

    /// Close the database and forget cached results, including the setup
    /// report. The next call reconnects.
    pub fn close(&self) {
        if let Some(db) = self.db.lock().take() {
            db.close();
        }
        self.category_cache.clear();
        self.connection_cache.clear();
        self.setup.lock().take();
    }

    pub fn category_cache_stats(&self) -> CacheStats {
        self.category_cache.stats()
    }

    fn repo<T: Entity>(&self) -> Repository<T> {
        Repository::new(self.database().collection(T::COLLECTION), Arc::clone(&self.clock))
    }

    // ════════════════════════════════════════════
    // USERS
    // ════════════════════════════════════════════

    #[instrument(skip(self, user))]
    pub async fn create_user(&self, user: NewUser) -> PortalDbResult<User> {
        self.repo().create(&user.validated()?).await
    }

    /// Exact match on the normalized address.
    pub async fn get_user_by_email(&self, email: &str) -> Option<User> {
        self.repo()
            .find_one(&Filter::eq("email", normalize_email(email)))
            .await
    }

    pub async fn get_user_by_id(&self, id: &str) -> Option<User> {
        self.repo().get_by_id(id).await
    }

    pub async fn update_user(&self, id: &str, patch: UserPatch) -> PortalDbResult<Option<User>> {
        self.repo().update(id, &patch.validated()?).await
    }

    // ════════════════════════════════════════════
    // COMPANIES
    // ════════════════════════════════════════════

    #[instrument(skip(self, company))]
    pub async fn create_company(&self, company: NewCompany) -> PortalDbResult<Company> {
        self.repo().create(&company.validated()?).await
    }

    pub async fn get_companies(&self, filter: &Filter) -> Vec<Company> {
        self.repo().find(filter, None, None).await
    }

    pub async fn get_company_by_id(&self, id: &str) -> Option<Company> {
        self.repo().get_by_id(id).await
    }

    pub async fn update_company(
        &self,
        id: &str,
        patch: CompanyPatch,
    ) -> PortalDbResult<Option<Company>> {
        self.repo().update(id, &patch.validated()?).await
    }

    // ════════════════════════════════════════════
    // JOBS
    // ════════════════════════════════════════════

    #[instrument(skip(self, job))]
    pub async fn create_job(&self, job: NewJob) -> PortalDbResult<Job> {
        self.repo().create(&job.validated()?).await
    }

    /// Jobs in insertion order. `skip` is applied before `limit`.
    pub async fn get_jobs(&self, filter: &Filter, limit: Option<i64>, skip: Option<i64>) -> Vec<Job> {
        self.repo().find(filter, limit, skip).await
    }

    pub async fn count_jobs(&self, filter: &Filter) -> u64 {
        self.repo::<Job>().count(filter).await
    }

    pub async fn get_job_by_id(&self, id: &str) -> Option<Job> {
        self.repo().get_by_id(id).await
    }

    pub async fn update_job(&self, id: &str, patch: JobPatch) -> PortalDbResult<Option<Job>> {
        self.repo().update(id, &patch.validated()?).await
    }

    /// `Ok(false)` if no job had this id.
    #[instrument(skip(self))]
    pub async fn delete_job(&self, id: &str) -> PortalDbResult<bool> {
        self.repo::<Job>().delete(id).await
    }

    // ════════════════════════════════════════════
    // JOB CATEGORIES
    // ════════════════════════════════════════════

    /// Does not invalidate the category cache; listings may stay stale for
    /// up to `category_cache_ttl`.
    #[instrument(skip(self, category))]
    pub async fn create_job_category(&self, category: NewJobCategory) -> PortalDbResult<JobCategory> {
        self.repo().create(&category.validated()?).await
    }

    /// The unfiltered listing is served from a TTL cache; any other filter
    /// reads the collection.
    pub async fn get_job_categories(&self, filter: &Filter) -> Vec<JobCategory> {
        let repo = self.repo::<JobCategory>();
        if !filter.is_empty() {
            return repo.find(filter, None, None).await;
        }
        self.category_cache
            .get_or_compute((), move || async move {
                repo.find(&Filter::all(), None, None).await
            })
            .await
    }

    pub async fn get_job_category_by_id(&self, id: &str) -> Option<JobCategory> {
        self.repo().get_by_id(id).await
    }

    // ════════════════════════════════════════════
    // APPLICATIONS
    // ════════════════════════════════════════════

    #[instrument(skip(self, application))]
    pub async fn create_application(
        &self,
        application: NewApplication,
    ) -> PortalDbResult<Application> {
        self.repo().create(&application.validated()?).await
    }

    pub async fn get_applications(&self, filter: &Filter) -> Vec<Application> {
        self.repo().find(filter, None, None).await
    }

    pub async fn get_application_by_id(&self, id: &str) -> Option<Application> {
        self.repo().get_by_id(id).await
    }

    pub async fn update_application(
        &self,
        id: &str,
        patch: ApplicationPatch,
    ) -> PortalDbResult<Option<Application>> {
        self.repo().update(id, &patch).await
    }

    // ════════════════════════════════════════════
    // LIFECYCLE
    // ════════════════════════════════════════════

    /// Whether the backing store is usable. Cached for `connection_cache_ttl`.
    pub async fn check_connection(&self) -> bool {
        let db = self.database();
        self.connection_cache
            .get_or_compute((), move || async move {
                let ok = db.ping();
                if !ok {
                    warn!("connection check failed");
                }
                ok
            })
            .await
    }

    /// Create the default indexes once. Later calls return the first report.
    pub async fn setup_database(&self) -> SetupReport {
        let _running = self.setup_running.lock().await;
        if let Some(report) = self.setup.lock().clone() {
            return report;
        }
        let report = self.setup_database_with(&default_indexes()).await;
        *self.setup.lock() = Some(report.clone());
        report
    }

    /// Create `indexes` in order, bounded by `setup_timeout`.
    ///
    /// A failing index is logged and recorded; the rest still run. On
    /// timeout the report holds whatever finished and `timed_out` is set.
    #[instrument(skip(self, indexes), fields(count = indexes.len()))]
    pub async fn setup_database_with(&self, indexes: &[IndexDefinition]) -> SetupReport {
        let db = self.database();
        let mut report = SetupReport::default();

        let batch = async {
            for def in indexes {
                let collection = db.collection(&def.collection);
                match collection.create_index(def.spec.clone(), def.options.clone()).await {
                    Ok(name) => report.created.push(format!("{}.{}", def.collection, name)),
                    Err(e) => {
                        warn!(collection = %def.collection, error = %e, "index creation failed");
                        report.failed.push((def.collection.clone(), e.to_string()));
                    }
                }
            }
        };

        if tokio::time::timeout(self.config.setup_timeout, batch).await.is_err() {
            warn!(
                timeout_ms = self.config.setup_timeout.as_millis() as u64,
                "database setup timed out, continuing with warnings"
            );
            report.timed_out = true;
        }

        info!(
            created = report.created.len(),
            failed = report.failed.len(),
            timed_out = report.timed_out,
            "database setup finished"
        );
        report
    }
}
