//! Directory service: the data access facade for landlords, tenants,
//! properties, contractors and issues.
//!
//! Every call checks a connection out of the pool and returns it on every
//! exit path. Writes commit immediately. Each committed write bumps the store
//! generation so conversations can tell their snapshot has gone stale.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use rusqlite::Connection;
use tracing::{debug, info};

use pm_core::constants::entities;
use pm_core::error::{PmError, PmResult};
use pm_models::queries::{self, Dataset, Page};
use pm_models::seed::{self, SeedSummary};
use pm_models::{
    Contractor, ContractorFilter, ContractorUpdate, Database, DatabaseStats, Issue, IssueFilter,
    IssueUpdate, Landlord, LandlordUpdate, NewContractor, NewIssue, NewLandlord, NewProperty,
    NewTenant, Property, PropertyFilter, PropertyUpdate, Tenant, TenantFilter, TenantUpdate,
};

use crate::service::{Service, ServiceState};

/// Scoped CRUD over the five entities.
///
/// Cheap to clone; clones share the pool and the generation counter.
#[derive(Clone)]
pub struct DirectoryService {
    state: ServiceState,
    database: Database,
    generation: Arc<AtomicU64>,
}

impl DirectoryService {
    /// Create a new DirectoryService.
    pub fn new(database: Database) -> Self {
        Self {
            state: ServiceState::Created,
            database,
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Access the underlying database.
    pub fn database(&self) -> &Database {
        &self.database
    }

    /// Number of committed writes since this service was created.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    fn bump(&self) {
        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        debug!("store generation now {generation}");
    }

    /// Bump the generation when `changed` says a row was written.
    fn committed<T>(&self, result: T, changed: bool) -> T {
        if changed {
            self.bump();
        }
        result
    }

    // ─── Landlords ───────────────────────────────────────────────────────

    pub fn create_landlord(&self, new: &NewLandlord) -> PmResult<Landlord> {
        let conn = self.database.conn()?;
        let landlord = Landlord::insert(&conn, new)?;
        info!(id = landlord.id, "landlord created");
        Ok(self.committed(landlord, true))
    }

    pub fn get_landlord(&self, id: i64) -> PmResult<Option<Landlord>> {
        let conn = self.database.conn()?;
        Landlord::find_by_id(&conn, id)
    }

    pub fn list_landlords(&self, page: Page) -> PmResult<Vec<Landlord>> {
        let conn = self.database.conn()?;
        Landlord::list(&conn, page)
    }

    pub fn update_landlord(&self, id: i64, changes: &LandlordUpdate) -> PmResult<Option<Landlord>> {
        let conn = self.database.conn()?;
        let updated = Landlord::update(&conn, id, changes)?;
        let changed = updated.is_some();
        Ok(self.committed(updated, changed))
    }

    pub fn delete_landlord(&self, id: i64) -> PmResult<bool> {
        let conn = self.database.conn()?;
        let deleted = Landlord::delete(&conn, id)?;
        Ok(self.committed(deleted, deleted))
    }

    /// Properties owned by a landlord.
    pub fn landlord_properties(&self, landlord_id: i64) -> PmResult<Vec<Property>> {
        let conn = self.database.conn()?;
        self.require_landlord(&conn, landlord_id)?;
        let filter = PropertyFilter { landlord_id: Some(landlord_id) };
        Property::list(&conn, &filter, Page::all())
    }

    /// Tenants renting from a landlord.
    pub fn landlord_tenants(&self, landlord_id: i64) -> PmResult<Vec<Tenant>> {
        let conn = self.database.conn()?;
        self.require_landlord(&conn, landlord_id)?;
        let filter = TenantFilter { landlord_id: Some(landlord_id), property_id: None };
        Tenant::list(&conn, &filter, Page::all())
    }

    /// Contractors working for a landlord.
    pub fn landlord_contractors(&self, landlord_id: i64) -> PmResult<Vec<Contractor>> {
        let conn = self.database.conn()?;
        self.require_landlord(&conn, landlord_id)?;
        let filter = ContractorFilter { landlord_id: Some(landlord_id), work: None };
        Contractor::list(&conn, &filter, Page::all())
    }

    fn require_landlord(&self, conn: &Connection, id: i64) -> PmResult<()> {
        match Landlord::find_by_id(conn, id)? {
            Some(_) => Ok(()),
            None => Err(PmError::NotFound { entity: entities::LANDLORD, id }),
        }
    }

    // ─── Tenants ─────────────────────────────────────────────────────────

    pub fn create_tenant(&self, new: &NewTenant) -> PmResult<Tenant> {
        let conn = self.database.conn()?;
        let tenant = Tenant::insert(&conn, new)?;
        info!(id = tenant.id, "tenant created");
        Ok(self.committed(tenant, true))
    }

    pub fn get_tenant(&self, id: i64) -> PmResult<Option<Tenant>> {
        let conn = self.database.conn()?;
        Tenant::find_by_id(&conn, id)
    }

    pub fn list_tenants(&self, filter: &TenantFilter, page: Page) -> PmResult<Vec<Tenant>> {
        let conn = self.database.conn()?;
        Tenant::list(&conn, filter, page)
    }

    pub fn update_tenant(&self, id: i64, changes: &TenantUpdate) -> PmResult<Option<Tenant>> {
        let conn = self.database.conn()?;
        let updated = Tenant::update(&conn, id, changes)?;
        let changed = updated.is_some();
        Ok(self.committed(updated, changed))
    }

    pub fn delete_tenant(&self, id: i64) -> PmResult<bool> {
        let conn = self.database.conn()?;
        let deleted = Tenant::delete(&conn, id)?;
        Ok(self.committed(deleted, deleted))
    }

    // ─── Properties ──────────────────────────────────────────────────────

    pub fn create_property(&self, new: &NewProperty) -> PmResult<Property> {
        let conn = self.database.conn()?;
        let property = Property::insert(&conn, new)?;
        info!(id = property.id, "property created");
        Ok(self.committed(property, true))
    }

    pub fn get_property(&self, id: i64) -> PmResult<Option<Property>> {
        let conn = self.database.conn()?;
        Property::find_by_id(&conn, id)
    }

    pub fn list_properties(&self, filter: &PropertyFilter, page: Page) -> PmResult<Vec<Property>> {
        let conn = self.database.conn()?;
        Property::list(&conn, filter, page)
    }

    pub fn update_property(&self, id: i64, changes: &PropertyUpdate) -> PmResult<Option<Property>> {
        let conn = self.database.conn()?;
        let updated = Property::update(&conn, id, changes)?;
        let changed = updated.is_some();
        Ok(self.committed(updated, changed))
    }

    pub fn delete_property(&self, id: i64) -> PmResult<bool> {
        let conn = self.database.conn()?;
        let deleted = Property::delete(&conn, id)?;
        Ok(self.committed(deleted, deleted))
    }

    /// The tenant living in a property. Errors when the property is missing.
    pub fn property_tenant(&self, property_id: i64) -> PmResult<Option<Tenant>> {
        let conn = self.database.conn()?;
        if !Property::exists(&conn, property_id)? {
            return Err(PmError::NotFound { entity: entities::PROPERTY, id: property_id });
        }
        Tenant::find_by_property(&conn, property_id)
    }

    /// Issues filed against a property.
    pub fn property_issues(&self, property_id: i64) -> PmResult<Vec<Issue>> {
        let conn = self.database.conn()?;
        if !Property::exists(&conn, property_id)? {
            return Err(PmError::NotFound { entity: entities::PROPERTY, id: property_id });
        }
        let filter = IssueFilter { property_id: Some(property_id), resolved: None };
        Issue::list(&conn, &filter, Page::all())
    }

    // ─── Contractors ─────────────────────────────────────────────────────

    pub fn create_contractor(&self, new: &NewContractor) -> PmResult<Contractor> {
        let conn = self.database.conn()?;
        let contractor = Contractor::insert(&conn, new)?;
        info!(id = contractor.id, "contractor created");
        Ok(self.committed(contractor, true))
    }

    pub fn get_contractor(&self, id: i64) -> PmResult<Option<Contractor>> {
        let conn = self.database.conn()?;
        Contractor::find_by_id(&conn, id)
    }

    pub fn list_contractors(&self, filter: &ContractorFilter, page: Page) -> PmResult<Vec<Contractor>> {
        let conn = self.database.conn()?;
        Contractor::list(&conn, filter, page)
    }

    pub fn update_contractor(&self, id: i64, changes: &ContractorUpdate) -> PmResult<Option<Contractor>> {
        let conn = self.database.conn()?;
        let updated = Contractor::update(&conn, id, changes)?;
        let changed = updated.is_some();
        Ok(self.committed(updated, changed))
    }

    pub fn delete_contractor(&self, id: i64) -> PmResult<bool> {
        let conn = self.database.conn()?;
        let deleted = Contractor::delete(&conn, id)?;
        Ok(self.committed(deleted, deleted))
    }

    // ─── Issues ──────────────────────────────────────────────────────────

    /// File a new issue. A supplied property must exist; the issue starts
    /// unresolved regardless of input.
    pub fn create_issue(&self, new: &NewIssue) -> PmResult<Issue> {
        let conn = self.database.conn()?;
        if let Some(property_id) = new.property_id {
            if !Property::exists(&conn, property_id)? {
                return Err(PmError::NotFound { entity: entities::PROPERTY, id: property_id });
            }
        }
        let issue = Issue::insert(&conn, new)?;
        info!(id = issue.id, property_id = ?issue.property_id, "issue created");
        Ok(self.committed(issue, true))
    }

    pub fn get_issue(&self, id: i64) -> PmResult<Option<Issue>> {
        let conn = self.database.conn()?;
        Issue::find_by_id(&conn, id)
    }

    pub fn list_issues(&self, filter: &IssueFilter, page: Page) -> PmResult<Vec<Issue>> {
        let conn = self.database.conn()?;
        Issue::list(&conn, filter, page)
    }

    pub fn update_issue(&self, id: i64, changes: &IssueUpdate) -> PmResult<Option<Issue>> {
        let conn = self.database.conn()?;
        let updated = Issue::update(&conn, id, changes)?;
        let changed = updated.is_some();
        Ok(self.committed(updated, changed))
    }

    /// Mark an issue resolved. Returns `None` when the issue does not exist.
    pub fn resolve_issue(&self, id: i64) -> PmResult<Option<Issue>> {
        let changes = IssueUpdate { resolved: Some(true), ..Default::default() };
        self.update_issue(id, &changes)
    }

    pub fn delete_issue(&self, id: i64) -> PmResult<bool> {
        let conn = self.database.conn()?;
        let deleted = Issue::delete(&conn, id)?;
        Ok(self.committed(deleted, deleted))
    }

    // ─── Whole-store operations ──────────────────────────────────────────

    /// Every row of every entity, read in one transaction.
    pub fn dataset(&self) -> PmResult<Dataset> {
        self.database.transaction(queries::load_dataset)
    }

    /// Row counts per table.
    pub fn stats(&self) -> PmResult<DatabaseStats> {
        self.database.stats()
    }

    /// Insert the demo dataset atomically.
    pub fn seed_demo(&self) -> PmResult<SeedSummary> {
        let summary = self.database.transaction(seed::seed_demo_data)?;
        Ok(self.committed(summary, true))
    }

    /// Drop and recreate every table.
    pub fn reset(&self) -> PmResult<()> {
        self.database.reset()?;
        self.bump();
        Ok(())
    }
}

impl Service for DirectoryService {
    fn name(&self) -> &str {
        "directory"
    }

    fn state(&self) -> ServiceState {
        self.state
    }

    fn init(&mut self) -> PmResult<()> {
        self.database.conn()?;
        self.state = ServiceState::Running;
        info!("directory service initialized");
        Ok(())
    }

    fn shutdown(&mut self) -> PmResult<()> {
        self.state = ServiceState::Stopped;
        info!("directory service shut down");
        Ok(())
    }
}
