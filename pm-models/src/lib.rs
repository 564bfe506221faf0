//! Property Manager Models - Database schema, models, migrations, and query helpers.
//!
//! This crate owns all data persistence: SQLite database initialization,
//! the five entity models (landlords, tenants, properties, contractors,
//! issues), versioned migrations, and the shared query helpers.

pub mod db;
pub mod schema;
pub mod models;
pub mod queries;
pub mod migrations;
pub mod seed;

// Re-export key types
pub use db::{db_error, Database, DatabaseStats, DbPool};
pub use models::contractor::{Contractor, ContractorFilter, ContractorUpdate, NewContractor};
pub use models::issue::{Issue, IssueFilter, IssueUpdate, NewIssue};
pub use models::landlord::{Landlord, LandlordUpdate, NewLandlord};
pub use models::property::{NewProperty, Property, PropertyFilter, PropertyUpdate};
pub use models::tenant::{NewTenant, Tenant, TenantFilter, TenantUpdate};
pub use queries::{Dataset, Page};
