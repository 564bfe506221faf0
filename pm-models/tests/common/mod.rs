//! Shared test utilities for integration tests.

use pm_core::config::DatabaseConfig;
use pm_models::models::landlord::{Landlord, NewLandlord};
use pm_models::models::property::{NewProperty, Property};
use pm_models::Database;
use tempfile::TempDir;

/// Create a temporary database with full schema and migrations applied.
/// Returns the Database and the TempDir (must be held alive for the duration of the test).
pub fn create_test_db() -> (Database, TempDir) {
    let dir = TempDir::new().expect("failed to create temp dir");
    let path = dir.path().join("test.db");
    let config = DatabaseConfig::default();
    let db = Database::init(&path, &config).expect("failed to init test database");
    (db, dir)
}

/// Insert one landlord with one property. Returns (landlord, property).
pub fn seed_landlord_with_property(db: &Database) -> (Landlord, Property) {
    let conn = db.conn().expect("failed to get connection for seeding");
    let landlord = Landlord::insert(&conn, &NewLandlord {
        name: "Test Landlord".into(),
        phone_number: "555-0000".into(),
        email: "landlord@test.com".into(),
    })
    .expect("failed to insert landlord");
    let property = Property::insert(&conn, &NewProperty {
        address: "1 Test Road".into(),
        landlord_id: landlord.id,
    })
    .expect("failed to insert property");
    (landlord, property)
}
