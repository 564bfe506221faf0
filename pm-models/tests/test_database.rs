//! Integration tests for the complete data layer.
//!
//! Tests database creation, schema, CRUD operations for all models,
//! filters, pagination, partial updates and referential constraints.

mod common;

use pm_core::constants::DB_SCHEMA_VERSION;
use pm_models::migrations;
use pm_models::queries::{self, Page};
use pm_models::seed;
use pm_models::{
    Contractor, ContractorFilter, ContractorUpdate, Issue, IssueFilter, IssueUpdate, NewContractor,
    NewIssue, NewTenant, Property, PropertyFilter, Tenant, TenantFilter, TenantUpdate,
};

fn new_tenant(email: &str, landlord_id: i64, property_id: Option<i64>) -> NewTenant {
    NewTenant {
        name: "Tina Tenant".into(),
        phone_number: "555-1111".into(),
        email: email.into(),
        landlord_id,
        property_id,
    }
}

// ---- Database initialization ----

#[test]
fn database_init_creates_file_and_wal_mode() {
    let (db, dir) = common::create_test_db();
    assert!(dir.path().join("test.db").exists(), "database file should exist after init");

    let conn = db.conn().unwrap();
    let journal_mode: String = conn
        .query_row("PRAGMA journal_mode", [], |row| row.get(0))
        .unwrap();
    assert_eq!(journal_mode.to_lowercase(), "wal", "database should be in WAL mode");
}

#[test]
fn database_init_sets_schema_version() {
    let (db, _dir) = common::create_test_db();
    let conn = db.conn().unwrap();
    assert_eq!(migrations::get_schema_version(&conn).unwrap(), DB_SCHEMA_VERSION);
}

#[test]
fn database_init_creates_unique_tenant_index() {
    let (db, _dir) = common::create_test_db();
    let conn = db.conn().unwrap();
    let count: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type='index' AND name='idx_tenants_property_unique'",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(count, 1);
}

// ---- Tenants ----

#[test]
fn tenant_partial_update_only_touches_supplied_fields() {
    let (db, _dir) = common::create_test_db();
    let (landlord, property) = common::seed_landlord_with_property(&db);
    let conn = db.conn().unwrap();

    let tenant = Tenant::insert(&conn, &new_tenant("tina@test.com", landlord.id, Some(property.id))).unwrap();
    let changes = TenantUpdate {
        phone_number: Some("555-9999".into()),
        ..Default::default()
    };
    let updated = Tenant::update(&conn, tenant.id, &changes).unwrap().unwrap();

    assert_eq!(updated.phone_number, "555-9999");
    assert_eq!(updated.name, tenant.name);
    assert_eq!(updated.email, tenant.email);
    assert_eq!(updated.landlord_id, tenant.landlord_id);
    assert_eq!(updated.property_id, Some(property.id));
}

#[test]
fn tenant_property_can_be_cleared_with_null() {
    let (db, _dir) = common::create_test_db();
    let (landlord, property) = common::seed_landlord_with_property(&db);
    let conn = db.conn().unwrap();

    let tenant = Tenant::insert(&conn, &new_tenant("tina@test.com", landlord.id, Some(property.id))).unwrap();
    let changes: TenantUpdate = serde_json::from_str(r#"{"property_id": null}"#).unwrap();
    let updated = Tenant::update(&conn, tenant.id, &changes).unwrap().unwrap();
    assert_eq!(updated.property_id, None);
    assert!(Tenant::find_by_property(&conn, property.id).unwrap().is_none());
}

#[test]
fn second_tenant_on_property_is_rejected() {
    let (db, _dir) = common::create_test_db();
    let (landlord, property) = common::seed_landlord_with_property(&db);
    let conn = db.conn().unwrap();

    Tenant::insert(&conn, &new_tenant("first@test.com", landlord.id, Some(property.id))).unwrap();
    let err = Tenant::insert(&conn, &new_tenant("second@test.com", landlord.id, Some(property.id)))
        .unwrap_err();
    assert!(err.is_constraint());
}

#[test]
fn tenant_requires_existing_landlord() {
    let (db, _dir) = common::create_test_db();
    let conn = db.conn().unwrap();
    let err = Tenant::insert(&conn, &new_tenant("ghost@test.com", 999, None)).unwrap_err();
    assert!(err.is_constraint());
}

#[test]
fn tenant_filters_by_landlord() {
    let (db, _dir) = common::create_test_db();
    let (landlord, _) = common::seed_landlord_with_property(&db);
    let conn = db.conn().unwrap();
    for i in 0..3 {
        Tenant::insert(&conn, &new_tenant(&format!("t{i}@test.com"), landlord.id, None)).unwrap();
    }

    let filter = TenantFilter { landlord_id: Some(landlord.id), property_id: None };
    assert_eq!(Tenant::list(&conn, &filter, Page::default()).unwrap().len(), 3);

    let other = TenantFilter { landlord_id: Some(landlord.id + 1), property_id: None };
    assert!(Tenant::list(&conn, &other, Page::default()).unwrap().is_empty());
}

// ---- Pagination ----

#[test]
fn list_respects_skip_and_limit() {
    let (db, _dir) = common::create_test_db();
    let (landlord, _) = common::seed_landlord_with_property(&db);
    let conn = db.conn().unwrap();
    for i in 0..5 {
        Tenant::insert(&conn, &new_tenant(&format!("p{i}@test.com"), landlord.id, None)).unwrap();
    }

    let page = Tenant::list(&conn, &TenantFilter::default(), Page::new(1, 2)).unwrap();
    assert_eq!(page.len(), 2);
    assert_eq!(page[0].email, "p1@test.com");
    assert_eq!(page[1].email, "p2@test.com");

    let rest = Tenant::list(&conn, &TenantFilter::default(), Page::new(4, 100)).unwrap();
    assert_eq!(rest.len(), 1);
}

// ---- Contractors ----

#[test]
fn contractor_work_round_trips_and_filters() {
    let (db, _dir) = common::create_test_db();
    let (landlord, _) = common::seed_landlord_with_property(&db);
    let conn = db.conn().unwrap();

    let created = Contractor::insert(&conn, &NewContractor {
        name: "Pipes Ltd".into(),
        phone_number: "555-2222".into(),
        email: "pipes@test.com".into(),
        work: vec!["plumbing ".into(), "heating".into(), "plumbing".into()],
        landlord_id: landlord.id,
    })
    .unwrap();
    assert_eq!(created.work, vec!["plumbing", "heating"]);

    let stored = Contractor::find_by_id(&conn, created.id).unwrap().unwrap();
    assert_eq!(stored.work, created.work);

    let heating = ContractorFilter { landlord_id: None, work: Some("heating".into()) };
    assert_eq!(Contractor::list(&conn, &heating, Page::default()).unwrap().len(), 1);

    let roofing = ContractorFilter { landlord_id: None, work: Some("roofing".into()) };
    assert!(Contractor::list(&conn, &roofing, Page::default()).unwrap().is_empty());

    let changes = ContractorUpdate {
        work: Some(vec!["roofing".into()]),
        ..Default::default()
    };
    let updated = Contractor::update(&conn, created.id, &changes).unwrap().unwrap();
    assert_eq!(updated.work, vec!["roofing"]);
    assert_eq!(updated.name, "Pipes Ltd");
}

// ---- Issues ----

#[test]
fn issue_starts_unresolved_and_resolves_by_update() {
    let (db, _dir) = common::create_test_db();
    let conn = db.conn().unwrap();

    let issue = Issue::insert(&conn, &NewIssue {
        description: "Leaking faucet".into(),
        location: "Kitchen".into(),
        action: "Plumber dispatched".into(),
        property_id: None,
    })
    .unwrap();
    assert!(!issue.resolved);
    assert!(issue.id > 0);

    let open = IssueFilter { property_id: None, resolved: Some(false) };
    assert_eq!(Issue::list(&conn, &open, Page::default()).unwrap().len(), 1);

    let changes = IssueUpdate { resolved: Some(true), ..Default::default() };
    let resolved = Issue::update(&conn, issue.id, &changes).unwrap().unwrap();
    assert!(resolved.resolved);
    assert!(Issue::list(&conn, &open, Page::default()).unwrap().is_empty());
}

#[test]
fn issue_with_unknown_property_is_rejected() {
    let (db, _dir) = common::create_test_db();
    let conn = db.conn().unwrap();
    let err = Issue::insert(&conn, &NewIssue {
        description: "Broken window".into(),
        location: "Bedroom".into(),
        action: "Glazier".into(),
        property_id: Some(9999),
    })
    .unwrap_err();
    assert!(err.is_constraint());
    assert_eq!(Issue::count(&conn).unwrap(), 0);
}

// ---- Properties ----

#[test]
fn property_with_tenant_cannot_be_deleted() {
    let (db, _dir) = common::create_test_db();
    let (landlord, property) = common::seed_landlord_with_property(&db);
    let conn = db.conn().unwrap();
    Tenant::insert(&conn, &new_tenant("stay@test.com", landlord.id, Some(property.id))).unwrap();

    assert!(Property::delete(&conn, property.id).unwrap_err().is_constraint());
    let by_landlord = PropertyFilter { landlord_id: Some(landlord.id) };
    assert_eq!(Property::list(&conn, &by_landlord, Page::default()).unwrap().len(), 1);
}

// ---- Dataset and seed ----

#[test]
fn seed_then_load_dataset() {
    let (db, _dir) = common::create_test_db();
    let summary = db.transaction(seed::seed_demo_data).unwrap();
    let dataset = db.transaction(queries::load_dataset).unwrap();

    assert_eq!(dataset.landlords.len(), summary.landlords);
    assert_eq!(dataset.tenants.len(), summary.tenants);
    assert_eq!(dataset.properties.len(), summary.properties);
    assert_eq!(dataset.contractors.len(), summary.contractors);
    assert_eq!(dataset.issues.len(), summary.issues);

    let ids: Vec<i64> = dataset.tenants.iter().map(|t| t.id).collect();
    let mut sorted = ids.clone();
    sorted.sort();
    assert_eq!(ids, sorted, "dataset rows are ordered by id");

    let stats = db.stats().unwrap();
    assert_eq!(stats.open_issues, summary.issues as i64);
}

#[test]
fn seeding_twice_leaves_no_partial_rows() {
    let (db, _dir) = common::create_test_db();
    db.transaction(seed::seed_demo_data).unwrap();
    let before = db.stats().unwrap();

    assert!(db.transaction(seed::seed_demo_data).unwrap_err().is_constraint());
    let after = db.stats().unwrap();
    assert_eq!(before.landlords, after.landlords);
    assert_eq!(before.issues, after.issues);
}
