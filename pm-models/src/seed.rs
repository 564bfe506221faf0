//! Demo dataset for local development and the `db seed` command.

use rusqlite::Connection;
use tracing::info;
use pm_core::error::PmResult;

use crate::models::contractor::{Contractor, NewContractor};
use crate::models::issue::{Issue, NewIssue};
use crate::models::landlord::{Landlord, NewLandlord};
use crate::models::property::{NewProperty, Property};
use crate::models::tenant::{NewTenant, Tenant};

/// Row counts inserted by [`seed_demo_data`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub landlords: usize,
    pub properties: usize,
    pub tenants: usize,
    pub contractors: usize,
    pub issues: usize,
}

/// Insert two landlords with their properties, tenants, contractors and a
/// couple of open issues. Run inside a transaction so a unique-email clash
/// leaves nothing behind.
pub fn seed_demo_data(conn: &Connection) -> PmResult<SeedSummary> {
    let mut summary = SeedSummary::default();

    let alice = Landlord::insert(conn, &NewLandlord {
        name: "Alice Morgan".into(),
        phone_number: "555-0101".into(),
        email: "alice.morgan@example.com".into(),
    })?;
    let ben = Landlord::insert(conn, &NewLandlord {
        name: "Ben Ortiz".into(),
        phone_number: "555-0102".into(),
        email: "ben.ortiz@example.com".into(),
    })?;
    summary.landlords = 2;

    let elm = Property::insert(conn, &NewProperty {
        address: "12 Elm Street, Apt 3".into(),
        landlord_id: alice.id,
    })?;
    let oak = Property::insert(conn, &NewProperty {
        address: "48 Oak Avenue".into(),
        landlord_id: alice.id,
    })?;
    let pine = Property::insert(conn, &NewProperty {
        address: "7 Pine Court".into(),
        landlord_id: ben.id,
    })?;
    summary.properties = 3;

    for (name, phone, email, landlord_id, property_id) in [
        ("Carla Reyes", "555-0201", "carla.reyes@example.com", alice.id, Some(elm.id)),
        ("Dev Patel", "555-0202", "dev.patel@example.com", alice.id, Some(oak.id)),
        ("Emma Walsh", "555-0203", "emma.walsh@example.com", ben.id, None),
    ] {
        Tenant::insert(conn, &NewTenant {
            name: name.into(),
            phone_number: phone.into(),
            email: email.into(),
            landlord_id,
            property_id,
        })?;
        summary.tenants += 1;
    }

    for (name, phone, email, work, landlord_id) in [
        ("Fix-It Plumbing", "555-0301", "jobs@fixitplumbing.example.com", vec!["plumbing"], alice.id),
        ("Bright Spark Electric", "555-0302", "hello@brightspark.example.com", vec!["electrical", "lighting"], alice.id),
        ("Allround Handyman", "555-0303", "sam@allround.example.com", vec!["carpentry", "painting", "plumbing"], ben.id),
    ] {
        Contractor::insert(conn, &NewContractor {
            name: name.into(),
            phone_number: phone.into(),
            email: email.into(),
            work: work.into_iter().map(String::from).collect(),
            landlord_id,
        })?;
        summary.contractors += 1;
    }

    for (description, location, action, property_id) in [
        ("Dripping tap", "Bathroom", "Plumber scheduled", Some(elm.id)),
        ("Broken porch light", "Front entrance", "Electrician to replace fitting", Some(pine.id)),
    ] {
        Issue::insert(conn, &NewIssue {
            description: description.into(),
            location: location.into(),
            action: action.into(),
            property_id,
        })?;
        summary.issues += 1;
    }

    info!(?summary, "seeded demo data");
    Ok(summary)
}
