//! Plain-text rendering of the whole dataset for the system prompt.

use std::fmt::Display;

use pm_models::queries::Dataset;

/// Render every entity as one deterministic text block, rows ordered by id.
///
/// Absent optional references print as `None`.
pub fn render(dataset: &Dataset) -> String {
    let tenants = lines(&dataset.tenants, |t| {
        format!(
            "- Tenant {}: {}, Email: {}, Phone: {}, Property ID: {}, Landlord ID: {}",
            t.id,
            t.name,
            t.email,
            t.phone_number,
            or_none(t.property_id),
            t.landlord_id
        )
    });
    let landlords = lines(&dataset.landlords, |l| {
        format!("- Landlord {}: {}, Email: {}, Phone: {}", l.id, l.name, l.email, l.phone_number)
    });
    let properties = lines(&dataset.properties, |p| {
        format!("- Property {}: {}, Landlord ID: {}", p.id, p.address, p.landlord_id)
    });
    let issues = lines(&dataset.issues, |i| {
        format!(
            "- Issue {}: {} at {}, Action: {}, Resolved: {}, Property ID: {}",
            i.id,
            i.description,
            i.location,
            i.action,
            i.resolved,
            or_none(i.property_id)
        )
    });
    let contractors = lines(&dataset.contractors, |c| {
        format!(
            "- Contractor {}: {}, Work: {}, Email: {}, Phone: {}, Landlord ID: {}",
            c.id,
            c.name,
            c.work.join(", "),
            c.email,
            c.phone_number,
            c.landlord_id
        )
    });

    format!(
        "DATABASE CONTENTS:\n\n\
         TENANTS:\n{tenants}\n\n\
         LANDLORDS:\n{landlords}\n\n\
         PROPERTIES:\n{properties}\n\n\
         ISSUES:\n{issues}\n\n\
         CONTRACTORS:\n{contractors}"
    )
}

fn lines<T>(rows: &[T], line: impl Fn(&T) -> String) -> String {
    rows.iter().map(line).collect::<Vec<_>>().join("\n")
}

fn or_none<T: Display>(value: Option<T>) -> String {
    value.map_or_else(|| "None".to_string(), |v| v.to_string())
}
