//! System instruction assembly.

use pm_core::constants::CREATE_ISSUE_TOOL;

/// Build the system instruction from the persona and a rendered snapshot.
///
/// Always rebuilt whole; never patched in place.
pub fn assemble(persona: &str, snapshot: &str) -> String {
    format!(
        "{persona}\n\n\
         Here is the current database information that you can reference:\n\n\
         {snapshot}\n\n\
         When asked about tenants, landlords, properties, issues, or contractors, use this information to respond.\n\
         Only use the {CREATE_ISSUE_TOOL} tool when a user wants to create a new maintenance issue.",
        persona = persona.trim(),
    )
}
