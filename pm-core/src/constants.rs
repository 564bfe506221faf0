//! Application-wide constants.

/// Application name.
pub const APP_NAME: &str = "PropertyManager";

/// Application version.
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Database schema version.
pub const DB_SCHEMA_VERSION: i32 = 2;

/// Default database file name inside the data directory.
pub const DEFAULT_DB_FILE: &str = "property_management.db";

/// Default page size for list endpoints.
pub const DEFAULT_LIST_LIMIT: i64 = 100;

/// Default Ollama server address.
pub const DEFAULT_LLM_BASE_URL: &str = "http://localhost:11434";

/// Default chat model.
pub const DEFAULT_LLM_MODEL: &str = "llama3.1";

/// Name of the single mutation exposed to the model.
pub const CREATE_ISSUE_TOOL: &str = "create_issue";

/// Persona used when the configuration does not override it.
pub const DEFAULT_PERSONA: &str = "\
You are an assistant that helps tenants with rental property issues.
You are friendly, helpful, and knowledgeable about property management.
Provide assistance without revealing any internal database details unless specifically requested.
Focus on understanding and responding to tenant inquiries while maintaining confidentiality.";

/// Entity names used in error messages and snapshot headers.
pub mod entities {
    pub const LANDLORD: &str = "Landlord";
    pub const TENANT: &str = "Tenant";
    pub const PROPERTY: &str = "Property";
    pub const CONTRACTOR: &str = "Contractor";
    pub const ISSUE: &str = "Issue";

    /// All entity names.
    pub const ALL: &[&str] = &[LANDLORD, TENANT, PROPERTY, CONTRACTOR, ISSUE];
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_constants() {
        assert_eq!(entities::ALL.len(), 5);
        assert!(entities::ALL.contains(&"Issue"));
    }

    #[test]
    fn test_default_persona_mentions_tenants() {
        assert!(DEFAULT_PERSONA.contains("tenants"));
    }
}
