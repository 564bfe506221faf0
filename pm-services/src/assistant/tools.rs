//! The `create_issue` tool: schema, argument re-validation and execution.

use serde::Serialize;
use serde_json::{json, Value};
use tracing::{info, warn};

use pm_core::constants::CREATE_ISSUE_TOOL;
use pm_llm::ToolSpec;
use pm_models::{Issue, NewIssue};

use crate::directory::DirectoryService;

/// Schema advertised to the model.
pub fn create_issue_spec() -> ToolSpec {
    ToolSpec {
        name: CREATE_ISSUE_TOOL.to_string(),
        description: "Creates a new maintenance issue in the database. Requires description, \
                      location, and action. Property ID is optional."
            .to_string(),
        parameters: json!({
            "type": "object",
            "properties": {
                "description": {"type": "string", "description": "What is wrong"},
                "location": {"type": "string", "description": "Where in the property"},
                "action": {"type": "string", "description": "Remediation to take"},
                "property_id": {"type": "integer", "description": "Property the issue belongs to"}
            },
            "required": ["description", "location", "action"]
        }),
    }
}

/// Arguments after re-validation. Model output is advisory.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateIssueArgs {
    pub description: String,
    pub location: String,
    pub action: String,
    pub property_id: Option<i64>,
}

impl CreateIssueArgs {
    /// Missing strings default to `""`; a missing or null `property_id` means
    /// no property. `property_id` may be an integer or a numeric string.
    pub fn from_arguments(arguments: &Value) -> Result<Self, String> {
        Ok(Self {
            description: text_arg(arguments, "description"),
            location: text_arg(arguments, "location"),
            action: text_arg(arguments, "action"),
            property_id: property_arg(arguments.get("property_id"))?,
        })
    }

    fn into_new_issue(self) -> NewIssue {
        NewIssue {
            description: self.description,
            location: self.location,
            action: self.action,
            property_id: self.property_id,
        }
    }
}

fn text_arg(arguments: &Value, key: &str) -> String {
    match arguments.get(key) {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

fn property_arg(value: Option<&Value>) -> Result<Option<i64>, String> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => match (n.as_i64(), n.as_f64()) {
            (Some(id), _) => Ok(Some(id)),
            (None, Some(f)) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => Ok(Some(f as i64)),
            _ => Err(format!("Invalid property ID: {n}")),
        },
        Some(Value::String(s)) => {
            let trimmed = s.trim();
            if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("null") || trimmed.eq_ignore_ascii_case("none") {
                return Ok(None);
            }
            trimmed
                .parse::<i64>()
                .map(Some)
                .map_err(|_| format!("Invalid property ID: {s}"))
        }
        Some(other) => Err(format!("Invalid property ID: {other}")),
    }
}

/// Result of running the tool.
///
/// Serializes like the tool result the model would see: the issue fields plus
/// `"status": "created"`, or `{"error": "..."}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum IssueToolOutcome {
    Created {
        #[serde(flatten)]
        issue: Issue,
        status: &'static str,
    },
    Failed {
        error: String,
    },
}

impl IssueToolOutcome {
    fn created(issue: Issue) -> Self {
        Self::Created { issue, status: "created" }
    }

    pub fn is_created(&self) -> bool {
        matches!(self, Self::Created { .. })
    }

    /// User-facing sentence describing the outcome.
    pub fn confirmation(&self) -> String {
        match self {
            Self::Created { issue, .. } => format!(
                "I've created a new maintenance issue:\n\
                 - Description: {}\n\
                 - Location: {}\n\
                 - Action needed: {}\n\
                 - Issue ID: {}",
                issue.description, issue.location, issue.action, issue.id
            ),
            Self::Failed { error } => format!("I couldn't create the issue: {error}"),
        }
    }
}

/// Validate the arguments and file the issue. Never returns an error: every
/// failure becomes a `Failed` outcome with a readable reason.
pub fn execute_create_issue(directory: &DirectoryService, arguments: &Value) -> IssueToolOutcome {
    let args = match CreateIssueArgs::from_arguments(arguments) {
        Ok(args) => args,
        Err(error) => {
            warn!("rejected {CREATE_ISSUE_TOOL} arguments: {error}");
            return IssueToolOutcome::Failed { error };
        }
    };

    match directory.create_issue(&args.into_new_issue()) {
        Ok(issue) => {
            info!(issue_id = issue.id, "{CREATE_ISSUE_TOOL} succeeded");
            IssueToolOutcome::created(issue)
        }
        Err(e) => {
            warn!("{CREATE_ISSUE_TOOL} failed: {e}");
            IssueToolOutcome::Failed { error: e.to_string() }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_default() {
        let args = CreateIssueArgs::from_arguments(&json!({"description": "Leak"})).unwrap();
        assert_eq!(args.description, "Leak");
        assert_eq!(args.location, "");
        assert_eq!(args.action, "");
        assert_eq!(args.property_id, None);

        let from_null = CreateIssueArgs::from_arguments(&Value::Null).unwrap();
        assert_eq!(from_null.description, "");
    }

    #[test]
    fn test_property_id_forms() {
        let parse = |v: Value| CreateIssueArgs::from_arguments(&json!({"property_id": v}));
        assert_eq!(parse(json!(7)).unwrap().property_id, Some(7));
        assert_eq!(parse(json!("12")).unwrap().property_id, Some(12));
        assert_eq!(parse(json!(3.0)).unwrap().property_id, Some(3));
        assert_eq!(parse(Value::Null).unwrap().property_id, None);
        assert_eq!(parse(json!("")).unwrap().property_id, None);
        assert!(parse(json!("kitchen")).is_err());
        assert!(parse(json!(2.5)).is_err());
        assert!(parse(json!([1])).is_err());
    }

    #[test]
    fn test_confirmation_text() {
        let outcome = IssueToolOutcome::created(Issue {
            id: 42,
            description: "Leaking faucet".into(),
            location: "Kitchen".into(),
            action: "Plumber dispatched".into(),
            resolved: false,
            property_id: None,
        });
        assert_eq!(
            outcome.confirmation(),
            "I've created a new maintenance issue:\n- Description: Leaking faucet\n- Location: Kitchen\n- Action needed: Plumber dispatched\n- Issue ID: 42"
        );

        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["status"], "created");
        assert_eq!(json["resolved"], false);
        assert_eq!(json["id"], 42);

        let failed = IssueToolOutcome::Failed { error: "Property with ID 9999 not found".into() };
        assert_eq!(
            failed.confirmation(),
            "I couldn't create the issue: Property with ID 9999 not found"
        );
        assert_eq!(serde_json::to_value(&failed).unwrap()["error"], "Property with ID 9999 not found");
    }

    #[test]
    fn test_spec_requires_text_fields() {
        let spec = create_issue_spec();
        assert_eq!(spec.name, "create_issue");
        assert_eq!(spec.parameters["required"].as_array().unwrap().len(), 3);
    }
}
