//! Function definition: how the approval step describes itself to a host.
//!
//! The definition names the step, declares its input and output parameters,
//! and lists which of them are required. Hosts use the schemas to enforce
//! inputs before invoking the step and to check outputs on completion; the
//! step itself never validates.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Callback id under which the approval step is registered.
pub const APPROVAL_CALLBACK_ID: &str = "approval";

/// Wire type of a parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParameterType {
    /// A user reference.
    UserId,
    /// A channel reference.
    ChannelId,
    /// Free text.
    String,
    /// `true` / `false`.
    Boolean,
    /// A calendar date, `YYYY-MM-DD`.
    Date,
}

impl fmt::Display for ParameterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UserId => write!(f, "user_id"),
            Self::ChannelId => write!(f, "channel_id"),
            Self::String => write!(f, "string"),
            Self::Boolean => write!(f, "boolean"),
            Self::Date => write!(f, "date"),
        }
    }
}

/// One declared parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    /// Parameter name as it appears in the inputs/outputs object.
    pub name: String,
    /// Wire type.
    #[serde(rename = "type")]
    pub kind: ParameterType,
    /// Human-readable label.
    pub description: String,
}

impl Parameter {
    fn new(name: &str, kind: ParameterType, description: &str) -> Self {
        Self {
            name: name.to_string(),
            kind,
            description: description.to_string(),
        }
    }
}

/// A schema violation found while checking inputs or outputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaViolation {
    /// Offending parameter (or `$` for the object itself).
    pub field: String,
    /// What is wrong.
    pub message: String,
}

impl SchemaViolation {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for SchemaViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Declared parameters plus the names of the required ones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterSchema {
    /// All declared parameters, in declaration order.
    pub properties: Vec<Parameter>,
    /// Names of required parameters.
    pub required: Vec<String>,
}

impl ParameterSchema {
    /// Look up a parameter by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Parameter> {
        self.properties.iter().find(|p| p.name == name)
    }

    /// Whether a parameter is required.
    #[must_use]
    pub fn is_required(&self, name: &str) -> bool {
        self.required.iter().any(|r| r == name)
    }

    /// Check a JSON object against this schema.
    ///
    /// Required parameters must be present and non-null; every declared
    /// parameter that is present must match its type. Undeclared keys are
    /// ignored.
    ///
    /// # Errors
    ///
    /// Returns the first [`SchemaViolation`] found, in declaration order.
    pub fn validate(&self, value: &Value) -> Result<(), SchemaViolation> {
        let Some(object) = value.as_object() else {
            return Err(SchemaViolation::new("$", "expected an object"));
        };

        for param in &self.properties {
            match object.get(&param.name) {
                None | Some(Value::Null) => {
                    if self.is_required(&param.name) {
                        return Err(SchemaViolation::new(
                            &param.name,
                            "missing required parameter",
                        ));
                    }
                },
                Some(v) => check_type(param, v)?,
            }
        }
        Ok(())
    }
}

fn check_type(param: &Parameter, value: &Value) -> Result<(), SchemaViolation> {
    let mismatch = || SchemaViolation::new(&param.name, format!("expected {}", param.kind));
    match param.kind {
        ParameterType::UserId | ParameterType::ChannelId => match value.as_str() {
            Some(s) if !s.trim().is_empty() => Ok(()),
            Some(_) => Err(SchemaViolation::new(&param.name, "must not be empty")),
            None => Err(mismatch()),
        },
        ParameterType::String => value.as_str().map(|_| ()).ok_or_else(mismatch),
        ParameterType::Boolean => value.as_bool().map(|_| ()).ok_or_else(mismatch),
        ParameterType::Date => {
            let raw = value.as_str().ok_or_else(mismatch)?;
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .map(|_| ())
                .map_err(|e| SchemaViolation::new(&param.name, format!("invalid date: {e}")))
        },
    }
}

/// Everything a host needs to know to register and invoke a step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionDefinition {
    /// Registration id.
    pub callback_id: String,
    /// Display title.
    pub title: String,
    /// Display description.
    pub description: String,
    /// Invocation inputs.
    pub input_parameters: ParameterSchema,
    /// Completion outputs.
    pub output_parameters: ParameterSchema,
}

impl FunctionDefinition {
    /// The approval step's definition.
    #[must_use]
    pub fn approval() -> Self {
        Self {
            callback_id: APPROVAL_CALLBACK_ID.to_string(),
            title: "Approval".to_string(),
            description: "Get approval for a request".to_string(),
            input_parameters: ParameterSchema {
                properties: vec![
                    Parameter::new("requester_id", ParameterType::UserId, "Requester"),
                    Parameter::new(
                        "approval_channel_id",
                        ParameterType::ChannelId,
                        "Approval channel",
                    ),
                    Parameter::new("subject", ParameterType::String, "Subject"),
                    Parameter::new("details", ParameterType::String, "Details"),
                    Parameter::new("target_date", ParameterType::Date, "Target date"),
                ],
                required: vec![
                    "requester_id".to_string(),
                    "approval_channel_id".to_string(),
                    "subject".to_string(),
                    "details".to_string(),
                ],
            },
            output_parameters: ParameterSchema {
                properties: vec![
                    Parameter::new("approved", ParameterType::Boolean, "Approved"),
                    Parameter::new("comments", ParameterType::String, "Comments"),
                    Parameter::new("reviewer", ParameterType::UserId, "Reviewer"),
                ],
                required: vec!["approved".to_string(), "reviewer".to_string()],
            },
        }
    }
}
