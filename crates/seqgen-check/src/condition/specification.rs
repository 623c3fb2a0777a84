//! Serializable operation specifications.
//!
//! This is the JSON interchange format: a file holds an array of
//! [`OperationSpecification`]s. Condition text refers to the receiver,
//! parameters and result by the names given in [`Identifiers`].

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use seqgen_core::OperationSignature;

use crate::error::ConditionError;

/// Receiver, parameter and result names used by condition text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identifiers {
    #[serde(default = "default_receiver_name")]
    pub receiver_name: String,
    #[serde(default)]
    pub parameters: Vec<String>,
    #[serde(default = "default_return_name")]
    pub return_name: String,
}

fn default_receiver_name() -> String {
    "receiver".to_string()
}

fn default_return_name() -> String {
    "result".to_string()
}

impl Default for Identifiers {
    fn default() -> Self {
        Identifiers {
            receiver_name: default_receiver_name(),
            parameters: Vec::new(),
            return_name: default_return_name(),
        }
    }
}

impl Identifiers {
    pub fn new(parameters: &[&str]) -> Self {
        Identifiers { parameters: parameters.iter().map(|p| p.to_string()).collect(), ..Identifiers::default() }
    }

    /// Whether two of the receiver, parameter and result names coincide.
    pub fn has_name_conflict(&self) -> bool {
        let mut seen = HashSet::new();
        std::iter::once(&self.receiver_name)
            .chain(&self.parameters)
            .chain(std::iter::once(&self.return_name))
            .any(|name| !seen.insert(name.as_str()))
    }
}

/// A boolean expression evaluated before the call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Guard {
    #[serde(default)]
    pub description: String,
    pub condition_text: String,
}

impl Guard {
    pub fn new(description: &str, condition_text: &str) -> Self {
        Guard { description: description.to_string(), condition_text: condition_text.to_string() }
    }
}

/// A boolean expression evaluated after the call; may mention the result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Property {
    #[serde(default)]
    pub description: String,
    pub condition_text: String,
}

impl Property {
    pub fn new(description: &str, condition_text: &str) -> Self {
        Property { description: description.to_string(), condition_text: condition_text.to_string() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Precondition {
    #[serde(default)]
    pub description: String,
    pub guard: Guard,
}

/// When `guard` holds before the call, `property` must hold after it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Postcondition {
    #[serde(default)]
    pub description: String,
    pub guard: Guard,
    pub property: Property,
}

/// When `guard` holds before the call, the call must throw
/// `exception_type_name`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThrowsCondition {
    #[serde(default)]
    pub description: String,
    pub guard: Guard,
    pub exception_type_name: String,
}

/// The specification of one constructor or method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationSpecification {
    pub operation: OperationSignature,
    #[serde(default)]
    pub identifiers: Identifiers,
    #[serde(default)]
    pub pre: Vec<Precondition>,
    #[serde(default)]
    pub post: Vec<Postcondition>,
    #[serde(default)]
    pub throws: Vec<ThrowsCondition>,
}

impl OperationSpecification {
    pub fn new(operation: OperationSignature, identifiers: Identifiers) -> Self {
        OperationSpecification { operation, identifiers, pre: Vec::new(), post: Vec::new(), throws: Vec::new() }
    }

    pub fn add_precondition(&mut self, description: &str, guard: &str) -> &mut Self {
        self.pre.push(Precondition { description: description.to_string(), guard: Guard::new(description, guard) });
        self
    }

    pub fn add_postcondition(&mut self, description: &str, guard: &str, property: &str) -> &mut Self {
        self.post.push(Postcondition {
            description: description.to_string(),
            guard: Guard::new("", guard),
            property: Property::new(description, property),
        });
        self
    }

    pub fn add_throws(&mut self, description: &str, guard: &str, exception: &str) -> &mut Self {
        self.throws.push(ThrowsCondition {
            description: description.to_string(),
            guard: Guard::new("", guard),
            exception_type_name: exception.to_string(),
        });
        self
    }
}

/// Parses a JSON array of specifications.
pub fn parse_specifications(text: &str) -> Result<Vec<OperationSpecification>, ConditionError> {
    Ok(serde_json::from_str(text)?)
}

pub fn read_specifications(path: &Path) -> Result<Vec<OperationSpecification>, ConditionError> {
    let text = std::fs::read_to_string(path)
        .map_err(|source| ConditionError::Io { path: path.to_path_buf(), source })?;
    parse_specifications(&text)
}

pub fn write_specifications(specs: &[OperationSpecification]) -> Result<String, ConditionError> {
    Ok(serde_json::to_string_pretty(specs)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_round_trip_is_lossless() {
        let mut spec = OperationSpecification::new(
            OperationSignature::method("demo.ClassWithConditions", "category", &["int"]),
            Identifiers::new(&["value"]),
        );
        spec.add_precondition("positive", "value > 0")
            .add_postcondition("below", "value < receiver.getValue()", "result == ClassWithConditions.Range.ONE")
            .add_throws("too big", "value >= 4*receiver.getValue()", "java.lang.IllegalArgumentException");
        let text = write_specifications(std::slice::from_ref(&spec)).unwrap();
        let back = parse_specifications(&text).unwrap();
        assert_eq!(back, vec![spec]);
    }

    #[test]
    fn identifiers_default_when_absent() {
        let text = r#"[{
            "operation": {"classname": "demo.C", "name": "m", "parameterTypes": ["int"]},
            "identifiers": {"parameters": ["x"]},
            "pre": [{"description": "d", "guard": {"conditionText": "x > 0"}}]
        }]"#;
        let specs = parse_specifications(text).unwrap();
        assert_eq!(specs[0].identifiers.receiver_name, "receiver");
        assert_eq!(specs[0].identifiers.return_name, "result");
        assert_eq!(specs[0].pre[0].guard.condition_text, "x > 0");
        assert!(specs[0].post.is_empty());
    }

    #[test]
    fn name_conflicts() {
        assert!(!Identifiers::new(&["a", "b"]).has_name_conflict());
        assert!(Identifiers::new(&["a", "a"]).has_name_conflict());
        assert!(Identifiers::new(&["result"]).has_name_conflict());
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = read_specifications(Path::new("/nonexistent/specs.json")).unwrap_err();
        assert!(matches!(err, ConditionError::Io { .. }));
    }
}
