//! Run parameters supplied by the pipeline runner.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::domain::{BranchName, NameError};

/// Key of the extra parameter naming the branch a run should work on.
pub const BRANCH_PARAM: &str = "branch";

/// Parameters of one run.
///
/// Only `run_id` and `extra_params.branch` mean anything to the hook; the
/// rest of `extra_params` is carried along untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunParams {
    run_id: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    extra_params: Map<String, Value>,
}

/// Runners may send `"extra_params": null`; treat it like a missing key.
fn null_as_empty<'de, D>(deserializer: D) -> Result<Map<String, Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<Map<String, Value>>::deserialize(deserializer).map(Option::unwrap_or_default)
}

impl RunParams {
    /// Parameters for the run `run_id` with no extra parameters.
    #[must_use]
    pub fn new(run_id: impl Into<String>) -> Self {
        Self {
            run_id: run_id.into(),
            extra_params: Map::new(),
        }
    }

    /// Requests that the run work on `branch`.
    #[must_use]
    pub fn with_branch(self, branch: impl Into<String>) -> Self {
        self.with_extra(BRANCH_PARAM, Value::String(branch.into()))
    }

    /// Sets an extra parameter.
    #[must_use]
    pub fn with_extra(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extra_params.insert(key.into(), value);
        self
    }

    /// Run identifier.
    #[must_use]
    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    /// Extra parameters, including any the hook does not interpret.
    #[must_use]
    pub fn extra_params(&self) -> &Map<String, Value> {
        &self.extra_params
    }

    /// Branch the run asked for.
    ///
    /// A missing key and an explicit `null` both mean no request.
    ///
    /// # Errors
    ///
    /// Returns `NameError` if the value is not a string or not a valid branch name.
    pub fn requested_branch(&self) -> Result<Option<BranchName>, NameError> {
        match self.extra_params.get(BRANCH_PARAM) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(name)) => BranchName::new(name.as_str()).map(Some),
            Some(other) => Err(NameError::NotAString {
                key: BRANCH_PARAM,
                found: json_type(other),
            }),
        }
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
