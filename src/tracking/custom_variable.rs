use serde::Serialize;

use crate::utils::error::Error;

/// Scope a custom variable slot is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    Visit,
    Page,
    Event,
}

impl Scope {
    pub fn from_name(name: &str) -> Result<Scope, Error> {
        match name {
            "visit" => Ok(Scope::Visit),
            "page" => Ok(Scope::Page),
            "event" => Ok(Scope::Event),
            _ => Err(Error::InvalidParameter(format!(
                "invalid scope parameter value {}, expected one of visit, page, event",
                name
            ))),
        }
    }

    /// Wire key the scope's variables serialize under.
    pub fn query_key(self) -> &'static str {
        match self {
            Scope::Page => "cvar",
            Scope::Visit => "_cvar",
            Scope::Event => "e_cvar",
        }
    }
}

/// Closed union of values a custom variable can carry.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Text(String),
    Number(f64),
    Flag(bool),
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Number(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Number(value as f64)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Flag(value)
    }
}

/// A (name, value) pair stored in a custom variable slot.
///
/// Serializes as the two-element array the tracking endpoint expects.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CustomVariable(pub(crate) String, pub(crate) Value);

impl CustomVariable {
    pub fn new<T: Into<Value>>(name: &str, value: T) -> Self {
        CustomVariable(name.to_string(), value.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }

    pub fn value(&self) -> &Value {
        &self.1
    }
}
