use crate::domain::SessionToken;
use crate::expectation::type_name;
use secrecy::{ExposeSecret, Secret};
use serde_json::Value;
use std::collections::HashMap;

/// Key under which a login step stores the issued bearer token.
pub const TOKEN_KEY: &str = "token";

#[derive(Debug, Clone)]
pub enum ContextValue {
    Plain(Value),
    Secret(Secret<String>),
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ContextError {
    #[error("Context value `{key}` is not available.")]
    Missing { key: String },
    #[error("Context value `{key}` is {actual}, expected {expected}.")]
    WrongType {
        key: String,
        expected: &'static str,
        actual: &'static str,
    },
}

impl ContextError {
    pub fn missing(key: &str) -> Self {
        ContextError::Missing {
            key: key.to_string(),
        }
    }

    pub fn key(&self) -> &str {
        match self {
            ContextError::Missing { key } | ContextError::WrongType { key, .. } => key.as_str(),
        }
    }
}

/// Values accumulated by the steps of a scenario.
///
/// Passed explicitly into every step, there is no global credential store.
#[derive(Debug, Clone, Default)]
pub struct Context {
    values: HashMap<String, ContextValue>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        self.values.insert(key.into(), ContextValue::Plain(value));
    }

    pub fn insert_secret(&mut self, key: impl Into<String>, value: Secret<String>) {
        self.values.insert(key.into(), ContextValue::Secret(value));
    }

    /// Plain values only, secrets are never handed out as JSON.
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self.values.get(key) {
            Some(ContextValue::Plain(value)) => Some(value),
            _ => None,
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn require(&self, key: &str) -> Result<&Value, ContextError> {
        self.get(key).ok_or_else(|| ContextError::missing(key))
    }

    /// A captured value of the wrong type is an error of its own, not a missing one.
    pub fn require_str(&self, key: &str) -> Result<&str, ContextError> {
        let value = self.require(key)?;
        value.as_str().ok_or_else(|| ContextError::WrongType {
            key: key.to_string(),
            expected: "a string",
            actual: type_name(Some(value)),
        })
    }

    pub fn require_secret(&self, key: &str) -> Result<Secret<String>, ContextError> {
        match self.values.get(key) {
            Some(ContextValue::Secret(secret)) => Ok(secret.clone()),
            Some(ContextValue::Plain(Value::String(s))) => Ok(Secret::new(s.clone())),
            Some(ContextValue::Plain(other)) => Err(ContextError::WrongType {
                key: key.to_string(),
                expected: "a string",
                actual: type_name(Some(other)),
            }),
            None => Err(ContextError::missing(key)),
        }
    }

    pub fn session_token(&self, key: &str) -> Result<SessionToken, ContextError> {
        self.require_secret(key)
            .map(|secret| SessionToken::new(secret.expose_secret().clone()))
    }

    /// The token captured under [`TOKEN_KEY`].
    pub fn token(&self) -> Result<SessionToken, ContextError> {
        self.session_token(TOKEN_KEY)
    }

    /// Copy every value of `other` into `self`, overwriting existing keys.
    pub fn extend(&mut self, other: &Context) {
        self.values
            .extend(other.values.iter().map(|(k, v)| (k.clone(), v.clone())));
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
