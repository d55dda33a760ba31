use super::context::{Context, ContextError};
use crate::client::ApiRequest;
use crate::expectation::{Expectation, id_set};
use secrecy::Secret;
use serde_json::Value;

type RequestFactory =
    Box<dyn Fn(&Context) -> Result<ApiRequest, ContextError> + Send + Sync>;

/// Copies part of a response body into the context once the expectation passed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Capture {
    Value { key: String, pointer: String },
    /// Stored as a secret, e.g. an access token.
    Secret { key: String, pointer: String },
    /// The sorted id set of the array at `pointer`.
    IdSet {
        key: String,
        pointer: String,
        field: String,
    },
}

impl Capture {
    pub fn value(key: &str, pointer: &str) -> Self {
        Capture::Value {
            key: key.to_string(),
            pointer: pointer.to_string(),
        }
    }

    pub fn secret(key: &str, pointer: &str) -> Self {
        Capture::Secret {
            key: key.to_string(),
            pointer: pointer.to_string(),
        }
    }

    pub fn id_set(key: &str, pointer: &str, field: &str) -> Self {
        Capture::IdSet {
            key: key.to_string(),
            pointer: pointer.to_string(),
            field: field.to_string(),
        }
    }

    pub fn key(&self) -> &str {
        match self {
            Capture::Value { key, .. }
            | Capture::Secret { key, .. }
            | Capture::IdSet { key, .. } => key.as_str(),
        }
    }

    pub fn pointer(&self) -> &str {
        match self {
            Capture::Value { pointer, .. }
            | Capture::Secret { pointer, .. }
            | Capture::IdSet { pointer, .. } => pointer.as_str(),
        }
    }

    /// Returns `false` when the body holds nothing usable at `pointer`.
    pub fn apply(&self, body: &Value, context: &mut Context) -> bool {
        let Some(found) = body.pointer(self.pointer()) else {
            return false;
        };
        match self {
            Capture::Value { key, .. } => {
                context.insert(key.clone(), found.clone());
                true
            }
            Capture::Secret { key, .. } => match found.as_str() {
                Some(secret) => {
                    context.insert_secret(key.clone(), Secret::new(secret.to_string()));
                    true
                }
                None => false,
            },
            Capture::IdSet { key, field, .. } => match id_set(found, field) {
                Some(ids) => {
                    context.insert(key.clone(), ids);
                    true
                }
                None => false,
            },
        }
    }
}

/// One HTTP call of a scenario.
pub struct Step {
    pub name: String,
    request: RequestFactory,
    pub expectation: Expectation,
    pub captures: Vec<Capture>,
}

impl Step {
    /// The request is built from the context right before the call.
    pub fn new<F>(name: impl Into<String>, request: F, expectation: Expectation) -> Self
    where
        F: Fn(&Context) -> Result<ApiRequest, ContextError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            request: Box::new(request),
            expectation,
            captures: Vec::new(),
        }
    }

    /// A request that does not depend on earlier responses.
    pub fn fixed(name: impl Into<String>, request: ApiRequest, expectation: Expectation) -> Self {
        Self::new(name, move |_| Ok(request.clone()), expectation)
    }

    pub fn capture(mut self, capture: Capture) -> Self {
        self.captures.push(capture);
        self
    }

    pub fn build_request(&self, context: &Context) -> Result<ApiRequest, ContextError> {
        (self.request)(context)
    }
}

impl std::fmt::Debug for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Step")
            .field("name", &self.name)
            .field("expectation", &self.expectation)
            .field("captures", &self.captures)
            .finish_non_exhaustive()
    }
}
