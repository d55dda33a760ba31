use crate::client::ApiResponse;
use crate::workflow::Context;
use serde_json::Value;

/// Accepted status codes for a response.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum StatusExpectation {
    Exactly(u16),
    OneOf(Vec<u16>),
    AtLeast(u16),
    Any,
}

impl StatusExpectation {
    /// A single code becomes `Exactly`, anything else `OneOf`.
    pub fn from_accepted(codes: &[u16]) -> Self {
        match codes {
            [code] => StatusExpectation::Exactly(*code),
            codes => StatusExpectation::OneOf(codes.to_vec()),
        }
    }

    pub fn accepts(&self, status: u16) -> bool {
        match self {
            StatusExpectation::Exactly(code) => *code == status,
            StatusExpectation::OneOf(codes) => codes.contains(&status),
            StatusExpectation::AtLeast(code) => status >= *code,
            StatusExpectation::Any => true,
        }
    }
}

impl std::fmt::Display for StatusExpectation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StatusExpectation::Exactly(code) => write!(f, "{}", code),
            StatusExpectation::OneOf(codes) => {
                let codes: Vec<String> = codes.iter().map(u16::to_string).collect();
                write!(f, "one of [{}]", codes.join(", "))
            }
            StatusExpectation::AtLeast(code) => write!(f, ">= {}", code),
            StatusExpectation::Any => write!(f, "any status"),
        }
    }
}

/// A check on the response body. Locations are JSON pointers (`/products/0/id`).
#[derive(Debug, Clone, PartialEq)]
pub enum BodyCheck {
    HasKey(String),
    LacksKey(String),
    Equals(String, Value),
    IsString(String),
    NonEmptyArray(String),
    EachItemHasKeys { pointer: String, keys: Vec<String> },
    EqualsContext { pointer: String, key: String },
    DiffersFromContext { pointer: String, key: String },
    /// The ids of the array at `pointer` form the same set as the one captured under `key`.
    SameIdSet {
        pointer: String,
        field: String,
        key: String,
    },
}

impl BodyCheck {
    pub fn has_key(pointer: &str) -> Self {
        BodyCheck::HasKey(pointer.to_string())
    }

    pub fn lacks_key(pointer: &str) -> Self {
        BodyCheck::LacksKey(pointer.to_string())
    }

    pub fn equals(pointer: &str, value: impl Into<Value>) -> Self {
        BodyCheck::Equals(pointer.to_string(), value.into())
    }

    pub fn is_string(pointer: &str) -> Self {
        BodyCheck::IsString(pointer.to_string())
    }

    pub fn non_empty_array(pointer: &str) -> Self {
        BodyCheck::NonEmptyArray(pointer.to_string())
    }

    pub fn each_item_has_keys(pointer: &str, keys: &[&str]) -> Self {
        BodyCheck::EachItemHasKeys {
            pointer: pointer.to_string(),
            keys: keys.iter().map(|k| k.to_string()).collect(),
        }
    }

    pub fn equals_context(pointer: &str, key: &str) -> Self {
        BodyCheck::EqualsContext {
            pointer: pointer.to_string(),
            key: key.to_string(),
        }
    }

    pub fn differs_from_context(pointer: &str, key: &str) -> Self {
        BodyCheck::DiffersFromContext {
            pointer: pointer.to_string(),
            key: key.to_string(),
        }
    }

    pub fn same_id_set(pointer: &str, field: &str, key: &str) -> Self {
        BodyCheck::SameIdSet {
            pointer: pointer.to_string(),
            field: field.to_string(),
            key: key.to_string(),
        }
    }

    pub fn describe(&self) -> String {
        match self {
            BodyCheck::HasKey(p) => format!("`{}` is present", p),
            BodyCheck::LacksKey(p) => format!("`{}` is absent", p),
            BodyCheck::Equals(p, _) => format!("`{}` equals literal", p),
            BodyCheck::IsString(p) => format!("`{}` is a string", p),
            BodyCheck::NonEmptyArray(p) => format!("`{}` is a non-empty array", p),
            BodyCheck::EachItemHasKeys { pointer, .. } => {
                format!("every item of `{}` has the required keys populated", pointer)
            }
            BodyCheck::EqualsContext { pointer, key } => {
                format!("`{}` equals context value `{}`", pointer, key)
            }
            BodyCheck::DiffersFromContext { pointer, key } => {
                format!("`{}` differs from context value `{}`", pointer, key)
            }
            BodyCheck::SameIdSet {
                pointer,
                field,
                key,
            } => format!("`{}` ids (`{}`) match context value `{}`", pointer, field, key),
        }
    }

    fn evaluate(&self, body: &Value, context: &Context) -> Result<(), Mismatch> {
        let mismatch = |expected: String, actual: String| Mismatch {
            check: self.describe(),
            expected,
            actual,
        };
        match self {
            BodyCheck::HasKey(p) => match body.pointer(p) {
                Some(_) => Ok(()),
                None => Err(mismatch("present".into(), "missing".into())),
            },
            // The value is never echoed: the key may be a password.
            BodyCheck::LacksKey(p) => match body.pointer(p) {
                None => Ok(()),
                Some(_) => Err(mismatch("absent".into(), "present".into())),
            },
            BodyCheck::Equals(p, expected) => match body.pointer(p) {
                Some(actual) if actual == expected => Ok(()),
                actual => Err(mismatch(expected.to_string(), render(actual))),
            },
            BodyCheck::IsString(p) => match body.pointer(p) {
                Some(Value::String(_)) => Ok(()),
                actual => Err(mismatch("a string".into(), type_name(actual).into())),
            },
            BodyCheck::NonEmptyArray(p) => match body.pointer(p) {
                Some(Value::Array(items)) if !items.is_empty() => Ok(()),
                Some(Value::Array(_)) => {
                    Err(mismatch("non-empty array".into(), "empty array".into()))
                }
                actual => Err(mismatch("non-empty array".into(), type_name(actual).into())),
            },
            BodyCheck::EachItemHasKeys { pointer, keys } => {
                let Some(Value::Array(items)) = body.pointer(pointer) else {
                    let actual = type_name(body.pointer(pointer));
                    return Err(mismatch("an array".into(), actual.into()));
                };
                let missing: Vec<String> = items
                    .iter()
                    .enumerate()
                    .flat_map(|(index, item)| {
                        keys.iter().filter_map(move |key| match item.get(key.as_str()) {
                            None => Some(format!("item {} lacks `{}`", index, key)),
                            Some(Value::Null) => {
                                Some(format!("item {} has a null `{}`", index, key))
                            }
                            Some(Value::String(s)) if s.trim().is_empty() => {
                                Some(format!("item {} has an empty `{}`", index, key))
                            }
                            Some(_) => None,
                        })
                    })
                    .collect();
                if missing.is_empty() {
                    Ok(())
                } else {
                    Err(mismatch(format!("keys {:?}", keys), missing.join(", ")))
                }
            }
            BodyCheck::EqualsContext { pointer, key } => {
                let Some(expected) = context.get(key) else {
                    return Err(mismatch(format!("context value `{}`", key), "unavailable".into()));
                };
                match body.pointer(pointer) {
                    Some(actual) if actual == expected => Ok(()),
                    actual => Err(mismatch(expected.to_string(), render(actual))),
                }
            }
            BodyCheck::DiffersFromContext { pointer, key } => {
                let Some(other) = context.get(key) else {
                    return Err(mismatch(format!("context value `{}`", key), "unavailable".into()));
                };
                match body.pointer(pointer) {
                    Some(actual) if actual != other => Ok(()),
                    actual => Err(mismatch(format!("anything but {}", other), render(actual))),
                }
            }
            BodyCheck::SameIdSet {
                pointer,
                field,
                key,
            } => {
                let Some(expected) = context.get(key) else {
                    return Err(mismatch(format!("context value `{}`", key), "unavailable".into()));
                };
                match body.pointer(pointer).and_then(|items| id_set(items, field)) {
                    Some(actual) if &actual == expected => Ok(()),
                    Some(actual) => Err(mismatch(expected.to_string(), actual.to_string())),
                    None => Err(mismatch(expected.to_string(), "no id set".into())),
                }
            }
        }
    }
}

/// The sorted, de-duplicated values of `field` across the items of an array.
pub fn id_set(items: &Value, field: &str) -> Option<Value> {
    let items = items.as_array()?;
    let mut ids: Vec<String> = items
        .iter()
        .filter_map(|item| item.get(field))
        .map(|id| match id {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
        .collect();
    ids.sort();
    ids.dedup();
    Some(Value::Array(ids.into_iter().map(Value::String).collect()))
}

fn render(value: Option<&Value>) -> String {
    value.map_or_else(|| "missing".to_string(), Value::to_string)
}

pub(crate) fn type_name(value: Option<&Value>) -> &'static str {
    match value {
        None => "missing",
        Some(Value::Null) => "null",
        Some(Value::Bool(_)) => "a boolean",
        Some(Value::Number(_)) => "a number",
        Some(Value::String(_)) => "a string",
        Some(Value::Array(_)) => "an array",
        Some(Value::Object(_)) => "an object",
    }
}

/// Expected vs actual for one failed check.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct Mismatch {
    pub check: String,
    pub expected: String,
    pub actual: String,
}

impl std::fmt::Display for Mismatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: expected {}, got {}",
            self.check, self.expected, self.actual
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Expectation {
    pub status: StatusExpectation,
    pub checks: Vec<BodyCheck>,
}

impl Expectation {
    pub fn status(status: StatusExpectation) -> Self {
        Self {
            status,
            checks: Vec::new(),
        }
    }

    pub fn check(mut self, check: BodyCheck) -> Self {
        self.checks.push(check);
        self
    }

    /// Every mismatch is reported, not just the first one.
    pub fn evaluate(&self, response: &ApiResponse, context: &Context) -> Result<(), Vec<Mismatch>> {
        let mut mismatches = Vec::new();
        if !self.status.accepts(response.status) {
            mismatches.push(Mismatch {
                check: "status".into(),
                expected: self.status.to_string(),
                actual: response.status.to_string(),
            });
        }
        mismatches.extend(
            self.checks
                .iter()
                .filter_map(|check| check.evaluate(&response.body, context).err()),
        );
        if mismatches.is_empty() {
            Ok(())
        } else {
            Err(mismatches)
        }
    }
}
