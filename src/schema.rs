//! Declarative object schemas for untyped JSON input.
//!
//! ```rust
//! use tabby::schema::{FieldRule, Schema};
//! use serde_json::json;
//!
//! let schema = Schema::object()
//!     .field("name", FieldRule::string().required())
//!     .field("age", FieldRule::number().integer().min(0.0).required());
//!
//! assert!(schema.validate(&json!({"name": "Garfield", "age": 3})).is_ok());
//! assert_eq!(
//!     schema.validate(&json!({"name": "Garfield"})).unwrap_err().to_string(),
//!     r#""age" is required"#,
//! );
//! ```

use std::fmt;

use serde_json::Value;

/// JSON type a field must have.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FieldType {
    String,
    Number,
    Boolean,
}

impl FieldType {
    fn matches(self, value: &Value) -> bool {
        match self {
            Self::String => value.is_string(),
            Self::Number => value.is_number(),
            Self::Boolean => value.is_boolean(),
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::String => "a string",
            Self::Number => "a number",
            Self::Boolean => "a boolean",
        })
    }
}

/// Constraints on a single field.
#[derive(Clone, Debug)]
pub struct FieldRule {
    ty: FieldType,
    required: bool,
    integer: bool,
    min: Option<f64>,
    max: Option<f64>,
}

impl FieldRule {
    fn of(ty: FieldType) -> Self {
        Self { ty, required: false, integer: false, min: None, max: None }
    }

    pub fn string() -> Self { Self::of(FieldType::String) }
    pub fn number() -> Self { Self::of(FieldType::Number) }
    pub fn boolean() -> Self { Self::of(FieldType::Boolean) }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Numbers only: no fractional part.
    pub fn integer(mut self) -> Self {
        self.integer = true;
        self
    }

    /// Numbers only: inclusive lower bound.
    pub fn min(mut self, min: f64) -> Self {
        self.min = Some(min);
        self
    }

    /// Numbers only: inclusive upper bound.
    pub fn max(mut self, max: f64) -> Self {
        self.max = Some(max);
        self
    }

    fn check(&self, name: &str, value: Option<&Value>) -> Result<(), SchemaError> {
        let Some(value) = value else {
            return if self.required {
                Err(SchemaError::Required(name.to_owned()))
            } else {
                Ok(())
            };
        };
        if !self.ty.matches(value) {
            return Err(SchemaError::WrongType { field: name.to_owned(), expected: self.ty });
        }
        if let Some(n) = value.as_f64() {
            if self.integer && n.fract() != 0.0 {
                return Err(SchemaError::NotInteger(name.to_owned()));
            }
            if let Some(min) = self.min.filter(|min| n < *min) {
                return Err(SchemaError::TooSmall { field: name.to_owned(), min });
            }
            if let Some(max) = self.max.filter(|max| n > *max) {
                return Err(SchemaError::TooLarge { field: name.to_owned(), max });
            }
        }
        Ok(())
    }
}

/// An object schema: ordered field rules plus the unknown-key policy.
#[derive(Clone, Debug, Default)]
pub struct Schema {
    fields: Vec<(String, FieldRule)>,
    allow_unknown: bool,
}

impl Schema {
    pub fn object() -> Self {
        Self::default()
    }

    pub fn field(mut self, name: &str, rule: FieldRule) -> Self {
        self.fields.push((name.to_owned(), rule));
        self
    }

    /// Accept keys the schema does not declare.
    pub fn allow_unknown(mut self) -> Self {
        self.allow_unknown = true;
        self
    }

    /// Checks `value` against the schema and reports the first violation.
    ///
    /// Declared fields are checked in declaration order, unknown keys after.
    pub fn validate(&self, value: &Value) -> Result<(), SchemaError> {
        let object = value.as_object().ok_or(SchemaError::NotAnObject)?;

        for (name, rule) in &self.fields {
            rule.check(name, object.get(name))?;
        }

        if !self.allow_unknown {
            if let Some(key) = object.keys().find(|k| !self.fields.iter().any(|(n, _)| n == *k)) {
                return Err(SchemaError::NotAllowed(key.clone()));
            }
        }
        Ok(())
    }
}

/// The first constraint a value failed.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum SchemaError {
    #[error(r#""value" must be of type object"#)]
    NotAnObject,

    #[error(r#""{0}" is required"#)]
    Required(String),

    #[error(r#""{field}" must be {expected}"#)]
    WrongType { field: String, expected: FieldType },

    #[error(r#""{0}" must be an integer"#)]
    NotInteger(String),

    #[error(r#""{field}" must be greater than or equal to {min}"#)]
    TooSmall { field: String, min: f64 },

    #[error(r#""{field}" must be less than or equal to {max}"#)]
    TooLarge { field: String, max: f64 },

    #[error(r#""{0}" is not allowed"#)]
    NotAllowed(String),
}
