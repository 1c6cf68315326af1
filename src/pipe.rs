//! Pipes: pure transform/validation steps applied to one request input
//! before handler logic sees it.
//!
//! A [`Pipe`] is called explicitly on a single argument inside a handler:
//!
//! ```rust
//! use tabby::pipe::{ParseIntPipe, Pipe};
//!
//! assert_eq!(ParseIntPipe::new().transform(Some("42")).unwrap(), 42);
//! assert_eq!(
//!     ParseIntPipe::new().transform(Some("abc")).unwrap_err().message(),
//!     "Validation failed",
//! );
//! ```
//!
//! A [`BodyPipe`] runs as a pipeline stage over the request body, right
//! before the handler, and rejects the request when the body is invalid.

use serde_json::Value;

use crate::exception::HttpException;
use crate::handler::BoxFuture;
use crate::pipeline::{Next, Stage};
use crate::request::Request;
use crate::response::{IntoResponse, Response};
use crate::schema::Schema;
use crate::status::Status;

/// Transforms or validates one input value.
pub trait Pipe<In> {
    type Output;

    fn transform(&self, value: In) -> Result<Self::Output, HttpException>;
}

/// Validates the whole request body as a pipeline stage.
pub trait BodyPipe: Send + Sync + 'static {
    fn check(&self, req: &Request) -> Result<(), HttpException>;
}

// ── ParseIntPipe ──────────────────────────────────────────────────────────────

/// Parses text into an `i64`.
///
/// The whole text must be an optionally signed base-10 integer that fits in
/// `i64`. Anything else, including a missing value, fails with
/// `"Validation failed"` and the configured status (400 by default).
#[derive(Clone, Copy, Debug)]
pub struct ParseIntPipe {
    error_status: Status,
}

impl ParseIntPipe {
    pub fn new() -> Self {
        Self { error_status: Status::BadRequest }
    }

    /// Fail with `status` instead of 400, e.g. `Status::NotAcceptable`.
    pub fn with_error_status(status: Status) -> Self {
        Self { error_status: status }
    }
}

impl Default for ParseIntPipe {
    fn default() -> Self { Self::new() }
}

impl Pipe<Option<&str>> for ParseIntPipe {
    type Output = i64;

    fn transform(&self, value: Option<&str>) -> Result<i64, HttpException> {
        let fail = || HttpException::new(self.error_status, "Validation failed");
        let text = value.ok_or_else(fail)?;
        text.parse::<i64>().map_err(|e| fail().with_cause(e))
    }
}

// ── ValidationPipe ────────────────────────────────────────────────────────────

/// Checks a JSON value against a [`Schema`] and hands it back unchanged.
#[derive(Clone, Debug)]
pub struct ValidationPipe {
    schema: Schema,
}

impl ValidationPipe {
    pub fn new(schema: Schema) -> Self {
        Self { schema }
    }
}

impl Pipe<Value> for ValidationPipe {
    type Output = Value;

    fn transform(&self, value: Value) -> Result<Value, HttpException> {
        match self.schema.validate(&value) {
            Ok(()) => Ok(value),
            Err(e) => Err(HttpException::bad_request(e.to_string())),
        }
    }
}

impl BodyPipe for ValidationPipe {
    fn check(&self, req: &Request) -> Result<(), HttpException> {
        let body: Value = req.json()?;
        self.transform(body).map(|_| ())
    }
}

pub(crate) struct PipeStage<P>(pub(crate) P);

impl<P: BodyPipe> Stage for PipeStage<P> {
    fn process<'a>(&'a self, req: Request, next: Next) -> BoxFuture<'a, Response> {
        Box::pin(async move {
            match self.0.check(&req) {
                Ok(()) => next.run(req).await,
                Err(e) => e.into_response(),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exception::ExceptionKind;
    use crate::method::Method;
    use crate::schema::FieldRule;
    use proptest::prelude::*;
    use serde_json::json;

    fn cat_schema() -> Schema {
        Schema::object()
            .field("name", FieldRule::string().required())
            .field("age", FieldRule::number().required())
            .field("breed", FieldRule::string().required())
    }

    #[test]
    fn abc_fails_validation() {
        let err = ParseIntPipe::new().transform(Some("abc")).unwrap_err();
        assert_eq!(err.message(), "Validation failed");
        assert_eq!(err.status(), Status::BadRequest);
        assert_eq!(err.kind(), ExceptionKind::Client);
    }

    #[test]
    fn rejects_missing_empty_partial_and_overflowing_input() {
        let pipe = ParseIntPipe::new();
        for input in [None, Some(""), Some("12abc"), Some("1.5"), Some(" 7"), Some("99999999999999999999")] {
            assert!(pipe.transform(input).is_err(), "{input:?} should fail");
        }
    }

    #[test]
    fn error_status_is_configurable() {
        let err = ParseIntPipe::with_error_status(Status::NotAcceptable)
            .transform(Some("abc"))
            .unwrap_err();
        assert_eq!(err.status(), Status::NotAcceptable);
        assert_eq!(err.message(), "Validation failed");
    }

    #[test]
    fn garfield_passes_unchanged() {
        let garfield = json!({"name": "Garfield", "age": 3, "breed": "Orange Tabby"});
        let out = ValidationPipe::new(cat_schema()).transform(garfield.clone()).unwrap();
        assert_eq!(out, garfield);
    }

    #[test]
    fn body_pipe_rejects_malformed_json() {
        let req = Request::builder(Method::Post, "/cats").body("{").build();
        let err = ValidationPipe::new(cat_schema()).check(&req).unwrap_err();
        assert_eq!(err.message(), "Invalid JSON body");
    }

    proptest! {
        #[test]
        fn parses_every_i64(n in any::<i64>()) {
            let text = n.to_string();
            prop_assert_eq!(ParseIntPipe::new().transform(Some(text.as_str())).unwrap(), n);
        }

        #[test]
        fn rejects_non_numeric_text(s in "[a-zA-Z _-]{1,16}") {
            prop_assume!(s.parse::<i64>().is_err());
            let err = ParseIntPipe::new().transform(Some(s.as_str())).unwrap_err();
            prop_assert_eq!(err.status(), Status::BadRequest);
        }

        #[test]
        fn objects_missing_a_field_are_rejected(
            name in "[a-zA-Z]{1,8}",
            age in 0u32..40,
            breed in "[a-zA-Z ]{1,12}",
            drop in 0usize..3,
        ) {
            let mut cat = json!({"name": name, "age": age, "breed": breed});
            let field = ["name", "age", "breed"][drop];
            cat.as_object_mut().unwrap().remove(field);
            let err = ValidationPipe::new(cat_schema()).transform(cat).unwrap_err();
            prop_assert_eq!(err.message(), format!(r#""{field}" is required"#));
        }

        #[test]
        fn valid_objects_pass_through(name in "[a-zA-Z]{1,8}", age in 0u32..40, breed in "[a-zA-Z ]{1,12}") {
            let cat = json!({"name": name, "age": age, "breed": breed});
            prop_assert_eq!(ValidationPipe::new(cat_schema()).transform(cat.clone()).unwrap(), cat);
        }
    }
}
