use crate::schema::{FieldRule, Schema};

/// Shape a request body must have to become a [`Cat`](super::Cat).
///
/// `age` is bounded to what [`Cat::age`](super::Cat::age) can hold, so every
/// body accepted here deserializes.
pub fn cat_schema() -> Schema {
    Schema::object()
        .field("name", FieldRule::string().required())
        .field("age", FieldRule::number().integer().min(0.0).max(f64::from(u32::MAX)).required())
        .field("breed", FieldRule::string().required())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn garfield_is_a_cat() {
        let garfield = json!({"name": "Garfield", "age": 3, "breed": "Orange Tabby"});
        assert!(cat_schema().validate(&garfield).is_ok());
    }

    #[test]
    fn age_must_be_numeric() {
        let err = cat_schema()
            .validate(&json!({"name": "Garfield", "age": "three", "breed": "Orange Tabby"}))
            .unwrap_err();
        assert_eq!(err.to_string(), r#""age" must be a number"#);
    }

    #[test]
    fn every_accepted_age_fits_a_cat() {
        for age in [json!(0), json!(3.0), json!(u32::MAX)] {
            let body = json!({"name": "Garfield", "age": age, "breed": "Orange Tabby"});
            assert!(cat_schema().validate(&body).is_ok());
            assert!(serde_json::from_value::<super::super::Cat>(body).is_ok());
        }
        let err = cat_schema()
            .validate(&json!({"name": "Garfield", "age": 5_000_000_000u64, "breed": "Orange Tabby"}))
            .unwrap_err();
        assert_eq!(err.to_string(), r#""age" must be less than or equal to 4294967295"#);
    }
}
