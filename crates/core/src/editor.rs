//! Validation of pack submissions.
//!
//! Create and update deliberately report discount failures at different
//! granularity: create uses one combined message while update names the bound
//! that was violated. Both run the numeric discount check before the
//! required-fields check.

use std::collections::HashSet;

use serde::Serialize;
use thiserror::Error;

use crate::domain::pack::NewPack;
use crate::domain::product::ProductId;
use crate::numeric::parse_float;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Discount must be a number between 1 and 100.")]
    InvalidDiscount,
    #[error("All fields are required.")]
    MissingFields { name: bool, discount: bool, product_ids: Option<bool> },
    #[error("Discount must be a number.")]
    NotANumber,
    #[error("Discount must be greater than 0.")]
    TooLow,
    #[error("Discount must be less than 100.")]
    TooHigh,
    #[error("Selected products could not be read.")]
    MalformedProductIds,
}

/// Which submitted fields a validation failure points at. Unset flags are
/// omitted from the serialized form.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldFlags {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discount: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_ids: Option<bool>,
}

impl ValidationError {
    pub fn message(&self) -> String {
        self.to_string()
    }

    pub fn fields(&self) -> FieldFlags {
        match self {
            Self::InvalidDiscount | Self::NotANumber | Self::TooLow | Self::TooHigh => {
                FieldFlags { discount: Some(true), ..FieldFlags::default() }
            }
            Self::MissingFields { name, discount, product_ids } => FieldFlags {
                name: Some(*name),
                discount: Some(*discount),
                product_ids: *product_ids,
            },
            Self::MalformedProductIds => {
                FieldFlags { product_ids: Some(true), ..FieldFlags::default() }
            }
        }
    }
}

/// Body returned to the client when a submission is rejected.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ValidationFailure {
    pub error: String,
    pub fields: FieldFlags,
}

impl From<&ValidationError> for ValidationFailure {
    fn from(error: &ValidationError) -> Self {
        Self { error: error.message(), fields: error.fields() }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ValidatedCreate {
    pub name: String,
    pub discount: f64,
    pub product_ids: Vec<ProductId>,
}

impl From<ValidatedCreate> for NewPack {
    fn from(value: ValidatedCreate) -> Self {
        Self { name: value.name, discount: value.discount, product_ids: value.product_ids }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ValidatedUpdate {
    pub name: String,
    pub discount: f64,
}

/// Validates a create submission: pack name, raw discount string and the
/// JSON-encoded list of selected product ids.
pub fn validate_create(
    name: Option<&str>,
    discount_raw: Option<&str>,
    product_ids_raw: Option<&str>,
) -> Result<ValidatedCreate, ValidationError> {
    let discount = parse_float(present(discount_raw).unwrap_or("0"));
    if !within_discount_range(discount) {
        return Err(ValidationError::InvalidDiscount);
    }

    match (present(name), present(product_ids_raw)) {
        (Some(name), Some(product_ids_raw)) => Ok(ValidatedCreate {
            name: name.to_string(),
            discount,
            product_ids: parse_product_ids(product_ids_raw)?,
        }),
        (name, product_ids_raw) => Err(ValidationError::MissingFields {
            name: name.is_none(),
            // a discount that passed the range check is always present
            discount: false,
            product_ids: Some(product_ids_raw.is_none()),
        }),
    }
}

/// Validates an edit of an existing pack's name and discount.
pub fn validate_update(
    name: Option<&str>,
    discount_raw: Option<&str>,
) -> Result<ValidatedUpdate, ValidationError> {
    let discount = discount_raw.map(parse_float).unwrap_or(f64::NAN);
    if discount.is_nan() {
        return Err(ValidationError::NotANumber);
    }
    if discount <= 0.0 {
        return Err(ValidationError::TooLow);
    }
    if discount > 100.0 {
        return Err(ValidationError::TooHigh);
    }

    match (present(name), present(discount_raw)) {
        (Some(name), Some(_)) => Ok(ValidatedUpdate { name: name.to_string(), discount }),
        (name, discount_raw) => Err(ValidationError::MissingFields {
            name: name.is_none(),
            discount: discount_raw.is_none(),
            product_ids: None,
        }),
    }
}

pub fn within_discount_range(discount: f64) -> bool {
    discount > 0.0 && discount <= 100.0
}

fn present(value: Option<&str>) -> Option<&str> {
    value.filter(|value| !value.is_empty())
}

fn parse_product_ids(raw: &str) -> Result<Vec<ProductId>, ValidationError> {
    let ids: Vec<String> =
        serde_json::from_str(raw).map_err(|_| ValidationError::MalformedProductIds)?;

    let mut seen = HashSet::new();
    Ok(ids.into_iter().filter(|id| seen.insert(id.clone())).map(ProductId).collect())
}

#[cfg(test)]
mod tests {
    use super::{validate_create, validate_update, FieldFlags, ValidationError, ValidationFailure};
    use crate::domain::product::ProductId;

    const ONE_PRODUCT: Option<&str> = Some(r#"["gid://shopify/Product/12345"]"#);

    #[test]
    fn create_accepts_discounts_in_range() {
        for raw in ["0.01", "1", "15", "99.5", "100"] {
            let validated = validate_create(Some("Test Pack"), Some(raw), ONE_PRODUCT)
                .unwrap_or_else(|error| panic!("{raw} should be accepted: {error}"));
            assert_eq!(validated.name, "Test Pack");
            assert_eq!(validated.product_ids, vec![ProductId("gid://shopify/Product/12345".into())]);
        }
    }

    #[test]
    fn create_rejects_discount_above_hundred() {
        let error = validate_create(Some("Test Pack"), Some("150"), Some(r#"["id1"]"#))
            .expect_err("150 should be rejected");

        assert_eq!(error, ValidationError::InvalidDiscount);
        assert!(error.message().contains("between 1 and 100"));
        assert_eq!(error.fields().discount, Some(true));
    }

    #[test]
    fn create_rejects_zero_and_negative_discounts_with_the_same_message() {
        for raw in ["0", "-50"] {
            let error = validate_create(Some("Test Pack"), Some(raw), Some(r#"["id1"]"#))
                .expect_err("non-positive discount should be rejected");
            assert_eq!(error, ValidationError::InvalidDiscount);
            assert_eq!(error.message(), "Discount must be a number between 1 and 100.");
        }
    }

    #[test]
    fn create_treats_empty_discount_as_zero() {
        let error = validate_create(Some("Test Pack"), Some(""), ONE_PRODUCT)
            .expect_err("empty discount should be rejected");
        assert_eq!(error, ValidationError::InvalidDiscount);

        let error = validate_create(Some("Test Pack"), None, ONE_PRODUCT)
            .expect_err("absent discount should be rejected");
        assert_eq!(error, ValidationError::InvalidDiscount);
    }

    #[test]
    fn create_checks_discount_before_required_fields() {
        let error = validate_create(None, Some("150"), None).expect_err("should fail");
        assert_eq!(error, ValidationError::InvalidDiscount);
    }

    #[test]
    fn create_reports_each_missing_field() {
        let error = validate_create(Some(""), Some("10"), None).expect_err("should fail");

        assert_eq!(error.message(), "All fields are required.");
        assert_eq!(
            error.fields(),
            FieldFlags { name: Some(true), discount: Some(false), product_ids: Some(true) }
        );
    }

    #[test]
    fn create_rejects_product_ids_that_are_not_a_json_string_array() {
        let error = validate_create(Some("Test Pack"), Some("10"), Some("gid://shopify/Product/1"))
            .expect_err("plain string is not a JSON array");
        assert_eq!(error, ValidationError::MalformedProductIds);
        assert_eq!(error.fields().product_ids, Some(true));
    }

    #[test]
    fn create_accepts_an_empty_selection_and_drops_duplicates() {
        let empty = validate_create(Some("Empty"), Some("5"), Some("[]")).expect("empty list");
        assert!(empty.product_ids.is_empty());

        let deduped = validate_create(Some("Dupes"), Some("5"), Some(r#"["a","b","a"]"#))
            .expect("duplicates");
        assert_eq!(deduped.product_ids, vec![ProductId("a".into()), ProductId("b".into())]);
    }

    #[test]
    fn update_accepts_discounts_in_range() {
        for (raw, expected) in [("0.01", 0.01), ("1", 1.0), ("42.5", 42.5), ("100", 100.0)] {
            let validated =
                validate_update(Some("Summer Pack"), Some(raw)).unwrap_or_else(|error| {
                    panic!("discount {raw} should be accepted, got {error}")
                });
            assert_eq!(validated.discount, expected);
            assert_eq!(validated.name, "Summer Pack");
        }
    }

    #[test]
    fn update_with_everything_empty_reports_not_a_number() {
        let error = validate_update(Some(""), Some("")).expect_err("should fail");
        assert_eq!(error.message(), "Discount must be a number.");
        assert_eq!(error.fields().discount, Some(true));
    }

    #[test]
    fn update_names_the_violated_bound() {
        assert_eq!(validate_update(Some("P"), Some("abc")), Err(ValidationError::NotANumber));
        assert_eq!(validate_update(Some("P"), Some("0")), Err(ValidationError::TooLow));
        assert_eq!(validate_update(Some("P"), Some("-3")), Err(ValidationError::TooLow));
        assert_eq!(validate_update(Some("P"), Some("100.5")), Err(ValidationError::TooHigh));
        assert_eq!(
            ValidationError::TooHigh.message(),
            "Discount must be less than 100."
        );
        assert_eq!(
            ValidationError::TooLow.message(),
            "Discount must be greater than 0."
        );
    }

    #[test]
    fn update_requires_a_name_once_discount_is_valid() {
        let error = validate_update(None, Some("20")).expect_err("should fail");
        assert_eq!(
            error,
            ValidationError::MissingFields { name: true, discount: false, product_ids: None }
        );
    }

    #[test]
    fn failure_body_omits_unset_field_flags() {
        let body = serde_json::to_value(ValidationFailure::from(&ValidationError::TooHigh))
            .expect("serialize");
        assert_eq!(
            body,
            serde_json::json!({
                "error": "Discount must be less than 100.",
                "fields": { "discount": true }
            })
        );

        let body = serde_json::to_value(ValidationFailure::from(&ValidationError::MissingFields {
            name: true,
            discount: false,
            product_ids: Some(false),
        }))
        .expect("serialize");
        assert_eq!(
            body["fields"],
            serde_json::json!({ "name": true, "discount": false, "productIds": false })
        );
    }
}
