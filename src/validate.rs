//! # Attribute Validation
//!
//! Validation is advisory: a mismatch on an ordinary attribute logs a warning
//! and turns the overall result `false`, while a mismatch on a `required`
//! attribute is a hard [`ValidationError::AttributeTypeMismatch`].
//!
//! Values are coerced towards the declared type before they are checked
//! (`"31"` passes as a number, `"2018-02-11T10:34:22.032Z"` as a date). The
//! coercion is only used for the check; callers keep their raw values.

use crate::descriptor::{AttributeSet, Descriptor, TypeTag};
use crate::error::ValidationError;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::{Map, Number, Value};
use tracing::warn;

/// A value after coercion towards a declared [`TypeTag`].
#[derive(Debug, Clone, PartialEq)]
pub enum Coerced {
    Undefined,
    Json(Value),
    Date(DateTime<Utc>),
}

impl Coerced {
    pub fn type_tag(&self) -> TypeTag {
        match self {
            Coerced::Undefined => TypeTag::Undefined,
            Coerced::Json(value) => TypeTag::of(Some(value)),
            Coerced::Date(_) => TypeTag::Date,
        }
    }

    fn display(&self) -> String {
        match self {
            Coerced::Undefined => "undefined".to_string(),
            Coerced::Json(Value::String(s)) => s.clone(),
            Coerced::Json(value) => value.to_string(),
            Coerced::Date(date) => date.to_rfc3339(),
        }
    }
}

impl From<Value> for Coerced {
    fn from(value: Value) -> Self {
        Coerced::Json(value)
    }
}

/// Coerces `value` towards `tag`. Never fails: anything that cannot be
/// converted comes back unchanged.
pub fn coerce(value: Option<&Value>, tag: TypeTag) -> Coerced {
    let Some(value) = value else {
        return Coerced::Undefined;
    };
    match (tag, value) {
        (TypeTag::Number, Value::String(s)) => parse_number(s)
            .map(|n| Coerced::Json(Value::Number(n)))
            .unwrap_or_else(|| Coerced::Json(value.clone())),
        (TypeTag::Date, Value::String(s)) => parse_date(s)
            .map(Coerced::Date)
            .unwrap_or_else(|| Coerced::Json(value.clone())),
        (TypeTag::Date, Value::Number(n)) => n
            .as_i64()
            .and_then(DateTime::from_timestamp_millis)
            .map(Coerced::Date)
            .unwrap_or_else(|| Coerced::Json(value.clone())),
        (TypeTag::Boolean, Value::String(s)) => match s.as_str() {
            "true" => Coerced::Json(Value::Bool(true)),
            "false" => Coerced::Json(Value::Bool(false)),
            _ => Coerced::Json(value.clone()),
        },
        _ => Coerced::Json(value.clone()),
    }
}

fn parse_number(s: &str) -> Option<Number> {
    let trimmed = s.trim();
    if let Ok(int) = trimmed.parse::<i64>() {
        return Some(Number::from(int));
    }
    trimmed.parse::<f64>().ok().and_then(Number::from_f64)
}

/// Parses the date formats a REST backend or a browser typically emits.
pub fn parse_date(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(date) = DateTime::parse_from_rfc3339(s) {
        return Some(date.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Some(naive.and_utc());
    }
    if let Ok(day) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return day.and_hms_opt(0, 0, 0).map(|naive| naive.and_utc());
    }
    // `Date#toString`: "Tue May 08 2018 18:29:39 GMT+0800 (+08)"
    let without_zone_name = s.split(" (").next().unwrap_or(s);
    DateTime::parse_from_str(without_zone_name, "%a %b %d %Y %H:%M:%S GMT%z")
        .ok()
        .map(|date| date.with_timezone(&Utc))
}

/// Checks one coerced value against its descriptor.
///
/// Returns `Ok(None)` when the descriptor declares no type, `Ok(Some(true))`
/// on a match, `Ok(Some(false))` on a tolerated mismatch and an error on a
/// mismatch of a `required` attribute.
pub fn validate_attribute(value: &Coerced, descriptor: &Descriptor) -> Result<Option<bool>, ValidationError> {
    let Some(expected) = descriptor.type_tag() else {
        return Ok(None);
    };

    let actual = value.type_tag();
    let matches = actual == expected
        || (expected == TypeTag::Simple && actual.is_scalar())
        || descriptor.accepted_types().contains(&actual);
    if matches {
        return Ok(Some(true));
    }

    let error = ValidationError::AttributeTypeMismatch {
        expected,
        value: value.display(),
        actual,
    };
    if descriptor.is_required() {
        return Err(error);
    }
    warn!(%expected, %actual, "{error}");
    Ok(Some(false))
}

/// Validates every attribute of `record` against `descriptors`.
///
/// Fails with [`ValidationError::InvalidInput`] when `record` is not an object.
pub fn validate_attributes(record: &Value, descriptors: &AttributeSet) -> Result<bool, ValidationError> {
    match record {
        Value::Object(record) => validate_record(record, descriptors),
        _ => Err(ValidationError::InvalidInput),
    }
}

/// Batch validation of an object record; keeps going after tolerated
/// mismatches and reports undescribed keys in a single warning.
pub fn validate_record(record: &Map<String, Value>, descriptors: &AttributeSet) -> Result<bool, ValidationError> {
    let mut validated = true;
    let mut undescribed = Vec::new();

    for (name, raw) in record {
        match descriptors.get(name) {
            Some(descriptor) if descriptor.type_tag().is_some() => {
                if !check(Some(raw), descriptor)? {
                    validated = false;
                }
            }
            _ => undescribed.push(name.as_str()),
        }
    }

    // Absent attributes are undefined; only a default gives them a value to check.
    for (name, descriptor) in descriptors.iter() {
        if record.contains_key(name) || descriptor.type_tag().is_none() {
            continue;
        }
        if descriptor.default_value().is_some() && !check(None, descriptor)? {
            validated = false;
        }
    }

    if !undescribed.is_empty() {
        warn!(
            attributes = ?undescribed,
            "Please use a type descriptor to describe model attributes ({})",
            undescribed.join(",")
        );
    }

    Ok(validated)
}

fn check(raw: Option<&Value>, descriptor: &Descriptor) -> Result<bool, ValidationError> {
    let value = raw.or(descriptor.default_value());
    let Some(expected) = descriptor.type_tag() else {
        return Ok(true);
    };
    let coerced = coerce(value, expected);
    Ok(validate_attribute(&coerced, descriptor)?.unwrap_or(true))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::{Arc, Mutex};
    use tracing::field::{Field, Visit};
    use tracing::{Event, Level, Subscriber};
    use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

    /// Records the level and message of every event.
    #[derive(Clone, Default)]
    struct EventLog(Arc<Mutex<Vec<(Level, String)>>>);

    struct MessageVisitor(String);

    impl Visit for MessageVisitor {
        fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
            if field.name() == "message" {
                self.0 = format!("{value:?}");
            }
        }
    }

    impl<S: Subscriber> Layer<S> for EventLog {
        fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
            let mut visitor = MessageVisitor(String::new());
            event.record(&mut visitor);
            self.0.lock().unwrap().push((*event.metadata().level(), visitor.0));
        }
    }

    /// Runs `f` under a capturing subscriber and returns the warnings it emitted.
    fn warnings_of(f: impl FnOnce()) -> Vec<String> {
        let log = EventLog::default();
        tracing::subscriber::with_default(tracing_subscriber::registry().with(log.clone()), f);
        let events = log.0.lock().unwrap();
        events
            .iter()
            .filter(|(level, _)| *level == Level::WARN)
            .map(|(_, message)| message.clone())
            .collect()
    }

    fn user_attributes() -> AttributeSet {
        AttributeSet::base()
            .with(
                "name",
                Descriptor::new(TypeTag::String)
                    .required()
                    .accepting([TypeTag::Null, TypeTag::EmptyString]),
            )
            .with("favouriteFood", Descriptor::new(TypeTag::Array))
            .with("age", Descriptor::new(TypeTag::Number))
    }

    #[test]
    fn test_matching_values_validate() {
        let cases = [
            (json!("Avo"), TypeTag::String),
            (json!(3), TypeTag::Number),
            (json!(false), TypeTag::Boolean),
            (json!(["a"]), TypeTag::Array),
            (json!({ "a": 1 }), TypeTag::Object),
            (json!(null), TypeTag::Null),
        ];
        for (value, tag) in cases {
            let result = validate_attribute(&Coerced::from(value), &Descriptor::new(tag)).unwrap();
            assert_eq!(result, Some(true), "{tag} should accept its own kind");
        }
    }

    #[test]
    fn test_untyped_descriptor_is_a_no_op() {
        let result = validate_attribute(&Coerced::from(json!(1)), &Descriptor::untyped()).unwrap();
        assert_eq!(result, None);
    }

    #[test]
    fn test_required_mismatch_names_both_types() {
        let descriptor = Descriptor::new(TypeTag::String).required();
        let err = validate_attribute(&Coerced::from(json!(10)), &descriptor).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Expected \"string\" but got property \"10\" of type \"number\" instead"
        );
    }

    #[test]
    fn test_optional_mismatch_only_warns() {
        let descriptor = Descriptor::new(TypeTag::Array);
        let mut result = None;
        let warnings = warnings_of(|| {
            result = Some(validate_attribute(&Coerced::from(json!("pho")), &descriptor));
        });
        assert_eq!(result.unwrap().unwrap(), Some(false));
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].starts_with("Expected \"array\""), "{}", warnings[0]);
        assert!(warnings[0].contains("of type \"string\""), "{}", warnings[0]);
    }

    #[test]
    fn test_match_emits_no_warning() {
        let warnings = warnings_of(|| {
            let descriptor = Descriptor::new(TypeTag::Number);
            assert_eq!(validate_attribute(&Coerced::from(json!(3)), &descriptor).unwrap(), Some(true));
        });
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_undescribed_keys_warn_once() {
        let record = json!({ "id": 1, "name": "Avo", "nickname": "A", "title": "Dr" });
        let mut result = None;
        let warnings = warnings_of(|| {
            result = Some(validate_attributes(&record, &user_attributes()));
        });
        assert!(result.unwrap().unwrap());
        assert_eq!(
            warnings,
            ["Please use a type descriptor to describe model attributes (nickname,title)"]
        );
    }

    #[test]
    fn test_accepted_types_widen_the_match() {
        let descriptor = Descriptor::new(TypeTag::String).required().accepting([TypeTag::Null]);
        assert_eq!(validate_attribute(&Coerced::from(json!(null)), &descriptor).unwrap(), Some(true));
        assert!(validate_attribute(&Coerced::from(json!("")), &descriptor).is_err());
    }

    #[test]
    fn test_coercion_parses_numbers_and_dates() {
        assert_eq!(coerce(Some(&json!("31")), TypeTag::Number), Coerced::Json(json!(31)));
        assert_eq!(coerce(Some(&json!(" 2.5 ")), TypeTag::Number), Coerced::Json(json!(2.5)));
        assert_eq!(coerce(Some(&json!("abc")), TypeTag::Number), Coerced::Json(json!("abc")));
        assert_eq!(coerce(Some(&json!("true")), TypeTag::Boolean), Coerced::Json(json!(true)));
        assert_eq!(coerce(None, TypeTag::Number), Coerced::Undefined);

        for raw in [
            "2018-02-11T10:34:22.032Z",
            "2018-05-08",
            "2018-05-08 18:29:39",
            "Tue May 08 2018 18:29:39 GMT+0800 (+08)",
        ] {
            assert_eq!(
                coerce(Some(&json!(raw)), TypeTag::Date).type_tag(),
                TypeTag::Date,
                "{raw} should parse as a date"
            );
        }
        assert_eq!(
            coerce(Some(&json!("yesterday")), TypeTag::Date),
            Coerced::Json(json!("yesterday"))
        );
    }

    #[test]
    fn test_validate_attributes_batch() {
        let record = json!({
            "id": "1",
            "name": "Avo",
            "age": "31",
            "createdAt": "2018-02-11T10:34:22.032Z",
            "nickname": "A"
        });
        assert!(validate_attributes(&record, &user_attributes()).unwrap());

        let tolerated = json!({ "id": 1, "name": "Avo", "favouriteFood": "pho", "age": [] });
        assert!(!validate_attributes(&tolerated, &user_attributes()).unwrap());
    }

    #[test]
    fn test_validate_attributes_rejects_non_objects() {
        let err = validate_attributes(&json!([1, 2]), &user_attributes()).unwrap_err();
        assert_eq!(err, ValidationError::InvalidInput);
    }

    #[test]
    fn test_required_failure_aborts_batch() {
        let err = validate_attributes(&json!({ "name": 10 }), &user_attributes()).unwrap_err();
        assert!(matches!(
            err,
            ValidationError::AttributeTypeMismatch { expected: TypeTag::String, actual: TypeTag::Number, .. }
        ));
    }

    #[test]
    fn test_default_is_validated_when_absent() {
        let attributes = AttributeSet::new().with("role", Descriptor::new(TypeTag::String).with_default(7));
        assert!(!validate_attributes(&json!({}), &attributes).unwrap());

        let attributes = AttributeSet::new().with("role", Descriptor::new(TypeTag::String).with_default("member"));
        assert!(validate_attributes(&json!({}), &attributes).unwrap());
    }

    #[test]
    fn test_simple_matches_scalars() {
        let descriptor = Descriptor::new(TypeTag::Simple);
        assert_eq!(validate_attribute(&Coerced::from(json!("x")), &descriptor).unwrap(), Some(true));
        assert_eq!(validate_attribute(&Coerced::from(json!(1)), &descriptor).unwrap(), Some(true));
        assert_eq!(validate_attribute(&Coerced::from(json!([])), &descriptor).unwrap(), Some(false));
    }
}
