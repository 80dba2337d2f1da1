use crate::error::StoreError;
use serde::Serialize;
use serde_json::{Number, Value};
use std::cmp::Ordering;
use std::fmt;

/// Canonical cache key of a record.
///
/// Numbers and numeric strings name the same entry: `1`, `"1"` and `"01"`
/// all become `RecordId("1")`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    pub fn parse(raw: &str) -> Result<Self, StoreError> {
        let trimmed = raw.trim();
        if let Ok(int) = trimmed.parse::<i64>() {
            return Ok(Self(int.to_string()));
        }
        match trimmed.parse::<f64>() {
            Ok(n) if n.is_finite() => Ok(Self::from_f64(n)),
            _ => Err(StoreError::InvalidId(format!("\"{raw}\""))),
        }
    }

    fn from_f64(n: f64) -> Self {
        if n.fract() == 0.0 && n.abs() < 9.0e15 {
            Self((n as i64).to_string())
        } else {
            Self(n.to_string())
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The id as the backend expects it in a JSON body.
    pub fn to_value(&self) -> Value {
        if let Ok(int) = self.0.parse::<i64>() {
            return Value::from(int);
        }
        self.0
            .parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(Value::Number)
            .unwrap_or_else(|| Value::String(self.0.clone()))
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// Numeric order, so `2` sorts before `10`.
impl Ord for RecordId {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.0.parse::<f64>(), other.0.parse::<f64>()) {
            (Ok(a), Ok(b)) => a.total_cmp(&b).then_with(|| self.0.cmp(&other.0)),
            _ => self.0.cmp(&other.0),
        }
    }
}

impl PartialOrd for RecordId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Anything accepted where an id is expected.
pub trait IntoRecordId {
    fn into_record_id(self) -> Result<RecordId, StoreError>;
}

impl IntoRecordId for RecordId {
    fn into_record_id(self) -> Result<RecordId, StoreError> {
        Ok(self)
    }
}

impl IntoRecordId for &RecordId {
    fn into_record_id(self) -> Result<RecordId, StoreError> {
        Ok(self.clone())
    }
}

macro_rules! int_record_id {
    ($($ty:ty),*) => {
        $(
            impl IntoRecordId for $ty {
                fn into_record_id(self) -> Result<RecordId, StoreError> {
                    Ok(RecordId(self.to_string()))
                }
            }
        )*
    };
}

int_record_id!(i32, i64, u32, u64, usize);

impl IntoRecordId for &str {
    fn into_record_id(self) -> Result<RecordId, StoreError> {
        RecordId::parse(self)
    }
}

impl IntoRecordId for String {
    fn into_record_id(self) -> Result<RecordId, StoreError> {
        RecordId::parse(&self)
    }
}

impl IntoRecordId for &String {
    fn into_record_id(self) -> Result<RecordId, StoreError> {
        RecordId::parse(self)
    }
}

impl IntoRecordId for &Value {
    fn into_record_id(self) -> Result<RecordId, StoreError> {
        match self {
            Value::Number(n) => {
                if let Some(int) = n.as_i64() {
                    Ok(RecordId(int.to_string()))
                } else if let Some(int) = n.as_u64() {
                    Ok(RecordId(int.to_string()))
                } else {
                    n.as_f64()
                        .map(RecordId::from_f64)
                        .ok_or_else(|| StoreError::InvalidId(n.to_string()))
                }
            }
            Value::String(s) => RecordId::parse(s),
            other => Err(StoreError::InvalidId(other.to_string())),
        }
    }
}

impl IntoRecordId for Value {
    fn into_record_id(self) -> Result<RecordId, StoreError> {
        (&self).into_record_id()
    }
}
