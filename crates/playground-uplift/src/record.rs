use crate::{EditorMode, InputSource, Step, StepType, UpliftError};
use serde_json::{Map, Value};
use tracing::debug;

pub const TYPE_FIELD: &str = "type";
pub const TITLE_FIELD: &str = "title";
pub const CONTENTS_FIELD: &str = "contents";
pub const MODE_FIELD: &str = "mode";
pub const INPUT_SOURCE_FIELD: &str = "inputSource";
pub const URL_FIELD: &str = "url";

const BASE_FIELDS: &[&str] = &[TYPE_FIELD, TITLE_FIELD, CONTENTS_FIELD];
const SOURCED_FIELDS: &[&str] = &[
    TYPE_FIELD,
    TITLE_FIELD,
    CONTENTS_FIELD,
    MODE_FIELD,
    INPUT_SOURCE_FIELD,
    URL_FIELD,
];

/// Plain persisted form of a step. Transient state (output, errors, loading) is
/// never part of it.
pub type StepRecord = Map<String, Value>;

impl StepType {
    /// Fields written by [`Step::to_record`] for this variant, in record order.
    pub fn serializable_fields(&self) -> &'static [&'static str] {
        match self {
            Self::Input | Self::Uplift => SOURCED_FIELDS,
            Self::Output => BASE_FIELDS,
        }
    }
}

impl Step {
    pub fn serializable_fields(&self) -> &'static [&'static str] {
        self.step_type().serializable_fields()
    }

    /// Serializes the step's declared fields minus `exclude`. For content-bearing
    /// steps, whichever of `url`/`contents` the current source ignores is dropped.
    pub fn to_record(&self, exclude: &[&str]) -> StepRecord {
        let irrelevant = self.content_source().map(|source| source.irrelevant_field());
        let mut record = StepRecord::new();
        for field in self.serializable_fields() {
            if exclude.contains(field) || irrelevant == Some(*field) {
                continue;
            }
            if let Some(value) = self.field_value(field) {
                record.insert((*field).to_string(), value);
            }
        }
        record
    }

    fn field_value(&self, field: &str) -> Option<Value> {
        match field {
            TYPE_FIELD => Some(Value::from(self.step_type().tag())),
            TITLE_FIELD => Some(Value::from(self.title())),
            CONTENTS_FIELD => Some(Value::from(self.contents())),
            MODE_FIELD => self.mode().map(|mode| Value::from(mode.as_str())),
            INPUT_SOURCE_FIELD => self.input_source().map(|source| Value::from(source.as_str())),
            URL_FIELD => self.url().map(Value::from),
            _ => None,
        }
    }

    fn apply_field(&mut self, field: &str, value: &Value) -> Result<(), UpliftError> {
        match field {
            TITLE_FIELD => self.set_title(expect_str(field, value)?),
            CONTENTS_FIELD => {
                self.set_contents(expect_str(field, value)?);
            }
            MODE_FIELD => self.set_mode(expect_str(field, value)?.parse::<EditorMode>()?)?,
            INPUT_SOURCE_FIELD => {
                self.set_input_source(expect_str(field, value)?.parse::<InputSource>()?)?
            }
            URL_FIELD => {
                let url = match value {
                    Value::Null => None,
                    other => Some(expect_str(field, other)?.to_string()),
                };
                self.set_url(url)?;
            }
            _ => {}
        }
        Ok(())
    }
}

fn expect_str<'a>(field: &str, value: &'a Value) -> Result<&'a str, UpliftError> {
    value
        .as_str()
        .ok_or_else(|| UpliftError::InvalidRecord(format!("field '{field}' must be a string")))
}

/// Rebuilds a step from a record produced by [`Step::to_record`].
///
/// The `type` tag must name a known variant. Every other serializable field present
/// in the record is copied onto a fresh instance; absent fields keep the variant's
/// defaults and unknown fields are ignored.
pub fn revive(record: &StepRecord) -> Result<Step, UpliftError> {
    let tag = record
        .get(TYPE_FIELD)
        .ok_or_else(|| UpliftError::InvalidRecord("missing 'type' field".to_string()))
        .and_then(|value| expect_str(TYPE_FIELD, value))?;
    let mut step = StepType::from_tag(tag)?.instantiate();
    for field in step.serializable_fields() {
        if *field == TYPE_FIELD {
            continue;
        }
        if let Some(value) = record.get(*field) {
            step.apply_field(field, value)?;
        }
    }

    let ignored: Vec<&str> = record
        .keys()
        .map(String::as_str)
        .filter(|key| !step.serializable_fields().iter().any(|field| field == key))
        .collect();
    if !ignored.is_empty() {
        debug!(step_type = tag, ?ignored, "ignoring unknown record fields");
    }
    Ok(step)
}
