//! Request types for a diagnostic run.
//!
//! These types represent the JSON document a caller submits: assessment
//! identifiers plus the ordered list of response items. Answers are free-form
//! JSON in the wire format; here they become an [`AnswerValue`] so the credit
//! scorer can match on shape instead of probing types at runtime.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::error::{Result, SkillGapError};
use crate::stats::ActivityLimit;

/// Key in `options` that overrides the curriculum size.
pub const MAX_ACTIVITIES_OPTION: &str = "max_activities";

/// Item type of a response, parsed case-insensitively.
///
/// Unknown types are kept verbatim in [`ItemType::Other`]; they score zero
/// but never reject the request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ItemType {
    /// Single choice, exact match.
    Mcq,
    /// Multiple choice, partial credit.
    Msq,
    /// Numeric answer within a tolerance.
    Numeric,
    /// Short free text.
    Short,
    /// Long free text.
    Long,
    /// Anything else (raw value preserved).
    Other(String),
}

impl ItemType {
    /// Parse an item type from its wire name.
    pub fn parse(raw: &str) -> Self {
        match raw.to_lowercase().as_str() {
            "mcq" => Self::Mcq,
            "msq" => Self::Msq,
            "numeric" => Self::Numeric,
            "short" => Self::Short,
            "long" => Self::Long,
            _ => Self::Other(raw.to_string()),
        }
    }

    /// Wire name of this item type.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Mcq => "mcq",
            Self::Msq => "msq",
            Self::Numeric => "numeric",
            Self::Short => "short",
            Self::Long => "long",
            Self::Other(raw) => raw,
        }
    }
}

impl From<String> for ItemType {
    fn from(raw: String) -> Self {
        Self::parse(&raw)
    }
}

impl From<ItemType> for String {
    fn from(item_type: ItemType) -> Self {
        item_type.as_str().to_string()
    }
}

impl std::fmt::Display for ItemType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An answer or answer key.
///
/// Variant order matters: deserialization tries each in turn, so `null`
/// becomes `Missing` and any JSON object falls through to `Structured`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnswerValue {
    /// Absent or `null`.
    #[default]
    Missing,
    /// `true` / `false`.
    Bool(bool),
    /// Any JSON number (integers compare equal to their float value).
    Number(f64),
    /// A string.
    Text(String),
    /// An ordered sequence, used for msq choice identifiers.
    List(Vec<AnswerValue>),
    /// A JSON object.
    Structured(Map<String, Value>),
}

impl AnswerValue {
    /// Create a text answer.
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    /// Create a list of text choices.
    pub fn choices<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::List(values.into_iter().map(|v| Self::Text(v.into())).collect())
    }

    /// Whether this value is absent.
    pub fn is_missing(&self) -> bool {
        matches!(self, Self::Missing)
    }

    /// Interpret the value as a float.
    ///
    /// Numbers pass through, booleans become 1.0/0.0, and strings are parsed
    /// after trimming. Everything else has no numeric form.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            Self::Text(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
    }

    /// String form used for text containment.
    ///
    /// Integral numbers render without a fractional part.
    pub fn text_form(&self) -> Option<String> {
        match self {
            Self::Text(s) => Some(s.clone()),
            Self::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => {
                Some(format!("{}", *n as i64))
            }
            Self::Number(n) => Some(n.to_string()),
            Self::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    /// Distinct choice identifiers, in first-seen order.
    ///
    /// `Missing` is an empty selection. Returns `None` when the value is not
    /// a sequence or holds nested sequences/objects.
    pub fn choice_set(&self) -> Option<Vec<&AnswerValue>> {
        match self {
            Self::Missing => Some(Vec::new()),
            Self::List(items) => {
                let mut set: Vec<&AnswerValue> = Vec::with_capacity(items.len());
                for item in items {
                    if matches!(item, Self::List(_) | Self::Structured(_)) {
                        return None;
                    }
                    if !set.contains(&item) {
                        set.push(item);
                    }
                }
                Some(set)
            }
            _ => None,
        }
    }
}

/// One submitted response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseItem {
    /// Caller-assigned item identifier.
    pub item_id: String,
    /// Item type.
    #[serde(rename = "type")]
    pub item_type: ItemType,
    /// The learner's answer.
    #[serde(default)]
    pub answer: AnswerValue,
    /// The answer key.
    #[serde(default)]
    pub correct: AnswerValue,
    /// Time spent on the item, in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_sec: Option<f64>,
    /// Skills measured by this item. `null` reads as empty.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub skill_refs: Vec<String>,
    /// Scoring rubric. Accepted for compatibility; not used.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score_rubric: Option<Map<String, Value>>,
}

impl ResponseItem {
    /// Create a response item.
    pub fn new(
        item_id: impl Into<String>,
        item_type: ItemType,
        answer: AnswerValue,
        correct: AnswerValue,
    ) -> Self {
        Self {
            item_id: item_id.into(),
            item_type,
            answer,
            correct,
            time_sec: None,
            skill_refs: Vec::new(),
            score_rubric: None,
        }
    }

    /// Set the skill references.
    pub fn with_skills<I, S>(mut self, skills: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.skill_refs = skills.into_iter().map(Into::into).collect();
        self
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}

/// A full diagnostic request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagnosticRequest {
    /// Request schema version.
    pub schema_version: String,
    /// Assessment identifier.
    pub assessment_id: String,
    /// Learner identifier.
    pub student_id: String,
    /// Learner locale.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,
    /// Ordered responses.
    pub responses: Vec<ResponseItem>,
    /// Submission timestamp. Not used by the computation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    /// Free-form constraints.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constraints: Option<Map<String, Value>>,
    /// Free-form options; only `max_activities` is read.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Map<String, Value>>,
    /// Free-form learner profile.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub student_profile: Option<Map<String, Value>>,
    /// Free-form context.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<Map<String, Value>>,
}

impl DiagnosticRequest {
    /// Create a request with the given identifiers and responses.
    pub fn new(
        assessment_id: impl Into<String>,
        student_id: impl Into<String>,
        responses: Vec<ResponseItem>,
    ) -> Self {
        Self {
            schema_version: "1.0".to_string(),
            assessment_id: assessment_id.into(),
            student_id: student_id.into(),
            locale: None,
            responses,
            timestamp: None,
            constraints: None,
            options: None,
            student_profile: None,
            context: None,
        }
    }

    /// Parse a request from JSON.
    ///
    /// Shape errors are caller contract violations.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| {
            SkillGapError::invalid_request(format!("failed to parse request: {}", e))
        })
    }

    /// Set an option value.
    pub fn with_option(mut self, key: impl Into<String>, value: Value) -> Self {
        self.options
            .get_or_insert_with(Map::new)
            .insert(key.into(), value);
        self
    }

    /// The caller's `options.max_activities` override.
    ///
    /// An absent key means no override. Integers pass through, finite floats
    /// truncate toward zero, booleans count as 1/0, and strings must parse
    /// as integers. A negative count drops that many skills from the end of
    /// the ranking. `null` and anything else is rejected.
    pub fn max_activities_override(&self) -> Result<Option<ActivityLimit>> {
        let Some(options) = &self.options else {
            return Ok(None);
        };
        match options.get(MAX_ACTIVITIES_OPTION) {
            None => Ok(None),
            Some(value) => coerce_count(value).map(|n| Some(ActivityLimit::from_signed(n))),
        }
    }
}

fn coerce_count(value: &Value) -> Result<i64> {
    let invalid = || {
        SkillGapError::invalid_request(format!(
            "options.{} must be integer-convertible, got {}",
            MAX_ACTIVITIES_OPTION, value
        ))
    };

    match value {
        Value::Bool(b) => Ok(i64::from(*b)),
        Value::Number(n) => match (n.as_i64(), n.as_u64(), n.as_f64()) {
            (Some(i), _, _) => Ok(i),
            (None, Some(u), _) => Ok(i64::try_from(u).unwrap_or(i64::MAX)),
            (None, None, Some(f)) if f.is_finite() => Ok(f.trunc() as i64),
            _ => Err(invalid()),
        },
        Value::String(s) => s.trim().parse::<i64>().map_err(|_| invalid()),
        _ => Err(invalid()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request_with_option(value: Value) -> DiagnosticRequest {
        DiagnosticRequest::new("quiz-1", "student-1", vec![])
            .with_option(MAX_ACTIVITIES_OPTION, value)
    }

    #[test]
    fn test_item_type_parse_case_insensitive() {
        assert_eq!(ItemType::parse("MCQ"), ItemType::Mcq);
        assert_eq!(ItemType::parse("Msq"), ItemType::Msq);
        assert_eq!(ItemType::parse("numeric"), ItemType::Numeric);
        assert_eq!(ItemType::parse("SHORT"), ItemType::Short);
        assert_eq!(ItemType::parse("Long"), ItemType::Long);
        assert_eq!(
            ItemType::parse("essay"),
            ItemType::Other("essay".to_string())
        );
    }

    #[test]
    fn test_item_type_other_keeps_raw_value() {
        let item_type = ItemType::parse("Drag-Drop");
        assert_eq!(item_type.as_str(), "Drag-Drop");
        assert_eq!(String::from(item_type), "Drag-Drop");
    }

    #[test]
    fn test_answer_value_deserialize_shapes() {
        let values: Vec<AnswerValue> =
            serde_json::from_value(json!([null, true, 3, 2.5, "B", ["a", "b"], {"k": 1}]))
                .unwrap();

        assert_eq!(values[0], AnswerValue::Missing);
        assert_eq!(values[1], AnswerValue::Bool(true));
        assert_eq!(values[2], AnswerValue::Number(3.0));
        assert_eq!(values[3], AnswerValue::Number(2.5));
        assert_eq!(values[4], AnswerValue::text("B"));
        assert_eq!(values[5], AnswerValue::choices(["a", "b"]));
        assert!(matches!(values[6], AnswerValue::Structured(_)));
    }

    #[test]
    fn test_integer_and_float_compare_equal() {
        let a: AnswerValue = serde_json::from_str("1").unwrap();
        let b: AnswerValue = serde_json::from_str("1.0").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_as_number() {
        assert_eq!(AnswerValue::Number(4.2).as_number(), Some(4.2));
        assert_eq!(AnswerValue::Bool(true).as_number(), Some(1.0));
        assert_eq!(AnswerValue::text(" 3.5 ").as_number(), Some(3.5));
        assert_eq!(AnswerValue::text("abc").as_number(), None);
        assert_eq!(AnswerValue::Missing.as_number(), None);
        assert_eq!(AnswerValue::choices(["1"]).as_number(), None);
    }

    #[test]
    fn test_text_form() {
        assert_eq!(AnswerValue::text("Paris").text_form().as_deref(), Some("Paris"));
        assert_eq!(AnswerValue::Number(42.0).text_form().as_deref(), Some("42"));
        assert_eq!(AnswerValue::Number(0.5).text_form().as_deref(), Some("0.5"));
        assert_eq!(AnswerValue::Bool(false).text_form().as_deref(), Some("false"));
        assert_eq!(AnswerValue::Missing.text_form(), None);
        assert_eq!(AnswerValue::choices(["a"]).text_form(), None);
    }

    #[test]
    fn test_choice_set_dedups_in_order() {
        let value = AnswerValue::choices(["b", "a", "b"]);
        let set = value.choice_set().unwrap();
        assert_eq!(set, vec![&AnswerValue::text("b"), &AnswerValue::text("a")]);
    }

    #[test]
    fn test_choice_set_missing_is_empty() {
        assert_eq!(AnswerValue::Missing.choice_set(), Some(vec![]));
    }

    #[test]
    fn test_choice_set_rejects_non_sequences() {
        assert!(AnswerValue::text("ab").choice_set().is_none());
        assert!(AnswerValue::Number(1.0).choice_set().is_none());
        let nested = AnswerValue::List(vec![AnswerValue::choices(["a"])]);
        assert!(nested.choice_set().is_none());
    }

    #[test]
    fn test_response_item_deserialize_defaults() {
        let item: ResponseItem =
            serde_json::from_value(json!({"item_id": "q1", "type": "mcq", "answer": "B"}))
                .unwrap();

        assert_eq!(item.item_type, ItemType::Mcq);
        assert_eq!(item.answer, AnswerValue::text("B"));
        assert!(item.correct.is_missing());
        assert!(item.skill_refs.is_empty());
        assert!(item.time_sec.is_none());
    }

    #[test]
    fn test_response_item_null_skill_refs() {
        let item: ResponseItem = serde_json::from_value(json!({
            "item_id": "q1", "type": "mcq", "answer": "B", "skill_refs": null
        }))
        .unwrap();
        assert!(item.skill_refs.is_empty());
    }

    #[test]
    fn test_request_from_json() {
        let json = r#"{
            "schema_version": "1.0",
            "assessment_id": "quiz-7",
            "student_id": "s-42",
            "responses": [
                {"item_id": "q1", "type": "MCQ", "answer": "B", "correct": "B",
                 "skill_refs": ["algebra.1"], "time_sec": 12.5}
            ],
            "options": {"max_activities": 3}
        }"#;

        let request = DiagnosticRequest::from_json(json).unwrap();
        assert_eq!(request.assessment_id, "quiz-7");
        assert_eq!(request.responses.len(), 1);
        assert_eq!(request.responses[0].time_sec, Some(12.5));
        assert_eq!(
            request.max_activities_override().unwrap(),
            Some(ActivityLimit::AtMost(3))
        );
    }

    #[test]
    fn test_request_from_json_missing_field_is_invalid_request() {
        let err = DiagnosticRequest::from_json(r#"{"schema_version": "1.0"}"#).unwrap_err();
        assert!(err.is_caller_error());
    }

    #[test]
    fn test_request_options_must_be_mapping() {
        let json = r#"{
            "schema_version": "1.0", "assessment_id": "a", "student_id": "s",
            "responses": [], "options": [1, 2]
        }"#;
        assert!(DiagnosticRequest::from_json(json).is_err());
    }

    #[test]
    fn test_max_activities_absent() {
        let request = DiagnosticRequest::new("a", "s", vec![]);
        assert_eq!(request.max_activities_override().unwrap(), None);

        let other_options =
            DiagnosticRequest::new("a", "s", vec![]).with_option("verbose", json!(true));
        assert_eq!(other_options.max_activities_override().unwrap(), None);
    }

    #[test]
    fn test_max_activities_coercion() {
        let cases = [
            (json!(2), 2),
            (json!(3.9), 3),
            (json!("4"), 4),
            (json!(" 7 "), 7),
            (json!(true), 1),
            (json!(0), 0),
        ];
        for (value, expected) in cases {
            let request = request_with_option(value.clone());
            assert_eq!(
                request.max_activities_override().unwrap(),
                Some(ActivityLimit::AtMost(expected)),
                "coercing {}",
                value
            );
        }
    }

    #[test]
    fn test_max_activities_negative_drops_from_end() {
        for (value, expected) in [(json!(-1), 1), (json!("-2"), 2), (json!(-3.7), 3)] {
            let request = request_with_option(value.clone());
            assert_eq!(
                request.max_activities_override().unwrap(),
                Some(ActivityLimit::AllBut(expected)),
                "coercing {}",
                value
            );
        }
    }

    #[test]
    fn test_max_activities_rejects_unconvertible() {
        for value in [
            Value::Null,
            json!("five"),
            json!("2.5"),
            json!([1]),
            json!({"n": 1}),
        ] {
            let request = request_with_option(value.clone());
            let err = request.max_activities_override().unwrap_err();
            assert!(err.is_caller_error(), "expected rejection for {}", value);
        }
    }
}
