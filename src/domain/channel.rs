// Sensor channel domain model
use serde::Deserialize;
use serde_json::Value;
use std::fmt;

/// What a channel measures, which decides how the scorer reads it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelKind {
    Ph,
    Turbidity,
}

/// One way of locating a numeric value inside a payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractionRule {
    /// Nested object field, e.g. `data.ph` -> `["data", "ph"]`.
    Field(Vec<String>),
    /// The payload itself, when the transport delivers a bare number.
    Payload,
}

impl ExtractionRule {
    /// Parse rule text: a dotted field path, or `$` for the whole payload.
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        if text == "$" {
            return Some(Self::Payload);
        }
        let segments: Vec<String> = text.split('.').map(str::to_string).collect();
        if segments.iter().any(|s| s.is_empty()) {
            return None;
        }
        Some(Self::Field(segments))
    }

    pub fn apply(&self, payload: &Value) -> Option<f64> {
        let found = match self {
            Self::Payload => payload,
            Self::Field(path) => path
                .iter()
                .try_fold(payload, |value, segment| value.get(segment.as_str()))?,
        };
        found.as_f64().filter(|v| v.is_finite())
    }
}

impl fmt::Display for ExtractionRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Payload => write!(f, "$"),
            Self::Field(path) => write!(f, "{}", path.join(".")),
        }
    }
}

/// Static declaration of a channel: its name on the wire, what it measures,
/// how much history it keeps and how its value is found.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelSpec {
    pub name: String,
    pub kind: ChannelKind,
    pub capacity: usize,
    pub rules: Vec<ExtractionRule>,
}

impl ChannelSpec {
    pub fn new(name: impl Into<String>, kind: ChannelKind, capacity: usize, rules: Vec<ExtractionRule>) -> Self {
        Self {
            name: name.into(),
            kind,
            capacity,
            rules,
        }
    }

    /// First rule that yields a number wins.
    pub fn extract(&self, payload: &Value) -> Option<f64> {
        self.rules.iter().find_map(|rule| rule.apply(payload))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rules(texts: &[&str]) -> Vec<ExtractionRule> {
        texts.iter().map(|t| ExtractionRule::parse(t).unwrap()).collect()
    }

    #[test]
    fn test_parse_rules() {
        assert_eq!(ExtractionRule::parse("$"), Some(ExtractionRule::Payload));
        assert_eq!(
            ExtractionRule::parse("data.ph"),
            Some(ExtractionRule::Field(vec!["data".into(), "ph".into()]))
        );
        assert_eq!(ExtractionRule::parse(""), None);
        assert_eq!(ExtractionRule::parse("data..ph"), None);
        assert_eq!(ExtractionRule::parse("data.ph").unwrap().to_string(), "data.ph");
    }

    #[test]
    fn test_first_matching_rule_wins() {
        let spec = ChannelSpec::new("pH Sensor", ChannelKind::Ph, 12, rules(&["ph", "data.ph", "value"]));

        assert_eq!(spec.extract(&json!({"ph": 7.2, "value": 1.0})), Some(7.2));
        assert_eq!(spec.extract(&json!({"data": {"ph": 6.8}, "value": 1.0})), Some(6.8));
        assert_eq!(spec.extract(&json!({"value": 8.1})), Some(8.1));
        assert_eq!(spec.extract(&json!({"temperature": 21.0})), None);
    }

    #[test]
    fn test_zero_is_a_present_value() {
        let spec = ChannelSpec::new("Turbidity Sensor", ChannelKind::Turbidity, 12, rules(&["turbidity", "value"]));

        assert_eq!(spec.extract(&json!({"turbidity": 0.0, "value": 3.0})), Some(0.0));
    }

    #[test]
    fn test_non_numeric_fields_are_skipped() {
        let spec = ChannelSpec::new("pH Sensor 1", ChannelKind::Ph, 10, rules(&["pH", "value", "$"]));

        assert_eq!(spec.extract(&json!({"pH": "7.0", "value": 6.6})), Some(6.6));
        assert_eq!(spec.extract(&json!(7.3)), Some(7.3));
        assert_eq!(spec.extract(&json!("7.3")), None);
        assert_eq!(spec.extract(&json!({"pH": null})), None);
    }
}
