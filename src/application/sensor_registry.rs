// Sensor registry - Channel declarations and their rolling windows
use crate::application::quality_scorer::ChannelWindow;
use crate::domain::channel::ChannelSpec;
use crate::domain::rolling_buffer::RollingBuffer;
use serde_json::Value;
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum RegistryError {
    #[error("channel '{0}' has capacity 0")]
    ZeroCapacity(String),
    #[error("channel '{0}' has no extraction rules")]
    NoRules(String),
    #[error("channel '{channel}' has an invalid extraction rule '{rule}'")]
    InvalidRule { channel: String, rule: String },
    #[error("channel '{0}' is declared twice with different settings")]
    ConflictingChannel(String),
}

/// Statically declared channels. Buffers are created on first use with the
/// channel's configured capacity.
#[derive(Debug, Clone)]
pub struct SensorRegistry {
    specs: Vec<ChannelSpec>,
    buffers: HashMap<String, RollingBuffer<f64>>,
}

impl SensorRegistry {
    pub fn new(specs: Vec<ChannelSpec>) -> Result<Self, RegistryError> {
        let mut declared: Vec<ChannelSpec> = Vec::with_capacity(specs.len());

        for spec in specs {
            if spec.capacity == 0 {
                return Err(RegistryError::ZeroCapacity(spec.name));
            }
            if spec.rules.is_empty() {
                return Err(RegistryError::NoRules(spec.name));
            }
            match declared.iter().find(|existing| existing.name == spec.name) {
                Some(existing) if *existing == spec => continue,
                Some(_) => return Err(RegistryError::ConflictingChannel(spec.name)),
                None => declared.push(spec),
            }
        }

        Ok(Self {
            specs: declared,
            buffers: HashMap::new(),
        })
    }

    pub fn spec(&self, channel: &str) -> Option<&ChannelSpec> {
        self.specs.iter().find(|spec| spec.name == channel)
    }

    pub fn contains(&self, channel: &str) -> bool {
        self.spec(channel).is_some()
    }

    /// The window for `channel`, created on first use. `None` for channels
    /// that were never declared.
    pub fn resolve(&mut self, channel: &str) -> Option<&mut RollingBuffer<f64>> {
        let capacity = self.spec(channel)?.capacity;
        if !self.buffers.contains_key(channel) {
            tracing::debug!("Creating window for {} (capacity {})", channel, capacity);
            self.buffers
                .insert(channel.to_string(), RollingBuffer::new(capacity)?);
        }
        self.buffers.get_mut(channel)
    }

    /// Applies the channel's rules in declared order. `None` when nothing
    /// matches or the channel is unknown.
    pub fn extract(&self, channel: &str, payload: &Value) -> Option<f64> {
        self.spec(channel)?.extract(payload)
    }

    pub fn buffer(&self, channel: &str) -> Option<&RollingBuffer<f64>> {
        self.buffers.get(channel)
    }

    /// Current windows in declaration order, skipping channels with no data yet.
    pub fn windows(&self) -> Vec<ChannelWindow<'_>> {
        self.specs
            .iter()
            .filter_map(|spec| {
                self.buffers.get(&spec.name).map(|buffer| ChannelWindow {
                    kind: spec.kind,
                    values: buffer,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::channel::{ChannelKind, ExtractionRule};
    use serde_json::json;

    fn ph_spec(name: &str, capacity: usize) -> ChannelSpec {
        ChannelSpec::new(
            name,
            ChannelKind::Ph,
            capacity,
            vec![
                ExtractionRule::parse("ph").unwrap(),
                ExtractionRule::parse("data.ph").unwrap(),
                ExtractionRule::parse("value").unwrap(),
            ],
        )
    }

    #[test]
    fn test_rejects_misconfiguration() {
        assert_eq!(
            SensorRegistry::new(vec![ph_spec("pH Sensor", 0)]).unwrap_err(),
            RegistryError::ZeroCapacity("pH Sensor".into())
        );

        let mut no_rules = ph_spec("pH Sensor", 12);
        no_rules.rules.clear();
        assert_eq!(
            SensorRegistry::new(vec![no_rules]).unwrap_err(),
            RegistryError::NoRules("pH Sensor".into())
        );

        assert_eq!(
            SensorRegistry::new(vec![ph_spec("pH Sensor", 12), ph_spec("pH Sensor", 10)]).unwrap_err(),
            RegistryError::ConflictingChannel("pH Sensor".into())
        );
    }

    #[test]
    fn test_identical_duplicates_collapse() {
        let registry = SensorRegistry::new(vec![ph_spec("pH Sensor", 12), ph_spec("pH Sensor", 12)]).unwrap();
        assert!(registry.contains("pH Sensor"));
        assert_eq!(registry.specs.len(), 1);
    }

    #[test]
    fn test_resolve_creates_on_first_use() {
        let mut registry = SensorRegistry::new(vec![ph_spec("pH Sensor 1", 10)]).unwrap();
        assert!(registry.buffer("pH Sensor 1").is_none());
        assert!(registry.windows().is_empty());

        let buffer = registry.resolve("pH Sensor 1").unwrap();
        assert_eq!(buffer.capacity(), 10);
        buffer.push(7.0);

        assert_eq!(registry.buffer("pH Sensor 1").unwrap().snapshot(), vec![7.0]);
        assert_eq!(registry.windows().len(), 1);
        assert!(registry.resolve("Unknown").is_none());
    }

    #[test]
    fn test_extract() {
        let registry = SensorRegistry::new(vec![ph_spec("pH Sensor", 12)]).unwrap();

        assert_eq!(registry.extract("pH Sensor", &json!({"data": {"ph": 6.7}})), Some(6.7));
        assert_eq!(registry.extract("pH Sensor", &json!({"other": 1})), None);
        assert_eq!(registry.extract("Turbidity Sensor", &json!({"value": 1})), None);
    }
}
