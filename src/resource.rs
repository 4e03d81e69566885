//! Process-wide resource metadata.
//!
//! The [`Resource`] identifies the emitting process (service name, instance
//! id, arbitrary extras). It is built once at pipeline construction,
//! immutable afterwards, and shared by reference across every exported
//! batch.

use crate::config::ResourceConfig;
use crate::record::AttributeValue;

/// Resource attribute key for the service name.
pub const SERVICE_NAME: &str = "service.name";
/// Resource attribute key for the service instance id.
pub const SERVICE_INSTANCE_ID: &str = "service.instance.id";

/// Fallback service name when none is configured, per OTLP conventions.
const UNKNOWN_SERVICE: &str = "unknown_service";

/// Static key/value metadata identifying the emitting process.
#[derive(Debug, Clone, PartialEq)]
pub struct Resource {
    attributes: Vec<(String, AttributeValue)>,
}

impl Resource {
    /// Builds a resource from configuration.
    ///
    /// `service.name` defaults to `unknown_service` when unset. Extra
    /// attributes are sorted by key so exported envelopes are stable.
    #[must_use]
    pub fn from_config(config: &ResourceConfig) -> Self {
        let mut attributes = Vec::new();

        let service_name = config
            .service_name
            .clone()
            .unwrap_or_else(|| UNKNOWN_SERVICE.to_string());
        attributes.push((SERVICE_NAME.to_string(), AttributeValue::Str(service_name)));

        if let Some(instance_id) = &config.instance_id {
            attributes.push((
                SERVICE_INSTANCE_ID.to_string(),
                AttributeValue::Str(instance_id.clone()),
            ));
        }

        let mut extras: Vec<_> = config
            .attributes
            .iter()
            .map(|(k, v)| (k.clone(), AttributeValue::Str(v.clone())))
            .collect();
        extras.sort_by(|a, b| a.0.cmp(&b.0));
        attributes.extend(extras);

        Self { attributes }
    }

    /// Returns all attributes in envelope order.
    #[must_use]
    pub fn attributes(&self) -> &[(String, AttributeValue)] {
        &self.attributes
    }

    /// Looks up a single attribute by key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&AttributeValue> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }
}
