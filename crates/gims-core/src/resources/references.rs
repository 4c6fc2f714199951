//! Reference data: value types and property sections.

use serde_json::{Value, json};

use crate::api::{Gateway, routes};
use crate::error::Result;

pub struct ReferenceService<'a> {
    gateway: &'a dyn Gateway,
}

impl<'a> ReferenceService<'a> {
    pub fn new(gateway: &'a dyn Gateway) -> Self {
        Self { gateway }
    }

    /// `{"value_types": [...]}`
    pub fn value_types(&self) -> Result<Value> {
        Ok(json!({ "value_types": self.gateway.get(routes::VALUE_TYPES)? }))
    }

    /// `{"property_sections": [...]}`
    pub fn property_sections(&self) -> Result<Value> {
        Ok(json!({ "property_sections": self.gateway.get(routes::PROPERTY_SECTIONS)? }))
    }
}
