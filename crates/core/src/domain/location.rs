// Location Registry

use crate::domain::error::{DomainError, Result};
use serde::{Deserialize, Serialize};

/// Current service location plus the named presets operators pick from.
///
/// Not related to queue entries; only broadcast next to them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationRegistry {
    current: String,
    presets: Vec<String>,
}

impl LocationRegistry {
    pub fn new(current: impl Into<String>, presets: Vec<String>) -> Self {
        Self {
            current: current.into().trim().to_string(),
            presets: normalize_presets(presets),
        }
    }

    pub fn current(&self) -> &str {
        &self.current
    }

    pub fn presets(&self) -> &[String] {
        &self.presets
    }

    pub fn set_current(&mut self, location: &str) -> Result<()> {
        let location = location.trim();
        if location.is_empty() {
            return Err(DomainError::ValidationError(
                "location must not be empty".to_string(),
            ));
        }
        self.current = location.to_string();
        Ok(())
    }

    pub fn set_presets(&mut self, presets: Vec<String>) {
        self.presets = normalize_presets(presets);
    }
}

/// Trim, drop blanks and duplicates, keep first-seen order
fn normalize_presets(presets: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(presets.len());
    for preset in presets {
        let preset = preset.trim();
        if !preset.is_empty() && !out.iter().any(|p| p == preset) {
            out.push(preset.to_string());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_are_normalized() {
        let registry = LocationRegistry::new(
            " Hall A ",
            vec![
                "Hall A".to_string(),
                "  ".to_string(),
                "Lobby".to_string(),
                " Hall A".to_string(),
            ],
        );
        assert_eq!(registry.current(), "Hall A");
        assert_eq!(registry.presets(), &["Hall A".to_string(), "Lobby".to_string()]);
    }

    #[test]
    fn test_empty_location_rejected() {
        let mut registry = LocationRegistry::new("Lobby", vec![]);
        assert!(registry.set_current("   ").is_err());
        assert_eq!(registry.current(), "Lobby");

        registry.set_current(" Rooftop ").unwrap();
        assert_eq!(registry.current(), "Rooftop");
    }
}
