use super::error::EngineError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The numerical parameters a protocol resolves to.
///
/// Engines interpret these in their own terms; a generator may ignore fields that do
/// not apply to its engine (the Γ-only toy engine has no use for a k-point spacing).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProtocolParameters {
    /// Target k-point spacing in 1/Å.
    pub kpoint_spacing: f64,
    /// Plane-wave cutoff in eV.
    pub cutoff_ev: f64,
    /// Smearing width in eV.
    pub smearing_ev: f64,
    /// Default force convergence threshold in eV/Å.
    pub threshold_forces: f64,
    /// Default stress convergence threshold in eV/Å³.
    pub threshold_stress: f64,
}

/// A named precision/cost preset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Protocol {
    pub description: String,
    #[serde(flatten)]
    pub parameters: ProtocolParameters,
}

#[derive(Debug, Deserialize)]
struct RegistryFile {
    default: String,
    protocols: BTreeMap<String, Protocol>,
}

/// Container for an engine's input generation protocols.
///
/// Construction validates the table the same way for every engine: it must be
/// non-empty, every protocol needs a description, and the default must be a member.
#[derive(Debug, Clone)]
pub struct ProtocolRegistry {
    protocols: BTreeMap<String, Protocol>,
    default: String,
}

impl ProtocolRegistry {
    pub fn new(
        protocols: BTreeMap<String, Protocol>,
        default: impl Into<String>,
    ) -> Result<Self, EngineError> {
        let default = default.into();
        if protocols.is_empty() {
            return Err(EngineError::Configuration(
                "protocol registry does not define any protocols".into(),
            ));
        }
        for (name, protocol) in &protocols {
            if protocol.description.trim().is_empty() {
                return Err(EngineError::Configuration(format!(
                    "protocol `{name}` does not define a description"
                )));
            }
        }
        if !protocols.contains_key(&default) {
            return Err(EngineError::Configuration(format!(
                "default protocol `{default}` is not a defined protocol"
            )));
        }
        Ok(Self { protocols, default })
    }

    /// Deserializes a registry from its TOML representation.
    pub fn from_toml(source: &str) -> Result<Self, EngineError> {
        let file: RegistryFile = toml::from_str(source)
            .map_err(|e| EngineError::Configuration(format!("invalid protocol table: {e}")))?;
        Self::new(file.protocols, file.default)
    }

    /// Whether the given protocol exists.
    pub fn is_valid_protocol(&self, name: &str) -> bool {
        self.protocols.contains_key(name)
    }

    /// The list of protocol names.
    pub fn get_protocol_names(&self) -> Vec<&str> {
        self.protocols.keys().map(String::as_str).collect()
    }

    /// The default protocol name.
    pub fn get_default_protocol_name(&self) -> &str {
        &self.default
    }

    /// The protocol corresponding to the given name.
    pub fn get_protocol(&self, name: &str) -> Result<&Protocol, EngineError> {
        self.protocols
            .get(name)
            .ok_or_else(|| EngineError::Configuration(format!("the protocol `{name}` does not exist")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn protocol(description: &str) -> Protocol {
        Protocol {
            description: description.into(),
            parameters: ProtocolParameters {
                kpoint_spacing: 0.2,
                cutoff_ev: 400.0,
                smearing_ev: 0.1,
                threshold_forces: 0.05,
                threshold_stress: 0.003,
            },
        }
    }

    #[test]
    fn default_must_be_a_member() {
        let mut protocols = BTreeMap::new();
        protocols.insert("fast".to_string(), protocol("quick and dirty"));
        let err = ProtocolRegistry::new(protocols, "moderate").unwrap_err();
        assert!(matches!(err, EngineError::Configuration(_)));
    }

    #[test]
    fn empty_table_is_rejected() {
        let err = ProtocolRegistry::new(BTreeMap::new(), "fast").unwrap_err();
        assert!(matches!(err, EngineError::Configuration(_)));
    }

    #[test]
    fn missing_description_is_rejected() {
        let mut protocols = BTreeMap::new();
        protocols.insert("fast".to_string(), protocol(" "));
        let err = ProtocolRegistry::new(protocols, "fast").unwrap_err();
        assert!(matches!(err, EngineError::Configuration(_)));
    }

    #[test]
    fn lookup_and_default() {
        let mut protocols = BTreeMap::new();
        protocols.insert("fast".to_string(), protocol("quick"));
        protocols.insert("moderate".to_string(), protocol("balanced"));
        let registry = ProtocolRegistry::new(protocols, "moderate").unwrap();

        assert!(registry.is_valid_protocol("fast"));
        assert!(!registry.is_valid_protocol("sloppy"));
        assert_eq!(registry.get_protocol_names(), ["fast", "moderate"]);
        assert!(
            registry
                .get_protocol_names()
                .contains(&registry.get_default_protocol_name())
        );
        assert!(registry.get_protocol("precise").is_err());
    }

    #[test]
    fn parses_from_toml() {
        let registry = ProtocolRegistry::from_toml(
            r#"
            default = "moderate"

            [protocols.moderate]
            description = "Balanced precision and cost."
            kpoint_spacing = 0.15
            cutoff_ev = 500.0
            smearing_ev = 0.1
            threshold_forces = 0.05
            threshold_stress = 0.003
            "#,
        )
        .unwrap();
        assert_eq!(registry.get_default_protocol_name(), "moderate");
        let protocol = registry.get_protocol("moderate").unwrap();
        assert_eq!(protocol.parameters.cutoff_ev, 500.0);
    }
}
