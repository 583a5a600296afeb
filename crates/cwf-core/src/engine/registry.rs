use super::driver::RelaxDriver;
use super::engines::castep::CastepGenerator;
use super::engines::lennard_jones::{LennardJonesDriver, LennardJonesGenerator};
use super::engines::quantum_espresso::QuantumEspressoGenerator;
use super::error::EngineError;
use super::generator::InputGenerator;
use std::collections::BTreeMap;

/// A short machine-readable description of one registered engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineSchema {
    pub name: &'static str,
    pub description: &'static str,
    /// Whether the engine can execute in-process, or only generate submissions.
    pub executable: bool,
}

struct EngineEntry {
    description: &'static str,
    generator: fn() -> Box<dyn InputGenerator>,
    driver: Option<fn() -> Box<dyn RelaxDriver>>,
}

/// The static mapping from engine identifiers to their constructors.
///
/// Populated once at startup; a lookup miss is an [`EngineError::UnknownEngine`],
/// deliberately distinct from a registered engine lacking a capability.
pub struct EngineRegistry {
    entries: BTreeMap<&'static str, EngineEntry>,
}

impl EngineRegistry {
    /// A registry containing every built-in engine.
    pub fn with_builtin() -> Self {
        let mut entries = BTreeMap::new();
        entries.insert(
            "quantum_espresso",
            EngineEntry {
                description: "Quantum ESPRESSO pw.x plane-wave DFT relaxations",
                generator: || Box::new(QuantumEspressoGenerator),
                driver: None,
            },
        );
        entries.insert(
            "castep",
            EngineEntry {
                description: "CASTEP plane-wave DFT geometry optimizations",
                generator: || Box::new(CastepGenerator),
                driver: None,
            },
        );
        entries.insert(
            "lennard_jones",
            EngineEntry {
                description: "In-process Lennard-Jones toy engine",
                generator: || Box::new(LennardJonesGenerator),
                driver: Some(|| Box::new(LennardJonesDriver)),
            },
        );
        Self { entries }
    }

    /// The identifiers of every registered engine.
    pub fn engine_names(&self) -> Vec<&'static str> {
        self.entries.keys().copied().collect()
    }

    pub fn schema(&self, name: &str) -> Result<EngineSchema, EngineError> {
        let (key, entry) = self
            .entries
            .get_key_value(name)
            .ok_or_else(|| EngineError::UnknownEngine(name.to_string()))?;
        Ok(EngineSchema {
            name: key,
            description: entry.description,
            executable: entry.driver.is_some(),
        })
    }

    /// The input generator for the named engine.
    pub fn generator(&self, name: &str) -> Result<Box<dyn InputGenerator>, EngineError> {
        self.entries
            .get(name)
            .map(|entry| (entry.generator)())
            .ok_or_else(|| EngineError::UnknownEngine(name.to_string()))
    }

    /// The in-process driver for the named engine, or `None` when the engine only
    /// generates submissions for external execution.
    pub fn driver(&self, name: &str) -> Result<Option<Box<dyn RelaxDriver>>, EngineError> {
        self.entries
            .get(name)
            .map(|entry| entry.driver.map(|driver| driver()))
            .ok_or_else(|| EngineError::UnknownEngine(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::types::RelaxType;

    #[test]
    fn builtin_engines_are_registered() {
        let registry = EngineRegistry::with_builtin();
        assert_eq!(
            registry.engine_names(),
            ["castep", "lennard_jones", "quantum_espresso"]
        );
    }

    #[test]
    fn lookup_miss_is_an_unknown_engine_error() {
        let registry = EngineRegistry::with_builtin();
        assert!(matches!(
            registry.generator("siesta"),
            Err(EngineError::UnknownEngine(_))
        ));
        assert!(matches!(
            registry.schema("siesta"),
            Err(EngineError::UnknownEngine(_))
        ));
    }

    #[test]
    fn every_engine_supports_the_mandatory_relax_types() {
        let registry = EngineRegistry::with_builtin();
        for name in registry.engine_names() {
            let generator = registry.generator(name).unwrap();
            assert!(generator.relax_types().contains(&RelaxType::None));
            assert!(generator.relax_types().contains(&RelaxType::Positions));
        }
    }

    #[test]
    fn every_protocol_resolves_and_the_default_is_a_member() {
        let registry = EngineRegistry::with_builtin();
        for name in registry.engine_names() {
            let generator = registry.generator(name).unwrap();
            let protocols = generator.protocols();
            assert!(
                protocols
                    .get_protocol_names()
                    .contains(&protocols.get_default_protocol_name())
            );
            for protocol in protocols.get_protocol_names() {
                assert!(!protocols.get_protocol(protocol).unwrap().description.is_empty());
            }
        }
    }

    #[test]
    fn only_the_toy_engine_is_executable() {
        let registry = EngineRegistry::with_builtin();
        assert!(registry.schema("lennard_jones").unwrap().executable);
        assert!(!registry.schema("quantum_espresso").unwrap().executable);
        assert!(registry.driver("castep").unwrap().is_none());
        assert!(registry.driver("lennard_jones").unwrap().is_some());
    }
}
