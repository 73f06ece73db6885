//! Structural dump and restore of an inference engine.
//!
//! An [`EngineDump`] carries everything needed to rebuild an equivalent
//! engine (variables with their CPTs, and the current evidence) plus the
//! compiled forest for inspection. Restoring recompiles from the variables;
//! the forest section is informational.

use crate::engine::errors::InferenceError;
use crate::engine::evidence::Evidence;
use crate::engine::inference::InferenceEngine;
use crate::model::network::{NetworkBuilder, NodeDefinition, ProbabilityTable};

/// Version and feature metadata recorded with a dump.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DumpMetadata {
    /// Crate version that produced the dump.
    pub version: String,
    /// Cargo features enabled when the dump was produced.
    pub features: Vec<String>,
}

/// One variable of a dumped network.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VariableDump {
    /// Variable name.
    pub name: String,
    /// Ordered levels.
    pub levels: Vec<String>,
    /// Parent names in CPT order.
    pub parents: Vec<String>,
    /// CPT over `[name, parents...]`, `name` least significant.
    pub cpt: Vec<f64>,
}

/// One clique of the dumped junction forest.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CliqueDump {
    /// Clique id.
    pub id: u32,
    /// Member variable names in domain order.
    pub variables: Vec<String>,
    /// Connected component the clique belongs to.
    pub component: usize,
}

/// One edge of the dumped junction forest.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EdgeDump {
    /// Lower clique id.
    pub a: u32,
    /// Higher clique id.
    pub b: u32,
    /// Separator variable names.
    pub separator: Vec<String>,
}

/// A structural dump of an [`InferenceEngine`].
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EngineDump {
    /// Version metadata.
    pub metadata: DumpMetadata,
    /// Variables in definition order.
    pub variables: Vec<VariableDump>,
    /// Cliques of the compiled forest.
    pub cliques: Vec<CliqueDump>,
    /// Edges of the compiled forest.
    pub edges: Vec<EdgeDump>,
    /// Evidence at dump time.
    pub evidence: Evidence,
}

impl EngineDump {
    /// Checks that the dump was produced by this crate version.
    pub fn validate_compatibility(&self) -> Result<(), InferenceError> {
        let current = env!("CARGO_PKG_VERSION");
        if self.metadata.version != current {
            return Err(InferenceError::Construction(format!(
                "dump was created with version {}, current version is {}",
                self.metadata.version, current
            )));
        }
        Ok(())
    }

    /// Pretty-printed JSON.
    #[cfg(feature = "serde")]
    pub fn to_json(&self) -> Result<String, InferenceError> {
        serde_json::to_string_pretty(self)
            .map_err(|e| InferenceError::Internal(format!("failed to serialize dump: {}", e)))
    }

    /// Parses a dump from JSON and checks its version.
    #[cfg(feature = "serde")]
    pub fn from_json(json: &str) -> Result<Self, InferenceError> {
        let dump: EngineDump = serde_json::from_str(json)
            .map_err(|e| InferenceError::Construction(format!("failed to parse dump: {}", e)))?;
        dump.validate_compatibility()?;
        Ok(dump)
    }
}

impl InferenceEngine {
    /// Structural dump of the network, forest and evidence.
    pub fn dump(&self) -> EngineDump {
        let network = self.network();
        let name = |id: &crate::model::network::VarId| network.variable(*id).name.clone();

        let variables = network
            .variables()
            .iter()
            .map(|v| VariableDump {
                name: v.name.clone(),
                levels: v.levels.clone(),
                parents: v.parents.iter().map(name).collect(),
                cpt: v.cpt.clone(),
            })
            .collect();

        let forest = self.junction_forest();
        let cliques = forest
            .cliques()
            .iter()
            .map(|c| CliqueDump {
                id: c.id.0,
                variables: c.domain.vars().iter().map(name).collect(),
                component: c.component,
            })
            .collect();
        let edges = forest
            .edges()
            .into_iter()
            .map(|(a, b, separator)| EdgeDump {
                a: a.0,
                b: b.0,
                separator: forest
                    .separator(separator)
                    .domain
                    .vars()
                    .iter()
                    .map(name)
                    .collect(),
            })
            .collect();

        EngineDump {
            metadata: DumpMetadata {
                version: env!("CARGO_PKG_VERSION").to_string(),
                features: enabled_features(),
            },
            variables,
            cliques,
            edges,
            evidence: self.evidence(),
        }
    }

    /// Rebuilds an engine from a dump, recompiling the forest and reapplying
    /// the evidence. Uses the default configuration.
    pub fn restore(dump: &EngineDump) -> Result<Self, InferenceError> {
        dump.validate_compatibility()?;
        let mut builder = NetworkBuilder::new();
        for variable in &dump.variables {
            builder.add_node(
                variable.name.clone(),
                NodeDefinition::new(
                    variable.levels.iter().cloned(),
                    variable.parents.iter().cloned(),
                    ProbabilityTable::Potential(variable.cpt.clone()),
                ),
            );
        }
        let mut engine = InferenceEngine::new(builder.build()?)?;
        engine.set_evidence(&dump.evidence)?;

        #[cfg(feature = "tracing")]
        tracing::debug!(variables = dump.variables.len(), "engine restored from dump");

        Ok(engine)
    }
}

fn enabled_features() -> Vec<String> {
    #[allow(unused_mut)]
    let mut features = Vec::new();
    #[cfg(feature = "rayon")]
    features.push("rayon".to_string());
    #[cfg(feature = "serde")]
    features.push("serde".to_string());
    #[cfg(feature = "tracing")]
    features.push("tracing".to_string());
    features
}
