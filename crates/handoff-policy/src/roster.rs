//! TOML-driven agent roster.
//!
//! `RosterLoader` turns a `RosterConfig` into a set of immutable, `Arc`-shared
//! agents.
//!
//! Build algorithm:
//!
//! 1. Index shapes, guardrails and agents by name; empty and duplicate
//!    names are rejected.
//! 2. For each agent in declaration order, build it depth-first: its
//!    delegates first, then the policy agents of its guardrails.
//! 3. A name that reappears on the current build path is a cycle and fails
//!    with `DelegationCycle`; unknown names fail with `ConfigError`.
//!
//! Every error surfaces here, at setup. A roster that loads cannot fail a
//! run for configuration reasons.

use std::{collections::HashMap, path::Path, sync::Arc};

use tracing::{debug, info};

use handoff_contracts::{
    error::{TriageError, TriageResult},
    shape::OutputShape,
};
use handoff_core::{Agent, InputGuardrail};

use crate::{
    check::PolicyCheckGuardrail,
    config::{AgentSpec, GuardrailKind, GuardrailSpec, RosterConfig, ShapeSpec},
};

/// Builds rosters, resolving `custom` guardrails from a host registry.
///
/// ```rust,ignore
/// use handoff_policy::RosterLoader;
///
/// let mut loader = RosterLoader::new();
/// loader.register_guardrail("profanity", Arc::new(ProfanityGuardrail));
/// let roster = loader.load_file(Path::new("roster/tutor.toml"))?;
/// ```
#[derive(Default)]
pub struct RosterLoader {
    custom: HashMap<String, Arc<dyn InputGuardrail>>,
}

impl RosterLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a guardrail that `kind = "custom"` entries refer to by `name`.
    ///
    /// Registering the same name twice replaces the previous guardrail.
    pub fn register_guardrail(&mut self, name: impl Into<String>, guardrail: Arc<dyn InputGuardrail>) {
        self.custom.insert(name.into(), guardrail);
    }

    /// Parse `s` as TOML and build the roster.
    ///
    /// Returns `TriageError::ConfigError` if the TOML is malformed or does
    /// not match `RosterConfig`.
    pub fn load_str(&self, s: &str) -> TriageResult<AgentRoster> {
        let config: RosterConfig = toml::from_str(s).map_err(|e| TriageError::ConfigError {
            reason: format!("failed to parse roster TOML: {}", e),
        })?;
        self.build(&config)
    }

    /// Read the file at `path` and build the roster from it.
    pub fn load_file(&self, path: &Path) -> TriageResult<AgentRoster> {
        let contents = std::fs::read_to_string(path).map_err(|e| TriageError::ConfigError {
            reason: format!("failed to read roster file '{}': {}", path.display(), e),
        })?;
        self.load_str(&contents)
    }

    /// Build the roster from an already parsed configuration.
    pub fn build(&self, config: &RosterConfig) -> TriageResult<AgentRoster> {
        let mut build = RosterBuild {
            loader: self,
            shapes: index(&config.shapes, |s| &s.id, "shape")?,
            guardrails: index(&config.guardrails, |g| &g.name, "guardrail")?,
            specs: index(&config.agents, |a| &a.name, "agent")?,
            built: HashMap::new(),
            built_guardrails: HashMap::new(),
            path: Vec::new(),
        };

        let agents = config
            .agents
            .iter()
            .map(|spec| build.agent(&spec.name))
            .collect::<TriageResult<Vec<_>>>()?;

        info!(
            agents = agents.len(),
            guardrails = build.built_guardrails.len(),
            "roster loaded"
        );
        Ok(AgentRoster { agents })
    }
}

/// Index `items` by key, rejecting empty and duplicate keys.
fn index<'c, T>(
    items: &'c [T],
    key: impl Fn(&'c T) -> &'c String,
    kind: &str,
) -> TriageResult<HashMap<&'c str, &'c T>> {
    let mut map = HashMap::with_capacity(items.len());
    for item in items {
        let name = key(item).as_str();
        if name.trim().is_empty() {
            return Err(TriageError::ConfigError {
                reason: format!("{kind} name must not be empty"),
            });
        }
        if map.insert(name, item).is_some() {
            return Err(TriageError::ConfigError {
                reason: format!("duplicate {kind} '{name}'"),
            });
        }
    }
    Ok(map)
}

/// Transient state for one depth-first roster build.
struct RosterBuild<'c> {
    loader: &'c RosterLoader,
    shapes: HashMap<&'c str, &'c ShapeSpec>,
    guardrails: HashMap<&'c str, &'c GuardrailSpec>,
    specs: HashMap<&'c str, &'c AgentSpec>,
    built: HashMap<String, Arc<Agent>>,
    built_guardrails: HashMap<String, Arc<dyn InputGuardrail>>,
    /// Agent names currently being built, outermost first.
    path: Vec<String>,
}

impl RosterBuild<'_> {
    fn agent(&mut self, name: &str) -> TriageResult<Arc<Agent>> {
        if let Some(agent) = self.built.get(name) {
            return Ok(Arc::clone(agent));
        }

        if let Some(start) = self.path.iter().position(|n| n == name) {
            let mut cycle = self.path[start..].to_vec();
            cycle.push(name.to_string());
            return Err(TriageError::DelegationCycle { path: cycle });
        }

        let spec = *self.specs.get(name).ok_or_else(|| TriageError::ConfigError {
            reason: match self.path.last() {
                Some(parent) => format!("agent '{parent}' refers to unknown agent '{name}'"),
                None => format!("unknown agent '{name}'"),
            },
        })?;

        self.path.push(name.to_string());

        let mut builder = Agent::builder(&spec.name, &spec.instructions)
            .output_shape(self.shape(spec)?);
        if let Some(description) = &spec.handoff_description {
            builder = builder.handoff_description(description);
        }
        for delegate in &spec.delegates {
            builder = builder.delegate(self.agent(delegate)?);
        }
        for guardrail in &spec.guardrails {
            builder = builder.guardrail(self.guardrail(&spec.name, guardrail)?);
        }

        self.path.pop();

        let agent = Arc::new(builder.build());
        debug!(agent = %agent, "roster agent built");
        self.built.insert(name.to_string(), Arc::clone(&agent));
        Ok(agent)
    }

    fn shape(&self, spec: &AgentSpec) -> TriageResult<OutputShape> {
        let Some(id) = &spec.output else {
            return Ok(OutputShape::Text);
        };
        let shape = self.shapes.get(id.as_str()).ok_or_else(|| TriageError::ConfigError {
            reason: format!("agent '{}' declares unknown shape '{id}'", spec.name),
        })?;
        Ok(OutputShape::structured(&shape.id, shape.json_schema.clone()))
    }

    fn guardrail(&mut self, owner: &str, name: &str) -> TriageResult<Arc<dyn InputGuardrail>> {
        if let Some(guardrail) = self.built_guardrails.get(name) {
            return Ok(Arc::clone(guardrail));
        }

        let spec = *self.guardrails.get(name).ok_or_else(|| TriageError::ConfigError {
            reason: format!("agent '{owner}' refers to unknown guardrail '{name}'"),
        })?;

        let guardrail: Arc<dyn InputGuardrail> = match spec.kind {
            GuardrailKind::Custom => {
                self.loader
                    .custom
                    .get(name)
                    .cloned()
                    .ok_or_else(|| TriageError::ConfigError {
                        reason: format!("no custom guardrail registered for '{name}'"),
                    })?
            }
            GuardrailKind::PolicyCheck => {
                let (Some(policy_agent), Some(allow_field)) = (&spec.policy_agent, &spec.allow_field)
                else {
                    return Err(TriageError::ConfigError {
                        reason: format!(
                            "policy-check guardrail '{name}' needs both policy_agent and allow_field"
                        ),
                    });
                };
                let policy = self.agent(policy_agent)?;
                Arc::new(PolicyCheckGuardrail::new(name, policy, allow_field.as_str()))
            }
        };

        self.built_guardrails
            .insert(name.to_string(), Arc::clone(&guardrail));
        Ok(guardrail)
    }
}

/// A loaded set of agents, kept in declaration order.
#[derive(Debug, Clone)]
pub struct AgentRoster {
    agents: Vec<Arc<Agent>>,
}

impl AgentRoster {
    /// Load a roster that uses no `custom` guardrails.
    pub fn from_toml_str(s: &str) -> TriageResult<Self> {
        RosterLoader::new().load_str(s)
    }

    /// Load a roster file that uses no `custom` guardrails.
    pub fn from_file(path: &Path) -> TriageResult<Self> {
        RosterLoader::new().load_file(path)
    }

    pub fn get(&self, name: &str) -> Option<&Arc<Agent>> {
        self.agents.iter().find(|agent| agent.name() == name)
    }

    /// Look up an agent, failing with `ConfigError` when it is absent.
    pub fn agent(&self, name: &str) -> TriageResult<Arc<Agent>> {
        self.get(name)
            .cloned()
            .ok_or_else(|| TriageError::ConfigError {
                reason: format!("roster has no agent named '{name}'"),
            })
    }

    pub fn agents(&self) -> impl Iterator<Item = &Arc<Agent>> {
        self.agents.iter()
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }
}
