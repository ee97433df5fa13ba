//! Strategy catalog
//!
//! A strategy is a named, ordered list of step definitions; each step
//! carries a prompt, a model, and the result variant it is expected to
//! produce. Step identity is its `id` within the strategy, and the step's
//! position in the list is its execution order.

use crate::content::ContentVariant;
use serde::{Deserialize, Serialize};

/// One ordinal stage of a strategy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepDefinition {
    pub id: usize,
    pub title: String,
    pub prompt: String,
    pub model_name: String,
    pub expected_variant: ContentVariant,
}

/// A named, ordered list of steps defining one complete generation pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Strategy {
    pub name: String,
    pub description: String,
    pub steps: Vec<StepDefinition>,
}

impl Strategy {
    pub fn step_count(&self) -> usize {
        self.steps.len()
    }
}

/// Supplier of named strategies
pub trait StrategyCatalog: Send + Sync {
    fn list_strategies(&self) -> Vec<&Strategy>;
    fn get_strategy(&self, name: &str) -> Option<&Strategy>;
}

/// The built-in catalog shipped with docweave
pub struct BuiltinCatalog {
    strategies: Vec<Strategy>,
}

impl BuiltinCatalog {
    pub fn new() -> Self {
        Self {
            strategies: vec![comprehensive_strategy(), api_first_strategy()],
        }
    }
}

impl Default for BuiltinCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl StrategyCatalog for BuiltinCatalog {
    fn list_strategies(&self) -> Vec<&Strategy> {
        self.strategies.iter().collect()
    }

    fn get_strategy(&self, name: &str) -> Option<&Strategy> {
        self.strategies.iter().find(|s| s.name == name)
    }
}

const DEFAULT_MODEL: &str = "gpt-4o";

fn step(
    id: usize,
    title: &str,
    prompt: &str,
    expected_variant: ContentVariant,
) -> StepDefinition {
    StepDefinition {
        id,
        title: title.to_string(),
        prompt: prompt.to_string(),
        model_name: DEFAULT_MODEL.to_string(),
        expected_variant,
    }
}

/// The five-step full documentation pipeline
fn comprehensive_strategy() -> Strategy {
    Strategy {
        name: "comprehensive".to_string(),
        description: "Full documentation: overview, components, code, workflow, operations"
            .to_string(),
        steps: vec![
            step(
                1,
                "System Overview",
                "Analyze the repository and produce a system overview: architecture diagram, \
                 core technologies, design patterns, system requirements, project structure. \
                 Report the result through the final_result tool.",
                ContentVariant::SystemOverview,
            ),
            step(
                2,
                "Component Analysis",
                "Using the system overview in the context, analyze the most important \
                 component: its name, responsibilities, and dependencies. Report the result \
                 through the final_result tool.",
                ContentVariant::ComponentAnalysis,
            ),
            step(
                3,
                "Code Documentation",
                "Document the key code modules identified so far: per-module name, \
                 description, and notable functions. Report the result through the \
                 final_result tool.",
                ContentVariant::CodeDocumentation,
            ),
            step(
                4,
                "Development Guide",
                "Write a development guide: prerequisites, setup instructions, and the \
                 day-to-day workflow. Report the result through the final_result tool.",
                ContentVariant::DevelopmentGuide,
            ),
            step(
                5,
                "Maintenance Ops",
                "Produce maintenance procedures and a troubleshooting guide for operators. \
                 Report the result through the final_result tool.",
                ContentVariant::MaintenanceOps,
            ),
        ],
    }
}

/// Two-step pipeline for API-centric services
fn api_first_strategy() -> Strategy {
    Strategy {
        name: "api-first".to_string(),
        description: "API surface first, then a development guide".to_string(),
        steps: vec![
            step(
                1,
                "API Overview",
                "Describe the service's API surface: base URL, authentication methods, and \
                 endpoints. Report the result through the final_result tool.",
                ContentVariant::ApiOverview,
            ),
            step(
                2,
                "Development Guide",
                "Using the API overview in the context, write setup instructions and \
                 workflow documentation for integrators. Report the result through the \
                 final_result tool.",
                ContentVariant::DevelopmentGuide,
            ),
        ],
    }
}
