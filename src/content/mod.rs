//! Content classification and formatting
//!
//! Step results arrive as arbitrary structured payloads. This module
//! normalizes them ([`RawContent`]), classifies them into one of the fixed
//! result variants ([`classifier`]), and renders a classified payload into a
//! human-readable document body ([`formatter`]).

pub mod classifier;
pub mod formatter;
pub mod raw;

pub use classifier::{classify, ClassifiedContent};
pub use formatter::format_content;
pub use raw::RawContent;

use serde::{Deserialize, Serialize};

/// The fixed set of result variants a step may produce
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentVariant {
    SystemOverview,
    ComponentAnalysis,
    CodeDocumentation,
    DevelopmentGuide,
    MaintenanceOps,
    ApiOverview,
    Unclassified,
}

impl ContentVariant {
    /// Variant name in its canonical form
    pub fn name(&self) -> &'static str {
        match self {
            ContentVariant::SystemOverview => "SystemOverview",
            ContentVariant::ComponentAnalysis => "ComponentAnalysis",
            ContentVariant::CodeDocumentation => "CodeDocumentation",
            ContentVariant::DevelopmentGuide => "DevelopmentGuide",
            ContentVariant::MaintenanceOps => "MaintenanceOps",
            ContentVariant::ApiOverview => "ApiOverview",
            ContentVariant::Unclassified => "Unclassified",
        }
    }

    /// Key under which a step's result is stored in the accumulated context
    /// (the lower-cased variant name)
    pub fn context_key(&self) -> &'static str {
        match self {
            ContentVariant::SystemOverview => "systemoverview",
            ContentVariant::ComponentAnalysis => "componentanalysis",
            ContentVariant::CodeDocumentation => "codedocumentation",
            ContentVariant::DevelopmentGuide => "developmentguide",
            ContentVariant::MaintenanceOps => "maintenanceops",
            ContentVariant::ApiOverview => "apioverview",
            ContentVariant::Unclassified => "unclassified",
        }
    }
}

impl std::fmt::Display for ContentVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
