//! Structural content classification
//!
//! Classification is field-presence based and evaluated in a fixed priority
//! order so that payloads satisfying several rules resolve deterministically:
//!
//! 1. `architecture_diagram` + `core_technologies` + `design_patterns` → SystemOverview
//! 2. `code_module` → CodeDocumentation
//! 3. `authentication_methods` + `base_url` → ApiOverview
//! 4. `component_name` + `description` → ComponentAnalysis
//! 5. `workflow_documentation` + `setup_instructions` → DevelopmentGuide
//! 6. `maintenance_procedures` + `troubleshooting_guide` → MaintenanceOps
//! 7. anything else → Unclassified
//!
//! Reordering these rules changes behavior for overlapping payloads; the
//! order is part of the contract. Field extraction is lenient: scalars where
//! a list is expected coerce to one-element lists, and missing optional
//! fields default to empty.

use super::raw::RawContent;
use super::ContentVariant;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A step payload classified into one of the fixed result variants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ClassifiedContent {
    SystemOverview(SystemOverview),
    ComponentAnalysis(ComponentAnalysis),
    CodeDocumentation(CodeDocumentation),
    DevelopmentGuide(DevelopmentGuide),
    MaintenanceOps(MaintenanceOps),
    ApiOverview(ApiOverview),
    /// Payload matched no known variant; rendered as a raw structured dump
    Unclassified(Value),
}

impl ClassifiedContent {
    pub fn variant(&self) -> ContentVariant {
        match self {
            ClassifiedContent::SystemOverview(_) => ContentVariant::SystemOverview,
            ClassifiedContent::ComponentAnalysis(_) => ContentVariant::ComponentAnalysis,
            ClassifiedContent::CodeDocumentation(_) => ContentVariant::CodeDocumentation,
            ClassifiedContent::DevelopmentGuide(_) => ContentVariant::DevelopmentGuide,
            ClassifiedContent::MaintenanceOps(_) => ContentVariant::MaintenanceOps,
            ClassifiedContent::ApiOverview(_) => ContentVariant::ApiOverview,
            ClassifiedContent::Unclassified(_) => ContentVariant::Unclassified,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SystemOverview {
    pub architecture_diagram: String,
    pub core_technologies: Vec<String>,
    pub design_patterns: Vec<String>,
    /// Tolerated as missing; defaults to empty
    pub system_requirements: Vec<String>,
    pub project_structure: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ComponentAnalysis {
    pub component_name: String,
    pub description: String,
    /// Tolerated as missing; defaults to empty
    pub dependencies: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CodeModule {
    pub name: String,
    pub description: String,
    pub functions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CodeDocumentation {
    pub code_modules: Vec<CodeModule>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DevelopmentGuide {
    pub workflow_documentation: String,
    pub setup_instructions: String,
    pub prerequisites: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MaintenanceOps {
    pub maintenance_procedures: Vec<String>,
    pub troubleshooting_guide: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ApiOverview {
    pub base_url: String,
    pub authentication_methods: Vec<String>,
    pub endpoints: Vec<String>,
}

/// Classify a normalized payload into exactly one variant
///
/// Total and deterministic: any input yields exactly one variant, with
/// non-object payloads falling straight through to `Unclassified`.
pub fn classify(raw: &RawContent) -> ClassifiedContent {
    let Some(obj) = raw.value().as_object() else {
        return ClassifiedContent::Unclassified(raw.value().clone());
    };

    if has_all(obj, &["architecture_diagram", "core_technologies", "design_patterns"]) {
        return ClassifiedContent::SystemOverview(SystemOverview {
            architecture_diagram: string_field(obj, "architecture_diagram"),
            core_technologies: list_field(obj, "core_technologies"),
            design_patterns: list_field(obj, "design_patterns"),
            system_requirements: list_field(obj, "system_requirements"),
            project_structure: optional_string_field(obj, "project_structure"),
        });
    }

    if obj.contains_key("code_module") {
        return ClassifiedContent::CodeDocumentation(CodeDocumentation {
            code_modules: module_list_field(obj, "code_module"),
        });
    }

    if has_all(obj, &["authentication_methods", "base_url"]) {
        return ClassifiedContent::ApiOverview(ApiOverview {
            base_url: string_field(obj, "base_url"),
            authentication_methods: list_field(obj, "authentication_methods"),
            endpoints: list_field(obj, "endpoints"),
        });
    }

    if has_all(obj, &["component_name", "description"]) {
        return ClassifiedContent::ComponentAnalysis(ComponentAnalysis {
            component_name: string_field(obj, "component_name"),
            description: string_field(obj, "description"),
            dependencies: list_field(obj, "dependencies"),
        });
    }

    if has_all(obj, &["workflow_documentation", "setup_instructions"]) {
        return ClassifiedContent::DevelopmentGuide(DevelopmentGuide {
            workflow_documentation: string_field(obj, "workflow_documentation"),
            setup_instructions: string_field(obj, "setup_instructions"),
            prerequisites: list_field(obj, "prerequisites"),
        });
    }

    if has_all(obj, &["maintenance_procedures", "troubleshooting_guide"]) {
        return ClassifiedContent::MaintenanceOps(MaintenanceOps {
            maintenance_procedures: list_field(obj, "maintenance_procedures"),
            troubleshooting_guide: list_field(obj, "troubleshooting_guide"),
        });
    }

    ClassifiedContent::Unclassified(raw.value().clone())
}

fn has_all(obj: &Map<String, Value>, fields: &[&str]) -> bool {
    fields.iter().all(|f| obj.contains_key(*f))
}

/// Render any scalar or structured value as display text
fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn string_field(obj: &Map<String, Value>, field: &str) -> String {
    obj.get(field).map(value_to_string).unwrap_or_default()
}

fn optional_string_field(obj: &Map<String, Value>, field: &str) -> Option<String> {
    match obj.get(field) {
        None | Some(Value::Null) => None,
        Some(value) => Some(value_to_string(value)),
    }
}

/// Extract a string list, coercing a single scalar into a one-element list
fn list_field(obj: &Map<String, Value>, field: &str) -> Vec<String> {
    match obj.get(field) {
        None | Some(Value::Null) => vec![],
        Some(Value::Array(items)) => items.iter().map(value_to_string).collect(),
        Some(single) => vec![value_to_string(single)],
    }
}

fn module_list_field(obj: &Map<String, Value>, field: &str) -> Vec<CodeModule> {
    match obj.get(field) {
        None | Some(Value::Null) => vec![],
        Some(Value::Array(items)) => items.iter().map(code_module_from).collect(),
        Some(single) => vec![code_module_from(single)],
    }
}

fn code_module_from(value: &Value) -> CodeModule {
    match value.as_object() {
        Some(obj) => CodeModule {
            name: string_field(obj, "name"),
            description: string_field(obj, "description"),
            functions: list_field(obj, "functions"),
        },
        None => CodeModule {
            name: value_to_string(value),
            ..Default::default()
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn classify_value(value: Value) -> ClassifiedContent {
        classify(&RawContent::from_value(value))
    }

    #[test]
    fn test_system_overview_full_payload() {
        let classified = classify_value(json!({
            "architecture_diagram": "A",
            "core_technologies": ["x"],
            "design_patterns": ["y"],
            "system_requirements": ["z"],
            "project_structure": "p"
        }));

        let ClassifiedContent::SystemOverview(overview) = classified else {
            panic!("expected SystemOverview");
        };
        assert_eq!(overview.architecture_diagram, "A");
        assert_eq!(overview.core_technologies, vec!["x"]);
        assert_eq!(overview.project_structure.as_deref(), Some("p"));
    }

    #[test]
    fn test_system_overview_missing_requirements_defaults_empty() {
        let classified = classify_value(json!({
            "architecture_diagram": "A",
            "core_technologies": ["x"],
            "design_patterns": ["y"]
        }));

        assert_eq!(classified.variant(), ContentVariant::SystemOverview);
        let ClassifiedContent::SystemOverview(overview) = classified else {
            panic!("expected SystemOverview");
        };
        assert!(overview.system_requirements.is_empty());
    }

    #[test]
    fn test_code_documentation_single_module_coerced_to_list() {
        let classified = classify_value(json!({
            "code_module": {"name": "parser", "description": "parses", "functions": ["parse"]}
        }));

        let ClassifiedContent::CodeDocumentation(docs) = classified else {
            panic!("expected CodeDocumentation");
        };
        assert_eq!(docs.code_modules.len(), 1);
        assert_eq!(docs.code_modules[0].name, "parser");
    }

    #[test]
    fn test_api_overview_classification() {
        let classified = classify_value(json!({
            "base_url": "https://api.example.com",
            "authentication_methods": ["bearer"],
            "endpoints": ["/v1/docs"]
        }));

        assert_eq!(classified.variant(), ContentVariant::ApiOverview);
    }

    #[test]
    fn test_component_analysis_missing_dependencies_defaults_empty() {
        let classified = classify_value(json!({
            "component_name": "scheduler",
            "description": "runs things"
        }));

        let ClassifiedContent::ComponentAnalysis(component) = classified else {
            panic!("expected ComponentAnalysis");
        };
        assert!(component.dependencies.is_empty());
    }

    #[test]
    fn test_priority_component_beats_maintenance() {
        // Satisfies both rule 4 and rule 6; first match wins
        let classified = classify_value(json!({
            "component_name": "scheduler",
            "description": "runs things",
            "maintenance_procedures": ["restart"],
            "troubleshooting_guide": ["check logs"]
        }));

        assert_eq!(classified.variant(), ContentVariant::ComponentAnalysis);
    }

    #[test]
    fn test_priority_system_overview_beats_code_documentation() {
        let classified = classify_value(json!({
            "architecture_diagram": "A",
            "core_technologies": ["x"],
            "design_patterns": ["y"],
            "code_module": {"name": "m"}
        }));

        assert_eq!(classified.variant(), ContentVariant::SystemOverview);
    }

    #[test]
    fn test_scalar_coerced_into_one_element_list() {
        let classified = classify_value(json!({
            "architecture_diagram": "A",
            "core_technologies": "just-one",
            "design_patterns": ["y"]
        }));

        let ClassifiedContent::SystemOverview(overview) = classified else {
            panic!("expected SystemOverview");
        };
        assert_eq!(overview.core_technologies, vec!["just-one"]);
    }

    #[test]
    fn test_non_object_payload_is_unclassified() {
        assert_eq!(
            classify_value(json!([1, 2, 3])).variant(),
            ContentVariant::Unclassified
        );
        assert_eq!(
            classify_value(json!("plain text")).variant(),
            ContentVariant::Unclassified
        );
        assert_eq!(
            classify_value(Value::Null).variant(),
            ContentVariant::Unclassified
        );
    }

    #[test]
    fn test_unknown_object_is_unclassified_with_raw_payload() {
        let payload = json!({"unexpected": true});
        let ClassifiedContent::Unclassified(raw) = classify_value(payload.clone()) else {
            panic!("expected Unclassified");
        };
        assert_eq!(raw, payload);
    }

    #[test]
    fn test_json_in_string_payload_classifies() {
        let serialized = json!({
            "workflow_documentation": "w",
            "setup_instructions": "s"
        })
        .to_string();

        let classified = classify_value(Value::String(serialized));
        assert_eq!(classified.variant(), ContentVariant::DevelopmentGuide);
    }
}
