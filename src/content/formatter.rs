//! Rendering of classified payloads into document bodies
//!
//! `format_content` is a pure function and never fails: malformed fields are
//! coerced during classification, and anything that reached `Unclassified`
//! renders as a raw structured dump.

use super::classifier::{
    ApiOverview, ClassifiedContent, CodeDocumentation, ComponentAnalysis, DevelopmentGuide,
    MaintenanceOps, SystemOverview,
};
use serde_json::Value;

/// Render a classified payload into a human-readable document body
pub fn format_content(classified: &ClassifiedContent) -> String {
    match classified {
        ClassifiedContent::SystemOverview(overview) => format_system_overview(overview),
        ClassifiedContent::ComponentAnalysis(component) => format_component_analysis(component),
        ClassifiedContent::CodeDocumentation(docs) => format_code_documentation(docs),
        ClassifiedContent::DevelopmentGuide(guide) => format_development_guide(guide),
        ClassifiedContent::MaintenanceOps(ops) => format_maintenance_ops(ops),
        ClassifiedContent::ApiOverview(api) => format_api_overview(api),
        ClassifiedContent::Unclassified(raw) => format_raw_dump(raw),
    }
}

fn format_system_overview(overview: &SystemOverview) -> String {
    let mut doc = String::from("# System Overview\n");
    push_text_section(&mut doc, "Architecture Diagram", &overview.architecture_diagram);
    push_list_section(&mut doc, "Core Technologies", &overview.core_technologies);
    push_list_section(&mut doc, "Design Patterns", &overview.design_patterns);
    push_list_section(&mut doc, "System Requirements", &overview.system_requirements);
    push_text_section(
        &mut doc,
        "Project Structure",
        overview.project_structure.as_deref().unwrap_or(""),
    );
    doc
}

fn format_component_analysis(component: &ComponentAnalysis) -> String {
    let mut doc = format!("# Component: {}\n", component.component_name);
    push_text_section(&mut doc, "Description", &component.description);
    push_list_section(&mut doc, "Dependencies", &component.dependencies);
    doc
}

fn format_code_documentation(docs: &CodeDocumentation) -> String {
    let mut doc = String::from("# Code Documentation\n");
    for module in &docs.code_modules {
        doc.push_str(&format!("\n## Module: {}\n", module.name));
        if !module.description.is_empty() {
            doc.push_str(&format!("\n{}\n", module.description));
        }
        if !module.functions.is_empty() {
            doc.push('\n');
            for function in &module.functions {
                doc.push_str(&format!("- `{function}`\n"));
            }
        }
    }
    doc
}

fn format_development_guide(guide: &DevelopmentGuide) -> String {
    let mut doc = String::from("# Development Guide\n");
    push_list_section(&mut doc, "Prerequisites", &guide.prerequisites);
    push_text_section(&mut doc, "Setup Instructions", &guide.setup_instructions);
    push_text_section(&mut doc, "Workflow", &guide.workflow_documentation);
    doc
}

fn format_maintenance_ops(ops: &MaintenanceOps) -> String {
    let mut doc = String::from("# Maintenance & Operations\n");
    push_list_section(&mut doc, "Maintenance Procedures", &ops.maintenance_procedures);
    push_list_section(&mut doc, "Troubleshooting Guide", &ops.troubleshooting_guide);
    doc
}

fn format_api_overview(api: &ApiOverview) -> String {
    let mut doc = String::from("# API Overview\n");
    push_text_section(&mut doc, "Base URL", &api.base_url);
    push_list_section(&mut doc, "Authentication Methods", &api.authentication_methods);
    push_list_section(&mut doc, "Endpoints", &api.endpoints);
    doc
}

fn format_raw_dump(raw: &Value) -> String {
    let dump = serde_json::to_string_pretty(raw).unwrap_or_else(|_| raw.to_string());
    format!("# Result\n\n```json\n{dump}\n```\n")
}

fn push_text_section(doc: &mut String, title: &str, body: &str) {
    doc.push_str(&format!("\n## {title}\n"));
    if !body.is_empty() {
        doc.push_str(&format!("\n{body}\n"));
    }
}

fn push_list_section(doc: &mut String, title: &str, items: &[String]) {
    doc.push_str(&format!("\n## {title}\n"));
    if !items.is_empty() {
        doc.push('\n');
        for item in items {
            doc.push_str(&format!("- {item}\n"));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{classify, RawContent};
    use serde_json::json;

    #[test]
    fn test_system_overview_section_order() {
        let classified = classify(&RawContent::from_value(json!({
            "architecture_diagram": "A",
            "core_technologies": ["x"],
            "design_patterns": ["y"],
            "system_requirements": ["z"],
            "project_structure": "p"
        })));

        let doc = format_content(&classified);
        let headers = [
            "## Architecture Diagram",
            "## Core Technologies",
            "## Design Patterns",
            "## System Requirements",
            "## Project Structure",
        ];

        let mut last = 0;
        for header in headers {
            let pos = doc.find(header).unwrap_or_else(|| {
                panic!("missing header {header:?} in:\n{doc}");
            });
            assert!(pos > last, "header {header:?} out of order");
            last = pos;
        }
    }

    #[test]
    fn test_missing_requirements_renders_empty_section() {
        let classified = classify(&RawContent::from_value(json!({
            "architecture_diagram": "A",
            "core_technologies": ["x"],
            "design_patterns": ["y"]
        })));

        let doc = format_content(&classified);
        assert!(doc.contains("## System Requirements"));
    }

    #[test]
    fn test_format_is_idempotent() {
        let raw = RawContent::from_value(json!({
            "component_name": "scheduler",
            "description": "runs things",
            "dependencies": ["tokio"]
        }));

        let first = format_content(&classify(&raw));
        let second = format_content(&classify(&raw));
        assert_eq!(first, second);
    }

    #[test]
    fn test_unclassified_renders_raw_dump() {
        let classified = classify(&RawContent::from_value(json!({"surprise": [1, 2]})));
        let doc = format_content(&classified);
        assert!(doc.contains("```json"));
        assert!(doc.contains("surprise"));
    }

    #[test]
    fn test_maintenance_ops_sections() {
        let classified = classify(&RawContent::from_value(json!({
            "maintenance_procedures": ["rotate logs"],
            "troubleshooting_guide": "check the socket"
        })));

        let doc = format_content(&classified);
        assert!(doc.contains("## Maintenance Procedures"));
        assert!(doc.contains("- rotate logs"));
        // scalar coerced into a one-element list
        assert!(doc.contains("- check the socket"));
    }
}
