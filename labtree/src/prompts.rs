//! Prompt glue for the expansion oracle.
//!
//! Plain string builders; no templating engine. The JSON shape is spelled
//! out in the prompts because Chat Completions json-object mode enforces
//! syntax, not schema.

use crate::tree::EquipmentNode;

/// Role instruction sent as the system message on every oracle call.
pub const SYSTEM_INSTRUCTION: &str = "\
You are an expert Lab Automation Engineer.
Your goal is to help users design automated laboratory setups.
You understand dependencies (Required) and optional add-ons (Compatible).
Structure your output strictly as requested.";

/// Prompt for the one-shot initial analysis: root node plus immediate children.
pub fn initial_prompt(problem: &str) -> String {
    format!(
        r#"The user wants to build an automation lab for this problem: "{problem}".

Create a root node for the main goal, and then suggest 4-7 immediate children nodes.

Rules:
1. Identify 'REQUIRED' nodes (absolute dependencies, physical arms, main inputs).
2. Identify 'COMPATIBLE' nodes (optional modules, enhancements, or software).
3. Ensure a mix of hardware (robots, benches) and logic (software, controllers).
4. For every child node, provide realistic 'specs' (e.g., Vendor, Model) if applicable.
5. Keep descriptions concise (max 20 words).
6. Keep spec values short (max 5 words).

Return a JSON object representing the root node, shaped like:
{{"name": "...", "type": "ROOT", "description": "...", "specs": {{}},
 "children": [{{"name": "...", "type": "REQUIRED" or "COMPATIBLE", "description": "...", "specs": {{}}}}]}}"#
    )
}

/// Prompt for expanding one node, with the whole tree's names as
/// duplicate-avoidance context. The context grows linearly with tree size
/// per call; that is the deliberate duplicate-suppression mechanism.
pub fn expand_prompt(node: &EquipmentNode, known_names: &[String]) -> String {
    let existing = serde_json::to_string(known_names).unwrap_or_default();
    format!(
        r#"The user has selected the component: "{name}" (Type: {kind:?}) in a lab automation workflow.
Description: {description}.

Context: The lab ALREADY contains the following items: {existing}.

Task: Suggest 3-6 NEW sub-components, dependencies, or next steps.

Rules:
1. **CRITICAL**: DO NOT suggest items that are exactly matched in the existing items list.
2. 'REQUIRED': What *must* be connected next? (e.g., 'Power Supply', 'Controller').
3. 'COMPATIBLE': What *can* be connected?
4. If the component is a leaf node, return an empty array.
5. INCLUDE SPECS (Vendor, Model) for every suggestion.
6. Keep descriptions concise (max 20 words).
7. Keep spec values short.

Return a JSON object with a single key "children" holding the array of new child nodes:
{{"children": [{{"name": "...", "type": "REQUIRED" or "COMPATIBLE", "description": "...", "specs": {{}}}}]}}"#,
        name = node.name,
        kind = node.kind,
        description = node.description,
    )
}

/// Prompt for the User Requirements Specification document.
///
/// Markdown output (the front end is a terminal); section structure follows
/// the standard URS layout: scope, equipment, labware, software, general.
pub fn urs_prompt(project_name: &str, date: &str, tree: &serde_json::Value) -> String {
    let tree_context = serde_json::to_string_pretty(tree).unwrap_or_default();
    format!(
        r#"You are a Senior Technical Writer for a Lab Automation Company.
Generate a formal **User Requirements Specification (URS)** document for the following Lab Automation System based on the provided JSON tree design.

TREE DATA:
{tree_context}

**INSTRUCTIONS:**
1. Generate the output as plain **Markdown**. Do not wrap it in code fences.
2. Header: title "User Requirements Specification", project name "{project_name}", date {date}, version 1.0.

**DOCUMENT STRUCTURE & CONTENT:**

**Section 1: Project Scope**
* A professional executive summary based on the root node's description and specs.

**Section 2: Instrumentation & Equipment**
* A table with columns: ID, Requirement Name, Vendor, Model, Criticality (M for Required, O for Compatible).
* Iterate through the tree and list EVERY hardware component.

**Section 3: Labware & Consumables**
* A table of items that appear to be labware (e.g., "Plate", "Tip", "Tube", "Vial", "Reservoir").
* Columns: Item, Description, Est. Quantity.

**Section 4: Software & Interfaces**
* Requirements for software, controllers, and user interfaces found in the tree.

**Section 5: General Requirements**
* Standard boilerplate industry requirements for Safety (emergency stops, door locks), Power (UPS), and Data (audit trails)."#
    )
}
