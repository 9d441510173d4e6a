//! Built-in preparedness tools.
//!
//! Both tools return static, structured data; they exist so the agent has
//! something concrete to call out of the box. Each tool is constructed via
//! [`AgentTool::new`] and returned as `Arc<dyn Tool>`.
//!
//! ```rust
//! use warbot::tools::builtin::all_tools;
//!
//! let tools = all_tools();
//! assert_eq!(tools.len(), 2);
//! ```

use std::sync::Arc;

use serde_json::json;

use crate::tools::tool::{AgentTool, Tool};
use crate::tools::types::ToolParameters;

pub const LOCATION_RISKS: &str = "assess_location_risks";
pub const PREPARATION_GUIDANCE: &str = "get_preparation_guidance";

/// Create the `assess_location_risks` tool.
pub fn location_risks_tool() -> Arc<dyn Tool> {
    Arc::new(AgentTool::new(
        LOCATION_RISKS,
        "Assess risks for a specified location, including proximity to conflicts, \
         infrastructure stability, and other relevant factors.",
        ToolParameters::object()
            .string(
                "location",
                "City, country, or coordinates to assess risks for.",
                true,
            )
            .build(),
        |args| async move {
            let location = args.get_str("location")?;
            Ok(json!({
                "location": location,
                "risks": [
                    {
                        "category": "armed_conflict",
                        "level": "medium",
                        "notes": "No active conflict nearby.",
                    },
                    {
                        "category": "infrastructure",
                        "level": "medium",
                        "notes": "Potential for utilities interruptions; keep backup power and water.",
                    },
                    {
                        "category": "digital",
                        "level": "medium",
                        "notes": "Possible internet throttling or outages.",
                    },
                ],
                "note": "Static baseline assessment; not backed by live threat intelligence.",
            }))
        },
    ))
}

/// Create the `get_preparation_guidance` tool.
///
/// Baseline checklist plus additions keyed off words in the scenario.
pub fn preparation_guidance_tool() -> Arc<dyn Tool> {
    Arc::new(AgentTool::new(
        PREPARATION_GUIDANCE,
        "Provide preparation guidance for specific scenarios such as utilities interruption, \
         internet loss, armed conflict, or natural disasters.",
        ToolParameters::object()
            .string(
                "scenario",
                "Scenario type (utilities interruption, internet loss, armed conflict, natural disaster, etc.).",
                true,
            )
            .string("location", "Optional location context to tailor guidance.", false)
            .build(),
        |args| async move {
            let scenario = args.get_str("scenario")?;
            Ok(preparation_guidance(scenario, args.get_str_opt("location")))
        },
    ))
}

fn preparation_guidance(scenario: &str, location: Option<&str>) -> serde_json::Value {
    let mut immediate_actions = vec![
        "Ensure communication plan with household.",
        "Charge essential devices and prepare backup power if available.",
    ];
    let mut communication = vec![
        "Predefine meet-up points and check-in cadence.",
        "Keep written contact lists and offline maps.",
    ];
    let mut evacuation = vec![
        "Identify evacuation routes and transportation options.",
        "Prepare a go-bag with essentials and documents.",
    ];
    let mut supplies = vec![
        "Water, food, first aid, power banks, flashlights, radio, copies of documents.",
    ];

    let scenario_lower = scenario.to_lowercase();
    if scenario_lower.contains("utilities") {
        immediate_actions.push("Fill bathtubs and containers with water if safe to do so.");
    }
    if scenario_lower.contains("internet") {
        communication.push("Prepare offline backups of critical info and contacts.");
    }
    if scenario_lower.contains("conflict") || scenario_lower.contains("armed") {
        evacuation.push("Stay informed on local advisories; avoid high-risk areas.");
    }
    if scenario_lower.contains("disaster") {
        supplies.push("Sturdy shoes, work gloves, and a whistle for signalling.");
    }

    json!({
        "scenario": scenario,
        "location": location,
        "immediate_actions": immediate_actions,
        "short_term": [
            "Stock 72-hour supply of water and non-perishable food.",
            "Maintain basic medical kit and necessary prescriptions.",
        ],
        "long_term": [
            "Establish redundant communication channels (offline copies, radio).",
            "Diversify critical supplies and consider community coordination.",
        ],
        "supplies": supplies,
        "communication": communication,
        "evacuation": evacuation,
    })
}

/// All built-in tools, in registration order.
pub fn all_tools() -> Vec<Arc<dyn Tool>> {
    vec![location_risks_tool(), preparation_guidance_tool()]
}
