#![cfg(feature = "serde")]

use npc_htn::{AgentConfig, CoordinatorConfig, PlannerConfig};

#[test]
fn missing_fields_fall_back_to_defaults() {
    let config: AgentConfig =
        serde_json::from_str(r#"{ "planning_cooldown_seconds": 1.5 }"#).expect("parse");

    assert_eq!(config.planning_cooldown_seconds, 1.5);
    assert_eq!(
        config.operator_interval_seconds,
        AgentConfig::default().operator_interval_seconds
    );
    assert!(config.plan_on_fact_change);
}

#[test]
fn configs_survive_json() {
    let planner = PlannerConfig {
        max_expansions: 64,
    };
    let coordinator = CoordinatorConfig {
        strike_limit: 1,
        priority_penalty: 3,
        retire_on_success: true,
    };

    let planner_json = serde_json::to_string(&planner).expect("serialize");
    let coordinator_json = serde_json::to_string(&coordinator).expect("serialize");

    assert_eq!(
        serde_json::from_str::<PlannerConfig>(&planner_json).expect("parse"),
        planner
    );
    assert_eq!(
        serde_json::from_str::<CoordinatorConfig>(&coordinator_json).expect("parse"),
        coordinator
    );
}
