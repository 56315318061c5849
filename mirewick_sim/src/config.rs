// Data-driven task tuning.
//
// Tunable parameters for the task core live in `GameConfig`, loaded from
// JSON at startup. The core never uses magic numbers — pickup duration and
// the baseline work rate are read from here, which enables balance iteration
// without recompilation.
//
// Every field carries a serde default, so a partial config (or `{}`) parses
// to the shipped values.
//
// See also: `task.rs` where `Task::pickup_item` reads `pickup_work`.

use crate::types::{Animation, Tool};
use serde::{Deserialize, Serialize};

/// Tunables for the task state machine.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskParams {
    /// Work quantity consumed by picking an item stack up. At work speed 1.0
    /// this is the pickup duration in seconds.
    pub pickup_work: f32,
    /// Tool equipped while picking up.
    pub pickup_tool: Tool,
    /// Animation loop played while picking up.
    pub pickup_animation: Animation,
}

impl Default for TaskParams {
    fn default() -> Self {
        Self {
            pickup_work: 0.425,
            pickup_tool: Tool::Hands,
            pickup_animation: Animation::Magic,
        }
    }
}

/// Top-level game configuration consumed by the task core.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub tasks: TaskParams,
}

impl GameConfig {
    /// Parse a config from JSON. Missing fields fall back to defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_values() {
        let config = GameConfig::default();
        assert_eq!(config.tasks.pickup_work, 0.425);
        assert_eq!(config.tasks.pickup_tool, Tool::Hands);
        assert_eq!(config.tasks.pickup_animation, Animation::Magic);
    }

    #[test]
    fn empty_json_parses_to_defaults() {
        let config = GameConfig::from_json("{}").unwrap();
        assert_eq!(config.tasks.pickup_work, 0.425);
    }

    #[test]
    fn partial_override_keeps_other_defaults() {
        let config = GameConfig::from_json(r#"{"tasks": {"pickup_work": 0.8}}"#).unwrap();
        assert_eq!(config.tasks.pickup_work, 0.8);
        assert_eq!(config.tasks.pickup_animation, Animation::Magic);
    }

    #[test]
    fn config_serialization_roundtrip() {
        let config = GameConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let restored = GameConfig::from_json(&json).unwrap();
        assert_eq!(restored.tasks.pickup_work, config.tasks.pickup_work);
    }
}
