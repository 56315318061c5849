// Minion agents — the actors that execute tasks.
//
// The task core does not own agent behavior; it only drives the small slice
// of agent state that working makes visible: equipped tool, animation loop,
// facing, and the carried inventory that `ItemStore::transfer` credits.
// Movement, pathfinding, and needs live in higher layers.
//
// See also: `task.rs` for the timed tasks that call the setters here,
// `item.rs` for the store that credits `inventory`, `job.rs` for the job
// container that names its acting agent by `AgentId`.

use crate::item::ItemKind;
use crate::types::{Animation, Facing, TileCoord, Tool};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Compact identifier for an agent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AgentId(pub u32);

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AgentId({})", self.0)
    }
}

/// A worker minion. Tasks read `position` and `work_speed` and write the
/// presentation state (tool, animation, facing).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Agent {
    pub id: AgentId,
    pub position: TileCoord,
    pub facing: Facing,
    pub tool: Tool,
    pub animation: Animation,
    /// Work units consumed per second of task time. Skill and equipment
    /// modifiers fold into this single rate.
    pub work_speed: f32,
    /// Carried items, keyed by kind for deterministic iteration.
    pub inventory: BTreeMap<ItemKind, u32>,
}

impl Agent {
    pub fn new(id: AgentId, position: TileCoord) -> Self {
        Self {
            id,
            position,
            facing: Facing::South,
            tool: Tool::Hands,
            animation: Animation::Idle,
            work_speed: 1.0,
            inventory: BTreeMap::new(),
        }
    }

    pub fn set_tool(&mut self, tool: Tool) {
        self.tool = tool;
    }

    pub fn set_animation_loop(&mut self, animation: Animation) {
        self.animation = animation;
    }

    pub fn set_facing(&mut self, facing: Facing) {
        self.facing = facing;
    }

    /// Credit `amount` units of `kind` to the carried inventory.
    pub fn receive(&mut self, kind: ItemKind, amount: u32) {
        *self.inventory.entry(kind).or_insert(0) += amount;
    }

    /// Units of `kind` currently carried.
    pub fn carried(&self, kind: ItemKind) -> u32 {
        self.inventory.get(&kind).copied().unwrap_or(0)
    }
}
