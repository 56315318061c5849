// mirewick_sim — pure Rust task-execution core for the Mirewick colony sim.
//
// This crate contains the task state machine and resource-claim protocol
// that minion jobs are built from: the begin/perform/end lifecycle, the
// immediate and timed task variants, and the claim-acquire / validate /
// consume contract that lets a task reserve an item stack exclusively
// before taking it. It has zero rendering dependencies and runs headless.
//
// Module overview:
// - `task.rs`:   Task lifecycle state machine, `Status`, the `TaskKind` sum.
// - `claim.rs`:  Claim values — exclusive reservations over shared resources.
// - `item.rs`:   Item stacks and the store that owns availability bookkeeping.
// - `job.rs`:    Job container — acting agent plus the owned claim set.
// - `agent.rs`:  Minion state the task core drives (tool, animation, facing).
// - `config.rs`: JSON-loaded task tunables.
// - `types.rs`:  TileCoord, Facing, tool and animation identifiers.
//
// Job selection, scheduling cadence, movement, and rendering live in higher
// layers; they drive this crate one lifecycle call at a time.
//
// **Critical constraint: single-threaded determinism.** One task is active
// per job; lifecycle calls are synchronous; expected failures travel as
// `Status::Fail` while protocol violations panic. Ordered collections are
// `BTreeMap` — no `HashMap`, no system time, no OS entropy.

pub mod agent;
pub mod claim;
pub mod config;
pub mod item;
pub mod job;
pub mod task;
pub mod types;
