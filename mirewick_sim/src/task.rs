// The task state machine and its resource-claim protocol.
//
// A task is one step of a job: travel somewhere, reserve an input, work for
// a while, hand over the result. The external job runner drives each task
// through a three-phase lifecycle:
//
//   begin_task(ctx) -> Status          (exactly once)
//   perform_task(ctx, dt) -> Status    (zero or more times, non-immediate only)
//   end_task(ctx, cancelled)           (exactly once)
//
// `Status` is the tri-state step result: `Continue` means schedule another
// perform call, `Complete`/`Fail` mean the runner must call `end_task` next.
// Expected failures (a short stack, a stale claim) surface as `Status::Fail`;
// breaking the calling protocol itself (double begin, perform on an immediate
// task, end before begin) is a programmer error and panics.
//
// Task kinds are a closed sum (`TaskKind`), evaluated by match dispatch the
// same way the sim evaluates behavior per activation — no open class
// hierarchy, so the runner can switch on variant and the compiler keeps the
// dispatch exhaustive. Lambda variants carry boxed closures for one-off or
// data-driven jobs.
//
// The claim protocol threaded through the kinds: `ClaimItem` reserves an
// input during begin and attaches the claim to the job; a later
// `PickupItem` in the same job is constructed from that claim, re-validates
// it at begin (and defensively each step — the stack may have been consumed
// by another job between ticks), and its end hook detaches and settles the
// claim exactly once: transfer on non-cancelled completion, release
// otherwise. A cancelled task's effects did not logically happen.
//
// See also: `claim.rs` for the claim contract, `item.rs` for the store that
// grants and settles claims, `job.rs` for the claim set, `config.rs` for the
// pickup tunables.
//
// **Critical constraint: single-threaded cooperative stepping.** One task is
// active per job; all waiting is expressed as returning `Continue` and being
// re-invoked on a later tick. Nothing here blocks or yields.

use crate::agent::Agent;
use crate::claim::{Claim, ItemClaim};
use crate::config::GameConfig;
use crate::item::{ItemId, ItemStore};
use crate::job::{Job, JobId};
use crate::types::{Animation, Facing, TileCoord, Tool};
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Step result
// ---------------------------------------------------------------------------

/// Tri-state result of a lifecycle step.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Status {
    /// More work remains; the runner should schedule another perform call.
    Continue,
    /// The task achieved its goal. The runner must call `end_task` next.
    Complete,
    /// The task cannot proceed. Terminal for this task instance — retry
    /// policy, if any, lives with the job scheduler.
    Fail,
}

/// Lifecycle phase of a task instance. A task is never reused across jobs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Phase {
    /// Constructed, not yet bound to a job.
    Unbound,
    /// Bound via `begin_task`; awaiting perform calls or `end_task`.
    Active,
    /// `end_task` ran. The instance is spent.
    Ended,
}

// ---------------------------------------------------------------------------
// Task context
// ---------------------------------------------------------------------------

/// The collaborators a task touches during a lifecycle call: the owning job,
/// its acting agent, and the item store. The runner assembles this fresh for
/// every call; the task itself holds no references into the world.
pub struct TaskCtx<'a> {
    pub job: &'a mut Job,
    pub agent: &'a mut Agent,
    pub items: &'a mut ItemStore,
}

/// Predicate for an immediate lambda task: true maps to `Complete`.
pub type CheckFn = Box<dyn FnMut(&mut TaskCtx<'_>) -> bool>;
/// Work rate for a lambda timed task, read from the agent each step.
pub type WorkSpeedFn = Box<dyn Fn(&Agent) -> f32>;
/// Observer invoked each step with the new remaining work quantity.
pub type ProgressFn = Box<dyn FnMut(f32)>;
/// Hook invoked from the end phase on non-cancelled completion.
pub type CompleteFn = Box<dyn FnOnce(&mut TaskCtx<'_>)>;

// ---------------------------------------------------------------------------
// Timed work state
// ---------------------------------------------------------------------------

/// Shared state for tasks that consume an abstract work quantity over
/// successive time increments.
#[derive(Clone, Debug)]
pub struct Timed {
    /// Where the work happens. Agents not already there face toward it.
    pub target: TileCoord,
    pub tool: Tool,
    pub animation: Animation,
    /// Remaining work quantity. Monotonically non-increasing, clamped at 0.
    pub remaining: f32,
}

impl Timed {
    /// Begin-phase agent setup: equip the tool, start the animation loop,
    /// face the target when not already on it. Always more work to do (a
    /// zero-work task still completes via its first perform call).
    fn begin(&self, ctx: &mut TaskCtx<'_>) -> Status {
        ctx.agent.set_tool(self.tool);
        ctx.agent.set_animation_loop(self.animation);
        if ctx.agent.position != self.target {
            let facing = Facing::toward(ctx.agent.position, self.target);
            ctx.agent.set_facing(facing);
        }
        Status::Continue
    }

    /// Consume `delta_time * speed` work. Completion is `remaining <= 0`
    /// after the clamp — a rate that overshoots still completes on that
    /// step, and no extra step is wasted on an exact-zero check.
    fn step(&mut self, delta_time: f32, speed: f32) -> Status {
        self.remaining = (self.remaining - delta_time * speed).max(0.0);
        if self.remaining <= 0.0 {
            Status::Complete
        } else {
            Status::Continue
        }
    }
}

// ---------------------------------------------------------------------------
// Task kinds
// ---------------------------------------------------------------------------

/// The closed set of task variants. Immediate kinds resolve entirely during
/// the begin phase; timed kinds consume work across perform calls.
pub enum TaskKind {
    /// Immediate: run a predicate against the job context. True completes,
    /// false fails. Used for ad hoc one-shot checks and effects.
    Lambda { check: CheckFn },
    /// Immediate: atomically reserve `amount` units of an item stack and
    /// attach the claim to the job. The granted claim stays readable via
    /// `Task::granted_claim` for dependent tasks.
    ClaimItem {
        item: ItemId,
        amount: u32,
        granted: Option<ItemClaim>,
    },
    /// Timed work at a fixed rate.
    Timed { timed: Timed, speed: f32 },
    /// Timed work with a supplied rate function plus optional progress and
    /// completion hooks. The data-driven stand-in for a bespoke kind.
    TimedLambda {
        timed: Timed,
        work_speed: WorkSpeedFn,
        on_progress: Option<ProgressFn>,
        on_complete: Option<CompleteFn>,
    },
    /// Pick up a previously claimed item stack. Re-validates the claim at
    /// begin and each step; the end hook settles the claim exactly once.
    PickupItem {
        timed: Timed,
        claim: Option<ItemClaim>,
    },
    // Future: WorkAtStation { station, recipe }, Haul { claim, destination }.
}

// Closures are opaque, so Debug is by hand: data-bearing fields only.
impl fmt::Debug for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskKind::Lambda { .. } => f.write_str("Lambda"),
            TaskKind::ClaimItem {
                item,
                amount,
                granted,
            } => f
                .debug_struct("ClaimItem")
                .field("item", item)
                .field("amount", amount)
                .field("granted", granted)
                .finish(),
            TaskKind::Timed { timed, speed } => f
                .debug_struct("Timed")
                .field("timed", timed)
                .field("speed", speed)
                .finish(),
            TaskKind::TimedLambda { timed, .. } => f
                .debug_struct("TimedLambda")
                .field("timed", timed)
                .finish_non_exhaustive(),
            TaskKind::PickupItem { timed, claim } => f
                .debug_struct("PickupItem")
                .field("timed", timed)
                .field("claim", claim)
                .finish(),
        }
    }
}

// ---------------------------------------------------------------------------
// Task — the lifecycle state machine
// ---------------------------------------------------------------------------

/// A task instance: one variant plus the lifecycle bookkeeping that enforces
/// the begin/perform/end protocol.
#[derive(Debug)]
pub struct Task {
    kind: TaskKind,
    phase: Phase,
    /// The job this task was bound to at begin. Set exactly once.
    bound_job: Option<JobId>,
    /// Last status returned by begin or perform. `Complete`/`Fail` settle
    /// the task: no further perform calls are legal, and the end hook uses
    /// this to gate deliver-result effects.
    last: Option<Status>,
}

impl Task {
    fn new(kind: TaskKind) -> Self {
        Self {
            kind,
            phase: Phase::Unbound,
            bound_job: None,
            last: None,
        }
    }

    /// Immediate task wrapping a predicate: true completes, false fails.
    pub fn lambda(check: impl FnMut(&mut TaskCtx<'_>) -> bool + 'static) -> Self {
        Self::new(TaskKind::Lambda {
            check: Box::new(check),
        })
    }

    /// Immediate task that reserves `amount` units of `item` for the job.
    pub fn claim_item(item: ItemId, amount: u32) -> Self {
        Self::new(TaskKind::ClaimItem {
            item,
            amount,
            granted: None,
        })
    }

    /// Timed task consuming `work` units at a fixed `speed`.
    pub fn timed(
        target: TileCoord,
        tool: Tool,
        animation: Animation,
        work: f32,
        speed: f32,
    ) -> Self {
        assert!(work >= 0.0, "timed task work quantity must be non-negative");
        assert!(speed > 0.0, "timed task work speed must be positive");
        Self::new(TaskKind::Timed {
            timed: Timed {
                target,
                tool,
                animation,
                remaining: work,
            },
            speed,
        })
    }

    /// Timed task with a supplied work-rate function and optional hooks.
    /// `on_progress` fires each step with the new remaining quantity;
    /// `on_complete` fires from the end phase only on non-cancelled
    /// completion.
    pub fn timed_lambda(
        target: TileCoord,
        tool: Tool,
        animation: Animation,
        work: f32,
        work_speed: impl Fn(&Agent) -> f32 + 'static,
        on_progress: Option<ProgressFn>,
        on_complete: Option<CompleteFn>,
    ) -> Self {
        assert!(work >= 0.0, "timed task work quantity must be non-negative");
        Self::new(TaskKind::TimedLambda {
            timed: Timed {
                target,
                tool,
                animation,
                remaining: work,
            },
            work_speed: Box::new(work_speed),
            on_progress,
            on_complete,
        })
    }

    /// Pick up a claimed stack at `target`. Duration comes from config; the
    /// rate is the agent's `work_speed`. The claim must have been granted by
    /// a prior claim task in the same job.
    pub fn pickup_item(config: &GameConfig, claim: ItemClaim, target: TileCoord) -> Self {
        Self::new(TaskKind::PickupItem {
            timed: Timed {
                target,
                tool: config.tasks.pickup_tool,
                animation: config.tasks.pickup_animation,
                remaining: config.tasks.pickup_work,
            },
            claim: Some(claim),
        })
    }

    /// Whether this task resolves entirely during the begin phase. The
    /// runner must never call `perform_task` on an immediate task.
    pub fn is_immediate(&self) -> bool {
        matches!(
            self.kind,
            TaskKind::Lambda { .. } | TaskKind::ClaimItem { .. }
        )
    }

    /// The claim granted by a completed claim task, for dependent tasks to
    /// read. `None` before begin, after a failed attempt, or on other kinds.
    pub fn granted_claim(&self) -> Option<Claim> {
        match &self.kind {
            TaskKind::ClaimItem { granted, .. } => granted.map(Claim::Item),
            _ => None,
        }
    }

    /// Remaining work quantity of a timed task, for progress display.
    pub fn remaining_work(&self) -> Option<f32> {
        match &self.kind {
            TaskKind::Timed { timed, .. }
            | TaskKind::TimedLambda { timed, .. }
            | TaskKind::PickupItem { timed, .. } => Some(timed.remaining),
            TaskKind::Lambda { .. } | TaskKind::ClaimItem { .. } => None,
        }
    }

    /// Bind the task to its job and run the variant begin hook. Immediate
    /// kinds settle here; timed kinds return `Continue` after agent setup.
    ///
    /// Panics if called twice, or with a context whose agent is not the
    /// job's acting agent — those are runner bugs, not task outcomes.
    pub fn begin_task(&mut self, ctx: &mut TaskCtx<'_>) -> Status {
        assert!(
            self.phase == Phase::Unbound,
            "begin_task called on a task that was already begun"
        );
        assert_eq!(
            ctx.job.agent, ctx.agent.id,
            "task context agent does not match the job's acting agent"
        );
        self.bound_job = Some(ctx.job.id);
        self.phase = Phase::Active;

        let status = match &mut self.kind {
            TaskKind::Lambda { check } => {
                if check(ctx) {
                    Status::Complete
                } else {
                    Status::Fail
                }
            }
            TaskKind::ClaimItem {
                item,
                amount,
                granted,
            } => match ctx.items.try_claim(*item, *amount) {
                Some(claim) => {
                    ctx.job.attach_claim(Claim::Item(claim));
                    *granted = Some(claim);
                    Status::Complete
                }
                None => Status::Fail,
            },
            TaskKind::Timed { timed, .. } => timed.begin(ctx),
            TaskKind::TimedLambda { timed, .. } => timed.begin(ctx),
            TaskKind::PickupItem { timed, claim } => {
                let item_claim = claim.expect("pickup task constructed without a claim");
                // The claim was granted on an earlier tick; another consumer
                // may have taken the stack since.
                if ctx.items.claim_valid(&item_claim) {
                    timed.begin(ctx)
                } else {
                    Status::Fail
                }
            }
        };

        self.last = Some(status);
        status
    }

    /// Advance a non-immediate task by one time increment.
    ///
    /// Panics on an immediate task, outside the active phase, after the task
    /// has settled, or when driven with a different job than it was begun
    /// with.
    pub fn perform_task(&mut self, ctx: &mut TaskCtx<'_>, delta_time: f32) -> Status {
        assert!(
            self.phase == Phase::Active,
            "perform_task called outside the active phase"
        );
        self.check_ctx(ctx);
        assert!(
            !self.is_immediate(),
            "perform_task called on an immediate task"
        );
        assert!(
            self.last == Some(Status::Continue),
            "perform_task called after the task already settled"
        );

        let status = match &mut self.kind {
            TaskKind::Timed { timed, speed } => timed.step(delta_time, *speed),
            TaskKind::TimedLambda {
                timed,
                work_speed,
                on_progress,
                ..
            } => {
                let speed = work_speed(ctx.agent);
                let status = timed.step(delta_time, speed);
                if let Some(observer) = on_progress {
                    observer(timed.remaining);
                }
                status
            }
            TaskKind::PickupItem { timed, claim } => {
                let item_claim = claim.expect("pickup task lost its claim mid-performance");
                // Defensive per-step re-validation: an out-of-band consumer
                // can shrink the stack between ticks.
                if ctx.items.claim_valid(&item_claim) {
                    timed.step(delta_time, ctx.agent.work_speed)
                } else {
                    Status::Fail
                }
            }
            TaskKind::Lambda { .. } | TaskKind::ClaimItem { .. } => {
                unreachable!("immediate kinds are rejected above")
            }
        };

        self.last = Some(status);
        status
    }

    /// Terminate the task exactly once. `cancelled` marks an external abort:
    /// deliver-result side effects (claim consumption, inventory transfer,
    /// completion hooks) only run when the task completed and was not
    /// cancelled. A held claim is settled back to the store either way —
    /// its lifetime is tied to the task, not to the task's success.
    ///
    /// Panics before begin, on a second call, or with a mismatched job.
    pub fn end_task(&mut self, ctx: &mut TaskCtx<'_>, cancelled: bool) {
        assert!(
            self.phase == Phase::Active,
            "end_task called on a task that is not active"
        );
        self.check_ctx(ctx);

        let delivered = !cancelled && self.last == Some(Status::Complete);
        match &mut self.kind {
            // Pure-immediate kinds have no end effects. A granted item claim
            // now belongs to the job; the consuming task settles it.
            TaskKind::Lambda { .. } | TaskKind::ClaimItem { .. } | TaskKind::Timed { .. } => {}
            TaskKind::TimedLambda { on_complete, .. } => {
                if delivered {
                    if let Some(hook) = on_complete.take() {
                        hook(ctx);
                    }
                }
            }
            TaskKind::PickupItem { claim, .. } => {
                if let Some(item_claim) = claim.take() {
                    // detach_claim returning Some is the exactly-once gate.
                    if ctx.job.detach_claim(&Claim::Item(item_claim)).is_some() {
                        if delivered {
                            ctx.items.transfer(item_claim, ctx.agent);
                            ctx.agent.set_animation_loop(Animation::Idle);
                        } else {
                            ctx.items.release(item_claim);
                        }
                    }
                }
            }
        }

        self.phase = Phase::Ended;
    }

    fn check_ctx(&self, ctx: &TaskCtx<'_>) {
        assert_eq!(
            self.bound_job,
            Some(ctx.job.id),
            "task driven with a different job than it was begun with"
        );
        assert_eq!(
            ctx.job.agent, ctx.agent.id,
            "task context agent does not match the job's acting agent"
        );
    }
}
