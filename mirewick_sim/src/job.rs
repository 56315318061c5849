// Jobs — one unit of agent work, owning a task sequence's claims.
//
// A job is the container the external scheduler hands to the task core: it
// names the acting agent and owns every claim its tasks acquire. Task
// sequencing and retry policy live with the scheduler; what the core needs
// from the job is the claim set with its exactly-once detach gate.
//
// Claim ownership rule: a claim never outlives its job. A claim-acquiring
// task attaches here; the consuming task detaches at its end hook; anything
// still attached when the job is torn down goes back to the store via
// `release_claims`.
//
// See also: `claim.rs` for the claim values, `task.rs` for the tasks that
// attach and detach them.

use crate::agent::AgentId;
use crate::claim::Claim;
use crate::item::ItemStore;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Compact identifier for a job.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct JobId(pub u64);

/// A unit of work: the acting agent plus the claims held on its behalf.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    /// The agent executing this job's tasks.
    pub agent: AgentId,
    /// Claims acquired by this job's tasks. Most jobs hold at most one or
    /// two (an input claim and a work-slot claim), hence the inline storage.
    claims: SmallVec<[Claim; 2]>,
}

impl Job {
    pub fn new(id: JobId, agent: AgentId) -> Self {
        Self {
            id,
            agent,
            claims: SmallVec::new(),
        }
    }

    /// Register a granted claim against this job.
    pub fn attach_claim(&mut self, claim: Claim) {
        self.claims.push(claim);
    }

    /// Remove a claim from the set and hand it back to the caller. `None`
    /// means the claim was already detached — callers use this as the
    /// exactly-once gate before releasing or consuming.
    pub fn detach_claim(&mut self, claim: &Claim) -> Option<Claim> {
        let index = self.claims.iter().position(|c| c == claim)?;
        Some(self.claims.remove(index))
    }

    /// Claims currently attached.
    pub fn claims(&self) -> &[Claim] {
        &self.claims
    }

    /// Job teardown: return every still-attached claim to the store. Called
    /// by the scheduler when a job is abandoned with claims outstanding.
    pub fn release_claims(&mut self, items: &mut ItemStore) {
        for claim in self.claims.drain(..) {
            match claim {
                Claim::Item(item_claim) => items.release(item_claim),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::ItemKind;
    use crate::types::TileCoord;

    #[test]
    fn detach_is_exactly_once() {
        let mut items = ItemStore::new();
        let id = items.spawn(ItemKind::Timber, TileCoord::new(0, 0), 10);
        let claim = Claim::Item(items.try_claim(id, 4).unwrap());

        let mut job = Job::new(JobId(1), AgentId(1));
        job.attach_claim(claim);

        assert_eq!(job.detach_claim(&claim), Some(claim));
        assert_eq!(job.detach_claim(&claim), None);
        assert!(job.claims().is_empty());
    }

    #[test]
    fn release_claims_returns_availability() {
        let mut items = ItemStore::new();
        let a = items.spawn(ItemKind::Timber, TileCoord::new(0, 0), 10);
        let b = items.spawn(ItemKind::Stone, TileCoord::new(1, 0), 6);

        let mut job = Job::new(JobId(2), AgentId(1));
        job.attach_claim(Claim::Item(items.try_claim(a, 10).unwrap()));
        job.attach_claim(Claim::Item(items.try_claim(b, 6).unwrap()));
        assert_eq!(items.amount_available(a), 0);
        assert_eq!(items.amount_available(b), 0);

        job.release_claims(&mut items);
        assert!(job.claims().is_empty());
        assert_eq!(items.amount_available(a), 10);
        assert_eq!(items.amount_available(b), 6);
    }

    #[test]
    fn job_serialization_roundtrip() {
        let mut items = ItemStore::new();
        let id = items.spawn(ItemKind::Crystal, TileCoord::new(0, 0), 5);
        let mut job = Job::new(JobId(9), AgentId(2));
        job.attach_claim(Claim::Item(items.try_claim(id, 5).unwrap()));

        let json = serde_json::to_string(&job).unwrap();
        let restored: Job = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.id, job.id);
        assert_eq!(restored.agent, job.agent);
        assert_eq!(restored.claims(), job.claims());
    }
}
