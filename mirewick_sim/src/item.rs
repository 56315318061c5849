// Item stacks and the store that owns their availability bookkeeping.
//
// `ItemStore` is the resource system the task core claims against. It is the
// single owner of the "available vs. claimed" split: tasks never mutate
// quantities directly — they ask the store to reserve (`try_claim`), to
// return a reservation (`release`), or to commit a reserved quantity into an
// agent's carried inventory (`transfer`).
//
// `try_claim` is the atomic check-then-reserve unit: the availability check
// and the reservation happen inside one call, so no other job can slip in
// between them (the sim is single-threaded and never yields mid-call).
//
// See also: `claim.rs` for the `ItemClaim` reservation value, `task.rs` for
// the task kinds that drive these calls, `agent.rs` for the carried
// inventory that `transfer` credits.
//
// **Critical constraint: determinism.** Stacks live in a `BTreeMap` and ids
// come from a monotonic counter, so iteration order is identical everywhere.

use crate::agent::Agent;
use crate::claim::ItemClaim;
use crate::types::TileCoord;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// What an item stack is made of.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ItemKind {
    Timber,
    Stone,
    Mushroom,
    Crystal,
}

/// Compact identifier for an item stack.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ItemId(pub u32);

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ItemId({})", self.0)
    }
}

/// A stack of identical items lying in the world.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemStack {
    pub id: ItemId,
    pub kind: ItemKind,
    pub position: TileCoord,
    /// Physical units in the stack.
    pub quantity: u32,
    /// Units reserved by outstanding claims. Never exceeds `quantity` except
    /// transiently when a competing consumer shrinks the stack under an
    /// outstanding claim — that claim is then stale.
    pub claimed: u32,
}

impl ItemStack {
    /// Units that can still be promised to a new claim.
    pub fn amount_available(&self) -> u32 {
        self.quantity.saturating_sub(self.claimed)
    }
}

/// Registry of all item stacks, keyed by id.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ItemStore {
    stacks: BTreeMap<ItemId, ItemStack>,
    next_id: u32,
}

impl ItemStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new stack and return its id.
    pub fn spawn(&mut self, kind: ItemKind, position: TileCoord, quantity: u32) -> ItemId {
        let id = ItemId(self.next_id);
        self.next_id += 1;
        self.stacks.insert(
            id,
            ItemStack {
                id,
                kind,
                position,
                quantity,
                claimed: 0,
            },
        );
        id
    }

    pub fn get(&self, id: ItemId) -> Option<&ItemStack> {
        self.stacks.get(&id)
    }

    /// Claimable units of a stack; 0 for a stack that no longer exists.
    pub fn amount_available(&self, id: ItemId) -> u32 {
        self.stacks.get(&id).map_or(0, ItemStack::amount_available)
    }

    /// Attempt to reserve `amount` units of a stack. Checks availability and
    /// records the reservation in one step; returns `None` (with no state
    /// change) when the stack is missing or short.
    pub fn try_claim(&mut self, id: ItemId, amount: u32) -> Option<ItemClaim> {
        let stack = self.stacks.get_mut(&id)?;
        if stack.amount_available() < amount {
            return None;
        }
        stack.claimed += amount;
        Some(ItemClaim { item: id, amount })
    }

    /// Whether a granted claim can still be satisfied. False once the stack
    /// is gone or has shrunk below the reserved amount.
    pub fn claim_valid(&self, claim: &ItemClaim) -> bool {
        self.stacks
            .get(&claim.item)
            .is_some_and(|s| s.quantity >= claim.amount && s.claimed >= claim.amount)
    }

    /// Return a reservation to availability without consuming anything.
    /// Consumes the claim value; a claim whose stack has vanished has nothing
    /// left to return.
    pub fn release(&mut self, claim: ItemClaim) {
        if let Some(stack) = self.stacks.get_mut(&claim.item) {
            stack.claimed = stack.claimed.saturating_sub(claim.amount);
        }
    }

    /// Commit a reservation: remove the claimed quantity from the stack and
    /// credit it to the agent's carried inventory. An emptied stack is
    /// despawned. Returns the amount moved.
    ///
    /// Callers must re-validate the claim first; transferring a stale claim
    /// is a protocol violation and panics.
    pub fn transfer(&mut self, claim: ItemClaim, agent: &mut Agent) -> u32 {
        let stack = self
            .stacks
            .get_mut(&claim.item)
            .expect("transfer on a claim whose stack no longer exists");
        assert!(
            stack.quantity >= claim.amount && stack.claimed >= claim.amount,
            "transfer on a stale claim ({} of {})",
            claim.amount,
            stack.quantity,
        );
        stack.quantity -= claim.amount;
        stack.claimed -= claim.amount;
        let kind = stack.kind;
        if stack.quantity == 0 {
            self.stacks.remove(&claim.item);
        }
        agent.receive(kind, claim.amount);
        claim.amount
    }

    /// Remove up to `amount` physical units from a stack, ignoring any
    /// reservations. Models an out-of-band consumer (another job, decay);
    /// outstanding claims on the stack may become stale as a result.
    pub fn take(&mut self, id: ItemId, amount: u32) {
        if let Some(stack) = self.stacks.get_mut(&id) {
            stack.quantity = stack.quantity.saturating_sub(amount);
            if stack.quantity == 0 {
                self.stacks.remove(&id);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::AgentId;

    fn store_with(kind: ItemKind, quantity: u32) -> (ItemStore, ItemId) {
        let mut items = ItemStore::new();
        let id = items.spawn(kind, TileCoord::new(4, 4), quantity);
        (items, id)
    }

    #[test]
    fn spawn_assigns_monotonic_ids() {
        let mut items = ItemStore::new();
        let a = items.spawn(ItemKind::Timber, TileCoord::new(0, 0), 1);
        let b = items.spawn(ItemKind::Stone, TileCoord::new(1, 0), 1);
        assert!(a < b);
        assert_eq!(items.get(a).unwrap().kind, ItemKind::Timber);
    }

    #[test]
    fn claim_reserves_availability() {
        let (mut items, id) = store_with(ItemKind::Timber, 30);
        let claim = items.try_claim(id, 25).unwrap();
        assert_eq!(claim.amount, 25);
        assert_eq!(items.amount_available(id), 5);
        // Physical quantity untouched by the reservation.
        assert_eq!(items.get(id).unwrap().quantity, 30);
    }

    #[test]
    fn claim_denied_when_short() {
        let (mut items, id) = store_with(ItemKind::Stone, 10);
        let _held = items.try_claim(id, 8).unwrap();
        assert!(items.try_claim(id, 3).is_none());
        // Denied attempt changes nothing.
        assert_eq!(items.amount_available(id), 2);
    }

    #[test]
    fn claim_denied_for_missing_stack() {
        let mut items = ItemStore::new();
        assert!(items.try_claim(ItemId(99), 1).is_none());
    }

    #[test]
    fn release_returns_availability() {
        let (mut items, id) = store_with(ItemKind::Mushroom, 12);
        let claim = items.try_claim(id, 12).unwrap();
        assert_eq!(items.amount_available(id), 0);
        items.release(claim);
        assert_eq!(items.amount_available(id), 12);
    }

    #[test]
    fn transfer_moves_quantity_into_inventory() {
        let (mut items, id) = store_with(ItemKind::Timber, 30);
        let mut agent = Agent::new(AgentId(1), TileCoord::new(0, 0));

        let claim = items.try_claim(id, 25).unwrap();
        let moved = items.transfer(claim, &mut agent);

        assert_eq!(moved, 25);
        assert_eq!(agent.carried(ItemKind::Timber), 25);
        assert_eq!(items.get(id).unwrap().quantity, 5);
        assert_eq!(items.amount_available(id), 5);
    }

    #[test]
    fn transfer_despawns_emptied_stack() {
        let (mut items, id) = store_with(ItemKind::Crystal, 3);
        let mut agent = Agent::new(AgentId(1), TileCoord::new(0, 0));

        let claim = items.try_claim(id, 3).unwrap();
        items.transfer(claim, &mut agent);
        assert!(items.get(id).is_none());
    }

    #[test]
    #[should_panic(expected = "stale claim")]
    fn transfer_on_stale_claim_is_fatal() {
        let (mut items, id) = store_with(ItemKind::Stone, 10);
        let mut agent = Agent::new(AgentId(1), TileCoord::new(0, 0));

        let claim = items.try_claim(id, 10).unwrap();
        items.take(id, 4);
        items.transfer(claim, &mut agent);
    }

    #[test]
    fn take_makes_outstanding_claims_stale() {
        let (mut items, id) = store_with(ItemKind::Timber, 10);
        let claim = items.try_claim(id, 8).unwrap();
        assert!(items.claim_valid(&claim));

        items.take(id, 5);
        assert!(!items.claim_valid(&claim));

        // Releasing a stale claim is still safe bookkeeping.
        items.release(claim);
        assert_eq!(items.amount_available(id), 5);
    }

    #[test]
    fn take_despawns_emptied_stack() {
        let (mut items, id) = store_with(ItemKind::Mushroom, 2);
        items.take(id, 2);
        assert!(items.get(id).is_none());
        assert_eq!(items.amount_available(id), 0);
    }

    #[test]
    fn store_serialization_roundtrip() {
        let (mut items, id) = store_with(ItemKind::Crystal, 7);
        items.try_claim(id, 2).unwrap();

        let json = serde_json::to_string(&items).unwrap();
        let restored: ItemStore = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.amount_available(id), 5);
        assert_eq!(restored.get(id), items.get(id));
    }
}
