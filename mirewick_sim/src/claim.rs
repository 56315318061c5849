// Claims — exclusive reservations against shared countable resources.
//
// A claim is the record that a quantity of some resource has been promised
// to one job and must not be promised to another. Claims are small Copy
// values: the store that granted a claim keeps the availability bookkeeping
// (see `item.rs`), the owning job keeps the authoritative attached copy
// (see `job.rs`), and the consuming task carries another copy it re-validates
// before use.
//
// The claim contract, in order:
//   1. acquire — `ItemStore::try_claim` checks availability and reserves in
//      one call (no control yield between check and reservation);
//   2. attach  — the granted claim joins the owning job's claim set;
//   3. validate-and-consume — the dependent task re-checks validity at use
//      time (the underlying stack may have been consumed by another job
//      between ticks) and only then transfers;
//   4. release exactly once — `Job::detach_claim` returning `Option` is the
//      gate; `ItemStore::release`/`transfer` consume the claim by value.
//
// See also: `item.rs` for the store that grants and settles claims,
// `job.rs` for the claim set, `task.rs` for the acquire/consume task kinds.

use crate::item::{ItemId, ItemStore};
use serde::{Deserialize, Serialize};

/// A reservation of `amount` units against one item stack.
///
/// Only `ItemStore::try_claim` constructs these; a hand-built `ItemClaim`
/// has no matching reservation in the store's bookkeeping.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemClaim {
    pub item: ItemId,
    pub amount: u32,
}

/// The kinds of resource a claim can reserve. Each variant carries the
/// kind-specific reservation record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Claim {
    /// A quantity of a specific item stack.
    Item(ItemClaim),
    // Future: WorkSlot { station, slot } for workshop stations, etc.
}

impl Claim {
    /// Whether the reservation can still be satisfied by its resource.
    /// A claim granted earlier is never assumed valid at consumption time.
    pub fn is_valid(&self, items: &ItemStore) -> bool {
        match self {
            Claim::Item(claim) => items.claim_valid(claim),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::ItemKind;
    use crate::types::TileCoord;

    #[test]
    fn claim_validity_tracks_the_store() {
        let mut items = ItemStore::new();
        let id = items.spawn(ItemKind::Timber, TileCoord::new(2, 3), 10);

        let claim = items.try_claim(id, 10).unwrap();
        let wrapped = Claim::Item(claim);
        assert!(wrapped.is_valid(&items));

        // A competing consumer empties the stack.
        items.take(id, 10);
        assert!(!wrapped.is_valid(&items));
    }

    #[test]
    fn claim_serialization_roundtrip() {
        let mut items = ItemStore::new();
        let id = items.spawn(ItemKind::Crystal, TileCoord::new(0, 0), 4);
        let claim = Claim::Item(items.try_claim(id, 2).unwrap());

        let json = serde_json::to_string(&claim).unwrap();
        let restored: Claim = serde_json::from_str(&json).unwrap();
        assert_eq!(claim, restored);
    }
}
