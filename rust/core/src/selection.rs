// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Cascading selection state.
//!
//! A [`SelectionChain`] is a fixed list of dependent levels (for example
//! project → file → version → view). Each level has an option slot holding the
//! values it can be set to, and the chain has one extra *detail* slot for the
//! payload shown once the deepest level is chosen.
//!
//! Changing a level clears every deeper selection and slot in the same call,
//! then issues a [`FetchTicket`] for the next slot. Tickets carry a chain-wide
//! generation number; [`SelectionChain::complete`] only applies a result
//! whose ticket is still the one the slot waits for, so a slow response to an
//! older selection is dropped instead of overwriting a newer one.

use serde::Serialize;

use crate::error::{Error, Result};
use crate::record::Record;

/// Load state of one option slot.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", content = "data", rename_all = "snake_case")]
pub enum SlotState {
    /// Nothing requested (parent level empty).
    Idle,
    /// A fetch is in flight.
    Pending,
    /// Options loaded.
    Ready(Vec<Record>),
    /// The fetch failed; holds a user-facing notice.
    Failed(String),
}

/// Request to load one slot, tagged with the selections it depends on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FetchTicket {
    /// Slot to fill (level index, or the chain depth for the detail slot).
    pub slot: usize,
    /// Selected values of every level above `slot`, shallowest first.
    pub prefix: Vec<String>,
    /// Generation the slot waits for.
    pub generation: u64,
}

/// Outcome of handing a fetch result back to the chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// Options stored.
    Applied,
    /// Failure notice stored; shallower selections untouched.
    Failed,
    /// The ticket was superseded; result discarded.
    Stale,
}

#[derive(Debug, Clone)]
struct Slot {
    state: SlotState,
    generation: u64,
}

/// Chain of dependent selections with generation-guarded option slots.
#[derive(Debug, Clone)]
pub struct SelectionChain {
    names: Vec<String>,
    selected: Vec<Option<String>>,
    slots: Vec<Slot>,
    next_generation: u64,
}

impl SelectionChain {
    /// Creates an empty chain with the given level names.
    pub fn new(names: &[&str]) -> Result<Self> {
        if names.is_empty() {
            return Err(Error::EmptyChain);
        }
        Ok(Self {
            names: names.iter().map(|n| n.to_string()).collect(),
            selected: vec![None; names.len()],
            slots: vec![
                Slot {
                    state: SlotState::Idle,
                    generation: 0,
                };
                names.len() + 1
            ],
            next_generation: 0,
        })
    }

    /// Number of selectable levels.
    pub fn depth(&self) -> usize {
        self.names.len()
    }

    /// Index of the detail slot.
    pub fn detail_slot(&self) -> usize {
        self.names.len()
    }

    pub fn level_names(&self) -> &[String] {
        &self.names
    }

    pub fn level_index(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    /// Current selection at `level`.
    pub fn selected(&self, level: usize) -> Option<&str> {
        self.selected.get(level).and_then(|s| s.as_deref())
    }

    /// `(level name, selection)` pairs in chain order.
    pub fn selections(&self) -> Vec<(&str, Option<&str>)> {
        self.names
            .iter()
            .zip(&self.selected)
            .map(|(name, value)| (name.as_str(), value.as_deref()))
            .collect()
    }

    /// Selected values from the root down to the first empty level.
    pub fn selected_path(&self) -> Vec<&str> {
        self.selected.iter().map_while(|s| s.as_deref()).collect()
    }

    /// State of a slot.
    pub fn slot(&self, slot: usize) -> Option<&SlotState> {
        self.slots.get(slot).map(|s| &s.state)
    }

    /// Loaded options of a slot, empty unless the slot is ready.
    pub fn options(&self, slot: usize) -> &[Record] {
        match self.slot(slot) {
            Some(SlotState::Ready(records)) => records,
            _ => &[],
        }
    }

    /// Loaded detail payload.
    pub fn detail(&self) -> &[Record] {
        self.options(self.detail_slot())
    }

    /// Issues the ticket for the root option slot.
    pub fn start(&mut self) -> FetchTicket {
        self.issue(0)
    }

    /// Selects `value` at `level`.
    ///
    /// Every deeper selection and slot is cleared, and the ticket for the
    /// next slot is returned. An empty `value` clears the level instead and
    /// returns `None`.
    pub fn select(
        &mut self,
        level: usize,
        value: impl Into<String>,
    ) -> Result<Option<FetchTicket>> {
        self.check_level(level)?;
        let value = value.into();
        if value.is_empty() {
            self.clear(level)?;
            return Ok(None);
        }
        if level > 0 && self.selected[level - 1].is_none() {
            return Err(Error::ParentNotSelected {
                level,
                parent: level - 1,
            });
        }

        self.selected[level] = Some(value);
        for deeper in &mut self.selected[level + 1..] {
            *deeper = None;
        }
        self.idle_from(level + 2);
        Ok(Some(self.issue(level + 1)))
    }

    /// Clears `level` and everything below it.
    pub fn clear(&mut self, level: usize) -> Result<()> {
        self.check_level(level)?;
        for value in &mut self.selected[level..] {
            *value = None;
        }
        self.idle_from(level + 1);
        Ok(())
    }

    /// Clears every selection. Root options are kept.
    pub fn reset(&mut self) {
        for value in &mut self.selected {
            *value = None;
        }
        self.idle_from(1);
    }

    /// Re-issues the fetch for `slot`, e.g. to retry after a failure.
    ///
    /// Returns `None` when the slot's parent level has no selection.
    pub fn refresh(&mut self, slot: usize) -> Result<Option<FetchTicket>> {
        if slot >= self.slots.len() {
            return Err(Error::LevelOutOfRange {
                level: slot,
                depth: self.slots.len(),
            });
        }
        if slot > 0 && self.selected[slot - 1].is_none() {
            return Ok(None);
        }
        Ok(Some(self.issue(slot)))
    }

    /// Hands a fetch result back to the chain.
    ///
    /// The result is applied only if `ticket` is the request the slot is
    /// still waiting for.
    pub fn complete(
        &mut self,
        ticket: &FetchTicket,
        result: std::result::Result<Vec<Record>, String>,
    ) -> Completion {
        let Some(slot) = self.slots.get_mut(ticket.slot) else {
            return Completion::Stale;
        };
        if slot.generation != ticket.generation || slot.state != SlotState::Pending {
            return Completion::Stale;
        }
        match result {
            Ok(records) => {
                slot.state = SlotState::Ready(records);
                Completion::Applied
            }
            Err(notice) => {
                slot.state = SlotState::Failed(notice);
                Completion::Failed
            }
        }
    }

    /// Whether the cascade invariant holds: no selection or loaded slot sits
    /// below an empty level.
    pub fn is_consistent(&self) -> bool {
        let first_empty = self
            .selected
            .iter()
            .position(Option::is_none)
            .unwrap_or(self.selected.len());

        let selections_ok = self.selected[first_empty..].iter().all(Option::is_none);
        let slots_ok = self.slots[first_empty + 1..]
            .iter()
            .all(|s| s.state == SlotState::Idle);
        selections_ok && slots_ok
    }

    fn check_level(&self, level: usize) -> Result<()> {
        if level >= self.names.len() {
            return Err(Error::LevelOutOfRange {
                level,
                depth: self.names.len(),
            });
        }
        Ok(())
    }

    fn idle_from(&mut self, slot: usize) {
        for s in self.slots.iter_mut().skip(slot) {
            s.state = SlotState::Idle;
        }
    }

    fn issue(&mut self, slot: usize) -> FetchTicket {
        self.next_generation += 1;
        let generation = self.next_generation;
        self.slots[slot] = Slot {
            state: SlotState::Pending,
            generation,
        };
        FetchTicket {
            slot,
            prefix: self.selected[..slot].iter().flatten().cloned().collect(),
            generation,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::RecordKind;
    use proptest::prelude::*;

    fn options(values: &[&str]) -> Vec<Record> {
        values
            .iter()
            .map(|v| Record::new(RecordKind::File).with("file_name", *v))
            .collect()
    }

    fn explorer() -> SelectionChain {
        SelectionChain::new(&["project", "file", "version", "view"]).unwrap()
    }

    #[test]
    fn start_requests_root_options() {
        let mut chain = explorer();
        let ticket = chain.start();
        assert_eq!(ticket.slot, 0);
        assert!(ticket.prefix.is_empty());
        assert_eq!(chain.slot(0), Some(&SlotState::Pending));
    }

    #[test]
    fn select_issues_ticket_for_next_level() {
        let mut chain = explorer();
        chain.select(0, "Tower").unwrap();
        let ticket = chain.select(1, "TWR_ARC.rvt").unwrap().unwrap();

        assert_eq!(ticket.slot, 2);
        assert_eq!(ticket.prefix, vec!["Tower", "TWR_ARC.rvt"]);
        assert_eq!(chain.selected_path(), vec!["Tower", "TWR_ARC.rvt"]);
    }

    #[test]
    fn deepest_level_requests_detail() {
        let mut chain = SelectionChain::new(&["project"]).unwrap();
        let ticket = chain.select(0, "Tower").unwrap().unwrap();
        assert_eq!(ticket.slot, chain.detail_slot());

        chain.complete(&ticket, Ok(options(&["a"])));
        assert_eq!(chain.detail().len(), 1);
    }

    #[test]
    fn changing_a_level_clears_everything_below() {
        let mut chain = explorer();
        let t1 = chain.select(0, "Tower").unwrap().unwrap();
        chain.complete(&t1, Ok(options(&["a.rvt"])));
        let t2 = chain.select(1, "a.rvt").unwrap().unwrap();
        chain.complete(&t2, Ok(options(&["1"])));
        chain.select(2, "1").unwrap();

        chain.select(0, "Depot").unwrap();

        assert_eq!(chain.selected(0), Some("Depot"));
        assert_eq!(chain.selected(1), None);
        assert_eq!(chain.selected(2), None);
        assert_eq!(chain.slot(1), Some(&SlotState::Pending));
        assert_eq!(chain.slot(2), Some(&SlotState::Idle));
        assert_eq!(chain.slot(3), Some(&SlotState::Idle));
        assert!(chain.is_consistent());
    }

    #[test]
    fn selecting_below_an_empty_parent_is_rejected() {
        let mut chain = explorer();
        let err = chain.select(2, "3").unwrap_err();
        assert!(matches!(err, Error::ParentNotSelected { level: 2, parent: 1 }));
        assert!(chain.is_consistent());
    }

    #[test]
    fn out_of_range_level_is_rejected() {
        let mut chain = explorer();
        assert!(matches!(
            chain.select(4, "x"),
            Err(Error::LevelOutOfRange { level: 4, depth: 4 })
        ));
    }

    #[test]
    fn empty_value_clears_the_level() {
        let mut chain = explorer();
        chain.select(0, "Tower").unwrap();
        chain.select(1, "a.rvt").unwrap();

        assert_eq!(chain.select(0, "").unwrap(), None);
        assert_eq!(chain.selected_path(), Vec::<&str>::new());
        assert!(chain.is_consistent());
    }

    #[test]
    fn slow_older_response_is_discarded() {
        let mut chain = explorer();
        let first = chain.select(0, "Tower").unwrap().unwrap();
        let second = chain.select(0, "Depot").unwrap().unwrap();

        assert_eq!(chain.complete(&second, Ok(options(&["depot.rvt"]))), Completion::Applied);
        assert_eq!(chain.complete(&first, Ok(options(&["tower.rvt"]))), Completion::Stale);

        assert_eq!(chain.options(1)[0].label("file_name").as_deref(), Some("depot.rvt"));
    }

    #[test]
    fn older_response_arriving_first_is_still_discarded() {
        let mut chain = explorer();
        let first = chain.select(0, "Tower").unwrap().unwrap();
        let second = chain.select(0, "Depot").unwrap().unwrap();

        assert_eq!(chain.complete(&first, Ok(options(&["tower.rvt"]))), Completion::Stale);
        assert_eq!(chain.slot(1), Some(&SlotState::Pending));
        assert_eq!(chain.complete(&second, Ok(options(&["depot.rvt"]))), Completion::Applied);
    }

    #[test]
    fn response_for_a_cleared_level_is_discarded() {
        let mut chain = explorer();
        let ticket = chain.select(0, "Tower").unwrap().unwrap();
        chain.clear(0).unwrap();

        assert_eq!(chain.complete(&ticket, Ok(options(&["a.rvt"]))), Completion::Stale);
        assert_eq!(chain.slot(1), Some(&SlotState::Idle));
    }

    #[test]
    fn failure_keeps_shallower_selections() {
        let mut chain = explorer();
        chain.select(0, "Tower").unwrap();
        let ticket = chain.select(1, "a.rvt").unwrap().unwrap();

        let outcome = chain.complete(&ticket, Err("backend unreachable".into()));
        assert_eq!(outcome, Completion::Failed);
        assert_eq!(chain.selected_path(), vec!["Tower", "a.rvt"]);
        assert_eq!(chain.slot(2), Some(&SlotState::Failed("backend unreachable".into())));
        assert!(chain.options(2).is_empty());

        let retry = chain.refresh(2).unwrap().unwrap();
        assert_eq!(retry.prefix, vec!["Tower", "a.rvt"]);
        assert_eq!(chain.complete(&retry, Ok(options(&["1"]))), Completion::Applied);
    }

    #[test]
    fn refresh_without_parent_selection_does_nothing() {
        let mut chain = explorer();
        assert_eq!(chain.refresh(2).unwrap(), None);
        assert!(chain.refresh(9).is_err());
    }

    #[test]
    fn reset_clears_selections_but_keeps_root_options() {
        let mut chain = explorer();
        let root = chain.start();
        chain.complete(&root, Ok(options(&["Tower", "Depot"])));
        chain.select(0, "Tower").unwrap();

        chain.reset();

        assert_eq!(chain.selected(0), None);
        assert_eq!(chain.options(0).len(), 2);
        assert_eq!(chain.slot(1), Some(&SlotState::Idle));
        assert!(chain.is_consistent());
    }

    #[derive(Debug, Clone)]
    enum Op {
        Select(usize, u8),
        Clear(usize),
        Reset,
        Refresh(usize),
        Complete(usize, bool),
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            4 => (0usize..4, 0u8..3).prop_map(|(level, value)| Op::Select(level, value)),
            1 => (0usize..4).prop_map(Op::Clear),
            1 => Just(Op::Reset),
            1 => (0usize..5).prop_map(Op::Refresh),
            3 => (any::<usize>(), any::<bool>()).prop_map(|(pick, ok)| Op::Complete(pick, ok)),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig { cases: 256, .. ProptestConfig::default() })]

        #[test]
        fn cascade_invariant_holds_for_any_operation_sequence(
            ops in prop::collection::vec(op_strategy(), 1..64),
        ) {
            let mut chain = explorer();
            let root = chain.start();
            let mut latest = vec![0u64; chain.depth() + 1];
            latest[root.slot] = root.generation;
            let mut pending = vec![root];

            for op in ops {
                let issued = match op {
                    Op::Select(level, value) => {
                        chain.select(level, format!("v{value}")).ok().flatten()
                    }
                    Op::Clear(level) => {
                        chain.clear(level).unwrap();
                        None
                    }
                    Op::Reset => {
                        chain.reset();
                        None
                    }
                    Op::Refresh(slot) => chain.refresh(slot).unwrap(),
                    Op::Complete(pick, ok) => {
                        if !pending.is_empty() {
                            let ticket = pending.remove(pick % pending.len());
                            let result = if ok {
                                Ok(options(&["x"]))
                            } else {
                                Err("down".to_string())
                            };
                            let outcome = chain.complete(&ticket, result);
                            if ticket.generation < latest[ticket.slot] {
                                prop_assert_eq!(outcome, Completion::Stale);
                            }
                        }
                        None
                    }
                };
                if let Some(ticket) = issued {
                    latest[ticket.slot] = ticket.generation;
                    pending.push(ticket);
                }
                prop_assert!(chain.is_consistent(), "inconsistent after {:?}", chain.selections());
            }
        }
    }
}
