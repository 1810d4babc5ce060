// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Cascading selectors driven against a [`Backend`].
//!
//! A [`Cascade`] pairs a [`SelectionChain`] with a fixed layout that says how
//! each slot is filled. Remote slots are fetched on spawned tokio tasks; each
//! task sends its ticket and result back over an mpsc channel, and the owner
//! applies outcomes in arrival order through [`SelectionChain::complete`].
//! Local slots are derived synchronously from data already loaded.
//!
//! Methods that issue fetches spawn tasks and must be called from within a
//! tokio runtime.

use std::sync::Arc;

use bim_dash_core::{
    to_records, Completion, FetchTicket, Record, RecordKind, SelectionChain, SlotState,
};
use futures::future::BoxFuture;
use futures::FutureExt;
use rustc_hash::FxHashSet;
use serde::Serialize;
use tokio::sync::mpsc;

use crate::backend::Backend;
use crate::error::{ClientError, Result};

type SlotFuture = BoxFuture<'static, Result<Vec<Record>>>;
type RemoteFetch = fn(Arc<dyn Backend>, Vec<String>) -> SlotFuture;
type LocalDerive = fn(&SelectionChain, &[String]) -> Vec<Record>;

#[derive(Clone, Copy)]
enum SlotSource {
    Remote(RemoteFetch),
    Local(LocalDerive),
}

struct SlotSpec {
    source: SlotSource,
    /// Field rendered as the option label.
    label_field: &'static str,
}

struct Layout {
    name: &'static str,
    levels: &'static [&'static str],
    /// One spec per level plus the detail slot.
    slots: &'static [SlotSpec],
}

static ELEMENTS_EXPLORER: Layout = Layout {
    name: "elements",
    levels: &["project", "file", "version", "view"],
    slots: &[
        SlotSpec {
            source: SlotSource::Remote(fetch_projects),
            label_field: "project",
        },
        SlotSpec {
            source: SlotSource::Remote(fetch_files),
            label_field: "file_name",
        },
        SlotSpec {
            source: SlotSource::Remote(fetch_views),
            label_field: "version_number",
        },
        SlotSpec {
            source: SlotSource::Local(views_of_version),
            label_field: "view_name",
        },
        SlotSpec {
            source: SlotSource::Remote(fetch_elements),
            label_field: "name",
        },
    ],
};

static DESIGNER_DIRECTORY: Layout = Layout {
    name: "designers",
    levels: &["project"],
    slots: &[
        SlotSpec {
            source: SlotSource::Remote(fetch_coordinates),
            label_field: "project",
        },
        SlotSpec {
            source: SlotSource::Remote(fetch_designers),
            label_field: "last_name",
        },
    ],
};

fn unexpected_prefix(prefix: &[String]) -> ClientError {
    ClientError::InvalidSelection {
        level: "prefix".to_string(),
        value: prefix.join("/"),
    }
}

fn fetch_projects(backend: Arc<dyn Backend>, prefix: Vec<String>) -> SlotFuture {
    load_projects(backend, prefix).boxed()
}

fn fetch_files(backend: Arc<dyn Backend>, prefix: Vec<String>) -> SlotFuture {
    load_files(backend, prefix).boxed()
}

fn fetch_views(backend: Arc<dyn Backend>, prefix: Vec<String>) -> SlotFuture {
    load_views(backend, prefix).boxed()
}

fn fetch_elements(backend: Arc<dyn Backend>, prefix: Vec<String>) -> SlotFuture {
    load_elements(backend, prefix).boxed()
}

fn fetch_coordinates(backend: Arc<dyn Backend>, prefix: Vec<String>) -> SlotFuture {
    load_coordinates(backend, prefix).boxed()
}

fn fetch_designers(backend: Arc<dyn Backend>, prefix: Vec<String>) -> SlotFuture {
    load_designers(backend, prefix).boxed()
}

async fn load_projects(backend: Arc<dyn Backend>, _prefix: Vec<String>) -> Result<Vec<Record>> {
    let projects = backend.list_projects().await?;
    Ok(projects
        .into_iter()
        .map(|project| Record::new(RecordKind::Project).with("project", project))
        .collect())
}

async fn load_files(backend: Arc<dyn Backend>, prefix: Vec<String>) -> Result<Vec<Record>> {
    let [project] = prefix.as_slice() else {
        return Err(unexpected_prefix(&prefix));
    };
    let files = backend.list_files(project).await?;
    Ok(files
        .into_iter()
        .map(|file_name| {
            Record::new(RecordKind::File)
                .with("project", project.as_str())
                .with("file_name", file_name)
        })
        .collect())
}

async fn load_views(backend: Arc<dyn Backend>, prefix: Vec<String>) -> Result<Vec<Record>> {
    let [project, file_name] = prefix.as_slice() else {
        return Err(unexpected_prefix(&prefix));
    };
    let views = backend.list_views_3d(project, file_name).await?;
    Ok(to_records(&views)?)
}

/// Views of the selected file that belong to the selected version.
fn views_of_version(chain: &SelectionChain, prefix: &[String]) -> Vec<Record> {
    let Some(version) = prefix.get(2) else {
        return Vec::new();
    };
    chain
        .options(2)
        .iter()
        .filter(|view| view.label("version_number").as_deref() == Some(version.as_str()))
        .cloned()
        .collect()
}

async fn load_elements(backend: Arc<dyn Backend>, prefix: Vec<String>) -> Result<Vec<Record>> {
    let [project, file_name, version, view_name] = prefix.as_slice() else {
        return Err(unexpected_prefix(&prefix));
    };
    let version_number = version
        .parse::<i64>()
        .map_err(|_| ClientError::InvalidSelection {
            level: "version".to_string(),
            value: version.clone(),
        })?;
    let elements = backend
        .list_elements(project, file_name, version_number, view_name)
        .await?;
    Ok(to_records(&elements)?)
}

async fn load_coordinates(backend: Arc<dyn Backend>, _prefix: Vec<String>) -> Result<Vec<Record>> {
    let coordinates = backend.list_coordinates().await?;
    Ok(to_records(&coordinates)?)
}

async fn load_designers(backend: Arc<dyn Backend>, prefix: Vec<String>) -> Result<Vec<Record>> {
    let [project] = prefix.as_slice() else {
        return Err(unexpected_prefix(&prefix));
    };
    let designers = backend.list_designers(project).await?;
    Ok(to_records(&designers)?)
}

struct Outcome {
    ticket: FetchTicket,
    result: Result<Vec<Record>>,
}

/// One selector level as shown to the user.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LevelSnapshot {
    pub name: String,
    pub selected: Option<String>,
    /// `idle`, `pending`, `ready` or `failed`.
    pub status: &'static str,
    pub options: Vec<String>,
    pub notice: Option<String>,
}

/// Serializable view of a cascade.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CascadeSnapshot {
    pub layout: &'static str,
    pub levels: Vec<LevelSnapshot>,
    pub detail_status: &'static str,
    pub detail_notice: Option<String>,
    pub detail: Vec<Record>,
    pub in_flight: usize,
    pub notices: Vec<String>,
}

fn status_of(state: Option<&SlotState>) -> (&'static str, Option<String>) {
    match state {
        None | Some(SlotState::Idle) => ("idle", None),
        Some(SlotState::Pending) => ("pending", None),
        Some(SlotState::Ready(_)) => ("ready", None),
        Some(SlotState::Failed(notice)) => ("failed", Some(notice.clone())),
    }
}

/// Selection chain wired to a backend.
pub struct Cascade {
    layout: &'static Layout,
    backend: Arc<dyn Backend>,
    chain: SelectionChain,
    outcomes_tx: mpsc::UnboundedSender<Outcome>,
    outcomes_rx: mpsc::UnboundedReceiver<Outcome>,
    in_flight: usize,
    notices: Vec<String>,
}

impl Cascade {
    /// project → file → version → view, with the view's elements as detail.
    ///
    /// The version options are the distinct version numbers among the file's
    /// 3D views; the view options are those views filtered by the selected
    /// version, without another request.
    pub fn elements_explorer(backend: Arc<dyn Backend>) -> Result<Self> {
        Self::with_layout(&ELEMENTS_EXPLORER, backend)
    }

    /// Projects taken from the coordinates list, with the selected project's
    /// designers as detail.
    pub fn designer_directory(backend: Arc<dyn Backend>) -> Result<Self> {
        Self::with_layout(&DESIGNER_DIRECTORY, backend)
    }

    fn with_layout(layout: &'static Layout, backend: Arc<dyn Backend>) -> Result<Self> {
        let chain = SelectionChain::new(layout.levels)?;
        let (outcomes_tx, outcomes_rx) = mpsc::unbounded_channel();
        Ok(Self {
            layout,
            backend,
            chain,
            outcomes_tx,
            outcomes_rx,
            in_flight: 0,
            notices: Vec::new(),
        })
    }

    pub fn layout_name(&self) -> &'static str {
        self.layout.name
    }

    pub fn chain(&self) -> &SelectionChain {
        &self.chain
    }

    pub(crate) fn backend(&self) -> &Arc<dyn Backend> {
        &self.backend
    }

    /// Fetches the root options.
    pub fn start(&mut self) {
        let ticket = self.chain.start();
        self.dispatch(ticket);
    }

    /// Selects `value` at `level` and fetches the next slot. An empty value
    /// clears the level.
    pub fn select(&mut self, level: usize, value: &str) -> Result<()> {
        if let Some(ticket) = self.chain.select(level, value)? {
            self.dispatch(ticket);
        }
        Ok(())
    }

    /// [`select`](Self::select) addressed by level name.
    pub fn select_named(&mut self, level: &str, value: &str) -> Result<()> {
        let index = self
            .chain
            .level_index(level)
            .ok_or_else(|| ClientError::InvalidSelection {
                level: level.to_string(),
                value: value.to_string(),
            })?;
        self.select(index, value)
    }

    /// Clears `level` and every deeper level.
    pub fn clear(&mut self, level: usize) -> Result<()> {
        Ok(self.chain.clear(level)?)
    }

    /// Clears every selection; root options stay loaded.
    pub fn reset(&mut self) {
        self.chain.reset();
    }

    /// Re-fetches `slot`, e.g. after a failure.
    pub fn refresh(&mut self, slot: usize) -> Result<()> {
        if let Some(ticket) = self.chain.refresh(slot)? {
            self.dispatch(ticket);
        }
        Ok(())
    }

    /// Re-fetches the detail slot.
    pub fn refresh_detail(&mut self) -> Result<()> {
        self.refresh(self.chain.detail_slot())
    }

    fn dispatch(&mut self, ticket: FetchTicket) {
        let Some(spec) = self.layout.slots.get(ticket.slot) else {
            return;
        };
        match spec.source {
            SlotSource::Local(derive) => {
                let records = derive(&self.chain, &ticket.prefix);
                self.chain.complete(&ticket, Ok(records));
            }
            SlotSource::Remote(fetch) => {
                tracing::debug!(
                    layout = self.layout.name,
                    slot = ticket.slot,
                    generation = ticket.generation,
                    "Fetching options"
                );
                let future = fetch(Arc::clone(&self.backend), ticket.prefix.clone());
                let tx = self.outcomes_tx.clone();
                self.in_flight += 1;
                tokio::spawn(async move {
                    let result = future.await;
                    // The receiver only goes away with the cascade itself.
                    let _ = tx.send(Outcome { ticket, result });
                });
            }
        }
    }

    fn apply(&mut self, outcome: Outcome) -> Completion {
        let Outcome { ticket, result } = outcome;
        let result = result.map_err(|e| {
            tracing::warn!(
                layout = self.layout.name,
                slot = ticket.slot,
                error = %e,
                "Fetch failed"
            );
            e.notice()
        });
        let completion = self.chain.complete(&ticket, result);

        match completion {
            Completion::Applied => {
                // A local child derived while this slot was still loading
                // saw no data; derive it again now.
                let child = ticket.slot + 1;
                let child_is_local = matches!(
                    self.layout.slots.get(child).map(|s| s.source),
                    Some(SlotSource::Local(_))
                );
                if child_is_local && self.chain.selected(ticket.slot).is_some() {
                    if let Ok(Some(next)) = self.chain.refresh(child) {
                        self.dispatch(next);
                    }
                }
            }
            Completion::Failed => {
                if let Some(SlotState::Failed(notice)) = self.chain.slot(ticket.slot) {
                    let notice = format!("{}: {}", self.slot_name(ticket.slot), notice);
                    self.notices.push(notice);
                }
            }
            Completion::Stale => {
                tracing::debug!(
                    layout = self.layout.name,
                    slot = ticket.slot,
                    generation = ticket.generation,
                    "Discarded stale response"
                );
            }
        }
        completion
    }

    fn slot_name(&self, slot: usize) -> &'static str {
        self.layout.levels.get(slot).copied().unwrap_or("details")
    }

    /// Waits for the next fetch to finish and applies it. Returns `None` when
    /// nothing is in flight.
    pub async fn next_outcome(&mut self) -> Option<Completion> {
        if self.in_flight == 0 {
            return None;
        }
        let outcome = self.outcomes_rx.recv().await?;
        self.in_flight -= 1;
        Some(self.apply(outcome))
    }

    /// Applies every outcome that has already arrived, without waiting.
    pub fn drain_ready(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(outcome) = self.outcomes_rx.try_recv() {
            self.in_flight = self.in_flight.saturating_sub(1);
            self.apply(outcome);
            applied += 1;
        }
        applied
    }

    /// Waits until no fetch is in flight.
    pub async fn settle(&mut self) {
        while self.next_outcome().await.is_some() {}
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    /// Distinct option labels of `slot`, in first-seen order.
    pub fn option_labels(&self, slot: usize) -> Vec<String> {
        let Some(spec) = self.layout.slots.get(slot) else {
            return Vec::new();
        };
        let mut seen = FxHashSet::default();
        self.chain
            .options(slot)
            .iter()
            .filter_map(|record| record.label(spec.label_field))
            .filter(|label| seen.insert(label.clone()))
            .collect()
    }

    /// Returns and clears accumulated failure notices.
    pub fn take_notices(&mut self) -> Vec<String> {
        std::mem::take(&mut self.notices)
    }

    pub fn snapshot(&self) -> CascadeSnapshot {
        let levels = self
            .chain
            .selections()
            .into_iter()
            .enumerate()
            .map(|(slot, (name, selected))| {
                let (status, notice) = status_of(self.chain.slot(slot));
                LevelSnapshot {
                    name: name.to_string(),
                    selected: selected.map(str::to_string),
                    status,
                    options: self.option_labels(slot),
                    notice,
                }
            })
            .collect();
        let (detail_status, detail_notice) = status_of(self.chain.slot(self.chain.detail_slot()));

        CascadeSnapshot {
            layout: self.layout.name,
            levels,
            detail_status,
            detail_notice,
            detail: self.chain.detail().to_vec(),
            in_flight: self.in_flight,
            notices: self.notices.clone(),
        }
    }
}
