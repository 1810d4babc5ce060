// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # BIM-Dash Core
//!
//! Data shaping and view state for the BIM project dashboard.
//!
//! The backend hands out flat lists of records (file versions, 3D views,
//! elements, designers, project coordinates). This crate turns them into
//! what a progressive-disclosure display needs:
//!
//! - **Grouping**: [`build_group_tree`] nests records by an ordered
//!   [`GroupKey`] (project → discipline → file → version → records), keeping
//!   first-occurrence order and substituting a fallback label for absent fields.
//! - **Option sets**: [`distinct_values`] and [`distinct_values_by`] feed the
//!   dependent selector controls.
//! - **Cascading selection**: [`SelectionChain`] keeps a chain of dependent
//!   selections consistent and hands out generation-tagged [`FetchTicket`]s so
//!   that a stale response can never overwrite a newer one.
//! - **Persisted state**: [`KeyValueStore`] with a JSON file backend and the
//!   [`IdeasNotebook`] kept in it.
//!
//! ## Quick Start
//!
//! ```rust
//! use bim_dash_core::{build_group_tree, GroupKey, KeyPart, Record, RecordKind};
//!
//! let records = vec![
//!     Record::new(RecordKind::FileVersion).with("project", "A"),
//!     Record::new(RecordKind::FileVersion)
//!         .with("project", "A")
//!         .with("discipline", "Arch"),
//! ];
//! let key = GroupKey::new(vec![KeyPart::field("project"), KeyPart::field("discipline")]).unwrap();
//! let tree = build_group_tree(&records, &key);
//!
//! assert_eq!(tree.get(&["A", "No discipline"]).unwrap().leaf_count(), 1);
//! assert_eq!(tree.get(&["A", "Arch"]).unwrap().leaf_count(), 1);
//! ```

pub mod designer;
pub mod discipline;
pub mod error;
pub mod group;
pub mod notes;
pub mod record;
pub mod selection;
pub mod store;

pub use designer::{DesignerFilter, DesignerFilterOptions, FieldError, ValidationErrors};
pub use discipline::{discipline_from_file_name, file_name_token, DesignerDiscipline, NO_DISCIPLINE};
pub use error::{Error, Result};
pub use group::{
    build_group_tree, distinct_values, distinct_values_by, sorted, GroupBranch, GroupKey,
    GroupTree, KeySource, KeyPart,
};
pub use notes::{IdeasNotebook, NoteSection, NOTES_KEY};
pub use record::{
    parse_list, to_records, ChatAnswer, ChatQuestion, Designer, DesignerDraft, Element,
    IntoRecord, ProjectCoordinate, ProjectFileVersion, Record, RecordKind, ViewRef, ViewSummary,
    ViewsTableEntry,
};
pub use selection::{Completion, FetchTicket, SelectionChain, SlotState};
pub use store::{JsonFileStore, KeyValueStore, MemoryStore};
