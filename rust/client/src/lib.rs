// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # BIM-Dash Client
//!
//! Talks to the project-data backend and drives the dashboard's cascading
//! selectors.
//!
//! - [`Backend`] is the seam to the REST backend; [`HttpBackend`] implements
//!   it over reqwest and validates every payload against the schemas in
//!   `bim_dash_core`.
//! - [`Cascade`] owns a [`SelectionChain`](bim_dash_core::SelectionChain)
//!   and runs each level's fetch on a spawned task. Results come back over a
//!   channel and pass through the chain's generation guard, so the last
//!   selection always wins no matter in which order responses arrive.
//! - [`DesignerDirectory`], [`ProjectsOverview`] and [`ChatTranscript`] are the
//!   page-level controllers built on top.
//! - [`Geocoder`] turns project coordinates into city names, caching each
//!   coordinate pair for the session.

pub mod backend;
pub mod cascade;
pub mod chat;
pub mod directory;
pub mod error;
pub mod geocode;
pub mod http;
pub mod map;
pub mod overview;

#[cfg(test)]
pub(crate) mod testing;

pub use backend::Backend;
pub use cascade::{Cascade, CascadeSnapshot, LevelSnapshot};
pub use chat::{ChatMessage, ChatRole, ChatTranscript};
pub use directory::DesignerDirectory;
pub use error::{ClientError, Result};
pub use geocode::{Geocoder, UNKNOWN_CITY};
pub use http::HttpBackend;
pub use map::{load_map_points, MapPoint};
pub use overview::{views_tree, ProjectsOverview};
