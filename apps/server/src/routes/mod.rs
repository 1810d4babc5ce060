// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! HTTP route handlers.

pub mod chat;
pub mod designers;
pub mod explorer;
pub mod health;
pub mod map;
pub mod notes;
pub mod projects;
pub mod views;
