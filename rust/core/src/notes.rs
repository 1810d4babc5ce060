// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The free-text ideas notebook.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::store::KeyValueStore;

/// Store key holding the notebook.
pub const NOTES_KEY: &str = "project_ideas";

/// One text area of the notebook.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoteSection {
    TechnicalCurrent,
    TechnicalFuture,
    CompanyCurrent,
    CompanyFuture,
    ClientCurrent,
    ClientFuture,
}

impl NoteSection {
    pub const ALL: [NoteSection; 6] = [
        NoteSection::TechnicalCurrent,
        NoteSection::TechnicalFuture,
        NoteSection::CompanyCurrent,
        NoteSection::CompanyFuture,
        NoteSection::ClientCurrent,
        NoteSection::ClientFuture,
    ];

    /// Stable identifier used in URLs and the stored document.
    pub fn as_str(&self) -> &'static str {
        match self {
            NoteSection::TechnicalCurrent => "technical_current",
            NoteSection::TechnicalFuture => "technical_future",
            NoteSection::CompanyCurrent => "company_current",
            NoteSection::CompanyFuture => "company_future",
            NoteSection::ClientCurrent => "client_current",
            NoteSection::ClientFuture => "client_future",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|section| section.as_str() == s)
    }

    pub fn title(&self) -> &'static str {
        match self {
            NoteSection::TechnicalCurrent => "Technical solutions: current ideas",
            NoteSection::TechnicalFuture => "Technical solutions: new ideas",
            NoteSection::CompanyCurrent => "Internal coordination: current ideas",
            NoteSection::CompanyFuture => "Internal coordination: new ideas",
            NoteSection::ClientCurrent => "Client solutions: current ideas",
            NoteSection::ClientFuture => "Client solutions: new ideas",
        }
    }
}

/// Six free-text sections, persisted as one document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IdeasNotebook {
    pub technical_current: String,
    pub technical_future: String,
    pub company_current: String,
    pub company_future: String,
    pub client_current: String,
    pub client_future: String,
}

impl IdeasNotebook {
    /// Loads the notebook, falling back to an empty one when the stored
    /// document is missing or unreadable.
    pub fn load<S: KeyValueStore + ?Sized>(store: &S) -> Self {
        let Some(value) = store.get(NOTES_KEY) else {
            return Self::default();
        };
        if !value.is_object() {
            tracing::warn!("Stored notebook is not an object, starting empty");
            return Self::default();
        }
        serde_json::from_value(value).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Stored notebook is malformed, starting empty");
            Self::default()
        })
    }

    /// Writes the whole notebook to `store`.
    pub fn save<S: KeyValueStore + ?Sized>(&self, store: &mut S) -> Result<()> {
        store.set(NOTES_KEY, serde_json::to_value(self)?)
    }

    pub fn section(&self, section: NoteSection) -> &str {
        match section {
            NoteSection::TechnicalCurrent => &self.technical_current,
            NoteSection::TechnicalFuture => &self.technical_future,
            NoteSection::CompanyCurrent => &self.company_current,
            NoteSection::CompanyFuture => &self.company_future,
            NoteSection::ClientCurrent => &self.client_current,
            NoteSection::ClientFuture => &self.client_future,
        }
    }

    fn section_mut(&mut self, section: NoteSection) -> &mut String {
        match section {
            NoteSection::TechnicalCurrent => &mut self.technical_current,
            NoteSection::TechnicalFuture => &mut self.technical_future,
            NoteSection::CompanyCurrent => &mut self.company_current,
            NoteSection::CompanyFuture => &mut self.company_future,
            NoteSection::ClientCurrent => &mut self.client_current,
            NoteSection::ClientFuture => &mut self.client_future,
        }
    }

    /// Replaces one section and writes the notebook through to `store`.
    ///
    /// If the write fails the in-memory notebook is left unchanged.
    pub fn edit<S: KeyValueStore + ?Sized>(
        &mut self,
        store: &mut S,
        section: NoteSection,
        text: impl Into<String>,
    ) -> Result<()> {
        let mut updated = self.clone();
        *updated.section_mut(section) = text.into();
        updated.save(store)?;
        *self = updated;
        Ok(())
    }

    /// Plain-text export, one titled block per section.
    pub fn render_text(&self) -> String {
        NoteSection::ALL
            .iter()
            .map(|section| {
                let body = self.section(*section).trim();
                let body = if body.is_empty() { "-" } else { body };
                format!("{}\n{}\n", section.title(), body)
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}
