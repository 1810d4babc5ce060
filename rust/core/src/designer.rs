// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Designer form validation and list filtering.

use std::sync::OnceLock;

use regex::Regex;
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::group::sorted;
use crate::record::{Designer, DesignerDraft};

fn email_pattern() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| {
        Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email pattern is valid")
    })
}

fn phone_pattern() -> &'static Regex {
    static PHONE: OnceLock<Regex> = OnceLock::new();
    PHONE.get_or_init(|| Regex::new(r"^\+?\d[\d\s\-]{7,}$").expect("phone pattern is valid"))
}

/// A single rejected form field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

/// Every problem found in a designer draft.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[error("invalid designer: {}", describe(.errors))]
pub struct ValidationErrors {
    pub errors: Vec<FieldError>,
}

fn describe(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| format!("{} {}", e.field, e.message))
        .collect::<Vec<_>>()
        .join("; ")
}

impl ValidationErrors {
    /// Names of the rejected fields, in form order.
    pub fn fields(&self) -> Vec<&'static str> {
        self.errors.iter().map(|e| e.field).collect()
    }
}

impl DesignerDraft {
    /// Copy with surrounding whitespace removed from every field.
    pub fn normalized(&self) -> DesignerDraft {
        DesignerDraft {
            project_name: self.project_name.trim().to_string(),
            discipline: self.discipline.trim().to_string(),
            first_name: self.first_name.trim().to_string(),
            last_name: self.last_name.trim().to_string(),
            company: self.company.trim().to_string(),
            email: self.email.trim().to_string(),
            phone: self.phone.trim().to_string(),
            position: self.position.trim().to_string(),
        }
    }

    /// Checks the draft before it is sent to the backend.
    ///
    /// All fields are checked so the form can flag every problem at once.
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = Vec::new();
        let mut require = |field: &'static str, value: &str| {
            if value.trim().is_empty() {
                errors.push(FieldError {
                    field,
                    message: "must not be empty".to_string(),
                });
            }
        };
        require("project_name", &self.project_name);
        require("discipline", &self.discipline);
        require("first_name", &self.first_name);
        require("last_name", &self.last_name);

        if !email_pattern().is_match(self.email.trim()) {
            errors.push(FieldError {
                field: "email",
                message: format!("{:?} is not a valid email address", self.email),
            });
        }
        if !phone_pattern().is_match(self.phone.trim()) {
            errors.push(FieldError {
                field: "phone",
                message: format!("{:?} is not a valid phone number", self.phone),
            });
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationErrors { errors })
        }
    }
}

/// Designer list filters. Empty strings mean "any".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DesignerFilter {
    /// Exact discipline match.
    #[serde(default)]
    pub discipline: Option<String>,
    /// Case-insensitive substring of the company.
    #[serde(default)]
    pub company: Option<String>,
    /// Case-insensitive substring of the position.
    #[serde(default)]
    pub position: Option<String>,
}

impl DesignerFilter {
    /// Whether no filter is active.
    pub fn is_empty(&self) -> bool {
        active(&self.discipline).is_none()
            && active(&self.company).is_none()
            && active(&self.position).is_none()
    }

    pub fn matches(&self, designer: &Designer) -> bool {
        let discipline_ok = active(&self.discipline).map_or(true, |d| designer.discipline == d);
        let company_ok = active(&self.company).map_or(true, |c| contains_ci(&designer.company, c));
        let position_ok =
            active(&self.position).map_or(true, |p| contains_ci(&designer.position, p));
        discipline_ok && company_ok && position_ok
    }

    /// Designers passing every active filter, in input order.
    pub fn apply(&self, designers: &[Designer]) -> Vec<Designer> {
        designers
            .iter()
            .filter(|d| self.matches(d))
            .cloned()
            .collect()
    }
}

fn active(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// Values offered by the three filter selectors, sorted for display.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DesignerFilterOptions {
    pub disciplines: Vec<String>,
    pub companies: Vec<String>,
    pub positions: Vec<String>,
}

impl DesignerFilterOptions {
    pub fn from_designers(designers: &[Designer]) -> Self {
        let collect = |pick: fn(&Designer) -> &str| {
            sorted(
                designers
                    .iter()
                    .map(|d| pick(d).to_string())
                    .collect::<FxHashSet<_>>(),
            )
        };
        Self {
            disciplines: collect(|d| d.discipline.as_str()),
            companies: collect(|d| d.company.as_str()),
            positions: collect(|d| d.position.as_str()),
        }
    }
}
