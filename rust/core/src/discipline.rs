// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Discipline derivation and the designer discipline catalogue.
//!
//! Model files carry their discipline as an underscore-separated token of the
//! file name (`PRJ_ARC_model.rvt`). There is no validation of that naming
//! convention: files that do not follow it land under the fallback label.

use serde::{Deserialize, Serialize};

/// Fallback label for records whose discipline cannot be determined.
pub const NO_DISCIPLINE: &str = "No discipline";

/// Token index of the discipline in a conventional file name.
pub const DISCIPLINE_TOKEN_INDEX: usize = 1;

/// Returns the `index`-th `_`-separated token of a file name.
///
/// Empty tokens (`A__B`) count as missing.
pub fn file_name_token(file_name: &str, index: usize) -> Option<&str> {
    file_name.split('_').nth(index).filter(|token| !token.is_empty())
}

/// Returns the discipline token of a conventional file name.
pub fn discipline_from_file_name(file_name: &str) -> Option<&str> {
    file_name_token(file_name, DISCIPLINE_TOKEN_INDEX)
}

/// Disciplines offered by the designer form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DesignerDiscipline {
    Architecture,
    Structure,
    Installation,
    AirConditioning,
    Electrical,
    Pneumatics,
    Sprinklers,
    Other,
}

impl DesignerDiscipline {
    /// Every catalogue entry, in form order.
    pub const ALL: [DesignerDiscipline; 8] = [
        DesignerDiscipline::Architecture,
        DesignerDiscipline::Structure,
        DesignerDiscipline::Installation,
        DesignerDiscipline::AirConditioning,
        DesignerDiscipline::Electrical,
        DesignerDiscipline::Pneumatics,
        DesignerDiscipline::Sprinklers,
        DesignerDiscipline::Other,
    ];

    /// Display label stored on designer records.
    pub fn label(&self) -> &'static str {
        match self {
            DesignerDiscipline::Architecture => "Architecture",
            DesignerDiscipline::Structure => "Structure",
            DesignerDiscipline::Installation => "Installation",
            DesignerDiscipline::AirConditioning => "Air conditioning",
            DesignerDiscipline::Electrical => "Electrical",
            DesignerDiscipline::Pneumatics => "Pneumatics",
            DesignerDiscipline::Sprinklers => "Sprinklers",
            DesignerDiscipline::Other => "Other",
        }
    }

    /// Looks up a catalogue entry by its label.
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|d| d.label() == label)
    }

    /// Resolves the form selection into the stored discipline text.
    ///
    /// `Other` stores the free-text value typed by the user.
    pub fn resolve(selected: &str, custom: &str) -> String {
        match Self::from_label(selected) {
            Some(DesignerDiscipline::Other) => custom.trim().to_string(),
            _ => selected.to_string(),
        }
    }

    /// Splits a stored discipline back into `(selected label, custom text)`.
    pub fn split_for_form(stored: &str) -> (&'static str, String) {
        match Self::from_label(stored) {
            Some(known) if known != DesignerDiscipline::Other => (known.label(), String::new()),
            _ => (DesignerDiscipline::Other.label(), stored.to_string()),
        }
    }
}

impl std::fmt::Display for DesignerDiscipline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_token_is_the_discipline() {
        assert_eq!(discipline_from_file_name("TWR_ARC_central.rvt"), Some("ARC"));
        assert_eq!(discipline_from_file_name("TWR_STR.rvt"), Some("STR.rvt"));
    }

    #[test]
    fn unconventional_names_have_no_discipline() {
        assert_eq!(discipline_from_file_name("central.rvt"), None);
        assert_eq!(discipline_from_file_name("TWR__model.rvt"), None);
        assert_eq!(discipline_from_file_name(""), None);
    }

    #[test]
    fn token_lookup_by_index() {
        assert_eq!(file_name_token("ARC_model.rvt", 0), Some("ARC"));
        assert_eq!(file_name_token("ARC_model.rvt", 1), Some("model.rvt"));
        assert_eq!(file_name_token("ARC_model.rvt", 2), None);
    }

    #[test]
    fn other_resolves_to_custom_text() {
        assert_eq!(DesignerDiscipline::resolve("Electrical", "ignored"), "Electrical");
        assert_eq!(DesignerDiscipline::resolve("Other", "  Acoustics "), "Acoustics");
    }

    #[test]
    fn stored_custom_discipline_reopens_as_other() {
        assert_eq!(
            DesignerDiscipline::split_for_form("Structure"),
            ("Structure", String::new())
        );
        assert_eq!(
            DesignerDiscipline::split_for_form("Acoustics"),
            ("Other", "Acoustics".to_string())
        );
    }
}
