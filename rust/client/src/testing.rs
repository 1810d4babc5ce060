// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! In-memory backend for unit tests.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bim_dash_core::{
    ChatAnswer, Designer, DesignerDraft, Element, ProjectCoordinate, ProjectFileVersion,
    ViewSummary, ViewsTableEntry,
};
use rustc_hash::{FxHashMap, FxHashSet};
use serde_json::json;
use tokio::sync::Notify;

use crate::backend::Backend;
use crate::error::{ClientError, Result};

/// Canned backend. Calls listed in `failing` return a 500, and a call whose
/// key argument has a gate waits for that gate to be notified.
#[derive(Default)]
pub(crate) struct StubBackend {
    pub projects: Vec<String>,
    pub files: FxHashMap<String, Vec<String>>,
    pub views: FxHashMap<String, Vec<ViewSummary>>,
    pub elements: FxHashMap<String, Vec<Element>>,
    pub coordinates: Vec<ProjectCoordinate>,
    pub table: Vec<ProjectFileVersion>,
    pub views_table: Vec<ViewsTableEntry>,
    pub designers: Mutex<Vec<(String, Designer)>>,
    pub gates: FxHashMap<String, Arc<Notify>>,
    pub failing: FxHashSet<&'static str>,
    pub calls: Mutex<Vec<String>>,
}

impl StubBackend {
    /// Two projects with a small file/version/view tree under `Tower`.
    pub fn sample() -> Self {
        let mut stub = Self {
            projects: vec!["Tower".into(), "Depot".into()],
            ..Default::default()
        };
        stub.files.insert(
            "Tower".into(),
            vec!["TWR_ARC_main.rvt".into(), "TWR_STR_frame.rvt".into()],
        );
        stub.files
            .insert("Depot".into(), vec!["DPT_MEP_services.rvt".into()]);
        stub.views.insert(
            "TWR_ARC_main.rvt".into(),
            vec![
                view("{3D}", 1, "g-1"),
                view("{3D}", 2, "g-2"),
                view("Coordination", 2, "g-3"),
            ],
        );
        stub.elements.insert(
            "TWR_ARC_main.rvt/2/Coordination".into(),
            vec![element(101, "Basic Wall"), element(102, "Door")],
        );
        stub
    }

    pub fn gate(mut self, key: &str, gate: &Arc<Notify>) -> Self {
        self.gates.insert(key.to_string(), Arc::clone(gate));
        self
    }

    pub fn failing(mut self, call: &'static str) -> Self {
        self.failing.insert(call);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    async fn enter(&self, call: &'static str, key: &str) -> Result<()> {
        self.calls.lock().unwrap().push(format!("{call}:{key}"));
        if let Some(gate) = self.gates.get(key) {
            gate.notified().await;
        }
        if self.failing.contains(call) {
            return Err(ClientError::Status {
                url: format!("stub://{call}"),
                status: 500,
                body: "stub failure".into(),
            });
        }
        Ok(())
    }
}

pub(crate) fn view(name: &str, version: i64, guid: &str) -> ViewSummary {
    ViewSummary {
        view_name: name.into(),
        version_number: version,
        guid: guid.into(),
        urn: None,
    }
}

pub(crate) fn element(id: i64, name: &str) -> Element {
    Element {
        object_id: id,
        name: Some(name.into()),
        element_data: json!({}),
        properties: json!({"Category": name}),
    }
}

pub(crate) fn designer(id: i64, discipline: &str, last_name: &str, company: &str) -> Designer {
    Designer {
        id: Some(id),
        discipline: discipline.into(),
        first_name: "Alex".into(),
        last_name: last_name.into(),
        company: company.into(),
        email: format!("{}@{}.example", last_name.to_lowercase(), company.to_lowercase()),
        phone: "+1 555 0100 200".into(),
        position: "Engineer".into(),
    }
}

#[async_trait]
impl Backend for StubBackend {
    async fn list_projects(&self) -> Result<Vec<String>> {
        self.enter("projects", "").await?;
        Ok(self.projects.clone())
    }

    async fn list_files(&self, project: &str) -> Result<Vec<String>> {
        self.enter("files", project).await?;
        Ok(self.files.get(project).cloned().unwrap_or_default())
    }

    async fn list_views_3d(&self, _project: &str, file_name: &str) -> Result<Vec<ViewSummary>> {
        self.enter("views", file_name).await?;
        Ok(self.views.get(file_name).cloned().unwrap_or_default())
    }

    async fn list_elements(
        &self,
        _project: &str,
        file_name: &str,
        version: i64,
        view_name: &str,
    ) -> Result<Vec<Element>> {
        let key = format!("{file_name}/{version}/{view_name}");
        self.enter("elements", &key).await?;
        Ok(self.elements.get(&key).cloned().unwrap_or_default())
    }

    async fn list_coordinates(&self) -> Result<Vec<ProjectCoordinate>> {
        self.enter("coordinates", "").await?;
        Ok(self.coordinates.clone())
    }

    async fn projects_table(&self) -> Result<Vec<ProjectFileVersion>> {
        self.enter("projects_table", "").await?;
        Ok(self.table.clone())
    }

    async fn views_table(&self) -> Result<Vec<ViewsTableEntry>> {
        self.enter("views_table", "").await?;
        Ok(self.views_table.clone())
    }

    async fn list_designers(&self, project: &str) -> Result<Vec<Designer>> {
        self.enter("designers", project).await?;
        let designers = self.designers.lock().unwrap();
        Ok(designers
            .iter()
            .filter(|(p, _)| p == project)
            .map(|(_, d)| d.clone())
            .collect())
    }

    async fn create_designer(&self, draft: &DesignerDraft) -> Result<()> {
        self.enter("create_designer", &draft.project_name).await?;
        let mut designers = self.designers.lock().unwrap();
        let id = designers.len() as i64 + 1;
        designers.push((draft.project_name.clone(), from_draft(Some(id), draft)));
        Ok(())
    }

    async fn update_designer(&self, project: &str, id: i64, draft: &DesignerDraft) -> Result<()> {
        self.enter("update_designer", project).await?;
        let mut designers = self.designers.lock().unwrap();
        for (p, d) in designers.iter_mut() {
            if p == project && d.id == Some(id) {
                *d = from_draft(Some(id), draft);
            }
        }
        Ok(())
    }

    async fn delete_designer(&self, project: &str, id: i64) -> Result<()> {
        self.enter("delete_designer", project).await?;
        self.designers
            .lock()
            .unwrap()
            .retain(|(p, d)| !(p == project && d.id == Some(id)));
        Ok(())
    }

    async fn ask(&self, question: &str) -> Result<ChatAnswer> {
        self.enter("ask", question).await?;
        Ok(ChatAnswer {
            answer: format!("You asked: {question}"),
        })
    }
}

fn from_draft(id: Option<i64>, draft: &DesignerDraft) -> Designer {
    Designer {
        id,
        discipline: draft.discipline.clone(),
        first_name: draft.first_name.clone(),
        last_name: draft.last_name.clone(),
        company: draft.company.clone(),
        email: draft.email.clone(),
        phone: draft.phone.clone(),
        position: draft.position.clone(),
    }
}
