// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Router fixtures for handler tests.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use bim_dash_client::{Backend, ClientError, Geocoder, Result};
use bim_dash_core::{
    ChatAnswer, Designer, DesignerDraft, Element, KeyValueStore, MemoryStore, ProjectCoordinate,
    ProjectFileVersion, ViewRef, ViewSummary, ViewsTableEntry,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use crate::config::Config;
use crate::{router, AppState};

/// Canned backend. With `failing` set every call answers 500.
#[derive(Clone, Default)]
pub struct StubBackend {
    failing: bool,
    created: Arc<Mutex<Vec<String>>>,
}

impl StubBackend {
    pub fn sample() -> Self {
        Self::default()
    }

    pub fn failing(mut self) -> Self {
        self.failing = true;
        self
    }

    /// `project:last_name` of every designer created so far.
    pub fn created(&self) -> Vec<String> {
        self.created.lock().unwrap().clone()
    }

    fn check(&self, call: &str) -> Result<()> {
        if self.failing {
            return Err(ClientError::Status {
                url: format!("stub://{call}"),
                status: 500,
                body: "stub failure".into(),
            });
        }
        Ok(())
    }
}

fn row(project: &str, file_name: &str, version: i64) -> ProjectFileVersion {
    ProjectFileVersion {
        project: project.into(),
        file_name: file_name.into(),
        version_number: version,
        last_modified_time: Some("2024-05-01T10:00:00".into()),
        last_modified_user: Some("a.levi".into()),
        published_time: None,
        published_user: None,
        process_state: Some("PROCESSED".into()),
    }
}

fn designer(id: i64, discipline: &str, last_name: &str, company: &str) -> Designer {
    Designer {
        id: Some(id),
        discipline: discipline.into(),
        first_name: "Alex".into(),
        last_name: last_name.into(),
        company: company.into(),
        email: format!("{}@example.com", last_name.to_lowercase()),
        phone: "+1 555 0100 200".into(),
        position: "Engineer".into(),
    }
}

#[async_trait]
impl Backend for StubBackend {
    async fn list_projects(&self) -> Result<Vec<String>> {
        self.check("projects")?;
        Ok(vec!["Tower".into(), "Depot".into()])
    }

    async fn list_files(&self, project: &str) -> Result<Vec<String>> {
        self.check("files")?;
        Ok(match project {
            "Tower" => vec!["TWR_ARC_main.rvt".into()],
            "Depot" => vec!["DPT_MEP_services.rvt".into()],
            _ => Vec::new(),
        })
    }

    async fn list_views_3d(&self, _project: &str, file_name: &str) -> Result<Vec<ViewSummary>> {
        self.check("views")?;
        if file_name != "TWR_ARC_main.rvt" {
            return Ok(Vec::new());
        }
        Ok(vec![ViewSummary {
            view_name: "{3D}".into(),
            version_number: 5,
            guid: "g-5".into(),
            urn: None,
        }])
    }

    async fn list_elements(
        &self,
        _project: &str,
        _file_name: &str,
        _version: i64,
        _view_name: &str,
    ) -> Result<Vec<Element>> {
        self.check("elements")?;
        Ok(vec![Element {
            object_id: 101,
            name: Some("Basic Wall".into()),
            element_data: json!({}),
            properties: json!({"Category": "Walls"}),
        }])
    }

    async fn list_coordinates(&self) -> Result<Vec<ProjectCoordinate>> {
        self.check("coordinates")?;
        Ok(vec![
            ProjectCoordinate {
                project: "Tower".into(),
                latitude: 32.1,
                longitude: 34.8,
                elevation: Some(12.0),
                angle: None,
            },
            ProjectCoordinate {
                project: "Depot".into(),
                latitude: 31.0,
                longitude: 35.0,
                elevation: None,
                angle: None,
            },
        ])
    }

    async fn projects_table(&self) -> Result<Vec<ProjectFileVersion>> {
        self.check("projects_table")?;
        Ok(vec![
            row("Tower", "TWR_ARC_main.rvt", 4),
            row("Tower", "TWR_ARC_main.rvt", 5),
            row("Tower", "TWR_STR_frame.rvt", 1),
            row("Depot", "DPT_MEP_services.rvt", 2),
        ])
    }

    async fn views_table(&self) -> Result<Vec<ViewsTableEntry>> {
        self.check("views_table")?;
        let entry = |discipline: &str, file_name: &str, version: i64| ViewsTableEntry {
            project: "Tower".into(),
            discipline: discipline.into(),
            file_name: file_name.into(),
            version_number: version,
            views: vec![ViewRef {
                view_name: "{3D}".into(),
                guid: format!("{file_name}-{version}"),
                urn: None,
            }],
        };
        Ok(vec![
            entry("ARC", "TWR_ARC_main.rvt", 5),
            entry("STR", "TWR_STR_frame.rvt", 1),
        ])
    }

    async fn list_designers(&self, project: &str) -> Result<Vec<Designer>> {
        self.check("designers")?;
        Ok(match project {
            "Tower" => vec![
                designer(1, "Electrical", "Levi", "Volt"),
                designer(2, "Structure", "Cohen", "Beam Works"),
            ],
            _ => Vec::new(),
        })
    }

    async fn create_designer(&self, draft: &DesignerDraft) -> Result<()> {
        self.check("create_designer")?;
        self.created
            .lock()
            .unwrap()
            .push(format!("{}:{}", draft.project_name, draft.last_name));
        Ok(())
    }

    async fn update_designer(
        &self,
        _project: &str,
        _id: i64,
        _draft: &DesignerDraft,
    ) -> Result<()> {
        self.check("update_designer")
    }

    async fn delete_designer(&self, _project: &str, _id: i64) -> Result<()> {
        self.check("delete_designer")
    }

    async fn ask(&self, question: &str) -> Result<ChatAnswer> {
        self.check("ask")?;
        Ok(ChatAnswer {
            answer: format!("You asked: {question}"),
        })
    }
}

fn test_config() -> Config {
    Config {
        port: 0,
        backend_url: "http://127.0.0.1:9".into(),
        geocoder_url: "http://127.0.0.1:9".into(),
        geocoder_user_agent: "bim-dash-tests/1.0".into(),
        notes_path: String::new(),
        request_timeout_secs: 30,
        settle_timeout_ms: 2000,
        session_idle_secs: 1800,
        max_sessions: 64,
        cors_origins: vec!["*".into()],
        log_json: false,
    }
}

pub fn stub_app(stub: StubBackend) -> Router {
    stub_app_with_notes(stub, Box::new(MemoryStore::new()))
}

/// Router over `stub`; the geocoder points at a closed port.
pub fn stub_app_with_notes(stub: StubBackend, notes: Box<dyn KeyValueStore + Send>) -> Router {
    let config = test_config();
    let geocoder = Geocoder::new(&config.geocoder_url, &config.geocoder_user_agent).unwrap();
    router(AppState::new(config, Arc::new(stub), geocoder, notes))
}

async fn call(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
    };
    (status, body)
}

pub async fn get_json(app: &Router, uri: &str) -> (StatusCode, Value) {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    call(app, request).await
}

pub async fn send_json(
    app: &Router,
    method: Method,
    uri: &str,
    body: Value,
) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    call(app, request).await
}
