// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! reqwest implementation of [`Backend`].

use async_trait::async_trait;
use bim_dash_core::{
    ChatAnswer, ChatQuestion, Designer, DesignerDraft, Element, ProjectCoordinate,
    ProjectFileVersion, ViewSummary, ViewsTableEntry,
};
use reqwest::{RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;

use crate::backend::Backend;
use crate::error::{ClientError, Result};

/// Backend client speaking the dashboard's REST API.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    base_url: Url,
    http: reqwest::Client,
}

impl HttpBackend {
    /// Create a client for the backend rooted at `base_url`.
    pub fn new(base_url: &str) -> Result<Self> {
        Self::with_client(base_url, reqwest::Client::new())
    }

    /// Create a client reusing an existing reqwest client (timeouts, pools).
    pub fn with_client(base_url: &str, http: reqwest::Client) -> Result<Self> {
        let trimmed = base_url.trim_end_matches('/');
        let base_url = Url::parse(trimmed).map_err(|e| ClientError::InvalidUrl {
            url: base_url.to_string(),
            reason: e.to_string(),
        })?;
        if base_url.cannot_be_a_base() {
            return Err(ClientError::InvalidUrl {
                url: trimmed.to_string(),
                reason: "not a base URL".to_string(),
            });
        }
        Ok(Self { base_url, http })
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    /// URL for the given path segments; each segment is percent-encoded.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        query: &[(&str, &str)],
    ) -> Result<T> {
        let url = self.endpoint(segments);
        let resp = self.send(self.http.get(url.clone()).query(query), &url).await?;
        decode(&url, resp).await
    }

    async fn send(&self, request: RequestBuilder, url: &Url) -> Result<Response> {
        let resp = request.send().await.map_err(|source| ClientError::Transport {
            url: url.to_string(),
            source,
        })?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            tracing::warn!(url = %url, status, "Backend request failed");
            return Err(ClientError::Status {
                url: url.to_string(),
                status,
                body,
            });
        }
        Ok(resp)
    }
}

async fn decode<T: DeserializeOwned>(url: &Url, resp: Response) -> Result<T> {
    let bytes = resp.bytes().await.map_err(|source| ClientError::Transport {
        url: url.to_string(),
        source,
    })?;
    serde_json::from_slice(&bytes).map_err(|e| ClientError::Decode {
        url: url.to_string(),
        reason: e.to_string(),
    })
}

#[async_trait]
impl Backend for HttpBackend {
    async fn list_projects(&self) -> Result<Vec<String>> {
        self.get_json(&["api", "projects-list"], &[]).await
    }

    async fn list_files(&self, project: &str) -> Result<Vec<String>> {
        self.get_json(&["api", "files-by-project"], &[("project", project)])
            .await
    }

    async fn list_views_3d(&self, project: &str, file_name: &str) -> Result<Vec<ViewSummary>> {
        self.get_json(
            &["api", "views-3d"],
            &[("project", project), ("file_name", file_name)],
        )
        .await
    }

    async fn list_elements(
        &self,
        project: &str,
        file_name: &str,
        version: i64,
        view_name: &str,
    ) -> Result<Vec<Element>> {
        let version = version.to_string();
        self.get_json(
            &["api", "elements-by-view"],
            &[
                ("project", project),
                ("file_name", file_name),
                ("version", version.as_str()),
                ("view_name", view_name),
            ],
        )
        .await
    }

    async fn list_coordinates(&self) -> Result<Vec<ProjectCoordinate>> {
        self.get_json(&["api", "coordinates"], &[]).await
    }

    async fn projects_table(&self) -> Result<Vec<ProjectFileVersion>> {
        self.get_json(&["api", "projects-table"], &[]).await
    }

    async fn views_table(&self) -> Result<Vec<ViewsTableEntry>> {
        self.get_json(&["api", "views-table"], &[]).await
    }

    async fn list_designers(&self, project: &str) -> Result<Vec<Designer>> {
        self.get_json(&["api", "designers"], &[("project", project)])
            .await
    }

    async fn create_designer(&self, draft: &DesignerDraft) -> Result<()> {
        let url = self.endpoint(&["api", "designers"]);
        self.send(self.http.post(url.clone()).json(draft), &url).await?;
        tracing::info!(project = %draft.project_name, "Designer created");
        Ok(())
    }

    async fn update_designer(&self, project: &str, id: i64, draft: &DesignerDraft) -> Result<()> {
        let id = id.to_string();
        let url = self.endpoint(&["api", "designers", project, &id]);
        self.send(self.http.put(url.clone()).json(draft), &url).await?;
        tracing::info!(project, id = %id, "Designer updated");
        Ok(())
    }

    async fn delete_designer(&self, project: &str, id: i64) -> Result<()> {
        let id = id.to_string();
        let url = self.endpoint(&["api", "designers", project, &id]);
        self.send(self.http.delete(url.clone()), &url).await?;
        tracing::info!(project, id = %id, "Designer deleted");
        Ok(())
    }

    async fn ask(&self, question: &str) -> Result<ChatAnswer> {
        let url = self.endpoint(&["api", "chat"]);
        let body = ChatQuestion {
            question: question.to_string(),
        };
        let resp = self.send(self.http.post(url.clone()).json(&body), &url).await?;
        decode(&url, resp).await
    }
}
