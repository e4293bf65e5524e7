use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Opaque agent identifier assigned by the backend.
pub type AgentId = i64;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Agent {
    pub id: AgentId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Task {
    pub id: i64,
    pub name: String,
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FileEntry {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Deserialize)]
struct AgentsResponse {
    agents: Vec<Agent>,
}

#[derive(Deserialize)]
struct TasksResponse {
    tasks: Vec<Task>,
}

#[derive(Deserialize)]
struct FilesResponse {
    files: Vec<FileEntry>,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    message: &'a str,
    agent_id: AgentId,
}

#[derive(Deserialize)]
struct ChatResponse {
    message: String,
}

#[derive(Serialize)]
struct NewTaskRequest<'a> {
    name: &'a str,
}

/// Errors from the backend API, kept distinguishable so callers can tell a
/// transport failure from a bad status from a payload that didn't parse.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("backend returned {status} for {endpoint}: {body}")]
    Status {
        endpoint: &'static str,
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("malformed response from {endpoint}: {source}")]
    Parse {
        endpoint: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

pub type ApiResult<T> = Result<T, ApiError>;

/// HTTP client for the orchestration backend.
#[derive(Clone)]
pub struct CockpitClient {
    client: Client,
    base_url: String,
}

impl CockpitClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn fetch_agents(&self) -> ApiResult<Vec<Agent>> {
        let response: AgentsResponse = self.get_json("/api/agents").await?;
        Ok(response.agents)
    }

    pub async fn fetch_tasks(&self) -> ApiResult<Vec<Task>> {
        let response: TasksResponse = self.get_json("/api/tasks").await?;
        Ok(response.tasks)
    }

    pub async fn fetch_files(&self) -> ApiResult<Vec<FileEntry>> {
        let response: FilesResponse = self.get_json("/api/filesystem").await?;
        Ok(response.files)
    }

    /// Send one chat message to the selected agent, returning the reply text.
    pub async fn send_chat(&self, agent_id: AgentId, message: &str) -> ApiResult<String> {
        let endpoint = "/api/chat";
        let request = ChatRequest { message, agent_id };

        let response = self
            .client
            .post(format!("{}{}", self.base_url, endpoint))
            .json(&request)
            .send()
            .await?;

        let response: ChatResponse = Self::decode(endpoint, response).await?;
        Ok(response.message)
    }

    /// Create a task on the backend. The backend answers with the created
    /// task as a bare object, not wrapped in a collection key.
    pub async fn create_task(&self, name: &str) -> ApiResult<Task> {
        let endpoint = "/api/tasks";
        let request = NewTaskRequest { name };

        let response = self
            .client
            .post(format!("{}{}", self.base_url, endpoint))
            .json(&request)
            .send()
            .await?;

        Self::decode(endpoint, response).await
    }

    async fn get_json<T: DeserializeOwned>(&self, endpoint: &'static str) -> ApiResult<T> {
        let response = self
            .client
            .get(format!("{}{}", self.base_url, endpoint))
            .send()
            .await?;

        Self::decode(endpoint, response).await
    }

    /// Read the body as text and parse explicitly, so a 200 with garbage is
    /// a Parse error rather than a transport error.
    async fn decode<T: DeserializeOwned>(
        endpoint: &'static str,
        response: reqwest::Response,
    ) -> ApiResult<T> {
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(ApiError::Status {
                endpoint,
                status,
                body,
            });
        }

        serde_json::from_str(&body).map_err(|source| ApiError::Parse { endpoint, source })
    }
}
