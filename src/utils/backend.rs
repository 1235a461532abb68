use anyhow::Context;
use async_trait::async_trait;
use log::{debug, warn};
use reqwest::{Client, Response};
use url::Url;
use urlencoding::encode;
use crate::error::ApiError;
use crate::models::{AddSemesterRequest, Course, ErrorBody, SaveReceipt, SemesterResult, Selection};

/// Calls the form makes against the GPA backend.
#[async_trait]
pub trait GpaApi: Send + Sync {
    /// Page markup carrying the initial state.
    async fn index_page(&self) -> Result<String, ApiError>;
    async fn courses(&self, selection: &Selection) -> Result<Vec<Course>, ApiError>;
    async fn add_semester(&self, request: &AddSemesterRequest) -> Result<SemesterResult, ApiError>;
    /// Only transport failures are reported; the answer body is ignored.
    async fn reset_session(&self) -> Result<(), ApiError>;
    async fn save_calculation(&self) -> Result<SaveReceipt, ApiError>;
    /// Restores a saved calculation into the session and returns the page it redirects to.
    async fn load_calculation(&self, record_id: &str) -> Result<String, ApiError>;
}

// The backend keeps the running calculation in a cookie session, so every call shares one client.
pub struct HttpBackend {
    client: Client,
    base_url: Url,
}

impl HttpBackend {
    pub fn new(base_url: Url) -> anyhow::Result<Self> {
        let client = Client::builder()
            .cookie_store(true)
            .build()
            .context("Failed to build the client")?;
        Ok(HttpBackend { client, base_url })
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        Ok(self.base_url.join(path)?)
    }
}

// Turns a non-2xx answer into an error, keeping the backend's `error` text if it sent one.
async fn check(response: Response) -> Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = response.json::<ErrorBody>().await.ok().and_then(|body| body.error);
    warn!("backend answered {}: {:?}", status, message);
    Err(ApiError::Status { status: status.as_u16(), message })
}

#[async_trait]
impl GpaApi for HttpBackend {
    async fn index_page(&self) -> Result<String, ApiError> {
        let response = self.client.get(self.endpoint("")?).send().await?;
        Ok(check(response).await?.text().await?)
    }

    async fn courses(&self, selection: &Selection) -> Result<Vec<Course>, ApiError> {
        let path = format!("api/courses/{}/{}", encode(&selection.part), encode(&selection.semester));
        let url = self.endpoint(&path)?;
        debug!("GET {}", url);
        let response = self.client.get(url).send().await?;
        Ok(check(response).await?.json().await?)
    }

    async fn add_semester(&self, request: &AddSemesterRequest) -> Result<SemesterResult, ApiError> {
        debug!("POST add_semester with {} grade(s)", request.grades.len());
        let response = self
            .client
            .post(self.endpoint("api/add_semester")?)
            .json(request)
            .send()
            .await?;
        Ok(check(response).await?.json().await?)
    }

    async fn reset_session(&self) -> Result<(), ApiError> {
        let response = self.client.post(self.endpoint("api/reset_session")?).send().await?;
        if !response.status().is_success() {
            warn!("reset_session answered {}", response.status());
        }
        Ok(())
    }

    // Any 2xx means the backend stored the calculation and cleared its session.
    async fn save_calculation(&self) -> Result<SaveReceipt, ApiError> {
        let response = self.client.post(self.endpoint("api/save_calculation")?).send().await?;
        let body = check(response).await?.text().await?;
        Ok(serde_json::from_str(&body).unwrap_or_else(|e| {
            warn!("save_calculation answer not understood ({}), treating it as saved", e);
            SaveReceipt::default()
        }))
    }

    async fn load_calculation(&self, record_id: &str) -> Result<String, ApiError> {
        let url = self.endpoint(&format!("load_calculation/{}", encode(record_id)))?;
        let response = self.client.get(url).send().await?;
        Ok(check(response).await?.text().await?)
    }
}
