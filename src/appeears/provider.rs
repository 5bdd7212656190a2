use super::task::{Bundle, Task, TaskStatus, TaskSubmission};
use crate::error::FetchError;
use crate::http::check_status;
use crate::service::TaskService;
use anyhow::Result;
use futures_util::TryStreamExt;
use reqwest::Client;
use serde::Deserialize;
use std::io::Write;
use url::Url;

#[derive(Deserialize)]
struct LoginResponse {
    token: Option<String>,
    #[serde(default)]
    expiration: Option<String>,
}

/// Authenticated AppEEARS API session.
pub struct Provider {
    client: Client,
    api: Url,
    token: String,
}

impl Provider {
    pub fn new(client: Client, api: Url, token: String) -> Self {
        Self { client, api, token }
    }

    /// Exchanges Earthdata credentials for a bearer token.
    pub async fn login(api: Url, username: &str, password: &str) -> Result<Self> {
        Self::login_with(Client::new(), api, username, password).await
    }

    pub async fn login_with(
        client: Client,
        api: Url,
        username: &str,
        password: &str,
    ) -> Result<Self> {
        let response = client
            .post(api.join("login")?)
            .basic_auth(username, Some(password))
            .header(reqwest::header::CONTENT_LENGTH, "0")
            .send()
            .await?;
        let login: LoginResponse = check_status(response).await?.json().await?;
        let token = login.token.ok_or(FetchError::MissingField("token"))?;
        tracing::info!(expiration = ?login.expiration, "Logged in to AppEEARS");
        Ok(Self::new(client, api, token))
    }

    pub async fn logout(&self) -> Result<()> {
        let response = self
            .client
            .post(self.api.join("logout")?)
            .bearer_auth(&self.token)
            .header(reqwest::header::CONTENT_LENGTH, "0")
            .send()
            .await?;
        check_status(response).await?;
        tracing::debug!("Logged out of AppEEARS");
        Ok(())
    }

    async fn get(&self, path: &str) -> Result<reqwest::Response> {
        let response = self
            .client
            .get(self.api.join(path)?)
            .bearer_auth(&self.token)
            .send()
            .await?;
        check_status(response).await
    }
}

impl TaskService for Provider {
    async fn submit(&self, task: &Task) -> Result<TaskSubmission> {
        let response = self
            .client
            .post(self.api.join("task")?)
            .bearer_auth(&self.token)
            .json(task)
            .send()
            .await?;
        let submission = check_status(response).await?.json().await?;
        Ok(submission)
    }

    async fn status(&self, task_id: &str) -> Result<TaskStatus> {
        let status = self.get(&format!("task/{}", task_id)).await?.json().await?;
        Ok(status)
    }

    async fn bundle(&self, task_id: &str) -> Result<Bundle> {
        let bundle = self.get(&format!("bundle/{}", task_id)).await?.json().await?;
        Ok(bundle)
    }

    async fn download<W: Write + Send>(
        &self,
        task_id: &str,
        file_id: &str,
        out: &mut W,
    ) -> Result<u64> {
        // The bundle endpoint redirects to storage; reqwest follows it.
        let response = self.get(&format!("bundle/{}/{}", task_id, file_id)).await?;

        let mut stream = response.bytes_stream();
        let mut byte_count = 0_u64;
        while let Some(bytes) = stream.try_next().await? {
            out.write_all(&bytes)?;
            byte_count += bytes.len() as u64;
        }
        Ok(byte_count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::appeears::task::Status;
    use crate::http::stub;

    #[tokio::test]
    async fn test_login_extracts_token() {
        let server = stub::serve(vec![(
            200,
            r#"{"token_type": "Bearer", "token": "tok-123", "expiration": "2024-03-09T10:00:00Z"}"#,
        )])
        .await;
        let provider = Provider::login_with(stub::client(), server.url.clone(), "user", "pass")
            .await
            .unwrap();
        assert_eq!(provider.token, "tok-123");

        let request = server.request(0).to_lowercase();
        assert!(request.starts_with("post /api/login http/1.1"));
        assert!(request.contains("authorization: basic "));
    }

    #[tokio::test]
    async fn test_login_without_token() {
        let server = stub::serve(vec![(200, r#"{"token_type": "Bearer"}"#)]).await;
        let err = Provider::login_with(stub::client(), server.url.clone(), "user", "pass")
            .await
            .err()
            .unwrap();
        assert!(matches!(
            err.downcast_ref::<FetchError>(),
            Some(FetchError::MissingField("token"))
        ));
    }

    #[tokio::test]
    async fn test_status_and_download_routes() {
        let server = stub::serve(vec![
            (200, r#"{"task_id": "t1", "status": "processing"}"#),
            (200, "netcdf bytes"),
        ])
        .await;
        let provider = Provider::new(stub::client(), server.url.clone(), "tok".to_string());

        let status = provider.status("t1").await.unwrap();
        assert_eq!(status.status, Status::Processing);

        let mut out = Vec::new();
        let bytes = provider.download("t1", "f1", &mut out).await.unwrap();
        assert_eq!(bytes, 12);
        assert_eq!(out, b"netcdf bytes");

        let status_request = server.request(0).to_lowercase();
        assert!(status_request.starts_with("get /api/task/t1 http/1.1"));
        assert!(status_request.contains("authorization: bearer tok"));
        let download_request = server.request(1).to_lowercase();
        assert!(download_request.starts_with("get /api/bundle/t1/f1 http/1.1"));
        assert!(download_request.contains("authorization: bearer tok"));
    }

    #[tokio::test]
    async fn test_submit_rejected() {
        let server = stub::serve(vec![(400, r#"{"message": "Invalid task"}"#)]).await;
        let provider = Provider::new(stub::client(), server.url.clone(), "tok".to_string());
        let task: Task = serde_json::from_value(serde_json::json!({
            "task_type": "area",
            "task_name": "aoi_20240307",
            "params": {
                "dates": [],
                "layers": [],
                "output": {"format": {"type": "netcdf4"}, "projection": "geographic"},
                "geo": {"type": "FeatureCollection", "features": []}
            }
        }))
        .unwrap();

        let err = provider.submit(&task).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<FetchError>(),
            Some(FetchError::Status { status: 400, .. })
        ));
        let request = server.request(0).to_lowercase();
        assert!(request.starts_with("post /api/task http/1.1"));
        assert!(request.contains("\"task_name\":\"aoi_20240307\""));
    }
}
