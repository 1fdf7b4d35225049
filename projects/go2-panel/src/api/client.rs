use std::time::Duration;

use reqwest::{Client, Response};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use tracing::{debug, info};
use url::Url;

use crate::core::errors::{ApiError, ApiResult};

use super::{
    commands,
    models::{
        BackendStatus, CommandRequest, ConnectRequest, ConnectionMethod, MoveRequest,
        SettingsPatch, SettingsResponse, TestMoveRequest, YawRequest,
    },
};

/// One-shot HTTP actions against the teleop backend.
///
/// Nothing here retries: a failed call is returned to the caller, which is
/// expected to surface it to the operator.
#[derive(Clone)]
pub struct PanelApi {
    base_url: Url,
    client: Client,
}

impl PanelApi {
    pub fn new(base_url: Url, request_timeout: Duration) -> ApiResult<Self> {
        let client = Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|err| ApiError::transport(base_url.as_str(), err))?;
        Ok(Self { base_url, client })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub async fn status(&self) -> ApiResult<BackendStatus> {
        self.get_json("/api/status").await
    }

    pub async fn connect(&self, method: ConnectionMethod, ip: Option<String>) -> ApiResult<()> {
        let request = ConnectRequest::new(method, ip);
        self.post("/api/connect", Some(&request)).await?;
        info!(
            "backend connect requested: method={} ip={}",
            request.method,
            request.ip.as_deref().unwrap_or("-")
        );
        Ok(())
    }

    pub async fn disconnect(&self) -> ApiResult<()> {
        self.post::<()>("/api/disconnect", None).await?;
        info!("backend disconnect requested");
        Ok(())
    }

    /// Rejects names outside the command table without touching the network.
    pub async fn send_command(&self, name: &str) -> ApiResult<()> {
        if !commands::is_known(name) {
            return Err(ApiError::UnknownCommand(name.to_owned()));
        }
        self.post("/api/cmd", Some(&CommandRequest { cmd: name }))
            .await?;
        info!("command sent: {name}");
        Ok(())
    }

    pub async fn teleop_start(&self) -> ApiResult<()> {
        self.post::<()>("/api/teleop/start", None).await.map(drop)
    }

    pub async fn teleop_stop(&self) -> ApiResult<()> {
        self.post::<()>("/api/teleop/stop", None).await.map(drop)
    }

    pub async fn stand(&self) -> ApiResult<()> {
        self.post::<()>("/api/stand", None).await.map(drop)
    }

    pub async fn sit(&self) -> ApiResult<()> {
        self.post::<()>("/api/sit", None).await.map(drop)
    }

    pub async fn stop_move(&self) -> ApiResult<()> {
        self.post::<()>("/api/stop", None).await.map(drop)
    }

    pub async fn move_body(&self, x: f64, y: f64, z: f64) -> ApiResult<()> {
        self.post("/api/move", Some(&MoveRequest { x, y, z }))
            .await
            .map(drop)
    }

    pub async fn yaw(&self, wz: f64) -> ApiResult<()> {
        self.post("/api/yaw", Some(&YawRequest { wz })).await.map(drop)
    }

    pub async fn test_move(&self, request: TestMoveRequest) -> ApiResult<()> {
        self.post("/api/test/move", Some(&request)).await.map(drop)
    }

    pub async fn gamepad_state(&self) -> ApiResult<Value> {
        self.get_json("/api/gamepad/state").await
    }

    /// Applies `patch` and returns the settings object the backend now holds.
    pub async fn update_settings(&self, patch: &SettingsPatch) -> ApiResult<Value> {
        let endpoint = "/api/settings";
        let response = self.post(endpoint, Some(patch)).await?;
        let body: SettingsResponse = response
            .json()
            .await
            .map_err(|err| ApiError::transport(endpoint, err))?;
        Ok(body.settings)
    }

    fn endpoint(&self, path: &str) -> ApiResult<Url> {
        Ok(self.base_url.join(path)?)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        let url = self.endpoint(path)?;
        debug!("GET {url}");
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|err| ApiError::transport(path, err))?;
        let response = check_status(path, response).await?;
        response
            .json()
            .await
            .map_err(|err| ApiError::transport(path, err))
    }

    async fn post<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: Option<&B>,
    ) -> ApiResult<Response> {
        let url = self.endpoint(path)?;
        debug!("POST {url}");
        let mut request = self.client.post(url);
        if let Some(body) = body {
            request = request.json(body);
        }
        let response = request
            .send()
            .await
            .map_err(|err| ApiError::transport(path, err))?;
        check_status(path, response).await
    }
}

async fn check_status(endpoint: &str, response: Response) -> ApiResult<Response> {
    if response.status().is_success() {
        return Ok(response);
    }

    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    Err(ApiError::Status {
        endpoint: endpoint.to_owned(),
        status,
        body,
    })
}
