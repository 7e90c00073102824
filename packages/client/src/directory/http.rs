//! HTTP implementation of the channel directory.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde_json::json;
use url::Url;

use super::{ChannelDirectory, ChannelSummary, DirectoryError, MessageRecord};

/// Directory client against the chat server's REST API.
///
/// `base` is the API root (e.g. `http://host:8888/api`); routes are
/// appended beneath it. When a bearer token is present it is attached to
/// every request.
pub struct HttpChannelDirectory {
    http: Client,
    base: Url,
    token: Option<String>,
}

impl HttpChannelDirectory {
    pub fn new(base: Url, token: Option<String>) -> Self {
        Self {
            http: Client::new(),
            base,
            token,
        }
    }

    fn endpoint(&self, path: &str) -> Result<Url, DirectoryError> {
        let raw = format!("{}/{}", self.base.as_str().trim_end_matches('/'), path);
        Url::parse(&raw).map_err(|_| DirectoryError::Endpoint(raw))
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    fn check_status(response: &Response) -> Result<(), DirectoryError> {
        let status = response.status();
        if !status.is_success() {
            return Err(DirectoryError::Status(status.as_u16()));
        }
        Ok(())
    }
}

#[async_trait]
impl ChannelDirectory for HttpChannelDirectory {
    async fn user_channels(&self, user_id: &str) -> Result<Vec<ChannelSummary>, DirectoryError> {
        let url = self.endpoint(&format!("users/{user_id}/channels"))?;
        let response = self.authorize(self.http.get(url)).send().await?;
        Self::check_status(&response)?;
        Ok(response.json().await?)
    }

    async fn channel_messages(
        &self,
        channel_id: &str,
    ) -> Result<Vec<MessageRecord>, DirectoryError> {
        let url = self.endpoint(&format!("channels/{channel_id}/messages"))?;
        let response = self.authorize(self.http.get(url)).send().await?;
        Self::check_status(&response)?;
        Ok(response.json().await?)
    }

    async fn create_channel(
        &self,
        user_id: &str,
        channel_name: &str,
    ) -> Result<ChannelSummary, DirectoryError> {
        let url = self.endpoint("channels")?;
        let body = json!({ "userId": user_id, "channelName": channel_name });
        let response = self.authorize(self.http.post(url)).json(&body).send().await?;
        Self::check_status(&response)?;
        Ok(response.json().await?)
    }

    async fn join_channel(&self, channel_id: &str, user_id: &str) -> Result<(), DirectoryError> {
        let url = self.endpoint(&format!("channels/{channel_id}/join"))?;
        let body = json!({ "userId": user_id });
        let response = self.authorize(self.http.post(url)).json(&body).send().await?;
        Self::check_status(&response)
    }

    async fn leave_channel(&self, channel_id: &str, user_id: &str) -> Result<(), DirectoryError> {
        let url = self.endpoint(&format!("channels/{channel_id}/leave"))?;
        let body = json!({ "userId": user_id });
        let response = self
            .authorize(self.http.delete(url))
            .json(&body)
            .send()
            .await?;
        Self::check_status(&response)
    }
}
