//! Blocking REST client over the Azure DevOps HTTP API.
//!
//! One [`RestClient`] serves all three endpoint families; the trait impls
//! live in the sibling modules. Authentication is a personal access token
//! sent as HTTP basic auth with an empty username.

mod checks;
mod hooks;
mod process;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use log::trace;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::{Error, Result};

/// Request body media type for layout and process patches.
const CONTENT_TYPE: &str = "application/json";

pub struct RestClient {
    agent: ureq::Agent,
    org_url: String,
    auth_header: String,
    user_agent: String,
}

impl RestClient {
    /// Connect to an organization, e.g. `https://dev.azure.com/contoso`.
    pub fn new(
        org_url: impl Into<String>,
        personal_access_token: &str,
        user_agent: impl Into<String>,
    ) -> Self {
        // Non-2xx responses carry a JSON error payload we classify
        // ourselves, so status-as-error stays off.
        let config = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .build();
        Self {
            agent: ureq::Agent::new_with_config(config),
            org_url: org_url.into().trim_end_matches('/').to_string(),
            auth_header: format!(
                "Basic {}",
                BASE64.encode(format!(":{personal_access_token}"))
            ),
            user_agent: user_agent.into(),
        }
    }

    pub fn org_url(&self) -> &str {
        &self.org_url
    }

    /// Organization-scoped URL: `{org}/_apis/{path}?api-version={version}`.
    fn url(&self, path: &str, api_version: &str) -> String {
        format!("{}/_apis/{path}?api-version={api_version}", self.org_url)
    }

    /// Project-scoped URL: `{org}/{project}/_apis/{path}?api-version={v}`.
    fn project_url(&self, project: &str, path: &str, api_version: &str) -> String {
        format!(
            "{}/{project}/_apis/{path}?api-version={api_version}",
            self.org_url
        )
    }

    fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        trace!("GET {url}");
        let mut resp = self
            .agent
            .get(url)
            .header("Authorization", &self.auth_header)
            .header("User-Agent", &self.user_agent)
            .call()?;
        Self::decode(resp.status().as_u16(), resp.body_mut())
    }

    fn send_json<B: Serialize, T: DeserializeOwned>(
        &self,
        method: &str,
        url: &str,
        body: &B,
    ) -> Result<T> {
        trace!("{method} {url}");
        let req = match method {
            "POST" => self.agent.post(url),
            "PUT" => self.agent.put(url),
            "PATCH" => self.agent.patch(url),
            other => return Err(Error::Other(format!("unsupported method {other}"))),
        };
        let mut resp = req
            .header("Authorization", &self.auth_header)
            .header("User-Agent", &self.user_agent)
            .header("Content-Type", CONTENT_TYPE)
            .send_json(body)?;
        Self::decode(resp.status().as_u16(), resp.body_mut())
    }

    fn post<B: Serialize, T: DeserializeOwned>(&self, url: &str, body: &B) -> Result<T> {
        self.send_json("POST", url, body)
    }

    fn put<B: Serialize, T: DeserializeOwned>(&self, url: &str, body: &B) -> Result<T> {
        self.send_json("PUT", url, body)
    }

    fn patch<B: Serialize, T: DeserializeOwned>(&self, url: &str, body: &B) -> Result<T> {
        self.send_json("PATCH", url, body)
    }

    fn delete(&self, url: &str) -> Result<()> {
        trace!("DELETE {url}");
        let mut resp = self
            .agent
            .delete(url)
            .header("Authorization", &self.auth_header)
            .header("User-Agent", &self.user_agent)
            .call()?;
        let status = resp.status().as_u16();
        if (200..300).contains(&status) {
            return Ok(());
        }
        let body = resp.body_mut().read_to_string()?;
        Err(Error::from_response(status, &body))
    }

    /// DELETE variant for endpoints that answer with a body.
    fn delete_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        trace!("DELETE {url}");
        let mut resp = self
            .agent
            .delete(url)
            .header("Authorization", &self.auth_header)
            .header("User-Agent", &self.user_agent)
            .call()?;
        Self::decode(resp.status().as_u16(), resp.body_mut())
    }

    fn decode<T: DeserializeOwned>(status: u16, body: &mut ureq::Body) -> Result<T> {
        let text = body.read_to_string()?;
        if !(200..300).contains(&status) {
            return Err(Error::from_response(status, &text));
        }
        Ok(serde_json::from_str(&text)?)
    }
}

/// Responses that wrap a collection in `{"count": N, "value": [...]}`.
#[derive(serde::Deserialize)]
struct ValueList<T> {
    #[serde(default = "Vec::new")]
    value: Vec<T>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urls_carry_api_version() {
        let client = RestClient::new("https://dev.azure.com/contoso/", "pat", "agent/1.0");
        assert_eq!(client.org_url(), "https://dev.azure.com/contoso");
        assert_eq!(
            client.url("work/processes/abc", "7.1-preview.1"),
            "https://dev.azure.com/contoso/_apis/work/processes/abc?api-version=7.1-preview.1"
        );
        assert_eq!(
            client.project_url("proj", "pipelines/checks/configurations/7", "5.1-preview.1"),
            "https://dev.azure.com/contoso/proj/_apis/pipelines/checks/configurations/7?api-version=5.1-preview.1"
        );
    }

    #[test]
    fn auth_header_is_basic_with_empty_username() {
        let client = RestClient::new("https://dev.azure.com/contoso", "secret", "agent/1.0");
        let expected = format!("Basic {}", BASE64.encode(":secret"));
        assert_eq!(client.auth_header, expected);
    }
}
