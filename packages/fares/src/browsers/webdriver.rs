//! W3C WebDriver client.
//!
//! A thin REST client over a chromedriver/geckodriver-compatible endpoint,
//! implementing the [`Browser`]/[`Element`] collaborator traits. Only the
//! handful of commands the pipeline needs are wrapped.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

use crate::error::{SessionError, SessionResult};
use crate::traits::browser::{Browser, Element, Query};

/// W3C element-identifier key in wire payloads.
const ELEMENT_KEY: &str = "element-6066-11e4-a52e-4f735466cecf";

#[derive(Deserialize)]
struct WdEnvelope<T> {
    value: T,
}

#[derive(Deserialize)]
struct NewSessionValue {
    #[serde(rename = "sessionId")]
    session_id: String,
}

#[derive(Serialize)]
struct FindRequest<'a> {
    using: &'a str,
    value: &'a str,
}

/// Shared wire-level session state.
struct WdSession {
    client: Client,
    base_url: String,
    session_id: String,
}

impl WdSession {
    fn url(&self, path: &str) -> String {
        format!("{}/session/{}{}", self.base_url, self.session_id, path)
    }

    async fn post<T: Serialize, R: DeserializeOwned>(
        &self,
        path: &str,
        body: &T,
    ) -> SessionResult<R> {
        let response = self
            .client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        decode(response).await
    }

    async fn get<R: DeserializeOwned>(&self, path: &str) -> SessionResult<R> {
        let response = self
            .client
            .get(self.url(path))
            .send()
            .await
            .map_err(map_reqwest_error)?;
        decode(response).await
    }

}

async fn find_from(
    session: &Arc<WdSession>,
    path: &str,
    query: &Query,
) -> SessionResult<Vec<Box<dyn Element>>> {
    let (using, value) = wire_strategy(query);
    let refs: WdEnvelope<Vec<std::collections::HashMap<String, String>>> =
        session.post(path, &FindRequest { using, value }).await?;
    Ok(refs
        .value
        .into_iter()
        .filter_map(|mut r| r.remove(ELEMENT_KEY))
        .map(|element_id| {
            Box::new(WdElement {
                session: Arc::clone(session),
                element_id,
            }) as Box<dyn Element>
        })
        .collect())
}

fn wire_strategy(query: &Query) -> (&'static str, &str) {
    match query {
        Query::Css(selector) => ("css selector", selector.as_str()),
        Query::XPath(expression) => ("xpath", expression.as_str()),
    }
}

fn map_reqwest_error(e: reqwest::Error) -> SessionError {
    if e.is_timeout() {
        SessionError::Timeout {
            what: e
                .url()
                .map(|u| u.to_string())
                .unwrap_or_else(|| "webdriver request".to_string()),
        }
    } else {
        SessionError::Transport(Box::new(e))
    }
}

async fn decode<R: DeserializeOwned>(response: reqwest::Response) -> SessionResult<R> {
    let status = response.status();
    if status == StatusCode::NOT_FOUND {
        let body = response.text().await.unwrap_or_default();
        return Err(SessionError::NotFound { query: body });
    }
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(SessionError::Transport(
            format!("WebDriver error: {status} - {body}").into(),
        ));
    }
    response
        .json()
        .await
        .map_err(|e| SessionError::Transport(Box::new(e)))
}

/// Browser session driven over the WebDriver wire protocol.
pub struct WebDriverBrowser {
    session: Arc<WdSession>,
}

impl WebDriverBrowser {
    /// Open a new headless session against a WebDriver endpoint
    /// (e.g. `http://localhost:9515`).
    pub async fn connect(endpoint: &str) -> SessionResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| SessionError::Transport(Box::new(e)))?;

        let capabilities = json!({
            "capabilities": {
                "alwaysMatch": {
                    "browserName": "chrome",
                    "goog:chromeOptions": {
                        "args": [
                            "--headless=new",
                            "--disable-gpu",
                            "--no-sandbox",
                            "--disable-dev-shm-usage",
                            "--disable-blink-features=AutomationControlled",
                            "--disable-notifications",
                            "--window-size=1920,1080",
                        ]
                    }
                }
            }
        });

        let base_url = endpoint.trim_end_matches('/').to_string();
        let response = client
            .post(format!("{base_url}/session"))
            .json(&capabilities)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        let session: WdEnvelope<NewSessionValue> = decode(response).await?;

        tracing::info!(
            endpoint = %base_url,
            session_id = %session.value.session_id,
            "WebDriver session opened"
        );

        Ok(Self {
            session: Arc::new(WdSession {
                client,
                base_url,
                session_id: session.value.session_id,
            }),
        })
    }
}

#[async_trait]
impl Browser for WebDriverBrowser {
    async fn navigate(&self, url: &str) -> SessionResult<()> {
        let _: WdEnvelope<serde_json::Value> =
            self.session.post("/url", &json!({ "url": url })).await?;
        Ok(())
    }

    async fn find_all(&self, query: &Query) -> SessionResult<Vec<Box<dyn Element>>> {
        find_from(&self.session, "/elements", query).await
    }

    async fn execute_script(&self, script: &str) -> SessionResult<serde_json::Value> {
        let envelope: WdEnvelope<serde_json::Value> = self
            .session
            .post("/execute/sync", &json!({ "script": script, "args": [] }))
            .await?;
        Ok(envelope.value)
    }

    async fn close(&self) -> SessionResult<()> {
        let response = self
            .session
            .client
            .delete(self.session.url(""))
            .send()
            .await
            .map_err(map_reqwest_error)?;
        let _: WdEnvelope<serde_json::Value> = decode(response).await?;
        tracing::info!(session_id = %self.session.session_id, "WebDriver session closed");
        Ok(())
    }
}

/// Handle to one remote element.
struct WdElement {
    session: Arc<WdSession>,
    element_id: String,
}

impl WdElement {
    fn path(&self, suffix: &str) -> String {
        format!("/element/{}{}", self.element_id, suffix)
    }
}

#[async_trait]
impl Element for WdElement {
    async fn text(&self) -> SessionResult<String> {
        let envelope: WdEnvelope<String> = self.session.get(&self.path("/text")).await?;
        Ok(envelope.value)
    }

    async fn attribute(&self, name: &str) -> SessionResult<Option<String>> {
        let envelope: WdEnvelope<Option<String>> = self
            .session
            .get(&self.path(&format!("/attribute/{name}")))
            .await?;
        Ok(envelope.value)
    }

    async fn find_all(&self, query: &Query) -> SessionResult<Vec<Box<dyn Element>>> {
        find_from(&self.session, &self.path("/elements"), query).await
    }

    async fn click(&self) -> SessionResult<()> {
        let _: WdEnvelope<serde_json::Value> =
            self.session.post(&self.path("/click"), &json!({})).await?;
        Ok(())
    }
}
