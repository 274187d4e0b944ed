use std::collections::HashMap;
use std::sync::Arc;

use reqwest::Url;
use reqwest::cookie::Jar;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error};

use crate::cookies::CookieJar;
use crate::error::{Result, ServiceError};

/**
    Shared HTTP client: device headers on every request, cookies from the
    client's jar. Requests are sent one at a time with the client's default
    timeouts.
*/
#[derive(Debug, Clone)]
pub struct Transport {
    client: reqwest::Client,
    cookies: Arc<Jar>,
}

#[derive(Serialize)]
struct GraphQlRequest<'a> {
    query: &'a str,
    variables: &'a Value,
}

impl Transport {
    pub fn new(headers: &HashMap<String, String>) -> Result<Self> {
        let mut map = HeaderMap::new();
        for (name, value) in headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| ServiceError::Config(format!("invalid header name '{name}': {e}")))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| ServiceError::Config(format!("invalid value for header {name}: {e}")))?;
            map.insert(name, value);
        }

        let cookies = Arc::new(Jar::default());
        let client = reqwest::Client::builder()
            .default_headers(map)
            .cookie_provider(Arc::clone(&cookies))
            .build()
            .map_err(|e| ServiceError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client, cookies })
    }

    pub fn add_cookies(&self, jar: &CookieJar) {
        jar.add_to(&self.cookies);
    }

    fn parse_url(url: &str) -> Result<Url> {
        Url::parse(url).map_err(|e| ServiceError::Config(format!("invalid URL '{url}': {e}")))
    }

    async fn get(&self, url: Url) -> Result<reqwest::Response> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| {
                error!(%url, error = %e, "GET request failed");
                ServiceError::http(url.as_str(), e)
            })?;
        debug!(%url, status = %response.status(), "GET");
        Ok(response)
    }

    pub async fn get_text(&self, url: &str) -> Result<String> {
        let response = self.get(Self::parse_url(url)?).await?;
        response
            .text()
            .await
            .map_err(|e| ServiceError::http(url, e))
    }

    /**
        GET `url` with the given query parameters and decode a JSON body.
    */
    pub async fn get_json(&self, url: &str, params: &[(&str, &str)]) -> Result<Value> {
        let url = Url::parse_with_params(url, params)
            .map_err(|e| ServiceError::Config(format!("invalid URL '{url}': {e}")))?;
        let response = self.get(url.clone()).await?;
        response
            .json()
            .await
            .map_err(|e| ServiceError::http(url.as_str(), e))
    }

    /**
        POST a GraphQL query and return the whole decoded response.

        A response with an `errors` member is turned into
        [`ServiceError::Api`] carrying those errors verbatim; `context` names
        the operation in that error.
    */
    pub async fn graphql(
        &self,
        endpoint: &str,
        query: &str,
        variables: &Value,
        context: &'static str,
    ) -> Result<Value> {
        let url = Self::parse_url(endpoint)?;
        let body = GraphQlRequest { query, variables };
        let response = self
            .client
            .post(url.clone())
            .json(&body)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| {
                error!(%url, error = %e, "GraphQL request for {context} failed");
                ServiceError::http(endpoint, e)
            })?;

        let payload: Value = response
            .json()
            .await
            .map_err(|e| ServiceError::http(endpoint, e))?;
        debug!(
            "GraphQL response for {context}: {}",
            serde_json::to_string_pretty(&payload).unwrap_or_default()
        );

        if let Some(errors) = payload.get("errors").filter(|e| !e.is_null()) {
            error!(%errors, "GraphQL API returned errors for {context}");
            return Err(ServiceError::Api {
                context,
                payload: errors.clone(),
            });
        }

        Ok(payload)
    }
}
