use super::{CONFIG_CONTENT_TYPE, GatewayRequest, RemoteGateway};
use crate::config::ConsoleConfig;
use crate::core::{AdminError, GatewayError, GatewayResult, QueryError, Result};
use async_trait::async_trait;
use log::debug;
use reqwest::{Client, RequestBuilder, Url, header};
use serde::Deserialize;
use serde_json::Value;

/// Message the admin API puts in `errors[].message` when the session is not authorized.
const UNAUTHORIZED_MESSAGE: &str = "Unauthorized";

#[derive(Debug, Deserialize)]
struct GraphqlResponse {
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    errors: Vec<GraphqlErrorEntry>,
}

#[derive(Debug, Deserialize)]
struct GraphqlErrorEntry {
    message: String,
    #[serde(default)]
    extensions: Option<Value>,
}

impl GraphqlErrorEntry {
    fn is_access_denied(&self) -> bool {
        if self.message == UNAUTHORIZED_MESSAGE {
            return true;
        }
        self.extensions
            .as_ref()
            .and_then(|ext| ext.get("code"))
            .and_then(Value::as_str)
            .is_some_and(|code| code.eq_ignore_ascii_case("unauthorized"))
    }
}

/// Error body of the REST configuration endpoint.
#[derive(Debug, Deserialize)]
struct RestErrorBody {
    #[serde(default)]
    err: Option<String>,
    #[serde(default)]
    class_name: Option<String>,
}

/// Gateway talking to a live cluster over HTTP.
#[derive(Debug, Clone)]
pub struct HttpGateway {
    client: Client,
    api_url: Url,
    config_url: Url,
    username: Option<String>,
    password: Option<String>,
}

impl HttpGateway {
    pub fn new(config: &ConsoleConfig) -> Result<Self> {
        config.validate().map_err(AdminError::Config)?;
        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| AdminError::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_url: config.api_url().map_err(AdminError::Config)?,
            config_url: config.config_url().map_err(AdminError::Config)?,
            username: config.username.clone(),
            password: config.password.clone(),
        })
    }

    pub fn api_url(&self) -> &Url {
        &self.api_url
    }

    fn authorize(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.username {
            Some(username) => builder.basic_auth(username, self.password.as_ref()),
            None => builder,
        }
    }
}

fn transport_error(err: reqwest::Error) -> GatewayError {
    match err.status() {
        Some(status) => GatewayError::transport_status(status.as_u16(), err.to_string()),
        None => GatewayError::transport(err.to_string()),
    }
}

fn is_success(status: u16) -> bool {
    (200..300).contains(&status)
}

/// Classifies a GraphQL HTTP response into data or one of the two error families.
pub(crate) fn parse_graphql_response(status: u16, body: &str) -> GatewayResult<Value> {
    let parsed = match serde_json::from_str::<GraphqlResponse>(body) {
        Ok(parsed) => parsed,
        Err(err) => {
            if is_success(status) {
                return Err(GatewayError::transport(format!(
                    "invalid response body: {}",
                    err
                )));
            }
            return Err(GatewayError::transport_status(status, body.trim().to_string()));
        }
    };

    if !parsed.errors.is_empty() {
        let access_denied = status == 401
            || status == 403
            || parsed.errors.iter().any(GraphqlErrorEntry::is_access_denied);
        let message = parsed
            .errors
            .iter()
            .map(|entry| entry.message.as_str())
            .collect::<Vec<_>>()
            .join("; ");
        return Err(GatewayError::Query(QueryError {
            message,
            access_denied,
        }));
    }

    if !is_success(status) {
        return Err(GatewayError::transport_status(
            status,
            format!("unexpected HTTP status {}", status),
        ));
    }

    match parsed.data {
        Some(data) if !data.is_null() => Ok(data),
        _ => Err(GatewayError::query("response carried no data")),
    }
}

/// Classifies a response of the configuration upload endpoint.
pub(crate) fn parse_upload_response(status: u16, body: &str) -> GatewayResult<()> {
    if is_success(status) {
        return Ok(());
    }
    let message = match serde_json::from_str::<RestErrorBody>(body) {
        Ok(RestErrorBody {
            err: Some(err),
            class_name,
        }) => match class_name {
            Some(class_name) => format!("{}: {}", class_name, err),
            None => err,
        },
        _ if body.trim().is_empty() => format!("unexpected HTTP status {}", status),
        _ => body.trim().to_string(),
    };
    Err(GatewayError::transport_status(status, message))
}

#[async_trait]
impl RemoteGateway for HttpGateway {
    async fn execute(&self, request: GatewayRequest) -> GatewayResult<Value> {
        debug!("POST {} ({})", self.api_url, request.operation.name());
        let response = self
            .authorize(self.client.post(self.api_url.clone()))
            .json(&request.to_body())
            .send()
            .await
            .map_err(transport_error)?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(transport_error)?;
        parse_graphql_response(status, &body)
    }

    async fn upload_config(&self, document: Vec<u8>) -> GatewayResult<()> {
        debug!("PUT {} ({} bytes)", self.config_url, document.len());
        let response = self
            .authorize(self.client.put(self.config_url.clone()))
            .header(header::CONTENT_TYPE, CONFIG_CONTENT_TYPE)
            .body(document)
            .send()
            .await
            .map_err(transport_error)?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(transport_error)?;
        parse_upload_response(status, &body)
    }
}
