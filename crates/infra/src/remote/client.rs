//! Client for the remote accounting API.
//!
//! Wraps the HTTP transport with the remote service's protocol rules:
//! bearer tokens from the token provider, one forced refresh on a 401,
//! bounded backoff on 429 honoring `Retry-After`, and the JSON response
//! envelope whose non-zero `code` carries a business-rule rejection.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use ledgersync_common::auth::{AuthError, TokenProvider};
use ledgersync_core::AccountingApi;
use ledgersync_domain::{
    ContactDraft, CreditNoteDraft, InvoiceDraft, LedgerSyncError, PaymentDraft, RemoteContact,
    RemoteCreditNote, RemoteInvoice, RemoteItem, RemotePayment, Result,
};
use reqwest::{Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, instrument, warn};

use crate::http::HttpClient;

const DEFAULT_RATE_LIMIT_RETRIES: usize = 3;
const DEFAULT_RATE_LIMIT_DELAY: Duration = Duration::from_secs(2);

/// Typed access to the remote accounting service.
pub struct RemoteClient {
    http: HttpClient,
    tokens: Arc<dyn TokenProvider>,
    base_url: String,
    organization_id: String,
    rate_limit_retries: usize,
    rate_limit_delay: Duration,
}

impl RemoteClient {
    #[must_use]
    pub fn new(
        http: HttpClient,
        tokens: Arc<dyn TokenProvider>,
        base_url: impl Into<String>,
        organization_id: impl Into<String>,
    ) -> Self {
        Self {
            http,
            tokens,
            base_url: base_url.into(),
            organization_id: organization_id.into(),
            rate_limit_retries: DEFAULT_RATE_LIMIT_RETRIES,
            rate_limit_delay: DEFAULT_RATE_LIMIT_DELAY,
        }
    }

    /// Override 429 handling (primarily to keep tests fast).
    #[must_use]
    pub fn with_rate_limit(mut self, retries: usize, delay: Duration) -> Self {
        self.rate_limit_retries = retries;
        self.rate_limit_delay = delay;
        self
    }

    /// Perform a request against an arbitrary API path.
    ///
    /// All typed operations funnel through here; the method also serves
    /// endpoints this client has no typed wrapper for.
    #[instrument(skip(self, params, body))]
    pub async fn raw_request(
        &self,
        method: Method,
        path: &str,
        params: &[(&str, &str)],
        body: Option<&Value>,
    ) -> Result<Value> {
        let url = format!("{}{}", self.base_url, path);
        let mut refreshed = false;
        let mut rate_attempts = 0usize;

        loop {
            let token = self.tokens.get_access_token().await.map_err(auth_to_sync)?;

            let mut builder = self
                .http
                .request(method.clone(), &url)
                .query(&[("organization_id", self.organization_id.as_str())])
                .query(params)
                .bearer_auth(&token);
            if let Some(body) = body {
                builder = builder.json(body);
            }

            let response = self.http.send(builder).await?;
            let status = response.status();

            match status {
                StatusCode::UNAUTHORIZED if !refreshed => {
                    // The token may have been revoked out from under the
                    // cache; refresh once and replay.
                    debug!(path, "401 received, forcing token refresh");
                    refreshed = true;
                    self.tokens.force_refresh().await.map_err(auth_to_sync)?;
                    continue;
                }
                StatusCode::UNAUTHORIZED => {
                    return Err(LedgerSyncError::Auth(
                        "request rejected with 401 after a forced token refresh".into(),
                    ));
                }
                StatusCode::TOO_MANY_REQUESTS => {
                    if rate_attempts >= self.rate_limit_retries {
                        return Err(LedgerSyncError::RateLimit(format!(
                            "{path} still rate limited after {rate_attempts} retries"
                        )));
                    }
                    let delay = retry_after(&response).unwrap_or(self.rate_limit_delay);
                    warn!(path, delay_ms = delay.as_millis() as u64, "rate limited, backing off");
                    rate_attempts += 1;
                    tokio::time::sleep(delay).await;
                    continue;
                }
                StatusCode::NOT_FOUND => {
                    return Err(LedgerSyncError::NotFound(format!("{path} not found")));
                }
                _ => {}
            }

            return parse_envelope(response, path).await;
        }
    }

    async fn get(&self, path: &str, params: &[(&str, &str)]) -> Result<Value> {
        self.raw_request(Method::GET, path, params, None).await
    }

    async fn post(&self, path: &str, body: &Value) -> Result<Value> {
        self.raw_request(Method::POST, path, &[], Some(body)).await
    }
}

#[async_trait]
impl AccountingApi for RemoteClient {
    async fn find_contact_by_email(&self, email: &str) -> Result<Option<RemoteContact>> {
        let value = self.get("/contacts", &[("email", email)]).await?;
        let mut contacts: Vec<RemoteContact> = parse_field(&value, "contacts")?;
        Ok(if contacts.is_empty() { None } else { Some(contacts.remove(0)) })
    }

    async fn get_contact(&self, contact_id: &str) -> Result<RemoteContact> {
        let value = self.get(&format!("/contacts/{contact_id}"), &[]).await?;
        parse_field(&value, "contact")
    }

    async fn create_contact(&self, draft: &ContactDraft) -> Result<RemoteContact> {
        let value = self.post("/contacts", &serde_json::to_value(draft)?).await?;
        parse_field(&value, "contact")
    }

    async fn create_invoice(&self, draft: &InvoiceDraft) -> Result<RemoteInvoice> {
        let value = self.post("/invoices", &serde_json::to_value(draft)?).await?;
        parse_field(&value, "invoice")
    }

    async fn submit_invoice(&self, invoice_id: &str) -> Result<RemoteInvoice> {
        let value =
            self.post(&format!("/invoices/{invoice_id}/status/sent"), &Value::Null).await?;
        // Some deployments return only an acknowledgement here.
        if value.get("invoice").is_some() {
            parse_field(&value, "invoice")
        } else {
            Ok(RemoteInvoice {
                id: invoice_id.to_string(),
                number: String::new(),
                status: "sent".into(),
            })
        }
    }

    async fn create_payment(&self, draft: &PaymentDraft) -> Result<RemotePayment> {
        let value = self.post("/customerpayments", &serde_json::to_value(draft)?).await?;
        parse_field(&value, "payment")
    }

    async fn create_credit_note(&self, draft: &CreditNoteDraft) -> Result<RemoteCreditNote> {
        let value = self.post("/creditnotes", &serde_json::to_value(draft)?).await?;
        parse_field(&value, "creditnote")
    }

    async fn list_items(&self) -> Result<Vec<RemoteItem>> {
        let value = self.get("/items", &[]).await?;
        parse_field(&value, "items")
    }

    async fn test_connection(&self) -> Result<bool> {
        match self.get("/items", &[("per_page", "1")]).await {
            Ok(_) => Ok(true),
            Err(LedgerSyncError::Auth(reason)) => {
                debug!(%reason, "connection test failed to authenticate");
                Ok(false)
            }
            Err(err) => Err(err),
        }
    }
}

fn auth_to_sync(err: AuthError) -> LedgerSyncError {
    match err {
        AuthError::RequestFailed(msg) => LedgerSyncError::Network(msg),
        other => LedgerSyncError::Auth(other.to_string()),
    }
}

fn retry_after(response: &Response) -> Option<Duration> {
    response
        .headers()
        .get(reqwest::header::RETRY_AFTER)?
        .to_str()
        .ok()?
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}

/// Decode the response envelope, surfacing business-rule rejections.
async fn parse_envelope(response: Response, path: &str) -> Result<Value> {
    let status = response.status();
    let text = response
        .text()
        .await
        .map_err(|err| LedgerSyncError::Network(format!("reading {path} response: {err}")))?;

    // Error pages are not guaranteed to be JSON; classify by status.
    let value: Value = match serde_json::from_str(&text) {
        Ok(value) => value,
        Err(_) if text.is_empty() => Value::Null,
        Err(err) if status.is_success() => {
            return Err(LedgerSyncError::Internal(format!("unparseable {path} response: {err}")));
        }
        Err(_) if status.is_client_error() => {
            return Err(LedgerSyncError::Validation(format!("{path} rejected with {status}")));
        }
        Err(_) => {
            return Err(LedgerSyncError::Network(format!("{path} failed with {status}")));
        }
    };

    // Envelope rule: a non-zero code is a rejection even under HTTP 200.
    if let Some(code) = value.get("code").and_then(Value::as_i64) {
        if code != 0 {
            let message = value
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("remote rejected the request");
            return Err(LedgerSyncError::Validation(format!("{message} (code {code})")));
        }
    }

    if status.is_success() {
        Ok(value)
    } else if status.is_client_error() {
        Err(LedgerSyncError::Validation(format!("{path} rejected with {status}")))
    } else {
        Err(LedgerSyncError::Network(format!("{path} failed with {status}")))
    }
}

fn parse_field<T: DeserializeOwned>(value: &Value, field: &str) -> Result<T> {
    let inner = value
        .get(field)
        .cloned()
        .ok_or_else(|| LedgerSyncError::Internal(format!("response missing `{field}` field")))?;
    Ok(serde_json::from_value(inner)?)
}
