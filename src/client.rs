//! ProductAI API client
//!
//! The [`Client`] owns the credentials and one pooled HTTP session for its
//! whole lifetime. Every call goes through [`Client::post`], which signs a
//! fresh header set and sends a `POST`.

use reqwest::blocking::multipart::{Form, Part};
use reqwest::blocking::{Client as HttpClient, RequestBuilder, Response};
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, instrument};

use crate::api::Api;
use crate::auth::{calc_signature, make_auth_headers, AuthError, AuthHeaders, Credentials};
use crate::base_client::{default_http_client, send_with_retries, PoolGate};
use crate::config::ClientConfig;
use crate::image_set::ImageSetApi;

/// Error types for client operations
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Unsupported operation: {0}")]
    Unsupported(&'static str),
}

/// A file-like multipart part sent alongside a request
///
/// Attachments are not part of the signed payload.
#[derive(Debug, Clone)]
pub enum Attachment {
    /// In-memory content, sent with the field name as its file name
    Bytes { field: String, content: Vec<u8> },
    /// Content streamed from a file on disk
    File { field: String, path: PathBuf },
}

impl Attachment {
    fn into_part(self) -> Result<(String, Part), ClientError> {
        match self {
            Attachment::Bytes { field, content } => {
                let part = Part::bytes(content).file_name(field.clone());
                Ok((field, part))
            }
            Attachment::File { field, path } => Ok((field, Part::file(path)?)),
        }
    }
}

/// Client for the ProductAI API
///
/// # Example
///
/// ```no_run
/// use productai_sdk::Client;
///
/// fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let client = Client::new("my-access-key-id", "my-access-key-secret")?;
///
///     let response = client
///         .get_image_search_api("my-service-id")
///         .query_default("https://example.com/shoe.jpg")?;
///     println!("{}", response.text()?);
///
///     Ok(())
/// }
/// ```
pub struct Client {
    credentials: Credentials,
    config: ClientConfig,
    http_client: HttpClient,
    gate: Arc<PoolGate>,
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("credentials", &self.credentials)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Client {
    /// Create a client with the default session and configuration
    pub fn new(
        access_key_id: impl Into<String>,
        access_key_secret: impl Into<String>,
    ) -> Result<Self, ClientError> {
        Self::with_config(
            Credentials::new(access_key_id, access_key_secret),
            ClientConfig::default(),
        )
    }

    /// Create a client with custom configuration and a session built from it
    pub fn with_config(credentials: Credentials, config: ClientConfig) -> Result<Self, ClientError> {
        let http_client = default_http_client(&config)?;
        Ok(Self::with_http_client(credentials, config, http_client))
    }

    /// Create a client around a caller-built session
    ///
    /// The configured timeout is still applied to every request.
    pub fn with_http_client(
        credentials: Credentials,
        config: ClientConfig,
        http_client: HttpClient,
    ) -> Self {
        let gate = Arc::new(PoolGate::new(config.pool_max_size, config.pool_block));
        Self {
            credentials,
            config,
            http_client,
            gate,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Generic API for any `(type, id)` resource
    pub fn get_api(
        &self,
        resource_type: impl Into<String>,
        resource_id: impl Into<String>,
    ) -> Api<'_> {
        Api::new(self, resource_type, resource_id)
    }

    /// Image search API for a service id
    pub fn get_image_search_api(&self, service_id: impl Into<String>) -> Api<'_> {
        Api::new(self, "search", service_id)
    }

    /// Image set management API
    pub fn get_image_set_api(&self, image_set_id: impl Into<String>) -> ImageSetApi<'_> {
        ImageSetApi::new(self, image_set_id)
    }

    /// Fresh auth headers for `form`, signature included
    pub fn get_auth_headers(&self, form: &[(&str, &str)]) -> AuthHeaders {
        let mut headers = make_auth_headers(self.credentials.access_key_id(), "POST");
        let signature =
            calc_signature(&headers.pairs(), form, self.credentials.access_key_secret());
        headers.signature = Some(signature);
        headers
    }

    /// Send a signed `POST` to `api_url`
    ///
    /// `form` is signed and sent as the body; `files` are sent as multipart
    /// parts (with `form` as text fields) and are not signed. The response is
    /// returned whatever its status.
    ///
    /// The pool slot is released once response headers arrive, so the limit
    /// set by [`ClientConfig::pool_max_size`] bounds concurrent sends, not
    /// responses the caller has yet to read.
    #[instrument(skip(self, form, files), fields(form_fields = form.len(), files = files.len()))]
    pub fn post(
        &self,
        api_url: &str,
        form: &[(&str, &str)],
        files: Vec<Attachment>,
    ) -> Result<Response, ClientError> {
        let headers = self.get_auth_headers(form).to_header_map()?;
        debug!(nonce = ?headers.get(crate::auth::HEADER_NONCE), "Signed request");

        let _slot = self.gate.acquire();
        let response = send_with_retries(self.config.max_retries, || {
            let request = self
                .http_client
                .post(api_url)
                .headers(headers.clone())
                .timeout(self.config.timeout);
            Self::attach_body(request, form, &files)
        })?;

        debug!(status = %response.status(), "Received response");
        Ok(response)
    }

    fn attach_body(
        request: RequestBuilder,
        form: &[(&str, &str)],
        files: &[Attachment],
    ) -> Result<RequestBuilder, ClientError> {
        if files.is_empty() {
            if form.is_empty() {
                return Ok(request);
            }
            return Ok(request.form(form));
        }

        let mut multipart = Form::new();
        for (key, value) in form {
            multipart = multipart.text(key.to_string(), value.to_string());
        }
        for attachment in files {
            let (field, part) = attachment.clone().into_part()?;
            multipart = multipart.part(field, part);
        }
        Ok(request.multipart(multipart))
    }
}
