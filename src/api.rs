//! Generic resource API and endpoint resolution
//!
//! Resources are addressed as `{origin}/{type}/{id}`; image search uses the
//! `search` type with the service id.

use reqwest::blocking::Response;
use tracing::instrument;

use crate::client::{Client, ClientError};

/// Region of interest covering the whole image (`left-top-right-bottom`)
pub const DEFAULT_LOC: &str = "0-0-1-1";

/// Join `origin` and path segments with `/`
///
/// Trailing slashes on `origin` are dropped so the joined path never holds `//`.
pub fn join_url(origin: &str, segments: &[&str]) -> String {
    std::iter::once(origin.trim_end_matches('/'))
        .chain(segments.iter().copied())
        .collect::<Vec<_>>()
        .join("/")
}

/// URL of a generic `(type, id)` resource
pub fn resolve(origin: &str, resource_type: &str, resource_id: &str) -> String {
    join_url(origin, &[resource_type, resource_id])
}

/// A `(type, id)` resource bound to a client
#[derive(Debug)]
pub struct Api<'a> {
    client: &'a Client,
    resource_type: String,
    resource_id: String,
}

impl<'a> Api<'a> {
    pub(crate) fn new(
        client: &'a Client,
        resource_type: impl Into<String>,
        resource_id: impl Into<String>,
    ) -> Self {
        Self {
            client,
            resource_type: resource_type.into(),
            resource_id: resource_id.into(),
        }
    }

    pub(crate) fn client(&self) -> &'a Client {
        self.client
    }

    pub fn resource_type(&self) -> &str {
        &self.resource_type
    }

    pub fn resource_id(&self) -> &str {
        &self.resource_id
    }

    pub fn base_url(&self) -> String {
        resolve(
            &self.client.config().origin,
            &self.resource_type,
            &self.resource_id,
        )
    }

    /// Search for images similar to the one at `image_url`
    ///
    /// `loc` restricts the search to a region given as fractional
    /// `left-top-right-bottom` coordinates.
    // TODO: accept a local image file as a multipart part instead of a URL.
    #[instrument(skip(self), fields(url = %self.base_url()))]
    pub fn query(&self, image_url: &str, loc: &str) -> Result<Response, ClientError> {
        let form = [("url", image_url), ("loc", loc)];
        self.client.post(&self.base_url(), &form, Vec::new())
    }

    /// [`query`](Self::query) over the whole image
    pub fn query_default(&self, image_url: &str) -> Result<Response, ClientError> {
        self.query(image_url, DEFAULT_LOC)
    }
}
