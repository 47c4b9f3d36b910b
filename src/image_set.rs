//! Image set management
//!
//! Image sets live under a fixed API group: every request goes to
//! `{origin}/image_sets/_0000014/{image_set_id}`.

use reqwest::blocking::Response;
use std::path::Path;
use tracing::instrument;

use crate::api::{join_url, resolve, Api};
use crate::client::{Attachment, Client, ClientError};

pub const IMAGE_SETS_TYPE: &str = "image_sets";
/// Gateway group id the service routes all image-set calls through
pub const IMAGE_SETS_GROUP_ID: &str = "_0000014";

const URLS_TO_DELETE_FIELD: &str = "urls_to_delete";

/// URL of an image set
pub fn resolve_image_set(origin: &str, image_set_id: &str) -> String {
    join_url(
        &resolve(origin, IMAGE_SETS_TYPE, IMAGE_SETS_GROUP_ID),
        &[image_set_id],
    )
}

/// An image set bound to a client
#[derive(Debug)]
pub struct ImageSetApi<'a> {
    api: Api<'a>,
    image_set_id: String,
}

impl<'a> ImageSetApi<'a> {
    pub(crate) fn new(client: &'a Client, image_set_id: impl Into<String>) -> Self {
        Self {
            api: Api::new(client, IMAGE_SETS_TYPE, IMAGE_SETS_GROUP_ID),
            image_set_id: image_set_id.into(),
        }
    }

    pub fn image_set_id(&self) -> &str {
        &self.image_set_id
    }

    pub fn base_url(&self) -> String {
        join_url(&self.api.base_url(), &[self.image_set_id.as_str()])
    }

    /// Image sets cannot be searched directly; always fails without sending.
    pub fn query(&self, _image_url: &str, _loc: &str) -> Result<Response, ClientError> {
        Err(ClientError::Unsupported("query is not available on image sets"))
    }

    /// Add the image at `image_url` to the set
    ///
    /// `meta` is opaque to the client; `None` is sent as an empty value.
    #[instrument(skip(self, meta), fields(image_set_id = %self.image_set_id))]
    pub fn add_image(&self, image_url: &str, meta: Option<&str>) -> Result<Response, ClientError> {
        let form = [("image_url", image_url), ("meta", meta.unwrap_or(""))];
        self.api.client().post(&self.base_url(), &form, Vec::new())
    }

    /// Remove images from the set by URL
    ///
    /// The URLs go out newline-separated as a file part named
    /// `urls_to_delete`, which is what the service's multipart parser reads.
    #[instrument(skip(self, urls), fields(image_set_id = %self.image_set_id, count = urls.len()))]
    pub fn delete_images<S: AsRef<str>>(&self, urls: &[S]) -> Result<Response, ClientError> {
        let content = urls
            .iter()
            .map(AsRef::as_ref)
            .collect::<Vec<_>>()
            .join("\n");
        let attachment = Attachment::Bytes {
            field: URLS_TO_DELETE_FIELD.to_string(),
            content: content.into_bytes(),
        };
        self.api
            .client()
            .post(&self.base_url(), &[], vec![attachment])
    }

    /// Remove the images listed in a file, one URL per line
    #[instrument(skip(self, path), fields(image_set_id = %self.image_set_id))]
    pub fn delete_images_from_file(
        &self,
        path: impl AsRef<Path>,
    ) -> Result<Response, ClientError> {
        let attachment = Attachment::File {
            field: URLS_TO_DELETE_FIELD.to_string(),
            path: path.as_ref().to_path_buf(),
        };
        self.api
            .client()
            .post(&self.base_url(), &[], vec![attachment])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClientConfig;
    use crate::{Credentials, API_URL};

    #[test]
    fn test_resolve_image_set_endpoint() {
        assert_eq!(
            resolve_image_set(API_URL, "abc"),
            "https://api.productai.cn/image_sets/_0000014/abc"
        );
    }

    #[test]
    fn test_image_set_base_url() {
        let client = Client::new("AK1", "secret").unwrap();
        let image_set = client.get_image_set_api("abc");
        assert_eq!(image_set.image_set_id(), "abc");
        assert_eq!(
            image_set.base_url(),
            "https://api.productai.cn/image_sets/_0000014/abc"
        );
    }

    #[test]
    fn test_query_fails_without_sending() {
        // Nothing listens on the discard port; a request would surface as an HTTP error.
        let client = Client::with_config(
            Credentials::new("AK1", "secret"),
            ClientConfig::default()
                .with_origin("http://127.0.0.1:9")
                .with_max_retries(0),
        )
        .unwrap();

        let result = client
            .get_image_set_api("abc")
            .query("http://x/img.jpg", "0-0-1-1");
        assert!(matches!(result, Err(ClientError::Unsupported(_))));
    }

    #[test]
    fn test_delete_images_from_missing_file_fails() {
        let client = Client::with_config(
            Credentials::new("AK1", "secret"),
            ClientConfig::default()
                .with_origin("http://127.0.0.1:9")
                .with_max_retries(0),
        )
        .unwrap();

        let result = client
            .get_image_set_api("abc")
            .delete_images_from_file("/nonexistent/urls.txt");
        assert!(matches!(result, Err(ClientError::Io(_))));
    }
}
