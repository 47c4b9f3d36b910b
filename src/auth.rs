//! Request authentication for the ProductAI API
//!
//! Every request carries a fixed set of `x-ca-*` headers plus an
//! `x-ca-signature` computed over them and the form body:
//!
//! ```text
//! payload   = headers ∪ form            (form wins on key collision)
//! canonical = k1=v1&k2=v2&...           (keys sorted, values trimmed)
//! signature = Base64(HMAC-SHA1(secret, canonical))
//! ```
//!
//! The server rebuilds the same string, so any change in ordering, join
//! character or trimming yields a signature it rejects.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use chrono::Utc;
use hmac::{Hmac, Mac};
use rand::Rng;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use sha1::Sha1;
use std::collections::BTreeMap;
use std::fmt::Display;
use thiserror::Error;
use tracing::debug;

use crate::{API_VERSION, SIGNATURE_LEN};

type HmacSha1 = Hmac<Sha1>;

pub const HEADER_ACCESS_KEY_ID: &str = "x-ca-accesskeyid";
pub const HEADER_VERSION: &str = "x-ca-version";
pub const HEADER_TIMESTAMP: &str = "x-ca-timestamp";
pub const HEADER_NONCE: &str = "x-ca-signaturenonce";
pub const HEADER_METHOD: &str = "requestmethod";
pub const HEADER_SIGNATURE: &str = "x-ca-signature";

const NONCE_CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Errors that can occur while preparing credentials or auth headers
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Invalid value for header '{0}'")]
    InvalidHeader(&'static str),
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

// ============================================================================
// Credentials
// ============================================================================

/// Access key pair used to sign requests
#[derive(Clone)]
pub struct Credentials {
    access_key_id: String,
    access_key_secret: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key_id", &self.access_key_id)
            .field("access_key_secret", &"[REDACTED]")
            .finish()
    }
}

impl Credentials {
    pub fn new(access_key_id: impl Into<String>, access_key_secret: impl Into<String>) -> Self {
        Self {
            access_key_id: access_key_id.into(),
            access_key_secret: access_key_secret.into(),
        }
    }

    /// Load credentials from an INI profile file
    ///
    /// # Arguments
    /// * `file_path` - Path to config file (defaults to ~/.productai/config)
    /// * `profile_name` - Profile name (defaults to "DEFAULT")
    ///
    /// The profile must define `access_key_id` and `access_key_secret`.
    /// Lines starting with `#` or `;` are comments; values are kept verbatim
    /// otherwise.
    pub fn from_file(
        file_path: Option<String>,
        profile_name: Option<String>,
    ) -> Result<Self, AuthError> {
        use configparser::ini::Ini;

        let fp = match file_path {
            Some(path) => path,
            None => {
                let home_dir = home::home_dir().ok_or_else(|| {
                    AuthError::ConfigError("Cannot determine home directory".to_string())
                })?;
                format!("{}/.productai/config", home_dir.to_string_lossy())
            }
        };

        let pn = profile_name.unwrap_or_else(|| "DEFAULT".to_string());

        let config_content = std::fs::read_to_string(&fp).map_err(|e| {
            AuthError::ConfigError(format!("Config file '{}' not found: {}", fp, e))
        })?;

        // Only whole-line comments are dropped; '#' and ';' are legal inside secrets.
        let config_content = config_content
            .lines()
            .filter(|line| !line.trim_start().starts_with(['#', ';']))
            .collect::<Vec<_>>()
            .join("\n");

        let mut config = Ini::new();
        config.set_comment_symbols(&[]);
        config
            .read(config_content)
            .map_err(|e| AuthError::ConfigError(format!("Invalid config file: {}", e)))?;

        let access_key_id = config.get(&pn, "access_key_id").ok_or_else(|| {
            AuthError::ConfigError(format!("Missing 'access_key_id' in profile '{}'", pn))
        })?;
        let access_key_secret = config.get(&pn, "access_key_secret").ok_or_else(|| {
            AuthError::ConfigError(format!("Missing 'access_key_secret' in profile '{}'", pn))
        })?;

        debug!(profile = %pn, access_key_id = %access_key_id, "Loaded credentials from file");
        Ok(Self::new(access_key_id, access_key_secret))
    }

    pub fn access_key_id(&self) -> &str {
        &self.access_key_id
    }

    pub(crate) fn access_key_secret(&self) -> &str {
        &self.access_key_secret
    }
}

// ============================================================================
// Auth headers
// ============================================================================

/// The authentication header set attached to one request
///
/// Built fresh for every request by [`make_auth_headers`]; `signature` is
/// filled in afterwards from [`calc_signature`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthHeaders {
    pub access_key_id: String,
    pub version: String,
    pub timestamp: String,
    pub nonce: String,
    pub method: String,
    pub signature: Option<String>,
}

impl AuthHeaders {
    /// The signed header fields as `(name, value)` pairs
    pub fn pairs(&self) -> [(&'static str, &str); 5] {
        [
            (HEADER_ACCESS_KEY_ID, self.access_key_id.as_str()),
            (HEADER_VERSION, self.version.as_str()),
            (HEADER_TIMESTAMP, self.timestamp.as_str()),
            (HEADER_NONCE, self.nonce.as_str()),
            (HEADER_METHOD, self.method.as_str()),
        ]
    }

    /// Convert to an HTTP header map, including the signature when present
    ///
    /// Fails if a value cannot be carried in an HTTP header (control
    /// characters, non-visible bytes), before anything is sent.
    pub fn to_header_map(&self) -> Result<HeaderMap, AuthError> {
        let mut headers = HeaderMap::new();
        let signature = self.signature.as_deref().map(|s| (HEADER_SIGNATURE, s));
        for (name, value) in self.pairs().into_iter().chain(signature) {
            let value = HeaderValue::from_str(value).map_err(|_| AuthError::InvalidHeader(name))?;
            headers.insert(HeaderName::from_static(name), value);
        }
        Ok(headers)
    }
}

/// Build the auth headers for one request, without the signature
pub fn make_auth_headers(access_key_id: &str, method: &str) -> AuthHeaders {
    AuthHeaders {
        access_key_id: access_key_id.to_string(),
        version: API_VERSION.to_string(),
        timestamp: form_value(Utc::now().timestamp()),
        nonce: short_uuid(SIGNATURE_LEN),
        method: method.to_string(),
        signature: None,
    }
}

/// Random lowercase alphanumeric token of `length` characters
pub fn short_uuid(length: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..length)
        .map(|_| NONCE_CHARSET[rng.gen_range(0..NONCE_CHARSET.len())] as char)
        .collect()
}

// ============================================================================
// Canonical form and signature
// ============================================================================

/// Convert a header or form value to the string that gets signed and sent
///
/// Every value goes through here, so numbers such as timestamps sign the
/// same way as their decimal text.
pub fn form_value(value: impl Display) -> String {
    value.to_string()
}

/// Build the canonical string that gets signed
///
/// Form entries are merged over the headers, keys are sorted bytewise and
/// each value is stripped of surrounding ASCII whitespace.
pub fn canonical_payload<'a, V: Display, W: Display>(
    headers: &[(&'a str, V)],
    form: &[(&'a str, W)],
) -> String {
    let mut payload: BTreeMap<&'a str, String> =
        headers.iter().map(|(key, value)| (*key, form_value(value))).collect();
    payload.extend(form.iter().map(|(key, value)| (*key, form_value(value))));

    payload
        .iter()
        .map(|(key, value)| format!("{}={}", key, strip_value(value)))
        .collect::<Vec<_>>()
        .join("&")
}

/// Sign `headers` plus `form` with `secret`, returning the base64 signature
pub fn calc_signature<'a, V: Display, W: Display>(
    headers: &[(&'a str, V)],
    form: &[(&'a str, W)],
    secret: &str,
) -> String {
    let payload = canonical_payload(headers, form);
    debug!(payload = %payload, "Built canonical payload");
    sign(payload.as_bytes(), secret.as_bytes())
}

/// Base64(HMAC-SHA1(secret, message))
pub fn sign(message: &[u8], secret: &[u8]) -> String {
    let mut mac = HmacSha1::new_from_slice(secret).expect("HMAC can accept any key length");
    mac.update(message);
    BASE64.encode(mac.finalize().into_bytes())
}

// Same set as bytes.strip(): includes vertical tab, which char::is_ascii_whitespace does not.
fn strip_value(value: &str) -> &str {
    value.trim_matches(|c| matches!(c, ' ' | '\t' | '\n' | '\r' | '\x0b' | '\x0c'))
}
