//! Upbit request signing.
//!
//! Private endpoints take `Authorization: Bearer <jwt>`, where the JWT is
//! HS256-signed over `{access_key, nonce}` and, when the request carries
//! parameters, `query_hash` (hex SHA-512 of the form-encoded parameters)
//! with `query_hash_alg: "SHA512"`.

use std::{fmt, sync::Arc};

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use hmac::{Hmac, Mac};
use serde::Serialize;
use sha2::{Digest, Sha256, Sha512};

use crate::{Error, Result};

type HmacSha256 = Hmac<Sha256>;

const ACCESS_KEY_VAR: &str = "UPBIT_ACCESS_KEY";
const SECRET_KEY_VAR: &str = "UPBIT_SECRET_KEY";

/// Upbit API key pair. `Debug` never prints the secret.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    access_key: String,
    secret_key: String,
}

impl Credentials {
    /// # Errors
    ///
    /// [`Error::Usage`] when either key is empty.
    pub fn new(access_key: impl Into<String>, secret_key: impl Into<String>) -> Result<Self> {
        let (access_key, secret_key) = (access_key.into(), secret_key.into());
        if access_key.is_empty() || secret_key.is_empty() {
            return Err(Error::Usage(
                "access key and secret key must not be empty".to_owned(),
            ));
        }

        Ok(Self {
            access_key,
            secret_key,
        })
    }

    /// Reads `UPBIT_ACCESS_KEY` and `UPBIT_SECRET_KEY`.
    ///
    /// # Errors
    ///
    /// [`Error::Usage`] when a variable is unset or empty.
    pub fn from_env() -> Result<Self> {
        let read = |name: &str| {
            std::env::var(name).map_err(|_| Error::Usage(format!("{name} is not set")))
        };
        Self::new(read(ACCESS_KEY_VAR)?, read(SECRET_KEY_VAR)?)
    }

    #[must_use]
    pub fn access_key(&self) -> &str {
        &self.access_key
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key", &self.access_key)
            .field("secret_key", &"<redacted>")
            .finish()
    }
}

/// Supplies the per-request `nonce` claim.
pub trait NonceSource: fmt::Debug + Send + Sync {
    fn nonce(&self) -> String;
}

/// Random UUID v4 nonces. Upbit rejects reused nonces.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidNonce;

impl NonceSource for UuidNonce {
    fn nonce(&self) -> String {
        uuid::Uuid::new_v4().to_string()
    }
}

/// Always returns the same nonce. Only useful for reproducible signatures.
#[derive(Debug, Clone)]
pub struct FixedNonce(pub String);

impl NonceSource for FixedNonce {
    fn nonce(&self) -> String {
        self.0.clone()
    }
}

#[derive(Serialize)]
struct Header {
    alg: &'static str,
    typ: &'static str,
}

#[derive(Serialize)]
struct Claims<'a> {
    access_key: &'a str,
    nonce: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    query_hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    query_hash_alg: Option<&'static str>,
}

/// Form-encodes `params` the way Upbit hashes them: spaces become `+` and
/// array keys keep literal brackets (`states[]=wait`).
pub fn query_string<K, V>(params: &[(K, V)]) -> String
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(params.iter().map(|(k, v)| (k.as_ref(), v.as_ref())))
        .finish()
        .replace("%5B%5D=", "[]=")
}

/// Hex SHA-512 of [`query_string`].
pub fn query_hash<K, V>(params: &[(K, V)]) -> String
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    hex::encode(Sha512::digest(query_string(params).as_bytes()))
}

/// Builds the bearer tokens for private endpoints.
#[derive(Debug, Clone)]
pub struct Authenticator {
    credentials: Credentials,
    nonce: Arc<dyn NonceSource>,
}

impl Authenticator {
    #[must_use]
    pub fn new(credentials: Credentials) -> Self {
        Self {
            credentials,
            nonce: Arc::new(UuidNonce),
        }
    }

    #[must_use]
    pub fn with_nonce_source(mut self, nonce: Arc<dyn NonceSource>) -> Self {
        self.nonce = nonce;
        self
    }

    /// Signed JWT for a request with `params` (empty for none).
    ///
    /// # Errors
    ///
    /// [`Error::Signing`] when the claims cannot be serialized or the key
    /// is rejected by the MAC.
    pub fn token<K, V>(&self, params: &[(K, V)]) -> Result<String>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let (query_hash, query_hash_alg) = if params.is_empty() {
            (None, None)
        } else {
            (Some(query_hash(params)), Some("SHA512"))
        };
        let claims = Claims {
            access_key: &self.credentials.access_key,
            nonce: self.nonce.nonce(),
            query_hash,
            query_hash_alg,
        };

        let header = encode_segment(&Header {
            alg: "HS256",
            typ: "JWT",
        })?;
        let payload = encode_segment(&claims)?;
        let signing_input = format!("{header}.{payload}");

        let mut mac = HmacSha256::new_from_slice(self.credentials.secret_key.as_bytes())
            .map_err(|e| Error::Signing(format!("HMAC error: {e}")))?;
        mac.update(signing_input.as_bytes());
        let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

        Ok(format!("{signing_input}.{signature}"))
    }

    /// `Authorization` header value: `Bearer <jwt>`.
    ///
    /// # Errors
    ///
    /// See [`token`](Self::token).
    pub fn bearer<K, V>(&self, params: &[(K, V)]) -> Result<String>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        Ok(format!("Bearer {}", self.token(params)?))
    }
}

fn encode_segment(value: &impl Serialize) -> Result<String> {
    let json = serde_json::to_vec(value).map_err(|e| Error::Signing(e.to_string()))?;
    Ok(URL_SAFE_NO_PAD.encode(json))
}
