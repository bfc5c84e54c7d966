//! OAuth tokens and their on-disk store.
//!
//! The layout matches what the Python `garth` library writes, so a session
//! saved by other Garmin tools can be reused: a directory holding
//! `oauth1_token.json` and `oauth2_token.json`, or a single file with
//! `base64(json([oauth1, oauth2]))`.

use std::fs;
use std::path::{Path, PathBuf};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::error::{ConnectError, ConnectResult};

const OAUTH1_FILE: &str = "oauth1_token.json";
const OAUTH2_FILE: &str = "oauth2_token.json";

/// Long-lived token obtained from an SSO ticket. Used only to mint OAuth2
/// tokens.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OAuth1Token {
    pub oauth_token: String,
    pub oauth_token_secret: String,
    #[serde(default)]
    pub mfa_token: Option<String>,
    #[serde(default)]
    pub mfa_expiration_timestamp: Option<String>,
    #[serde(default)]
    pub domain: Option<String>,
}

/// Short-lived bearer token for Connect API requests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OAuth2Token {
    #[serde(default)]
    pub scope: String,
    #[serde(default)]
    pub jti: String,
    #[serde(default)]
    pub token_type: String,
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: String,
    #[serde(default)]
    pub expires_in: i64,
    #[serde(default)]
    pub expires_at: i64,
    #[serde(default)]
    pub refresh_token_expires_in: i64,
    #[serde(default)]
    pub refresh_token_expires_at: i64,
}

impl OAuth2Token {
    /// Stamp absolute expiry times from the relative ones in an exchange
    /// response.
    pub fn stamped(mut self) -> Self {
        let now = Utc::now().timestamp();
        self.expires_at = now + self.expires_in;
        self.refresh_token_expires_at = now + self.refresh_token_expires_in;
        self
    }

    pub fn expired(&self) -> bool {
        self.expires_at <= Utc::now().timestamp()
    }
}

/// The pair of tokens making up a Garmin session.
#[derive(Debug, Clone, PartialEq)]
pub struct Tokens {
    pub oauth1: OAuth1Token,
    pub oauth2: OAuth2Token,
}

impl Tokens {
    /// `base64(json([oauth1, oauth2]))`.
    pub fn encode(&self) -> ConnectResult<String> {
        let json = serde_json::to_vec(&(&self.oauth1, &self.oauth2))?;
        Ok(STANDARD.encode(json))
    }

    pub fn decode(blob: &str) -> ConnectResult<Self> {
        let bytes = STANDARD
            .decode(blob.trim())
            .map_err(|e| ConnectError::token_store(format!("token blob is not base64: {e}")))?;
        let (oauth1, oauth2): (OAuth1Token, OAuth2Token) = serde_json::from_slice(&bytes)?;
        Ok(Self { oauth1, oauth2 })
    }
}

/// Where a session is persisted between runs.
#[derive(Debug, Clone)]
pub struct TokenStore {
    dir: PathBuf,
    base64_file: PathBuf,
}

impl TokenStore {
    pub fn new(dir: impl Into<PathBuf>, base64_file: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            base64_file: base64_file.into(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Load the session, trying the token directory first and then the
    /// base64 file.
    pub fn load(&self) -> ConnectResult<Tokens> {
        match self.load_dir() {
            Ok(tokens) => Ok(tokens),
            Err(dir_err) => {
                debug!("No usable tokens in {}: {}", self.dir.display(), dir_err);
                self.load_base64().map_err(|blob_err| {
                    ConnectError::token_store(format!(
                        "no stored session ({}: {dir_err}; {}: {blob_err})",
                        self.dir.display(),
                        self.base64_file.display()
                    ))
                })
            }
        }
    }

    pub fn load_dir(&self) -> ConnectResult<Tokens> {
        let oauth1 = fs::read(self.dir.join(OAUTH1_FILE))?;
        let oauth2 = fs::read(self.dir.join(OAUTH2_FILE))?;
        Ok(Tokens {
            oauth1: serde_json::from_slice(&oauth1)?,
            oauth2: serde_json::from_slice(&oauth2)?,
        })
    }

    pub fn load_base64(&self) -> ConnectResult<Tokens> {
        let blob = fs::read_to_string(&self.base64_file)?;
        Tokens::decode(&blob)
    }

    /// Write the session to both locations.
    pub fn save(&self, tokens: &Tokens) -> ConnectResult<()> {
        fs::create_dir_all(&self.dir)?;
        fs::write(
            self.dir.join(OAUTH1_FILE),
            serde_json::to_vec_pretty(&tokens.oauth1)?,
        )?;
        fs::write(
            self.dir.join(OAUTH2_FILE),
            serde_json::to_vec_pretty(&tokens.oauth2)?,
        )?;

        if let Some(parent) = self.base64_file.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.base64_file, tokens.encode()?)?;
        Ok(())
    }
}

#[cfg(test)]
pub(crate) fn sample_tokens(expires_at: i64) -> Tokens {
    Tokens {
        oauth1: OAuth1Token {
            oauth_token: "oauth1-token".into(),
            oauth_token_secret: "oauth1-secret".into(),
            mfa_token: None,
            mfa_expiration_timestamp: None,
            domain: Some("garmin.com".into()),
        },
        oauth2: OAuth2Token {
            scope: "CONNECT_READ CONNECT_WRITE".into(),
            jti: "jti".into(),
            token_type: "Bearer".into(),
            access_token: "access-1".into(),
            refresh_token: "refresh-1".into(),
            expires_in: 3600,
            expires_at,
            refresh_token_expires_in: 7200,
            refresh_token_expires_at: expires_at + 3600,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store(root: &TempDir) -> TokenStore {
        TokenStore::new(root.path().join("tokens"), root.path().join("tokens_base64"))
    }

    #[test]
    fn test_save_and_load_dir() {
        let root = TempDir::new().unwrap();
        let store = store(&root);
        let tokens = sample_tokens(Utc::now().timestamp() + 100);

        store.save(&tokens).unwrap();
        assert_eq!(store.load_dir().unwrap(), tokens);
        assert_eq!(store.load_base64().unwrap(), tokens);
    }

    #[test]
    fn test_falls_back_to_base64() {
        let root = TempDir::new().unwrap();
        let store = store(&root);
        let tokens = sample_tokens(0);
        fs::write(root.path().join("tokens_base64"), tokens.encode().unwrap()).unwrap();

        assert_eq!(store.load().unwrap(), tokens);
    }

    #[test]
    fn test_nothing_stored() {
        let root = TempDir::new().unwrap();
        let err = store(&root).load().unwrap_err();
        assert!(matches!(err, ConnectError::TokenStore(_)));
        assert!(err.to_string().contains("no stored session"));
    }

    #[test]
    fn test_reads_garth_files() {
        let root = TempDir::new().unwrap();
        let dir = root.path().join("tokens");
        fs::create_dir_all(&dir).unwrap();
        fs::write(
            dir.join(OAUTH1_FILE),
            r#"{"oauth_token": "t", "oauth_token_secret": "s", "mfa_token": null,
                "mfa_expiration_timestamp": null, "domain": "garmin.com"}"#,
        )
        .unwrap();
        fs::write(
            dir.join(OAUTH2_FILE),
            r#"{"scope": "CONNECT_READ", "jti": "j", "token_type": "Bearer",
                "access_token": "a", "refresh_token": "r", "expires_in": 3600,
                "expires_at": 1700000000, "refresh_token_expires_in": 7200,
                "refresh_token_expires_at": 1700003600}"#,
        )
        .unwrap();

        let tokens = store(&root).load().unwrap();
        assert_eq!(tokens.oauth1.oauth_token, "t");
        assert_eq!(tokens.oauth2.access_token, "a");
        assert!(tokens.oauth2.expired());
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(Tokens::decode("!!not base64!!").is_err());
        assert!(Tokens::decode(&STANDARD.encode("[1, 2]")).is_err());
    }

    #[test]
    fn test_stamped_expiry() {
        let token = sample_tokens(0).oauth2.stamped();
        assert!(!token.expired());
        assert!(token.refresh_token_expires_at > token.expires_at);
    }
}
