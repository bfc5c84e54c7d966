//! Establishing a Garmin Connect session.
//!
//! A stored session is tried first. Credential login through SSO only runs
//! when no stored session works, and a new session is saved for next time.

use std::sync::Arc;
use std::time::Duration;

use reqwest::blocking::Client;
use tracing::{info, warn};

use super::api::ConnectApi;
use super::client::{Endpoints, GarminConnect};
use super::error::{ConnectError, ConnectResult};
use super::oauth::{self, Consumer};
use super::sso::{self, Login};
use super::tokens::{TokenStore, Tokens};
use crate::core::config::{Config, CredentialsConfig, GarminConfig};

/// Log in using the configured session store and credentials.
pub fn connect(config: &Config) -> ConnectResult<Arc<dyn ConnectApi>> {
    let http = Client::builder()
        .cookie_store(true)
        .timeout(Duration::from_secs(config.garmin.http_timeout_secs))
        .build()?;
    let endpoints = Endpoints::for_domain(&config.garmin.domain);
    let mfa_code = std::env::var("GARMIN_MFA_CODE").ok();

    let client = establish(
        http,
        endpoints,
        &config.garmin,
        &config.credentials,
        mfa_code.as_deref(),
    )?;
    Ok(Arc::new(client))
}

fn establish(
    http: Client,
    endpoints: Endpoints,
    garmin: &GarminConfig,
    credentials: &CredentialsConfig,
    mfa_code: Option<&str>,
) -> ConnectResult<GarminConnect> {
    let store = TokenStore::new(&garmin.token_dir, &garmin.token_base64);
    let consumer = Consumer::default();

    match store.load() {
        Ok(tokens) => {
            info!("Restoring Garmin session from {}", store.dir().display());
            let client = GarminConnect::new(
                http.clone(),
                endpoints.clone(),
                consumer.clone(),
                tokens,
                Some(store.clone()),
            );
            let verified = client.load_profile().map(|_| ());
            match verified {
                Ok(_) => {
                    info!("Garmin session restored");
                    return Ok(client);
                }
                Err(e) => warn!("Stored Garmin session is not usable: {}", e),
            }
        }
        Err(e) => info!("No stored Garmin session: {}", e),
    }

    let (Some(email), Some(password)) = (&credentials.email, &credentials.password) else {
        return Err(ConnectError::authentication(format!(
            "no usable session in {} and GARMIN_EMAIL/GARMIN_PASSWORD are not set",
            store.dir().display()
        )));
    };

    info!("Logging in to Garmin Connect as {}", email);
    let login = Login {
        email,
        password,
        mfa_code,
    };
    let ticket = sso::login(&http, &endpoints, &login)?;
    let oauth1 = oauth::preauthorized(&http, &endpoints, &consumer, &ticket)?;
    let oauth2 = oauth::exchange(&http, &endpoints, &consumer, &oauth1)?;
    let tokens = Tokens { oauth1, oauth2 };

    match store.save(&tokens) {
        Ok(()) => info!("Saved Garmin session to {}", store.dir().display()),
        Err(e) => warn!("Could not save Garmin session: {}", e),
    }

    let client = GarminConnect::new(http, endpoints, consumer, tokens, Some(store));
    client.load_profile()?;
    info!("Garmin login complete");
    Ok(client)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::garmin::tokens::sample_tokens;
    use chrono::Utc;
    use httpmock::prelude::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn garmin_config(root: &TempDir) -> GarminConfig {
        GarminConfig {
            token_dir: root.path().join("tokens"),
            token_base64: root.path().join("tokens_base64"),
            ..GarminConfig::default()
        }
    }

    fn http() -> Client {
        Client::builder().cookie_store(true).build().unwrap()
    }

    fn mock_profile<'a>(server: &'a MockServer, token: &str) -> httpmock::Mock<'a> {
        let bearer = format!("Bearer {token}");
        server.mock(move |when, then| {
            when.method(GET)
                .path("/userprofile-service/socialProfile")
                .header("authorization", bearer.as_str());
            then.status(200).json_body(json!({"displayName": "runner42"}));
        })
    }

    #[test]
    fn test_restores_stored_session() {
        let server = MockServer::start();
        let root = TempDir::new().unwrap();
        let garmin = garmin_config(&root);
        TokenStore::new(&garmin.token_dir, &garmin.token_base64)
            .save(&sample_tokens(Utc::now().timestamp() + 3600))
            .unwrap();
        let profile = mock_profile(&server, "access-1");

        let client = establish(
            http(),
            Endpoints::local(&server.base_url()),
            &garmin,
            &CredentialsConfig::default(),
            None,
        )
        .unwrap();
        assert_eq!(client.tokens().oauth2.access_token, "access-1");
        profile.assert();
    }

    #[test]
    fn test_no_session_and_no_credentials() {
        let server = MockServer::start();
        let root = TempDir::new().unwrap();

        let err = establish(
            http(),
            Endpoints::local(&server.base_url()),
            &garmin_config(&root),
            &CredentialsConfig::default(),
            None,
        )
        .err()
        .unwrap();
        assert!(matches!(err, ConnectError::Authentication(_)));
        assert!(err.to_string().contains("GARMIN_EMAIL"));
    }

    #[test]
    fn test_credential_login_saves_tokens() {
        let server = MockServer::start();
        let root = TempDir::new().unwrap();
        let garmin = garmin_config(&root);

        server.mock(|when, then| {
            when.method(GET).path("/sso/embed");
            then.status(200).body("<html></html>");
        });
        server.mock(|when, then| {
            when.method(GET).path("/sso/signin");
            then.status(200).body(
                r#"<title>Sign In</title><input name="_csrf" value="c1" />"#,
            );
        });
        server.mock(|when, then| {
            when.method(POST).path("/sso/signin");
            then.status(200).body(
                r#"<title>Success</title><script>u = "x/embed?ticket=ST-9";</script>"#,
            );
        });
        server.mock(|when, then| {
            when.method(GET)
                .path("/oauth-service/oauth/preauthorized")
                .query_param("ticket", "ST-9");
            then.status(200).body("oauth_token=t&oauth_token_secret=s");
        });
        server.mock(|when, then| {
            when.method(POST).path("/oauth-service/oauth/exchange/user/2.0");
            then.status(200)
                .json_body(json!({"access_token": "fresh", "expires_in": 3600}));
        });
        let profile = mock_profile(&server, "fresh");

        let credentials = CredentialsConfig {
            email: Some("runner@example.com".into()),
            password: Some("hunter2".into()),
        };
        establish(
            http(),
            Endpoints::local(&server.base_url()),
            &garmin,
            &credentials,
            None,
        )
        .unwrap();

        profile.assert();
        let saved = TokenStore::new(&garmin.token_dir, &garmin.token_base64)
            .load()
            .unwrap();
        assert_eq!(saved.oauth2.access_token, "fresh");
        assert_eq!(saved.oauth1.oauth_token, "t");
    }
}
