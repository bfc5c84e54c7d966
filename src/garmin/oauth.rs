//! OAuth1 request signing and the OAuth1 to OAuth2 token exchange.
//!
//! Garmin's mobile app flow: an SSO ticket is traded for an OAuth1 token
//! (`preauthorized`), and the OAuth1 token is traded for a bearer OAuth2
//! token (`exchange`) whenever the bearer token expires.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::Utc;
use rand::Rng;
use rand::distributions::Alphanumeric;
use reqwest::blocking::Client;
use ring::hmac;
use tracing::{debug, info};
use urlencoding::encode;

use super::client::Endpoints;
use super::error::{ConnectError, ConnectResult};
use super::tokens::{OAuth1Token, OAuth2Token};

/// User agent the OAuth service expects from the Connect mobile app.
pub const MOBILE_USER_AGENT: &str = "com.garmin.android.apps.connectmobile";

/// Application credentials of the Connect mobile app.
#[derive(Debug, Clone)]
pub struct Consumer {
    pub key: String,
    pub secret: String,
}

impl Default for Consumer {
    fn default() -> Self {
        Self {
            key: "fc3e99d2-118c-44b8-8ae3-03370dde24c0".to_string(),
            secret: "E08WAR897WEy2knn7aFBrvegVAf0AFdWBBF".to_string(),
        }
    }
}

/// Inputs that vary per request. Split out so signatures are reproducible.
#[derive(Debug, Clone)]
pub struct Nonce {
    pub value: String,
    pub timestamp: i64,
}

impl Nonce {
    pub fn generate() -> Self {
        let value = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(32)
            .map(char::from)
            .collect();
        Self {
            value,
            timestamp: Utc::now().timestamp(),
        }
    }
}

/// HMAC-SHA1 signature of a request, base64 encoded.
///
/// `params` holds the query string and form body parameters. The `oauth_*`
/// protocol parameters are added here.
pub fn signature(
    method: &str,
    base_url: &str,
    params: &[(String, String)],
    consumer: &Consumer,
    token: Option<(&str, &str)>,
    nonce: &Nonce,
) -> String {
    let mut all = protocol_params(consumer, token.map(|(t, _)| t), nonce);
    all.extend(params.iter().cloned());

    let mut encoded: Vec<(String, String)> = all
        .iter()
        .map(|(k, v)| (encode(k).into_owned(), encode(v).into_owned()))
        .collect();
    encoded.sort();

    let param_string = encoded
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");

    let base_string = format!(
        "{}&{}&{}",
        method.to_uppercase(),
        encode(base_url),
        encode(&param_string)
    );
    let signing_key = format!(
        "{}&{}",
        encode(&consumer.secret),
        encode(token.map(|(_, s)| s).unwrap_or(""))
    );

    let key = hmac::Key::new(hmac::HMAC_SHA1_FOR_LEGACY_USE_ONLY, signing_key.as_bytes());
    STANDARD.encode(hmac::sign(&key, base_string.as_bytes()).as_ref())
}

/// `Authorization` header value for a signed request.
pub fn authorization_header(
    method: &str,
    base_url: &str,
    params: &[(String, String)],
    consumer: &Consumer,
    token: Option<(&str, &str)>,
) -> String {
    let nonce = Nonce::generate();
    let sig = signature(method, base_url, params, consumer, token, &nonce);

    let mut header = protocol_params(consumer, token.map(|(t, _)| t), &nonce);
    header.push(("oauth_signature".to_string(), sig));
    let fields = header
        .iter()
        .map(|(k, v)| format!("{}=\"{}\"", encode(k), encode(v)))
        .collect::<Vec<_>>()
        .join(", ");
    format!("OAuth {fields}")
}

fn protocol_params(
    consumer: &Consumer,
    token: Option<&str>,
    nonce: &Nonce,
) -> Vec<(String, String)> {
    let mut params = vec![
        ("oauth_consumer_key".to_string(), consumer.key.clone()),
        ("oauth_nonce".to_string(), nonce.value.clone()),
        ("oauth_signature_method".to_string(), "HMAC-SHA1".to_string()),
        ("oauth_timestamp".to_string(), nonce.timestamp.to_string()),
        ("oauth_version".to_string(), "1.0".to_string()),
    ];
    if let Some(token) = token {
        params.push(("oauth_token".to_string(), token.to_string()));
    }
    params
}

/// Trade an SSO ticket for an OAuth1 token.
pub fn preauthorized(
    http: &Client,
    endpoints: &Endpoints,
    consumer: &Consumer,
    ticket: &str,
) -> ConnectResult<OAuth1Token> {
    let url = format!("{}/oauth-service/oauth/preauthorized", endpoints.connect_api);
    let query = vec![
        ("ticket".to_string(), ticket.to_string()),
        ("login-url".to_string(), endpoints.sso_embed()),
        ("accepts-mfa-tokens".to_string(), "true".to_string()),
    ];

    debug!("Requesting OAuth1 token");
    let response = http
        .get(&url)
        .query(&query)
        .header(reqwest::header::USER_AGENT, MOBILE_USER_AGENT)
        .header(
            reqwest::header::AUTHORIZATION,
            authorization_header("GET", &url, &query, consumer, None),
        )
        .send()?;

    let status = response.status();
    let body = response.text()?;
    if !status.is_success() {
        return Err(ConnectError::authentication(format!(
            "OAuth1 token request returned HTTP {}",
            status.as_u16()
        )));
    }

    let mut token: OAuth1Token = serde_urlencoded::from_str(&body)
        .map_err(|e| ConnectError::invalid_response(format!("OAuth1 token response: {e}")))?;
    token.domain = Some(endpoints.domain.clone());
    Ok(token)
}

/// Trade an OAuth1 token for a fresh OAuth2 bearer token.
pub fn exchange(
    http: &Client,
    endpoints: &Endpoints,
    consumer: &Consumer,
    oauth1: &OAuth1Token,
) -> ConnectResult<OAuth2Token> {
    let url = format!("{}/oauth-service/oauth/exchange/user/2.0", endpoints.connect_api);
    let form: Vec<(String, String)> = oauth1
        .mfa_token
        .iter()
        .map(|mfa| ("mfa_token".to_string(), mfa.clone()))
        .collect();

    let token = (oauth1.oauth_token.as_str(), oauth1.oauth_token_secret.as_str());
    let response = http
        .post(&url)
        .header(reqwest::header::USER_AGENT, MOBILE_USER_AGENT)
        .header(
            reqwest::header::AUTHORIZATION,
            authorization_header("POST", &url, &form, consumer, Some(token)),
        )
        .form(&form)
        .send()?;

    let status = response.status();
    if !status.is_success() {
        return Err(ConnectError::authentication(format!(
            "OAuth2 token exchange returned HTTP {}",
            status.as_u16()
        )));
    }

    let token: OAuth2Token = response.json()?;
    info!("Obtained OAuth2 token, valid for {}s", token.expires_in);
    Ok(token.stamped())
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    fn pair(k: &str, v: &str) -> (String, String) {
        (k.to_string(), v.to_string())
    }

    #[test]
    fn test_signature_matches_reference_vector() {
        // Widely published HMAC-SHA1 example request.
        let consumer = Consumer {
            key: "xvz1evFS4wEEPTGEFPHBog".into(),
            secret: "kAcSOqF21Fu85e7zjz7ZN2U4ZRhfV3WpwPAoE3Z7kBw".into(),
        };
        let nonce = Nonce {
            value: "kYjzVBB8Y0ZFabxSWbWovY3uYSQ2pTgmZeNu2VS4cg".into(),
            timestamp: 1318622958,
        };
        let params = vec![
            pair("include_entities", "true"),
            pair("status", "Hello Ladies + Gentlemen, a signed OAuth request!"),
        ];

        let sig = signature(
            "POST",
            "https://api.twitter.com/1/statuses/update.json",
            &params,
            &consumer,
            Some((
                "370773112-GmHxMAgYyLbNEtIKZeRNFsMKPR9EyMZeS9weJAEb",
                "LswwdoUaIvS8ltyTt5jkRh4J50vUPVVHtR2YPi5kE",
            )),
            &nonce,
        );
        assert_eq!(sig, "tnnArxj06cWHq44gCs1OSKk/jLY=");
    }

    #[test]
    fn test_authorization_header_shape() {
        let header = authorization_header(
            "GET",
            "https://connectapi.garmin.com/oauth-service/oauth/preauthorized",
            &[pair("ticket", "ST-1")],
            &Consumer::default(),
            None,
        );
        assert!(header.starts_with("OAuth oauth_consumer_key=\"fc3e99d2"));
        assert!(header.contains("oauth_signature_method=\"HMAC-SHA1\""));
        assert!(header.contains("oauth_signature=\""));
        assert!(!header.contains("oauth_token="));
    }

    #[test]
    fn test_preauthorized_and_exchange() {
        let server = MockServer::start();
        let endpoints = Endpoints::local(&server.base_url());
        let http = Client::new();

        let pre = server.mock(|when, then| {
            when.method(GET)
                .path("/oauth-service/oauth/preauthorized")
                .query_param("ticket", "ST-123")
                .header_exists("authorization");
            then.status(200)
                .body("oauth_token=tok&oauth_token_secret=sec&mfa_token=mfa");
        });
        let exch = server.mock(|when, then| {
            when.method(POST)
                .path("/oauth-service/oauth/exchange/user/2.0")
                .body_contains("mfa_token=mfa");
            then.status(200).json_body(serde_json::json!({
                "scope": "CONNECT_READ",
                "jti": "j",
                "token_type": "Bearer",
                "access_token": "bearer",
                "refresh_token": "r",
                "expires_in": 3600,
                "refresh_token_expires_in": 7200
            }));
        });

        let consumer = Consumer::default();
        let oauth1 = preauthorized(&http, &endpoints, &consumer, "ST-123").unwrap();
        assert_eq!(oauth1.oauth_token, "tok");
        assert_eq!(oauth1.mfa_token.as_deref(), Some("mfa"));

        let oauth2 = exchange(&http, &endpoints, &consumer, &oauth1).unwrap();
        assert_eq!(oauth2.access_token, "bearer");
        assert!(!oauth2.expired());

        pre.assert();
        exch.assert();
    }

    #[test]
    fn test_exchange_failure_is_authentication() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/oauth-service/oauth/exchange/user/2.0");
            then.status(401);
        });

        let oauth1 = OAuth1Token {
            oauth_token: "t".into(),
            oauth_token_secret: "s".into(),
            mfa_token: None,
            mfa_expiration_timestamp: None,
            domain: None,
        };
        let err = exchange(
            &Client::new(),
            &Endpoints::local(&server.base_url()),
            &Consumer::default(),
            &oauth1,
        )
        .unwrap_err();
        assert!(matches!(err, ConnectError::Authentication(_)));
    }
}
