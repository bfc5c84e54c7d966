//! Credential login through Garmin SSO.
//!
//! The embedded sign-in widget is driven like a browser: load the widget to
//! get cookies, fetch the sign-in form for its CSRF token, post the
//! credentials, answer an MFA challenge if one appears, and read the
//! service ticket out of the success page.

use std::sync::LazyLock;

use regex::Regex;
use reqwest::blocking::Client;
use tracing::{info, warn};

use super::client::Endpoints;
use super::error::{ConnectError, ConnectResult};

const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (iPhone; CPU iPhone OS 16_5 like Mac OS X) \
     AppleWebKit/605.1.15 (KHTML, like Gecko) Mobile/15E148";

static CSRF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"name="_csrf"\s+value="(.+?)""#).expect("csrf pattern is valid"));
static TITLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<title>(.+?)</title>").expect("title pattern is valid"));
static TICKET: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"embed\?ticket=([^"]+)""#).expect("ticket pattern is valid"));

/// Account credentials plus the one-time MFA code, if the user supplied one.
pub struct Login<'a> {
    pub email: &'a str,
    pub password: &'a str,
    pub mfa_code: Option<&'a str>,
}

/// Sign in and return the SSO service ticket.
pub fn login(http: &Client, endpoints: &Endpoints, login: &Login<'_>) -> ConnectResult<String> {
    let sso = endpoints.sso.as_str();
    let embed = endpoints.sso_embed();

    let embed_params = [
        ("id", "gauth-widget"),
        ("embedWidget", "true"),
        ("gauthHost", sso),
    ];
    let signin_params = [
        ("id", "gauth-widget"),
        ("embedWidget", "true"),
        ("gauthHost", embed.as_str()),
        ("service", embed.as_str()),
        ("source", embed.as_str()),
        ("redirectAfterAccountLoginUrl", embed.as_str()),
        ("redirectAfterAccountCreationUrl", embed.as_str()),
    ];

    info!("Signing in to Garmin SSO");
    page(
        http.get(&embed)
            .query(&embed_params)
            .header(reqwest::header::USER_AGENT, BROWSER_USER_AGENT),
    )?;

    let signin_url = format!("{sso}/signin");
    let form_page = page(
        http.get(&signin_url)
            .query(&signin_params)
            .header(reqwest::header::USER_AGENT, BROWSER_USER_AGENT)
            .header(reqwest::header::REFERER, embed.as_str()),
    )?;
    let csrf = capture(&CSRF, &form_page, "CSRF token")?;

    let mut html = page(
        http.post(&signin_url)
            .query(&signin_params)
            .header(reqwest::header::USER_AGENT, BROWSER_USER_AGENT)
            .header(reqwest::header::REFERER, signin_url.as_str())
            .form(&[
                ("username", login.email),
                ("password", login.password),
                ("embed", "true"),
                ("_csrf", csrf.as_str()),
            ]),
    )?;

    if title(&html).contains("MFA") {
        let Some(code) = login.mfa_code.map(str::trim).filter(|c| !c.is_empty()) else {
            warn!("Garmin requested an MFA code and GARMIN_MFA_CODE is not set");
            return Err(ConnectError::MfaRequired);
        };

        info!("Submitting MFA code");
        let csrf = capture(&CSRF, &html, "MFA CSRF token")?;
        html = page(
            http.post(format!("{sso}/verifyMFA/loginEnterMfaCode"))
                .query(&signin_params)
                .header(reqwest::header::USER_AGENT, BROWSER_USER_AGENT)
                .header(reqwest::header::REFERER, signin_url.as_str())
                .form(&[
                    ("mfa-code", code),
                    ("embed", "true"),
                    ("_csrf", csrf.as_str()),
                    ("fromPage", "setupEnterMfaCode"),
                ]),
        )?;
    }

    let title = title(&html);
    if title != "Success" {
        return Err(ConnectError::authentication(format!(
            "Garmin SSO sign-in was not accepted (page title '{title}')"
        )));
    }

    capture(&TICKET, &html, "service ticket")
}

fn page(request: reqwest::blocking::RequestBuilder) -> ConnectResult<String> {
    let response = request.send()?;
    let status = response.status();
    if status.as_u16() == 429 {
        return Err(ConnectError::authentication(
            "Too many sign-in attempts. Wait before trying again.",
        ));
    }
    if !status.is_success() {
        return Err(ConnectError::authentication(format!(
            "Garmin SSO returned HTTP {}",
            status.as_u16()
        )));
    }
    Ok(response.text()?)
}

fn title(html: &str) -> String {
    TITLE
        .captures(html)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
        .unwrap_or_default()
}

fn capture(re: &Regex, html: &str, what: &str) -> ConnectResult<String> {
    re.captures(html)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
        .ok_or_else(|| ConnectError::authentication(format!("Garmin SSO page had no {what}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    const FORM: &str = r#"<html><title>GARMIN Authentication Application</title>
        <input type="hidden" name="_csrf" value="csrf-1" /></html>"#;
    const MFA: &str = r#"<html><title>Enter MFA code for login</title>
        <input type="hidden" name="_csrf" value="csrf-2" /></html>"#;
    const SUCCESS: &str = r#"<html><title>Success</title>
        <script>var url = "https://sso.garmin.com/sso/embed?ticket=ST-0042-abc";</script></html>"#;

    fn client() -> Client {
        Client::builder().cookie_store(true).build().unwrap()
    }

    fn creds(mfa_code: Option<&str>) -> Login<'_> {
        Login {
            email: "runner@example.com",
            password: "hunter2",
            mfa_code,
        }
    }

    fn mock_form(server: &MockServer) {
        server.mock(|when, then| {
            when.method(GET).path("/sso/embed");
            then.status(200).body("<html></html>");
        });
        server.mock(|when, then| {
            when.method(GET).path("/sso/signin");
            then.status(200).body(FORM);
        });
    }

    #[test]
    fn test_login_returns_ticket() {
        let server = MockServer::start();
        mock_form(&server);
        let post = server.mock(|when, then| {
            when.method(POST)
                .path("/sso/signin")
                .body_contains("username=runner%40example.com")
                .body_contains("_csrf=csrf-1");
            then.status(200).body(SUCCESS);
        });

        let endpoints = Endpoints::local(&server.base_url());
        let ticket = login(&client(), &endpoints, &creds(None)).unwrap();
        assert_eq!(ticket, "ST-0042-abc");
        post.assert();
    }

    #[test]
    fn test_mfa_without_code() {
        let server = MockServer::start();
        mock_form(&server);
        server.mock(|when, then| {
            when.method(POST).path("/sso/signin");
            then.status(200).body(MFA);
        });

        let endpoints = Endpoints::local(&server.base_url());
        let err = login(&client(), &endpoints, &creds(None)).unwrap_err();
        assert!(matches!(err, ConnectError::MfaRequired));
    }

    #[test]
    fn test_mfa_with_code() {
        let server = MockServer::start();
        mock_form(&server);
        server.mock(|when, then| {
            when.method(POST).path("/sso/signin");
            then.status(200).body(MFA);
        });
        let verify = server.mock(|when, then| {
            when.method(POST)
                .path("/sso/verifyMFA/loginEnterMfaCode")
                .body_contains("mfa-code=123456")
                .body_contains("_csrf=csrf-2");
            then.status(200).body(SUCCESS);
        });

        let endpoints = Endpoints::local(&server.base_url());
        let ticket = login(&client(), &endpoints, &creds(Some(" 123456 "))).unwrap();
        assert_eq!(ticket, "ST-0042-abc");
        verify.assert();
    }

    #[test]
    fn test_wrong_password() {
        let server = MockServer::start();
        mock_form(&server);
        server.mock(|when, then| {
            when.method(POST).path("/sso/signin");
            then.status(200).body(FORM);
        });

        let endpoints = Endpoints::local(&server.base_url());
        let err = login(&client(), &endpoints, &creds(None)).unwrap_err();
        assert!(matches!(err, ConnectError::Authentication(_)));
        assert!(err.to_string().contains("GARMIN Authentication Application"));
    }
}
