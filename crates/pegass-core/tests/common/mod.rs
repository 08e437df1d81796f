//! Shared stubs for the HTTP-level tests.
//!
//! One mockito server plays both the identity provider and the target
//! application.

#![allow(dead_code)]

use mockito::{Matcher, Mock, ServerGuard};
use pegass_core::storage::Config;
use serde_json::{json, Value};

pub const USERNAME: &str = "jdoe";
pub const PASSWORD: &str = "correct horse";
pub const TOTP_SECRET: &str = "GEZDGNBVGY3TQOJQGEZDGNBVGY3TQOJQ";
pub const STATE_TOKEN: &str = "state-123";
pub const SESSION_TOKEN: &str = "session-456";
pub const SESSION_COOKIE: &str = "_shibsession_abc";
pub const SESSION_VALUE: &str = "opaque-cookie";

pub fn config_for(server: &ServerGuard) -> Config {
    let mut config = Config::default();
    config.endpoints.idp_base_url = server.url();
    config.endpoints.app_base_url = server.url();
    config.credentials.username = USERNAME.into();
    config.credentials.password = PASSWORD.into();
    config.credentials.totp_secret = TOTP_SECRET.into();
    config.http.timeout_secs = 5;
    config
}

pub fn json_mock(server: &mut ServerGuard, method: &str, path: &str, body: Value) -> mockito::Mock {
    server
        .mock(method, path)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(body.to_string())
}

/// Stubs of the five handshake steps.
pub struct LoginStubs {
    pub password: Mock,
    pub verify: Mock,
    pub redeem: Mock,
    pub consumer: Mock,
}

impl LoginStubs {
    pub async fn assert(&self) {
        self.password.assert_async().await;
        self.verify.assert_async().await;
        self.redeem.assert_async().await;
        self.consumer.assert_async().await;
    }
}

/// What each handshake step answers.
pub struct LoginScript {
    pub password_status: &'static str,
    pub factors: Value,
    pub redeem_html: String,
    pub cookies: Vec<String>,
    pub expected_runs: usize,
}

impl Default for LoginScript {
    fn default() -> Self {
        Self {
            password_status: "MFA_REQUIRED",
            factors: json!([
                { "id": "push-1", "factorType": "push", "provider": "OKTA", "vendorName": "OKTA" },
                { "id": "totp-1", "factorType": "token:software:totp", "provider": "GOOGLE", "vendorName": "GOOGLE" }
            ]),
            redeem_html: redeem_page("PHNhbWxwOlJlc3BvbnNlLz4="),
            cookies: vec![format!("{SESSION_COOKIE}={SESSION_VALUE}; Path=/; HttpOnly")],
            expected_runs: 1,
        }
    }
}

pub fn redeem_page(assertion: &str) -> String {
    format!(
        r#"<html><body onload="document.forms[0].submit()">
             <form method="post" action="/Shibboleth.sso/SAML2/POST">
               <input type="hidden" name="SAMLResponse" value="{assertion}"/>
               <input type="hidden" name="RelayState" value="ss:mem:1"/>
             </form>
           </body></html>"#
    )
}

pub async fn mock_login(server: &mut ServerGuard, script: LoginScript) -> LoginStubs {
    let runs = script.expected_runs;
    let config = Config::default();

    let password = json_mock(
        server,
        "POST",
        "/api/v1/authn",
        json!({
            "stateToken": STATE_TOKEN,
            "expiresAt": "2030-01-01T00:00:00.000Z",
            "status": script.password_status,
            "_embedded": { "factors": script.factors },
        }),
    )
    .match_body(Matcher::PartialJson(json!({
        "username": USERNAME,
        "password": PASSWORD,
    })))
    .expect(runs)
    .create_async()
    .await;

    let verify = json_mock(
        server,
        "POST",
        "/api/v1/authn/factors/totp-1/verify",
        json!({ "status": "SUCCESS", "sessionToken": SESSION_TOKEN }),
    )
    .match_query(Matcher::UrlEncoded("rememberDevice".into(), "false".into()))
    .match_body(Matcher::PartialJson(json!({ "stateToken": STATE_TOKEN })))
    .expect(runs)
    .create_async()
    .await;

    let redeem = server
        .mock("GET", config.endpoints.sso_redeem_path.as_str())
        .match_query(Matcher::UrlEncoded("sessionToken".into(), SESSION_TOKEN.into()))
        .with_status(200)
        .with_header("content-type", "text/html")
        .with_body(script.redeem_html)
        .expect(runs)
        .create_async()
        .await;

    let mut consumer = server
        .mock("POST", "/Shibboleth.sso/SAML2/POST")
        .match_body(Matcher::Regex("SAMLResponse=".into()))
        .with_status(200);
    for cookie in &script.cookies {
        consumer = consumer.with_header("set-cookie", cookie);
    }
    let consumer = consumer.expect(runs).create_async().await;

    LoginStubs {
        password,
        verify,
        redeem,
        consumer,
    }
}
