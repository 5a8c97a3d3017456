//! OAuth2 installed-application flow for the mail provider, with a local token cache.

use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{DateTime, Duration, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tokio::{
    io::{AsyncBufReadExt, AsyncWriteExt, BufReader},
    net::TcpListener,
};
use url::Url;
use uuid::Uuid;

use crate::config::GmailConfig;

const DEFAULT_AUTH_URI: &str = "https://accounts.google.com/o/oauth2/auth";
const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const EXPIRY_SKEW_SECS: i64 = 60;

#[derive(Debug, Deserialize)]
struct ClientSecrets {
    installed: Option<ClientInfo>,
    web: Option<ClientInfo>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClientInfo {
    pub client_id: String,
    pub client_secret: String,
    #[serde(default = "default_auth_uri")]
    pub auth_uri: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_auth_uri() -> String {
    DEFAULT_AUTH_URI.to_string()
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CachedToken {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    pub expires_at: DateTime<Utc>,
    #[serde(default)]
    pub scopes: Vec<String>,
    #[serde(default = "default_token_type")]
    pub token_type: String,
}

fn default_token_type() -> String {
    "Bearer".to_string()
}

impl CachedToken {
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at - Duration::seconds(EXPIRY_SKEW_SECS) > now
    }

    pub fn covers(&self, scopes: &[String]) -> bool {
        scopes.iter().all(|scope| self.scopes.contains(scope))
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    scope: Option<String>,
    #[serde(default)]
    token_type: Option<String>,
}

impl TokenResponse {
    fn into_cached(self, previous_refresh: Option<String>, requested: &[String]) -> CachedToken {
        let scopes = match self.scope {
            Some(scope) => scope.split_whitespace().map(str::to_string).collect(),
            None => requested.to_vec(),
        };
        CachedToken {
            access_token: self.access_token,
            refresh_token: self.refresh_token.or(previous_refresh),
            expires_at: Utc::now() + Duration::seconds(self.expires_in),
            scopes,
            token_type: self.token_type.unwrap_or_else(default_token_type),
        }
    }
}

pub struct GmailAuthenticator {
    http: Client,
    config: GmailConfig,
}

impl GmailAuthenticator {
    pub fn new(http: Client, config: GmailConfig) -> Self {
        Self { http, config }
    }

    /// Returns a usable access token: from the cache, by refreshing it, or by
    /// running the interactive consent flow. The cache is rewritten whenever a
    /// new token is obtained.
    pub async fn access_token(&self) -> Result<String> {
        let cached = load_cache(&self.config.token_path).await?;
        let scopes = &self.config.scopes;

        if let Some(token) = &cached {
            if token.is_valid_at(Utc::now()) && token.covers(scopes) {
                tracing::debug!(target: "mail", "using cached mail token");
                return Ok(token.access_token.clone());
            }
        }

        let client = load_client_secrets(&self.config.credentials_path).await?;
        let token = match cached {
            Some(CachedToken {
                refresh_token: Some(refresh),
                scopes: cached_scopes,
                ..
            }) if scopes.iter().all(|s| cached_scopes.contains(s)) => {
                tracing::info!(target: "mail", "mail token expired, refreshing");
                self.refresh(&client, refresh).await?
            }
            _ => self.consent_flow(&client).await?,
        };

        save_cache(&self.config.token_path, &token).await?;
        Ok(token.access_token)
    }

    async fn refresh(&self, client: &ClientInfo, refresh_token: String) -> Result<CachedToken> {
        let response = self
            .http
            .post(&client.token_uri)
            .form(&[
                ("client_id", client.client_id.as_str()),
                ("client_secret", client.client_secret.as_str()),
                ("refresh_token", refresh_token.as_str()),
                ("grant_type", "refresh_token"),
            ])
            .send()
            .await?
            .error_for_status()
            .context("token refresh was rejected")?;
        let token: TokenResponse = response.json().await?;
        Ok(token.into_cached(Some(refresh_token), &self.config.scopes))
    }

    async fn consent_flow(&self, client: &ClientInfo) -> Result<CachedToken> {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .context("failed to bind local OAuth redirect listener")?;
        let port = listener.local_addr()?.port();
        let redirect_uri = format!("http://127.0.0.1:{port}/");
        let state = Uuid::new_v4().simple().to_string();
        let pkce = Pkce::generate();
        let consent = consent_url(client, &redirect_uri, &self.config.scopes, &state, &pkce)?;

        println!("Please visit this URL to authorize mail access:\n\n{consent}\n");
        tracing::info!(target: "mail", port, "waiting for OAuth redirect");

        let code = await_redirect(&listener, &state).await?;
        let response = self
            .http
            .post(&client.token_uri)
            .form(&[
                ("code", code.as_str()),
                ("client_id", client.client_id.as_str()),
                ("client_secret", client.client_secret.as_str()),
                ("redirect_uri", redirect_uri.as_str()),
                ("code_verifier", pkce.verifier.as_str()),
                ("grant_type", "authorization_code"),
            ])
            .send()
            .await?
            .error_for_status()
            .context("authorization code exchange was rejected")?;
        let token: TokenResponse = response.json().await?;
        tracing::info!(target: "mail", "mail authorization granted");
        Ok(token.into_cached(None, &self.config.scopes))
    }
}

/// PKCE verifier and its S256 challenge.
pub struct Pkce {
    pub verifier: String,
    pub challenge: String,
}

impl Pkce {
    pub fn generate() -> Self {
        let verifier = format!(
            "{}{}",
            Uuid::new_v4().simple(),
            Uuid::new_v4().simple()
        );
        Self::from_verifier(verifier)
    }

    fn from_verifier(verifier: String) -> Self {
        let challenge = URL_SAFE_NO_PAD.encode(Sha256::digest(verifier.as_bytes()));
        Self {
            verifier,
            challenge,
        }
    }
}

/// Serves the loopback listener until a request carries the OAuth redirect.
/// Preconnects, favicon fetches and other stray requests get a 404.
async fn await_redirect(listener: &TcpListener, state: &str) -> Result<String> {
    loop {
        let (mut stream, _) = listener.accept().await?;
        let (reader, mut writer) = stream.split();
        let mut reader = BufReader::new(reader);
        let mut request_line = String::new();
        if let Err(err) = reader.read_line(&mut request_line).await {
            tracing::debug!(target: "mail", error = %err, "dropping unreadable loopback connection");
            continue;
        }
        // consume the headers so closing the socket does not reset the response
        let mut header = String::new();
        loop {
            header.clear();
            match reader.read_line(&mut header).await {
                Ok(n) if n > 0 && !header.trim().is_empty() => {}
                _ => break,
            }
        }

        if !is_redirect(&request_line) {
            tracing::debug!(target: "mail", request = request_line.trim_end(), "ignoring non-redirect request");
            writer.write_all(plain_response("404 Not Found", "Not found.").as_bytes()).await.ok();
            writer.shutdown().await.ok();
            continue;
        }

        let outcome = authorization_code(&request_line, state);
        let page = if outcome.is_ok() {
            "The authentication flow has completed. You may close this window."
        } else {
            "The authentication flow failed. Check the terminal for details."
        };
        writer.write_all(plain_response("200 OK", page).as_bytes()).await.ok();
        writer.shutdown().await.ok();
        return outcome;
    }
}

fn plain_response(status: &str, body: &str) -> String {
    format!(
        "HTTP/1.1 {status}\r\nContent-Type: text/plain; charset=utf-8\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    )
}

/// True when the request line's query carries `code` or `error`.
fn is_redirect(request_line: &str) -> bool {
    request_line
        .split_whitespace()
        .nth(1)
        .and_then(|target| Url::parse("http://127.0.0.1").ok()?.join(target).ok())
        .is_some_and(|url| url.query_pairs().any(|(key, _)| key == "code" || key == "error"))
}

pub fn consent_url(
    client: &ClientInfo,
    redirect_uri: &str,
    scopes: &[String],
    state: &str,
    pkce: &Pkce,
) -> Result<Url> {
    let scope = scopes.join(" ");
    let url = Url::parse_with_params(
        &client.auth_uri,
        &[
            ("response_type", "code"),
            ("client_id", client.client_id.as_str()),
            ("redirect_uri", redirect_uri),
            ("scope", scope.as_str()),
            ("state", state),
            ("code_challenge", pkce.challenge.as_str()),
            ("code_challenge_method", "S256"),
            ("access_type", "offline"),
            ("prompt", "consent"),
        ],
    )?;
    Ok(url)
}

/// Extracts the authorization code from the redirect's HTTP request line.
pub fn authorization_code(request_line: &str, expected_state: &str) -> Result<String> {
    let target = request_line
        .split_whitespace()
        .nth(1)
        .ok_or_else(|| anyhow!("malformed OAuth redirect request: {request_line:?}"))?;
    let url = Url::parse("http://127.0.0.1")?.join(target)?;

    let mut code = None;
    let mut state = None;
    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "code" => code = Some(value.into_owned()),
            "state" => state = Some(value.into_owned()),
            "error" => bail!("authorization was denied: {value}"),
            _ => {}
        }
    }

    if state.as_deref() != Some(expected_state) {
        bail!("OAuth state mismatch in redirect");
    }
    code.ok_or_else(|| anyhow!("OAuth redirect did not carry an authorization code"))
}

async fn load_client_secrets(path: &Path) -> Result<ClientInfo> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read client secrets {}", path.display()))?;
    let secrets: ClientSecrets = serde_json::from_str(&raw)
        .with_context(|| format!("invalid client secrets file {}", path.display()))?;
    secrets
        .installed
        .or(secrets.web)
        .ok_or_else(|| anyhow!("client secrets file has neither an 'installed' nor a 'web' entry"))
}

async fn load_cache(path: &Path) -> Result<Option<CachedToken>> {
    if !tokio::fs::try_exists(path).await.unwrap_or(false) {
        return Ok(None);
    }
    let raw = tokio::fs::read_to_string(path).await?;
    match serde_json::from_str(&raw) {
        Ok(token) => Ok(Some(token)),
        Err(err) => {
            tracing::warn!(target: "mail", error = %err, path = %path.display(), "ignoring unreadable token cache");
            Ok(None)
        }
    }
}

async fn save_cache(path: &Path, token: &CachedToken) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    let raw = serde_json::to_string_pretty(token)?;
    tokio::fs::write(path, raw)
        .await
        .with_context(|| format!("failed to write token cache {}", path.display()))?;
    Ok(())
}
