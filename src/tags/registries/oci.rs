//! OCI distribution API registry implementation

use std::collections::HashSet;
use std::time::Duration;

use reqwest::header::{HeaderMap, LINK, RETRY_AFTER, WWW_AUTHENTICATE};
use reqwest::{StatusCode, Url};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::config::RegistrySettings;
use crate::tags::error::RegistryError;
use crate::tags::registry::{RepositoryName, TagLister};

/// Response from `GET /v2/<name>/tags/list`
#[derive(Debug, Deserialize)]
struct TagList {
    #[serde(default)]
    tags: Option<Vec<String>>,
}

/// Response from a bearer token realm
#[derive(Debug, Deserialize)]
struct TokenResponse {
    token: Option<String>,
    access_token: Option<String>,
}

/// Parameters of a `WWW-Authenticate: Bearer ...` challenge
#[derive(Debug, Default, PartialEq, Eq)]
struct BearerChallenge {
    realm: String,
    service: Option<String>,
    scope: Option<String>,
}

/// Registry implementation speaking the OCI distribution protocol
pub struct OciRegistry {
    client: reqwest::Client,
    /// Replaces `https://<host>` when set
    base_url: Option<String>,
    page_size: u32,
}

impl OciRegistry {
    pub fn new(settings: &RegistrySettings) -> Result<Self, RegistryError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("talos-tags/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_millis(settings.timeout_ms))
            .build()?;

        Ok(Self {
            client,
            base_url: settings
                .base_url
                .as_ref()
                .map(|url| url.trim_end_matches('/').to_string()),
            page_size: settings.page_size,
        })
    }

    fn base_url_for(&self, name: &RepositoryName) -> String {
        self.base_url
            .clone()
            .unwrap_or_else(|| default_base_url(&name.host))
    }

    async fn get(
        &self,
        url: &str,
        token: Option<&str>,
    ) -> Result<reqwest::Response, RegistryError> {
        let mut request = self.client.get(url).header("Accept", "application/json");
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        Ok(request.send().await?)
    }

    /// Exchanges a bearer challenge for an anonymous pull token
    async fn fetch_token(
        &self,
        challenge: &BearerChallenge,
        name: &RepositoryName,
    ) -> Result<String, RegistryError> {
        let scope = challenge
            .scope
            .clone()
            .unwrap_or_else(|| format!("repository:{}:pull", name.path));

        let mut query = vec![("scope", scope)];
        if let Some(service) = &challenge.service {
            query.push(("service", service.clone()));
        }
        let token_url = Url::parse_with_params(&challenge.realm, &query).map_err(|e| {
            RegistryError::InvalidResponse(format!("bad token realm {}: {}", challenge.realm, e))
        })?;

        debug!("requesting anonymous token from {}", challenge.realm);
        let response = self.client.get(token_url).send().await?;

        let status = response.status();
        if !status.is_success() {
            warn!("Token realm returned status {}: {}", status, challenge.realm);
            return Err(RegistryError::Unauthorized(format!(
                "token request for {} returned {}",
                name, status
            )));
        }

        let body: TokenResponse = response.json().await.map_err(|e| {
            warn!("Failed to parse token response: {}", e);
            RegistryError::InvalidResponse(e.to_string())
        })?;

        body.token
            .or(body.access_token)
            .ok_or_else(|| RegistryError::InvalidResponse("token response has no token".into()))
    }
}

#[async_trait::async_trait]
impl TagLister for OciRegistry {
    async fn list_tags(&self, repository: &str) -> Result<Vec<String>, RegistryError> {
        let name: RepositoryName = repository.parse()?;
        let base_url = self.base_url_for(&name);

        let first_page = format!(
            "{}/v2/{}/tags/list?n={}",
            base_url, name.path, self.page_size
        );
        // normalized so revisits compare equal to resolved `Link` targets
        let mut url = Url::parse(&first_page)
            .map_err(|e| RegistryError::InvalidRepository(format!("{}: {}", repository, e)))?
            .to_string();
        let mut token: Option<String> = None;
        let mut tags = Vec::new();
        let mut visited = HashSet::new();

        loop {
            debug!("calling registry {}", url);
            let response = self.get(&url, token.as_deref()).await?;
            let status = response.status();

            if status == StatusCode::UNAUTHORIZED {
                // only one token exchange per listing; a second 401 is final
                if token.is_some() {
                    return Err(RegistryError::Unauthorized(repository.to_string()));
                }
                let challenge = response
                    .headers()
                    .get(WWW_AUTHENTICATE)
                    .and_then(|v| v.to_str().ok())
                    .and_then(parse_bearer_challenge)
                    .ok_or_else(|| RegistryError::Unauthorized(repository.to_string()))?;
                token = Some(self.fetch_token(&challenge, &name).await?);
                continue;
            }

            if status == StatusCode::NOT_FOUND {
                return Err(RegistryError::NotFound(repository.to_string()));
            }

            if status == StatusCode::TOO_MANY_REQUESTS {
                let retry_after = response
                    .headers()
                    .get(RETRY_AFTER)
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse().ok());
                return Err(RegistryError::RateLimited {
                    retry_after_secs: retry_after,
                });
            }

            if !status.is_success() {
                warn!("Registry returned status {}: {}", status, url);
                return Err(RegistryError::InvalidResponse(format!(
                    "Unexpected status: {}",
                    status
                )));
            }

            let next = next_page_url(response.headers(), &url)?;

            let page: TagList = response.json().await.map_err(|e| {
                warn!("Failed to parse tag list response: {}", e);
                RegistryError::InvalidResponse(e.to_string())
            })?;
            tags.extend(page.tags.unwrap_or_default());

            visited.insert(url);
            match next {
                Some(next) if visited.contains(&next) => {
                    return Err(RegistryError::InvalidResponse(format!(
                        "pagination link points back to {}",
                        next
                    )));
                }
                Some(next) => url = next,
                None => break,
            }
        }

        debug!("registry reported {} tags for {}", tags.len(), repository);
        Ok(tags)
    }
}

/// Docker Hub serves the registry API on a different host than its name
fn default_base_url(host: &str) -> String {
    match host {
        "docker.io" | "index.docker.io" => "https://registry-1.docker.io".to_string(),
        _ => format!("https://{}", host),
    }
}

/// Resolves the `rel="next"` entry of a `Link` header against the URL it was served for
fn next_page_url(headers: &HeaderMap, current_url: &str) -> Result<Option<String>, RegistryError> {
    let Some(link) = headers.get(LINK).and_then(|v| v.to_str().ok()) else {
        return Ok(None);
    };

    let Some(target) = link.split(',').find_map(|entry| {
        let (target, params) = entry.trim().split_once(';')?;
        params
            .split(';')
            .any(|p| matches!(p.trim(), r#"rel="next""# | "rel=next"))
            .then(|| target.trim().trim_start_matches('<').trim_end_matches('>'))
    }) else {
        return Ok(None);
    };

    let base = Url::parse(current_url).map_err(|e| {
        RegistryError::InvalidResponse(format!("bad request url {}: {}", current_url, e))
    })?;
    let resolved = base
        .join(target)
        .map_err(|e| RegistryError::InvalidResponse(format!("bad link {}: {}", target, e)))?;

    Ok(Some(resolved.to_string()))
}

/// Parses a `WWW-Authenticate: Bearer realm="..",service="..",scope=".."` value
fn parse_bearer_challenge(header: &str) -> Option<BearerChallenge> {
    let rest = header.strip_prefix("Bearer ")?;

    let mut challenge = BearerChallenge::default();
    let mut remaining = rest;
    while !remaining.is_empty() {
        remaining = remaining.trim_start_matches([' ', ',']);
        if remaining.is_empty() {
            break;
        }

        let (key, after) = remaining.split_once('=')?;
        let value = if let Some(quoted) = after.strip_prefix('"') {
            let (value, tail) = quoted.split_once('"')?;
            remaining = tail;
            value
        } else {
            let end = after.find([',', ' ']).unwrap_or(after.len());
            remaining = &after[end..];
            &after[..end]
        };

        match key.trim() {
            "realm" => challenge.realm = value.to_string(),
            "service" => challenge.service = Some(value.to_string()),
            "scope" => challenge.scope = Some(value.to_string()),
            _ => {}
        }
    }

    (!challenge.realm.is_empty()).then_some(challenge)
}
