use std::collections::{BTreeMap, BTreeSet};
use std::env;
use std::thread::sleep;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result, bail};
use reqwest::blocking::Client;
use reqwest::{StatusCode, Url};
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::config::SyncConfig;

pub const NS_MAIN: i32 = 0;
pub const NS_TEMPLATE: i32 = 10;

/// How a failed remote call should be treated by the retry executor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    RateLimited,
    Transient,
    Permanent,
}

impl FailureKind {
    pub fn is_retryable(self) -> bool {
        !matches!(self, Self::Permanent)
    }
}

#[derive(Debug, Error)]
pub enum WikiApiError {
    #[error("MediaWiki API rate limit: {detail}")]
    RateLimited { detail: String },
    #[error("MediaWiki API request failed: {detail}")]
    Transient { detail: String },
    #[error("MediaWiki API request failed with HTTP {status}")]
    Http { status: u16 },
    #[error("MediaWiki API error [{code}]: {info}")]
    Api { code: String, info: String },
}

impl WikiApiError {
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::RateLimited { .. } => FailureKind::RateLimited,
            Self::Transient { .. } => FailureKind::Transient,
            Self::Http { status } => match *status {
                429 => FailureKind::RateLimited,
                408 | 500 | 502 | 503 | 504 => FailureKind::Transient,
                _ => FailureKind::Permanent,
            },
            Self::Api { code, .. } => match code.as_str() {
                "ratelimited" | "actionthrottledtext" => FailureKind::RateLimited,
                "maxlag" | "readonly" | "badtoken" | "internal_api_error_DBQueryError" => {
                    FailureKind::Transient
                }
                _ => FailureKind::Permanent,
            },
        }
    }

    pub fn api_code(&self) -> Option<&str> {
        match self {
            Self::Api { code, .. } => Some(code),
            _ => None,
        }
    }
}

/// Whether `error` carries the MediaWiki API error `code` anywhere in its chain.
pub fn has_api_code(error: &anyhow::Error, code: &str) -> bool {
    error
        .chain()
        .filter_map(|cause| cause.downcast_ref::<WikiApiError>())
        .any(|api_error| api_error.api_code() == Some(code))
}

/// Classify any error coming out of a wiki call. Errors that carry no
/// [`WikiApiError`] in their chain are assumed transient.
pub fn classify_failure(error: &anyhow::Error) -> FailureKind {
    error
        .chain()
        .find_map(|cause| cause.downcast_ref::<WikiApiError>())
        .map(WikiApiError::kind)
        .unwrap_or(FailureKind::Transient)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRef {
    pub title: String,
    pub namespace: i32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemotePage {
    pub title: String,
    pub namespace: i32,
    pub page_id: i64,
    pub revision_id: i64,
    pub timestamp: String,
    pub content: String,
}

pub trait WikiReadApi {
    /// Pages transcluding `template`, optionally restricted to one namespace.
    fn pages_using_template(&mut self, template: &str, namespace: Option<i32>)
    -> Result<Vec<PageRef>>;
    fn get_page_contents(&mut self, titles: &[String]) -> Result<Vec<RemotePage>>;
    /// The requested titles (normalized) whose page exists, judged after the
    /// wiki's own title canonicalization. `pH Strip` counts as existing when
    /// the wiki stores it as `PH Strip`.
    fn existing_titles(&mut self, titles: &[String]) -> Result<BTreeSet<String>>;
    /// Id of the namespace called `name` (local name, canonical name or
    /// alias), or `None` when the wiki defines no such namespace.
    fn namespace_id(&mut self, name: &str) -> Result<Option<i32>>;
    fn request_count(&self) -> usize;

    fn page_exists(&mut self, title: &str) -> Result<bool> {
        let existing = self.existing_titles(&[title.to_string()])?;
        Ok(existing.contains(&normalize_title(title)))
    }
}

pub trait WikiWriteApi: WikiReadApi {
    fn login(&mut self, username: &str, password: &str) -> Result<()>;
    fn edit_page(&mut self, title: &str, content: &str, summary: &str) -> Result<()>;
    /// Save a page only if it does not exist yet. An existing page fails with
    /// the `articleexists` API error and is left untouched.
    fn create_page(&mut self, title: &str, content: &str, summary: &str) -> Result<()>;
    fn delete_page(&mut self, title: &str, reason: &str) -> Result<()>;
    fn purge_page(&mut self, title: &str) -> Result<()>;
}

#[derive(Debug, Clone)]
pub struct MediaWikiClientConfig {
    pub api_url: String,
    pub user_agent: String,
    pub timeout_ms: u64,
    pub rate_limit_read_ms: u64,
    pub rate_limit_write_ms: u64,
    pub max_retries: usize,
    pub retry_delay_ms: u64,
}

impl MediaWikiClientConfig {
    pub fn from_config(config: &SyncConfig) -> Self {
        Self {
            api_url: config.api_url_owned().unwrap_or_default(),
            user_agent: config.user_agent(),
            timeout_ms: env_value_u64("WIKI_HTTP_TIMEOUT_MS", 30_000),
            rate_limit_read_ms: env_value_u64("WIKI_RATE_LIMIT_READ", 300),
            rate_limit_write_ms: env_value_u64("WIKI_RATE_LIMIT_WRITE", 1_000),
            max_retries: env_value_usize("WIKI_HTTP_RETRIES", 2),
            retry_delay_ms: env_value_u64("WIKI_HTTP_RETRY_DELAY_MS", 500),
        }
    }
}

pub struct MediaWikiClient {
    client: Client,
    config: MediaWikiClientConfig,
    last_request_at: Option<Instant>,
    last_write_at: Option<Instant>,
    request_count: usize,
    csrf_token: Option<String>,
}

impl MediaWikiClient {
    pub fn new(config: MediaWikiClientConfig) -> Result<Self> {
        if config.api_url.trim().is_empty() {
            bail!("wiki API URL is not configured (set WIKI_API_URL or [wiki].api_url)");
        }
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .cookie_store(true)
            .build()
            .context("failed to build MediaWiki HTTP client")?;

        Ok(Self {
            client,
            config,
            last_request_at: None,
            last_write_at: None,
            request_count: 0,
            csrf_token: None,
        })
    }

    /// Build a client from configuration and, unless `read_only`, log in with
    /// `WIKI_BOT_USER` / `WIKI_BOT_PASS`.
    pub fn connect(config: &SyncConfig, read_only: bool) -> Result<Self> {
        let mut client = Self::new(MediaWikiClientConfig::from_config(config))?;
        if !read_only {
            let username = env::var("WIKI_BOT_USER")
                .map_err(|_| anyhow::anyhow!("WIKI_BOT_USER is required for writes"))?;
            let password = env::var("WIKI_BOT_PASS")
                .map_err(|_| anyhow::anyhow!("WIKI_BOT_PASS is required for writes"))?;
            client
                .login(username.trim(), password.trim())
                .context("wiki login failed")?;
        }
        Ok(client)
    }

    fn request_json_get(&mut self, params: &[(&str, String)]) -> Result<Value> {
        let base_url = Url::parse(&self.config.api_url)
            .with_context(|| format!("invalid WIKI_API_URL: {}", self.config.api_url))?;
        let pairs = encode_params(params);

        for attempt in 0..=self.config.max_retries {
            self.apply_rate_limit(false);
            let response = self
                .client
                .get(base_url.clone())
                .header("User-Agent", self.config.user_agent.clone())
                .query(&pairs)
                .send();

            match response {
                Ok(response) => {
                    let status = response.status();
                    if !status.is_success() {
                        if attempt < self.config.max_retries && is_retryable_status(status) {
                            self.wait_before_retry(attempt);
                            continue;
                        }
                        return Err(WikiApiError::Http {
                            status: status.as_u16(),
                        }
                        .into());
                    }
                    return decode_payload(response);
                }
                Err(error) => {
                    if attempt < self.config.max_retries && is_retryable_error(&error) {
                        self.wait_before_retry(attempt);
                        continue;
                    }
                    return Err(transport_error(error));
                }
            }
        }

        bail!("MediaWiki API request exhausted retry budget")
    }

    /// Single POST without client-side retries; write retries belong to the
    /// caller's retry executor.
    fn request_json_post(&mut self, params: &[(&str, String)], is_write: bool) -> Result<Value> {
        let pairs = encode_params(params);
        self.apply_rate_limit(is_write);
        let response = self
            .client
            .post(&self.config.api_url)
            .header("User-Agent", self.config.user_agent.clone())
            .form(&pairs)
            .send()
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(WikiApiError::Http {
                status: status.as_u16(),
            }
            .into());
        }
        decode_payload(response)
    }

    /// Reads wait `rate_limit_read_ms` since the previous request; writes wait
    /// `rate_limit_write_ms` since the previous write.
    fn apply_rate_limit(&mut self, is_write: bool) {
        let (delay, last) = if is_write {
            (
                Duration::from_millis(self.config.rate_limit_write_ms),
                self.last_write_at,
            )
        } else {
            (
                Duration::from_millis(self.config.rate_limit_read_ms),
                self.last_request_at,
            )
        };
        if let Some(last) = last {
            let elapsed = last.elapsed();
            if elapsed < delay {
                sleep(delay - elapsed);
            }
        }
        let now = Instant::now();
        self.last_request_at = Some(now);
        if is_write {
            self.last_write_at = Some(now);
        }
        self.request_count += 1;
    }

    fn wait_before_retry(&self, attempt: usize) {
        let exponent = u32::try_from(attempt).unwrap_or(16);
        let base = self
            .config
            .retry_delay_ms
            .saturating_mul(2u64.saturating_pow(exponent));
        let jitter = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|duration| u64::from(duration.subsec_millis() % 100))
            .unwrap_or(0);
        sleep(Duration::from_millis(base.saturating_add(jitter)));
    }

    fn ensure_csrf_token(&mut self) -> Result<String> {
        if let Some(token) = &self.csrf_token {
            return Ok(token.clone());
        }
        let response = self.request_json_get(&[
            ("action", "query".to_string()),
            ("meta", "tokens".to_string()),
        ])?;
        let parsed: TokenQueryResponse =
            serde_json::from_value(response).context("failed to decode csrf token response")?;
        let token = parsed
            .query
            .tokens
            .and_then(|tokens| tokens.csrftoken)
            .ok_or_else(|| anyhow::anyhow!("failed to get MediaWiki csrf token"))?;
        self.csrf_token = Some(token.clone());
        Ok(token)
    }

    /// A rejected token invalidates the cached one so the next attempt fetches
    /// a fresh token.
    fn forget_token_on_badtoken(&mut self, result: &Result<Value>) {
        if let Err(error) = result
            && error
                .chain()
                .find_map(|cause| cause.downcast_ref::<WikiApiError>())
                .and_then(WikiApiError::api_code)
                == Some("badtoken")
        {
            self.csrf_token = None;
        }
    }
}

impl WikiReadApi for MediaWikiClient {
    fn pages_using_template(
        &mut self,
        template: &str,
        namespace: Option<i32>,
    ) -> Result<Vec<PageRef>> {
        let mut pages = Vec::new();
        let mut continue_token: Option<String> = None;
        let template_title = template_page_title(template);

        loop {
            let mut params = vec![
                ("action", "query".to_string()),
                ("list", "embeddedin".to_string()),
                ("eititle", template_title.clone()),
                ("eilimit", "500".to_string()),
            ];
            if let Some(namespace) = namespace {
                params.push(("einamespace", namespace.to_string()));
            }
            if let Some(token) = &continue_token {
                params.push(("eicontinue", token.clone()));
            }

            let response = self.request_json_get(&params)?;
            let parsed: QueryResponse = serde_json::from_value(response)
                .context("failed to decode embeddedin API response")?;
            for item in parsed.query.embeddedin {
                pages.push(PageRef {
                    title: item.title,
                    namespace: item.ns,
                });
            }

            continue_token = parsed.continuation.and_then(|cont| cont.eicontinue);
            if continue_token.is_none() {
                break;
            }
        }

        Ok(pages)
    }

    fn get_page_contents(&mut self, titles: &[String]) -> Result<Vec<RemotePage>> {
        let mut results = Vec::new();
        for batch in titles.chunks(50) {
            let params = vec![
                ("action", "query".to_string()),
                ("titles", batch.join("|")),
                ("prop", "revisions".to_string()),
                ("rvprop", "content|timestamp|ids".to_string()),
                ("rvslots", "main".to_string()),
            ];

            let response = self.request_json_get(&params)?;
            let parsed: QueryResponse = serde_json::from_value(response)
                .context("failed to decode page content API response")?;

            for page in parsed.query.pages {
                if page.missing.unwrap_or(false) {
                    continue;
                }
                let Some(revision) = page.revisions.first() else {
                    continue;
                };
                let Some(slot) = revision
                    .slots
                    .as_ref()
                    .and_then(|slots| slots.main.as_ref())
                else {
                    continue;
                };
                let Some(page_id) = page.pageid else {
                    continue;
                };

                results.push(RemotePage {
                    title: page.title,
                    namespace: page.ns,
                    page_id,
                    revision_id: revision.revid,
                    timestamp: revision.timestamp.clone(),
                    content: slot.content.clone(),
                });
            }
        }
        Ok(results)
    }

    fn existing_titles(&mut self, titles: &[String]) -> Result<BTreeSet<String>> {
        let mut existing = BTreeSet::new();
        for batch in titles.chunks(50) {
            let response = self.request_json_get(&[
                ("action", "query".to_string()),
                ("titles", batch.join("|")),
            ])?;
            let parsed: QueryResponse = serde_json::from_value(response)
                .context("failed to decode page existence response")?;
            existing.extend(existing_requested_titles(batch, &parsed.query));
        }
        Ok(existing)
    }

    fn namespace_id(&mut self, name: &str) -> Result<Option<i32>> {
        let response = self.request_json_get(&[
            ("action", "query".to_string()),
            ("meta", "siteinfo".to_string()),
            ("siprop", "namespaces|namespacealiases".to_string()),
        ])?;
        let parsed: SiteInfoResponse = serde_json::from_value(response)
            .context("failed to decode siteinfo namespaces response")?;
        Ok(find_namespace(&parsed.query, name))
    }

    fn request_count(&self) -> usize {
        self.request_count
    }
}

impl WikiWriteApi for MediaWikiClient {
    fn login(&mut self, username: &str, password: &str) -> Result<()> {
        let token_response = self.request_json_get(&[
            ("action", "query".to_string()),
            ("meta", "tokens".to_string()),
            ("type", "login".to_string()),
        ])?;
        let token_payload: TokenQueryResponse = serde_json::from_value(token_response)
            .context("failed to decode login token response")?;
        let login_token = token_payload
            .query
            .tokens
            .and_then(|tokens| tokens.logintoken)
            .ok_or_else(|| anyhow::anyhow!("failed to get MediaWiki login token"))?;

        let login_response = self.request_json_post(
            &[
                ("action", "login".to_string()),
                ("lgname", username.to_string()),
                ("lgpassword", password.to_string()),
                ("lgtoken", login_token),
            ],
            false,
        )?;
        let login_payload: LoginResponse =
            serde_json::from_value(login_response).context("failed to decode login response")?;
        match login_payload.login.result.as_deref() {
            Some("Success") => {
                self.csrf_token = None;
                Ok(())
            }
            other => bail!(
                "MediaWiki login failed: {}",
                login_payload
                    .login
                    .reason
                    .or_else(|| other.map(ToString::to_string))
                    .unwrap_or_else(|| "unknown error".to_string())
            ),
        }
    }

    fn edit_page(&mut self, title: &str, content: &str, summary: &str) -> Result<()> {
        self.save_page(title, content, summary, false)
    }

    fn create_page(&mut self, title: &str, content: &str, summary: &str) -> Result<()> {
        self.save_page(title, content, summary, true)
    }

    fn delete_page(&mut self, title: &str, reason: &str) -> Result<()> {
        let token = self.ensure_csrf_token()?;
        let response = self.request_json_post(
            &[
                ("action", "delete".to_string()),
                ("title", title.to_string()),
                ("reason", reason.to_string()),
                ("token", token),
            ],
            true,
        );
        self.forget_token_on_badtoken(&response);

        match response {
            Err(error) if has_api_code(&error, "missingtitle") => Ok(()),
            other => other.map(|_| ()),
        }
    }

    fn purge_page(&mut self, title: &str) -> Result<()> {
        self.request_json_post(
            &[
                ("action", "purge".to_string()),
                ("titles", title.to_string()),
            ],
            true,
        )?;
        Ok(())
    }
}

impl MediaWikiClient {
    fn save_page(
        &mut self,
        title: &str,
        content: &str,
        summary: &str,
        create_only: bool,
    ) -> Result<()> {
        let token = self.ensure_csrf_token()?;
        let mut params = vec![
            ("action", "edit".to_string()),
            ("title", title.to_string()),
            ("text", content.to_string()),
            ("summary", summary.to_string()),
            ("bot", "1".to_string()),
        ];
        if create_only {
            params.push(("createonly", "1".to_string()));
        }
        params.push(("token", token));
        let response = self.request_json_post(&params, true);
        self.forget_token_on_badtoken(&response);
        let edit_payload: EditResponse =
            serde_json::from_value(response?).context("failed to decode edit response")?;
        let edit = edit_payload
            .edit
            .ok_or_else(|| anyhow::anyhow!("missing edit payload in API response"))?;
        if edit.result.as_deref() != Some("Success") {
            bail!(
                "MediaWiki edit failed for {}: {}",
                title,
                edit.result.unwrap_or_else(|| "unknown".to_string())
            );
        }
        Ok(())
    }
}

/// `Template:Name` for a bare template name; titles that already carry a
/// namespace are passed through.
pub fn template_page_title(template: &str) -> String {
    let trimmed = template.trim();
    if trimmed.contains(':') {
        trimmed.to_string()
    } else {
        format!("Template:{trimmed}")
    }
}

pub fn normalize_title(title: &str) -> String {
    title.replace('_', " ").trim().to_string()
}

/// Map each requested title through the `normalized` pairs of a query
/// response and keep those whose canonical page exists.
fn existing_requested_titles(requested: &[String], query: &QueryPayload) -> BTreeSet<String> {
    let canonical_by_requested = query
        .normalized
        .iter()
        .map(|pair| (normalize_title(&pair.from), normalize_title(&pair.to)))
        .collect::<BTreeMap<_, _>>();
    let present = query
        .pages
        .iter()
        .filter(|page| !page.missing.unwrap_or(false) && page.invalid.is_none())
        .map(|page| normalize_title(&page.title))
        .collect::<BTreeSet<_>>();

    requested
        .iter()
        .map(|title| normalize_title(title))
        .filter(|title| {
            let canonical = canonical_by_requested.get(title).unwrap_or(title);
            present.contains(canonical)
        })
        .collect()
}

fn find_namespace(payload: &SiteInfoPayload, name: &str) -> Option<i32> {
    let wanted = normalize_title(name);
    let matches = |candidate: &str| normalize_title(candidate).eq_ignore_ascii_case(&wanted);
    payload
        .namespaces
        .values()
        .find(|namespace| {
            matches(&namespace.name) || namespace.canonical.as_deref().is_some_and(matches)
        })
        .map(|namespace| namespace.id)
        .or_else(|| {
            payload
                .namespacealiases
                .iter()
                .find(|alias| matches(&alias.alias))
                .map(|alias| alias.id)
        })
}

fn encode_params(params: &[(&str, String)]) -> Vec<(String, String)> {
    let mut pairs = Vec::with_capacity(params.len() + 2);
    pairs.push(("format".to_string(), "json".to_string()));
    pairs.push(("formatversion".to_string(), "2".to_string()));
    for (key, value) in params {
        if !value.is_empty() {
            pairs.push(((*key).to_string(), value.clone()));
        }
    }
    pairs
}

fn decode_payload(response: reqwest::blocking::Response) -> Result<Value> {
    let payload: Value = response
        .json()
        .context("failed to decode MediaWiki API JSON response")?;
    if let Some(error) = payload.get("error") {
        let code = error
            .get("code")
            .and_then(Value::as_str)
            .unwrap_or("unknown_error");
        let info = error
            .get("info")
            .and_then(Value::as_str)
            .unwrap_or("unknown info");
        return Err(WikiApiError::Api {
            code: code.to_string(),
            info: info.to_string(),
        }
        .into());
    }
    Ok(payload)
}

fn transport_error(error: reqwest::Error) -> anyhow::Error {
    if is_retryable_error(&error) {
        WikiApiError::Transient {
            detail: error.to_string(),
        }
        .into()
    } else {
        anyhow::Error::new(error).context("failed to call MediaWiki API")
    }
}

fn env_value_u64(key: &str, default: u64) -> u64 {
    env::var(key)
        .ok()
        .and_then(|value| value.trim().parse::<u64>().ok())
        .unwrap_or(default)
}

fn env_value_usize(key: &str, default: usize) -> usize {
    env::var(key)
        .ok()
        .and_then(|value| value.trim().parse::<usize>().ok())
        .unwrap_or(default)
}

fn is_retryable_status(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::REQUEST_TIMEOUT
            | StatusCode::TOO_MANY_REQUESTS
            | StatusCode::BAD_GATEWAY
            | StatusCode::SERVICE_UNAVAILABLE
            | StatusCode::GATEWAY_TIMEOUT
    )
}

fn is_retryable_error(error: &reqwest::Error) -> bool {
    error.is_timeout() || error.is_connect() || error.is_request()
}

#[derive(Debug, Deserialize, Default)]
struct QueryResponse {
    #[serde(default)]
    query: QueryPayload,
    #[serde(default, rename = "continue")]
    continuation: Option<ContinuationPayload>,
}

#[derive(Debug, Deserialize, Default)]
struct QueryPayload {
    #[serde(default)]
    embeddedin: Vec<EmbeddedInItem>,
    #[serde(default)]
    pages: Vec<PageQueryItem>,
    #[serde(default)]
    normalized: Vec<NormalizedTitle>,
}

#[derive(Debug, Deserialize)]
struct NormalizedTitle {
    from: String,
    to: String,
}

#[derive(Debug, Deserialize, Default)]
struct SiteInfoResponse {
    #[serde(default)]
    query: SiteInfoPayload,
}

#[derive(Debug, Deserialize, Default)]
struct SiteInfoPayload {
    #[serde(default)]
    namespaces: BTreeMap<String, NamespaceInfo>,
    #[serde(default)]
    namespacealiases: Vec<NamespaceAlias>,
}

#[derive(Debug, Deserialize)]
struct NamespaceInfo {
    id: i32,
    #[serde(default)]
    name: String,
    canonical: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NamespaceAlias {
    id: i32,
    alias: String,
}

#[derive(Debug, Deserialize, Default)]
struct ContinuationPayload {
    eicontinue: Option<String>,
}

#[derive(Debug, Deserialize)]
struct EmbeddedInItem {
    ns: i32,
    title: String,
}

#[derive(Debug, Deserialize)]
struct PageQueryItem {
    pageid: Option<i64>,
    ns: i32,
    title: String,
    missing: Option<bool>,
    invalid: Option<bool>,
    #[serde(default)]
    revisions: Vec<RevisionQueryItem>,
}

#[derive(Debug, Deserialize)]
struct RevisionQueryItem {
    revid: i64,
    timestamp: String,
    slots: Option<RevisionSlotContainer>,
}

#[derive(Debug, Deserialize)]
struct RevisionSlotContainer {
    main: Option<RevisionMainSlot>,
}

#[derive(Debug, Deserialize)]
struct RevisionMainSlot {
    content: String,
}

#[derive(Debug, Deserialize, Default)]
struct TokenQueryResponse {
    #[serde(default)]
    query: TokenQueryPayload,
}

#[derive(Debug, Deserialize, Default)]
struct TokenQueryPayload {
    tokens: Option<TokenPayload>,
}

#[derive(Debug, Deserialize, Default)]
struct TokenPayload {
    logintoken: Option<String>,
    csrftoken: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct LoginResponse {
    #[serde(default)]
    login: LoginPayload,
}

#[derive(Debug, Deserialize, Default)]
struct LoginPayload {
    result: Option<String>,
    reason: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct EditResponse {
    edit: Option<EditPayload>,
}

#[derive(Debug, Deserialize, Default)]
struct EditPayload {
    result: Option<String>,
}
