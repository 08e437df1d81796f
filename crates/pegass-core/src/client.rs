//! Session context shared by every query.
//!
//! [`PegassClient`] owns the active cookie state, the persisted ticket and a
//! small cache of department structure names. Re-authentication is
//! serialized behind a single async gate; the HTTP state is swapped only
//! after a new ticket has been persisted.

use chrono_tz::Tz;
use reqwest::cookie::Jar;
use reqwest::{redirect, Client};
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

use crate::api::RestApi;
use crate::auth::{AuthEndpoints, AuthFlow};
use crate::error::{PegassError, Result};
use crate::storage::{Config, FileSessionStore, SessionStore, SessionTicket};

/// Structure id -> display name, for one department.
pub type StructureNames = Arc<BTreeMap<i64, String>>;

#[derive(Clone)]
struct HttpState {
    api: RestApi,
    probe: Client,
}

/// Bounded memo of department structure names, oldest entry evicted first.
#[derive(Debug, Default)]
pub(crate) struct StructureCache {
    capacity: usize,
    entries: HashMap<String, StructureNames>,
    order: VecDeque<String>,
}

impl StructureCache {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            ..Default::default()
        }
    }

    pub(crate) fn get(&self, department: &str) -> Option<StructureNames> {
        self.entries.get(department).cloned()
    }

    pub(crate) fn insert(&mut self, department: &str, names: StructureNames) {
        if self.entries.insert(department.to_string(), names).is_none() {
            self.order.push_back(department.to_string());
        }
        while self.order.len() > self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.entries.remove(&oldest);
            }
        }
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}

pub struct PegassClient {
    config: Config,
    endpoints: AuthEndpoints,
    probe_url: Url,
    timeout: Duration,
    tz: Tz,
    store: Arc<dyn SessionStore>,
    http: RwLock<HttpState>,
    auth_gate: tokio::sync::Mutex<()>,
    structures: Mutex<StructureCache>,
}

impl PegassClient {
    /// Client backed by the ticket file named in `config`.
    pub fn from_config(config: Config) -> Result<Self> {
        let store = FileSessionStore::new(config.ticket_path()?);
        Self::new(config, Arc::new(store))
    }

    pub fn new(config: Config, store: Arc<dyn SessionStore>) -> Result<Self> {
        let endpoints = AuthEndpoints {
            idp_base: config.endpoints.idp_base()?,
            app_base: config.endpoints.app_base()?,
            sso_redeem_path: config.endpoints.sso_redeem_path.clone(),
            saml_consumer_path: config.endpoints.saml_consumer_path.clone(),
        };
        let probe_url = endpoints
            .app_base
            .join(&config.endpoints.session_probe_path)
            .map_err(|e| PegassError::decode(config.endpoints.session_probe_path.as_str(), e))?;
        let timeout = config.http.timeout();
        let tz = config.summary.tz()?;
        let http = build_http(&endpoints.app_base, Arc::new(Jar::default()), timeout, &config)?;

        Ok(Self {
            structures: Mutex::new(StructureCache::new(config.summary.structure_cache_capacity)),
            config,
            endpoints,
            probe_url,
            timeout,
            tz,
            store,
            http: RwLock::new(http),
            auth_gate: tokio::sync::Mutex::new(()),
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Zone upstream naive timestamps are read in.
    pub fn tz(&self) -> Tz {
        self.tz
    }

    /// REST handle over the current cookie state.
    pub fn api(&self) -> RestApi {
        self.http
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .api
            .clone()
    }

    fn probe_client(&self) -> Client {
        self.http
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .probe
            .clone()
    }

    /// Load the persisted ticket into a fresh cookie jar, after any
    /// handshake in flight.
    pub async fn restore_session(&self) -> Result<()> {
        let _gate = self.auth_gate.lock().await;
        let ticket = self.store.load()?;
        self.install(&ticket)?;
        debug!(cookie = %ticket.cookie_name, "session restored");
        Ok(())
    }

    /// Run the full handshake and persist the new ticket.
    pub async fn authenticate(&self) -> Result<()> {
        let _gate = self.auth_gate.lock().await;
        self.authenticate_locked().await
    }

    async fn authenticate_locked(&self) -> Result<()> {
        self.config.credentials.ensure_complete()?;

        let mut flow = AuthFlow::new(&self.endpoints, self.timeout)?;
        let ticket = flow.run(&self.config.credentials).await?;

        self.store.save(&ticket)?;
        self.install(&ticket)?;
        self.structure_cache().clear();
        info!("session ticket persisted");
        Ok(())
    }

    /// Probe the session and re-authenticate when it no longer works.
    ///
    /// Returns whether a re-authentication happened.
    pub async fn reauthenticate_if_necessary(&self) -> Result<bool> {
        let _gate = self.auth_gate.lock().await;
        if self.session_is_valid().await {
            debug!("session still valid");
            return Ok(false);
        }

        info!("session expired, re-authenticating");
        self.discard_session()?;
        self.authenticate_locked().await?;
        Ok(true)
    }

    /// Any non-2xx answer, redirects included, or a transport error means
    /// the session is gone.
    async fn session_is_valid(&self) -> bool {
        match self.probe_client().get(self.probe_url.clone()).send().await {
            Ok(response) => {
                let status = response.status();
                debug!(status = status.as_u16(), "session probe");
                status.is_success()
            }
            Err(err) => {
                warn!(error = %err, "session probe failed");
                false
            }
        }
    }

    fn discard_session(&self) -> Result<()> {
        self.swap_jar(Arc::new(Jar::default()))
    }

    fn install(&self, ticket: &SessionTicket) -> Result<()> {
        let jar = Jar::default();
        jar.add_cookie_str(
            &format!("{}; Path=/", ticket.cookie_pair()),
            &self.endpoints.app_base,
        );
        self.swap_jar(Arc::new(jar))
    }

    fn swap_jar(&self, jar: Arc<Jar>) -> Result<()> {
        let next = build_http(&self.endpoints.app_base, jar, self.timeout, &self.config)?;
        *self.http.write().unwrap_or_else(PoisonError::into_inner) = next;
        Ok(())
    }

    pub(crate) fn structure_cache(&self) -> std::sync::MutexGuard<'_, StructureCache> {
        self.structures.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn build_http(app_base: &Url, jar: Arc<Jar>, timeout: Duration, config: &Config) -> Result<HttpState> {
    let api_client = Client::builder()
        .cookie_provider(Arc::clone(&jar))
        .timeout(timeout)
        .build()
        .map_err(|e| PegassError::transport("http client", e))?;
    let probe = Client::builder()
        .cookie_provider(jar)
        .redirect(redirect::Policy::none())
        .timeout(timeout)
        .build()
        .map_err(|e| PegassError::transport("http client", e))?;
    Ok(HttpState {
        api: RestApi::new(api_client, app_base, config.pagination.max_pages)?,
        probe,
    })
}
