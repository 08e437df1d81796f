//! Persistence of the single session ticket.
//!
//! The ticket is the one cookie the target application hands out after the
//! SAML exchange. It is written as plain JSON `{"name": .., "value": ..}` so
//! a later process can skip the whole handshake.
//!
//! Stores do no locking of their own; `PegassClient` serializes writers.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::error::{PegassError, Result};

/// Session cookie issued by the target application.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionTicket {
    #[serde(rename = "name")]
    pub cookie_name: String,
    #[serde(rename = "value")]
    pub cookie_value: String,
}

impl SessionTicket {
    pub fn new(cookie_name: impl Into<String>, cookie_value: impl Into<String>) -> Self {
        Self {
            cookie_name: cookie_name.into(),
            cookie_value: cookie_value.into(),
        }
    }

    /// `name=value` pair as sent in a `Cookie` header.
    pub fn cookie_pair(&self) -> String {
        format!("{}={}", self.cookie_name, self.cookie_value)
    }
}

impl fmt::Debug for SessionTicket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionTicket")
            .field("cookie_name", &self.cookie_name)
            .field("cookie_value", &"<redacted>")
            .finish()
    }
}

/// Where the current ticket lives between runs.
pub trait SessionStore: Send + Sync {
    /// Replace whatever ticket was stored before.
    fn save(&self, ticket: &SessionTicket) -> Result<()>;

    /// Latest saved ticket. Missing or unreadable tickets are `TicketNotFound`.
    fn load(&self) -> Result<SessionTicket>;
}

/// JSON file with owner-only permissions.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> PegassError {
        PegassError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl SessionStore for FileSessionStore {
    fn save(&self, ticket: &SessionTicket) -> Result<()> {
        let content = serde_json::to_vec_pretty(ticket)?;

        // write-then-rename; readers only ever see a whole ticket
        let tmp_path = self.path.with_extension("json.tmp");
        let mut options = std::fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }

        let mut file = options
            .open(&tmp_path)
            .map_err(|e| self.io_error(e))?;
        file.write_all(&content).map_err(|e| self.io_error(e))?;
        file.sync_all().map_err(|e| self.io_error(e))?;
        drop(file);

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&tmp_path, std::fs::Permissions::from_mode(0o600))
                .map_err(|e| self.io_error(e))?;
        }

        std::fs::rename(&tmp_path, &self.path).map_err(|e| self.io_error(e))?;
        Ok(())
    }

    fn load(&self) -> Result<SessionTicket> {
        let content =
            std::fs::read_to_string(&self.path).map_err(|e| PegassError::TicketNotFound {
                path: self.path.clone(),
                message: e.to_string(),
            })?;

        let ticket: SessionTicket =
            serde_json::from_str(&content).map_err(|e| PegassError::TicketNotFound {
                path: self.path.clone(),
                message: format!("corrupt ticket: {e}"),
            })?;

        if ticket.cookie_name.is_empty() {
            return Err(PegassError::TicketNotFound {
                path: self.path.clone(),
                message: "ticket has an empty cookie name".to_string(),
            });
        }

        Ok(ticket)
    }
}

/// In-process store, for tests and embedders that persist elsewhere.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    ticket: Mutex<Option<SessionTicket>>,
    saves: Mutex<usize>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ticket(ticket: SessionTicket) -> Self {
        Self {
            ticket: Mutex::new(Some(ticket)),
            saves: Mutex::new(0),
        }
    }

    /// Number of successful `save` calls.
    pub fn save_count(&self) -> usize {
        self.saves.lock().map(|n| *n).unwrap_or_default()
    }
}

impl SessionStore for MemorySessionStore {
    fn save(&self, ticket: &SessionTicket) -> Result<()> {
        if let Ok(mut guard) = self.ticket.lock() {
            *guard = Some(ticket.clone());
        }
        if let Ok(mut saves) = self.saves.lock() {
            *saves += 1;
        }
        Ok(())
    }

    fn load(&self) -> Result<SessionTicket> {
        self.ticket
            .lock()
            .ok()
            .and_then(|guard| guard.clone())
            .ok_or_else(|| PegassError::TicketNotFound {
                path: PathBuf::from("<memory>"),
                message: "no ticket saved".to_string(),
            })
    }
}
