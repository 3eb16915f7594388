//! Client association resolver
//!
//! Maps a free-text client hint onto at most one registry client. Lookup
//! failures never propagate: association is best-effort and the hint is kept
//! as-is when the registry cannot be queried.

use casedesk_core::constants::{DEFAULT_CLIENT_MATCH_THRESHOLD, UNASSIGNED_CLIENT};
use casedesk_core::models::{ClientLookup, ClientMatch, FileStatus};
use casedesk_db::ClientDirectory;
use std::sync::Arc;

/// Outcome of resolving a client hint.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// No hint was supplied; the resolver was not consulted.
    NoHint,
    /// A registry client matched.
    Matched(ClientMatch),
    /// The registry answered but nothing matched.
    Unmatched { hint: String },
    /// The registry could not be queried; the hint is used unchanged.
    Degraded { hint: String, reason: String },
}

impl Resolution {
    /// Client name to record on promoted files.
    pub fn client_name(&self) -> &str {
        match self {
            Resolution::NoHint => UNASSIGNED_CLIENT,
            Resolution::Matched(m) => &m.name,
            Resolution::Unmatched { hint } | Resolution::Degraded { hint, .. } => hint,
        }
    }

    pub fn status(&self) -> FileStatus {
        match self {
            Resolution::Matched(_) | Resolution::Degraded { .. } => FileStatus::Assigned,
            Resolution::Unmatched { .. } | Resolution::NoHint => FileStatus::TempQueue,
        }
    }

    pub fn outcome(&self) -> &'static str {
        match self {
            Resolution::NoHint => "no_hint",
            Resolution::Matched(_) => "matched",
            Resolution::Unmatched { .. } => "unmatched",
            Resolution::Degraded { .. } => "degraded",
        }
    }
}

#[derive(Clone)]
pub struct ClientResolver {
    directory: Arc<dyn ClientDirectory>,
    threshold: f32,
}

impl ClientResolver {
    pub fn new(directory: Arc<dyn ClientDirectory>, threshold: f32) -> Self {
        Self {
            directory,
            threshold,
        }
    }

    pub fn with_default_threshold(directory: Arc<dyn ClientDirectory>) -> Self {
        Self::new(directory, DEFAULT_CLIENT_MATCH_THRESHOLD)
    }

    /// Exact case-insensitive match first, then trigram similarity.
    pub async fn resolve(&self, hint: Option<&str>) -> Resolution {
        let Some(hint) = hint.map(str::trim).filter(|h| !h.is_empty()) else {
            return Resolution::NoHint;
        };

        let resolution = self.lookup(hint).await;
        match &resolution {
            Resolution::Degraded { reason, .. } => tracing::warn!(
                stage = "resolve_client",
                outcome = resolution.outcome(),
                hint = %hint,
                error = %reason,
                "Client lookup failed, keeping hint as client name"
            ),
            _ => tracing::debug!(
                stage = "resolve_client",
                outcome = resolution.outcome(),
                hint = %hint,
                client_name = %resolution.client_name(),
                "Client hint resolved"
            ),
        }
        resolution
    }

    async fn lookup(&self, hint: &str) -> Resolution {
        let degraded = |e: casedesk_core::AppError| Resolution::Degraded {
            hint: hint.to_string(),
            reason: e.to_string(),
        };

        let exact = match self.directory.find_exact(hint).await {
            Ok(rows) => ClientLookup::from_candidates(hint, rows, self.threshold),
            Err(e) => return degraded(e),
        };
        if let ClientLookup::Match(m) = exact {
            return Resolution::Matched(m);
        }

        match self.directory.search_precise(hint, self.threshold).await {
            Ok(rows) => match ClientLookup::from_candidates(hint, rows, self.threshold) {
                ClientLookup::Match(m) => Resolution::Matched(m),
                ClientLookup::NoMatch => Resolution::Unmatched {
                    hint: hint.to_string(),
                },
            },
            Err(e) => degraded(e),
        }
    }
}
