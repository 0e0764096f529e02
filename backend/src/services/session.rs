//! Report session: explicit recomputation over a held snapshot.
//!
//! Changing the kind or scope regenerates the report from the snapshot the
//! session already holds; only [`ReportSession::reload`] goes back to storage.

use super::reports::{generate_report, Report, ReportKind, ReportScope, ReportSnapshot};
use crate::db::repository::{FullRepository, RepositoryResult};
use crate::db::services;

#[derive(Debug, Clone)]
pub struct ReportSession {
    snapshot: ReportSnapshot,
    kind: ReportKind,
    scope: ReportScope,
}

impl ReportSession {
    /// Session over `snapshot` showing the by-region report for the whole country.
    pub fn new(snapshot: ReportSnapshot) -> Self {
        Self {
            snapshot,
            kind: ReportKind::default(),
            scope: ReportScope::default(),
        }
    }

    /// Load a fresh snapshot from `repo` and start a session over it.
    pub async fn load<R: FullRepository + ?Sized>(repo: &R) -> RepositoryResult<Self> {
        Ok(Self::new(services::load_snapshot(repo).await?))
    }

    pub fn kind(&self) -> ReportKind {
        self.kind
    }

    pub fn scope(&self) -> ReportScope {
        self.scope
    }

    pub fn snapshot(&self) -> &ReportSnapshot {
        &self.snapshot
    }

    pub fn set_kind(&mut self, kind: ReportKind) -> Report {
        self.kind = kind;
        self.regenerate()
    }

    pub fn set_scope(&mut self, scope: ReportScope) -> Report {
        self.scope = scope;
        self.regenerate()
    }

    /// Recompute the current report without touching storage.
    pub fn regenerate(&self) -> Report {
        generate_report(&self.snapshot, self.kind, self.scope)
    }

    /// Refetch the snapshot from `repo` and recompute.
    ///
    /// On error the previous snapshot is kept.
    pub async fn reload<R: FullRepository + ?Sized>(&mut self, repo: &R) -> RepositoryResult<Report> {
        self.snapshot = services::load_snapshot(repo).await?;
        Ok(self.regenerate())
    }
}
