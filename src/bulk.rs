//! Confirmation-gated bulk unstar/delete.
//!
//! A batch moves through three explicit steps so each can be driven and
//! checked on its own:
//!
//! 1. [`ConfirmDialog::confirm`] resolves the target full names and clears the
//!    selection before anything touches the network, producing a [`Dispatch`].
//! 2. [`Dispatch::run`] fires one call per full name concurrently and waits for
//!    all of them to settle. There is no ordering, atomicity or retry.
//! 3. [`BatchOutcome::settle`] turns the aggregate result into a single
//!    notification and a refetch request, whether or not every call succeeded.

use async_trait::async_trait;
use futures::future::join_all;
use tracing::{info, warn};

use crate::engine::selected_full_names;
use crate::error::{BulkError, GitHubError};
use crate::github::split_full_name;
use crate::models::{BulkAction, Notification, RepoRecord, Repository, SelectionSet};

/// The per-repository operations a batch fans out to.
#[async_trait]
pub trait RepoActions: Send + Sync {
    async fn unstar(&self, owner: &str, repo: &str) -> Result<(), GitHubError>;
    async fn delete(&self, owner: &str, repo: &str) -> Result<(), GitHubError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DialogTarget {
    /// Everything currently selected.
    Selection,
    /// A single highlighted repository; the selection is left alone.
    Single { id: u64, full_name: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ConfirmDialog {
    #[default]
    Closed,
    Open { action: BulkAction, target: DialogTarget },
}

impl ConfirmDialog {
    pub fn is_open(&self) -> bool {
        matches!(self, ConfirmDialog::Open { .. })
    }

    /// Closed -> Open for the whole selection. Refused when nothing is selected.
    pub fn open_for_selection(
        &mut self,
        action: BulkAction,
        selection: &SelectionSet,
    ) -> Result<(), BulkError> {
        if self.is_open() {
            return Err(BulkError::AlreadyOpen);
        }
        if selection.is_empty() {
            return Err(BulkError::EmptySelection);
        }
        *self = ConfirmDialog::Open { action, target: DialogTarget::Selection };
        Ok(())
    }

    pub fn open_for_repository(
        &mut self,
        action: BulkAction,
        repo: &Repository,
    ) -> Result<(), BulkError> {
        if self.is_open() {
            return Err(BulkError::AlreadyOpen);
        }
        *self = ConfirmDialog::Open {
            action,
            target: DialogTarget::Single { id: repo.id, full_name: repo.full_name.clone() },
        };
        Ok(())
    }

    /// Open -> Closed with no side effect.
    pub fn cancel(&mut self) {
        *self = ConfirmDialog::Closed;
    }

    /// How many repositories the pending action would touch.
    pub fn target_count(&self, selection: &SelectionSet) -> usize {
        match self {
            ConfirmDialog::Closed => 0,
            ConfirmDialog::Open { target: DialogTarget::Selection, .. } => selection.len(),
            ConfirmDialog::Open { target: DialogTarget::Single { .. }, .. } => 1,
        }
    }

    /// Open -> Closed + dispatch. For a selection target the selection is
    /// cleared here, before the batch runs. Targets no longer in `collection`
    /// are dropped; if none are left nothing is dispatched.
    pub fn confirm<T: RepoRecord>(
        &mut self,
        selection: &mut SelectionSet,
        collection: &[T],
    ) -> Result<Dispatch, BulkError> {
        let (action, target) = match std::mem::take(self) {
            ConfirmDialog::Closed => return Err(BulkError::NotOpen),
            ConfirmDialog::Open { action, target } => (action, target),
        };
        let full_names = match target {
            DialogTarget::Selection => {
                let names = selected_full_names(collection, selection);
                selection.clear();
                names
            }
            DialogTarget::Single { id, full_name } => {
                selection.remove(&id);
                if collection.iter().any(|r| r.repo().id == id) {
                    vec![full_name]
                } else {
                    Vec::new()
                }
            }
        };
        if full_names.is_empty() {
            return Err(BulkError::EmptySelection);
        }
        Ok(Dispatch { action, full_names })
    }
}

/// A confirmed batch that has not been sent yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dispatch {
    pub action: BulkAction,
    pub full_names: Vec<String>,
}

async fn run_one<A: RepoActions + ?Sized>(
    actions: &A,
    action: BulkAction,
    full_name: &str,
) -> Result<(), GitHubError> {
    let (owner, repo) = split_full_name(full_name)?;
    match action {
        BulkAction::Unstar => actions.unstar(owner, repo).await,
        BulkAction::Delete => actions.delete(owner, repo).await,
    }
}

impl Dispatch {
    pub async fn run<A: RepoActions + ?Sized>(self, actions: &A) -> BatchOutcome {
        let action = self.action;
        let calls = self
            .full_names
            .iter()
            .map(|name| run_one(actions, action, name));
        let results = join_all(calls).await;

        let mut failed = 0;
        for (name, result) in self.full_names.iter().zip(&results) {
            if let Err(e) = result {
                failed += 1;
                warn!(full_name = %name, error = %e, "{} failed", action);
            }
        }
        info!(%action, attempted = results.len(), failed, "batch settled");
        BatchOutcome { action, attempted: results.len(), failed }
    }
}

/// Aggregate result of a batch. Individual failures are not attributed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchOutcome {
    pub action: BulkAction,
    pub attempted: usize,
    pub failed: usize,
}

impl BatchOutcome {
    pub fn succeeded(&self) -> bool {
        self.failed == 0
    }

    pub fn settle(self) -> Settlement {
        let notification = if self.succeeded() {
            Notification::success(format!("Repositories {} successfully", self.action.past_tense()))
        } else {
            Notification::error(format!("Failed to {} repositories", self.action.verb()))
        };
        Settlement { outcome: self, notification, refetch: true }
    }
}

/// What the caller must do once a batch has settled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settlement {
    pub outcome: BatchOutcome,
    pub notification: Notification,
    /// Always set: the list is refetched whatever the outcome.
    pub refetch: bool,
}

/// Opens, confirms, runs and settles a batch over the current selection in one go.
pub async fn confirm_and_run<T: RepoRecord, A: RepoActions + ?Sized>(
    action: BulkAction,
    selection: &mut SelectionSet,
    collection: &[T],
    actions: &A,
) -> Result<Settlement, BulkError> {
    let mut dialog = ConfirmDialog::Closed;
    dialog.open_for_selection(action, selection)?;
    let dispatch = dialog.confirm(selection, collection)?;
    Ok(dispatch.run(actions).await.settle())
}
