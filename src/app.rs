//! State owned by the interactive view, and the worker that runs network
//! calls on the tokio runtime and reports back over a channel.

use std::collections::BTreeSet;
use std::ops::Bound;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use tokio::runtime::Handle;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};
use tracing::{debug, error, info};

use crate::bulk::{ConfirmDialog, Dispatch, Settlement};
use crate::engine::{available_languages, prune_selection, render_list, toggle_select};
use crate::error::BulkError;
use crate::github::{GitHubClient, RepoCollection, User};
use crate::models::{
    BulkAction, FilterCriteria, FocusArea, LanguageFilter, Notification, RepoView, Repository,
    SelectionSet, Snackbar, SortSpec,
};
use crate::utils::clamp_cursor;

pub const SNACKBAR_TTL: Duration = Duration::from_secs(6);

/// Results coming back from background tasks.
#[derive(Debug)]
pub enum AppEvent {
    Loaded { view: RepoView, result: Result<RepoCollection, String> },
    UserLoaded(Result<User, String>),
    BatchSettled(Settlement),
}

/// One rendered row.
pub struct Row<'a> {
    pub repo: &'a Repository,
    pub starred_at: Option<DateTime<Utc>>,
    pub selected: bool,
}

pub struct App {
    pub view: RepoView,
    pub collection: RepoCollection,
    pub criteria: FilterCriteria,
    pub sort: SortSpec,
    pub selection: SelectionSet,
    pub cursor: Option<usize>,
    pub dialog: ConfirmDialog,
    pub focus: FocusArea,
    pub snackbar: Option<Snackbar>,
    pub loading: bool,
    pub batches_in_flight: usize,
    pub login: Option<String>,
}

impl App {
    pub fn new(view: RepoView, sort: SortSpec, criteria: FilterCriteria) -> Self {
        Self {
            view,
            collection: RepoCollection::default(),
            criteria,
            sort,
            selection: SelectionSet::new(),
            cursor: None,
            dialog: ConfirmDialog::Closed,
            focus: FocusArea::List,
            snackbar: None,
            loading: true,
            batches_in_flight: 0,
            login: None,
        }
    }

    pub fn busy(&self) -> bool {
        self.loading || self.batches_in_flight > 0
    }

    pub fn rows(&self) -> Vec<Row<'_>> {
        match &self.collection {
            RepoCollection::Owned(repos) => render_list(repos, &self.criteria, self.sort)
                .into_iter()
                .map(|repo| Row {
                    repo,
                    starred_at: None,
                    selected: self.selection.contains(&repo.id),
                })
                .collect(),
            RepoCollection::Starred(repos) => render_list(repos, &self.criteria, self.sort)
                .into_iter()
                .map(|s| Row {
                    repo: &s.repo,
                    starred_at: Some(s.starred_at),
                    selected: self.selection.contains(&s.repo.id),
                })
                .collect(),
        }
    }

    pub fn languages(&self) -> BTreeSet<String> {
        match &self.collection {
            RepoCollection::Owned(repos) => available_languages(repos),
            RepoCollection::Starred(repos) => available_languages(repos),
        }
    }

    pub fn highlighted(&self) -> Option<&Repository> {
        let rows = self.rows();
        self.cursor.and_then(|i| rows.get(i).map(|row| row.repo))
    }

    fn clamp(&mut self) {
        let len = self.rows().len();
        self.cursor = clamp_cursor(self.cursor, len);
    }

    pub fn move_cursor(&mut self, delta: isize) {
        let len = self.rows().len();
        if len == 0 {
            self.cursor = None;
            return;
        }
        let current = self.cursor.unwrap_or(0) as isize;
        self.cursor = Some((current + delta).clamp(0, len as isize - 1) as usize);
    }

    pub fn toggle_highlighted(&mut self) {
        if let Some(id) = self.highlighted().map(|r| r.id) {
            toggle_select(&mut self.selection, id);
        }
    }

    pub fn set_search(&mut self, term: String) {
        self.criteria.search_term = term;
        self.clamp();
    }

    pub fn set_language(&mut self, language: LanguageFilter) {
        self.criteria.language = language;
        self.clamp();
    }

    /// All -> each available language in order -> All.
    pub fn cycle_language(&mut self) {
        let languages = self.languages();
        let next = match &self.criteria.language {
            LanguageFilter::All => languages.iter().next().cloned(),
            LanguageFilter::Exact(current) => languages
                .range::<String, _>((Bound::Excluded(current.clone()), Bound::Unbounded))
                .next()
                .cloned(),
        };
        self.criteria.language = next.map(LanguageFilter::Exact).unwrap_or_default();
        self.clamp();
    }

    pub fn cycle_sort_field(&mut self) {
        self.sort.field = self.sort.field.next();
    }

    pub fn flip_sort_order(&mut self) {
        self.sort.order = self.sort.order.flip();
    }

    /// Switches between owned and starred. The new collection arrives via
    /// [`App::apply_collection`].
    pub fn switch_view(&mut self) -> RepoView {
        self.view = self.view.toggle();
        self.loading = true;
        self.view
    }

    pub fn request_bulk(&mut self, action: BulkAction) {
        if let Err(e) = self.dialog.open_for_selection(action, &self.selection) {
            debug!("bulk {} ignored: {}", action, e);
        }
    }

    pub fn request_single(&mut self, action: BulkAction) {
        let Some(repo) = self.highlighted().cloned() else {
            return;
        };
        if let Err(e) = self.dialog.open_for_repository(action, &repo) {
            debug!("{} ignored: {}", action, e);
        }
    }

    pub fn cancel_dialog(&mut self) {
        self.dialog.cancel();
    }

    /// Confirms the open dialog. The selection is already cleared when this returns.
    pub fn confirm_dialog(&mut self) -> Option<Dispatch> {
        let result = match &self.collection {
            RepoCollection::Owned(repos) => self.dialog.confirm(&mut self.selection, repos),
            RepoCollection::Starred(repos) => self.dialog.confirm(&mut self.selection, repos),
        };
        match result {
            Ok(dispatch) => {
                self.batches_in_flight += 1;
                Some(dispatch)
            }
            Err(BulkError::EmptySelection) => {
                self.notify(Notification::error("Selected repositories are no longer listed"));
                None
            }
            Err(e) => {
                debug!("confirm ignored: {}", e);
                None
            }
        }
    }

    /// Installs a freshly fetched collection. Stale selected ids are dropped.
    pub fn apply_collection(&mut self, collection: RepoCollection) {
        if collection.view() != self.view {
            debug!("dropping {:?} result, now showing {:?}", collection.view(), self.view);
            return;
        }
        let dropped = match &collection {
            RepoCollection::Owned(repos) => prune_selection(&mut self.selection, repos),
            RepoCollection::Starred(repos) => prune_selection(&mut self.selection, repos),
        };
        if dropped > 0 {
            debug!(dropped, "pruned stale selection");
        }
        self.collection = collection;
        self.loading = false;
        self.clamp();
    }

    /// Returns whether a refetch should follow.
    pub fn apply_settlement(&mut self, settlement: Settlement) -> bool {
        self.batches_in_flight = self.batches_in_flight.saturating_sub(1);
        self.notify(settlement.notification);
        settlement.refetch
    }

    pub fn handle_event(&mut self, event: AppEvent) -> Option<RepoView> {
        match event {
            AppEvent::Loaded { view, result: Ok(collection) } => {
                info!(?view, count = collection.len(), "collection loaded");
                self.apply_collection(collection);
                None
            }
            AppEvent::Loaded { view, result: Err(e) } => {
                error!(?view, "fetch failed: {}", e);
                if view == self.view {
                    self.loading = false;
                }
                self.notify(Notification::error(format!("Failed to load repositories: {}", e)));
                None
            }
            AppEvent::UserLoaded(Ok(user)) => {
                self.login = Some(user.login);
                None
            }
            AppEvent::UserLoaded(Err(e)) => {
                error!("failed to load user: {}", e);
                None
            }
            AppEvent::BatchSettled(settlement) => {
                if self.apply_settlement(settlement) {
                    self.loading = true;
                    Some(self.view)
                } else {
                    None
                }
            }
        }
    }

    pub fn notify(&mut self, notification: Notification) {
        self.snackbar = Some(Snackbar { notification, shown_at: Instant::now() });
    }

    pub fn expire_snackbar(&mut self, now: Instant) {
        if self
            .snackbar
            .as_ref()
            .is_some_and(|s| now.duration_since(s.shown_at) >= SNACKBAR_TTL)
        {
            self.snackbar = None;
        }
    }
}

/// Spawns network work onto the runtime and reports results as [`AppEvent`]s.
pub struct Worker {
    client: Arc<GitHubClient>,
    handle: Handle,
    tx: UnboundedSender<AppEvent>,
    per_page: u32,
    max_pages: u32,
}

impl Worker {
    pub fn new(
        client: GitHubClient,
        handle: Handle,
        per_page: u32,
        max_pages: u32,
    ) -> (Self, UnboundedReceiver<AppEvent>) {
        let (tx, rx) = unbounded_channel();
        let worker = Self { client: Arc::new(client), handle, tx, per_page, max_pages };
        (worker, rx)
    }

    pub fn fetch(&self, view: RepoView) {
        let client = self.client.clone();
        let tx = self.tx.clone();
        let (per_page, max_pages) = (self.per_page, self.max_pages);
        self.handle.spawn(async move {
            let result = client.fetch(view, per_page, max_pages).await.map_err(|e| {
                if e.is_unauthorized() {
                    format!("{} (check github_token)", e)
                } else {
                    e.to_string()
                }
            });
            let _ = tx.send(AppEvent::Loaded { view, result });
        });
    }

    pub fn fetch_user(&self) {
        let client = self.client.clone();
        let tx = self.tx.clone();
        self.handle.spawn(async move {
            let result = client.current_user().await.map_err(|e| e.to_string());
            let _ = tx.send(AppEvent::UserLoaded(result));
        });
    }

    pub fn run_batch(&self, dispatch: Dispatch) {
        let client = self.client.clone();
        let tx = self.tx.clone();
        self.handle.spawn(async move {
            let settlement = dispatch.run(client.as_ref()).await.settle();
            let _ = tx.send(AppEvent::BatchSettled(settlement));
        });
    }
}
