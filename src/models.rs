use std::collections::HashSet;
use std::fmt;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Ids of the repositories the user has ticked. Order carries no meaning.
pub type SelectionSet = HashSet<u64>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Owner {
    pub login: String,
    #[serde(default)]
    pub avatar_url: String,
}

/// A repository as returned by the GitHub REST API, trimmed to the fields we read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repository {
    pub id: u64,
    pub name: String,
    /// `owner/name`, the key used for unstar and delete calls.
    pub full_name: String,
    pub description: Option<String>,
    pub language: Option<String>,
    pub stargazers_count: u64,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub html_url: String,
    pub owner: Owner,
}

/// A starred repository together with the moment the user starred it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StarredRepository {
    pub starred_at: DateTime<Utc>,
    pub repo: Repository,
}

/// Anything the engine can filter, sort and select over.
pub trait RepoRecord {
    fn repo(&self) -> &Repository;
}

impl RepoRecord for Repository {
    fn repo(&self) -> &Repository {
        self
    }
}

impl RepoRecord for StarredRepository {
    fn repo(&self) -> &Repository {
        &self.repo
    }
}

impl<T: RepoRecord + ?Sized> RepoRecord for &T {
    fn repo(&self) -> &Repository {
        (**self).repo()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LanguageFilter {
    #[default]
    All,
    Exact(String),
}

impl LanguageFilter {
    /// `""` and `"all"` (any case) disable the language predicate.
    pub fn parse(value: &str) -> Self {
        if value.is_empty() || value.eq_ignore_ascii_case("all") {
            LanguageFilter::All
        } else {
            LanguageFilter::Exact(value.to_string())
        }
    }

    pub fn label(&self) -> &str {
        match self {
            LanguageFilter::All => "All",
            LanguageFilter::Exact(lang) => lang,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FilterCriteria {
    pub search_term: String,
    pub language: LanguageFilter,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SortField {
    Name,
    Stars,
    #[default]
    Updated,
}

impl SortField {
    pub fn next(self) -> Self {
        match self {
            SortField::Name => SortField::Stars,
            SortField::Stars => SortField::Updated,
            SortField::Updated => SortField::Name,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SortField::Name => "Name",
            SortField::Stars => "Stars",
            SortField::Updated => "Updated",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[value(name = "asc")]
    #[serde(alias = "asc")]
    Ascending,
    #[default]
    #[value(name = "desc")]
    #[serde(alias = "desc")]
    Descending,
}

impl SortOrder {
    pub fn flip(self) -> Self {
        match self {
            SortOrder::Ascending => SortOrder::Descending,
            SortOrder::Descending => SortOrder::Ascending,
        }
    }

    pub fn arrow(self) -> &'static str {
        match self {
            SortOrder::Ascending => "↑",
            SortOrder::Descending => "↓",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SortSpec {
    pub field: SortField,
    pub order: SortOrder,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BulkAction {
    Unstar,
    Delete,
}

impl BulkAction {
    pub fn verb(self) -> &'static str {
        match self {
            BulkAction::Unstar => "unstar",
            BulkAction::Delete => "delete",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            BulkAction::Unstar => "Unstar",
            BulkAction::Delete => "Delete",
        }
    }

    pub fn past_tense(self) -> &'static str {
        match self {
            BulkAction::Unstar => "unstarred",
            BulkAction::Delete => "deleted",
        }
    }
}

impl fmt::Display for BulkAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.verb())
    }
}

/// Which collection the list shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum RepoView {
    #[default]
    Owned,
    Starred,
}

impl RepoView {
    pub fn toggle(self) -> Self {
        match self {
            RepoView::Owned => RepoView::Starred,
            RepoView::Starred => RepoView::Owned,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            RepoView::Owned => "My repositories",
            RepoView::Starred => "Starred",
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum FocusArea {
    List,
    Search,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Success,
    Error,
}

/// Transient message shown at the bottom of the screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub message: String,
    pub severity: Severity,
}

impl Notification {
    pub fn success(message: impl Into<String>) -> Self {
        Self { message: message.into(), severity: Severity::Success }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self { message: message.into(), severity: Severity::Error }
    }
}

pub struct Snackbar {
    pub notification: Notification,
    pub shown_at: Instant,
}
