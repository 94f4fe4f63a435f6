//! Filtering, sorting and selection over a repository collection.
//!
//! Everything here is synchronous and free of side effects apart from the
//! selection helpers, which mutate the set they are handed.

use std::cmp::Ordering;
use std::collections::BTreeSet;

use crate::models::{
    FilterCriteria, LanguageFilter, RepoRecord, Repository, SelectionSet, SortField, SortOrder,
    SortSpec,
};

fn matches_search(repo: &Repository, needle: &str) -> bool {
    if needle.is_empty() {
        return true;
    }
    repo.name.to_lowercase().contains(needle)
        || repo
            .description
            .as_deref()
            .is_some_and(|d| d.to_lowercase().contains(needle))
}

fn matches_language(repo: &Repository, filter: &LanguageFilter) -> bool {
    match filter {
        LanguageFilter::All => true,
        LanguageFilter::Exact(lang) => repo.language.as_deref() == Some(lang.as_str()),
    }
}

/// Keeps the records matching both the search term and the language filter,
/// preserving their relative order.
pub fn filter<'a, T: RepoRecord>(collection: &'a [T], criteria: &FilterCriteria) -> Vec<&'a T> {
    let needle = criteria.search_term.to_lowercase();
    collection
        .iter()
        .filter(|r| {
            let repo = r.repo();
            matches_search(repo, &needle) && matches_language(repo, &criteria.language)
        })
        .collect()
}

/// Distinct non-null languages present in the collection, alphabetically.
pub fn available_languages<T: RepoRecord>(collection: &[T]) -> BTreeSet<String> {
    collection
        .iter()
        .filter_map(|r| r.repo().language.clone())
        .collect()
}

fn compare_names(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

fn compare(a: &Repository, b: &Repository, field: SortField) -> Ordering {
    match field {
        SortField::Name => compare_names(&a.name, &b.name),
        SortField::Stars => a.stargazers_count.cmp(&b.stargazers_count),
        SortField::Updated => a.updated_at.cmp(&b.updated_at),
    }
}

/// Stable sort; records with equal keys keep their incoming order in both directions.
pub fn sort<T: RepoRecord>(collection: &mut [T], spec: SortSpec) {
    collection.sort_by(|a, b| {
        let ord = compare(a.repo(), b.repo(), spec.field);
        match spec.order {
            SortOrder::Ascending => ord,
            SortOrder::Descending => ord.reverse(),
        }
    });
}

/// What the list renders: `sort(filter(collection))`.
pub fn render_list<'a, T: RepoRecord>(
    collection: &'a [T],
    criteria: &FilterCriteria,
    spec: SortSpec,
) -> Vec<&'a T> {
    let mut visible = filter(collection, criteria);
    sort(&mut visible, spec);
    visible
}

/// Flips membership of `id`. Returns whether it is selected afterwards.
pub fn toggle_select(selection: &mut SelectionSet, id: u64) -> bool {
    if selection.remove(&id) {
        false
    } else {
        selection.insert(id);
        true
    }
}

/// Full names of the selected repositories, in collection order.
/// Selected ids that are no longer in the collection are skipped.
pub fn selected_full_names<T: RepoRecord>(
    collection: &[T],
    selection: &SelectionSet,
) -> Vec<String> {
    collection
        .iter()
        .map(|r| r.repo())
        .filter(|repo| selection.contains(&repo.id))
        .map(|repo| repo.full_name.clone())
        .collect()
}

/// Drops ids that no longer exist after the collection was refreshed.
/// Returns how many were removed.
pub fn prune_selection<T: RepoRecord>(selection: &mut SelectionSet, collection: &[T]) -> usize {
    let before = selection.len();
    let present: SelectionSet = collection.iter().map(|r| r.repo().id).collect();
    selection.retain(|id| present.contains(id));
    before - selection.len()
}
