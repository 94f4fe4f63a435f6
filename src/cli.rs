//! Non-interactive commands: print a filtered list, or unstar/delete named repositories.

use std::io::{self, BufRead, Write};

use anyhow::{Result, bail};
use chrono::Utc;
use tracing::warn;

use crate::bulk::{RepoActions, Settlement, confirm_and_run};
use crate::engine::render_list;
use crate::github::{GitHubClient, RepoCollection};
use crate::models::{BulkAction, FilterCriteria, RepoRecord, SelectionSet, Severity, SortSpec};
use crate::utils::relative_time;

/// One line per repository, column-aligned.
pub fn format_table<T: RepoRecord>(rows: &[&T]) -> String {
    let now = Utc::now();
    let width = rows.iter().map(|r| r.repo().full_name.len()).max().unwrap_or(0).max(9);
    let mut out = String::new();
    out.push_str(&format!(
        "{:<width$}  {:>6}  {:<12}  {}\n",
        "REPOSITORY", "STARS", "LANGUAGE", "UPDATED"
    ));
    for row in rows {
        let repo = row.repo();
        out.push_str(&format!(
            "{:<width$}  {:>6}  {:<12}  {}\n",
            repo.full_name,
            repo.stargazers_count,
            repo.language.as_deref().unwrap_or("-"),
            relative_time(repo.updated_at, now),
        ));
    }
    out
}

pub fn list(collection: &RepoCollection, criteria: &FilterCriteria, sort: SortSpec) -> String {
    match collection {
        RepoCollection::Owned(repos) => format_table(&render_list(repos, criteria, sort)),
        RepoCollection::Starred(repos) => format_table(&render_list(repos, criteria, sort)),
    }
}

/// Ids of the repositories whose full name was asked for. Unknown names are reported back.
pub fn select_by_name<T: RepoRecord>(
    collection: &[T],
    names: &[String],
) -> (SelectionSet, Vec<String>) {
    let mut selection = SelectionSet::new();
    let mut missing = Vec::new();
    for name in names {
        match collection.iter().find(|r| r.repo().full_name.eq_ignore_ascii_case(name)) {
            Some(r) => {
                selection.insert(r.repo().id);
            }
            None => missing.push(name.clone()),
        }
    }
    (selection, missing)
}

/// Reads a y/N answer. Anything but `y`/`yes` is a no.
pub fn confirm_prompt<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    question: &str,
) -> io::Result<bool> {
    write!(output, "{} [y/N] ", question)?;
    output.flush()?;
    let mut answer = String::new();
    input.read_line(&mut answer)?;
    let answer = answer.trim().to_lowercase();
    Ok(answer == "y" || answer == "yes")
}

async fn run_on<T: RepoRecord, A: RepoActions + ?Sized>(
    action: BulkAction,
    collection: &[T],
    names: &[String],
    assume_yes: bool,
    actions: &A,
) -> Result<Option<Settlement>> {
    let (mut selection, missing) = select_by_name(collection, names);
    for name in &missing {
        warn!(full_name = %name, "not found, skipping");
        eprintln!("{} not found, skipping", name);
    }
    if selection.is_empty() {
        bail!("None of the given repositories were found");
    }
    if !assume_yes {
        let question = format!(
            "Are you sure you want to {} {} selected repositories?",
            action.verb(),
            selection.len()
        );
        let stdin = io::stdin();
        if !confirm_prompt(&mut stdin.lock(), &mut io::stdout(), &question)? {
            return Ok(None);
        }
    }
    Ok(Some(confirm_and_run(action, &mut selection, collection, actions).await?))
}

pub async fn bulk(
    client: &GitHubClient,
    collection: &RepoCollection,
    action: BulkAction,
    names: &[String],
    assume_yes: bool,
) -> Result<()> {
    let settlement = match collection {
        RepoCollection::Owned(repos) => run_on(action, repos, names, assume_yes, client).await?,
        RepoCollection::Starred(repos) => run_on(action, repos, names, assume_yes, client).await?,
    };
    match settlement {
        None => println!("Cancelled."),
        Some(s) if s.notification.severity == Severity::Error => bail!(s.notification.message),
        Some(s) => println!("{}", s.notification.message),
    }
    Ok(())
}
