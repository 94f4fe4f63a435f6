use crossterm::event::{KeyCode, KeyModifiers};

use crate::app::App;
use crate::bulk::Dispatch;
use crate::models::{BulkAction, FocusArea, LanguageFilter, RepoView};

/// Side effects requested by a key press; the event loop carries them out.
#[derive(Debug, PartialEq, Eq)]
pub enum Command {
    None,
    Quit,
    Fetch(RepoView),
    RunBatch(Dispatch),
    CopyToClipboard(String),
}

pub fn handle_key(key: KeyCode, modifiers: KeyModifiers, app: &mut App) -> Command {
    if modifiers.contains(KeyModifiers::CONTROL) && key == KeyCode::Char('c') {
        return Command::Quit;
    }

    // The confirm dialog is modal.
    if app.dialog.is_open() {
        return match key {
            KeyCode::Char('y') | KeyCode::Enter => match app.confirm_dialog() {
                Some(dispatch) => Command::RunBatch(dispatch),
                None => Command::None,
            },
            KeyCode::Char('n') | KeyCode::Esc => {
                app.cancel_dialog();
                Command::None
            }
            _ => Command::None,
        };
    }

    if app.focus == FocusArea::Search {
        let mut term = app.criteria.search_term.clone();
        match key {
            KeyCode::Enter | KeyCode::Esc => app.focus = FocusArea::List,
            KeyCode::Backspace => {
                term.pop();
                app.set_search(term);
            }
            KeyCode::Char(c) => {
                term.push(c);
                app.set_search(term);
            }
            _ => {}
        }
        return Command::None;
    }

    match key {
        KeyCode::Char('q') => return Command::Quit,
        KeyCode::Up | KeyCode::Char('k') => app.move_cursor(-1),
        KeyCode::Down | KeyCode::Char('j') => app.move_cursor(1),
        KeyCode::PageUp => app.move_cursor(-10),
        KeyCode::PageDown => app.move_cursor(10),
        KeyCode::Home | KeyCode::Char('g') => app.move_cursor(isize::MIN / 2),
        KeyCode::End | KeyCode::Char('G') => app.move_cursor(isize::MAX / 2),
        KeyCode::Char(' ') => app.toggle_highlighted(),
        KeyCode::Char('/') => app.focus = FocusArea::Search,
        KeyCode::Esc => {
            // clear the search first, then the language filter
            if !app.criteria.search_term.is_empty() {
                app.set_search(String::new());
            } else {
                app.set_language(LanguageFilter::All);
            }
        }
        KeyCode::Char('l') => app.cycle_language(),
        KeyCode::Char('s') => app.cycle_sort_field(),
        KeyCode::Char('o') => app.flip_sort_order(),
        KeyCode::Tab | KeyCode::BackTab => return Command::Fetch(app.switch_view()),
        KeyCode::Char('r') => {
            app.loading = true;
            return Command::Fetch(app.view);
        }
        KeyCode::Char('U') => app.request_bulk(BulkAction::Unstar),
        KeyCode::Char('D') => app.request_bulk(BulkAction::Delete),
        KeyCode::Char('u') => app.request_single(BulkAction::Unstar),
        KeyCode::Char('d') => app.request_single(BulkAction::Delete),
        KeyCode::Char('c') => {
            if let Some(repo) = app.highlighted() {
                return Command::CopyToClipboard(repo.html_url.clone());
            }
        }
        _ => {}
    }
    Command::None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::tests::repo;
    use crate::github::RepoCollection;
    use crate::models::{FilterCriteria, SelectionSet, SortSpec};

    fn app() -> App {
        let mut app = App::new(RepoView::Owned, SortSpec::default(), FilterCriteria::default());
        app.apply_collection(RepoCollection::Owned(vec![
            repo(1, "alpha", Some("TypeScript"), 10),
            repo(2, "beta", Some("JavaScript"), 20),
        ]));
        app
    }

    fn press(app: &mut App, key: KeyCode) -> Command {
        handle_key(key, KeyModifiers::NONE, app)
    }

    #[test]
    fn typing_in_search_filters_live() {
        let mut app = app();
        press(&mut app, KeyCode::Char('/'));
        for c in "BET".chars() {
            press(&mut app, KeyCode::Char(c));
        }
        assert_eq!(app.criteria.search_term, "BET");
        assert_eq!(app.rows().len(), 1);
        // 'q' is text while searching
        assert_eq!(press(&mut app, KeyCode::Char('q')), Command::None);
        press(&mut app, KeyCode::Backspace);
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.focus, FocusArea::List);
        press(&mut app, KeyCode::Esc);
        assert!(app.criteria.search_term.is_empty());
    }

    #[test]
    fn bulk_delete_flow_through_keys() {
        let mut app = app();
        press(&mut app, KeyCode::Char(' '));
        press(&mut app, KeyCode::Char('j'));
        press(&mut app, KeyCode::Char(' '));
        assert_eq!(app.selection, SelectionSet::from([1, 2]));

        press(&mut app, KeyCode::Char('D'));
        assert!(app.dialog.is_open());
        // other keys are swallowed while the dialog is up
        assert_eq!(press(&mut app, KeyCode::Char('q')), Command::None);

        match press(&mut app, KeyCode::Char('y')) {
            Command::RunBatch(dispatch) => {
                assert_eq!(dispatch.action, BulkAction::Delete);
                assert_eq!(dispatch.full_names.len(), 2);
            }
            other => panic!("expected batch, got {:?}", other),
        }
        assert!(app.selection.is_empty());
    }

    #[test]
    fn escape_cancels_dialog_and_keeps_selection() {
        let mut app = app();
        press(&mut app, KeyCode::Char(' '));
        press(&mut app, KeyCode::Char('U'));
        press(&mut app, KeyCode::Esc);
        assert!(!app.dialog.is_open());
        assert_eq!(app.selection.len(), 1);
    }

    #[test]
    fn bulk_keys_do_nothing_without_selection() {
        let mut app = app();
        press(&mut app, KeyCode::Char('U'));
        assert!(!app.dialog.is_open());
    }

    #[test]
    fn tab_switches_view_and_requests_fetch() {
        let mut app = app();
        assert_eq!(press(&mut app, KeyCode::Tab), Command::Fetch(RepoView::Starred));
        assert_eq!(app.view, RepoView::Starred);
        assert_eq!(press(&mut app, KeyCode::Char('r')), Command::Fetch(RepoView::Starred));
    }

    #[test]
    fn filter_and_sort_keys() {
        let mut app = app();
        press(&mut app, KeyCode::Char('l'));
        assert_eq!(app.criteria.language, LanguageFilter::Exact("JavaScript".into()));
        press(&mut app, KeyCode::Esc);
        assert_eq!(app.criteria.language, LanguageFilter::All);

        let before = app.sort;
        press(&mut app, KeyCode::Char('s'));
        press(&mut app, KeyCode::Char('o'));
        assert_ne!(app.sort.field, before.field);
        assert_ne!(app.sort.order, before.order);
    }

    #[test]
    fn copy_uses_highlighted_url() {
        let mut app = app();
        press(&mut app, KeyCode::Char('G'));
        let expected = app.highlighted().unwrap().html_url.clone();
        assert_eq!(press(&mut app, KeyCode::Char('c')), Command::CopyToClipboard(expected));
        assert_eq!(handle_key(KeyCode::Char('c'), KeyModifiers::CONTROL, &mut app), Command::Quit);
    }
}
