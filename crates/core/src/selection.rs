//! Interactive selection state machine
//!
//! The workflow browses a candidate list, keeps a multi-selection by index and
//! gates bulk actions behind an explicit confirmation. It is a pure
//! `state + key -> state + effect` machine; the shell performs the effects
//! (network calls, rendering, pacing) and reports back.
//!
//! Selection is by index into a list that must not change for the lifetime of
//! a [`Workflow`]. A new list means a new workflow.

use serde::Serialize;
use std::collections::BTreeSet;
use std::ops::Range;

/// Rows reserved for header, instructions and padding around the list.
const CHROME_ROWS: usize = 8;
/// Upper bound on list rows shown at once.
const MAX_LIST_ROWS: usize = 20;

/// A single decoded keypress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Up,
    Down,
    Char(char),
    Other,
}

/// The relationship change a workflow applies in bulk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BulkAction {
    Follow,
    Unfollow,
}

impl BulkAction {
    /// Key that triggers the bulk action from the list.
    pub fn key(&self) -> char {
        match self {
            BulkAction::Follow => 'f',
            BulkAction::Unfollow => 'u',
        }
    }

    pub fn verb(&self) -> &'static str {
        match self {
            BulkAction::Follow => "follow",
            BulkAction::Unfollow => "unfollow",
        }
    }

    pub fn progressive(&self) -> &'static str {
        match self {
            BulkAction::Follow => "Following",
            BulkAction::Unfollow => "Unfollowing",
        }
    }

    pub fn past_tense(&self) -> &'static str {
        match self {
            BulkAction::Follow => "Followed",
            BulkAction::Unfollow => "Unfollowed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    Browsing,
    Detail(usize),
    ConfirmBulk(Vec<usize>),
    Exited,
}

/// Work the shell must carry out after a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    None,
    /// Fetch detail and recent posts for the account at this index.
    LoadDetail(usize),
    /// Apply one action to one account, then pause.
    Single { index: usize, action: BulkAction },
    /// Open the account's profile in a browser.
    OpenProfile(usize),
    /// Show the accounts at these indices and ask for confirmation.
    Confirm(Vec<usize>),
    /// Apply the action to every index, pausing between calls.
    ExecuteBulk {
        indices: Vec<usize>,
        action: BulkAction,
    },
    Exit,
}

#[derive(Debug, Clone)]
pub struct Workflow {
    len: usize,
    action: BulkAction,
    cursor: usize,
    selected: BTreeSet<usize>,
    mode: Mode,
}

impl Workflow {
    /// Start browsing a list of `len` candidates. There is nothing to browse
    /// in an empty list, so that yields `None`.
    pub fn new(len: usize, action: BulkAction) -> Option<Self> {
        if len == 0 {
            return None;
        }
        Some(Self {
            len,
            action,
            cursor: 0,
            selected: BTreeSet::new(),
            mode: Mode::Browsing,
        })
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn mode(&self) -> &Mode {
        &self.mode
    }

    pub fn action(&self) -> BulkAction {
        self.action
    }

    pub fn selected(&self) -> &BTreeSet<usize> {
        &self.selected
    }

    pub fn is_selected(&self, index: usize) -> bool {
        self.selected.contains(&index)
    }

    pub fn is_exited(&self) -> bool {
        self.mode == Mode::Exited
    }

    /// Apply one keypress.
    pub fn handle(&mut self, key: Key) -> Effect {
        let key = match key {
            Key::Char(c) => Key::Char(c.to_ascii_lowercase()),
            other => other,
        };

        match self.mode.clone() {
            Mode::Browsing => self.handle_browsing(key),
            Mode::Detail(index) => self.handle_detail(index, key),
            Mode::ConfirmBulk(indices) => self.handle_confirm(indices, key),
            Mode::Exited => Effect::None,
        }
    }

    /// The detail fetch failed; drop back to the list.
    pub fn detail_failed(&mut self) {
        if matches!(self.mode, Mode::Detail(_)) {
            self.mode = Mode::Browsing;
        }
    }

    fn handle_browsing(&mut self, key: Key) -> Effect {
        match key {
            Key::Up | Key::Char('k') => {
                self.cursor = self.cursor.saturating_sub(1);
                Effect::None
            }
            Key::Down | Key::Char('j') => {
                self.cursor = (self.cursor + 1).min(self.len - 1);
                Effect::None
            }
            Key::Char(' ') => {
                self.toggle(self.cursor);
                Effect::None
            }
            Key::Char('a') => {
                self.selected = (0..self.len).collect();
                Effect::None
            }
            Key::Char('n') => {
                self.selected.clear();
                Effect::None
            }
            Key::Char('i') => {
                self.mode = Mode::Detail(self.cursor);
                Effect::LoadDetail(self.cursor)
            }
            Key::Char('q') => {
                self.mode = Mode::Exited;
                Effect::Exit
            }
            Key::Char(c) if c == self.action.key() => {
                if self.selected.is_empty() {
                    return Effect::None;
                }
                let indices: Vec<usize> = self.selected.iter().copied().collect();
                self.mode = Mode::ConfirmBulk(indices.clone());
                Effect::Confirm(indices)
            }
            _ => Effect::None,
        }
    }

    fn handle_detail(&mut self, index: usize, key: Key) -> Effect {
        match key {
            Key::Char('f') => {
                self.mode = Mode::Browsing;
                Effect::Single {
                    index,
                    action: BulkAction::Follow,
                }
            }
            Key::Char('u') => {
                self.mode = Mode::Browsing;
                Effect::Single {
                    index,
                    action: BulkAction::Unfollow,
                }
            }
            Key::Char('o') => Effect::OpenProfile(index),
            Key::Char('b') => {
                self.mode = Mode::Browsing;
                Effect::None
            }
            _ => Effect::None,
        }
    }

    fn handle_confirm(&mut self, indices: Vec<usize>, key: Key) -> Effect {
        if key == Key::Char('y') {
            // The remote relationships change, so the list is stale afterwards.
            self.mode = Mode::Exited;
            Effect::ExecuteBulk {
                indices,
                action: self.action,
            }
        } else {
            self.mode = Mode::Browsing;
            Effect::None
        }
    }

    fn toggle(&mut self, index: usize) {
        if !self.selected.remove(&index) {
            self.selected.insert(index);
        }
    }
}

/// Number of list rows to show for a terminal of `terminal_rows` lines.
pub fn list_rows(terminal_rows: usize) -> usize {
    terminal_rows
        .saturating_sub(CHROME_ROWS)
        .clamp(1, MAX_LIST_ROWS)
}

/// Slice of the list to render: centered on the cursor when possible and
/// clamped to the list bounds.
pub fn visible_window(len: usize, cursor: usize, rows: usize) -> Range<usize> {
    let rows = rows.max(1);
    let mut start = cursor.saturating_sub(rows / 2);
    let end = (start + rows).min(len);

    if end - start < rows && start > 0 {
        start = end.saturating_sub(rows);
    }

    start..end
}

/// Tally of a bulk run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BulkSummary {
    pub action: BulkAction,
    pub attempted: usize,
    pub succeeded: usize,
    /// `(handle, reason)` for every failed call.
    pub failures: Vec<(String, String)>,
}

impl BulkSummary {
    pub fn new(action: BulkAction) -> Self {
        Self {
            action,
            attempted: 0,
            succeeded: 0,
            failures: Vec::new(),
        }
    }

    pub fn record_success(&mut self) {
        self.attempted += 1;
        self.succeeded += 1;
    }

    pub fn record_failure(&mut self, handle: impl Into<String>, reason: impl Into<String>) {
        self.attempted += 1;
        self.failures.push((handle.into(), reason.into()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn workflow(len: usize) -> Workflow {
        Workflow::new(len, BulkAction::Unfollow).unwrap()
    }

    #[test]
    fn test_empty_list_has_no_workflow() {
        assert!(Workflow::new(0, BulkAction::Follow).is_none());
    }

    #[test]
    fn test_cursor_stays_in_bounds() {
        let mut wf = workflow(3);
        wf.handle(Key::Up);
        assert_eq!(wf.cursor(), 0);

        for _ in 0..10 {
            wf.handle(Key::Down);
        }
        assert_eq!(wf.cursor(), 2);

        wf.handle(Key::Char('k'));
        assert_eq!(wf.cursor(), 1);
        wf.handle(Key::Char('j'));
        wf.handle(Key::Char('J'));
        assert_eq!(wf.cursor(), 2);
    }

    #[test]
    fn test_toggle_twice_restores_selection() {
        let mut wf = workflow(4);
        wf.handle(Key::Down);
        wf.handle(Key::Char(' '));
        assert!(wf.is_selected(1));

        wf.handle(Key::Char(' '));
        assert!(wf.selected().is_empty());
    }

    #[test]
    fn test_select_all_then_clear() {
        let mut wf = workflow(5);
        wf.handle(Key::Char('a'));
        assert_eq!(wf.selected().len(), 5);

        wf.handle(Key::Char('N'));
        assert!(wf.selected().is_empty());
    }

    #[test]
    fn test_bulk_requires_selection() {
        let mut wf = workflow(2);
        assert_eq!(wf.handle(Key::Char('u')), Effect::None);
        assert_eq!(wf.mode(), &Mode::Browsing);
    }

    #[test]
    fn test_bulk_key_depends_on_action() {
        let mut wf = Workflow::new(2, BulkAction::Follow).unwrap();
        wf.handle(Key::Char(' '));

        assert_eq!(wf.handle(Key::Char('u')), Effect::None);
        assert_eq!(wf.handle(Key::Char('f')), Effect::Confirm(vec![0]));
    }

    #[test]
    fn test_confirm_declined_keeps_selection() {
        let mut wf = workflow(3);
        wf.handle(Key::Char(' '));
        wf.handle(Key::Down);
        wf.handle(Key::Down);
        wf.handle(Key::Char(' '));

        assert_eq!(wf.handle(Key::Char('u')), Effect::Confirm(vec![0, 2]));
        assert_eq!(wf.mode(), &Mode::ConfirmBulk(vec![0, 2]));

        assert_eq!(wf.handle(Key::Char('x')), Effect::None);
        assert_eq!(wf.mode(), &Mode::Browsing);
        assert_eq!(wf.selected().iter().copied().collect::<Vec<_>>(), vec![0, 2]);
    }

    #[test]
    fn test_confirm_accepted_executes_and_exits() {
        let mut wf = workflow(3);
        wf.handle(Key::Char('a'));
        wf.handle(Key::Char('U'));

        let effect = wf.handle(Key::Char('Y'));
        assert_eq!(
            effect,
            Effect::ExecuteBulk {
                indices: vec![0, 1, 2],
                action: BulkAction::Unfollow,
            }
        );
        assert!(wf.is_exited());
        assert_eq!(wf.handle(Key::Char('q')), Effect::None);
    }

    #[test]
    fn test_detail_single_action_returns_to_browsing() {
        let mut wf = workflow(3);
        wf.handle(Key::Down);
        assert_eq!(wf.handle(Key::Char('i')), Effect::LoadDetail(1));
        assert_eq!(wf.mode(), &Mode::Detail(1));

        assert_eq!(wf.handle(Key::Char('o')), Effect::OpenProfile(1));
        assert_eq!(wf.mode(), &Mode::Detail(1));

        assert_eq!(
            wf.handle(Key::Char('f')),
            Effect::Single {
                index: 1,
                action: BulkAction::Follow,
            }
        );
        assert_eq!(wf.mode(), &Mode::Browsing);
    }

    #[test]
    fn test_detail_back_and_failure() {
        let mut wf = workflow(2);
        wf.handle(Key::Char('i'));
        wf.handle(Key::Char('b'));
        assert_eq!(wf.mode(), &Mode::Browsing);

        wf.handle(Key::Char('i'));
        wf.detail_failed();
        assert_eq!(wf.mode(), &Mode::Browsing);
    }

    #[test]
    fn test_quit_exits() {
        let mut wf = workflow(1);
        assert_eq!(wf.handle(Key::Char('Q')), Effect::Exit);
        assert!(wf.is_exited());
    }

    #[test]
    fn test_list_rows() {
        assert_eq!(list_rows(40), 20);
        assert_eq!(list_rows(20), 12);
        assert_eq!(list_rows(5), 1);
    }

    #[test]
    fn test_visible_window_centers_on_cursor() {
        assert_eq!(visible_window(100, 50, 10), 45..55);
    }

    #[test]
    fn test_visible_window_clamps_at_edges() {
        assert_eq!(visible_window(100, 2, 10), 0..10);
        assert_eq!(visible_window(100, 98, 10), 90..100);
        assert_eq!(visible_window(4, 3, 10), 0..4);
    }

    #[test]
    fn test_visible_window_always_contains_cursor() {
        for len in 1..30 {
            for cursor in 0..len {
                let window = visible_window(len, cursor, 7);
                assert!(window.contains(&cursor), "len={len} cursor={cursor}");
                assert!(window.end <= len);
            }
        }
    }

    #[test]
    fn test_bulk_summary_counts() {
        let mut summary = BulkSummary::new(BulkAction::Follow);
        summary.record_success();
        summary.record_failure("bob", "HTTP 500");

        assert_eq!(summary.attempted, 2);
        assert_eq!(summary.succeeded, 1);
        assert_eq!(summary.failures, vec![("bob".to_string(), "HTTP 500".to_string())]);
    }
}
