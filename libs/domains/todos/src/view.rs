//! Pure view derivation: filter, search and sort a collection for display,
//! plus the aggregate numbers shown on the dashboard.

use serde::Serialize;
use std::cmp::Ordering;

use crate::models::{Filter, Priority, SortBy, Todo, ViewState};

/// Produce the ordered list to render. Never mutates `todos`.
pub fn derive_view(todos: &[Todo], view: &ViewState) -> Vec<Todo> {
    let query = view.search_query.trim().to_lowercase();

    let mut visible: Vec<Todo> = todos
        .iter()
        .filter(|todo| matches_filter(todo, view.filter))
        .filter(|todo| matches_search(todo, &query))
        .cloned()
        .collect();

    sort_todos(&mut visible, view.sort_by);
    visible
}

pub fn matches_filter(todo: &Todo, filter: Filter) -> bool {
    match filter {
        Filter::All => true,
        Filter::Active => !todo.completed,
        Filter::Completed => todo.completed,
    }
}

/// Case-insensitive substring match on title or description.
///
/// `query` must already be lowercased. An empty query matches everything.
pub fn matches_search(todo: &Todo, query: &str) -> bool {
    query.is_empty()
        || todo.title.to_lowercase().contains(query)
        || todo.description.to_lowercase().contains(query)
}

/// Stable sort by the single active key
pub fn sort_todos(todos: &mut [Todo], sort_by: SortBy) {
    match sort_by {
        SortBy::Date => todos.sort_by(compare_due_dates),
        SortBy::Priority => todos.sort_by(|a, b| b.priority.rank().cmp(&a.priority.rank())),
        SortBy::Alphabetical => {
            todos.sort_by_cached_key(|todo| todo.title.to_lowercase());
        }
    }
}

// Undated todos go after every dated one
fn compare_due_dates(a: &Todo, b: &Todo) -> Ordering {
    match (a.due_date, b.due_date) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PriorityBreakdown {
    pub low: usize,
    pub medium: usize,
    pub high: usize,
}

/// Aggregate counts for the dashboard
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DashboardStats {
    pub total: usize,
    pub completed: usize,
    pub pending: usize,
    /// High priority and not completed
    pub urgent: usize,
    pub by_priority: PriorityBreakdown,
}

impl DashboardStats {
    pub fn from_todos(todos: &[Todo]) -> Self {
        let mut stats = DashboardStats {
            total: todos.len(),
            ..Default::default()
        };

        for todo in todos {
            if todo.completed {
                stats.completed += 1;
            } else {
                stats.pending += 1;
                if todo.priority == Priority::High {
                    stats.urgent += 1;
                }
            }

            match todo.priority {
                Priority::Low => stats.by_priority.low += 1,
                Priority::Medium => stats.by_priority.medium += 1,
                Priority::High => stats.by_priority.high += 1,
            }
        }

        stats
    }

    /// Completed share in percent, 0 for an empty collection
    pub fn completion_rate(&self) -> u8 {
        if self.total == 0 {
            return 0;
        }
        ((self.completed * 100) / self.total) as u8
    }
}

/// Most recently created todos first
pub fn recent_todos(todos: &[Todo], limit: usize) -> Vec<Todo> {
    let mut recent = todos.to_vec();
    recent.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    recent.truncate(limit);
    recent
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NewTodo, TodoId};
    use chrono::{DateTime, TimeZone, Utc};

    fn at(hours: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_750_000_000 + hours * 3600, 0).unwrap()
    }

    fn todo(id: &str, title: &str) -> Todo {
        Todo::from_new(TodoId::new(id), NewTodo::new(title), at(0))
    }

    fn view(filter: Filter, sort_by: SortBy, query: &str) -> ViewState {
        ViewState {
            filter,
            sort_by,
            search_query: query.to_string(),
            ..Default::default()
        }
    }

    fn ids(todos: &[Todo]) -> Vec<&str> {
        todos.iter().map(|t| t.id.as_str()).collect()
    }

    fn completed_and_active() -> Vec<Todo> {
        let mut a = todo("a", "Alpha");
        a.completed = true;
        a.due_date = Some(at(1));
        let mut b = todo("b", "Bravo");
        b.due_date = Some(at(2));
        vec![a, b]
    }

    #[test]
    fn test_filter_stage() {
        let todos = completed_and_active();

        let active = derive_view(&todos, &view(Filter::Active, SortBy::Date, ""));
        assert_eq!(ids(&active), vec!["b"]);

        let completed = derive_view(&todos, &view(Filter::Completed, SortBy::Date, ""));
        assert_eq!(ids(&completed), vec!["a"]);

        let all = derive_view(&todos, &view(Filter::All, SortBy::Date, ""));
        assert_eq!(ids(&all), vec!["a", "b"]);
    }

    #[test]
    fn test_search_is_case_insensitive() {
        let mut todos = vec![todo("1", "Buy Groceries"), todo("2", "Call mom")];
        todos[1].description = "About the GROCERY list".to_string();
        todos.push(todo("3", "Dentist"));

        let found = derive_view(&todos, &view(Filter::All, SortBy::Date, "groc"));
        assert_eq!(ids(&found), vec!["1", "2"]);

        let none = derive_view(&todos, &view(Filter::All, SortBy::Date, "xyz"));
        assert!(none.is_empty());

        let all = derive_view(&todos, &view(Filter::All, SortBy::Date, "   "));
        assert_eq!(all.len(), 3);
    }

    #[test]
    fn test_sort_by_priority_ranks_high_first() {
        let mut low = todo("low", "l");
        low.priority = Priority::Low;
        let mut medium = todo("medium", "m");
        medium.priority = Priority::Medium;
        let mut high = todo("high", "h");
        high.priority = Priority::High;

        for input in [
            vec![low.clone(), medium.clone(), high.clone()],
            vec![high.clone(), low.clone(), medium.clone()],
            vec![medium.clone(), high.clone(), low.clone()],
        ] {
            let sorted = derive_view(&input, &view(Filter::All, SortBy::Priority, ""));
            assert_eq!(ids(&sorted), vec!["high", "medium", "low"]);
        }
    }

    #[test]
    fn test_sort_is_stable_for_ties() {
        let todos = vec![todo("1", "same"), todo("2", "Same"), todo("3", "SAME")];

        let by_title = derive_view(&todos, &view(Filter::All, SortBy::Alphabetical, ""));
        assert_eq!(ids(&by_title), vec!["1", "2", "3"]);

        let by_priority = derive_view(&todos, &view(Filter::All, SortBy::Priority, ""));
        assert_eq!(ids(&by_priority), vec!["1", "2", "3"]);

        let by_date = derive_view(&todos, &view(Filter::All, SortBy::Date, ""));
        assert_eq!(ids(&by_date), vec!["1", "2", "3"]);
    }

    #[test]
    fn test_sort_by_due_date_puts_undated_last() {
        let mut late = todo("late", "x");
        late.due_date = Some(at(48));
        let undated = todo("undated", "y");
        let mut soon = todo("soon", "z");
        soon.due_date = Some(at(1));

        let sorted = derive_view(&[late, undated, soon], &view(Filter::All, SortBy::Date, ""));
        assert_eq!(ids(&sorted), vec!["soon", "late", "undated"]);
    }

    #[test]
    fn test_alphabetical_ignores_case() {
        let todos = vec![todo("1", "banana"), todo("2", "Apple"), todo("3", "cherry")];
        let sorted = derive_view(&todos, &view(Filter::All, SortBy::Alphabetical, ""));
        assert_eq!(ids(&sorted), vec!["2", "1", "3"]);
    }

    #[test]
    fn test_derivation_is_pure() {
        let todos = completed_and_active();
        let snapshot = todos.clone();
        let state = view(Filter::Active, SortBy::Priority, "b");

        let first = derive_view(&todos, &state);
        let second = derive_view(&todos, &state);

        assert_eq!(first, second);
        assert_eq!(todos, snapshot);
    }

    #[test]
    fn test_dashboard_stats() {
        let mut todos = completed_and_active();
        let mut urgent = todo("c", "Urgent");
        urgent.priority = Priority::High;
        let mut done_high = todo("d", "Done high");
        done_high.priority = Priority::High;
        done_high.completed = true;
        todos.push(urgent);
        todos.push(done_high);

        let stats = DashboardStats::from_todos(&todos);
        assert_eq!(stats.total, 4);
        assert_eq!(stats.completed, 2);
        assert_eq!(stats.pending, 2);
        assert_eq!(stats.urgent, 1);
        assert_eq!(
            stats.by_priority,
            PriorityBreakdown {
                low: 0,
                medium: 2,
                high: 2
            }
        );
        assert_eq!(stats.completion_rate(), 50);
        assert_eq!(DashboardStats::from_todos(&[]).completion_rate(), 0);
    }

    #[test]
    fn test_recent_todos_newest_first() {
        let mut old = todo("old", "o");
        old.created_at = at(0);
        let mut newer = todo("newer", "n");
        newer.created_at = at(5);
        let mut newest = todo("newest", "n");
        newest.created_at = at(9);

        let recent = recent_todos(&[old, newest, newer], 2);
        assert_eq!(ids(&recent), vec!["newest", "newer"]);
    }
}
