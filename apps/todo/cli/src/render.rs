//! Terminal output: plain text with a theme-dependent palette, or JSON.

use crossterm::style::{style, Color, Stylize};
use domain_todos::{Dashboard, Theme, Todo, TodoResult, ViewState};
use serde::Serialize;
use std::io::IsTerminal;

pub const DATE_FORMAT: &str = "%Y-%m-%d %H:%M";

#[derive(Debug, Clone, Copy)]
enum Style {
    Accent,
    Muted,
    Urgent,
    Done,
}

/// Foreground colors per theme
struct Palette {
    accent: Color,
    muted: Color,
    urgent: Color,
    done: Color,
}

impl Palette {
    fn for_theme(theme: Theme) -> Self {
        match theme {
            Theme::Light => Palette {
                accent: Color::DarkBlue,
                muted: Color::DarkGrey,
                urgent: Color::DarkRed,
                done: Color::DarkGreen,
            },
            Theme::Dark => Palette {
                accent: Color::Cyan,
                muted: Color::Grey,
                urgent: Color::Red,
                done: Color::Green,
            },
        }
    }

    fn color(&self, style: Style) -> Color {
        match style {
            Style::Accent => self.accent,
            Style::Muted => self.muted,
            Style::Urgent => self.urgent,
            Style::Done => self.done,
        }
    }
}

pub struct Output {
    json: bool,
    color: bool,
}

impl Output {
    pub fn new(json: bool) -> Self {
        let color =
            !json && std::io::stdout().is_terminal() && std::env::var_os("NO_COLOR").is_none();
        Self { json, color }
    }

    #[cfg(test)]
    fn plain() -> Self {
        Self {
            json: false,
            color: false,
        }
    }

    fn paint(&self, theme: Theme, kind: Style, text: &str) -> String {
        if !self.color {
            return text.to_string();
        }
        style(text)
            .with(Palette::for_theme(theme).color(kind))
            .to_string()
    }

    fn emit_json<T: Serialize>(&self, value: &T) -> TodoResult<()> {
        println!("{}", serde_json::to_string_pretty(value)?);
        Ok(())
    }

    /// One line per todo
    pub fn todo_line(&self, todo: &Todo, theme: Theme) -> String {
        let mut line = if todo.completed {
            format!("{} {}", self.paint(theme, Style::Done, "[x]"), todo.title)
        } else {
            format!("[ ] {}", todo.title)
        };

        let priority = format!("!{}", todo.priority);
        let style = if todo.priority == domain_todos::Priority::High && !todo.completed {
            Style::Urgent
        } else {
            Style::Muted
        };
        line.push_str(&format!("  {}", self.paint(theme, style, &priority)));

        if let Some(due) = todo.due_date {
            line.push_str(&format!("  due {}", due.format(DATE_FORMAT)));
        }
        if let Some(category) = &todo.category {
            let category = format!("@{}", category);
            line.push_str(&format!("  {}", self.paint(theme, Style::Accent, &category)));
        }
        if !todo.tags.is_empty() {
            let tags: Vec<String> = todo.tags.iter().map(|t| format!("#{}", t)).collect();
            line.push_str(&format!("  {}", tags.join(" ")));
        }
        line.push_str(&format!("  {}", self.paint(theme, Style::Muted, todo.id.as_str())));
        line
    }

    /// `scope` names a direct query; without one the saved view is described
    pub fn todo_list(
        &self,
        todos: &[Todo],
        view: &ViewState,
        scope: Option<&str>,
    ) -> TodoResult<()> {
        if self.json {
            return self.emit_json(&todos);
        }

        let header = list_header(todos.len(), view, scope);
        println!("{}", self.paint(view.theme, Style::Muted, &header));

        if todos.is_empty() {
            println!("Nothing to show");
        }
        for todo in todos {
            println!("{}", self.todo_line(todo, view.theme));
        }
        Ok(())
    }

    pub fn todo_detail(&self, todo: &Todo, theme: Theme) -> TodoResult<()> {
        if self.json {
            return self.emit_json(todo);
        }

        println!("{}", self.todo_line(todo, theme));
        if !todo.description.is_empty() {
            println!("  {}", todo.description);
        }
        if let Some(notes) = &todo.notes {
            println!("  notes: {}", notes);
        }
        if todo.reminder {
            println!("  reminder: on");
        }
        println!(
            "  {}",
            self.paint(
                theme,
                Style::Muted,
                &format!(
                    "created {}  updated {}",
                    todo.created_at.format(DATE_FORMAT),
                    todo.updated_at.format(DATE_FORMAT)
                )
            )
        );
        Ok(())
    }

    /// Confirmation after a mutation
    pub fn changed(&self, verb: &str, todo: &Todo, theme: Theme) -> TodoResult<()> {
        if self.json {
            return self.emit_json(todo);
        }
        println!("{} {}", verb, self.todo_line(todo, theme));
        Ok(())
    }

    pub fn deleted(&self, id: &str) -> TodoResult<()> {
        if self.json {
            return self.emit_json(&serde_json::json!({ "deleted": id }));
        }
        println!("Deleted {}", id);
        Ok(())
    }

    /// Unknown ids are a no-op, not a failure
    pub fn not_found(&self, id: &str) -> TodoResult<()> {
        if self.json {
            return self.emit_json(&serde_json::json!({ "notFound": id }));
        }
        println!("Todo {} not found", id);
        Ok(())
    }

    pub fn view(&self, view: &ViewState) -> TodoResult<()> {
        if self.json {
            return self.emit_json(view);
        }
        println!(
            "filter: {}  sort: {}  search: \"{}\"  theme: {}",
            view.filter, view.sort_by, view.search_query, view.theme
        );
        Ok(())
    }

    pub fn theme(&self, theme: Theme) -> TodoResult<()> {
        if self.json {
            return self.emit_json(&serde_json::json!({ "theme": theme }));
        }
        println!("Theme: {}", self.paint(theme, Style::Accent, &theme.to_string()));
        Ok(())
    }

    pub fn dashboard(&self, dashboard: &Dashboard, theme: Theme) -> TodoResult<()> {
        if self.json {
            return self.emit_json(dashboard);
        }
        println!("{}", self.dashboard_summary(dashboard, theme));
        if !dashboard.recent.is_empty() {
            println!("Recent:");
            for todo in &dashboard.recent {
                println!("  {}", self.todo_line(todo, theme));
            }
        }
        Ok(())
    }

    fn dashboard_summary(&self, dashboard: &Dashboard, theme: Theme) -> String {
        let stats = &dashboard.stats;
        format!(
            "Total {}  Completed {}  Pending {}  {}  ({}% done)\nBy priority: high {}  medium {}  low {}",
            stats.total,
            stats.completed,
            stats.pending,
            self.paint(theme, Style::Urgent, &format!("Urgent {}", stats.urgent)),
            stats.completion_rate(),
            stats.by_priority.high,
            stats.by_priority.medium,
            stats.by_priority.low,
        )
    }

    pub fn status(&self, status: &str) -> TodoResult<()> {
        if self.json {
            return self.emit_json(&serde_json::json!({ "status": status }));
        }
        println!("{}", status);
        Ok(())
    }
}

fn list_header(count: usize, view: &ViewState, scope: Option<&str>) -> String {
    let scope = match scope {
        Some(scope) => scope.to_string(),
        None if view.search_query.is_empty() => {
            format!("filter: {}  sort: {}", view.filter, view.sort_by)
        }
        None => format!(
            "filter: {}  sort: {}  search: \"{}\"",
            view.filter, view.sort_by, view.search_query
        ),
    };
    format!("{} todo(s)  {}", count, scope)
}
