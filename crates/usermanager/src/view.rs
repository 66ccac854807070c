//! Text rendering of the user manager screen.
//!
//! The screen is the new-user form followed by exactly one of three panes:
//! a loading notice, the last error message, or the record list. Loading
//! wins over an error, and an error hides the list.

use std::fmt::Write as _;

use serde::Serialize;

use crate::controller::ControllerState;
use crate::error::Result;
use crate::record::{Draft, Field};

/// Screen title.
pub const TITLE: &str = "USER MANAGER";

/// One row of the record list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Row {
    /// Identifier of the record.
    pub id: String,
    /// Fields shown; the edit draft's fields when `editing` is set.
    #[serde(flatten)]
    pub fields: Draft,
    /// Whether this row is being edited.
    pub editing: bool,
}

/// The pane under the form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ViewState {
    /// A remote call is outstanding.
    Loading,
    /// The last action failed.
    Error {
        /// Message of the failed action.
        message: String,
    },
    /// The record list.
    List {
        /// One row per record, in list order.
        rows: Vec<Row>,
    },
}

impl ViewState {
    /// Project controller state onto the pane that should be visible.
    #[must_use]
    pub fn from_state(state: &ControllerState) -> Self {
        if state.busy {
            return Self::Loading;
        }
        if let Some(message) = &state.error {
            return Self::Error {
                message: message.clone(),
            };
        }

        let rows = state
            .records
            .iter()
            .map(|record| match &state.edit_draft {
                Some(edit) if edit.id == record.id => Row {
                    id: record.id.clone(),
                    fields: edit.fields.clone(),
                    editing: true,
                },
                _ => Row {
                    id: record.id.clone(),
                    fields: record.fields.clone(),
                    editing: false,
                },
            })
            .collect();
        Self::List { rows }
    }
}

/// How the screen is printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Format {
    /// Form and list as plain lines.
    #[default]
    Plain,
    /// Record list as an aligned table.
    Table,
    /// Machine-readable JSON.
    Json,
}

#[derive(Serialize)]
struct Screen<'a> {
    title: &'static str,
    form: &'a Draft,
    view: &'a ViewState,
}

/// Render the whole screen for `state`.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn render(state: &ControllerState, format: Format) -> Result<String> {
    let view = ViewState::from_state(state);
    match format {
        Format::Json => Ok(serde_json::to_string_pretty(&Screen {
            title: TITLE,
            form: &state.new_draft,
            view: &view,
        })?),
        Format::Plain => Ok(render_plain(&state.new_draft, &view)),
        Format::Table => Ok(render_table(&view)),
    }
}

fn render_plain(form: &Draft, view: &ViewState) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{TITLE}");
    let _ = writeln!(out);
    let _ = writeln!(out, "New user");
    for field in Field::ALL {
        let _ = writeln!(out, "  {:<6} {}", format!("{field}:"), form.get(field));
    }
    let _ = writeln!(out);
    render_pane(&mut out, view, |out, rows| {
        for row in rows {
            let marker = if row.editing { "*" } else { "-" };
            let _ = writeln!(
                out,
                "{marker} {}  {} | {} | {}",
                row.id, row.fields.name, row.fields.email, row.fields.age
            );
        }
    });
    out
}

fn render_table(view: &ViewState) -> String {
    let mut out = String::new();
    render_pane(&mut out, view, |out, rows| {
        let headers = ["ID", "NAME", "EMAIL", "AGE"];
        let cells: Vec<[&str; 4]> = rows
            .iter()
            .map(|r| {
                [
                    r.id.as_str(),
                    r.fields.name.as_str(),
                    r.fields.email.as_str(),
                    r.fields.age.as_str(),
                ]
            })
            .collect();

        let mut widths = headers.map(str::len);
        for row in &cells {
            for (width, cell) in widths.iter_mut().zip(row) {
                *width = (*width).max(cell.chars().count());
            }
        }

        let line = |out: &mut String, row: [&str; 4], editing: bool| {
            let mut text = String::new();
            for (i, (cell, width)) in row.iter().zip(widths).enumerate() {
                if i > 0 {
                    text.push_str("  ");
                }
                let _ = write!(text, "{cell:<width$}");
            }
            if editing {
                text.push_str("  (editing)");
            }
            let _ = writeln!(out, "{}", text.trim_end());
        };

        line(out, headers, false);
        for (row, cells) in rows.iter().zip(cells) {
            line(out, cells, row.editing);
        }
    });
    out
}

fn render_pane(out: &mut String, view: &ViewState, list: impl FnOnce(&mut String, &[Row])) {
    match view {
        ViewState::Loading => {
            let _ = writeln!(out, "Loading...");
        }
        ViewState::Error { message } => {
            let _ = writeln!(out, "Error: {message}");
        }
        ViewState::List { rows } if rows.is_empty() => {
            let _ = writeln!(out, "(no users)");
        }
        ViewState::List { rows } => list(out, rows),
    }
}
