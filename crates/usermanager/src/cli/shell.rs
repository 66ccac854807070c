//! Interactive shell over the record list controller.
//!
//! Each input line is one user action: type into the new-user form, add it,
//! pick a row to edit, change its fields, save or cancel, delete a row. The
//! screen is printed again after every action.

use std::io::{BufRead, Write};

use tracing::debug;

use crate::controller::RecordListController;
use crate::error::Result;
use crate::record::Field;
use crate::store::DocumentCollection;
use crate::view::{render, Format};

const HELP: &str = "\
Commands:
  set <field> <value>    type into the new-user form (field: name, email, age)
  add                    add the user in the form
  edit <id>              start editing a user
  field <field> <value>  change a field of the user being edited
  save                   save the user being edited
  cancel                 discard the edit
  delete <id>            delete a user
  reload                 fetch the list again
  show                   print the screen
  help                   show this help
  quit                   leave the shell";

/// One parsed shell line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellInput {
    /// Set a field of the new-user form.
    Set(Field, String),
    /// Create from the form.
    Add,
    /// Begin editing a record.
    Edit(String),
    /// Set a field of the edit draft.
    EditField(Field, String),
    /// Save the edit draft.
    Save,
    /// Discard the edit draft.
    Cancel,
    /// Delete a record.
    Delete(String),
    /// Fetch the list again.
    Reload,
    /// Print the screen.
    Show,
    /// Print the command list.
    Help,
    /// Leave the shell.
    Quit,
}

impl ShellInput {
    /// Parse one input line. Blank lines yield `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Returns a message describing what was wrong with the line.
    pub fn parse(line: &str) -> std::result::Result<Option<Self>, String> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }

        let (command, rest) = line
            .split_once(char::is_whitespace)
            .map_or((line, ""), |(c, r)| (c, r.trim()));

        let input = match command.to_ascii_lowercase().as_str() {
            "set" => {
                let (field, value) = field_and_value(rest)?;
                Self::Set(field, value)
            }
            "field" => {
                let (field, value) = field_and_value(rest)?;
                Self::EditField(field, value)
            }
            "add" => Self::Add,
            "edit" => Self::Edit(required_id(rest)?),
            "save" => Self::Save,
            "cancel" => Self::Cancel,
            "delete" | "rm" => Self::Delete(required_id(rest)?),
            "reload" => Self::Reload,
            "show" | "ls" => Self::Show,
            "help" | "?" => Self::Help,
            "quit" | "exit" => Self::Quit,
            other => return Err(format!("unknown command '{other}' (try 'help')")),
        };
        Ok(Some(input))
    }
}

fn field_and_value(rest: &str) -> std::result::Result<(Field, String), String> {
    let (field, value) = rest
        .split_once(char::is_whitespace)
        .map_or((rest, ""), |(f, v)| (f, v.trim()));
    if field.is_empty() {
        return Err("expected a field name (name, email or age)".to_string());
    }
    Ok((field.parse()?, value.to_string()))
}

fn required_id(rest: &str) -> std::result::Result<String, String> {
    match rest.split_whitespace().next() {
        Some(id) => Ok(id.to_string()),
        None => Err("expected a user id".to_string()),
    }
}

/// Run the shell until `quit` or end of input.
///
/// The list is loaded first, as when the screen appears. Action failures are
/// shown on the screen and do not end the session.
///
/// # Errors
///
/// Returns an error if reading input or writing output fails.
pub async fn run<C, R, W>(
    controller: &RecordListController<C>,
    input: R,
    mut output: W,
) -> Result<()>
where
    C: DocumentCollection,
    R: BufRead,
    W: Write,
{
    let _ = controller.mount().await;
    write_screen(controller, &mut output)?;
    writeln!(output, "Type 'help' for commands.")?;

    for line in input.lines() {
        let line = line?;
        let parsed = match ShellInput::parse(&line) {
            Ok(Some(parsed)) => parsed,
            Ok(None) => continue,
            Err(message) => {
                writeln!(output, "{message}")?;
                continue;
            }
        };
        debug!(input = ?parsed, "Shell input");

        match parsed {
            ShellInput::Quit => break,
            ShellInput::Help => {
                writeln!(output, "{HELP}")?;
                continue;
            }
            ShellInput::Show => {}
            ShellInput::Set(field, value) => controller.set_new_field(field, value),
            ShellInput::Add => {
                let _ = controller.create().await;
            }
            ShellInput::Edit(id) => {
                if !controller.begin_edit_id(&id) {
                    writeln!(output, "no user with id '{id}'")?;
                    continue;
                }
            }
            ShellInput::EditField(field, value) => {
                if !controller.set_edit_field(field, value) {
                    writeln!(output, "nothing is being edited (use 'edit <id>')")?;
                    continue;
                }
            }
            ShellInput::Save => {
                let editing = controller.snapshot().edit_draft.map(|edit| edit.id);
                match editing {
                    Some(id) => {
                        let _ = controller.save_edit(&id).await;
                    }
                    None => {
                        writeln!(output, "nothing is being edited (use 'edit <id>')")?;
                        continue;
                    }
                }
            }
            ShellInput::Cancel => controller.cancel_edit(),
            ShellInput::Delete(id) => {
                let _ = controller.delete(&id).await;
            }
            ShellInput::Reload => {
                let _ = controller.load().await;
            }
        }

        write_screen(controller, &mut output)?;
    }

    Ok(())
}

fn write_screen<C: DocumentCollection, W: Write>(
    controller: &RecordListController<C>,
    output: &mut W,
) -> Result<()> {
    let screen = render(&controller.snapshot(), Format::Plain)?;
    writeln!(output, "{screen}")?;
    Ok(())
}
