//! Terminal front end.
//!
//! One command per line. Commands either move between routes or act on the page that is open;
//! anything a page cannot do is a validation error printed back to the user.

pub mod render;

use std::path::PathBuf;

use crate::app::{App, Page};
use crate::editor::ToolbarCommand;
use crate::errors::AppError;
use crate::grammar::FixOutcome;
use crate::models::ImageFile;
use crate::routes::Route;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    Quit,
    Show,
    Go(Route),
    Set { field: String, value: String },
    Submit,
    Logout,
    Menu,
    Comment(String),
    Refresh,
    DeletePost,
    Type(String),
    Select { index: usize, length: usize },
    Delete { index: usize, length: usize },
    Format(ToolbarCommand),
    Image(PathBuf),
    /// Zero-based issue index
    Fix(usize),
    Issues,
    Toolbar,
}

/// Whether the loop should keep reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

fn invalid(message: impl Into<String>) -> AppError {
    AppError::Validation(message.into())
}

fn number(arg: Option<&str>, what: &str) -> Result<usize, AppError> {
    arg.ok_or_else(|| invalid(format!("Missing {}", what)))?
        .parse()
        .map_err(|_| invalid(format!("The {} must be a number", what)))
}

/// Turn `\n` into a line break and `\\` into a backslash.
fn unescape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

impl Command {
    pub fn parse(line: &str) -> Result<Self, AppError> {
        let line = line.trim();
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };
        let mut args = rest.split_whitespace();
        let rest_or = |what: &str| -> Result<String, AppError> {
            if rest.is_empty() {
                Err(invalid(format!("Missing {}", what)))
            } else {
                Ok(rest.to_string())
            }
        };

        let command = match word {
            "" | "show" => Command::Show,
            "help" | "?" => Command::Help,
            "quit" | "exit" => Command::Quit,
            "go" => Command::Go(Route::parse(&rest_or("path")?)),
            "home" => Command::Go(Route::Home),
            "write" => Command::Go(Route::Create),
            "login" => Command::Go(Route::Login),
            "register" => Command::Go(Route::Register),
            "open" => Command::Go(Route::Post(rest_or("post id")?)),
            "edit" => Command::Go(Route::Edit(rest_or("post id")?)),
            "set" => {
                let field = args
                    .next()
                    .ok_or_else(|| invalid("Missing field name"))?
                    .to_string();
                let value = rest[field.len()..].trim().to_string();
                Command::Set { field, value }
            }
            "title" => Command::Set {
                field: "title".to_string(),
                value: rest.to_string(),
            },
            "submit" | "save" => Command::Submit,
            "logout" => Command::Logout,
            "menu" => Command::Menu,
            "comment" => Command::Comment(rest.to_string()),
            "refresh" => Command::Refresh,
            "delete-post" => Command::DeletePost,
            "type" => Command::Type(unescape(&rest_or("text")?)),
            "select" => Command::Select {
                index: number(args.next(), "index")?,
                length: args.next().map_or(Ok(0), |a| number(Some(a), "length"))?,
            },
            "delete" => Command::Delete {
                index: number(args.next(), "index")?,
                length: number(args.next(), "length")?,
            },
            "format" => {
                let name = args.next().ok_or_else(|| invalid("Missing format name"))?;
                let value = rest[name.len()..].trim();
                let value = (!value.is_empty()).then_some(value);
                Command::Format(ToolbarCommand::parse(name, value)?)
            }
            "image" => Command::Image(PathBuf::from(rest_or("file path")?)),
            "fix" => {
                let n = number(args.next(), "issue number")?;
                let index = n
                    .checked_sub(1)
                    .ok_or_else(|| invalid("Issues are numbered from 1"))?;
                Command::Fix(index)
            }
            "issues" => Command::Issues,
            "toolbar" => Command::Toolbar,
            other => {
                return Err(invalid(format!(
                    "Unknown command: {}. Type help for a list.",
                    other
                )))
            }
        };
        Ok(command)
    }
}

/// Run one command against the app. Output beyond toasts is printed by the caller.
pub async fn execute(app: &mut App, command: Command) -> Result<Flow, AppError> {
    let state = app.state().clone();

    match command {
        Command::Quit => return Ok(Flow::Quit),
        Command::Help | Command::Show | Command::Issues | Command::Toolbar => {}
        Command::Go(route) => app.navigate(route).await,
        Command::Logout => app.logout().await,
        Command::Menu => app.header_mut().toggle_menu(),
        Command::Refresh => match app.page_mut() {
            Page::Blog(view) => view.refresh_comments(&state).await,
            _ => {
                let route = app.route().clone();
                app.navigate(route).await;
            }
        },
        Command::Set { field, value } => {
            let accepted = match app.page_mut() {
                Page::Login(form) => form.set(&field, &value),
                Page::Register(form) => form.set(&field, &value),
                Page::Form(form) if field == "title" => {
                    form.set_title(value);
                    true
                }
                Page::Blog(view) if field == "comment" => {
                    view.draft = value;
                    true
                }
                _ => false,
            };
            if !accepted {
                return Err(invalid(format!("There is no {} field here", field)));
            }
        }
        Command::Submit => {
            let navigation = match app.page_mut() {
                Page::Login(form) => form.submit(&state).await,
                Page::Register(form) => form.submit(&state).await,
                Page::Form(form) => form.submit(&state).await,
                Page::Blog(view) => {
                    // failures are already toasted
                    let _ = view.submit_comment(&state).await;
                    None
                }
                _ => return Err(invalid("There is nothing to submit here")),
            };
            app.follow(navigation).await;
        }
        Command::Comment(text) => {
            let Page::Blog(view) = app.page_mut() else {
                return Err(invalid("Open a post to comment on it"));
            };
            view.draft = text;
            let _ = view.submit_comment(&state).await;
        }
        Command::DeletePost => {
            let Page::Blog(view) = app.page_mut() else {
                return Err(invalid("Open a post to delete it"));
            };
            let navigation = view.delete_post(&state).await;
            app.follow(navigation).await;
        }
        Command::Type(_)
        | Command::Select { .. }
        | Command::Delete { .. }
        | Command::Format(_)
        | Command::Image(_)
        | Command::Fix(_) => {
            let Page::Form(form) = app.page_mut() else {
                return Err(invalid("Open the editor first (write or edit <id>)"));
            };
            match command {
                Command::Type(text) => form.type_text(&text),
                Command::Select { index, length } => form.select(index, length),
                Command::Delete { index, length } => form.delete(index, length),
                Command::Format(cmd) => form.apply(cmd)?,
                Command::Image(path) => {
                    let image = ImageFile::from_path(&path).await?;
                    let _ = form.insert_image(&state.api, image, &state.notifier).await;
                }
                Command::Fix(index) => match form.fix(index) {
                    FixOutcome::Applied { .. } => {}
                    FixOutcome::Stale => state
                        .notifier
                        .info("That suggestion no longer matches the text."),
                    FixOutcome::NoSuggestion => {
                        state.notifier.info("There is no suggestion for that issue.")
                    }
                    FixOutcome::Missing => {
                        return Err(invalid(format!("There is no issue {}", index + 1)))
                    }
                },
                _ => {}
            }
        }
    }
    Ok(Flow::Continue)
}
