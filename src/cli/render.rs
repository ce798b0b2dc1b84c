//! Text rendering of pages.

use std::fmt::Write;

use crate::app::{App, Page};
use crate::editor::{AttrValue, Document, Format, Insert, Toolbar, EDITOR_PLACEHOLDER};
use crate::grammar::GrammarChecker;
use crate::notify::Toast;
use crate::views::{blog, home, login, register, BlogView, Header, HomeView, PostForm};

pub const HELP: &str = "\
Navigation:  home | login | register | write | open <id> | edit <id> | go <path> | show | quit
Forms:       set <field> <value> | title <text> | submit
Posts:       comment <text> | refresh | delete-post
Editor:      type <text> (\\n for a new line) | select <index> [length] | delete <index> <length>
             format <name> [value|none] | format clean | image <file> | issues | fix <n> | toolbar
Session:     menu | logout";

pub fn toasts(toasts: &[Toast]) -> String {
    let mut out = String::new();
    for toast in toasts {
        let _ = writeln!(out, "[{}] {}", toast.kind.label(), toast.message);
    }
    out
}

pub fn header(header: &Header) -> String {
    let items = header.items();
    let labels: Vec<String> = items.iter().map(|i| i.label()).collect();
    let mut out = format!("Bloggit | {}\n", labels.join(" | "));
    if header.is_menu_open() {
        for item in &items {
            match item.route() {
                Some(route) => {
                    let _ = writeln!(out, "  - {} (go {})", item.label(), route);
                }
                None => {
                    let _ = writeln!(out, "  - {}", item.label());
                }
            }
        }
    }
    out
}

pub fn app(app: &App) -> String {
    let mut out = header(app.header());
    out.push('\n');
    let body = match app.page() {
        Page::Home(view) => home_page(view),
        Page::Login(form) => {
            let mut out = String::from("Login\n");
            let _ = writeln!(out, "  email:    {}", form.email);
            let _ = writeln!(out, "  password: {}", mask(&form.password));
            let _ = writeln!(out, "{} Register here: register", login::REGISTER_PROMPT);
            out
        }
        Page::Register(form) => {
            let mut out = format!("{}\n", register::HEADING);
            let _ = writeln!(out, "  name:     {}", form.name);
            let _ = writeln!(out, "  username: {}", form.username);
            let _ = writeln!(out, "  email:    {}", form.email);
            let _ = writeln!(out, "  password: {}", mask(&form.password));
            let _ = writeln!(out, "  role:     {}", form.role.as_str());
            let _ = writeln!(out, "{} Login here: login", register::LOGIN_PROMPT);
            out
        }
        Page::Blog(view) => blog_page(view),
        Page::Form(form) => post_form(&**form),
        Page::NotFound(path) => format!("Page not found: {}\n", path),
    };
    out.push_str(&body);
    out
}

fn mask(secret: &str) -> String {
    "*".repeat(secret.chars().count())
}

fn home_page(view: &HomeView) -> String {
    let mut out = String::new();
    match view {
        HomeView::Landing => {
            let _ = writeln!(out, "{}", home::LANDING_HEADLINE);
            let _ = writeln!(out, "{}", home::LANDING_TAGLINE);
            let _ = writeln!(out, "{} -> /register", home::GET_STARTED);
        }
        HomeView::Feed(posts) => {
            let _ = writeln!(out, "{}", home::FEED_HEADING);
            if posts.is_empty() {
                let _ = writeln!(out, "{}", home::EMPTY_FEED);
            }
            for post in posts {
                let _ = writeln!(out, "\n{}", post.title);
                match &post.published_on {
                    Some(date) => {
                        let _ = writeln!(out, "  by {} on {}", post.author, date);
                    }
                    None => {
                        let _ = writeln!(out, "  by {}", post.author);
                    }
                }
                let _ = writeln!(out, "  {}", post.snippet);
                let _ = writeln!(out, "  open {}", post.id);
            }
        }
    }
    out
}

fn blog_page(view: &BlogView) -> String {
    let Some(post) = &view.post else {
        return format!("{}\n", blog::NOT_FOUND);
    };

    let mut out = String::from("<- Back to all posts (home)\n\n");
    let _ = writeln!(out, "{}", post.title);
    let _ = write!(out, "{}", post.author_name());
    if let Some(date) = post.published_on() {
        let _ = write!(out, " | {}", date);
    }
    out.push_str("\n\n");
    out.push_str(&document(&Document::from_html(&post.content)));
    let _ = writeln!(out, "\n{}", view.responses_heading());

    if view.can_comment() {
        let draft = if view.draft.is_empty() {
            blog::COMMENT_PLACEHOLDER
        } else {
            view.draft.as_str()
        };
        let _ = writeln!(out, "  > {}  (comment <text>)", draft);
    } else {
        let _ = writeln!(out, "  {}", blog::COMMENT_PROMPT);
    }

    if view.comments.is_empty() {
        let _ = writeln!(out, "{}", blog::NO_RESPONSES);
    }
    for entry in &view.comments {
        let comment = entry.comment();
        let _ = write!(out, "({}) {}", comment.initial(), comment.author_name());
        if entry.is_provisional() {
            out.push_str(" (just now)");
        }
        let _ = writeln!(out, "\n    {}", comment.text);
    }
    out
}

fn post_form<C: GrammarChecker>(form: &PostForm<C>) -> String {
    let editor = form.editor();
    let mut out = format!("{}\n", form.mode.heading());
    let _ = writeln!(out, "Title: {}", form.title);
    let _ = writeln!(out, "Content:");
    if editor.is_blank() {
        let _ = writeln!(out, "  ({})", EDITOR_PLACEHOLDER);
    } else {
        for line in document(editor.document()).lines() {
            let _ = writeln!(out, "  {}", line);
        }
    }
    match editor.selection() {
        Some(sel) => {
            let _ = writeln!(
                out,
                "Selection: {}+{} of {}",
                sel.index,
                sel.length,
                editor.len()
            );
        }
        None => {
            let _ = writeln!(out, "Length: {}", editor.len());
        }
    }
    out.push_str(&grammar_panel(form));
    let _ = writeln!(out, "[{}] (submit)", form.mode.submit_label());
    out
}

/// The issue list shown beside the editor.
pub fn grammar_panel<C: GrammarChecker>(form: &PostForm<C>) -> String {
    let annotations = form.annotations();
    if annotations.is_empty() {
        return String::new();
    }
    let mut out = format!("Grammar Issues ({})\n", annotations.len());
    for a in annotations {
        let _ = writeln!(out, "  [{}] {}", a.index + 1, a.message);
        if let Some(suggestion) = a.suggestion {
            let _ = writeln!(out, "      Suggestion: {}  (fix {})", suggestion, a.index + 1);
        }
    }
    out
}

pub fn toolbar(toolbar: &Toolbar) -> String {
    toolbar
        .groups
        .iter()
        .map(|group| {
            group
                .iter()
                .map(|c| c.label())
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect::<Vec<_>>()
        .join(" | ")
}

/// Plain-text rendering of a document. Grammar marks show as `[[...]]`.
pub fn document(doc: &Document) -> String {
    let mut out = String::new();
    let mut ordinal = 0;
    for line in doc.lines() {
        let indent = line
            .block_value(Format::Indent)
            .and_then(AttrValue::as_str)
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(0);
        out.push_str(&"  ".repeat(indent));

        match line.block_value(Format::List).and_then(AttrValue::as_str) {
            Some("ordered") => {
                ordinal += 1;
                let _ = write!(out, "{}. ", ordinal);
            }
            Some(_) => {
                ordinal = 0;
                out.push_str("* ");
            }
            None => ordinal = 0,
        }
        if let Some(level) = line
            .block_value(Format::Header)
            .and_then(AttrValue::as_str)
            .and_then(|v| v.parse::<usize>().ok())
        {
            let _ = write!(out, "{} ", "#".repeat(level));
        }
        if line.block.contains_key(&Format::Blockquote) {
            out.push_str("> ");
        }
        if line.block.contains_key(&Format::CodeBlock) {
            out.push_str("    ");
        }

        for run in &line.runs {
            let marked = run.attributes.contains_key(&Format::GrammarError);
            if marked {
                out.push_str("[[");
            }
            match &run.insert {
                Insert::Text(text) => out.push_str(text),
                Insert::Embed(embed) => {
                    let _ = write!(out, "[{}: {}]", embed.format(), embed.value());
                }
            }
            if marked {
                out.push_str("]]");
            }
        }
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_rendering() {
        let doc = Document::from_html(
            "<h2>Plan</h2><ol><li>one</li><li>two</li></ol>\
             <blockquote>wise</blockquote><p>see <img src=\"http://x/y.png\"></p>",
        );
        assert_eq!(
            document(&doc),
            "## Plan\n1. one\n2. two\n> wise\nsee [image: http://x/y.png]\n"
        );
    }

    #[test]
    fn test_grammar_marks_are_bracketed() {
        let doc = Document::from_html(
            "<p>Walk <span class=\"grammar-error\" title=\"Grammar Issue\">ot</span> on</p>",
        );
        assert_eq!(document(&doc), "Walk [[ot]] on\n");
    }

    #[test]
    fn test_open_menu_lists_targets() {
        let mut menu = Header::new(None);
        assert_eq!(header(&menu), "Bloggit | Login | Register\n");

        menu.toggle_menu();
        let out = header(&menu);
        assert!(out.contains("  - Login (go /login)\n"));
        assert!(out.contains("  - Register (go /register)\n"));
    }

    #[test]
    fn test_toolbar_line() {
        let line = toolbar(&Toolbar::standard());
        assert!(line.starts_with("font size | bold italic underline strike | color background"));
        assert!(line.ends_with("link image | clean"));
    }
}
