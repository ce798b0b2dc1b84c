//! Rich-text editor adapter.
//!
//! Wraps a [`Document`] with a selection, the toolbar, the image-upload command, and the inline
//! grammar marks. Views own an [`Editor`]; every mutation returns enough for the caller to feed the
//! grammar workflow.

mod document;
mod format;
mod markup;

use std::future::Future;

use document::Embed;
pub use document::{Document, Insert};
use format::{Attributes, Scope};
pub use format::{AttrValue, Format};
pub use markup::strip_tags;

use crate::errors::AppError;
use crate::models::ImageFile;
use crate::notify::Notifier;

/// Shown while the document is empty.
pub const EDITOR_PLACEHOLDER: &str = "Start Writing!";

/// Somewhere to put images; returns the public URL of the stored file.
pub trait ImageUploader: Send + Sync {
    fn upload(&self, image: ImageFile) -> impl Future<Output = Result<String, AppError>> + Send;
}

impl Document {
    pub fn to_html(&self) -> String {
        markup::to_html(self)
    }

    pub fn from_html(html: &str) -> Self {
        markup::from_html(html)
    }
}

/// Cursor (length 0) or highlighted range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Selection {
    pub index: usize,
    pub length: usize,
}

impl Selection {
    pub fn cursor(index: usize) -> Self {
        Self { index, length: 0 }
    }

    fn after_insert(self, at: usize, count: usize) -> Self {
        let shift = |i: usize| if i >= at { i + count } else { i };
        let start = shift(self.index);
        let end = shift(self.index + self.length);
        Self {
            index: start,
            length: end - start,
        }
    }

    fn after_delete(self, at: usize, count: usize) -> Self {
        let shift = |i: usize| {
            if i <= at {
                i
            } else if i >= at + count {
                i - count
            } else {
                at
            }
        };
        let start = shift(self.index);
        let end = shift(self.index + self.length);
        Self {
            index: start,
            length: end - start,
        }
    }
}

/// A toolbar control.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    /// Drop-down of values
    Picker(Format),
    /// On/off button
    Toggle(Format),
    /// Button setting a fixed value
    Preset(Format, &'static str),
    Link,
    Image,
    Clean,
}

impl Control {
    pub fn label(&self) -> String {
        match self {
            Control::Picker(f) | Control::Toggle(f) => f.name().to_string(),
            Control::Preset(f, v) => format!("{}={}", f.name(), v),
            Control::Link => "link".to_string(),
            Control::Image => "image".to_string(),
            Control::Clean => "clean".to_string(),
        }
    }
}

/// Toolbar layout, in groups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toolbar {
    pub groups: Vec<Vec<Control>>,
}

impl Toolbar {
    pub fn standard() -> Self {
        Self {
            groups: vec![
                vec![Control::Picker(Format::Font), Control::Picker(Format::Size)],
                vec![
                    Control::Toggle(Format::Bold),
                    Control::Toggle(Format::Italic),
                    Control::Toggle(Format::Underline),
                    Control::Toggle(Format::Strike),
                ],
                vec![
                    Control::Picker(Format::Color),
                    Control::Picker(Format::Background),
                ],
                vec![
                    Control::Preset(Format::Header, "1"),
                    Control::Preset(Format::Header, "2"),
                    Control::Toggle(Format::Blockquote),
                    Control::Toggle(Format::CodeBlock),
                ],
                vec![
                    Control::Preset(Format::List, "ordered"),
                    Control::Preset(Format::List, "bullet"),
                ],
                vec![Control::Link, Control::Image],
                vec![Control::Clean],
            ],
        }
    }

    #[cfg(test)]
    pub fn controls(&self) -> impl Iterator<Item = &Control> {
        self.groups.iter().flatten()
    }
}

/// What a toolbar press asks the editor to do. Images go through [`Editor::insert_image`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolbarCommand {
    /// Set a format, or clear it with `None`
    Set(Format, Option<AttrValue>),
    /// Flip a format on or off at the selection
    Toggle(Format),
    Clean,
}

impl ToolbarCommand {
    /// Parse `bold`, `header 2`, `link https://...`, `clean`, or `color none`.
    pub fn parse(name: &str, value: Option<&str>) -> Result<Self, AppError> {
        if name == "clean" {
            return Ok(ToolbarCommand::Clean);
        }
        let format = Format::from_name(name)
            .ok_or_else(|| AppError::Validation(format!("Unknown format: {}", name)))?;
        if format.scope() == Scope::Embed {
            return Err(AppError::Validation(format!(
                "{} is inserted, not applied as a format",
                format
            )));
        }
        match value {
            Some("none" | "off") => Ok(ToolbarCommand::Set(format, None)),
            Some(v) if format.takes_value() => {
                Ok(ToolbarCommand::Set(format, Some(AttrValue::from(v))))
            }
            None if format.takes_value() => Err(AppError::Validation(format!(
                "The {} format needs a value",
                format
            ))),
            _ => Ok(ToolbarCommand::Toggle(format)),
        }
    }
}

/// Document plus selection.
#[derive(Debug, Clone, Default)]
pub struct Editor {
    document: Document,
    selection: Option<Selection>,
}

impl Editor {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn from_html(html: &str) -> Self {
        Self {
            document: Document::from_html(html),
            selection: None,
        }
    }

    /// Replace the contents; the selection is dropped.
    pub fn load_html(&mut self, html: &str) {
        self.document = Document::from_html(html);
        self.selection = None;
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Markup for saving. Grammar marks are not persisted.
    pub fn html(&self) -> String {
        self.document
            .without_format(Format::GrammarError)
            .to_html()
    }

    pub fn plain_text(&self) -> String {
        self.document.plain_text()
    }

    pub fn len(&self) -> usize {
        self.document.len()
    }

    pub fn is_blank(&self) -> bool {
        self.document.is_blank()
    }

    pub fn text_in(&self, index: usize, length: usize) -> Option<String> {
        self.document.text_in(index, length)
    }

    pub fn selection(&self) -> Option<Selection> {
        self.selection
    }

    /// Select a range, clamped to the document.
    pub fn set_selection(&mut self, index: usize, length: usize) {
        let len = self.document.len();
        let index = index.min(len - 1);
        let length = length.min(len - index);
        self.selection = Some(Selection { index, length });
    }

    /// Where typing goes: the selection start, else the end of the text.
    pub fn cursor(&self) -> usize {
        self.selection
            .map(|s| s.index)
            .unwrap_or(self.document.len() - 1)
    }

    /// Type at the cursor, replacing any highlighted text. The new text continues the formats of
    /// the character before it.
    pub fn type_text(&mut self, text: &str) -> usize {
        let at = self.cursor();
        if let Some(sel) = self.selection.filter(|s| s.length > 0) {
            self.delete(sel.index, sel.length);
        }
        let mut attributes = if at > 0 {
            self.document.inline_attributes_at(at - 1)
        } else {
            Attributes::new()
        };
        attributes.remove(&Format::GrammarError);

        let inserted = self.document.insert_text(at, text, attributes);
        self.selection = Some(Selection::cursor(at + inserted));
        inserted
    }

    /// Insert plain text at a position.
    #[cfg(test)]
    pub fn insert_text(&mut self, index: usize, text: &str) -> usize {
        let at = index.min(self.document.len() - 1);
        let inserted = self.document.insert_text(at, text, Attributes::new());
        self.selection = self.selection.map(|s| s.after_insert(at, inserted));
        inserted
    }

    pub fn delete(&mut self, index: usize, length: usize) -> usize {
        let removed = self.document.delete(index, length);
        self.selection = self.selection.map(|s| s.after_delete(index, removed));
        removed
    }

    /// Replace a span, returning `(removed, inserted)`.
    pub fn replace(&mut self, index: usize, length: usize, text: &str) -> (usize, usize) {
        let before = self.document.len();
        let inserted = self.document.replace(index, length, text);
        let removed = before + inserted - self.document.len();
        self.selection = self
            .selection
            .map(|s| s.after_delete(index, removed).after_insert(index, inserted));
        (removed, inserted)
    }

    /// Apply a format to the selection. Inline formats need a non-empty selection; line formats
    /// apply to the line holding the cursor.
    pub fn format(&mut self, format: Format, value: Option<AttrValue>) -> Result<(), AppError> {
        let sel = self
            .selection
            .ok_or_else(|| AppError::Validation("Nothing is selected".to_string()))?;
        self.document.format(sel.index, sel.length, format, value)
    }

    /// Strip inline formats from the selection.
    pub fn remove_format(&mut self) {
        if let Some(sel) = self.selection {
            self.document.remove_inline_formats(sel.index, sel.length);
        }
    }

    pub fn apply(&mut self, command: ToolbarCommand) -> Result<(), AppError> {
        match command {
            ToolbarCommand::Set(format, value) => self.format(format, value),
            ToolbarCommand::Toggle(format) => {
                let active = self.is_active(format);
                self.format(format, (!active).then_some(AttrValue::Enabled))
            }
            ToolbarCommand::Clean => {
                self.remove_format();
                Ok(())
            }
        }
    }

    fn is_active(&self, format: Format) -> bool {
        let index = self.cursor();
        match format.scope() {
            Scope::Block => {
                let format = if format == Format::Bullet {
                    Format::List
                } else {
                    format
                };
                self.document
                    .line_attributes_at(index)
                    .contains_key(&format)
            }
            _ => self
                .document
                .inline_attributes_at(index)
                .contains_key(&format),
        }
    }

    /// Upload an image and embed it at the cursor, or at the end when nothing is selected. The
    /// cursor moves past the image. Toasts are raised here; on any failure the document is left
    /// exactly as it was.
    pub async fn insert_image<U: ImageUploader>(
        &mut self,
        uploader: &U,
        image: ImageFile,
        notifier: &Notifier,
    ) -> Result<usize, AppError> {
        if !image.is_image() {
            notifier.error("Please choose an image file.");
            return Err(AppError::Validation(format!(
                "{} is not an image",
                image.file_name
            )));
        }

        notifier.info("Uploading image...");
        let url = match uploader.upload(image).await {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!("Image upload failed: {}", e);
                notifier.error("Image upload failed.");
                return Err(e);
            }
        };

        let position = self.cursor();
        let at = self
            .document
            .insert_embed(position, Embed::Image(url), Attributes::new());
        self.selection = Some(Selection::cursor(at + 1));
        Ok(at)
    }

    /// Replace every grammar mark with marks over `spans`.
    pub fn mark_grammar_issues(&mut self, spans: &[(usize, usize)]) {
        self.document.clear_format(Format::GrammarError);
        for &(index, length) in spans {
            self.document
                .format_text(index, length, Format::GrammarError, Some(AttrValue::Enabled));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FakeUploader {
        url: Option<String>,
        calls: AtomicUsize,
    }

    impl FakeUploader {
        fn ok(url: &str) -> Self {
            Self {
                url: Some(url.to_string()),
                calls: AtomicUsize::new(0),
            }
        }

        fn failing() -> Self {
            Self {
                url: None,
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl ImageUploader for FakeUploader {
        async fn upload(&self, _image: ImageFile) -> Result<String, AppError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.url.clone().ok_or(AppError::Remote {
                status: 500,
                message: Some("disk full".to_string()),
            })
        }
    }

    fn png() -> ImageFile {
        ImageFile::new("cat.png", "image/png", vec![0x89, b'P', b'N', b'G'])
    }

    #[test]
    fn test_typing_moves_cursor_and_continues_format() {
        let mut editor = Editor::new();
        editor.type_text("Hello");
        assert_eq!(editor.selection(), Some(Selection::cursor(5)));

        editor.set_selection(0, 5);
        editor.apply(ToolbarCommand::Toggle(Format::Bold)).unwrap();
        editor.set_selection(5, 0);
        editor.type_text("!");

        assert_eq!(editor.plain_text(), "Hello!\n");
        assert!(editor
            .document()
            .inline_attributes_at(5)
            .contains_key(&Format::Bold));
    }

    #[test]
    fn test_typing_replaces_highlight() {
        let mut editor = Editor::from_html("<p>Hello cruel world</p>");
        editor.set_selection(6, 5);
        editor.type_text("kind");
        assert_eq!(editor.plain_text(), "Hello kind world\n");
        assert_eq!(editor.selection(), Some(Selection::cursor(10)));
    }

    #[test]
    fn test_selection_follows_edits() {
        let mut editor = Editor::from_html("<p>abcdefgh</p>");
        editor.set_selection(4, 2);
        editor.insert_text(0, "XY");
        assert_eq!(editor.selection(), Some(Selection { index: 6, length: 2 }));

        editor.delete(5, 2);
        assert_eq!(editor.selection(), Some(Selection { index: 5, length: 1 }));
    }

    #[test]
    fn test_selection_is_clamped() {
        let mut editor = Editor::from_html("<p>abc</p>");
        editor.set_selection(50, 10);
        assert_eq!(editor.selection(), Some(Selection { index: 3, length: 1 }));
    }

    #[test]
    fn test_toggle_and_clean() {
        let mut editor = Editor::from_html("<p>styled text</p>");
        editor.set_selection(0, 6);
        editor.apply(ToolbarCommand::Toggle(Format::Italic)).unwrap();
        assert!(editor.html().contains("<em>styled</em>"));

        editor.apply(ToolbarCommand::Toggle(Format::Italic)).unwrap();
        assert_eq!(editor.html(), "<p>styled text</p>");

        editor.apply(ToolbarCommand::Set(Format::Color, Some("red".into()))).unwrap();
        editor.apply(ToolbarCommand::Clean).unwrap();
        assert_eq!(editor.html(), "<p>styled text</p>");
    }

    #[test]
    fn test_line_toggle() {
        let mut editor = Editor::from_html("<p>quote me</p>");
        editor.set_selection(2, 0);
        editor.apply(ToolbarCommand::Toggle(Format::Blockquote)).unwrap();
        assert_eq!(editor.html(), "<blockquote>quote me</blockquote>");
        editor.apply(ToolbarCommand::Toggle(Format::Blockquote)).unwrap();
        assert_eq!(editor.html(), "<p>quote me</p>");
    }

    #[test]
    fn test_format_without_selection_is_rejected() {
        let mut editor = Editor::from_html("<p>abc</p>");
        let err = editor.format(Format::Bold, Some(AttrValue::Enabled)).unwrap_err();
        assert_eq!(err.error_code(), "VALIDATION_ERROR");
    }

    #[test]
    fn test_parse_toolbar_commands() {
        assert_eq!(
            ToolbarCommand::parse("bold", None).unwrap(),
            ToolbarCommand::Toggle(Format::Bold)
        );
        assert_eq!(
            ToolbarCommand::parse("header", Some("2")).unwrap(),
            ToolbarCommand::Set(Format::Header, Some("2".into()))
        );
        assert_eq!(
            ToolbarCommand::parse("link", Some("none")).unwrap(),
            ToolbarCommand::Set(Format::Link, None)
        );
        assert_eq!(ToolbarCommand::parse("clean", None).unwrap(), ToolbarCommand::Clean);
        assert!(ToolbarCommand::parse("header", None).is_err());
        assert!(ToolbarCommand::parse("image", Some("x")).is_err());
        assert!(ToolbarCommand::parse("marquee", None).is_err());
    }

    #[test]
    fn test_standard_toolbar_layout() {
        let toolbar = Toolbar::standard();
        assert_eq!(toolbar.groups.len(), 7);
        let labels: Vec<String> = toolbar.controls().map(Control::label).collect();
        assert!(labels.contains(&"header=1".to_string()));
        assert!(labels.contains(&"list=bullet".to_string()));
        assert_eq!(labels.last().map(String::as_str), Some("clean"));
    }

    #[tokio::test]
    async fn test_image_inserted_at_cursor() {
        let notifier = Notifier::default();
        let uploader = FakeUploader::ok("https://cdn.example.com/cat.png");
        let mut editor = Editor::from_html("<p>ab</p>");
        editor.set_selection(1, 0);

        let at = editor.insert_image(&uploader, png(), &notifier).await.unwrap();
        assert_eq!(at, 1);
        assert_eq!(editor.selection(), Some(Selection::cursor(2)));
        assert_eq!(
            editor.html(),
            "<p>a<img src=\"https://cdn.example.com/cat.png\">b</p>"
        );
        assert_eq!(notifier.drain()[0].message, "Uploading image...");
    }

    #[tokio::test]
    async fn test_image_without_selection_goes_to_end() {
        let notifier = Notifier::default();
        let uploader = FakeUploader::ok("https://cdn.example.com/cat.png");
        let mut editor = Editor::from_html("<p>ab</p>");

        let at = editor.insert_image(&uploader, png(), &notifier).await.unwrap();
        assert_eq!(at, 2);
        assert_eq!(editor.len(), 4);
    }

    #[tokio::test]
    async fn test_failed_upload_leaves_document_unchanged() {
        let notifier = Notifier::default();
        let uploader = FakeUploader::failing();
        let mut editor = Editor::from_html("<h1>Title</h1><p>Body <strong>text</strong></p>");
        editor.set_selection(3, 0);
        let before = editor.document().clone();
        let html_before = editor.html();

        let err = editor.insert_image(&uploader, png(), &notifier).await;
        assert!(err.is_err());
        assert_eq!(editor.document(), &before);
        assert_eq!(editor.html(), html_before);
        assert_eq!(editor.selection(), Some(Selection::cursor(3)));
        assert_eq!(
            notifier.last().map(|t| t.message),
            Some("Image upload failed.".to_string())
        );
    }

    #[tokio::test]
    async fn test_non_image_rejected_without_upload() {
        let notifier = Notifier::default();
        let uploader = FakeUploader::ok("https://cdn.example.com/x");
        let mut editor = Editor::new();
        let file = ImageFile::new("notes.txt", "text/plain", b"hi".to_vec());

        assert!(editor.insert_image(&uploader, file, &notifier).await.is_err());
        assert_eq!(uploader.calls.load(Ordering::SeqCst), 0);
        assert_eq!(editor.document(), &Document::new());
    }

    #[test]
    fn test_grammar_marks_replaced_and_not_saved() {
        let mut editor = Editor::from_html("<p>Walk ot the dog</p>");
        editor.mark_grammar_issues(&[(5, 2)]);
        assert_eq!(editor.document().spans_with(Format::GrammarError), vec![(5, 2)]);
        assert_eq!(editor.html(), "<p>Walk ot the dog</p>");

        editor.mark_grammar_issues(&[(0, 4)]);
        assert_eq!(editor.document().spans_with(Format::GrammarError), vec![(0, 4)]);

        editor.mark_grammar_issues(&[]);
        assert!(editor.document().spans_with(Format::GrammarError).is_empty());
    }

    #[test]
    fn test_replace_reports_counts() {
        let mut editor = Editor::from_html("<p>Walk ot the dog</p>");
        editor.set_selection(12, 0);
        assert_eq!(editor.replace(5, 2, "to"), (2, 2));
        assert_eq!(editor.replace(5, 2, "into"), (2, 4));
        assert_eq!(editor.plain_text(), "Walk into the dog\n");
        assert_eq!(editor.selection(), Some(Selection::cursor(14)));
    }
}
