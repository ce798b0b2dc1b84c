//! Create and edit form for posts.
//!
//! Every change to the editor's text goes through [`PostForm::changed`] so the grammar workflow
//! sees it and the inline marks follow the current issues.

use std::sync::Arc;

use tokio::sync::watch;

use super::Navigation;
use crate::editor::{Editor, ImageUploader, ToolbarCommand};
use crate::errors::AppError;
use crate::grammar::{Annotation, FixOutcome, GrammarChecker, GrammarWorkflow, IssueSet};
use crate::models::{ImageFile, PostInput};
use crate::notify::Notifier;
use crate::routes::Route;
use crate::AppState;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormMode {
    Create,
    Edit(String),
}

impl FormMode {
    pub fn heading(&self) -> &'static str {
        match self {
            FormMode::Create => "Create New Post",
            FormMode::Edit(_) => "Edit Post",
        }
    }

    pub fn submit_label(&self) -> &'static str {
        match self {
            FormMode::Create => "Publish Post",
            FormMode::Edit(_) => "Update Post",
        }
    }
}

pub struct PostForm<C: GrammarChecker> {
    pub mode: FormMode,
    pub title: String,
    editor: Editor,
    grammar: GrammarWorkflow<C>,
}

impl<C: GrammarChecker> PostForm<C> {
    pub fn new(mode: FormMode, grammar: GrammarWorkflow<C>) -> Self {
        Self {
            mode,
            title: String::new(),
            editor: Editor::new(),
            grammar,
        }
    }

    /// Open the form. In edit mode the post is loaded first; if that fails the user is told and
    /// sent home instead.
    pub async fn open(
        state: &AppState,
        mode: FormMode,
        checker: Arc<C>,
    ) -> Result<Self, Route> {
        let grammar = GrammarWorkflow::from_config(checker, &state.config);
        let mut form = Self::new(mode, grammar);

        if let FormMode::Edit(id) = &form.mode {
            match state.api.get_post(id).await {
                Ok(post) => {
                    form.title = post.title;
                    form.editor.load_html(&post.content);
                    form.changed();
                }
                Err(e) => {
                    tracing::warn!(id = %id, "Failed to load blog for editing: {}", e);
                    state.notifier.error("Could not fetch blog post.");
                    return Err(Route::Home);
                }
            }
        }
        Ok(form)
    }

    pub fn editor(&self) -> &Editor {
        &self.editor
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    pub fn select(&mut self, index: usize, length: usize) {
        self.editor.set_selection(index, length);
    }

    pub fn type_text(&mut self, text: &str) {
        self.editor.type_text(text);
        self.changed();
    }

    pub fn delete(&mut self, index: usize, length: usize) {
        if self.editor.delete(index, length) > 0 {
            self.changed();
        }
    }

    pub fn apply(&mut self, command: ToolbarCommand) -> Result<(), AppError> {
        self.editor.apply(command)?;
        self.changed();
        Ok(())
    }

    pub async fn insert_image<U: ImageUploader>(
        &mut self,
        uploader: &U,
        image: ImageFile,
        notifier: &Notifier,
    ) -> Result<(), AppError> {
        self.editor.insert_image(uploader, image, notifier).await?;
        self.changed();
        Ok(())
    }

    /// Apply the suggestion of issue `index`.
    pub fn fix(&mut self, index: usize) -> FixOutcome {
        let outcome = self.grammar.apply_fix(&mut self.editor, index);
        match outcome {
            FixOutcome::Applied { .. } => self.changed(),
            FixOutcome::Stale => self.sync_marks(),
            FixOutcome::NoSuggestion | FixOutcome::Missing => {}
        }
        outcome
    }

    pub fn annotations(&self) -> Vec<Annotation> {
        self.grammar.annotations()
    }

    pub fn grammar_updates(&self) -> watch::Receiver<IssueSet> {
        self.grammar.subscribe()
    }

    /// Redraw the inline marks from the current issues.
    pub fn sync_marks(&mut self) {
        let spans = self.grammar.spans();
        self.editor.mark_grammar_issues(&spans);
    }

    fn changed(&mut self) {
        self.grammar.on_content_change(&self.editor.plain_text());
        self.sync_marks();
    }

    /// Validate, then create or update by mode.
    pub async fn submit(&mut self, state: &AppState) -> Navigation {
        if self.title.trim().is_empty() || self.editor.is_blank() {
            state.notifier.error("Title and content cannot be empty.");
            return None;
        }

        let input = PostInput {
            title: self.title.clone(),
            content: self.editor.html(),
        };
        let result = match &self.mode {
            FormMode::Create => state
                .api
                .create_post(&input)
                .await
                .map(|_| "Blog created successfully!"),
            FormMode::Edit(id) => state
                .api
                .update_post(id, &input)
                .await
                .map(|_| "Blog updated successfully!"),
        };

        match result {
            Ok(message) => {
                self.grammar.cancel();
                state.notifier.success(message);
                Some(Route::Home)
            }
            Err(e) => {
                state.notifier.error(e.user_message("Failed to save blog post"));
                None
            }
        }
    }
}
