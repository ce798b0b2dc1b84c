//! Debounced grammar checking.
//!
//! Every content change bumps a generation counter and restarts the quiet-period timer. When the
//! timer fires without a newer change the text is sent to the [`GrammarChecker`]; the answer is
//! only published if its generation is still the latest. Fixes re-verify the flagged text against
//! the live document before editing it.

use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::config::Config;
use crate::editor::Editor;
use crate::errors::AppError;
use crate::models::GrammarMatch;

/// Grammar analysis backend.
pub trait GrammarChecker: Send + Sync + 'static {
    fn check(
        &self,
        text: String,
    ) -> impl Future<Output = Result<Vec<GrammarMatch>, AppError>> + Send;
}

/// A match together with what it flagged when the check was requested.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Issue {
    pub generation: u64,
    pub grammar: GrammarMatch,
    pub flagged_text: String,
}

impl Issue {
    pub fn offset(&self) -> usize {
        self.grammar.offset
    }

    pub fn length(&self) -> usize {
        self.grammar.length
    }

    /// Whether `text` still holds the flagged characters at the flagged offset.
    fn still_matches(&self, text: &str) -> bool {
        let live: String = text
            .chars()
            .skip(self.offset())
            .take(self.length())
            .collect();
        live == self.flagged_text
    }
}

/// The published issues and the generation they came from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IssueSet {
    pub generation: u64,
    pub issues: Vec<Issue>,
}

/// One row of the list shown beside the editor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Annotation {
    pub index: usize,
    pub message: String,
    pub suggestion: Option<String>,
}

/// Result of [`GrammarWorkflow::apply_fix`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FixOutcome {
    Applied {
        offset: usize,
        removed: usize,
        inserted: usize,
    },
    /// The document no longer holds the flagged text; the issue was dropped
    Stale,
    NoSuggestion,
    Missing,
}

struct Shared<C> {
    checker: Arc<C>,
    generation: AtomicU64,
    issues: watch::Sender<IssueSet>,
}

impl<C: GrammarChecker> Shared<C> {
    async fn run(&self, generation: u64, text: String) {
        let matches = match self.checker.check(text.clone()).await {
            Ok(matches) => matches,
            Err(e) => {
                tracing::warn!(generation, "Grammar check failed: {}", e);
                return;
            }
        };

        let chars: Vec<char> = text.chars().collect();
        let issues: Vec<Issue> = matches
            .into_iter()
            .filter_map(|grammar| {
                let end = grammar.offset.checked_add(grammar.length)?;
                if end > chars.len() {
                    tracing::warn!(
                        offset = grammar.offset,
                        length = grammar.length,
                        "Grammar match outside the checked text"
                    );
                    return None;
                }
                let flagged_text = chars[grammar.offset..end].iter().collect();
                Some(Issue {
                    generation,
                    grammar,
                    flagged_text,
                })
            })
            .collect();

        let published = self.issues.send_if_modified(|set| {
            if self.generation.load(Ordering::SeqCst) != generation {
                return false;
            }
            *set = IssueSet {
                generation,
                issues: issues.clone(),
            };
            true
        });
        if published {
            tracing::debug!(generation, count = issues.len(), "Grammar issues updated");
        } else {
            tracing::debug!(generation, "Discarding stale grammar response");
        }
    }
}

struct Pending {
    handle: JoinHandle<()>,
    dispatched: Arc<AtomicBool>,
}

/// Debounced grammar checks for one editor.
pub struct GrammarWorkflow<C: GrammarChecker> {
    shared: Arc<Shared<C>>,
    delay: Duration,
    min_length: usize,
    pending: Option<Pending>,
}

impl<C: GrammarChecker> GrammarWorkflow<C> {
    pub fn new(checker: Arc<C>, delay: Duration, min_length: usize) -> Self {
        let (issues, _) = watch::channel(IssueSet::default());
        Self {
            shared: Arc::new(Shared {
                checker,
                generation: AtomicU64::new(0),
                issues,
            }),
            delay,
            min_length,
            pending: None,
        }
    }

    pub fn from_config(checker: Arc<C>, config: &Config) -> Self {
        Self::new(checker, config.grammar_debounce, config.grammar_min_length)
    }

    /// Latest generation issued.
    #[cfg(test)]
    pub fn generation(&self) -> u64 {
        self.shared.generation.load(Ordering::SeqCst)
    }

    /// Feed the new plain-text projection after any edit. Must be called from within a tokio
    /// runtime.
    pub fn on_content_change(&mut self, text: &str) {
        let generation = self.shared.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.cancel();

        let too_short = text.chars().count() < self.min_length;
        self.shared.issues.send_if_modified(|set| {
            let before = set.issues.len();
            if too_short {
                set.issues.clear();
            } else {
                set.issues.retain(|issue| issue.still_matches(text));
            }
            set.issues.len() != before
        });
        if too_short {
            return;
        }

        let shared = Arc::clone(&self.shared);
        let delay = self.delay;
        let dispatched = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&dispatched);
        let text = text.to_string();

        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if shared.generation.load(Ordering::SeqCst) != generation {
                return;
            }
            flag.store(true, Ordering::SeqCst);
            tracing::debug!(generation, chars = text.chars().count(), "Sending grammar check");
            shared.run(generation, text).await;
        });
        self.pending = Some(Pending { handle, dispatched });
    }

    /// Abort a check that is still waiting out its delay. A request already sent runs to
    /// completion and is discarded by generation.
    pub fn cancel(&mut self) {
        if let Some(pending) = self.pending.take() {
            if !pending.dispatched.load(Ordering::SeqCst) {
                pending.handle.abort();
            }
        }
    }

    #[cfg(test)]
    pub fn issues(&self) -> Vec<Issue> {
        self.shared.issues.borrow().issues.clone()
    }

    /// Spans to mark in the editor.
    pub fn spans(&self) -> Vec<(usize, usize)> {
        self.shared
            .issues
            .borrow()
            .issues
            .iter()
            .map(|i| (i.offset(), i.length()))
            .collect()
    }

    pub fn annotations(&self) -> Vec<Annotation> {
        self.shared
            .issues
            .borrow()
            .issues
            .iter()
            .enumerate()
            .map(|(index, issue)| Annotation {
                index,
                message: issue.grammar.message.clone(),
                suggestion: issue.grammar.suggestion().map(str::to_string),
            })
            .collect()
    }

    /// Notified whenever the issue set changes.
    pub fn subscribe(&self) -> watch::Receiver<IssueSet> {
        self.shared.issues.subscribe()
    }

    /// Replace the flagged span of issue `index` with its first suggestion.
    ///
    /// The caller feeds the edited text back through [`on_content_change`](Self::on_content_change).
    pub fn apply_fix(&mut self, editor: &mut Editor, index: usize) -> FixOutcome {
        let Some(issue) = self.shared.issues.borrow().issues.get(index).cloned() else {
            return FixOutcome::Missing;
        };
        let Some(replacement) = issue.grammar.suggestion().map(str::to_string) else {
            return FixOutcome::NoSuggestion;
        };

        let offset = issue.offset();
        let length = issue.length();
        let live = editor.text_in(offset, length);
        if live.as_deref() != Some(issue.flagged_text.as_str()) {
            tracing::debug!(offset, length, "Dropping stale grammar issue");
            self.shared
                .issues
                .send_modify(|set| set.issues.retain(|i| i != &issue));
            return FixOutcome::Stale;
        }

        let (removed, inserted) = editor.replace(offset, length, &replacement);
        let end = offset + length;
        self.shared.issues.send_modify(|set| {
            set.issues.retain_mut(|other| {
                if *other == issue {
                    false
                } else if other.offset() >= end {
                    other.grammar.offset = other.offset() - removed + inserted;
                    true
                } else {
                    other.offset() + other.length() <= offset
                }
            });
        });

        FixOutcome::Applied {
            offset,
            removed,
            inserted,
        }
    }
}

impl<C: GrammarChecker> Drop for GrammarWorkflow<C> {
    fn drop(&mut self) {
        self.cancel();
    }
}
