//! Delta-style rich-text document.
//!
//! A document is a flat list of operations, each inserting a run of text or a single embed with a
//! set of attributes. Line formats live on the newline that ends the line, and the document always
//! ends with a newline. Positions count characters; an embed occupies one position.

use super::format::{scoped, AttrValue, Attributes, Format, Scope};
use crate::errors::AppError;

/// Stand-in for an embed in the plain-text projection, so projection offsets equal positions.
pub const EMBED_CHAR: char = '\u{FFFC}';

/// Line formats of which a line can carry at most one.
const EXCLUSIVE_BLOCKS: [Format; 4] = [
    Format::Header,
    Format::Blockquote,
    Format::CodeBlock,
    Format::List,
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Embed {
    Image(String),
    Video(String),
    Formula(String),
}

impl Embed {
    pub fn format(&self) -> Format {
        match self {
            Embed::Image(_) => Format::Image,
            Embed::Video(_) => Format::Video,
            Embed::Formula(_) => Format::Formula,
        }
    }

    /// URL for images and videos, source for formulas.
    pub fn value(&self) -> &str {
        match self {
            Embed::Image(v) | Embed::Video(v) | Embed::Formula(v) => v,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Insert {
    Text(String),
    Embed(Embed),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Op {
    pub insert: Insert,
    pub attributes: Attributes,
}

impl Op {
    pub fn text(text: impl Into<String>, attributes: Attributes) -> Self {
        Self {
            insert: Insert::Text(text.into()),
            attributes,
        }
    }

    pub fn embed(embed: Embed, attributes: Attributes) -> Self {
        Self {
            insert: Insert::Embed(embed),
            attributes,
        }
    }

    pub fn len(&self) -> usize {
        match &self.insert {
            Insert::Text(t) => t.chars().count(),
            Insert::Embed(_) => 1,
        }
    }

    fn is_newline(&self) -> bool {
        matches!(&self.insert, Insert::Text(t) if t == "\n")
    }
}

/// One line of a document: its inline runs and the line formats.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    pub runs: Vec<Op>,
    pub block: Attributes,
}

impl Line {
    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    pub fn block_value(&self, format: Format) -> Option<&AttrValue> {
        self.block.get(&format)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    ops: Vec<Op>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// An empty document: a single newline.
    pub fn new() -> Self {
        Self {
            ops: vec![Op::text("\n", Attributes::new())],
        }
    }

    /// Build from raw operations, merging runs and restoring the trailing newline.
    pub fn from_ops(ops: Vec<Op>) -> Self {
        let mut doc = Self { ops };
        doc.normalize();
        doc
    }

    #[cfg(test)]
    pub fn ops(&self) -> &[Op] {
        &self.ops
    }

    /// Length in positions, including the trailing newline.
    pub fn len(&self) -> usize {
        self.ops.iter().map(Op::len).sum()
    }

    /// True when there is nothing but whitespace.
    pub fn is_blank(&self) -> bool {
        self.plain_text().trim().is_empty()
    }

    /// The text the grammar service sees. Embeds appear as [`EMBED_CHAR`].
    pub fn plain_text(&self) -> String {
        let mut out = String::new();
        for op in &self.ops {
            match &op.insert {
                Insert::Text(t) => out.push_str(t),
                Insert::Embed(_) => out.push(EMBED_CHAR),
            }
        }
        out
    }

    /// Plain text of `[index, index + length)`, or `None` if the span runs past the end.
    pub fn text_in(&self, index: usize, length: usize) -> Option<String> {
        let end = index.checked_add(length)?;
        if end > self.len() {
            return None;
        }
        Some(self.plain_text().chars().skip(index).take(length).collect())
    }

    /// Inline formats in effect at `index`, if a character sits there.
    pub fn inline_attributes_at(&self, index: usize) -> Attributes {
        let mut pos = 0;
        for op in &self.ops {
            let len = op.len();
            if index < pos + len {
                return scoped(&op.attributes, Scope::Inline);
            }
            pos += len;
        }
        Attributes::new()
    }

    /// Line formats of the line containing `index`.
    pub fn line_attributes_at(&self, index: usize) -> Attributes {
        let mut pos = 0;
        for op in &self.ops {
            let len = op.len();
            if pos + len > index {
                if let Insert::Text(t) = &op.insert {
                    let offset = index.saturating_sub(pos);
                    if t.chars().skip(offset).any(|c| c == '\n') {
                        return scoped(&op.attributes, Scope::Block);
                    }
                }
            }
            pos += len;
        }
        Attributes::new()
    }

    /// Insert text at `index` (clamped before the trailing newline). Inline attributes apply to
    /// the text; inserted newlines take the formats of the line they split. Returns the number of
    /// positions inserted.
    pub fn insert_text(&mut self, index: usize, text: &str, attributes: Attributes) -> usize {
        if text.is_empty() {
            return 0;
        }
        let index = self.clamp_insert(index);
        let inline = scoped(&attributes, Scope::Inline);
        let block = self.line_attributes_at(index);

        let mut new_ops = Vec::new();
        for (i, part) in text.split('\n').enumerate() {
            if i > 0 {
                new_ops.push(Op::text("\n", block.clone()));
            }
            if !part.is_empty() {
                new_ops.push(Op::text(part, inline.clone()));
            }
        }

        let at = self.split_at(index);
        self.ops.splice(at..at, new_ops);
        self.normalize();
        text.chars().count()
    }

    /// Insert an embed at `index` (clamped before the trailing newline). Returns where it landed.
    pub fn insert_embed(&mut self, index: usize, embed: Embed, attributes: Attributes) -> usize {
        let index = self.clamp_insert(index);
        let at = self.split_at(index);
        self.ops
            .insert(at, Op::embed(embed, scoped(&attributes, Scope::Inline)));
        self.normalize();
        index
    }

    /// Delete `[index, index + length)`. The trailing newline is never removed. Returns the number
    /// of positions deleted.
    pub fn delete(&mut self, index: usize, length: usize) -> usize {
        let last = self.len() - 1;
        let end = index.saturating_add(length).min(last);
        if index >= end {
            return 0;
        }
        let start_op = self.split_at(index);
        let end_op = self.split_at(end);
        self.ops.drain(start_op..end_op);
        self.normalize();
        end - index
    }

    /// Replace `[index, index + length)` with `text`, keeping the inline formats of the first
    /// replaced character except grammar marks.
    pub fn replace(&mut self, index: usize, length: usize, text: &str) -> usize {
        let mut attributes = self.inline_attributes_at(index);
        attributes.remove(&Format::GrammarError);
        self.delete(index, length);
        self.insert_text(index, text, attributes)
    }

    /// Apply (or with `None`, remove) a format over a span. Line formats apply to every line the
    /// span touches.
    pub fn format(
        &mut self,
        index: usize,
        length: usize,
        format: Format,
        value: Option<AttrValue>,
    ) -> Result<(), AppError> {
        let value = match value {
            Some(AttrValue::Enabled) if format.takes_value() => {
                return Err(AppError::Validation(format!(
                    "The {} format needs a value",
                    format
                )))
            }
            Some(_) if !format.takes_value() => Some(AttrValue::Enabled),
            other => other,
        };

        match format.scope() {
            Scope::Inline => self.format_text(index, length, format, value),
            Scope::Block => self.format_line(index, length, format, value),
            Scope::Embed => {
                return Err(AppError::Validation(format!(
                    "{} is inserted, not applied as a format",
                    format
                )))
            }
        }
        Ok(())
    }

    /// Set or clear an inline format on every non-newline position of the span.
    pub fn format_text(
        &mut self,
        index: usize,
        length: usize,
        format: Format,
        value: Option<AttrValue>,
    ) {
        let end = index.saturating_add(length).min(self.len());
        if index >= end {
            return;
        }
        let start_op = self.split_at(index);
        let end_op = self.split_at(end);
        let end_op = self.isolate_newlines(start_op, end_op);

        for op in &mut self.ops[start_op..end_op] {
            if op.is_newline() {
                continue;
            }
            match &value {
                Some(v) => {
                    op.attributes.insert(format, v.clone());
                }
                None => {
                    op.attributes.remove(&format);
                }
            }
        }
        self.normalize();
    }

    /// Set or clear a line format on each line touched by the span.
    pub fn format_line(
        &mut self,
        index: usize,
        length: usize,
        format: Format,
        value: Option<AttrValue>,
    ) {
        // `bullet` is shorthand for a bulleted list
        let (format, value) = match format {
            Format::Bullet => (Format::List, value.map(|_| AttrValue::from("bullet"))),
            other => (other, value),
        };

        let end = index.saturating_add(length);
        let mut targets = Vec::new();
        for (pos, c) in self.plain_text().chars().enumerate().skip(index) {
            if c == '\n' {
                targets.push(pos);
                if pos >= end {
                    break;
                }
            }
        }

        for pos in targets {
            self.split_at(pos);
            let at = self.split_at(pos + 1) - 1;
            let attrs = &mut self.ops[at].attributes;
            match &value {
                Some(v) => {
                    if EXCLUSIVE_BLOCKS.contains(&format) {
                        for other in EXCLUSIVE_BLOCKS {
                            attrs.remove(&other);
                        }
                    }
                    attrs.insert(format, v.clone());
                }
                None => {
                    attrs.remove(&format);
                }
            }
        }
        self.normalize();
    }

    /// Remove every inline format from the span.
    pub fn remove_inline_formats(&mut self, index: usize, length: usize) {
        let end = index.saturating_add(length).min(self.len());
        if index >= end {
            return;
        }
        let start_op = self.split_at(index);
        let end_op = self.split_at(end);
        for op in &mut self.ops[start_op..end_op] {
            op.attributes.retain(|f, _| f.scope() != Scope::Inline);
        }
        self.normalize();
    }

    /// Remove a format from the whole document.
    pub fn clear_format(&mut self, format: Format) {
        for op in &mut self.ops {
            op.attributes.remove(&format);
        }
        self.normalize();
    }

    /// A copy with `format` removed everywhere.
    pub fn without_format(&self, format: Format) -> Document {
        let mut copy = self.clone();
        copy.clear_format(format);
        copy
    }

    /// Spans `(index, length)` carrying `format`.
    #[cfg(test)]
    pub fn spans_with(&self, format: Format) -> Vec<(usize, usize)> {
        let mut spans: Vec<(usize, usize)> = Vec::new();
        let mut pos = 0;
        for op in &self.ops {
            let len = op.len();
            if op.attributes.contains_key(&format) {
                match spans.last_mut() {
                    Some((start, length)) if *start + *length == pos => *length += len,
                    _ => spans.push((pos, len)),
                }
            }
            pos += len;
        }
        spans
    }

    /// Split into lines.
    pub fn lines(&self) -> Vec<Line> {
        let mut lines = Vec::new();
        let mut runs = Vec::new();
        for op in &self.ops {
            match &op.insert {
                Insert::Embed(_) => runs.push(Op {
                    insert: op.insert.clone(),
                    attributes: scoped(&op.attributes, Scope::Inline),
                }),
                Insert::Text(t) => {
                    let inline = scoped(&op.attributes, Scope::Inline);
                    for (i, part) in t.split('\n').enumerate() {
                        if i > 0 {
                            lines.push(Line {
                                runs: std::mem::take(&mut runs),
                                block: scoped(&op.attributes, Scope::Block),
                            });
                        }
                        if !part.is_empty() {
                            runs.push(Op::text(part, inline.clone()));
                        }
                    }
                }
            }
        }
        lines
    }

    fn clamp_insert(&self, index: usize) -> usize {
        index.min(self.len() - 1)
    }

    /// Make sure an operation starts at `index` and return its position in `ops`.
    fn split_at(&mut self, index: usize) -> usize {
        let mut pos = 0;
        for i in 0..self.ops.len() {
            if pos == index {
                return i;
            }
            let len = self.ops[i].len();
            if index < pos + len {
                let offset = index - pos;
                let attributes = self.ops[i].attributes.clone();
                let tail = match &mut self.ops[i].insert {
                    Insert::Text(text) => {
                        let byte = text
                            .char_indices()
                            .nth(offset)
                            .map(|(b, _)| b)
                            .unwrap_or(text.len());
                        text.split_off(byte)
                    }
                    Insert::Embed(_) => return i,
                };
                self.ops.insert(i + 1, Op::text(tail, attributes));
                return i + 1;
            }
            pos += len;
        }
        self.ops.len()
    }

    /// Split text operations in `ops[start..end]` so every newline stands alone. Returns the new
    /// end index.
    fn isolate_newlines(&mut self, start: usize, end: usize) -> usize {
        let mut result = Vec::new();
        let tail = self.ops.split_off(end);
        let middle = self.ops.split_off(start);
        for op in middle {
            match &op.insert {
                Insert::Text(t) if t.contains('\n') && t != "\n" => {
                    for (i, part) in t.split('\n').enumerate() {
                        if i > 0 {
                            result.push(Op::text("\n", op.attributes.clone()));
                        }
                        if !part.is_empty() {
                            result.push(Op::text(part, op.attributes.clone()));
                        }
                    }
                }
                _ => result.push(op),
            }
        }
        let new_end = start + result.len();
        self.ops.extend(result);
        self.ops.extend(tail);
        new_end
    }

    /// Merge neighbouring runs with equal formats, drop empty runs, restore the trailing newline.
    fn normalize(&mut self) {
        let terminated = self
            .ops
            .iter()
            .rev()
            .find(|op| op.len() > 0)
            .is_some_and(|op| matches!(&op.insert, Insert::Text(t) if t.ends_with('\n')));
        if !terminated {
            self.ops.push(Op::text("\n", Attributes::new()));
        }

        let mut merged: Vec<Op> = Vec::with_capacity(self.ops.len());
        for op in self.ops.drain(..) {
            if matches!(&op.insert, Insert::Text(t) if t.is_empty()) {
                continue;
            }
            if let Some(last) = merged.last_mut() {
                if last.attributes == op.attributes {
                    if let (Insert::Text(a), Insert::Text(b)) = (&mut last.insert, &op.insert) {
                        a.push_str(b);
                        continue;
                    }
                }
            }
            merged.push(op);
        }
        self.ops = merged;
    }
}
