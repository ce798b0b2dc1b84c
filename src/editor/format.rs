//! Format allow-list.
//!
//! Only these formats survive in a document. Markup naming anything else is stripped on load.

use std::collections::BTreeMap;
use std::fmt;

/// Tooltip carried by grammar marks.
pub const GRAMMAR_TOOLTIP: &str = "Grammar Issue";
/// CSS class of grammar marks.
pub const GRAMMAR_CLASS: &str = "grammar-error";

/// Where a format applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// Wraps a run of text
    Inline,
    /// Applies to a whole line; stored on the newline that ends it
    Block,
    /// Occupies one position of its own
    Embed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Format {
    Header,
    Font,
    Size,
    Bold,
    Italic,
    Underline,
    Strike,
    Blockquote,
    CodeBlock,
    List,
    Bullet,
    Indent,
    Link,
    Image,
    Video,
    Formula,
    Color,
    Background,
    Script,
    Align,
    Direction,
    GrammarError,
}

impl Format {
    pub const ALL: [Format; 22] = [
        Format::Header,
        Format::Font,
        Format::Size,
        Format::Bold,
        Format::Italic,
        Format::Underline,
        Format::Strike,
        Format::Blockquote,
        Format::CodeBlock,
        Format::List,
        Format::Bullet,
        Format::Indent,
        Format::Link,
        Format::Image,
        Format::Video,
        Format::Formula,
        Format::Color,
        Format::Background,
        Format::Script,
        Format::Align,
        Format::Direction,
        Format::GrammarError,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Format::Header => "header",
            Format::Font => "font",
            Format::Size => "size",
            Format::Bold => "bold",
            Format::Italic => "italic",
            Format::Underline => "underline",
            Format::Strike => "strike",
            Format::Blockquote => "blockquote",
            Format::CodeBlock => "code-block",
            Format::List => "list",
            Format::Bullet => "bullet",
            Format::Indent => "indent",
            Format::Link => "link",
            Format::Image => "image",
            Format::Video => "video",
            Format::Formula => "formula",
            Format::Color => "color",
            Format::Background => "background",
            Format::Script => "script",
            Format::Align => "align",
            Format::Direction => "direction",
            Format::GrammarError => "grammarError",
        }
    }

    /// Look up an allow-listed format by name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.name() == name)
    }

    pub fn scope(&self) -> Scope {
        match self {
            Format::Header
            | Format::Blockquote
            | Format::CodeBlock
            | Format::List
            | Format::Bullet
            | Format::Indent
            | Format::Align
            | Format::Direction => Scope::Block,
            Format::Image | Format::Video | Format::Formula => Scope::Embed,
            Format::Font
            | Format::Size
            | Format::Bold
            | Format::Italic
            | Format::Underline
            | Format::Strike
            | Format::Link
            | Format::Color
            | Format::Background
            | Format::Script
            | Format::GrammarError => Scope::Inline,
        }
    }

    /// Formats that take a value rather than being simply on or off.
    pub fn takes_value(&self) -> bool {
        matches!(
            self,
            Format::Header
                | Format::Font
                | Format::Size
                | Format::List
                | Format::Indent
                | Format::Link
                | Format::Color
                | Format::Background
                | Format::Script
                | Format::Align
                | Format::Direction
        )
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Value of one format on a run of text or a line.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AttrValue {
    Enabled,
    Value(String),
}

impl AttrValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttrValue::Enabled => None,
            AttrValue::Value(v) => Some(v),
        }
    }
}

impl From<&str> for AttrValue {
    fn from(value: &str) -> Self {
        AttrValue::Value(value.to_string())
    }
}

pub type Attributes = BTreeMap<Format, AttrValue>;

/// The subset of `attrs` with the given scope.
pub fn scoped(attrs: &Attributes, scope: Scope) -> Attributes {
    attrs
        .iter()
        .filter(|(f, _)| f.scope() == scope)
        .map(|(f, v)| (*f, v.clone()))
        .collect()
}
