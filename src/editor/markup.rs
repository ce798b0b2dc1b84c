//! HTML markup codec.
//!
//! Posts are stored as the HTML the editor emits. [`to_html`] writes the Quill-compatible subset;
//! [`from_html`] reads it back tolerantly, keeping the text of anything outside the allow-list.

use super::document::{Document, Embed, Insert, Line, Op};
use super::format::{AttrValue, Attributes, Format, GRAMMAR_CLASS, GRAMMAR_TOOLTIP};

/// Inline wrappers, outermost first.
const INLINE_ORDER: [Format; 11] = [
    Format::Link,
    Format::GrammarError,
    Format::Font,
    Format::Size,
    Format::Color,
    Format::Background,
    Format::Script,
    Format::Bold,
    Format::Italic,
    Format::Underline,
    Format::Strike,
];

// ---------------------------------------------------------------------------
// Writing
// ---------------------------------------------------------------------------

/// Serialize a document.
pub fn to_html(doc: &Document) -> String {
    let mut out = String::new();
    let lines = doc.lines();
    let mut open_list: Option<&'static str> = None;
    let mut i = 0;

    while i < lines.len() {
        let line = &lines[i];
        let list = list_tag(line);
        if open_list != list {
            if let Some(tag) = open_list {
                out.push_str(&format!("</{}>", tag));
            }
            if let Some(tag) = list {
                out.push_str(&format!("<{}>", tag));
            }
            open_list = list;
        }

        // consecutive code lines share one <pre>
        if line.block.contains_key(&Format::CodeBlock) {
            out.push_str(&format!("<pre{}>", class_attr(line)));
            let mut first = true;
            while i < lines.len() && lines[i].block.contains_key(&Format::CodeBlock) {
                if !first {
                    out.push('\n');
                }
                write_runs(&mut out, &lines[i]);
                first = false;
                i += 1;
            }
            out.push_str("</pre>");
            continue;
        }

        let tag = block_tag(line);
        out.push_str(&format!("<{}{}>", tag, class_attr(line)));
        if line.is_empty() {
            out.push_str("<br>");
        } else {
            write_runs(&mut out, line);
        }
        out.push_str(&format!("</{}>", tag));
        i += 1;
    }

    if let Some(tag) = open_list {
        out.push_str(&format!("</{}>", tag));
    }
    out
}

fn list_tag(line: &Line) -> Option<&'static str> {
    match line.block_value(Format::List).and_then(AttrValue::as_str) {
        Some("ordered") => Some("ol"),
        Some(_) => Some("ul"),
        None => None,
    }
}

fn block_tag(line: &Line) -> String {
    if line.block.contains_key(&Format::List) {
        return "li".to_string();
    }
    if let Some(level) = line
        .block_value(Format::Header)
        .and_then(AttrValue::as_str)
        .and_then(|v| v.parse::<u8>().ok())
        .filter(|l| (1..=6).contains(l))
    {
        return format!("h{}", level);
    }
    if line.block.contains_key(&Format::Blockquote) {
        return "blockquote".to_string();
    }
    "p".to_string()
}

fn class_attr(line: &Line) -> String {
    let mut classes = Vec::new();
    if let Some(v) = line.block_value(Format::Align).and_then(AttrValue::as_str) {
        classes.push(format!("ql-align-{}", v));
    }
    if let Some(v) = line.block_value(Format::Indent).and_then(AttrValue::as_str) {
        classes.push(format!("ql-indent-{}", v));
    }
    if let Some(v) = line.block_value(Format::Direction).and_then(AttrValue::as_str) {
        classes.push(format!("ql-direction-{}", v));
    }
    if classes.is_empty() {
        String::new()
    } else {
        format!(" class=\"{}\"", escape_attr(&classes.join(" ")))
    }
}

fn write_runs(out: &mut String, line: &Line) {
    for run in &line.runs {
        write_run(out, run);
    }
}

fn write_run(out: &mut String, run: &Op) {
    let mut closers = Vec::new();
    for format in INLINE_ORDER {
        let Some(value) = run.attributes.get(&format) else {
            continue;
        };
        if let Some((open, close)) = inline_tags(format, value) {
            out.push_str(&open);
            closers.push(close);
        }
    }

    match &run.insert {
        Insert::Text(text) => out.push_str(&escape_text(text)),
        Insert::Embed(Embed::Image(src)) => {
            out.push_str(&format!("<img src=\"{}\">", escape_attr(src)));
        }
        Insert::Embed(Embed::Video(src)) => out.push_str(&format!(
            "<iframe class=\"ql-video\" frameborder=\"0\" allowfullscreen=\"true\" src=\"{}\"></iframe>",
            escape_attr(src)
        )),
        Insert::Embed(Embed::Formula(source)) => out.push_str(&format!(
            "<span class=\"ql-formula\" data-value=\"{}\"></span>",
            escape_attr(source)
        )),
    }

    for close in closers.iter().rev() {
        out.push_str(close);
    }
}

fn inline_tags(format: Format, value: &AttrValue) -> Option<(String, &'static str)> {
    let v = value.as_str().unwrap_or_default();
    let tags = match format {
        Format::Link => (
            format!(
                "<a href=\"{}\" rel=\"noopener noreferrer\" target=\"_blank\">",
                escape_attr(&safe_href(v))
            ),
            "</a>",
        ),
        Format::GrammarError => (
            format!(
                "<span class=\"{}\" title=\"{}\">",
                GRAMMAR_CLASS, GRAMMAR_TOOLTIP
            ),
            "</span>",
        ),
        Format::Font => (format!("<span class=\"ql-font-{}\">", escape_attr(v)), "</span>"),
        Format::Size => (format!("<span class=\"ql-size-{}\">", escape_attr(v)), "</span>"),
        Format::Color => (
            format!("<span style=\"color: {};\">", safe_css(v)?),
            "</span>",
        ),
        Format::Background => (
            format!("<span style=\"background-color: {};\">", safe_css(v)?),
            "</span>",
        ),
        Format::Script if v == "sub" => ("<sub>".to_string(), "</sub>"),
        Format::Script => ("<sup>".to_string(), "</sup>"),
        Format::Bold => ("<strong>".to_string(), "</strong>"),
        Format::Italic => ("<em>".to_string(), "</em>"),
        Format::Underline => ("<u>".to_string(), "</u>"),
        Format::Strike => ("<s>".to_string(), "</s>"),
        _ => return None,
    };
    Some(tags)
}

/// Links to script URLs become inert.
fn safe_href(href: &str) -> String {
    let lowered = href.trim().to_ascii_lowercase();
    if lowered.starts_with("javascript:") || lowered.starts_with("vbscript:") {
        "about:blank".to_string()
    } else {
        href.trim().to_string()
    }
}

/// Colour values limited to characters that cannot escape a style declaration.
fn safe_css(value: &str) -> Option<String> {
    let value = value.trim();
    let ok = !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "#(),.% -".contains(c));
    ok.then(|| value.to_string())
}

pub fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

pub fn escape_attr(text: &str) -> String {
    escape_text(text).replace('"', "&quot;")
}

// ---------------------------------------------------------------------------
// Reading
// ---------------------------------------------------------------------------

/// Remove tags and decode entities, for previews.
pub fn strip_tags(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut rest = html;
    while let Some(start) = rest.find('<') {
        out.push_str(&rest[..start]);
        rest = match rest[start..].find('>') {
            Some(end) => &rest[start + end + 1..],
            None => "",
        };
    }
    out.push_str(rest);
    decode_entities(&out)
}

pub fn decode_entities(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let after = &rest[amp + 1..];
        let decoded = after
            .find(';')
            .filter(|&semi| semi <= 10)
            .and_then(|semi| decode_entity(&after[..semi]).map(|c| (c, semi)));
        match decoded {
            Some((c, semi)) => {
                out.push(c);
                rest = &after[semi + 1..];
            }
            None => {
                out.push('&');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

fn decode_entity(name: &str) -> Option<char> {
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some('\u{a0}'),
        _ => {
            let code = if let Some(hex) = name.strip_prefix("#x").or(name.strip_prefix("#X")) {
                u32::from_str_radix(hex, 16).ok()?
            } else {
                name.strip_prefix('#')?.parse().ok()?
            };
            char::from_u32(code)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Text(String),
    Open {
        name: String,
        attrs: Vec<(String, String)>,
        self_closing: bool,
    },
    Close(String),
}

fn tokenize(html: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut text = String::new();
    let mut rest = html;

    while let Some(lt) = rest.find('<') {
        text.push_str(&rest[..lt]);
        let tail = &rest[lt..];

        if let Some(comment) = tail.strip_prefix("<!--") {
            rest = comment.find("-->").map_or("", |end| &comment[end + 3..]);
            continue;
        }
        if tail.starts_with("<!") || tail.starts_with("<?") {
            rest = tail.find('>').map_or("", |end| &tail[end + 1..]);
            continue;
        }

        let closing = tail[1..].starts_with('/');
        let name_start = if closing { 2 } else { 1 };
        let starts_with_letter = tail[name_start..]
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic());
        if !starts_with_letter {
            text.push('<');
            rest = &tail[1..];
            continue;
        }

        let Some((token, consumed)) = read_tag(&tail[name_start..], closing) else {
            // unterminated tag: drop the remainder
            rest = "";
            break;
        };
        if !text.is_empty() {
            tokens.push(Token::Text(std::mem::take(&mut text)));
        }
        tokens.push(token);
        rest = &tail[name_start + consumed..];
    }

    text.push_str(rest);
    if !text.is_empty() {
        tokens.push(Token::Text(text));
    }
    tokens
}

/// Read a tag body starting at its name. Returns the token and the bytes consumed, including `>`.
fn read_tag(src: &str, closing: bool) -> Option<(Token, usize)> {
    let name_len = src
        .find(|c: char| c.is_whitespace() || c == '>' || c == '/')
        .unwrap_or(src.len());
    let name = src[..name_len].to_ascii_lowercase();
    let mut pos = name_len;
    let mut attrs = Vec::new();
    let mut self_closing = false;

    loop {
        let rest = &src[pos..];
        let trimmed = rest.trim_start();
        pos += rest.len() - trimmed.len();

        let c = trimmed.chars().next()?;
        if c == '>' {
            pos += 1;
            break;
        }
        if c == '/' {
            self_closing = true;
            pos += 1;
            continue;
        }

        let attr_len = trimmed
            .find(|c: char| c.is_whitespace() || c == '=' || c == '>' || c == '/')
            .unwrap_or(trimmed.len());
        if attr_len == 0 {
            pos += c.len_utf8();
            continue;
        }
        let attr_name = trimmed[..attr_len].to_ascii_lowercase();
        pos += attr_len;

        let after = &src[pos..];
        let after_trimmed = after.trim_start();
        if let Some(value_src) = after_trimmed.strip_prefix('=') {
            pos += after.len() - after_trimmed.len() + 1;
            let value_trimmed = value_src.trim_start();
            pos += value_src.len() - value_trimmed.len();

            let quote = value_trimmed.chars().next()?;
            let value = if quote == '"' || quote == '\'' {
                let end = value_trimmed[1..].find(quote)?;
                pos += end + 2;
                &value_trimmed[1..end + 1]
            } else {
                let end = value_trimmed
                    .find(|c: char| c.is_whitespace() || c == '>')
                    .unwrap_or(value_trimmed.len());
                pos += end;
                &value_trimmed[..end]
            };
            attrs.push((attr_name, decode_entities(value)));
        } else {
            attrs.push((attr_name, String::new()));
        }
    }

    let token = if closing {
        Token::Close(name)
    } else {
        Token::Open {
            name,
            attrs,
            self_closing,
        }
    };
    Some((token, pos))
}

fn attr<'a>(attrs: &'a [(String, String)], name: &str) -> Option<&'a str> {
    attrs
        .iter()
        .find(|(n, _)| n == name)
        .map(|(_, v)| v.as_str())
}

fn classes(attrs: &[(String, String)]) -> Vec<&str> {
    attr(attrs, "class")
        .map(|c| c.split_whitespace().collect())
        .unwrap_or_default()
}

fn is_block(name: &str) -> bool {
    matches!(
        name,
        "p" | "div" | "h1" | "h2" | "h3" | "h4" | "h5" | "h6" | "blockquote" | "pre" | "li"
    )
}

struct BlockFrame {
    tag: String,
    attrs: Attributes,
    had_child_block: bool,
}

struct InlineFrame {
    tag: String,
    formats: Vec<(Format, AttrValue)>,
}

#[derive(Default)]
struct Reader {
    ops: Vec<Op>,
    blocks: Vec<BlockFrame>,
    inline: Vec<InlineFrame>,
    lists: Vec<&'static str>,
    line_has_content: bool,
    skip: Option<(String, usize)>,
}

impl Reader {
    fn block_attrs(&self) -> Attributes {
        self.blocks
            .last()
            .map(|b| b.attrs.clone())
            .unwrap_or_default()
    }

    fn inline_attrs(&self) -> Attributes {
        let mut attrs = Attributes::new();
        for frame in &self.inline {
            for (format, value) in &frame.formats {
                attrs.insert(*format, value.clone());
            }
        }
        attrs
    }

    fn in_pre(&self) -> bool {
        self.blocks.iter().any(|b| b.tag == "pre")
    }

    fn end_line(&mut self) {
        self.ops.push(Op::text("\n", self.block_attrs()));
        self.line_has_content = false;
    }

    fn push_text(&mut self, text: &str) {
        if !text.is_empty() {
            self.ops.push(Op::text(text, self.inline_attrs()));
            self.line_has_content = true;
        }
    }

    fn push_embed(&mut self, embed: Embed) {
        self.ops.push(Op::embed(embed, self.inline_attrs()));
        self.line_has_content = true;
    }

    fn open(&mut self, name: &str, attrs: &[(String, String)], self_closing: bool) {
        if let Some((tag, depth)) = &mut self.skip {
            if tag.as_str() == name && !self_closing {
                *depth += 1;
            }
            return;
        }

        match name {
            "script" | "style" | "head" | "title" | "template" if !self_closing => {
                self.skip = Some((name.to_string(), 1));
            }
            _ if is_block(name) => self.open_block(name, attrs),
            "ol" | "ul" => {
                if self.line_has_content {
                    self.end_line();
                }
                self.lists
                    .push(if name == "ol" { "ordered" } else { "bullet" });
            }
            "br" => {
                if self.line_has_content {
                    self.end_line();
                }
            }
            "img" => {
                if let Some(src) = attr(attrs, "src").filter(|s| !s.is_empty()) {
                    self.push_embed(Embed::Image(src.to_string()));
                }
            }
            "iframe" => {
                if let Some(src) = attr(attrs, "src").filter(|s| !s.is_empty()) {
                    self.push_embed(Embed::Video(src.to_string()));
                }
                if !self_closing {
                    self.skip = Some(("iframe".to_string(), 1));
                }
            }
            "span" if classes(attrs).contains(&"ql-formula") => {
                if let Some(value) = attr(attrs, "data-value") {
                    self.push_embed(Embed::Formula(value.to_string()));
                }
                if !self_closing {
                    self.skip = Some(("span".to_string(), 1));
                }
            }
            _ if self_closing => {}
            _ => {
                let formats = inline_formats(name, attrs);
                self.inline.push(InlineFrame {
                    tag: name.to_string(),
                    formats,
                });
            }
        }
    }

    fn open_block(&mut self, name: &str, attrs: &[(String, String)]) {
        if self.line_has_content {
            self.end_line();
        }
        let mut merged = self.block_attrs();
        if let Some(parent) = self.blocks.last_mut() {
            parent.had_child_block = true;
        }
        for (format, value) in block_formats(name, attrs, self.lists.last().copied()) {
            merged.insert(format, value);
        }
        self.blocks.push(BlockFrame {
            tag: name.to_string(),
            attrs: merged,
            had_child_block: false,
        });
    }

    fn close(&mut self, name: &str) {
        if let Some((tag, depth)) = &mut self.skip {
            if tag.as_str() == name {
                *depth -= 1;
                if *depth == 0 {
                    self.skip = None;
                }
            }
            return;
        }

        if is_block(name) {
            let Some(at) = self.blocks.iter().rposition(|b| b.tag == name) else {
                return;
            };
            while self.blocks.len() > at + 1 {
                self.close_top_block();
            }
            self.close_top_block();
        } else if name == "ol" || name == "ul" {
            if self.line_has_content {
                self.end_line();
            }
            self.lists.pop();
        } else if let Some(at) = self.inline.iter().rposition(|f| f.tag == name) {
            self.inline.remove(at);
        }
    }

    fn close_top_block(&mut self) {
        let emit = match self.blocks.last() {
            Some(frame) => self.line_has_content || !frame.had_child_block,
            None => return,
        };
        if emit {
            self.end_line();
        }
        self.blocks.pop();
    }

    fn text(&mut self, raw: &str) {
        if self.skip.is_some() {
            return;
        }
        let decoded = decode_entities(raw);

        if self.in_pre() {
            for (i, part) in decoded.split('\n').enumerate() {
                if i > 0 {
                    self.end_line();
                }
                self.push_text(part);
            }
            return;
        }

        let collapsed = collapse_whitespace(&decoded);
        if self.blocks.is_empty() && !self.line_has_content && collapsed.trim().is_empty() {
            return;
        }
        let text = if self.line_has_content {
            collapsed.as_str()
        } else {
            collapsed.trim_start()
        };
        self.push_text(text);
    }

    fn finish(mut self) -> Document {
        while !self.blocks.is_empty() {
            self.close_top_block();
        }
        if self.line_has_content {
            self.end_line();
        }
        Document::from_ops(self.ops)
    }
}

fn collapse_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_space = false;
    for c in text.chars() {
        if c.is_ascii_whitespace() {
            if !in_space {
                out.push(' ');
            }
            in_space = true;
        } else {
            out.push(c);
            in_space = false;
        }
    }
    out
}

fn inline_formats(name: &str, attrs: &[(String, String)]) -> Vec<(Format, AttrValue)> {
    let mut formats = Vec::new();
    match name {
        "strong" | "b" => formats.push((Format::Bold, AttrValue::Enabled)),
        "em" | "i" => formats.push((Format::Italic, AttrValue::Enabled)),
        "u" => formats.push((Format::Underline, AttrValue::Enabled)),
        "s" | "strike" | "del" => formats.push((Format::Strike, AttrValue::Enabled)),
        "sub" => formats.push((Format::Script, AttrValue::from("sub"))),
        "sup" => formats.push((Format::Script, AttrValue::from("super"))),
        "a" => {
            if let Some(href) = attr(attrs, "href").filter(|h| !h.trim().is_empty()) {
                formats.push((Format::Link, AttrValue::Value(safe_href(href))));
            }
        }
        "span" => {
            for class in classes(attrs) {
                if class == GRAMMAR_CLASS {
                    formats.push((Format::GrammarError, AttrValue::Enabled));
                } else if let Some(font) = class.strip_prefix("ql-font-") {
                    formats.push((Format::Font, AttrValue::from(font)));
                } else if let Some(size) = class.strip_prefix("ql-size-") {
                    formats.push((Format::Size, AttrValue::from(size)));
                }
            }
            if let Some(style) = attr(attrs, "style") {
                for decl in style.split(';') {
                    let Some((prop, value)) = decl.split_once(':') else {
                        continue;
                    };
                    let Some(value) = safe_css(value) else {
                        continue;
                    };
                    match prop.trim().to_ascii_lowercase().as_str() {
                        "color" => formats.push((Format::Color, AttrValue::Value(value))),
                        "background-color" => {
                            formats.push((Format::Background, AttrValue::Value(value)))
                        }
                        _ => {}
                    }
                }
            }
        }
        _ => {}
    }
    formats
}

fn block_formats(
    name: &str,
    attrs: &[(String, String)],
    list: Option<&'static str>,
) -> Vec<(Format, AttrValue)> {
    let mut formats = Vec::new();
    match name {
        "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
            formats.push((Format::Header, AttrValue::from(&name[1..])));
        }
        "blockquote" => formats.push((Format::Blockquote, AttrValue::Enabled)),
        "pre" => formats.push((Format::CodeBlock, AttrValue::Enabled)),
        "li" => {
            let kind = match attr(attrs, "data-list") {
                Some("ordered") => "ordered",
                Some("bullet") => "bullet",
                _ => list.unwrap_or("bullet"),
            };
            formats.push((Format::List, AttrValue::from(kind)));
        }
        _ => {}
    }

    for class in classes(attrs) {
        if let Some(align) = class.strip_prefix("ql-align-") {
            formats.push((Format::Align, AttrValue::from(align)));
        } else if let Some(indent) = class.strip_prefix("ql-indent-") {
            if indent.parse::<u8>().is_ok() {
                formats.push((Format::Indent, AttrValue::from(indent)));
            }
        } else if let Some(direction) = class.strip_prefix("ql-direction-") {
            formats.push((Format::Direction, AttrValue::from(direction)));
        }
    }
    formats
}

/// Parse stored markup into a document.
pub fn from_html(html: &str) -> Document {
    let mut reader = Reader::default();
    for token in tokenize(html) {
        match token {
            Token::Text(text) => reader.text(&text),
            Token::Open {
                name,
                attrs,
                self_closing,
            } => reader.open(&name, &attrs, self_closing),
            Token::Close(name) => reader.close(&name),
        }
    }
    reader.finish()
}
