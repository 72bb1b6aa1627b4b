//! Resumable HTML tokenizer.
//!
//! Input arrives in arbitrary pieces. Anything that is not yet syntactically
//! complete (a tag without its `>`, an open quoted value, a comment without
//! `-->`, a raw-text body without its end tag) stays buffered and is retried
//! when the next piece is fed.
//!
//! Known limitations (intentional):
//! - Not the full HTML5 tokenizer state machine; no WHATWG parse-error recovery
//!   beyond literal `<` and bogus comments.
//! - Raw-text handling (`script`, `style`, `textarea`, `title`) is decided by
//!   tag name only, regardless of namespace.

use crate::attr::{Attrs, AttrsMutExt, Tag};
use crate::error::{MorphError, MorphResult};

use super::entities::decode_entities;

const COMMENT_START: &str = "<!--";
const COMMENT_END: &str = "-->";
const DOCTYPE_START: &str = "<!doctype";

/// Token produced by the tokenizer.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Token {
    StartTag {
        name: Tag,
        attrs: Attrs,
        self_closing: bool,
    },
    EndTag(Tag),
    Text(String),
    Comment(String),
    Doctype(String),
}

/// Outcome of scanning one markup construct starting at `<`.
enum Markup {
    /// Complete token and its byte length
    Token(Token, usize),
    /// Construct consumed without producing a token (e.g. `</>`)
    Skip(usize),
    /// `<` that does not start markup
    Literal,
    /// Construct is incomplete; carries what was being scanned
    NeedMore(&'static str),
}

/// Raw-text element whose body is being buffered.
#[derive(Debug)]
struct RawText {
    tag: Tag,
    /// RCDATA (`textarea`, `title`) decodes references, RAWTEXT does not
    decode: bool,
}

/// Streaming tokenizer state
///
/// A `<` is only known to be literal once the byte after it is seen. A
/// stream ending on a bare `<` (`"a <"`) therefore fails with
/// `Truncated { context: "tag" }` instead of emitting the text.
#[derive(Debug, Default)]
pub(crate) struct Tokenizer {
    /// Unconsumed input
    buf: String,
    /// Raw (undecoded) text run not yet emitted
    text: String,
    /// Set while inside a raw-text element
    raw: Option<RawText>,
}

impl Tokenizer {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Append input.
    pub(crate) fn feed(&mut self, input: &str) {
        self.buf.push_str(input);
    }

    /// Emit every complete token; at `eof`, unterminated constructs are errors.
    pub(crate) fn tokenize(&mut self, out: &mut Vec<Token>, eof: bool) -> MorphResult<()> {
        let mut pos = 0;
        let result = self.scan(&mut pos, out, eof);
        self.buf.drain(..pos);
        result?;
        if eof {
            self.flush_text(out);
        }
        Ok(())
    }

    fn scan(&mut self, pos: &mut usize, out: &mut Vec<Token>, eof: bool) -> MorphResult<()> {
        loop {
            if let Some(raw) = &self.raw {
                match find_raw_close(&self.buf[*pos..], &raw.tag) {
                    Some((body_end, close_end)) => {
                        let body = &self.buf[*pos..*pos + body_end];
                        if !body.is_empty() {
                            let content = if raw.decode {
                                decode_entities(body).into_owned()
                            } else {
                                body.to_string()
                            };
                            out.push(Token::Text(content));
                        }
                        out.push(Token::EndTag(raw.tag.clone()));
                        *pos += close_end;
                        self.raw = None;
                        continue;
                    }
                    None if eof => return Err(MorphError::truncated("raw text element")),
                    None => return Ok(()),
                }
            }

            let rest = &self.buf[*pos..];
            if rest.is_empty() {
                return Ok(());
            }
            match rest.find('<') {
                None => {
                    self.text.push_str(rest);
                    *pos += rest.len();
                    return Ok(());
                }
                Some(0) => {}
                Some(i) => {
                    self.text.push_str(&rest[..i]);
                    *pos += i;
                    continue;
                }
            }

            match scan_markup(rest) {
                Markup::Token(token, len) => {
                    self.flush_text(out);
                    if let Token::StartTag {
                        name,
                        self_closing: false,
                        ..
                    } = &token
                    {
                        self.raw = raw_text_mode(name);
                    }
                    out.push(token);
                    *pos += len;
                }
                Markup::Skip(len) => *pos += len,
                Markup::Literal => {
                    self.text.push('<');
                    *pos += 1;
                }
                Markup::NeedMore(context) if eof => return Err(MorphError::truncated(context)),
                Markup::NeedMore(_) => return Ok(()),
            }
        }
    }

    fn flush_text(&mut self, out: &mut Vec<Token>) {
        if self.text.is_empty() {
            return;
        }
        let content = decode_entities(&self.text).into_owned();
        self.text.clear();
        out.push(Token::Text(content));
    }
}

fn raw_text_mode(tag: &str) -> Option<RawText> {
    let decode = match tag {
        "script" | "style" => false,
        "textarea" | "title" => true,
        _ => return None,
    };
    Some(RawText {
        tag: tag.into(),
        decode,
    })
}

/// Find `</tag\s*>` (ASCII case-insensitive). Returns (body end, close end).
fn find_raw_close(hay: &str, tag: &str) -> Option<(usize, usize)> {
    let bytes = hay.as_bytes();
    let tag = tag.as_bytes();
    let mut from = 0;
    while let Some(rel) = hay[from..].find("</") {
        let start = from + rel;
        let name_end = start + 2 + tag.len();
        if name_end > bytes.len() {
            return None;
        }
        if bytes[start + 2..name_end].eq_ignore_ascii_case(tag) {
            let mut k = name_end;
            while k < bytes.len() && bytes[k].is_ascii_whitespace() {
                k += 1;
            }
            if k >= bytes.len() {
                return None;
            }
            if bytes[k] == b'>' {
                return Some((start, k + 1));
            }
        }
        from = start + 2;
    }
    None
}

/// Scan one construct; `rest` starts with `<`.
fn scan_markup(rest: &str) -> Markup {
    let bytes = rest.as_bytes();
    let Some(&next) = bytes.get(1) else {
        return Markup::NeedMore("tag");
    };
    match next {
        b'!' => scan_bang(rest),
        b'?' => bogus_comment(rest, 1),
        b'/' => match bytes.get(2) {
            None => Markup::NeedMore("end tag"),
            Some(b'>') => Markup::Skip(3),
            Some(b) if b.is_ascii_alphabetic() => scan_end_tag(rest),
            Some(_) => bogus_comment(rest, 2),
        },
        b if b.is_ascii_alphabetic() => scan_start_tag(rest),
        _ => Markup::Literal,
    }
}

fn scan_bang(rest: &str) -> Markup {
    if let Some(body) = rest.strip_prefix(COMMENT_START) {
        return match body.find(COMMENT_END) {
            Some(end) => Markup::Token(
                Token::Comment(body[..end].to_string()),
                COMMENT_START.len() + end + COMMENT_END.len(),
            ),
            None => Markup::NeedMore("comment"),
        };
    }
    if COMMENT_START.starts_with(rest) {
        return Markup::NeedMore("comment");
    }

    let prefix_len = rest.len().min(DOCTYPE_START.len());
    if rest.as_bytes()[..prefix_len].eq_ignore_ascii_case(&DOCTYPE_START.as_bytes()[..prefix_len]) {
        if prefix_len < DOCTYPE_START.len() {
            return Markup::NeedMore("doctype");
        }
        return match rest.find('>') {
            Some(end) => Markup::Token(
                Token::Doctype(rest[DOCTYPE_START.len()..end].trim().to_string()),
                end + 1,
            ),
            None => Markup::NeedMore("doctype"),
        };
    }

    bogus_comment(rest, 2)
}

fn bogus_comment(rest: &str, skip: usize) -> Markup {
    match rest.find('>') {
        Some(end) => Markup::Token(Token::Comment(rest[skip..end].to_string()), end + 1),
        None => Markup::NeedMore("comment"),
    }
}

#[inline]
fn is_space(b: u8) -> bool {
    b.is_ascii_whitespace()
}

fn scan_end_tag(rest: &str) -> Markup {
    let bytes = rest.as_bytes();
    let Some(end) = rest.find('>') else {
        return Markup::NeedMore("end tag");
    };
    let mut i = 2;
    while i < end && !is_space(bytes[i]) && bytes[i] != b'/' {
        i += 1;
    }
    let name = Tag::from(rest[2..i].to_ascii_lowercase());
    Markup::Token(Token::EndTag(name), end + 1)
}

fn scan_start_tag(rest: &str) -> Markup {
    const CONTEXT: &str = "start tag";

    let bytes = rest.as_bytes();
    let len = bytes.len();
    let mut i = 1;
    while i < len && !is_space(bytes[i]) && bytes[i] != b'/' && bytes[i] != b'>' {
        i += 1;
    }
    if i >= len {
        return Markup::NeedMore(CONTEXT);
    }
    let name = Tag::from(rest[1..i].to_ascii_lowercase());
    let mut attrs = Attrs::new();

    loop {
        while i < len && is_space(bytes[i]) {
            i += 1;
        }
        if i >= len {
            return Markup::NeedMore(CONTEXT);
        }
        match bytes[i] {
            b'>' => {
                return Markup::Token(
                    Token::StartTag {
                        name,
                        attrs,
                        self_closing: false,
                    },
                    i + 1,
                );
            }
            b'/' => {
                match bytes.get(i + 1) {
                    None => return Markup::NeedMore(CONTEXT),
                    Some(b'>') => {
                        return Markup::Token(
                            Token::StartTag {
                                name,
                                attrs,
                                self_closing: true,
                            },
                            i + 2,
                        );
                    }
                    Some(_) => i += 1,
                }
            }
            _ => {
                let start = i;
                while i < len
                    && !is_space(bytes[i])
                    && !matches!(bytes[i], b'=' | b'>' | b'/')
                {
                    i += 1;
                }
                // A name can run into the buffer end while still growing.
                if i >= len {
                    return Markup::NeedMore(CONTEXT);
                }
                let attr_name = rest[start..i].to_ascii_lowercase();

                let mut j = i;
                while j < len && is_space(bytes[j]) {
                    j += 1;
                }
                if j >= len {
                    return Markup::NeedMore(CONTEXT);
                }
                let value = if bytes[j] == b'=' {
                    j += 1;
                    while j < len && is_space(bytes[j]) {
                        j += 1;
                    }
                    if j >= len {
                        return Markup::NeedMore(CONTEXT);
                    }
                    match bytes[j] {
                        quote @ (b'"' | b'\'') => {
                            let Some(close) = rest[j + 1..].find(quote as char) else {
                                return Markup::NeedMore("attribute value");
                            };
                            let value = &rest[j + 1..j + 1 + close];
                            i = j + 1 + close + 1;
                            value
                        }
                        _ => {
                            let value_start = j;
                            while j < len && !is_space(bytes[j]) && bytes[j] != b'>' {
                                j += 1;
                            }
                            if j >= len {
                                return Markup::NeedMore(CONTEXT);
                            }
                            i = j;
                            &rest[value_start..j]
                        }
                    }
                } else {
                    ""
                };
                attrs.push_unique(attr_name, &*decode_entities(value));
            }
        }
    }
}
