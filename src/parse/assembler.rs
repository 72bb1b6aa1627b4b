//! Chunk assembler: bytes in, parse events out.
//!
//! Decodes UTF-8 across chunk boundaries, drives the tokenizer and applies
//! the tree-construction rules (void elements, implicit closes, namespace
//! resolution, depth limit). Events are emitted as soon as the construct
//! they describe is complete.

use tracing::{debug, trace};

use crate::attr::{Attrs, AttrsExt, Tag};
use crate::error::{MorphError, MorphResult, ParseErrorKind};
use crate::node::{Element, Namespace, ParsedNode, Text};

use super::tokenizer::{Token, Tokenizer};

/// Default nesting limit for incoming markup.
pub const DEFAULT_MAX_DEPTH: usize = 512;

/// Event produced by the assembler.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseEvent {
    /// Start of an element; the header carries tag, namespace and attributes
    Open(Box<Element>),
    /// Complete text, comment or doctype
    Leaf(Text),
    /// End of the most recently opened element
    Close(Tag),
}

impl ParseEvent {
    /// Node made available by this event, if any.
    pub fn node(&self) -> Option<ParsedNode<'_>> {
        match self {
            Self::Open(element) => Some(ParsedNode::Element(element)),
            Self::Leaf(text) => Some(ParsedNode::Text(text)),
            Self::Close(_) => None,
        }
    }
}

/// Check if element is a void element (never has children).
pub fn is_void_element(tag: &str) -> bool {
    matches!(
        tag,
        "area"
            | "base"
            | "br"
            | "col"
            | "embed"
            | "hr"
            | "img"
            | "input"
            | "link"
            | "meta"
            | "param"
            | "source"
            | "track"
            | "wbr"
    )
}

#[derive(Debug)]
struct OpenElement {
    tag: Tag,
    ns: Namespace,
}

/// Incremental HTML fragment parser
#[derive(Debug)]
pub struct ChunkAssembler {
    tokenizer: Tokenizer,
    tokens: Vec<Token>,
    /// Trailing bytes of an incomplete UTF-8 sequence
    pending: Vec<u8>,
    /// Bytes handed to the tokenizer so far
    offset: usize,
    open: Vec<OpenElement>,
    context_ns: Namespace,
    context_tag: Option<Tag>,
    max_depth: usize,
}

impl ChunkAssembler {
    /// Create an assembler parsing the content of an element `context_tag`
    /// in namespace `context_ns`.
    pub fn new(context_ns: Namespace, context_tag: Option<&str>, max_depth: usize) -> Self {
        Self {
            tokenizer: Tokenizer::new(),
            tokens: Vec::new(),
            pending: Vec::new(),
            offset: 0,
            open: Vec::new(),
            context_ns,
            context_tag: context_tag.map(Tag::from),
            max_depth,
        }
    }

    /// Current element nesting depth.
    pub fn depth(&self) -> usize {
        self.open.len()
    }

    /// Feed one chunk, appending every newly complete event to `out`.
    pub fn push(&mut self, chunk: &[u8], out: &mut Vec<ParseEvent>) -> MorphResult<()> {
        if self.pending.is_empty() {
            self.push_utf8(chunk)?;
        } else {
            let mut joined = std::mem::take(&mut self.pending);
            joined.extend_from_slice(chunk);
            self.push_utf8(&joined)?;
        }
        self.tokenizer.tokenize(&mut self.tokens, false)?;
        self.build(out)
    }

    /// Signal end of stream: flush trailing text and close open elements.
    pub fn finish(&mut self, out: &mut Vec<ParseEvent>) -> MorphResult<()> {
        if !self.pending.is_empty() {
            return Err(MorphError::truncated("UTF-8 sequence"));
        }
        self.tokenizer.tokenize(&mut self.tokens, true)?;
        self.build(out)?;

        while let Some(elem) = self.open.pop() {
            debug!(tag = %elem.tag, "implicitly closing element at end of stream");
            out.push(ParseEvent::Close(elem.tag));
        }
        Ok(())
    }

    fn push_utf8(&mut self, bytes: &[u8]) -> MorphResult<()> {
        let (valid, tail) = match std::str::from_utf8(bytes) {
            Ok(s) => (s, &[][..]),
            Err(e) if e.error_len().is_none() => {
                let (head, tail) = bytes.split_at(e.valid_up_to());
                let head = std::str::from_utf8(head).map_err(|_| ParseErrorKind::InvalidUtf8 {
                    offset: self.offset + e.valid_up_to(),
                })?;
                (head, tail)
            }
            Err(e) => {
                return Err(ParseErrorKind::InvalidUtf8 {
                    offset: self.offset + e.valid_up_to(),
                }
                .into());
            }
        };
        self.tokenizer.feed(valid);
        self.offset += valid.len();
        self.pending.extend_from_slice(tail);
        Ok(())
    }

    fn build(&mut self, out: &mut Vec<ParseEvent>) -> MorphResult<()> {
        let tokens = std::mem::take(&mut self.tokens);
        for token in tokens {
            match token {
                Token::StartTag {
                    name,
                    attrs,
                    self_closing,
                } => self.open_element(name, attrs, self_closing, out)?,
                Token::EndTag(name) => self.close_element(name, out)?,
                Token::Text(content) => out.push(ParseEvent::Leaf(Text::new(content))),
                Token::Comment(content) => out.push(ParseEvent::Leaf(Text::comment(content))),
                Token::Doctype(content) => out.push(ParseEvent::Leaf(Text::doctype(content))),
            }
        }
        Ok(())
    }

    fn open_element(
        &mut self,
        tag: Tag,
        attrs: Attrs,
        self_closing: bool,
        out: &mut Vec<ParseEvent>,
    ) -> MorphResult<()> {
        if self.open.len() >= self.max_depth {
            return Err(ParseErrorKind::TooDeep(self.max_depth).into());
        }

        let (parent_ns, parent_tag) = match self.open.last() {
            Some(parent) => (parent.ns, Some(parent.tag.as_str())),
            None => (self.context_ns, self.context_tag.as_deref()),
        };
        let ns = attrs
            .get_attr("xmlns")
            .and_then(Namespace::from_uri)
            .unwrap_or_else(|| parent_ns.for_child(parent_tag, &tag));

        let closes_now = self_closing || (ns == Namespace::Html && is_void_element(&tag));
        trace!(tag = %tag, ?ns, depth = self.open.len(), "open");

        let element = Element {
            tag: tag.clone(),
            ns,
            attrs,
            children: Default::default(),
        };
        out.push(ParseEvent::Open(Box::new(element)));

        if closes_now {
            out.push(ParseEvent::Close(tag));
        } else {
            self.open.push(OpenElement { tag, ns });
        }
        Ok(())
    }

    fn close_element(&mut self, tag: Tag, out: &mut Vec<ParseEvent>) -> MorphResult<()> {
        let Some(index) = self.open.iter().rposition(|e| e.tag == tag) else {
            if is_void_element(&tag) {
                trace!(tag = %tag, "ignoring end tag of void element");
                return Ok(());
            }
            return Err(ParseErrorKind::UnexpectedEndTag(tag).into());
        };

        while self.open.len() > index + 1 {
            if let Some(elem) = self.open.pop() {
                debug!(tag = %elem.tag, closed_by = %tag, "implicitly closing element");
                out.push(ParseEvent::Close(elem.tag));
            }
        }
        self.open.truncate(index);
        trace!(tag = %tag, "close");
        out.push(ParseEvent::Close(tag));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_chunks(chunks: &[&[u8]]) -> MorphResult<Vec<ParseEvent>> {
        let mut asm = ChunkAssembler::new(Namespace::Html, Some("body"), DEFAULT_MAX_DEPTH);
        let mut out = Vec::new();
        for chunk in chunks {
            asm.push(chunk, &mut out)?;
        }
        asm.finish(&mut out)?;
        Ok(out)
    }

    fn parse(html: &str) -> MorphResult<Vec<ParseEvent>> {
        parse_chunks(&[html.as_bytes()])
    }

    fn open(tag: &str) -> ParseEvent {
        ParseEvent::Open(Box::new(Element::new(tag)))
    }

    fn close(tag: &str) -> ParseEvent {
        ParseEvent::Close(tag.into())
    }

    #[test]
    fn test_events_in_document_order() {
        let events = parse("<p>hi<br>there</p><!--c-->").unwrap();
        assert_eq!(
            events,
            vec![
                open("p"),
                ParseEvent::Leaf(Text::new("hi")),
                open("br"),
                close("br"),
                ParseEvent::Leaf(Text::new("there")),
                close("p"),
                ParseEvent::Leaf(Text::comment("c")),
            ]
        );
    }

    #[test]
    fn test_byte_by_byte_matches_single_chunk() {
        let html = "<ul class=\"x\"><li key=\"a\">caf\u{e9} &amp; \u{1f600}</li><li>b</li></ul>";
        let whole = parse(html).unwrap();
        let bytes: Vec<&[u8]> = html.as_bytes().chunks(1).collect();
        assert_eq!(parse_chunks(&bytes).unwrap(), whole);
    }

    #[test]
    fn test_events_available_before_end() {
        let mut asm = ChunkAssembler::new(Namespace::Html, None, DEFAULT_MAX_DEPTH);
        let mut out = Vec::new();
        asm.push(b"<div><sp", &mut out).unwrap();
        assert_eq!(out, vec![open("div")]);
        asm.push(b"an>", &mut out).unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(asm.depth(), 2);
    }

    #[test]
    fn test_namespaces() {
        let events = parse("<svg><foreignObject><p></p></foreignObject><path/></svg>").unwrap();
        let namespaces: Vec<_> = events
            .iter()
            .filter_map(|e| match e {
                ParseEvent::Open(el) => Some((el.tag.to_string(), el.ns)),
                _ => None,
            })
            .collect();
        assert_eq!(
            namespaces,
            vec![
                ("svg".to_string(), Namespace::Svg),
                ("foreignobject".to_string(), Namespace::Svg),
                ("p".to_string(), Namespace::Html),
                ("path".to_string(), Namespace::Svg),
            ]
        );

        let mut asm = ChunkAssembler::new(Namespace::Svg, Some("g"), DEFAULT_MAX_DEPTH);
        let mut out = Vec::new();
        asm.push(b"<circle/>", &mut out).unwrap();
        assert!(matches!(&out[0], ParseEvent::Open(el) if el.ns == Namespace::Svg));
    }

    #[test]
    fn test_xmlns_overrides_inherited_namespace() {
        let events = parse(concat!(
            "<div xmlns=\"http://www.w3.org/2000/svg\"><rect/></div>",
            "<svg xmlns=\"http://www.w3.org/1999/xhtml\"><b></b></svg>",
            "<p xmlns=\"urn:unknown\"></p>",
        ))
        .unwrap();
        let namespaces: Vec<_> = events
            .iter()
            .filter_map(|e| match e {
                ParseEvent::Open(el) => Some((el.tag.to_string(), el.ns)),
                _ => None,
            })
            .collect();
        assert_eq!(
            namespaces,
            vec![
                ("div".to_string(), Namespace::Svg),
                ("rect".to_string(), Namespace::Svg),
                ("svg".to_string(), Namespace::Html),
                ("b".to_string(), Namespace::Html),
                ("p".to_string(), Namespace::Html),
            ]
        );
    }

    #[test]
    fn test_implicit_closes() {
        let events = parse("<div><span>x</div><p>open").unwrap();
        assert_eq!(
            events,
            vec![
                open("div"),
                open("span"),
                ParseEvent::Leaf(Text::new("x")),
                close("span"),
                close("div"),
                open("p"),
                ParseEvent::Leaf(Text::new("open")),
                close("p"),
            ]
        );
    }

    #[test]
    fn test_parse_errors() {
        let err = parse("<div></span></div>").unwrap_err();
        assert!(matches!(
            err,
            MorphError::Parse(ParseErrorKind::UnexpectedEndTag(ref t)) if t == "span"
        ));

        // Stray void end tags are tolerated
        assert!(parse("<p>a</br></p>").is_ok());

        let invalid: &[u8] = &[0xff, 0x41];
        let err = parse_chunks(&[b"<p>ok".as_slice(), invalid]).unwrap_err();
        assert!(matches!(err, MorphError::Parse(ParseErrorKind::InvalidUtf8 { offset: 5 })));

        let err = parse_chunks(&[b"<p>\xe2\x82".as_slice()]).unwrap_err();
        assert!(matches!(err, MorphError::Truncated { context: "UTF-8 sequence" }));
    }

    #[test]
    fn test_depth_limit() {
        let mut asm = ChunkAssembler::new(Namespace::Html, None, 2);
        let mut out = Vec::new();
        let err = asm.push(b"<a><b><c>", &mut out).unwrap_err();
        assert!(matches!(err, MorphError::Parse(ParseErrorKind::TooDeep(2))));
    }
}
