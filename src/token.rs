use crate::CrawlerError;
use ego_tree::iter::Edge;
use scraper::{Html, Node};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    StartTag,
    EndTag,
    Text,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::StartTag => write!(f, "start tag"),
            TokenKind::EndTag => write!(f, "end tag"),
            TokenKind::Text => write!(f, "text"),
        }
    }
}

/// One lexical unit of a page. `name` and `attrs` are empty for text,
/// `text` is empty for tags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub name: String,
    pub attrs: Vec<(String, String)>,
    pub text: String,
}

impl Token {
    pub fn start<'a, I>(name: &str, attrs: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        Token {
            kind: TokenKind::StartTag,
            name: name.to_string(),
            attrs: attrs
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            text: String::new(),
        }
    }

    pub fn end(name: &str) -> Self {
        Token {
            kind: TokenKind::EndTag,
            name: name.to_string(),
            attrs: vec![],
            text: String::new(),
        }
    }

    pub fn text(text: &str) -> Self {
        Token {
            kind: TokenKind::Text,
            name: String::new(),
            attrs: vec![],
            text: text.to_string(),
        }
    }

    /// Value of the first attribute named `key`.
    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// A forward-only producer of tokens.
///
/// `Ok(None)` is the end of input. Malformed input is reported as
/// `Err(CrawlerError::TokenizeError)` and ends the scan; the two must never be
/// confused by callers.
pub trait TokenSource {
    fn advance(&mut self) -> Result<Option<Token>, CrawlerError>;
}

impl<T: TokenSource + ?Sized> TokenSource for &mut T {
    fn advance(&mut self) -> Result<Option<Token>, CrawlerError> {
        (**self).advance()
    }
}

/// Tokens of a whole HTML document, in document order.
///
/// The document is parsed with html5ever and flattened right away, so every
/// start tag is paired with an end tag (void elements included) and nothing
/// borrows the parsed tree afterwards.
#[derive(Debug)]
pub struct DocumentTokens {
    tokens: std::vec::IntoIter<Token>,
}

impl DocumentTokens {
    /// Tokenizes a fetched body. A body that is not valid UTF-8 is not
    /// decoded lossily: it is a `TokenizeError`, so one mis-encoded detail
    /// page fails that property (or the whole crawl, for the index page).
    pub fn from_bytes(body: &[u8]) -> Result<Self, CrawlerError> {
        let html = std::str::from_utf8(body)
            .map_err(|e| CrawlerError::TokenizeError(format!("body is not utf-8: {}", e)))?;
        Ok(Self::parse(html))
    }

    pub fn parse(html: &str) -> Self {
        let doc = Html::parse_document(html);
        let mut tokens = vec![];
        for edge in doc.tree.root().traverse() {
            match edge {
                Edge::Open(node) => match node.value() {
                    Node::Element(el) => tokens.push(Token::start(el.name(), el.attrs())),
                    Node::Text(text) => tokens.push(Token::text(text)),
                    _ => {}
                },
                Edge::Close(node) => {
                    if let Node::Element(el) = node.value() {
                        tokens.push(Token::end(el.name()));
                    }
                }
            }
        }
        DocumentTokens {
            tokens: tokens.into_iter(),
        }
    }
}

impl TokenSource for DocumentTokens {
    fn advance(&mut self) -> Result<Option<Token>, CrawlerError> {
        Ok(self.tokens.next())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn drain(mut source: DocumentTokens) -> Vec<Token> {
        let mut tokens = vec![];
        while let Some(token) = source.advance().unwrap() {
            tokens.push(token);
        }
        tokens
    }

    #[test]
    fn flattens_body_in_document_order() {
        let tokens = drain(DocumentTokens::parse(
            r#"<html><head></head><body><div id="a"><span class="x y">Hi</span><br></div></body></html>"#,
        ));
        let body: Vec<_> = tokens
            .into_iter()
            .skip_while(|t| t.name != "body")
            .collect();

        assert_eq!(
            body,
            vec![
                Token::start("body", []),
                Token::start("div", [("id", "a")]),
                Token::start("span", [("class", "x y")]),
                Token::text("Hi"),
                Token::end("span"),
                Token::start("br", []),
                Token::end("br"),
                Token::end("div"),
                Token::end("body"),
                Token::end("html"),
            ]
        );
    }

    #[test]
    fn skips_comments_and_doctype() {
        let tokens = drain(DocumentTokens::parse(
            "<!DOCTYPE html><html><body><!-- hidden --><p>shown</p></body></html>",
        ));
        assert!(tokens.iter().all(|t| !t.text.contains("hidden")));
        assert!(tokens.contains(&Token::text("shown")));
    }

    #[test]
    fn attribute_lookup_is_by_name() {
        let token = Token::start("a", [("class", "more"), ("href", "/x")]);
        assert_eq!(token.attr("href"), Some("/x"));
        assert_eq!(token.attr("id"), None);
    }

    #[test]
    fn end_of_input_is_not_an_error() {
        let mut source = DocumentTokens::parse("");
        while source.advance().unwrap().is_some() {}
        assert!(matches!(source.advance(), Ok(None)));
    }

    #[test]
    fn invalid_utf8_is_malformed_input() {
        let res = DocumentTokens::from_bytes(&[b'<', b'p', b'>', 0xff, 0xfe]);
        assert!(matches!(res, Err(CrawlerError::TokenizeError(_))));
    }
}
