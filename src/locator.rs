use crate::token::{Token, TokenKind, TokenSource};
use crate::CrawlerError;
use std::fmt;

/// A predicate over tokens. Build one with the constructors and combine
/// them with [`Matcher::and`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Matcher {
    Kind(TokenKind),
    Tag(String),
    AttrContains { key: String, needle: String },
    AttrEquals { key: String, value: String },
    And(Box<Matcher>, Box<Matcher>),
}

impl Matcher {
    pub fn kind(kind: TokenKind) -> Self {
        Matcher::Kind(kind)
    }

    pub fn tag(name: &str) -> Self {
        Matcher::Tag(name.to_string())
    }

    pub fn start_tag(name: &str) -> Self {
        Matcher::kind(TokenKind::StartTag).and(Matcher::tag(name))
    }

    pub fn text() -> Self {
        Matcher::kind(TokenKind::Text)
    }

    pub fn and(self, other: Matcher) -> Self {
        Matcher::And(Box::new(self), Box::new(other))
    }

    /// Class attributes hold several space separated names, so this is a
    /// substring test.
    pub fn with_attr_containing(self, key: &str, needle: &str) -> Self {
        self.and(Matcher::AttrContains {
            key: key.to_string(),
            needle: needle.to_string(),
        })
    }

    pub fn with_attr(self, key: &str, value: &str) -> Self {
        self.and(Matcher::AttrEquals {
            key: key.to_string(),
            value: value.to_string(),
        })
    }

    pub fn matches(&self, token: &Token) -> bool {
        match self {
            Matcher::Kind(kind) => token.kind == *kind,
            Matcher::Tag(name) => token.kind != TokenKind::Text && token.name == *name,
            Matcher::AttrContains { key, needle } => token
                .attrs
                .iter()
                .any(|(k, v)| k == key && v.contains(needle.as_str())),
            Matcher::AttrEquals { key, value } => {
                token.attrs.iter().any(|(k, v)| k == key && v == value)
            }
            Matcher::And(a, b) => a.matches(token) && b.matches(token),
        }
    }
}

impl fmt::Display for Matcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Matcher::Kind(kind) => write!(f, "{}", kind),
            Matcher::Tag(name) => write!(f, "<{}>", name),
            Matcher::AttrContains { key, needle } => write!(f, "{}*={:?}", key, needle),
            Matcher::AttrEquals { key, value } => write!(f, "{}={:?}", key, value),
            Matcher::And(a, b) => write!(f, "{} {}", a, b),
        }
    }
}

/// Open element that bounds a scan. Only tags with the same name change the
/// nesting depth.
#[derive(Debug)]
struct Scope {
    tag: String,
    depth: usize,
}

impl Scope {
    /// Returns true when `token` closes the scoped element.
    fn closes(&mut self, token: &Token) -> bool {
        if token.name != self.tag {
            return false;
        }
        match token.kind {
            TokenKind::StartTag => {
                self.depth += 1;
                false
            }
            TokenKind::EndTag if self.depth == 0 => true,
            TokenKind::EndTag => {
                self.depth -= 1;
                false
            }
            TokenKind::Text => false,
        }
    }
}

/// Forward-only scan over a [`TokenSource`].
///
/// Once the source reports end of input or an error, the scanner is done and
/// never reads from it again.
#[derive(Debug)]
pub struct Scanner<S> {
    source: S,
    scope: Option<Scope>,
    done: bool,
}

impl<S: TokenSource> Scanner<S> {
    pub fn new(source: S) -> Self {
        Scanner {
            source,
            scope: None,
            done: false,
        }
    }

    fn next_token(&mut self) -> Result<Option<Token>, CrawlerError> {
        if self.done {
            return Ok(None);
        }
        match self.source.advance() {
            Ok(Some(token)) => {
                if let Some(scope) = self.scope.as_mut() {
                    if scope.closes(&token) {
                        self.done = true;
                        return Ok(None);
                    }
                }
                Ok(Some(token))
            }
            Ok(None) => {
                self.done = true;
                Ok(None)
            }
            Err(e) => {
                self.done = true;
                Err(e)
            }
        }
    }

    /// Advances to the next token accepted by `matcher`.
    pub fn find(&mut self, matcher: &Matcher) -> Result<Token, CrawlerError> {
        while let Some(token) = self.next_token()? {
            if matcher.matches(&token) {
                return Ok(token);
            }
        }
        Err(CrawlerError::LandmarkNotFound(matcher.to_string()))
    }

    pub fn find_text(&mut self) -> Result<String, CrawlerError> {
        Ok(self.find(&Matcher::text())?.text)
    }

    /// Text of the first text token after the next token accepted by
    /// `matcher`.
    pub fn text_after(&mut self, matcher: &Matcher) -> Result<String, CrawlerError> {
        self.find(matcher)?;
        self.find_text()
    }

    /// Restricts the rest of the scan to the element whose start tag `tag`
    /// was just read. Its end tag reads as end of input.
    pub fn enter_scope(&mut self, tag: &str) {
        self.scope = Some(Scope {
            tag: tag.to_string(),
            depth: 0,
        });
    }
}

impl<S: TokenSource> Iterator for Scanner<S> {
    type Item = Result<Token, CrawlerError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_token().transpose()
    }
}
