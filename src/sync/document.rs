//! Structure-aware editing of the frontend's JavaScript configuration.
//!
//! The file is never regenerated. It is tokenized just far enough to know
//! which object property every string literal belongs to, and an edit replaces
//! the bytes of exactly one literal.

use std::ops::Range;

use super::SyncError;

/// A string-valued property found inside an object literal
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StringProperty {
    /// Dotted key path from the outermost object, e.g. `CONTRACTS.PRIVATE_VOTING`
    pub path: String,
    /// Byte range of the literal, quotes included
    pub span: Range<usize>,
    pub quote: char,
}

impl StringProperty {
    /// Raw text between the quotes (escapes are left as written)
    pub fn raw_value<'a>(&self, text: &'a str) -> &'a str {
        &text[self.span.start + 1..self.span.end - 1]
    }

    fn matches(&self, key: &str) -> bool {
        if key.contains('.') {
            self.path == key
        } else {
            self.path.rsplit('.').next() == Some(key)
        }
    }
}

/// A JavaScript config file with an index of its string properties
#[derive(Debug, Clone)]
pub struct ConfigDocument {
    text: String,
    properties: Vec<StringProperty>,
}

impl ConfigDocument {
    pub fn parse(text: String) -> Result<Self, SyncError> {
        let tokens = tokenize(&text)?;
        let properties = index_properties(&text, &tokens);
        Ok(Self { text, properties })
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Find the single string property addressed by `key`.
    ///
    /// A dotted key must match a full path; a bare name matches the last
    /// path segment.
    pub fn find(&self, key: &str) -> Result<&StringProperty, SyncError> {
        let mut matches = self.properties.iter().filter(|p| p.matches(key));
        let first = matches
            .next()
            .ok_or_else(|| SyncError::KeyNotFound(key.to_string()))?;

        let extra = matches.count();
        if extra > 0 {
            return Err(SyncError::AmbiguousKey {
                key: key.to_string(),
                count: extra + 1,
            });
        }

        Ok(first)
    }

    pub fn get_string(&self, key: &str) -> Result<&str, SyncError> {
        Ok(self.find(key)?.raw_value(&self.text))
    }

    /// Replace the contents of the literal at `key` with `value`, keeping its
    /// quote character. Returns the previous raw value.
    pub fn set_string(&mut self, key: &str, value: &str) -> Result<String, SyncError> {
        let property = self.find(key)?.clone();

        if value.contains(['\\', '\n', '\r', property.quote]) {
            return Err(SyncError::UnquotableValue(value.to_string()));
        }

        let previous = property.raw_value(&self.text).to_string();
        let mut text = String::with_capacity(self.text.len() + value.len());
        text.push_str(&self.text[..property.span.start]);
        text.push(property.quote);
        text.push_str(value);
        text.push(property.quote);
        text.push_str(&self.text[property.span.end..]);

        *self = Self::parse(text)?;
        Ok(previous)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Ident,
    Str(char),
    Punct(u8),
    Other,
}

#[derive(Debug, Clone)]
struct Token {
    kind: Kind,
    span: Range<usize>,
}

fn is_ident_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_' || b == b'$'
}

fn is_ident_continue(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'$'
}

fn tokenize(src: &str) -> Result<Vec<Token>, SyncError> {
    let bytes = src.as_bytes();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];
        let start = i;

        match b {
            b if b.is_ascii_whitespace() => i += 1,
            b'/' if bytes.get(i + 1) == Some(&b'/') => {
                while i < bytes.len() && bytes[i] != b'\n' {
                    i += 1;
                }
            }
            b'/' if bytes.get(i + 1) == Some(&b'*') => {
                let close = src[i + 2..]
                    .find("*/")
                    .ok_or(SyncError::Unterminated { what: "comment", offset: start })?;
                i += 2 + close + 2;
            }
            b'\'' | b'"' | b'`' => {
                i += 1;
                loop {
                    match bytes.get(i) {
                        None => {
                            return Err(SyncError::Unterminated { what: "string", offset: start });
                        }
                        Some(&b'\\') => i += 2,
                        Some(&b'\n') if b != b'`' => {
                            return Err(SyncError::Unterminated { what: "string", offset: start });
                        }
                        Some(&c) if c == b => {
                            i += 1;
                            break;
                        }
                        Some(_) => i += 1,
                    }
                }
                tokens.push(Token {
                    kind: Kind::Str(b as char),
                    span: start..i,
                });
            }
            b if is_ident_start(b) => {
                while i < bytes.len() && is_ident_continue(bytes[i]) {
                    i += 1;
                }
                tokens.push(Token {
                    kind: Kind::Ident,
                    span: start..i,
                });
            }
            b if b.is_ascii_digit() => {
                while i < bytes.len() && (is_ident_continue(bytes[i]) || bytes[i] == b'.') {
                    i += 1;
                }
                tokens.push(Token {
                    kind: Kind::Other,
                    span: start..i,
                });
            }
            b if b.is_ascii_punctuation() => {
                i += 1;
                tokens.push(Token {
                    kind: Kind::Punct(b),
                    span: start..i,
                });
            }
            _ => {
                i += 1;
                tokens.push(Token {
                    kind: Kind::Other,
                    span: start..i,
                });
            }
        }
    }

    Ok(tokens)
}

#[derive(Debug)]
enum Frame {
    Object {
        path: Vec<String>,
        key: Option<String>,
        /// Token index of the `:` after `key`
        colon: Option<usize>,
        expect_key: bool,
    },
    /// `[...]` or `(...)`; carries the path of the property it is the value of
    Group { path: Vec<String> },
}

impl Frame {
    fn path(&self) -> &[String] {
        match self {
            Frame::Object { path, .. } | Frame::Group { path } => path,
        }
    }
}

/// Walk the token stream and record every `key: 'string'` pair with its path.
fn index_properties(src: &str, tokens: &[Token]) -> Vec<StringProperty> {
    let mut stack: Vec<Frame> = Vec::new();
    let mut properties = Vec::new();

    for (idx, token) in tokens.iter().enumerate() {
        let next = tokens.get(idx + 1).map(|t| t.kind);

        // Path of the value that starts at this token, if it is a property value
        let value_path = || -> Vec<String> {
            match stack.last() {
                Some(Frame::Object {
                    path,
                    key: Some(key),
                    colon: Some(colon),
                    ..
                }) if *colon + 1 == idx => {
                    let mut path = path.clone();
                    path.push(key.clone());
                    path
                }
                Some(frame) => frame.path().to_vec(),
                None => Vec::new(),
            }
        };

        match token.kind {
            Kind::Punct(b'{') => {
                let path = value_path();
                stack.push(Frame::Object {
                    path,
                    key: None,
                    colon: None,
                    expect_key: true,
                });
            }
            Kind::Punct(b'[' | b'(') => {
                let path = value_path();
                stack.push(Frame::Group { path });
            }
            Kind::Punct(b'}' | b']' | b')') => {
                stack.pop();
            }
            Kind::Punct(b',' | b';') => {
                if let Some(Frame::Object {
                    key,
                    colon,
                    expect_key,
                    ..
                }) = stack.last_mut()
                {
                    *key = None;
                    *colon = None;
                    *expect_key = true;
                }
            }
            Kind::Ident | Kind::Str(_) => {
                let Some(Frame::Object {
                    path,
                    key,
                    colon,
                    expect_key,
                }) = stack.last_mut()
                else {
                    continue;
                };

                if *expect_key {
                    *expect_key = false;
                    if next == Some(Kind::Punct(b':')) {
                        let text = &src[token.span.clone()];
                        let name = match token.kind {
                            Kind::Str(_) => &text[1..text.len() - 1],
                            _ => text,
                        };
                        *key = Some(name.to_string());
                        *colon = Some(idx + 1);
                    }
                    continue;
                }

                if let (Kind::Str(quote), Some(key)) = (token.kind, key.as_ref()) {
                    let is_whole_value = *colon == idx.checked_sub(1)
                        && matches!(
                            next,
                            None | Some(Kind::Punct(b',' | b'}' | b';'))
                        );
                    if is_whole_value {
                        let mut full = path.clone();
                        full.push(key.clone());
                        properties.push(StringProperty {
                            path: full.join("."),
                            span: token.span.clone(),
                            quote,
                        });
                    }
                }
            }
            _ => {}
        }
    }

    properties
}
