//! Splitting XML text into tokens.
//!
//! This is a private module.

use std::borrow::Cow;
use crate::decode::{ContentError, Reason};


//------------ Token ---------------------------------------------------------

/// A piece of XML text.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Token<'a> {
    /// A start tag with the element name.
    ///
    /// An empty element tag is reported as a start tag followed by an end
    /// tag.
    Start(&'a str),

    /// An end tag with the element name.
    End(&'a str),

    /// Character data with all references resolved.
    Text(Cow<'a, str>),

    /// The end of the input.
    Eof,
}


//------------ Lexer ---------------------------------------------------------

/// A pull tokenizer for the subset of XML used by XER.
///
/// The lexer skips the XML declaration, processing instructions,
/// comments, and document type declarations. Attributes are skipped, too.
/// It doesn’t check that the document is well-formed beyond what is
/// needed to produce the tokens.
pub struct Lexer<'a> {
    /// The complete input.
    text: &'a str,

    /// The byte offset of the next token.
    pos: usize,

    /// The end tag for the empty element tag read last.
    pending_end: Option<&'a str>,

    /// A token that has been peeked at.
    peeked: Option<Token<'a>>,
}

impl<'a> Lexer<'a> {
    pub fn new(text: &'a str) -> Self {
        Lexer { text, pos: 0, pending_end: None, peeked: None }
    }

    /// Returns the current byte offset in the input.
    pub fn pos(&self) -> usize {
        self.pos
    }

    /// Returns the next token without consuming it.
    pub fn peek(&mut self) -> Result<&Token<'a>, ContentError> {
        if self.peeked.is_none() {
            self.peeked = Some(self.read()?);
        }
        match self.peeked {
            Some(ref token) => Ok(token),
            None => Err(ContentError::from_static("lexer lost a token"))
        }
    }

    /// Returns the next token.
    pub fn next_token(&mut self) -> Result<Token<'a>, ContentError> {
        match self.peeked.take() {
            Some(token) => Ok(token),
            None => self.read()
        }
    }

    /// Skips over text consisting only of white space.
    ///
    /// Returns an error if there is text with anything else.
    pub fn skip_space(&mut self) -> Result<(), ContentError> {
        while let Token::Text(text) = self.peek()? {
            if !is_space(text) {
                return Err(ContentError::from_static(
                    "unexpected text between elements"
                ))
            }
            self.next_token()?;
        }
        Ok(())
    }

    /// Collects all text up to the next tag.
    pub fn text(&mut self) -> Result<Cow<'a, str>, ContentError> {
        let mut res = Cow::Borrowed("");
        while let Token::Text(_) = self.peek()? {
            if let Token::Text(text) = self.next_token()? {
                if res.is_empty() {
                    res = text
                }
                else {
                    res.to_mut().push_str(&text)
                }
            }
        }
        Ok(res)
    }

    fn read(&mut self) -> Result<Token<'a>, ContentError> {
        if let Some(name) = self.pending_end.take() {
            return Ok(Token::End(name))
        }
        let text = self.text;
        loop {
            let rest = &text[self.pos..];
            if rest.is_empty() {
                return Ok(Token::Eof)
            }
            if !rest.starts_with('<') {
                let len = rest.find('<').unwrap_or(rest.len());
                self.pos += len;
                return unescape(&rest[..len]).map(Token::Text)
            }
            if rest.starts_with("<!--") {
                self.skip_past("-->")?;
            }
            else if rest.starts_with("<?") {
                self.skip_past("?>")?;
            }
            else if rest.starts_with("<!") {
                self.skip_past(">")?;
            }
            else {
                return self.read_tag()
            }
        }
    }

    fn skip_past(&mut self, end: &str) -> Result<(), ContentError> {
        match self.text[self.pos..].find(end) {
            Some(idx) => {
                self.pos += idx + end.len();
                Ok(())
            }
            None => Err(ContentError::incomplete())
        }
    }

    fn read_tag(&mut self) -> Result<Token<'a>, ContentError> {
        let text = self.text;
        let rest = &text[self.pos..];
        let len = rest.find('>').ok_or_else(ContentError::incomplete)?;
        let inner = &rest[1..len];
        self.pos += len + 1;
        if let Some(name) = inner.strip_prefix('/') {
            return tag_name(name.trim_end()).map(Token::End)
        }
        let (inner, empty) = match inner.strip_suffix('/') {
            Some(inner) => (inner, true),
            None => (inner, false)
        };
        let end = inner.find(|ch: char| {
            ch.is_ascii_whitespace()
        }).unwrap_or(inner.len());
        let name = tag_name(&inner[..end])?;
        if empty {
            self.pending_end = Some(name);
        }
        Ok(Token::Start(name))
    }
}


//------------ Helpers -------------------------------------------------------

/// Returns whether the text contains only XML white space.
pub fn is_space(text: &str) -> bool {
    text.bytes().all(|ch| matches!(ch, b' ' | b'\t' | b'\r' | b'\n'))
}

fn tag_name(name: &str) -> Result<&str, ContentError> {
    let valid = !name.is_empty() && name.chars().all(|ch| {
        ch.is_alphanumeric() || matches!(ch, '_' | '-' | '.' | ':')
    });
    if valid {
        Ok(name)
    }
    else {
        Err(ContentError::from_static("invalid element name"))
    }
}

/// Resolves the references in character data.
fn unescape(text: &str) -> Result<Cow<str>, ContentError> {
    if !text.contains('&') {
        return Ok(Cow::Borrowed(text))
    }
    let mut res = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find('&') {
        res.push_str(&rest[..start]);
        rest = &rest[start + 1..];
        let end = rest.find(';').ok_or_else(|| {
            ContentError::from_static("unterminated reference")
        })?;
        res.push(resolve(&rest[..end])?);
        rest = &rest[end + 1..];
    }
    res.push_str(rest);
    Ok(Cow::Owned(res))
}

fn resolve(name: &str) -> Result<char, ContentError> {
    let code = match name {
        "lt" => return Ok('<'),
        "gt" => return Ok('>'),
        "amp" => return Ok('&'),
        "quot" => return Ok('"'),
        "apos" => return Ok('\''),
        _ => {
            if let Some(hex) = name.strip_prefix("#x") {
                u32::from_str_radix(hex, 16).ok()
            }
            else if let Some(dec) = name.strip_prefix('#') {
                dec.parse::<u32>().ok()
            }
            else {
                None
            }
        }
    };
    code.and_then(char::from_u32).ok_or_else(|| {
        ContentError::with_reason_boxed(
            Reason::Malformed,
            Box::new(format!("invalid reference &{};", name))
        )
    })
}


//============ Tests =========================================================

#[cfg(test)]
mod test {
    use super::*;

    fn tokens(text: &str) -> Vec<Token> {
        let mut lexer = Lexer::new(text);
        let mut res = Vec::new();
        loop {
            match lexer.next_token().unwrap() {
                Token::Eof => return res,
                token => res.push(token)
            }
        }
    }

    #[test]
    fn tags_and_text() {
        assert_eq!(
            tokens(
                "<?xml version=\"1.0\"?><!-- hi --><a x=\"1\">\
                 one &lt;&#65;&#x42;&gt;<b/></a >"
            ),
            [
                Token::Start("a"),
                Token::Text("one <AB>".into()),
                Token::Start("b"),
                Token::End("b"),
                Token::End("a"),
            ]
        );
    }

    #[test]
    fn errors() {
        let mut lexer = Lexer::new("<a");
        assert_eq!(
            lexer.next_token().unwrap_err().reason(), Reason::Incomplete
        );
        let mut lexer = Lexer::new("&bogus;");
        assert!(lexer.next_token().is_err());
        let mut lexer = Lexer::new("<>");
        assert!(lexer.next_token().is_err());
    }

    #[test]
    fn text_and_space() {
        let mut lexer = Lexer::new("  \n<a>x&amp;y</a>");
        lexer.skip_space().unwrap();
        assert_eq!(lexer.next_token().unwrap(), Token::Start("a"));
        assert_eq!(lexer.text().unwrap(), "x&y");
        assert_eq!(lexer.next_token().unwrap(), Token::End("a"));

        let mut lexer = Lexer::new("x<a/>");
        assert!(lexer.skip_space().is_err());
    }
}
