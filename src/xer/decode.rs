//! The XER decoder.
//!
//! This is a private module.

use std::str::FromStr;
use crate::containers::{SequenceOf, SetOf};
use crate::decode::{ContentError, Options, Reason};
use crate::descriptor::{Member, TypeDescriptor, TypeKind};
use crate::int::Integer;
use crate::oid::Oid;
use crate::string::{BitString, OctetString};
use crate::value::Value;
use super::lexer::{is_space, Lexer, Token};


//------------ XmlReader -----------------------------------------------------

/// Reads values from XML text.
pub struct XmlReader<'a> {
    /// The source of tokens.
    lexer: Lexer<'a>,

    /// The limits to apply.
    options: Options,

    /// The current nesting depth of constructed values.
    depth: usize,
}

impl<'a> XmlReader<'a> {
    pub fn new(text: &'a str, options: Options) -> Self {
        XmlReader { lexer: Lexer::new(text), options, depth: 0 }
    }

    /// Returns the current byte offset into the text.
    pub fn pos(&self) -> usize {
        self.lexer.pos()
    }

    /// Reads the top-level element and checks that nothing but white space
    /// follows it.
    pub fn document(
        &mut self, ty: &'static TypeDescriptor
    ) -> Result<Value, ContentError> {
        let value = self.element(ty.xml_tag, ty)?;
        self.lexer.skip_space()?;
        match self.lexer.next_token()? {
            Token::Eof => Ok(value),
            _ => Err(ContentError::from_static("trailing data after value"))
        }
    }

    /// Reads an element with the given name.
    fn element(
        &mut self, name: &str, ty: &'static TypeDescriptor
    ) -> Result<Value, ContentError> {
        self.lexer.skip_space()?;
        self.start(name)?;
        let value = self.content(ty)?;
        self.end(name)?;
        Ok(value)
    }

    fn start(&mut self, name: &str) -> Result<(), ContentError> {
        match self.lexer.next_token()? {
            Token::Start(found) if found == name => Ok(()),
            Token::Eof => Err(ContentError::incomplete()),
            token => Err(unexpected(name, &token))
        }
    }

    fn end(&mut self, name: &str) -> Result<(), ContentError> {
        self.lexer.skip_space()?;
        match self.lexer.next_token()? {
            Token::End(found) if found == name => Ok(()),
            Token::Eof => Err(ContentError::incomplete()),
            token => Err(unexpected(name, &token))
        }
    }

    /// Reads the content of an element after its start tag.
    fn content(
        &mut self, ty: &'static TypeDescriptor
    ) -> Result<Value, ContentError> {
        match ty.kind {
            TypeKind::Boolean => {
                let text = self.lexer.text()?;
                if !is_space(&text) {
                    return match text.trim() {
                        "true" | "1" => Ok(Value::Boolean(true)),
                        "false" | "0" => Ok(Value::Boolean(false)),
                        _ => Err(ContentError::from_static("invalid boolean"))
                    }
                }
                let value = match self.lexer.next_token()? {
                    Token::Start("true") => true,
                    Token::Start("false") => false,
                    _ => {
                        return Err(ContentError::from_static(
                            "invalid boolean"
                        ))
                    }
                };
                self.end(if value { "true" } else { "false" })?;
                Ok(Value::Boolean(value))
            }
            TypeKind::Null => Ok(Value::Null),
            TypeKind::Integer => {
                let text = self.lexer.text()?;
                Integer::from_decimal(text.trim()).map(Value::Integer)
            }
            TypeKind::Enumerated(spec) => {
                self.lexer.skip_space()?;
                let name = match self.lexer.next_token()? {
                    Token::Start(name) => name,
                    _ => {
                        return Err(ContentError::from_static(
                            "expected enumeration item"
                        ))
                    }
                };
                let value = spec.name_to_value(name).ok_or_else(|| {
                    ContentError::with_reason_boxed(
                        Reason::Constraint,
                        Box::new(format!("unknown item {}", name))
                    )
                })?;
                self.end(name)?;
                Ok(Value::Enumerated(value))
            }
            TypeKind::OctetString(kind) => {
                let text = self.lexer.text()?;
                let data = if kind.is_text() {
                    kind.from_text(&text)?
                }
                else {
                    from_hex(&text)?
                };
                Ok(Value::OctetString(OctetString::from(data)))
            }
            TypeKind::BitString => {
                let text = self.lexer.text()?;
                let digits = text.chars().filter(|ch| !ch.is_whitespace());
                let mut res = BitString::with_bit_len(0);
                for (idx, ch) in digits.enumerate() {
                    match ch {
                        '0' => res.set_bit(idx, false),
                        '1' => res.set_bit(idx, true),
                        _ => {
                            return Err(ContentError::from_static(
                                "invalid bit string"
                            ))
                        }
                    }
                }
                Ok(Value::BitString(res))
            }
            TypeKind::ObjectIdentifier => {
                let text = self.lexer.text()?;
                Oid::from_str(text.trim()).map(Value::Oid).map_err(|_| {
                    ContentError::from_static("invalid object identifier")
                })
            }
            _ => {
                if self.depth >= self.options.max_depth {
                    return Err(ContentError::with_reason(
                        Reason::Overflow, "maximum nesting depth exceeded"
                    ))
                }
                self.depth += 1;
                let res = self.constructed(ty);
                self.depth -= 1;
                res
            }
        }
    }

    fn constructed(
        &mut self, ty: &'static TypeDescriptor
    ) -> Result<Value, ContentError> {
        match ty.kind {
            TypeKind::Sequence(spec) | TypeKind::Set(spec) => {
                let members: &'static [Member] = spec.members;
                let mut slots: Vec<Option<Value>> = Vec::new();
                slots.resize_with(members.len(), || None);
                while let Some(name) = self.next_child()? {
                    let idx = match members.iter().position(|member| {
                        member.name == name
                    }) {
                        Some(idx) => idx,
                        None if spec.extension.is_some() => {
                            self.skip_element(name)?;
                            continue
                        }
                        None => {
                            return Err(ContentError::from(format!(
                                "unexpected member {} in {}", name, ty.name
                            )))
                        }
                    };
                    if slots[idx].is_some() {
                        return Err(ContentError::from(format!(
                            "duplicate member {} in {}", name, ty.name
                        )))
                    }
                    let member = &members[idx];
                    slots[idx] = Some(self.element(name, member.ty)?);
                }
                let root_len = spec.root_len();
                for (idx, (member, slot)) in members.iter().zip(
                    slots.iter_mut()
                ).enumerate() {
                    if slot.is_some() {
                        continue
                    }
                    if let Some(default) = member.default {
                        *slot = Some(default())
                    }
                    else if !member.optional && idx < root_len {
                        return Err(ContentError::from(format!(
                            "missing member {} in {}", member.name, ty.name
                        )))
                    }
                }
                Ok(Value::Sequence(slots))
            }
            TypeKind::SequenceOf(elem) => {
                self.list(elem).map(|items| {
                    Value::SequenceOf(SequenceOf::from(items))
                })
            }
            TypeKind::SetOf(elem) => {
                self.list(elem).map(|items| Value::SetOf(SetOf::from(items)))
            }
            TypeKind::Choice(spec) => {
                let name = self.next_child()?.ok_or_else(|| {
                    ContentError::from_static("missing CHOICE alternative")
                })?;
                let idx = spec.alternatives.iter().position(|alt| {
                    alt.name == name
                }).ok_or_else(|| {
                    ContentError::from(format!(
                        "unknown alternative {} in {}", name, ty.name
                    ))
                })?;
                let alt = &spec.alternatives[idx];
                let value = self.element(name, alt.ty)?;
                Ok(Value::choice(idx, value))
            }
            _ => Err(ContentError::from_static("not a constructed type"))
        }
    }

    fn list(
        &mut self, elem: &'static Member
    ) -> Result<Vec<Value>, ContentError> {
        let mut items = Vec::new();
        while self.next_child()?.is_some() {
            items.push(self.element(elem.name, elem.ty)?);
        }
        Ok(items)
    }

    /// Returns the name of the next child element if there is one.
    ///
    /// The child element’s start tag is not consumed.
    fn next_child(&mut self) -> Result<Option<&'a str>, ContentError> {
        self.lexer.skip_space()?;
        match *self.lexer.peek()? {
            Token::Start(name) => Ok(Some(name)),
            Token::Eof => Err(ContentError::incomplete()),
            _ => Ok(None)
        }
    }

    /// Skips an element and everything it contains.
    fn skip_element(&mut self, name: &str) -> Result<(), ContentError> {
        self.start(name)?;
        let mut depth = 1usize;
        while depth > 0 {
            match self.lexer.next_token()? {
                Token::Start(_) => depth += 1,
                Token::End(_) => depth -= 1,
                Token::Text(_) => { }
                Token::Eof => return Err(ContentError::incomplete())
            }
        }
        Ok(())
    }
}


//------------ Helpers -------------------------------------------------------

fn unexpected(expected: &str, found: &Token) -> ContentError {
    let found = match *found {
        Token::Start(name) => format!("<{}>", name),
        Token::End(name) => format!("</{}>", name),
        Token::Text(_) => String::from("text"),
        Token::Eof => String::from("end of data"),
    };
    ContentError::from(format!("expected {} element, found {}", expected, found))
}

/// Converts hexadecimal digits into octets, ignoring white space.
fn from_hex(text: &str) -> Result<Vec<u8>, ContentError> {
    let digits: Vec<u8> = text.bytes().filter(|ch| {
        !ch.is_ascii_whitespace()
    }).collect();
    if digits.len() % 2 != 0 {
        return Err(ContentError::from_static("odd number of hex digits"))
    }
    digits.chunks(2).map(|pair| {
        let pair = std::str::from_utf8(pair).map_err(|_| {
            ContentError::from_static("invalid hex digit")
        })?;
        u8::from_str_radix(pair, 16).map_err(|_| {
            ContentError::from_static("invalid hex digit")
        })
    }).collect()
}
