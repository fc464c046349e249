//! The resumable BER decoder.
//!
//! This is a private module. Its public items are re-exported by the
//! parent.

use bytes::Bytes;
use log::{debug, trace};
use smallvec::SmallVec;
use crate::decode::{ContentError, Decoded, DecodeError, Options, Pos, Reason};
use crate::descriptor::{
    BIT_STRING, Member, OCTET_STRING, SequenceSpec, TagChain, TypeDescriptor,
    TypeKind,
};
use crate::int::Integer;
use crate::length::Length;
use crate::mode::Mode;
use crate::oid::Oid;
use crate::string::{BitString, OctetString};
use crate::tag::Tag;
use crate::value::Value;


//------------ Decoder -------------------------------------------------------

/// A resumable decoder for a single BER encoded value.
///
/// The decoder is created for the type descriptor of the value to decode.
/// It is then fed the encoded data through [`decode`][Self::decode] until
/// the value is complete.
///
/// Each call processes as much of the given data as it can and reports how
/// many octets it has consumed. If the data ends before the value is
/// complete, the decoder returns [`Decoded::WantMore`]. All progress is
/// kept in the decoder. The next call must start with the octets that
/// weren’t consumed, followed by new data. A header that is only partially
/// available is never consumed, while the content of a primitive value is
/// consumed as it arrives.
///
/// Once the decoder has returned an error or a complete value, it can’t be
/// used any more.
pub struct Decoder {
    /// The type of the value to decode.
    desc: &'static TypeDescriptor,

    /// The decoding mode.
    mode: Mode,

    /// The limits for decoding.
    options: Options,

    /// The stack of partially decoded values.
    stack: SmallVec<[Frame; 8]>,

    /// The number of octets consumed since the start of the value.
    pos: usize,

    /// Where the decoder is at.
    state: State,
}

/// The overall state of a decoder.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum State {
    /// Decoding is in progress.
    Running,

    /// The value has been decoded or decoding has failed.
    Finished,
}

impl Decoder {
    /// Creates a new decoder for a value of the given type.
    pub fn new(desc: &'static TypeDescriptor, mode: Mode) -> Self {
        Self::with_options(desc, mode, Options::default())
    }

    /// Creates a new decoder with the given limits.
    pub fn with_options(
        desc: &'static TypeDescriptor, mode: Mode, options: Options
    ) -> Self {
        let mut stack = SmallVec::new();
        stack.push(Frame::Header {
            ty: desc,
            tags: desc.tags.iter().copied().collect(),
            idx: 0,
        });
        Decoder { desc, mode, options, stack, pos: 0, state: State::Running }
    }

    /// Returns the number of octets consumed so far.
    pub fn pos(&self) -> Pos {
        self.pos.into()
    }

    /// Decodes as much of the value as possible from `data`.
    pub fn decode(
        &mut self, data: &[u8]
    ) -> Result<Decoded<Value>, DecodeError> {
        if self.state == State::Finished {
            return Err(DecodeError::content(
                "decoder has already finished", self.pos.into()
            ))
        }
        let mut consumed = 0;
        loop {
            let rest = data.get(consumed..).unwrap_or(&[]);
            match self.step(rest) {
                Ok(Step::Progress(n)) => {
                    consumed += n;
                    self.pos += n;
                }
                Ok(Step::Done(value, n)) => {
                    consumed += n;
                    self.pos += n;
                    self.state = State::Finished;
                    trace!(
                        "{}: complete after {} octets",
                        self.desc.name, self.pos
                    );
                    return Ok(Decoded::Complete { value, consumed })
                }
                Ok(Step::NeedMore) => {
                    trace!(
                        "{}: want more data after {} octets",
                        self.desc.name, self.pos
                    );
                    return Ok(Decoded::WantMore { consumed })
                }
                Err(err) => {
                    self.state = State::Finished;
                    debug!(
                        "{}: BER decoding failed at {}: {}",
                        self.desc.name, self.pos, err
                    );
                    return Err(DecodeError::content(err, self.pos.into()))
                }
            }
        }
    }

    /// Performs a single step of decoding.
    fn step(&mut self, data: &[u8]) -> Result<Step, ContentError> {
        let frame = match self.stack.pop() {
            Some(frame) => frame,
            None => return Err(ContentError::from_static("decoder stack empty"))
        };
        match frame {
            Frame::Header { ty, tags, idx } => {
                self.step_header(data, ty, tags, idx)
            }
            Frame::Explicit { end, value } => {
                let value = match value {
                    Some(value) => value,
                    None => {
                        return Err(ContentError::from_static(
                            "explicit tag without value"
                        ))
                    }
                };
                match self.at_end(end, data)? {
                    EndCheck::End(n) => self.deliver(value, n),
                    EndCheck::NotEnd => {
                        Err(ContentError::from_static(
                            "trailing data in explicitly tagged value"
                        ))
                    }
                    EndCheck::NeedMore => {
                        self.stack.push(Frame::Explicit {
                            end, value: Some(value)
                        });
                        Ok(Step::NeedMore)
                    }
                }
            }
            Frame::Primitive { ty, remaining, mut buf } => {
                let take = remaining.min(data.len());
                buf.extend_from_slice(data.get(..take).unwrap_or(&[]));
                let remaining = remaining - take;
                if remaining > 0 {
                    self.stack.push(Frame::Primitive { ty, remaining, buf });
                    if take == 0 {
                        return Ok(Step::NeedMore)
                    }
                    return Ok(Step::Progress(take))
                }
                let value = primitive_value(ty, self.mode, buf)?;
                self.deliver(value, take)
            }
            Frame::Fragments { ty, end, buf, unused } => {
                self.step_fragments(data, ty, end, buf, unused)
            }
            Frame::Sequence(seq) => self.step_sequence(data, seq),
            Frame::List { ty, elem, end, items } => {
                match self.at_end(end, data)? {
                    EndCheck::End(n) => {
                        let value = match ty.kind {
                            TypeKind::SetOf(_) => Value::SetOf(items.into()),
                            _ => Value::SequenceOf(items.into())
                        };
                        self.deliver(value, n)
                    }
                    EndCheck::NeedMore => {
                        self.stack.push(Frame::List { ty, elem, end, items });
                        Ok(Step::NeedMore)
                    }
                    EndCheck::NotEnd => {
                        self.stack.push(Frame::List { ty, elem, end, items });
                        self.push_member(elem)?;
                        Ok(Step::Progress(0))
                    }
                }
            }
            Frame::Choice { .. } => {
                Err(ContentError::from_static("choice without value"))
            }
            Frame::Skip { end: None } => {
                let header = match self.read_header(data, self.limit())? {
                    Some(header) => header,
                    None => {
                        self.stack.push(Frame::Skip { end: None });
                        return Ok(Step::NeedMore)
                    }
                };
                trace!("skipping unknown value {}", header.tag);
                if header.length.is_indefinite() && !header.constructed {
                    return Err(ContentError::from_static(
                        "primitive value with indefinite length"
                    ))
                }
                let end = self.end_of(&header);
                self.push_nested(Frame::Skip { end: Some(end) })?;
                Ok(Step::Progress(header.len))
            }
            Frame::Skip { end: Some(End::Definite(end)) } => {
                let take = (end - self.pos).min(data.len());
                if self.pos + take < end {
                    self.stack.push(Frame::Skip {
                        end: Some(End::Definite(end))
                    });
                    if take == 0 {
                        return Ok(Step::NeedMore)
                    }
                }
                Ok(Step::Progress(take))
            }
            Frame::Skip { end: Some(End::Indefinite) } => {
                match self.at_end(End::Indefinite, data)? {
                    EndCheck::End(n) => Ok(Step::Progress(n)),
                    EndCheck::NeedMore => {
                        self.stack.push(Frame::Skip {
                            end: Some(End::Indefinite)
                        });
                        Ok(Step::NeedMore)
                    }
                    EndCheck::NotEnd => {
                        self.stack.push(Frame::Skip {
                            end: Some(End::Indefinite)
                        });
                        self.stack.push(Frame::Skip { end: None });
                        Ok(Step::Progress(0))
                    }
                }
            }
        }
    }

    /// Processes the next tag of a value.
    fn step_header(
        &mut self,
        data: &[u8],
        ty: &'static TypeDescriptor,
        tags: TagChain,
        idx: usize
    ) -> Result<Step, ContentError> {
        let expected = match tags.get(idx) {
            Some(tag) => *tag,
            None => return self.select_alternative(data, ty, tags, idx)
        };
        let header = match self.read_header(data, self.limit())? {
            Some(header) => header,
            None => {
                self.stack.push(Frame::Header { ty, tags, idx });
                return Ok(Step::NeedMore)
            }
        };
        trace!(
            "{}: tag {} constructed {} length {:?}",
            ty.name, header.tag, header.constructed, header.length.get()
        );
        if header.tag != expected {
            return Err(ContentError::from(format!(
                "unexpected tag {} for {}, expected {}",
                header.tag, ty.name, expected
            )))
        }
        let end = self.end_of(&header);
        if idx < TypeDescriptor::explicit_count(&tags, ty) {
            if !header.constructed {
                return Err(ContentError::from_static(
                    "explicit tag with primitive encoding"
                ))
            }
            self.push_nested(Frame::Explicit { end, value: None })?;
            self.stack.push(Frame::Header { ty, tags, idx: idx + 1 });
            return Ok(Step::Progress(header.len))
        }
        let frame = match ty.kind {
            TypeKind::Boolean | TypeKind::Null | TypeKind::Integer |
            TypeKind::Enumerated(_) | TypeKind::ObjectIdentifier => {
                self.primitive_frame(ty, &header)?
            }
            TypeKind::OctetString(_) | TypeKind::BitString => {
                if header.constructed {
                    if !self.mode.allows_constructed_strings() {
                        return Err(ContentError::from_static(
                            "constructed string in DER"
                        ))
                    }
                    Frame::Fragments {
                        ty, end, buf: Vec::new(), unused: None
                    }
                }
                else {
                    self.primitive_frame(ty, &header)?
                }
            }
            TypeKind::Sequence(spec) | TypeKind::Set(spec) => {
                Self::require_constructed(&header)?;
                Frame::Sequence(SequenceFrame {
                    ty, spec, end, next: 0, pending: 0,
                    values: vec![None; spec.members.len()],
                })
            }
            TypeKind::SequenceOf(elem) | TypeKind::SetOf(elem) => {
                Self::require_constructed(&header)?;
                Frame::List { ty, elem, end, items: Vec::new() }
            }
            TypeKind::Choice(_) => {
                return Err(ContentError::from_static(
                    "CHOICE with implicit tag"
                ))
            }
        };
        self.push_nested(frame)?;
        Ok(Step::Progress(header.len))
    }

    /// Picks the alternative of an untagged CHOICE from the next tag.
    fn select_alternative(
        &mut self,
        data: &[u8],
        ty: &'static TypeDescriptor,
        tags: TagChain,
        idx: usize
    ) -> Result<Step, ContentError> {
        let spec = match ty.kind {
            TypeKind::Choice(spec) => spec,
            _ => {
                return Err(ContentError::from(format!(
                    "type {} has no tag", ty.name
                )))
            }
        };
        let tag = match Tag::take_from(data)? {
            Some((tag, _, _)) => tag,
            None => {
                self.stack.push(Frame::Header { ty, tags, idx });
                return Ok(Step::NeedMore)
            }
        };
        let alt = match spec.select(tag) {
            Some(alt) => alt,
            None => {
                return Err(ContentError::from(format!(
                    "no alternative of {} has tag {}", ty.name, tag
                )))
            }
        };
        trace!("{}: alternative {}", ty.name, alt);
        self.stack.push(Frame::Choice { idx: alt });
        let member = spec.alternatives.get(alt).ok_or(
            "invalid alternative"
        )?;
        self.push_member(member)?;
        Ok(Step::Progress(0))
    }

    /// Processes the content of a constructed string.
    fn step_fragments(
        &mut self,
        data: &[u8],
        ty: &'static TypeDescriptor,
        end: End,
        buf: Vec<u8>,
        unused: Option<u8>,
    ) -> Result<Step, ContentError> {
        let is_bits = matches!(ty.kind, TypeKind::BitString);
        match self.at_end(end, data)? {
            EndCheck::End(n) => {
                let value = if is_bits {
                    Value::BitString(BitString::from_slice(
                        unused.unwrap_or(0), &buf
                    )?)
                }
                else {
                    string_value(ty, buf)?
                };
                return self.deliver(value, n)
            }
            EndCheck::NeedMore => {
                self.stack.push(Frame::Fragments { ty, end, buf, unused });
                return Ok(Step::NeedMore)
            }
            EndCheck::NotEnd => { }
        }
        let limit = self.inner_limit(end);
        let header = match self.read_header(data, limit)? {
            Some(header) => header,
            None => {
                self.stack.push(Frame::Fragments { ty, end, buf, unused });
                return Ok(Step::NeedMore)
            }
        };
        let (frag_ty, frag_tag) = if is_bits {
            (&BIT_STRING, Tag::BIT_STRING)
        }
        else {
            (&OCTET_STRING, Tag::OCTET_STRING)
        };
        if header.tag != frag_tag {
            return Err(ContentError::from(format!(
                "unexpected tag {} in constructed {}", header.tag, ty.name
            )))
        }
        let frame = if header.constructed {
            Frame::Fragments {
                ty: frag_ty, end: self.end_of(&header),
                buf: Vec::new(), unused: None
            }
        }
        else {
            self.primitive_frame(frag_ty, &header)?
        };
        self.stack.push(Frame::Fragments { ty, end, buf, unused });
        self.push_nested(frame)?;
        Ok(Step::Progress(header.len))
    }

    /// Processes the content of a SEQUENCE or SET.
    fn step_sequence(
        &mut self, data: &[u8], mut seq: SequenceFrame
    ) -> Result<Step, ContentError> {
        let is_set = matches!(seq.ty.kind, TypeKind::Set(_));
        match self.at_end(seq.end, data)? {
            EndCheck::End(n) => {
                let values = seq.finish()?;
                return self.deliver(Value::Sequence(values), n)
            }
            EndCheck::NeedMore => {
                self.stack.push(Frame::Sequence(seq));
                return Ok(Step::NeedMore)
            }
            EndCheck::NotEnd => { }
        }
        let tag = match Tag::take_from(data)? {
            Some((tag, _, _)) => tag,
            None => {
                self.stack.push(Frame::Sequence(seq));
                return Ok(Step::NeedMore)
            }
        };
        let found = if is_set {
            seq.find_set_member(tag)?
        }
        else {
            seq.find_sequence_member(tag)?
        };
        let spec = seq.spec;
        let members: &'static [Member] = spec.members;
        match found.and_then(|idx| members.get(idx).map(|m| (idx, m))) {
            Some((idx, member)) => {
                trace!("{}: member {}", seq.ty.name, member.name);
                if !is_set {
                    seq.next = idx + 1;
                }
                seq.pending = idx;
                self.stack.push(Frame::Sequence(seq));
                self.push_member(member)?;
            }
            None if spec.extension.is_some() => {
                trace!("{}: skipping unknown extension {}", seq.ty.name, tag);
                self.stack.push(Frame::Sequence(seq));
                self.stack.push(Frame::Skip { end: None });
            }
            None => {
                return Err(ContentError::from(format!(
                    "unexpected tag {} in {}", tag, seq.ty.name
                )))
            }
        }
        Ok(Step::Progress(0))
    }

    /// Hands a complete value to the frame below.
    fn deliver(
        &mut self, mut value: Value, consumed: usize
    ) -> Result<Step, ContentError> {
        loop {
            match self.stack.last_mut() {
                None => return Ok(Step::Done(value, consumed)),
                Some(Frame::Choice { idx }) => {
                    value = Value::Choice(*idx, Box::new(value));
                    self.stack.pop();
                }
                Some(Frame::Explicit { value: slot, .. }) => {
                    *slot = Some(value);
                    break
                }
                Some(Frame::Sequence(seq)) => {
                    match seq.values.get_mut(seq.pending) {
                        Some(slot) => *slot = Some(value),
                        None => {
                            return Err(ContentError::from_static(
                                "invalid member index"
                            ))
                        }
                    }
                    break
                }
                Some(Frame::List { items, .. }) => {
                    items.push(value);
                    break
                }
                Some(Frame::Fragments { buf, unused, .. }) => {
                    if unused.map(|x| x != 0).unwrap_or(false) {
                        return Err(ContentError::from_static(
                            "unused bits in inner bit string fragment"
                        ))
                    }
                    match value {
                        Value::OctetString(octets) => {
                            buf.extend_from_slice(octets.as_slice())
                        }
                        Value::BitString(bits) => {
                            buf.extend_from_slice(bits.octet_slice());
                            *unused = Some(bits.unused());
                        }
                        _ => {
                            return Err(ContentError::from_static(
                                "invalid string fragment"
                            ))
                        }
                    }
                    if buf.len() > self.options.max_size {
                        return Err(ContentError::with_reason(
                            Reason::Overflow, "value exceeds maximum size"
                        ))
                    }
                    break
                }
                Some(_) => {
                    return Err(ContentError::from_static(
                        "value delivered to wrong frame"
                    ))
                }
            }
        }
        Ok(Step::Progress(consumed))
    }

    /// Pushes the header frame for a member.
    fn push_member(&mut self, member: &'static Member) -> Result<(), ContentError> {
        self.stack.push(Frame::Header {
            ty: member.ty, tags: member.tags(), idx: 0
        });
        Ok(())
    }

    /// Pushes a frame for a nested value, enforcing the depth limit.
    fn push_nested(&mut self, frame: Frame) -> Result<(), ContentError> {
        let depth = self.stack.iter().filter(|f| f.end().is_some()).count();
        if frame.end().is_some() && depth >= self.options.max_depth {
            return Err(ContentError::with_reason(
                Reason::Overflow, "maximum nesting depth exceeded"
            ))
        }
        self.stack.push(frame);
        Ok(())
    }

    /// Creates the frame for collecting a primitive value’s content.
    fn primitive_frame(
        &self, ty: &'static TypeDescriptor, header: &Header
    ) -> Result<Frame, ContentError> {
        if header.constructed {
            return Err(ContentError::from(format!(
                "{} with constructed encoding", ty.name
            )))
        }
        match header.length.get() {
            Some(len) => {
                Ok(Frame::Primitive {
                    ty, remaining: len, buf: Vec::with_capacity(len.min(4096))
                })
            }
            None => {
                Err(ContentError::from_static(
                    "primitive value with indefinite length"
                ))
            }
        }
    }

    fn require_constructed(header: &Header) -> Result<(), ContentError> {
        if header.constructed {
            Ok(())
        }
        else {
            Err(ContentError::from_static(
                "constructed type with primitive encoding"
            ))
        }
    }

    /// Reads the identifier and length octets at the start of `data`.
    ///
    /// Returns `Ok(None)` if more data is needed. Checks that the value
    /// fits within `limit` and the maximum size.
    fn read_header(
        &self, data: &[u8], limit: Option<usize>
    ) -> Result<Option<Header>, ContentError> {
        let (tag, constructed, tag_len) = match Tag::take_from(data)? {
            Some(res) => res,
            None => return Ok(None)
        };
        let rest = data.get(tag_len..).unwrap_or(&[]);
        let (length, len_len) = match Length::take_from(rest, self.mode)? {
            Some(res) => res,
            None => return Ok(None)
        };
        if tag == Tag::END_OF_VALUE {
            return Err(ContentError::from_static("unexpected end-of-contents"))
        }
        let header = Header {
            tag, constructed, length, len: tag_len + len_len
        };
        if let Some(len) = length.get() {
            if len > self.options.max_size {
                return Err(ContentError::with_reason(
                    Reason::Overflow, "value exceeds maximum size"
                ))
            }
        }
        if let Some(limit) = limit {
            let end = self.pos.checked_add(header.len).and_then(|end| {
                end.checked_add(length.get().unwrap_or(0))
            });
            match end {
                Some(end) if end <= limit => { }
                _ => {
                    return Err(ContentError::from_static(
                        "value exceeds its enclosing value"
                    ))
                }
            }
        }
        Ok(Some(header))
    }

    /// Returns the end of a value with the given header.
    fn end_of(&self, header: &Header) -> End {
        match header.length.get() {
            Some(len) => End::Definite(self.pos + header.len + len),
            None => End::Indefinite
        }
    }

    /// Returns the end of the innermost definite length value.
    fn limit(&self) -> Option<usize> {
        self.stack.iter().rev().find_map(|frame| match frame.end() {
            Some(End::Definite(end)) => Some(end),
            _ => None
        })
    }

    /// Returns the limit for values inside a value ending at `end`.
    fn inner_limit(&self, end: End) -> Option<usize> {
        match end {
            End::Definite(end) => Some(end),
            End::Indefinite => self.limit()
        }
    }

    /// Checks whether the content of a constructed value has ended.
    fn at_end(&self, end: End, data: &[u8]) -> Result<EndCheck, ContentError> {
        match end {
            End::Definite(end) => {
                if self.pos >= end {
                    Ok(EndCheck::End(0))
                }
                else {
                    Ok(EndCheck::NotEnd)
                }
            }
            End::Indefinite => {
                match (data.first(), data.get(1)) {
                    (None, _) | (Some(0), None) => Ok(EndCheck::NeedMore),
                    (Some(0), Some(0)) => {
                        if let Some(limit) = self.limit() {
                            if self.pos + 2 > limit {
                                return Err(ContentError::from_static(
                                    "value exceeds its enclosing value"
                                ))
                            }
                        }
                        Ok(EndCheck::End(2))
                    }
                    (Some(0), Some(_)) => {
                        Err(ContentError::from_static(
                            "invalid end-of-contents octets"
                        ))
                    }
                    _ => Ok(EndCheck::NotEnd)
                }
            }
        }
    }
}


//------------ Frame ---------------------------------------------------------

/// A partially decoded value.
enum Frame {
    /// The next tag of a value is expected.
    ///
    /// For an untagged CHOICE, `idx` is the length of `tags` and the
    /// alternative is picked next.
    Header {
        ty: &'static TypeDescriptor,
        tags: TagChain,
        idx: usize,
    },

    /// The content of an explicit tag.
    Explicit {
        end: End,
        value: Option<Value>,
    },

    /// The content octets of a primitive value.
    Primitive {
        ty: &'static TypeDescriptor,
        remaining: usize,
        buf: Vec<u8>,
    },

    /// The fragments of a constructed string.
    Fragments {
        ty: &'static TypeDescriptor,
        end: End,
        buf: Vec<u8>,
        unused: Option<u8>,
    },

    /// The members of a SEQUENCE or SET.
    Sequence(SequenceFrame),

    /// The elements of a SEQUENCE OF or SET OF.
    List {
        ty: &'static TypeDescriptor,
        elem: &'static Member,
        end: End,
        items: Vec<Value>,
    },

    /// The chosen alternative of a CHOICE.
    Choice {
        idx: usize,
    },

    /// A value that is skipped.
    ///
    /// If `end` is `None`, the header hasn’t been read yet.
    Skip {
        end: Option<End>,
    },
}

impl Frame {
    /// Returns the end of the frame’s content if it is a nested value.
    fn end(&self) -> Option<End> {
        match *self {
            Frame::Explicit { end, .. } => Some(end),
            Frame::Fragments { end, .. } => Some(end),
            Frame::Sequence(ref seq) => Some(seq.end),
            Frame::List { end, .. } => Some(end),
            Frame::Skip { end } => end,
            _ => None
        }
    }
}


//------------ SequenceFrame -------------------------------------------------

/// The state of a SEQUENCE or SET being decoded.
struct SequenceFrame {
    ty: &'static TypeDescriptor,
    spec: &'static SequenceSpec,
    end: End,

    /// The index of the next member that may appear in a SEQUENCE.
    next: usize,

    /// The index of the member currently being decoded.
    pending: usize,

    /// The members decoded so far.
    values: Vec<Option<Value>>,
}

impl SequenceFrame {
    /// Finds the SEQUENCE member starting with `tag`.
    ///
    /// Optional members before it are skipped. Returns `Ok(None)` if no
    /// member matches.
    fn find_sequence_member(
        &self, tag: Tag
    ) -> Result<Option<usize>, ContentError> {
        let root_len = self.spec.root_len();
        for (idx, member) in self.spec.members.iter().enumerate().skip(
            self.next
        ) {
            if member.matches_outer_tag(tag) {
                return Ok(Some(idx))
            }
            if !member.is_optional() && idx < root_len {
                return Err(ContentError::from(format!(
                    "missing member {} in {}", member.name, self.ty.name
                )))
            }
        }
        Ok(None)
    }

    /// Finds the SET member starting with `tag`.
    fn find_set_member(
        &self, tag: Tag
    ) -> Result<Option<usize>, ContentError> {
        let idx = match self.spec.members.iter().position(|member| {
            member.matches_outer_tag(tag)
        }) {
            Some(idx) => idx,
            None => return Ok(None)
        };
        if matches!(self.values.get(idx), Some(Some(_))) {
            return Err(ContentError::from(format!(
                "duplicate member {} in {}",
                self.spec.members[idx].name, self.ty.name
            )))
        }
        Ok(Some(idx))
    }

    /// Completes the member values.
    ///
    /// Absent members with a default value receive it.
    fn finish(self) -> Result<Vec<Option<Value>>, ContentError> {
        let root_len = self.spec.root_len();
        let mut values = self.values;
        for (idx, (member, slot)) in self.spec.members.iter().zip(
            values.iter_mut()
        ).enumerate() {
            if slot.is_some() {
                continue
            }
            if let Some(default) = member.default {
                *slot = Some(default());
            }
            else if !member.optional && idx < root_len {
                return Err(ContentError::from(format!(
                    "missing member {} in {}", member.name, self.ty.name
                )))
            }
        }
        Ok(values)
    }
}


//------------ Header --------------------------------------------------------

/// The identifier and length octets of a value.
struct Header {
    tag: Tag,
    constructed: bool,
    length: Length,

    /// The number of octets of the header.
    len: usize,
}


//------------ End -----------------------------------------------------------

/// Where the content of a constructed value ends.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum End {
    /// At the given position.
    Definite(usize),

    /// At the end-of-contents octets.
    Indefinite,
}


//------------ EndCheck ------------------------------------------------------

/// The result of checking for the end of content.
enum EndCheck {
    /// The content has ended. Consume the given number of octets.
    End(usize),

    /// There is more content.
    NotEnd,

    /// More data is needed to decide.
    NeedMore,
}


//------------ Step ----------------------------------------------------------

/// The result of a single decoding step.
enum Step {
    /// The given number of octets was consumed.
    Progress(usize),

    /// The value is complete after consuming the given number of octets.
    Done(Value, usize),

    /// More data is needed.
    NeedMore,
}


//------------ Helper Functions ----------------------------------------------

/// Converts the content octets of a primitive value into a value.
fn primitive_value(
    ty: &TypeDescriptor, mode: Mode, buf: Vec<u8>
) -> Result<Value, ContentError> {
    match ty.kind {
        TypeKind::Boolean => {
            match buf.as_slice() {
                [0] => Ok(Value::Boolean(false)),
                [0xFF] => Ok(Value::Boolean(true)),
                [_] if !mode.is_restricted() => Ok(Value::Boolean(true)),
                [_] => Err(ContentError::from_static("invalid boolean in DER")),
                _ => Err(ContentError::from_static("invalid boolean length")),
            }
        }
        TypeKind::Null => {
            if buf.is_empty() {
                Ok(Value::Null)
            }
            else {
                Err(ContentError::from_static("invalid NULL value"))
            }
        }
        TypeKind::Integer => {
            Integer::from_content(&buf, mode).map(Value::Integer)
        }
        TypeKind::Enumerated(spec) => {
            let value = Integer::from_content(&buf, mode)?.to_i64()?;
            if !spec.accepts(value) {
                return Err(ContentError::with_reason_boxed(
                    Reason::Constraint,
                    Box::new(format!("unknown value {} for {}", value, ty.name))
                ))
            }
            Ok(Value::Enumerated(value))
        }
        TypeKind::ObjectIdentifier => {
            Oid::from_content(Bytes::from(buf)).map(Value::Oid)
        }
        TypeKind::OctetString(_) => string_value(ty, buf),
        TypeKind::BitString => {
            let (unused, bits) = match buf.split_first() {
                Some((unused, bits)) => (*unused, bits),
                None => {
                    return Err(ContentError::from_static(
                        "empty bit string content"
                    ))
                }
            };
            let bits = BitString::from_slice(unused, bits)?;
            if mode.is_restricted() && bits.masked() != bits.octet_slice() {
                return Err(ContentError::from_static(
                    "non-zero unused bits in DER"
                ))
            }
            Ok(Value::BitString(bits))
        }
        _ => {
            Err(ContentError::from(format!(
                "{} is not a primitive type", ty.name
            )))
        }
    }
}

/// Converts the octets of a string into a value.
fn string_value(
    ty: &TypeDescriptor, buf: Vec<u8>
) -> Result<Value, ContentError> {
    if let TypeKind::OctetString(kind) = ty.kind {
        kind.check(&buf)?;
    }
    Ok(Value::OctetString(OctetString::from(buf)))
}
