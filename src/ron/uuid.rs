//! Causal identifiers and their context-relative text form.
//!
//! A uuid is a pair of 60-bit base64 words plus a scheme. The first word is
//! the value (a name, or a timestamp for events), the second one is the
//! origin (the replica that minted it). Words are written as up to 10
//! digits of an ASCII-ordered base64 alphabet with trailing zeros dropped,
//! so comparing words numerically is the same as comparing their digit
//! strings.
//!
//! # Text form
//!
//! Uuids are always written relative to a context uuid:
//!
//! - a name (origin zero, scheme `$`) is written as its bare value, `lww`
//! - a uuid equal to its context is written as nothing at all
//! - a word sharing 4..9 leading digits with the context word is written
//!   as one of `([{}])` followed by the remaining digits
//! - everything else is `value` `scheme` `origin`, where an empty part
//!   means "same as the context"

use std::fmt;
use std::str::FromStr;

use crate::error::Error;
use crate::error::Result;

/// The base64 alphabet, in ascending order.
pub const BASE64: &[u8; 64] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ_abcdefghijklmnopqrstuvwxyz~";

/// Prefix brackets. `PREFIXES[i]` keeps the first `i + 4` digits of the
/// context word.
pub const PREFIXES: &[u8; 6] = b"([{}])";

/// Number of digits in a word.
pub const WORD_DIGITS: usize = 10;

/// Shortest shared prefix worth compressing.
const MIN_PREFIX: usize = 4;

const WORD_MASK: u64 = (1 << 60) - 1;

const fn digit_value(byte: u8) -> Option<u64> {
    return match byte {
        b'0'..=b'9' => Some((byte - b'0') as u64),
        b'A'..=b'Z' => Some((byte - b'A') as u64 + 10),
        b'_' => Some(36),
        b'a'..=b'z' => Some((byte - b'a') as u64 + 37),
        b'~' => Some(63),
        _ => None,
    };
}

const fn shift(index: usize) -> usize {
    return 6 * (WORD_DIGITS - 1 - index);
}

fn prefix_len(byte: u8) -> Option<usize> {
    return PREFIXES.iter().position(|&p| p == byte).map(|i| i + MIN_PREFIX);
}

/// A 60-bit base64 number, digit 0 in the most significant position.
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Word(u64);

impl Word {
    pub const ZERO: Word = Word(0);

    /// Build a word from a literal. Evaluated at compile time for the
    /// well-known constants, where bad input fails the build.
    ///
    /// # Panics
    ///
    /// Panics if `text` has more than 10 digits or a digit outside the
    /// base64 alphabet. Use [`Word::parse`] for text that is not a literal.
    pub const fn lit(text: &str) -> Word {
        let bytes = text.as_bytes();
        assert!(bytes.len() <= WORD_DIGITS, "word literal is longer than 10 digits");
        let mut bits = 0u64;
        let mut i = 0;
        while i < bytes.len() {
            let digit = match digit_value(bytes[i]) {
                Some(digit) => digit,
                None => panic!("word literal has a non-base64 digit"),
            };
            bits |= digit << shift(i);
            i += 1;
        }
        return Word(bits);
    }

    /// Parse a full (not prefix-compressed) word.
    pub fn parse(text: &str) -> Result<Word> {
        return Word::from_digits(text.as_bytes(), 0).map_err(|reason| malformed(text, reason));
    }

    /// Place `digits` starting at digit index `start`.
    fn from_digits(digits: &[u8], start: usize) -> std::result::Result<Word, &'static str> {
        if start + digits.len() > WORD_DIGITS {
            return Err("more than 10 digits");
        }
        let mut bits = 0u64;
        for (i, &byte) in digits.iter().enumerate() {
            let Some(digit) = digit_value(byte) else {
                return Err("not a base64 digit");
            };
            bits |= digit << shift(start + i);
        }
        return Ok(Word(bits));
    }

    pub fn is_zero(&self) -> bool {
        return self.0 == 0;
    }

    /// The digit at `index` (0..10).
    #[inline]
    pub fn digit(&self, index: usize) -> u8 {
        return ((self.0 >> shift(index)) & 63) as u8;
    }

    /// Number of significant digits (0 for the zero word).
    pub fn digit_count(&self) -> usize {
        if self.0 == 0 {
            return 0;
        }
        return WORD_DIGITS - self.0.trailing_zeros() as usize / 6;
    }

    /// Number of leading digits shared with `other`; 10 when equal.
    pub fn common_prefix(&self, other: &Word) -> usize {
        let diff = self.0 ^ other.0;
        if diff == 0 {
            return WORD_DIGITS;
        }
        return (diff.leading_zeros() as usize - 4) / 6;
    }

    /// Only the first `count` digits.
    fn keep(&self, count: usize) -> Word {
        if count == 0 {
            return Word::ZERO;
        }
        let mask = (u64::MAX << shift(count - 1)) & WORD_MASK;
        return Word(self.0 & mask);
    }

    fn write_digits(&self, from: usize, out: &mut String) {
        for i in from..self.digit_count() {
            out.push(BASE64[self.digit(i) as usize] as char);
        }
    }

    fn write_full(&self, out: &mut String) {
        if self.is_zero() {
            out.push('0');
        } else {
            self.write_digits(0, out);
        }
    }

    /// Write this word relative to `ctx`: nothing when equal, bracket
    /// compressed when the shared prefix is long enough, in full otherwise.
    fn write_relative(&self, ctx: &Word, out: &mut String) {
        if self == ctx {
            return;
        }
        let shared = self.common_prefix(ctx);
        if shared >= MIN_PREFIX {
            out.push(PREFIXES[shared - MIN_PREFIX] as char);
            self.write_digits(shared, out);
        } else {
            self.write_full(out);
        }
    }

    /// Inverse of `write_relative` for a non-empty part.
    fn read_relative(part: &[u8], ctx: &Word) -> std::result::Result<Word, &'static str> {
        match prefix_len(part[0]) {
            Some(keep) => {
                let tail = Word::from_digits(&part[1..], keep)?;
                return Ok(Word(ctx.keep(keep).0 | tail.0));
            }
            None => return Word::from_digits(part, 0),
        }
    }
}

impl fmt::Display for Word {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = String::with_capacity(WORD_DIGITS);
        self.write_full(&mut out);
        return f.write_str(&out);
    }
}

impl fmt::Debug for Word {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        return fmt::Display::fmt(self, f);
    }
}

/// What kind of uuid this is, written as the separator between the two
/// words.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Scheme {
    /// `$`: a name, possibly scoped by an origin.
    #[default]
    Name,
    /// `%`: a hash.
    Hash,
    /// `+`: an event timestamp.
    Event,
    /// `-`: derived from an event.
    Derived,
}

impl Scheme {
    pub const fn sep(self) -> u8 {
        return match self {
            Scheme::Name => b'$',
            Scheme::Hash => b'%',
            Scheme::Event => b'+',
            Scheme::Derived => b'-',
        };
    }

    pub const fn from_sep(byte: u8) -> Option<Scheme> {
        return match byte {
            b'$' => Some(Scheme::Name),
            b'%' => Some(Scheme::Hash),
            b'+' => Some(Scheme::Event),
            b'-' => Some(Scheme::Derived),
            _ => None,
        };
    }
}

/// A causal identifier.
///
/// Ordered by value, then origin, then scheme, so event uuids sort by
/// timestamp first and replica second.
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Uuid {
    pub value: Word,
    pub origin: Word,
    pub scheme: Scheme,
}

impl Uuid {
    /// Absence of a uuid; also the default context.
    pub const ZERO: Uuid = Uuid::name("0");
    /// Marks ops produced by a failed parse.
    pub const ERROR: Uuid = Uuid::name("~~~~~~~~~~");
    /// The type of comment ops.
    pub const COMMENT: Uuid = Uuid::name("~");
    pub const TRUE: Uuid = Uuid::name("true");
    pub const FALSE: Uuid = Uuid::name("false");
    pub const NULL: Uuid = Uuid::ZERO;

    pub const fn new(value: Word, origin: Word, scheme: Scheme) -> Uuid {
        return Uuid { value, origin, scheme };
    }

    /// A global name such as `lww`, meant for constants.
    ///
    /// # Panics
    ///
    /// Panics on anything that is not at most 10 base64 digits. In a
    /// `const` this fails the build; at run time it panics, so parse text
    /// that is not a literal with `str::parse` instead.
    pub const fn name(text: &str) -> Uuid {
        return Uuid {
            value: Word::lit(text),
            origin: Word::ZERO,
            scheme: Scheme::Name,
        };
    }

    pub fn is_zero(&self) -> bool {
        return self.value.is_zero() && self.origin.is_zero();
    }

    /// Global names carry no origin and are always written in full.
    pub fn is_name(&self) -> bool {
        return self.scheme == Scheme::Name && self.origin.is_zero();
    }

    /// Append the text form of this uuid relative to `ctx`.
    pub fn write_relative(&self, ctx: &Uuid, out: &mut String) {
        if self.is_name() {
            self.value.write_full(out);
            return;
        }
        if self == ctx {
            return;
        }
        if self.origin == ctx.origin {
            let zipped = self.value != ctx.value && self.value.common_prefix(&ctx.value) >= MIN_PREFIX;
            self.value.write_relative(&ctx.value, out);
            // A bracketed value with the context's scheme needs no separator.
            if !(zipped && self.scheme == ctx.scheme) {
                out.push(self.scheme.sep() as char);
            }
            return;
        }
        self.value.write_relative(&ctx.value, out);
        out.push(self.scheme.sep() as char);
        self.origin.write_relative(&ctx.origin, out);
    }

    pub fn to_relative_string(&self, ctx: &Uuid) -> String {
        let mut out = String::new();
        self.write_relative(ctx, &mut out);
        return out;
    }

    /// Parse the text form of a uuid relative to `ctx`. Empty text is the
    /// context itself.
    pub fn parse_relative(text: &str, ctx: &Uuid) -> Result<Uuid> {
        if text.is_empty() {
            return Ok(*ctx);
        }
        let bytes = text.as_bytes();
        let sep = bytes.iter().position(|&b| Scheme::from_sep(b).is_some());
        let Some(sep) = sep else {
            if prefix_len(bytes[0]).is_some() {
                let value = Word::read_relative(bytes, &ctx.value).map_err(|reason| malformed(text, reason))?;
                return Ok(Uuid::new(value, ctx.origin, ctx.scheme));
            }
            let value = Word::from_digits(bytes, 0).map_err(|reason| malformed(text, reason))?;
            return Ok(Uuid::new(value, Word::ZERO, Scheme::Name));
        };

        let (value_part, origin_part) = (&bytes[..sep], &bytes[sep + 1..]);
        let mut uuid = *ctx;
        uuid.scheme = Scheme::from_sep(bytes[sep]).unwrap_or_default();
        if !value_part.is_empty() {
            uuid.value = Word::read_relative(value_part, &ctx.value).map_err(|reason| malformed(text, reason))?;
        }
        if !origin_part.is_empty() {
            uuid.origin = Word::read_relative(origin_part, &ctx.origin).map_err(|reason| malformed(text, reason))?;
        }
        return Ok(uuid);
    }
}

/// Find the end of the uuid token starting at `pos`: an optional prefix
/// bracket and digits, optionally followed by a separator and a second
/// such part.
pub(crate) fn scan_token(bytes: &[u8], pos: usize) -> usize {
    let mut end = scan_part(bytes, pos);
    if end < bytes.len() && Scheme::from_sep(bytes[end]).is_some() {
        end = scan_part(bytes, end + 1);
    }
    return end;
}

fn scan_part(bytes: &[u8], mut pos: usize) -> usize {
    if pos < bytes.len() && prefix_len(bytes[pos]).is_some() {
        pos += 1;
    }
    while pos < bytes.len() && digit_value(bytes[pos]).is_some() {
        pos += 1;
    }
    return pos;
}

fn malformed(text: &str, reason: &'static str) -> Error {
    return Error::MalformedUuid {
        text: text.to_string(),
        reason,
    };
}

impl fmt::Display for Uuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        return f.write_str(&self.to_relative_string(&Uuid::ZERO));
    }
}

impl fmt::Debug for Uuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        return write!(f, "{}{}{}", self.value, self.scheme.sep() as char, self.origin);
    }
}

impl FromStr for Uuid {
    type Err = Error;

    fn from_str(text: &str) -> Result<Uuid> {
        return Uuid::parse_relative(text, &Uuid::ZERO);
    }
}
