//! Geometry recognition for WKT/EWKT text and hex-encoded (E)WKB values.
//!
//! Parsing checks structure only: keywords, nesting, coordinate counts,
//! closed rings and byte lengths. Coordinates are never transformed.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ValueFormatError};

/// Nesting limit for collections, guarding against pathological input.
const MAX_DEPTH: usize = 32;

/// PostGIS geometry kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GeometryKind {
    Point,
    LineString,
    Polygon,
    MultiPoint,
    MultiLineString,
    MultiPolygon,
    GeometryCollection,
    /// Any kind.
    Geometry,
}

impl GeometryKind {
    /// Lower-case name as used in column types.
    pub fn as_str(&self) -> &'static str {
        match self {
            GeometryKind::Point => "point",
            GeometryKind::LineString => "linestring",
            GeometryKind::Polygon => "polygon",
            GeometryKind::MultiPoint => "multipoint",
            GeometryKind::MultiLineString => "multilinestring",
            GeometryKind::MultiPolygon => "multipolygon",
            GeometryKind::GeometryCollection => "geometrycollection",
            GeometryKind::Geometry => "geometry",
        }
    }

    fn from_wkb_code(code: u32) -> Option<Self> {
        match code {
            1 => Some(GeometryKind::Point),
            2 => Some(GeometryKind::LineString),
            3 => Some(GeometryKind::Polygon),
            4 => Some(GeometryKind::MultiPoint),
            5 => Some(GeometryKind::MultiLineString),
            6 => Some(GeometryKind::MultiPolygon),
            7 => Some(GeometryKind::GeometryCollection),
            _ => None,
        }
    }

    /// Element kind of a multi-geometry.
    fn member(&self) -> Option<GeometryKind> {
        match self {
            GeometryKind::MultiPoint => Some(GeometryKind::Point),
            GeometryKind::MultiLineString => Some(GeometryKind::LineString),
            GeometryKind::MultiPolygon => Some(GeometryKind::Polygon),
            _ => None,
        }
    }
}

impl fmt::Display for GeometryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GeometryKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "point" => Ok(GeometryKind::Point),
            "linestring" => Ok(GeometryKind::LineString),
            "polygon" => Ok(GeometryKind::Polygon),
            "multipoint" => Ok(GeometryKind::MultiPoint),
            "multilinestring" => Ok(GeometryKind::MultiLineString),
            "multipolygon" => Ok(GeometryKind::MultiPolygon),
            "geometrycollection" => Ok(GeometryKind::GeometryCollection),
            "geometry" => Ok(GeometryKind::Geometry),
            _ => Err(ConfigError::UnknownGeometryKind(s.to_string())),
        }
    }
}

/// Accepted geometry encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GeometryFormat {
    /// WKT or EWKT (`SRID=4326;POINT(1 2)`).
    Wkt,
    /// Hex-encoded WKB or EWKB, as exported by PostGIS.
    HexWkb,
    /// Either of the above.
    #[default]
    Any,
}

impl FromStr for GeometryFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "wkt" | "ewkt" => Ok(GeometryFormat::Wkt),
            "wkb" | "hexwkb" | "ewkb" => Ok(GeometryFormat::HexWkb),
            "any" => Ok(GeometryFormat::Any),
            _ => Err(ConfigError::Invalid(format!("unknown geometry format '{}'", s))),
        }
    }
}

/// What a successful parse found out about a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeometryInfo {
    pub kind: GeometryKind,
    /// SRID embedded in the value (EWKT/EWKB only).
    pub srid: Option<u32>,
}

/// Recognises geometry values. Injected into the catalog so other encodings
/// can be plugged in.
pub trait GeometryParser: Send + Sync + fmt::Debug {
    /// Parse a value, failing with [`ValueFormatError::Geometry`].
    fn parse(&self, value: &str) -> Result<GeometryInfo, ValueFormatError>;
}

/// Built-in parser for WKT/EWKT and hex (E)WKB.
#[derive(Debug, Clone, Default)]
pub struct StandardGeometryParser {
    format: GeometryFormat,
}

impl StandardGeometryParser {
    /// Create a parser accepting the given encodings.
    pub fn new(format: GeometryFormat) -> Self {
        Self { format }
    }
}

impl GeometryParser for StandardGeometryParser {
    fn parse(&self, value: &str) -> Result<GeometryInfo, ValueFormatError> {
        match self.format {
            GeometryFormat::Wkt => parse_wkt(value),
            GeometryFormat::HexWkb => parse_hex_wkb(value),
            GeometryFormat::Any => {
                if !value.is_empty() && value.bytes().all(|b| b.is_ascii_hexdigit()) {
                    parse_hex_wkb(value)
                } else {
                    parse_wkt(value)
                }
            }
        }
    }
}

fn invalid(message: impl Into<String>) -> ValueFormatError {
    ValueFormatError::Geometry(message.into())
}

// =============================================================================
// WKT
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
enum Token<'a> {
    Word(&'a str),
    Number(f64),
    LParen,
    RParen,
    Comma,
}

fn tokenize(text: &str) -> Result<Vec<Token<'_>>, ValueFormatError> {
    let mut tokens = Vec::new();
    let bytes = text.as_bytes();
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];
        match b {
            b' ' | b'\t' | b'\n' | b'\r' => i += 1,
            b'(' => {
                tokens.push(Token::LParen);
                i += 1;
            }
            b')' => {
                tokens.push(Token::RParen);
                i += 1;
            }
            b',' => {
                tokens.push(Token::Comma);
                i += 1;
            }
            b if b.is_ascii_alphabetic() => {
                let start = i;
                while i < bytes.len() && bytes[i].is_ascii_alphabetic() {
                    i += 1;
                }
                tokens.push(Token::Word(&text[start..i]));
            }
            b if b.is_ascii_digit() || matches!(b, b'+' | b'-' | b'.') => {
                let start = i;
                i += 1;
                while i < bytes.len()
                    && (bytes[i].is_ascii_digit()
                        || matches!(bytes[i], b'.' | b'e' | b'E' | b'+' | b'-'))
                {
                    i += 1;
                }
                let literal = &text[start..i];
                let number = literal
                    .parse::<f64>()
                    .ok()
                    .filter(|n| n.is_finite())
                    .ok_or_else(|| invalid(format!("bad coordinate '{}'", literal)))?;
                tokens.push(Token::Number(number));
            }
            _ => return Err(invalid(format!("unexpected character at offset {}", i))),
        }
    }

    Ok(tokens)
}

/// Parse WKT, optionally prefixed with `SRID=<n>;`.
pub fn parse_wkt(value: &str) -> Result<GeometryInfo, ValueFormatError> {
    let (srid, body) = split_srid(value)?;
    let tokens = tokenize(body)?;
    let mut parser = WktParser {
        tokens,
        pos: 0,
        dims: None,
    };

    let kind = parser.tagged(0)?;
    if parser.pos != parser.tokens.len() {
        return Err(invalid("trailing input after geometry"));
    }

    Ok(GeometryInfo { kind, srid })
}

fn split_srid(value: &str) -> Result<(Option<u32>, &str), ValueFormatError> {
    let trimmed = value.trim_start();
    let has_prefix = trimmed
        .get(..5)
        .is_some_and(|p| p.eq_ignore_ascii_case("srid="));
    if !has_prefix {
        return Ok((None, value));
    }

    let (prefix, body) = trimmed
        .split_once(';')
        .ok_or_else(|| invalid("SRID prefix without ';'"))?;
    let srid = prefix[5..]
        .trim()
        .parse::<u32>()
        .map_err(|_| invalid(format!("bad SRID '{}'", &prefix[5..])))?;
    Ok((Some(srid), body))
}

struct WktParser<'a> {
    tokens: Vec<Token<'a>>,
    pos: usize,
    dims: Option<usize>,
}

impl<'a> WktParser<'a> {
    fn peek(&self) -> Option<&Token<'a>> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token<'a>> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn expect(&mut self, expected: Token<'a>) -> Result<(), ValueFormatError> {
        match self.next() {
            Some(ref t) if *t == expected => Ok(()),
            other => Err(invalid(format!("expected {:?}, found {:?}", expected, other))),
        }
    }

    fn peek_word(&self, word: &str) -> bool {
        matches!(self.peek(), Some(Token::Word(w)) if w.eq_ignore_ascii_case(word))
    }

    /// `TYPE [Z|M|ZM] (EMPTY | body)`
    fn tagged(&mut self, depth: usize) -> Result<GeometryKind, ValueFormatError> {
        if depth > MAX_DEPTH {
            return Err(invalid("geometry nested too deeply"));
        }

        let keyword = match self.next() {
            Some(Token::Word(w)) => w.to_ascii_uppercase(),
            other => return Err(invalid(format!("expected geometry keyword, found {:?}", other))),
        };
        let kind = match keyword.as_str() {
            "POINT" => GeometryKind::Point,
            "LINESTRING" => GeometryKind::LineString,
            "POLYGON" => GeometryKind::Polygon,
            "MULTIPOINT" => GeometryKind::MultiPoint,
            "MULTILINESTRING" => GeometryKind::MultiLineString,
            "MULTIPOLYGON" => GeometryKind::MultiPolygon,
            "GEOMETRYCOLLECTION" => GeometryKind::GeometryCollection,
            other => return Err(invalid(format!("unknown geometry type '{}'", other))),
        };

        let declared = if self.peek_word("ZM") {
            Some(4)
        } else if self.peek_word("Z") || self.peek_word("M") {
            Some(3)
        } else {
            None
        };
        if let Some(d) = declared {
            self.pos += 1;
            self.set_dims(d)?;
        }

        if self.peek_word("EMPTY") {
            self.pos += 1;
            return Ok(kind);
        }

        match kind {
            GeometryKind::Point => {
                self.expect(Token::LParen)?;
                self.coordinate()?;
                self.expect(Token::RParen)?;
            }
            GeometryKind::LineString => {
                self.line(2)?;
            }
            GeometryKind::Polygon => self.polygon()?,
            GeometryKind::MultiPoint => self.list(|p| {
                if matches!(p.peek(), Some(Token::LParen)) {
                    p.expect(Token::LParen)?;
                    p.coordinate()?;
                    p.expect(Token::RParen)
                } else {
                    p.coordinate().map(|_| ())
                }
            })?,
            GeometryKind::MultiLineString => self.list(|p| p.line(2).map(|_| ()))?,
            GeometryKind::MultiPolygon => self.list(|p| p.polygon())?,
            GeometryKind::GeometryCollection => {
                self.list(|p| p.tagged(depth + 1).map(|_| ()))?
            }
            GeometryKind::Geometry => unreachable!("not a WKT keyword"),
        }

        Ok(kind)
    }

    /// `'(' item (',' item)* ')'`
    fn list(
        &mut self,
        mut item: impl FnMut(&mut Self) -> Result<(), ValueFormatError>,
    ) -> Result<(), ValueFormatError> {
        self.expect(Token::LParen)?;
        loop {
            item(self)?;
            match self.next() {
                Some(Token::Comma) => continue,
                Some(Token::RParen) => return Ok(()),
                other => return Err(invalid(format!("expected ',' or ')', found {:?}", other))),
            }
        }
    }

    fn coordinate(&mut self) -> Result<Vec<f64>, ValueFormatError> {
        let mut values = Vec::with_capacity(4);
        while let Some(Token::Number(n)) = self.peek() {
            values.push(*n);
            self.pos += 1;
        }
        if !(2..=4).contains(&values.len()) {
            return Err(invalid(format!("coordinate with {} values", values.len())));
        }
        self.set_dims(values.len())?;
        Ok(values)
    }

    fn set_dims(&mut self, dims: usize) -> Result<(), ValueFormatError> {
        match self.dims {
            None => {
                self.dims = Some(dims);
                Ok(())
            }
            Some(d) if d == dims => Ok(()),
            Some(d) => Err(invalid(format!("mixed dimensions {} and {}", d, dims))),
        }
    }

    /// A parenthesised coordinate sequence with at least `min_points` points.
    fn line(&mut self, min_points: usize) -> Result<Vec<Vec<f64>>, ValueFormatError> {
        let mut points = Vec::new();
        self.list(|p| {
            points.push(p.coordinate()?);
            Ok(())
        })?;
        if points.len() < min_points {
            return Err(invalid(format!(
                "{} point(s), at least {} required",
                points.len(),
                min_points
            )));
        }
        Ok(points)
    }

    fn polygon(&mut self) -> Result<(), ValueFormatError> {
        self.list(|p| {
            let ring = p.line(4)?;
            if ring.first() != ring.last() {
                return Err(invalid("ring is not closed"));
            }
            Ok(())
        })
    }
}

// =============================================================================
// WKB
// =============================================================================

const EWKB_Z: u32 = 0x8000_0000;
const EWKB_M: u32 = 0x4000_0000;
const EWKB_SRID: u32 = 0x2000_0000;

/// Parse hex-encoded WKB/EWKB.
pub fn parse_hex_wkb(value: &str) -> Result<GeometryInfo, ValueFormatError> {
    let bytes = decode_hex(value)?;
    let mut reader = WkbReader {
        bytes: &bytes,
        pos: 0,
    };
    let info = reader.geometry(0)?;
    if reader.pos != bytes.len() {
        return Err(invalid(format!(
            "{} trailing byte(s) after geometry",
            bytes.len() - reader.pos
        )));
    }
    Ok(info)
}

fn decode_hex(value: &str) -> Result<Vec<u8>, ValueFormatError> {
    if value.is_empty() || value.len() % 2 != 0 {
        return Err(invalid("hex string must have an even, non-zero length"));
    }
    fn nibble(b: u8) -> Option<u8> {
        (b as char).to_digit(16).map(|d| d as u8)
    }
    value
        .as_bytes()
        .chunks(2)
        .map(|pair| match (nibble(pair[0]), nibble(pair[1])) {
            (Some(hi), Some(lo)) => Ok(hi << 4 | lo),
            _ => Err(invalid("not a hex string")),
        })
        .collect()
}

struct WkbReader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl WkbReader<'_> {
    fn take(&mut self, len: usize) -> Result<&[u8], ValueFormatError> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|end| *end <= self.bytes.len())
            .ok_or_else(|| invalid("unexpected end of WKB"))?;
        let slice = &self.bytes[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn read_u32(&mut self, little_endian: bool) -> Result<u32, ValueFormatError> {
        let raw = self.take(4)?;
        let array = [raw[0], raw[1], raw[2], raw[3]];
        Ok(if little_endian {
            u32::from_le_bytes(array)
        } else {
            u32::from_be_bytes(array)
        })
    }

    fn skip_points(&mut self, count: u32, dims: usize) -> Result<(), ValueFormatError> {
        let len = (count as usize)
            .checked_mul(dims * 8)
            .ok_or_else(|| invalid("point count overflows"))?;
        self.take(len).map(|_| ())
    }

    fn geometry(&mut self, depth: usize) -> Result<GeometryInfo, ValueFormatError> {
        if depth > MAX_DEPTH {
            return Err(invalid("geometry nested too deeply"));
        }

        let little_endian = match self.take(1)?[0] {
            0 => false,
            1 => true,
            other => return Err(invalid(format!("bad byte order marker {}", other))),
        };

        let raw = self.read_u32(little_endian)?;
        let code = raw & 0x0FFF_FFFF;
        let (base, iso) = (code % 1000, code / 1000);
        if iso > 3 {
            return Err(invalid(format!("unknown geometry type code {}", code)));
        }
        let has_z = raw & EWKB_Z != 0 || iso == 1 || iso == 3;
        let has_m = raw & EWKB_M != 0 || iso == 2 || iso == 3;
        let kind = GeometryKind::from_wkb_code(base)
            .ok_or_else(|| invalid(format!("unknown geometry type code {}", code)))?;

        let srid = if raw & EWKB_SRID != 0 {
            Some(self.read_u32(little_endian)?)
        } else {
            None
        };
        let dimensions = 2 + has_z as usize + has_m as usize;

        match kind {
            GeometryKind::Point => self.skip_points(1, dimensions)?,
            GeometryKind::LineString => {
                let n = self.read_u32(little_endian)?;
                self.skip_points(n, dimensions)?;
            }
            GeometryKind::Polygon => {
                let rings = self.read_u32(little_endian)?;
                for _ in 0..rings {
                    let n = self.read_u32(little_endian)?;
                    self.skip_points(n, dimensions)?;
                }
            }
            _ => {
                let members = self.read_u32(little_endian)?;
                for _ in 0..members {
                    let member = self.geometry(depth + 1)?;
                    if let Some(expected) = kind.member() {
                        if member.kind != expected {
                            return Err(invalid(format!(
                                "{} inside {}",
                                member.kind, kind
                            )));
                        }
                    }
                }
            }
        }

        Ok(GeometryInfo { kind, srid })
    }
}
