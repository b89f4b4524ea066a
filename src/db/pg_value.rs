//! Decoding of PostgreSQL result values.
//!
//! Query results arrive in the binary wire format. Scalars with a natural
//! [`Value`] variant map onto it; every other type is rendered as the text
//! `psql` would print, so a value the server returned never turns into NULL
//! and out-of-range values (huge numerics, infinite timestamps) cannot
//! overflow a fixed-width Rust type.

use chrono::{DateTime, Utc};
use sqlx::error::BoxDynError;
use sqlx::postgres::{PgValueFormat, PgValueRef};
use sqlx::{TypeInfo, ValueRef};
use std::net::{Ipv4Addr, Ipv6Addr};

use super::Value;

/// Type OIDs from `pg_type`.
pub(super) mod oid {
    pub const BOOL: u32 = 16;
    pub const BYTEA: u32 = 17;
    pub const CHAR: u32 = 18;
    pub const NAME: u32 = 19;
    pub const INT8: u32 = 20;
    pub const INT2: u32 = 21;
    pub const INT4: u32 = 23;
    pub const TEXT: u32 = 25;
    pub const OID: u32 = 26;
    pub const JSON: u32 = 114;
    pub const XML: u32 = 142;
    pub const CIDR: u32 = 650;
    pub const FLOAT4: u32 = 700;
    pub const FLOAT8: u32 = 701;
    pub const UNKNOWN: u32 = 705;
    pub const MACADDR: u32 = 829;
    pub const INET: u32 = 869;
    pub const BPCHAR: u32 = 1042;
    pub const VARCHAR: u32 = 1043;
    pub const DATE: u32 = 1082;
    pub const TIME: u32 = 1083;
    pub const TIMESTAMP: u32 = 1114;
    pub const TIMESTAMPTZ: u32 = 1184;
    pub const INTERVAL: u32 = 1186;
    pub const TIMETZ: u32 = 1266;
    pub const NUMERIC: u32 = 1700;
    pub const UUID: u32 = 2950;
    pub const JSONB: u32 = 3802;
}

const NUMERIC_POS: u16 = 0x0000;
const NUMERIC_NEG: u16 = 0x4000;
const NUMERIC_NAN: u16 = 0xC000;
const NUMERIC_PINF: u16 = 0xD000;
const NUMERIC_NINF: u16 = 0xF000;

/// Microseconds between the Unix epoch and 2000-01-01, PostgreSQL's epoch.
const PG_EPOCH_OFFSET_MICROS: i64 = 946_684_800_000_000;
const MICROS_PER_DAY: i64 = 86_400_000_000;

const PGSQL_AF_INET: u8 = 2;
const PGSQL_AF_INET6: u8 = 3;

/// Converts one raw result cell.
pub(super) fn decode_value(raw: PgValueRef<'_>) -> Result<Value, BoxDynError> {
    if raw.is_null() {
        return Ok(Value::Null);
    }
    if matches!(raw.format(), PgValueFormat::Text) {
        return Ok(Value::String(raw.as_str()?.to_string()));
    }

    let type_info = raw.type_info().into_owned();
    let bytes = raw.as_bytes()?;

    if type_info.name().ends_with("[]") {
        return Ok(Value::String(render_array(bytes)?));
    }
    let Some(type_oid) = type_info.oid() else {
        return Ok(Value::String(render_unknown(bytes)));
    };

    let value = match type_oid.0 {
        oid::BOOL => Value::Bool(decode_bool(bytes)?),
        oid::INT2 => Value::Int(i16::from_be_bytes(fixed(bytes)?).into()),
        oid::INT4 => Value::Int(i32::from_be_bytes(fixed(bytes)?).into()),
        oid::INT8 => Value::Int(i64::from_be_bytes(fixed(bytes)?)),
        oid::OID => Value::Int(u32::from_be_bytes(fixed(bytes)?).into()),
        oid::FLOAT4 => Value::Float(f32::from_be_bytes(fixed(bytes)?).into()),
        oid::FLOAT8 => Value::Float(f64::from_be_bytes(fixed(bytes)?)),
        oid::BYTEA => Value::Bytes(bytes.to_vec()),
        other => Value::String(render_text(other, bytes)?),
    };
    Ok(value)
}

/// Renders a binary value of type `type_oid` in PostgreSQL's text format.
fn render_text(type_oid: u32, bytes: &[u8]) -> Result<String, BoxDynError> {
    let text = match type_oid {
        oid::BOOL => (if decode_bool(bytes)? { "t" } else { "f" }).to_string(),
        oid::INT2 => i16::from_be_bytes(fixed(bytes)?).to_string(),
        oid::INT4 => i32::from_be_bytes(fixed(bytes)?).to_string(),
        oid::INT8 => i64::from_be_bytes(fixed(bytes)?).to_string(),
        oid::OID => u32::from_be_bytes(fixed(bytes)?).to_string(),
        oid::FLOAT4 => render_float(f32::from_be_bytes(fixed(bytes)?)),
        oid::FLOAT8 => render_float(f64::from_be_bytes(fixed(bytes)?)),
        oid::BYTEA => render_bytea(bytes),
        oid::CHAR
        | oid::NAME
        | oid::TEXT
        | oid::JSON
        | oid::XML
        | oid::UNKNOWN
        | oid::BPCHAR
        | oid::VARCHAR => std::str::from_utf8(bytes)?.to_string(),
        oid::JSONB => match bytes.split_first() {
            Some((&1, json)) => std::str::from_utf8(json)?.to_string(),
            _ => return Err("unsupported jsonb format version".into()),
        },
        oid::NUMERIC => render_numeric(bytes)?,
        oid::DATE => render_date(i32::from_be_bytes(fixed(bytes)?))?,
        oid::TIMESTAMP => render_timestamp(i64::from_be_bytes(fixed(bytes)?), false)?,
        oid::TIMESTAMPTZ => render_timestamp(i64::from_be_bytes(fixed(bytes)?), true)?,
        oid::TIME => render_clock(u64::try_from(i64::from_be_bytes(fixed(bytes)?))?),
        oid::TIMETZ => render_timetz(bytes)?,
        oid::INTERVAL => render_interval(bytes)?,
        oid::UUID => uuid::Uuid::from_slice(bytes)?.to_string(),
        oid::INET => render_inet(bytes, false)?,
        oid::CIDR => render_inet(bytes, true)?,
        oid::MACADDR => {
            let octets: [u8; 6] = fixed(bytes)?;
            octets
                .iter()
                .map(|b| format!("{b:02x}"))
                .collect::<Vec<_>>()
                .join(":")
        }
        _ => render_unknown(bytes),
    };
    Ok(text)
}

fn fixed<const N: usize>(bytes: &[u8]) -> Result<[u8; N], BoxDynError> {
    bytes
        .try_into()
        .map_err(|_| format!("expected {N} bytes, got {}", bytes.len()).into())
}

fn decode_bool(bytes: &[u8]) -> Result<bool, BoxDynError> {
    let [b]: [u8; 1] = fixed(bytes)?;
    Ok(b != 0)
}

fn render_float<F>(v: F) -> String
where
    F: Into<f64> + std::fmt::Display + Copy,
{
    let wide: f64 = v.into();
    if wide.is_nan() {
        "NaN".to_string()
    } else if wide.is_infinite() {
        (if wide > 0.0 { "Infinity" } else { "-Infinity" }).to_string()
    } else {
        v.to_string()
    }
}

fn render_bytea(bytes: &[u8]) -> String {
    let hex: String = bytes.iter().map(|b| format!("{b:02x}")).collect();
    format!("\\x{hex}")
}

/// Text for types without a dedicated renderer: the bytes themselves when
/// they are printable UTF-8 (enums, citext), otherwise bytea-style hex.
fn render_unknown(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(s) if !s.chars().any(|c| c.is_control() && !matches!(c, '\n' | '\r' | '\t')) => {
            s.to_string()
        }
        _ => render_bytea(bytes),
    }
}

/// NUMERIC: base-10000 digit groups with a weight and display scale.
fn render_numeric(bytes: &[u8]) -> Result<String, BoxDynError> {
    let header: [u8; 8] = bytes
        .get(..8)
        .and_then(|h| h.try_into().ok())
        .ok_or("truncated numeric")?;
    let ndigits = i16::from_be_bytes([header[0], header[1]]);
    let weight = i32::from(i16::from_be_bytes([header[2], header[3]]));
    let sign = u16::from_be_bytes([header[4], header[5]]);
    let dscale = usize::from(u16::from_be_bytes([header[6], header[7]]));

    match sign {
        NUMERIC_NAN => return Ok("NaN".to_string()),
        NUMERIC_PINF => return Ok("Infinity".to_string()),
        NUMERIC_NINF => return Ok("-Infinity".to_string()),
        NUMERIC_POS | NUMERIC_NEG => {}
        other => return Err(format!("invalid numeric sign {other:#06x}").into()),
    }

    let digits: Vec<i16> = bytes[8..]
        .chunks_exact(2)
        .map(|c| i16::from_be_bytes([c[0], c[1]]))
        .collect();
    if digits.len() != usize::try_from(ndigits)? {
        return Err("numeric digit count mismatch".into());
    }
    let digit = |i: i32| -> i16 {
        usize::try_from(i)
            .ok()
            .and_then(|i| digits.get(i))
            .copied()
            .unwrap_or(0)
    };

    let mut out = String::new();
    if sign == NUMERIC_NEG {
        out.push('-');
    }
    if weight < 0 {
        out.push('0');
    } else {
        out.push_str(&digit(0).to_string());
        for i in 1..=weight {
            out.push_str(&format!("{:04}", digit(i)));
        }
    }
    if dscale > 0 {
        let mut frac = String::with_capacity(dscale + 4);
        let mut i = weight + 1;
        while frac.len() < dscale {
            frac.push_str(&format!("{:04}", digit(i)));
            i += 1;
        }
        frac.truncate(dscale);
        out.push('.');
        out.push_str(&frac);
    }
    Ok(out)
}

fn timestamp_from_pg_micros(micros: i64) -> Option<DateTime<Utc>> {
    micros
        .checked_add(PG_EPOCH_OFFSET_MICROS)
        .and_then(DateTime::from_timestamp_micros)
}

fn render_date(days: i32) -> Result<String, BoxDynError> {
    match days {
        i32::MAX => Ok("infinity".to_string()),
        i32::MIN => Ok("-infinity".to_string()),
        _ => i64::from(days)
            .checked_mul(MICROS_PER_DAY)
            .and_then(timestamp_from_pg_micros)
            .map(|ts| ts.date_naive().to_string())
            .ok_or_else(|| format!("date out of range: {days} days from 2000-01-01").into()),
    }
}

fn render_timestamp(micros: i64, with_zone: bool) -> Result<String, BoxDynError> {
    match micros {
        i64::MAX => Ok("infinity".to_string()),
        i64::MIN => Ok("-infinity".to_string()),
        _ => {
            let ts = timestamp_from_pg_micros(micros).ok_or_else(|| {
                format!("timestamp out of range: {micros} microseconds from 2000-01-01")
            })?;
            Ok(if with_zone {
                ts.to_rfc3339()
            } else {
                ts.naive_utc().to_string()
            })
        }
    }
}

/// `HH:MM:SS[.ffffff]`; hours may exceed 23 (intervals, `24:00:00`).
fn render_clock(micros: u64) -> String {
    let hours = micros / 3_600_000_000;
    let minutes = micros / 60_000_000 % 60;
    let seconds = micros / 1_000_000 % 60;
    let fraction = micros % 1_000_000;
    let mut out = format!("{hours:02}:{minutes:02}:{seconds:02}");
    if fraction != 0 {
        let digits = format!("{fraction:06}");
        out.push('.');
        out.push_str(digits.trim_end_matches('0'));
    }
    out
}

fn render_timetz(bytes: &[u8]) -> Result<String, BoxDynError> {
    let raw: [u8; 12] = fixed(bytes)?;
    let micros = i64::from_be_bytes(fixed(&raw[..8])?);
    // Stored as seconds west of UTC.
    let east = -i64::from(i32::from_be_bytes(fixed(&raw[8..])?));

    let sign = if east < 0 { '-' } else { '+' };
    let east = east.unsigned_abs();
    let mut out = format!("{}{sign}{:02}", render_clock(u64::try_from(micros)?), east / 3600);
    if east % 3600 != 0 {
        out.push_str(&format!(":{:02}", east / 60 % 60));
        if east % 60 != 0 {
            out.push_str(&format!(":{:02}", east % 60));
        }
    }
    Ok(out)
}

fn render_interval(bytes: &[u8]) -> Result<String, BoxDynError> {
    let raw: [u8; 16] = fixed(bytes)?;
    let micros = i64::from_be_bytes(fixed(&raw[..8])?);
    let days = i32::from_be_bytes(fixed(&raw[8..12])?);
    let months = i32::from_be_bytes(fixed(&raw[12..])?);

    let mut parts = Vec::new();
    for (n, unit) in [(months / 12, "year"), (months % 12, "mon"), (days, "day")] {
        if n != 0 {
            parts.push(format!("{n} {unit}{}", if n == 1 { "" } else { "s" }));
        }
    }
    if micros != 0 || parts.is_empty() {
        let sign = if micros < 0 { "-" } else { "" };
        parts.push(format!("{sign}{}", render_clock(micros.unsigned_abs())));
    }
    Ok(parts.join(" "))
}

fn render_inet(bytes: &[u8], cidr: bool) -> Result<String, BoxDynError> {
    let [family, bits, _is_cidr, _len, addr @ ..] = bytes else {
        return Err("truncated inet".into());
    };
    let (text, max_bits) = match *family {
        PGSQL_AF_INET => (Ipv4Addr::from(fixed::<4>(addr)?).to_string(), 32),
        PGSQL_AF_INET6 => (Ipv6Addr::from(fixed::<16>(addr)?).to_string(), 128),
        other => return Err(format!("unknown inet family {other}").into()),
    };
    if cidr || *bits != max_bits {
        Ok(format!("{text}/{bits}"))
    } else {
        Ok(text)
    }
}

/// Cursor over a binary array payload.
struct Reader<'a> {
    buf: &'a [u8],
}

impl<'a> Reader<'a> {
    fn take(&mut self, n: usize) -> Result<&'a [u8], BoxDynError> {
        if self.buf.len() < n {
            return Err("truncated array".into());
        }
        let (head, tail) = self.buf.split_at(n);
        self.buf = tail;
        Ok(head)
    }

    fn i32(&mut self) -> Result<i32, BoxDynError> {
        Ok(i32::from_be_bytes(fixed(self.take(4)?)?))
    }

    fn u32(&mut self) -> Result<u32, BoxDynError> {
        Ok(u32::from_be_bytes(fixed(self.take(4)?)?))
    }

    /// Next length-prefixed element; `None` for NULL.
    fn element(&mut self) -> Result<Option<&'a [u8]>, BoxDynError> {
        match usize::try_from(self.i32()?) {
            Ok(len) => self.take(len).map(Some),
            Err(_) => Ok(None),
        }
    }
}

/// Renders an array in PostgreSQL's `{a,b,{c,d}}` text form.
fn render_array(bytes: &[u8]) -> Result<String, BoxDynError> {
    let mut reader = Reader { buf: bytes };
    let ndim = usize::try_from(reader.i32()?)?;
    let _has_nulls = reader.i32()?;
    let elem_oid = reader.u32()?;
    if ndim == 0 {
        return Ok("{}".to_string());
    }

    let mut dims = Vec::with_capacity(ndim);
    for _ in 0..ndim {
        dims.push(usize::try_from(reader.i32()?)?);
        let _lower_bound = reader.i32()?;
    }

    let mut out = String::new();
    write_array_level(&mut reader, elem_oid, &dims, &mut out)?;
    Ok(out)
}

fn write_array_level(
    reader: &mut Reader<'_>,
    elem_oid: u32,
    dims: &[usize],
    out: &mut String,
) -> Result<(), BoxDynError> {
    let Some((&len, inner)) = dims.split_first() else {
        return Ok(());
    };
    out.push('{');
    for i in 0..len {
        if i > 0 {
            out.push(',');
        }
        if !inner.is_empty() {
            write_array_level(reader, elem_oid, inner, out)?;
            continue;
        }
        match reader.element()? {
            None => out.push_str("NULL"),
            Some(bytes) => out.push_str(&quote_array_element(&render_text(elem_oid, bytes)?)),
        }
    }
    out.push('}');
    Ok(())
}

fn quote_array_element(text: &str) -> String {
    let needs_quotes = text.is_empty()
        || text.eq_ignore_ascii_case("NULL")
        || text
            .chars()
            .any(|c| matches!(c, '{' | '}' | ',' | '"' | '\\') || c.is_whitespace());
    if !needs_quotes {
        return text.to_string();
    }
    let escaped = text.replace('\\', "\\\\").replace('"', "\\\"");
    format!("\"{escaped}\"")
}
