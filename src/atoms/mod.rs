//! Typed atomic values
//!
//! An [`Atom`] is the immutable result of validating a lexical form against
//! a simple type: a native type, a value-space representation and, for
//! values validated against a user-derived type, a *foreign* overlay name.
//! The overlay never changes the value; [`Atom::up_cast`] strips it.
//!
//! Reference: https://www.w3.org/TR/xpath-datamodel/#AtomicValue

pub mod casting;
pub mod values;

use base64::Engine;
use bigdecimal::{BigDecimal, ToPrimitive};
use rust_decimal::Decimal;
use std::cmp::Ordering;
use std::fmt;

use crate::documents::is_xml_whitespace;
use crate::namespaces::QName;
use crate::validators::builtins::NativeType;

pub use casting::{cast_as, CastingContext, Emulation, SpillagePolicy};
pub use values::{Duration, Temporal, TimeOfDay};

/// Value-space representation of an atom
#[derive(Debug, Clone)]
pub enum AtomValue {
    /// String family, untypedAtomic and anyURI
    String(String),
    /// Boolean
    Boolean(bool),
    /// xs:decimal
    Decimal(BigDecimal),
    /// xs:integer and its unbounded subtypes
    Integer(BigDecimal),
    /// xs:long
    Long(i64),
    /// xs:int
    Int(i32),
    /// xs:short
    Short(i16),
    /// xs:byte
    Byte(i8),
    /// xs:unsignedLong
    UnsignedLong(u64),
    /// xs:unsignedInt
    UnsignedInt(u32),
    /// xs:unsignedShort
    UnsignedShort(u16),
    /// xs:unsignedByte
    UnsignedByte(u8),
    /// xs:float
    Float(f32),
    /// xs:double
    Double(f64),
    /// Durations
    Duration(Duration),
    /// dateTime family
    Temporal(Temporal),
    /// hexBinary / base64Binary octets
    Binary(Vec<u8>),
    /// QName / NOTATION
    QName {
        /// Expanded name
        name: QName,
        /// Prefix used in the lexical form
        prefix: Option<String>,
    },
}

// Identity comparison: NaN equals NaN so that overlays and round trips compare cleanly.
impl PartialEq for AtomValue {
    fn eq(&self, other: &Self) -> bool {
        use AtomValue as V;
        match (self, other) {
            (V::String(a), V::String(b)) => a == b,
            (V::Boolean(a), V::Boolean(b)) => a == b,
            (V::Decimal(a), V::Decimal(b)) => a == b,
            (V::Integer(a), V::Integer(b)) => a == b,
            (V::Long(a), V::Long(b)) => a == b,
            (V::Int(a), V::Int(b)) => a == b,
            (V::Short(a), V::Short(b)) => a == b,
            (V::Byte(a), V::Byte(b)) => a == b,
            (V::UnsignedLong(a), V::UnsignedLong(b)) => a == b,
            (V::UnsignedInt(a), V::UnsignedInt(b)) => a == b,
            (V::UnsignedShort(a), V::UnsignedShort(b)) => a == b,
            (V::UnsignedByte(a), V::UnsignedByte(b)) => a == b,
            (V::Float(a), V::Float(b)) => a.to_bits() == b.to_bits() || (a.is_nan() && b.is_nan()),
            (V::Double(a), V::Double(b)) => {
                a.to_bits() == b.to_bits() || (a.is_nan() && b.is_nan())
            }
            (V::Duration(a), V::Duration(b)) => a == b,
            (V::Temporal(a), V::Temporal(b)) => a == b,
            (V::Binary(a), V::Binary(b)) => a == b,
            (V::QName { name: a, .. }, V::QName { name: b, .. }) => a == b,
            _ => false,
        }
    }
}

/// A number promoted for comparison
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Numeric {
    Exact(BigDecimal),
    Approximate(f64),
}

impl Numeric {
    pub(crate) fn compare(&self, other: &Numeric) -> Option<Ordering> {
        match (self, other) {
            (Numeric::Exact(a), Numeric::Exact(b)) => Some(a.cmp(b)),
            (a, b) => a.to_f64().partial_cmp(&b.to_f64()),
        }
    }

    pub(crate) fn to_f64(&self) -> f64 {
        match self {
            Numeric::Exact(v) => v.to_f64().unwrap_or(f64::NAN),
            Numeric::Approximate(v) => *v,
        }
    }
}

impl AtomValue {
    pub(crate) fn numeric(&self) -> Option<Numeric> {
        use AtomValue as V;
        Some(match self {
            V::Decimal(d) => Numeric::Exact(d.clone()),
            V::Integer(v) => Numeric::Exact(v.clone()),
            V::Long(v) => Numeric::Exact(BigDecimal::from(*v)),
            V::Int(v) => Numeric::Exact(BigDecimal::from(i64::from(*v))),
            V::Short(v) => Numeric::Exact(BigDecimal::from(i64::from(*v))),
            V::Byte(v) => Numeric::Exact(BigDecimal::from(i64::from(*v))),
            V::UnsignedLong(v) => Numeric::Exact(BigDecimal::from(*v)),
            V::UnsignedInt(v) => Numeric::Exact(BigDecimal::from(u64::from(*v))),
            V::UnsignedShort(v) => Numeric::Exact(BigDecimal::from(u64::from(*v))),
            V::UnsignedByte(v) => Numeric::Exact(BigDecimal::from(u64::from(*v))),
            V::Float(v) => Numeric::Approximate(f64::from(*v)),
            V::Double(v) => Numeric::Approximate(*v),
            _ => return None,
        })
    }
}

/// An immutable typed atomic value
#[derive(Debug, Clone, PartialEq)]
pub struct Atom {
    native: NativeType,
    value: AtomValue,
    foreign: Option<QName>,
}

impl Atom {
    /// Create a native atom. The value must be the representation `native` uses.
    pub fn new(native: NativeType, value: AtomValue) -> Self {
        Self {
            native,
            value,
            foreign: None,
        }
    }

    /// xs:string
    pub fn string(value: impl Into<String>) -> Self {
        Self::new(NativeType::String, AtomValue::String(value.into()))
    }

    /// xs:untypedAtomic
    pub fn untyped(value: impl Into<String>) -> Self {
        Self::new(NativeType::UntypedAtomic, AtomValue::String(value.into()))
    }

    /// xs:boolean
    pub fn boolean(value: bool) -> Self {
        Self::new(NativeType::Boolean, AtomValue::Boolean(value))
    }

    /// xs:decimal
    pub fn decimal(value: BigDecimal) -> Self {
        Self::new(NativeType::Decimal, AtomValue::Decimal(value))
    }

    /// xs:integer
    pub fn integer(value: i64) -> Self {
        Self::new(NativeType::Integer, AtomValue::Integer(BigDecimal::from(value)))
    }

    /// xs:integer from an arbitrary-precision value (fraction truncated)
    pub fn big_integer(value: BigDecimal) -> Self {
        Self::new(NativeType::Integer, AtomValue::Integer(value.with_scale(0)))
    }

    /// xs:long
    pub fn long(value: i64) -> Self {
        Self::new(NativeType::Long, AtomValue::Long(value))
    }

    /// xs:int
    pub fn int(value: i32) -> Self {
        Self::new(NativeType::Int, AtomValue::Int(value))
    }

    /// xs:unsignedByte
    pub fn unsigned_byte(value: u8) -> Self {
        Self::new(NativeType::UnsignedByte, AtomValue::UnsignedByte(value))
    }

    /// xs:float
    pub fn float(value: f32) -> Self {
        Self::new(NativeType::Float, AtomValue::Float(value))
    }

    /// xs:double
    pub fn double(value: f64) -> Self {
        Self::new(NativeType::Double, AtomValue::Double(value))
    }

    /// xs:duration from total months and seconds
    pub fn duration(months: i64, seconds: Decimal) -> Self {
        Self::new(NativeType::Duration, AtomValue::Duration(Duration::new(months, seconds)))
    }

    /// xs:dayTimeDuration
    pub fn day_time_duration(seconds: Decimal) -> Self {
        Self::new(
            NativeType::DayTimeDuration,
            AtomValue::Duration(Duration::new(0, seconds)),
        )
    }

    /// xs:yearMonthDuration
    pub fn year_month_duration(months: i64) -> Self {
        Self::new(
            NativeType::YearMonthDuration,
            AtomValue::Duration(Duration::new(months, Decimal::ZERO)),
        )
    }

    /// xs:dateTime from its fields; `None` when the fields are out of range
    #[allow(clippy::too_many_arguments)]
    pub fn date_time(
        year: i64,
        month: u32,
        day: u32,
        hour: u32,
        minute: u32,
        second: Decimal,
        timezone: Option<i32>,
    ) -> Option<Self> {
        let mut lexical = format!(
            "{}{:04}-{:02}-{:02}T{:02}:{:02}:",
            if year < 0 { "-" } else { "" },
            year.unsigned_abs(),
            month,
            day,
            hour,
            minute
        );
        if second < Decimal::from(10) {
            lexical.push('0');
        }
        lexical.push_str(&second.to_string());
        if let Some(tz) = timezone {
            let sign = if tz < 0 { '-' } else { '+' };
            lexical.push_str(&format!("{}{:02}:{:02}", sign, tz.abs() / 60, tz.abs() % 60));
        }
        Temporal::parse(NativeType::DateTime, &lexical)
            .ok()
            .map(|t| Self::new(NativeType::DateTime, AtomValue::Temporal(t)))
    }

    /// xs:date
    pub fn date(year: i64, month: u32, day: u32, timezone: Option<i32>) -> Option<Self> {
        Self::date_time(year, month, day, 0, 0, Decimal::ZERO, timezone).map(|a| {
            let t = a.temporal().map(|t| t.project(NativeType::Date));
            match t {
                Some(t) => Self::new(NativeType::Date, AtomValue::Temporal(t)),
                None => a,
            }
        })
    }

    /// xs:hexBinary
    pub fn hex_binary(bytes: Vec<u8>) -> Self {
        Self::new(NativeType::HexBinary, AtomValue::Binary(bytes))
    }

    /// xs:base64Binary
    pub fn base64_binary(bytes: Vec<u8>) -> Self {
        Self::new(NativeType::Base64Binary, AtomValue::Binary(bytes))
    }

    /// xs:anyURI
    pub fn any_uri(value: impl Into<String>) -> Self {
        Self::new(NativeType::AnyUri, AtomValue::String(value.into()))
    }

    /// xs:QName
    pub fn qname(name: QName, prefix: Option<String>) -> Self {
        Self::new(NativeType::QName, AtomValue::QName { name, prefix })
    }

    // =========================================================================
    // Foreign overlay
    // =========================================================================

    /// Overlay a user-derived type name on a native atom. The native type and
    /// value are preserved; an existing overlay is replaced.
    pub fn make_foreign(name: QName, base: Atom) -> Atom {
        Atom {
            native: base.native,
            value: base.value,
            foreign: Some(name),
        }
    }

    /// The same value without its overlay
    pub fn up_cast(&self) -> Atom {
        Atom {
            native: self.native,
            value: self.value.clone(),
            foreign: None,
        }
    }

    /// Whether this atom carries a derived-type overlay
    pub fn is_foreign(&self) -> bool {
        self.foreign.is_some()
    }

    /// The overlay name, if any
    pub fn overlay_name(&self) -> Option<&QName> {
        self.foreign.as_ref()
    }

    /// Name of the atom's type: the overlay name, else the native type name
    pub fn type_name(&self) -> QName {
        self.foreign.clone().unwrap_or_else(|| self.native.qname())
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Native type
    pub fn native_type(&self) -> NativeType {
        self.native
    }

    /// Value-space representation
    pub fn value(&self) -> &AtomValue {
        &self.value
    }

    /// Whether this is an untypedAtomic or string consisting only of whitespace
    pub fn is_whitespace(&self) -> bool {
        match &self.value {
            AtomValue::String(s) if self.native.is_string() || self.native == NativeType::UntypedAtomic => {
                is_xml_whitespace(s)
            }
            _ => false,
        }
    }

    /// Boolean value
    pub fn as_boolean(&self) -> Option<bool> {
        match self.value {
            AtomValue::Boolean(b) => Some(b),
            _ => None,
        }
    }

    /// String value for string-like atoms
    pub fn as_str(&self) -> Option<&str> {
        match &self.value {
            AtomValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Integer value for atoms of the integer family
    pub fn as_integer(&self) -> Option<BigDecimal> {
        if !self.native.is_integer() {
            return None;
        }
        match self.value.numeric()? {
            Numeric::Exact(v) => Some(v),
            Numeric::Approximate(_) => None,
        }
    }

    /// Integer value as i64 when it fits
    pub fn as_i64(&self) -> Option<i64> {
        self.as_integer().and_then(|v| v.to_i64())
    }

    /// Decimal value for atoms of the decimal family
    pub fn as_decimal(&self) -> Option<BigDecimal> {
        match &self.value {
            AtomValue::Decimal(d) => Some(d.clone()),
            _ if self.native.is_integer() => self.as_integer(),
            _ => None,
        }
    }

    /// Numeric value as f64
    pub fn as_double(&self) -> Option<f64> {
        self.value.numeric().map(|n| n.to_f64())
    }

    /// Duration value
    pub fn as_duration(&self) -> Option<&Duration> {
        match &self.value {
            AtomValue::Duration(d) => Some(d),
            _ => None,
        }
    }

    /// Calendar value
    pub fn temporal(&self) -> Option<&Temporal> {
        match &self.value {
            AtomValue::Temporal(t) => Some(t),
            _ => None,
        }
    }

    /// Octets of a binary atom
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match &self.value {
            AtomValue::Binary(b) => Some(b),
            _ => None,
        }
    }

    /// Expanded name of a QName/NOTATION atom
    pub fn as_qname(&self) -> Option<&QName> {
        match &self.value {
            AtomValue::QName { name, .. } => Some(name),
            _ => None,
        }
    }

    // =========================================================================
    // Lexical forms
    // =========================================================================

    /// Canonical lexical form (XML Schema canonical representation)
    pub fn c14n_form(&self) -> String {
        self.form(Emulation::C14N)
    }

    /// String form as produced by XPath 1.0 `string()`
    pub fn xpath10_form(&self) -> String {
        self.form(Emulation::XPath10)
    }

    /// String form as produced by an XQuery 1.0 cast to xs:string
    pub fn xquery10_form(&self) -> String {
        self.form(Emulation::XQuery10)
    }

    /// String form under the given emulation
    pub fn form(&self, emulation: Emulation) -> String {
        match &self.value {
            AtomValue::String(s) => s.clone(),
            AtomValue::Boolean(b) => b.to_string(),
            AtomValue::Decimal(d) => format_decimal(d, emulation),
            AtomValue::Integer(v) => plain_decimal(&v.with_scale(0)),
            AtomValue::Long(v) => v.to_string(),
            AtomValue::Int(v) => v.to_string(),
            AtomValue::Short(v) => v.to_string(),
            AtomValue::Byte(v) => v.to_string(),
            AtomValue::UnsignedLong(v) => v.to_string(),
            AtomValue::UnsignedInt(v) => v.to_string(),
            AtomValue::UnsignedShort(v) => v.to_string(),
            AtomValue::UnsignedByte(v) => v.to_string(),
            AtomValue::Float(v) => format_float(f64::from(*v), &v.to_string(), emulation),
            AtomValue::Double(v) => format_float(*v, &v.to_string(), emulation),
            AtomValue::Duration(d) => d.format(self.native),
            AtomValue::Temporal(t) => t.format(self.native, emulation == Emulation::C14N),
            AtomValue::Binary(bytes) => match self.native {
                NativeType::Base64Binary => {
                    base64::engine::general_purpose::STANDARD.encode(bytes)
                }
                _ => bytes.iter().map(|b| format!("{:02X}", b)).collect(),
            },
            AtomValue::QName { name, prefix } => match prefix {
                Some(p) => format!("{}:{}", p, name.local_name),
                None => name.local_name.clone(),
            },
        }
    }

    // =========================================================================
    // Value-space comparison
    // =========================================================================

    /// Equality in the value space (used by enumeration facets)
    pub fn value_eq(&self, other: &Atom) -> bool {
        match (&self.value, &other.value) {
            (AtomValue::Binary(a), AtomValue::Binary(b)) => {
                a == b && self.native.primitive() == other.native.primitive()
            }
            (AtomValue::Temporal(_), AtomValue::Temporal(_))
            | (AtomValue::Duration(_), AtomValue::Duration(_)) => {
                self.native.primitive() == other.native.primitive()
                    && self.value_cmp(other) == Some(Ordering::Equal)
            }
            _ => match (self.value.numeric(), other.value.numeric()) {
                (Some(a), Some(b)) => a.compare(&b) == Some(Ordering::Equal),
                _ => {
                    self.native.primitive() == other.native.primitive() && self.value == other.value
                }
            },
        }
    }

    /// Order in the value space; None when incomparable
    pub fn value_cmp(&self, other: &Atom) -> Option<Ordering> {
        match (&self.value, &other.value) {
            (AtomValue::Temporal(a), AtomValue::Temporal(b)) => {
                if self.native.primitive() == other.native.primitive() {
                    a.compare(b)
                } else {
                    None
                }
            }
            (AtomValue::Duration(a), AtomValue::Duration(b)) => a.compare(b),
            _ => self.value.numeric()?.compare(&other.value.numeric()?),
        }
    }
}

impl fmt::Display for Atom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.c14n_form())
    }
}

fn format_decimal(d: &BigDecimal, emulation: Emulation) -> String {
    let text = plain_decimal(d);
    match emulation {
        Emulation::C14N if !text.contains('.') => format!("{}.0", text),
        _ => text,
    }
}

/// Positional digits with trailing fraction zeros dropped, never an exponent
fn plain_decimal(d: &BigDecimal) -> String {
    let (mantissa, scale) = d.normalized().as_bigint_and_exponent();
    let text = mantissa.to_string();
    let (sign, digits) = match text.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", text.as_str()),
    };
    if digits == "0" {
        return "0".to_string();
    }
    if scale <= 0 {
        let zeros = "0".repeat(scale.unsigned_abs() as usize);
        return format!("{}{}{}", sign, digits, zeros);
    }
    let scale = scale as usize;
    let padded = if digits.len() <= scale {
        format!("{}{}", "0".repeat(scale - digits.len() + 1), digits)
    } else {
        digits.to_string()
    };
    let (int_part, frac_part) = padded.split_at(padded.len() - scale);
    format!("{}{}.{}", sign, int_part, frac_part)
}

fn format_float(v: f64, shortest: &str, emulation: Emulation) -> String {
    if v.is_nan() {
        return "NaN".to_string();
    }
    if v.is_infinite() {
        let sign = if v < 0.0 { "-" } else { "" };
        return match emulation {
            Emulation::XPath10 => format!("{}Infinity", sign),
            _ => format!("{}INF", sign),
        };
    }
    let scientific = || {
        if v == 0.0 {
            return if v.is_sign_negative() { "-0.0E0" } else { "0.0E0" }.to_string();
        }
        let exp = format!("{:E}", shortest.parse::<f64>().unwrap_or(v));
        match exp.split_once('E') {
            Some((mantissa, e)) if !mantissa.contains('.') => format!("{}.0E{}", mantissa, e),
            _ => exp,
        }
    };
    match emulation {
        Emulation::C14N => scientific(),
        Emulation::XPath10 => {
            if v == 0.0 {
                "0".to_string()
            } else {
                shortest.to_string()
            }
        }
        Emulation::XQuery10 => {
            let magnitude = v.abs();
            if v == 0.0 {
                if v.is_sign_negative() { "-0" } else { "0" }.to_string()
            } else if (1e-6..1e6).contains(&magnitude) {
                shortest.to_string()
            } else {
                scientific()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_foreign_overlay() {
        let native = Atom::integer(10);
        let foreign = Atom::make_foreign(QName::namespaced("urn:t", "myInt"), native.clone());
        assert!(foreign.is_foreign());
        assert_eq!(foreign.native_type(), NativeType::Integer);
        assert_eq!(foreign.as_i64(), Some(10));
        assert_eq!(foreign.type_name(), QName::namespaced("urn:t", "myInt"));
        assert_ne!(foreign, native);
        assert_eq!(foreign.up_cast(), native);
        assert!(!foreign.up_cast().is_foreign());
    }

    #[test]
    fn test_integer_forms() {
        let a = Atom::integer(10);
        assert_eq!(a.c14n_form(), "10");
        assert_eq!(a.xpath10_form(), "10");
        assert_eq!(a.xquery10_form(), "10");
    }

    #[test]
    fn test_decimal_forms() {
        let a = Atom::decimal(BigDecimal::from_str("10.500").unwrap());
        assert_eq!(a.c14n_form(), "10.5");
        let b = Atom::decimal(BigDecimal::from(10));
        assert_eq!(b.c14n_form(), "10.0");
        assert_eq!(b.xquery10_form(), "10");
        let hundred = Atom::decimal(BigDecimal::from_str("100.00").unwrap());
        assert_eq!(hundred.c14n_form(), "100.0");
        let small = Atom::decimal(BigDecimal::from_str("-0.0005").unwrap());
        assert_eq!(small.c14n_form(), "-0.0005");
        assert_eq!(Atom::decimal(BigDecimal::from(0)).c14n_form(), "0.0");
    }

    #[test]
    fn test_decimal_beyond_28_digits() {
        let text = "1234567890123456789012345678901.5";
        let a = Atom::decimal(BigDecimal::from_str(text).unwrap());
        assert_eq!(a.c14n_form(), text);
        let b = Atom::decimal(BigDecimal::from_str("1234567890123456789012345678901.50").unwrap());
        assert!(a.value_eq(&b));
        let c = Atom::decimal(BigDecimal::from_str("1234567890123456789012345678901.6").unwrap());
        assert_eq!(a.value_cmp(&c), Some(Ordering::Less));
    }

    #[test]
    fn test_double_forms() {
        let a = Atom::double(10.0);
        assert_eq!(a.c14n_form(), "1.0E1");
        assert_eq!(a.xpath10_form(), "10");
        assert_eq!(a.xquery10_form(), "10");

        let big = Atom::double(1.5e7);
        assert_eq!(big.xquery10_form(), "1.5E7");
        assert_eq!(big.xpath10_form(), "15000000");

        let inf = Atom::double(f64::INFINITY);
        assert_eq!(inf.c14n_form(), "INF");
        assert_eq!(inf.xpath10_form(), "Infinity");
        assert_eq!(Atom::double(f64::NAN).c14n_form(), "NaN");
        assert_eq!(Atom::double(0.0).c14n_form(), "0.0E0");
    }

    #[test]
    fn test_date_time_c14n() {
        let a = Atom::date_time(2009, 10, 18, 8, 3, Decimal::from(19), Some(0)).unwrap();
        assert_eq!(a.c14n_form(), "2009-10-18T08:03:19Z");
        assert!(Atom::date_time(2009, 2, 30, 8, 3, Decimal::from(19), None).is_none());
        let d = Atom::date(2009, 10, 18, None).unwrap();
        assert_eq!(d.c14n_form(), "2009-10-18");
    }

    #[test]
    fn test_duration_forms() {
        let a = Atom::duration(14, Decimal::from(3600));
        assert_eq!(a.c14n_form(), "P1Y2MT1H");
        assert_eq!(Atom::year_month_duration(0).c14n_form(), "P0M");
    }

    #[test]
    fn test_binary_forms() {
        let hex = Atom::hex_binary(vec![0x0f, 0xa0]);
        assert_eq!(hex.c14n_form(), "0FA0");
        let b64 = Atom::base64_binary(b"Hello".to_vec());
        assert_eq!(b64.c14n_form(), "SGVsbG8=");
    }

    #[test]
    fn test_value_eq_across_numeric_types() {
        assert!(Atom::integer(3).value_eq(&Atom::unsigned_byte(3)));
        assert!(Atom::decimal(BigDecimal::from(3)).value_eq(&Atom::long(3)));
        assert!(!Atom::integer(3).value_eq(&Atom::integer(4)));
        assert_eq!(
            Atom::integer(3).value_cmp(&Atom::double(2.5)),
            Some(Ordering::Greater)
        );
        assert_eq!(Atom::string("a").value_cmp(&Atom::string("b")), None);
    }

    #[test]
    fn test_is_whitespace() {
        assert!(Atom::untyped(" \n\t").is_whitespace());
        assert!(!Atom::untyped(" x ").is_whitespace());
        assert!(!Atom::boolean(true).is_whitespace());
    }
}
