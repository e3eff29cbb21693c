//! XSD built-in types
//!
//! The fixed lattice of native atomic types: names, derivation chain,
//! default whitespace policy, admitted facets, the closed ranges of the
//! integer-derived types, and the lexical-to-value rules that turn a
//! normalized lexical form into an [`AtomValue`].
//!
//! Reference: https://www.w3.org/TR/xmlschema-2/#built-in-datatypes

use base64::Engine;
use bigdecimal::{BigDecimal, ToPrimitive};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::atoms::values::{Duration, Temporal};
use crate::atoms::AtomValue;
use crate::namespaces::{split_prefixed, QName, XSD_NAMESPACE};

use super::facets::{FacetKind, WhiteSpace};

/// Resolves a prefix (or the default namespace for `None`) to a namespace URI
pub type PrefixResolver<'a> = &'a dyn Fn(Option<&str>) -> Option<String>;

/// A native (built-in) atomic type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[allow(missing_docs)]
pub enum NativeType {
    AnySimpleType,
    AnyAtomicType,
    UntypedAtomic,
    String,
    NormalizedString,
    Token,
    Language,
    Name,
    NCName,
    Id,
    IdRef,
    Entity,
    NmToken,
    Boolean,
    Decimal,
    Integer,
    NonPositiveInteger,
    NegativeInteger,
    Long,
    Int,
    Short,
    Byte,
    NonNegativeInteger,
    UnsignedLong,
    UnsignedInt,
    UnsignedShort,
    UnsignedByte,
    PositiveInteger,
    Float,
    Double,
    Duration,
    DayTimeDuration,
    YearMonthDuration,
    DateTime,
    Date,
    Time,
    GYearMonth,
    GYear,
    GMonthDay,
    GDay,
    GMonth,
    HexBinary,
    Base64Binary,
    AnyUri,
    QName,
    Notation,
}

impl NativeType {
    /// Every native type, supertypes before subtypes
    pub const ALL: [NativeType; 46] = [
        NativeType::AnySimpleType,
        NativeType::AnyAtomicType,
        NativeType::UntypedAtomic,
        NativeType::String,
        NativeType::NormalizedString,
        NativeType::Token,
        NativeType::Language,
        NativeType::Name,
        NativeType::NCName,
        NativeType::Id,
        NativeType::IdRef,
        NativeType::Entity,
        NativeType::NmToken,
        NativeType::Boolean,
        NativeType::Decimal,
        NativeType::Integer,
        NativeType::NonPositiveInteger,
        NativeType::NegativeInteger,
        NativeType::Long,
        NativeType::Int,
        NativeType::Short,
        NativeType::Byte,
        NativeType::NonNegativeInteger,
        NativeType::UnsignedLong,
        NativeType::UnsignedInt,
        NativeType::UnsignedShort,
        NativeType::UnsignedByte,
        NativeType::PositiveInteger,
        NativeType::Float,
        NativeType::Double,
        NativeType::Duration,
        NativeType::DayTimeDuration,
        NativeType::YearMonthDuration,
        NativeType::DateTime,
        NativeType::Date,
        NativeType::Time,
        NativeType::GYearMonth,
        NativeType::GYear,
        NativeType::GMonthDay,
        NativeType::GDay,
        NativeType::GMonth,
        NativeType::HexBinary,
        NativeType::Base64Binary,
        NativeType::AnyUri,
        NativeType::QName,
        NativeType::Notation,
    ];

    /// Local name in the XSD namespace
    pub fn local_name(self) -> &'static str {
        match self {
            NativeType::AnySimpleType => "anySimpleType",
            NativeType::AnyAtomicType => "anyAtomicType",
            NativeType::UntypedAtomic => "untypedAtomic",
            NativeType::String => "string",
            NativeType::NormalizedString => "normalizedString",
            NativeType::Token => "token",
            NativeType::Language => "language",
            NativeType::Name => "Name",
            NativeType::NCName => "NCName",
            NativeType::Id => "ID",
            NativeType::IdRef => "IDREF",
            NativeType::Entity => "ENTITY",
            NativeType::NmToken => "NMTOKEN",
            NativeType::Boolean => "boolean",
            NativeType::Decimal => "decimal",
            NativeType::Integer => "integer",
            NativeType::NonPositiveInteger => "nonPositiveInteger",
            NativeType::NegativeInteger => "negativeInteger",
            NativeType::Long => "long",
            NativeType::Int => "int",
            NativeType::Short => "short",
            NativeType::Byte => "byte",
            NativeType::NonNegativeInteger => "nonNegativeInteger",
            NativeType::UnsignedLong => "unsignedLong",
            NativeType::UnsignedInt => "unsignedInt",
            NativeType::UnsignedShort => "unsignedShort",
            NativeType::UnsignedByte => "unsignedByte",
            NativeType::PositiveInteger => "positiveInteger",
            NativeType::Float => "float",
            NativeType::Double => "double",
            NativeType::Duration => "duration",
            NativeType::DayTimeDuration => "dayTimeDuration",
            NativeType::YearMonthDuration => "yearMonthDuration",
            NativeType::DateTime => "dateTime",
            NativeType::Date => "date",
            NativeType::Time => "time",
            NativeType::GYearMonth => "gYearMonth",
            NativeType::GYear => "gYear",
            NativeType::GMonthDay => "gMonthDay",
            NativeType::GDay => "gDay",
            NativeType::GMonth => "gMonth",
            NativeType::HexBinary => "hexBinary",
            NativeType::Base64Binary => "base64Binary",
            NativeType::AnyUri => "anyURI",
            NativeType::QName => "QName",
            NativeType::Notation => "NOTATION",
        }
    }

    /// Expanded name in the XSD namespace
    pub fn qname(self) -> QName {
        QName::namespaced(XSD_NAMESPACE, self.local_name())
    }

    /// Look up a native type by its local name
    pub fn from_local_name(name: &str) -> Option<Self> {
        NATIVE_TYPES_BY_NAME.get(name).copied()
    }

    /// Look up a native type by expanded name
    pub fn from_qname(name: &QName) -> Option<Self> {
        if name.namespace.as_deref() == Some(XSD_NAMESPACE) {
            Self::from_local_name(&name.local_name)
        } else {
            None
        }
    }

    /// The declared base type (None only for anySimpleType)
    pub fn base(self) -> Option<NativeType> {
        use NativeType as T;
        Some(match self {
            T::AnySimpleType => return None,
            T::AnyAtomicType => T::AnySimpleType,
            T::NormalizedString => T::String,
            T::Token => T::NormalizedString,
            T::Language | T::Name | T::NmToken => T::Token,
            T::NCName => T::Name,
            T::Id | T::IdRef | T::Entity => T::NCName,
            T::Integer => T::Decimal,
            T::NonPositiveInteger | T::Long | T::NonNegativeInteger => T::Integer,
            T::NegativeInteger => T::NonPositiveInteger,
            T::Int => T::Long,
            T::Short => T::Int,
            T::Byte => T::Short,
            T::UnsignedLong | T::PositiveInteger => T::NonNegativeInteger,
            T::UnsignedInt => T::UnsignedLong,
            T::UnsignedShort => T::UnsignedInt,
            T::UnsignedByte => T::UnsignedShort,
            T::DayTimeDuration | T::YearMonthDuration => T::Duration,
            _ => T::AnyAtomicType,
        })
    }

    /// Whether this is one of the primitive types
    pub fn is_primitive(self) -> bool {
        self.base() == Some(NativeType::AnyAtomicType) && self != NativeType::UntypedAtomic
    }

    /// The primitive type at the top of this type's chain
    /// (the special types answer themselves)
    pub fn primitive(self) -> NativeType {
        let mut current = self;
        while let Some(base) = current.base() {
            if base == NativeType::AnyAtomicType || base == NativeType::AnySimpleType {
                return current;
            }
            current = base;
        }
        current
    }

    /// Whether `self` is `other` or derives from it
    pub fn is_subtype_of(self, other: NativeType) -> bool {
        let mut current = Some(self);
        while let Some(t) = current {
            if t == other {
                return true;
            }
            current = t.base();
        }
        false
    }

    /// Whitespace policy applied before parsing
    pub fn white_space(self) -> WhiteSpace {
        match self {
            NativeType::AnySimpleType
            | NativeType::AnyAtomicType
            | NativeType::UntypedAtomic
            | NativeType::String => WhiteSpace::Preserve,
            NativeType::NormalizedString => WhiteSpace::Replace,
            _ => WhiteSpace::Collapse,
        }
    }

    /// Whether this type belongs to the decimal family
    pub fn is_decimal(self) -> bool {
        self.is_subtype_of(NativeType::Decimal)
    }

    /// Whether this type belongs to the integer family
    pub fn is_integer(self) -> bool {
        self.is_subtype_of(NativeType::Integer)
    }

    /// Whether this type is numeric
    pub fn is_numeric(self) -> bool {
        self.is_decimal() || matches!(self, NativeType::Float | NativeType::Double)
    }

    /// Whether this type belongs to the string family
    pub fn is_string(self) -> bool {
        self.is_subtype_of(NativeType::String)
    }

    /// Whether this type belongs to the dateTime family (durations excluded)
    pub fn is_calendar(self) -> bool {
        matches!(
            self,
            NativeType::DateTime
                | NativeType::Date
                | NativeType::Time
                | NativeType::GYearMonth
                | NativeType::GYear
                | NativeType::GMonthDay
                | NativeType::GDay
                | NativeType::GMonth
        )
    }

    /// Whether this type is a duration
    pub fn is_duration(self) -> bool {
        self.is_subtype_of(NativeType::Duration)
    }

    /// Whether this is one of the abstract special types
    pub fn is_abstract(self) -> bool {
        matches!(self, NativeType::AnySimpleType | NativeType::AnyAtomicType)
    }

    /// Closed value range of an integer-derived type (None = unbounded side)
    pub fn integer_bounds(self) -> (Option<BigDecimal>, Option<BigDecimal>) {
        use NativeType as T;
        let (min, max): (Option<i64>, Option<u64>) = match self {
            T::NonPositiveInteger => (None, Some(0)),
            T::NegativeInteger => {
                return (None, Some(BigDecimal::from(-1i64)));
            }
            T::Long => (Some(i64::MIN), Some(i64::MAX as u64)),
            T::Int => (Some(i32::MIN.into()), Some(i32::MAX as u64)),
            T::Short => (Some(i16::MIN.into()), Some(i16::MAX as u64)),
            T::Byte => (Some(i8::MIN.into()), Some(i8::MAX as u64)),
            T::NonNegativeInteger => (Some(0), None),
            T::PositiveInteger => (Some(1), None),
            T::UnsignedLong => (Some(0), Some(u64::MAX)),
            T::UnsignedInt => (Some(0), Some(u32::MAX.into())),
            T::UnsignedShort => (Some(0), Some(u16::MAX.into())),
            T::UnsignedByte => (Some(0), Some(u8::MAX.into())),
            _ => (None, None),
        };
        (min.map(BigDecimal::from), max.map(BigDecimal::from))
    }

    /// Whether a facet may be applied to values of this type
    pub fn admits(self, facet: FacetKind) -> bool {
        use FacetKind::*;
        let primitive = self.primitive();
        match facet {
            Pattern | WhiteSpace => !self.is_abstract(),
            Enumeration => !self.is_abstract() && primitive != NativeType::Boolean,
            Length | MinLength | MaxLength => matches!(
                primitive,
                NativeType::String
                    | NativeType::UntypedAtomic
                    | NativeType::HexBinary
                    | NativeType::Base64Binary
                    | NativeType::AnyUri
                    | NativeType::QName
                    | NativeType::Notation
            ),
            MinInclusive | MaxInclusive | MinExclusive | MaxExclusive => {
                self.is_numeric() || self.is_calendar() || self.is_duration()
            }
            TotalDigits | FractionDigits => self.is_decimal(),
        }
    }
}

impl fmt::Display for NativeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "xs:{}", self.local_name())
    }
}

// =============================================================================
// Registry
// =============================================================================

lazy_static::lazy_static! {
    /// Native types by local name
    static ref NATIVE_TYPES_BY_NAME: HashMap<&'static str, NativeType> = NativeType::ALL
        .iter()
        .map(|t| (t.local_name(), *t))
        .collect();
}

// =============================================================================
// Lexical Rules
// =============================================================================

const NAME_START: &str = r"[\p{L}_:]";
const NAME_CHAR: &str = r"[\p{L}\p{N}\p{Mn}\p{Mc}._:\x{B7}-]";

static LANGUAGE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z]{1,8}(-[a-zA-Z0-9]{1,8})*$").expect("language pattern"));
static NAME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!("^{}{}*$", NAME_START, NAME_CHAR)).expect("Name pattern")
});
static NMTOKEN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!("^{}+$", NAME_CHAR)).expect("NMTOKEN pattern"));
static DECIMAL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[+-]?(\d+(\.\d*)?|\.\d+)$").expect("decimal pattern"));
static INTEGER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[+-]?\d+$").expect("integer pattern"));
static FLOAT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([+-]?(\d+(\.\d*)?|\.\d+)([eE][+-]?\d+)?|-?INF|NaN)$").expect("float pattern")
});
static HEX_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([0-9a-fA-F]{2})*$").expect("hexBinary pattern"));
static URI_BASE: Lazy<Option<url::Url>> =
    Lazy::new(|| url::Url::parse("http://base.invalid/").ok());

fn is_ncname(s: &str) -> bool {
    NAME_RE.is_match(s) && !s.contains(':')
}

/// Parse an arbitrary-precision integer lexical form
pub fn parse_big_integer(s: &str) -> Option<BigDecimal> {
    if !INTEGER_RE.is_match(s) {
        return None;
    }
    let (negative, digits) = match s.as_bytes()[0] {
        b'-' => (true, &s[1..]),
        b'+' => (false, &s[1..]),
        _ => (false, s),
    };
    let digits = digits.trim_start_matches('0');
    let digits = if digits.is_empty() { "0" } else { digits };
    let text = if negative && digits != "0" {
        format!("-{}", digits)
    } else {
        digits.to_string()
    };
    BigDecimal::from_str(&text).ok()
}

/// Parse an `xs:decimal` lexical form
pub fn parse_decimal(s: &str) -> Option<BigDecimal> {
    if !DECIMAL_RE.is_match(s) {
        return None;
    }
    let mut text = s.trim_start_matches('+').to_string();
    if text.ends_with('.') {
        text.push('0');
    }
    if let Some(rest) = text.strip_prefix("-.") {
        text = format!("-0.{}", rest);
    } else if text.starts_with('.') {
        text.insert(0, '0');
    }
    BigDecimal::from_str(&text).ok()
}

/// Parse an `xs:double` lexical form
pub fn parse_double(s: &str) -> Option<f64> {
    if !FLOAT_RE.is_match(s) {
        return None;
    }
    match s {
        "INF" => Some(f64::INFINITY),
        "-INF" => Some(f64::NEG_INFINITY),
        "NaN" => Some(f64::NAN),
        _ => s.parse().ok(),
    }
}

fn decode_hex(s: &str) -> Option<Vec<u8>> {
    if !HEX_RE.is_match(s) {
        return None;
    }
    (0..s.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&s[i..i + 2], 16).ok())
        .collect()
}

/// Narrow a range-checked integer into the representation of its type
pub fn narrow_integer(native: NativeType, value: BigDecimal) -> Option<AtomValue> {
    Some(match native {
        NativeType::Long => AtomValue::Long(value.to_i64()?),
        NativeType::Int => AtomValue::Int(value.to_i32()?),
        NativeType::Short => AtomValue::Short(value.to_i16()?),
        NativeType::Byte => AtomValue::Byte(value.to_i8()?),
        NativeType::UnsignedLong => AtomValue::UnsignedLong(value.to_u64()?),
        NativeType::UnsignedInt => AtomValue::UnsignedInt(value.to_u32()?),
        NativeType::UnsignedShort => AtomValue::UnsignedShort(value.to_u16()?),
        NativeType::UnsignedByte => AtomValue::UnsignedByte(value.to_u8()?),
        _ => AtomValue::Integer(value),
    })
}

/// Check an integer against the closed range of `native`
pub fn check_integer_range(native: NativeType, value: &BigDecimal) -> Result<(), String> {
    let (min, max) = native.integer_bounds();
    if min.as_ref().is_some_and(|min| value < min) || max.as_ref().is_some_and(|max| value > max)
    {
        let show = |b: Option<BigDecimal>| b.map(|v| v.to_string()).unwrap_or_else(|| "∞".into());
        return Err(format!(
            "value {} is outside the range [{}, {}]",
            value,
            show(min),
            show(max)
        ));
    }
    Ok(())
}

/// Parse a whitespace-normalized lexical form into the value space of `native`.
///
/// Returns the reason on failure; callers wrap it into a lexical-space violation.
pub fn parse_lexical(
    native: NativeType,
    s: &str,
    resolver: Option<PrefixResolver<'_>>,
) -> Result<AtomValue, String> {
    use NativeType as T;
    let invalid = || format!("'{}' is not a valid value for {}", s, native);
    match native {
        T::AnySimpleType | T::AnyAtomicType | T::UntypedAtomic | T::String => {
            Ok(AtomValue::String(s.to_string()))
        }
        T::NormalizedString | T::Token => {
            if s.contains(['\t', '\n', '\r'])
                || (native == T::Token && (s.starts_with(' ') || s.ends_with(' ') || s.contains("  ")))
            {
                return Err(invalid());
            }
            Ok(AtomValue::String(s.to_string()))
        }
        T::Language if LANGUAGE_RE.is_match(s) => Ok(AtomValue::String(s.to_string())),
        T::Name if NAME_RE.is_match(s) => Ok(AtomValue::String(s.to_string())),
        T::NCName | T::Id | T::IdRef | T::Entity if is_ncname(s) => Ok(AtomValue::String(s.to_string())),
        T::NmToken if NMTOKEN_RE.is_match(s) => Ok(AtomValue::String(s.to_string())),
        T::Language | T::Name | T::NCName | T::Id | T::IdRef | T::Entity | T::NmToken => Err(invalid()),
        T::Boolean => match s {
            "true" | "1" => Ok(AtomValue::Boolean(true)),
            "false" | "0" => Ok(AtomValue::Boolean(false)),
            _ => Err(invalid()),
        },
        T::Decimal => parse_decimal(s).map(AtomValue::Decimal).ok_or_else(invalid),
        t if t.is_integer() => {
            let value = parse_big_integer(s).ok_or_else(invalid)?;
            check_integer_range(t, &value)?;
            narrow_integer(t, value).ok_or_else(invalid)
        }
        T::Float => {
            if !FLOAT_RE.is_match(s) {
                return Err(invalid());
            }
            let v = match s {
                "INF" => f32::INFINITY,
                "-INF" => f32::NEG_INFINITY,
                "NaN" => f32::NAN,
                _ => s.parse::<f32>().map_err(|_| invalid())?,
            };
            Ok(AtomValue::Float(v))
        }
        T::Double => parse_double(s).map(AtomValue::Double).ok_or_else(invalid),
        T::Duration | T::DayTimeDuration | T::YearMonthDuration => {
            Duration::parse(native, s).map(AtomValue::Duration)
        }
        t if t.is_calendar() => Temporal::parse(t, s).map(AtomValue::Temporal),
        T::HexBinary => decode_hex(s).map(AtomValue::Binary).ok_or_else(invalid),
        T::Base64Binary => {
            let compact: String = s.chars().filter(|c| *c != ' ').collect();
            base64::engine::general_purpose::STANDARD
                .decode(compact)
                .map(AtomValue::Binary)
                .map_err(|e| format!("{}: {}", invalid(), e))
        }
        T::AnyUri => {
            let base = URI_BASE.as_ref().ok_or_else(invalid)?;
            url::Url::options()
                .base_url(Some(base))
                .parse(s)
                .map(|_| AtomValue::String(s.to_string()))
                .map_err(|e| format!("{}: {}", invalid(), e))
        }
        T::QName | T::Notation => {
            let (prefix, local) = split_prefixed(s);
            if !is_ncname(local) || prefix.is_some_and(|p| !is_ncname(p)) {
                return Err(invalid());
            }
            let namespace = match (prefix, resolver) {
                (Some(p), Some(resolve)) => Some(
                    resolve(Some(p)).ok_or_else(|| format!("prefix '{}' is not bound", p))?,
                ),
                (Some(p), None) => return Err(format!("prefix '{}' is not bound", p)),
                (None, Some(resolve)) => resolve(None),
                (None, None) => None,
            };
            Ok(AtomValue::QName {
                name: QName::new(namespace, local),
                prefix: prefix.map(str::to_string),
            })
        }
        _ => Err(invalid()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(native: NativeType, s: &str) -> Result<AtomValue, std::string::String> {
        parse_lexical(native, &native.white_space().normalize(s), None)
    }

    #[test]
    fn test_derivation_chain() {
        assert_eq!(NativeType::UnsignedByte.base(), Some(NativeType::UnsignedShort));
        assert_eq!(NativeType::UnsignedByte.primitive(), NativeType::Decimal);
        assert_eq!(NativeType::Id.primitive(), NativeType::String);
        assert!(NativeType::UnsignedByte.is_subtype_of(NativeType::NonNegativeInteger));
        assert!(!NativeType::UnsignedByte.is_subtype_of(NativeType::Long));
        assert!(NativeType::Double.is_primitive());
        assert!(!NativeType::UntypedAtomic.is_primitive());
    }

    #[test]
    fn test_every_chain_terminates() {
        for t in NativeType::ALL {
            let mut steps = 0;
            let mut current = Some(t);
            while let Some(c) = current {
                current = c.base();
                steps += 1;
                assert!(steps < 20, "cycle at {}", t);
            }
        }
    }

    #[test]
    fn test_registry() {
        assert_eq!(NativeType::from_local_name("ID"), Some(NativeType::Id));
        assert_eq!(
            NativeType::from_qname(&crate::namespaces::QName::xsd("gYear")),
            Some(NativeType::GYear)
        );
        assert_eq!(NativeType::from_local_name("unknownType"), None);
    }

    #[test]
    fn test_string_types() {
        assert!(parse(NativeType::String, "Hello  World").is_ok());
        assert!(parse(NativeType::Token, " Hello   World ").is_ok());
        assert!(parse(NativeType::NCName, "validName").is_ok());
        assert!(parse(NativeType::NCName, "invalid:name").is_err());
        assert!(parse(NativeType::Name, "a:b").is_ok());
        assert!(parse(NativeType::Language, "en-US").is_ok());
        assert!(parse(NativeType::Language, "123").is_err());
        assert!(parse(NativeType::NmToken, "-12.a").is_ok());
    }

    #[test]
    fn test_boolean_type() {
        assert_eq!(parse(NativeType::Boolean, "1").unwrap(), AtomValue::Boolean(true));
        assert_eq!(parse(NativeType::Boolean, " false ").unwrap(), AtomValue::Boolean(false));
        assert!(parse(NativeType::Boolean, "yes").is_err());
    }

    #[test]
    fn test_integer_ranges() {
        assert_eq!(parse(NativeType::Byte, "-128").unwrap(), AtomValue::Byte(-128));
        assert!(parse(NativeType::Byte, "128").is_err());
        assert_eq!(
            parse(NativeType::UnsignedByte, "+0255").unwrap(),
            AtomValue::UnsignedByte(255)
        );
        assert!(parse(NativeType::UnsignedByte, "256").is_err());
        assert!(parse(NativeType::UnsignedByte, "-1").is_err());
        assert_eq!(
            parse(NativeType::UnsignedLong, "18446744073709551615").unwrap(),
            AtomValue::UnsignedLong(u64::MAX)
        );
        assert!(parse(NativeType::UnsignedLong, "18446744073709551616").is_err());
        assert!(parse(NativeType::PositiveInteger, "0").is_err());
        assert!(parse(NativeType::NegativeInteger, "-0").is_err());
        assert!(parse(NativeType::Integer, "123456789012345678901234567890").is_ok());
        assert!(parse(NativeType::Integer, "1.0").is_err());
    }

    #[test]
    fn test_numeric_lexicals() {
        assert!(parse(NativeType::Decimal, "-.5").is_ok());
        assert!(parse(NativeType::Decimal, "5.").is_ok());
        assert!(parse(NativeType::Decimal, "1e5").is_err());
        assert!(parse(NativeType::Double, "1.23e10").is_ok());
        assert!(parse(NativeType::Double, "+INF").is_err());
        assert!(matches!(parse(NativeType::Float, "NaN"), Ok(AtomValue::Float(v)) if v.is_nan()));
    }

    #[test]
    fn test_decimal_keeps_every_digit() {
        let text = "1234567890123456789012345678901.5";
        assert_eq!(parse_decimal(text), BigDecimal::from_str(text).ok());
        let tiny = parse_decimal("0.000000000000000000000000000000001").unwrap();
        assert!(tiny > BigDecimal::from(0));
        assert_eq!(parse_decimal("-.5"), BigDecimal::from_str("-0.5").ok());
    }

    #[test]
    fn test_binary_types() {
        assert_eq!(
            parse(NativeType::HexBinary, "0a1B").unwrap(),
            AtomValue::Binary(vec![0x0a, 0x1b])
        );
        assert!(parse(NativeType::HexBinary, "ABC").is_err());
        assert_eq!(
            parse(NativeType::Base64Binary, "SGVs bG8=").unwrap(),
            AtomValue::Binary(b"Hello".to_vec())
        );
    }

    #[test]
    fn test_qname_resolution() {
        let resolver = |p: Option<&str>| match p {
            Some("t") => Some("urn:t".to_string()),
            _ => None,
        };
        let value = parse_lexical(NativeType::QName, "t:item", Some(&resolver)).unwrap();
        assert_eq!(
            value,
            AtomValue::QName {
                name: crate::namespaces::QName::namespaced("urn:t", "item"),
                prefix: Some("t".to_string())
            }
        );
        assert!(parse_lexical(NativeType::QName, "u:item", Some(&resolver)).is_err());
        assert!(parse_lexical(NativeType::QName, "u:item", None).is_err());
    }

    #[test]
    fn test_admitted_facets() {
        assert!(NativeType::String.admits(FacetKind::MaxLength));
        assert!(!NativeType::Integer.admits(FacetKind::MaxLength));
        assert!(NativeType::Integer.admits(FacetKind::TotalDigits));
        assert!(NativeType::Date.admits(FacetKind::MinInclusive));
        assert!(!NativeType::Boolean.admits(FacetKind::Enumeration));
    }
}
