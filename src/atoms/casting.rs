//! Casting between native atomic types
//!
//! Every cast runs under a [`CastingContext`]: the [`Emulation`] picks the
//! string form used when the target is string-like, the [`SpillagePolicy`]
//! decides what happens when the source value does not fit the target
//! value space. The result depends only on the atom and the context.

use bigdecimal::BigDecimal;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::{Atom, AtomValue, Numeric};
use crate::validators::builtins::{check_integer_range, narrow_integer, parse_lexical, NativeType};
use crate::validators::exceptions::{CastCode, CastViolation};

/// How string forms are produced when casting to string-like types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Emulation {
    /// XML Schema canonical representation
    #[default]
    C14N,
    /// XPath 1.0 `string()` conventions
    XPath10,
    /// XQuery 1.0 `cast as xs:string` conventions
    XQuery10,
}

/// What to do with values the target type cannot represent exactly
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SpillagePolicy {
    /// Fail the cast
    #[default]
    Reject,
    /// Saturate to the nearest representable value; NaN still fails
    BestEffort,
}

/// Policy carried by every cast
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CastingContext {
    /// String form conventions
    pub emulation: Emulation,
    /// Overflow handling
    pub spillage: SpillagePolicy,
}

impl CastingContext {
    /// Create a casting context
    pub fn new(emulation: Emulation, spillage: SpillagePolicy) -> Self {
        Self {
            emulation,
            spillage,
        }
    }

    /// Canonical forms with saturating overflow
    pub fn best_effort() -> Self {
        Self::new(Emulation::C14N, SpillagePolicy::BestEffort)
    }

    fn saturates(&self) -> bool {
        self.spillage == SpillagePolicy::BestEffort
    }
}

/// Cast an atom to a native type.
///
/// A foreign atom is cast through its native value; the result is always native.
pub fn cast_as(
    atom: &Atom,
    target: NativeType,
    ctx: &CastingContext,
) -> Result<Atom, CastViolation> {
    let source = atom.native_type();
    let fail = |code: CastCode, reason: String| {
        CastViolation::new(code, source, target, atom.form(ctx.emulation), reason)
    };

    if source == target {
        return Ok(atom.up_cast());
    }
    if target.is_abstract() {
        return Err(fail(CastCode::NotCastable, format!("{} is abstract", target)));
    }

    if matches!(target, NativeType::String | NativeType::UntypedAtomic) {
        let form = atom.form(ctx.emulation);
        return Ok(Atom::new(target, AtomValue::String(form)));
    }

    let string_like = source.is_string() || source == NativeType::UntypedAtomic;
    if string_like || target.is_string() {
        let text = match atom.value() {
            AtomValue::String(s) => s.clone(),
            _ => atom.form(ctx.emulation),
        };
        let normalized = target.white_space().normalize(&text);
        return parse_lexical(target, &normalized, None)
            .map(|value| Atom::new(target, value))
            .map_err(|reason| fail(CastCode::InvalidValue, reason));
    }

    let value = match (atom.value(), target) {
        (AtomValue::Boolean(b), t) if t.is_numeric() => {
            let n = Numeric::Exact(BigDecimal::from(i64::from(*b)));
            numeric_to(&n, target, ctx, &fail)?
        }
        (v, NativeType::Boolean) if source.is_numeric() => {
            let truth = match v.numeric() {
                Some(Numeric::Exact(n)) => n != BigDecimal::from(0i64),
                Some(Numeric::Approximate(f)) => f != 0.0 && !f.is_nan(),
                None => return Err(not_castable(&fail, source, target)),
            };
            AtomValue::Boolean(truth)
        }
        (v, t) if source.is_numeric() && t.is_numeric() => {
            let n = v
                .numeric()
                .ok_or_else(|| not_castable(&fail, source, target))?;
            numeric_to(&n, target, ctx, &fail)?
        }
        (AtomValue::Duration(d), t) if t.is_duration() => {
            let mut d = *d;
            match t {
                NativeType::DayTimeDuration => d.months = 0,
                NativeType::YearMonthDuration => d.seconds = Decimal::ZERO,
                _ => {}
            }
            AtomValue::Duration(d)
        }
        (AtomValue::Temporal(t), target) if calendar_castable(source, target) => {
            AtomValue::Temporal(t.project(target))
        }
        (AtomValue::Binary(bytes), NativeType::HexBinary | NativeType::Base64Binary)
            if matches!(source, NativeType::HexBinary | NativeType::Base64Binary) =>
        {
            AtomValue::Binary(bytes.clone())
        }
        _ => return Err(not_castable(&fail, source, target)),
    };
    tracing::trace!(from = %source, to = %target, "cast");
    Ok(Atom::new(target, value))
}

fn not_castable<F>(fail: &F, source: NativeType, target: NativeType) -> CastViolation
where
    F: Fn(CastCode, String) -> CastViolation,
{
    fail(
        CastCode::NotCastable,
        format!("{} is not castable to {}", source, target),
    )
}

fn calendar_castable(source: NativeType, target: NativeType) -> bool {
    match source {
        NativeType::DateTime => target.is_calendar(),
        NativeType::Date => target.is_calendar() && target != NativeType::Time,
        _ => false,
    }
}

fn numeric_to<F>(
    n: &Numeric,
    target: NativeType,
    ctx: &CastingContext,
    fail: &F,
) -> Result<AtomValue, CastViolation>
where
    F: Fn(CastCode, String) -> CastViolation,
{
    match target {
        NativeType::Double => Ok(AtomValue::Double(n.to_f64())),
        NativeType::Float => {
            let wide = n.to_f64();
            let narrow = wide as f32;
            if wide.is_finite() && narrow.is_infinite() && !ctx.saturates() {
                return Err(fail(
                    CastCode::InvalidValue,
                    "value overflows xs:float".to_string(),
                ));
            }
            Ok(AtomValue::Float(narrow))
        }
        NativeType::Decimal => to_decimal(n, fail).map(AtomValue::Decimal),
        t if t.is_integer() => {
            let value = to_integer(n, t, ctx, fail)?;
            narrow_integer(t, value).ok_or_else(|| {
                fail(CastCode::InvalidValue, format!("value is outside the range of {}", t))
            })
        }
        _ => Err(fail(
            CastCode::NotCastable,
            format!("{} is not a numeric target", target),
        )),
    }
}

fn to_decimal<F>(n: &Numeric, fail: &F) -> Result<BigDecimal, CastViolation>
where
    F: Fn(CastCode, String) -> CastViolation,
{
    match n {
        Numeric::Exact(v) => Ok(v.clone()),
        // no saturation here: xs:decimal has no largest value
        Numeric::Approximate(v) if v.is_nan() => {
            Err(fail(CastCode::InvalidLexical, "NaN has no decimal value".into()))
        }
        Numeric::Approximate(v) if v.is_infinite() => Err(fail(
            CastCode::InvalidLexical,
            "infinity has no decimal value".into(),
        )),
        Numeric::Approximate(v) => BigDecimal::from_str(&v.to_string())
            .map_err(|e| fail(CastCode::InvalidValue, e.to_string())),
    }
}

fn to_integer<F>(
    n: &Numeric,
    target: NativeType,
    ctx: &CastingContext,
    fail: &F,
) -> Result<BigDecimal, CastViolation>
where
    F: Fn(CastCode, String) -> CastViolation,
{
    let (min, max) = target.integer_bounds();
    let value = match n {
        Numeric::Exact(v) => v.with_scale(0),
        Numeric::Approximate(v) if v.is_nan() => {
            return Err(fail(CastCode::InvalidLexical, "NaN has no integer value".into()));
        }
        Numeric::Approximate(v) if v.is_infinite() => {
            let bound = if *v > 0.0 { max } else { min };
            return match bound {
                Some(b) if ctx.saturates() => Ok(b),
                _ => Err(fail(
                    CastCode::IntegerOverflow,
                    "infinity has no integer value".into(),
                )),
            };
        }
        Numeric::Approximate(v) => BigDecimal::from_str(&format!("{:.0}", v.trunc()))
            .map_err(|e| fail(CastCode::InvalidValue, e.to_string()))?,
    };
    match check_integer_range(target, &value) {
        Ok(()) => Ok(value),
        Err(_) if ctx.saturates() => {
            let clamped = match (&min, &max) {
                (Some(lo), _) if &value < lo => lo.clone(),
                (_, Some(hi)) if &value > hi => hi.clone(),
                _ => value,
            };
            Ok(clamped)
        }
        Err(reason) => Err(fail(CastCode::InvalidValue, reason)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::namespaces::QName;

    fn reject() -> CastingContext {
        CastingContext::default()
    }

    #[test]
    fn test_identity_strips_overlay() {
        let foreign = Atom::make_foreign(QName::local("age"), Atom::integer(4));
        let cast = cast_as(&foreign, NativeType::Integer, &reject()).unwrap();
        assert_eq!(cast, Atom::integer(4));
    }

    #[test]
    fn test_to_string_per_emulation() {
        let d = Atom::double(10.0);
        let c14n = cast_as(&d, NativeType::String, &reject()).unwrap();
        assert_eq!(c14n.as_str(), Some("1.0E1"));
        let xq = CastingContext::new(Emulation::XQuery10, SpillagePolicy::Reject);
        assert_eq!(cast_as(&d, NativeType::String, &xq).unwrap().as_str(), Some("10"));
    }

    #[test]
    fn test_from_untyped() {
        let u = Atom::untyped(" 42 ");
        let i = cast_as(&u, NativeType::Short, &reject()).unwrap();
        assert_eq!(i.value(), &AtomValue::Short(42));
        let err = cast_as(&Atom::untyped("abc"), NativeType::Integer, &reject()).unwrap_err();
        assert_eq!(err.code, CastCode::InvalidValue);
    }

    #[test]
    fn test_infinity_to_decimal() {
        let inf = Atom::double(f64::INFINITY);
        let err = cast_as(&inf, NativeType::Decimal, &reject()).unwrap_err();
        assert_eq!(err.code, CastCode::InvalidLexical);
        let best = CastingContext::best_effort();
        let err = cast_as(&inf, NativeType::Decimal, &best).unwrap_err();
        assert_eq!(err.code, CastCode::InvalidLexical);
        let neg = cast_as(&Atom::double(f64::NEG_INFINITY), NativeType::Decimal, &best);
        assert_eq!(neg.unwrap_err().code, CastCode::InvalidLexical);
    }

    #[test]
    fn test_large_values_to_decimal_are_exact() {
        let digits = "1234567890123456789012345678901234567890";
        let big = Atom::big_integer(BigDecimal::from_str(digits).unwrap());
        let d = cast_as(&big, NativeType::Decimal, &reject()).unwrap();
        assert_eq!(d.native_type(), NativeType::Decimal);
        assert_eq!(d.as_decimal(), BigDecimal::from_str(digits).ok());
        assert_eq!(d.xquery10_form(), digits);

        let huge = cast_as(&Atom::double(1e300), NativeType::Decimal, &reject()).unwrap();
        assert_eq!(huge.as_decimal(), BigDecimal::from_str("1e300").ok());
    }

    #[test]
    fn test_nan_always_fails() {
        let nan = Atom::double(f64::NAN);
        assert!(cast_as(&nan, NativeType::Integer, &reject()).is_err());
        assert!(cast_as(&nan, NativeType::Integer, &CastingContext::best_effort()).is_err());
        assert!(cast_as(&nan, NativeType::Decimal, &CastingContext::best_effort()).is_err());
    }

    #[test]
    fn test_integer_truncation_and_clamping() {
        let v = Atom::double(-2.7);
        let i = cast_as(&v, NativeType::Integer, &reject()).unwrap();
        assert_eq!(i.as_i64(), Some(-2));

        let big = Atom::integer(300);
        assert!(cast_as(&big, NativeType::UnsignedByte, &reject()).is_err());
        let clamped = cast_as(&big, NativeType::UnsignedByte, &CastingContext::best_effort()).unwrap();
        assert_eq!(clamped.value(), &AtomValue::UnsignedByte(255));

        let unbounded = cast_as(
            &Atom::double(f64::INFINITY),
            NativeType::Integer,
            &CastingContext::best_effort(),
        );
        assert_eq!(unbounded.unwrap_err().code, CastCode::IntegerOverflow);
    }

    #[test]
    fn test_double_to_float_overflow() {
        let huge = Atom::double(1e300);
        assert!(cast_as(&huge, NativeType::Float, &reject()).is_err());
        let inf = cast_as(&huge, NativeType::Float, &CastingContext::best_effort()).unwrap();
        assert!(matches!(inf.value(), AtomValue::Float(f) if f.is_infinite()));
    }

    #[test]
    fn test_boolean_numeric() {
        let one = cast_as(&Atom::boolean(true), NativeType::Double, &reject()).unwrap();
        assert_eq!(one.as_double(), Some(1.0));
        let f = cast_as(&Atom::integer(0), NativeType::Boolean, &reject()).unwrap();
        assert_eq!(f.as_boolean(), Some(false));
    }

    #[test]
    fn test_calendar_and_duration() {
        let dt = Atom::date_time(2009, 10, 18, 8, 3, Decimal::from(19), None).unwrap();
        let date = cast_as(&dt, NativeType::Date, &reject()).unwrap();
        assert_eq!(date.c14n_form(), "2009-10-18");
        let back = cast_as(&date, NativeType::DateTime, &reject()).unwrap();
        assert_eq!(back.c14n_form(), "2009-10-18T00:00:00");
        assert!(cast_as(&date, NativeType::Time, &reject()).is_err());

        let d = Atom::duration(14, Decimal::from(90));
        let ym = cast_as(&d, NativeType::YearMonthDuration, &reject()).unwrap();
        assert_eq!(ym.c14n_form(), "P1Y2M");
    }

    #[test]
    fn test_binary_and_not_castable() {
        let hex = Atom::hex_binary(b"Hello".to_vec());
        let b64 = cast_as(&hex, NativeType::Base64Binary, &reject()).unwrap();
        assert_eq!(b64.c14n_form(), "SGVsbG8=");

        let err = cast_as(&Atom::boolean(true), NativeType::Date, &reject()).unwrap_err();
        assert_eq!(err.code, CastCode::NotCastable);
        assert!(err.to_string().starts_with("cast.XPTY0004"));
        assert!(cast_as(&Atom::integer(1), NativeType::AnyAtomicType, &reject()).is_err());
    }
}
