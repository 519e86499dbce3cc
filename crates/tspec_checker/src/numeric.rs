//! Exact numeric values.
//!
//! Numeric literals are kept as significant decimal digits plus a base-10
//! exponent, so range checks against 64-bit and unsigned scalars never go
//! through a lossy float conversion.

use std::fmt;

/// A number as written in source, normalized so that equal values compare
/// equal (`1.50`, `1.5` and `15e-1` are the same `Numeric`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Numeric {
    negative: bool,
    /// Significant digits without leading or trailing zeros. Empty for zero.
    digits: String,
    /// Power of ten applied to `digits`.
    exponent: i32,
}

impl Numeric {
    /// Parse decimal (`12`, `-3.5`, `1.5e-3`), hexadecimal (`0xFF`) or
    /// binary (`0b1010`) spellings.
    pub fn parse(text: &str) -> Option<Numeric> {
        let text = text.trim();
        let (negative, body) = match text.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, text.strip_prefix('+').unwrap_or(text)),
        };
        let value = if let Some(hex) = body.strip_prefix("0x").or_else(|| body.strip_prefix("0X")) {
            Self::from_radix(hex, 16)?
        } else if let Some(bin) = body.strip_prefix("0b").or_else(|| body.strip_prefix("0B")) {
            Self::from_radix(bin, 2)?
        } else {
            Self::from_decimal(body)?
        };
        Some(value.with_sign(negative))
    }

    pub fn from_i64(value: i64) -> Numeric {
        let magnitude = value.unsigned_abs().to_string();
        let parsed = Self::from_decimal(&magnitude).unwrap_or_else(Self::zero);
        parsed.with_sign(value < 0)
    }

    pub fn zero() -> Numeric {
        Numeric {
            negative: false,
            digits: String::new(),
            exponent: 0,
        }
    }

    fn from_radix(text: &str, radix: u32) -> Option<Numeric> {
        if text.is_empty() {
            return None;
        }
        let value = u128::from_str_radix(text, radix).ok()?;
        Self::from_decimal(&value.to_string())
    }

    fn from_decimal(text: &str) -> Option<Numeric> {
        let (mantissa, exponent) = match text.find(['e', 'E']) {
            Some(index) => (&text[..index], text[index + 1..].parse::<i32>().ok()?),
            None => (text, 0),
        };
        let (int_part, frac_part) = mantissa.split_once('.').unwrap_or((mantissa, ""));
        if int_part.is_empty() && frac_part.is_empty() {
            return None;
        }
        if !int_part.bytes().chain(frac_part.bytes()).all(|b| b.is_ascii_digit()) {
            return None;
        }

        let mut exponent = exponent.checked_sub(i32::try_from(frac_part.len()).ok()?)?;
        let joined = format!("{}{}", int_part, frac_part);
        let mut digits = joined.trim_start_matches('0').to_string();
        while digits.ends_with('0') {
            digits.pop();
            exponent = exponent.checked_add(1)?;
        }
        if digits.is_empty() {
            exponent = 0;
        }
        Some(Numeric {
            negative: false,
            digits,
            exponent,
        })
    }

    fn with_sign(mut self, negative: bool) -> Self {
        self.negative = negative && !self.digits.is_empty();
        self
    }

    pub fn is_zero(&self) -> bool {
        self.digits.is_empty()
    }

    pub fn is_negative(&self) -> bool {
        self.negative
    }

    pub fn is_integer(&self) -> bool {
        self.digits.is_empty() || self.exponent >= 0
    }

    /// The value as an `i128`, if it is an integer that fits.
    pub fn as_i128(&self) -> Option<i128> {
        if !self.is_integer() {
            return None;
        }
        if self.digits.is_empty() {
            return Some(0);
        }
        let mut value: i128 = self.digits.parse().ok()?;
        for _ in 0..self.exponent {
            value = value.checked_mul(10)?;
        }
        Some(if self.negative { -value } else { value })
    }

    /// Nearest `f64`. Values beyond the float range become infinite.
    pub fn as_f64(&self) -> f64 {
        if self.digits.is_empty() {
            return 0.0;
        }
        let sign = if self.negative { "-" } else { "" };
        format!("{}{}e{}", sign, self.digits, self.exponent)
            .parse()
            .unwrap_or(f64::NAN)
    }
}

impl fmt::Display for Numeric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.digits.is_empty() {
            return write!(f, "0");
        }
        if self.negative {
            write!(f, "-")?;
        }
        let len = self.digits.len() as i64;
        let exponent = self.exponent as i64;
        if exponent.abs() > 64 {
            return write!(f, "{}e{}", self.digits, self.exponent);
        }
        if exponent >= 0 {
            write!(f, "{}{}", self.digits, "0".repeat(exponent as usize))
        } else {
            let point = len + exponent;
            if point > 0 {
                let (int_part, frac_part) = self.digits.split_at(point as usize);
                write!(f, "{}.{}", int_part, frac_part)
            } else {
                write!(f, "0.{}{}", "0".repeat((-point) as usize), self.digits)
            }
        }
    }
}

/// Numeric domains of the standard numeric scalars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NumericKind {
    Int8,
    Int16,
    Int32,
    Int64,
    Uint8,
    Uint16,
    Uint32,
    Uint64,
    Safeint,
    Integer,
    Float32,
    Float64,
    Float,
    Decimal,
    Decimal128,
    Numeric,
}

const MAX_SAFE_INTEGER: i128 = (1 << 53) - 1;

impl NumericKind {
    pub fn from_name(name: &str) -> Option<NumericKind> {
        let kind = match name {
            "int8" => NumericKind::Int8,
            "int16" => NumericKind::Int16,
            "int32" => NumericKind::Int32,
            "int64" => NumericKind::Int64,
            "uint8" => NumericKind::Uint8,
            "uint16" => NumericKind::Uint16,
            "uint32" => NumericKind::Uint32,
            "uint64" => NumericKind::Uint64,
            "safeint" => NumericKind::Safeint,
            "integer" => NumericKind::Integer,
            "float32" => NumericKind::Float32,
            "float64" => NumericKind::Float64,
            "float" => NumericKind::Float,
            "decimal" => NumericKind::Decimal,
            "decimal128" => NumericKind::Decimal128,
            "numeric" => NumericKind::Numeric,
            _ => return None,
        };
        Some(kind)
    }

    fn integer_bounds(self) -> Option<(i128, i128)> {
        let bounds = match self {
            NumericKind::Int8 => (i8::MIN as i128, i8::MAX as i128),
            NumericKind::Int16 => (i16::MIN as i128, i16::MAX as i128),
            NumericKind::Int32 => (i32::MIN as i128, i32::MAX as i128),
            NumericKind::Int64 => (i64::MIN as i128, i64::MAX as i128),
            NumericKind::Uint8 => (0, u8::MAX as i128),
            NumericKind::Uint16 => (0, u16::MAX as i128),
            NumericKind::Uint32 => (0, u32::MAX as i128),
            NumericKind::Uint64 => (0, u64::MAX as i128),
            NumericKind::Safeint => (-MAX_SAFE_INTEGER, MAX_SAFE_INTEGER),
            _ => return None,
        };
        Some(bounds)
    }

    /// Whether `value` lies in this domain.
    pub fn contains(self, value: &Numeric) -> bool {
        if let Some((min, max)) = self.integer_bounds() {
            return value.as_i128().is_some_and(|v| (min..=max).contains(&v));
        }
        match self {
            NumericKind::Integer => value.is_integer(),
            NumericKind::Float32 => {
                let f = value.as_f64();
                f.is_finite() && f.abs() <= f32::MAX as f64
            }
            NumericKind::Float64 | NumericKind::Float => value.as_f64().is_finite(),
            _ => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn num(text: &str) -> Numeric {
        Numeric::parse(text).unwrap()
    }

    #[test]
    fn test_parse_and_display() {
        assert_eq!(num("42").to_string(), "42");
        assert_eq!(num("-7").to_string(), "-7");
        assert_eq!(num("3.14").to_string(), "3.14");
        assert_eq!(num("1.5e-3").to_string(), "0.0015");
        assert_eq!(num("0xFF").to_string(), "255");
        assert_eq!(num("0b1010").to_string(), "10");
        assert_eq!(num("1200").to_string(), "1200");
        assert_eq!(num("0").to_string(), "0");
        assert_eq!(num("-0").to_string(), "0");
    }

    #[test]
    fn test_normalized_equality() {
        assert_eq!(num("1.50"), num("1.5"));
        assert_eq!(num("15e-1"), num("1.5"));
        assert_eq!(num("100"), num("1e2"));
        assert_ne!(num("1"), num("-1"));
    }

    #[test]
    fn test_invalid_text() {
        assert!(Numeric::parse("").is_none());
        assert!(Numeric::parse("abc").is_none());
        assert!(Numeric::parse("0x").is_none());
        assert!(Numeric::parse("1.2.3").is_none());
    }

    #[test]
    fn test_integer_conversion() {
        assert_eq!(num("9999").as_i128(), Some(9999));
        assert_eq!(num("-128").as_i128(), Some(-128));
        assert_eq!(num("1e3").as_i128(), Some(1000));
        assert_eq!(num("1.5").as_i128(), None);
        assert!(num("2.0").is_integer());
    }

    #[test]
    fn test_integer_ranges() {
        assert!(NumericKind::Int8.contains(&num("127")));
        assert!(NumericKind::Int8.contains(&num("-128")));
        assert!(!NumericKind::Int8.contains(&num("128")));
        assert!(!NumericKind::Int8.contains(&num("9999")));
        assert!(!NumericKind::Int32.contains(&num("1.5")));
        assert!(!NumericKind::Uint8.contains(&num("-1")));
        assert!(NumericKind::Uint64.contains(&num("18446744073709551615")));
        assert!(!NumericKind::Int64.contains(&num("9223372036854775808")));
        assert!(NumericKind::Safeint.contains(&num("9007199254740991")));
        assert!(!NumericKind::Safeint.contains(&num("9007199254740992")));
        assert!(NumericKind::Integer.contains(&num("123456789012345678901234567890")));
    }

    #[test]
    fn test_float_ranges() {
        assert!(NumericKind::Float32.contains(&num("3.5")));
        assert!(!NumericKind::Float32.contains(&num("1e39")));
        assert!(NumericKind::Float64.contains(&num("1e39")));
        assert!(!NumericKind::Float64.contains(&num("1e400")));
        assert!(NumericKind::Decimal.contains(&num("1e400")));
    }

    #[test]
    fn test_kind_names() {
        assert_eq!(NumericKind::from_name("int8"), Some(NumericKind::Int8));
        assert_eq!(NumericKind::from_name("decimal128"), Some(NumericKind::Decimal128));
        assert_eq!(NumericKind::from_name("string"), None);
    }
}
