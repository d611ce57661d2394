//! Tagged binding values with lazy cross-type conversion.
//!
//! A [`BindingValue`] is constructed from exactly one native type and
//! materializes the other two representations the first time they are read.
//! Conversions never fail:
//!
//! - Boolean → Double: `1.0` / `0.0`
//! - Double → Boolean: `value == 0.0` (kept exactly as persisted profiles expect)
//! - String → Boolean: true unless the lowercase text is `0`, `false`, `no` or `off`
//! - String → Double: invariant float parsing, `0.0` on failure
//!
//! Two comparison policies exist side by side. [`BindingValue::equals`] coerces
//! `self` into the native type of the other value before comparing, while
//! [`BindingValue::is_identical_to`] and [`BindingValue::non_converting_compare`]
//! require identical native types.

use std::cell::OnceCell;
use std::cmp::Ordering;
use std::fmt;

/// Native type of a binding value. Variant order defines the cross-type
/// ordering used by [`BindingValue::non_converting_compare`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum BindingValueType {
    Boolean,
    String,
    Double,
}

#[derive(Debug, Clone)]
enum NativeValue {
    Empty,
    Boolean(bool),
    String(String),
    Double(f64),
}

/// Immutable tagged value passed from triggers to actions.
#[derive(Clone)]
pub struct BindingValue {
    native: NativeValue,
    string_cache: OnceCell<String>,
    bool_cache: OnceCell<bool>,
    double_cache: OnceCell<f64>,
}

impl BindingValue {
    /// The distinguished empty value. Orders below every other value and is
    /// only equal to itself.
    pub fn empty() -> Self {
        Self::from_native(NativeValue::Empty)
    }

    pub fn from_bool(value: bool) -> Self {
        Self::from_native(NativeValue::Boolean(value))
    }

    pub fn from_double(value: f64) -> Self {
        Self::from_native(NativeValue::Double(value))
    }

    pub fn from_string(value: impl Into<String>) -> Self {
        Self::from_native(NativeValue::String(value.into()))
    }

    fn from_native(native: NativeValue) -> Self {
        Self {
            native,
            string_cache: OnceCell::new(),
            bool_cache: OnceCell::new(),
            double_cache: OnceCell::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self.native, NativeValue::Empty)
    }

    /// Native type of this value. The empty value reports `String`.
    pub fn native_type(&self) -> BindingValueType {
        match self.native {
            NativeValue::Boolean(_) => BindingValueType::Boolean,
            NativeValue::Double(_) => BindingValueType::Double,
            NativeValue::String(_) | NativeValue::Empty => BindingValueType::String,
        }
    }

    /// Which representations have been materialized so far, native included.
    pub fn converted_types(&self) -> Vec<BindingValueType> {
        let mut types = Vec::with_capacity(3);
        if !self.is_empty() {
            types.push(self.native_type());
        }
        if self.bool_cache.get().is_some() {
            types.push(BindingValueType::Boolean);
        }
        if self.string_cache.get().is_some() {
            types.push(BindingValueType::String);
        }
        if self.double_cache.get().is_some() {
            types.push(BindingValueType::Double);
        }
        types
    }

    pub fn string_value(&self) -> &str {
        match &self.native {
            NativeValue::String(value) => value.as_str(),
            NativeValue::Empty => "",
            NativeValue::Boolean(value) => self
                .string_cache
                .get_or_init(|| if *value { "true" } else { "false" }.to_string())
                .as_str(),
            NativeValue::Double(value) => self
                .string_cache
                .get_or_init(|| format_double(*value))
                .as_str(),
        }
    }

    pub fn bool_value(&self) -> bool {
        match &self.native {
            NativeValue::Boolean(value) => *value,
            NativeValue::Empty => false,
            NativeValue::String(value) => *self.bool_cache.get_or_init(|| parse_bool(value)),
            // Double → Boolean is `== 0`, preserved for persisted profiles.
            NativeValue::Double(value) => *self.bool_cache.get_or_init(|| *value == 0.0),
        }
    }

    pub fn double_value(&self) -> f64 {
        match &self.native {
            NativeValue::Double(value) => *value,
            NativeValue::Empty => 0.0,
            NativeValue::Boolean(value) => {
                *self
                    .double_cache
                    .get_or_init(|| if *value { 1.0 } else { 0.0 })
            }
            NativeValue::String(value) => *self.double_cache.get_or_init(|| parse_double(value)),
        }
    }

    /// Type-coercing equality: compares using the native type of `other`.
    pub fn equals(&self, other: &BindingValue) -> bool {
        if self.is_empty() || other.is_empty() {
            return self.is_empty() && other.is_empty();
        }
        match other.native_type() {
            BindingValueType::Boolean => self.bool_value() == other.bool_value(),
            BindingValueType::String => self.string_value() == other.string_value(),
            BindingValueType::Double => self.double_value() == other.double_value(),
        }
    }

    /// Strict equality: same native type and same native value.
    pub fn is_identical_to(&self, other: &BindingValue) -> bool {
        self.non_converting_compare(other) == Ordering::Equal
    }

    /// Total order over native values. Empty sorts first, then values are
    /// ordered by native type, then by value (numeric for Boolean/Double,
    /// ordinal for String).
    pub fn non_converting_compare(&self, other: &BindingValue) -> Ordering {
        match (&self.native, &other.native) {
            (NativeValue::Empty, NativeValue::Empty) => Ordering::Equal,
            (NativeValue::Empty, _) => Ordering::Less,
            (_, NativeValue::Empty) => Ordering::Greater,
            (NativeValue::Boolean(a), NativeValue::Boolean(b)) => a.cmp(b),
            (NativeValue::Double(a), NativeValue::Double(b)) => compare_doubles(*a, *b),
            (NativeValue::String(a), NativeValue::String(b)) => a.as_str().cmp(b.as_str()),
            _ => self.native_type().cmp(&other.native_type()),
        }
    }
}

/// Numeric order where `0.0 == -0.0`. NaN equals NaN and sorts below every
/// number.
fn compare_doubles(a: f64, b: f64) -> Ordering {
    match a.partial_cmp(&b) {
        Some(ordering) => ordering,
        None => match (a.is_nan(), b.is_nan()) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Less,
            _ => Ordering::Greater,
        },
    }
}

fn parse_bool(text: &str) -> bool {
    !matches!(
        text.trim().to_lowercase().as_str(),
        "0" | "false" | "no" | "off"
    )
}

fn parse_double(text: &str) -> f64 {
    text.trim().parse::<f64>().unwrap_or(0.0)
}

fn format_double(value: f64) -> String {
    format!("{}", value)
}

impl Default for BindingValue {
    fn default() -> Self {
        Self::empty()
    }
}

impl PartialEq for BindingValue {
    fn eq(&self, other: &Self) -> bool {
        self.is_identical_to(other)
    }
}

impl fmt::Debug for BindingValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.native {
            NativeValue::Empty => write!(f, "BindingValue(Empty)"),
            NativeValue::Boolean(v) => write!(f, "BindingValue(Boolean {})", v),
            NativeValue::String(v) => write!(f, "BindingValue(String {:?})", v),
            NativeValue::Double(v) => write!(f, "BindingValue(Double {})", v),
        }
    }
}

impl fmt::Display for BindingValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.string_value())
    }
}

impl From<bool> for BindingValue {
    fn from(value: bool) -> Self {
        Self::from_bool(value)
    }
}

impl From<f64> for BindingValue {
    fn from(value: f64) -> Self {
        Self::from_double(value)
    }
}

impl From<i64> for BindingValue {
    fn from(value: i64) -> Self {
        Self::from_double(value as f64)
    }
}

impl From<&str> for BindingValue {
    fn from(value: &str) -> Self {
        Self::from_string(value)
    }
}

impl From<String> for BindingValue {
    fn from(value: String) -> Self {
        Self::from_string(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_bool_conversions() {
        let v = BindingValue::from_bool(true);
        assert_eq!(v.double_value(), 1.0);
        assert_eq!(v.string_value(), "true");
        assert_eq!(BindingValue::from_bool(false).double_value(), 0.0);
    }

    #[test]
    fn test_string_to_bool() {
        for falsy in ["0", "false", "FALSE", "No", "off", " off "] {
            assert!(!BindingValue::from_string(falsy).bool_value(), "{falsy}");
        }
        for truthy in ["1", "true", "yes", "on", "banana", ""] {
            assert!(BindingValue::from_string(truthy).bool_value(), "{truthy}");
        }
    }

    #[test]
    fn test_double_to_bool_is_zero_test() {
        assert!(BindingValue::from_double(0.0).bool_value());
        assert!(!BindingValue::from_double(1.0).bool_value());
        assert!(!BindingValue::from_double(-3.5).bool_value());
    }

    #[test]
    fn test_string_to_double() {
        assert_eq!(BindingValue::from_string("2.5").double_value(), 2.5);
        assert_eq!(BindingValue::from_string(" -1e3 ").double_value(), -1000.0);
        assert_eq!(BindingValue::from_string("abc").double_value(), 0.0);
    }

    #[test]
    fn test_double_to_string() {
        assert_eq!(BindingValue::from_double(1.0).string_value(), "1");
        assert_eq!(BindingValue::from_double(0.25).string_value(), "0.25");
    }

    #[test]
    fn test_conversion_cache() {
        let v = BindingValue::from_string("5");
        assert_eq!(v.converted_types(), vec![BindingValueType::String]);
        let _ = v.double_value();
        assert_eq!(
            v.converted_types(),
            vec![BindingValueType::String, BindingValueType::Double]
        );
    }

    #[test]
    fn test_equals_coerces_to_other_type() {
        let text = BindingValue::from_string("1");
        let number = BindingValue::from_double(1.0);
        assert!(text.equals(&number));
        assert!(!text.is_identical_to(&number));

        // "yes" coerces to true when compared against a boolean
        let yes = BindingValue::from_string("yes");
        assert!(yes.equals(&BindingValue::from_bool(true)));
        assert!(!BindingValue::from_bool(true).equals(&yes));
    }

    #[test]
    fn test_empty_semantics() {
        let empty = BindingValue::empty();
        assert!(empty.equals(&BindingValue::empty()));
        assert!(!empty.equals(&BindingValue::from_string("")));
        assert!(!BindingValue::from_string("").equals(&empty));
        assert_eq!(
            empty.non_converting_compare(&BindingValue::from_bool(false)),
            Ordering::Less
        );
    }

    #[test]
    fn test_type_ordering() {
        let b = BindingValue::from_bool(true);
        let s = BindingValue::from_string("a");
        let d = BindingValue::from_double(-100.0);
        assert_eq!(b.non_converting_compare(&s), Ordering::Less);
        assert_eq!(s.non_converting_compare(&d), Ordering::Less);
        assert_eq!(d.non_converting_compare(&b), Ordering::Greater);
    }

    #[test]
    fn test_double_compare_is_numeric() {
        let zero = BindingValue::from_double(0.0);
        let negative_zero = BindingValue::from_double(-0.0);
        assert!(zero.is_identical_to(&negative_zero));
        assert_eq!(zero.non_converting_compare(&negative_zero), Ordering::Equal);

        let nan = BindingValue::from_double(f64::NAN);
        assert!(nan.is_identical_to(&BindingValue::from_double(f64::NAN)));
        assert_eq!(
            nan.non_converting_compare(&BindingValue::from_double(f64::NEG_INFINITY)),
            Ordering::Less
        );
        assert_eq!(
            BindingValue::from_double(1.0).non_converting_compare(&nan),
            Ordering::Greater
        );
    }

    fn any_value() -> impl Strategy<Value = BindingValue> {
        prop_oneof![
            any::<bool>().prop_map(BindingValue::from_bool),
            any::<f64>().prop_map(BindingValue::from_double),
            ".*".prop_map(BindingValue::from_string),
        ]
    }

    proptest! {
        #[test]
        fn test_identical_to_self(value in any_value()) {
            prop_assert!(value.is_identical_to(&value));
            prop_assert_eq!(value.non_converting_compare(&value), Ordering::Equal);
        }

        #[test]
        fn test_empty_sorts_first(value in any_value()) {
            let empty = BindingValue::empty();
            prop_assert_eq!(empty.non_converting_compare(&value), Ordering::Less);
            prop_assert_eq!(value.non_converting_compare(&empty), Ordering::Greater);
            prop_assert!(!empty.equals(&value));
        }

        #[test]
        fn test_compare_is_antisymmetric(a in any_value(), b in any_value()) {
            prop_assert_eq!(a.non_converting_compare(&b), b.non_converting_compare(&a).reverse());
        }
    }
}
