//! Units carried by binding elements and the conversions between them.
//!
//! The unit table is a compile-time list. Every unit belongs to a
//! [`UnitCategory`]; units in the same measurable category convert through an
//! affine mapping to the category's base unit (`base = value * scale + offset`).
//! Units in the dimensionless categories (`None`, `Numeric`, `Boolean`, `Text`)
//! never convert to anything but themselves.

use crate::binding::value::BindingValue;
use std::fmt;

/// Physical dimension of a unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnitCategory {
    /// Elements that carry no value at all.
    None,
    /// Plain numbers with no physical dimension.
    Numeric,
    Boolean,
    Text,
    Angle,
    Temperature,
    Distance,
    Speed,
    Pressure,
    Time,
    Mass,
    MassFlow,
    Frequency,
    Ratio,
}

impl UnitCategory {
    fn is_measurable(self) -> bool {
        !matches!(
            self,
            UnitCategory::None | UnitCategory::Numeric | UnitCategory::Boolean | UnitCategory::Text
        )
    }
}

/// Descriptor of a single unit.
#[derive(Debug)]
pub struct BindingValueUnit {
    pub name: &'static str,
    pub long_name: &'static str,
    pub category: UnitCategory,
    scale: f64,
    offset: f64,
}

impl BindingValueUnit {
    const fn new(
        name: &'static str,
        long_name: &'static str,
        category: UnitCategory,
        scale: f64,
        offset: f64,
    ) -> Self {
        Self {
            name,
            long_name,
            category,
            scale,
            offset,
        }
    }

    const fn plain(name: &'static str, long_name: &'static str, category: UnitCategory) -> Self {
        Self::new(name, long_name, category, 1.0, 0.0)
    }

    /// Whether an element with this unit carries a value.
    pub fn has_value(&self) -> bool {
        self.category != UnitCategory::None
    }

    fn to_base(&self, value: f64) -> f64 {
        value * self.scale + self.offset
    }

    fn from_base(&self, value: f64) -> f64 {
        (value - self.offset) / self.scale
    }
}

impl PartialEq for BindingValueUnit {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for BindingValueUnit {}

impl fmt::Display for BindingValueUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.long_name)
    }
}

pub static NO_VALUE: BindingValueUnit =
    BindingValueUnit::plain("none", "No Value", UnitCategory::None);
pub static NUMERIC: BindingValueUnit =
    BindingValueUnit::plain("numeric", "Numeric", UnitCategory::Numeric);
pub static BOOLEAN: BindingValueUnit =
    BindingValueUnit::plain("boolean", "Boolean", UnitCategory::Boolean);
pub static TEXT: BindingValueUnit = BindingValueUnit::plain("text", "Text", UnitCategory::Text);

pub static DEGREES: BindingValueUnit =
    BindingValueUnit::plain("deg", "Degrees", UnitCategory::Angle);
pub static RADIANS: BindingValueUnit =
    BindingValueUnit::new("rad", "Radians", UnitCategory::Angle, 180.0 / std::f64::consts::PI, 0.0);

pub static KELVIN: BindingValueUnit =
    BindingValueUnit::plain("K", "Kelvin", UnitCategory::Temperature);
pub static CELSIUS: BindingValueUnit =
    BindingValueUnit::new("C", "Celsius", UnitCategory::Temperature, 1.0, 273.15);
pub static FAHRENHEIT: BindingValueUnit = BindingValueUnit::new(
    "F",
    "Fahrenheit",
    UnitCategory::Temperature,
    5.0 / 9.0,
    459.67 * 5.0 / 9.0,
);

pub static METERS: BindingValueUnit =
    BindingValueUnit::plain("m", "Meters", UnitCategory::Distance);
pub static FEET: BindingValueUnit =
    BindingValueUnit::new("ft", "Feet", UnitCategory::Distance, 0.3048, 0.0);
pub static INCHES: BindingValueUnit =
    BindingValueUnit::new("in", "Inches", UnitCategory::Distance, 0.0254, 0.0);
pub static CENTIMETERS: BindingValueUnit =
    BindingValueUnit::new("cm", "Centimeters", UnitCategory::Distance, 0.01, 0.0);
pub static KILOMETERS: BindingValueUnit =
    BindingValueUnit::new("km", "Kilometers", UnitCategory::Distance, 1000.0, 0.0);
pub static NAUTICAL_MILES: BindingValueUnit =
    BindingValueUnit::new("nm", "Nautical Miles", UnitCategory::Distance, 1852.0, 0.0);
pub static STATUTE_MILES: BindingValueUnit =
    BindingValueUnit::new("mi", "Statute Miles", UnitCategory::Distance, 1609.344, 0.0);

pub static METERS_PER_SECOND: BindingValueUnit =
    BindingValueUnit::plain("m/s", "Meters per Second", UnitCategory::Speed);
pub static KNOTS: BindingValueUnit =
    BindingValueUnit::new("kts", "Knots", UnitCategory::Speed, 1852.0 / 3600.0, 0.0);
pub static MILES_PER_HOUR: BindingValueUnit =
    BindingValueUnit::new("mph", "Miles per Hour", UnitCategory::Speed, 0.44704, 0.0);
pub static KILOMETERS_PER_HOUR: BindingValueUnit =
    BindingValueUnit::new("km/h", "Kilometers per Hour", UnitCategory::Speed, 1.0 / 3.6, 0.0);
pub static FEET_PER_MINUTE: BindingValueUnit =
    BindingValueUnit::new("fpm", "Feet per Minute", UnitCategory::Speed, 0.3048 / 60.0, 0.0);
pub static FEET_PER_SECOND: BindingValueUnit =
    BindingValueUnit::new("ft/s", "Feet per Second", UnitCategory::Speed, 0.3048, 0.0);

pub static PASCALS: BindingValueUnit =
    BindingValueUnit::plain("Pa", "Pascals", UnitCategory::Pressure);
pub static PSI: BindingValueUnit = BindingValueUnit::new(
    "psi",
    "Pounds per Square Inch",
    UnitCategory::Pressure,
    6894.757293,
    0.0,
);
pub static INCHES_OF_MERCURY: BindingValueUnit =
    BindingValueUnit::new("inHg", "Inches of Mercury", UnitCategory::Pressure, 3386.389, 0.0);
pub static MILLIBAR: BindingValueUnit =
    BindingValueUnit::new("mbar", "Millibar", UnitCategory::Pressure, 100.0, 0.0);

pub static SECONDS: BindingValueUnit = BindingValueUnit::plain("s", "Seconds", UnitCategory::Time);
pub static MILLISECONDS: BindingValueUnit =
    BindingValueUnit::new("ms", "Milliseconds", UnitCategory::Time, 0.001, 0.0);
pub static MINUTES: BindingValueUnit =
    BindingValueUnit::new("min", "Minutes", UnitCategory::Time, 60.0, 0.0);
pub static HOURS: BindingValueUnit =
    BindingValueUnit::new("h", "Hours", UnitCategory::Time, 3600.0, 0.0);

pub static KILOGRAMS: BindingValueUnit =
    BindingValueUnit::plain("kg", "Kilograms", UnitCategory::Mass);
pub static POUNDS: BindingValueUnit =
    BindingValueUnit::new("lb", "Pounds", UnitCategory::Mass, 0.45359237, 0.0);

pub static KILOGRAMS_PER_HOUR: BindingValueUnit =
    BindingValueUnit::plain("kg/h", "Kilograms per Hour", UnitCategory::MassFlow);
pub static POUNDS_PER_HOUR: BindingValueUnit =
    BindingValueUnit::new("lb/h", "Pounds per Hour", UnitCategory::MassFlow, 0.45359237, 0.0);

pub static HERTZ: BindingValueUnit =
    BindingValueUnit::plain("Hz", "Hertz", UnitCategory::Frequency);
pub static RPM: BindingValueUnit = BindingValueUnit::new(
    "rpm",
    "Revolutions per Minute",
    UnitCategory::Frequency,
    1.0 / 60.0,
    0.0,
);

pub static PERCENT: BindingValueUnit =
    BindingValueUnit::new("%", "Percent", UnitCategory::Ratio, 0.01, 0.0);
pub static FRACTION: BindingValueUnit =
    BindingValueUnit::plain("frac", "Fraction", UnitCategory::Ratio);

/// Every unit known to this build.
pub static ALL_UNITS: &[&BindingValueUnit] = &[
    &NO_VALUE,
    &NUMERIC,
    &BOOLEAN,
    &TEXT,
    &DEGREES,
    &RADIANS,
    &KELVIN,
    &CELSIUS,
    &FAHRENHEIT,
    &METERS,
    &FEET,
    &INCHES,
    &CENTIMETERS,
    &KILOMETERS,
    &NAUTICAL_MILES,
    &STATUTE_MILES,
    &METERS_PER_SECOND,
    &KNOTS,
    &MILES_PER_HOUR,
    &KILOMETERS_PER_HOUR,
    &FEET_PER_MINUTE,
    &FEET_PER_SECOND,
    &PASCALS,
    &PSI,
    &INCHES_OF_MERCURY,
    &MILLIBAR,
    &SECONDS,
    &MILLISECONDS,
    &MINUTES,
    &HOURS,
    &KILOGRAMS,
    &POUNDS,
    &KILOGRAMS_PER_HOUR,
    &POUNDS_PER_HOUR,
    &HERTZ,
    &RPM,
    &PERCENT,
    &FRACTION,
];

/// Look a unit up by its short name.
pub fn find_unit(name: &str) -> Option<&'static BindingValueUnit> {
    ALL_UNITS.iter().copied().find(|unit| unit.name == name)
}

/// Converts doubles between two units of the same category.
#[derive(Debug, Clone, Copy)]
pub struct UnitConverter {
    from: &'static BindingValueUnit,
    to: &'static BindingValueUnit,
}

impl UnitConverter {
    pub fn from_unit(&self) -> &'static BindingValueUnit {
        self.from
    }

    pub fn to_unit(&self) -> &'static BindingValueUnit {
        self.to
    }

    pub fn convert(&self, value: f64) -> f64 {
        self.to.from_base(self.from.to_base(value))
    }

    pub fn convert_value(&self, value: &BindingValue) -> BindingValue {
        BindingValue::from_double(self.convert(value.double_value()))
    }
}

/// Whether a converter exists from `from` to `to`. Identical units need none
/// and report `false`.
pub fn can_convert_unit(from: &BindingValueUnit, to: &BindingValueUnit) -> bool {
    from != to && from.category == to.category && from.category.is_measurable()
}

/// Converter between two units, if one exists.
pub fn unit_converter(
    from: &'static BindingValueUnit,
    to: &'static BindingValueUnit,
) -> Option<UnitConverter> {
    can_convert_unit(from, to).then_some(UnitConverter { from, to })
}
