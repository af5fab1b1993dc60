//! Units for parameters and material state.
//!
//! Two layers:
//! - **uom aliases** (`Temperature`, `Pressure`, ...) for the statically known
//!   thermodynamic state a material record carries.
//! - **runtime units** (`Unit`, `Dimension`) for the free-form unit strings found in
//!   parameter files ("kg/m^3", "MPa", "W/(m*K)"). Only the dimension class and the
//!   SI scale matter; two units are compatible when their dimensions are equal.

use std::fmt;

use serde::{Deserialize, Serialize};
use uom::si::f64::{
    Length as UomLength, Mass as UomMass, Pressure as UomPressure,
    ThermodynamicTemperature as UomThermodynamicTemperature,
};

use crate::error::{UnitError, UnitResult};

// Public canonical unit types (SI, f64)
pub type Length = UomLength;
pub type Mass = UomMass;
pub type Pressure = UomPressure;
pub type Temperature = UomThermodynamicTemperature;

#[inline]
pub fn pa(v: f64) -> Pressure {
    use uom::si::pressure::pascal;
    Pressure::new::<pascal>(v)
}

#[inline]
pub fn k(v: f64) -> Temperature {
    use uom::si::thermodynamic_temperature::kelvin;
    Temperature::new::<kelvin>(v)
}

#[inline]
pub fn kg(v: f64) -> Mass {
    use uom::si::mass::kilogram;
    Mass::new::<kilogram>(v)
}

#[inline]
pub fn m(v: f64) -> Length {
    use uom::si::length::meter;
    Length::new::<meter>(v)
}

/// Exponents of the seven SI base dimensions.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Dimension {
    pub length: i8,
    pub mass: i8,
    pub time: i8,
    pub current: i8,
    pub temperature: i8,
    pub amount: i8,
    pub luminosity: i8,
}

impl Dimension {
    pub const NONE: Dimension = Dimension::new([0, 0, 0, 0, 0, 0, 0]);
    pub const LENGTH: Dimension = Dimension::new([1, 0, 0, 0, 0, 0, 0]);
    pub const MASS: Dimension = Dimension::new([0, 1, 0, 0, 0, 0, 0]);
    pub const TIME: Dimension = Dimension::new([0, 0, 1, 0, 0, 0, 0]);
    pub const CURRENT: Dimension = Dimension::new([0, 0, 0, 1, 0, 0, 0]);
    pub const TEMPERATURE: Dimension = Dimension::new([0, 0, 0, 0, 1, 0, 0]);
    pub const AMOUNT: Dimension = Dimension::new([0, 0, 0, 0, 0, 1, 0]);
    pub const LUMINOSITY: Dimension = Dimension::new([0, 0, 0, 0, 0, 0, 1]);

    /// Build from exponents ordered L, M, T, I, Θ, N, J.
    pub const fn new(e: [i8; 7]) -> Self {
        Self {
            length: e[0],
            mass: e[1],
            time: e[2],
            current: e[3],
            temperature: e[4],
            amount: e[5],
            luminosity: e[6],
        }
    }

    fn exponents(self) -> [i8; 7] {
        [
            self.length,
            self.mass,
            self.time,
            self.current,
            self.temperature,
            self.amount,
            self.luminosity,
        ]
    }

    fn zip(self, other: Self, f: impl Fn(i8, i8) -> i8) -> Self {
        let a = self.exponents();
        let b = other.exponents();
        let mut out = [0_i8; 7];
        for i in 0..7 {
            out[i] = f(a[i], b[i]);
        }
        Self::new(out)
    }

    pub fn mul(self, other: Self) -> Self {
        self.zip(other, |a, b| a + b)
    }

    pub fn div(self, other: Self) -> Self {
        self.zip(other, |a, b| a - b)
    }

    pub fn powi(self, n: i8) -> Self {
        self.zip(Self::NONE, |a, _| a * n)
    }

    pub fn is_dimensionless(self) -> bool {
        self == Self::NONE
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const NAMES: [&str; 7] = [
            "length",
            "mass",
            "time",
            "current",
            "temperature",
            "substance",
            "luminosity",
        ];
        if self.is_dimensionless() {
            return write!(f, "dimensionless");
        }
        let mut first = true;
        for (name, exp) in NAMES.iter().zip(self.exponents()) {
            if exp == 0 {
                continue;
            }
            if !first {
                write!(f, " * ")?;
            }
            first = false;
            if exp == 1 {
                write!(f, "[{name}]")?;
            } else {
                write!(f, "[{name}]^{exp}")?;
            }
        }
        Ok(())
    }
}

/// A parsed unit: SI scale factor, additive offset (temperature scales only) and dimension.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Unit {
    pub factor: f64,
    pub offset: f64,
    pub dimension: Dimension,
}

impl Unit {
    const fn linear(factor: f64, dimension: Dimension) -> Self {
        Self {
            factor,
            offset: 0.0,
            dimension,
        }
    }

    pub fn dimensionless() -> Self {
        Self::linear(1.0, Dimension::NONE)
    }

    /// Convert a magnitude in this unit to SI.
    pub fn to_si(&self, value: f64) -> f64 {
        value * self.factor + self.offset
    }

    /// Convert an SI magnitude into this unit.
    pub fn from_si(&self, value: f64) -> f64 {
        (value - self.offset) / self.factor
    }

    pub fn is_compatible(&self, other: &Unit) -> bool {
        self.dimension == other.dimension
    }
}

struct UnitDef {
    names: &'static [&'static str],
    factor: f64,
    offset: f64,
    dimension: Dimension,
    prefixable: bool,
}

const fn def(
    names: &'static [&'static str],
    factor: f64,
    dimension: Dimension,
    prefixable: bool,
) -> UnitDef {
    UnitDef {
        names,
        factor,
        offset: 0.0,
        dimension,
        prefixable,
    }
}

const FORCE: Dimension = Dimension::new([1, 1, -2, 0, 0, 0, 0]);
const PRESSURE: Dimension = Dimension::new([-1, 1, -2, 0, 0, 0, 0]);
const ENERGY: Dimension = Dimension::new([2, 1, -2, 0, 0, 0, 0]);
const POWER: Dimension = Dimension::new([2, 1, -3, 0, 0, 0, 0]);
const VOLTAGE: Dimension = Dimension::new([2, 1, -3, -1, 0, 0, 0]);
const VOLUME: Dimension = Dimension::new([3, 0, 0, 0, 0, 0, 0]);
const FREQUENCY: Dimension = Dimension::new([0, 0, -1, 0, 0, 0, 0]);

const UNITS: &[UnitDef] = &[
    def(&["m", "meter", "metre"], 1.0, Dimension::LENGTH, true),
    def(&["g", "gram"], 1e-3, Dimension::MASS, true),
    def(&["t", "tonne"], 1e3, Dimension::MASS, false),
    def(&["s", "sec", "second"], 1.0, Dimension::TIME, true),
    def(&["min", "minute"], 60.0, Dimension::TIME, false),
    def(&["h", "hr", "hour"], 3_600.0, Dimension::TIME, false),
    def(&["day"], 86_400.0, Dimension::TIME, false),
    def(&["year", "yr"], 31_557_600.0, Dimension::TIME, false),
    def(&["A", "ampere"], 1.0, Dimension::CURRENT, true),
    def(&["K", "kelvin"], 1.0, Dimension::TEMPERATURE, true),
    def(&["degR", "°R", "rankine"], 5.0 / 9.0, Dimension::TEMPERATURE, false),
    def(&["mol", "mole"], 1.0, Dimension::AMOUNT, true),
    def(&["cd", "candela"], 1.0, Dimension::LUMINOSITY, false),
    def(&["N", "newton"], 1.0, FORCE, true),
    def(&["lbf"], 4.448_221_615_260_5, FORCE, false),
    def(&["Pa", "pascal"], 1.0, PRESSURE, true),
    def(&["bar"], 1e5, PRESSURE, true),
    def(&["atm", "atmosphere"], 101_325.0, PRESSURE, false),
    def(&["torr"], 133.322_368, PRESSURE, false),
    def(&["psi"], 6_894.757_293_168, PRESSURE, false),
    def(&["J", "joule"], 1.0, ENERGY, true),
    def(&["eV", "electron_volt"], 1.602_176_634e-19, ENERGY, true),
    def(&["W", "watt"], 1.0, POWER, true),
    def(&["V", "volt"], 1.0, VOLTAGE, true),
    def(&["Hz", "hertz"], 1.0, FREQUENCY, true),
    def(&["L", "l", "liter", "litre"], 1e-3, VOLUME, true),
    def(&["lb", "lbm", "pound"], 0.453_592_37, Dimension::MASS, false),
    def(&["ft", "foot", "feet"], 0.3048, Dimension::LENGTH, false),
    def(&["in", "inch"], 0.0254, Dimension::LENGTH, false),
    def(&["dimensionless", "dpa"], 1.0, Dimension::NONE, false),
    def(&["%", "percent"], 0.01, Dimension::NONE, false),
    def(&["ppm"], 1e-6, Dimension::NONE, false),
    def(&["rad", "radian"], 1.0, Dimension::NONE, false),
    def(&["deg", "degree"], core::f64::consts::PI / 180.0, Dimension::NONE, false),
    UnitDef {
        names: &["degC", "°C", "celsius"],
        factor: 1.0,
        offset: 273.15,
        dimension: Dimension::TEMPERATURE,
        prefixable: false,
    },
    UnitDef {
        names: &["degF", "°F", "fahrenheit"],
        factor: 5.0 / 9.0,
        offset: 459.67 * 5.0 / 9.0,
        dimension: Dimension::TEMPERATURE,
        prefixable: false,
    },
];

const PREFIXES: &[(&str, f64)] = &[
    ("tera", 1e12),
    ("giga", 1e9),
    ("mega", 1e6),
    ("kilo", 1e3),
    ("centi", 1e-2),
    ("milli", 1e-3),
    ("micro", 1e-6),
    ("nano", 1e-9),
    ("da", 1e1),
    ("T", 1e12),
    ("G", 1e9),
    ("M", 1e6),
    ("k", 1e3),
    ("h", 1e2),
    ("d", 1e-1),
    ("c", 1e-2),
    ("m", 1e-3),
    ("u", 1e-6),
    ("µ", 1e-6),
    ("n", 1e-9),
    ("p", 1e-12),
];

fn find_exact(name: &str) -> Option<&'static UnitDef> {
    UNITS.iter().find(|d| d.names.contains(&name))
}

fn lookup_symbol(name: &str) -> UnitResult<Unit> {
    let as_unit = |d: &UnitDef, scale: f64| Unit {
        factor: d.factor * scale,
        offset: d.offset,
        dimension: d.dimension,
    };

    if let Some(d) = find_exact(name) {
        return Ok(as_unit(d, 1.0));
    }
    for (prefix, scale) in PREFIXES {
        if let Some(rest) = name.strip_prefix(prefix)
            && let Some(d) = find_exact(rest)
            && d.prefixable
        {
            return Ok(as_unit(d, *scale));
        }
    }
    // plural long names ("meters", "kilograms")
    if name.len() > 3
        && let Some(singular) = name.strip_suffix('s')
        && let Ok(unit) = lookup_symbol(singular)
    {
        return Ok(unit);
    }
    Err(UnitError::UnknownUnit {
        unit: name.to_string(),
    })
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Ident(String),
    Int(i32),
    Mul,
    Div,
    Pow,
    Open,
    Close,
}

fn is_ident_char(c: char) -> bool {
    c.is_alphabetic() || c == '°' || c == 'µ' || c == '%' || c == '_'
}

fn tokenize(expr: &str) -> UnitResult<Vec<Token>> {
    let malformed = |reason| UnitError::Malformed {
        expr: expr.to_string(),
        reason,
    };
    let chars: Vec<char> = expr.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        match c {
            c if c.is_whitespace() => i += 1,
            '*' if chars.get(i + 1) == Some(&'*') => {
                tokens.push(Token::Pow);
                i += 2;
            }
            '*' | '·' => {
                tokens.push(Token::Mul);
                i += 1;
            }
            '/' => {
                tokens.push(Token::Div);
                i += 1;
            }
            '^' => {
                tokens.push(Token::Pow);
                i += 1;
            }
            '(' => {
                tokens.push(Token::Open);
                i += 1;
            }
            ')' => {
                tokens.push(Token::Close);
                i += 1;
            }
            c if c.is_ascii_digit() || c == '-' || c == '+' => {
                let start = i;
                i += 1;
                while i < chars.len() && chars[i].is_ascii_digit() {
                    i += 1;
                }
                let text: String = chars[start..i].iter().collect();
                let n = text
                    .parse::<i32>()
                    .map_err(|_| malformed("expected an integer"))?;
                tokens.push(Token::Int(n));
            }
            c if is_ident_char(c) => {
                let start = i;
                while i < chars.len() && is_ident_char(chars[i]) {
                    i += 1;
                }
                tokens.push(Token::Ident(chars[start..i].iter().collect()));
                // "m3", "cm2": trailing digits are an exponent
                if i < chars.len() && chars[i].is_ascii_digit() {
                    tokens.push(Token::Pow);
                }
            }
            _ => return Err(malformed("unexpected character")),
        }
    }
    Ok(tokens)
}

struct UnitParser<'a> {
    expr: &'a str,
    tokens: Vec<Token>,
    pos: usize,
    /// Number of unit symbols seen; offset units must stand alone.
    atoms: usize,
    offset_unit: Option<String>,
}

impl UnitParser<'_> {
    fn malformed(&self, reason: &'static str) -> UnitError {
        UnitError::Malformed {
            expr: self.expr.to_string(),
            reason,
        }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let tok = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        tok
    }

    fn expr(&mut self) -> UnitResult<Unit> {
        let mut acc = self.term()?;
        loop {
            match self.peek() {
                Some(Token::Mul) => {
                    self.pos += 1;
                    let rhs = self.term()?;
                    acc = Unit::linear(acc.factor * rhs.factor, acc.dimension.mul(rhs.dimension))
                        .with_offset(acc.offset + rhs.offset);
                }
                Some(Token::Div) => {
                    self.pos += 1;
                    let rhs = self.term()?;
                    acc = Unit::linear(acc.factor / rhs.factor, acc.dimension.div(rhs.dimension))
                        .with_offset(acc.offset + rhs.offset);
                }
                // implicit multiplication: "kg m^-3"
                Some(Token::Ident(_)) | Some(Token::Open) => {
                    let rhs = self.term()?;
                    acc = Unit::linear(acc.factor * rhs.factor, acc.dimension.mul(rhs.dimension))
                        .with_offset(acc.offset + rhs.offset);
                }
                _ => return Ok(acc),
            }
        }
    }

    fn term(&mut self) -> UnitResult<Unit> {
        let base = self.atom()?;
        if self.peek() == Some(&Token::Pow) {
            self.pos += 1;
            let exp = match self.next() {
                Some(Token::Int(n)) => n,
                _ => return Err(self.malformed("expected an integer exponent")),
            };
            let exp8 = i8::try_from(exp).map_err(|_| self.malformed("exponent out of range"))?;
            return Ok(Unit {
                factor: base.factor.powi(exp),
                offset: base.offset,
                dimension: base.dimension.powi(exp8),
            });
        }
        Ok(base)
    }

    fn atom(&mut self) -> UnitResult<Unit> {
        match self.next() {
            Some(Token::Ident(name)) => {
                self.atoms += 1;
                let unit = lookup_symbol(&name)?;
                if unit.offset != 0.0 {
                    self.offset_unit = Some(name);
                }
                Ok(unit)
            }
            Some(Token::Int(n)) => Ok(Unit::linear(f64::from(n), Dimension::NONE)),
            Some(Token::Open) => {
                let inner = self.expr()?;
                match self.next() {
                    Some(Token::Close) => Ok(inner),
                    _ => Err(self.malformed("unbalanced parenthesis")),
                }
            }
            _ => Err(self.malformed("expected a unit")),
        }
    }
}

impl Unit {
    fn with_offset(mut self, offset: f64) -> Self {
        self.offset = offset;
        self
    }
}

/// Parse a unit expression such as `"kg/m^3"`, `"W/(m*K)"`, `"MPa"` or `"degC"`.
///
/// An empty string is dimensionless.
pub fn parse_unit(expr: &str) -> UnitResult<Unit> {
    let trimmed = expr.trim();
    if trimmed.is_empty() {
        return Ok(Unit::dimensionless());
    }
    let mut parser = UnitParser {
        expr: trimmed,
        tokens: tokenize(trimmed)?,
        pos: 0,
        atoms: 0,
        offset_unit: None,
    };
    let unit = parser.expr()?;
    if parser.pos != parser.tokens.len() {
        return Err(parser.malformed("trailing tokens"));
    }
    if let Some(name) = parser.offset_unit
        && parser.atoms > 1
    {
        return Err(UnitError::OffsetInCompound { unit: name });
    }
    Ok(unit)
}

/// A magnitude tagged with a unit string.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Quantity {
    pub value: f64,
    pub unit: String,
}

impl Quantity {
    pub fn new(value: f64, unit: impl Into<String>) -> Self {
        Self {
            value,
            unit: unit.into(),
        }
    }

    pub fn dimension(&self) -> UnitResult<Dimension> {
        Ok(parse_unit(&self.unit)?.dimension)
    }

    /// SI magnitude of this quantity.
    pub fn si_value(&self) -> UnitResult<f64> {
        Ok(parse_unit(&self.unit)?.to_si(self.value))
    }

    /// Express this quantity in another, dimensionally compatible unit.
    pub fn convert_to(&self, unit: &str) -> UnitResult<Quantity> {
        let from = parse_unit(&self.unit)?;
        let to = parse_unit(unit)?;
        if !from.is_compatible(&to) {
            return Err(UnitError::Incompatible {
                from: self.unit.clone(),
                to: unit.to_string(),
            });
        }
        Ok(Quantity::new(to.from_si(from.to_si(self.value)), unit))
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.value, self.unit)
    }
}

/// Split a leading float literal from the rest of the text.
///
/// Examples:
/// - "1.5 m" -> (1.5, "m")
/// - "2e3kg" -> (2000.0, "kg")
/// - "5 eV" -> (5.0, "eV")
fn split_value_and_unit(input: &str) -> Option<(f64, &str)> {
    let bytes = input.as_bytes();
    let mut i = 0;
    if i < bytes.len() && (bytes[i] == b'+' || bytes[i] == b'-') {
        i += 1;
    }
    let digits_start = i;
    while i < bytes.len() && (bytes[i].is_ascii_digit() || bytes[i] == b'.') {
        i += 1;
    }
    if i == digits_start {
        return None;
    }
    // exponent only when followed by digits, so "5 eV" keeps its unit
    if i < bytes.len() && (bytes[i] == b'e' || bytes[i] == b'E') {
        let mut j = i + 1;
        if j < bytes.len() && (bytes[j] == b'+' || bytes[j] == b'-') {
            j += 1;
        }
        if j < bytes.len() && bytes[j].is_ascii_digit() {
            while j < bytes.len() && bytes[j].is_ascii_digit() {
                j += 1;
            }
            i = j;
        }
    }
    let value = input[..i].parse::<f64>().ok()?;
    Some((value, input[i..].trim()))
}

/// Parse text such as `"1.5 m"` or `"300 K"` into a quantity.
///
/// A bare number is dimensionless. Fails when the text does not start with a
/// number or the unit is not recognised.
pub fn parse_quantity(text: &str) -> UnitResult<Quantity> {
    let trimmed = text.trim();
    let (value, unit) = split_value_and_unit(trimmed).ok_or_else(|| UnitError::Parse {
        text: text.to_string(),
    })?;
    if !value.is_finite() {
        return Err(UnitError::NonFinite {
            what: "quantity magnitude",
            value,
        });
    }
    let unit = if unit.is_empty() { "dimensionless" } else { unit };
    parse_unit(unit)?;
    Ok(Quantity::new(value, unit))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() <= 1e-9 * a.abs().max(b.abs()).max(1.0)
    }

    #[test]
    fn constructors_smoke() {
        let _p = pa(101_325.0);
        let _t = k(300.0);
        let _m = kg(1.0);
        let _l = m(2.0);
    }

    #[test]
    fn base_and_prefixed_symbols() {
        assert_eq!(parse_unit("m").unwrap().dimension, Dimension::LENGTH);
        assert!(close(parse_unit("mm").unwrap().factor, 1e-3));
        assert!(close(parse_unit("kg").unwrap().factor, 1.0));
        assert!(close(parse_unit("MPa").unwrap().factor, 1e6));
        assert!(close(parse_unit("MeV").unwrap().factor, 1.602_176_634e-13));
        assert_eq!(parse_unit("kilogram").unwrap().dimension, Dimension::MASS);
        assert_eq!(parse_unit("meters").unwrap().dimension, Dimension::LENGTH);
    }

    #[test]
    fn exact_names_win_over_prefixes() {
        assert!(close(parse_unit("min").unwrap().factor, 60.0));
        assert_eq!(parse_unit("cd").unwrap().dimension, Dimension::LUMINOSITY);
        assert_eq!(parse_unit("Pa").unwrap().dimension, PRESSURE);
    }

    #[test]
    fn compound_expressions() {
        let density = parse_unit("kg/m^3").unwrap();
        assert_eq!(density.dimension, Dimension::new([-3, 1, 0, 0, 0, 0, 0]));

        let conductivity = parse_unit("W/(m*K)").unwrap();
        assert_eq!(
            conductivity.dimension,
            Dimension::new([1, 1, -3, 0, -1, 0, 0])
        );

        let implicit = parse_unit("kg m^-3").unwrap();
        assert_eq!(implicit.dimension, density.dimension);

        let pint_style = parse_unit("kilogram * meter / second ** 2").unwrap();
        assert_eq!(pint_style.dimension, FORCE);

        let trailing = parse_unit("kg/m3").unwrap();
        assert_eq!(trailing.dimension, density.dimension);
    }

    #[test]
    fn dimensionless_family() {
        assert!(parse_unit("").unwrap().dimension.is_dimensionless());
        assert!(parse_unit("dimensionless").unwrap().dimension.is_dimensionless());
        assert!(parse_unit("dpa").unwrap().dimension.is_dimensionless());
        assert!(close(parse_unit("%").unwrap().factor, 0.01));
        assert!(parse_unit("1/s").unwrap().dimension == FREQUENCY);
    }

    #[test]
    fn offset_units() {
        let c = parse_unit("degC").unwrap();
        assert!(close(c.to_si(0.0), 273.15));
        assert!(matches!(
            parse_unit("degC/s"),
            Err(UnitError::OffsetInCompound { .. })
        ));
    }

    #[test]
    fn unknown_and_malformed() {
        assert!(matches!(
            parse_unit("furlong"),
            Err(UnitError::UnknownUnit { .. })
        ));
        assert!(matches!(
            parse_unit("(m"),
            Err(UnitError::Malformed { .. })
        ));
        assert!(matches!(parse_unit("m^"), Err(UnitError::Malformed { .. })));
    }

    #[test]
    fn parse_quantity_text() {
        let q = parse_quantity("1.5 m").unwrap();
        assert_eq!(q, Quantity::new(1.5, "m"));

        let q = parse_quantity("2e3kg").unwrap();
        assert!(close(q.value, 2000.0));
        assert_eq!(q.unit, "kg");

        let q = parse_quantity("5 eV").unwrap();
        assert_eq!(q.unit, "eV");

        let q = parse_quantity("42").unwrap();
        assert_eq!(q.unit, "dimensionless");

        assert!(parse_quantity("steel").is_err());
        assert!(parse_quantity("3 bananas").is_err());
    }

    #[test]
    fn quantity_conversion() {
        let q = Quantity::new(1.0, "bar");
        let kpa = q.convert_to("kPa").unwrap();
        assert!(close(kpa.value, 100.0));

        let err = Quantity::new(1.0, "m").convert_to("s").unwrap_err();
        assert!(matches!(err, UnitError::Incompatible { .. }));

        let t = Quantity::new(20.0, "degC").si_value().unwrap();
        assert!(close(t, 293.15));
    }

    #[test]
    fn dimension_display() {
        assert_eq!(Dimension::NONE.to_string(), "dimensionless");
        assert_eq!(
            Dimension::new([1, 0, -1, 0, 0, 0, 0]).to_string(),
            "[length] * [time]^-1"
        );
    }
}
