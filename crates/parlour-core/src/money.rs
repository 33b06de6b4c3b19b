//! # Money, VAT and Quantities
//!
//! Every stored amount in Parlour is an integer:
//!
//! ```text
//!   Money     i64 pence        4500 → £45.00   (hourly rate)
//!   VatRate   u32 basis pts    2000 → 20%
//!   Quantity  i64 hundredths    250 → 2.5      (hours on site, parts)
//! ```
//!
//! Rounding happens in exactly two places, `times_quantity` and
//! `calculate_vat`, both half up on the penny and both computed in i128 so
//! a large line cannot overflow on the way.
//!
//! ```rust
//! use parlour_core::money::{Money, Quantity, VatRate};
//!
//! let labour = Money::from_pence(4_500).times_quantity(Quantity::from_hundredths(250));
//! assert_eq!(labour.pence(), 11_250);
//! assert_eq!(labour.calculate_vat(VatRate::from_bps(2000)).to_string(), "£22.50");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};
use ts_rs::TS;

/// `(value * numerator + denominator / 2) / denominator`, floored, so
/// halves round up for both signs of `value`.
fn round_half_up(value: i64, numerator: i64, denominator: i64) -> i64 {
    let scaled = value as i128 * numerator as i128 + (denominator / 2) as i128;
    scaled.div_euclid(denominator as i128) as i64
}

/// An amount in pence. Signed: a customer in credit has a negative balance.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    pub const fn from_pence(pence: i64) -> Self {
        Money(pence)
    }

    pub const fn zero() -> Self {
        Money(0)
    }

    pub const fn pence(&self) -> i64 {
        self.0
    }

    /// Whole pounds, truncated toward zero.
    pub const fn pounds(&self) -> i64 {
        self.0 / 100
    }

    /// The 0..=99 pence after the pounds, ignoring sign.
    pub const fn pence_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    pub const fn abs(&self) -> Self {
        Money(self.0.abs())
    }

    /// Negative amounts clamp to zero, e.g. amount due on an overpaid account.
    pub const fn floor_zero(&self) -> Self {
        if self.0 < 0 {
            Money(0)
        } else {
            *self
        }
    }

    /// VAT on this amount, to the nearest penny.
    ///
    /// ```rust
    /// use parlour_core::money::{Money, VatRate};
    ///
    /// let rate = VatRate::from_bps(2000);
    /// assert_eq!(Money::from_pence(1001).calculate_vat(rate).pence(), 200); // 200.2
    /// assert_eq!(Money::from_pence(3).calculate_vat(rate).pence(), 1);      // 0.6
    /// ```
    pub fn calculate_vat(&self, rate: VatRate) -> Money {
        Money(round_half_up(self.0, rate.bps() as i64, 10_000))
    }

    /// Unit price times a quantity in hundredths, to the nearest penny.
    pub fn times_quantity(&self, qty: Quantity) -> Money {
        Money(round_half_up(self.0, qty.hundredths(), 100))
    }

    /// `12.34` with no currency symbol, for the PDF built-in fonts and CSV.
    pub fn to_plain_string(&self) -> String {
        let sign = if self.0 < 0 { "-" } else { "" };
        format!("{sign}{}.{:02}", self.pounds().abs(), self.pence_part())
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{sign}£{}.{:02}", self.pounds().abs(), self.pence_part())
    }
}

macro_rules! pence_ops {
    ($($trait:ident $method:ident $op:tt),*) => {$(
        impl $trait for Money {
            type Output = Money;
            fn $method(self, rhs: Money) -> Money {
                Money(self.0 $op rhs.0)
            }
        }
    )*};
}

pence_ops!(Add add +, Sub sub -);

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Money) {
        self.0 += rhs.0;
    }
}

impl SubAssign for Money {
    fn sub_assign(&mut self, rhs: Money) {
        self.0 -= rhs.0;
    }
}

impl Neg for Money {
    type Output = Money;
    fn neg(self) -> Money {
        Money(-self.0)
    }
}

/// Whole-unit multiplication; use `times_quantity` for fractional amounts.
impl Mul<i64> for Money {
    type Output = Money;
    fn mul(self, units: i64) -> Money {
        Money(self.0 * units)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        Money(iter.map(|m| m.0).sum())
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Money {
        iter.copied().sum()
    }
}

/// A VAT rate in basis points. UK standard is 2000, reduced 500,
/// zero-rated 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct VatRate(u32);

impl VatRate {
    pub const fn from_bps(bps: u32) -> Self {
        VatRate(bps)
    }

    pub const fn zero() -> Self {
        VatRate(0)
    }

    /// `17.5` → 1750 bps. For settings forms that take a percentage.
    pub fn from_percentage(percent: f64) -> Self {
        VatRate((percent * 100.0).round().max(0.0) as u32)
    }

    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Display only; never feed this back into arithmetic.
    pub fn percentage(&self) -> f64 {
        f64::from(self.0) / 100.0
    }
}

impl Default for VatRate {
    fn default() -> Self {
        VatRate(crate::DEFAULT_VAT_RATE_BPS)
    }
}

/// `20%`, `17.50%`
impl fmt::Display for VatRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 % 100 {
            0 => write!(f, "{}%", self.0 / 100),
            frac => write!(f, "{}.{:02}%", self.0 / 100, frac),
        }
    }
}

/// Hundredths of a unit. Parts come in whole numbers, labour in fractions
/// of an hour, and both go through the same arithmetic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Quantity(i64);

impl Quantity {
    pub const fn from_hundredths(hundredths: i64) -> Self {
        Quantity(hundredths)
    }

    pub const fn from_units(units: i64) -> Self {
        Quantity(units * 100)
    }

    pub const fn hundredths(&self) -> i64 {
        self.0
    }

    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Stock taken off the shelf for this quantity: a part-used item still
    /// leaves the van, so fractions round up.
    pub const fn whole_units_ceil(&self) -> i64 {
        if self.0 <= 0 {
            0
        } else {
            (self.0 + 99) / 100
        }
    }
}

impl Add for Quantity {
    type Output = Quantity;
    fn add(self, rhs: Quantity) -> Quantity {
        Quantity(self.0 + rhs.0)
    }
}

/// Trailing zeros dropped: `3`, `1.5`, `1.25`.
impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.0 / 100;
        match (self.0 % 100).abs() {
            0 => write!(f, "{whole}"),
            frac if frac % 10 == 0 => write!(f, "{whole}.{}", frac / 10),
            frac => write!(f, "{whole}.{frac:02}"),
        }
    }
}
