//! Overflow-safe integer arithmetic.
//!
//! Level thresholds are computed as `weight^level` for potentially large
//! levels. Plain integer arithmetic would wrap into a small or negative
//! threshold and corrupt level comparisons, so every operation here clamps to
//! the type's bounds instead.

use crate::StatError;

/// Saturating arithmetic on signed fixed-width integers.
///
/// Results that are representable are returned exactly. Results that are not
/// are clamped to `MAX` or `MIN`, whichever matches the sign of the true
/// result.
pub trait SaturatingMath: Sized + Copy {
    /// `self + other`, clamped.
    fn clamped_add(self, other: Self) -> Self;

    /// `self - other`, clamped.
    fn clamped_sub(self, other: Self) -> Self;

    /// `self * other`, clamped.
    fn clamped_mul(self, other: Self) -> Self;

    /// `self / other`, truncating. Division by zero returns `self` unchanged.
    fn clamped_div(self, other: Self) -> Self;

    /// `self^exponent` by binary exponentiation.
    ///
    /// Returns `MAX` on overflow when the base is positive or the exponent is
    /// even, `MIN` otherwise.
    ///
    /// # Errors
    /// [`StatError::NegativeExponent`] if `exponent < 0`.
    fn clamped_pow(self, exponent: i32) -> Result<Self, StatError>;
}

macro_rules! impl_saturating_math {
    ($($t:ty),* $(,)?) => {$(
        impl SaturatingMath for $t {
            fn clamped_add(self, other: Self) -> Self {
                self.saturating_add(other)
            }

            fn clamped_sub(self, other: Self) -> Self {
                self.saturating_sub(other)
            }

            fn clamped_mul(self, other: Self) -> Self {
                self.saturating_mul(other)
            }

            fn clamped_div(self, other: Self) -> Self {
                if other == 0 {
                    self
                } else {
                    self.saturating_div(other)
                }
            }

            fn clamped_pow(self, exponent: i32) -> Result<Self, StatError> {
                if exponent < 0 {
                    return Err(StatError::NegativeExponent(exponent));
                }

                let saturated = if self > 0 || exponent % 2 == 0 {
                    <$t>::MAX
                } else {
                    <$t>::MIN
                };

                let mut result: $t = 1;
                let mut base = self;
                let mut exp = exponent;

                while exp > 0 {
                    if exp & 1 == 1 {
                        result = match result.checked_mul(base) {
                            Some(product) => product,
                            None => return Ok(saturated),
                        };
                    }
                    exp >>= 1;
                    if exp > 0 {
                        base = match base.checked_mul(base) {
                            Some(square) => square,
                            None => return Ok(saturated),
                        };
                    }
                }

                Ok(result)
            }
        }
    )*};
}

impl_saturating_math!(i32, i64);
