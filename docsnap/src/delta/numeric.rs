use crate::common::{Convertible, Number};
use std::fmt::Debug;

/// Types that can carry an increment delta.
///
/// `combine` mirrors how the backend applies an increment: integer results
/// saturate at the type's bounds instead of wrapping.
pub trait Numeric: Convertible + Copy + PartialEq + Debug {
    fn combine(self, delta: Self) -> Self;
    fn to_number(self) -> Number;
}

macro_rules! impl_numeric_integer {
    ($($t:ty),*) => {
        $(
            impl Numeric for $t {
                #[inline]
                fn combine(self, delta: Self) -> Self {
                    self.saturating_add(delta)
                }

                #[inline]
                fn to_number(self) -> Number {
                    Number::Integer(self as i64)
                }
            }
        )*
    };
}

impl_numeric_integer!(i8, i16, i32, i64, u8, u16, u32);

impl Numeric for f32 {
    #[inline]
    fn combine(self, delta: Self) -> Self {
        self + delta
    }

    #[inline]
    fn to_number(self) -> Number {
        Number::Double(self as f64)
    }
}

impl Numeric for f64 {
    #[inline]
    fn combine(self, delta: Self) -> Self {
        self + delta
    }

    #[inline]
    fn to_number(self) -> Number {
        Number::Double(self)
    }
}
