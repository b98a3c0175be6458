/// Byte order used when a multi-byte value is serialized.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Endian {
    /// Least-significant byte first.
    Little,
    /// Most-significant byte first.
    Big,
}

impl Endian {
    /// The byte order of the host CPU.
    #[inline]
    pub const fn host() -> Endian {
        if cfg!(target_endian = "big") {
            Endian::Big
        } else {
            Endian::Little
        }
    }
}

/// A primitive whose byte order can be reversed.
///
/// Reversal is a full byte-order reversal (never a partial or nibble swap)
/// and is its own inverse; for single-byte types it is a no-op.
pub trait Scalar: crate::codec::Blittable {
    /// Reverses the byte order of the value.
    fn swap_bytes(self) -> Self;
}

macro_rules! impl_scalar_int {
    ($($ty:ty),*) => {
        $(impl Scalar for $ty {
            #[inline]
            fn swap_bytes(self) -> Self {
                <$ty>::swap_bytes(self)
            }
        })*
    };
}

impl_scalar_int!(u8, u16, u32, u64, u128, usize, i8, i16, i32, i64, i128, isize);

impl Scalar for f32 {
    #[inline]
    fn swap_bytes(self) -> Self {
        f32::from_bits(self.to_bits().swap_bytes())
    }
}

impl Scalar for f64 {
    #[inline]
    fn swap_bytes(self) -> Self {
        f64::from_bits(self.to_bits().swap_bytes())
    }
}

/// Per-field endian reversal for structs.
///
/// A struct opts into endian-aware stream reads by declaring which of its
/// fields are multi-byte and need swapping; the reader never guesses field
/// layout.
pub trait SwapEndian {
    /// Reverses the byte order of every multi-byte field.
    fn swap_endian(&mut self);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reversal_is_its_own_inverse() {
        assert_eq!(0x12u8.swap_bytes().swap_bytes(), 0x12);
        assert_eq!(0x1234u16.swap_bytes().swap_bytes(), 0x1234);
        assert_eq!(0x1234_5678u32.swap_bytes().swap_bytes(), 0x1234_5678);
        assert_eq!(
            0x1234_5678_9ABC_DEF0u64.swap_bytes().swap_bytes(),
            0x1234_5678_9ABC_DEF0
        );
        let f = 1234.5678f64;
        assert_eq!(f.swap_bytes().swap_bytes(), f);
    }

    #[test]
    fn single_byte_reversal_is_noop() {
        assert_eq!(0xABu8.swap_bytes(), 0xAB);
        assert_eq!((-5i8).swap_bytes(), -5);
    }

    #[test]
    fn multi_byte_reversal_is_full() {
        assert_eq!(0x1234_5678u32.swap_bytes(), 0x7856_3412);
    }
}
