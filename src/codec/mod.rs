//! Struct codec.
//!
//! Bidirectional conversion between typed values and raw byte sequences,
//! with two code paths:
//!
//! * the **blittable** path — a pure byte reinterpretation for types whose
//!   in-memory bit pattern is exactly their wire representation, gated by
//!   the [`Blittable`] marker trait;
//! * the **marshalled** path — for types whose in-memory layout differs from
//!   their transmitted layout (e.g. embedded fixed-width text fields), driven
//!   by a cached per-type field descriptor. See [`Marshalled`].

mod marshal;

pub use marshal::{
    FieldKind, FieldLayout, Marshalled, TypeLayout, marshal, marshal_many, marshalled_size_of,
    unmarshal, unmarshal_many,
};

use crate::{Result, argument_error};

/// Marker for plain-old-data types: the in-memory bit pattern is exactly the
/// serialized byte representation, so conversion is a flat byte copy.
///
/// Implemented for the fixed-width integers, floats, and arrays thereof.
/// The bound makes the raw codec path statically unavailable for anything
/// else; there is no runtime blittability probe.
///
/// # Safety
/// Implementors must contain no indirection (references, pointers used as
/// references, non-`Copy` data) and every bit pattern of `size_of::<Self>()`
/// bytes must be a valid value.
pub unsafe trait Blittable: Copy {}

macro_rules! impl_blittable {
    ($($ty:ty),*) => {
        $(unsafe impl Blittable for $ty {})*
    };
}

impl_blittable!(u8, u16, u32, u64, u128, usize, i8, i16, i32, i64, i128, isize, f32, f64);

unsafe impl<T: Blittable, const N: usize> Blittable for [T; N] {}

/// Borrows the raw bytes of a blittable value.
#[inline]
pub fn bytes_of<T: Blittable>(value: &T) -> &[u8] {
    unsafe { core::slice::from_raw_parts(value as *const T as *const u8, size_of::<T>()) }
}

/// Borrows the raw bytes of a slice of blittable values.
#[inline]
pub fn slice_as_bytes<T: Blittable>(values: &[T]) -> &[u8] {
    unsafe {
        core::slice::from_raw_parts(values.as_ptr() as *const u8, size_of::<T>() * values.len())
    }
}

/// Serializes a blittable value into a freshly allocated byte buffer of
/// exactly `size_of::<T>()` bytes.
#[inline]
pub fn to_bytes<T: Blittable>(value: &T) -> Vec<u8> {
    bytes_of(value).to_vec()
}

/// Serializes a slice of blittable values into `len * size_of::<T>()` bytes.
#[inline]
pub fn to_bytes_many<T: Blittable>(values: &[T]) -> Vec<u8> {
    slice_as_bytes(values).to_vec()
}

/// Reinterprets the leading `size_of::<T>()` bytes of `bytes` as a `T`.
///
/// The copy is unaligned-safe. Fails with [`Error::Argument`](crate::Error)
/// when `bytes` is shorter than `T`.
#[inline]
pub fn from_bytes<T: Blittable>(bytes: &[u8]) -> Result<T> {
    if bytes.len() < size_of::<T>() {
        return Err(argument_error(format!(
            "buffer of {} bytes is too small for a {}-byte value",
            bytes.len(),
            size_of::<T>()
        )));
    }
    Ok(unsafe { (bytes.as_ptr() as *const T).read_unaligned() })
}

/// Reinterprets `bytes` as a homogeneous array of `T`.
///
/// Fails with [`Error::Argument`](crate::Error) when the length is not an
/// exact multiple of `size_of::<T>()`.
pub fn slice_from_bytes<T: Blittable>(bytes: &[u8]) -> Result<Vec<T>> {
    let elem = size_of::<T>();
    if elem == 0 || bytes.len() % elem != 0 {
        return Err(argument_error(format!(
            "buffer of {} bytes is not a multiple of the {}-byte element size",
            bytes.len(),
            elem
        )));
    }
    let count = bytes.len() / elem;
    let mut out = Vec::with_capacity(count);
    for chunk in bytes.chunks_exact(elem) {
        out.push(unsafe { (chunk.as_ptr() as *const T).read_unaligned() });
    }
    Ok(out)
}

/// Returns the serialized size of `T` on the raw (blittable) path.
#[inline]
pub const fn size_of_raw<T: Blittable>() -> usize {
    size_of::<T>()
}
