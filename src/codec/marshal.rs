//! The marshalled codec path.
//!
//! Some types transmit in a layout that differs from their in-memory layout,
//! most commonly structs embedding fixed-width encoded text: stored as
//! `[u16; N]` in memory but sent as `N` single-byte characters on the wire.
//! Conversion for these types walks a per-type field descriptor instead of
//! doing a flat byte copy. Descriptors are computed once per type and cached
//! in a process-wide registry for the lifetime of the process.

use crate::{Result, argument_error};
use core::{any::TypeId, mem::MaybeUninit};
use std::collections::HashMap;
use std::sync::{OnceLock, RwLock};

/// How a single field translates between memory and the wire.
#[derive(Clone, Copy, Debug)]
pub enum FieldKind {
    /// Copied verbatim; native and wire widths are both `size` bytes.
    Plain {
        /// Field width in bytes.
        size: usize,
    },
    /// Fixed-width text: `[u16; chars]` in memory, `chars` single-byte
    /// characters on the wire. Code units above `0xFF` are replaced with
    /// `?` when narrowing.
    AnsiText {
        /// Number of characters in the field.
        chars: usize,
    },
}

impl FieldKind {
    #[inline]
    fn wire_size(&self) -> usize {
        match *self {
            FieldKind::Plain { size } => size,
            FieldKind::AnsiText { chars } => chars,
        }
    }
}

/// One field of a marshalled type: where it lives in the native struct and
/// how it translates.
#[derive(Clone, Copy, Debug)]
pub struct FieldLayout {
    /// Byte offset of the field within the native struct.
    pub offset: usize,
    /// Translation rule for the field.
    pub kind: FieldKind,
}

/// The cached per-type descriptor driving the marshalled path: the ordered
/// field list plus the precomputed wire size.
#[derive(Debug)]
pub struct TypeLayout {
    fields: Box<[FieldLayout]>,
    wire_size: usize,
}

impl TypeLayout {
    /// Builds a layout from an ordered field list. Wire order is field order.
    pub fn new(fields: Vec<FieldLayout>) -> Self {
        let wire_size = fields.iter().map(|f| f.kind.wire_size()).sum();
        Self {
            fields: fields.into_boxed_slice(),
            wire_size,
        }
    }

    /// The serialized size of the described type, which may differ from its
    /// in-memory size.
    #[inline]
    pub fn wire_size(&self) -> usize {
        self.wire_size
    }

    /// The ordered field descriptors.
    #[inline]
    pub fn fields(&self) -> &[FieldLayout] {
        &self.fields
    }
}

/// A type convertible through the marshalled path.
///
/// The field layout is computed by the implementor (typically from
/// `core::mem::offset_of!`) and cached by the codec; [`describe`] runs at
/// most once per type per process.
///
/// # Safety
/// * Every [`FieldLayout`] offset/width must lie within the struct, and
///   fields described as [`FieldKind::AnsiText`] must be `[u16; chars]`.
/// * The all-zero bit pattern must be a valid value of the type (padding and
///   undeclared fields are zeroed when unmarshalling).
///
/// [`describe`]: Marshalled::describe
pub unsafe trait Marshalled: Sized + 'static {
    /// Computes the field layout of this type.
    fn describe() -> TypeLayout;
}

static REGISTRY: OnceLock<RwLock<HashMap<TypeId, &'static TypeLayout>>> = OnceLock::new();

/// Looks up the cached layout of `T`, computing and caching it on first use.
pub(crate) fn layout_of<T: Marshalled>() -> &'static TypeLayout {
    let registry = REGISTRY.get_or_init(Default::default);
    if let Some(layout) = registry
        .read()
        .unwrap_or_else(|e| e.into_inner())
        .get(&TypeId::of::<T>())
    {
        return layout;
    }
    let layout: &'static TypeLayout = Box::leak(Box::new(T::describe()));
    let mut map = registry.write().unwrap_or_else(|e| e.into_inner());
    // A racing first use keeps whichever descriptor landed first.
    map.entry(TypeId::of::<T>()).or_insert(layout)
}

/// Returns the serialized size of `T` on the marshalled path.
#[inline]
pub fn marshalled_size_of<T: Marshalled>() -> usize {
    layout_of::<T>().wire_size()
}

/// Serializes `value` through its field descriptor into exactly
/// [`marshalled_size_of::<T>()`](marshalled_size_of) bytes.
pub fn marshal<T: Marshalled>(value: &T) -> Vec<u8> {
    let layout = layout_of::<T>();
    let mut out = Vec::with_capacity(layout.wire_size());
    let base = value as *const T as *const u8;
    for field in layout.fields() {
        match field.kind {
            FieldKind::Plain { size } => {
                let bytes = unsafe { core::slice::from_raw_parts(base.add(field.offset), size) };
                out.extend_from_slice(bytes);
            }
            FieldKind::AnsiText { chars } => {
                let units = base.wrapping_add(field.offset) as *const u16;
                for i in 0..chars {
                    let unit = unsafe { units.add(i).read_unaligned() };
                    out.push(if unit <= 0xFF { unit as u8 } else { b'?' });
                }
            }
        }
    }
    out
}

/// Serializes a slice of marshalled values end-to-end.
pub fn marshal_many<T: Marshalled>(values: &[T]) -> Vec<u8> {
    let mut out = Vec::with_capacity(marshalled_size_of::<T>() * values.len());
    for value in values {
        out.extend_from_slice(&marshal(value));
    }
    out
}

/// Reconstructs a `T` from its wire representation.
///
/// Field values round-trip exactly; padding bytes are zeroed, not preserved.
/// Fails with [`Error::Argument`](crate::Error) when `bytes` is shorter than
/// the wire size.
pub fn unmarshal<T: Marshalled>(bytes: &[u8]) -> Result<T> {
    let layout = layout_of::<T>();
    if bytes.len() < layout.wire_size() {
        return Err(argument_error(format!(
            "buffer of {} bytes is too small for a marshalled value of {} bytes",
            bytes.len(),
            layout.wire_size()
        )));
    }
    let mut value = MaybeUninit::<T>::zeroed();
    let base = value.as_mut_ptr() as *mut u8;
    let mut cursor = 0usize;
    for field in layout.fields() {
        match field.kind {
            FieldKind::Plain { size } => {
                unsafe {
                    core::ptr::copy_nonoverlapping(
                        bytes[cursor..cursor + size].as_ptr(),
                        base.add(field.offset),
                        size,
                    );
                }
                cursor += size;
            }
            FieldKind::AnsiText { chars } => {
                let units = base.wrapping_add(field.offset) as *mut u16;
                for i in 0..chars {
                    unsafe { units.add(i).write_unaligned(bytes[cursor + i] as u16) };
                }
                cursor += chars;
            }
        }
    }
    // Safety: every described field is initialized above and the Marshalled
    // contract guarantees the zeroed remainder is valid.
    Ok(unsafe { value.assume_init() })
}

/// Reconstructs `count` marshalled values laid end-to-end in `bytes`.
pub fn unmarshal_many<T: Marshalled>(bytes: &[u8], count: usize) -> Result<Vec<T>> {
    let elem = marshalled_size_of::<T>();
    if bytes.len() < elem * count {
        return Err(argument_error(format!(
            "buffer of {} bytes is too small for {} marshalled values of {} bytes",
            bytes.len(),
            count,
            elem
        )));
    }
    let mut out = Vec::with_capacity(count);
    for i in 0..count {
        out.push(unmarshal(&bytes[i * elem..(i + 1) * elem])?);
    }
    Ok(out)
}
