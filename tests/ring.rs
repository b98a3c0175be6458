use core::mem::offset_of;
use rawmem::codec::{FieldKind, FieldLayout, Marshalled, TypeLayout, marshalled_size_of};
use rawmem::{Fit, LocalSource, MemorySource, RingBuffer};

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq)]
struct Tagged {
    value: u32,
    tag: [u16; 2],
}

unsafe impl Marshalled for Tagged {
    fn describe() -> TypeLayout {
        TypeLayout::new(vec![
            FieldLayout {
                offset: offset_of!(Tagged, value),
                kind: FieldKind::Plain { size: 4 },
            },
            FieldLayout {
                offset: offset_of!(Tagged, tag),
                kind: FieldKind::AnsiText { chars: 2 },
            },
        ])
    }
}

#[test]
fn wrap_around_at_capacity_eight() {
    let mut ring = RingBuffer::new(LocalSource::new(), 8).unwrap();
    let base = ring.address();

    let first = ring.add(&0x11111111u32).unwrap().unwrap();
    let second = ring.add(&0x22222222u32).unwrap().unwrap();
    assert_eq!(first, base);
    assert_eq!(second, base + 4);
    assert_eq!(ring.offset(), 8);

    // Tail is full; the next 4-byte item must wrap to the base address.
    assert_eq!(ring.can_fit(4), Fit::StartOfBuffer);
    let third = ring.add(&0x33333333u32).unwrap().unwrap();
    assert_eq!(third, base);
    assert_eq!(ring.offset(), 4);
}

#[test]
fn fit_classification() {
    let ring = RingBuffer::new(LocalSource::new(), 16).unwrap();
    assert_eq!(ring.can_fit(16), Fit::Yes);
    assert_eq!(ring.can_fit(17), Fit::No);
    assert_eq!(ring.can_fit(0), Fit::Yes);
}

#[test]
fn oversized_item_is_rejected_without_writing() {
    let mut ring = RingBuffer::new(LocalSource::new(), 8).unwrap();
    ring.add(&1u32).unwrap().unwrap();
    let offset_before = ring.offset();

    assert_eq!(ring.add_bytes(&[0u8; 9]).unwrap(), None);
    assert_eq!(ring.offset(), offset_before);
}

#[test]
fn written_items_are_readable_until_overwritten() {
    let memory = LocalSource::new();
    let mut ring = RingBuffer::new(memory, 12).unwrap();

    let a = ring.add(&0xAAAA_AAAAu32).unwrap().unwrap();
    let b = ring.add(&0xBBBB_BBBBu32).unwrap().unwrap();
    assert_eq!(memory.read::<u32>(a).unwrap(), 0xAAAA_AAAA);
    assert_eq!(memory.read::<u32>(b).unwrap(), 0xBBBB_BBBB);

    // Two more adds wrap and overwrite the first slot.
    ring.add(&0xCCCC_CCCCu32).unwrap().unwrap();
    let d = ring.add(&0xDDDD_DDDDu32).unwrap().unwrap();
    assert_eq!(d, a);
    assert_eq!(memory.read::<u32>(a).unwrap(), 0xDDDD_DDDD);
}

#[test]
fn marshalled_items_use_wire_size() {
    let mut ring = RingBuffer::new(LocalSource::new(), 2 * marshalled_size_of::<Tagged>()).unwrap();
    let item = Tagged {
        value: 5,
        tag: [b'o' as u16, b'k' as u16],
    };

    let addr = ring.add_marshalled(&item).unwrap().unwrap();
    assert_eq!(ring.offset(), marshalled_size_of::<Tagged>());

    let memory = LocalSource::new();
    assert_eq!(memory.read_marshalled::<Tagged>(addr).unwrap(), item);
}

#[test]
fn variable_sized_items_pack_end_to_end() {
    let mut ring = RingBuffer::new(LocalSource::new(), 32).unwrap();
    let base = ring.address();

    assert_eq!(ring.add_bytes(&[1u8; 10]).unwrap(), Some(base));
    assert_eq!(ring.add_bytes(&[2u8; 10]).unwrap(), Some(base + 10));
    assert_eq!(ring.add_bytes(&[3u8; 10]).unwrap(), Some(base + 20));
    // 2 bytes of tail left; a 3-byte item wraps.
    assert_eq!(ring.add_bytes(&[4u8; 3]).unwrap(), Some(base));
    assert_eq!(ring.offset(), 3);
}
