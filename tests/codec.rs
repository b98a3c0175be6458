use core::mem::offset_of;
use rawmem::codec::{
    self, Blittable, FieldKind, FieldLayout, Marshalled, TypeLayout, marshal, marshal_many,
    marshalled_size_of, unmarshal, unmarshal_many,
};

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq)]
struct Vec3 {
    x: f32,
    y: f32,
    z: f32,
}

unsafe impl Blittable for Vec3 {}

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq)]
struct Entity {
    id: u64,
    tag: [u16; 4],
    health: i32,
}

unsafe impl Marshalled for Entity {
    fn describe() -> TypeLayout {
        TypeLayout::new(vec![
            FieldLayout {
                offset: offset_of!(Entity, id),
                kind: FieldKind::Plain { size: 8 },
            },
            FieldLayout {
                offset: offset_of!(Entity, tag),
                kind: FieldKind::AnsiText { chars: 4 },
            },
            FieldLayout {
                offset: offset_of!(Entity, health),
                kind: FieldKind::Plain { size: 4 },
            },
        ])
    }
}

fn tag(text: &str) -> [u16; 4] {
    let mut out = [0u16; 4];
    for (slot, c) in out.iter_mut().zip(text.encode_utf16()) {
        *slot = c;
    }
    out
}

#[test]
fn blittable_round_trip_identity() {
    let v = Vec3 {
        x: 1.0,
        y: -2.5,
        z: 1e20,
    };
    let bytes = codec::to_bytes(&v);
    assert_eq!(bytes.len(), core::mem::size_of::<Vec3>());
    assert_eq!(codec::from_bytes::<Vec3>(&bytes).unwrap(), v);
}

#[test]
fn blittable_array_round_trip() {
    let values = [
        Vec3 {
            x: 0.0,
            y: 0.0,
            z: 0.0,
        },
        Vec3 {
            x: f32::MAX,
            y: f32::MIN,
            z: f32::EPSILON,
        },
    ];
    let bytes = codec::to_bytes_many(&values);
    assert_eq!(bytes.len(), 2 * core::mem::size_of::<Vec3>());
    assert_eq!(codec::slice_from_bytes::<Vec3>(&bytes).unwrap(), values);
}

#[test]
fn from_bytes_accepts_longer_buffers() {
    let mut bytes = codec::to_bytes(&7u16);
    bytes.extend_from_slice(&[0xAA, 0xBB]);
    assert_eq!(codec::from_bytes::<u16>(&bytes).unwrap(), 7);
}

#[test]
fn from_bytes_rejects_short_buffers() {
    let err = codec::from_bytes::<u64>(&[0u8; 7]).unwrap_err();
    assert!(matches!(err, rawmem::Error::Argument { .. }));
}

#[test]
fn slice_from_bytes_requires_exact_multiple() {
    let err = codec::slice_from_bytes::<u64>(&[0u8; 12]).unwrap_err();
    assert!(matches!(err, rawmem::Error::Argument { .. }));
}

#[test]
fn size_queries() {
    assert_eq!(codec::size_of_raw::<Vec3>(), 12);
    assert_eq!(marshalled_size_of::<Entity>(), 8 + 4 + 4);
    assert!(marshalled_size_of::<Entity>() < core::mem::size_of::<Entity>());
}

#[test]
fn marshalled_round_trip() {
    let e = Entity {
        id: 0xAABB_CCDD_EEFF_0011,
        tag: tag("ally"),
        health: -40,
    };
    assert_eq!(unmarshal::<Entity>(&marshal(&e)).unwrap(), e);
}

#[test]
fn marshalled_array_round_trip() {
    let entities = [
        Entity {
            id: 1,
            tag: tag("a"),
            health: 10,
        },
        Entity {
            id: 2,
            tag: tag("bc"),
            health: 20,
        },
        Entity {
            id: 3,
            tag: tag("defg"),
            health: 30,
        },
    ];
    let wire = marshal_many(&entities);
    assert_eq!(wire.len(), 3 * marshalled_size_of::<Entity>());
    assert_eq!(unmarshal_many::<Entity>(&wire, 3).unwrap(), entities);
}

#[test]
fn marshalled_text_narrows_on_the_wire() {
    let e = Entity {
        id: 0,
        tag: tag("ok"),
        health: 0,
    };
    let wire = marshal(&e);
    assert_eq!(&wire[8..12], b"ok\0\0");
}
