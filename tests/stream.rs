use core::mem::offset_of;
use rawmem::codec::{Blittable, FieldKind, FieldLayout, Marshalled, TypeLayout};
use rawmem::stream::{Endian, IoSource, StreamReader, SwapEndian};
use rawmem::{Error, MemorySource};
use std::io::{Cursor, SeekFrom};

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq)]
struct Header {
    magic: u32,
    version: u16,
    kind: u8,
    reserved: u8,
}

unsafe impl Blittable for Header {}

impl SwapEndian for Header {
    fn swap_endian(&mut self) {
        self.magic = self.magic.swap_bytes();
        self.version = self.version.swap_bytes();
    }
}

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq)]
struct Record {
    code: u16,
    name: [u16; 3],
}

unsafe impl Marshalled for Record {
    fn describe() -> TypeLayout {
        TypeLayout::new(vec![
            FieldLayout {
                offset: offset_of!(Record, code),
                kind: FieldKind::Plain { size: 2 },
            },
            FieldLayout {
                offset: offset_of!(Record, name),
                kind: FieldKind::AnsiText { chars: 3 },
            },
        ])
    }
}

/// Deterministic pseudo-random bytes for buffer-size sweeps.
fn noise(len: usize) -> Vec<u8> {
    let mut state = 0x2545_F491_4F6C_DD1Du64;
    (0..len)
        .map(|_| {
            state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            (state >> 56) as u8
        })
        .collect()
}

#[test]
fn endianness_concrete_values() {
    let bytes = [0x78u8, 0x56, 0x34, 0x12];
    let mut le = StreamReader::new(&bytes[..]);
    assert_eq!(le.read::<u32>().unwrap(), 0x12345678);

    let mut be = StreamReader::new(&bytes[..]).with_endian(Endian::Big);
    assert_eq!(be.read::<u32>().unwrap(), 0x78563412);
}

#[test]
fn explicit_order_overrides_configured_order() {
    let bytes = [0x78u8, 0x56, 0x34, 0x12];
    let mut reader = StreamReader::new(&bytes[..]).with_endian(Endian::Big);
    assert_eq!(reader.peek_le::<u32>().unwrap(), 0x12345678);
    assert_eq!(reader.read_be::<u32>().unwrap(), 0x78563412);
}

#[test]
fn all_buffer_capacities_agree() {
    let data = noise(4096);
    let expected: Vec<u32> = data
        .chunks_exact(4)
        .map(|c| u32::from_le_bytes(c.try_into().unwrap()))
        .collect();

    for capacity in [1, 2, 3, 5, 7, 16, 63, 256, 4096, 65536] {
        let mut reader = StreamReader::with_capacity(data.as_slice(), capacity);
        let got: Vec<u32> = (0..expected.len())
            .map(|_| reader.read::<u32>().unwrap())
            .collect();
        assert_eq!(got, expected, "capacity {capacity} disagrees");
        assert_eq!(reader.position(), data.len() as u64);
    }
}

#[test]
fn peek_never_advances() {
    let data = noise(64);
    let mut reader = StreamReader::with_capacity(data.as_slice(), 8);
    reader.read::<u16>().unwrap();

    let before = reader.position();
    let peeked = reader.peek::<u64>().unwrap();
    assert_eq!(reader.position(), before);
    assert_eq!(reader.read::<u64>().unwrap(), peeked);
}

#[test]
fn exhaustion_is_an_error_not_zero_fill() {
    let bytes = [1u8, 2, 3];
    let mut reader = StreamReader::new(&bytes[..]);
    let err = reader.read::<u32>().unwrap_err();
    assert!(matches!(err, Error::End { .. }));

    // The three valid bytes are still readable afterwards.
    assert_eq!(reader.read::<u8>().unwrap(), 1);
}

#[test]
fn reads_larger_than_capacity_bypass_the_buffer() {
    let data = noise(1024);
    let mut reader = StreamReader::with_capacity(data.as_slice(), 16);
    let mut out = vec![0u8; 700];
    reader.read_into(&mut out).unwrap();
    assert_eq!(out, data[..700]);
    assert_eq!(reader.position(), 700);
    assert_eq!(reader.read::<u8>().unwrap(), data[700]);
}

#[test]
fn out_of_band_read_does_not_perturb_position() {
    let data = noise(512);
    let mut reader = StreamReader::with_capacity(data.as_slice(), 32);
    reader.read::<u32>().unwrap();

    let before = reader.position();
    let blob = reader.read_bytes(300, 100).unwrap();
    assert_eq!(blob, data[300..400]);
    assert_eq!(reader.position(), before);
    assert_eq!(reader.read::<u8>().unwrap(), data[before as usize]);
}

#[test]
fn seek_from_all_origins() {
    let data = noise(256);
    let mut reader = StreamReader::with_capacity(data.as_slice(), 16);

    reader.seek(SeekFrom::Start(100)).unwrap();
    assert_eq!(reader.read::<u8>().unwrap(), data[100]);

    reader.seek(SeekFrom::Current(9)).unwrap();
    assert_eq!(reader.read::<u8>().unwrap(), data[110]);

    reader.seek(SeekFrom::End(-1)).unwrap();
    assert_eq!(reader.read::<u8>().unwrap(), data[255]);
    assert!(matches!(
        reader.read::<u8>().unwrap_err(),
        Error::End { .. }
    ));
}

#[test]
fn struct_reads_little_and_big() {
    // magic 0x11223344, version 0x0102, kind 7 — little-endian wire form.
    let wire = [0x44u8, 0x33, 0x22, 0x11, 0x02, 0x01, 0x07, 0x00];
    let expected = Header {
        magic: 0x11223344,
        version: 0x0102,
        kind: 7,
        reserved: 0,
    };

    let mut le = StreamReader::new(&wire[..]);
    assert_eq!(le.read_swapped::<Header>().unwrap(), expected);

    // The same logical header serialized big-endian.
    let wire_be = [0x11u8, 0x22, 0x33, 0x44, 0x01, 0x02, 0x07, 0x00];
    let mut be = StreamReader::new(&wire_be[..]).with_endian(Endian::Big);
    assert_eq!(be.read_swapped::<Header>().unwrap(), expected);
}

#[test]
fn marshalled_struct_read() {
    // code 0x0501 LE, then "abc" as single bytes.
    let wire = [0x01u8, 0x05, b'a', b'b', b'c'];
    let mut reader = StreamReader::new(&wire[..]);
    let record = reader.read_marshalled::<Record>().unwrap();
    assert_eq!(u16::from_le(record.code), 0x0501);
    assert_eq!(record.name, [b'a' as u16, b'b' as u16, b'c' as u16]);
    assert_eq!(reader.position(), 5);
}

#[test]
fn can_read_reflects_buffered_bytes_only() {
    let data = noise(64);
    let mut reader = StreamReader::with_capacity(data.as_slice(), 8);
    assert!(!reader.can_read(1));
    reader.read::<u8>().unwrap();
    assert!(reader.can_read(7));
    assert!(!reader.can_read(8));
}

#[test]
fn io_source_adapter_over_cursor() {
    let data = noise(128);
    let mut reader = StreamReader::with_capacity(IoSource::new(Cursor::new(data.clone())), 16);
    assert_eq!(reader.len(), Some(128));
    let mut out = vec![0u8; 128];
    reader.read_into(&mut out).unwrap();
    assert_eq!(out, data);
}

#[test]
fn string_read() {
    let mut reader = StreamReader::new(&b"hello, ring"[..]);
    assert_eq!(reader.read_string_utf8(5).unwrap(), "hello");
    assert_eq!(reader.position(), 5);
}

#[test]
fn borrowed_source_is_supported() {
    let data = noise(32);
    let mut slice: &[u8] = data.as_slice();
    {
        let mut reader = StreamReader::new(&mut slice);
        reader.read::<u32>().unwrap();
    }
    // The source outlives the reader.
    assert_eq!(slice.len(), 32);
}

#[test]
fn reading_memory_through_a_stream() {
    // A stream over bytes fetched from a memory source: the common pattern
    // for parsing structures out of a foreign process image.
    let memory = rawmem::LocalSource::new();
    let region = memory.allocate(64).unwrap();
    memory.write(region.address, &0xCAFE_BABEu32).unwrap();

    let mut buf = vec![0u8; 4];
    memory.read_raw(region.address, &mut buf).unwrap();
    // Memory holds host-order bytes, so read back in host order.
    let mut reader = StreamReader::new(buf.as_slice()).with_endian(Endian::host());
    assert_eq!(reader.read::<u32>().unwrap(), 0xCAFE_BABE);

    assert!(memory.free(region));
}
