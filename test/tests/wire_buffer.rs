/// Tests for the pooled wire buffer
/// Uses proptest to check growth and decoding over random payloads

use proptest::prelude::*;
use skein_serde::{BufferPool, BufferPoolConfig, ReadBuffer, SerdeErr, WriteBuffer};

skein_serde::serde_repr_enum! {
    enum Weather: u8 {
        Clear = 0,
        Rain = 1,
        Storm = 7,
    }
}

proptest! {
    /// However small a buffer starts, appending chunks yields exactly their
    /// concatenation, or CapacityExceeded once the maximum would be passed
    #[test]
    fn prop_growth_preserves_bytes(
        initial in 0usize..8,
        max_capacity in 1usize..512,
        chunks in prop::collection::vec(prop::collection::vec(any::<u8>(), 0..64), 0..16),
    ) {
        let pool = BufferPool::new(BufferPoolConfig {
            default_capacity: initial,
            max_capacity,
            max_pooled_buffers: 4,
        });
        let mut writer = pool.acquire_default();
        let mut expected = Vec::new();

        for chunk in &chunks {
            if expected.len() + chunk.len() > max_capacity {
                let is_capacity_error = matches!(
                    writer.write_array(chunk),
                    Err(SerdeErr::CapacityExceeded { .. })
                );
                prop_assert!(is_capacity_error);
                break;
            }
            writer.write_array(chunk).unwrap();
            expected.extend_from_slice(chunk);
        }

        prop_assert_eq!(writer.as_slice(), expected.as_slice());
        prop_assert!(writer.len() <= max_capacity);
    }

    /// Reading any prefix of a valid payload either succeeds with the same
    /// value or fails with a recoverable error, never panics
    #[test]
    fn prop_truncated_reads_are_recoverable(
        names in prop::collection::vec("[a-z]{0,12}", 0..6),
        levels in prop::collection::vec(any::<u16>(), 0..6),
        cut in any::<prop::sample::Index>(),
    ) {
        let mut writer = WriteBuffer::unpooled(8, 4096);
        writer.write(&names).unwrap();
        writer.write(&levels).unwrap();
        let bytes = writer.to_bytes();

        let end = cut.index(bytes.len() + 1);
        let mut reader = ReadBuffer::new(&bytes[..end]);
        let result = reader
            .read::<Vec<String>>()
            .and_then(|names| Ok((names, reader.read::<Vec<u16>>()?)));

        match result {
            Ok((read_names, read_levels)) => {
                prop_assert_eq!(end, bytes.len());
                prop_assert_eq!(read_names, names);
                prop_assert_eq!(read_levels, levels);
            }
            Err(error) => {
                prop_assert!(end < bytes.len());
                prop_assert!(error.is_recoverable());
            }
        }
    }
}

#[test]
fn mixed_record_layout() {
    let mut writer = WriteBuffer::unpooled(4, 1024);
    writer.write(&7u16).unwrap();
    writer.write(&true).unwrap();
    writer.write(&"hi".to_string()).unwrap();
    writer.write(&Some(Weather::Storm)).unwrap();
    writer.write(&[1u8, 2, 3]).unwrap();
    writer.write(&(-1i8, 2.5f32)).unwrap();

    let mut expected = vec![7, 0, 1, 2, 0, 0, 0, b'h', b'i', 1, 7, 1, 2, 3, 0xff];
    expected.extend_from_slice(&2.5f32.to_le_bytes());
    assert_eq!(writer.as_slice(), expected.as_slice());

    let mut reader = ReadBuffer::new(writer.as_slice());
    assert_eq!(reader.read::<u16>().unwrap(), 7);
    assert!(reader.read::<bool>().unwrap());
    assert_eq!(reader.read::<String>().unwrap(), "hi");
    assert_eq!(reader.read::<Option<Weather>>().unwrap(), Some(Weather::Storm));
    assert_eq!(reader.read::<[u8; 3]>().unwrap(), [1, 2, 3]);
    assert_eq!(reader.read::<(i8, f32)>().unwrap(), (-1, 2.5));
    assert!(reader.is_empty());
}

#[test]
fn invalid_values_are_distinct_errors() {
    assert_eq!(
        ReadBuffer::new(&[2]).read::<bool>(),
        Err(SerdeErr::InvalidTag {
            type_name: "bool",
            tag: 2
        })
    );
    assert_eq!(
        ReadBuffer::new(&[3]).read::<Weather>(),
        Err(SerdeErr::InvalidDiscriminant {
            enum_name: "Weather",
            value: 3
        })
    );
    assert_eq!(
        ReadBuffer::new(&[2, 0, 0, 0, 0xff, 0xfe]).read::<String>(),
        Err(SerdeErr::InvalidUtf8 { length: 2 })
    );
}

#[test]
fn read_into_copies_at_offset() {
    let mut reader = ReadBuffer::new(&[9, 8, 7, 6]);
    let mut dest = [0u8; 6];

    reader.read_into(&mut dest, 2, 3).unwrap();

    assert_eq!(dest, [0, 0, 9, 8, 7, 0]);
    assert_eq!(reader.remaining(), 1);
    assert!(reader.read_into(&mut dest, 5, 2).is_err());
}

fn encode_or_bail(pool: &BufferPool, fail: bool) -> Result<Vec<u8>, SerdeErr> {
    let mut writer = pool.acquire(64);
    writer.write(&1u32)?;
    if fail {
        writer.write_array(&[0; 128])?;
    }
    Ok(writer.to_bytes())
}

#[test]
fn buffers_return_to_the_pool_on_every_path() {
    let pool = BufferPool::new(BufferPoolConfig {
        default_capacity: 64,
        max_capacity: 96,
        max_pooled_buffers: 8,
    });

    assert!(encode_or_bail(&pool, false).is_ok());
    assert!(matches!(
        encode_or_bail(&pool, true),
        Err(SerdeErr::CapacityExceeded { .. })
    ));

    let stats = pool.stats();
    assert_eq!(stats.acquired, 2);
    assert_eq!(stats.reused, 1);
    assert_eq!(stats.released, 2);
    assert_eq!(pool.idle_buffers(), 1);
}
