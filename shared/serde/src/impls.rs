use std::collections::BTreeMap;

use crate::{
    error::SerdeErr, read_buffer::ReadBuffer, serde::{ConstByteLength, Serde},
    write_buffer::WriteBuffer,
};

// Numbers

macro_rules! impl_serde_for_number {
    ($($t:ty),+) => {
        $(
            impl Serde for $t {
                fn ser(&self, writer: &mut WriteBuffer) -> Result<(), SerdeErr> {
                    writer.write_array(&self.to_le_bytes())
                }

                fn de(reader: &mut ReadBuffer<'_>) -> Result<Self, SerdeErr> {
                    let bytes = reader.read_fixed::<{ std::mem::size_of::<$t>() }>()?;
                    Ok(<$t>::from_le_bytes(bytes))
                }
            }

            impl ConstByteLength for $t {
                fn const_byte_length() -> usize {
                    std::mem::size_of::<$t>()
                }
            }
        )+
    };
}

impl_serde_for_number!(u8, u16, u32, u64, u128, i8, i16, i32, i64, i128, f32, f64);

// usize / isize travel as 64-bit values so both ends agree regardless of platform

impl Serde for usize {
    fn ser(&self, writer: &mut WriteBuffer) -> Result<(), SerdeErr> {
        let value = u64::try_from(*self).map_err(|_| SerdeErr::LengthOverflow {
            length: *self,
            target: "u64",
        })?;
        writer.write(&value)
    }

    fn de(reader: &mut ReadBuffer<'_>) -> Result<Self, SerdeErr> {
        let value: u64 = reader.read()?;
        usize::try_from(value).map_err(|_| SerdeErr::LengthOverflow {
            length: usize::MAX,
            target: "usize",
        })
    }
}

impl Serde for isize {
    fn ser(&self, writer: &mut WriteBuffer) -> Result<(), SerdeErr> {
        writer.write(&(*self as i64))
    }

    fn de(reader: &mut ReadBuffer<'_>) -> Result<Self, SerdeErr> {
        let value: i64 = reader.read()?;
        isize::try_from(value).map_err(|_| SerdeErr::LengthOverflow {
            length: usize::MAX,
            target: "isize",
        })
    }
}

impl Serde for bool {
    fn ser(&self, writer: &mut WriteBuffer) -> Result<(), SerdeErr> {
        writer.write_byte(u8::from(*self))
    }

    fn de(reader: &mut ReadBuffer<'_>) -> Result<Self, SerdeErr> {
        match reader.read_byte()? {
            0 => Ok(false),
            1 => Ok(true),
            tag => Err(SerdeErr::InvalidTag {
                type_name: "bool",
                tag,
            }),
        }
    }
}

impl ConstByteLength for bool {
    fn const_byte_length() -> usize {
        1
    }
}

impl Serde for char {
    fn ser(&self, writer: &mut WriteBuffer) -> Result<(), SerdeErr> {
        writer.write(&u32::from(*self))
    }

    fn de(reader: &mut ReadBuffer<'_>) -> Result<Self, SerdeErr> {
        let value: u32 = reader.read()?;
        char::from_u32(value).ok_or(SerdeErr::InvalidDiscriminant {
            enum_name: "char",
            value: i128::from(value),
        })
    }
}

// Strings

impl WriteBuffer {
    /// Write a `u32` byte length followed by the UTF-8 bytes of `value`
    pub fn write_str(&mut self, value: &str) -> Result<(), SerdeErr> {
        self.write_len(value.len())?;
        self.write_array(value.as_bytes())
    }
}

impl Serde for String {
    fn ser(&self, writer: &mut WriteBuffer) -> Result<(), SerdeErr> {
        writer.write_str(self)
    }

    fn de(reader: &mut ReadBuffer<'_>) -> Result<Self, SerdeErr> {
        let length = reader.read_len()?;
        let bytes = reader.read_bytes(length)?;
        std::str::from_utf8(bytes)
            .map(str::to_owned)
            .map_err(|_| SerdeErr::InvalidUtf8 { length })
    }
}

// Containers

impl<T: Serde> Serde for Option<T> {
    fn ser(&self, writer: &mut WriteBuffer) -> Result<(), SerdeErr> {
        match self {
            Some(value) => {
                writer.write_byte(1)?;
                value.ser(writer)
            }
            None => writer.write_byte(0),
        }
    }

    fn de(reader: &mut ReadBuffer<'_>) -> Result<Self, SerdeErr> {
        match reader.read_byte()? {
            0 => Ok(None),
            1 => Ok(Some(T::de(reader)?)),
            tag => Err(SerdeErr::InvalidTag {
                type_name: "Option",
                tag,
            }),
        }
    }
}

impl<T: Serde> Serde for Box<T> {
    fn ser(&self, writer: &mut WriteBuffer) -> Result<(), SerdeErr> {
        self.as_ref().ser(writer)
    }

    fn de(reader: &mut ReadBuffer<'_>) -> Result<Self, SerdeErr> {
        Ok(Box::new(T::de(reader)?))
    }
}

impl WriteBuffer {
    /// Write a `u32` element count followed by each element
    pub fn write_slice<T: Serde>(&mut self, values: &[T]) -> Result<(), SerdeErr> {
        self.write_len(values.len())?;
        for value in values {
            value.ser(self)?;
        }
        Ok(())
    }
}

impl<T: Serde> Serde for Vec<T> {
    fn ser(&self, writer: &mut WriteBuffer) -> Result<(), SerdeErr> {
        writer.write_slice(self)
    }

    fn de(reader: &mut ReadBuffer<'_>) -> Result<Self, SerdeErr> {
        let length = reader.read_len()?;
        // never trust a length prefix for the allocation size
        let mut output = Vec::with_capacity(length.min(reader.remaining()));
        for _ in 0..length {
            output.push(T::de(reader)?);
        }
        Ok(output)
    }
}

impl<T: Serde, const N: usize> Serde for [T; N] {
    fn ser(&self, writer: &mut WriteBuffer) -> Result<(), SerdeErr> {
        for value in self {
            value.ser(writer)?;
        }
        Ok(())
    }

    fn de(reader: &mut ReadBuffer<'_>) -> Result<Self, SerdeErr> {
        let mut output = Vec::with_capacity(N);
        for _ in 0..N {
            output.push(T::de(reader)?);
        }
        output.try_into().map_err(|_| SerdeErr::LengthOverflow {
            length: N,
            target: "fixed-size array",
        })
    }
}

impl<T: ConstByteLength, const N: usize> ConstByteLength for [T; N] {
    fn const_byte_length() -> usize {
        T::const_byte_length() * N
    }
}

// Only ordered maps: a HashMap's iteration order would make equal values hash differently
impl<K: Serde + Ord, V: Serde> Serde for BTreeMap<K, V> {
    fn ser(&self, writer: &mut WriteBuffer) -> Result<(), SerdeErr> {
        writer.write_len(self.len())?;
        for (key, value) in self {
            key.ser(writer)?;
            value.ser(writer)?;
        }
        Ok(())
    }

    fn de(reader: &mut ReadBuffer<'_>) -> Result<Self, SerdeErr> {
        let length = reader.read_len()?;
        let mut output = BTreeMap::new();
        for _ in 0..length {
            let key = K::de(reader)?;
            let value = V::de(reader)?;
            output.insert(key, value);
        }
        Ok(output)
    }
}

// Tuples

macro_rules! impl_serde_for_tuple {
    ($($name:ident),+) => {
        impl<$($name: Serde),+> Serde for ($($name,)+) {
            #[allow(non_snake_case)]
            fn ser(&self, writer: &mut WriteBuffer) -> Result<(), SerdeErr> {
                let ($($name,)+) = self;
                $($name.ser(writer)?;)+
                Ok(())
            }

            fn de(reader: &mut ReadBuffer<'_>) -> Result<Self, SerdeErr> {
                Ok(($($name::de(reader)?,)+))
            }
        }
    };
}

impl_serde_for_tuple!(A);
impl_serde_for_tuple!(A, B);
impl_serde_for_tuple!(A, B, C);
impl_serde_for_tuple!(A, B, C, D);
impl_serde_for_tuple!(A, B, C, D, E);
impl_serde_for_tuple!(A, B, C, D, E, F);
