/// Declares a fieldless enum with an explicit integer representation that is
/// written to the wire as that integer.
///
/// ```
/// skein_serde::serde_repr_enum! {
///     pub enum Team: u8 {
///         Red = 1,
///         Blue = 2,
///     }
/// }
///
/// let mut writer = skein_serde::WriteBuffer::unpooled(4, 64);
/// writer.write(&Team::Blue).unwrap();
/// assert_eq!(writer.as_slice(), &[2]);
/// ```
#[macro_export]
macro_rules! serde_repr_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident : $repr:ident {
            $($(#[$variant_meta:meta])* $variant:ident = $value:expr),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
        #[repr($repr)]
        $vis enum $name {
            $($(#[$variant_meta])* $variant = $value),+
        }

        impl $crate::Serde for $name {
            fn ser(&self, writer: &mut $crate::WriteBuffer) -> Result<(), $crate::SerdeErr> {
                writer.write(&(*self as $repr))
            }

            fn de(reader: &mut $crate::ReadBuffer<'_>) -> Result<Self, $crate::SerdeErr> {
                let value: $repr = reader.read()?;
                $(
                    if value == $name::$variant as $repr {
                        return Ok($name::$variant);
                    }
                )+
                Err($crate::SerdeErr::InvalidDiscriminant {
                    enum_name: stringify!($name),
                    value: value as i128,
                })
            }
        }

        impl $crate::ConstByteLength for $name {
            fn const_byte_length() -> usize {
                std::mem::size_of::<$repr>()
            }
        }
    };
}
