/// Declare a field-less enumeration that takes part in conversions.
///
/// The enumeration converts to and from its underlying integral type through
/// the primitive path, renders its variant name when converted to a string
/// and parses either a variant name or a numeric ordinal. Its default value
/// is the first variant.
///
/// ```
/// use photon_convert::{convert, convertible_enum};
///
/// convertible_enum! {
///     pub enum Level: u8 {
///         Low = 1,
///         High = 5,
///     }
/// }
///
/// assert_eq!(convert::<Level, u8>(Level::High).unwrap(), 5);
/// assert_eq!(convert::<Level, i64>(Level::Low).unwrap(), 1);
/// assert_eq!(convert::<Level, String>(Level::High).unwrap(), "High");
/// assert_eq!(convert::<String, Level>("5".into()).unwrap(), Level::High);
/// ```
#[macro_export]
macro_rules! convertible_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident : $repr:ident {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident $(= $ordinal:expr)?
            ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[repr($repr)]
        $vis enum $name {
            $(
                $(#[$variant_meta])*
                $variant $(= $ordinal)?,
            )+
        }

        impl $name {
            /// Every variant, in declaration order.
            pub const VARIANTS: &'static [$name] = &[$($name::$variant),+];

            /// The symbolic name of this variant.
            pub fn name(self) -> &'static str {
                match self {
                    $($name::$variant => stringify!($variant),)+
                }
            }

            fn from_ordinal(ordinal: $repr) -> ::std::option::Option<Self> {
                $(
                    if ordinal == $name::$variant as $repr {
                        return ::std::option::Option::Some($name::$variant);
                    }
                )+
                ::std::option::Option::None
            }
        }

        impl ::std::default::Default for $name {
            fn default() -> Self {
                $name::VARIANTS[0]
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.write_str(self.name())
            }
        }

        impl $crate::Convertible for $name {
            fn descriptor() -> $crate::TypeDescriptor {
                $crate::TypeDescriptor::of::<$name>($crate::TypeKind::Enum(
                    <$repr as $crate::Integral>::KIND,
                ))
            }

            fn to_primitive(&self) -> ::std::option::Option<$crate::Primitive> {
                $crate::Convertible::to_primitive(&(*self as $repr))
            }

            fn from_primitive(value: $crate::Primitive) -> $crate::Result<Self> {
                let ordinal = <$repr as $crate::Convertible>::from_primitive(value)?;
                $name::from_ordinal(ordinal).ok_or_else(|| {
                    $crate::Error::invalid_cast(&ordinal.to_string(), stringify!($name))
                })
            }

            fn parser() -> ::std::option::Option<$crate::Parser<Self>> {
                ::std::option::Option::Some($crate::Parser::Fallible(|text| {
                    let text = text.trim();
                    $name::VARIANTS
                        .iter()
                        .copied()
                        .find(|variant| variant.name() == text)
                        .or_else(|| text.parse::<$repr>().ok().and_then($name::from_ordinal))
                }))
            }

            fn render(&self) -> ::std::string::String {
                self.name().to_string()
            }
        }
    };
}
