/// Define a byte-valued enumeration with a catch-all `Unknown(u8)` variant
///
/// The wire format may carry values this client does not know yet, so the
/// conversion from `u8` is total and round-trips through `Unknown`.
macro_rules! byte_enum {
    (
        $(#[$outer:meta])*
        $vis:vis enum $name:ident {
            $($(#[$meta:meta])* $variant:ident = $value:literal,)+
        }
    ) => {
        $(#[$outer])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        $vis enum $name {
            $($(#[$meta])* $variant,)+
            /// A value this client does not know about
            Unknown(u8),
        }

        impl From<u8> for $name {
            fn from(value: u8) -> Self {
                match value {
                    $($value => Self::$variant,)+
                    other => Self::Unknown(other),
                }
            }
        }

        impl From<$name> for u8 {
            fn from(value: $name) -> Self {
                match value {
                    $($name::$variant => $value,)+
                    $name::Unknown(other) => other,
                }
            }
        }
    };
}

/// Define a secrets applet command with a TLV body and a TLV response
///
/// The generated type implements `ApduCommand`. Builders are added next to
/// the invocation through `from_raw` and `from_entries`.
macro_rules! secrets_command {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident => $ins:expr;
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq)]
        $vis struct $name {
            p1: u8,
            p2: u8,
            data: ::bytes::Bytes,
        }

        impl $name {
            /// Instruction sent by this command
            pub const INSTRUCTION: $crate::commands::Instruction = $ins;

            #[allow(dead_code)]
            const fn from_raw(p1: u8, p2: u8, data: ::bytes::Bytes) -> Self {
                Self { p1, p2, data }
            }

            #[allow(dead_code)]
            fn from_entries(p1: u8, p2: u8, entries: &[$crate::tlv::TagValue]) -> Self {
                Self::from_raw(p1, p2, $crate::tlv::encode(entries))
            }
        }

        impl ::secrets_apdu_core::ApduCommand for $name {
            type Success = Vec<$crate::tlv::TagValue>;
            type Error = $crate::Error;

            fn convert_error(error: ::secrets_apdu_core::Error) -> Self::Error {
                $crate::Error::from(error)
            }

            fn class(&self) -> u8 {
                $crate::commands::CLA
            }

            fn instruction(&self) -> u8 {
                Self::INSTRUCTION.into()
            }

            fn p1(&self) -> u8 {
                self.p1
            }

            fn p2(&self) -> u8 {
                self.p2
            }

            fn data(&self) -> Option<&[u8]> {
                (!self.data.is_empty()).then_some(self.data.as_ref())
            }

            fn expected_length(&self) -> Option<::secrets_apdu_core::ExpectedLength> {
                Some($crate::constants::EXPECTED_LENGTH)
            }

            fn parse_response(
                response: ::secrets_apdu_core::Response,
            ) -> ::core::result::Result<Self::Success, Self::Error> {
                $crate::commands::parse_entries(response)
            }
        }
    };
}
