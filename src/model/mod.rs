pub mod document;
pub mod employee;
pub mod leave_request;
pub mod message;
pub mod role;
pub mod setting;
pub mod user;

/// Stores a strum-backed enum as its text form (VARCHAR column) in MySQL.
macro_rules! text_column {
    ($ty:ty) => {
        impl sqlx::Type<sqlx::MySql> for $ty {
            fn type_info() -> sqlx::mysql::MySqlTypeInfo {
                <str as sqlx::Type<sqlx::MySql>>::type_info()
            }

            fn compatible(ty: &sqlx::mysql::MySqlTypeInfo) -> bool {
                <str as sqlx::Type<sqlx::MySql>>::compatible(ty)
            }
        }

        impl<'q> sqlx::Encode<'q, sqlx::MySql> for $ty {
            fn encode_by_ref(&self, buf: &mut Vec<u8>) -> sqlx::encode::IsNull {
                <&str as sqlx::Encode<'q, sqlx::MySql>>::encode_by_ref(&self.as_ref(), buf)
            }
        }

        impl<'r> sqlx::Decode<'r, sqlx::MySql> for $ty {
            fn decode(
                value: sqlx::mysql::MySqlValueRef<'r>,
            ) -> Result<Self, sqlx::error::BoxDynError> {
                let text = <&str as sqlx::Decode<'r, sqlx::MySql>>::decode(value)?;
                Ok(text.parse()?)
            }
        }
    };
}

pub(crate) use text_column;
