use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

use super::text_column;

#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, ToSchema, AsRefStr, Display, EnumString,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum Role {
    Admin,
    Employee,
}

text_column!(Role);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_stored_text() {
        assert_eq!("ADMIN".parse::<Role>().ok(), Some(Role::Admin));
        assert_eq!("employee".parse::<Role>().ok(), Some(Role::Employee));
        assert!("HR".parse::<Role>().is_err());
        assert_eq!(Role::Employee.as_ref(), "EMPLOYEE");
    }
}
