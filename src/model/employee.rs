use chrono::{DateTime, NaiveDate, Utc};
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow)]
pub struct Employee {
    pub id: u64,
    pub user_id: Option<u64>,
    /// Joined from the linked account; `None` for unlinked profiles.
    pub email: Option<String>,
    pub full_name: String,
    pub position: Option<String>,
    pub department: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub join_date: Option<NaiveDate>,
    /// Leave balance in whole days; `None` means the employee is not tracked.
    pub remaining_leave_days: Option<i32>,
    pub profile_photo_path: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Editable profile fields, shared by the admin and self-service paths.
#[derive(Debug, Clone, Default)]
pub struct Profile {
    pub full_name: String,
    pub position: Option<String>,
    pub department: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub join_date: Option<NaiveDate>,
}

#[derive(Debug, Clone)]
pub struct NewEmployee {
    pub user_id: Option<u64>,
    pub profile: Profile,
    pub remaining_leave_days: Option<i32>,
}

impl Employee {
    pub fn apply_profile(&mut self, profile: Profile) {
        self.full_name = profile.full_name;
        self.position = profile.position;
        self.department = profile.department;
        self.phone = profile.phone;
        self.address = profile.address;
        self.date_of_birth = profile.date_of_birth;
        self.join_date = profile.join_date;
    }
}
