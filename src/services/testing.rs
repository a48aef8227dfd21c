use tempfile::TempDir;

use crate::model::{
    employee::{Employee, NewEmployee, Profile},
    role::Role,
    user::{NewUser, UserAccount},
};
use crate::storage::{Storage, Upload};
use crate::store::{EmployeeRepo, Store, Tx, UserRepo, memory::MemoryStore};

/// A memory store plus a throwaway upload directory.
pub struct Fixture {
    pub store: MemoryStore,
    pub storage: Storage,
    _dir: TempDir,
}

impl Fixture {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        Self {
            store: MemoryStore::new(),
            storage: Storage::new(dir.path()),
            _dir: dir,
        }
    }

    pub async fn account(&self, email: &str, role: Role) -> UserAccount {
        let mut tx = self.store.begin().await.unwrap();
        let user = tx
            .insert_user(NewUser {
                email: email.to_string(),
                password_hash: crate::auth::password::hash_password("password123").unwrap(),
                role,
            })
            .await
            .unwrap();
        tx.commit().await.unwrap();
        user
    }

    /// An EMPLOYEE account with a linked profile.
    pub async fn employee(&self, name: &str, balance: Option<i32>) -> Employee {
        let email = format!("{}@corp.test", name.to_lowercase().replace(' ', "."));
        let user = self.account(&email, Role::Employee).await;
        let mut tx = self.store.begin().await.unwrap();
        let employee = tx
            .insert_employee(NewEmployee {
                user_id: Some(user.id),
                profile: Profile {
                    full_name: name.to_string(),
                    ..Profile::default()
                },
                remaining_leave_days: balance,
            })
            .await
            .unwrap();
        tx.commit().await.unwrap();
        employee
    }

    pub async fn reload(&self, employee_id: u64) -> Employee {
        let mut tx = self.store.begin().await.unwrap();
        tx.find_employee(employee_id).await.unwrap().unwrap()
    }
}

pub fn upload(name: &str, bytes: &[u8]) -> Upload {
    Upload {
        filename: Some(name.to_string()),
        content_type: Some("application/octet-stream".to_string()),
        bytes: bytes.to_vec(),
    }
}
