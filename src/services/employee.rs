use super::{Page, Paging, check_len, require_text};
use crate::auth::password::{hash_password, validate_password};
use crate::auth::auth::AuthUser;
use crate::error::{AppError, AppResult};
use crate::model::{
    employee::{Employee, NewEmployee, Profile},
    role::Role,
    user::{NewUser, normalize_email},
};
use crate::storage::{IMAGE_EXTENSIONS, Storage, Upload};
use crate::store::{EmployeeRepo, Store, Tx, UserRepo};
use crate::utils::email_index::EmailIndex;

/// Field limits mirror the column sizes.
pub fn validate_profile(profile: &Profile) -> AppResult<()> {
    require_text("Full name", &profile.full_name, 200)?;
    check_len("Position", profile.position.as_deref(), 120)?;
    check_len("Department", profile.department.as_deref(), 120)?;
    check_len("Phone", profile.phone.as_deref(), 50)?;
    check_len("Address", profile.address.as_deref(), 255)?;
    Ok(())
}

pub fn validate_email(email: &str) -> AppResult<String> {
    let email = normalize_email(email);
    let valid = match email.split_once('@') {
        Some((local, domain)) => !local.is_empty() && !domain.is_empty() && !domain.contains('@'),
        None => false,
    };
    if !valid || email.chars().count() > 190 {
        return Err(AppError::validation("A valid email is required"));
    }
    Ok(email)
}

fn validate_balance(balance: Option<i32>) -> AppResult<()> {
    match balance {
        Some(days) if days < 0 => Err(AppError::validation("Remaining leave days must not be negative")),
        _ => Ok(()),
    }
}

#[derive(Debug, Clone)]
pub struct NewEmployeeAccount {
    pub email: String,
    pub password: String,
    pub role: Option<Role>,
    pub profile: Profile,
    pub remaining_leave_days: Option<i32>,
}

pub struct Directory<'a, S> {
    store: &'a S,
    storage: &'a Storage,
}

impl<'a, S: Store> Directory<'a, S> {
    pub fn new(store: &'a S, storage: &'a Storage) -> Self {
        Self { store, storage }
    }

    /// The caller's profile. Admins without one get a default profile on first use.
    pub async fn ensure_profile(&self, user: &AuthUser) -> AppResult<Employee> {
        let mut tx = self.store.begin().await?;
        if let Some(existing) = tx.find_employee_by_user(user.user_id).await? {
            return Ok(existing);
        }
        if user.role != Role::Admin {
            return Err(AppError::NotFound(format!(
                "Employee profile not found for user {}",
                user.user_id
            )));
        }

        let created = tx
            .insert_employee(NewEmployee {
                user_id: Some(user.user_id),
                profile: Profile {
                    full_name: "Administrator".into(),
                    position: Some("Administrator".into()),
                    department: Some("Administration".into()),
                    ..Profile::default()
                },
                remaining_leave_days: None,
            })
            .await?;
        tx.commit().await?;
        tracing::info!(user_id = user.user_id, employee_id = created.id, "Provisioned admin profile");
        Ok(created)
    }

    pub async fn list(&self) -> AppResult<Vec<Employee>> {
        let mut tx = self.store.begin().await?;
        tx.list_employees().await
    }

    pub async fn list_paged(&self, paging: Paging) -> AppResult<Page<Employee>> {
        let mut tx = self.store.begin().await?;
        let total = tx.count_employees().await?;
        let items = tx.list_employees_page(paging.per_page, paging.offset()).await?;
        Ok(Page { items, paging, total })
    }

    pub async fn get(&self, id: u64) -> AppResult<Employee> {
        let mut tx = self.store.begin().await?;
        tx.find_employee(id)
            .await?
            .ok_or_else(|| AppError::not_found("Employee", id))
    }

    /// Creates the account and its profile together.
    pub async fn create(&self, input: NewEmployeeAccount, emails: &EmailIndex) -> AppResult<Employee> {
        let email = validate_email(&input.email)?;
        validate_password(&input.password)?;
        validate_profile(&input.profile)?;
        validate_balance(input.remaining_leave_days)?;

        let mut tx = self.store.begin().await?;
        if !emails.is_available(&email, &mut tx).await? {
            return Err(AppError::Conflict("Email already registered".into()));
        }

        let user = tx
            .insert_user(NewUser {
                email: email.clone(),
                password_hash: hash_password(&input.password)?,
                role: input.role.unwrap_or(Role::Employee),
            })
            .await?;
        let employee = tx
            .insert_employee(NewEmployee {
                user_id: Some(user.id),
                profile: input.profile,
                remaining_leave_days: input.remaining_leave_days,
            })
            .await?;
        tx.commit().await?;
        emails.mark_taken(&email).await;

        tracing::info!(employee_id = employee.id, user_id = user.id, role = %user.role, "Employee created");
        Ok(employee)
    }

    /// Admin edit. The leave balance is only touched when provided.
    pub async fn update(&self, id: u64, profile: Profile, remaining_leave_days: Option<i32>) -> AppResult<Employee> {
        validate_profile(&profile)?;
        validate_balance(remaining_leave_days)?;

        let mut tx = self.store.begin().await?;
        let mut employee = tx
            .lock_employee(id)
            .await?
            .ok_or_else(|| AppError::not_found("Employee", id))?;
        employee.apply_profile(profile);
        if remaining_leave_days.is_some() {
            employee.remaining_leave_days = remaining_leave_days;
        }
        let saved = tx.save_employee(&employee).await?;
        tx.commit().await?;
        Ok(saved)
    }

    /// Removes the profile and its login.
    pub async fn delete(&self, id: u64, emails: &EmailIndex) -> AppResult<()> {
        let mut tx = self.store.begin().await?;
        let employee = tx
            .find_employee(id)
            .await?
            .ok_or_else(|| AppError::not_found("Employee", id))?;
        tx.delete_employee(id).await?;
        if let Some(user_id) = employee.user_id {
            tx.delete_user(user_id).await?;
        }
        tx.commit().await?;

        if let Some(email) = &employee.email {
            emails.forget(email).await;
        }
        if let Some(photo) = &employee.profile_photo_path {
            self.storage.delete_best_effort(photo).await;
        }
        tracing::info!(employee_id = id, "Employee deleted");
        Ok(())
    }

    /// Self-service edit; creates the profile when the caller has none yet.
    pub async fn upsert_self(&self, user: &AuthUser, profile: Profile) -> AppResult<Employee> {
        validate_profile(&profile)?;

        let mut tx = self.store.begin().await?;
        let saved = match tx.find_employee_by_user(user.user_id).await? {
            Some(mut employee) => {
                employee.apply_profile(profile);
                tx.save_employee(&employee).await?
            }
            None => {
                tx.insert_employee(NewEmployee {
                    user_id: Some(user.user_id),
                    profile,
                    remaining_leave_days: None,
                })
                .await?
            }
        };
        tx.commit().await?;
        Ok(saved)
    }

    pub async fn change_password(&self, user: &AuthUser, new_password: &str) -> AppResult<()> {
        validate_password(new_password)?;
        let hash = hash_password(new_password)?;

        let mut tx = self.store.begin().await?;
        if tx.find_user(user.user_id).await?.is_none() {
            return Err(AppError::Unauthorized("Account no longer exists".into()));
        }
        tx.update_password(user.user_id, &hash).await?;
        tx.commit().await?;
        tracing::info!(user_id = user.user_id, "Password changed");
        Ok(())
    }

    pub async fn upload_profile_photo(&self, user: &AuthUser, upload: Upload) -> AppResult<Employee> {
        upload.require_extension(
            IMAGE_EXTENSIONS,
            "Only JPG, JPEG, PNG images allowed for profile photo",
        )?;
        let employee = self.ensure_profile(user).await?;

        let path = self
            .storage
            .store(&upload, &format!("profile-photos/{}", employee.id))
            .await?;

        let saved = async {
            let mut tx = self.store.begin().await?;
            let mut current = tx
                .lock_employee(employee.id)
                .await?
                .ok_or_else(|| AppError::not_found("Employee", employee.id))?;
            let previous = current.profile_photo_path.replace(path.clone());
            let saved = tx.save_employee(&current).await?;
            tx.commit().await?;
            Ok::<_, AppError>((saved, previous))
        }
        .await;

        match saved {
            Ok((saved, previous)) => {
                if let Some(old) = previous.filter(|p| !p.trim().is_empty()) {
                    self.storage.delete_best_effort(&old).await;
                }
                Ok(saved)
            }
            Err(e) => {
                self.storage.delete_best_effort(&path).await;
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing::{Fixture, upload};

    fn auth(user_id: u64, role: Role) -> AuthUser {
        AuthUser {
            user_id,
            role,
        }
    }

    fn new_account(email: &str) -> NewEmployeeAccount {
        NewEmployeeAccount {
            email: email.into(),
            password: "password123".into(),
            role: None,
            profile: Profile {
                full_name: "Lina".into(),
                position: Some("Engineer".into()),
                ..Profile::default()
            },
            remaining_leave_days: Some(12),
        }
    }

    #[tokio::test]
    async fn admin_profile_is_provisioned_once() {
        let fx = Fixture::new();
        let admin = fx.account("root@corp.test", Role::Admin).await;
        let directory = Directory::new(&fx.store, &fx.storage);

        let first = directory.ensure_profile(&auth(admin.id, Role::Admin)).await.unwrap();
        let second = directory.ensure_profile(&auth(admin.id, Role::Admin)).await.unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(first.full_name, "Administrator");
        assert_eq!(first.department.as_deref(), Some("Administration"));
        assert_eq!(directory.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn employee_without_profile_is_not_found() {
        let fx = Fixture::new();
        let user = fx.account("nobody@corp.test", Role::Employee).await;
        let directory = Directory::new(&fx.store, &fx.storage);
        assert!(matches!(
            directory.ensure_profile(&auth(user.id, Role::Employee)).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn create_links_account_and_rejects_duplicates() {
        let fx = Fixture::new();
        let emails = EmailIndex::new();
        let directory = Directory::new(&fx.store, &fx.storage);

        let created = directory.create(new_account(" Lina@Corp.TEST "), &emails).await.unwrap();
        assert_eq!(created.email.as_deref(), Some("lina@corp.test"));
        assert_eq!(created.remaining_leave_days, Some(12));

        let dup = directory.create(new_account("lina@corp.test"), &emails).await;
        assert!(matches!(dup, Err(AppError::Conflict(_))));

        let mut short = new_account("other@corp.test");
        short.password = "short".into();
        assert!(matches!(
            directory.create(short, &emails).await,
            Err(AppError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn update_keeps_balance_unless_given() {
        let fx = Fixture::new();
        let emp = fx.employee("Maya", Some(10)).await;
        let directory = Directory::new(&fx.store, &fx.storage);

        let profile = Profile {
            full_name: "Maya Putri".into(),
            phone: Some("+62 811".into()),
            ..Profile::default()
        };
        let updated = directory.update(emp.id, profile.clone(), None).await.unwrap();
        assert_eq!(updated.full_name, "Maya Putri");
        assert_eq!(updated.remaining_leave_days, Some(10));

        let updated = directory.update(emp.id, profile.clone(), Some(4)).await.unwrap();
        assert_eq!(updated.remaining_leave_days, Some(4));

        assert!(matches!(
            directory.update(emp.id, profile.clone(), Some(-1)).await,
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            directory.update(424242, profile, None).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn delete_removes_account_too() {
        let fx = Fixture::new();
        let emails = EmailIndex::new();
        let directory = Directory::new(&fx.store, &fx.storage);
        let created = directory.create(new_account("gone@corp.test"), &emails).await.unwrap();

        directory.delete(created.id, &emails).await.unwrap();
        assert!(matches!(directory.get(created.id).await, Err(AppError::NotFound(_))));

        let mut tx = fx.store.begin().await.unwrap();
        assert!(tx.find_user_by_email("gone@corp.test").await.unwrap().is_none());
        drop(tx);

        // The address can be reused afterwards.
        directory.create(new_account("gone@corp.test"), &emails).await.unwrap();
    }

    #[tokio::test]
    async fn upsert_self_creates_then_updates() {
        let fx = Fixture::new();
        let user = fx.account("new@corp.test", Role::Employee).await;
        let me = auth(user.id, Role::Employee);
        let directory = Directory::new(&fx.store, &fx.storage);

        let created = directory
            .upsert_self(&me, Profile { full_name: "Nina".into(), ..Profile::default() })
            .await
            .unwrap();
        let updated = directory
            .upsert_self(&me, Profile { full_name: "Nina K".into(), ..Profile::default() })
            .await
            .unwrap();
        assert_eq!(created.id, updated.id);
        assert_eq!(updated.full_name, "Nina K");

        assert!(matches!(
            directory.upsert_self(&me, Profile::default()).await,
            Err(AppError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn password_change_is_persisted() {
        let fx = Fixture::new();
        let user = fx.account("pw@corp.test", Role::Employee).await;
        let directory = Directory::new(&fx.store, &fx.storage);

        directory
            .change_password(&auth(user.id, Role::Employee), "a-new-password")
            .await
            .unwrap();

        let mut tx = fx.store.begin().await.unwrap();
        let stored = tx.find_user(user.id).await.unwrap().unwrap();
        assert!(crate::auth::password::verify_password("a-new-password", &stored.password_hash));
    }

    #[tokio::test]
    async fn profile_photo_replaces_previous_file() {
        let fx = Fixture::new();
        let emp = fx.employee("Oki", None).await;
        let me = auth(emp.user_id.unwrap(), Role::Employee);
        let directory = Directory::new(&fx.store, &fx.storage);

        assert!(matches!(
            directory.upload_profile_photo(&me, upload("me.gif", b"GIF89a")).await,
            Err(AppError::Validation(_))
        ));

        let first = directory.upload_profile_photo(&me, upload("me.png", b"png-1")).await.unwrap();
        let first_path = first.profile_photo_path.unwrap();
        let second = directory.upload_profile_photo(&me, upload("me.jpg", b"jpg-2")).await.unwrap();
        let second_path = second.profile_photo_path.unwrap();

        assert_ne!(first_path, second_path);
        assert!(fx.storage.read(&first_path).await.is_err());
        assert_eq!(fx.storage.read(&second_path).await.unwrap(), b"jpg-2");
    }
}
