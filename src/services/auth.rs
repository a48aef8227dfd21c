use super::employee::validate_email;
use crate::auth::jwt::generate_access_token;
use crate::auth::password::{hash_password, validate_password, verify_password};
use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::model::{role::Role, user::{NewUser, UserAccount, normalize_email}};
use crate::store::{Store, Tx, UserRepo};
use crate::utils::email_index::EmailIndex;
use crate::utils::token_blacklist::TokenBlacklist;

#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub access_token: String,
    pub email: String,
    pub role: Role,
}

pub struct Accounts<'a, S> {
    store: &'a S,
    emails: &'a EmailIndex,
    blacklist: &'a TokenBlacklist,
    config: &'a Config,
}

impl<'a, S: Store> Accounts<'a, S> {
    pub fn new(
        store: &'a S,
        emails: &'a EmailIndex,
        blacklist: &'a TokenBlacklist,
        config: &'a Config,
    ) -> Self {
        Self {
            store,
            emails,
            blacklist,
            config,
        }
    }

    /// Self sign-up; always creates an EMPLOYEE account.
    pub async fn register(&self, email: &str, password: &str) -> AppResult<IssuedToken> {
        let email = validate_email(email)?;
        validate_password(password)?;

        let mut tx = self.store.begin().await?;
        if !self.emails.is_available(&email, &mut tx).await? {
            tracing::info!(email = %email, "Registration rejected: email taken");
            return Err(AppError::Conflict("Email already registered".into()));
        }

        let user = tx
            .insert_user(NewUser {
                email: email.clone(),
                password_hash: hash_password(password)?,
                role: Role::Employee,
            })
            .await?;
        tx.commit().await?;
        self.emails.mark_taken(&email).await;

        tracing::info!(user_id = user.id, "User registered");
        self.issue(&user)
    }

    pub async fn login(&self, email: &str, password: &str) -> AppResult<IssuedToken> {
        let invalid = || AppError::Unauthorized("Invalid email or password".into());
        let email = normalize_email(email);
        if email.is_empty() || password.is_empty() {
            return Err(invalid());
        }

        let mut tx = self.store.begin().await?;
        let Some(user) = tx.find_user_by_email(&email).await? else {
            tracing::info!("Invalid credentials: user not found");
            return Err(invalid());
        };
        drop(tx);

        if !verify_password(password, &user.password_hash) {
            tracing::info!(user_id = user.id, "Invalid credentials: password mismatch");
            return Err(invalid());
        }

        tracing::info!(user_id = user.id, "Login successful");
        self.issue(&user)
    }

    pub async fn logout(&self, token: &str) {
        self.blacklist.revoke(token).await;
        tracing::debug!("Token revoked");
    }

    fn issue(&self, user: &UserAccount) -> AppResult<IssuedToken> {
        let access_token = generate_access_token(
            user.id,
            &user.email,
            user.role,
            &self.config.jwt_secret,
            self.config.access_token_ttl,
        )?;
        Ok(IssuedToken {
            access_token,
            email: user.email.clone(),
            role: user.role,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::verify_token;
    use crate::services::testing::Fixture;
    use std::time::Duration;

    fn config() -> Config {
        Config::from_lookup(|key| match key {
            "DATABASE_URL" => Some("mysql://unused".into()),
            "JWT_SECRET" => Some("test-secret".into()),
            _ => None,
        })
        .unwrap()
    }

    #[tokio::test]
    async fn register_then_login() {
        let fx = Fixture::new();
        let (emails, blacklist, config) = (
            EmailIndex::new(),
            TokenBlacklist::new(Duration::from_secs(60)),
            config(),
        );
        let accounts = Accounts::new(&fx.store, &emails, &blacklist, &config);

        let registered = accounts.register(" Rina@Corp.test", "password123").await.unwrap();
        assert_eq!(registered.email, "rina@corp.test");
        assert_eq!(registered.role, Role::Employee);
        let claims = verify_token(&registered.access_token, "test-secret").unwrap();
        assert_eq!(claims.sub, "rina@corp.test");

        let logged_in = accounts.login("RINA@corp.test", "password123").await.unwrap();
        assert_eq!(logged_in.role, Role::Employee);

        assert!(matches!(
            accounts.register("rina@corp.test", "password123").await,
            Err(AppError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn bad_credentials_share_one_message() {
        let fx = Fixture::new();
        let (emails, blacklist, config) = (
            EmailIndex::new(),
            TokenBlacklist::new(Duration::from_secs(60)),
            config(),
        );
        let accounts = Accounts::new(&fx.store, &emails, &blacklist, &config);
        accounts.register("sam@corp.test", "password123").await.unwrap();

        let unknown = accounts.login("who@corp.test", "password123").await.unwrap_err();
        let wrong = accounts.login("sam@corp.test", "password999").await.unwrap_err();
        assert_eq!(unknown.to_string(), "Invalid email or password");
        assert_eq!(wrong.to_string(), unknown.to_string());
    }

    #[tokio::test]
    async fn register_validates_input() {
        let fx = Fixture::new();
        let (emails, blacklist, config) = (
            EmailIndex::new(),
            TokenBlacklist::new(Duration::from_secs(60)),
            config(),
        );
        let accounts = Accounts::new(&fx.store, &emails, &blacklist, &config);

        assert!(matches!(
            accounts.register("not-an-email", "password123").await,
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            accounts.register("ok@corp.test", "short").await,
            Err(AppError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn logout_revokes_token() {
        let fx = Fixture::new();
        let (emails, blacklist, config) = (
            EmailIndex::new(),
            TokenBlacklist::new(Duration::from_secs(60)),
            config(),
        );
        let accounts = Accounts::new(&fx.store, &emails, &blacklist, &config);
        let token = accounts.register("tia@corp.test", "password123").await.unwrap().access_token;

        assert!(!blacklist.is_revoked(&token));
        accounts.logout(&token).await;
        assert!(blacklist.is_revoked(&token));
    }
}
