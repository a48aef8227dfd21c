use actix_web::{FromRequest, HttpMessage, HttpRequest, dev::Payload};
use futures::future::{Ready, ready};

use crate::error::AppError;
use crate::model::role::Role;

/// The caller of a protected route, placed in request extensions by the auth middleware.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: u64,
    pub role: Role,
}

impl FromRequest for AuthUser {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(
            req.extensions()
                .get::<AuthUser>()
                .cloned()
                .ok_or_else(|| AppError::Unauthorized("Authentication required".into())),
        )
    }
}

impl AuthUser {
    pub fn require_admin(&self) -> Result<(), AppError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(AppError::Forbidden("Admin only".into()))
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    #[actix_web::test]
    async fn reads_user_from_extensions() {
        let req = TestRequest::default().to_http_request();
        req.extensions_mut().insert(AuthUser {
            user_id: 3,
            role: Role::Employee,
        });

        let user = AuthUser::extract(&req).await.unwrap();
        assert_eq!(user.user_id, 3);
        assert!(matches!(user.require_admin(), Err(AppError::Forbidden(_))));
    }

    #[actix_web::test]
    async fn missing_user_is_unauthorized() {
        let req = TestRequest::default().to_http_request();
        assert!(matches!(
            AuthUser::extract(&req).await,
            Err(AppError::Unauthorized(_))
        ));
    }
}
