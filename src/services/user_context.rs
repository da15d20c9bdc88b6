use actix_web::{FromRequest, HttpRequest, dev::Payload, web::Data};
use futures_util::future::LocalBoxFuture;

use crate::database::models::User;
use crate::database::repositories::UserRepository;
use crate::error::AppError;
use crate::services::auth::AuthService;

pub const API_KEY_HEADER: &str = "X-API-Key";

/// The authenticated caller, loaded fresh from the database on every request.
/// Accepts `Authorization: Bearer <jwt>` or an `X-API-Key` header.
#[derive(Debug, Clone)]
pub struct UserContext {
    pub user: User,
}

impl UserContext {
    pub fn user_id(&self) -> i32 {
        self.user.id
    }

    pub fn is_admin(&self) -> bool {
        self.user.is_admin()
    }

    pub fn requires_admin(&self) -> Result<(), AppError> {
        if self.is_admin() {
            Ok(())
        } else {
            log::warn!("User {} denied admin-only operation", self.user_id());
            Err(AppError::PermissionDenied(
                "Administrator access required".to_string(),
            ))
        }
    }

    pub fn requires_self_or_admin(&self, user_id: i32) -> Result<(), AppError> {
        if self.user_id() == user_id || self.is_admin() {
            Ok(())
        } else {
            log::warn!(
                "User {} denied access to account {}",
                self.user_id(),
                user_id
            );
            Err(AppError::PermissionDenied("Access denied".to_string()))
        }
    }
}

enum Credential {
    Bearer(String),
    ApiKey(String),
}

fn credential(req: &HttpRequest) -> Option<Credential> {
    let bearer = req
        .headers()
        .get("Authorization")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty());

    if let Some(token) = bearer {
        return Some(Credential::Bearer(token.to_string()));
    }

    req.headers()
        .get(API_KEY_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|key| !key.is_empty())
        .map(|key| Credential::ApiKey(key.to_string()))
}

impl FromRequest for UserContext {
    type Error = AppError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let credential = credential(req);
        let auth_service = req.app_data::<Data<AuthService>>().cloned();
        let user_repository = req.app_data::<Data<UserRepository>>().cloned();

        Box::pin(async move {
            let credential = credential
                .ok_or_else(|| AppError::Unauthorized("Authentication required".to_string()))?;

            let (Some(auth_service), Some(user_repository)) = (auth_service, user_repository)
            else {
                log::error!("Authentication services are not registered as app data");
                return Err(AppError::internal_server_error());
            };

            let user = match credential {
                Credential::Bearer(token) => {
                    let claims = auth_service.verify_token(&token).map_err(|e| {
                        log::debug!("Rejected bearer token: {}", e);
                        AppError::Unauthorized("Invalid or expired token".to_string())
                    })?;
                    user_repository.find_by_id(claims.user_id()).await?
                }
                Credential::ApiKey(key) => user_repository.find_by_api_key(&key).await?,
            };

            match user {
                Some(user) if user.is_active => Ok(UserContext { user }),
                Some(user) => {
                    log::warn!("Deactivated user {} attempted access", user.id);
                    Err(AppError::Unauthorized("Account is deactivated".to_string()))
                }
                None => Err(AppError::Unauthorized("Invalid credentials".to_string())),
            }
        })
    }
}
