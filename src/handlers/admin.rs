use actix_web::{HttpResponse, Result, web};

use crate::error::AppError;
use crate::handlers::shared::ApiResponse;
use crate::services::{ProvisioningService, UserContext};

/// Gives every user a personal project and moves their orphan tasks into it
pub async fn repair_orphans(
    ctx: UserContext,
    provisioning: web::Data<ProvisioningService>,
) -> Result<HttpResponse> {
    ctx.requires_admin()?;
    log::info!("Orphan repair requested by admin {}", ctx.user_id());

    let summary = provisioning.repair_all().await.map_err(|e| {
        log::error!("Orphan repair failed: {}", e);
        AppError::from(e)
    })?;

    Ok(ApiResponse::success(summary))
}
