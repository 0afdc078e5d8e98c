use std::sync::Arc;

use tonic::Status;

use crate::domain::auth::errors::AuthError;
use crate::domain::auth::ports::AuthServicePort;
use crate::domain::user::models::UserId;
use crate::proto::get_profile_response::Result as ProfileResult;
use crate::proto::GetProfileRequest;
use crate::proto::GetProfileResponse;

pub async fn get_profile(
    service: Arc<dyn AuthServicePort>,
    request: GetProfileRequest,
) -> Result<GetProfileResponse, Status> {
    let user_id = UserId::from_string(&request.user_id)
        .map_err(|e| Status::invalid_argument(format!("Invalid user ID: {}", e)))?;

    let result = match service.get_profile(&user_id).await {
        Ok(profile) => ProfileResult::Profile(profile.into()),
        Err(AuthError::Unavailable(msg)) => return Err(Status::unavailable(msg)),
        Err(e) => ProfileResult::Error(e.into()),
    };

    Ok(GetProfileResponse {
        result: Some(result),
    })
}
