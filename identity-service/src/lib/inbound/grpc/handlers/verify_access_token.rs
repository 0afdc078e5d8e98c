use std::sync::Arc;

use tonic::Status;

use crate::domain::auth::errors::AuthError;
use crate::domain::auth::ports::AuthServicePort;
use crate::proto::verify_access_token_response::Result as VerifyResult;
use crate::proto::VerifyAccessTokenRequest;
use crate::proto::VerifyAccessTokenResponse;

/// Token failures travel in the response body; only infrastructure
/// failures become a gRPC status.
pub async fn verify_access_token(
    service: Arc<dyn AuthServicePort>,
    request: VerifyAccessTokenRequest,
) -> Result<VerifyAccessTokenResponse, Status> {
    let result = match service.verify_access_token(&request.access_token).await {
        Ok(user_id) => VerifyResult::UserId(user_id.to_string()),
        Err(AuthError::Unavailable(msg)) => return Err(Status::unavailable(msg)),
        Err(e) => VerifyResult::Error(e.into()),
    };

    Ok(VerifyAccessTokenResponse {
        result: Some(result),
    })
}
