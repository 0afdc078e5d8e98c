use std::sync::Arc;

use tonic::Request;
use tonic::Response;
use tonic::Status;

use super::handlers::get_profile;
use super::handlers::verify_access_token;
use crate::domain::auth::ports::AuthServicePort;
use crate::proto::identity_service_server::IdentityService as IdentityServiceProto;
use crate::proto::GetProfileRequest;
use crate::proto::GetProfileResponse;
use crate::proto::VerifyAccessTokenRequest;
use crate::proto::VerifyAccessTokenResponse;

pub struct IdentityGrpcService {
    service: Arc<dyn AuthServicePort>,
}

impl IdentityGrpcService {
    pub fn new(service: Arc<dyn AuthServicePort>) -> Self {
        Self { service }
    }
}

#[tonic::async_trait]
impl IdentityServiceProto for IdentityGrpcService {
    async fn verify_access_token(
        &self,
        request: Request<VerifyAccessTokenRequest>,
    ) -> Result<Response<VerifyAccessTokenResponse>, Status> {
        let response =
            verify_access_token::verify_access_token(self.service.clone(), request.into_inner())
                .await?;
        Ok(Response::new(response))
    }

    async fn get_profile(
        &self,
        request: Request<GetProfileRequest>,
    ) -> Result<Response<GetProfileResponse>, Status> {
        let response = get_profile::get_profile(self.service.clone(), request.into_inner()).await?;
        Ok(Response::new(response))
    }
}
