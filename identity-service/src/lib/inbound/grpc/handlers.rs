use crate::domain::auth::errors::AuthError;
use crate::domain::user::models::UserProfile;

pub mod get_profile;
pub mod verify_access_token;

impl From<UserProfile> for crate::proto::Profile {
    fn from(profile: UserProfile) -> Self {
        Self {
            id: profile.id.to_string(),
            name: profile.name,
            email: profile.email,
            profile_picture: profile.profile_picture,
            is_active: profile.is_active,
            has_password: profile.has_password,
            has_external_identity: profile.has_external_identity,
            created_at: profile.created_at.to_rfc3339(),
            updated_at: profile.updated_at.to_rfc3339(),
        }
    }
}

impl From<AuthError> for crate::proto::Error {
    fn from(err: AuthError) -> Self {
        Self {
            kind: err.kind().to_string(),
            class: err.class().as_str().to_string(),
            message: err.to_string(),
        }
    }
}
