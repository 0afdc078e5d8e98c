use std::sync::Arc;

use crate::domain::auth::errors::AuthError;
use crate::domain::auth::models::ExternalProfile;
use crate::domain::auth::models::ProviderConfig;
use crate::domain::user::models::Credentials;
use crate::domain::user::models::DisplayName;
use crate::domain::user::models::ProfileFields;
use crate::domain::user::models::User;
use crate::domain::user::ports::UserRepository;

/// Maps a provider-verified identity onto a local account.
///
/// Resolution order:
/// 1. an account already carrying the external identity is used as-is;
/// 2. an account with the same email and no external identity gets linked;
/// 3. otherwise a new external-only account is created.
///
/// Email is the only linking key when no external identity matches, so the
/// provider must have verified it.
pub struct IdentityLinker<UR>
where
    UR: UserRepository,
{
    provider: ProviderConfig,
    users: Arc<UR>,
}

impl<UR> IdentityLinker<UR>
where
    UR: UserRepository,
{
    pub fn new(provider: ProviderConfig, users: Arc<UR>) -> Self {
        Self { provider, users }
    }

    pub fn provider(&self) -> &ProviderConfig {
        &self.provider
    }

    /// Resolve the profile to exactly one local user.
    ///
    /// # Errors
    /// * `IdentityConflict` - Email belongs to an account linked to another identity
    /// * `Unavailable` - Storage operation failed
    pub async fn resolve(&self, profile: ExternalProfile) -> Result<User, AuthError> {
        if let Some(user) = self.find_existing(&profile).await? {
            return Ok(user);
        }

        let name = DisplayName::from_external(&profile.display_name, &profile.email);
        let user = User::new(
            name,
            profile.email.clone(),
            Credentials::External {
                external_id: profile.external_id.clone(),
            },
            profile.picture_url.clone(),
        );

        match self.users.create(user).await {
            Ok(user) => {
                tracing::info!(
                    user_id = %user.id,
                    provider = %self.provider.name,
                    "Created account from external identity"
                );
                Ok(user)
            }
            // Lost a create race against a concurrent sign-in of the same person
            Err(err @ (AuthError::UserAlreadyExists | AuthError::IdentityConflict)) => {
                tracing::debug!(provider = %self.provider.name, "Create race, re-resolving");
                self.find_existing(&profile).await?.ok_or(match err {
                    AuthError::UserAlreadyExists => AuthError::IdentityConflict,
                    other => other,
                })
            }
            Err(err) => Err(err),
        }
    }

    async fn find_existing(&self, profile: &ExternalProfile) -> Result<Option<User>, AuthError> {
        if let Some(user) = self.users.find_by_external_id(&profile.external_id).await? {
            return Ok(Some(user));
        }

        let Some(user) = self.users.find_by_email(&profile.email).await? else {
            return Ok(None);
        };

        if user.external_id().is_some() {
            tracing::warn!(
                user_id = %user.id,
                provider = %self.provider.name,
                "Email already linked to a different external identity"
            );
            return Err(AuthError::IdentityConflict);
        }

        let linked = match self
            .users
            .link_external_identity(&user.id, &profile.external_id)
            .await?
        {
            Some(linked) => linked,
            // Someone linked it between our read and the conditional update
            None => {
                return self
                    .users
                    .find_by_external_id(&profile.external_id)
                    .await?
                    .map(Some)
                    .ok_or(AuthError::IdentityConflict);
            }
        };

        tracing::info!(
            user_id = %linked.id,
            provider = %self.provider.name,
            "Linked external identity to existing account"
        );

        match (&linked.profile_picture, &profile.picture_url) {
            (None, Some(picture)) => {
                let fields = ProfileFields {
                    name: None,
                    profile_picture: Some(picture.clone()),
                };
                self.users
                    .update_profile_fields(&linked.id, fields)
                    .await
                    .map(Some)
            }
            _ => Ok(Some(linked)),
        }
    }
}
