use std::fmt;
use std::str::FromStr;

use chrono::DateTime;
use chrono::Utc;
use uuid::Uuid;

use crate::domain::user::errors::DisplayNameError;
use crate::domain::user::errors::EmailError;
use crate::domain::user::errors::ExternalIdError;
use crate::domain::user::errors::MissingCredentialsError;
use crate::domain::user::errors::PasswordPolicyError;
use crate::domain::user::errors::UserIdError;

/// User aggregate entity.
///
/// Represents an account that can authenticate by password, by an external
/// identity provider, or both.
#[derive(Debug, Clone)]
pub struct User {
    pub id: UserId,
    pub name: DisplayName,
    pub email: EmailAddress,
    pub credentials: Credentials,
    pub profile_picture: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Build a new, active user stamped with the current time.
    pub fn new(
        name: DisplayName,
        email: EmailAddress,
        credentials: Credentials,
        profile_picture: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: UserId::new(),
            name,
            email,
            credentials,
            profile_picture,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn password_hash(&self) -> Option<&str> {
        self.credentials.password_hash()
    }

    pub fn external_id(&self) -> Option<&ExternalId> {
        self.credentials.external_id()
    }

    /// Sanitized view safe to hand to callers.
    pub fn profile(&self) -> UserProfile {
        UserProfile {
            id: self.id,
            name: self.name.as_str().to_string(),
            email: self.email.as_str().to_string(),
            profile_picture: self.profile_picture.clone(),
            is_active: self.is_active,
            has_password: self.password_hash().is_some(),
            has_external_identity: self.external_id().is_some(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// User data without secrets: no password digest, no refresh tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserProfile {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub profile_picture: Option<String>,
    pub is_active: bool,
    pub has_password: bool,
    pub has_external_identity: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// How a user authenticates. There is no variant without any method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credentials {
    Password {
        password_hash: String,
    },
    External {
        external_id: ExternalId,
    },
    Dual {
        password_hash: String,
        external_id: ExternalId,
    },
}

impl Credentials {
    /// Rebuild credentials from nullable storage columns.
    ///
    /// # Errors
    /// * `MissingCredentialsError` - Both columns are empty
    pub fn from_parts(
        password_hash: Option<String>,
        external_id: Option<ExternalId>,
    ) -> Result<Self, MissingCredentialsError> {
        match (password_hash, external_id) {
            (Some(password_hash), Some(external_id)) => Ok(Credentials::Dual {
                password_hash,
                external_id,
            }),
            (Some(password_hash), None) => Ok(Credentials::Password { password_hash }),
            (None, Some(external_id)) => Ok(Credentials::External { external_id }),
            (None, None) => Err(MissingCredentialsError),
        }
    }

    pub fn password_hash(&self) -> Option<&str> {
        match self {
            Credentials::Password { password_hash } | Credentials::Dual { password_hash, .. } => {
                Some(password_hash)
            }
            Credentials::External { .. } => None,
        }
    }

    pub fn external_id(&self) -> Option<&ExternalId> {
        match self {
            Credentials::External { external_id } | Credentials::Dual { external_id, .. } => {
                Some(external_id)
            }
            Credentials::Password { .. } => None,
        }
    }

    /// Attach an external identity, keeping any password.
    pub fn with_external_id(self, external_id: ExternalId) -> Self {
        match self {
            Credentials::Password { password_hash } | Credentials::Dual { password_hash, .. } => {
                Credentials::Dual {
                    password_hash,
                    external_id,
                }
            }
            Credentials::External { .. } => Credentials::External { external_id },
        }
    }

    /// Set or replace the password digest, keeping any external identity.
    pub fn with_password_hash(self, password_hash: String) -> Self {
        match self {
            Credentials::External { external_id } | Credentials::Dual { external_id, .. } => {
                Credentials::Dual {
                    password_hash,
                    external_id,
                }
            }
            Credentials::Password { .. } => Credentials::Password { password_hash },
        }
    }
}

/// User unique identifier type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UserId(pub Uuid);

impl UserId {
    /// Generate a new random user ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse a user ID from string.
    ///
    /// # Errors
    /// * `InvalidFormat` - String is not a valid UUID
    pub fn from_string(s: &str) -> Result<Self, UserIdError> {
        Uuid::parse_str(s)
            .map(UserId)
            .map_err(|e| UserIdError::InvalidFormat(e.to_string()))
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Company identifier, owned by the company service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CompanyId(pub Uuid);

impl CompanyId {
    pub fn from_string(s: &str) -> Result<Self, UserIdError> {
        Uuid::parse_str(s)
            .map(CompanyId)
            .map_err(|e| UserIdError::InvalidFormat(e.to_string()))
    }
}

impl fmt::Display for CompanyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Display name value type
///
/// Trimmed, 1-50 characters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayName(String);

impl DisplayName {
    const MAX_LENGTH: usize = 50;

    /// Create a new valid display name.
    ///
    /// # Errors
    /// * `Empty` - Nothing left after trimming
    /// * `TooLong` - More than 50 characters
    pub fn new(name: String) -> Result<Self, DisplayNameError> {
        let name = name.trim().to_string();
        let length = name.chars().count();
        if length == 0 {
            Err(DisplayNameError::Empty)
        } else if length > Self::MAX_LENGTH {
            Err(DisplayNameError::TooLong {
                max: Self::MAX_LENGTH,
                actual: length,
            })
        } else {
            Ok(Self(name))
        }
    }

    /// Name from an external profile, truncated rather than rejected.
    ///
    /// Falls back to the local part of the email when the provider sends no
    /// usable name.
    pub fn from_external(name: &str, email: &EmailAddress) -> Self {
        let truncated: String = name.trim().chars().take(Self::MAX_LENGTH).collect();
        if truncated.is_empty() {
            let local: String = email
                .as_str()
                .split('@')
                .next()
                .unwrap_or("user")
                .chars()
                .take(Self::MAX_LENGTH)
                .collect();
            Self(local)
        } else {
            Self(truncated)
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DisplayName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Email address type
///
/// Validated with an RFC 5322 parser and normalised to lower case, so equality
/// is case-insensitive.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Create a new validated email address.
    ///
    /// # Errors
    /// * `InvalidFormat` - Email does not conform to RFC 5322
    pub fn new(email: String) -> Result<Self, EmailError> {
        let normalized = email.trim().to_lowercase();
        email_address::EmailAddress::from_str(&normalized)
            .map(|_| EmailAddress(normalized))
            .map_err(|e| EmailError::InvalidFormat(e.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Subject identifier issued by an external identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ExternalId(String);

impl ExternalId {
    const MAX_LENGTH: usize = 255;

    pub fn new(id: String) -> Result<Self, ExternalIdError> {
        let id = id.trim().to_string();
        if id.is_empty() {
            Err(ExternalIdError::Empty)
        } else if id.len() > Self::MAX_LENGTH {
            Err(ExternalIdError::TooLong {
                max: Self::MAX_LENGTH,
                actual: id.len(),
            })
        } else {
            Ok(Self(id))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ExternalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Plaintext password accepted from a client.
///
/// Only ever handed to the password hasher; `Debug` never prints it.
#[derive(Clone, PartialEq, Eq)]
pub struct Password(String);

impl Password {
    pub const MIN_LENGTH: usize = 6;
    pub const MAX_LENGTH: usize = 128;

    /// Accept a new password, enforcing the length policy.
    ///
    /// # Errors
    /// * `TooShort` - Fewer than 6 characters
    /// * `TooLong` - More than 128 characters
    pub fn new(password: String) -> Result<Self, PasswordPolicyError> {
        let length = password.chars().count();
        if length < Self::MIN_LENGTH {
            Err(PasswordPolicyError::TooShort {
                min: Self::MIN_LENGTH,
                actual: length,
            })
        } else if length > Self::MAX_LENGTH {
            Err(PasswordPolicyError::TooLong {
                max: Self::MAX_LENGTH,
                actual: length,
            })
        } else {
            Ok(Self(password))
        }
    }

    /// Wrap a password presented for verification.
    ///
    /// No policy check: login must answer "invalid credentials" for a short
    /// password, not "password too short".
    pub fn for_verification(password: String) -> Self {
        Self(password)
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Password(<redacted>)")
    }
}

/// Profile fields that may be changed without touching credentials.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileFields {
    pub name: Option<DisplayName>,
    pub profile_picture: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn external(id: &str) -> ExternalId {
        ExternalId::new(id.to_string()).unwrap()
    }

    #[test]
    fn test_email_is_normalized() {
        let email = EmailAddress::new("  Alice@Example.COM ".to_string()).unwrap();
        assert_eq!(email.as_str(), "alice@example.com");
        assert_eq!(
            email,
            EmailAddress::new("alice@example.com".to_string()).unwrap()
        );
    }

    #[test]
    fn test_email_invalid() {
        assert!(matches!(
            EmailAddress::new("not-an-email".to_string()),
            Err(EmailError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_display_name_bounds() {
        assert_eq!(
            DisplayName::new("   ".to_string()),
            Err(DisplayNameError::Empty)
        );
        assert_eq!(
            DisplayName::new("a".repeat(51)),
            Err(DisplayNameError::TooLong {
                max: 50,
                actual: 51
            })
        );
        assert_eq!(
            DisplayName::new("  Ada Lovelace ".to_string())
                .unwrap()
                .as_str(),
            "Ada Lovelace"
        );
    }

    #[test]
    fn test_display_name_from_external_falls_back_to_email() {
        let email = EmailAddress::new("grace@example.com".to_string()).unwrap();
        assert_eq!(DisplayName::from_external("", &email).as_str(), "grace");
        assert_eq!(
            DisplayName::from_external(&"x".repeat(80), &email)
                .as_str()
                .len(),
            50
        );
    }

    #[test]
    fn test_password_policy() {
        assert!(matches!(
            Password::new("12345".to_string()),
            Err(PasswordPolicyError::TooShort { min: 6, actual: 5 })
        ));
        assert!(Password::new("123456".to_string()).is_ok());
        assert!(matches!(
            Password::new("p".repeat(129)),
            Err(PasswordPolicyError::TooLong { .. })
        ));
    }

    #[test]
    fn test_password_debug_is_redacted() {
        let password = Password::new("super-secret".to_string()).unwrap();
        assert!(!format!("{:?}", password).contains("super-secret"));
    }

    #[test]
    fn test_credentials_from_parts() {
        assert_eq!(
            Credentials::from_parts(None, None),
            Err(MissingCredentialsError)
        );
        assert!(matches!(
            Credentials::from_parts(Some("h".to_string()), None),
            Ok(Credentials::Password { .. })
        ));
        assert!(matches!(
            Credentials::from_parts(None, Some(external("g-1"))),
            Ok(Credentials::External { .. })
        ));
        assert!(matches!(
            Credentials::from_parts(Some("h".to_string()), Some(external("g-1"))),
            Ok(Credentials::Dual { .. })
        ));
    }

    #[test]
    fn test_linking_keeps_password() {
        let credentials = Credentials::Password {
            password_hash: "$argon2id$hash".to_string(),
        }
        .with_external_id(external("google-42"));

        assert_eq!(credentials.password_hash(), Some("$argon2id$hash"));
        assert_eq!(credentials.external_id(), Some(&external("google-42")));
    }

    #[test]
    fn test_setting_password_keeps_external_identity() {
        let credentials = Credentials::External {
            external_id: external("google-42"),
        }
        .with_password_hash("$argon2id$new".to_string());

        assert!(matches!(credentials, Credentials::Dual { .. }));
        assert_eq!(credentials.external_id(), Some(&external("google-42")));
    }

    #[test]
    fn test_profile_is_sanitized() {
        let user = User::new(
            DisplayName::new("Ada".to_string()).unwrap(),
            EmailAddress::new("ada@example.com".to_string()).unwrap(),
            Credentials::Password {
                password_hash: "$argon2id$secret".to_string(),
            },
            None,
        );

        let profile = user.profile();
        assert!(profile.has_password);
        assert!(!profile.has_external_identity);
        assert!(!format!("{:?}", profile).contains("$argon2id$secret"));
    }
}
