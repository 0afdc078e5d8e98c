pub mod memory;
pub mod membership;
pub mod refresh_token;
pub mod user;

pub use memory::InMemoryMembershipChecker;
pub use memory::InMemoryRefreshTokenStore;
pub use memory::InMemoryUserRepository;
pub use membership::PostgresMembershipChecker;
pub use refresh_token::PostgresRefreshTokenStore;
pub use user::PostgresUserRepository;
