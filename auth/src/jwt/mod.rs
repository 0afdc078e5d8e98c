pub mod claims;
pub mod codec;
pub mod errors;
pub mod handler;

pub use claims::TokenClaims;
pub use claims::TokenKind;
pub use codec::IssuedToken;
pub use codec::TokenCodec;
pub use codec::TokenCodecConfig;
pub use errors::JwtError;
pub use handler::JwtHandler;
