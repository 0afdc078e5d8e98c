pub mod exchange_codes;
pub mod oauth;
pub mod repositories;
