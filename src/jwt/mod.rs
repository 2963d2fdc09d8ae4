//! RS256 bearer token validation.

pub mod claims;
pub mod token;
pub mod validator;

pub use claims::Claims;
pub use token::{SignatureValidated, Token, TokenState, Unvalidated, Validated};
pub use validator::TokenValidator;
