mod extractor;
mod tokens;

pub use extractor::AuthUser;
pub use tokens::{SessionVerifier, StaticTokenVerifier};
