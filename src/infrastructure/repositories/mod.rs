pub mod token_file_repository;

pub use token_file_repository::{CredentialRecord, TokenCacheError, TokenFileRepository};
