pub mod credentials;
pub mod prompt;
