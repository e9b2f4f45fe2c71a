mod authentication;
mod card_operations;
mod credentials;

pub use authentication::*;
pub use card_operations::*;
pub use credentials::*;
