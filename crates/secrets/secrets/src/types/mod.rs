mod algorithm;
mod code;
mod credential;
mod kind;
mod list_item;
mod properties;
mod select;
mod version;

pub use algorithm::Algorithm;
pub use code::{Code, challenge_totp};
pub use credential::Credential;
pub use kind::Kind;
pub use list_item::ListItem;
pub use properties::Properties;
pub use select::Select;
pub use version::Version;
