pub mod authorizor;
mod identity;
mod platform;
mod token;

pub use identity::Identity;
pub use platform::Platform;
pub use token::TokenAuthority;
