pub mod gate;
pub mod password;
pub mod policy;
pub mod token;

pub use gate::Identity;
pub use password::{HashCost, PasswordHasher};
pub use token::{IssuedToken, SigningKey, TokenService};
