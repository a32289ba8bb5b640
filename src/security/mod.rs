pub mod jwt;
pub mod revocation;

pub use jwt::{Claims, TokenPurpose, TokenResponse, TokenService};
pub use revocation::RevocationSet;
