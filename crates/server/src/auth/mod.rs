pub mod jwt;
pub mod middleware;

pub use jwt::{Claims, JwtVerifier};
pub use middleware::AuthLayer;
