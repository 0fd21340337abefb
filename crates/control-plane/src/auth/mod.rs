// Authentication module
//
// Password login issuing stateless session tokens, plus the two request
// guards (session token, shared API key) protecting mutating routes.

pub mod config;
pub mod jwt;
pub mod middleware;
pub mod password;
pub mod routes;
pub mod session;

pub use config::{AuthConfig, JwtConfig};
pub use jwt::JwtService;
pub use middleware::{ApiKeyGuard, AuthError, AuthState, AuthUser, API_KEY_HEADER};
pub use routes::routes;
pub use session::{Identity, SessionIssuer};
