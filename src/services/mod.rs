// Services module for the auth core
// Business logic layer: token signing, revocation index, verification,
// sessions, credentials and device tokens

pub mod credentials;
pub mod device_tokens;
pub mod session;
pub mod token_index;
pub mod tokens;
pub mod verifier;

// Re-export commonly used services
pub use credentials::{CredentialService, RegistrationInput, UpdateUserInput};
pub use device_tokens::DeviceTokenService;
pub use session::SessionService;
pub use token_index::{TokenIndex, TokenIndexError};
pub use tokens::{SessionTokens, TokenConfig, TokenError, TokenService};
pub use verifier::Verifier;
