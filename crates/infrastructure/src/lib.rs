//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod firebase_auth_directory;
mod google_access_token;
mod in_memory_user_directory;

pub use firebase_auth_directory::{
    FirebaseAuthConfig, FirebaseAuthDirectory, initialize_default_directory,
};
pub use in_memory_user_directory::InMemoryUserDirectory;
