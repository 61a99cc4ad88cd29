//! Password and shared-secret key derivation functions.
//!
//! Every function here is a pure function of its inputs; nothing is cached
//! between calls.

pub mod iso18033;
pub mod pbkdf1;
pub mod pbkdf2;
pub mod scrypt;

pub use iso18033::{kdf1, kdf2};
pub use pbkdf1::{pbkdf1, pbkdf1_key_and_iv};
pub use pbkdf2::pbkdf2_hmac;
pub use scrypt::{scrypt, ScryptParams};
