//! Row types exchanged with the credential table.
//!
//! Tokens are the URL-safe base64 ciphertexts produced by
//! `crypto::encrypt`; the store never sees plaintext usernames or
//! passwords.

/// One stored credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialRow {
    /// Plaintext site identifier (e.g. "github.com").
    pub site: String,
    /// Salt that, with the root password, derives the key for both tokens.
    pub salt: Vec<u8>,
    /// Encrypted username.
    pub username_token: String,
    /// Encrypted password.
    pub password_token: String,
}

/// Username half of a row, as returned by a per-site scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsernameRow {
    pub username_token: String,
    pub salt: Vec<u8>,
}

/// Password half of a row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordRow {
    pub password_token: String,
    pub salt: Vec<u8>,
}
