use serde::{Deserialize, Serialize};

/// Registered user as held by the credential store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub username: String,      // unique key
    pub email: String,         // contact address, not validated
    #[serde(skip_serializing)]
    pub password_hash: String, // Argon2 PHC string, not exposed in JSON
}
