//! Registration, login and token resolution on top of the store, hasher
//! and token service.

use std::sync::Arc;

use tracing::{info, instrument, warn};

use crate::{
    auth::{
        claims::SignedToken,
        errors::{AuthError, StoreError},
        jwt::TokenService,
        password::{hash_password, verify_decoy, verify_password},
        repo::CredentialStore,
        repo_types::UserRecord,
    },
    clock::Clock,
};

pub struct Authenticator {
    store: Arc<dyn CredentialStore>,
    tokens: TokenService,
    clock: Arc<dyn Clock>,
}

impl Authenticator {
    pub fn new(store: Arc<dyn CredentialStore>, tokens: TokenService, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            tokens,
            clock,
        }
    }

    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }

    pub fn store(&self) -> &dyn CredentialStore {
        self.store.as_ref()
    }

    #[instrument(skip(self, email, password))]
    pub fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<UserRecord, AuthError> {
        // Skip the hashing cost for the common duplicate case; `put` still decides.
        if self.store.contains(username) {
            warn!("username already registered");
            return Err(AuthError::AlreadyExists);
        }

        let record = UserRecord {
            username: username.to_owned(),
            email: email.to_owned(),
            password_hash: hash_password(password)?,
        };

        match self.store.put(record.clone()) {
            Ok(()) => {
                info!(email = %record.email, "user registered");
                Ok(record)
            }
            Err(StoreError::AlreadyExists(_)) => {
                warn!("username taken by a concurrent registration");
                Err(AuthError::AlreadyExists)
            }
            Err(e) => Err(anyhow::Error::from(e).into()),
        }
    }

    /// Unknown usernames and wrong passwords fail identically.
    #[instrument(skip(self, password))]
    pub fn login(&self, username: &str, password: &str) -> Result<SignedToken, AuthError> {
        let Ok(record) = self.store.get(username) else {
            verify_decoy(password);
            warn!("login unknown username");
            return Err(AuthError::InvalidCredentials);
        };

        if !verify_password(password, &record.password_hash) {
            warn!("login invalid password");
            return Err(AuthError::InvalidCredentials);
        }

        let token = self.tokens.issue(&record.username, self.clock.now())?;
        info!("user logged in");
        Ok(token)
    }

    /// Map a bearer token back to the user it was issued for.
    #[instrument(skip_all)]
    pub fn resolve_token(&self, token: &str) -> Result<UserRecord, AuthError> {
        let claims = self
            .tokens
            .validate(token, self.clock.now())
            .map_err(|reason| {
                warn!(%reason, "token rejected");
                AuthError::Unauthorized
            })?;

        self.store.get(&claims.sub).map_err(|e| {
            warn!(error = %e, sub = %claims.sub, "token subject no longer exists");
            AuthError::Unauthorized
        })
    }
}
