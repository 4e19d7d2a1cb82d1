//! The credential records logins are checked against and signups are added to.
//! Only held in memory

use anyhow::Context as _;
use argon2::password_hash::SaltString;
use argon2::{Algorithm, Argon2, Params, PasswordHash, PasswordHasher, PasswordVerifier, Version};
use farm_shared::{
    telemetry::spawn_blocking_with_tracing,
    uac::{AuthError, Role, UserInfo},
};
use secrecy::{ExposeSecret, SecretString};
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

/// Verified against when the email is unknown so both failure paths cost the
/// same
const DUMMY_PASSWORD_HASH: &str = "$argon2id$v=19$m=15000,t=2,p=1$\
    gZiV/M1gPc22ElAH/Jh1Hw$\
    CWOrkoo7oJBQ/iyh7uJ0LO2aLEfrHwTWllSAxT0zRno";

#[derive(Debug, Clone)]
struct StoredCredential {
    user: UserInfo,
    password_hash: SecretString,
}

#[derive(Debug, Clone, Default)]
pub struct UserDirectory {
    records: Arc<Mutex<Vec<StoredCredential>>>,
}

struct SeedUser {
    id: &'static str,
    name: &'static str,
    email: &'static str,
    password: &'static str,
    role: Role,
}

const SEED_USERS: [SeedUser; 2] = [
    SeedUser {
        id: "550e8400-e29b-41d4-a716-446655440001",
        name: "Admin User",
        email: "admin@example.com",
        password: "admin123",
        role: Role::Admin,
    },
    SeedUser {
        id: "550e8400-e29b-41d4-a716-446655440002",
        name: "Standard User",
        email: "user@example.com",
        password: "user123",
        role: Role::Standard,
    },
];

impl UserDirectory {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Directory holding the demo admin and standard accounts
    #[tracing::instrument]
    pub fn with_seed_users() -> anyhow::Result<Self> {
        let result = Self::empty();
        {
            let mut records = result.records.lock().expect("mutex poisoned");
            for seed in SEED_USERS.iter() {
                let user = UserInfo {
                    id: seed.id.try_into().context("seed id invalid")?,
                    name: seed.name.try_into().context("seed name invalid")?,
                    email: seed.email.try_into().context("seed email invalid")?,
                    role: seed.role,
                    permissions: seed.role.default_permissions(),
                };
                let password_hash = compute_password_hash(seed.password.into())
                    .with_context(|| format!("failed to hash password for {}", seed.email))?;
                records.push(StoredCredential {
                    user,
                    password_hash,
                });
            }
        }
        Ok(result)
    }

    pub fn contains(&self, email: &str) -> bool {
        self.records
            .lock()
            .expect("mutex poisoned")
            .iter()
            .any(|record| record.user.email.matches(email))
    }

    pub fn len(&self) -> usize {
        self.records.lock().expect("mutex poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the stored user (with its stored permissions) if the password
    /// matches
    #[tracing::instrument(name = "Validate credentials", skip(self, password))]
    pub async fn verify(&self, email: &str, password: SecretString) -> Result<UserInfo, AuthError> {
        let found = self
            .records
            .lock()
            .expect("mutex poisoned")
            .iter()
            .find(|record| record.user.email.matches(email))
            .cloned();

        let expected_password_hash = match &found {
            Some(record) => record.password_hash.clone(),
            None => {
                debug!("User not found: {email}");
                SecretString::from(DUMMY_PASSWORD_HASH)
            }
        };

        spawn_blocking_with_tracing(move || {
            verify_password_hash(expected_password_hash, password)
        })
        .await
        .context("Failed to spawn blocking task.")??;

        // Still needed in case the dummy hash ever matches
        found
            .map(|record| record.user)
            .ok_or(AuthError::InvalidEmailOrPassword)
    }

    /// Fails if the email is already registered (case insensitive)
    #[tracing::instrument(skip(self, password), fields(email = %user.email))]
    pub async fn register(&self, user: UserInfo, password: SecretString) -> Result<(), AuthError> {
        if self.contains(user.email.as_ref()) {
            return Err(AuthError::EmailAlreadyExists);
        }

        let password_hash = spawn_blocking_with_tracing(move || compute_password_hash(password))
            .await
            .context("Failed to spawn blocking task.")?
            .context("failed to hash password")?;

        let mut records = self.records.lock().expect("mutex poisoned");
        // Checked again as the lock was released while hashing
        if records
            .iter()
            .any(|record| record.user.email.matches(user.email.as_ref()))
        {
            return Err(AuthError::EmailAlreadyExists);
        }
        info!(id = %user.id, "registered new user");
        records.push(StoredCredential {
            user,
            password_hash,
        });
        Ok(())
    }
}

#[tracing::instrument(skip(expected_password_hash, password_candidate))]
fn verify_password_hash(
    expected_password_hash: SecretString,
    password_candidate: SecretString,
) -> Result<(), AuthError> {
    let expected_password_hash = PasswordHash::new(expected_password_hash.expose_secret())
        .context("Failed to parse hash in PHC string format.")?;

    if argon2_settings()
        .verify_password(
            password_candidate.expose_secret().as_bytes(),
            &expected_password_hash,
        )
        .is_ok()
    {
        Ok(())
    } else {
        Err(AuthError::InvalidEmailOrPassword)
    }
}

fn compute_password_hash(password: SecretString) -> Result<SecretString, anyhow::Error> {
    let salt = SaltString::generate(&mut rand::thread_rng());
    let password_hash = argon2_settings()
        .hash_password(password.expose_secret().as_bytes(), &salt)?
        .to_string();
    Ok(SecretString::from(password_hash))
}

fn argon2_settings() -> Argon2<'static> {
    Argon2::new(
        Algorithm::Argon2id,
        Version::V0x13,
        Params::new(15000, 2, 1, None).expect("invalid parameters"),
    )
}
