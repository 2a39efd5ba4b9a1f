use crate::domain::repository::CredentialHasher;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};
use rand_core::OsRng;

// Argon2 parameters for 50-150ms target latency
pub const ARGON2_M_COST: u32 = 19456; // 19 MB
pub const ARGON2_T_COST: u32 = 2; // 2 iterations
pub const ARGON2_P_COST: u32 = 1; // 1 parallelism

/// Argon2id work factor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashParams {
    pub m_cost: u32,
    pub t_cost: u32,
    pub p_cost: u32,
}

impl Default for HashParams {
    fn default() -> Self {
        Self {
            m_cost: ARGON2_M_COST,
            t_cost: ARGON2_T_COST,
            p_cost: ARGON2_P_COST,
        }
    }
}

#[derive(Clone)]
pub struct Argon2Hasher {
    params: Params,
}

impl Argon2Hasher {
    pub fn new(params: HashParams) -> Result<Self, argon2::Error> {
        let params = Params::new(params.m_cost, params.t_cost, params.p_cost, None)?;
        Ok(Self { params })
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }
}

impl CredentialHasher for Argon2Hasher {
    fn hash(&self, password: &str) -> anyhow::Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        let password_hash = self
            .argon2()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| anyhow::anyhow!("argon2 hash failed: {}", e))?;
        Ok(password_hash.to_string())
    }

    // Parameters embedded in the PHC string win over `self.params`, so hashes
    // written under an older work factor still verify.
    fn verify(&self, password: &str, hash: &str) -> anyhow::Result<bool> {
        let parsed_hash =
            PasswordHash::new(hash).map_err(|e| anyhow::anyhow!("malformed password hash: {}", e))?;
        match self.argon2().verify_password(password.as_bytes(), &parsed_hash) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(anyhow::anyhow!("argon2 verify failed: {}", e)),
        }
    }
}
