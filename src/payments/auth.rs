//! Single-use authentication credentials for the PlaceToPay API
//!
//! Every outbound call carries a fresh credential derived from the shared
//! secret: `tranKey = base64(sha256(nonce ++ seed ++ secret))`, where the
//! digest consumes the *raw* nonce and the credential carries its base64
//! form. Credentials are never cached or persisted.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::{SecondsFormat, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

const NONCE_LEN: usize = 13;
const NONCE_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthCredential {
    pub login: String,
    pub tran_key: String,
    pub nonce: String,
    pub seed: String,
}

/// Generate a fresh credential for one gateway call.
///
/// Not deterministic: reads the clock and the thread RNG. Must be called
/// once per HTTP request issued to the gateway.
pub fn generate_auth(login: &str, secret_key: &str) -> AuthCredential {
    let seed = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
    let nonce = random_nonce();
    build_credential(login, secret_key, &nonce, seed)
}

/// Deterministic inner step, split out so the digest is testable against
/// an independent recomputation.
fn build_credential(login: &str, secret_key: &str, nonce: &str, seed: String) -> AuthCredential {
    let mut hasher = Sha256::new();
    hasher.update(nonce.as_bytes());
    hasher.update(seed.as_bytes());
    hasher.update(secret_key.as_bytes());
    let tran_key = BASE64.encode(hasher.finalize());

    AuthCredential {
        login: login.to_string(),
        tran_key,
        nonce: BASE64.encode(nonce),
        seed,
    }
}

fn random_nonce() -> String {
    let mut rng = rand::thread_rng();
    (0..NONCE_LEN)
        .map(|_| NONCE_ALPHABET[rng.gen_range(0..NONCE_ALPHABET.len())] as char)
        .collect()
}
