use std::time::Duration;

/// PBKDF2 iterations for key derivation.
pub const PBKDF2_ITERATIONS: u32 = 100_000;

/// Minimum accepted PBKDF2 salt length in bytes.
pub const PBKDF2_MIN_SALT_LEN: usize = 16;

/// Salt used when the deployment does not configure one. Every device of a
/// user must derive with the same salt to arrive at the same key.
pub const DEFAULT_KEY_SALT: &[u8] = b"starvault/document-key/v1:153bpm";

/// AES-256-GCM key length in bytes.
pub const KEY_LEN: usize = 32;

/// AES-GCM nonce length in bytes.
pub const NONCE_LEN: usize = 12;

/// Quiet period before a burst of saves is pushed to the remote store.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_secs(3);

/// Upper bound on the authoritative remote fetch during load.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Upper bound on a single remote upsert.
pub const DEFAULT_PUSH_TIMEOUT: Duration = Duration::from_secs(10);

/// Current transport document version.
pub const TRANSPORT_VERSION: u32 = 1;

/// Decorative particles generated per universe.
pub const PARTICLES_PER_UNIVERSE: usize = 150;

/// Extension of exported capsule files.
pub const CAPSULE_EXTENSION: &str = "universe";
