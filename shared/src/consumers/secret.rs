// ============================================================================
// Secret Authorization
// ============================================================================
//
// Devices authorize a payload in one of two modes:
//
// Mode A: the secret field carries the sensor secret literally.
//
// Mode B: the secret field carries `$<sha256 hex digest>==`, where the
// digest was computed over the payload as sent with the secret field
// replaced by the true sensor secret. Re-doing the substitution on the
// receiving side and hashing must reproduce the claimed digest; any change
// to the payload bytes breaks it.
//
// ============================================================================

use std::borrow::Cow;

use once_cell::sync::Lazy;
use regex::{NoExpand, Regex};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

/// Sentinel wrapper around a hex digest in the secret field.
const SENTINEL_PATTERN: &str = r"\$[a-f0-9]{64}==";

/// First byte of the digest inside the wrapped field (skips `$`).
const SECRET_SUBSTRING_START: usize = 1;

/// Total wrapper length: `$` prefix plus `==` suffix.
const SECRET_SUBSTRING_OFFSET: usize = 3;

static SENTINEL: Lazy<Regex> =
    Lazy::new(|| Regex::new(SENTINEL_PATTERN).expect("sentinel pattern is valid"));

/// Authorize one payload against the sensor's stored secret.
///
/// `raw` is the payload exactly as received, `claimed` the payload's secret
/// field, and `secret` the sensor's stored secret.
pub(crate) fn authorize(raw: &str, claimed: &str, secret: &str) -> bool {
    match SENTINEL.replace(raw, NoExpand(secret)) {
        Cow::Owned(canonical) => {
            let claimed = claimed.as_bytes();

            if claimed.len() <= SECRET_SUBSTRING_OFFSET {
                return false;
            }

            let digest_len = claimed.len() - SECRET_SUBSTRING_OFFSET;
            let claimed_digest =
                &claimed[SECRET_SUBSTRING_START..SECRET_SUBSTRING_START + digest_len];

            let computed = hex::encode(Sha256::digest(canonical.as_bytes()));

            bool::from(computed.as_bytes().ct_eq(claimed_digest))
        }
        // No sentinel present: plaintext comparison.
        Cow::Borrowed(_) => claimed == secret,
    }
}

/// Wrap a hex digest in the sentinel form. Shared with the tests and any
/// tooling that needs to produce mode-B payloads.
pub fn wrap_digest(digest: &str) -> String {
    format!("${digest}==")
}
