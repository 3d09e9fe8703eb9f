use crate::auth::AuthError;

const STATE_TOKEN_BYTES: usize = 24;
const URL_SAFE_ALPHABET: &[u8] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-_";

/// Generates the CSRF state nonce for one authorization flow: 24 characters
/// drawn from a URL-safe alphabet, 6 bits of entropy each (144 bits total).
/// The token is only ever compared for equality against the callback's
/// `state` parameter.
pub fn generate_state_token() -> Result<String, AuthError> {
    let mut bytes = [0_u8; STATE_TOKEN_BYTES];
    getrandom::getrandom(&mut bytes).map_err(|err| AuthError::Entropy(err.to_string()))?;
    Ok(encode_url_safe(&bytes))
}

fn encode_url_safe(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| URL_SAFE_ALPHABET[(b & 0x3f) as usize] as char)
        .collect()
}
