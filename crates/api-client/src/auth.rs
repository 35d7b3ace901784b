use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Creates the HMAC-SHA256 signature the venue requires on every private
/// call. The input is the full query string including the timestamp; the
/// output is appended as the `signature` parameter.
pub fn sign_request(secret: &str, query_string: &str) -> String {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC can take key of any size");
    mac.update(query_string.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}
