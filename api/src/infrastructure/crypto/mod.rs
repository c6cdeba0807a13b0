use base64::Engine as _;
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

fn mac_for(secret: &str, value: &str) -> anyhow::Result<HmacSha256> {
    let mut mac = <HmacSha256 as Mac>::new_from_slice(secret.as_bytes())
        .map_err(|e| anyhow::anyhow!("hmac key: {}", e))?;
    mac.update(value.as_bytes());
    Ok(mac)
}

/// `value.signature`, the signature being unpadded base64 of
/// HMAC-SHA256(secret, value).
pub fn sign_value(secret: &str, value: &str) -> anyhow::Result<String> {
    let tag = mac_for(secret, value)?.finalize().into_bytes();
    let sig = base64::engine::general_purpose::STANDARD_NO_PAD.encode(tag);
    Ok(format!("{}.{}", value, sig))
}

/// Returns the original value when the signature checks out.
pub fn unsign_value(secret: &str, signed: &str) -> Option<String> {
    let (value, sig) = signed.rsplit_once('.')?;
    let sig_bytes = base64::engine::general_purpose::STANDARD_NO_PAD
        .decode(sig.trim_end_matches('='))
        .ok()?;
    mac_for(secret, value)
        .ok()?
        .verify_slice(&sig_bytes)
        .ok()
        .map(|_| value.to_string())
}
