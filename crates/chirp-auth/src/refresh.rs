use rand::RngCore;

/// 32 bytes of CSPRNG output, hex-encoded. Collisions are negligible;
/// uniqueness is still enforced by the refresh_tokens primary key.
pub fn make_refresh_token() -> String {
    let mut bytes = [0u8; 32];
    rand::rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}
