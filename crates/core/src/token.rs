use rand::RngCore;
use serde::{Deserialize, Serialize};

/// Opaque bearer credential granting public read/adjust access to one quote.
///
/// Generated once when the quote is first saved and never rotated by later
/// saves, so links already sent to a client keep working.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AccessToken(pub String);

impl AccessToken {
    pub fn generate() -> Self {
        Self(random_hex(32))
    }
}

/// Bearer token for the deposit payment redirect page.
///
/// Unlike the access token this one is invalidated whenever a
/// totals-affecting mutation lands, so a stale link can never charge an
/// amount that no longer matches the quote.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PaymentLinkToken(pub String);

impl PaymentLinkToken {
    pub fn generate() -> Self {
        Self(random_hex(16))
    }
}

pub fn public_quote_url(base_url: &str, token: &AccessToken) -> String {
    format!("{}/quote/{}", base_url.trim_end_matches('/'), token.0)
}

fn random_hex(bytes: usize) -> String {
    let mut buf = vec![0u8; bytes];
    rand::thread_rng().fill_bytes(&mut buf);
    let mut out = String::with_capacity(bytes * 2);
    for byte in buf {
        out.push_str(&format!("{byte:02x}"));
    }
    out
}
