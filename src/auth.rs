use crate::util::digest::sha1_hex;

// Signer trait
pub trait Signer {
    /// Method used to sign data with the api secret.
    fn signature(&self, api_secret: &str, data: &str) -> String;
}

/// Digest of `data` immediately followed by the secret, hex encoded.
pub struct Sha1Signer;

impl Signer for Sha1Signer {
    fn signature(&self, api_secret: &str, data: &str) -> String {
        sha1_hex(format!("{data}{api_secret}"))
    }
}

/// Signs upload form parameters.
#[derive(Debug, Clone, Copy, Default)]
pub struct SignatureService;

impl SignatureService {
    /// Build the string to sign: parameters with a value, sorted by name,
    /// joined as `name=value&name=value`.
    pub fn sign_data(&self, params: &[(&str, String)]) -> String {
        let mut params = params
            .iter()
            .filter(|(_, value)| !value.is_empty())
            .collect::<Vec<_>>();
        params.sort_by(|a, b| a.0.cmp(b.0));
        params
            .iter()
            .map(|(name, value)| format!("{name}={value}"))
            .collect::<Vec<_>>()
            .join("&")
    }

    pub fn signature(&self, params: &[(&str, String)], api_secret: &str) -> String {
        let sign_data = self.sign_data(params);
        if cfg!(debug_assertions) {
            ::tracing::debug!("[signData]: {sign_data}");
        }
        Sha1Signer.signature(api_secret, &sign_data)
    }
}
