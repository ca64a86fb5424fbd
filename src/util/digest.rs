use sha1::{Digest, Sha1};

/// A method used to calc hash value of source with sha1 digest alg.
pub fn sha1(source: impl AsRef<[u8]>) -> Vec<u8> {
    let mut hasher = Sha1::new();
    hasher.update(source);
    hasher.finalize().to_vec()
}

/// Lower-case hex rendering of the sha1 digest of source.
pub fn sha1_hex(source: impl AsRef<[u8]>) -> String {
    sha1(source).iter().map(|b| format!("{b:02x}")).collect()
}

#[test]
fn test_sha1_hex() {
    assert_eq!(sha1_hex("abc"), "a9993e364706816aba3e25717850c26c9cd0d89d");
    assert_eq!(sha1("").len(), 20);
}
