//! Name tables for algorithms, modes, protocols and authentication methods.
//!
//! Every lookup is exact (after lowercasing) and an unknown name is an
//! error. Nothing falls back to an "unspecified" code.

use ipsec_common::error::{IpsecError, IpsecResult};
use ipsec_proto::{
    AuthType, CryptoAlgorithm, DiffieHellmanGroup, IntegAlgorithm, IpsecMode, IpsecProtocol,
};

/// A fixed name-to-code table.
///
/// The first entry for a code is its canonical name for reverse lookups.
pub struct NameTable<T: 'static> {
    kind: &'static str,
    entries: &'static [(&'static str, T)],
}

impl<T: Copy + PartialEq> NameTable<T> {
    /// Returns the code for `name`.
    pub fn lookup(&self, name: &str) -> IpsecResult<T> {
        let wanted = name.trim().to_ascii_lowercase();
        self.entries
            .iter()
            .find(|(n, _)| *n == wanted)
            .map(|(_, code)| *code)
            .ok_or_else(|| IpsecError::unknown_algorithm(self.kind, name))
    }

    /// Returns the canonical name of `code`.
    pub fn name(&self, code: T) -> Option<&'static str> {
        self.entries
            .iter()
            .find(|(_, c)| *c == code)
            .map(|(n, _)| *n)
    }

    /// Looks up every name in order.
    pub fn lookup_all<S: AsRef<str>>(&self, names: &[S]) -> IpsecResult<Vec<T>> {
        names.iter().map(|n| self.lookup(n.as_ref())).collect()
    }

    /// All accepted names.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.iter().map(|(n, _)| *n)
    }
}

pub static ENCRYPTION: NameTable<CryptoAlgorithm> = NameTable {
    kind: "encryption",
    entries: &[
        ("null", CryptoAlgorithm::Null),
        ("des", CryptoAlgorithm::Des),
        ("3des", CryptoAlgorithm::TripleDes),
        ("cast128", CryptoAlgorithm::Cast),
        ("blowfish", CryptoAlgorithm::Blowfish),
        ("aes_cbc", CryptoAlgorithm::AesCbc),
        ("aes_ctr", CryptoAlgorithm::AesCtr),
        ("aes_ccm_icv_8", CryptoAlgorithm::AesCcm8),
        ("aes_ccm_icv_12", CryptoAlgorithm::AesCcm12),
        ("aes_ccm_icv_16", CryptoAlgorithm::AesCcm16),
        ("aes_gcm_icv_8", CryptoAlgorithm::AesGcm8),
        ("aes_gcm_icv_12", CryptoAlgorithm::AesGcm12),
        ("aes_gcm_icv_16", CryptoAlgorithm::AesGcm16),
        ("null_aes_gmac", CryptoAlgorithm::NullAuthAesGmac),
        ("camellia_cbc", CryptoAlgorithm::CamelliaCbc),
        ("camellia_ctr", CryptoAlgorithm::CamelliaCtr),
        ("camellia_ccm_icv_8", CryptoAlgorithm::CamelliaCcm8),
        ("camellia_ccm_icv_12", CryptoAlgorithm::CamelliaCcm12),
        ("camellia_ccm_icv_16", CryptoAlgorithm::CamelliaCcm16),
        ("chacha20_poly1305", CryptoAlgorithm::Chacha20Poly1305),
    ],
};

// `sha2_256` selects HMAC-SHA2-512/256 on the device datapath.
// `sha2_256_128` is the HMAC-SHA2-256/128 transform.
pub static INTEGRITY: NameTable<IntegAlgorithm> = NameTable {
    kind: "integrity",
    entries: &[
        ("none", IntegAlgorithm::None),
        ("md5_96", IntegAlgorithm::HmacMd5_96),
        ("md5_128", IntegAlgorithm::HmacMd5_128),
        ("sha1_96", IntegAlgorithm::HmacSha1_96),
        ("sha1_160", IntegAlgorithm::HmacSha1_160),
        ("aes_xcbc_96", IntegAlgorithm::AesXcbc96),
        ("aes_cmac_96", IntegAlgorithm::AesCmac96),
        ("aes_128_gmac", IntegAlgorithm::Aes128Gmac),
        ("aes_192_gmac", IntegAlgorithm::Aes192Gmac),
        ("aes_256_gmac", IntegAlgorithm::Aes256Gmac),
        ("sha2_256_128", IntegAlgorithm::HmacSha2_256_128),
        ("sha2_384", IntegAlgorithm::HmacSha2_384_192),
        ("sha2_512", IntegAlgorithm::HmacSha2_512_256),
        ("sha2_256", IntegAlgorithm::HmacSha2_512_256),
    ],
};

pub static DH_GROUPS: NameTable<DiffieHellmanGroup> = NameTable {
    kind: "dh group",
    entries: &[
        ("none", DiffieHellmanGroup::None),
        ("modp768", DiffieHellmanGroup::Modp768),
        ("modp1024", DiffieHellmanGroup::Modp1024),
        ("modp1536", DiffieHellmanGroup::Modp1536),
        ("modp2048", DiffieHellmanGroup::Modp2048),
        ("modp3072", DiffieHellmanGroup::Modp3072),
        ("modp4096", DiffieHellmanGroup::Modp4096),
        ("modp6144", DiffieHellmanGroup::Modp6144),
        ("modp8192", DiffieHellmanGroup::Modp8192),
        ("ecp256", DiffieHellmanGroup::Ecp256),
        ("ecp384", DiffieHellmanGroup::Ecp384),
        ("ecp521", DiffieHellmanGroup::Ecp521),
        ("curve25519", DiffieHellmanGroup::Curve25519),
        ("x25519", DiffieHellmanGroup::Curve25519),
        ("curve448", DiffieHellmanGroup::Curve448),
        ("x448", DiffieHellmanGroup::Curve448),
    ],
};

pub static MODES: NameTable<IpsecMode> = NameTable {
    kind: "mode",
    entries: &[
        ("tunnel", IpsecMode::Tunnel),
        ("transport", IpsecMode::Transport),
        ("beet", IpsecMode::Beet),
        ("pass", IpsecMode::Pass),
        ("drop", IpsecMode::Drop),
    ],
};

pub static PROTOCOLS: NameTable<IpsecProtocol> = NameTable {
    kind: "protocol",
    entries: &[("esp", IpsecProtocol::Esp), ("ah", IpsecProtocol::Ah)],
};

pub static AUTH_METHODS: NameTable<AuthType> = NameTable {
    kind: "authentication",
    entries: &[
        ("psk", AuthType::Psk),
        ("pubkey", AuthType::Pubkey),
        ("xauth", AuthType::Xauth),
        ("eap", AuthType::Eap),
    ],
};

/// True when the encryption transform consumes key material.
pub fn encryption_needs_key(alg: CryptoAlgorithm) -> bool {
    !matches!(alg, CryptoAlgorithm::Null | CryptoAlgorithm::Unspecified)
}

/// True when the integrity transform consumes key material.
pub fn integrity_needs_key(alg: IntegAlgorithm) -> bool {
    alg != IntegAlgorithm::None
}
