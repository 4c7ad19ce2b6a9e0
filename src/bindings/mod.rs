//! Primitive Catalog
//!
//! Every primitive the bridge can call, with its buffer signature and the
//! glue that maps a resolved [`Frame`] onto the [`crate::sodium`] facade.
//!
//! ```text
//! PrimitiveId ──► Signature (ordered params + roles)
//!             └─► glue fn   (Frame, scalars) -> status
//! ```
//!
//! Callers go through [`Invoker::call`] (positional handles) or
//! [`Invoker::call_named`] (handles by parameter name).

mod glue;

use crate::adapter::{Frame, Invoker, Param, Signature};
use crate::error::{BridgeError, BridgeResult};
use crate::managed::ManagedRuntime;

type Glue = fn(&Frame<'_>, &[i64]) -> i32;

/// Buffer-taking primitives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveId {
    CoreHsalsa20,
    ScalarmultCurve25519,
    ScalarmultCurve25519Base,
    ChaCha20Poly1305EncryptDetached,
    ChaCha20Poly1305DecryptDetached,
    ChaCha20Poly1305IetfEncryptDetached,
    ChaCha20Poly1305IetfDecryptDetached,
    XChaCha20Poly1305IetfEncryptDetached,
    XChaCha20Poly1305IetfDecryptDetached,
    XSalsa20Poly1305EncryptDetached,
    XSalsa20Poly1305DecryptDetached,
    BoxKeypair,
    BoxSeedKeypair,
    BoxSeal,
    BoxSealOpen,
    RandombytesBuf,
    Pwhash,
    PwhashScryptsalsa208sha256,
}

static CORE_HSALSA20: Signature = Signature {
    name: "crypto_core_hsalsa20",
    params: &[
        Param::output("out"),
        Param::input("in"),
        Param::input("k"),
        Param::optional("c"),
    ],
    scalars: &[],
};

static SCALARMULT_CURVE25519: Signature = Signature {
    name: "crypto_scalarmult_curve25519",
    params: &[Param::output("q"), Param::input("n"), Param::input("p")],
    scalars: &[],
};

static SCALARMULT_CURVE25519_BASE: Signature = Signature {
    name: "crypto_scalarmult_curve25519_base",
    params: &[Param::output("q"), Param::input("n")],
    scalars: &[],
};

const AEAD_ENCRYPT_PARAMS: &[Param] = &[
    Param::output("c"),
    Param::output("mac"),
    Param::input("m"),
    Param::optional("ad"),
    Param::input("npub"),
    Param::input("k"),
];

const AEAD_DECRYPT_PARAMS: &[Param] = &[
    Param::output("m"),
    Param::input("c"),
    Param::input("mac"),
    Param::optional("ad"),
    Param::input("npub"),
    Param::input("k"),
];

static CHACHA20POLY1305_ENCRYPT: Signature = Signature {
    name: "crypto_aead_chacha20poly1305_encrypt_detached",
    params: AEAD_ENCRYPT_PARAMS,
    scalars: &[],
};

static CHACHA20POLY1305_DECRYPT: Signature = Signature {
    name: "crypto_aead_chacha20poly1305_decrypt_detached",
    params: AEAD_DECRYPT_PARAMS,
    scalars: &[],
};

static CHACHA20POLY1305_IETF_ENCRYPT: Signature = Signature {
    name: "crypto_aead_chacha20poly1305_ietf_encrypt_detached",
    params: AEAD_ENCRYPT_PARAMS,
    scalars: &[],
};

static CHACHA20POLY1305_IETF_DECRYPT: Signature = Signature {
    name: "crypto_aead_chacha20poly1305_ietf_decrypt_detached",
    params: AEAD_DECRYPT_PARAMS,
    scalars: &[],
};

static XCHACHA20POLY1305_IETF_ENCRYPT: Signature = Signature {
    name: "crypto_aead_xchacha20poly1305_ietf_encrypt_detached",
    params: AEAD_ENCRYPT_PARAMS,
    scalars: &[],
};

static XCHACHA20POLY1305_IETF_DECRYPT: Signature = Signature {
    name: "crypto_aead_xchacha20poly1305_ietf_decrypt_detached",
    params: AEAD_DECRYPT_PARAMS,
    scalars: &[],
};

static XSALSA20POLY1305_ENCRYPT: Signature = Signature {
    name: "crypto_aead_xsalsa20poly1305_encrypt_detached",
    params: AEAD_ENCRYPT_PARAMS,
    scalars: &[],
};

static XSALSA20POLY1305_DECRYPT: Signature = Signature {
    name: "crypto_aead_xsalsa20poly1305_decrypt_detached",
    params: AEAD_DECRYPT_PARAMS,
    scalars: &[],
};

static BOX_KEYPAIR: Signature = Signature {
    name: "crypto_box_keypair",
    params: &[Param::output("pk"), Param::output("sk")],
    scalars: &[],
};

static BOX_SEED_KEYPAIR: Signature = Signature {
    name: "crypto_box_seed_keypair",
    params: &[Param::output("pk"), Param::output("sk"), Param::input("seed")],
    scalars: &[],
};

static BOX_SEAL: Signature = Signature {
    name: "crypto_box_seal",
    params: &[Param::output("c"), Param::input("m"), Param::input("pk")],
    scalars: &[],
};

static BOX_SEAL_OPEN: Signature = Signature {
    name: "crypto_box_seal_open",
    params: &[
        Param::output("m"),
        Param::input("c"),
        Param::input("pk"),
        Param::input("sk"),
    ],
    scalars: &[],
};

static RANDOMBYTES_BUF: Signature = Signature {
    name: "randombytes_buf",
    params: &[Param::output("buf")],
    scalars: &[],
};

static PWHASH: Signature = Signature {
    name: "crypto_pwhash",
    params: &[
        Param::output("out"),
        Param::input("passwd"),
        Param::input("salt"),
    ],
    scalars: &["opslimit", "memlimit"],
};

static PWHASH_SCRYPTSALSA208SHA256: Signature = Signature {
    name: "crypto_pwhash_scryptsalsa208sha256",
    params: &[
        Param::output("out"),
        Param::input("passwd"),
        Param::input("salt"),
    ],
    scalars: &["opslimit", "memlimit"],
};

impl PrimitiveId {
    pub const ALL: [PrimitiveId; 18] = [
        PrimitiveId::CoreHsalsa20,
        PrimitiveId::ScalarmultCurve25519,
        PrimitiveId::ScalarmultCurve25519Base,
        PrimitiveId::ChaCha20Poly1305EncryptDetached,
        PrimitiveId::ChaCha20Poly1305DecryptDetached,
        PrimitiveId::ChaCha20Poly1305IetfEncryptDetached,
        PrimitiveId::ChaCha20Poly1305IetfDecryptDetached,
        PrimitiveId::XChaCha20Poly1305IetfEncryptDetached,
        PrimitiveId::XChaCha20Poly1305IetfDecryptDetached,
        PrimitiveId::XSalsa20Poly1305EncryptDetached,
        PrimitiveId::XSalsa20Poly1305DecryptDetached,
        PrimitiveId::BoxKeypair,
        PrimitiveId::BoxSeedKeypair,
        PrimitiveId::BoxSeal,
        PrimitiveId::BoxSealOpen,
        PrimitiveId::RandombytesBuf,
        PrimitiveId::Pwhash,
        PrimitiveId::PwhashScryptsalsa208sha256,
    ];

    pub fn signature(self) -> &'static Signature {
        match self {
            PrimitiveId::CoreHsalsa20 => &CORE_HSALSA20,
            PrimitiveId::ScalarmultCurve25519 => &SCALARMULT_CURVE25519,
            PrimitiveId::ScalarmultCurve25519Base => &SCALARMULT_CURVE25519_BASE,
            PrimitiveId::ChaCha20Poly1305EncryptDetached => &CHACHA20POLY1305_ENCRYPT,
            PrimitiveId::ChaCha20Poly1305DecryptDetached => &CHACHA20POLY1305_DECRYPT,
            PrimitiveId::ChaCha20Poly1305IetfEncryptDetached => &CHACHA20POLY1305_IETF_ENCRYPT,
            PrimitiveId::ChaCha20Poly1305IetfDecryptDetached => &CHACHA20POLY1305_IETF_DECRYPT,
            PrimitiveId::XChaCha20Poly1305IetfEncryptDetached => &XCHACHA20POLY1305_IETF_ENCRYPT,
            PrimitiveId::XChaCha20Poly1305IetfDecryptDetached => &XCHACHA20POLY1305_IETF_DECRYPT,
            PrimitiveId::XSalsa20Poly1305EncryptDetached => &XSALSA20POLY1305_ENCRYPT,
            PrimitiveId::XSalsa20Poly1305DecryptDetached => &XSALSA20POLY1305_DECRYPT,
            PrimitiveId::BoxKeypair => &BOX_KEYPAIR,
            PrimitiveId::BoxSeedKeypair => &BOX_SEED_KEYPAIR,
            PrimitiveId::BoxSeal => &BOX_SEAL,
            PrimitiveId::BoxSealOpen => &BOX_SEAL_OPEN,
            PrimitiveId::RandombytesBuf => &RANDOMBYTES_BUF,
            PrimitiveId::Pwhash => &PWHASH,
            PrimitiveId::PwhashScryptsalsa208sha256 => &PWHASH_SCRYPTSALSA208SHA256,
        }
    }

    /// libsodium function name
    pub fn name(self) -> &'static str {
        self.signature().name
    }

    /// Look a primitive up by its libsodium name
    pub fn from_name(name: &str) -> Option<PrimitiveId> {
        Self::ALL.into_iter().find(|id| id.name() == name)
    }

    fn glue(self) -> Glue {
        match self {
            PrimitiveId::CoreHsalsa20 => glue::core_hsalsa20,
            PrimitiveId::ScalarmultCurve25519 => glue::scalarmult_curve25519,
            PrimitiveId::ScalarmultCurve25519Base => glue::scalarmult_curve25519_base,
            PrimitiveId::ChaCha20Poly1305EncryptDetached => glue::chacha20poly1305_encrypt,
            PrimitiveId::ChaCha20Poly1305DecryptDetached => glue::chacha20poly1305_decrypt,
            PrimitiveId::ChaCha20Poly1305IetfEncryptDetached => glue::chacha20poly1305_ietf_encrypt,
            PrimitiveId::ChaCha20Poly1305IetfDecryptDetached => glue::chacha20poly1305_ietf_decrypt,
            PrimitiveId::XChaCha20Poly1305IetfEncryptDetached => glue::xchacha20poly1305_ietf_encrypt,
            PrimitiveId::XChaCha20Poly1305IetfDecryptDetached => glue::xchacha20poly1305_ietf_decrypt,
            PrimitiveId::XSalsa20Poly1305EncryptDetached => glue::xsalsa20poly1305_encrypt,
            PrimitiveId::XSalsa20Poly1305DecryptDetached => glue::xsalsa20poly1305_decrypt,
            PrimitiveId::BoxKeypair => glue::box_keypair,
            PrimitiveId::BoxSeedKeypair => glue::box_seed_keypair,
            PrimitiveId::BoxSeal => glue::box_seal,
            PrimitiveId::BoxSealOpen => glue::box_seal_open,
            PrimitiveId::RandombytesBuf => glue::randombytes_buf,
            PrimitiveId::Pwhash => glue::crypto_pwhash,
            PrimitiveId::PwhashScryptsalsa208sha256 => glue::pwhash_scryptsalsa208sha256,
        }
    }
}

impl std::fmt::Display for PrimitiveId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl<'r, R: ManagedRuntime> Invoker<'r, R> {
    /// Call a catalogued primitive with positional handles.
    ///
    /// `handles` follow the signature order; `scalars` carry the non-buffer
    /// arguments (only the password hashes have any).
    pub fn call(
        &self,
        id: PrimitiveId,
        handles: &[Option<&R::Buffer>],
        scalars: &[i64],
    ) -> BridgeResult<i32> {
        let signature = id.signature();
        if scalars.len() != signature.scalars.len() {
            return Err(BridgeError::InvalidArgCount {
                primitive: signature.name,
                expected: signature.scalars.len(),
                got: scalars.len(),
            });
        }
        let glue = id.glue();
        self.invoke(signature, handles, |frame| glue(frame, scalars))
    }

    /// Call a catalogued primitive with handles given by parameter name.
    /// Parameters not named are absent.
    pub fn call_named(
        &self,
        id: PrimitiveId,
        named: &[(&str, &R::Buffer)],
        scalars: &[i64],
    ) -> BridgeResult<i32> {
        let signature = id.signature();
        let mut handles: Vec<Option<&R::Buffer>> = vec![None; signature.arity()];
        for (name, buffer) in named {
            let index = signature
                .position(name)
                .ok_or_else(|| BridgeError::UnknownParameter {
                    primitive: signature.name,
                    name: name.to_string(),
                })?;
            handles[index] = Some(*buffer);
        }
        self.call(id, &handles, scalars)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::heap::ManagedHeap;

    #[test]
    fn test_names_round_trip() {
        for id in PrimitiveId::ALL {
            assert_eq!(PrimitiveId::from_name(id.name()), Some(id));
        }
        assert_eq!(PrimitiveId::from_name("crypto_box_easy"), None);
    }

    #[test]
    fn test_signatures_have_an_output() {
        for id in PrimitiveId::ALL {
            let sig = id.signature();
            assert!(sig.params.iter().any(|p| p.role.is_output()), "{}", sig);
        }
    }

    #[test]
    fn test_scalar_count_checked() {
        let heap = ManagedHeap::new();
        let out = heap.allocate_direct(32);
        let err = Invoker::new(&heap)
            .call(PrimitiveId::RandombytesBuf, &[Some(&out)], &[1])
            .unwrap_err();
        assert!(matches!(err, BridgeError::InvalidArgCount { expected: 0, got: 1, .. }));
    }

    #[test]
    fn test_unknown_parameter_name() {
        let heap = ManagedHeap::new();
        let out = heap.allocate_direct(32);
        let err = Invoker::new(&heap)
            .call_named(PrimitiveId::RandombytesBuf, &[("nope", &out)], &[])
            .unwrap_err();
        assert_eq!(
            err,
            BridgeError::UnknownParameter {
                primitive: "randombytes_buf",
                name: "nope".into()
            }
        );
    }

    #[test]
    fn test_call_named_any_order() {
        let heap = ManagedHeap::new();
        let q = heap.allocate_direct(32);
        let n = heap.direct_from(&[9u8; 32]);

        let status = Invoker::new(&heap)
            .call_named(PrimitiveId::ScalarmultCurve25519Base, &[("n", &n), ("q", &q)], &[])
            .unwrap();
        assert_eq!(status, 0);
        assert_ne!(heap.read(q).unwrap(), vec![0u8; 32]);
    }

    #[test]
    fn test_seal_through_catalog() {
        let heap = ManagedHeap::new();
        let invoker = Invoker::new(&heap);
        let pk = heap.allocate_direct(32);
        let sk = heap.wrap_array(heap.allocate_array(32)).unwrap();
        assert_eq!(invoker.call(PrimitiveId::BoxKeypair, &[Some(&pk), Some(&sk)], &[]).unwrap(), 0);

        let m = heap.direct_from(b"sealed");
        let c = heap.allocate_direct(6 + 48);
        let status = invoker
            .call_named(PrimitiveId::BoxSeal, &[("c", &c), ("m", &m), ("pk", &pk)], &[])
            .unwrap();
        assert_eq!(status, 0);

        let opened = heap.allocate_direct(6);
        let status = invoker
            .call(
                PrimitiveId::BoxSealOpen,
                &[Some(&opened), Some(&c), Some(&pk), Some(&sk)],
                &[],
            )
            .unwrap();
        assert_eq!(status, 0);
        assert_eq!(heap.read(opened).unwrap(), b"sealed");
    }
}
