//! HSalsa20 core
//!
//! Derives a 32-byte subkey from a 32-byte key and a 16-byte input, as used
//! by XSalsa20 and `crypto_box_beforenm`.

use salsa20::cipher::consts::U10;
use salsa20::cipher::generic_array::GenericArray;
use salsa20::hsalsa;
use zeroize::Zeroize;

pub const OUTPUTBYTES: usize = 32;
pub const INPUTBYTES: usize = 16;
pub const KEYBYTES: usize = 32;
pub const CONSTBYTES: usize = 16;

/// The standard Salsa20 constant, used when no constant is given
pub const SIGMA: [u8; CONSTBYTES] = *b"expand 32-byte k";

/// `crypto_core_hsalsa20`.
///
/// Only the standard constant is supported; any other returns `-1` and
/// leaves `out` untouched.
pub fn hsalsa20(
    out: &mut [u8; OUTPUTBYTES],
    input: &[u8; INPUTBYTES],
    key: &[u8; KEYBYTES],
    constant: Option<&[u8; CONSTBYTES]>,
) -> i32 {
    if constant.is_some_and(|c| c != &SIGMA) {
        return -1;
    }

    let mut derived = hsalsa::<U10>(
        GenericArray::from_slice(&key[..]),
        GenericArray::from_slice(&input[..]),
    );
    out.copy_from_slice(derived.as_slice());
    derived.as_mut_slice().zeroize();
    0
}

#[cfg(test)]
mod tests {
    use super::*;

    // X25519 shared secret of the RFC 7748 test keys
    const SHARED: &str = "4a5d9d5ba4ce2de1728e3bf480350f25e07e21c947d19e3376f09b3c1e161742";

    fn key() -> [u8; KEYBYTES] {
        hex::decode(SHARED).unwrap().try_into().unwrap()
    }

    #[test]
    fn test_box_beforenm_vector() {
        let mut out = [0u8; OUTPUTBYTES];
        assert_eq!(hsalsa20(&mut out, &[0; INPUTBYTES], &key(), None), 0);
        assert_eq!(
            hex::encode(out),
            "1b27556473e985d462cd51197a9a46c76009549eac6474f206c4ee0844f68389"
        );
    }

    #[test]
    fn test_explicit_sigma_matches_default() {
        let mut a = [0u8; OUTPUTBYTES];
        let mut b = [0u8; OUTPUTBYTES];
        let input = [7u8; INPUTBYTES];
        assert_eq!(hsalsa20(&mut a, &input, &key(), None), 0);
        assert_eq!(hsalsa20(&mut b, &input, &key(), Some(&SIGMA)), 0);
        assert_eq!(a, b);
    }

    #[test]
    fn test_custom_constant_rejected() {
        let mut out = [0xAAu8; OUTPUTBYTES];
        assert_eq!(hsalsa20(&mut out, &[0; INPUTBYTES], &key(), Some(&[1; CONSTBYTES])), -1);
        assert_eq!(out, [0xAA; OUTPUTBYTES]);
    }
}
