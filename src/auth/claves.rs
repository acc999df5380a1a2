// Claves de usuario: SHA-256 con sal por usuario, almacenado "sal$hash".

use rand::RngCore;
use sha2::{Digest, Sha256};

fn digest(sal: &str, clave: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(sal.as_bytes());
    hasher.update(b"$");
    hasher.update(clave.as_bytes());
    hex::encode(hasher.finalize())
}

/// Genera el hash almacenable de una clave en texto plano.
pub fn hashear(clave: &str) -> String {
    let mut sal_bytes = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut sal_bytes);
    let sal = hex::encode(sal_bytes);
    format!("{}${}", sal, digest(&sal, clave))
}

/// Verifica una clave contra el formato almacenado.
pub fn verificar(clave: &str, almacenado: &str) -> bool {
    match almacenado.split_once('$') {
        Some((sal, hash)) => digest(sal, clave) == hash,
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_y_verificacion() {
        let h = hashear("secreta123");
        assert!(verificar("secreta123", &h));
        assert!(!verificar("otra", &h));
    }

    #[test]
    fn sal_distinta_por_hash() {
        assert_ne!(hashear("misma"), hashear("misma"));
    }

    #[test]
    fn formato_invalido_no_verifica() {
        assert!(!verificar("lo-que-sea", "sin-separador"));
    }
}
