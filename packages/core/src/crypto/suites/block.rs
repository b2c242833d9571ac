//! Single-stage ECB/CBC over any RustCrypto block cipher.
//!
//! Padding is zero-bytes; CBC stages may prepend their IV as the first output block.

use crate::crypto::provider::{xor_in_place, zero_pad};
use crate::error::CipherError;
use cipher::generic_array::GenericArray;
use cipher::{BlockDecrypt, BlockEncrypt, BlockSizeUser, KeyInit};

#[derive(Debug, Clone, Copy)]
pub(crate) enum Chaining<'a> {
    Ecb,
    Cbc { iv: &'a [u8], prepend_iv: bool },
}

pub(crate) fn encrypt_stage<C>(key: &[u8], chaining: Chaining<'_>, data: &[u8]) -> Result<Vec<u8>, CipherError>
where
    C: BlockEncrypt + KeyInit,
{
    let cipher = C::new_from_slice(key)?;
    let bs = <C as BlockSizeUser>::block_size();
    let mut buf = zero_pad(data, bs);

    match chaining {
        Chaining::Ecb => {
            for chunk in buf.chunks_exact_mut(bs) {
                cipher.encrypt_block(GenericArray::from_mut_slice(chunk));
            }
            Ok(buf)
        }
        Chaining::Cbc { iv, prepend_iv } => {
            check_iv(iv, bs)?;
            let mut prev = iv.to_vec();
            for chunk in buf.chunks_exact_mut(bs) {
                xor_in_place(chunk, &prev);
                cipher.encrypt_block(GenericArray::from_mut_slice(chunk));
                prev.copy_from_slice(chunk);
            }
            if prepend_iv {
                let mut out = Vec::with_capacity(iv.len() + buf.len());
                out.extend_from_slice(iv);
                out.extend_from_slice(&buf);
                Ok(out)
            } else {
                Ok(buf)
            }
        }
    }
}

pub(crate) fn decrypt_stage<C>(key: &[u8], chaining: Chaining<'_>, data: &[u8]) -> Result<Vec<u8>, CipherError>
where
    C: BlockDecrypt + KeyInit,
{
    let cipher = C::new_from_slice(key)?;
    let bs = <C as BlockSizeUser>::block_size();

    if data.len() % bs != 0 {
        return Err(CipherError::InvalidLength(format!(
            "{} bytes is not a multiple of the {}-byte block",
            data.len(),
            bs
        )));
    }

    match chaining {
        Chaining::Ecb => {
            let mut buf = data.to_vec();
            for chunk in buf.chunks_exact_mut(bs) {
                cipher.decrypt_block(GenericArray::from_mut_slice(chunk));
            }
            Ok(buf)
        }
        Chaining::Cbc { iv, prepend_iv } => {
            check_iv(iv, bs)?;
            let body = if prepend_iv {
                if data.len() < bs {
                    return Err(CipherError::InvalidLength(
                        "ciphertext shorter than its IV block".to_string(),
                    ));
                }
                &data[bs..]
            } else {
                data
            };

            let mut buf = body.to_vec();
            let mut prev = iv.to_vec();
            for chunk in buf.chunks_exact_mut(bs) {
                let saved = chunk.to_vec();
                cipher.decrypt_block(GenericArray::from_mut_slice(chunk));
                xor_in_place(chunk, &prev);
                prev = saved;
            }
            Ok(buf)
        }
    }
}

fn check_iv(iv: &[u8], bs: usize) -> Result<(), CipherError> {
    if iv.len() != bs {
        return Err(CipherError::InvalidKey(format!(
            "IV must be {} bytes, got {}",
            bs,
            iv.len()
        )));
    }
    Ok(())
}
