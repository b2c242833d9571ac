//! Встроенный ключевой материал наборов шифров.
//!
//! Сервер называет только набор (algorithm id), ключи никогда не передаются.
//! Поэтому таблица закрыта: новый id требует новых констант здесь и
//! новой записи в [`crate::crypto::registry`].

use hex_literal::hex;

// AES-CBC (CAFBCBAD-B6E7-4CAB-8A67-14D39F00CE1E)
pub const AES_CBC_KEY1: [u8; 16] = hex!("57f9b445fafcf72133bfde985cdf06cb");
pub const AES_CBC_KEY2: [u8; 16] = hex!("777bb1163f1b90457eb1d773bc80b92b");
pub const AES_CBC_IV: [u8; 16] = hex!("de9ab23c53807d6fda00634fd308ab5e");

// AES-ECB (A474B1C2-3DE0-4EA2-8C5F-7093409CE6C4)
pub const AES_ECB_KEY1: [u8; 16] = hex!("af1229a5b98dff76708f24d5fd221cad");
pub const AES_ECB_KEY2: [u8; 16] = hex!("ac7892e573c9e5a596169219599468ec");

// 3DES-CBC (5BFBA864-BBA9-42DB-8EAD-49B5F412BD81)
pub const TDES_CBC_KEY1: [u8; 24] = hex!("96945205742bb3200eeca26c177ea1410fabcdef44308590");
pub const TDES_CBC_KEY2: [u8; 24] = hex!("ca130ab4d4d245b811ba5393070f1b6f56ab7b8fb5a3c00b");
pub const TDES_CBC_IV: [u8; 8] = hex!("394ac23e3b85af97");

// 3DES-ECB (6E0B65FF-0B5B-459C-8FCE-EC7F2BEA9FF5)
pub const TDES_ECB_KEY1: [u8; 24] = hex!("456730f1389fafffc41acb1951d165a4c2d34c444722bbc3");
pub const TDES_ECB_KEY2: [u8; 24] = hex!("5038e91aef8d0b9db7ee7b2c6f1ba47b1cd2d4b25bf3fd9a");

// Modified XTEA (B3047D4E-67DF-4864-A6A5-DF9B9E525C79)
pub const XTEA_KEY1: [u32; 4] = [0xbb12ae3c, 0xd99cc696, 0xb6e4808f, 0xf7b60ab8];
pub const XTEA_KEY2: [u32; 4] = [0x60657e2b, 0x388d1845, 0x1c4bf55f, 0xda6e6be7];
pub const XTEA_KEY3: [u32; 4] = [0x1e3dc164, 0x3dcbbd9b, 0x455379c5, 0x390c5e3e];

// Modified XTEA with IV (C32C68F9-CA81-4260-A329-BBAFD1A9CCD1)
pub const XTEA_IV_KEY1: [u32; 4] = [0xb0b2227d, 0xdad6f0b2, 0x2cfb9c79, 0x60f18b9c];
pub const XTEA_IV_KEY2: [u32; 4] = [0x6d9b9275, 0xb138dd32, 0x8b0a4b3e, 0x565fa69b];
pub const XTEA_IV_KEY3: [u32; 4] = [0x46437d24, 0xeea79b9b, 0x305e80be, 0x828b1921];
pub const XTEA_IV: [u32; 2] = [0x60294594, 0x95c57a7b];
