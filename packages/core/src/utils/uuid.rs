// Случайные идентификаторы клиента

use rand::distributions::Alphanumeric;
use rand::Rng;

/// Client-ID: UUID v4 в нижнем регистре, новый на каждую попытку авторизации
pub fn generate_v4() -> String {
    uuid::Uuid::new_v4().to_string().to_lowercase()
}

pub fn is_valid(uuid_str: &str) -> bool {
    uuid::Uuid::parse_str(uuid_str).is_ok()
}

/// Случайный unicast MAC в формате `aa:bb:cc:dd:ee:ff`
pub fn random_mac_address() -> String {
    let mut mac = [0u8; 6];
    rand::thread_rng().fill(&mut mac);
    mac[0] &= 0xfe;

    mac.iter()
        .map(|b| format!("{:02x}", b))
        .collect::<Vec<_>>()
        .join(":")
}

/// Случайная строка из [A-Za-z0-9]
pub fn random_string(length: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(length)
        .map(char::from)
        .collect()
}
