// Проверка пользовательского ввода до старта главного цикла

use crate::utils::error::{DialerError, Result};

/// MAC в формате `aa:bb:cc:dd:ee:ff` (шесть hex-октетов через двоеточие)
pub fn validate_mac_address(mac: &str) -> Result<()> {
    let octets: Vec<&str> = mac.split(':').collect();
    let well_formed = octets.len() == 6
        && octets
            .iter()
            .all(|o| o.len() == 2 && o.chars().all(|c| c.is_ascii_hexdigit()));

    if !well_formed {
        return Err(DialerError::Validation(format!(
            "MAC address must look like aa:bb:cc:dd:ee:ff, got {:?}",
            mac
        )));
    }
    Ok(())
}

pub fn validate_credentials(user: &str, password: &str) -> Result<()> {
    if user.trim().is_empty() {
        return Err(DialerError::Validation("user must not be empty".to_string()));
    }
    if password.is_empty() {
        return Err(DialerError::Validation("password must not be empty".to_string()));
    }
    Ok(())
}
