// Нестрогий XML: портал и сервер авторизации отдают документы с голыми `&`

use crate::utils::error::Result;
use serde::de::DeserializeOwned;

/// Сущности, которые уже являются корректными ссылками и не трогаются
const NAMED_ENTITIES: [&str; 5] = ["amp", "lt", "gt", "quot", "apos"];

/// Текст между первым `start` и следующим за ним `end`.
pub fn extract_between<'a>(s: &'a str, start: &str, end: &str) -> Option<&'a str> {
    let from = s.find(start)? + start.len();
    let len = s[from..].find(end)?;
    Some(&s[from..from + len])
}

/// Заменить каждый `&`, не начинающий известную сущность, на `&amp;`.
///
/// Известные: `&amp;`, `&lt;`, `&gt;`, `&quot;`, `&apos;`, `&#NN;`, `&#xHH;`.
pub fn repair_ampersands(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 16);
    let mut rest = s;

    while let Some(pos) = rest.find('&') {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos + 1..];
        if starts_with_entity(tail) {
            out.push('&');
        } else {
            out.push_str("&amp;");
        }
        rest = tail;
    }
    out.push_str(rest);
    out
}

fn starts_with_entity(tail: &str) -> bool {
    let Some(end) = tail.find(';') else {
        return false;
    };
    let name = &tail[..end];

    if let Some(num) = name.strip_prefix("#x").or_else(|| name.strip_prefix("#X")) {
        return !num.is_empty() && num.chars().all(|c| c.is_ascii_hexdigit());
    }
    if let Some(num) = name.strip_prefix('#') {
        return !num.is_empty() && num.chars().all(|c| c.is_ascii_digit());
    }
    NAMED_ENTITIES.contains(&name)
}

/// Починить и десериализовать XML документ в `T`
pub fn from_lenient_str<T: DeserializeOwned>(xml: &str) -> Result<T> {
    let repaired = repair_ampersands(xml);
    Ok(quick_xml::de::from_str(&repaired)?)
}
