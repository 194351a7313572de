use serde::{Deserialize, Deserializer};

/// Normalizes a display name by stripping surrounding whitespace and
/// composing it into Unicode Normalization Form C.
///
/// ```
/// use reedlog::normalization::normalize_name;
/// assert_eq!(normalize_name(" Lorée 47 "), "Lorée 47");
/// ```
pub fn normalize_name(name: impl AsRef<str>) -> String {
    use unicode_normalization::UnicodeNormalization;

    name.as_ref().trim().nfc().to_string()
}

/// Deserializes an optional `String` after running it through `normalize_name`.
pub fn deserialize_option<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let o: Option<String> = Deserialize::deserialize(deserializer)?;
    Ok(o.map(normalize_name))
}
