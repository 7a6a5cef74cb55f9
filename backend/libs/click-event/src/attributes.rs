use serde::{Deserialize, Deserializer, Serialize};

/// Wire names of the caller-supplied click fields, in canonical order.
pub const ATTRIBUTE_NAMES: [&str; 11] = [
    "uniqueId", "sub1", "sub2", "sub3", "sub4", "sub5", "sub6", "sub7", "sub8", "sub9", "sub10",
];

/// The eleven optional string fields a click carries.
///
/// Values are opaque: they are neither validated nor truncated. A field that
/// was never set reads as the empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClickAttributes {
    #[serde(rename = "uniqueId", default, deserialize_with = "string_or_null")]
    unique_id: String,
    #[serde(default, deserialize_with = "string_or_null")]
    sub1: String,
    #[serde(default, deserialize_with = "string_or_null")]
    sub2: String,
    #[serde(default, deserialize_with = "string_or_null")]
    sub3: String,
    #[serde(default, deserialize_with = "string_or_null")]
    sub4: String,
    #[serde(default, deserialize_with = "string_or_null")]
    sub5: String,
    #[serde(default, deserialize_with = "string_or_null")]
    sub6: String,
    #[serde(default, deserialize_with = "string_or_null")]
    sub7: String,
    #[serde(default, deserialize_with = "string_or_null")]
    sub8: String,
    #[serde(default, deserialize_with = "string_or_null")]
    sub9: String,
    #[serde(default, deserialize_with = "string_or_null")]
    sub10: String,
}

impl ClickAttributes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build attributes from `(name, value)` pairs such as a parsed query
    /// string. Unknown names are ignored; a repeated name keeps its last value.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut attributes = Self::default();
        for (name, value) in pairs {
            attributes.set(name.as_ref(), value);
        }
        attributes
    }

    /// Set a field by wire name. Returns `false` when the name is not one of
    /// [`ATTRIBUTE_NAMES`].
    pub fn set(&mut self, name: &str, value: impl Into<String>) -> bool {
        match self.slot_mut(name) {
            Some(slot) => {
                *slot = value.into();
                true
            }
            None => false,
        }
    }

    pub fn with(mut self, name: &str, value: impl Into<String>) -> Self {
        self.set(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        let value = match name {
            "uniqueId" => &self.unique_id,
            "sub1" => &self.sub1,
            "sub2" => &self.sub2,
            "sub3" => &self.sub3,
            "sub4" => &self.sub4,
            "sub5" => &self.sub5,
            "sub6" => &self.sub6,
            "sub7" => &self.sub7,
            "sub8" => &self.sub8,
            "sub9" => &self.sub9,
            "sub10" => &self.sub10,
            _ => return None,
        };
        Some(value.as_str())
    }

    pub fn unique_id(&self) -> &str {
        &self.unique_id
    }

    /// `subN` for `N` in `1..=10`; any other index reads as empty.
    pub fn sub(&self, index: usize) -> &str {
        ATTRIBUTE_NAMES
            .get(index)
            .filter(|_| index >= 1)
            .and_then(|name| self.get(name))
            .unwrap_or("")
    }

    /// Fields in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> + '_ {
        ATTRIBUTE_NAMES
            .iter()
            .map(move |name| (*name, self.get(name).unwrap_or("")))
    }

    fn slot_mut(&mut self, name: &str) -> Option<&mut String> {
        let slot = match name {
            "uniqueId" => &mut self.unique_id,
            "sub1" => &mut self.sub1,
            "sub2" => &mut self.sub2,
            "sub3" => &mut self.sub3,
            "sub4" => &mut self.sub4,
            "sub5" => &mut self.sub5,
            "sub6" => &mut self.sub6,
            "sub7" => &mut self.sub7,
            "sub8" => &mut self.sub8,
            "sub9" => &mut self.sub9,
            "sub10" => &mut self.sub10,
            _ => return None,
        };
        Some(slot)
    }
}

fn string_or_null<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}
