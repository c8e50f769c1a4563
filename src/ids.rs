use serde::{Deserialize, Deserializer};
use uuid::Uuid;

const ALPHABET: &[u8] = b"23456789ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz";
const SHORT_LEN: usize = 22;

/// Random 22 character base57 token (a v4 UUID re-encoded).
pub fn short_uuid() -> String {
    encode_base57(Uuid::new_v4().as_u128())
}

fn encode_base57(mut n: u128) -> String {
    let base = ALPHABET.len() as u128;
    let mut out = Vec::with_capacity(SHORT_LEN);
    while n > 0 {
        out.push(ALPHABET[(n % base) as usize]);
        n /= base;
    }
    while out.len() < SHORT_LEN {
        out.push(ALPHABET[0]);
    }
    out.iter().rev().map(|&b| char::from(b)).collect()
}

/// One greater than the largest id, or 1 for an empty collection.
pub fn next_id(ids: impl IntoIterator<Item = i64>) -> i64 {
    ids.into_iter().max().unwrap_or(0) + 1
}

#[derive(Deserialize)]
#[serde(untagged)]
pub(crate) enum IdValue {
    Text(String),
    Number(i64),
}

impl From<IdValue> for String {
    fn from(v: IdValue) -> Self {
        match v {
            IdValue::Text(s) => s,
            IdValue::Number(n) => n.to_string(),
        }
    }
}

/// Accepts ids stored as strings or as integers (older sequential backends).
pub fn deserialize_id<'de, D>(de: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    IdValue::deserialize(de).map(String::from)
}
