//! Personal profiles
//!
//! A profile is the structured description of the diary's subject and the
//! people around them. Profiles are owned by an external profile service;
//! this crate only reads them.
//!
//! - `PersonalProfile`: the typed view the relationship graph is built from
//! - `ProfileSource`: the fetch-by-id seam
//! - `HttpProfileClient`: the HTTP implementation of `ProfileSource`

mod client;

pub use client::{HttpProfileClient, ProfileSource};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};

/// A person's profile document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonalProfile {
    /// Full name of the profile's subject (the main user)
    pub full_name: String,
    /// Family and friends
    #[serde(default)]
    pub social_interactions: SocialInteractions,
    /// The document exactly as the profile service returned it
    #[serde(skip)]
    raw: Value,
}

impl PersonalProfile {
    /// Create a profile with no family or friends
    pub fn new(full_name: impl Into<String>) -> Self {
        let mut profile = Self {
            full_name: full_name.into(),
            social_interactions: SocialInteractions::default(),
            raw: Value::Null,
        };
        profile.refresh_raw();
        profile
    }

    /// Parse a profile document, keeping the original JSON as the snapshot
    pub fn from_value(value: Value) -> Result<Self> {
        let mut profile: PersonalProfile = serde_json::from_value(value.clone())
            .map_err(|e| Error::Internal(format!("Invalid profile document: {}", e)))?;
        profile.raw = value;
        Ok(profile)
    }

    /// Add a family member under `relation_key` (e.g. "son", "daughter")
    pub fn with_family_member(mut self, relation_key: impl Into<String>, member: FamilyMember) -> Self {
        self.social_interactions
            .family
            .push((relation_key.into(), member));
        self.refresh_raw();
        self
    }

    /// Add a close friend
    pub fn with_friend(mut self, name: impl Into<String>) -> Self {
        self.social_interactions
            .friends
            .close_friends
            .push(FriendMember::new(name));
        self.refresh_raw();
        self
    }

    /// Family members in document order
    pub fn family(&self) -> impl Iterator<Item = (&str, &FamilyMember)> {
        self.social_interactions
            .family
            .iter()
            .map(|(key, member)| (key.as_str(), member))
    }

    /// Close friends in document order
    pub fn close_friends(&self) -> &[FriendMember] {
        &self.social_interactions.friends.close_friends
    }

    /// Verbatim profile snapshot, including fields this crate does not model
    pub fn snapshot(&self) -> &Value {
        &self.raw
    }

    fn refresh_raw(&mut self) {
        self.raw = serde_json::to_value(&*self).unwrap_or(Value::Null);
    }
}

/// The `social_interactions` section of a profile
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SocialInteractions {
    /// Family members keyed by their relation to the main user, in document order
    #[serde(default, with = "ordered_map")]
    pub family: Vec<(String, FamilyMember)>,
    /// Friends
    #[serde(default)]
    pub friends: Friends,
}

/// The `friends` section of a profile
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Friends {
    #[serde(default)]
    pub close_friends: Vec<FriendMember>,
}

/// A family member of the main user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FamilyMember {
    pub name: String,
    /// The member's own children (the main user's grandchildren)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<FamilyMember>,
    /// Remaining fields of the fragment, carried as node payload
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

impl FamilyMember {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            children: Vec::new(),
            extra: serde_json::Map::new(),
        }
    }

    pub fn with_child(mut self, child: FamilyMember) -> Self {
        self.children.push(child);
        self
    }
}

/// A close friend of the main user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FriendMember {
    pub name: String,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

impl FriendMember {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            extra: serde_json::Map::new(),
        }
    }
}

/// JSON objects as ordered key/value lists, so family order survives parsing
mod ordered_map {
    use serde::de::{MapAccess, Visitor};
    use serde::ser::SerializeMap;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::fmt;
    use std::marker::PhantomData;

    pub fn serialize<S, V>(entries: &[(String, V)], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
        V: Serialize,
    {
        let mut map = serializer.serialize_map(Some(entries.len()))?;
        for (key, value) in entries {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }

    pub fn deserialize<'de, D, V>(deserializer: D) -> Result<Vec<(String, V)>, D::Error>
    where
        D: Deserializer<'de>,
        V: Deserialize<'de>,
    {
        struct EntriesVisitor<V>(PhantomData<V>);

        impl<'de, V: Deserialize<'de>> Visitor<'de> for EntriesVisitor<V> {
            type Value = Vec<(String, V)>;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of relation keys to family members")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut entries = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((key, value)) = access.next_entry::<String, V>()? {
                    entries.push((key, value));
                }
                Ok(entries)
            }
        }

        deserializer.deserialize_map(EntriesVisitor(PhantomData))
    }
}
