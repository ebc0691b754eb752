//! Registry abstraction: `open_key`, key values and subkeys, and class
//! names, decoupled from any particular on-disk hive format. Offline
//! hive parsing only needs to work against this
//! interface, so tests exercise it through [`FakeHive`] rather than a
//! binary `regf` parser -- parsing the real NT registry container
//! format is its own undertaking, out of scope here.

use crate::error::{Result, WindowsError};
use std::collections::BTreeMap;

pub trait RegistryValue: Send + Sync {
    fn name(&self) -> &str;
    fn data(&self) -> &[u8];
}

pub trait RegistryKey: Send + Sync {
    fn values(&self) -> Vec<&dyn RegistryValue>;
    fn subkeys(&self) -> Vec<String>;
    fn class_name(&self) -> Option<&[u8]>;

    fn value(&self, name: &str) -> Option<&dyn RegistryValue> {
        self.values().into_iter().find(|v| v.name() == name)
    }
}

pub trait RegistryHive: Send + Sync {
    fn open_key(&self, path: &str) -> Result<Box<dyn RegistryKey + '_>>;
}

#[derive(Debug, Clone, Default)]
pub struct FakeValue {
    name: String,
    data: Vec<u8>,
}

impl FakeValue {
    pub fn new(name: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            data: data.into(),
        }
    }
}

impl RegistryValue for FakeValue {
    fn name(&self) -> &str {
        &self.name
    }

    fn data(&self) -> &[u8] {
        &self.data
    }
}

/// One node of an in-memory registry tree, used to build hive
/// fixtures in tests.
#[derive(Debug, Clone, Default)]
pub struct FakeKey {
    pub class_name: Option<Vec<u8>>,
    pub values: Vec<FakeValue>,
    pub subkeys: BTreeMap<String, FakeKey>,
}

impl FakeKey {
    pub fn with_class_name(mut self, class_name: impl Into<Vec<u8>>) -> Self {
        self.class_name = Some(class_name.into());
        self
    }

    pub fn with_value(mut self, value: FakeValue) -> Self {
        self.values.push(value);
        self
    }

    pub fn with_subkey(mut self, name: impl Into<String>, key: FakeKey) -> Self {
        self.subkeys.insert(name.into(), key);
        self
    }
}

struct FakeKeyRef<'a>(&'a FakeKey);

impl<'a> RegistryKey for FakeKeyRef<'a> {
    fn values(&self) -> Vec<&dyn RegistryValue> {
        self.0.values.iter().map(|v| v as &dyn RegistryValue).collect()
    }

    fn subkeys(&self) -> Vec<String> {
        self.0.subkeys.keys().cloned().collect()
    }

    fn class_name(&self) -> Option<&[u8]> {
        self.0.class_name.as_deref()
    }
}

#[derive(Debug, Clone, Default)]
pub struct FakeHive {
    root: FakeKey,
}

impl FakeHive {
    pub fn new(root: FakeKey) -> Self {
        Self { root }
    }
}

impl RegistryHive for FakeHive {
    fn open_key(&self, path: &str) -> Result<Box<dyn RegistryKey + '_>> {
        let mut node = &self.root;
        if !path.is_empty() {
            for segment in path.split('\\') {
                node = node
                    .subkeys
                    .get(segment)
                    .ok_or_else(|| WindowsError::KeyNotFound(path.to_string()))?;
            }
        }
        Ok(Box::new(FakeKeyRef(node)))
    }
}

/// Encodes an ASCII string as UTF-16-LE bytes, the wire shape every
/// string in a real registry hive is stored as.
pub fn utf16le(s: &str) -> Vec<u8> {
    s.encode_utf16().flat_map(u16::to_le_bytes).collect()
}

/// Decodes UTF-16-LE bytes back to a `String`, ignoring any trailing
/// NUL terminator pair.
pub fn from_utf16le(bytes: &[u8]) -> String {
    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|c| u16::from_le_bytes([c[0], c[1]]))
        .take_while(|&u| u != 0)
        .collect();
    String::from_utf16_lossy(&units)
}
