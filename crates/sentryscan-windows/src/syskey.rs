//! Syskey assembly from the SYSTEM hive.

use crate::error::{Result, WindowsError};
use crate::registry::{from_utf16le, RegistryHive};

/// Applying this table to the 16 hex-decoded bytes yields the syskey.
/// It is not an involution: applying it twice is not the identity.
const PERMUTATION: [usize; 16] = [8, 5, 4, 2, 11, 9, 13, 3, 0, 6, 1, 12, 14, 10, 15, 7];

const LSA_SUBKEYS: [&str; 4] = ["JD", "Skew1", "GBG", "Data"];

pub fn assemble_syskey(system: &dyn RegistryHive) -> Result<[u8; 16]> {
    let select = system.open_key("Select")?;
    let current_raw = select
        .value("Current")
        .ok_or_else(|| WindowsError::ValueNotFound {
            key: "Select".into(),
            value: "Current".into(),
        })?
        .data();
    if current_raw.len() < 4 {
        return Err(WindowsError::MalformedF);
    }
    let current = u32::from_le_bytes(current_raw[0..4].try_into().unwrap());
    let control_set = format!("ControlSet{current:03}");

    let mut hex_string = String::with_capacity(32);
    for name in LSA_SUBKEYS {
        let path = format!("{control_set}\\Control\\Lsa\\{name}");
        let key = system.open_key(&path)?;
        let class_name = key
            .class_name()
            .ok_or_else(|| WindowsError::KeyNotFound(path.clone()))?;
        hex_string.push_str(&from_utf16le(class_name));
    }

    if hex_string.len() != 32 {
        return Err(WindowsError::MalformedF);
    }
    let decoded = hex::decode(&hex_string)?;
    let input: [u8; 16] = decoded.try_into().map_err(|_| WindowsError::MalformedF)?;

    let mut syskey = [0u8; 16];
    for (i, &source_index) in PERMUTATION.iter().enumerate() {
        syskey[i] = input[source_index];
    }
    Ok(syskey)
}
