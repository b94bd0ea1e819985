//! Cloud architectures a target can be compiled for.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Selects a cloud infrastructure to target when compiling.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Arch {
    /// No target specified.
    #[default]
    None,
    /// Amazon Web Services.
    Aws,
    /// Google Cloud Platform.
    Gcp,
    /// Microsoft Azure.
    Azure,
    /// VMware vSphere and friends.
    VMware,
}

const NO_ARCH: &str = "";
const AWS_ARCH: &str = "aws";
const GCP_ARCH: &str = "gcp";
const AZURE_ARCH: &str = "azure";
const VMWARE_ARCH: &str = "vmware";

/// Human-friendly names to the architectures they select.
pub static ARCH_MAP: Lazy<HashMap<&'static str, Arch>> = Lazy::new(|| {
    HashMap::from([
        (NO_ARCH, Arch::None),
        (AWS_ARCH, Arch::Aws),
        (GCP_ARCH, Arch::Gcp),
        (AZURE_ARCH, Arch::Azure),
        (VMWARE_ARCH, Arch::VMware),
    ])
});

/// Architectures to their human-friendly names.
pub static ARCH_NAMES: Lazy<HashMap<Arch, &'static str>> =
    Lazy::new(|| ARCH_MAP.iter().map(|(name, arch)| (*arch, *name)).collect());

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown cloud architecture '{0}' (expected one of: aws, gcp, azure, vmware)")]
pub struct UnknownArch(pub String);

impl Arch {
    pub const ALL: [Arch; 5] = [Arch::None, Arch::Aws, Arch::Gcp, Arch::Azure, Arch::VMware];

    /// The name this architecture is spelled as in stack documents; empty for [`Arch::None`].
    pub fn name(self) -> &'static str {
        ARCH_NAMES[&self]
    }

    pub fn is_none(self) -> bool {
        self == Arch::None
    }
}

impl fmt::Display for Arch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arch::None => f.write_str("none"),
            arch => f.write_str(arch.name()),
        }
    }
}

impl FromStr for Arch {
    type Err = UnknownArch;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ARCH_MAP.get(s).copied().ok_or_else(|| UnknownArch(s.to_string()))
    }
}

impl TryFrom<String> for Arch {
    type Error = UnknownArch;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Arch> for String {
    fn from(arch: Arch) -> Self {
        arch.name().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_round_trip_through_both_tables() {
        for arch in Arch::ALL {
            assert_eq!(ARCH_MAP[arch.name()], arch);
        }
        assert_eq!(ARCH_MAP.len(), ARCH_NAMES.len());
    }

    #[test]
    fn test_empty_name_selects_no_arch() {
        assert_eq!("".parse::<Arch>(), Ok(Arch::None));
        assert_eq!(Arch::None.name(), "");
        assert_eq!(Arch::None.to_string(), "none");
    }

    #[test]
    fn test_unknown_name_is_rejected() {
        let err = "AWS".parse::<Arch>().unwrap_err();
        assert_eq!(err, UnknownArch("AWS".to_string()));
        assert!(serde_json::from_str::<Arch>("\"openstack\"").is_err());
    }

    #[test]
    fn test_serializes_as_name() {
        assert_eq!(serde_json::to_string(&Arch::VMware).unwrap(), "\"vmware\"");
        assert_eq!(serde_json::from_str::<Arch>("\"gcp\"").unwrap(), Arch::Gcp);
    }
}
