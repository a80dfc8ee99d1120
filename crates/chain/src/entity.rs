use {
    alloy_primitives::Address,
    std::{fmt, str::FromStr},
};

/// A Hedera entity id in `shard.realm.num` form.
///
/// Entities also have a 20-byte EVM address encoding: 4 bytes shard, 8 bytes
/// realm, 8 bytes num, all big-endian. The field widths are exact so the
/// conversion is lossless in both directions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct EntityId {
    pub shard: u32,
    pub realm: u64,
    pub num: u64,
}

#[derive(Debug, thiserror::Error)]
#[error("malformed entity id {0:?}, expected `shard.realm.num`")]
pub struct ParseEntityIdError(String);

impl EntityId {
    pub fn from_evm_address(address: Address) -> Self {
        let bytes: [u8; 20] = address.into();
        Self {
            shard: u32::from_be_bytes(bytes[0..4].try_into().expect("slice of length 4")),
            realm: u64::from_be_bytes(bytes[4..12].try_into().expect("slice of length 8")),
            num: u64::from_be_bytes(bytes[12..20].try_into().expect("slice of length 8")),
        }
    }

    pub fn to_evm_address(self) -> Address {
        let mut bytes = [0_u8; 20];
        bytes[0..4].copy_from_slice(&self.shard.to_be_bytes());
        bytes[4..12].copy_from_slice(&self.realm.to_be_bytes());
        bytes[12..20].copy_from_slice(&self.num.to_be_bytes());
        Address::from(bytes)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.shard, self.realm, self.num)
    }
}

impl FromStr for EntityId {
    type Err = ParseEntityIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || ParseEntityIdError(s.to_string());
        let mut parts = s.split('.');
        let shard = parts.next().ok_or_else(malformed)?;
        let realm = parts.next().ok_or_else(malformed)?;
        let num = parts.next().ok_or_else(malformed)?;
        if parts.next().is_some() {
            return Err(malformed());
        }
        Ok(Self {
            shard: shard.parse().map_err(|_| malformed())?,
            realm: realm.parse().map_err(|_| malformed())?,
            num: num.parse().map_err(|_| malformed())?,
        })
    }
}

macro_rules! entity_id_newtype {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
        pub struct $name(pub EntityId);

        impl $name {
            pub fn from_evm_address(address: Address) -> Self {
                Self(EntityId::from_evm_address(address))
            }

            pub fn to_evm_address(self) -> Address {
                self.0.to_evm_address()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl FromStr for $name {
            type Err = ParseEntityIdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.parse().map(Self)
            }
        }
    };
}

entity_id_newtype! {
    /// Id of a Hedera account, e.g. `0.0.12345`.
    AccountId
}

entity_id_newtype! {
    /// Id of a deployed contract, e.g. `0.0.7890`.
    ContractId
}
