//! Hedera network selection and entity id domain types shared between the
//! monitor and the deployer.

mod entity;
mod network;

pub use {
    entity::{AccountId, ContractId, EntityId, ParseEntityIdError},
    network::{Network, UnknownNetwork},
};
