use {
    std::{fmt, str::FromStr},
    url::Url,
};

/// The Hedera network an operation runs against. Selected through the
/// `ENVIRONMENT` configuration value; anything other than the two known
/// values is a fatal configuration error.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Network {
    Testnet,
    Mainnet,
}

#[derive(Debug, thiserror::Error)]
#[error("unknown network environment {0:?}, must be either \"TEST\" or \"MAIN\"")]
pub struct UnknownNetwork(String);

impl FromStr for Network {
    type Err = UnknownNetwork;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "TEST" => Ok(Self::Testnet),
            "MAIN" => Ok(Self::Mainnet),
            _ => Err(UnknownNetwork(s.to_string())),
        }
    }
}

impl Network {
    /// The JSON-RPC relay endpoint for this network.
    pub fn rpc_url(&self) -> Url {
        let url = match self {
            Self::Testnet => "https://testnet.hashio.io/api",
            Self::Mainnet => "https://mainnet.hashio.io/api",
        };
        url.parse().expect("hardcoded url is valid")
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Testnet => f.write_str("testnet"),
            Self::Mainnet => f.write_str("mainnet"),
        }
    }
}
