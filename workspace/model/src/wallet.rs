use serde::{Deserialize, Serialize};

use crate::ids::WalletId;

/// A named source or destination of funds. Read-only for this client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wallet {
    #[serde(alias = "uuid")]
    pub id: WalletId,
    #[serde(alias = "title")]
    pub name: String,
}

impl Wallet {
    pub fn new(id: WalletId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}
