mod pyth;
pub use pyth::PythHermes;

use serde::{Deserialize, Serialize};

/// List of supported price fetchers.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PriceFetcher {
    /// Pyth Hermes.
    #[default]
    Pyth,
}
