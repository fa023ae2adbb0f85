pub mod addresses;
pub mod settings;

pub use addresses::{load_addresses, BranchAddresses, DeployedAddresses};
pub use settings::Settings;
