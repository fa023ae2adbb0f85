pub mod a2a_client;
pub mod chain_reader;
pub mod events;
pub mod monitor;
pub mod registry;

pub use a2a_client::{CdpProvider, HttpCdpProvider};
pub use chain_reader::{ChainReader, RpcChainReader};
pub use events::EventHub;
pub use monitor::PositionMonitor;
pub use registry::{AgentRecord, AgentRegistry};
