pub mod agent_handlers;
pub mod event_handlers;
pub mod health;

pub use agent_handlers::create_agent_routes;
pub use event_handlers::create_event_routes;
pub use health::health_check;
