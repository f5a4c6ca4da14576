// Runtime services around the core: the upstream client, the dashboard
// service, scheduled polling, the HTTP API and WebSocket push.

pub mod client;
pub mod http;
pub mod poller;
pub mod protocol;
pub mod service;
pub mod session;
pub mod ws_server;
