//! RailMadad AI: a travel-assistant gateway that forwards railway questions to
//! a hosted language model and answers with `{"answer"}` or `{"error"}`.

pub mod ai_sdk;
pub mod assistant;
pub mod client;
pub mod config;
pub mod gateway;
pub mod protocol;
pub mod server;
pub mod ui;

pub use assistant::{AssistantFlow, AssistantInput, AssistantOutput, FlowError, TravelAssistant};
pub use client::{ClientError, GatewayClient};
pub use config::ModelConfig;
pub use gateway::{EMPTY_QUERY_MESSAGE, QueryGateway, UPSTREAM_FAILURE_MESSAGE};
pub use protocol::{GatewayResult, QueryRequest};
pub use server::{ServerConfig, build_app};
