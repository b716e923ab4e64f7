use std::sync::Arc;

use tracing::{error, warn};

use crate::assistant::{AssistantFlow, AssistantInput};
use crate::protocol::GatewayResult;

pub const EMPTY_QUERY_MESSAGE: &str = "Please enter a query.";
pub const UPSTREAM_FAILURE_MESSAGE: &str =
    "Sorry, I was unable to process your request. Please try again later.";

/// Validates a raw query, runs it through the assistant flow and folds every
/// outcome into a [`GatewayResult`].
///
/// Stateless apart from the flow handle, so one gateway is shared by all
/// requests.
#[derive(Clone)]
pub struct QueryGateway {
    flow: Arc<dyn AssistantFlow>,
}

impl QueryGateway {
    pub fn new(flow: Arc<dyn AssistantFlow>) -> Self {
        Self { flow }
    }

    pub async fn handle(&self, query: &str) -> GatewayResult {
        if query.trim().is_empty() {
            return GatewayResult::error(EMPTY_QUERY_MESSAGE);
        }

        match self.flow.invoke(AssistantInput::new(query)).await {
            Ok(output) => GatewayResult::answer(output.answer),
            Err(err) if err.is_contract_breach() => {
                error!(error = %err, "assistant flow broke its output contract");
                GatewayResult::error(UPSTREAM_FAILURE_MESSAGE)
            }
            Err(err) => {
                warn!(error = %err, "assistant flow failed");
                GatewayResult::error(UPSTREAM_FAILURE_MESSAGE)
            }
        }
    }
}
