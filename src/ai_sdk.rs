mod anthropic;

pub use anthropic::{
    ContentBlock, MessageParam, MessageRequest, MessageResponse, ResponseContentBlock,
    ToolChoice, ToolDefinitionApi, UserMessage, tool_input,
};
