pub mod request;
pub mod response;

pub use request::{
    InvalidEnvelope, JsonRpcRequest, PrintPageParams, RpcId, SearchAndPrintPageParams, SearchWebParams,
    ToolCallParams,
};
pub use response::{
    JsonRpcError, JsonRpcResponse, SseMessage, ToolResult, ToolResultContent, ENDPOINT_EVENT,
    ERROR_EVENT, MESSAGE_EVENT, PING_DATA, PING_EVENT,
};
