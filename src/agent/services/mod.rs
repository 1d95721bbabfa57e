//! Agent services.

mod assistant;
mod context;
mod legal;
mod parser;
mod prompts;
mod retry;
mod runtime;
mod validator;

pub use assistant::AssistantAgent;
pub use context::{AgentContext, StoredResult};
pub use legal::LegalAgent;
pub use parser::ParserAgent;
pub use prompts::{MENU_ITEMS, PromptCatalog, PromptError};
pub use retry::RetryExecutor;
pub use runtime::{Agent, AgentRuntime};
pub use validator::ValidatorAgent;
