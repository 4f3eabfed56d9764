//! 协议转换层
//!
//! OpenAI Chat Completions 与 opencode 会话 API 之间的纯函数转换，不做任何 I/O。
//!
//! ```text
//! translator/
//! ├── traits.rs          # 转换器 trait 定义
//! ├── prompt.rs          # messages → 提示词 + system
//! ├── model_resolver.rs  # 模型名 → providerID/modelID
//! ├── response.rs        # opencode parts → 助手文本
//! └── opencode.rs        # ChatCompletionRequest → PromptBody
//! ```

pub mod model_resolver;
pub mod opencode;
pub mod prompt;
pub mod response;
pub mod traits;

pub use model_resolver::ModelResolver;
pub use opencode::OpencodeRequestTranslator;
pub use prompt::{build_prompt, merge_system, text_from_content, PromptText};
pub use response::{extract_text, part_types};
pub use traits::RequestTranslator;
