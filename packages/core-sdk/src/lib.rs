pub mod agents;
pub mod config;
pub mod conversation;
pub mod error;
pub mod llm;
pub mod models;
pub mod pipeline;
pub mod server;
pub mod telemetry;
pub mod validator;

pub use error::MergeError;

/**
 * \brief SDK 预导入集合，方便外部引用常用模块。
 */
pub mod prelude {
    pub use crate::agents;
    pub use crate::config;
    pub use crate::conversation;
    pub use crate::llm;
    pub use crate::models;
    pub use crate::pipeline;
    pub use crate::server;
    pub use crate::telemetry;
    pub use crate::validator;
}
