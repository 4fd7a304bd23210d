pub mod completion;
pub mod config;
pub mod job;
pub mod prepare;

pub use completion::{PendingRequest, Rejection, Settlement};
pub use config::{RequestConfig, RequestOptions};
pub use job::URLRequestJob;
pub use prepare::PreparedRequest;
