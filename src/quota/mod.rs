mod probe;
mod types;

pub use probe::{ProbeError, QuotaProber};
pub use types::{ConfigsResponse, ModelConfig, QuotaInfo, QuotaRecord};
