use serde::Serialize;

#[derive(Serialize, Debug)]
pub struct Health {
    pub status: &'static str,
}

/// Body returned for every failed request.
#[derive(Serialize, Debug, Clone)]
pub struct ErrorBody {
    /// Machine-readable kind, e.g. `conflict`.
    pub error: String,
    pub code: u16,
    pub message: String,
}
