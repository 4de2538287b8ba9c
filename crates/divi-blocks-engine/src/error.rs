/// Errors raised by preset and global data resolution.
///
/// Missing presets, groups and colors are never errors; they resolve to
/// empty attributes. Only caller mistakes and undecodable stored data are.
#[derive(Debug, thiserror::Error)]
pub enum PresetError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    #[error("Failed to decode stored option {key}")]
    Decode {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}
