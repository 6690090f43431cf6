///
/// [`GeneratorError`] is returned by every stage of a generation run.
///
/// Schema-consistency problems abort the whole run: the generated classes share
/// one set of type tables, so a partial response is never written.
///
#[derive(Debug, thiserror::Error)]
pub enum GeneratorError {
    #[error("Method `{method}` references unknown message type `{type_name}`")]
    UnresolvedType { method: String, type_name: String },
    #[error("Message type `{type_name}` is declared in both `{first}` and `{second}`")]
    SchemaConflict {
        type_name: String,
        first: String,
        second: String,
    },
    #[error("File `{file}` has no service at index {index}")]
    MissingServiceIndex { file: String, index: usize },
    #[error("Invalid plugin parameter: {0}")]
    InvalidParameter(String),
    #[error("Failed to decode CodeGeneratorRequest: {0}")]
    Decode(#[from] prost::DecodeError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
