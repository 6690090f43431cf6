use std::io::{Read, Write};

use java_dispatch::GeneratorError;
use prost::Message;
use prost_types::compiler::CodeGeneratorRequest;

fn main() -> Result<(), GeneratorError> {
    // stdout carries the encoded response, so diagnostics go to stderr.
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::WARN)
        .with_target(false)
        .with_ansi(false)
        .with_writer(std::io::stderr)
        .init();

    let mut input = Vec::new();
    std::io::stdin().read_to_end(&mut input)?;
    let request = CodeGeneratorRequest::decode(input.as_slice())?;

    let response = java_dispatch::generate_response(&request);

    std::io::stdout().write_all(&response.encode_to_vec())?;
    Ok(())
}
