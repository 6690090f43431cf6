//! Generates Java service stubs from protobuf service definitions.
//!
//! For every service declared in the request, two classes come out:
//!
//! - `Abstract<Service><T>`: an abstract base with one method per RPC, plus the
//!   final `getDescriptorForType` / `getRequestPrototype` /
//!   `getResponsePrototype` / `callMethod` implementations that route a generic,
//!   index-addressed call to the matching RPC method.
//! - `<Service>Client`: extends the base and forwards every RPC to a generic
//!   `MethodHandler`.
//!
//! # Example
//!
//! Given this proto file:
//! ```protobuf
//! syntax = "proto3";
//! package demo;
//! option java_package = "demo";
//! option java_multiple_files = true;
//!
//! service Echo {
//!     rpc Say(EchoRequest) returns (EchoReply);
//! }
//! ```
//!
//! the plugin writes `demo/AbstractEcho.java` declaring
//! ```java
//! public abstract void say(T ctx, EchoRequest request, Observer<EchoReply> observer);
//! ```
//! and `demo/EchoClient.java`, whose `say` calls
//! `handler.call(getDescriptorForType().getMethods().get(0), request, EchoReply.getDefaultInstance(), observer)`.

pub mod client;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod index;
pub mod resolve;
pub mod service;
pub mod source;

use prost_types::compiler::code_generator_response::{Feature, File};
use prost_types::compiler::{CodeGeneratorRequest, CodeGeneratorResponse};
use prost_types::FileDescriptorProto;

pub use config::GeneratorConfig;
pub use error::GeneratorError;
pub use index::SchemaIndex;
use service::ServiceModel;

/// Recorded as `value` of the `@Generated` annotation.
pub const GENERATOR_NAME: &str = env!("CARGO_PKG_NAME");

/// One output file: a path relative to the protoc output directory and its text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedFile {
    pub name: String,
    pub content: String,
}

impl From<GeneratedFile> for File {
    fn from(file: GeneratedFile) -> Self {
        File {
            name: Some(file.name),
            content: Some(file.content),
            ..Default::default()
        }
    }
}

///
/// Generates the dispatcher and client of every service in `files`.
///
/// Files are indexed first, so RPCs may reference messages from any file of the
/// request. Output order follows the input: file by file, service by service,
/// dispatcher before client.
///
pub fn generate(
    files: &[FileDescriptorProto],
    config: &GeneratorConfig,
) -> Result<Vec<GeneratedFile>, GeneratorError> {
    let index = SchemaIndex::build(files)?;
    let mut output = Vec::new();

    for file in index.files() {
        for service_index in 0..file.service.len() {
            let model = ServiceModel::new(&index, file, service_index)?;
            output.push(dispatcher::render(&model, config));
            output.push(client::render(&model, config));
        }
    }

    tracing::info!(
        files = files.len(),
        generated = output.len(),
        "generation finished"
    );

    Ok(output)
}

///
/// Runs a whole plugin invocation.
///
/// Failures are reported through [`CodeGeneratorResponse::error`], which protoc
/// prints and turns into a failed build, instead of tearing down the process.
///
pub fn generate_response(request: &CodeGeneratorRequest) -> CodeGeneratorResponse {
    let result = GeneratorConfig::from_parameter(request.parameter())
        .and_then(|config| generate(&request.proto_file, &config));

    match result {
        Ok(files) => CodeGeneratorResponse {
            file: files.into_iter().map(File::from).collect(),
            supported_features: Some(Feature::Proto3Optional as u64),
            ..Default::default()
        },
        Err(e) => {
            tracing::error!(error = %e, "generation failed");
            CodeGeneratorResponse {
                error: Some(e.to_string()),
                ..Default::default()
            }
        }
    }
}

pub(crate) fn generated_annotation(config: &GeneratorConfig) -> Option<String> {
    config.generated_annotation.then(|| {
        format!(
            "@javax.annotation.processing.Generated(value = \"{GENERATOR_NAME}\", date = \"{}\")",
            config.timestamp
        )
    })
}
