//! Per-service view shared by the dispatcher and client generators.

use prost_types::{FileDescriptorProto, ServiceDescriptorProto};

use crate::error::GeneratorError;
use crate::index::{MessageRef, SchemaIndex};
use crate::resolve::{self, java_method_name};
use crate::source::SourceBuilder;

/// Request side of an RPC. Server streaming is not modelled and follows the
/// request side only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamingShape {
    Unary,
    ClientStreaming,
}

#[derive(Debug)]
pub struct MethodModel<'a> {
    /// Position inside the service; doubles as the runtime descriptor index.
    pub index: usize,
    pub rpc_name: &'a str,
    pub java_name: String,
    pub input: &'a MessageRef<'a>,
    pub output: &'a MessageRef<'a>,
    pub shape: StreamingShape,
    pub comment: Option<&'a str>,
}

impl MethodModel<'_> {
    pub fn input_name(&self) -> &str {
        self.input.name()
    }

    pub fn output_name(&self) -> &str {
        self.output.name()
    }
}

///
/// A service with every RPC type already resolved.
///
/// Building the model is where unresolved message references surface, so both
/// generated classes either get produced from the same consistent tables or not
/// at all.
///
#[derive(Debug)]
pub struct ServiceModel<'a> {
    pub file: &'a FileDescriptorProto,
    pub service: &'a ServiceDescriptorProto,
    pub index: usize,
    pub java_package: &'a str,
    pub comment: Option<&'a str>,
    pub methods: Vec<MethodModel<'a>>,
}

impl<'a> ServiceModel<'a> {
    pub fn new(
        index: &'a SchemaIndex<'a>,
        file: &'a FileDescriptorProto,
        service_index: usize,
    ) -> Result<Self, GeneratorError> {
        let service =
            file.service
                .get(service_index)
                .ok_or_else(|| GeneratorError::MissingServiceIndex {
                    file: file.name().to_string(),
                    index: service_index,
                })?;

        let methods = service
            .method
            .iter()
            .enumerate()
            .map(|(i, method)| -> Result<MethodModel<'a>, GeneratorError> {
                let (input, output) = index.method_types(method)?;
                if method.server_streaming() {
                    tracing::warn!(
                        service = service.name(),
                        method = method.name(),
                        "server streaming is not supported; generating from the request side only"
                    );
                }
                Ok(MethodModel {
                    index: i,
                    rpc_name: method.name(),
                    java_name: java_method_name(method.name()),
                    input,
                    output,
                    shape: if method.client_streaming() {
                        StreamingShape::ClientStreaming
                    } else {
                        StreamingShape::Unary
                    },
                    comment: index.method_comment(file, service_index, i),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            file,
            service,
            index: service_index,
            java_package: resolve::java_package(file),
            comment: index.service_comment(file, service_index),
            methods,
        })
    }

    pub fn name(&self) -> &str {
        self.service.name()
    }

    /// Imports every RPC type that lives outside the generated class's package.
    pub fn import_message_types(&self, source: &mut SourceBuilder) {
        for method in &self.methods {
            for message in [method.input, method.output] {
                if resolve::needs_import(self.java_package, message) {
                    source.add_import(resolve::resolve(message).to_string());
                }
            }
        }
    }

    pub fn methods_of(&self, shape: StreamingShape) -> impl Iterator<Item = &MethodModel<'a>> {
        self.methods.iter().filter(move |method| method.shape == shape)
    }
}
