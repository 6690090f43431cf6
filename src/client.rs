//! Concrete client: implements every RPC of the abstract base by forwarding it
//! to a `MethodHandler` supplied at construction.

use prost_types::FileDescriptorProto;

use crate::config::GeneratorConfig;
use crate::dispatcher;
use crate::error::GeneratorError;
use crate::index::SchemaIndex;
use crate::resolve;
use crate::service::{MethodModel, ServiceModel, StreamingShape};
use crate::source::SourceBuilder;
use crate::GeneratedFile;

/// `EchoClient` for service `Echo`.
pub fn class_name(service: &str) -> String {
    format!("{service}Client")
}

pub fn generate<'a>(
    index: &'a SchemaIndex<'a>,
    config: &GeneratorConfig,
    file: &'a FileDescriptorProto,
    service_index: usize,
) -> Result<GeneratedFile, GeneratorError> {
    let model = ServiceModel::new(index, file, service_index)?;
    Ok(render(&model, config))
}

pub(crate) fn render(model: &ServiceModel<'_>, config: &GeneratorConfig) -> GeneratedFile {
    let class_name = class_name(model.name());
    let runtime = &config.runtime_package;

    let mut source = SourceBuilder::new(&class_name);
    source
        .set_package(model.java_package)
        .set_javadoc(model.comment)
        .set_extends(format!("{}<Void>", dispatcher::class_name(model.name())))
        .add_import(format!("{runtime}.MethodHandler"))
        .add_import(format!("{runtime}.Observer"));
    if let Some(annotation) = crate::generated_annotation(config) {
        source.add_annotation(annotation);
    }
    model.import_message_types(&mut source);

    source.add_field("MethodHandler", "handler");
    source
        .add_constructor()
        .add_parameter("MethodHandler", "handler")
        .body()
        .line("this.handler = handler;");

    for method in &model.methods {
        add_rpc_call(&mut source, method);
    }

    tracing::debug!(service = model.name(), class = %class_name, "generated client");

    GeneratedFile {
        name: resolve::source_path(model.java_package, &class_name),
        content: source.to_string(),
    }
}

fn add_rpc_call(source: &mut SourceBuilder, method: &MethodModel<'_>) {
    let input = method.input_name();
    let output = method.output_name();

    let rpc = source.add_method(&method.java_name);
    rpc.set_javadoc(method.comment)
        .add_annotation("@Override")
        .set_final(true);

    match method.shape {
        StreamingShape::Unary => {
            rpc.add_parameter("Void", "ctx")
                .add_parameter(input, "request")
                .add_parameter(format!("Observer<{output}>"), "observer")
                .body()
                .line("handler.call(")
                .line(format!(
                    "    getDescriptorForType().getMethods().get({}),",
                    method.index
                ))
                .line("    request,")
                .line(format!("    {output}.getDefaultInstance(),"))
                .line("    observer);");
        }
        // The handler only knows `Observer<Message>`; narrowing it to the RPC's
        // request type relies on the prototypes passed alongside.
        StreamingShape::ClientStreaming => {
            rpc.add_annotation("@SuppressWarnings(\"unchecked\")")
                .set_return(format!("Observer<{input}>"))
                .add_parameter("Void", "ctx")
                .add_parameter(format!("Observer<{output}>"), "observer")
                .body()
                .line(format!(
                    "return (Observer<{input}>)(Object) handler.streamingCall("
                ))
                .line(format!(
                    "    getDescriptorForType().getMethods().get({}),",
                    method.index
                ))
                .line(format!("    {input}.getDefaultInstance(),"))
                .line(format!("    {output}.getDefaultInstance(),"))
                .line("    observer);");
        }
    }
}
