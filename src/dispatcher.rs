//! Abstract service base: one overridable method per RPC plus the index-based
//! dispatch the runtime calls into.

use prost_types::FileDescriptorProto;

use crate::config::GeneratorConfig;
use crate::error::GeneratorError;
use crate::index::SchemaIndex;
use crate::resolve;
use crate::service::{MethodModel, ServiceModel, StreamingShape};
use crate::source::{Body, SourceBuilder};
use crate::GeneratedFile;

const NOT_CONTAINED: &str =
    "    throw new IllegalArgumentException(\"Method not contained by this service.\");";

/// `AbstractEcho` for service `Echo`.
pub fn class_name(service: &str) -> String {
    format!("Abstract{service}")
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
        .set_abstract(true)
        .add_type_parameter("T")
        .add_implements("Api<T>")
        .set_javadoc(model.comment);
    if let Some(annotation) = crate::generated_annotation(config) {
        source.add_annotation(annotation);
    }
    source
        .add_annotation("@SuppressWarnings(\"unchecked\")")
        .add_import("com.google.protobuf.Message")
        .add_import("com.google.protobuf.Descriptors.MethodDescriptor")
        .add_import("com.google.protobuf.Descriptors.ServiceDescriptor")
        .add_import(format!("{runtime}.Api"))
        .add_import(format!("{runtime}.Observer"));
    model.import_message_types(&mut source);

    for method in &model.methods {
        add_rpc_method(&mut source, method);
    }

    add_descriptor_for_type(&mut source, model);
    add_prototype_lookup(&mut source, model, Prototype::Request);
    add_prototype_lookup(&mut source, model, Prototype::Response);
    add_unary_call(&mut source, model);
    add_streaming_call(&mut source, model);

    tracing::debug!(service = model.name(), class = %class_name, "generated dispatcher");

    GeneratedFile {
        name: resolve::source_path(model.java_package, &class_name),
        content: source.to_string(),
    }
}

// A client-streaming RPC hands back the observer the caller pushes requests
// into, so it takes no request parameter.
fn add_rpc_method(source: &mut SourceBuilder, method: &MethodModel<'_>) {
    let rpc = source.add_method(&method.java_name);
    rpc.set_javadoc(method.comment).set_abstract(true);

    match method.shape {
        StreamingShape::Unary => {
            rpc.add_parameter("T", "ctx")
                .add_parameter(method.input_name(), "request")
                .add_parameter(format!("Observer<{}>", method.output_name()), "observer");
        }
        StreamingShape::ClientStreaming => {
            rpc.set_return(format!("Observer<{}>", method.input_name()))
                .add_parameter("T", "ctx")
                .add_parameter(format!("Observer<{}>", method.output_name()), "observer");
        }
    }
}

fn add_descriptor_for_type(source: &mut SourceBuilder, model: &ServiceModel<'_>) {
    source
        .add_method("getDescriptorForType")
        .set_return("ServiceDescriptor")
        .add_annotation("@Override")
        .set_final(true)
        .body()
        .line(format!(
            "return {}.getDescriptor().getServices().get({});",
            resolve::outer_classname(model.file),
            model.index
        ));
}

#[derive(Debug, Clone, Copy)]
enum Prototype {
    Request,
    Response,
}

fn add_prototype_lookup(
    source: &mut SourceBuilder,
    model: &ServiceModel<'_>,
    prototype: Prototype,
) {
    let name = match prototype {
        Prototype::Request => "getRequestPrototype",
        Prototype::Response => "getResponsePrototype",
    };
    let body = source
        .add_method(name)
        .set_return("Message")
        .add_annotation("@Override")
        .set_final(true)
        .add_parameter("MethodDescriptor", "method")
        .body();

    open_switch(body);
    for method in &model.methods {
        let message = match prototype {
            Prototype::Request => method.input_name(),
            Prototype::Response => method.output_name(),
        };
        body.line(format!("case {}:", method.index))
            .line(format!("    return {message}.getDefaultInstance();"));
    }
    close_switch(body);
}

// The casts below are unchecked. They are sound only because each `case` index
// is the RPC's position in the service descriptor, and both come from the same
// method list.
fn add_unary_call(source: &mut SourceBuilder, model: &ServiceModel<'_>) {
    let body = source
        .add_method("callMethod")
        .add_annotation("@Override")
        .set_final(true)
        .add_parameter("MethodDescriptor", "method")
        .add_parameter("T", "ctx")
        .add_parameter("Message", "request")
        .add_parameter("Observer<Message>", "future")
        .body();

    open_switch(body);
    for method in model.methods_of(StreamingShape::Unary) {
        body.line(format!("case {}:", method.index))
            .line(format!(
                "    {}(ctx, ({}) request, (Observer<{}>)(Object) future);",
                method.java_name,
                method.input_name(),
                method.output_name()
            ))
            .line("    return;");
    }
    close_switch(body);
}

fn add_streaming_call(source: &mut SourceBuilder, model: &ServiceModel<'_>) {
    let body = source
        .add_method("callMethod")
        .set_return("Observer<Message>")
        .add_annotation("@Override")
        .set_final(true)
        .add_parameter("MethodDescriptor", "method")
        .add_parameter("T", "ctx")
        .add_parameter("Observer<Message>", "future")
        .body();

    open_switch(body);
    for method in model.methods_of(StreamingShape::ClientStreaming) {
        body.line(format!("case {}:", method.index)).line(format!(
            "    return (Observer<Message>)(Object) {}(ctx, (Observer<{}>)(Object) future);",
            method.java_name,
            method.output_name()
        ));
    }
    close_switch(body);
}

fn open_switch(body: &mut Body) {
    body.line("if (method.getService() != getDescriptorForType()) {")
        .line(NOT_CONTAINED)
        .line("}")
        .line("switch (method.getIndex()) {");
}

// Reaching `default` means the descriptor and this class were generated from
// different schemas.
fn close_switch(body: &mut Body) {
    body.line("default:")
        .line("    throw new IllegalStateException();")
        .line("}");
}
