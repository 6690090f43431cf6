//! End-to-end tests for the generator.
//!
//! Descriptors are assembled by hand, the way protoc would hand them to the
//! plugin, so no protoc binary is needed to run these.
use java_dispatch::{generate, generate_response, GeneratedFile, GeneratorConfig, GeneratorError};
use pretty_assertions::assert_eq;
use prost_types::compiler::CodeGeneratorRequest;
use prost_types::source_code_info::Location;
use prost_types::{
    DescriptorProto, FileDescriptorProto, FileOptions, MethodDescriptorProto,
    ServiceDescriptorProto, SourceCodeInfo,
};

const TIMESTAMP: &str = "2024-01-01T00:00:00.000Z";

fn config() -> GeneratorConfig {
    GeneratorConfig {
        generated_annotation: false,
        ..GeneratorConfig::default().with_timestamp(TIMESTAMP)
    }
}

fn message(name: &str) -> DescriptorProto {
    DescriptorProto {
        name: Some(name.to_string()),
        ..Default::default()
    }
}

fn unary(name: &str, input: &str, output: &str) -> MethodDescriptorProto {
    MethodDescriptorProto {
        name: Some(name.to_string()),
        input_type: Some(input.to_string()),
        output_type: Some(output.to_string()),
        ..Default::default()
    }
}

fn client_streaming(name: &str, input: &str, output: &str) -> MethodDescriptorProto {
    MethodDescriptorProto {
        client_streaming: Some(true),
        ..unary(name, input, output)
    }
}

fn service(name: &str, methods: Vec<MethodDescriptorProto>) -> ServiceDescriptorProto {
    ServiceDescriptorProto {
        name: Some(name.to_string()),
        method: methods,
        ..Default::default()
    }
}

fn echo_file() -> FileDescriptorProto {
    FileDescriptorProto {
        name: Some("demo/echo.proto".to_string()),
        package: Some("demo".to_string()),
        message_type: vec![message("EchoRequest"), message("EchoReply")],
        service: vec![service(
            "Echo",
            vec![unary("Say", ".demo.EchoRequest", ".demo.EchoReply")],
        )],
        options: Some(FileOptions {
            java_package: Some("demo".to_string()),
            java_multiple_files: Some(true),
            java_outer_classname: Some("EchoProto".to_string()),
            ..Default::default()
        }),
        ..Default::default()
    }
}

fn find<'a>(files: &'a [GeneratedFile], name: &str) -> &'a GeneratedFile {
    files
        .iter()
        .find(|file| file.name == name)
        .unwrap_or_else(|| panic!("no generated file named {name}"))
}

fn lines_starting_with(content: &str, prefix: &str) -> usize {
    content.lines().filter(|line| line.starts_with(prefix)).count()
}

#[test]
fn echo_dispatcher_matches_expected_source() {
    let files = generate(&[echo_file()], &config()).unwrap();

    let expected = r#"package demo;

import com.google.protobuf.Descriptors.MethodDescriptor;
import com.google.protobuf.Descriptors.ServiceDescriptor;
import com.google.protobuf.Message;
import org.yamcs.api.Api;
import org.yamcs.api.Observer;

@SuppressWarnings("unchecked")
public abstract class AbstractEcho<T> implements Api<T> {

    public abstract void say(T ctx, EchoRequest request, Observer<EchoReply> observer);

    @Override
    public final ServiceDescriptor getDescriptorForType() {
        return EchoProto.getDescriptor().getServices().get(0);
    }

    @Override
    public final Message getRequestPrototype(MethodDescriptor method) {
        if (method.getService() != getDescriptorForType()) {
            throw new IllegalArgumentException("Method not contained by this service.");
        }
        switch (method.getIndex()) {
        case 0:
            return EchoRequest.getDefaultInstance();
        default:
            throw new IllegalStateException();
        }
    }

    @Override
    public final Message getResponsePrototype(MethodDescriptor method) {
        if (method.getService() != getDescriptorForType()) {
            throw new IllegalArgumentException("Method not contained by this service.");
        }
        switch (method.getIndex()) {
        case 0:
            return EchoReply.getDefaultInstance();
        default:
            throw new IllegalStateException();
        }
    }

    @Override
    public final void callMethod(MethodDescriptor method, T ctx, Message request, Observer<Message> future) {
        if (method.getService() != getDescriptorForType()) {
            throw new IllegalArgumentException("Method not contained by this service.");
        }
        switch (method.getIndex()) {
        case 0:
            say(ctx, (EchoRequest) request, (Observer<EchoReply>)(Object) future);
            return;
        default:
            throw new IllegalStateException();
        }
    }

    @Override
    public final Observer<Message> callMethod(MethodDescriptor method, T ctx, Observer<Message> future) {
        if (method.getService() != getDescriptorForType()) {
            throw new IllegalArgumentException("Method not contained by this service.");
        }
        switch (method.getIndex()) {
        default:
            throw new IllegalStateException();
        }
    }
}
"#;
    assert_eq!(find(&files, "demo/AbstractEcho.java").content, expected);
}

#[test]
fn echo_client_matches_expected_source() {
    let files = generate(&[echo_file()], &config()).unwrap();

    let expected = r#"package demo;

import org.yamcs.api.MethodHandler;
import org.yamcs.api.Observer;

public class EchoClient extends AbstractEcho<Void> {

    private final MethodHandler handler;

    public EchoClient(MethodHandler handler) {
        this.handler = handler;
    }

    @Override
    public final void say(Void ctx, EchoRequest request, Observer<EchoReply> observer) {
        handler.call(
            getDescriptorForType().getMethods().get(0),
            request,
            EchoReply.getDefaultInstance(),
            observer);
    }
}
"#;
    assert_eq!(find(&files, "demo/EchoClient.java").content, expected);
}

#[test]
fn outputs_follow_file_and_service_order() {
    let mut second = echo_file();
    second.name = Some("demo/more.proto".to_string());
    second.package = Some("demo.more".to_string());
    second.options = Some(FileOptions {
        java_package: Some("org.demo.more".to_string()),
        ..Default::default()
    });
    second.message_type = vec![];
    second.service = vec![
        service("Alpha", vec![unary("Ping", ".demo.EchoRequest", ".demo.EchoReply")]),
        service("Beta", vec![]),
    ];

    let files = generate(&[echo_file(), second], &config()).unwrap();
    let names: Vec<_> = files.iter().map(|file| file.name.as_str()).collect();
    assert_eq!(
        names,
        [
            "demo/AbstractEcho.java",
            "demo/EchoClient.java",
            "org/demo/more/AbstractAlpha.java",
            "org/demo/more/AlphaClient.java",
            "org/demo/more/AbstractBeta.java",
            "org/demo/more/BetaClient.java",
        ]
    );

    // Beta lives in the second file, at service index 1.
    assert!(find(&files, "org/demo/more/AbstractBeta.java")
        .content
        .contains("return More.getDescriptor().getServices().get(1);"));
}

#[test]
fn dispatcher_has_one_abstract_method_per_rpc_and_five_final_dispatchers() {
    let mut file = echo_file();
    file.service[0].method = vec![
        unary("Say", ".demo.EchoRequest", ".demo.EchoReply"),
        client_streaming("Upload", ".demo.EchoRequest", ".demo.EchoReply"),
        unary("Shout", ".demo.EchoRequest", ".demo.EchoReply"),
    ];

    let files = generate(&[file], &config()).unwrap();
    let dispatcher = &find(&files, "demo/AbstractEcho.java").content;

    assert_eq!(lines_starting_with(dispatcher, "    public abstract "), 3);
    assert_eq!(lines_starting_with(dispatcher, "    public final "), 5);
}

#[test]
fn switches_enumerate_every_index_once_in_declaration_order() {
    let mut file = echo_file();
    file.message_type.push(message("Chunk"));
    file.message_type.push(message("Summary"));
    file.service[0].method = vec![
        unary("Say", ".demo.EchoRequest", ".demo.EchoReply"),
        client_streaming("Upload", ".demo.Chunk", ".demo.Summary"),
        unary("Shout", ".demo.EchoRequest", ".demo.EchoReply"),
        client_streaming("Collect", ".demo.Chunk", ".demo.EchoReply"),
    ];

    let files = generate(&[file], &config()).unwrap();
    let dispatcher = &find(&files, "demo/AbstractEcho.java").content;

    let methods: Vec<&str> = dispatcher.split("\n\n").collect();
    let cases = |signature: &str| -> Vec<String> {
        let block = methods
            .iter()
            .find(|block| block.contains(signature))
            .unwrap_or_else(|| panic!("missing {signature}"));
        block
            .lines()
            .map(str::trim)
            .filter(|line| line.starts_with("case "))
            .map(str::to_string)
            .collect()
    };

    let all = ["case 0:", "case 1:", "case 2:", "case 3:"];
    assert_eq!(cases("getRequestPrototype("), all);
    assert_eq!(cases("getResponsePrototype("), all);
    assert_eq!(cases("void callMethod("), ["case 0:", "case 2:"]);
    assert_eq!(cases("Observer<Message> callMethod("), ["case 1:", "case 3:"]);

    assert!(dispatcher.contains(
        "        case 1:\n            return Chunk.getDefaultInstance();\n        case 2:\n"
    ));
    assert!(dispatcher.contains(
        "        case 3:\n            return (Observer<Message>)(Object) collect(ctx, (Observer<EchoReply>)(Object) future);\n"
    ));
}

#[test]
fn client_streaming_inverts_the_signature() {
    let mut file = echo_file();
    file.message_type.push(message("Chunk"));
    file.message_type.push(message("Summary"));
    file.service[0].method = vec![
        unary("Say", ".demo.EchoRequest", ".demo.EchoReply"),
        client_streaming("Upload", ".demo.Chunk", ".demo.Summary"),
    ];

    let files = generate(&[file], &config()).unwrap();
    let dispatcher = &find(&files, "demo/AbstractEcho.java").content;
    let client = &find(&files, "demo/EchoClient.java").content;

    assert!(dispatcher.contains(
        "    public abstract void say(T ctx, EchoRequest request, Observer<EchoReply> observer);\n"
    ));
    assert!(dispatcher.contains(
        "    public abstract Observer<Chunk> upload(T ctx, Observer<Summary> observer);\n"
    ));

    let expected_upload = r#"    @Override
    @SuppressWarnings("unchecked")
    public final Observer<Chunk> upload(Void ctx, Observer<Summary> observer) {
        return (Observer<Chunk>)(Object) handler.streamingCall(
            getDescriptorForType().getMethods().get(1),
            Chunk.getDefaultInstance(),
            Summary.getDefaultInstance(),
            observer);
    }
"#;
    assert!(client.contains(expected_upload), "client was:\n{client}");
}

#[test]
fn types_from_other_layouts_are_imported() {
    let types = FileDescriptorProto {
        name: Some("common/types.proto".to_string()),
        package: Some("common".to_string()),
        message_type: vec![
            message("Empty"),
            DescriptorProto {
                name: Some("Envelope".to_string()),
                nested_type: vec![message("Header")],
                ..Default::default()
            },
        ],
        options: Some(FileOptions {
            java_package: Some("org.common".to_string()),
            ..Default::default()
        }),
        ..Default::default()
    };
    let mut file = echo_file();
    file.service[0].method = vec![
        unary("Ping", ".common.Empty", ".demo.EchoReply"),
        unary("Peek", ".common.Envelope.Header", ".common.Empty"),
    ];

    let files = generate(&[types, file], &config()).unwrap();
    for name in ["demo/AbstractEcho.java", "demo/EchoClient.java"] {
        let content = &find(&files, name).content;
        assert!(content.contains("import org.common.Types.Empty;\n"), "{name}");
        assert!(
            content.contains("import org.common.Types.Envelope.Header;\n"),
            "{name}"
        );
        assert_eq!(content.matches("import org.common.Types.Empty;").count(), 1);
        assert!(!content.contains("import demo."), "{name}");
    }

    let dispatcher = &find(&files, "demo/AbstractEcho.java").content;
    assert!(dispatcher.contains("public abstract void peek(T ctx, Header request, Observer<Empty> observer);"));
}

#[test]
fn same_package_outer_class_types_still_get_imported() {
    let mut file = echo_file();
    file.options = Some(FileOptions {
        java_package: Some("demo".to_string()),
        ..Default::default()
    });

    let files = generate(&[file], &config()).unwrap();
    let client = &find(&files, "demo/EchoClient.java").content;
    assert!(client.contains("import demo.Echo.EchoReply;\nimport demo.Echo.EchoRequest;\n"));
}

#[test]
fn comments_become_escaped_javadoc() {
    let mut file = echo_file();
    file.source_code_info = Some(SourceCodeInfo {
        location: vec![
            Location {
                path: vec![6, 0],
                leading_comments: Some(" Echoes things back.\n".to_string()),
                ..Default::default()
            },
            Location {
                path: vec![6, 0, 2, 0],
                leading_comments: Some(" Replies with <msg>. */ @deprecated\n".to_string()),
                ..Default::default()
            },
        ],
    });

    let files = generate(&[file], &config()).unwrap();
    let class_doc = "/**\n * <pre>\n *  Echoes things back.\n * </pre>\n */\n";
    let method_doc = "    /**\n     * <pre>\n     *  Replies with &lt;msg&gt;. *{@literal /} {@literal @}deprecated\n     * </pre>\n     */\n";

    let dispatcher = &find(&files, "demo/AbstractEcho.java").content;
    assert!(dispatcher.contains(&format!("{class_doc}@SuppressWarnings(\"unchecked\")\npublic abstract class")));
    assert!(dispatcher.contains(&format!("{method_doc}    public abstract void say(")));

    let client = &find(&files, "demo/EchoClient.java").content;
    assert!(client.contains(&format!("{class_doc}public class EchoClient")));
    assert!(client.contains(&format!("{method_doc}    @Override\n    public final void say(")));
}

#[test]
fn generated_annotation_carries_pinned_timestamp() {
    let config = GeneratorConfig::default().with_timestamp(TIMESTAMP);
    let files = generate(&[echo_file()], &config).unwrap();

    let annotation = format!(
        "@javax.annotation.processing.Generated(value = \"{}\", date = \"{TIMESTAMP}\")\n",
        java_dispatch::GENERATOR_NAME
    );
    for file in &files {
        assert!(file.content.contains(&annotation), "{}", file.name);
    }
}

#[test]
fn generation_is_deterministic() {
    let mut file = echo_file();
    file.service[0].method.push(client_streaming(
        "Upload",
        ".demo.EchoRequest",
        ".demo.EchoReply",
    ));
    let config = GeneratorConfig::default().with_timestamp(TIMESTAMP);

    let first = generate(&[file.clone()], &config).unwrap();
    let second = generate(&[file], &config).unwrap();
    assert_eq!(first, second);
}

#[test]
fn runtime_package_is_configurable() {
    let config = GeneratorConfig {
        runtime_package: "com.example.rpc".to_string(),
        ..config()
    };
    let files = generate(&[echo_file()], &config).unwrap();

    let dispatcher = &find(&files, "demo/AbstractEcho.java").content;
    assert!(dispatcher.contains("import com.example.rpc.Api;\nimport com.example.rpc.Observer;\n"));
    assert!(!dispatcher.contains("org.yamcs"));
}

#[test]
fn unresolved_rpc_type_aborts_the_run() {
    let mut file = echo_file();
    file.service[0]
        .method
        .push(unary("Lost", ".demo.EchoRequest", ".demo.Missing"));

    let err = generate(&[file.clone()], &config()).unwrap_err();
    assert!(matches!(
        err,
        GeneratorError::UnresolvedType { ref method, ref type_name }
            if method == "Lost" && type_name == ".demo.Missing"
    ));

    let response = generate_response(&CodeGeneratorRequest {
        proto_file: vec![file],
        ..Default::default()
    });
    assert!(response.file.is_empty());
    assert_eq!(
        response.error.as_deref(),
        Some("Method `Lost` references unknown message type `.demo.Missing`")
    );
}

#[test]
fn response_reports_parameter_errors_and_features() {
    let response = generate_response(&CodeGeneratorRequest {
        parameter: Some("bogus=1".to_string()),
        proto_file: vec![echo_file()],
        ..Default::default()
    });
    assert!(response.file.is_empty());
    assert_eq!(
        response.error.as_deref(),
        Some("Invalid plugin parameter: unknown option `bogus`")
    );

    let response = generate_response(&CodeGeneratorRequest {
        parameter: Some("generated_annotation=false".to_string()),
        proto_file: vec![echo_file()],
        ..Default::default()
    });
    assert_eq!(response.error, None);
    assert_eq!(response.supported_features, Some(1));
    let names: Vec<_> = response.file.iter().map(|file| file.name()).collect();
    assert_eq!(names, ["demo/AbstractEcho.java", "demo/EchoClient.java"]);
    assert!(!response.file[0].content().contains("@javax"));
}

#[test]
fn single_service_generators_reject_missing_index() {
    let files = [echo_file()];
    let index = java_dispatch::SchemaIndex::build(&files).unwrap();

    let generated = java_dispatch::client::generate(&index, &config(), &files[0], 0).unwrap();
    assert_eq!(generated.name, "demo/EchoClient.java");

    let err = java_dispatch::dispatcher::generate(&index, &config(), &files[0], 3).unwrap_err();
    assert_eq!(err.to_string(), "File `demo/echo.proto` has no service at index 3");
}
