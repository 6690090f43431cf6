//! Java naming for protobuf types, following the file's code-layout options.

use std::fmt;

use prost_types::FileDescriptorProto;

use crate::index::MessageRef;

/// A Java type split into its containing package (or outer class) and simple name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QualifiedName {
    pub container: String,
    pub name: String,
}

impl fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.container.is_empty() {
            f.write_str(&self.name)
        } else {
            write!(f, "{}.{}", self.container, self.name)
        }
    }
}

///
/// Computes the Java name protoc gives the class of `message`.
///
/// With `java_multiple_files` every message becomes its own top-level class in
/// the Java package. Otherwise all messages of the file are nested inside the
/// file's outer class. Messages nested in other messages add one level per
/// enclosing message on top of that.
///
pub fn resolve(message: &MessageRef<'_>) -> QualifiedName {
    let file = message.file;
    let mut segments = Vec::with_capacity(message.enclosing.len() + 2);

    let package = java_package(file);
    if !package.is_empty() {
        segments.push(package.to_string());
    }
    if !java_multiple_files(file) {
        segments.push(outer_classname(file));
    }
    segments.extend(message.enclosing.iter().map(|name| name.to_string()));

    QualifiedName {
        container: segments.join("."),
        name: message.name().to_string(),
    }
}

/// True when code generated in `from_package` must import `message` explicitly.
pub fn needs_import(from_package: &str, message: &MessageRef<'_>) -> bool {
    resolve(message).container != from_package
}

/// The file's `java_package` option, falling back to its proto package.
pub fn java_package(file: &FileDescriptorProto) -> &str {
    file.options
        .as_ref()
        .and_then(|options| options.java_package.as_deref())
        .unwrap_or_else(|| file.package())
}

pub fn java_multiple_files(file: &FileDescriptorProto) -> bool {
    file.options
        .as_ref()
        .is_some_and(|options| options.java_multiple_files())
}

/// The explicit `java_outer_classname`, else the file's base name with the
/// `.proto` suffix dropped and the first character upper-cased.
pub fn outer_classname(file: &FileDescriptorProto) -> String {
    if let Some(explicit) = file
        .options
        .as_ref()
        .and_then(|options| options.java_outer_classname.as_deref())
    {
        return explicit.to_string();
    }

    let base = file.name().rsplit('/').next().unwrap_or_default();
    let stem = base.replace(".proto", "");
    let mut chars = stem.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

///
/// Lower-cases the first character of an RPC name, JavaBeans style.
///
/// Names starting with two upper-case characters (`URLLookup`) are assumed to
/// be acronyms and kept as they are.
///
pub fn java_method_name(rpc: &str) -> String {
    let mut chars = rpc.chars();
    let Some(first) = chars.next() else {
        return String::new();
    };
    if first.is_uppercase() && chars.clone().next().is_some_and(char::is_uppercase) {
        return rpc.to_string();
    }
    first.to_lowercase().chain(chars).collect()
}

/// Relative output path of a generated class: package directories plus `Name.java`.
pub fn source_path(package: &str, class_name: &str) -> String {
    if package.is_empty() {
        format!("{class_name}.java")
    } else {
        format!("{}/{class_name}.java", package.replace('.', "/"))
    }
}
