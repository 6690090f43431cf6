//! Lookup tables built once per run from every file in the request.

use std::collections::HashMap;

use prost_types::{DescriptorProto, FileDescriptorProto, MethodDescriptorProto};

use crate::error::GeneratorError;

/// `FileDescriptorProto.service`
const FILE_SERVICE_FIELD: i32 = 6;
/// `ServiceDescriptorProto.method`
const SERVICE_METHOD_FIELD: i32 = 2;

///
/// A message type together with the file that declares it.
///
/// `enclosing` lists the names of the messages it is nested in, outermost
/// first; it is empty for top-level messages.
///
#[derive(Debug, Clone)]
pub struct MessageRef<'a> {
    pub file: &'a FileDescriptorProto,
    pub message: &'a DescriptorProto,
    pub enclosing: Vec<&'a str>,
}

impl MessageRef<'_> {
    /// Local (unqualified) name of the message.
    pub fn name(&self) -> &str {
        self.message.name()
    }
}

///
/// Read-only view over all schema files of a generation run.
///
/// Populated in a single pass by [`SchemaIndex::build`]; the generators only
/// query it afterwards.
///
#[derive(Debug)]
pub struct SchemaIndex<'a> {
    files: &'a [FileDescriptorProto],
    messages: HashMap<String, MessageRef<'a>>,
    service_comments: HashMap<(&'a str, usize), &'a str>,
    method_comments: HashMap<(&'a str, usize, usize), &'a str>,
}

impl<'a> SchemaIndex<'a> {
    pub fn build(files: &'a [FileDescriptorProto]) -> Result<Self, GeneratorError> {
        let mut index = Self {
            files,
            messages: HashMap::new(),
            service_comments: HashMap::new(),
            method_comments: HashMap::new(),
        };

        for file in files {
            index.scan_comments(file);

            for message in &file.message_type {
                index.insert_message(file, message, Vec::new())?;
            }

            tracing::debug!(
                file = file.name(),
                messages = file.message_type.len(),
                services = file.service.len(),
                "indexed schema file"
            );
        }

        Ok(index)
    }

    pub fn files(&self) -> &'a [FileDescriptorProto] {
        self.files
    }

    /// Looks up a message by fully-qualified name, with or without the leading dot.
    pub fn message(&self, type_name: &str) -> Option<&MessageRef<'a>> {
        self.messages
            .get(type_name.strip_prefix('.').unwrap_or(type_name))
    }

    /// Resolves both sides of an RPC; an unknown type is fatal.
    pub fn method_types(
        &self,
        method: &MethodDescriptorProto,
    ) -> Result<(&MessageRef<'a>, &MessageRef<'a>), GeneratorError> {
        let lookup = |type_name: &str| {
            self.message(type_name)
                .ok_or_else(|| GeneratorError::UnresolvedType {
                    method: method.name().to_string(),
                    type_name: type_name.to_string(),
                })
        };

        Ok((lookup(method.input_type())?, lookup(method.output_type())?))
    }

    pub fn service_comment(&self, file: &FileDescriptorProto, service: usize) -> Option<&'a str> {
        self.service_comments.get(&(file.name(), service)).copied()
    }

    pub fn method_comment(
        &self,
        file: &FileDescriptorProto,
        service: usize,
        method: usize,
    ) -> Option<&'a str> {
        self.method_comments
            .get(&(file.name(), service, method))
            .copied()
    }

    fn insert_message(
        &mut self,
        file: &'a FileDescriptorProto,
        message: &'a DescriptorProto,
        enclosing: Vec<&'a str>,
    ) -> Result<(), GeneratorError> {
        let mut segments: Vec<&str> = Vec::with_capacity(enclosing.len() + 2);
        if !file.package().is_empty() {
            segments.push(file.package());
        }
        segments.extend(enclosing.iter().copied());
        segments.push(message.name());
        let full_name = segments.join(".");

        if let Some(existing) = self.messages.get(&full_name) {
            return Err(GeneratorError::SchemaConflict {
                type_name: full_name,
                first: existing.file.name().to_string(),
                second: file.name().to_string(),
            });
        }

        let mut nested_enclosing = enclosing.clone();
        nested_enclosing.push(message.name());

        self.messages.insert(
            full_name,
            MessageRef {
                file,
                message,
                enclosing,
            },
        );

        for nested in &message.nested_type {
            self.insert_message(file, nested, nested_enclosing.clone())?;
        }

        Ok(())
    }

    // Only leading comments on a service (`[6, s]`) or on one of its methods
    // (`[6, s, 2, m]`) are kept; every other location is skipped.
    fn scan_comments(&mut self, file: &'a FileDescriptorProto) {
        let Some(info) = &file.source_code_info else {
            return;
        };

        for location in &info.location {
            let Some(comment) = location.leading_comments.as_deref() else {
                continue;
            };

            match location.path.as_slice() {
                [FILE_SERVICE_FIELD, service] => {
                    let Some(service) = service_position(file, *service) else {
                        tracing::debug!(file = file.name(), path = ?location.path, "comment path out of range");
                        continue;
                    };
                    self.service_comments.insert((file.name(), service), comment);
                }
                [FILE_SERVICE_FIELD, service, SERVICE_METHOD_FIELD, method] => {
                    let position = service_position(file, *service).and_then(|service| {
                        let method = usize::try_from(*method).ok()?;
                        (method < file.service[service].method.len()).then_some((service, method))
                    });
                    let Some((service, method)) = position else {
                        tracing::debug!(file = file.name(), path = ?location.path, "comment path out of range");
                        continue;
                    };
                    self.method_comments
                        .insert((file.name(), service, method), comment);
                }
                _ => {}
            }
        }
    }
}

fn service_position(file: &FileDescriptorProto, service: i32) -> Option<usize> {
    usize::try_from(service)
        .ok()
        .filter(|service| *service < file.service.len())
}
