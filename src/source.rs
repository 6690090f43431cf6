//! Text emitter for one Java compilation unit.
//!
//! [`SourceBuilder`] is a pure formatter: it never checks that the types, names
//! or statements it is given make sense, it only lays them out in a fixed,
//! deterministic order.

use std::collections::BTreeSet;
use std::fmt;

const MEMBER_INDENT: &str = "    ";
const BODY_INDENT: &str = "        ";

///
/// Accumulates the declarations of a single top-level class.
///
/// Rendering (through [`fmt::Display`]) always emits, in order: the package
/// clause, sorted imports, class javadoc, class annotations, the class header,
/// fields, constructors and methods.
///
#[derive(Debug, Clone, Default)]
pub struct SourceBuilder {
    package: String,
    imports: BTreeSet<String>,
    annotations: Vec<String>,
    javadoc: Option<String>,
    is_abstract: bool,
    name: String,
    type_parameters: Vec<String>,
    extends: Option<String>,
    implements: Vec<String>,
    fields: Vec<Parameter>,
    constructors: Vec<ConstructorBuilder>,
    methods: Vec<MethodBuilder>,
}

/// A `type name` pair, used for fields and parameters alike.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    pub ty: String,
    pub name: String,
}

#[derive(Debug, Clone, Default)]
pub struct ConstructorBuilder {
    parameters: Vec<Parameter>,
    body: Body,
}

#[derive(Debug, Clone)]
pub struct MethodBuilder {
    name: String,
    return_type: String,
    is_abstract: bool,
    is_final: bool,
    javadoc: Option<String>,
    annotations: Vec<String>,
    parameters: Vec<Parameter>,
    body: Body,
}

/// Pre-formatted statement text of a constructor or method.
#[derive(Debug, Clone, Default)]
pub struct Body(String);

impl SourceBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn set_package(&mut self, package: impl Into<String>) -> &mut Self {
        self.package = package.into();
        self
    }

    pub fn add_import(&mut self, import: impl Into<String>) -> &mut Self {
        self.imports.insert(import.into());
        self
    }

    pub fn add_annotation(&mut self, annotation: impl Into<String>) -> &mut Self {
        self.annotations.push(annotation.into());
        self
    }

    /// Raw documentation text. It is escaped and wrapped in `<pre>` on output.
    pub fn set_javadoc(&mut self, javadoc: Option<impl Into<String>>) -> &mut Self {
        self.javadoc = javadoc.map(Into::into);
        self
    }

    pub fn set_abstract(&mut self, is_abstract: bool) -> &mut Self {
        self.is_abstract = is_abstract;
        self
    }

    pub fn add_type_parameter(&mut self, parameter: impl Into<String>) -> &mut Self {
        self.type_parameters.push(parameter.into());
        self
    }

    pub fn set_extends(&mut self, supertype: impl Into<String>) -> &mut Self {
        self.extends = Some(supertype.into());
        self
    }

    pub fn add_implements(&mut self, interface: impl Into<String>) -> &mut Self {
        self.implements.push(interface.into());
        self
    }

    /// Fields are always emitted as `private final`.
    pub fn add_field(&mut self, ty: impl Into<String>, name: impl Into<String>) -> &mut Self {
        self.fields.push(Parameter::new(ty, name));
        self
    }

    pub fn add_constructor(&mut self) -> &mut ConstructorBuilder {
        self.constructors.push(ConstructorBuilder::default());
        let last = self.constructors.len() - 1;
        &mut self.constructors[last]
    }

    pub fn add_method(&mut self, name: impl Into<String>) -> &mut MethodBuilder {
        self.methods.push(MethodBuilder::new(name));
        let last = self.methods.len() - 1;
        &mut self.methods[last]
    }

    /// Imports that will actually be rendered: sorted, unique, and never
    /// pointing into this unit's own package.
    pub fn imports(&self) -> impl Iterator<Item = &str> {
        self.imports
            .iter()
            .map(String::as_str)
            .filter(move |import| !is_self_import(&self.package, import))
    }
}

impl Parameter {
    pub fn new(ty: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            ty: ty.into(),
            name: name.into(),
        }
    }
}

impl ConstructorBuilder {
    pub fn add_parameter(&mut self, ty: impl Into<String>, name: impl Into<String>) -> &mut Self {
        self.parameters.push(Parameter::new(ty, name));
        self
    }

    pub fn body(&mut self) -> &mut Body {
        &mut self.body
    }
}

impl MethodBuilder {
    fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            return_type: "void".to_string(),
            is_abstract: false,
            is_final: false,
            javadoc: None,
            annotations: Vec::new(),
            parameters: Vec::new(),
            body: Body::default(),
        }
    }

    pub fn set_return(&mut self, return_type: impl Into<String>) -> &mut Self {
        self.return_type = return_type.into();
        self
    }

    pub fn set_javadoc(&mut self, javadoc: Option<impl Into<String>>) -> &mut Self {
        self.javadoc = javadoc.map(Into::into);
        self
    }

    pub fn set_abstract(&mut self, is_abstract: bool) -> &mut Self {
        self.is_abstract = is_abstract;
        self
    }

    pub fn set_final(&mut self, is_final: bool) -> &mut Self {
        self.is_final = is_final;
        self
    }

    pub fn add_annotation(&mut self, annotation: impl Into<String>) -> &mut Self {
        self.annotations.push(annotation.into());
        self
    }

    pub fn add_parameter(&mut self, ty: impl Into<String>, name: impl Into<String>) -> &mut Self {
        self.parameters.push(Parameter::new(ty, name));
        self
    }

    /// Ignored when the method is abstract.
    pub fn body(&mut self) -> &mut Body {
        &mut self.body
    }
}

impl Body {
    /// Appends one statement line. Indentation inside the body is the caller's.
    pub fn line(&mut self, line: impl AsRef<str>) -> &mut Self {
        self.0.push_str(line.as_ref());
        self.0.push('\n');
        self
    }

    fn write_indented(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = self.0.trim();
        if text.is_empty() {
            return Ok(());
        }
        for line in text.lines() {
            writeln!(f, "{}", format!("{BODY_INDENT}{line}").trim_end())?;
        }
        Ok(())
    }
}

impl fmt::Display for SourceBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.package.is_empty() {
            writeln!(f, "package {};", self.package)?;
            writeln!(f)?;
        }

        let mut imports = self.imports().peekable();
        if imports.peek().is_some() {
            for import in imports {
                writeln!(f, "import {import};")?;
            }
            writeln!(f)?;
        }

        if let Some(javadoc) = &self.javadoc {
            write_javadoc(f, javadoc, "")?;
        }

        for annotation in &self.annotations {
            writeln!(f, "{annotation}")?;
        }

        let modifiers = if self.is_abstract {
            "public abstract"
        } else {
            "public"
        };
        write!(f, "{modifiers} class {}", self.name)?;
        if !self.type_parameters.is_empty() {
            write!(f, "<{}>", self.type_parameters.join(", "))?;
        }
        if let Some(supertype) = &self.extends {
            write!(f, " extends {supertype}")?;
        }
        if !self.implements.is_empty() {
            write!(f, " implements {}", self.implements.join(", "))?;
        }
        writeln!(f, " {{")?;

        for field in &self.fields {
            write!(f, "\n{MEMBER_INDENT}private final {} {};", field.ty, field.name)?;
        }
        if !self.fields.is_empty() {
            writeln!(f)?;
        }

        for constructor in &self.constructors {
            writeln!(f)?;
            write!(f, "{MEMBER_INDENT}public {}(", self.name)?;
            write_parameters(f, &constructor.parameters)?;
            writeln!(f, ") {{")?;
            constructor.body.write_indented(f)?;
            writeln!(f, "{MEMBER_INDENT}}}")?;
        }

        for method in &self.methods {
            writeln!(f)?;
            if let Some(javadoc) = &method.javadoc {
                write_javadoc(f, javadoc, MEMBER_INDENT)?;
            }
            for annotation in &method.annotations {
                writeln!(f, "{MEMBER_INDENT}{annotation}")?;
            }

            let mut modifiers = String::from("public");
            if method.is_abstract {
                modifiers.push_str(" abstract");
            }
            if method.is_final {
                modifiers.push_str(" final");
            }
            write!(
                f,
                "{MEMBER_INDENT}{modifiers} {} {}(",
                method.return_type, method.name
            )?;
            write_parameters(f, &method.parameters)?;
            if method.is_abstract {
                writeln!(f, ");")?;
            } else {
                writeln!(f, ") {{")?;
                method.body.write_indented(f)?;
                writeln!(f, "{MEMBER_INDENT}}}")?;
            }
        }

        writeln!(f, "}}")
    }
}

fn write_parameters(f: &mut fmt::Formatter<'_>, parameters: &[Parameter]) -> fmt::Result {
    for (i, parameter) in parameters.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{} {}", parameter.ty, parameter.name)?;
    }
    Ok(())
}

fn write_javadoc(f: &mut fmt::Formatter<'_>, raw: &str, indent: &str) -> fmt::Result {
    writeln!(f, "{indent}/**")?;
    for line in escape_javadoc(raw).split('\n') {
        writeln!(f, "{}", format!("{indent} * {line}").trim_end())?;
    }
    writeln!(f, "{indent} */")
}

/// An import is redundant when it names the package itself or a type declared
/// directly in it.
fn is_self_import(package: &str, import: &str) -> bool {
    import == package
        || import
            .rsplit_once('.')
            .is_some_and(|(container, _)| container == package)
}

///
/// Turns free-form comment text into a javadoc-safe `<pre>` block.
///
/// The replacement order matters: `@` goes first so the `{@literal ...}` tags
/// inserted afterwards are not themselves rewritten. Comment delimiters are
/// split so a stray `*/` cannot close the enclosing javadoc.
///
pub fn escape_javadoc(raw: &str) -> String {
    let escaped = raw
        .replace('@', "{@literal @}")
        .replace("/*", "{@literal /}*")
        .replace("*/", "*{@literal /}")
        .replace('<', "&lt;")
        .replace('>', "&gt;");
    format!("<pre>\n{escaped}</pre>")
}
