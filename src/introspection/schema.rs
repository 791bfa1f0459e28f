use std::fmt::{self, Write as _};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schema {
    #[serde(default)]
    pub query_type: Option<NamedRef>,
    #[serde(default)]
    pub mutation_type: Option<NamedRef>,
    #[serde(default)]
    pub subscription_type: Option<NamedRef>,
    #[serde(default)]
    pub types: Vec<FullType>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedRef {
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TypeKind {
    Scalar,
    Object,
    Interface,
    Union,
    Enum,
    InputObject,
    List,
    NonNull,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FullType {
    pub kind: TypeKind,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub fields: Option<Vec<Field>>,
    #[serde(default)]
    pub input_fields: Option<Vec<InputValue>>,
    #[serde(default)]
    pub enum_values: Option<Vec<EnumValue>>,
    #[serde(default)]
    pub interfaces: Option<Vec<TypeRef>>,
    #[serde(default)]
    pub possible_types: Option<Vec<TypeRef>>,
}

impl FullType {
    pub fn is_builtin(&self) -> bool {
        self.name.as_deref().is_some_and(|name| name.starts_with("__"))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Field {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub args: Vec<InputValue>,
    #[serde(rename = "type")]
    pub ty: TypeRef,
    #[serde(default)]
    pub is_deprecated: bool,
    #[serde(default)]
    pub deprecation_reason: Option<String>,
}

impl Field {
    pub fn signature(&self) -> String {
        let mut out = self.name.clone();
        if !self.args.is_empty() {
            out.push('(');
            for (i, arg) in self.args.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                let _ = write!(out, "{}: {}", arg.name, arg.ty);
            }
            out.push(')');
        }
        let _ = write!(out, ": {}", self.ty);
        out
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputValue {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub ty: TypeRef,
    #[serde(default)]
    pub default_value: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnumValue {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub is_deprecated: bool,
    #[serde(default)]
    pub deprecation_reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeRef {
    pub kind: TypeKind,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub of_type: Option<Box<TypeRef>>,
}

impl TypeRef {
    pub fn named(kind: TypeKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: Some(name.into()),
            of_type: None,
        }
    }

    pub fn list(inner: TypeRef) -> Self {
        Self {
            kind: TypeKind::List,
            name: None,
            of_type: Some(Box::new(inner)),
        }
    }

    pub fn non_null(inner: TypeRef) -> Self {
        Self {
            kind: TypeKind::NonNull,
            name: None,
            of_type: Some(Box::new(inner)),
        }
    }

    pub fn named_type(&self) -> Option<&str> {
        let mut current = self;
        while let Some(inner) = current.of_type.as_deref() {
            current = inner;
        }
        current.name.as_deref()
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.kind, self.of_type.as_deref()) {
            (TypeKind::List, Some(inner)) => write!(f, "[{inner}]"),
            (TypeKind::NonNull, Some(inner)) => write!(f, "{inner}!"),
            _ => f.write_str(self.name.as_deref().unwrap_or("?")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RootOperation {
    Query,
    Mutation,
    Subscription,
}

impl RootOperation {
    pub fn title(self) -> &'static str {
        match self {
            RootOperation::Query => "Queries",
            RootOperation::Mutation => "Mutations",
            RootOperation::Subscription => "Subscriptions",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RootSection<'a> {
    pub operation: RootOperation,
    pub ty: &'a FullType,
    pub fields: &'a [Field],
}

impl Schema {
    pub fn find_type(&self, name: &str) -> Option<&FullType> {
        self.types
            .iter()
            .find(|ty| ty.name.as_deref() == Some(name))
    }

    pub fn field_type(&self, field: &Field) -> Option<&FullType> {
        field.ty.named_type().and_then(|name| self.find_type(name))
    }

    pub fn root_sections(&self) -> Vec<RootSection<'_>> {
        [
            (RootOperation::Query, &self.query_type),
            (RootOperation::Mutation, &self.mutation_type),
            (RootOperation::Subscription, &self.subscription_type),
        ]
        .into_iter()
        .filter_map(|(operation, named)| {
            let ty = self.find_type(&named.as_ref()?.name)?;
            let fields = ty.fields.as_deref()?;
            Some(RootSection {
                operation,
                ty,
                fields,
            })
        })
        .collect()
    }

    pub fn digest(&self) -> String {
        let mut out = String::new();
        for section in self.root_sections() {
            let _ = writeln!(out, "# {}", section.operation.title());
            for field in section.fields {
                let _ = write!(out, "{}", field.signature());
                if let Some(description) = field.description.as_deref().filter(|d| !d.is_empty()) {
                    let _ = write!(out, "  # {description}");
                }
                out.push('\n');
            }
            out.push('\n');
        }

        let user_types = self
            .types
            .iter()
            .filter(|ty| !ty.is_builtin() && ty.kind != TypeKind::Scalar);
        for ty in user_types {
            let name = ty.name.as_deref().unwrap_or("?");
            match ty.kind {
                TypeKind::Enum => {
                    let values: Vec<&str> = ty
                        .enum_values
                        .iter()
                        .flatten()
                        .map(|value| value.name.as_str())
                        .collect();
                    let _ = writeln!(out, "enum {name} {{ {} }}", values.join(" "));
                }
                TypeKind::InputObject => {
                    let fields: Vec<String> = ty
                        .input_fields
                        .iter()
                        .flatten()
                        .map(|field| format!("{}: {}", field.name, field.ty))
                        .collect();
                    let _ = writeln!(out, "input {name} {{ {} }}", fields.join(", "));
                }
                _ => {
                    let fields: Vec<String> = ty
                        .fields
                        .iter()
                        .flatten()
                        .map(|field| format!("{}: {}", field.name, field.ty))
                        .collect();
                    let keyword = match ty.kind {
                        TypeKind::Interface => "interface",
                        TypeKind::Union => "union",
                        _ => "type",
                    };
                    let _ = writeln!(out, "{keyword} {name} {{ {} }}", fields.join(", "));
                }
            }
        }
        out
    }
}
