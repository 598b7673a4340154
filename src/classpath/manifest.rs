//! JSON classpath manifests.
//!
//! ```json
//! {
//!   "classes": [
//!     {
//!       "name": "com.airbnb.epoxy.EpoxyModel",
//!       "kind": "class",
//!       "type_parameters": ["T"],
//!       "methods": [
//!         { "name": "getDefaultLayout", "returns": "int" },
//!         { "name": "bind", "parameters": ["T"], "returns": "void" }
//!       ]
//!     }
//!   ],
//!   "resource_packages": ["com.airbnb.viewmodeladapter"]
//! }
//! ```
//!
//! Nested classes use binary names (`a.b.Outer$Inner`).

use std::path::Path;

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

use crate::error::{IndexError, NamingError};
use crate::hir::symbols::{Declaration, Scheme, Symbol, SymbolKind, name_of};

use super::table::ExternalSymbolTable;
use super::types::{ClassBuilder, JavaType, Origin};

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClasspathManifest {
    #[serde(default)]
    pub classes: Vec<ManifestClass>,
    #[serde(default)]
    pub resource_packages: Vec<SmolStr>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ManifestKind {
    #[default]
    Class,
    Interface,
    Enum,
    Record,
    Annotation,
}

impl ManifestKind {
    fn symbol_kind(self) -> SymbolKind {
        match self {
            ManifestKind::Class => SymbolKind::Class,
            ManifestKind::Interface => SymbolKind::Interface,
            ManifestKind::Enum => SymbolKind::Enum,
            ManifestKind::Record => SymbolKind::Record,
            ManifestKind::Annotation => SymbolKind::Annotation,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ManifestClass {
    /// Binary name: `a.b.Outer$Inner`.
    pub name: String,
    pub kind: ManifestKind,
    pub superclass: Option<String>,
    pub interfaces: Vec<String>,
    pub type_parameters: Vec<SmolStr>,
    pub fields: Vec<ManifestField>,
    pub methods: Vec<ManifestMethod>,
    pub constructors: Vec<ManifestConstructor>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ManifestField {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: String,
    #[serde(rename = "static")]
    pub is_static: bool,
    /// Enum constant rather than a plain field.
    pub constant: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ManifestMethod {
    pub name: String,
    pub parameters: Vec<String>,
    pub returns: String,
    #[serde(rename = "static")]
    pub is_static: bool,
    pub varargs: bool,
    pub type_parameters: Vec<SmolStr>,
}

impl Default for ManifestMethod {
    fn default() -> Self {
        Self {
            name: String::new(),
            parameters: Vec::new(),
            returns: "void".to_string(),
            is_static: false,
            varargs: false,
            type_parameters: Vec::new(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ManifestConstructor {
    pub parameters: Vec<String>,
    pub varargs: bool,
}

impl ClasspathManifest {
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    pub fn load(path: &Path) -> Result<Self, IndexError> {
        let text = std::fs::read_to_string(path).map_err(|err| IndexError::io(path, err))?;
        Self::from_json(&text).map_err(|source| IndexError::Manifest {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Register every class and resource package into `table`. Returns the
    /// number of classes added.
    pub fn load_into(&self, table: &mut ExternalSymbolTable) -> Result<usize, NamingError> {
        for class in &self.classes {
            table.insert(class.build()?.build());
        }
        for package in &self.resource_packages {
            table.register_resource_package(package);
        }
        tracing::debug!(
            classes = self.classes.len(),
            resource_packages = self.resource_packages.len(),
            "loaded classpath manifest"
        );
        Ok(self.classes.len())
    }
}

/// Split a binary name into its package and class chain:
/// `a.b.Outer$Inner` is `("a.b", ["Outer", "Inner"])`.
pub fn split_binary_name(name: &str) -> (&str, Vec<&str>) {
    let (package, classes) = match name.rsplit_once('.') {
        Some((package, classes)) => (package, classes),
        None => ("", name),
    };
    (package, classes.split('$').collect())
}

/// Symbol of the class that owns the last class of `chain`: the package for
/// a top-level class, otherwise the enclosing class.
pub(crate) fn owner_symbol(package: &str, chain: &[&str]) -> Result<Symbol, NamingError> {
    let mut owner = Symbol::package(package, Scheme::External);
    if let Some((_, outers)) = chain.split_last() {
        for outer in outers {
            owner = name_of(
                &Declaration::Type {
                    name: outer,
                    kind: SymbolKind::Class,
                },
                Some(&owner),
            )?;
        }
    }
    Ok(owner)
}

impl ManifestClass {
    fn build(&self) -> Result<ClassBuilder, NamingError> {
        let (package, chain) = split_binary_name(&self.name);
        let owner = owner_symbol(package, &chain)?;
        let qualified = self.name.replace('$', ".");
        let kind = self.kind.symbol_kind();
        let mut builder = ClassBuilder::new(&owner, package, &qualified, kind, Origin::External)?;

        for param in &self.type_parameters {
            builder.type_param(param);
        }
        let class_params = builder.type_params().to_vec();
        let parse = |text: &str| JavaType::parse(text, &class_params);

        match (&self.superclass, self.kind) {
            (Some(superclass), _) => {
                builder.superclass(parse(superclass));
            }
            (None, ManifestKind::Class) if qualified != "java.lang.Object" => {
                builder.superclass(JavaType::object());
            }
            (None, ManifestKind::Enum) => {
                builder.superclass(JavaType::Class {
                    name: SmolStr::new("java.lang.Enum"),
                    args: vec![JavaType::class(qualified.as_str())],
                });
            }
            (None, ManifestKind::Record) => {
                builder.superclass(JavaType::class("java.lang.Record"));
            }
            _ => {}
        }
        for interface in &self.interfaces {
            builder.interface(parse(interface));
        }
        for field in &self.fields {
            let kind = if field.constant {
                SymbolKind::EnumConstant
            } else {
                SymbolKind::Field
            };
            let ty = if field.ty.is_empty() {
                JavaType::class(qualified.as_str())
            } else {
                parse(&field.ty)
            };
            builder.field(&field.name, ty, field.is_static || field.constant, kind)?;
        }
        for ctor in &self.constructors {
            let params = ctor.parameters.iter().map(|p| parse(p)).collect();
            builder.constructor(params, ctor.varargs)?;
        }
        for method in &self.methods {
            let mut scope = class_params.clone();
            scope.extend(method.type_parameters.iter().cloned());
            let params = method
                .parameters
                .iter()
                .map(|p| JavaType::parse(p, &scope))
                .collect();
            let returns = JavaType::parse(&method.returns, &scope);
            builder.method(&method.name, params, method.varargs, returns, method.is_static)?;
        }
        Ok(builder)
    }
}
