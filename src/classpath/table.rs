//! The External Symbol Table.

use std::sync::Arc;

use rustc_hash::{FxHashMap, FxHashSet};
use smol_str::SmolStr;

use crate::error::NamingError;
use crate::hir::symbols::{Declaration, Scheme, Symbol, SymbolKind, name_of};

use super::resources::{ResourceCache, ResourceEntry, is_resource_type};
use super::types::{ClassBuilder, ClassInfo, FieldInfo, JavaType, Origin};
use super::TypeSource;

/// What kind of entity a [`ExternalSymbolTable::lookup`] hint names.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LookupKind {
    Package,
    Type,
    /// `owner.member` where `owner` is a qualified class name.
    Member,
    /// Type, then package, then member.
    Any,
}

/// Read-only index over library and platform declarations.
///
/// Entries are immutable once inserted. The only mutable state is the
/// resource cache, which is safe to share across threads.
#[derive(Debug, Default)]
pub struct ExternalSymbolTable {
    classes: FxHashMap<SmolStr, Arc<ClassInfo>>,
    packages: FxHashSet<SmolStr>,
    resource_packages: FxHashSet<SmolStr>,
    resources: ResourceCache,
}

impl ExternalSymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// A table pre-populated with the built-in platform surface.
    pub fn with_platform() -> Self {
        let mut table = Self::new();
        match super::platform::load_into(&mut table) {
            Ok(count) => tracing::debug!(count, "loaded platform classes"),
            Err(err) => tracing::error!(error = %err, "built-in platform manifest is invalid"),
        }
        table
    }

    /// Register a class. A later entry with the same name replaces the
    /// earlier one.
    pub fn insert(&mut self, class: ClassInfo) {
        self.record_packages(&class.package);
        self.classes
            .insert(class.qualified_name.clone(), Arc::new(class));
    }

    fn record_packages(&mut self, package: &str) {
        let mut end = 0;
        for segment in package.split('.').filter(|s| !s.is_empty()) {
            end += segment.len();
            self.packages.insert(SmolStr::new(&package[..end]));
            end += 1;
        }
    }

    /// Mark `package.R` as a generated resource class.
    pub fn register_resource_package(&mut self, package: &str) {
        self.record_packages(package);
        self.resource_packages.insert(SmolStr::new(package));
    }

    pub fn is_resource_package(&self, package: &str) -> bool {
        self.resource_packages.contains(package)
    }

    pub fn has_package(&self, package: &str) -> bool {
        self.packages.contains(package)
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Number of memoized resource entries.
    pub fn resource_entries(&self) -> usize {
        self.resources.len()
    }

    /// Fold another table's entries into this one.
    pub fn merge(&mut self, other: ExternalSymbolTable) {
        self.packages.extend(other.packages);
        self.resource_packages.extend(other.resource_packages);
        self.classes.extend(other.classes);
    }

    /// Class by dotted qualified name, synthesizing generated resource
    /// classes on demand.
    pub fn class(&self, qualified: &str) -> Option<Arc<ClassInfo>> {
        if let Some(class) = self.classes.get(qualified) {
            return Some(class.clone());
        }
        match self.resource(qualified)? {
            ResourceEntry::Class(class) => Some(class),
            ResourceEntry::Constant(_) => None,
        }
    }

    /// Generated constant `name` of a resource type class (`pkg.R.layout`).
    pub fn resource_constant(&self, class: &ClassInfo, name: &str) -> Option<Arc<FieldInfo>> {
        if !class.synthetic_members {
            return None;
        }
        let key = format!("{}.{}", class.qualified_name, name);
        match self.resource(&key)? {
            ResourceEntry::Constant(field) => Some(field),
            ResourceEntry::Class(_) => None,
        }
    }

    /// Resolve a qualified name hint to a symbol.
    pub fn lookup(&self, hint: &str, kind: LookupKind) -> Option<Symbol> {
        match kind {
            LookupKind::Package => self
                .has_package(hint)
                .then(|| Symbol::package(hint, Scheme::External)),
            LookupKind::Type => self.class(hint).map(|class| class.symbol.clone()),
            LookupKind::Member => {
                let (owner, member) = hint.rsplit_once('.')?;
                let class = self.class(owner)?;
                if let Some(field) = class.field(member) {
                    return Some(field.symbol.clone());
                }
                if let Some(method) = class.methods_named(member).next() {
                    return Some(method.symbol.clone());
                }
                self.resource_constant(&class, member)
                    .map(|field| field.symbol.clone())
            }
            LookupKind::Any => self
                .lookup(hint, LookupKind::Type)
                .or_else(|| self.lookup(hint, LookupKind::Package))
                .or_else(|| self.lookup(hint, LookupKind::Member)),
        }
    }

    fn resource(&self, qualified: &str) -> Option<ResourceEntry> {
        let split = split_resource_name(qualified)?;
        if !self.is_resource_package(split.package) {
            return None;
        }
        self.resources
            .get_or_insert_with(qualified, || match synthesize(&split) {
                Ok(entry) => entry,
                Err(err) => {
                    tracing::warn!(name = qualified, error = %err, "cannot name resource entry");
                    None
                }
            })
    }
}

impl TypeSource for ExternalSymbolTable {
    fn class(&self, qualified: &str) -> Option<Arc<ClassInfo>> {
        ExternalSymbolTable::class(self, qualified)
    }

    fn has_package(&self, package: &str) -> bool {
        ExternalSymbolTable::has_package(self, package)
    }
}

// ============================================================================
// RESOURCE SYNTHESIS
// ============================================================================

/// `pkg.R[.type[.name]]` split at the `R` segment.
#[derive(Debug, PartialEq, Eq)]
struct ResourceName<'a> {
    package: &'a str,
    resource_type: Option<&'a str>,
    name: Option<&'a str>,
}

fn split_resource_name(qualified: &str) -> Option<ResourceName<'_>> {
    let segments: Vec<&str> = qualified.split('.').collect();
    let r = segments.iter().rposition(|s| *s == "R")?;
    if r == 0 || segments.len() - r > 3 {
        return None;
    }
    let package_len: usize = segments[..r].iter().map(|s| s.len() + 1).sum::<usize>() - 1;
    Some(ResourceName {
        package: &qualified[..package_len],
        resource_type: segments.get(r + 1).copied(),
        name: segments.get(r + 2).copied(),
    })
}

fn synthesize(split: &ResourceName<'_>) -> Result<Option<ResourceEntry>, NamingError> {
    let package = Symbol::package(split.package, Scheme::External);
    let r_name = format!("{}.R", split.package);
    let r = ClassBuilder::new(&package, split.package, &r_name, SymbolKind::Class, Origin::External)?;

    let Some(resource_type) = split.resource_type else {
        return Ok(Some(ResourceEntry::Class(r.build_arc())));
    };
    if !is_resource_type(resource_type) {
        return Ok(None);
    }
    let type_name = format!("{}.{}", r_name, resource_type);
    let mut type_class =
        ClassBuilder::new(r.symbol(), split.package, &type_name, SymbolKind::Class, Origin::External)?;
    type_class.synthetic_members();

    let Some(name) = split.name else {
        return Ok(Some(ResourceEntry::Class(type_class.build_arc())));
    };
    let symbol = name_of(
        &Declaration::Member {
            name,
            kind: SymbolKind::SyntheticMember,
        },
        Some(type_class.symbol()),
    )?;
    Ok(Some(ResourceEntry::Constant(Arc::new(FieldInfo {
        name: SmolStr::new(name),
        ty: JavaType::primitive("int"),
        is_static: true,
        symbol,
    }))))
}
