//! Per-unit name visibility from the package clause and imports.

use indexmap::IndexMap;
use smol_str::SmolStr;

use crate::syntax::ast::CompilationUnit;

/// Names a unit can see without qualification, before lexical scopes.
///
/// Type names are looked up in the order Java gives them precedence:
/// single-type imports, the unit's own package, on-demand imports, then the
/// implicit imports (`java.lang`).
#[derive(Clone, Debug, Default)]
pub struct ImportScope {
    package: SmolStr,
    /// Simple name → qualified name.
    single_types: IndexMap<SmolStr, SmolStr>,
    /// Packages or types imported with `.*`.
    on_demand: Vec<SmolStr>,
    /// Member name → classes it is statically imported from.
    static_single: IndexMap<SmolStr, Vec<SmolStr>>,
    static_on_demand: Vec<SmolStr>,
    implicit: Vec<SmolStr>,
}

impl ImportScope {
    pub fn new(unit: &CompilationUnit, implicit: &[SmolStr]) -> Self {
        let mut scope = Self {
            package: SmolStr::new(unit.package_name()),
            implicit: implicit.to_vec(),
            ..Self::default()
        };
        for import in &unit.imports {
            let path = import.path.to_dotted();
            match (import.is_static, import.on_demand) {
                (false, false) => {
                    if let Some(last) = import.path.last() {
                        scope
                            .single_types
                            .entry(last.text.clone())
                            .or_insert_with(|| SmolStr::new(&path));
                    }
                }
                (false, true) => scope.add_on_demand(path),
                (true, false) => {
                    if let Some((owner, member)) = path.rsplit_once('.') {
                        let owners = scope.static_single.entry(SmolStr::new(member)).or_default();
                        if !owners.iter().any(|o| o == owner) {
                            owners.push(SmolStr::new(owner));
                        }
                    }
                }
                (true, true) => {
                    if !scope.static_on_demand.iter().any(|o| *o == path) {
                        scope.static_on_demand.push(SmolStr::new(&path));
                    }
                }
            }
        }
        scope
    }

    fn add_on_demand(&mut self, path: String) {
        if !self.on_demand.iter().any(|p| *p == path) {
            self.on_demand.push(SmolStr::new(path));
        }
    }

    /// The unit's package, empty for the default package.
    pub fn package(&self) -> &str {
        &self.package
    }

    /// Qualified name of `simple` inside `prefix` (a package or a type).
    pub fn qualify(prefix: &str, simple: &str) -> String {
        if prefix.is_empty() {
            simple.to_string()
        } else {
            format!("{}.{}", prefix, simple)
        }
    }

    /// Qualified names a simple type name may denote, most specific first.
    pub fn type_candidates(&self, simple: &str) -> Vec<String> {
        let mut candidates = Vec::with_capacity(2 + self.on_demand.len() + self.implicit.len());
        if let Some(qualified) = self.single_types.get(simple) {
            candidates.push(qualified.to_string());
        }
        candidates.push(Self::qualify(&self.package, simple));
        candidates.extend(self.on_demand.iter().map(|p| Self::qualify(p, simple)));
        candidates.extend(self.implicit.iter().map(|p| Self::qualify(p, simple)));
        candidates
    }

    /// Classes a static member `name` may be imported from, single imports
    /// first.
    pub fn static_owners(&self, name: &str) -> Vec<SmolStr> {
        let mut owners: Vec<SmolStr> = self.static_single.get(name).cloned().unwrap_or_default();
        owners.extend(self.static_on_demand.iter().cloned());
        owners
    }

    /// Qualified name a single-type import binds to `simple`, if any.
    pub fn single_type(&self, simple: &str) -> Option<&str> {
        self.single_types.get(simple).map(SmolStr::as_str)
    }
}
