//! Overload selection as an explicit ranked reducer.
//!
//! Candidates are narrowed rule by rule; a rule that would eliminate every
//! remaining candidate is skipped. The rules, in order:
//!
//! 1. argument count (exact arity preferred over variable arity)
//! 2. exact argument types, where the argument type is known
//! 3. first declared
//!
//! When rule 3 has to choose among several survivors the result is
//! [`Selection::Ambiguous`].

use crate::classpath::{JavaType, MethodInfo};

use super::symbols::Symbol;

/// A method or constructor visible at a call site, with types already
/// substituted for the receiver.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Candidate {
    pub symbol: Symbol,
    pub params: Vec<JavaType>,
    pub varargs: bool,
    pub returns: JavaType,
    pub is_static: bool,
}

impl Candidate {
    pub fn from_method(method: &MethodInfo) -> Self {
        Self {
            symbol: method.symbol.clone(),
            params: method.params.clone(),
            varargs: method.varargs,
            returns: method.returns.clone(),
            is_static: method.is_static,
        }
    }

    fn accepts_exactly(&self, arity: usize) -> bool {
        self.params.len() == arity
    }

    fn accepts_variably(&self, arity: usize) -> bool {
        self.varargs && arity + 1 >= self.params.len()
    }

    /// Parameter type receiving the `index`-th argument.
    fn param_for(&self, index: usize, arity: usize) -> Option<&JavaType> {
        let last = self.params.len().checked_sub(1)?;
        if !self.varargs || index < last || (arity == self.params.len() && index == last) {
            return self.params.get(index);
        }
        match &self.params[last] {
            JavaType::Array(element) => Some(element),
            other => Some(other),
        }
    }

    fn exact_matches(&self, args: &[JavaType]) -> usize {
        args.iter()
            .enumerate()
            .filter(|(i, arg)| {
                arg.is_known()
                    && self
                        .param_for(*i, args.len())
                        .is_some_and(|param| param.erasure_eq(arg))
            })
            .count()
    }
}

/// Outcome of overload selection.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Selection {
    Unique(Candidate),
    /// Several candidates survived every rule; the first declared was chosen.
    Ambiguous {
        chosen: Candidate,
        survivors: Vec<Symbol>,
    },
    NotFound,
}

impl Selection {
    pub fn candidate(&self) -> Option<&Candidate> {
        match self {
            Selection::Unique(candidate) | Selection::Ambiguous { chosen: candidate, .. } => {
                Some(candidate)
            }
            Selection::NotFound => None,
        }
    }

    pub fn is_found(&self) -> bool {
        !matches!(self, Selection::NotFound)
    }
}

/// Keep the candidates accepted by `rule`, unless none are.
fn narrow(candidates: Vec<Candidate>, rule: impl Fn(&Candidate) -> bool) -> Vec<Candidate> {
    if candidates.iter().any(&rule) {
        candidates.into_iter().filter(|c| rule(c)).collect()
    } else {
        candidates
    }
}

/// Pick the overload for a call with the given argument types. `candidates`
/// must be in declaration order (most derived class first).
pub fn select(candidates: Vec<Candidate>, args: &[JavaType]) -> Selection {
    if candidates.is_empty() {
        return Selection::NotFound;
    }
    let arity = args.len();

    let candidates = narrow(candidates, |c| c.accepts_exactly(arity) || c.accepts_variably(arity));
    let candidates = narrow(candidates, |c| c.accepts_exactly(arity));

    let best = candidates
        .iter()
        .map(|c| c.exact_matches(args))
        .max()
        .unwrap_or(0);
    let mut candidates = if best > 0 {
        candidates
            .into_iter()
            .filter(|c| c.exact_matches(args) == best)
            .collect()
    } else {
        candidates
    };

    match candidates.len() {
        0 => Selection::NotFound,
        1 => Selection::Unique(candidates.remove(0)),
        _ => {
            let survivors = candidates.iter().map(|c| c.symbol.clone()).collect();
            Selection::Ambiguous {
                chosen: candidates.remove(0),
                survivors,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hir::symbols::{Declaration, Scheme, SymbolKind, name_of};

    fn method(disambiguator: u32, params: Vec<JavaType>, varargs: bool) -> Candidate {
        let owner = name_of(
            &Declaration::Type {
                name: "Foo",
                kind: SymbolKind::Class,
            },
            Some(&Symbol::package("a", Scheme::Project)),
        )
        .unwrap();
        let symbol = name_of(
            &Declaration::Method {
                name: "f",
                disambiguator,
            },
            Some(&owner),
        )
        .unwrap();
        Candidate {
            symbol,
            params,
            varargs,
            returns: JavaType::primitive("void"),
            is_static: false,
        }
    }

    fn int() -> JavaType {
        JavaType::primitive("int")
    }

    fn chosen(selection: &Selection) -> String {
        selection.candidate().unwrap().symbol.to_string()
    }

    #[test]
    fn test_empty_is_not_found() {
        assert_eq!(select(Vec::new(), &[]), Selection::NotFound);
    }

    #[test]
    fn test_arity_decides() {
        let candidates = vec![method(0, vec![int()], false), method(1, vec![int(), int()], false)];
        let selection = select(candidates, &[int(), int()]);
        assert!(matches!(selection, Selection::Unique(_)));
        assert_eq!(chosen(&selection), "a/Foo#f(+1).");
    }

    #[test]
    fn test_exact_types_decide() {
        let candidates = vec![
            method(0, vec![JavaType::string()], false),
            method(1, vec![int()], false),
        ];
        let selection = select(candidates, &[int()]);
        assert!(matches!(selection, Selection::Unique(_)));
        assert_eq!(chosen(&selection), "a/Foo#f(+1).");
    }

    #[test]
    fn test_unknown_types_fall_back_to_declaration_order() {
        let candidates = vec![
            method(0, vec![JavaType::string()], false),
            method(1, vec![int()], false),
        ];
        match select(candidates, &[JavaType::Unknown]) {
            Selection::Ambiguous { chosen, survivors } => {
                assert_eq!(chosen.symbol.to_string(), "a/Foo#f().");
                assert_eq!(survivors.len(), 2);
            }
            other => panic!("expected ambiguity, got {:?}", other),
        }
    }

    #[test]
    fn test_varargs_arity() {
        let varargs = JavaType::Array(Box::new(JavaType::object()));
        let candidates = vec![
            method(0, vec![JavaType::string()], false),
            method(1, vec![JavaType::string(), varargs], true),
        ];
        let selection = select(candidates, &[JavaType::string(), int(), int()]);
        assert_eq!(chosen(&selection), "a/Foo#f(+1).");
    }

    #[test]
    fn test_fixed_arity_preferred_over_varargs() {
        let varargs = JavaType::Array(Box::new(JavaType::string()));
        let candidates = vec![
            method(0, vec![varargs], true),
            method(1, vec![JavaType::string()], false),
        ];
        let selection = select(candidates, &[JavaType::string()]);
        assert!(matches!(selection, Selection::Unique(_)));
        assert_eq!(chosen(&selection), "a/Foo#f(+1).");
    }

    #[test]
    fn test_wrong_arity_still_links_somewhere() {
        let selection = select(vec![method(0, vec![int()], false)], &[]);
        assert_eq!(chosen(&selection), "a/Foo#f().");
    }
}
