//! Inheritance expansion: merge inherited methods and properties into every class.
//!
//! # Algorithm
//!
//! For a class `C`, the resolved member set is:
//!
//! 1. `C`'s own members, untouched.
//! 2. For each ancestor `A` in `C.extends ++ C.implements` (declaration order),
//!    the *resolved* member set of `A`, skipping names already present.
//!
//! Because each ancestor contributes its resolved set, membership is
//! transitive and "first ancestor wins": anything reachable through the first
//! listed ancestor beats anything from a later one.
//!
//! When a member is copied from `A` into `C`:
//! - methods returning `A`'s short name are rewritten to return `C`'s short name,
//!   and every inherited method gets a signature rendered for `C`
//! - private properties are dropped
//! - `defined_by` is kept as-is
//!
//! # Purity
//!
//! The resolved table is computed from the own table only. Each class's
//! resolved set is memoized, and results never feed back into the own
//! records, so diamonds cannot double-insert and running the resolver on its
//! own output is a no-op.
//!
//! # Cycles
//!
//! Classes that sit on a common inheritance cycle (`A extends B`,
//! `B extends A`, or `A extends A`) contribute nothing to each other. Each
//! such class keeps its own members plus whatever it inherits through edges
//! that leave the cycle. Traversal additionally carries the set of classes on
//! the current path and never re-enters one of them.
//!
//! Ancestor names missing from the table are skipped.

use std::collections::{HashMap, HashSet, VecDeque};

use indexmap::IndexMap;
use tracing::{debug, info};

use crate::model::{ClassDefinition, MethodDefinition, PropertyDefinition, Visibility};
use crate::signature::method_signature;
use crate::symbols::SymbolTable;

/// Resolve inherited members for every class in `table`.
///
/// Returns a new table; `table` itself is not modified.
pub fn resolve(table: &SymbolTable) -> SymbolTable {
    InheritanceResolver::new(table).resolve()
}

// ============================================================================
// Member Inheritance Rules
// ============================================================================

/// A member kind that can be merged down the inheritance graph.
trait Inheritable: Clone {
    /// The class's own member table for this kind.
    fn own(class: &ClassDefinition) -> &IndexMap<String, Self>;

    /// The copy of `self` that `descendant` sees when inheriting it from
    /// `ancestor`, or `None` if it does not propagate.
    fn inherit(&self, ancestor: &ClassDefinition, descendant: &ClassDefinition) -> Option<Self>;
}

impl Inheritable for MethodDefinition {
    fn own(class: &ClassDefinition) -> &IndexMap<String, Self> {
        &class.methods
    }

    fn inherit(&self, ancestor: &ClassDefinition, descendant: &ClassDefinition) -> Option<Self> {
        let mut method = self.clone();
        if method.return_type == ancestor.short_name {
            method.return_type = descendant.short_name.clone();
        }
        method.signature = method_signature(
            &descendant.short_name,
            &method.name,
            &method.arguments,
            &method.return_type,
        );
        Some(method)
    }
}

impl Inheritable for PropertyDefinition {
    fn own(class: &ClassDefinition) -> &IndexMap<String, Self> {
        &class.properties
    }

    fn inherit(&self, _ancestor: &ClassDefinition, _descendant: &ClassDefinition) -> Option<Self> {
        if self.visibility == Visibility::Private {
            return None;
        }
        Some(self.clone())
    }
}

// ============================================================================
// Cycle Index
// ============================================================================

/// Which classes share an inheritance cycle.
///
/// Two known classes share a cycle when each is reachable from the other
/// through ancestor edges. A class with a self edge shares a cycle with
/// itself.
#[derive(Debug, Default)]
struct CycleIndex<'a> {
    peers: HashMap<&'a str, HashSet<&'a str>>,
}

impl<'a> CycleIndex<'a> {
    fn build(table: &'a SymbolTable) -> Self {
        let reach: HashMap<&'a str, HashSet<&'a str>> = table
            .iter()
            .map(|class| (class.name.as_str(), reachable_ancestors(table, class)))
            .collect();

        let mut peers: HashMap<&'a str, HashSet<&'a str>> = HashMap::new();
        for (&class, ancestors) in &reach {
            for &ancestor in ancestors {
                let back = reach.get(ancestor).is_some_and(|r| r.contains(class));
                if back {
                    peers.entry(class).or_default().insert(ancestor);
                }
            }
        }
        CycleIndex { peers }
    }

    fn shares_cycle(&self, class: &str, ancestor: &str) -> bool {
        self.peers
            .get(class)
            .is_some_and(|peers| peers.contains(ancestor))
    }

    fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }
}

/// Known classes reachable from `class` through one or more ancestor edges.
fn reachable_ancestors<'a>(table: &'a SymbolTable, class: &'a ClassDefinition) -> HashSet<&'a str> {
    let mut seen = HashSet::new();
    let mut queue: VecDeque<&'a ClassDefinition> = VecDeque::from([class]);

    while let Some(current) = queue.pop_front() {
        for ancestor in current.ancestors() {
            if let Some(def) = table.get(ancestor) {
                if seen.insert(def.name.as_str()) {
                    queue.push_back(def);
                }
            }
        }
    }
    seen
}

// ============================================================================
// Expansion
// ============================================================================

/// Memoized expansion of one member kind.
struct Expansion<'t, 'a, M> {
    table: &'a SymbolTable,
    cycles: &'t CycleIndex<'a>,
    resolved: HashMap<&'a str, IndexMap<String, M>>,
}

impl<'t, 'a, M: Inheritable> Expansion<'t, 'a, M> {
    fn new(table: &'a SymbolTable, cycles: &'t CycleIndex<'a>) -> Self {
        Expansion {
            table,
            cycles,
            resolved: HashMap::new(),
        }
    }

    /// Resolved member set of `class`.
    ///
    /// `path` holds the classes currently being expanded above this call.
    fn expand(
        &mut self,
        class: &'a ClassDefinition,
        path: &mut HashSet<&'a str>,
    ) -> IndexMap<String, M> {
        if let Some(done) = self.resolved.get(class.name.as_str()) {
            return done.clone();
        }

        let table = self.table;
        path.insert(class.name.as_str());
        let mut members = M::own(class).clone();

        for ancestor_name in class.ancestors() {
            let Some(ancestor) = table.get(ancestor_name) else {
                debug!(class = %class.name, ancestor = ancestor_name, "skipping unknown ancestor");
                continue;
            };
            if path.contains(ancestor.name.as_str())
                || self.cycles.shares_cycle(&class.name, &ancestor.name)
            {
                debug!(class = %class.name, ancestor = %ancestor.name, "skipping cyclic ancestor");
                continue;
            }

            let inherited = self.expand(ancestor, path);
            for (name, member) in &inherited {
                if members.contains_key(name) {
                    continue;
                }
                if let Some(copy) = member.inherit(ancestor, class) {
                    members.insert(name.clone(), copy);
                }
            }
        }

        path.remove(class.name.as_str());
        self.resolved.insert(class.name.as_str(), members.clone());
        members
    }
}

// ============================================================================
// Resolver
// ============================================================================

/// Computes the resolved member sets for a whole table.
pub struct InheritanceResolver<'a> {
    table: &'a SymbolTable,
    cycles: CycleIndex<'a>,
}

impl<'a> InheritanceResolver<'a> {
    pub fn new(table: &'a SymbolTable) -> Self {
        InheritanceResolver {
            table,
            cycles: CycleIndex::build(table),
        }
    }

    /// Whether `class` and `ancestor` inherit from each other, directly or
    /// transitively.
    pub fn shares_cycle(&self, class: &str, ancestor: &str) -> bool {
        self.cycles.shares_cycle(class, ancestor)
    }

    /// Build the resolved table.
    pub fn resolve(&self) -> SymbolTable {
        if !self.cycles.is_empty() {
            info!(
                classes = self.cycles.peers.len(),
                "inheritance cycles detected; cyclic edges contribute no members"
            );
        }

        let table = self.table;
        let mut methods: Expansion<'_, 'a, MethodDefinition> = Expansion::new(table, &self.cycles);
        let mut properties: Expansion<'_, 'a, PropertyDefinition> =
            Expansion::new(table, &self.cycles);

        let mut resolved = SymbolTable::new();
        for class in table.iter() {
            let mut path = HashSet::new();
            let merged_methods = methods.expand(class, &mut path);
            let merged_properties = properties.expand(class, &mut path);

            resolved.insert(ClassDefinition {
                methods: merged_methods,
                properties: merged_properties,
                ..class.clone()
            });
        }

        debug!(classes = resolved.len(), "resolved inheritance");
        resolved
    }
}
