//! Named-expression registry.
//!
//! Static members that hold reusable expression fragments are registered
//! once, before any rewrite runs. After [`RegistryBuilder::build`] the
//! registry is immutable and may be shared freely across threads.

use std::fmt;
use std::sync::{Arc, OnceLock};

use rustc_hash::FxHashMap;
use smol_str::SmolStr;

use crate::expr::Expr;
use crate::types::Member;
use crate::value::Value;

/// Recomputes a stored expression on every access.
pub type PropertyGetter = Arc<dyn Fn() -> Expr + Send + Sync>;

/// Reads a computed member off an instance.
pub type InstanceGetter = Arc<dyn Fn(&Value) -> Option<Value> + Send + Sync>;

/// A static member holding an expression.
#[derive(Clone)]
pub enum Stored {
    /// Built once; every access yields the same tree.
    Field(Arc<Expr>),
    /// Rebuilt on each access.
    Property(PropertyGetter),
}

impl Stored {
    pub fn load(&self) -> Arc<Expr> {
        match self {
            Stored::Field(expr) => Arc::clone(expr),
            Stored::Property(getter) => Arc::new(getter()),
        }
    }
}

impl fmt::Debug for Stored {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stored::Field(expr) => write!(f, "Field({})", expr),
            Stored::Property(_) => write!(f, "Property(<getter>)"),
        }
    }
}

type MemberKey = (SmolStr, SmolStr);

static GLOBAL: OnceLock<Registry> = OnceLock::new();

/// Immutable lookup of static expression members and instance getters.
#[derive(Default)]
pub struct Registry {
    statics: FxHashMap<MemberKey, Stored>,
    instance: FxHashMap<MemberKey, InstanceGetter>,
}

impl Registry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Install the process-wide registry. Fails (returning the argument)
    /// if one is already installed.
    pub fn install_global(registry: Registry) -> Result<(), Registry> {
        GLOBAL.set(registry)
    }

    /// The process-wide registry, or an empty one if none was installed.
    pub fn global() -> &'static Registry {
        GLOBAL.get_or_init(Registry::empty)
    }

    pub fn stored(&self, owner: &str, name: &str) -> Option<&Stored> {
        self.statics.get(&(SmolStr::new(owner), SmolStr::new(name)))
    }

    /// Load the tree held by a static member.
    pub fn load_static(&self, member: &Member) -> Option<Arc<Expr>> {
        let owner = member.owner.name()?;
        self.stored(owner, &member.name).map(Stored::load)
    }

    /// Read a member off an instance: declared fields first, then any
    /// registered getter for the instance's type.
    pub fn read_instance(&self, target: &Value, member: &Member) -> Option<Value> {
        if let Some(value) = target.field(&member.name) {
            return Some(value.clone());
        }
        let key = (SmolStr::new(target.type_name()), member.name.clone());
        self.instance.get(&key).and_then(|getter| getter(target))
    }

    pub fn len(&self) -> usize {
        self.statics.len() + self.instance.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("statics", &self.statics.len())
            .field("instance", &self.instance.len())
            .finish()
    }
}

/// Collects registrations; `build` freezes them.
#[derive(Default)]
pub struct RegistryBuilder {
    statics: FxHashMap<MemberKey, Stored>,
    instance: FxHashMap<MemberKey, InstanceGetter>,
}

impl RegistryBuilder {
    /// Register a field-style member: `expr` is stored as-is.
    pub fn field(
        mut self,
        owner: impl Into<SmolStr>,
        name: impl Into<SmolStr>,
        expr: Expr,
    ) -> Self {
        self.statics
            .insert((owner.into(), name.into()), Stored::Field(Arc::new(expr)));
        self
    }

    /// Register a property-style member: `getter` runs on every access.
    pub fn property<F>(mut self, owner: impl Into<SmolStr>, name: impl Into<SmolStr>, getter: F) -> Self
    where
        F: Fn() -> Expr + Send + Sync + 'static,
    {
        self.statics
            .insert((owner.into(), name.into()), Stored::Property(Arc::new(getter)));
        self
    }

    /// Register a computed member on instances of `owner`.
    pub fn instance_property<F>(
        mut self,
        owner: impl Into<SmolStr>,
        name: impl Into<SmolStr>,
        getter: F,
    ) -> Self
    where
        F: Fn(&Value) -> Option<Value> + Send + Sync + 'static,
    {
        self.instance
            .insert((owner.into(), name.into()), Arc::new(getter));
        self
    }

    pub fn build(self) -> Registry {
        Registry {
            statics: self.statics,
            instance: self.instance,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::Param;
    use crate::types::Type;
    use crate::value::Record;

    fn is_positive() -> Expr {
        let x = Param::new("x", Type::Int);
        Expr::lambda(
            vec![x.clone()],
            Expr::binary(crate::BinOp::Gt, x.to_expr(), Expr::int(0)),
        )
    }

    fn pred_member(kind_property: bool) -> Member {
        let ty = Type::expression_of(vec![Type::Int], Type::Bool);
        if kind_property {
            Member::property(Type::named("Filters"), "IsPositive", ty)
        } else {
            Member::field(Type::named("Filters"), "IsPositive", ty)
        }
    }

    #[test]
    fn test_field_is_shared() {
        let registry = Registry::builder()
            .field("Filters", "IsPositive", is_positive())
            .build();
        let a = registry.load_static(&pred_member(false)).unwrap();
        let b = registry.load_static(&pred_member(false)).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_property_recomputes() {
        let registry = Registry::builder()
            .property("Filters", "IsPositive", is_positive)
            .build();
        let a = registry.load_static(&pred_member(true)).unwrap();
        let b = registry.load_static(&pred_member(true)).unwrap();
        assert!(!Arc::ptr_eq(&a, &b));
        // Fresh parameters each time, same shape otherwise.
        assert_eq!(a.kind_name(), b.kind_name());
    }

    #[test]
    fn test_missing_member() {
        let registry = Registry::empty();
        assert!(registry.load_static(&pred_member(false)).is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_read_instance_prefers_fields() {
        let registry = Registry::builder()
            .instance_property("Customer", "Initial", |v| {
                let name = v.field("Name")?.as_str()?;
                name.chars().next().map(|c| Value::string(c.to_string()))
            })
            .build();
        let customer = Value::record(Record::new("Customer").with("Name", Value::string("Ada")));

        let name = Member::field(Type::named("Customer"), "Name", Type::String);
        assert_eq!(registry.read_instance(&customer, &name), Some(Value::string("Ada")));

        let initial = Member::property(Type::named("Customer"), "Initial", Type::String);
        assert_eq!(registry.read_instance(&customer, &initial), Some(Value::string("A")));
    }

    #[test]
    fn test_registry_is_shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Registry>();
    }
}
