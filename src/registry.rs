use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};

use dashmap::DashMap;
use dashmap::mapref::one::{Ref, RefMut};

use crate::ast::ty::TypeHint;
use crate::ast::{NodeId, Param};
use crate::loc::Loc;

/// Stable handle to a registered function. Handles are plain integers so
/// descriptors can refer to each other without borrowing the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FunctionId(u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClassId(u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FunctionKind {
    /// Free function declared at the top level of a file.
    Global,
    /// Function nested inside another function's body.
    Local,
    /// Prototype only; the body lives outside the compiled sources.
    Extern,
    InstanceMethod,
    /// Anonymous function before lambda lowering replaces it.
    Lambda,
    /// Synthesized holder for a file's top-level statements.
    UnitMain,
}

/// Specifier flags written before `function`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FunctionFlags {
    pub throws: bool,
    pub resumable: bool,
    pub auto: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Public,
    Private,
    Protected,
}

#[derive(Debug)]
pub struct FunctionDescriptor<'ast> {
    /// Fully mangled name; unique within the registry.
    pub name: String,
    pub kind: FunctionKind,
    pub flags: FunctionFlags,
    pub params: Vec<Param<'ast>>,
    /// Body sequence; `None` for extern prototypes.
    pub root: Option<NodeId<'ast>>,
    pub class: Option<ClassId>,
    /// Name of the function that was being parsed when this one was created.
    /// Set for lambda invoke methods; the enclosing function may not be
    /// registered yet at that point, so this is a name, not a handle.
    pub created_inside: Option<String>,
    pub file: String,
    pub return_rule: Option<TypeHint<'ast>>,
    pub loc: Loc,
}

#[derive(Debug)]
pub struct ClassField<'ast> {
    pub name: String,
    pub visibility: Visibility,
    pub default: Option<NodeId<'ast>>,
    pub loc: Loc,
}

#[derive(Debug)]
pub struct ClassDescriptor<'ast> {
    /// Fully qualified name, `\`-separated.
    pub name: String,
    pub parent: Option<String>,
    pub fields: Vec<ClassField<'ast>>,
    pub static_fields: Vec<ClassField<'ast>>,
    pub methods: Vec<FunctionId>,
    pub static_methods: Vec<FunctionId>,
    pub constructor: Option<FunctionId>,
    /// Produced by lambda lowering rather than written by the user.
    pub is_lambda: bool,
    pub file: String,
    pub loc: Loc,
}

/// Order-preserving queue of functions ready for the next pipeline stage.
#[derive(Debug, Default)]
pub struct DataStream {
    items: Mutex<Vec<FunctionId>>,
}

impl DataStream {
    pub fn push(&self, id: FunctionId) {
        self.items.lock().unwrap().push(id);
    }

    pub fn drain(&self) -> Vec<FunctionId> {
        std::mem::take(&mut *self.items.lock().unwrap())
    }

    pub fn len(&self) -> usize {
        self.items.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Shared output of parsing: every function, class and define collected from
/// all units. Concurrent maps keyed by integer handles give the parser a
/// `&self` API; a unit only ever mutates descriptors it created itself.
#[derive(Debug, Default)]
pub struct Registry<'ast> {
    functions: DashMap<FunctionId, FunctionDescriptor<'ast>>,
    classes: DashMap<ClassId, ClassDescriptor<'ast>>,
    function_names: DashMap<String, FunctionId>,
    class_names: DashMap<String, ClassId>,
    defines: DashMap<String, NodeId<'ast>>,
    next_function: AtomicU32,
    next_class: AtomicU32,
    pub stream: DataStream,
}

impl<'ast> Registry<'ast> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a function descriptor. An existing extern prototype with the
    /// same name is replaced by a real definition; any other name clash
    /// keeps the first registration and returns its handle as the error.
    pub fn register_function(
        &self,
        desc: FunctionDescriptor<'ast>,
    ) -> Result<FunctionId, FunctionId> {
        if let Some(existing) = self.function_names.get(&desc.name) {
            let id = *existing;
            drop(existing);
            let mut slot = self.functions.get_mut(&id).unwrap();
            let replacing_extern = slot.kind == FunctionKind::Extern
                && desc.kind != FunctionKind::Extern;
            if replacing_extern {
                *slot = desc;
                return Ok(id);
            }
            return Err(id);
        }
        let id = FunctionId(self.next_function.fetch_add(1, Ordering::Relaxed));
        self.function_names.insert(desc.name.clone(), id);
        self.functions.insert(id, desc);
        Ok(id)
    }

    pub fn register_class(&self, desc: ClassDescriptor<'ast>) -> Result<ClassId, ClassId> {
        if let Some(existing) = self.class_names.get(&desc.name) {
            return Err(*existing);
        }
        let id = ClassId(self.next_class.fetch_add(1, Ordering::Relaxed));
        self.class_names.insert(desc.name.clone(), id);
        self.classes.insert(id, desc);
        Ok(id)
    }

    /// Register a define. First registration wins; returns false otherwise.
    pub fn register_define(&self, name: &str, value: NodeId<'ast>) -> bool {
        if self.defines.contains_key(name) {
            return false;
        }
        self.defines.insert(name.to_string(), value);
        true
    }

    pub fn function(&self, id: FunctionId) -> Ref<'_, FunctionId, FunctionDescriptor<'ast>> {
        self.functions.get(&id).expect("stale function handle")
    }

    pub fn function_mut(
        &self,
        id: FunctionId,
    ) -> RefMut<'_, FunctionId, FunctionDescriptor<'ast>> {
        self.functions.get_mut(&id).expect("stale function handle")
    }

    pub fn class(&self, id: ClassId) -> Ref<'_, ClassId, ClassDescriptor<'ast>> {
        self.classes.get(&id).expect("stale class handle")
    }

    pub fn class_mut(&self, id: ClassId) -> RefMut<'_, ClassId, ClassDescriptor<'ast>> {
        self.classes.get_mut(&id).expect("stale class handle")
    }

    pub fn lookup_function(&self, name: &str) -> Option<FunctionId> {
        self.function_names.get(name).map(|r| *r)
    }

    pub fn lookup_class(&self, name: &str) -> Option<ClassId> {
        self.class_names.get(name).map(|r| *r)
    }

    pub fn define(&self, name: &str) -> Option<NodeId<'ast>> {
        self.defines.get(name).map(|r| *r)
    }

    pub fn function_count(&self) -> usize {
        self.functions.len()
    }

    pub fn class_count(&self) -> usize {
        self.classes.len()
    }
}

/// Per-unit counter for compiler-generated names. Generated names contain
/// `$u`, which user identifiers cannot, so collisions are impossible.
#[derive(Debug, Default)]
pub struct NameGen {
    next: u32,
}

impl NameGen {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn unique(&mut self, prefix: &str) -> String {
        let n = self.next;
        self.next += 1;
        format!("{prefix}$u{n}")
    }
}

/// Mangled registry name of an instance method.
pub fn mangle_method_name(class: &str, method: &str) -> String {
    format!("{}$${method}", class.replace('\\', "$"))
}

/// Mangled define name of a class constant.
pub fn mangle_class_const(class: &str, constant: &str) -> String {
    format!("c#{}$${constant}", class.replace('\\', "$"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn desc(name: &str, kind: FunctionKind) -> FunctionDescriptor<'static> {
        FunctionDescriptor {
            name: name.to_string(),
            kind,
            flags: FunctionFlags::default(),
            params: Vec::new(),
            root: None,
            class: None,
            created_inside: None,
            file: "test.php".to_string(),
            return_rule: None,
            loc: Loc::new(1),
        }
    }

    #[test]
    fn definition_replaces_extern_prototype() {
        let reg = Registry::new();
        let proto = reg
            .register_function(desc("strlen", FunctionKind::Extern))
            .unwrap();
        let def = reg
            .register_function(desc("strlen", FunctionKind::Global))
            .unwrap();
        assert_eq!(proto, def);
        assert_eq!(reg.function(def).kind, FunctionKind::Global);
    }

    #[test]
    fn duplicate_definition_is_rejected() {
        let reg = Registry::new();
        let first = reg.register_function(desc("f", FunctionKind::Global)).unwrap();
        let clash = reg.register_function(desc("f", FunctionKind::Global));
        assert_eq!(clash, Err(first));
    }

    #[test]
    fn mangling() {
        assert_eq!(mangle_method_name("app\\A", "run"), "app$A$$run");
        assert_eq!(mangle_class_const("A", "LIMIT"), "c#A$$LIMIT");
    }

    #[test]
    fn generated_names_are_distinct() {
        let mut names = NameGen::new();
        let a = names.unique("shorthand_ternary_cond");
        let b = names.unique("shorthand_ternary_cond");
        assert_ne!(a, b);
        assert!(a.contains("$u"));
    }
}
