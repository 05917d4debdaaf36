use crate::error::Error;
use crate::error::Result;
use crate::heap::Heap;
use crate::value::Value;
use super::Behavior;
use super::Descriptor;
use super::Dispatch;
use super::Tag;
use super::TypeDescriptor;

use core::cell::Cell;
use core::cell::RefCell;
use rustc_hash::FxHashMap;
use std::alloc::Layout;
use std::alloc::handle_alloc_error;
use std::rc::Rc;
use tracing::trace;
use tracing::warn;

/// Table of every type registered with a heap.
///
/// Records are reference counted and never removed,
/// so a record obtained once stays valid for the life of the heap,
/// no matter how often the table itself grows.
pub (crate) struct Registry
{
    descriptors: RefCell<Vec<Rc<TypeDescriptor>>>,
    by_tag: RefCell<FxHashMap<Tag, Descriptor>>,
    by_name: RefCell<FxHashMap<String, Descriptor>>,

    /// Lowest tag not yet handed out by automatic assignment.
    next_tag: Cell<u32>,

    /// Number of records reserved on each growth.
    increment: usize,
}

impl Registry
{
    pub (crate) fn new(increment: usize) -> Self
    {
        Self{
            descriptors: RefCell::new(Vec::new()),
            by_tag: RefCell::new(FxHashMap::default()),
            by_name: RefCell::new(FxHashMap::default()),
            next_tag: Cell::new(0),
            increment,
        }
    }

    /// Number of registered types.
    pub (crate) fn len(&self) -> usize
    {
        self.descriptors.borrow().len()
    }

    /// Look up the record of a descriptor.
    pub (crate) fn get(&self, descriptor: Descriptor) -> Option<Rc<TypeDescriptor>>
    {
        self.descriptors.borrow().get(descriptor.index()).cloned()
    }

    /// Snapshot of the dispatch table of a descriptor.
    ///
    /// The snapshot holds its own handles to the callbacks,
    /// so the callbacks may freely re-enter the registry.
    pub (crate) fn dispatch(&self, descriptor: Descriptor) -> Option<Dispatch>
    {
        self.get(descriptor).map(|record| record.dispatch.borrow().clone())
    }

    fn unused_tag(&self) -> Tag
    {
        let by_tag = self.by_tag.borrow();
        let mut tag = self.next_tag.get();
        while by_tag.contains_key(&Tag(tag)) {
            tag += 1;
        }
        self.next_tag.set(tag + 1);
        Tag(tag)
    }

    /// Resolve the tag and initial dispatch table of a new type.
    fn prepare(&self, tag: Option<Tag>, base: Option<Descriptor>)
        -> Result<(Tag, Dispatch)>
    {
        let tag = match tag {
            Some(tag) if self.by_tag.borrow().contains_key(&tag) =>
                return Err(Error::DuplicateTag(tag)),
            Some(tag) => tag,
            None => self.unused_tag(),
        };

        let dispatch = match base {
            Some(base) => self.dispatch(base).ok_or(Error::UnknownDescriptor(base))?,
            None => Dispatch::default(),
        };

        Ok((tag, dispatch))
    }

    fn add(&self, name: &str, tag: Tag, base: Option<Descriptor>, dispatch: Dispatch)
        -> Descriptor
    {
        let mut descriptors = self.descriptors.borrow_mut();

        if descriptors.len() == descriptors.capacity() {
            if descriptors.try_reserve_exact(self.increment).is_err() {
                handle_alloc_error(Layout::new::<Rc<TypeDescriptor>>());
            }
            trace!(capacity = descriptors.capacity(), "registry grown");
        }

        let index = u32::try_from(descriptors.len())
            .unwrap_or_else(|_| handle_alloc_error(Layout::new::<TypeDescriptor>()));
        let descriptor = Descriptor(index);

        descriptors.push(Rc::new(TypeDescriptor{
            name: name.to_owned(),
            tag,
            base,
            dispatch: RefCell::new(dispatch),
        }));

        self.by_tag.borrow_mut().insert(tag, descriptor);
        self.by_name.borrow_mut().insert(name.to_owned(), descriptor);

        descriptor
    }

    fn register(&self, name: &str, tag: Option<Tag>, base: Option<Descriptor>)
        -> Result<Descriptor>
    {
        let (tag, dispatch) = self.prepare(tag, base)?;
        Ok(self.add(name, tag, base, dispatch))
    }

    /// Apply an edit to the dispatch table of a descriptor.
    ///
    /// Installing on a descriptor this registry did not issue
    /// is a programming error in the collaborator;
    /// it is reported and the edit is dropped.
    pub (crate) fn install(
        &self,
        descriptor: Descriptor,
        behavior: Behavior,
        edit: impl FnOnce(&mut Dispatch),
    )
    {
        match self.get(descriptor) {
            Some(record) => edit(&mut record.dispatch.borrow_mut()),
            None => warn!(
                %descriptor,
                %behavior,
                "ignoring callback installed on unknown descriptor"
            ),
        }
    }
}

/// Methods for registering and looking up types.
impl Heap
{
    /// Register a new type under the next unused tag.
    pub fn register_type(&self, name: &str) -> Descriptor
    {
        let tag = self.registry.unused_tag();
        self.registry.add(name, tag, None, Dispatch::default())
    }

    /// Register a new type under a chosen tag.
    pub fn register_type_with_tag(&self, name: &str, tag: Tag)
        -> Result<Descriptor>
    {
        self.registry.register(name, Some(tag), None)
    }

    /// Register a new type that starts out
    /// with a copy of the base type's dispatch table.
    ///
    /// Callbacks installed on either type afterwards
    /// do not affect the other.
    pub fn derive_type(&self, name: &str, base: Descriptor)
        -> Result<Descriptor>
    {
        self.registry.register(name, None, Some(base))
    }

    /// Like [`derive_type`][`Self::derive_type`], under a chosen tag.
    pub fn derive_type_with_tag(&self, name: &str, tag: Tag, base: Descriptor)
        -> Result<Descriptor>
    {
        self.registry.register(name, Some(tag), Some(base))
    }

    /// Look up the record of a descriptor.
    pub fn type_descriptor(&self, descriptor: Descriptor)
        -> Option<Rc<TypeDescriptor>>
    {
        self.registry.get(descriptor)
    }

    /// Find the type registered under a tag.
    pub fn type_with_tag(&self, tag: Tag) -> Option<Descriptor>
    {
        self.registry.by_tag.borrow().get(&tag).copied()
    }

    /// Find the type most recently registered under a name.
    pub fn type_named(&self, name: &str) -> Option<Descriptor>
    {
        self.registry.by_name.borrow().get(name).copied()
    }

    /// Number of registered types.
    pub fn type_count(&self) -> usize
    {
        self.registry.len()
    }

    /// Type of the instance a value refers to.
    ///
    /// Immediates and stale references have none.
    pub fn descriptor_of(&self, value: Value) -> Option<Descriptor>
    {
        self.live_slot(value).ok().and_then(|(_, slot)| slot.descriptor())
    }

    /// Name of the type of any value.
    pub fn type_name(&self, value: Value) -> String
    {
        if let Some(name) = value.immediate_type_name() {
            return name.to_owned();
        }
        self.descriptor_of(value)
            .and_then(|descriptor| self.registry.get(descriptor))
            .map(|record| record.name.clone())
            .unwrap_or_else(|| String::from("freed"))
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    use crate::config::HeapConfig;

    #[test]
    fn automatic_tags_skip_chosen_ones()
    {
        let heap = Heap::new();
        let chosen = heap.register_type_with_tag("chosen", Tag(0)).unwrap();
        let automatic = heap.register_type("automatic");
        assert_eq!(heap.type_with_tag(Tag(0)), Some(chosen));
        assert_eq!(heap.type_descriptor(automatic).unwrap().tag, Tag(1));
    }

    #[test]
    fn duplicate_tag_is_rejected()
    {
        let heap = Heap::new();
        heap.register_type_with_tag("first", Tag(9)).unwrap();
        assert_eq!(
            heap.register_type_with_tag("second", Tag(9)).err(),
            Some(Error::DuplicateTag(Tag(9))),
        );
        assert_eq!(heap.type_count(), 1);
    }

    #[test]
    fn derived_type_copies_table_at_derivation()
    {
        let heap = Heap::new();
        let base = heap.register_type("base");
        heap.install_length(base, |_, _| 7);
        let derived = heap.derive_type("derived", base).unwrap();
        heap.install_inspect(base, |_, _| String::from("base"));

        let record = heap.type_descriptor(derived).unwrap();
        assert_eq!(record.base, Some(base));
        assert!(record.has(Behavior::Length));
        assert!(!record.has(Behavior::Inspect));
    }

    #[test]
    fn deriving_from_unknown_base_fails()
    {
        let heap = Heap::new();
        let stranger = Descriptor(42);
        assert_eq!(
            heap.derive_type("orphan", stranger).err(),
            Some(Error::UnknownDescriptor(stranger)),
        );
    }

    #[test]
    fn installing_on_unknown_descriptor_is_a_no_op()
    {
        let heap = Heap::new();
        heap.install_length(Descriptor(3), |_, _| 1);
        assert_eq!(heap.type_count(), 0);
    }

    #[test]
    fn records_survive_registry_growth()
    {
        let config = HeapConfig{registry_increment: 2, ..HeapConfig::default()};
        let heap = Heap::with_config(config).unwrap();
        let first = heap.register_type("first");
        let record = heap.type_descriptor(first).unwrap();
        for i in 0 .. 20 {
            heap.register_type(&format!("type-{}", i));
        }
        assert!(Rc::ptr_eq(&record, &heap.type_descriptor(first).unwrap()));
        assert_eq!(heap.type_named("type-19").map(Descriptor::index), Some(20));
    }

    #[test]
    fn immediate_type_names()
    {
        let heap = Heap::new();
        assert_eq!(heap.type_name(Value::Int(1)), "integer");
        assert_eq!(heap.type_name(Value::True), "boolean");
        assert_eq!(heap.type_name(Value::Nil), "nil");
        assert_eq!(heap.type_name(Value::Undefined), "undefined");
    }
}
