/// Convenient macro for defining the heap methods
/// that install a callback into a dispatch table slot.
///
/// For each entry, this macro generates a method that
/// boxes the callback and stores it in the named slot
/// of the descriptor's dispatch table,
/// replacing any callback installed earlier.
/// Unknown descriptors are reported and otherwise ignored.
macro_rules! install_methods
{
    (
        $(
            $(#[doc = $doc:expr])*
            pub fn $name:ident($slot:ident, $behavior:expr): { $($bound:tt)* };
        )*
    ) => {
        #[doc = "Methods for installing dispatch table callbacks."]
        impl $crate::heap::Heap
        {
            $(
                $(#[doc = $doc])*
                pub fn $name<F>(&self, descriptor: $crate::types::Descriptor, callback: F)
                    where F: $($bound)* + 'static
                {
                    self.registry.install(descriptor, $behavior, |dispatch| {
                        dispatch.$slot = Some(::std::rc::Rc::new(callback));
                    });
                }
            )*
        }
    };
}
