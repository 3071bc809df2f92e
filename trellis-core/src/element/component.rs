//! Composite Components
//!
//! A composite element is either a class-style component (a type
//! implementing [`Component`], instantiated once per tree position and kept
//! across renders) or a function-style component (a shared render closure
//! that keeps local state through [`Hooks`]).
//!
//! The variant is fixed when the element is built, so the scheduler never has
//! to probe a component at run time to find out how to call it.

use std::any::TypeId;
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

use super::Props;
use crate::error::RenderResult;
use crate::hooks::{Hooks, Updater};

/// A class-style component.
///
/// The engine creates one instance per tree position on first render and
/// reuses it while a component of the same type stays at that position.
pub trait Component: Send + 'static {
    /// Construct the instance. `updater` schedules a re-render; components
    /// usually hand it to a [`crate::hooks::ComponentState`].
    fn create(props: &Props, updater: Updater) -> Self
    where
        Self: Sized;

    /// Called when an existing instance is rendered again with new props.
    fn receive_props(&mut self, _props: &Props) {}

    /// Produce the rendered sub-tree.
    fn render(&self, props: &Props) -> RenderResult;
}

pub(crate) type SharedInstance = Arc<Mutex<Box<dyn Component>>>;

type Construct = fn(&Props, Updater) -> Box<dyn Component>;

/// Type identity and constructor of a class-style component.
#[derive(Clone)]
pub struct ClassType {
    id: TypeId,
    name: &'static str,
    construct: Construct,
}

impl ClassType {
    /// Component type for the Rust type `C`.
    pub fn of<C: Component>() -> Self {
        Self {
            id: TypeId::of::<C>(),
            name: short_type_name(std::any::type_name::<C>()),
            construct: |props, updater| Box::new(C::create(props, updater)) as Box<dyn Component>,
        }
    }

    /// Short type name, used in logs and errors.
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub(crate) fn instantiate(&self, props: &Props, updater: Updater) -> SharedInstance {
        Arc::new(Mutex::new((self.construct)(props, updater)))
    }
}

impl PartialEq for ClassType {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl fmt::Debug for ClassType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ClassType({})", self.name)
    }
}

type RenderFn = dyn Fn(&mut Hooks<'_>, &Props) -> RenderResult + Send + Sync;

/// A function-style component.
///
/// Identity is the shared render closure: clones of one `FunctionType` are
/// the same component, two separately built ones are not, even when they
/// wrap identical code.
#[derive(Clone)]
pub struct FunctionType {
    name: Arc<str>,
    render: Arc<RenderFn>,
}

impl FunctionType {
    /// Wrap a render function under a display name.
    pub fn new<F>(name: impl Into<Arc<str>>, render: F) -> Self
    where
        F: Fn(&mut Hooks<'_>, &Props) -> RenderResult + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            render: Arc::new(render),
        }
    }

    /// Display name given at construction.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn call(&self, hooks: &mut Hooks<'_>, props: &Props) -> RenderResult {
        (self.render)(hooks, props)
    }
}

impl PartialEq for FunctionType {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(
            Arc::as_ptr(&self.render) as *const (),
            Arc::as_ptr(&other.render) as *const (),
        )
    }
}

impl fmt::Debug for FunctionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FunctionType({})", self.name)
    }
}

/// The two kinds of composite component.
#[derive(Debug, Clone, PartialEq)]
pub enum ComponentType {
    Class(ClassType),
    Function(FunctionType),
}

impl ComponentType {
    /// Name of the underlying class or function.
    pub fn name(&self) -> &str {
        match self {
            ComponentType::Class(class) => class.name(),
            ComponentType::Function(function) => function.name(),
        }
    }
}

fn short_type_name(full: &'static str) -> &'static str {
    full.rsplit("::").next().unwrap_or(full)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::Element;

    struct Greeting;

    impl Component for Greeting {
        fn create(_props: &Props, _updater: Updater) -> Self {
            Greeting
        }

        fn render(&self, _props: &Props) -> RenderResult {
            Ok(Element::text("hello"))
        }
    }

    struct Farewell;

    impl Component for Farewell {
        fn create(_props: &Props, _updater: Updater) -> Self {
            Farewell
        }

        fn render(&self, _props: &Props) -> RenderResult {
            Ok(Element::text("bye"))
        }
    }

    #[test]
    fn class_identity_follows_rust_type() {
        assert_eq!(ClassType::of::<Greeting>(), ClassType::of::<Greeting>());
        assert_ne!(ClassType::of::<Greeting>(), ClassType::of::<Farewell>());
        assert_eq!(ClassType::of::<Greeting>().name(), "Greeting");
    }

    #[test]
    fn function_identity_follows_shared_closure() {
        let a = FunctionType::new("Item", |_, _| Ok(Element::empty()));
        let b = FunctionType::new("Item", |_, _| Ok(Element::empty()));

        assert_eq!(a, a.clone());
        assert_ne!(a, b);
    }
}
