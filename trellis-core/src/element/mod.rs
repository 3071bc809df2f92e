//! Element Model
//!
//! Elements are immutable descriptions of the UI the application wants to
//! see. They are cheap to clone (everything heavy sits behind an `Arc`) and
//! freely shared between renders.
//!
//! # Variants
//!
//! - `Empty`: booleans, `None` and other "render nothing" values. An empty
//!   element still occupies a child slot so that sibling positions stay
//!   stable when a conditional flips.
//! - `Text`: strings and numbers. `0` and `""` are real text nodes.
//! - `Native`: a backend display element identified by its tag.
//! - `Component`: a class- or function-style composite component.
//! - `List`: an array of children, typically produced by mapping over data.
//!   Lists never become fibers; they are flattened into the parent's
//!   child list.

mod component;
mod props;

pub use component::{ClassType, Component, ComponentType, FunctionType};
pub(crate) use component::SharedInstance;
pub use props::{AttrValue, AttributePatch, Event, EventHandler, Props};

use std::fmt;
use std::sync::Arc;

use smallvec::SmallVec;

use crate::config::FlattenPolicy;
use crate::error::RenderError;

/// A native element: tag plus props.
#[derive(Debug, Clone)]
pub struct NativeElement {
    pub tag: String,
    pub props: Props,
}

/// A composite element: component type plus props.
#[derive(Debug, Clone)]
pub struct ComponentElement {
    pub component: ComponentType,
    pub props: Props,
}

/// Immutable UI descriptor.
#[derive(Clone, Default)]
pub enum Element {
    #[default]
    Empty,
    Text(Arc<str>),
    Native(Arc<NativeElement>),
    Component(Arc<ComponentElement>),
    List(Arc<[Element]>),
}

/// Type identity used by the reconciler to decide between update and
/// replace.
#[derive(Debug, Clone, PartialEq)]
pub enum ElementType<'a> {
    Empty,
    Text,
    List,
    Native(&'a str),
    Component(&'a ComponentType),
}

impl Element {
    /// An element that renders nothing.
    pub fn empty() -> Self {
        Element::Empty
    }

    /// A text leaf.
    pub fn text(text: impl Into<Arc<str>>) -> Self {
        Element::Text(text.into())
    }

    /// A native element such as `div` or `li`.
    pub fn native(tag: impl Into<String>, props: Props) -> Self {
        Element::Native(Arc::new(NativeElement {
            tag: tag.into(),
            props,
        }))
    }

    /// A function-style component element.
    pub fn function(component: &FunctionType, props: Props) -> Self {
        Element::Component(Arc::new(ComponentElement {
            component: ComponentType::Function(component.clone()),
            props,
        }))
    }

    /// A class-style component element.
    pub fn class<C: Component>(props: Props) -> Self {
        Element::Component(Arc::new(ComponentElement {
            component: ComponentType::Class(ClassType::of::<C>()),
            props,
        }))
    }

    /// A list of children.
    pub fn list<I, E>(items: I) -> Self
    where
        I: IntoIterator<Item = E>,
        E: Into<Element>,
    {
        Element::List(items.into_iter().map(Into::into).collect())
    }

    /// The identity used to decide whether a fiber can be reused.
    pub fn element_type(&self) -> ElementType<'_> {
        match self {
            Element::Empty => ElementType::Empty,
            Element::Text(_) => ElementType::Text,
            Element::List(_) => ElementType::List,
            Element::Native(native) => ElementType::Native(&native.tag),
            Element::Component(component) => ElementType::Component(&component.component),
        }
    }

    /// Whether two elements may share a fiber (and its display node).
    pub fn same_type(&self, other: &Element) -> bool {
        self.element_type() == other.element_type()
    }

    /// Props of native and component elements.
    pub fn props(&self) -> Option<&Props> {
        match self {
            Element::Native(native) => Some(&native.props),
            Element::Component(component) => Some(&component.props),
            _ => None,
        }
    }

    /// Key set through [`Props::key`], if any.
    pub fn key(&self) -> Option<&str> {
        self.props().and_then(Props::key_value)
    }

    /// Whether this is [`Element::Empty`].
    pub fn is_empty(&self) -> bool {
        matches!(self, Element::Empty)
    }

    /// Short human-readable name used in logs and errors.
    pub fn describe(&self) -> String {
        match self {
            Element::Empty => "#empty".to_string(),
            Element::Text(_) => "#text".to_string(),
            Element::List(_) => "#list".to_string(),
            Element::Native(native) => native.tag.clone(),
            Element::Component(component) => component.component.name().to_string(),
        }
    }

    /// The child input of a native element or list, before flattening.
    pub(crate) fn child_input(&self) -> &[Element] {
        match self {
            Element::Native(native) => native.props.child_elements(),
            Element::List(items) => &items[..],
            _ => &[],
        }
    }
}

impl fmt::Debug for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Element::Empty => f.write_str("Empty"),
            Element::Text(text) => f.debug_tuple("Text").field(text).finish(),
            Element::Native(native) => f
                .debug_struct("Native")
                .field("tag", &native.tag)
                .field("attrs", &native.props.attr_count())
                .field("children", &native.props.child_elements())
                .finish(),
            Element::Component(component) => f
                .debug_struct("Component")
                .field("type", &component.component)
                .field("attrs", &component.props.attr_count())
                .finish(),
            Element::List(items) => f.debug_list().entries(items.iter()).finish(),
        }
    }
}

impl From<&str> for Element {
    fn from(text: &str) -> Self {
        Element::text(text)
    }
}

impl From<String> for Element {
    fn from(text: String) -> Self {
        Element::text(text)
    }
}

impl From<bool> for Element {
    fn from(_: bool) -> Self {
        Element::Empty
    }
}

impl From<()> for Element {
    fn from(_: ()) -> Self {
        Element::Empty
    }
}

impl From<i32> for Element {
    fn from(n: i32) -> Self {
        Element::text(n.to_string())
    }
}

impl From<i64> for Element {
    fn from(n: i64) -> Self {
        Element::text(n.to_string())
    }
}

impl From<usize> for Element {
    fn from(n: usize) -> Self {
        Element::text(n.to_string())
    }
}

impl From<f64> for Element {
    fn from(n: f64) -> Self {
        Element::text(props::format_number(n))
    }
}

impl<E: Into<Element>> From<Option<E>> for Element {
    fn from(value: Option<E>) -> Self {
        value.map(Into::into).unwrap_or_default()
    }
}

impl<E: Into<Element>> From<Vec<E>> for Element {
    fn from(items: Vec<E>) -> Self {
        Element::list(items)
    }
}

/// Flattened child list handed to the reconciler.
pub(crate) type ChildList = SmallVec<[Element; 8]>;

/// Flatten a child input into the ordered list the reconciler pairs against
/// the previous sibling chain.
pub(crate) fn flatten_children(
    input: &[Element],
    policy: FlattenPolicy,
    parent: &Element,
) -> Result<ChildList, RenderError> {
    let mut out = ChildList::new();
    push_flattened(input, policy, parent, 0, &mut out)?;
    Ok(out)
}

fn push_flattened(
    input: &[Element],
    policy: FlattenPolicy,
    parent: &Element,
    depth: usize,
    out: &mut ChildList,
) -> Result<(), RenderError> {
    for child in input {
        match child {
            Element::List(items) => {
                if policy == FlattenPolicy::OneLevel && depth >= 1 {
                    return Err(RenderError::NestedChildren {
                        parent: parent.describe(),
                        depth: depth + 1,
                    });
                }
                push_flattened(items, policy, parent, depth + 1, out)?;
            }
            other => out.push(other.clone()),
        }
    }
    Ok(())
}
