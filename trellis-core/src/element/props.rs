//! Element Attributes
//!
//! Props are an ordered attribute map plus the ordered child list. The
//! attribute map keeps insertion order so patches and serialized output are
//! deterministic.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

use super::Element;

/// An event delivered to a handler attribute.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Event {
    /// Event name without the `on` prefix, lowercased (`"click"`).
    pub name: String,
    /// Optional payload, e.g. the new value of an input.
    pub value: Option<String>,
}

impl Event {
    /// Create an event with no value.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: None,
        }
    }

    /// Attach a value, such as the text of an input.
    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }
}

/// A shared event callback. Two handlers are equal only if they are the same
/// allocation.
#[derive(Clone)]
pub struct EventHandler(Arc<dyn Fn(&Event) + Send + Sync>);

impl EventHandler {
    /// Wrap a closure.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    /// Invoke the handler.
    pub fn call(&self, event: &Event) {
        (self.0)(event);
    }

    /// Whether both handlers share one allocation.
    pub fn same(&self, other: &EventHandler) -> bool {
        std::ptr::eq(
            Arc::as_ptr(&self.0) as *const (),
            Arc::as_ptr(&other.0) as *const (),
        )
    }
}

impl fmt::Debug for EventHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EventHandler({:p})", Arc::as_ptr(&self.0) as *const ())
    }
}

/// The value of a single attribute.
#[derive(Debug, Clone)]
pub enum AttrValue {
    Str(String),
    Number(f64),
    Bool(bool),
    /// Inline style, property name to value.
    Style(IndexMap<String, String>),
    /// Event binding (attribute names starting with `on`).
    Handler(EventHandler),
}

impl AttrValue {
    /// The string, if this is [`AttrValue::Str`].
    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttrValue::Str(s) => Some(s),
            _ => None,
        }
    }

    /// The number, if this is [`AttrValue::Number`].
    pub fn as_number(&self) -> Option<f64> {
        match self {
            AttrValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// The flag, if this is [`AttrValue::Bool`].
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            AttrValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// The handler, if this is [`AttrValue::Handler`].
    pub fn as_handler(&self) -> Option<&EventHandler> {
        match self {
            AttrValue::Handler(h) => Some(h),
            _ => None,
        }
    }

    /// Plain-text rendering used by string attributes. Style maps and
    /// handlers have no text form.
    pub fn to_text(&self) -> Option<String> {
        match self {
            AttrValue::Str(s) => Some(s.clone()),
            AttrValue::Number(n) => Some(format_number(*n)),
            AttrValue::Bool(b) => Some(b.to_string()),
            AttrValue::Style(_) | AttrValue::Handler(_) => None,
        }
    }
}

impl PartialEq for AttrValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (AttrValue::Str(a), AttrValue::Str(b)) => a == b,
            (AttrValue::Number(a), AttrValue::Number(b)) => a == b,
            (AttrValue::Bool(a), AttrValue::Bool(b)) => a == b,
            (AttrValue::Style(a), AttrValue::Style(b)) => a == b,
            (AttrValue::Handler(a), AttrValue::Handler(b)) => a.same(b),
            _ => false,
        }
    }
}

impl From<&str> for AttrValue {
    fn from(s: &str) -> Self {
        AttrValue::Str(s.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(s: String) -> Self {
        AttrValue::Str(s)
    }
}

impl From<f64> for AttrValue {
    fn from(n: f64) -> Self {
        AttrValue::Number(n)
    }
}

impl From<i64> for AttrValue {
    fn from(n: i64) -> Self {
        AttrValue::Number(n as f64)
    }
}

impl From<i32> for AttrValue {
    fn from(n: i32) -> Self {
        AttrValue::Number(f64::from(n))
    }
}

impl From<bool> for AttrValue {
    fn from(b: bool) -> Self {
        AttrValue::Bool(b)
    }
}

impl From<EventHandler> for AttrValue {
    fn from(h: EventHandler) -> Self {
        AttrValue::Handler(h)
    }
}

/// Format a number the way text content shows it: integral values carry no
/// fractional part.
pub(crate) fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

/// Attributes and children of an element.
#[derive(Debug, Clone, Default)]
pub struct Props {
    attrs: IndexMap<String, AttrValue>,
    children: Vec<Element>,
    key: Option<String>,
}

impl Props {
    /// Empty props.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set an attribute.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<AttrValue>) -> Self {
        self.attrs.insert(name.into(), value.into());
        self
    }

    /// Bind an event handler. `on("click", ..)` is stored as `onClick`.
    pub fn on<F>(mut self, event: &str, f: F) -> Self
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        let mut name = String::with_capacity(event.len() + 2);
        name.push_str("on");
        let mut chars = event.chars();
        if let Some(first) = chars.next() {
            name.extend(first.to_uppercase());
            name.push_str(chars.as_str());
        }
        self.attrs
            .insert(name, AttrValue::Handler(EventHandler::new(f)));
        self
    }

    /// Set the inline style map.
    pub fn style<I, K, V>(mut self, entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let style = entries
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        self.attrs.insert("style".to_string(), AttrValue::Style(style));
        self
    }

    /// Append one child.
    pub fn child(mut self, child: impl Into<Element>) -> Self {
        self.children.push(child.into());
        self
    }

    /// Append several children.
    pub fn children<I, E>(mut self, children: I) -> Self
    where
        I: IntoIterator<Item = E>,
        E: Into<Element>,
    {
        self.children.extend(children.into_iter().map(Into::into));
        self
    }

    /// Attach a key. Keys are recorded but never used for matching.
    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Get an attribute by name.
    pub fn get(&self, name: &str) -> Option<&AttrValue> {
        self.attrs.get(name)
    }

    /// Attributes in insertion order.
    pub fn attrs(&self) -> impl Iterator<Item = (&str, &AttrValue)> {
        self.attrs.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of attributes.
    pub fn attr_count(&self) -> usize {
        self.attrs.len()
    }

    /// Children as written.
    pub fn child_elements(&self) -> &[Element] {
        &self.children
    }

    /// The key, if one was set.
    pub fn key_value(&self) -> Option<&str> {
        self.key.as_deref()
    }
}

/// The minimal attribute delta between two prop sets. Children and keys are
/// never part of a patch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttributePatch {
    /// Attributes that are new or whose value changed.
    pub set: Vec<(String, AttrValue)>,
    /// Attributes present before and absent now.
    pub removed: Vec<String>,
}

impl AttributePatch {
    /// Compute the delta that turns `old` into `new`.
    pub fn between(old: &Props, new: &Props) -> Self {
        let set = new
            .attrs
            .iter()
            .filter(|(name, value)| old.attrs.get(*name) != Some(*value))
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();

        let removed = old
            .attrs
            .keys()
            .filter(|name| !new.attrs.contains_key(*name))
            .cloned()
            .collect();

        Self { set, removed }
    }

    /// The patch that applies every attribute of `props` to a fresh node.
    pub fn initial(props: &Props) -> Self {
        Self {
            set: props
                .attrs
                .iter()
                .map(|(name, value)| (name.clone(), value.clone()))
                .collect(),
            removed: Vec::new(),
        }
    }

    /// Whether applying the patch would change nothing.
    pub fn is_empty(&self) -> bool {
        self.set.is_empty() && self.removed.is_empty()
    }
}
