//! Immutable element descriptors.
//!
//! An [`Element`] describes one node the caller wants on screen. Descriptors
//! are rebuilt on every render and are only ever compared against committed
//! fibers by kind and position; nothing in here is mutated after construction.

use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::hooks::Hooks;

/// Attribute carrying the payload of a text leaf.
pub const NODE_VALUE: &str = "nodeValue";

/// Attribute name prefix marking an event property (`onClick` names `click`).
pub const EVENT_PREFIX: &str = "on";

const CHILDREN: &str = "children";

/// Render function of a component: receives its hook store and props and
/// returns exactly one child element.
pub type RenderFn = fn(&mut Hooks<'_>, &Props) -> Element;

/// A named component render function.
///
/// Two components are the same kind when they wrap the same render function
/// under the same name. The name takes part because function addresses alone
/// are not unique: the compiler may merge functions with identical bodies.
/// Such functions still need distinct names to stay distinct kinds. Prefer the
/// [`component!`] macro, which fills the name in from the function path, and
/// name a component the same way at every call site.
///
/// [`component!`]: crate::component
#[derive(Clone, Copy)]
pub struct Component {
    name: &'static str,
    render: RenderFn,
}

impl Component {
    pub const fn new(name: &'static str, render: RenderFn) -> Self {
        Self { name, render }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub(crate) fn render(&self, hooks: &mut Hooks<'_>, props: &Props) -> Element {
        (self.render)(hooks, props)
    }
}

impl PartialEq for Component {
    fn eq(&self, other: &Self) -> bool {
        self.render as usize == other.render as usize && self.name == other.name
    }
}

impl fmt::Debug for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Component").field(&self.name).finish()
    }
}

/// Builds a [`Component`] from a render function, naming it after the path.
#[macro_export]
macro_rules! component {
    ($render:path) => {
        $crate::Component::new(stringify!($render), $render)
    };
}

/// What an element turns into: a host node, a component invocation, or a
/// text leaf.
#[derive(Clone, Debug, PartialEq)]
pub enum ElementKind {
    Host(Rc<str>),
    Component(Component),
    Text,
}

impl From<&str> for ElementKind {
    fn from(tag: &str) -> Self {
        ElementKind::Host(Rc::from(tag))
    }
}

impl From<String> for ElementKind {
    fn from(tag: String) -> Self {
        ElementKind::Host(Rc::from(tag))
    }
}

impl From<Component> for ElementKind {
    fn from(component: Component) -> Self {
        ElementKind::Component(component)
    }
}

/// Event listener attached through an `on*` property.
///
/// Listeners compare by identity, so re-rendering with the same callback
/// leaves the host binding untouched while a freshly built closure rebinds.
#[derive(Clone)]
pub struct Callback(Rc<dyn Fn()>);

impl Callback {
    pub fn new(f: impl Fn() + 'static) -> Self {
        Self(Rc::new(f))
    }

    pub fn call(&self) {
        (self.0)()
    }

    pub fn ptr_eq(&self, other: &Callback) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl PartialEq for Callback {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl fmt::Debug for Callback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Callback(..)")
    }
}

/// Value of a single element attribute.
#[derive(Clone, Debug, PartialEq)]
pub enum PropValue {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Callback(Callback),
}

impl PropValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropValue::Str(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            PropValue::Int(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            PropValue::Float(value) => Some(*value),
            PropValue::Int(value) => Some(*value as f64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PropValue::Bool(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_callback(&self) -> Option<&Callback> {
        match self {
            PropValue::Callback(callback) => Some(callback),
            _ => None,
        }
    }
}

impl fmt::Display for PropValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropValue::Str(value) => f.write_str(value),
            PropValue::Int(value) => write!(f, "{value}"),
            PropValue::Float(value) => write!(f, "{value}"),
            PropValue::Bool(value) => write!(f, "{value}"),
            PropValue::Callback(_) => f.write_str("<callback>"),
        }
    }
}

impl From<&str> for PropValue {
    fn from(value: &str) -> Self {
        PropValue::Str(value.to_owned())
    }
}

impl From<String> for PropValue {
    fn from(value: String) -> Self {
        PropValue::Str(value)
    }
}

impl From<i64> for PropValue {
    fn from(value: i64) -> Self {
        PropValue::Int(value)
    }
}

impl From<i32> for PropValue {
    fn from(value: i32) -> Self {
        PropValue::Int(value.into())
    }
}

impl From<f64> for PropValue {
    fn from(value: f64) -> Self {
        PropValue::Float(value)
    }
}

impl From<bool> for PropValue {
    fn from(value: bool) -> Self {
        PropValue::Bool(value)
    }
}

impl From<Callback> for PropValue {
    fn from(value: Callback) -> Self {
        PropValue::Callback(value)
    }
}

/// Attributes in declaration order plus the ordered child descriptors.
#[derive(Clone, Default)]
pub struct Props {
    attributes: IndexMap<String, PropValue>,
    children: Vec<Element>,
}

impl Props {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_children(children: Vec<Element>) -> Self {
        Self {
            attributes: IndexMap::new(),
            children,
        }
    }

    pub fn get(&self, name: &str) -> Option<&PropValue> {
        self.attributes.get(name)
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(PropValue::as_str)
    }

    pub fn get_int(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(PropValue::as_int)
    }

    pub fn attributes(&self) -> impl Iterator<Item = (&str, &PropValue)> + '_ {
        self.attributes
            .iter()
            .map(|(name, value)| (name.as_str(), value))
    }

    pub fn children(&self) -> &[Element] {
        &self.children
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    fn insert(&mut self, name: String, value: PropValue) {
        if name == CHILDREN {
            log::warn!("`children` is reserved for child elements; attribute ignored");
            return;
        }
        self.attributes.insert(name, value);
    }
}

impl fmt::Debug for Props {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Props")
            .field("attributes", &self.attributes)
            .field("children", &self.children)
            .finish()
    }
}

/// Immutable description of one node of the desired tree.
///
/// Cloning is cheap: the props are shared.
#[derive(Clone)]
pub struct Element {
    kind: ElementKind,
    props: Rc<Props>,
}

impl Element {
    /// Starts a host element such as `div`.
    pub fn host(tag: impl Into<String>) -> ElementBuilder {
        let tag: String = tag.into();
        ElementBuilder::new(ElementKind::from(tag))
    }

    /// Starts a component invocation.
    pub fn component(component: Component) -> ElementBuilder {
        ElementBuilder::new(ElementKind::Component(component))
    }

    /// A text leaf holding a single scalar payload.
    pub fn text(value: impl Into<PropValue>) -> Element {
        let mut props = Props::new();
        props.insert(NODE_VALUE.to_owned(), value.into());
        Element {
            kind: ElementKind::Text,
            props: Rc::new(props),
        }
    }

    pub fn kind(&self) -> &ElementKind {
        &self.kind
    }

    pub fn props(&self) -> &Props {
        &self.props
    }

    pub(crate) fn shared_props(&self) -> Rc<Props> {
        Rc::clone(&self.props)
    }
}

impl fmt::Debug for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Element")
            .field("kind", &self.kind)
            .field("props", &self.props)
            .finish()
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

impl From<i64> for Element {
    fn from(value: i64) -> Self {
        Element::text(value)
    }
}

impl From<ElementBuilder> for Element {
    fn from(builder: ElementBuilder) -> Self {
        builder.build()
    }
}

/// Fluent construction of host and component elements.
#[derive(Debug)]
pub struct ElementBuilder {
    kind: ElementKind,
    props: Props,
}

impl ElementBuilder {
    fn new(kind: ElementKind) -> Self {
        Self {
            kind,
            props: Props::new(),
        }
    }

    pub fn attr(mut self, name: impl Into<String>, value: impl Into<PropValue>) -> Self {
        self.props.insert(name.into(), value.into());
        self
    }

    /// Binds `handler` to `event` through an `on{event}` property.
    pub fn on(self, event: &str, handler: impl Fn() + 'static) -> Self {
        self.attr(format!("{EVENT_PREFIX}{event}"), Callback::new(handler))
    }

    pub fn child(mut self, child: impl Into<Element>) -> Self {
        self.props.children.push(child.into());
        self
    }

    pub fn children<I>(mut self, children: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Element>,
    {
        self.props
            .children
            .extend(children.into_iter().map(Into::into));
        self
    }

    pub fn build(self) -> Element {
        Element {
            kind: self.kind,
            props: Rc::new(self.props),
        }
    }
}

/// Classic element factory: `kind`, attributes, then children. Plain strings
/// and integers among the children become text leaves.
pub fn create_element<K, A, N, V, C>(kind: K, attributes: A, children: C) -> Element
where
    K: Into<ElementKind>,
    A: IntoIterator<Item = (N, V)>,
    N: Into<String>,
    V: Into<PropValue>,
    C: IntoIterator,
    C::Item: Into<Element>,
{
    let kind = kind.into();
    let mut props = Props::new();
    for (name, value) in attributes {
        props.insert(name.into(), value.into());
    }
    if kind == ElementKind::Text {
        if children.into_iter().next().is_some() {
            log::warn!("text elements cannot have children; children ignored");
        }
    } else {
        props.children = children.into_iter().map(Into::into).collect();
    }
    Element {
        kind,
        props: Rc::new(props),
    }
}

pub(crate) fn is_event(name: &str) -> bool {
    name.starts_with(EVENT_PREFIX)
}

pub(crate) fn is_property(name: &str) -> bool {
    name != CHILDREN && !is_event(name)
}

pub(crate) fn event_name(name: &str) -> String {
    name[EVENT_PREFIX.len()..].to_lowercase()
}
