//! In-memory description element tree.
//!
//! An `Element` is one tag of a description document: a name, typed
//! attributes, an optional typed value and child elements. It is the accessor
//! surface the physics engine reads its initial configuration from and writes
//! live updates back to.
//!
//! ```text
//! <physics type="ode">                 Element "physics", attribute "type"
//!   <max_step_size>0.001</max_step_size>   child Element with a double value
//!   <gravity>0 0 -9.8</gravity>            child Element with a vector3 value
//! </physics>
//! ```

use std::fmt::Write;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::{ParamError, Result};
use crate::param::{Param, ParamPtr};
use crate::registry::ParamRegistry;
use crate::value::{ParamValue, ValueKind};

pub type ElementPtr = Arc<Element>;

#[derive(Debug)]
pub struct Element {
    name: String,
    attributes: Vec<ParamPtr>,
    value: Option<ParamPtr>,
    children: RwLock<Vec<ElementPtr>>,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            value: None,
            children: RwLock::new(Vec::new()),
        }
    }

    pub fn into_ptr(self) -> ElementPtr {
        Arc::new(self)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declare a typed attribute.
    pub fn add_attribute(
        &mut self,
        key: &str,
        kind: ValueKind,
        default: &str,
        required: bool,
        description: &str,
        registry: Option<&mut ParamRegistry>,
    ) -> Result<()> {
        let param = Param::create(key, kind, default, required, description, registry)?;
        self.attributes.push(param);
        Ok(())
    }

    /// Declare the element's own typed value. Its key is the element name.
    pub fn add_value(
        &mut self,
        kind: ValueKind,
        default: &str,
        required: bool,
        description: &str,
        registry: Option<&mut ParamRegistry>,
    ) -> Result<()> {
        let param = Param::create(
            self.name.as_str(),
            kind,
            default,
            required,
            description,
            registry,
        )?;
        self.value = Some(param);
        Ok(())
    }

    pub fn add_child(&self, child: ElementPtr) {
        self.children.write().push(child);
    }

    pub fn attribute(&self, key: &str) -> Option<ParamPtr> {
        self.attributes
            .iter()
            .find(|p| p.read().key() == key)
            .cloned()
    }

    pub fn attributes(&self) -> &[ParamPtr] {
        &self.attributes
    }

    pub fn value(&self) -> Option<ParamPtr> {
        self.value.clone()
    }

    pub fn children(&self) -> Vec<ElementPtr> {
        self.children.read().clone()
    }

    pub fn has_element(&self, name: &str) -> bool {
        self.children.read().iter().any(|c| c.name == name)
    }

    /// First child element called `name`.
    pub fn get_element(&self, name: &str) -> Option<ElementPtr> {
        self.children.read().iter().find(|c| c.name == name).cloned()
    }

    /// Read `key` as `T`, looking at attributes first and then at the value of
    /// the child element of that name.
    pub fn get<T: ParamValue>(&self, key: &str) -> Result<T> {
        if let Some(attr) = self.attribute(key) {
            return attr.read().get::<T>();
        }
        self.get_element(key)
            .and_then(|child| child.value())
            .ok_or_else(|| ParamError::NotFound {
                element: self.name.clone(),
                key: key.to_string(),
            })?
            .read()
            .get::<T>()
    }

    /// Write this element's own value through its string form.
    pub fn set<T: ParamValue>(&self, value: T) -> bool {
        match self.value_param() {
            Ok(param) => param.write().set(value),
            Err(e) => {
                tracing::error!("{}", e);
                false
            }
        }
    }

    fn value_param(&self) -> Result<&ParamPtr> {
        self.value.as_ref().ok_or_else(|| ParamError::NotFound {
            element: self.name.clone(),
            key: self.name.clone(),
        })
    }

    /// Copy attribute values, the element value and children from `other`.
    ///
    /// Children with a matching name are updated in place; the rest are
    /// cloned and appended. A value this element rejects is skipped and the
    /// copy continues; the first rejection is returned once it finishes.
    pub fn copy_from(&self, other: &Element) -> Result<()> {
        if std::ptr::eq(self, other) {
            return Ok(());
        }
        let mut first_err = None;
        let mut keep = |result: Result<()>| {
            if let Err(e) = result {
                tracing::warn!("Copying <{}>: {}", self.name, e);
                first_err.get_or_insert(e);
            }
        };
        for attr in &other.attributes {
            let (key, text) = {
                let attr = attr.read();
                (attr.key().to_string(), attr.as_string())
            };
            if let Some(own) = self.attribute(&key) {
                keep(own.write().try_set_from_string(&text));
            }
        }
        if let (Some(own), Some(theirs)) = (&self.value, &other.value) {
            let text = theirs.read().as_string();
            keep(own.write().try_set_from_string(&text));
        }
        for child in other.children() {
            match self.get_element(&child.name) {
                Some(own) => keep(own.copy_from(&child)),
                None => self.add_child(child.deep_clone(None)),
            }
        }
        first_err.map_or(Ok(()), Err)
    }

    /// Independent copy of this element and its subtree.
    pub fn deep_clone(&self, mut registry: Option<&mut ParamRegistry>) -> ElementPtr {
        let attributes = self
            .attributes
            .iter()
            .map(|p| p.read().clone_detached(registry.as_deref_mut()))
            .collect();
        let value = self
            .value
            .as_ref()
            .map(|p| p.read().clone_detached(registry.as_deref_mut()));
        let children = self
            .children()
            .iter()
            .map(|c| c.deep_clone(registry.as_deref_mut()))
            .collect();
        Arc::new(Self {
            name: self.name.clone(),
            attributes,
            value,
            children: RwLock::new(children),
        })
    }

    /// Restore every parameter in the subtree to its default.
    pub fn reset(&self) {
        for attr in &self.attributes {
            attr.write().reset();
        }
        if let Some(value) = &self.value {
            value.write().reset();
        }
        for child in self.children() {
            child.reset();
        }
    }

    /// Serialize the subtree as nested tags reflecting current values.
    pub fn to_sdf_string(&self) -> String {
        let mut out = String::new();
        self.write_sdf(&mut out, 0);
        out
    }

    fn write_sdf(&self, out: &mut String, depth: usize) {
        let indent = "  ".repeat(depth);
        let _ = write!(out, "{indent}<{}", self.name);
        for attr in &self.attributes {
            let attr = attr.read();
            let _ = write!(out, " {}='{}'", attr.key(), escape_xml(&attr.as_string()));
        }
        let children = self.children();
        let text = self
            .value
            .as_ref()
            .map(|v| escape_xml(&v.read().as_string()));
        match (text, children.is_empty()) {
            (None, true) => out.push_str("/>\n"),
            (Some(text), true) => {
                let _ = writeln!(out, ">{}</{}>", text, self.name);
            }
            (text, false) => {
                out.push_str(">\n");
                if let Some(text) = text {
                    let _ = writeln!(out, "{indent}  {text}");
                }
                for child in &children {
                    child.write_sdf(out, depth + 1);
                }
                let _ = writeln!(out, "{indent}</{}>", self.name);
            }
        }
    }

    /// Description of the `<physics>` element with its stock defaults.
    pub fn physics_template(mut registry: Option<&mut ParamRegistry>) -> Result<ElementPtr> {
        let mut physics = Element::new("physics");
        physics.add_attribute(
            "name",
            ValueKind::String,
            "default_physics",
            false,
            "The name of this set of physics parameters.",
            registry.as_deref_mut(),
        )?;
        physics.add_attribute(
            "default",
            ValueKind::Bool,
            "false",
            false,
            "If true, this physics element is set as the default physics profile for the world.",
            registry.as_deref_mut(),
        )?;
        physics.add_attribute(
            "type",
            ValueKind::String,
            "ode",
            true,
            "The type of the dynamics engine.",
            registry.as_deref_mut(),
        )?;
        let physics = physics.into_ptr();

        let leaves: [(&str, ValueKind, &str, &str); 6] = [
            (
                "max_step_size",
                ValueKind::Double,
                "0.001",
                "Maximum time step size at which every system in simulation can interact with the states of the world.",
            ),
            (
                "real_time_factor",
                ValueKind::Double,
                "1",
                "Target simulation speedup factor, defined by ratio of simulation time to real-time.",
            ),
            (
                "real_time_update_rate",
                ValueKind::Double,
                "1000",
                "Rate at which to execute update steps, in Hz. Zero runs as fast as possible.",
            ),
            (
                "max_contacts",
                ValueKind::Int,
                "20",
                "Maximum number of contacts allowed between two entities.",
            ),
            (
                "gravity",
                ValueKind::Vector3,
                "0 0 -9.8",
                "The gravity vector in m/s^2, expressed in a coordinate frame defined by the world.",
            ),
            (
                "magnetic_field",
                ValueKind::Vector3,
                "5.5645e-6 22.8758e-6 -42.3884e-6",
                "The magnetic field in Tesla, expressed in a coordinate frame defined by the world.",
            ),
        ];
        for (name, kind, default, description) in leaves {
            let mut leaf = Element::new(name);
            leaf.add_value(kind, default, true, description, registry.as_deref_mut())?;
            physics.add_child(leaf.into_ptr());
        }
        Ok(physics)
    }
}

fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\'' => out.push_str("&apos;"),
            '"' => out.push_str("&quot;"),
            c => out.push(c),
        }
    }
    out
}
