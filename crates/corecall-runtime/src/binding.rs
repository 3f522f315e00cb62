//! The top of the host stack: name-addressed calls over one channel.
//!
//! A [`Binding`] pairs a dispatcher table with an open [`Channel`] and
//! exposes every extracted function by name, typedef-group methods with
//! an implicit receiver, `get_*`/`set_*` property pairs, and enum
//! constants. It also owns the failure policy: a transport, protocol or
//! timeout error leaves the cursor state unknowable, so the binding
//! poisons itself and fails every later call fast instead of corrupting
//! the stream further.

use std::collections::BTreeMap;

use log::{debug, warn};

use corecall_types::sig::{DispatcherTable, EnumDefinition, TypedefGroup};

use crate::channel::Channel;
use crate::error::{CallError, CallResult};
use crate::marshal;
use crate::value::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Ready,
    Poisoned,
    Released,
}

#[derive(Debug, Clone, Copy)]
enum Accessor {
    Getter,
    Setter,
}

/// A `get_x`/`set_x` accessor pair surfaced as one named property.
/// `owner` is the typedef group the pair belongs to, if any; accessors
/// of an owned property may take the receiver as a hidden argument.
#[derive(Debug, Clone)]
pub struct Property {
    pub owner: Option<String>,
    pub name: String,
    getter: Option<(u32, bool)>,
    setter: Option<(u32, bool)>,
}

/// A live connection to one generated dispatcher.
pub struct Binding {
    channel: Channel,
    table: DispatcherTable,
    enums: Vec<EnumDefinition>,
    groups: Vec<TypedefGroup>,
    properties: Vec<Property>,
    state: State,
}

impl Binding {
    pub fn new(
        channel: Channel,
        table: DispatcherTable,
        enums: Vec<EnumDefinition>,
        groups: Vec<TypedefGroup>,
    ) -> Self {
        let properties = derive_properties(&table, &groups);
        debug!(
            "binding up: {} function(s), {} group(s), {} propert{}",
            table.len(),
            groups.len(),
            properties.len(),
            if properties.len() == 1 { "y" } else { "ies" }
        );
        Self {
            channel,
            table,
            enums,
            groups,
            properties,
            state: State::Ready,
        }
    }

    // ── Calls ─────────────────────────────────────────────────────────────────

    /// Call a function by name. Mutable-buffer arguments are updated in
    /// place with the values read back.
    pub fn call(&mut self, name: &str, args: &mut [Value]) -> CallResult<Value> {
        self.ensure_ready()?;
        let selector = self
            .table
            .selector_of(name)
            .ok_or_else(|| CallError::UnknownOperation(name.to_string()))?;
        self.dispatch(selector, args)
    }

    /// Call a typedef-group method. Methods declared on the type take
    /// the receiver as their implicit first argument.
    pub fn call_method(
        &mut self,
        type_name: &str,
        method: &str,
        receiver: Option<&Value>,
        args: &mut [Value],
    ) -> CallResult<Value> {
        self.ensure_ready()?;
        let qualified = format!("{type_name}.{method}");
        let m = self
            .groups
            .iter()
            .find(|g| g.name == type_name)
            .and_then(|g| g.methods.iter().find(|m| m.suffix == method))
            .ok_or_else(|| CallError::UnknownOperation(qualified.clone()))?;
        let (selector, takes_receiver) = (m.selector, m.takes_receiver);

        if !takes_receiver {
            return self.dispatch(selector, args);
        }
        let recv = receiver.ok_or_else(|| CallError::Arity {
            name: qualified,
            expected: args.len() + 1,
            given: args.len(),
        })?;
        let mut full: Vec<Value> = Vec::with_capacity(args.len() + 1);
        full.push(recv.clone());
        full.extend(args.iter().cloned());
        let ret = self.dispatch(selector, &mut full)?;
        // Hand readbacks (everything past the receiver) back to the caller.
        for (slot, updated) in args.iter_mut().zip(full.into_iter().skip(1)) {
            *slot = updated;
        }
        Ok(ret)
    }

    /// Read a free-standing property through its getter.
    pub fn get(&mut self, property: &str) -> CallResult<Value> {
        self.ensure_ready()?;
        let acc = self.accessor(None, property, Accessor::Getter);
        self.accessor_call(format!("get {property}"), acc, None, None)
    }

    /// Write a free-standing property through its setter. Returns
    /// whatever the setter returns, usually [`Value::Void`].
    pub fn set(&mut self, property: &str, value: Value) -> CallResult<Value> {
        self.ensure_ready()?;
        let acc = self.accessor(None, property, Accessor::Setter);
        self.accessor_call(format!("set {property}"), acc, None, Some(value))
    }

    /// Read a property declared on a typedef group.
    pub fn get_member(
        &mut self,
        type_name: &str,
        property: &str,
        receiver: Option<&Value>,
    ) -> CallResult<Value> {
        self.ensure_ready()?;
        let acc = self.accessor(Some(type_name), property, Accessor::Getter);
        self.accessor_call(format!("get {type_name}.{property}"), acc, receiver, None)
    }

    /// Write a property declared on a typedef group.
    pub fn set_member(
        &mut self,
        type_name: &str,
        property: &str,
        receiver: Option<&Value>,
        value: Value,
    ) -> CallResult<Value> {
        self.ensure_ready()?;
        let acc = self.accessor(Some(type_name), property, Accessor::Setter);
        self.accessor_call(
            format!("set {type_name}.{property}"),
            acc,
            receiver,
            Some(value),
        )
    }

    /// Retire the binding. Every later operation fails with
    /// [`CallError::Released`].
    pub fn release(&mut self) -> CallResult<()> {
        if self.state == State::Released {
            return Err(CallError::Released);
        }
        debug!("binding released");
        self.state = State::Released;
        Ok(())
    }

    // ── Introspection ─────────────────────────────────────────────────────────

    /// Value of an extracted enum constant.
    pub fn constant(&self, name: &str) -> Option<i64> {
        self.enums
            .iter()
            .flat_map(|e| e.entries.iter())
            .find(|(n, _)| n == name)
            .map(|(_, v)| *v)
    }

    /// Constants owned by one typedef group: enums carrying the alias
    /// name, plus anonymous enums declared in the same file as the
    /// group's functions.
    pub fn constants_for(&self, type_name: &str) -> Vec<(&str, i64)> {
        let group_file = self
            .groups
            .iter()
            .find(|g| g.name == type_name)
            .map(|g| g.file.as_str());
        self.enums
            .iter()
            .filter(|e| {
                e.name.as_deref() == Some(type_name)
                    || (e.name.is_none() && group_file == Some(e.file.as_str()))
            })
            .flat_map(|e| e.entries.iter().map(|(n, v)| (n.as_str(), *v)))
            .collect()
    }

    pub fn table(&self) -> &DispatcherTable {
        &self.table
    }

    pub fn enums(&self) -> &[EnumDefinition] {
        &self.enums
    }

    pub fn groups(&self) -> &[TypedefGroup] {
        &self.groups
    }

    pub fn property_names(&self) -> impl Iterator<Item = &str> {
        self.properties.iter().map(|p| p.name.as_str())
    }

    // ── Internals ─────────────────────────────────────────────────────────────

    fn ensure_ready(&self) -> CallResult<()> {
        match self.state {
            State::Ready => Ok(()),
            State::Poisoned => Err(CallError::Poisoned),
            State::Released => Err(CallError::Released),
        }
    }

    fn accessor(
        &self,
        owner: Option<&str>,
        property: &str,
        which: Accessor,
    ) -> Option<(u32, bool)> {
        self.properties
            .iter()
            .find(|p| p.owner.as_deref() == owner && p.name == property)
            .and_then(|p| match which {
                Accessor::Getter => p.getter,
                Accessor::Setter => p.setter,
            })
    }

    fn accessor_call(
        &mut self,
        qualified: String,
        acc: Option<(u32, bool)>,
        receiver: Option<&Value>,
        value: Option<Value>,
    ) -> CallResult<Value> {
        let (selector, takes_receiver) =
            acc.ok_or_else(|| CallError::UnknownOperation(qualified.clone()))?;
        let mut args: Vec<Value> = Vec::with_capacity(2);
        if takes_receiver {
            let given = usize::from(value.is_some());
            let recv = receiver.ok_or_else(|| CallError::Arity {
                name: qualified.clone(),
                expected: given + 1,
                given,
            })?;
            args.push(recv.clone());
        }
        if let Some(v) = value {
            args.push(v);
        }
        self.dispatch(selector, &mut args)
    }

    fn dispatch(&mut self, selector: u32, args: &mut [Value]) -> CallResult<Value> {
        let sig = self
            .table
            .get(selector)
            .ok_or_else(|| CallError::UnknownOperation(format!("selector {selector}")))?;
        let result = marshal::perform_call(&mut self.channel, selector, sig, args);
        if let Err(err) = &result {
            if poisons(err) {
                warn!("poisoning binding after: {err}");
                self.state = State::Poisoned;
            }
        }
        result
    }
}

/// Errors that leave the ring cursors in an unknown state.
fn poisons(err: &CallError) -> bool {
    matches!(
        err,
        CallError::Transport(_) | CallError::Protocol(_) | CallError::Timeout(_)
    )
}

/// Pair `get_x`/`set_x` functions into properties: free-standing
/// functions first, then method suffixes within each typedef group.
/// A getter takes nothing beyond its receiver and returns a value; a
/// setter takes exactly one value beyond its receiver.
fn derive_properties(table: &DispatcherTable, groups: &[TypedefGroup]) -> Vec<Property> {
    let mut props: BTreeMap<(Option<String>, String), Property> = BTreeMap::new();

    for (selector, sig) in table.iter() {
        if let Some(rest) = sig.name.strip_prefix("get_") {
            if !rest.is_empty() && sig.params.is_empty() && !sig.ret.is_void() {
                entry(&mut props, None, rest).getter = Some((selector, false));
            }
        } else if let Some(rest) = sig.name.strip_prefix("set_") {
            if !rest.is_empty() && sig.params.len() == 1 {
                entry(&mut props, None, rest).setter = Some((selector, false));
            }
        }
    }

    for group in groups {
        for m in &group.methods {
            let Some(sig) = table.get(m.selector) else {
                continue;
            };
            let hidden = usize::from(m.takes_receiver);
            if let Some(rest) = m.suffix.strip_prefix("get_") {
                if !rest.is_empty() && sig.params.len() == hidden && !sig.ret.is_void() {
                    entry(&mut props, Some(&group.name), rest).getter =
                        Some((m.selector, m.takes_receiver));
                }
            } else if let Some(rest) = m.suffix.strip_prefix("set_") {
                if !rest.is_empty() && sig.params.len() == hidden + 1 {
                    entry(&mut props, Some(&group.name), rest).setter =
                        Some((m.selector, m.takes_receiver));
                }
            }
        }
    }

    props.into_values().collect()
}

fn entry<'a>(
    props: &'a mut BTreeMap<(Option<String>, String), Property>,
    owner: Option<&str>,
    name: &str,
) -> &'a mut Property {
    props
        .entry((owner.map(str::to_string), name.to_string()))
        .or_insert_with(|| Property {
            owner: owner.map(str::to_string),
            name: name.to_string(),
            getter: None,
            setter: None,
        })
}
