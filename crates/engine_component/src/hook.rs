//! Lifecycle hooks and their per-fragment implementations.
//!
//! Every fragment may implement any [`Hook`]. Composition collects the
//! implementations of one hook across a kind's fragments and fans out to all
//! of them in priority order; see `engine_compose` for the ordering rules.

use std::sync::Arc;

use crate::entity::EntityId;
use crate::field::{FieldValue, Fields, FieldsMut};
use crate::io::{ReadError, Reads, Writes};

/// Names of the hooks a fragment can implement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Hook {
    /// Once per simulation pass while the entity is added.
    Update,
    /// When the entity joins its groups.
    Add,
    /// When the entity leaves its groups.
    Remove,
    /// Serialise fragment state.
    Write,
    /// Restore fragment state.
    Read,
    /// Once after every `read` implementation has run.
    AfterRead,
}

impl Hook {
    /// Every hook, in a fixed order.
    pub const ALL: [Hook; 6] = [
        Hook::Update,
        Hook::Add,
        Hook::Remove,
        Hook::Write,
        Hook::Read,
        Hook::AfterRead,
    ];

    /// Hook name for diagnostics.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Hook::Update => "update",
            Hook::Add => "add",
            Hook::Remove => "remove",
            Hook::Write => "write",
            Hook::Read => "read",
            Hook::AfterRead => "after_read",
        }
    }
}

impl std::fmt::Display for Hook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A side effect requested by a lifecycle hook.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Remove an entity from its groups.
    Remove(EntityId),
    /// Create and add a new entity of the named kind.
    Spawn {
        /// Kind name.
        kind: &'static str,
        /// Field overrides applied on top of the kind's defaults.
        fields: Vec<(&'static str, FieldValue)>,
    },
}

/// Buffer of commands produced during one entity's hook pass.
#[derive(Debug, Default)]
pub struct Commands {
    queue: Vec<Command>,
}

impl Commands {
    /// Create an empty buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Request removal of an entity.
    pub fn remove(&mut self, id: EntityId) {
        self.queue.push(Command::Remove(id));
    }

    /// Request a new entity.
    pub fn spawn(&mut self, kind: &'static str, fields: Vec<(&'static str, FieldValue)>) {
        self.queue.push(Command::Spawn { kind, fields });
    }

    /// Returns `true` if no command is queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Take every queued command, leaving the buffer empty.
    pub fn drain(&mut self) -> std::vec::Drain<'_, Command> {
        self.queue.drain(..)
    }
}

/// Context passed to `update`, `add` and `remove` implementations.
#[derive(Debug)]
pub struct HookContext<'a> {
    /// The entity the hook runs for.
    pub id: EntityId,
    /// Seconds since the previous simulation pass; zero for `add`/`remove`.
    pub dt: f32,
    /// The entity's merged fields.
    pub fields: FieldsMut<'a>,
    /// Side effects applied after this entity's hooks have run.
    pub commands: &'a mut Commands,
}

impl HookContext<'_> {
    /// Request removal of the entity this hook runs for.
    pub fn remove_self(&mut self) {
        self.commands.remove(self.id);
    }
}

/// `update`, `add` and `remove` implementation.
pub type LifecycleFn = Arc<dyn Fn(&mut HookContext<'_>) + Send + Sync>;

/// `write` implementation.
pub type WriteFn = Arc<dyn Fn(&Fields<'_>, &mut Writes) + Send + Sync>;

/// `read` implementation.
pub type ReadFn = Arc<dyn Fn(&mut FieldsMut<'_>, &mut Reads<'_>) -> Result<(), ReadError> + Send + Sync>;

/// `after_read` implementation.
pub type AfterReadFn = Arc<dyn Fn(&mut FieldsMut<'_>) + Send + Sync>;

/// The callable behind a hook implementation.
#[derive(Clone)]
pub enum HookBody {
    /// `update`, `add` or `remove`.
    Lifecycle(LifecycleFn),
    /// `write`.
    Write(WriteFn),
    /// `read`.
    Read(ReadFn),
    /// `after_read`.
    AfterRead(AfterReadFn),
}

impl std::fmt::Debug for HookBody {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            HookBody::Lifecycle(_) => "Lifecycle",
            HookBody::Write(_) => "Write",
            HookBody::Read(_) => "Read",
            HookBody::AfterRead(_) => "AfterRead",
        };
        write!(f, "HookBody::{name}(..)")
    }
}

/// One fragment's implementation of a hook.
#[derive(Debug, Clone)]
pub struct HookImpl {
    /// Which hook this implements.
    pub hook: Hook,
    /// Higher runs first; ties keep fragment declaration order.
    pub priority: i32,
    /// Replaces every other implementation of the hook on the composed kind.
    pub terminal: bool,
    /// Runs after every non-late implementation regardless of priority.
    pub late: bool,
    /// The callable.
    pub body: HookBody,
}

impl HookImpl {
    fn with(hook: Hook, body: HookBody) -> Self {
        Self {
            hook,
            priority: 0,
            terminal: false,
            late: false,
            body,
        }
    }

    /// An `update` implementation.
    pub fn update(f: impl Fn(&mut HookContext<'_>) + Send + Sync + 'static) -> Self {
        Self::with(Hook::Update, HookBody::Lifecycle(Arc::new(f)))
    }

    /// An `add` implementation.
    pub fn add(f: impl Fn(&mut HookContext<'_>) + Send + Sync + 'static) -> Self {
        Self::with(Hook::Add, HookBody::Lifecycle(Arc::new(f)))
    }

    /// A `remove` implementation.
    pub fn remove(f: impl Fn(&mut HookContext<'_>) + Send + Sync + 'static) -> Self {
        Self::with(Hook::Remove, HookBody::Lifecycle(Arc::new(f)))
    }

    /// A `write` implementation.
    pub fn write(f: impl Fn(&Fields<'_>, &mut Writes) + Send + Sync + 'static) -> Self {
        Self::with(Hook::Write, HookBody::Write(Arc::new(f)))
    }

    /// A `read` implementation.
    pub fn read(
        f: impl Fn(&mut FieldsMut<'_>, &mut Reads<'_>) -> Result<(), ReadError> + Send + Sync + 'static,
    ) -> Self {
        Self::with(Hook::Read, HookBody::Read(Arc::new(f)))
    }

    /// An `after_read` implementation.
    pub fn after_read(f: impl Fn(&mut FieldsMut<'_>) + Send + Sync + 'static) -> Self {
        Self::with(Hook::AfterRead, HookBody::AfterRead(Arc::new(f)))
    }

    /// Set the priority.
    #[must_use]
    pub fn priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Mark as terminal.
    #[must_use]
    pub fn terminal(mut self) -> Self {
        self.terminal = true;
        self
    }

    /// Mark as running after the composed chain.
    #[must_use]
    pub fn late(mut self) -> Self {
        self.late = true;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::{FieldAccess, FieldDef, FieldLayout};

    #[test]
    fn test_builder_flags() {
        let h = HookImpl::update(|_| {}).priority(3).terminal().late();
        assert_eq!(h.hook, Hook::Update);
        assert_eq!(h.priority, 3);
        assert!(h.terminal);
        assert!(h.late);
        assert!(matches!(h.body, HookBody::Lifecycle(_)));
    }

    #[test]
    fn test_constructors_pick_matching_body() {
        assert!(matches!(HookImpl::write(|_, _| {}).body, HookBody::Write(_)));
        assert!(matches!(HookImpl::read(|_, _| Ok(())).body, HookBody::Read(_)));
        assert!(matches!(HookImpl::after_read(|_| {}).body, HookBody::AfterRead(_)));
        assert_eq!(HookImpl::remove(|_| {}).hook, Hook::Remove);
        assert_eq!(HookImpl::add(|_| {}).hook, Hook::Add);
    }

    #[test]
    fn test_context_commands() {
        let mut layout = FieldLayout::new();
        layout.push(FieldDef::new("time", 0.0f32));
        let mut values = layout.defaults();
        let mut commands = Commands::new();
        let mut ctx = HookContext {
            id: EntityId(5),
            dt: 0.5,
            fields: FieldsMut::new(&layout, &mut values),
            commands: &mut commands,
        };

        let hook = HookImpl::update(|ctx| {
            let t = ctx.fields.float("time") + ctx.dt;
            ctx.fields.set("time", t);
            ctx.remove_self();
        });
        if let HookBody::Lifecycle(f) = &hook.body {
            f(&mut ctx);
        }

        assert_eq!(values[0], FieldValue::Float(0.5));
        let queued: Vec<Command> = commands.drain().collect();
        assert_eq!(queued, vec![Command::Remove(EntityId(5))]);
        assert!(commands.is_empty());
    }
}
