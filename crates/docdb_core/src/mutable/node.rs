//! Container identity and attachment tracking.

use super::array::ArrayState;
use super::dictionary::DictionaryState;
use super::{MutableArray, MutableDictionary, MutableValue};
use crate::error::{CoreError, CoreResult};
use parking_lot::{Mutex, MutexGuard, RwLock};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

static NEXT_NODE_ID: AtomicU64 = AtomicU64::new(1);

/// Held from a containment check until the checked child is attached.
static ATTACHMENT: Mutex<()> = parking_lot::const_mutex(());

/// Shared body of a mutable container.
pub(crate) struct Node<T> {
    id: u64,
    parent: Mutex<Option<ParentLink>>,
    pub(crate) state: RwLock<T>,
}

impl<T> Node<T> {
    pub(crate) fn new(state: T) -> Arc<Self> {
        Arc::new(Self {
            id: NEXT_NODE_ID.fetch_add(1, Ordering::Relaxed),
            parent: Mutex::new(None),
            state: RwLock::new(state),
        })
    }

    pub(crate) fn id(&self) -> u64 {
        self.id
    }
}

/// Weak back-reference from a container to the container holding it.
#[derive(Clone)]
enum ParentLink {
    Array(Weak<Node<ArrayState>>),
    Dictionary(Weak<Node<DictionaryState>>),
}

impl ParentLink {
    fn upgrade(&self) -> Option<ContainerRef> {
        match self {
            ParentLink::Array(weak) => weak
                .upgrade()
                .map(|node| ContainerRef::Array(MutableArray::from_node(node))),
            ParentLink::Dictionary(weak) => weak
                .upgrade()
                .map(|node| ContainerRef::Dictionary(MutableDictionary::from_node(node))),
        }
    }
}

/// Either kind of mutable container.
#[derive(Clone)]
pub(crate) enum ContainerRef {
    Array(MutableArray),
    Dictionary(MutableDictionary),
}

impl ContainerRef {
    pub(crate) fn id(&self) -> u64 {
        match self {
            ContainerRef::Array(array) => array.node().id(),
            ContainerRef::Dictionary(dict) => dict.node().id(),
        }
    }

    /// The live container this one is attached to.
    pub(crate) fn parent(&self) -> Option<ContainerRef> {
        let link = match self {
            ContainerRef::Array(array) => array.node().parent.lock().clone(),
            ContainerRef::Dictionary(dict) => dict.node().parent.lock().clone(),
        };
        link.and_then(|link| link.upgrade())
    }

    fn set_parent(&self, parent: Option<&ContainerRef>) {
        let link = parent.map(|parent| match parent {
            ContainerRef::Array(array) => ParentLink::Array(Arc::downgrade(array.node())),
            ContainerRef::Dictionary(dict) => ParentLink::Dictionary(Arc::downgrade(dict.node())),
        });
        match self {
            ContainerRef::Array(array) => *array.node().parent.lock() = link,
            ContainerRef::Dictionary(dict) => *dict.node().parent.lock() = link,
        }
    }

    pub(crate) fn into_value(self) -> MutableValue {
        match self {
            ContainerRef::Array(array) => MutableValue::Array(array),
            ContainerRef::Dictionary(dict) => MutableValue::Dictionary(dict),
        }
    }
}

/// Serializes insertions of containers across all trees.
///
/// Taken after the target's state lock. While it is held, no other
/// insertion can attach a container, so the ancestor walk in
/// [`check_attach`] and the [`attach`] that follows it act as one step.
pub(crate) fn attachment_guard() -> MutexGuard<'static, ()> {
    ATTACHMENT.lock()
}

/// Checks that `child` may be placed into `target`.
///
/// Callers hold [`attachment_guard`] until the matching [`attach`].
///
/// `already_here` says whether `child` is the current occupant of the slot
/// being written, in which case its attachment to `target` is no obstacle.
pub(crate) fn check_attach(
    target: &ContainerRef,
    child: &ContainerRef,
    already_here: bool,
) -> CoreResult<()> {
    if child.id() == target.id() {
        return Err(CoreError::invalid_containment(
            "a container cannot contain itself",
        ));
    }

    if let Some(parent) = child.parent() {
        if already_here && parent.id() == target.id() {
            return Ok(());
        }
        return Err(CoreError::invalid_containment(
            "container is already attached to a parent",
        ));
    }

    let mut ancestor = target.parent();
    while let Some(node) = ancestor {
        if node.id() == child.id() {
            return Err(CoreError::invalid_containment(
                "a container cannot be nested inside its own descendant",
            ));
        }
        ancestor = node.parent();
    }
    Ok(())
}

/// Records that `child` now lives in `parent`.
pub(crate) fn attach(parent: &ContainerRef, child: &ContainerRef) {
    child.set_parent(Some(parent));
}

/// Releases the container held by a removed or replaced slot.
///
/// `keep` is the container written into the same slot, which must stay
/// attached when it is the very same container.
pub(crate) fn detach(old: &MutableValue, keep: Option<&ContainerRef>) {
    if let Some(old) = old.container() {
        if keep.map(ContainerRef::id) != Some(old.id()) {
            old.set_parent(None);
        }
    }
}
