//! String interning for identifier and attribute names.
//!
//! All name lookups in the interpreter (frame locals, class namespaces,
//! module globals, the builtins table) are keyed by `StringId` rather than by
//! string content. The interner is owned by a single [`Runtime`](crate::Runtime)
//! instance, never shared process-wide, so embedding two interpreters in one
//! process is safe.

use std::rc::Rc;

use ahash::AHashMap;
use strum::{EnumCount, FromRepr, IntoStaticStr};

/// Index into the string interner's storage.
///
/// Uses `u32` to save space; ~4 billion unique names is more than sufficient.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) struct StringId(u32);

impl StringId {
    /// Returns the raw index value.
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Names known at compile time, seeded into every interner at construction so
/// their ids are fixed and available without a `&mut Interns`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumCount, FromRepr, IntoStaticStr)]
pub(crate) enum StaticStrings {
    #[strum(serialize = "__init__")]
    Init,
    #[strum(serialize = "__class__")]
    Class,
    #[strum(serialize = "slice")]
    Slice,
    #[strum(serialize = "sys")]
    Sys,
    #[strum(serialize = "os")]
    Os,
    #[strum(serialize = "random")]
    Random,
    #[strum(serialize = "curses")]
    Curses,
    #[strum(serialize = "atexit")]
    Atexit,
    #[strum(serialize = "copy")]
    Copy,
    #[strum(serialize = "time")]
    Time,
    #[strum(serialize = "Window")]
    Window,
    #[strum(serialize = "modules")]
    Modules,
}

impl StaticStrings {
    /// The fixed id this name was seeded under.
    #[inline]
    pub fn id(self) -> StringId {
        StringId(self as u32)
    }
}

/// Interner mapping string content to canonical [`StringId`]s.
///
/// Populated during parsing (identifiers, attribute names, parameter names)
/// and during module construction. During evaluation, lookups back to string
/// content are needed only for error messages and repr output.
#[derive(Debug)]
pub(crate) struct Interns {
    ids: AHashMap<Rc<str>, StringId>,
    strings: Vec<Rc<str>>,
}

impl Default for Interns {
    fn default() -> Self {
        let mut interns = Self {
            ids: AHashMap::new(),
            strings: Vec::new(),
        };
        for repr in 0..StaticStrings::COUNT {
            let name = StaticStrings::from_repr(repr).expect("static string repr in range");
            interns.intern(name.into());
        }
        interns
    }
}

impl Interns {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the canonical id for `name`, interning it if unseen.
    pub fn intern(&mut self, name: &str) -> StringId {
        if let Some(&id) = self.ids.get(name) {
            return id;
        }
        let id = StringId(u32::try_from(self.strings.len()).expect("interner overflow"));
        let shared: Rc<str> = Rc::from(name);
        self.strings.push(Rc::clone(&shared));
        self.ids.insert(shared, id);
        id
    }

    /// Returns the id for `name` without interning, if it has been seen.
    pub fn get_id(&self, name: &str) -> Option<StringId> {
        self.ids.get(name).copied()
    }

    /// Returns the string content for `id`.
    pub fn get(&self, id: StringId) -> &str {
        &self.strings[id.index()]
    }
}
