//! Tagged state of an object proxy.
//!
//! The three states make the illegal combination "clean without a source"
//! unrepresentable. The remaining invariants are checked at runtime by
//! [`ProxyState::check_invariants`].

use rusty_objproxy_storage::ObjectRecord;

use crate::scratch::ScratchFile;

/// State of an object proxy.
#[derive(Debug)]
pub(crate) enum ProxyState {
    /// No known remote generation and no local content. The object is
    /// regarded as empty and pending creation, so this state is dirty.
    Empty,
    /// Local view equals `source`.
    Clean {
        /// Generation the local view equals.
        source: ObjectRecord,
        /// Materialized copy of `source`, if one has been needed yet.
        scratch: Option<ScratchFile>,
    },
    /// Local content may differ from `source`.
    Dirty {
        /// Generation the local content was branched from, if any.
        source: Option<ObjectRecord>,
        /// Authoritative local content.
        scratch: ScratchFile,
    },
}

impl ProxyState {
    /// Generation the local state is branched from.
    pub(crate) fn source(&self) -> Option<&ObjectRecord> {
        match self {
            ProxyState::Empty => None,
            ProxyState::Clean { source, .. } => Some(source),
            ProxyState::Dirty { source, .. } => source.as_ref(),
        }
    }

    /// Whether local content may differ from the source.
    pub(crate) fn is_dirty(&self) -> bool {
        !matches!(self, ProxyState::Clean { .. })
    }

    /// Local scratch file, if materialized.
    pub(crate) fn scratch(&self) -> Option<&ScratchFile> {
        match self {
            ProxyState::Empty => None,
            ProxyState::Clean { scratch, .. } => scratch.as_ref(),
            ProxyState::Dirty { scratch, .. } => Some(scratch),
        }
    }

    /// Move to `Dirty`, keeping the source and the materialized scratch file.
    ///
    /// # Panics
    /// If no scratch file has been materialized.
    pub(crate) fn mark_dirty(&mut self) -> &mut ScratchFile {
        *self = match std::mem::replace(self, ProxyState::Empty) {
            ProxyState::Clean {
                source,
                scratch: Some(scratch),
            } => ProxyState::Dirty {
                source: Some(source),
                scratch,
            },
            dirty @ ProxyState::Dirty { .. } => dirty,
            _ => panic!("scratch file must be materialized before marking dirty"),
        };

        match self {
            ProxyState::Dirty { scratch, .. } => scratch,
            _ => unreachable!("state was just made dirty"),
        }
    }

    /// Move to `Clean` after `record` was created from the local view.
    ///
    /// The scratch file, if any, already holds exactly the created content
    /// and is kept.
    pub(crate) fn mark_synced(&mut self, record: ObjectRecord) {
        let scratch: Option<ScratchFile> = match std::mem::replace(self, ProxyState::Empty) {
            ProxyState::Empty => None,
            ProxyState::Clean { scratch, .. } => scratch,
            ProxyState::Dirty { scratch, .. } => Some(scratch),
        };
        *self = ProxyState::Clean {
            source: record,
            scratch,
        };
    }

    /// Replace everything with a clean state branched from `record`.
    ///
    /// # Returns
    /// The superseded scratch file, for the caller to discard.
    pub(crate) fn supersede(&mut self, record: ObjectRecord) -> Option<ScratchFile> {
        let previous: ProxyState = std::mem::replace(
            self,
            ProxyState::Clean {
                source: record,
                scratch: None,
            },
        );

        match previous {
            ProxyState::Empty => None,
            ProxyState::Clean { scratch, .. } => scratch,
            ProxyState::Dirty { scratch, .. } => Some(scratch),
        }
    }

    /// Check the source invariants for a proxy of object `name`.
    ///
    /// # Panics
    /// If the source has a negative size or names a different object.
    /// Either indicates a defect, not a runtime condition.
    pub(crate) fn check_invariants(&self, name: &str) {
        if let Some(source) = self.source() {
            if source.size < 0 {
                panic!("Non-sensical source size: {}", source.size);
            }

            if source.name != name {
                panic!("Name mismatch: {} vs. {}", source.name, name);
            }
        }

        // Clean without a source is unrepresentable.
        debug_assert!(self.is_dirty() || self.source().is_some());
    }
}
