use qrv_types::ScanId;

/// Outcome of a bootstrap: how many ledger records were restored into the
/// in-memory list, and how many were dropped (missing blob, unreadable
/// entry, or unreadable blob).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BootstrapReport {
    pub restored: usize,
    pub dropped: usize,
}

/// Which of the two stores accepted the write during a create.
///
/// The in-memory result exists either way; callers use this to decide
/// whether to surface a durability warning.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Durability {
    pub blob_stored: bool,
    pub ledger_saved: bool,
}

impl Durability {
    /// Both stores accepted the write.
    pub fn is_durable(&self) -> bool {
        self.blob_stored && self.ledger_saved
    }
}

/// Receipt for a created result.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CreateReceipt {
    pub id: ScanId,
    pub durability: Durability,
}

/// Outcome of a bulk delete.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DeleteReport {
    /// Results removed from the in-memory list.
    pub removed: usize,
    /// Results still in the list afterwards.
    pub kept: usize,
}
