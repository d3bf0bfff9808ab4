//! Per-group reconciliation outcomes and the run summary.

use std::fmt;

use serde::Serialize;

use super::id::ProductId;

/// Steps of the per-group reconciliation pipeline, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReconcileStep {
    LookupSource,
    LookupOutlet,
    DeleteDraft,
    Duplicate,
    UpdateIdentity,
    ReplaceImages,
    CopyMetafields,
    PurgeCollections,
    SetPrices,
    AllocatePromoInventory,
    DeallocateWarehouseInventory,
    RestrictChannels,
    VariantReset,
    WriteBack,
}

impl fmt::Display for ReconcileStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::LookupSource => "LOOKUP_SOURCE",
            Self::LookupOutlet => "LOOKUP_OUTLET",
            Self::DeleteDraft => "DELETE_DRAFT",
            Self::Duplicate => "DUPLICATE",
            Self::UpdateIdentity => "UPDATE_IDENTITY",
            Self::ReplaceImages => "REPLACE_IMAGES",
            Self::CopyMetafields => "COPY_METAFIELDS",
            Self::PurgeCollections => "PURGE_COLLECTIONS",
            Self::SetPrices => "SET_PRICES",
            Self::AllocatePromoInventory => "ALLOCATE_PROMO_INVENTORY",
            Self::DeallocateWarehouseInventory => "DEALLOCATE_WAREHOUSE_INVENTORY",
            Self::RestrictChannels => "RESTRICT_CHANNELS",
            Self::VariantReset => "VARIANT_RESET",
            Self::WriteBack => "WRITE_BACK",
        };
        write!(f, "{name}")
    }
}

/// What apply mode would do for a group, reported by preview mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PlannedAction {
    CreateOutlet,
    ReplaceDraftOutlet,
}

impl fmt::Display for PlannedAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CreateOutlet => write!(f, "create outlet"),
            Self::ReplaceDraftOutlet => write!(f, "replace draft outlet"),
        }
    }
}

/// Terminal result for one source item group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ReconcileOutcome {
    /// An active outlet already exists; nothing to do.
    SkippedExistingActive { outlet: ProductId },
    /// A fresh outlet was created.
    Created { outlet: ProductId },
    /// A stale draft outlet was deleted and rebuilt.
    RecreatedFromDraft { outlet: ProductId },
    /// Preview mode: the mutation apply mode would perform.
    Planned { action: PlannedAction },
    /// The pipeline failed at `step`; other groups are unaffected.
    Failed { step: ReconcileStep, reason: String },
}

impl ReconcileOutcome {
    #[must_use]
    pub const fn is_failure(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }

    /// Outlet id to persist back into the sheet (newly built outlets only).
    #[must_use]
    pub const fn write_back_id(&self) -> Option<&ProductId> {
        match self {
            Self::Created { outlet } | Self::RecreatedFromDraft { outlet } => Some(outlet),
            _ => None,
        }
    }
}

impl fmt::Display for ReconcileOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SkippedExistingActive { outlet } => {
                write!(f, "skipped, active outlet {outlet} already exists")
            }
            Self::Created { outlet } => write!(f, "created outlet {outlet}"),
            Self::RecreatedFromDraft { outlet } => {
                write!(f, "replaced draft with outlet {outlet}")
            }
            Self::Planned { action } => write!(f, "would {action}"),
            Self::Failed { step, reason } => write!(f, "failed at {step}: {reason}"),
        }
    }
}

/// One group's SKU paired with its outcome.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupResult {
    pub sku: String,
    pub outcome: ReconcileOutcome,
}

/// Aggregated outcomes for a whole run.
#[derive(Debug, Default, Serialize)]
pub struct RunSummary {
    pub results: Vec<GroupResult>,
    pub skipped: usize,
    pub created: usize,
    pub recreated: usize,
    pub planned: usize,
    pub failed: usize,
}

impl RunSummary {
    pub fn record(&mut self, sku: impl Into<String>, outcome: ReconcileOutcome) {
        match &outcome {
            ReconcileOutcome::SkippedExistingActive { .. } => self.skipped += 1,
            ReconcileOutcome::Created { .. } => self.created += 1,
            ReconcileOutcome::RecreatedFromDraft { .. } => self.recreated += 1,
            ReconcileOutcome::Planned { .. } => self.planned += 1,
            ReconcileOutcome::Failed { .. } => self.failed += 1,
        }
        self.results.push(GroupResult {
            sku: sku.into(),
            outcome,
        });
    }

    /// Whether any group failed; drives the process exit code.
    #[must_use]
    pub const fn had_failures(&self) -> bool {
        self.failed > 0
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.results.len()
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} groups: {} created, {} recreated, {} skipped, {} planned, {} failed",
            self.total(),
            self.created,
            self.recreated,
            self.skipped,
            self.planned,
            self.failed
        )
    }
}
