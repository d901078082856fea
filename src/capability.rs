//! Capability queries.
//!
//! The engine itself never gates anything; the hosting shell holds the
//! policy and consults it before invoking a mutation. The trait lives here
//! so shells and tests share one vocabulary of actions.

/// The mutations a caller can invoke.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    /// Reserve a digital-signature placeholder
    AddSignaturePlaceholder,
    /// Patch a signature into a reserved placeholder
    SignDocument,
    /// Embed a wet-ink signature image
    AddWetSignature,
    /// Place a "sign here" marker annotation
    AddSignAnnotation,
    /// Stamp a text watermark
    AddWatermark,
}

impl Action {
    /// Stable lowercase name, used in events and logs.
    pub fn name(&self) -> &'static str {
        match self {
            Action::AddSignaturePlaceholder => "add_signature_placeholder",
            Action::SignDocument => "sign_document",
            Action::AddWetSignature => "add_wet_signature",
            Action::AddSignAnnotation => "add_sign_annotation",
            Action::AddWatermark => "add_watermark",
        }
    }
}

/// Policy seam consulted by the hosting shell.
pub trait ActionGate {
    /// Whether `action` may be invoked right now.
    fn is_action_permitted(&self, action: Action) -> bool;
}

/// Permits everything. The default for embedding without a policy.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

impl ActionGate for AllowAll {
    fn is_action_permitted(&self, _action: Action) -> bool {
        true
    }
}
