//! Abstract UI events and state updates.
//!
//! The rendering layer is an external collaborator: it feeds [`UiEvent`]s in
//! and reacts to [`UiUpdate`]s coming back out. Logic never touches the DOM
//! or any widget state directly, and UI affordances (like the pay button) are
//! derived from emitted state, never authoritative.

use std::time::Duration;

use tokio::sync::mpsc;

use algopay::error::CheckoutError;
use algopay::intent::PaymentIntent;
use algopay_node::optin::AssetOptInState;

use crate::wallet::WalletSession;

/// Events the orchestrator subscribes to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiEvent {
    /// The user asked to connect a wallet. Carries the current form snapshot
    /// so the opt-in state can be recomputed after connecting.
    ConnectRequested(PaymentIntent),
    /// The user asked to disconnect the wallet.
    DisconnectRequested,
    /// The user asked to opt in to the form's asset.
    OptInRequested(PaymentIntent),
    /// The user submitted the payment.
    PaymentSubmitted(PaymentIntent),
}

/// States of one payment attempt.
///
/// `Failed` is always terminal for the attempt; the user re-initiates from
/// `Idle` and every precondition is re-validated.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PaymentState {
    /// No attempt in flight.
    #[default]
    Idle,
    /// Validating wallet, configuration, and opt-ins.
    PreconditionCheck,
    /// Fetching parameters and constructing the transaction.
    BuildingTransaction,
    /// Waiting for the wallet to sign.
    AwaitingSignature,
    /// Submitting the signed transaction to the network.
    Broadcasting,
    /// Reporting the transaction id to the merchant backend.
    Reconciling,
    /// The backend accepted the payment.
    Succeeded,
    /// The attempt failed; terminal.
    Failed(CheckoutError),
}

impl PaymentState {
    /// Whether a new payment initiation is accepted in this state.
    #[must_use]
    pub const fn accepts_initiation(&self) -> bool {
        matches!(self, Self::Idle | Self::Succeeded | Self::Failed(_))
    }
}

/// Severity of a user-visible notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Informational.
    Info,
    /// Something needs user action but nothing is lost.
    Warning,
    /// The attempt failed.
    Error,
}

/// An auto-dismissing, user-visible notice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    /// Display severity.
    pub severity: Severity,
    /// Message text.
    pub message: String,
    /// How long the rendering layer should keep it visible.
    pub dismiss_after: Duration,
}

impl Notice {
    /// Creates an informational notice (5 second dismissal).
    #[must_use]
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Info,
            message: message.into(),
            dismiss_after: Duration::from_secs(5),
        }
    }

    /// Creates a warning notice (5 second dismissal).
    #[must_use]
    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            message: message.into(),
            dismiss_after: Duration::from_secs(5),
        }
    }

    /// Creates an error notice (8 second dismissal).
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            message: message.into(),
            dismiss_after: Duration::from_secs(8),
        }
    }
}

/// State updates emitted toward the rendering layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiUpdate {
    /// The wallet session changed.
    SessionChanged(WalletSession),
    /// The asset opt-in state was recomputed.
    OptInStateChanged(AssetOptInState),
    /// The payment attempt moved to a new state.
    PaymentStateChanged(PaymentState),
    /// Show a notice to the user.
    Notice(Notice),
    /// Terminal success action: navigate to the payment status page.
    NavigateToStatus,
}

/// Sender half of the update stream.
///
/// Sends never block; if the rendering layer has gone away the update is
/// dropped with a debug log.
#[derive(Debug, Clone)]
pub struct UpdateSender(mpsc::UnboundedSender<UiUpdate>);

impl UpdateSender {
    /// Creates the update channel.
    #[must_use]
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<UiUpdate>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self(tx), rx)
    }

    /// Emits an update.
    pub fn emit(&self, update: UiUpdate) {
        if self.0.send(update).is_err() {
            tracing::debug!("ui update dropped: no subscriber");
        }
    }
}
