//! Message processing: run update() and hand actions to the spawner.

use std::sync::Arc;

use tokio::sync::{mpsc, watch};

use crate::actions::handle_action;
use crate::handler;
use crate::message::Message;
use crate::state::AppState;
use opsdeck_client::{OperationClient, Transport};

/// Process a message through the TEA update function
///
/// Follow-up messages are handled in the same call, so a chain such as
/// "enter monitor view, then poll now" completes before returning.
pub fn process_message<T>(
    state: &mut AppState,
    message: Message,
    msg_tx: &mpsc::Sender<Message>,
    client: &Arc<OperationClient<T>>,
    shutdown_rx: &watch::Receiver<bool>,
) where
    T: Transport + Sync + 'static,
{
    let mut msg = Some(message);
    while let Some(m) = msg {
        let result = handler::update(state, m);

        if let Some(action) = result.action {
            handle_action(action, msg_tx.clone(), client.clone(), shutdown_rx.clone());
        }

        msg = result.message;
    }
}
