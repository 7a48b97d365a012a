//! Background execution of one operation request.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::message::Message;
use opsdeck_client::{OperationClient, Transport};
use opsdeck_core::prelude::*;
use opsdeck_core::{Epoch, OperationRequest};

/// Run `request` on a background task and report the outcome as
/// [`Message::OperationCompleted`] tagged with `epoch`.
///
/// The task never touches state; the handler decides whether the result is
/// still wanted.
pub(crate) fn spawn_dispatch<T>(
    epoch: Epoch,
    request: OperationRequest,
    client: Arc<OperationClient<T>>,
    msg_tx: mpsc::Sender<Message>,
) -> JoinHandle<()>
where
    T: Transport + Sync + 'static,
{
    tokio::spawn(async move {
        let kind = request.kind();
        let result = client.dispatch(request).await;

        if let Err(e) = &result {
            debug!("{} {} finished with error: {}", kind, epoch, e);
        }

        if msg_tx
            .send(Message::OperationCompleted {
                kind,
                epoch,
                result,
            })
            .await
            .is_err()
        {
            // Engine shutting down.
            debug!("Dropping {} {} result: channel closed", kind, epoch);
        }
    })
}
