//! Worker liveness endpoints

use crate::QueueClient;
use crate::error::Result;
use presswork_core::dto::worker::Heartbeat;

impl QueueClient {
    /// Send a liveness signal to the queue service
    ///
    /// Keeps the worker visible as available/busy in the dashboard. Should
    /// be emitted on every polling tick. Purely observational; carries no
    /// control-plane meaning.
    ///
    /// # Arguments
    /// * `heartbeat` - Worker identity, version, OS and busy/idle state
    pub async fn send_heartbeat(&self, heartbeat: &Heartbeat) -> Result<()> {
        let url = format!(
            "{}/api/workers/{}/heartbeat",
            self.base_url, heartbeat.worker_id
        );
        let response = self.client.post(&url).json(heartbeat).send().await?;

        self.handle_empty_response(response).await
    }
}
